//! Content hashing for cache keys.
//!
//! A cache key is `<source>:<params>`: the BLAKE3 digest of the raw input
//! bytes plus a short digest of the encoding parameters that shape the
//! output. Nothing time- or request-dependent goes in, so identical requests
//! always map to the same key.

use blake3::Hasher as Blake3Hasher;

use crate::types::ProcessingOptions;

/// Hex characters of the parameter digest kept in the key.
const PARAMS_HASH_LEN: usize = 16;

/// Builds content-addressed cache keys.
pub struct Hasher;

impl Hasher {
    /// BLAKE3 hash of an in-memory byte buffer.
    pub fn content_hash(data: &[u8]) -> String {
        let mut hasher = Blake3Hasher::new();
        hasher.update(data);
        hasher.finalize().to_hex().to_string()
    }

    /// Digest of the options that affect the encoded output.
    ///
    /// Uses the effective quality, so `quality = 0` and `quality = 85` share
    /// a key.
    pub fn params_hash(options: &ProcessingOptions) -> String {
        let mut hasher = Blake3Hasher::new();
        hasher.update(&[options.effective_quality()]);
        for bound in [options.max_width, options.max_height] {
            match bound {
                Some(v) => {
                    hasher.update(&[1]);
                    hasher.update(&v.to_le_bytes());
                }
                None => {
                    hasher.update(&[0]);
                }
            }
        }
        let hex = hasher.finalize().to_hex();
        hex.as_str()[..PARAMS_HASH_LEN].to_string()
    }

    /// Full cache key for a request.
    pub fn cache_key(data: &[u8], options: &ProcessingOptions) -> String {
        format!(
            "{}:{}",
            Self::content_hash(data),
            Self::params_hash(options)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_hash_is_deterministic() {
        let a = Hasher::content_hash(b"pixels");
        let b = Hasher::content_hash(b"pixels");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        assert_ne!(a, Hasher::content_hash(b"pixelz"));
    }

    #[test]
    fn test_cache_key_depends_on_options() {
        let base = ProcessingOptions::default();
        let k1 = Hasher::cache_key(b"img", &base);
        let k2 = Hasher::cache_key(b"img", &base.with_max_width(100));
        let k3 = Hasher::cache_key(b"img", &base.with_max_height(100));
        assert_ne!(k1, k2);
        assert_ne!(k2, k3);
        assert_eq!(k1, Hasher::cache_key(b"img", &base));
    }

    #[test]
    fn test_zero_quality_shares_default_key() {
        let explicit = ProcessingOptions::default().with_quality(85);
        let implicit = ProcessingOptions::default().with_quality(0);
        assert_eq!(
            Hasher::cache_key(b"img", &explicit),
            Hasher::cache_key(b"img", &implicit)
        );
    }

    #[test]
    fn test_key_prefix_is_content_hash() {
        let key = Hasher::cache_key(b"img", &ProcessingOptions::default());
        let (source, params) = key.split_once(':').unwrap();
        assert_eq!(source, Hasher::content_hash(b"img"));
        assert_eq!(params.len(), PARAMS_HASH_LEN);
    }
}
