//! Input validation before decoding.

use std::path::Path;

use crate::config::LimitsConfig;
use crate::error::{PipelineError, PipelineResult};

/// Input formats the transform pipeline can decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Jpeg,
    Png,
}

impl SourceFormat {
    /// Match a lowercase file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "png" => Some(Self::Png),
            _ => None,
        }
    }

    /// Match the leading magic bytes.
    pub fn from_signature(header: &[u8]) -> Option<Self> {
        // JPEG: FF D8 FF
        if header.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return Some(Self::Jpeg);
        }
        // PNG: 89 50 4E 47 0D 0A 1A 0A
        if header.starts_with(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]) {
            return Some(Self::Png);
        }
        None
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Jpeg => "jpeg",
            Self::Png => "png",
        }
    }

    pub(crate) fn image_format(self) -> image::ImageFormat {
        match self {
            Self::Jpeg => image::ImageFormat::Jpeg,
            Self::Png => image::ImageFormat::Png,
        }
    }
}

/// Validates inputs against the configured limits.
#[derive(Debug, Clone)]
pub struct Validator {
    limits: LimitsConfig,
}

impl Validator {
    /// Create a new validator with the given limits.
    pub fn new(limits: LimitsConfig) -> Self {
        Self { limits }
    }

    fn max_bytes(&self) -> u64 {
        self.limits.max_file_size_mb * 1024 * 1024
    }

    /// Reject inputs over the byte limit.
    pub fn check_size(&self, source_name: &str, len: u64) -> PipelineResult<()> {
        if len > self.max_bytes() {
            return Err(PipelineError::FileTooLarge {
                source_name: source_name.to_string(),
                size_mb: len / (1024 * 1024),
                max_mb: self.limits.max_file_size_mb,
            });
        }
        Ok(())
    }

    /// Reject images whose header declares oversized dimensions.
    pub fn check_dimensions(&self, source_name: &str, width: u32, height: u32) -> PipelineResult<()> {
        let max_dim = self.limits.max_image_dimension;
        if width > max_dim || height > max_dim {
            return Err(PipelineError::ImageTooLarge {
                source_name: source_name.to_string(),
                width,
                height,
                max_dim,
            });
        }
        Ok(())
    }

    /// Stat a file and check it against the byte limit.
    ///
    /// Returns the file size.
    pub fn check_file(&self, path: &Path) -> PipelineResult<u64> {
        let source_name = path.display().to_string();
        let metadata = std::fs::metadata(path).map_err(|e| PipelineError::Io {
            source_name: source_name.clone(),
            message: format!("Cannot read metadata: {}", e),
        })?;
        if !metadata.is_file() {
            return Err(PipelineError::Io {
                source_name,
                message: "Not a regular file".to_string(),
            });
        }
        self.check_size(&source_name, metadata.len())?;
        Ok(metadata.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_signature_jpeg() {
        let header = [0xFF, 0xD8, 0xFF, 0xE0, 0, 0, 0, 0];
        assert_eq!(SourceFormat::from_signature(&header), Some(SourceFormat::Jpeg));
    }

    #[test]
    fn test_signature_png() {
        let header = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0];
        assert_eq!(SourceFormat::from_signature(&header), Some(SourceFormat::Png));
    }

    #[test]
    fn test_signature_rejects_other_formats() {
        assert_eq!(SourceFormat::from_signature(b"GIF89a"), None);
        assert_eq!(SourceFormat::from_signature(b"RIFF\0\0\0\0WEBP"), None);
        assert_eq!(SourceFormat::from_signature(&[0xFF, 0xD8]), None);
        assert_eq!(SourceFormat::from_signature(&[]), None);
    }

    #[test]
    fn test_extension_mapping() {
        assert_eq!(SourceFormat::from_extension("jpg"), Some(SourceFormat::Jpeg));
        assert_eq!(SourceFormat::from_extension("jpeg"), Some(SourceFormat::Jpeg));
        assert_eq!(SourceFormat::from_extension("png"), Some(SourceFormat::Png));
        assert_eq!(SourceFormat::from_extension("webp"), None);
    }

    #[test]
    fn test_check_size() {
        let validator = Validator::new(LimitsConfig {
            max_file_size_mb: 1,
            ..LimitsConfig::default()
        });
        assert!(validator.check_size("a", 1024 * 1024).is_ok());
        let err = validator.check_size("a", 1024 * 1024 + 1).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::LimitExceeded);
    }

    #[test]
    fn test_check_dimensions() {
        let validator = Validator::new(LimitsConfig {
            max_image_dimension: 100,
            ..LimitsConfig::default()
        });
        assert!(validator.check_dimensions("a", 100, 100).is_ok());
        assert!(validator.check_dimensions("a", 101, 1).is_err());
    }

    #[test]
    fn test_check_file_missing_is_io_error() {
        let validator = Validator::new(LimitsConfig::default());
        let err = validator
            .check_file(Path::new("/definitely/not/here.jpg"))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Io);
    }

    #[test]
    fn test_check_file_reports_size() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tiny.png");
        std::fs::write(&path, [0u8; 12]).unwrap();
        let validator = Validator::new(LimitsConfig::default());
        assert_eq!(validator.check_file(&path).unwrap(), 12);
    }
}
