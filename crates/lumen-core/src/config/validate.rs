//! Configuration validation with range checks.

use crate::error::ConfigError;
use crate::output::OutputFormat;

use super::Config;

impl Config {
    /// Validate configuration values are within acceptable ranges.
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.engine.max_workers == 0 {
            return Err(ConfigError::ValidationError(
                "engine.max_workers must be > 0".into(),
            ));
        }
        if self.engine.acquire_timeout_ms == 0 {
            return Err(ConfigError::ValidationError(
                "engine.acquire_timeout_ms must be > 0".into(),
            ));
        }
        if self.cache.shards == 0 {
            return Err(ConfigError::ValidationError(
                "cache.shards must be > 0".into(),
            ));
        }
        if self.cache.max_entries < self.cache.shards {
            return Err(ConfigError::ValidationError(
                "cache.max_entries must be >= cache.shards".into(),
            ));
        }
        if self.limits.max_file_size_mb == 0 {
            return Err(ConfigError::ValidationError(
                "limits.max_file_size_mb must be > 0".into(),
            ));
        }
        if self.limits.max_image_dimension == 0 {
            return Err(ConfigError::ValidationError(
                "limits.max_image_dimension must be > 0".into(),
            ));
        }
        if !(1..=100).contains(&self.processing.default_quality) {
            return Err(ConfigError::ValidationError(
                "processing.default_quality must be between 1 and 100".into(),
            ));
        }
        if self.palette.sample_count == 0 {
            return Err(ConfigError::ValidationError(
                "palette.sample_count must be > 0".into(),
            ));
        }
        if OutputFormat::parse(&self.output.format).is_none() {
            return Err(ConfigError::ValidationError(format!(
                "output.format must be json or jsonl, got {:?}",
                self.output.format
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_passes_validation() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_workers() {
        let mut config = Config::default();
        config.engine.max_workers = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("max_workers"));
    }

    #[test]
    fn test_validate_rejects_fewer_entries_than_shards() {
        let mut config = Config::default();
        config.cache.shards = 8;
        config.cache.max_entries = 4;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("max_entries"));
    }

    #[test]
    fn test_validate_rejects_out_of_range_quality() {
        let mut config = Config::default();
        config.processing.default_quality = 0;
        assert!(config.validate().is_err());

        config.processing.default_quality = 101;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("default_quality"));
    }

    #[test]
    fn test_validate_rejects_unknown_output_format() {
        let mut config = Config::default();
        config.output.format = "xml".into();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("output.format"));
    }
}
