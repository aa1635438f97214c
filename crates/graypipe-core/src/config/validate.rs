//! Configuration validation with range checks.

use crate::error::ConfigError;

use super::Config;

impl Config {
    /// Validate configuration values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pipeline.buffer_size == 0 {
            return Err(ConfigError::ValidationError(
                "pipeline.buffer_size must be > 0".into(),
            ));
        }
        if self.paths.input_segment.is_empty() {
            return Err(ConfigError::ValidationError(
                "paths.input_segment must not be empty".into(),
            ));
        }
        if self.paths.input_segment == self.paths.output_segment {
            return Err(ConfigError::ValidationError(
                "paths.output_segment must differ from paths.input_segment".into(),
            ));
        }
        if self.transform.width == 0 {
            return Err(ConfigError::ValidationError(
                "transform.width must be > 0".into(),
            ));
        }
        if self.transform.height == 0 {
            return Err(ConfigError::ValidationError(
                "transform.height must be > 0".into(),
            ));
        }
        if !(1..=100).contains(&self.output.jpeg_quality) {
            return Err(ConfigError::ValidationError(
                "output.jpeg_quality must be between 1 and 100".into(),
            ));
        }
        if self.report.path.is_empty() {
            return Err(ConfigError::ValidationError(
                "report.path must not be empty".into(),
            ));
        }
        Ok(())
    }
}
