//! Configuration validation with range checks.

use crate::error::ConfigError;

use super::Config;

impl Config {
    /// Validate configuration values are within acceptable ranges.
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        let v = &self.validator;
        if v.min_width == 0 || v.min_height == 0 {
            return Err(ConfigError::ValidationError(
                "validator.min_width and validator.min_height must be > 0".into(),
            ));
        }
        if v.min_width > v.max_width || v.min_height > v.max_height {
            return Err(ConfigError::ValidationError(
                "validator minimum dimensions must not exceed maximum dimensions".into(),
            ));
        }
        let (low, high) = v.aspect_ratio_range;
        if low <= 0.0 || low > high {
            return Err(ConfigError::ValidationError(
                "validator.aspect_ratio_range must be positive and ordered".into(),
            ));
        }
        if v.max_color_diff < 0.0 {
            return Err(ConfigError::ValidationError(
                "validator.max_color_diff must be >= 0".into(),
            ));
        }
        if v.min_brightness < 0.0 || v.max_brightness > 255.0 || v.min_brightness >= v.max_brightness
        {
            return Err(ConfigError::ValidationError(
                "validator brightness bounds must satisfy 0 <= min_brightness < max_brightness <= 255"
                    .into(),
            ));
        }
        if v.min_contrast < 0.0 {
            return Err(ConfigError::ValidationError(
                "validator.min_contrast must be >= 0".into(),
            ));
        }
        if self.scan.image_size == 0 {
            return Err(ConfigError::ValidationError(
                "scan.image_size must be > 0".into(),
            ));
        }
        if self.scan.class_names.len() != 2 {
            return Err(ConfigError::ValidationError(
                "scan.class_names must contain exactly two labels".into(),
            ));
        }
        if self.scan.threshold <= 0.0 || self.scan.threshold >= 1.0 {
            return Err(ConfigError::ValidationError(
                "scan.threshold must be between 0.0 and 1.0 (exclusive)".into(),
            ));
        }
        if self.assistant.temperature < 0.0 || self.assistant.temperature > 2.0 {
            return Err(ConfigError::ValidationError(
                "assistant.temperature must be between 0.0 and 2.0".into(),
            ));
        }
        if self.assistant.max_tokens == 0 {
            return Err(ConfigError::ValidationError(
                "assistant.max_tokens must be > 0".into(),
            ));
        }
        if self.server.port == 0 {
            return Err(ConfigError::ValidationError(
                "server.port must be > 0".into(),
            ));
        }
        Ok(())
    }
}
