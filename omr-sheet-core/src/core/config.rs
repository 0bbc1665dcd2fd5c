//! Configuration error types and validation traits.

use thiserror::Error;

/// Errors that can occur during configuration validation.
///
/// Layout parameters and extractor settings are validated before use; a
/// rejected value surfaces as one of these variants.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Error indicating that a configuration is invalid.
    #[error("invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// Error indicating that validation failed.
    #[error("validation failed: {message}")]
    ValidationFailed { message: String },
}

/// A trait for validating configuration parameters.
///
/// Implementors provide [`validate`](ConfigValidator::validate) and
/// [`get_defaults`](ConfigValidator::get_defaults); the provided helpers cover the
/// checks shared by the layout and extractor configurations.
pub trait ConfigValidator {
    /// Validates the configuration.
    ///
    /// # Returns
    ///
    /// A Result indicating success or a ConfigError if validation fails.
    fn validate(&self) -> Result<(), ConfigError>;

    /// Returns the default configuration.
    fn get_defaults() -> Self
    where
        Self: Sized;

    /// Validates that a dimension is strictly positive.
    ///
    /// # Arguments
    ///
    /// * `name` - The parameter name, used in the error message.
    /// * `value` - The value to validate.
    fn validate_positive(&self, name: &str, value: i32) -> Result<(), ConfigError> {
        if value <= 0 {
            Err(ConfigError::InvalidConfig {
                message: format!("{name} must be positive, got {value}"),
            })
        } else {
            Ok(())
        }
    }

    /// Validates that a distance is not negative.
    ///
    /// # Arguments
    ///
    /// * `name` - The parameter name, used in the error message.
    /// * `value` - The value to validate.
    fn validate_non_negative(&self, name: &str, value: i32) -> Result<(), ConfigError> {
        if value < 0 {
            Err(ConfigError::InvalidConfig {
                message: format!("{name} must not be negative, got {value}"),
            })
        } else {
            Ok(())
        }
    }

    /// Validates a ratio threshold.
    ///
    /// This method checks that the threshold is between 0.0 and 1.0.
    fn validate_ratio_threshold(&self, name: &str, threshold: f64) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&threshold) {
            Err(ConfigError::InvalidConfig {
                message: format!("{name} must be between 0.0 and 1.0, got {threshold}"),
            })
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Settings;

    impl ConfigValidator for Settings {
        fn validate(&self) -> Result<(), ConfigError> {
            Ok(())
        }

        fn get_defaults() -> Self {
            Settings
        }
    }

    #[test]
    fn test_validate_positive() {
        assert!(Settings.validate_positive("page_width", 1).is_ok());
        assert!(Settings.validate_positive("page_width", 0).is_err());
        assert!(Settings.validate_positive("page_width", -3).is_err());
    }

    #[test]
    fn test_validate_non_negative() {
        assert!(Settings.validate_non_negative("left_margin", 0).is_ok());
        let err = Settings.validate_non_negative("left_margin", -1).unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid configuration: left_margin must not be negative, got -1"
        );
    }

    #[test]
    fn test_validate_ratio_threshold() {
        assert!(Settings.validate_ratio_threshold("fill", 0.5).is_ok());
        assert!(Settings.validate_ratio_threshold("fill", 1.5).is_err());
    }
}
