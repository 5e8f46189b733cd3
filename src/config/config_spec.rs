use std::sync::Arc;

use crate::config::EnvironmentProvider;
use crate::config::errors::ApplicationError;

/// Configuration specification with environment override → default priority
pub struct ConfigSpec {
    env_provider: Arc<dyn EnvironmentProvider + Send + Sync>,
    pub env_override: Option<String>,
    pub default_value: Option<String>,
    pub required: bool,
    pub min_length: Option<usize>,
    pub validator: Option<fn(&str) -> Result<(), String>>,
}

impl ConfigSpec {
    pub fn new(env_provider: Arc<dyn EnvironmentProvider + Send + Sync>) -> Self {
        Self {
            env_provider,
            env_override: None,
            default_value: None,
            required: false,
            min_length: None,
            validator: None,
        }
    }

    pub fn env_override(mut self, name: &str) -> Self {
        self.env_override = Some(name.to_string());
        self
    }

    pub fn default_value(mut self, value: &str) -> Self {
        self.default_value = Some(value.to_string());
        self
    }

    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    pub fn min_length(mut self, length: usize) -> Self {
        self.min_length = Some(length);
        self
    }

    pub fn validator(mut self, f: fn(&str) -> Result<(), String>) -> Self {
        self.validator = Some(f);
        self
    }

    fn setting_name(&self) -> &str {
        self.env_override.as_deref().unwrap_or("unknown_setting")
    }

    /// Resolve the value: environment first, then the default
    ///
    /// Returns `Ok(None)` for an optional setting with neither source.
    pub fn load_optional(&self) -> Result<Option<String>, ApplicationError> {
        if let Some(env_var) = &self.env_override {
            if let Some(value) = self.env_provider.get_var(env_var) {
                self.validate_value(&value, env_var)?;
                return Ok(Some(value));
            }
        }

        if let Some(default) = &self.default_value {
            self.validate_value(default, "default")?;
            return Ok(Some(default.clone()));
        }

        if self.required {
            return Err(ApplicationError::InvalidSetting {
                setting_name: self.setting_name().to_string(),
                reason: "Required setting has no value from any source".to_string(),
            });
        }

        Ok(None)
    }

    /// Like `load_optional` but an absent optional value becomes empty
    pub fn load(&self) -> Result<String, ApplicationError> {
        Ok(self.load_optional()?.unwrap_or_default())
    }

    /// Validate a setting value according to the ConfigSpec rules
    pub fn validate_value(&self, value: &str, setting_name: &str) -> Result<(), ApplicationError> {
        if let Some(min_len) = self.min_length {
            if value.len() < min_len {
                return Err(ApplicationError::InvalidSetting {
                    setting_name: setting_name.to_string(),
                    reason: format!("Value must be at least {} characters long", min_len),
                });
            }
        }

        if let Some(validator) = self.validator {
            validator(value).map_err(|reason| ApplicationError::InvalidSetting {
                setting_name: setting_name.to_string(),
                reason,
            })?;
        }

        Ok(())
    }
}

/// Type parsing utilities for configuration values
impl ConfigSpec {
    /// Parse a port number, rejecting 0
    pub fn parse_port(value: &str, setting_name: &str) -> Result<u16, ApplicationError> {
        let port = value.trim().parse::<u16>().map_err(|e| ApplicationError::ParseError {
            setting_name: setting_name.to_string(),
            error: format!("Expected port number (1-65535), got '{}': {}", value, e),
        })?;

        if port == 0 {
            return Err(ApplicationError::InvalidSetting {
                setting_name: setting_name.to_string(),
                reason: "Port number must be between 1 and 65535".to_string(),
            });
        }

        Ok(port)
    }

    /// Parse a strictly positive count (minutes, requests per minute)
    pub fn parse_positive(value: &str, setting_name: &str) -> Result<u32, ApplicationError> {
        match value.trim().parse::<u32>() {
            Ok(0) => Err(ApplicationError::InvalidSetting {
                setting_name: setting_name.to_string(),
                reason: "Value must be greater than zero".to_string(),
            }),
            Ok(n) => Ok(n),
            Err(e) => Err(ApplicationError::ParseError {
                setting_name: setting_name.to_string(),
                error: format!("Expected positive integer, got '{}': {}", value, e),
            }),
        }
    }

    /// Parse true/false, also accepting 1/0 and yes/no
    pub fn parse_bool(value: &str, setting_name: &str) -> Result<bool, ApplicationError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" => Ok(true),
            "false" | "0" | "no" => Ok(false),
            other => Err(ApplicationError::ParseError {
                setting_name: setting_name.to_string(),
                error: format!("Expected true or false, got '{}'", other),
            }),
        }
    }

    /// Reject empty or whitespace-bearing host values
    pub fn validate_host_address(value: &str) -> Result<(), String> {
        let host = value.trim();
        if host.is_empty() {
            return Err("Host address cannot be empty".to_string());
        }
        if host.chars().any(char::is_whitespace) {
            return Err("Host address cannot contain whitespace characters".to_string());
        }
        Ok(())
    }
}
