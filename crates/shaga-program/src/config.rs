//! Program parameters.
//!
//! Configurable bounds applied by the transition handlers:
//! - Maximum rental horizon
//! - Marketplace fee in basis points
//! - Schedule fee
//! - Registry listing capacity

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Seconds in one hour.
pub const SECONDS_PER_HOUR: u64 = 3600;

/// Basis points in 100%.
pub const MAX_BASIS_POINTS: u16 = 10_000;

/// Marketplace program parameters.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ProgramConfig {
    /// Longest rental a client may book, measured from the start time.
    pub max_rental_duration_secs: u64,
    /// Marketplace fee charged on top of rent, in basis points.
    pub fee_bps: u16,
    /// Lamports deposited into every schedule account.
    pub thread_fee: u64,
    /// Capacity of the registry listing.
    pub max_affairs: usize,
}

impl Default for ProgramConfig {
    fn default() -> Self {
        Self {
            max_rental_duration_secs: 7 * 24 * SECONDS_PER_HOUR,
            fee_bps: 100, // 1%
            thread_fee: 1_000,
            max_affairs: 100,
        }
    }
}

impl ProgramConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is invalid or a value is out of range.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any value is out of range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_rental_duration_secs == 0 {
            return Err(ConfigError::Invalid(
                "max_rental_duration_secs must be positive".to_string(),
            ));
        }
        if self.fee_bps > MAX_BASIS_POINTS {
            return Err(ConfigError::Invalid(format!(
                "fee_bps must be at most {MAX_BASIS_POINTS}, got {}",
                self.fee_bps
            )));
        }
        if self.thread_fee == 0 {
            return Err(ConfigError::Invalid("thread_fee must be positive".to_string()));
        }
        if self.max_affairs == 0 {
            return Err(ConfigError::Invalid("max_affairs must be positive".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_are_valid() {
        let config = ProgramConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.fee_bps, 100);
        assert_eq!(config.max_affairs, 100);
        assert_eq!(config.max_rental_duration_secs, 604_800);
    }

    #[test]
    fn partial_toml_uses_defaults() {
        let config = ProgramConfig::from_toml("fee_bps = 250\n").unwrap();
        assert_eq!(config.fee_bps, 250);
        assert_eq!(config.thread_fee, 1_000);
    }

    #[test]
    fn fee_above_100_percent_rejected() {
        let err = ProgramConfig::from_toml("fee_bps = 10001\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn zero_capacity_rejected() {
        let err = ProgramConfig::from_toml("max_affairs = 0\n").unwrap_err();
        assert!(err.to_string().contains("max_affairs"));
    }

    #[test]
    fn malformed_toml() {
        let err = ProgramConfig::from_toml("fee_bps = \"lots\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "max_rental_duration_secs = 3600").unwrap();
        writeln!(file, "thread_fee = 5000").unwrap();
        let config = ProgramConfig::from_file(file.path()).unwrap();
        assert_eq!(config.max_rental_duration_secs, 3600);
        assert_eq!(config.thread_fee, 5000);
    }

    #[test]
    fn missing_file() {
        let err = ProgramConfig::from_file(Path::new("/nonexistent/shaga.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
