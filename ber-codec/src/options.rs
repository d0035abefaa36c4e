//! Writer configuration

use ber_core::{BerError, BerResult};
use serde::{Deserialize, Serialize};

/// Buffer sizing for a [`Writer`](crate::Writer)
///
/// The writer starts with `size` bytes and multiplies its capacity by
/// `growth_factor` whenever a write would not fit. Missing fields take their
/// defaults when deserialized, so the struct can sit in a host application's
/// config file as a partial table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WriterOptions {
    /// Initial arena size in bytes
    pub size: usize,
    /// Multiplier applied to the arena size on growth
    pub growth_factor: usize,
}

impl WriterOptions {
    /// Default initial arena size
    pub const DEFAULT_SIZE: usize = 1024;
    /// Default growth multiplier
    pub const DEFAULT_GROWTH_FACTOR: usize = 8;

    /// Check the options before a writer is built from them
    ///
    /// # Error Handling
    /// Returns `BerError::InvalidArgument` if `growth_factor` is 0.
    pub fn validate(&self) -> BerResult<()> {
        if self.growth_factor == 0 {
            return Err(BerError::InvalidArgument(
                "growth_factor must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for WriterOptions {
    fn default() -> Self {
        Self {
            size: Self::DEFAULT_SIZE,
            growth_factor: Self::DEFAULT_GROWTH_FACTOR,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = WriterOptions::default();
        assert_eq!(options.size, 1024);
        assert_eq!(options.growth_factor, 8);
        assert!(options.validate().is_ok());
    }

    #[test]
    fn test_zero_growth_factor_rejected() {
        let options = WriterOptions { size: 16, growth_factor: 0 };
        let err = options.validate().unwrap_err();
        assert_eq!(err.kind(), ber_core::ErrorKind::InvalidArgument);
    }

    #[test]
    fn test_deserialize_partial_table() {
        let options: WriterOptions = serde_json::from_str(r#"{"size": 64}"#).unwrap();
        assert_eq!(options.size, 64);
        assert_eq!(options.growth_factor, WriterOptions::DEFAULT_GROWTH_FACTOR);

        let options: WriterOptions = serde_json::from_str("{}").unwrap();
        assert_eq!(options, WriterOptions::default());

        let options: WriterOptions =
            serde_json::from_str(r#"{"size": 16, "growth_factor": 0}"#).unwrap();
        assert!(options.validate().is_err());
    }
}
