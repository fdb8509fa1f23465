//! Ledger service settings

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use core_kernel::CoreError;

use crate::error::LedgerError;
use crate::pagination::PageRequest;

/// Tunables for the ledger services
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// How many times a lost balance compare-and-swap is redone
    pub max_cas_attempts: u32,
    pub default_page_size: u32,
    pub max_page_size: u32,
    /// IANA zone used for exact-day filters
    pub timezone: Tz,
    /// Session balance refresh period
    pub refresh_interval_secs: u64,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            max_cas_attempts: 5,
            default_page_size: 25,
            max_page_size: 100,
            timezone: Tz::UTC,
            refresh_interval_secs: 10,
        }
    }
}

impl LedgerConfig {
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.max_cas_attempts == 0 {
            return Err(CoreError::Configuration(
                "max_cas_attempts must be at least 1".to_string(),
            ));
        }
        if self.default_page_size == 0 || self.max_page_size == 0 {
            return Err(CoreError::Configuration("page sizes must be at least 1".to_string()));
        }
        if self.default_page_size > self.max_page_size {
            return Err(CoreError::Configuration(format!(
                "default_page_size {} exceeds max_page_size {}",
                self.default_page_size, self.max_page_size
            )));
        }
        if self.refresh_interval_secs == 0 {
            return Err(CoreError::Configuration(
                "refresh_interval_secs must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Builds a page request from optional caller input, capping the size
    pub fn page_request(&self, page: Option<u32>, page_size: Option<u32>) -> Result<PageRequest, LedgerError> {
        let size = page_size.unwrap_or(self.default_page_size).min(self.max_page_size);
        PageRequest::new(page.unwrap_or(1), size)
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = LedgerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.refresh_interval(), Duration::from_secs(10));
    }

    #[test]
    fn test_page_size_is_capped() {
        let config = LedgerConfig::default();
        let req = config.page_request(Some(2), Some(500)).unwrap();
        assert_eq!(req.page_size(), 100);
        assert_eq!(req.page(), 2);

        let req = config.page_request(None, None).unwrap();
        assert_eq!(req.page_size(), 25);
        assert_eq!(req.page(), 1);
    }

    #[test]
    fn test_zero_page_rejected() {
        let config = LedgerConfig::default();
        assert!(config.page_request(Some(0), None).is_err());
        assert!(config.page_request(None, Some(0)).is_err());
    }

    #[test]
    fn test_invalid_config() {
        let config = LedgerConfig {
            max_cas_attempts: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(CoreError::Configuration(_))));
    }

    #[test]
    fn test_timezone_deserializes_from_name() {
        let config: LedgerConfig =
            serde_json::from_str(r#"{ "timezone": "Asia/Kolkata" }"#).unwrap();
        assert_eq!(config.timezone, chrono_tz::Asia::Kolkata);
        assert_eq!(config.max_cas_attempts, 5);
    }
}
