//! Engine configuration.
//!
//! Configuration is loaded from environment variables with fallback to defaults.
//!
//! | Variable                   | Default               |
//! |----------------------------|-----------------------|
//! | `CASHDESK_DB_PATH`         | `./cashdesk.db`       |
//! | `CASHDESK_MAX_CONNECTIONS` | `5`                   |
//! | `CASHDESK_TOLERANCE_CENTS` | `1`                   |
//! | `CASHDESK_CASH_METHOD`     | `Efectivo`            |

use std::collections::HashMap;
use std::env;
use std::path::PathBuf;

use cashdesk_core::Money;
use serde::{Deserialize, Serialize};

use crate::pool::DbConfig;

const DEFAULT_DB_PATH: &str = "./cashdesk.db";
const DEFAULT_CASH_METHOD: &str = "Efectivo";

/// Engine configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CashdeskConfig {
    /// SQLite database file
    pub database_path: PathBuf,

    /// Pool size
    pub max_connections: u32,

    /// Reconciliation tolerance in cents. A difference strictly smaller
    /// than this is classified as matched.
    pub tolerance_cents: i64,

    /// Display name given to the cash payment method when seeding the
    /// standard catalog.
    pub cash_method_name: String,
}

impl Default for CashdeskConfig {
    fn default() -> Self {
        CashdeskConfig {
            database_path: PathBuf::from(DEFAULT_DB_PATH),
            max_connections: 5,
            tolerance_cents: 1,
            cash_method_name: DEFAULT_CASH_METHOD.to_string(),
        }
    }
}

impl CashdeskConfig {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(env::vars())
    }

    /// Load configuration from an explicit set of variables.
    pub fn from_vars<I>(vars: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let vars: HashMap<String, String> = vars.into_iter().collect();
        let defaults = CashdeskConfig::default();

        let config = CashdeskConfig {
            database_path: vars
                .get("CASHDESK_DB_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.database_path),

            max_connections: match vars.get("CASHDESK_MAX_CONNECTIONS") {
                Some(raw) => raw
                    .trim()
                    .parse()
                    .map_err(|_| ConfigError::InvalidValue("CASHDESK_MAX_CONNECTIONS".to_string()))?,
                None => defaults.max_connections,
            },

            tolerance_cents: match vars.get("CASHDESK_TOLERANCE_CENTS") {
                Some(raw) => raw
                    .trim()
                    .parse()
                    .map_err(|_| ConfigError::InvalidValue("CASHDESK_TOLERANCE_CENTS".to_string()))?,
                None => defaults.tolerance_cents,
            },

            cash_method_name: vars
                .get("CASHDESK_CASH_METHOD")
                .map(|name| name.trim().to_string())
                .unwrap_or(defaults.cash_method_name),
        };

        if config.max_connections == 0 {
            return Err(ConfigError::InvalidValue("CASHDESK_MAX_CONNECTIONS".to_string()));
        }
        if config.tolerance_cents <= 0 {
            return Err(ConfigError::InvalidValue("CASHDESK_TOLERANCE_CENTS".to_string()));
        }
        if config.cash_method_name.is_empty() {
            return Err(ConfigError::MissingRequired("CASHDESK_CASH_METHOD".to_string()));
        }

        Ok(config)
    }

    /// Builds the database configuration.
    pub fn db_config(&self) -> DbConfig {
        DbConfig::new(&self.database_path)
            .max_connections(self.max_connections)
            .tolerance(Money::from_cents(self.tolerance_cents))
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        let config = CashdeskConfig::from_vars(Vec::new()).unwrap();
        assert_eq!(config, CashdeskConfig::default());
        assert_eq!(config.db_config().tolerance, Money::from_cents(1));
    }

    #[test]
    fn reads_overrides() {
        let config = CashdeskConfig::from_vars(vars(&[
            ("CASHDESK_DB_PATH", "/var/lib/cashdesk/main.db"),
            ("CASHDESK_MAX_CONNECTIONS", "8"),
            ("CASHDESK_TOLERANCE_CENTS", "50"),
            ("CASHDESK_CASH_METHOD", "Cash"),
        ]))
        .unwrap();

        assert_eq!(config.max_connections, 8);
        assert_eq!(config.cash_method_name, "Cash");

        let db = config.db_config();
        assert_eq!(db.database_path, PathBuf::from("/var/lib/cashdesk/main.db"));
        assert_eq!(db.tolerance, Money::from_cents(50));
    }

    #[test]
    fn rejects_bad_values() {
        assert!(CashdeskConfig::from_vars(vars(&[("CASHDESK_MAX_CONNECTIONS", "lots")])).is_err());
        assert!(CashdeskConfig::from_vars(vars(&[("CASHDESK_MAX_CONNECTIONS", "0")])).is_err());
        assert!(CashdeskConfig::from_vars(vars(&[("CASHDESK_TOLERANCE_CENTS", "-5")])).is_err());
        assert!(matches!(
            CashdeskConfig::from_vars(vars(&[("CASHDESK_CASH_METHOD", "  ")])),
            Err(ConfigError::MissingRequired(_))
        ));
    }
}
