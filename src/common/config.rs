use std::{path::PathBuf, time::Duration};

use serde::{Deserialize, Serialize};

use crate::common::error::AppError;

/// Settings for the command line front end.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// JSON snapshot holding parties and transactions.
    pub data_file: PathBuf,
    /// Quiet period before a live party rename is sent to the store.
    pub rename_debounce_ms: u64,
    /// One of `trace`, `debug`, `info`, `warn`, `error`.
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_file: PathBuf::from("ledger.json"),
            rename_debounce_ms: 500,
            log_level: "warn".to_string(),
        }
    }
}

impl Config {
    pub fn load(path: &str) -> Result<Self, AppError> {
        let content = std::fs::read_to_string(path).map_err(|source| AppError::ReadConfig {
            path: path.to_string(),
            source,
        })?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self, AppError> {
        Ok(toml::from_str(content)?)
    }

    pub fn rename_delay(&self) -> Duration {
        Duration::from_millis(self.rename_debounce_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_uses_defaults() {
        assert_eq!(Config::parse("").unwrap(), Config::default());
        assert_eq!(Config::default().rename_delay(), Duration::from_millis(500));
    }

    #[test]
    fn overrides_selected_keys() {
        let config = Config::parse("data_file = \"/tmp/debts.json\"\nrename_debounce_ms = 250\n").unwrap();
        assert_eq!(config.data_file, PathBuf::from("/tmp/debts.json"));
        assert_eq!(config.rename_debounce_ms, 250);
        assert_eq!(config.log_level, "warn");
    }

    #[test]
    fn rejects_malformed_toml() {
        assert!(matches!(
            Config::parse("rename_debounce_ms = \"soon\""),
            Err(AppError::Config(_))
        ));
    }

    #[test]
    fn missing_file_names_the_path() {
        let err = Config::load("/nonexistent/debt_ledger.toml").unwrap_err();
        assert!(err.to_string().contains("/nonexistent/debt_ledger.toml"));
    }
}
