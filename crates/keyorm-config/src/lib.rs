//! TOML configuration for keyorm sessions.
//!
//! ```toml
//! [sql]
//! dialect = "postgres"
//! log_statements = true
//!
//! [session]
//! fetch_size = 100
//! cache = "identity"
//! ```

use keyorm_core::db::{
    CachePolicy, SessionConfig,
    sql::{Dialect, dialect_by_name},
};
use serde::Deserialize;
use std::{fs, path::Path, str::FromStr};
use thiserror::Error as ThisError;

///
/// ConfigError
///

#[derive(Debug, ThisError)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("unknown SQL dialect '{0}'")]
    UnknownDialect(String),
}

///
/// OrmConfig
///
/// Every section and key is optional; missing values take the defaults a
/// `Session::new` would use.
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct OrmConfig {
    pub sql: SqlConfig,
    pub session: SessionSection,
}

impl OrmConfig {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;

        text.parse()
    }

    /// Dialect named by `sql.dialect`.
    pub fn dialect(&self) -> Result<Box<dyn Dialect>, ConfigError> {
        dialect_by_name(&self.sql.dialect)
            .ok_or_else(|| ConfigError::UnknownDialect(self.sql.dialect.clone()))
    }
}

impl FromStr for OrmConfig {
    type Err = ConfigError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let config: Self = toml::from_str(text)?;
        config.dialect()?;

        Ok(config)
    }
}

impl From<&OrmConfig> for SessionConfig {
    fn from(config: &OrmConfig) -> Self {
        Self {
            cache: config.session.cache.into(),
            fetch_size: config.session.fetch_size,
            log_statements: config.sql.log_statements,
        }
    }
}

///
/// SqlConfig
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct SqlConfig {
    /// `ansi`, `sqlite`, `mysql`, `postgres` or `offset-fetch`.
    pub dialect: String,
    pub log_statements: bool,
}

impl Default for SqlConfig {
    fn default() -> Self {
        Self {
            dialect: "ansi".to_string(),
            log_statements: true,
        }
    }
}

///
/// SessionSection
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct SessionSection {
    /// Fetch-size hint for queries that carry none.
    pub fetch_size: Option<u32>,
    pub cache: CacheSetting,
}

///
/// CacheSetting
///

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum CacheSetting {
    #[default]
    Identity,
    None,
}

impl From<CacheSetting> for CachePolicy {
    fn from(setting: CacheSetting) -> Self {
        match setting {
            CacheSetting::Identity => Self::Identity,
            CacheSetting::None => Self::None,
        }
    }
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_uses_session_defaults() {
        let config: OrmConfig = "".parse().expect("empty config");

        assert_eq!(config, OrmConfig::default());
        assert_eq!(SessionConfig::from(&config), SessionConfig::default());
    }

    #[test]
    fn full_document_maps_onto_session_config() {
        let config: OrmConfig = r#"
            [sql]
            dialect = "postgres"
            log_statements = false

            [session]
            fetch_size = 100
            cache = "none"
        "#
        .parse()
        .expect("valid config");

        let session = SessionConfig::from(&config);
        assert_eq!(session.cache, CachePolicy::None);
        assert_eq!(session.fetch_size, Some(100));
        assert!(!session.log_statements);
        assert_eq!(config.dialect().expect("known dialect").name(), "postgres");
    }

    #[test]
    fn partial_sections_keep_remaining_defaults() {
        let config: OrmConfig = "[session]\nfetch_size = 25\n".parse().expect("valid");

        assert_eq!(config.sql, SqlConfig::default());
        assert_eq!(config.session.cache, CacheSetting::Identity);
        assert_eq!(config.session.fetch_size, Some(25));
    }

    #[test]
    fn unknown_dialect_is_rejected() {
        let err = "[sql]\ndialect = \"oracle\"\n"
            .parse::<OrmConfig>()
            .expect_err("no oracle dialect");

        assert!(matches!(err, ConfigError::UnknownDialect(name) if name == "oracle"));
    }

    #[test]
    fn unknown_keys_and_bad_values_fail_to_parse() {
        assert!(matches!(
            "[sql]\nverbose = true\n".parse::<OrmConfig>(),
            Err(ConfigError::Parse(_))
        ));
        assert!(matches!(
            "[session]\ncache = \"lru\"\n".parse::<OrmConfig>(),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn missing_file_reports_its_path() {
        let err = OrmConfig::from_path("/nonexistent/keyorm.toml").expect_err("no such file");

        assert!(err.to_string().contains("/nonexistent/keyorm.toml"));
    }
}
