//! Application configuration loaded from environment variables.

use std::env;

use blogly_infra::database::DatabaseConfig;

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database: Option<DatabaseConfig>,
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from any key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let database = lookup("DATABASE_URL")
            .filter(|url| !url.is_empty())
            .map(|url| {
                let defaults = DatabaseConfig::new(url);
                DatabaseConfig {
                    max_connections: lookup("DB_MAX_CONNECTIONS")
                        .and_then(|s| s.parse().ok())
                        .unwrap_or(defaults.max_connections),
                    min_connections: lookup("DB_MIN_CONNECTIONS")
                        .and_then(|s| s.parse().ok())
                        .unwrap_or(defaults.min_connections),
                    sql_logging: lookup("DB_SQL_LOGGING")
                        .and_then(|v| parse_flag(&v))
                        .unwrap_or(defaults.sql_logging),
                    ..defaults
                }
            });

        Self { database }
    }
}

/// Boolean environment flag; unrecognised values yield `None`.
fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> AppConfig {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_no_database_url() {
        assert!(config_from(&[]).database.is_none());
        assert!(config_from(&[("DATABASE_URL", "")]).database.is_none());
    }

    #[test]
    fn test_database_defaults() {
        let db = config_from(&[("DATABASE_URL", "postgres:///blogly")])
            .database
            .unwrap();
        assert_eq!(db.url, "postgres:///blogly");
        assert_eq!(db.max_connections, 10);
        assert_eq!(db.min_connections, 1);
        assert!(!db.sql_logging);
    }

    #[test]
    fn test_database_overrides() {
        let db = config_from(&[
            ("DATABASE_URL", "postgres:///blogly"),
            ("DB_MAX_CONNECTIONS", "25"),
            ("DB_MIN_CONNECTIONS", "not-a-number"),
            ("DB_SQL_LOGGING", "1"),
        ])
        .database
        .unwrap();
        assert_eq!(db.max_connections, 25);
        assert_eq!(db.min_connections, 1);
        assert!(db.sql_logging);
    }

    #[test]
    fn test_sql_logging_flag_spellings() {
        let sql_logging = |value: &str| {
            config_from(&[("DATABASE_URL", "postgres:///blogly"), ("DB_SQL_LOGGING", value)])
                .database
                .unwrap()
                .sql_logging
        };

        for off in ["FALSE", "no", "Off", "0"] {
            assert!(!sql_logging(off), "{off} should disable SQL logging");
        }
        for on in ["TRUE", "yes", "on", "1"] {
            assert!(sql_logging(on), "{on} should enable SQL logging");
        }
        assert!(!sql_logging("maybe"));
    }
}
