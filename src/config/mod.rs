//! Process configuration.
//!
//! Every recognized option is consolidated here: built once at startup from
//! CLI flags / environment variables (clap handles both), then passed to the
//! store and API components. Database options are read from `TASKD_DB_*`
//! environment variables, with `DATABASE_URL` overriding all of them when set.

const DEFAULT_PORT: u16 = 3000;
const DEFAULT_ENVIRONMENT: &str = "development";
const DEFAULT_LOG: &str = "info";
const DEFAULT_LOG_FORMAT: &str = "pretty";
const DEFAULT_DB_HOST: &str = "localhost";
const DEFAULT_DB_PORT: u16 = 5432;
const DEFAULT_DB_NAME: &str = "taskdb";
const DEFAULT_DB_USER: &str = "postgres";
const DEFAULT_DB_PASSWORD: &str = "password";

/// Database connection settings.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Full connection URL (`DATABASE_URL`). When set, the individual
    /// host/port/name/credential fields below are ignored.
    pub url: Option<String>,
    /// Database host (`TASKD_DB_HOST`, default: "localhost").
    pub host: String,
    /// Database port (`TASKD_DB_PORT`, default: 5432).
    pub port: u16,
    /// Database name (`TASKD_DB_NAME`, default: "taskdb").
    pub name: String,
    /// Database user (`TASKD_DB_USER`, default: "postgres").
    pub user: String,
    /// Database password (`TASKD_DB_PASSWORD`, default: "password").
    pub password: String,
    /// Require TLS for the database connection (`TASKD_DB_SSL`, default: false).
    pub ssl: bool,
}

#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP listening port (`TASKD_PORT`, default: 3000).
    pub port: u16,
    /// Deployment environment name (`TASKD_ENV`, default: "development").
    pub environment: String,
    /// Log level filter string, e.g. "debug", "info,taskd=trace"
    /// (`TASKD_LOG`, default: "info").
    pub log: String,
    /// Log output format: "pretty" (human-readable) | "json" (structured
    /// for log aggregators) (`TASKD_LOG_FORMAT`, default: "pretty").
    pub log_format: String,
    pub database: DatabaseConfig,
}

impl Config {
    /// Build config from CLI/env args.
    ///
    /// The CLI-exposed options arrive as `Some(value)` from clap (which also
    /// resolves their env vars); database options are environment-only and
    /// read here.
    pub fn new(port: Option<u16>, log: Option<String>, log_format: Option<String>) -> Self {
        let database = DatabaseConfig {
            url: env_var("DATABASE_URL"),
            host: env_var("TASKD_DB_HOST").unwrap_or_else(|| DEFAULT_DB_HOST.to_string()),
            port: env_var("TASKD_DB_PORT")
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_DB_PORT),
            name: env_var("TASKD_DB_NAME").unwrap_or_else(|| DEFAULT_DB_NAME.to_string()),
            user: env_var("TASKD_DB_USER").unwrap_or_else(|| DEFAULT_DB_USER.to_string()),
            password: env_var("TASKD_DB_PASSWORD")
                .unwrap_or_else(|| DEFAULT_DB_PASSWORD.to_string()),
            ssl: env_var("TASKD_DB_SSL")
                .map(|s| parse_flag(&s))
                .unwrap_or(false),
        };

        Self {
            port: port.unwrap_or(DEFAULT_PORT),
            environment: env_var("TASKD_ENV").unwrap_or_else(|| DEFAULT_ENVIRONMENT.to_string()),
            log: log.unwrap_or_else(|| DEFAULT_LOG.to_string()),
            log_format: log_format.unwrap_or_else(|| DEFAULT_LOG_FORMAT.to_string()),
            database,
        }
    }
}

/// Read an env var, treating unset and empty as absent.
fn env_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|s| !s.is_empty())
}

/// "1", "true", and "require" (any case) enable a boolean flag.
fn parse_flag(raw: &str) -> bool {
    matches!(raw.to_ascii_lowercase().as_str(), "1" | "true" | "require")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flag_accepts_common_spellings() {
        assert!(parse_flag("1"));
        assert!(parse_flag("true"));
        assert!(parse_flag("TRUE"));
        assert!(parse_flag("require"));
        assert!(!parse_flag("0"));
        assert!(!parse_flag("false"));
        assert!(!parse_flag("prefer"));
        assert!(!parse_flag(""));
    }
}
