use anyhow::{Context, Result};
use std::env;
use std::str::FromStr;

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub server_addr: String,
    pub db_max_connections: u32,
    pub run_migrations: bool,

    // Uploaded files live below this directory and are served under /uploads
    pub upload_root: String,
    pub max_upload_bytes: usize,
    pub max_page_size: u64,

    // Rate limiting
    pub rate_api_per_min: u32,

    pub log_dir: String,
    pub log_level: tracing::Level,

    pub api_prefix: String,

    // Browser origin allowed to call the API
    pub cors_allowed_origin: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            server_addr: env::var("SERVER_ADDR").context("SERVER_ADDR must be set")?,
            database_url: env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
            db_max_connections: parse_or("DB_MAX_CONNECTIONS", 10)?,
            run_migrations: parse_or("RUN_MIGRATIONS", true)?,

            upload_root: env::var("UPLOAD_ROOT").unwrap_or_else(|_| "wwwroot".to_string()),
            max_upload_bytes: parse_or("MAX_UPLOAD_BYTES", 10 * 1024 * 1024)?, // default 10 MiB
            max_page_size: parse_or("MAX_PAGE_SIZE", 100)?,

            rate_api_per_min: parse_or("RATE_API_PER_MIN", 1000)?,

            log_dir: env::var("LOG_DIR").unwrap_or_else(|_| "logs".to_string()),
            log_level: parse_or("LOG_LEVEL", tracing::Level::DEBUG)?,

            api_prefix: env::var("API_PREFIX").unwrap_or_else(|_| "/api".to_string()),

            cors_allowed_origin: env::var("CORS_ALLOWED_ORIGIN")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
        })
    }
}

fn parse_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("{key} has an invalid value {raw:?}: {e}")),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
impl Config {
    /// Settings for in-process tests; nothing here is read from the environment.
    pub fn for_tests(upload_root: &std::path::Path) -> Self {
        Self {
            database_url: String::new(),
            server_addr: "127.0.0.1:0".to_string(),
            db_max_connections: 1,
            run_migrations: false,
            upload_root: upload_root.to_string_lossy().into_owned(),
            max_upload_bytes: 1024 * 1024,
            max_page_size: 100,
            rate_api_per_min: 1000,
            log_dir: "logs".to_string(),
            log_level: tracing::Level::DEBUG,
            api_prefix: "/api".to_string(),
            cors_allowed_origin: "http://localhost:3000".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_or_falls_back_when_unset() {
        let value: u64 = parse_or("EMPLOYEE_RECORDS_TEST_UNSET_KEY", 42).unwrap();
        assert_eq!(value, 42);
    }
}
