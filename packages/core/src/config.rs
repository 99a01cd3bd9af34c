use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use sqlx::any::AnyConnectOptions;

use crate::cli::Cli;
use crate::db::DEFAULT_MAX_CONNECTIONS;
use crate::forecast::config::{DEFAULT_FETCH_LIMIT, DEFAULT_WINDOW_SIZE};

const DEFAULT_MODEL_PATH: &str = "model_lstm_volume.json";
const DEFAULT_SCALER_PATH: &str = "scaler_volume.json";
const DEFAULT_LOCATION: &str = "default";
const DEFAULT_PORT: u16 = 8000;
const DEFAULT_DB_PORT: u16 = 5432;
const DEFAULT_TIMEOUT_SECONDS: u64 = 10;

#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub db_max_connections: u32,
    pub model_path: PathBuf,
    pub scaler_path: PathBuf,
    pub default_location: String,
    pub fetch_limit: usize,
    pub predict_timeout: Duration,
    pub api_port: u16,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the config from any key lookup. `from_env` passes the process
    /// environment; tests pass a map.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = match lookup("DATABASE_URL") {
            Some(url) => url,
            None => {
                let host = lookup("DB_HOST").ok_or("DATABASE_URL or DB_HOST is required")?;
                let user = lookup("DB_USER").ok_or("DB_USER is required")?;
                let password = lookup("DB_PASSWORD").unwrap_or_default();
                let name = lookup("DB_NAME").ok_or("DB_NAME is required")?;
                let port = parse_or(&lookup, "DB_PORT", DEFAULT_DB_PORT)?;
                compose_postgres_url(&host, port, &name, &user, &password)?
            }
        };

        let db_max_connections = parse_or(&lookup, "DB_MAX_CONNECTIONS", DEFAULT_MAX_CONNECTIONS)?;
        if db_max_connections == 0 {
            return Err("DB_MAX_CONNECTIONS must be at least 1".to_string());
        }

        let fetch_limit = parse_or(&lookup, "FETCH_LIMIT", DEFAULT_FETCH_LIMIT)?;
        if fetch_limit < DEFAULT_WINDOW_SIZE {
            return Err(format!("FETCH_LIMIT must be at least {}", DEFAULT_WINDOW_SIZE));
        }

        let timeout_seconds = parse_or(&lookup, "PREDICT_TIMEOUT_SECONDS", DEFAULT_TIMEOUT_SECONDS)?;
        if timeout_seconds == 0 {
            return Err("PREDICT_TIMEOUT_SECONDS must be at least 1".to_string());
        }

        Ok(Self {
            database_url,
            db_max_connections,
            model_path: lookup("MODEL_PATH")
                .unwrap_or_else(|| DEFAULT_MODEL_PATH.to_string())
                .into(),
            scaler_path: lookup("SCALER_PATH")
                .unwrap_or_else(|| DEFAULT_SCALER_PATH.to_string())
                .into(),
            default_location: lookup("DEFAULT_LOCATION")
                .unwrap_or_else(|| DEFAULT_LOCATION.to_string()),
            fetch_limit,
            predict_timeout: Duration::from_secs(timeout_seconds),
            api_port: parse_or(&lookup, "API_PORT", DEFAULT_PORT)?,
        })
    }

    /// Apply CLI flags on top of the environment values.
    pub fn apply_cli(&mut self, cli: &Cli) {
        if let Some(url) = &cli.database_url {
            self.database_url = url.clone();
        }
        if let Some(path) = &cli.model_path {
            self.model_path = path.into();
        }
        if let Some(path) = &cli.scaler_path {
            self.scaler_path = path.into();
        }
        if let Some(port) = cli.port {
            self.api_port = port;
        }
        if let Some(location) = &cli.location {
            self.default_location = location.clone();
        }
    }
}

// The database URL may carry a password, so it is left out.
impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("db_max_connections", &self.db_max_connections)
            .field("model_path", &self.model_path)
            .field("scaler_path", &self.scaler_path)
            .field("default_location", &self.default_location)
            .field("fetch_limit", &self.fetch_limit)
            .field("predict_timeout", &self.predict_timeout)
            .field("api_port", &self.api_port)
            .finish()
    }
}

/// Credentials are set through the URL so reserved characters in them are
/// percent-encoded.
fn compose_postgres_url(
    host: &str,
    port: u16,
    name: &str,
    user: &str,
    password: &str,
) -> Result<String, String> {
    let mut options = AnyConnectOptions::from_str(&format!("postgres://{}:{}/{}", host, port, name))
        .map_err(|e| format!("DB_HOST, DB_PORT or DB_NAME is invalid: {}", e))?;
    options
        .database_url
        .set_username(user)
        .map_err(|_| "DB_USER is invalid".to_string())?;
    options
        .database_url
        .set_password(Some(password))
        .map_err(|_| "DB_PASSWORD is invalid".to_string())?;
    Ok(options.database_url.to_string())
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T, String>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| format!("{} must be a valid number", key)),
        None => Ok(default),
    }
}
