//! Configuration for the API server.
//!
//! All configuration is loaded from environment variables, each with a
//! fixed default. Values that are present but unparseable are errors
//! rather than silently falling back.

use axum::http::HeaderValue;
use birdwatch_db::DEFAULT_DATABASE_URL;

use crate::server::ServerConfig;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A variable was set to a value that cannot be parsed.
    #[error("invalid {name}: {reason}")]
    Invalid {
        /// The environment variable.
        name: &'static str,
        /// Why the value was rejected.
        reason: String,
    },
}

/// Which [`ObservationStore`](birdwatch_db::ObservationStore) to open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StoreBackend {
    /// `PostgreSQL` at `DATABASE_URL`.
    #[default]
    Postgres,
    /// Process-local memory; nothing persists.
    Memory,
}

/// Origins the CORS layer accepts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CorsOrigins {
    /// Any origin (`Access-Control-Allow-Origin: *`).
    #[default]
    Any,
    /// Only these exact origins.
    List(Vec<HeaderValue>),
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON object per line.
    Json,
}

/// Complete API server configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// `PostgreSQL` connection URL.
    pub database_url: String,
    /// Maximum pooled connections.
    pub max_connections: u32,
    /// Which store to open.
    pub backend: StoreBackend,
    /// Bind address.
    pub server: ServerConfig,
    /// CORS origin policy.
    pub cors: CorsOrigins,
    /// Log output format.
    pub log_format: LogFormat,
}

impl ApiConfig {
    /// Load configuration from environment variables.
    ///
    /// Optional variables:
    /// - `DATABASE_URL` -- storage connection string (default [`DEFAULT_DATABASE_URL`])
    /// - `DATABASE_MAX_CONNECTIONS` -- pool size (default 10)
    /// - `STORE_BACKEND` -- `postgres` or `memory` (default `postgres`)
    /// - `HOST` -- bind host (default `0.0.0.0`)
    /// - `PORT` -- listen port (default 3000)
    /// - `CORS_ALLOW_ORIGINS` -- `*` or comma-separated origins (default `*`)
    /// - `LOG_FORMAT` -- `text` or `json` (default `text`)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through `lookup`, which maps a variable name to
    /// its value if set.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = ServerConfig::default();

        let database_url =
            lookup("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_owned());

        let max_connections: u32 = parse_or(&lookup, "DATABASE_MAX_CONNECTIONS", 10)?;

        let backend = match lookup("STORE_BACKEND").as_deref().map(str::to_lowercase) {
            None => StoreBackend::default(),
            Some(value) => match value.as_str() {
                "postgres" | "postgresql" => StoreBackend::Postgres,
                "memory" => StoreBackend::Memory,
                other => return Err(invalid("STORE_BACKEND", format!("unknown backend {other}"))),
            },
        };

        let host = lookup("HOST").unwrap_or(defaults.host);
        let port: u16 = parse_or(&lookup, "PORT", defaults.port)?;

        let cors = match lookup("CORS_ALLOW_ORIGINS") {
            None => CorsOrigins::default(),
            Some(value) => parse_origins(&value)?,
        };

        let log_format = match lookup("LOG_FORMAT").as_deref().map(str::to_lowercase) {
            None => LogFormat::default(),
            Some(value) => match value.as_str() {
                "text" | "pretty" => LogFormat::Text,
                "json" => LogFormat::Json,
                other => return Err(invalid("LOG_FORMAT", format!("unknown format {other}"))),
            },
        };

        Ok(Self {
            database_url,
            max_connections,
            backend,
            server: ServerConfig { host, port },
            cors,
            log_format,
        })
    }
}

fn invalid(name: &'static str, reason: String) -> ConfigError {
    ConfigError::Invalid { name, reason }
}

fn parse_or<F, T>(lookup: &F, name: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    lookup(name).map_or(Ok(default), |raw| {
        raw.trim()
            .parse()
            .map_err(|e: T::Err| invalid(name, e.to_string()))
    })
}

fn parse_origins(value: &str) -> Result<CorsOrigins, ConfigError> {
    let trimmed = value.trim();
    if trimmed == "*" {
        return Ok(CorsOrigins::Any);
    }

    let origins = trimmed
        .split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(|origin| {
            if origin == "*" {
                return Err(invalid(
                    "CORS_ALLOW_ORIGINS",
                    String::from("`*` cannot be combined with explicit origins"),
                ));
            }
            HeaderValue::from_str(origin)
                .map_err(|e| invalid("CORS_ALLOW_ORIGINS", format!("{origin}: {e}")))
        })
        .collect::<Result<Vec<_>, _>>()?;

    if origins.is_empty() {
        return Err(invalid("CORS_ALLOW_ORIGINS", String::from("no origins given")));
    }

    Ok(CorsOrigins::List(origins))
}
