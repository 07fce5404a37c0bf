use std::{env, str::FromStr, sync::Arc};

#[derive(Clone, Debug)]
/// Configuration struct for the server.
///
/// This struct holds all the parameters required to initialize and run the
/// server: listener address and base path, worker count, CORS origin,
/// database connection details, logging preferences and the graceful
/// shutdown grace period.
pub struct Config {
    // environment
    pub environment: String, // development or production
    /// The hostname or IP address the server will bind to.
    pub server_host: String,
    /// The port number the server will listen on.
    pub server_port: u16,
    /// Path prefix under which every route is mounted, e.g. `/api/v1`.
    pub base_path: String,
    /// The number of worker threads to spawn for handling requests.
    pub num_workers: usize,
    /// The allowed origin for CORS (Cross-Origin Resource Sharing).
    pub cors_allowed_origin: String,
    /// Seconds in-flight requests are given to finish on shutdown.
    pub shutdown_timeout_secs: u64,
    /// Database connection parameters.
    pub database: DatabaseConfig,
    /// Logging preferences.
    pub log: LogConfig,
}

#[derive(Clone, Debug)]
/// Connection parameters for the Postgres database.
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub name: String,
    /// Postgres ssl mode: disable, allow, prefer, require, verify-ca or verify-full.
    pub ssl_mode: String,
    /// Upper bound of pooled connections.
    pub max_connections: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("unknown log format \"{}\"", other)),
        }
    }
}

#[derive(Clone, Debug)]
/// Logging preferences.
pub struct LogConfig {
    /// A boolean indicating whether logging is installed at all.
    pub enabled: bool,
    /// Maximum level emitted: trace, debug, info, warn or error.
    pub level: log::LevelFilter,
    pub format: LogFormat,
    /// When set, log lines are also appended to this file.
    pub file_path: Option<String>,
}

impl Config {
    /// Creates a new `Config` instance from environment variables.
    ///
    /// Loads a `.env` file if present, then reads the process environment.
    /// Every setting has a default, so an empty environment yields a usable
    /// development configuration.
    ///
    /// # Environment Variables
    ///
    /// - `ENVIRONMENT`: development or production (default: "development")
    /// - `API_HOST`: Server host (default: "0.0.0.0")
    /// - `API_PORT`: Server port (default: 8080)
    /// - `API_BASE_PATH`: Route prefix (default: "/api/v1")
    /// - `WORKERS`: Number of worker threads (default: 4)
    /// - `CORS_ALLOWED_ORIGIN`: Allowed CORS origin (default: "*")
    /// - `SHUTDOWN_TIMEOUT_SECS`: Graceful shutdown period (default: 10)
    /// - `DB_HOST`, `DB_PORT`, `DB_USER`, `DB_PASSWORD`, `DB_NAME`, `DB_SSL_MODE`,
    ///   `DB_MAX_CONNECTIONS`: Database connection (see [`DatabaseConfig`])
    /// - `LOG_ENABLED`, `LOG_LEVEL`, `LOG_FORMAT`, `LOG_FILE`: Logging (see [`LogConfig`])
    pub fn from_env() -> Arc<Self> {
        dotenvy::dotenv().ok();

        Arc::new(Self::from_lookup(|key| env::var(key).ok()))
    }

    /// Builds the configuration from an arbitrary key lookup.
    ///
    /// Values that fail to parse fall back to their defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let environment = var("ENVIRONMENT", "development");
        let default_ssl_mode = if environment == "production" {
            "require"
        } else {
            "disable"
        };

        Config {
            server_host: var("API_HOST", "0.0.0.0"),
            server_port: parse_or(lookup("API_PORT"), 8080),
            base_path: normalize_base_path(&var("API_BASE_PATH", "/api/v1")),
            num_workers: parse_or(lookup("WORKERS"), 4),
            cors_allowed_origin: var("CORS_ALLOWED_ORIGIN", "*"),
            shutdown_timeout_secs: parse_or(lookup("SHUTDOWN_TIMEOUT_SECS"), 10),
            database: DatabaseConfig {
                host: var("DB_HOST", "localhost"),
                port: parse_or(lookup("DB_PORT"), 5432),
                user: var("DB_USER", "postgres"),
                password: var("DB_PASSWORD", ""),
                name: var("DB_NAME", "subscriptions"),
                ssl_mode: var("DB_SSL_MODE", default_ssl_mode),
                max_connections: parse_or(lookup("DB_MAX_CONNECTIONS"), 10),
            },
            log: LogConfig {
                enabled: var("LOG_ENABLED", "true").to_lowercase() == "true",
                level: parse_or(lookup("LOG_LEVEL"), log::LevelFilter::Info),
                format: parse_or(lookup("LOG_FORMAT"), LogFormat::Text),
                file_path: lookup("LOG_FILE").filter(|path| !path.trim().is_empty()),
            },
            environment,
        }
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

fn parse_or<T: FromStr>(value: Option<String>, default: T) -> T {
    value
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

// "/" and "" both mean "mount at the root"; otherwise a single leading slash
// and no trailing slash
fn normalize_base_path(path: &str) -> String {
    let trimmed = path.trim().trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("/{}", trimmed)
    }
}
