use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use chrono::{DateTime, NaiveDate, Utc};

use crate::providers::{NOAA_SWPC_BASE_URL, OPENAQ_BASE_URL, OPEN_METEO_BASE_URL};
use crate::scoring::MoonPhaseModel;

pub const DEFAULT_FETCH_TIMEOUT_MS: u64 = 10_000;
pub const DEFAULT_MAX_CONCURRENCY: usize = 8;
pub const DEFAULT_SEND_TIMEOUT_MS: u64 = 10_000;
pub const DEFAULT_ALERT_FROM: &str = "Aurora Alerts <alerts@araura.app>";

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub providers: ProviderConfig,
    pub alerts: AlertConfig,
    pub scoring: ScoringConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(&var_or("APP_ENV", "development"));

        let host = var_or("APP_HOST", "127.0.0.1");
        let port = var_or("APP_PORT", "3000")
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = var_or("APP_LOG_LEVEL", "info");
        let log_format = LogFormat::parse(&var_or("APP_LOG_FORMAT", "compact"))?;

        let fetch_timeout = timeout_var("AURORA_FETCH_TIMEOUT_MS", DEFAULT_FETCH_TIMEOUT_MS)?;
        let send_timeout = timeout_var("ALERT_SEND_TIMEOUT_MS", DEFAULT_SEND_TIMEOUT_MS)?;

        let max_concurrency = match optional_var("AURORA_MAX_CONCURRENCY") {
            Some(raw) => match raw.parse::<usize>() {
                Ok(value) if value > 0 => value,
                _ => return Err(ConfigError::InvalidConcurrency(raw)),
            },
            None => DEFAULT_MAX_CONCURRENCY,
        };

        let moon_reference = match optional_var("AURORA_MOON_REFERENCE") {
            Some(raw) => parse_reference_epoch(&raw)?,
            None => MoonPhaseModel::default().reference_new_moon(),
        };

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig {
                log_level,
                format: log_format,
            },
            providers: ProviderConfig {
                fetch_timeout,
                max_concurrency,
                noaa_base_url: var_or("AURORA_NOAA_BASE_URL", NOAA_SWPC_BASE_URL),
                open_meteo_base_url: var_or("AURORA_OPEN_METEO_BASE_URL", OPEN_METEO_BASE_URL),
                openaq_base_url: var_or("AURORA_OPENAQ_BASE_URL", OPENAQ_BASE_URL),
            },
            alerts: AlertConfig {
                cron_secret: optional_var("CRON_SECRET"),
                resend_api_key: optional_var("RESEND_API_KEY"),
                from_address: var_or("ALERT_FROM_ADDRESS", DEFAULT_ALERT_FROM),
                seed_path: optional_var("AURORA_SEED_PATH"),
                send_timeout,
            },
            scoring: ScoringConfig { moon_reference },
        })
    }
}

fn var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Unset and blank values are both treated as absent.
fn timeout_var(key: &'static str, default_ms: u64) -> Result<Duration, ConfigError> {
    match optional_var(key) {
        Some(raw) => match raw.parse::<u64>() {
            Ok(ms) if ms > 0 => Ok(Duration::from_millis(ms)),
            _ => Err(ConfigError::InvalidTimeout { key, value: raw }),
        },
        None => Ok(Duration::from_millis(default_ms)),
    }
}

fn optional_var(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Accepts RFC 3339 timestamps or bare `YYYY-MM-DD` dates (midnight UTC).
pub fn parse_reference_epoch(raw: &str) -> Result<DateTime<Utc>, ConfigError> {
    let trimmed = raw.trim();
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(timestamp.with_timezone(&Utc));
    }

    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|midnight| midnight.and_utc())
        .ok_or_else(|| ConfigError::InvalidMoonReference(raw.to_string()))
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Compact,
    Json,
}

impl LogFormat {
    fn parse(value: &str) -> Result<Self, ConfigError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "" | "compact" | "text" => Ok(Self::Compact),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::InvalidLogFormat(other.to_string())),
        }
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
    pub format: LogFormat,
}

/// Upstream signal endpoints and the bounds applied to every outbound fetch.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub fetch_timeout: Duration,
    /// Subscriptions evaluated at once during an alert run.
    pub max_concurrency: usize,
    pub noaa_base_url: String,
    pub open_meteo_base_url: String,
    pub openaq_base_url: String,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            fetch_timeout: Duration::from_millis(DEFAULT_FETCH_TIMEOUT_MS),
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            noaa_base_url: NOAA_SWPC_BASE_URL.to_string(),
            open_meteo_base_url: OPEN_METEO_BASE_URL.to_string(),
            openaq_base_url: OPENAQ_BASE_URL.to_string(),
        }
    }
}

/// Alert trigger authentication and notification transport settings.
#[derive(Debug, Clone)]
pub struct AlertConfig {
    pub cron_secret: Option<String>,
    pub resend_api_key: Option<String>,
    pub from_address: String,
    pub seed_path: Option<String>,
    /// Upper bound on one delivery request, connect through response body.
    pub send_timeout: Duration,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            cron_secret: None,
            resend_api_key: None,
            from_address: DEFAULT_ALERT_FROM.to_string(),
            seed_path: None,
            send_timeout: Duration::from_millis(DEFAULT_SEND_TIMEOUT_MS),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ScoringConfig {
    pub moon_reference: DateTime<Utc>,
}

impl ScoringConfig {
    pub fn moon_model(&self) -> MoonPhaseModel {
        MoonPhaseModel::new(self.moon_reference)
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidLogFormat(String),
    InvalidTimeout { key: &'static str, value: String },
    InvalidConcurrency(String),
    InvalidMoonReference(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidLogFormat(value) => {
                write!(f, "APP_LOG_FORMAT must be 'compact' or 'json', got '{value}'")
            }
            ConfigError::InvalidTimeout { key, value } => write!(
                f,
                "{key} must be a positive number of milliseconds, got '{value}'"
            ),
            ConfigError::InvalidConcurrency(value) => write!(
                f,
                "AURORA_MAX_CONCURRENCY must be a positive integer, got '{value}'"
            ),
            ConfigError::InvalidMoonReference(value) => write!(
                f,
                "AURORA_MOON_REFERENCE must be RFC 3339 or YYYY-MM-DD, got '{value}'"
            ),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            _ => None,
        }
    }
}
