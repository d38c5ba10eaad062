use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};

use crate::workflows::evaluations::compliance::{
    ComplianceConfig, HistoryFailurePolicy, DEFAULT_COOLDOWN_ELIGIBILITY_DAYS,
    DEFAULT_COOLDOWN_LOOKBACK_DAYS, DEFAULT_DISPOSABLE_UNITS_PER_ANATOMY,
};

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
    pub compliance: ComplianceConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
        let compliance_log_level = env::var("EVAL_COMPLIANCE_LOG_LEVEL")
            .ok()
            .filter(|value| !value.trim().is_empty());

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig {
                log_level,
                compliance_log_level,
            },
            compliance: load_compliance()?,
        })
    }
}

fn load_compliance() -> Result<ComplianceConfig, ConfigError> {
    let history_failure_policy = match env::var("EVAL_HISTORY_FAILURE_POLICY") {
        Ok(raw) => HistoryFailurePolicy::parse(&raw).ok_or(ConfigError::InvalidHistoryPolicy)?,
        Err(_) => HistoryFailurePolicy::default(),
    };

    Ok(ComplianceConfig {
        cooldown_lookback_days: positive_number(
            "EVAL_COOLDOWN_LOOKBACK_DAYS",
            DEFAULT_COOLDOWN_LOOKBACK_DAYS,
        )?,
        cooldown_eligibility_days: positive_number(
            "EVAL_COOLDOWN_ELIGIBILITY_DAYS",
            DEFAULT_COOLDOWN_ELIGIBILITY_DAYS,
        )?,
        disposable_units_per_anatomy: positive_number(
            "EVAL_DISPOSABLE_UNITS_PER_ANATOMY",
            DEFAULT_DISPOSABLE_UNITS_PER_ANATOMY,
        )?,
        history_failure_policy,
    })
}

fn positive_number(variable: &'static str, default: u32) -> Result<u32, ConfigError> {
    match env::var(variable) {
        Ok(raw) => match raw.trim().parse::<u32>() {
            Ok(value) if value > 0 => Ok(value),
            _ => Err(ConfigError::InvalidNumber { variable }),
        },
        Err(_) => Ok(default),
    }
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

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
    /// Separate level for the compliance checkers, e.g. `debug` to trace cooldown decisions.
    pub compliance_log_level: Option<String>,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidNumber { variable: &'static str },
    InvalidHistoryPolicy,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidNumber { variable } => {
                write!(f, "{variable} must be a positive whole number")
            }
            ConfigError::InvalidHistoryPolicy => write!(
                f,
                "EVAL_HISTORY_FAILURE_POLICY must be 'allow_with_warning' or 'block'"
            ),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidNumber { .. }
            | ConfigError::InvalidHistoryPolicy => None,
        }
    }
}
