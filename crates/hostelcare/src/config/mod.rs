use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};

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
    pub desk: DeskPolicy,
    pub mail: MailConfig,
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

        let max_active_complaints = match env::var("APP_MAX_ACTIVE_COMPLAINTS") {
            Ok(raw) => match raw.trim().parse::<usize>() {
                Ok(limit) if limit > 0 => limit,
                _ => return Err(ConfigError::InvalidComplaintQuota),
            },
            Err(_) => DeskPolicy::DEFAULT_MAX_ACTIVE_COMPLAINTS,
        };

        let email_domain = env::var("APP_EMAIL_DOMAIN")
            .unwrap_or_else(|_| DeskPolicy::DEFAULT_EMAIL_DOMAIN.to_string())
            .trim()
            .to_ascii_lowercase();
        if email_domain.is_empty() || email_domain.contains('@') {
            return Err(ConfigError::InvalidEmailDomain);
        }

        let from_address =
            env::var("APP_MAIL_FROM").unwrap_or_else(|_| format!("complaints@{email_domain}"));

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            desk: DeskPolicy {
                max_active_complaints,
                email_domain,
            },
            mail: MailConfig { from_address },
        })
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

/// Tracing and metrics controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Rules the complaint desk enforces on every request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeskPolicy {
    /// Complaints a student may hold in pending, assigned or in-progress at once.
    pub max_active_complaints: usize,
    /// Institute mail domain every account address must belong to.
    pub email_domain: String,
}

impl DeskPolicy {
    pub const DEFAULT_MAX_ACTIVE_COMPLAINTS: usize = 5;
    pub const DEFAULT_EMAIL_DOMAIN: &'static str = "iiitkottayam.ac.in";
}

impl Default for DeskPolicy {
    fn default() -> Self {
        Self {
            max_active_complaints: Self::DEFAULT_MAX_ACTIVE_COMPLAINTS,
            email_domain: Self::DEFAULT_EMAIL_DOMAIN.to_string(),
        }
    }
}

/// Outbound mail settings.
#[derive(Debug, Clone)]
pub struct MailConfig {
    pub from_address: String,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidComplaintQuota,
    InvalidEmailDomain,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidComplaintQuota => {
                write!(f, "APP_MAX_ACTIVE_COMPLAINTS must be a positive integer")
            }
            ConfigError::InvalidEmailDomain => {
                write!(f, "APP_EMAIL_DOMAIN must be a bare domain such as example.edu")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidComplaintQuota
            | ConfigError::InvalidEmailDomain => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::{Mutex, OnceLock};

    fn env_guard() -> &'static Mutex<()> {
        static GUARD: OnceLock<Mutex<()>> = OnceLock::new();
        GUARD.get_or_init(|| Mutex::new(()))
    }

    fn reset_env() {
        env::remove_var("APP_ENV");
        env::remove_var("APP_HOST");
        env::remove_var("APP_PORT");
        env::remove_var("APP_LOG_LEVEL");
        env::remove_var("APP_MAX_ACTIVE_COMPLAINTS");
        env::remove_var("APP_EMAIL_DOMAIN");
        env::remove_var("APP_MAIL_FROM");
    }

    #[test]
    fn load_uses_defaults_when_env_missing() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        let config = AppConfig::load().expect("config loads with defaults");
        assert_eq!(config.environment, AppEnvironment::Development);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.telemetry.log_level, "info");
        assert_eq!(config.desk, DeskPolicy::default());
        assert_eq!(config.mail.from_address, "complaints@iiitkottayam.ac.in");
    }

    #[test]
    fn accepts_localhost_host() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_HOST", "localhost");
        let config = AppConfig::load().expect("config loads");
        let addr = config.server.socket_addr().expect("localhost resolves");
        assert_eq!(addr, SocketAddr::new(IpAddr::from([127, 0, 0, 1]), 3000));
        reset_env();
    }

    #[test]
    fn reads_desk_policy_overrides() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_MAX_ACTIVE_COMPLAINTS", "3");
        env::set_var("APP_EMAIL_DOMAIN", " Hostel.Example.EDU ");
        let config = AppConfig::load().expect("config loads");
        assert_eq!(config.desk.max_active_complaints, 3);
        assert_eq!(config.desk.email_domain, "hostel.example.edu");
        reset_env();
    }

    #[test]
    fn rejects_zero_quota() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_MAX_ACTIVE_COMPLAINTS", "0");
        assert!(matches!(
            AppConfig::load(),
            Err(ConfigError::InvalidComplaintQuota)
        ));
        reset_env();
    }
}
