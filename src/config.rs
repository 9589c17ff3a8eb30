use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub supervisor: SupervisorConfig,
    /// Persistence backend (omit to run from memory only)
    #[serde(default)]
    pub database: Option<DatabaseConfig>,
    /// Operator notification backend
    #[serde(default)]
    pub notification: Option<NotificationConfig>,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Configuration for the connection health supervisor
#[derive(Debug, Clone, Deserialize)]
pub struct SupervisorConfig {
    /// Whether the supervisor runs at all
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Interval between health checks (default: 300s / 5 min)
    #[serde(default = "default_check_interval_secs")]
    pub check_interval_secs: u64,
    /// Delay before the first check, so the watched connection can initialize (default: 15s)
    #[serde(default = "default_startup_grace_secs")]
    pub startup_grace_secs: u64,
    /// Consecutive unhealthy checks before recovery triggers (default: 2)
    #[serde(default = "default_failure_threshold")]
    pub failure_threshold: u32,
    /// Minimum spacing between recovery attempts (default: 14400s / 4h)
    #[serde(default = "default_cooldown_secs")]
    pub cooldown_secs: u64,
    /// How long to wait for a human to complete pairing before allowing a retry
    /// (default: 28800s / 8h)
    #[serde(default = "default_max_pairing_wait_secs")]
    pub max_pairing_wait_secs: u64,
    /// Operator channel address for pairing-code notifications
    pub notify_target: String,
    /// Identity used when requesting a new pairing code
    pub recovery_identity: String,
}

fn default_enabled() -> bool {
    true
}

fn default_check_interval_secs() -> u64 {
    300
}

fn default_startup_grace_secs() -> u64 {
    15
}

fn default_failure_threshold() -> u32 {
    2
}

fn default_cooldown_secs() -> u64 {
    4 * 3600
}

fn default_max_pairing_wait_secs() -> u64 {
    8 * 3600
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            check_interval_secs: default_check_interval_secs(),
            startup_grace_secs: default_startup_grace_secs(),
            failure_threshold: default_failure_threshold(),
            cooldown_secs: default_cooldown_secs(),
            max_pairing_wait_secs: default_max_pairing_wait_secs(),
            notify_target: String::new(),
            recovery_identity: String::new(),
        }
    }
}

impl SupervisorConfig {
    pub fn check_interval(&self) -> Duration {
        Duration::from_secs(self.check_interval_secs)
    }

    pub fn startup_grace(&self) -> Duration {
        Duration::from_secs(self.startup_grace_secs)
    }

    pub fn cooldown_window(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.cooldown_secs as i64)
    }

    pub fn pairing_wait_window(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.max_pairing_wait_secs as i64)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.check_interval_secs == 0 {
            errors.push("check_interval_secs must be greater than 0".to_string());
        }

        if self.failure_threshold == 0 {
            errors.push("failure_threshold must be at least 1".to_string());
        }

        if self.enabled {
            if self.notify_target.is_empty() {
                errors.push("notify_target is required when the supervisor is enabled".to_string());
            }
            if self.recovery_identity.is_empty() {
                errors.push(
                    "recovery_identity is required when the supervisor is enabled".to_string(),
                );
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,
    /// Maximum connections in pool
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_max_connections() -> u32 {
    5
}

#[derive(Debug, Clone, Deserialize)]
pub struct NotificationConfig {
    /// Webhook endpoint that relays operator messages
    pub webhook_url: String,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Enable JSON formatted logs
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl AppConfig {
    /// Load configuration from files and environment
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from("config")
    }

    /// Load configuration from a specific directory
    pub fn load_from<P: AsRef<Path>>(config_dir: P) -> Result<Self, ConfigError> {
        let config_dir = config_dir.as_ref();

        let builder = Config::builder()
            // Start with default values
            .set_default("logging.level", "info")?
            .set_default("logging.json", false)?
            // Load default config file
            .add_source(File::from(config_dir.join("default.toml")).required(false))
            // Load environment-specific config (e.g., config/production.toml)
            .add_source(
                File::from(config_dir.join(
                    std::env::var("LINKWATCH_ENV").unwrap_or_else(|_| "development".to_string()),
                ))
                .required(false),
            )
            // Override with environment variables (LINKWATCH_SUPERVISOR__NOTIFY_TARGET, etc.)
            .add_source(
                Environment::with_prefix("LINKWATCH")
                    .separator("__")
                    .try_parsing(true),
            );

        builder.build()?.try_deserialize()
    }
}
