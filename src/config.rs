#![allow(dead_code)]
use anyhow::{Context, Result};
use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Top-level configuration for the power distribution core.
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct AppConfig {
    #[validate(nested)]
    pub actor: ActorConfig,

    #[validate(nested)]
    pub telemetry: TelemetryConfig,
}

/// Tunables for `PowerDistributingActor` and its collaborators.
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct ActorConfig {
    /// Capacity of the actor's inbound request channel.
    #[serde(default = "default_request_channel_capacity")]
    #[validate(range(min = 1, max = 100_000))]
    pub request_channel_capacity: usize,

    /// Capacity of each namespace's result broadcast channel.
    #[serde(default = "default_result_channel_capacity")]
    #[validate(range(min = 1, max = 100_000))]
    pub result_channel_capacity: usize,

    /// Default per-request dispatch deadline, milliseconds, used when a
    /// caller does not set `Request::request_timeout` explicitly.
    #[serde(default = "default_request_timeout_ms")]
    #[validate(range(min = 1, max = 60_000))]
    pub default_request_timeout_ms: u64,

    /// Maximum telemetry age before a sample is treated as stale (spec
    /// §9 Open Question #3). `None` (the default) disables staleness
    /// checking.
    #[serde(default)]
    pub max_telemetry_age_secs: Option<i64>,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct TelemetryConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub log_json: bool,
}

fn default_request_channel_capacity() -> usize {
    256
}
fn default_result_channel_capacity() -> usize {
    64
}
fn default_request_timeout_ms() -> u64 {
    5_000
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ActorConfig {
    fn default() -> Self {
        Self {
            request_channel_capacity: default_request_channel_capacity(),
            result_channel_capacity: default_result_channel_capacity(),
            default_request_timeout_ms: default_request_timeout_ms(),
            max_telemetry_age_secs: None,
        }
    }
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_json: false,
        }
    }
}

impl ActorConfig {
    pub fn default_request_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.default_request_timeout_ms)
    }

    pub fn max_telemetry_age(&self) -> Option<chrono::Duration> {
        self.max_telemetry_age_secs.map(chrono::Duration::seconds)
    }
}

impl AppConfig {
    /// Load configuration from TOML files and environment variables.
    ///
    /// Configuration is loaded in this order (later overrides earlier):
    /// 1. `config/default.toml` (base configuration)
    /// 2. `config/<environment>.toml`, if given
    /// 3. Environment variables with a `PDC__` prefix
    pub fn load() -> Result<Self> {
        Self::load_with_env(None)
    }

    pub fn load_with_env(environment: Option<&str>) -> Result<Self> {
        let mut figment = Figment::new().merge(Toml::file("config/default.toml"));

        if let Some(env) = environment {
            let env_file = format!("config/{}.toml", env);
            figment = figment.merge(Toml::file(env_file));
        }

        figment = figment.merge(Env::prefixed("PDC__").split("__"));

        let config: AppConfig = figment.extract().context("failed to parse configuration")?;
        config.validate().context("configuration validation failed")?;
        Ok(config)
    }
}
