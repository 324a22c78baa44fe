//! Host configuration with TOML file support.

use std::path::Path;
use std::time::Duration;

use kyc_poll::PollConfig;
use kyc_verification::{HostConfig, RouteRequest, PERSONA_SCRIPT_SRC};
use serde::{Deserialize, Serialize};

use crate::host::HostOutcome;
use crate::logging::LogFormat;
use crate::HostError;

/// Settings for a verification host.
///
/// Can be loaded from a TOML file via [`HostSettings::from_toml_file`] or
/// built programmatically (e.g. for tests). Every field has a default, so an
/// empty file is a valid configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostSettings {
    /// Spacing between remote reads while polling, in milliseconds.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Maximum lifetime of a single poll session, in milliseconds.
    #[serde(default = "default_poll_duration_ms")]
    pub poll_duration_ms: u64,

    /// Source URL of the widget script.
    #[serde(default = "default_persona_script_src")]
    pub persona_script_src: String,

    /// User locale handed to the widget, e.g. `en-US` or `fr-CA`.
    #[serde(default = "default_locale")]
    pub locale: String,

    /// Log format: "human" or "json".
    #[serde(default = "default_log_format")]
    pub log_format: String,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Where the complete and cancel outcomes navigate to.
    #[serde(default)]
    pub routes: RouteSettings,
}

/// Route targets for the two host outcomes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteSettings {
    #[serde(default = "default_origin")]
    pub origin: String,

    #[serde(default = "default_route")]
    pub complete: String,

    #[serde(default = "default_route")]
    pub cancel: String,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_poll_interval_ms() -> u64 {
    1_000
}

fn default_poll_duration_ms() -> u64 {
    120_000
}

fn default_persona_script_src() -> String {
    PERSONA_SCRIPT_SRC.to_string()
}

fn default_locale() -> String {
    "en-US".to_string()
}

fn default_log_format() -> String {
    "human".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_origin() -> String {
    "identity-verification".to_string()
}

fn default_route() -> String {
    "price-list".to_string()
}

// ── Impl ───────────────────────────────────────────────────────────────

impl HostSettings {
    /// Load settings from a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, HostError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| HostError::Config(e.to_string()))?;
        Self::from_toml_str(&content)
    }

    /// Parse settings from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, HostError> {
        let settings: Self = toml::from_str(s).map_err(|e| HostError::Config(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Serialize the settings to a TOML string.
    pub fn to_toml_string(&self) -> Result<String, HostError> {
        toml::to_string_pretty(self).map_err(|e| HostError::Config(e.to_string()))
    }

    /// Reject settings the poll engine cannot run with.
    pub fn validate(&self) -> Result<(), HostError> {
        if self.poll_interval_ms == 0 {
            return Err(HostError::Config("poll_interval_ms must be positive".into()));
        }
        if self.poll_duration_ms < self.poll_interval_ms {
            return Err(HostError::Config(format!(
                "poll_duration_ms ({}) is shorter than poll_interval_ms ({})",
                self.poll_duration_ms, self.poll_interval_ms
            )));
        }
        self.log_format()?;
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn poll_duration(&self) -> Duration {
        Duration::from_millis(self.poll_duration_ms)
    }

    /// Poll configuration for the orchestrator. The timeout signal is wired
    /// by the orchestrator itself.
    pub fn poll_config(&self) -> PollConfig {
        PollConfig::new(self.poll_interval(), self.poll_duration())
    }

    pub fn host_config(&self) -> HostConfig {
        HostConfig {
            locale: self.locale.clone(),
        }
    }

    pub fn log_format(&self) -> Result<LogFormat, HostError> {
        self.log_format.parse()
    }
}

impl RouteSettings {
    pub fn request_for(&self, outcome: HostOutcome) -> RouteRequest {
        let route = match outcome {
            HostOutcome::Complete => &self.complete,
            HostOutcome::Canceled => &self.cancel,
        };
        RouteRequest {
            origin: self.origin.clone(),
            route: route.clone(),
        }
    }
}

impl Default for HostSettings {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            poll_duration_ms: default_poll_duration_ms(),
            persona_script_src: default_persona_script_src(),
            locale: default_locale(),
            log_format: default_log_format(),
            log_level: default_log_level(),
            routes: RouteSettings::default(),
        }
    }
}

impl Default for RouteSettings {
    fn default() -> Self {
        Self {
            origin: default_origin(),
            complete: default_route(),
            cancel: default_route(),
        }
    }
}
