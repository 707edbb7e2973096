use crate::orchestrator::OrchestratorConfig;
use nothanks_ai::params::Difficulty;
use serde::{Deserialize, Serialize};
use std::sync::RwLock;
use std::time::Duration;
use thiserror::Error;

/// Process-wide server settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AppSettings {
    /// Tier used when `add_bot` names none
    pub default_bot_difficulty: Difficulty,
    /// Policy implementation driving every bot ("tiered" or "baseline")
    pub policy: String,
    /// Idle minutes before a session is closed
    pub session_timeout_minutes: u64,
    /// Lower bound of the bot thinking delay
    pub bot_delay_min_ms: u64,
    /// Upper bound of the bot thinking delay
    pub bot_delay_max_ms: u64,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            default_bot_difficulty: Difficulty::Medium,
            policy: "tiered".to_string(),
            session_timeout_minutes: 30,
            bot_delay_min_ms: 600,
            bot_delay_max_ms: 1800,
        }
    }
}

impl AppSettings {
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.policy.is_empty() {
            return Err(SettingsError::InvalidValue(
                "policy cannot be empty".to_string(),
            ));
        }

        if self.session_timeout_minutes == 0 {
            return Err(SettingsError::InvalidValue(
                "session_timeout_minutes must be greater than 0".to_string(),
            ));
        }

        if self.bot_delay_min_ms > self.bot_delay_max_ms {
            return Err(SettingsError::InvalidValue(format!(
                "bot_delay_min_ms ({}) exceeds bot_delay_max_ms ({})",
                self.bot_delay_min_ms, self.bot_delay_max_ms
            )));
        }

        Ok(())
    }

    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_timeout_minutes * 60)
    }

    pub fn orchestrator_config(&self) -> OrchestratorConfig {
        OrchestratorConfig {
            bot_delay_min: Duration::from_millis(self.bot_delay_min_ms),
            bot_delay_max: Duration::from_millis(self.bot_delay_max_ms),
            ..OrchestratorConfig::default()
        }
    }
}

/// In-memory settings store with validation
#[derive(Debug)]
pub struct SettingsStore {
    settings: RwLock<AppSettings>,
}

impl SettingsStore {
    pub fn new() -> Self {
        Self {
            settings: RwLock::new(AppSettings::default()),
        }
    }

    pub fn with_settings(settings: AppSettings) -> Result<Self, SettingsError> {
        settings.validate()?;
        Ok(Self {
            settings: RwLock::new(settings),
        })
    }

    pub fn get(&self) -> Result<AppSettings, SettingsError> {
        self.settings
            .read()
            .map(|guard| guard.clone())
            .map_err(|_| SettingsError::StoragePoisoned)
    }

    pub fn update(&self, new_settings: AppSettings) -> Result<AppSettings, SettingsError> {
        new_settings.validate()?;

        let mut guard = self
            .settings
            .write()
            .map_err(|_| SettingsError::StoragePoisoned)?;
        *guard = new_settings.clone();
        Ok(new_settings)
    }

    /// Updates one field by name from a JSON value
    pub fn update_field(
        &self,
        field: &str,
        value: serde_json::Value,
    ) -> Result<AppSettings, SettingsError> {
        let mut current = self.get()?;

        let as_u64 = |value: &serde_json::Value| {
            value.as_u64().ok_or_else(|| {
                SettingsError::InvalidValue(format!("{field} must be a non-negative number"))
            })
        };

        match field {
            "default_bot_difficulty" => {
                current.default_bot_difficulty = serde_json::from_value(value).map_err(|e| {
                    SettingsError::InvalidValue(format!("default_bot_difficulty: {e}"))
                })?;
            }
            "policy" => {
                let name = value.as_str().ok_or_else(|| {
                    SettingsError::InvalidValue("policy must be a string".to_string())
                })?;
                current.policy = name.to_string();
            }
            "session_timeout_minutes" => current.session_timeout_minutes = as_u64(&value)?,
            "bot_delay_min_ms" => current.bot_delay_min_ms = as_u64(&value)?,
            "bot_delay_max_ms" => current.bot_delay_max_ms = as_u64(&value)?,
            _ => {
                return Err(SettingsError::InvalidValue(format!(
                    "unknown field: {}",
                    field
                )))
            }
        }

        self.update(current)
    }

    pub fn reset(&self) -> Result<AppSettings, SettingsError> {
        self.update(AppSettings::default())
    }
}

impl Default for SettingsStore {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Invalid settings value: {0}")]
    InvalidValue(String),
    #[error("Settings storage poisoned")]
    StoragePoisoned,
}

impl crate::errors::IntoErrorResponse for SettingsError {
    fn error_code(&self) -> &'static str {
        match self {
            SettingsError::InvalidValue(_) => "invalid_settings",
            SettingsError::StoragePoisoned => "settings_storage_error",
        }
    }

    fn error_message(&self) -> String {
        self.to_string()
    }

    fn severity(&self) -> crate::errors::ErrorSeverity {
        match self {
            SettingsError::InvalidValue(_) => crate::errors::ErrorSeverity::Client,
            SettingsError::StoragePoisoned => crate::errors::ErrorSeverity::Critical,
        }
    }
}
