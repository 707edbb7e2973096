use nothanks_engine::settings::{
    GameSettings, INITIAL_TOKENS_RANGE, REMOVED_COUNT_RANGE, TURN_TIME_LIMIT_RANGE,
};
use serde::{Deserialize, Serialize};
use std::fs;

/// Table rules and seed used by offline commands.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    pub seed: Option<u64>,
    pub removed_count: u8,
    pub initial_tokens: u32,
    pub turn_time_limit_seconds: u32,
    pub show_opponent_tokens: bool,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ValueSource {
    Default,
    File,
    Env,
}

#[derive(Debug, Clone, Copy)]
pub struct ConfigSources {
    pub seed: ValueSource,
    pub removed_count: ValueSource,
    pub initial_tokens: ValueSource,
    pub turn_time_limit_seconds: ValueSource,
    pub show_opponent_tokens: ValueSource,
}

impl Default for ConfigSources {
    fn default() -> Self {
        Self {
            seed: ValueSource::Default,
            removed_count: ValueSource::Default,
            initial_tokens: ValueSource::Default,
            turn_time_limit_seconds: ValueSource::Default,
            show_opponent_tokens: ValueSource::Default,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ConfigResolved {
    pub config: Config,
    pub sources: ConfigSources,
}

impl Default for Config {
    fn default() -> Self {
        let rules = GameSettings::default();
        Self {
            seed: None,
            removed_count: rules.removed_count,
            initial_tokens: rules.initial_tokens,
            turn_time_limit_seconds: rules.turn_time_limit_seconds,
            show_opponent_tokens: rules.show_opponent_tokens,
        }
    }
}

impl Config {
    /// Table settings for a round played under this configuration.
    pub fn game_settings(&self) -> GameSettings {
        GameSettings {
            removed_count: self.removed_count,
            initial_tokens: self.initial_tokens,
            turn_time_limit_seconds: self.turn_time_limit_seconds,
            show_opponent_tokens: self.show_opponent_tokens,
            ..GameSettings::default()
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Invalid(String),
}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        ConfigError::Io(e)
    }
}
impl From<toml::de::Error> for ConfigError {
    fn from(e: toml::de::Error) -> Self {
        ConfigError::Parse(e)
    }
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "cannot read config file: {}", e),
            ConfigError::Parse(e) => write!(f, "cannot parse config file: {}", e),
            ConfigError::Invalid(msg) => f.write_str(msg),
        }
    }
}

pub fn load() -> Result<Config, ConfigError> {
    load_with_sources().map(|resolved| resolved.config)
}

/// Resolves defaults, then the TOML file named by `NOTHANKS_CONFIG`, then
/// the `NOTHANKS_*` variables, remembering where each value came from.
pub fn load_with_sources() -> Result<ConfigResolved, ConfigError> {
    let mut cfg = Config::default();
    let mut sources = ConfigSources::default();

    if let Ok(path) = std::env::var("NOTHANKS_CONFIG")
        && !path.is_empty()
    {
        let s = fs::read_to_string(path)?;
        let f: FileConfig = toml::from_str(&s)?;
        if let Some(v) = f.seed {
            cfg.seed = Some(v);
            sources.seed = ValueSource::File;
        }
        if let Some(v) = f.removed_count {
            cfg.removed_count = v;
            sources.removed_count = ValueSource::File;
        }
        if let Some(v) = f.initial_tokens {
            cfg.initial_tokens = v;
            sources.initial_tokens = ValueSource::File;
        }
        if let Some(v) = f.turn_time_limit_seconds {
            cfg.turn_time_limit_seconds = v;
            sources.turn_time_limit_seconds = ValueSource::File;
        }
        if let Some(v) = f.show_opponent_tokens {
            cfg.show_opponent_tokens = v;
            sources.show_opponent_tokens = ValueSource::File;
        }
    }

    if let Some(seed) = env_value("NOTHANKS_SEED") {
        cfg.seed = Some(
            seed.parse()
                .map_err(|_| ConfigError::Invalid("Invalid seed".into()))?,
        );
        sources.seed = ValueSource::Env;
    }
    if let Some(removed) = env_value("NOTHANKS_REMOVED") {
        cfg.removed_count = removed
            .parse()
            .map_err(|_| ConfigError::Invalid("Invalid removed count".into()))?;
        sources.removed_count = ValueSource::Env;
    }
    if let Some(tokens) = env_value("NOTHANKS_TOKENS") {
        cfg.initial_tokens = tokens
            .parse()
            .map_err(|_| ConfigError::Invalid("Invalid token count".into()))?;
        sources.initial_tokens = ValueSource::Env;
    }
    if let Some(limit) = env_value("NOTHANKS_TIME_LIMIT") {
        cfg.turn_time_limit_seconds = limit
            .parse()
            .map_err(|_| ConfigError::Invalid("Invalid time limit".into()))?;
        sources.turn_time_limit_seconds = ValueSource::Env;
    }
    if let Some(show) = env_value("NOTHANKS_SHOW_TOKENS") {
        cfg.show_opponent_tokens =
            parse_bool(&show).ok_or_else(|| ConfigError::Invalid("Invalid show tokens".into()))?;
        sources.show_opponent_tokens = ValueSource::Env;
    }

    validate(&cfg)?;
    Ok(ConfigResolved {
        config: cfg,
        sources,
    })
}

fn env_value(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

#[derive(Debug, Deserialize)]
struct FileConfig {
    #[serde(default)]
    seed: Option<u64>,
    #[serde(default)]
    removed_count: Option<u8>,
    #[serde(default)]
    initial_tokens: Option<u32>,
    #[serde(default)]
    turn_time_limit_seconds: Option<u32>,
    #[serde(default)]
    show_opponent_tokens: Option<bool>,
}

// Out-of-range values are errors here; only the table itself clamps.
fn validate(cfg: &Config) -> Result<(), ConfigError> {
    if !REMOVED_COUNT_RANGE.contains(&cfg.removed_count) {
        return Err(ConfigError::Invalid(format!(
            "removed_count must be within {}..={}",
            REMOVED_COUNT_RANGE.start(),
            REMOVED_COUNT_RANGE.end()
        )));
    }
    if !INITIAL_TOKENS_RANGE.contains(&cfg.initial_tokens) {
        return Err(ConfigError::Invalid(format!(
            "initial_tokens must be within {}..={}",
            INITIAL_TOKENS_RANGE.start(),
            INITIAL_TOKENS_RANGE.end()
        )));
    }
    if !TURN_TIME_LIMIT_RANGE.contains(&cfg.turn_time_limit_seconds) {
        return Err(ConfigError::Invalid(format!(
            "turn_time_limit_seconds must be within {}..={}",
            TURN_TIME_LIMIT_RANGE.start(),
            TURN_TIME_LIMIT_RANGE.end()
        )));
    }
    Ok(())
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.to_ascii_lowercase().as_str() {
        "1" | "true" | "on" | "yes" => Some(true),
        "0" | "false" | "off" | "no" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_mirror_table_defaults() {
        let cfg = Config::default();
        assert_eq!(cfg.game_settings(), GameSettings::default());
        assert!(validate(&cfg).is_ok());
    }

    #[test]
    fn out_of_range_values_are_rejected() {
        let cfg = Config {
            removed_count: 30,
            ..Config::default()
        };
        assert!(matches!(validate(&cfg), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn parses_boolean_spellings() {
        assert_eq!(parse_bool("YES"), Some(true));
        assert_eq!(parse_bool("off"), Some(false));
        assert_eq!(parse_bool("maybe"), None);
    }
}
