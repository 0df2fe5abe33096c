use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{ChatError, Result};
use crate::models::{is_known_model, DEFAULT_MODEL_ID};

pub const DEFAULT_MODEL_NAME: &str = "Gemini Web Search";
pub const DEFAULT_TEMPERATURE: f32 = 0.7;
pub const DEFAULT_SYSTEM_INSTRUCTION: &str =
    "You are a professional assistant. Be concise, accurate, and helpful.";
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Environment variables consulted for the API key, in order.
pub const API_KEY_VARS: [&str; 2] = ["GEMINI_API_KEY", "GOOGLE_API_KEY"];

/// Sampling temperature, always within `0.0..=2.0`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "f32", into = "f32")]
pub struct Temperature(f32);

impl Temperature {
    pub const MIN: f32 = 0.0;
    pub const MAX: f32 = 2.0;

    pub fn new(value: f32) -> Result<Self> {
        if !(Self::MIN..=Self::MAX).contains(&value) {
            return Err(ChatError::Config(format!(
                "temperature {} is outside {}..={}",
                value,
                Self::MIN,
                Self::MAX
            )));
        }
        Ok(Self(value))
    }

    pub fn parse(raw: &str) -> Result<Self> {
        let value: f32 = raw
            .trim()
            .parse()
            .map_err(|_| ChatError::Config(format!("invalid temperature '{}'", raw)))?;
        Self::new(value)
    }

    pub fn value(&self) -> f32 {
        self.0
    }
}

impl Default for Temperature {
    fn default() -> Self {
        Self(DEFAULT_TEMPERATURE)
    }
}

impl TryFrom<f32> for Temperature {
    type Error = ChatError;

    fn try_from(value: f32) -> Result<Self> {
        Self::new(value)
    }
}

impl From<Temperature> for f32 {
    fn from(t: Temperature) -> f32 {
        t.0
    }
}

impl fmt::Display for Temperature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1}", self.0)
    }
}

/// Optional on-disk overrides, stored as JSON under the user config directory.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct Config {
    pub model_name: Option<String>,
    pub model_id: Option<String>,
    pub temperature: Option<f32>,
    pub system_instruction: Option<String>,
    pub base_url: Option<String>,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load() -> Result<Self> {
        Self::load_from(&Self::get_config_path()?)
    }

    pub fn load_from(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            return Ok(Self::new());
        }

        let config_content = fs::read_to_string(config_path)
            .map_err(|e| ChatError::Config(format!("{}: {}", config_path.display(), e)))?;
        let config: Config = serde_json::from_str(&config_content)
            .map_err(|e| ChatError::Config(format!("{}: {}", config_path.display(), e)))?;
        Ok(config)
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        let io_err = |e: std::io::Error| ChatError::Config(format!("{}: {}", config_path.display(), e));

        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent).map_err(io_err)?;
        }

        let config_content = serde_json::to_string_pretty(self)?;
        fs::write(config_path, config_content).map_err(io_err)?;
        Ok(())
    }

    pub fn save_default_model(model_id: &str) -> Result<()> {
        Self::save_default_model_to(&Self::get_config_path()?, model_id)
    }

    /// Persist `model_id` as the default, keeping the file's other fields.
    /// An unreadable file is replaced.
    pub fn save_default_model_to(config_path: &Path, model_id: &str) -> Result<()> {
        let mut config = Self::load_from(config_path).unwrap_or_else(|_| Self::new());
        config.model_id = Some(model_id.to_string());
        config.save_to(config_path)
    }

    pub fn get_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| ChatError::Config("Could not determine config directory".to_string()))?;

        Ok(config_dir.join("groundchat").join("config.json"))
    }
}

/// Settings resolved once at startup: environment, then config file, then defaults.
#[derive(Debug, Clone)]
pub struct Settings {
    pub model_name: String,
    pub model_id: String,
    pub temperature: Temperature,
    pub system_instruction: String,
    pub base_url: String,
    pub api_key: Option<String>,
}

impl Settings {
    pub fn resolve(config: Config) -> Result<Self> {
        Self::resolve_with(config, |name| std::env::var(name).ok())
    }

    /// Resolve against an arbitrary variable lookup. Empty values count as unset.
    pub fn resolve_with<F>(config: Config, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let temperature = match var("MODEL_TEMPERATURE") {
            Some(raw) => Temperature::parse(&raw)?,
            None => match config.temperature {
                Some(value) => Temperature::new(value)?,
                None => Temperature::default(),
            },
        };

        let model_id = var("MODEL_ID")
            .or(config.model_id)
            .unwrap_or_else(|| DEFAULT_MODEL_ID.to_string());
        if !is_known_model(&model_id) {
            tracing::debug!(model = %model_id, "default model is not in the offered list");
        }

        let api_key = API_KEY_VARS.iter().find_map(|name| var(*name));

        Ok(Self {
            model_name: var("MODEL_NAME")
                .or(config.model_name)
                .unwrap_or_else(|| DEFAULT_MODEL_NAME.to_string()),
            model_id,
            temperature,
            system_instruction: var("SYSTEM_INSTRUCTION")
                .or(config.system_instruction)
                .unwrap_or_else(|| DEFAULT_SYSTEM_INSTRUCTION.to_string()),
            base_url: var("GEMINI_BASE_URL")
                .or(config.base_url)
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            api_key,
        })
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            model_name: DEFAULT_MODEL_NAME.to_string(),
            model_id: DEFAULT_MODEL_ID.to_string(),
            temperature: Temperature::default(),
            system_instruction: DEFAULT_SYSTEM_INSTRUCTION.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_defaults_without_env_or_file() {
        let settings = Settings::resolve_with(Config::new(), lookup(&[])).unwrap();
        assert_eq!(settings.model_name, "Gemini Web Search");
        assert_eq!(settings.model_id, "gemini-2.5-flash");
        assert_eq!(settings.temperature.value(), 0.7);
        assert_eq!(settings.system_instruction, DEFAULT_SYSTEM_INSTRUCTION);
        assert_eq!(settings.base_url, DEFAULT_BASE_URL);
        assert!(settings.api_key.is_none());
    }

    #[test]
    fn test_env_overrides_file() {
        let config = Config {
            model_id: Some("gemini-2.5-pro".to_string()),
            temperature: Some(1.5),
            ..Config::new()
        };
        let settings = Settings::resolve_with(
            config,
            lookup(&[("MODEL_ID", "gemini-3-pro-preview"), ("MODEL_NAME", "Search Bot")]),
        )
        .unwrap();
        assert_eq!(settings.model_id, "gemini-3-pro-preview");
        assert_eq!(settings.model_name, "Search Bot");
        assert_eq!(settings.temperature.value(), 1.5);
    }

    #[test]
    fn test_api_key_prefers_gemini_var() {
        let settings = Settings::resolve_with(
            Config::new(),
            lookup(&[("GEMINI_API_KEY", "g-key"), ("GOOGLE_API_KEY", "goog-key")]),
        )
        .unwrap();
        assert_eq!(settings.api_key.as_deref(), Some("g-key"));

        let settings =
            Settings::resolve_with(Config::new(), lookup(&[("GEMINI_API_KEY", ""), ("GOOGLE_API_KEY", "goog-key")]))
                .unwrap();
        assert_eq!(settings.api_key.as_deref(), Some("goog-key"));
    }

    #[test]
    fn test_bad_temperature_is_config_error() {
        let err = Settings::resolve_with(Config::new(), lookup(&[("MODEL_TEMPERATURE", "hot")]))
            .unwrap_err();
        assert!(err.is_configuration());

        let err = Settings::resolve_with(Config::new(), lookup(&[("MODEL_TEMPERATURE", "2.5")]))
            .unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_temperature_bounds() {
        assert!(Temperature::new(0.0).is_ok());
        assert!(Temperature::new(2.0).is_ok());
        assert!(Temperature::new(-0.1).is_err());
        assert!(Temperature::new(f32::NAN).is_err());
        assert_eq!(Temperature::parse(" 1.2 ").unwrap().to_string(), "1.2");
    }

    #[test]
    fn test_config_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        assert!(Config::load_from(&path).unwrap().model_id.is_none());

        let config = Config {
            model_id: Some("gemini-2.5-pro".to_string()),
            system_instruction: Some("Answer in French.".to_string()),
            ..Config::new()
        };
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.model_id.as_deref(), Some("gemini-2.5-pro"));
        assert_eq!(loaded.system_instruction.as_deref(), Some("Answer in French."));
        assert!(loaded.temperature.is_none());
    }

    #[test]
    fn test_save_default_model_keeps_other_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        Config {
            temperature: Some(1.5),
            ..Config::new()
        }
        .save_to(&path)
        .unwrap();

        Config::save_default_model_to(&path, "gemini-3-pro-preview").unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.model_id.as_deref(), Some("gemini-3-pro-preview"));
        assert_eq!(loaded.temperature, Some(1.5));
    }

    #[test]
    fn test_save_default_model_replaces_broken_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{not json").unwrap();

        Config::save_default_model_to(&path, "gemini-2.5-pro").unwrap();
        assert_eq!(Config::load_from(&path).unwrap().model_id.as_deref(), Some("gemini-2.5-pro"));
    }

    #[test]
    fn test_malformed_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{not json").unwrap();
        assert!(Config::load_from(&path).unwrap_err().is_configuration());
    }
}
