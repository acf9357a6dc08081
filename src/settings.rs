use std::fmt;
use std::path::{Path, PathBuf};

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::config::DefaultAiConfig;
use crate::error::SettingsError;

/// Record name the web client used for its persisted settings
pub const SETTINGS_KEY: &str = "youlearn_settings";

/// AI model choice as it appears in persisted settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum AiModel {
    #[serde(rename = "openai")]
    OpenAI,
    Gemini,
    Groq,
    Anthropic,
    Local,
    #[default]
    DefaultAi,
}

impl AiModel {
    pub fn as_str(&self) -> &'static str {
        match self {
            AiModel::OpenAI => "openai",
            AiModel::Gemini => "gemini",
            AiModel::Groq => "groq",
            AiModel::Anthropic => "anthropic",
            AiModel::Local => "local",
            AiModel::DefaultAi => "default-ai",
        }
    }
}

impl fmt::Display for AiModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// User-selected provider, credentials and sampling temperature
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiSettings {
    #[serde(default)]
    pub ai_model: AiModel,
    #[serde(default)]
    pub api_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_endpoint: Option<String>,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
}

fn default_temperature() -> f64 {
    0.7
}

impl Default for AiSettings {
    fn default() -> Self {
        Self {
            ai_model: AiModel::default(),
            api_key: String::new(),
            custom_endpoint: None,
            temperature: default_temperature(),
        }
    }
}

impl AiSettings {
    pub fn new(ai_model: AiModel, api_key: impl Into<String>, temperature: f64) -> Self {
        Self {
            ai_model,
            api_key: api_key.into(),
            custom_endpoint: None,
            temperature,
        }
    }

    pub fn with_custom_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.custom_endpoint = Some(endpoint.into());
        self
    }

    /// Replace a `default-ai` choice with the server-side default provider.
    ///
    /// Settings that name a concrete provider are returned unchanged, as are
    /// `default-ai` settings when no server default is configured.
    pub fn resolve(&self, defaults: &DefaultAiConfig) -> AiSettings {
        if self.ai_model != AiModel::DefaultAi {
            return self.clone();
        }
        match defaults.provider {
            Some(provider) if provider != AiModel::DefaultAi => {
                let mut resolved = self.clone();
                resolved.ai_model = provider;
                if resolved.api_key.trim().is_empty() {
                    resolved.api_key = defaults.api_key.clone().unwrap_or_default();
                }
                resolved
            }
            _ => self.clone(),
        }
    }
}

/// Partial settings carried by an HTTP request; absent fields keep the stored value
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsOverride {
    pub ai_model: Option<AiModel>,
    pub api_key: Option<String>,
    pub custom_endpoint: Option<String>,
    pub temperature: Option<f64>,
}

impl SettingsOverride {
    pub fn apply(&self, base: &AiSettings) -> AiSettings {
        AiSettings {
            ai_model: self.ai_model.unwrap_or(base.ai_model),
            api_key: self.api_key.clone().unwrap_or_else(|| base.api_key.clone()),
            custom_endpoint: self
                .custom_endpoint
                .clone()
                .filter(|endpoint| !endpoint.trim().is_empty())
                .or_else(|| base.custom_endpoint.clone()),
            temperature: self.temperature.unwrap_or(base.temperature),
        }
    }
}

/// JSON file holding the user's AI settings between runs
#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the stored settings, falling back to defaults when nothing was saved yet
    pub async fn load(&self) -> Result<AiSettings, SettingsError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => {
                debug!("Loaded {} from {}", SETTINGS_KEY, self.path.display());
                Ok(serde_json::from_str(&raw)?)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!(
                    "No saved settings at {}, using defaults",
                    self.path.display()
                );
                Ok(AiSettings::default())
            }
            Err(e) => Err(e.into()),
        }
    }

    pub async fn save(&self, settings: &AiSettings) -> Result<(), SettingsError> {
        let raw = serde_json::to_string_pretty(settings)?;
        tokio::fs::write(&self.path, raw).await?;
        debug!("Saved {} to {}", SETTINGS_KEY, self.path.display());
        Ok(())
    }
}
