use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

use crate::settings::AiModel;

/// Default Gemini generate-content endpoint, used when settings carry no custom endpoint
pub const DEFAULT_GEMINI_ENDPOINT: &str =
    "https://generativelanguage.googleapis.com/v1beta/models/gemini-1.5-flash:generateContent";

/// Main application configuration structure
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    /// HTTP server settings
    #[serde(default)]
    pub server: ServerConfig,
    /// Provider endpoints and models
    #[serde(default)]
    pub providers: ProvidersConfig,
    /// Server-side credentials used when settings select `default-ai`
    #[serde(default)]
    pub default_ai: DefaultAiConfig,
    /// YouTube transcript fetching and caching
    #[serde(default)]
    pub transcript: TranscriptConfig,
    /// Where the persisted AI settings live
    #[serde(default = "default_settings_path")]
    pub settings_path: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            providers: ProvidersConfig::default(),
            default_ai: DefaultAiConfig::default(),
            transcript: TranscriptConfig::default(),
            settings_path: default_settings_path(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// Address the HTTP server binds to
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
        }
    }
}

/// Endpoints and models for the supported AI providers
#[derive(Debug, Deserialize, Clone)]
pub struct ProvidersConfig {
    /// Base URL for the OpenAI API (for proxies or tests)
    #[serde(default = "default_openai_base_url")]
    pub openai_base_url: String,
    /// OpenAI chat model
    #[serde(default = "default_openai_model")]
    pub openai_model: String,
    /// Gemini endpoint used when settings carry no custom endpoint
    #[serde(default = "default_gemini_endpoint")]
    pub gemini_endpoint: String,
    /// Optional timeout for AI requests in seconds; unset means wait indefinitely
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            openai_base_url: default_openai_base_url(),
            openai_model: default_openai_model(),
            gemini_endpoint: default_gemini_endpoint(),
            request_timeout_secs: None,
        }
    }
}

/// Provider and key substituted for the `default-ai` model choice
#[derive(Debug, Deserialize, Clone, Default)]
pub struct DefaultAiConfig {
    pub provider: Option<AiModel>,
    pub api_key: Option<String>,
}

/// Configuration for transcript fetching, caching and retry behavior
#[derive(Debug, Deserialize, Clone)]
pub struct TranscriptConfig {
    /// YouTube origin, overridable for tests
    #[serde(default = "default_youtube_base_url")]
    pub base_url: String,
    /// How long a cached transcript stays fresh
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
    /// Attempts per transcript before giving up
    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: u32,
    /// Fixed delay between attempts in milliseconds
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Preferred caption language code, first track otherwise
    #[serde(default)]
    pub language: Option<String>,
}

impl Default for TranscriptConfig {
    fn default() -> Self {
        Self {
            base_url: default_youtube_base_url(),
            cache_ttl_secs: default_cache_ttl_secs(),
            retry_attempts: default_retry_attempts(),
            retry_delay_ms: default_retry_delay_ms(),
            timeout_secs: default_timeout_secs(),
            language: None,
        }
    }
}

// Default value functions
fn default_bind_address() -> String {
    "127.0.0.1:3000".to_string()
}

fn default_openai_base_url() -> String {
    "https://api.openai.com".to_string()
}

fn default_openai_model() -> String {
    "gpt-3.5-turbo".to_string()
}

fn default_gemini_endpoint() -> String {
    DEFAULT_GEMINI_ENDPOINT.to_string()
}

fn default_youtube_base_url() -> String {
    "https://www.youtube.com".to_string()
}

fn default_cache_ttl_secs() -> u64 {
    3600
}

fn default_retry_attempts() -> u32 {
    3
}

fn default_retry_delay_ms() -> u64 {
    1000
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_settings_path() -> String {
    "youlearn_settings.json".to_string()
}

impl AppConfig {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded with the following priority (highest to lowest):
    /// 1. Environment variables with LEARNFLOW__ prefix
    /// 2. config.toml file in current directory
    /// 3. Default values
    ///
    /// Environment variable format: LEARNFLOW__TRANSCRIPT__CACHE_TTL_SECS
    pub fn load() -> Result<Self, ConfigError> {
        load_config()
    }
}

/// Load configuration from file and environment variables
pub fn load_config() -> Result<AppConfig, ConfigError> {
    let settings = Config::builder()
        // Optional config file (can be missing)
        .add_source(File::with_name("config").required(false))
        // Use double underscore for nested: LEARNFLOW__PROVIDERS__OPENAI_MODEL
        .add_source(
            Environment::with_prefix("LEARNFLOW")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    settings.try_deserialize()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        assert_eq!(default_bind_address(), "127.0.0.1:3000");
        assert_eq!(default_openai_model(), "gpt-3.5-turbo");
        assert_eq!(default_cache_ttl_secs(), 3600);
        assert_eq!(default_retry_attempts(), 3);
        assert_eq!(default_retry_delay_ms(), 1000);
        assert_eq!(default_timeout_secs(), 30);
    }

    #[test]
    fn test_transcript_config_default() {
        let transcript = TranscriptConfig::default();
        assert_eq!(transcript.base_url, "https://www.youtube.com");
        assert_eq!(transcript.cache_ttl_secs, 3600);
        assert!(transcript.language.is_none());
    }

    #[test]
    fn test_config_from_toml_fills_defaults() {
        let config: AppConfig = Config::builder()
            .add_source(File::from_str(
                r#"
                [providers]
                openai_model = "gpt-4o-mini"

                [default_ai]
                provider = "gemini"
                api_key = "server-key"
                "#,
                config::FileFormat::Toml,
            ))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(config.providers.openai_model, "gpt-4o-mini");
        assert_eq!(config.providers.openai_base_url, "https://api.openai.com");
        assert_eq!(config.default_ai.provider, Some(AiModel::Gemini));
        assert_eq!(config.default_ai.api_key.as_deref(), Some("server-key"));
        assert_eq!(config.server.bind_address, "127.0.0.1:3000");
        assert_eq!(config.settings_path, "youlearn_settings.json");
    }

    #[test]
    fn test_app_config_default_matches_serde_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.settings_path, "youlearn_settings.json");
        assert_eq!(config.server.bind_address, "127.0.0.1:3000");
        assert_eq!(config.transcript.retry_attempts, 3);
        assert!(config.default_ai.provider.is_none());
    }

    #[test]
    fn test_load_config_without_file() {
        // Every field has a default, so loading never needs a file
        let result = load_config();
        assert!(result.is_ok());
    }
}
