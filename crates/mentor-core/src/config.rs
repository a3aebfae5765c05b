use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

/// Deadline for a single LLM completion. Handlers fall back to deterministic
/// templates when it elapses.
pub const LLM_TIMEOUT_SECS: u64 = 30;

/// Top-level config (mentor.toml + MENTOR_* env overrides).
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct MentorConfig {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub telegram: Option<TelegramConfig>,
    #[serde(default)]
    pub providers: ProvidersConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    pub bot_token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_db_path")]
    pub path: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvidersConfig {
    pub anthropic: Option<AnthropicConfig>,
    pub openai: Option<OpenAiConfig>,
    /// Model requested from whichever provider is selected.
    #[serde(default = "default_model")]
    pub model: String,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            anthropic: None,
            openai: None,
            model: default_model(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnthropicConfig {
    pub api_key: String,
    #[serde(default = "default_anthropic_base_url")]
    pub base_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAiConfig {
    pub api_key: String,
    #[serde(default = "default_openai_base_url")]
    pub base_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Applied to users whose timezone column is null or unrecognised.
    #[serde(default = "default_timezone")]
    pub default_timezone: String,
    /// Fallback hour when a per-record reminder time fails to parse.
    #[serde(default = "default_reminder_hour")]
    pub default_reminder_hour: u8,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            default_timezone: default_timezone(),
            default_reminder_hour: default_reminder_hour(),
        }
    }
}

fn default_db_path() -> String {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    format!("{}/.mentor/mentor.db", home)
}
fn default_model() -> String {
    "claude-sonnet-4-6".to_string()
}
fn default_anthropic_base_url() -> String {
    "https://api.anthropic.com".to_string()
}
fn default_openai_base_url() -> String {
    "https://api.openai.com".to_string()
}
fn default_timezone() -> String {
    "UTC".to_string()
}
fn default_reminder_hour() -> u8 {
    9
}

impl MentorConfig {
    /// Load config from a TOML file with MENTOR_* env var overrides.
    ///
    /// Checks in order:
    ///   1. Explicit path argument
    ///   2. ~/.mentor/mentor.toml
    pub fn load(config_path: Option<&str>) -> crate::error::Result<Self> {
        let path = config_path
            .map(String::from)
            .unwrap_or_else(default_config_path);

        let config: MentorConfig = Figment::new()
            .merge(Toml::file(&path))
            .merge(Env::prefixed("MENTOR_").split("_"))
            .extract()
            .map_err(|e| crate::error::MentorError::Config(e.to_string()))?;

        Ok(config)
    }
}

fn default_config_path() -> String {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    format!("{}/.mentor/mentor.toml", home)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let config = MentorConfig::default();
        assert_eq!(config.scheduler.default_timezone, "UTC");
        assert_eq!(config.scheduler.default_reminder_hour, 9);
        assert!(config.store.path.ends_with("mentor.db"));
        assert!(config.telegram.is_none());
    }

    #[test]
    fn toml_sections_deserialize() {
        let config: MentorConfig = Figment::new()
            .merge(Toml::string(
                r#"
            [telegram]
            bot_token = "123:abc"

            [providers.anthropic]
            api_key = "sk-test"

            [scheduler]
            default_timezone = "Europe/Moscow"
            "#,
            ))
            .extract()
            .unwrap();
        assert_eq!(config.telegram.unwrap().bot_token, "123:abc");
        assert_eq!(
            config.providers.anthropic.unwrap().base_url,
            "https://api.anthropic.com"
        );
        assert_eq!(config.scheduler.default_timezone, "Europe/Moscow");
    }
}
