use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub provider: ProviderConfig,
    #[serde(default)]
    pub telegram: TelegramConfig,
    #[serde(default)]
    pub speech: SpeechConfig,
    #[serde(default)]
    pub state: StateConfig,
    #[serde(default)]
    pub access: AccessConfig,
}

/// OpenAI-compatible chat completions endpoint.
///
/// Empty fields are filled from `OPENAI_API_KEY`, `OPENAI_BASE_URL` and
/// `OPENAI_MODEL`, then from the built-in defaults.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct ProviderConfig {
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub base_url: String,
    #[serde(default)]
    pub model: String,
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct TelegramConfig {
    #[serde(default)]
    pub bot_token: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SpeechConfig {
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_speech_base_url")]
    pub base_url: String,
    #[serde(default = "default_voice_id")]
    pub voice_id: String,
    #[serde(default = "default_tts_model")]
    pub tts_model: String,
    #[serde(default = "default_stt_model")]
    pub stt_model: String,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: default_speech_base_url(),
            voice_id: default_voice_id(),
            tts_model: default_tts_model(),
            stt_model: default_stt_model(),
        }
    }
}

fn default_speech_base_url() -> String {
    "https://api.elevenlabs.io/v1".to_string()
}
fn default_voice_id() -> String {
    "3EuKHIEZbSzrHGNmdYsx".to_string()
}
fn default_tts_model() -> String {
    "eleven_multilingual_v2".to_string()
}
fn default_stt_model() -> String {
    "scribe_v2".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct StateConfig {
    #[serde(default = "default_db_path")]
    pub db_path: String,
}

impl Default for StateConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
        }
    }
}

fn default_db_path() -> String {
    "bot_history.db".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct AccessConfig {
    /// Username (without `@`) that bypasses the quota and may capture notes.
    #[serde(default = "default_owner_username")]
    pub owner_username: String,
    #[serde(default = "default_daily_limit")]
    pub daily_limit: u32,
    /// Allow requests through when the quota store cannot be reached.
    #[serde(default = "default_fail_open")]
    pub fail_open: bool,
    /// Don't count a user's very first request against the limit.
    #[serde(default)]
    pub first_contact_free: bool,
}

impl Default for AccessConfig {
    fn default() -> Self {
        Self {
            owner_username: default_owner_username(),
            daily_limit: default_daily_limit(),
            fail_open: default_fail_open(),
            first_contact_free: false,
        }
    }
}

fn default_owner_username() -> String {
    "roman8890".to_string()
}
fn default_daily_limit() -> u32 {
    2
}
fn default_fail_open() -> bool {
    true
}

/// Fill `slot` from `env_key` when it is empty, then from `fallback`.
fn fill<F>(slot: &mut String, env_key: &str, lookup: &F, fallback: Option<String>)
where
    F: Fn(&str) -> Option<String>,
{
    if !slot.trim().is_empty() {
        return;
    }
    if let Some(value) = lookup(env_key).filter(|v| !v.trim().is_empty()) {
        *slot = value.trim().to_string();
        return;
    }
    if let Some(fallback) = fallback {
        *slot = fallback;
    }
}

impl AppConfig {
    /// Load `config.toml` if it exists, resolve empty values from the
    /// process environment and validate the result.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)?;
            toml::from_str(&content)?
        } else {
            AppConfig::default()
        };
        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        fill(&mut self.provider.api_key, "OPENAI_API_KEY", &lookup, None);
        fill(
            &mut self.provider.base_url,
            "OPENAI_BASE_URL",
            &lookup,
            Some(default_base_url()),
        );
        fill(
            &mut self.provider.model,
            "OPENAI_MODEL",
            &lookup,
            Some(default_model()),
        );
        fill(&mut self.telegram.bot_token, "TELEGRAM_BOT_TOKEN", &lookup, None);
        fill(&mut self.speech.api_key, "ELEVENLABS_API_KEY", &lookup, None);
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        let required = [
            ("provider.api_key", "OPENAI_API_KEY", &self.provider.api_key),
            ("telegram.bot_token", "TELEGRAM_BOT_TOKEN", &self.telegram.bot_token),
            ("speech.api_key", "ELEVENLABS_API_KEY", &self.speech.api_key),
        ];
        for (field, env_key, value) in required {
            if value.trim().is_empty() {
                anyhow::bail!("{} is not set (set it in config.toml or via {})", field, env_key);
            }
        }
        if self.access.daily_limit == 0 {
            anyhow::bail!("access.daily_limit must be at least 1");
        }
        if self.state.db_path.trim().is_empty() {
            anyhow::bail!("state.db_path must not be empty");
        }
        Ok(())
    }
}
