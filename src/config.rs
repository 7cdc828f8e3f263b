use config::{Config, ConfigError, Environment, File, Map};
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const DEFAULT_SITE_URL: &str = "https://www.kicktipp.de";
pub const DEFAULT_SEASON_ID: &str = "2813920";
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10.15; rv:127.0) Gecko/20100101 Firefox/127.0";
pub const DEFAULT_LLM_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4o";
pub const DEFAULT_TOURNAMENT: &str = "Europameisterschaft 2024";
pub const DEFAULT_SITE_LOOKUP_KEY: &str = "https://www.kicktipp.de/info/profil/login";
pub const DEFAULT_LLM_LOOKUP_KEY: &str = "local-access://tng-ai-token.offline";
pub const DEFAULT_PLACEHOLDER: &str = "nothing";

/// Main configuration structure
#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub site: SiteConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub secrets: SecretsConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub prompt: PromptConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SiteConfig {
    /// Site root, without the group segment
    #[serde(default = "default_site_url")]
    pub base_url: String,
    /// Prediction group ("Tipprunde") the pages live under
    #[serde(default)]
    pub group_name: String,
    /// Season the match-day index refers to
    #[serde(default = "default_season_id")]
    pub season_id: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Explicit login; falls back to the secret chain when unset
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_url: default_site_url(),
            group_name: String::new(),
            season_id: default_season_id(),
            user_agent: default_user_agent(),
            username: None,
            password: None,
        }
    }
}

impl SiteConfig {
    pub fn login_url(&self) -> String {
        format!("{}/info/profil/loginaction", self.base_url.trim_end_matches('/'))
    }

    pub fn group_url(&self) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), self.group_name)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LlmConfig {
    /// Endpoint override (e.g. an organisation proxy)
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Named in the system instruction
    #[serde(default = "default_tournament")]
    pub tournament: String,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            api_key: None,
            model: default_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            tournament: default_tournament(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SecretsConfig {
    /// External secret manager: program and leading args, lookup key is appended
    #[serde(default)]
    pub command: Option<String>,
    #[serde(default = "default_site_lookup_key")]
    pub site_lookup_key: String,
    #[serde(default = "default_llm_lookup_key")]
    pub llm_lookup_key: String,
    /// Value treated as "not set"
    #[serde(default = "default_placeholder")]
    pub placeholder: String,
}

impl Default for SecretsConfig {
    fn default() -> Self {
        Self {
            command: None,
            site_lookup_key: default_site_lookup_key(),
            llm_lookup_key: default_llm_lookup_key(),
            placeholder: default_placeholder(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_output_dir")]
    pub dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct PromptConfig {
    /// Template file; the embedded template is used when unset
    #[serde(default)]
    pub template_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Enable JSON formatted logs
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

fn default_site_url() -> String {
    DEFAULT_SITE_URL.to_string()
}

fn default_season_id() -> String {
    DEFAULT_SEASON_ID.to_string()
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_temperature() -> f32 {
    0.2
}

fn default_max_tokens() -> u32 {
    2000
}

fn default_tournament() -> String {
    DEFAULT_TOURNAMENT.to_string()
}

fn default_site_lookup_key() -> String {
    DEFAULT_SITE_LOOKUP_KEY.to_string()
}

fn default_llm_lookup_key() -> String {
    DEFAULT_LLM_LOOKUP_KEY.to_string()
}

fn default_placeholder() -> String {
    DEFAULT_PLACEHOLDER.to_string()
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_log_level() -> String {
    "info".to_string()
}

impl AppConfig {
    /// Load configuration from a directory and the process environment
    pub fn load_from<P: AsRef<Path>>(config_dir: P) -> Result<Self, ConfigError> {
        Self::load_with_env(config_dir.as_ref(), None)
    }

    /// `env` replaces the process environment when given
    fn load_with_env(config_dir: &Path, env: Option<Map<String, String>>) -> Result<Self, ConfigError> {

        let builder = Config::builder()
            .set_default("logging.level", "info")?
            .set_default("logging.json", false)?
            // Load default config file
            .add_source(File::from(config_dir.join("default.toml")).required(false))
            // Load environment-specific config (e.g., config/production.toml)
            .add_source(
                File::from(config_dir.join(
                    std::env::var("TIPPGPT_ENV").unwrap_or_else(|_| "development".to_string()),
                ))
                .required(false),
            )
            // Override with environment variables (TIPPGPT_SITE__GROUP_NAME, etc.)
            .add_source(
                Environment::with_prefix("TIPPGPT")
                    .prefix_separator("_")
                    .separator("__")
                    .source(env),
            );

        builder.build()?.try_deserialize()
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.site.group_name.trim().is_empty() {
            errors.push("site.group_name is required".to_string());
        }

        if self.site.season_id.trim().is_empty() {
            errors.push("site.season_id must not be empty".to_string());
        }

        if !(0.0..=2.0).contains(&self.llm.temperature) {
            errors.push(format!(
                "llm.temperature must be between 0 and 2, got {}",
                self.llm.temperature
            ));
        }

        if self.llm.max_tokens == 0 {
            errors.push("llm.max_tokens must be positive".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
