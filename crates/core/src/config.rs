use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveTime;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const CONFIG_FILE_NAME: &str = "verse-agent.toml";

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub llm: LlmConfig,
    pub bible: BibleConfig,
    pub schedule: ScheduleConfig,
    pub telex: TelexConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct LlmConfig {
    pub api_key: Option<SecretString>,
    pub base_url: String,
    pub model: String,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct BibleConfig {
    pub base_url: String,
    pub api_key: Option<SecretString>,
    pub bible_id: String,
    pub random_verse_url: String,
    pub search_limit: u32,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct ScheduleConfig {
    /// `HH:MM` in UTC. Unset disables the daily post.
    pub daily_post_time: Option<String>,
}

#[derive(Clone, Debug)]
pub struct TelexConfig {
    pub base_url: String,
    pub webhook_hook_id: Option<String>,
    pub bearer_token: Option<SecretString>,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
    pub graceful_shutdown_secs: u64,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub llm_api_key: Option<String>,
    pub llm_base_url: Option<String>,
    pub llm_model: Option<String>,
    pub bible_api_key: Option<String>,
    pub bible_base_url: Option<String>,
    pub bible_random_verse_url: Option<String>,
    pub daily_post_time: Option<String>,
    pub telex_base_url: Option<String>,
    pub telex_webhook_hook_id: Option<String>,
    pub server_port: Option<u16>,
    pub log_level: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            llm: LlmConfig {
                api_key: None,
                base_url: "https://generativelanguage.googleapis.com".to_string(),
                model: "gemini-2.5-flash".to_string(),
                timeout_secs: 10,
            },
            bible: BibleConfig {
                base_url: "https://api.scripture.api.bible/v1".to_string(),
                api_key: None,
                bible_id: "de4e12af7f28f599-02".to_string(),
                random_verse_url: "https://labs.bible.org/api/?passage=random&type=json"
                    .to_string(),
                search_limit: 10,
                timeout_secs: 10,
            },
            schedule: ScheduleConfig { daily_post_time: None },
            telex: TelexConfig {
                base_url: "https://ping.telex.im".to_string(),
                webhook_hook_id: None,
                bearer_token: None,
                timeout_secs: 10,
            },
            server: ServerConfig {
                bind_address: "0.0.0.0".to_string(),
                port: 8000,
                graceful_shutdown_secs: 15,
            },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

impl ScheduleConfig {
    pub fn post_time(&self) -> Option<NaiveTime> {
        self.daily_post_time.as_deref().and_then(|raw| parse_post_time(raw).ok())
    }
}

impl TelexConfig {
    /// Full webhook URL, or `None` when delivery should degrade to logging.
    pub fn webhook_url(&self) -> Option<String> {
        let hook_id = self.webhook_hook_id.as_deref()?.trim();
        if hook_id.is_empty() {
            return None;
        }
        Some(format!("{}/v1/webhooks/{hook_id}", self.base_url.trim_end_matches('/')))
    }
}

fn secret_value(value: String) -> SecretString {
    value.into()
}

pub fn parse_post_time(raw: &str) -> Result<NaiveTime, ConfigError> {
    NaiveTime::parse_from_str(raw.trim(), "%H:%M").map_err(|_| {
        ConfigError::Validation(format!(
            "schedule.daily_post_time must be HH:MM in UTC (got `{}`)",
            raw.trim()
        ))
    })
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected =
                options.config_path.unwrap_or_else(|| PathBuf::from(CONFIG_FILE_NAME));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(llm) = patch.llm {
            if let Some(llm_api_key_value) = llm.api_key {
                self.llm.api_key = Some(secret_value(llm_api_key_value));
            }
            if let Some(base_url) = llm.base_url {
                self.llm.base_url = base_url;
            }
            if let Some(model) = llm.model {
                self.llm.model = model;
            }
            if let Some(timeout_secs) = llm.timeout_secs {
                self.llm.timeout_secs = timeout_secs;
            }
        }

        if let Some(bible) = patch.bible {
            if let Some(base_url) = bible.base_url {
                self.bible.base_url = base_url;
            }
            if let Some(bible_api_key_value) = bible.api_key {
                self.bible.api_key = Some(secret_value(bible_api_key_value));
            }
            if let Some(bible_id) = bible.bible_id {
                self.bible.bible_id = bible_id;
            }
            if let Some(random_verse_url) = bible.random_verse_url {
                self.bible.random_verse_url = random_verse_url;
            }
            if let Some(search_limit) = bible.search_limit {
                self.bible.search_limit = search_limit;
            }
            if let Some(timeout_secs) = bible.timeout_secs {
                self.bible.timeout_secs = timeout_secs;
            }
        }

        if let Some(schedule) = patch.schedule {
            if let Some(daily_post_time) = schedule.daily_post_time {
                self.schedule.daily_post_time = Some(daily_post_time);
            }
        }

        if let Some(telex) = patch.telex {
            if let Some(base_url) = telex.base_url {
                self.telex.base_url = base_url;
            }
            if let Some(webhook_hook_id) = telex.webhook_hook_id {
                self.telex.webhook_hook_id = Some(webhook_hook_id);
            }
            if let Some(telex_bearer_token_value) = telex.bearer_token {
                self.telex.bearer_token = Some(secret_value(telex_bearer_token_value));
            }
            if let Some(timeout_secs) = telex.timeout_secs {
                self.telex.timeout_secs = timeout_secs;
            }
        }

        if let Some(server) = patch.server {
            if let Some(bind_address) = server.bind_address {
                self.server.bind_address = bind_address;
            }
            if let Some(port) = server.port {
                self.server.port = port;
            }
            if let Some(graceful_shutdown_secs) = server.graceful_shutdown_secs {
                self.server.graceful_shutdown_secs = graceful_shutdown_secs;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env_any(&["VERSE_LLM_API_KEY", "GEMINI_API_KEY"]) {
            self.llm.api_key = Some(secret_value(value));
        }
        if let Some(value) = read_env("VERSE_LLM_BASE_URL") {
            self.llm.base_url = value;
        }
        if let Some(value) = read_env("VERSE_LLM_MODEL") {
            self.llm.model = value;
        }
        if let Some(value) = read_env("VERSE_LLM_TIMEOUT_SECS") {
            self.llm.timeout_secs = parse_u64("VERSE_LLM_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env_any(&["VERSE_BIBLE_BASE_URL", "BIBLE_API_BASE_URL"]) {
            self.bible.base_url = value;
        }
        if let Some(value) = read_env_any(&["VERSE_BIBLE_API_KEY", "BIBLE_API_KEY"]) {
            self.bible.api_key = Some(secret_value(value));
        }
        if let Some(value) = read_env_any(&["VERSE_BIBLE_ID", "BIBLE_ID"]) {
            self.bible.bible_id = value;
        }
        if let Some(value) = read_env("VERSE_BIBLE_RANDOM_VERSE_URL") {
            self.bible.random_verse_url = value;
        }
        if let Some(value) = read_env("VERSE_BIBLE_SEARCH_LIMIT") {
            self.bible.search_limit = parse_u32("VERSE_BIBLE_SEARCH_LIMIT", &value)?;
        }
        if let Some(value) = read_env("VERSE_BIBLE_TIMEOUT_SECS") {
            self.bible.timeout_secs = parse_u64("VERSE_BIBLE_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env_any(&["VERSE_DAILY_POST_TIME", "DAILY_POST_TIME"]) {
            self.schedule.daily_post_time = Some(value);
        }

        if let Some(value) = read_env_any(&["VERSE_TELEX_BASE_URL", "TELEX_BASE_URL"]) {
            self.telex.base_url = value;
        }
        if let Some(value) =
            read_env_any(&["VERSE_TELEX_WEBHOOK_HOOK_ID", "TELEX_WEBHOOK_HOOK_ID"])
        {
            self.telex.webhook_hook_id = Some(value);
        }
        if let Some(value) = read_env_any(&["VERSE_TELEX_BEARER_TOKEN", "TELEX_BEARER_TOKEN"]) {
            self.telex.bearer_token = Some(secret_value(value));
        }
        if let Some(value) = read_env("VERSE_TELEX_TIMEOUT_SECS") {
            self.telex.timeout_secs = parse_u64("VERSE_TELEX_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("VERSE_SERVER_BIND_ADDRESS") {
            self.server.bind_address = value;
        }
        if let Some(value) = read_env("VERSE_SERVER_PORT") {
            self.server.port = parse_u16("VERSE_SERVER_PORT", &value)?;
        } else if let Some(value) = read_env("PORT") {
            self.server.port = parse_u16("PORT", &value)?;
        }
        if let Some(value) = read_env("VERSE_SERVER_GRACEFUL_SHUTDOWN_SECS") {
            self.server.graceful_shutdown_secs =
                parse_u64("VERSE_SERVER_GRACEFUL_SHUTDOWN_SECS", &value)?;
        }

        if let Some(value) = read_env_any(&["VERSE_LOGGING_LEVEL", "VERSE_LOG_LEVEL"]) {
            self.logging.level = value;
        }
        if let Some(value) = read_env_any(&["VERSE_LOGGING_FORMAT", "VERSE_LOG_FORMAT"]) {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(llm_api_key) = overrides.llm_api_key {
            self.llm.api_key = Some(secret_value(llm_api_key));
        }
        if let Some(llm_base_url) = overrides.llm_base_url {
            self.llm.base_url = llm_base_url;
        }
        if let Some(llm_model) = overrides.llm_model {
            self.llm.model = llm_model;
        }
        if let Some(bible_api_key) = overrides.bible_api_key {
            self.bible.api_key = Some(secret_value(bible_api_key));
        }
        if let Some(bible_base_url) = overrides.bible_base_url {
            self.bible.base_url = bible_base_url;
        }
        if let Some(random_verse_url) = overrides.bible_random_verse_url {
            self.bible.random_verse_url = random_verse_url;
        }
        if let Some(daily_post_time) = overrides.daily_post_time {
            self.schedule.daily_post_time = Some(daily_post_time);
        }
        if let Some(telex_base_url) = overrides.telex_base_url {
            self.telex.base_url = telex_base_url;
        }
        if let Some(hook_id) = overrides.telex_webhook_hook_id {
            self.telex.webhook_hook_id = Some(hook_id);
        }
        if let Some(port) = overrides.server_port {
            self.server.port = port;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_llm(&self.llm)?;
        validate_bible(&self.bible)?;
        validate_schedule(&self.schedule)?;
        validate_telex(&self.telex)?;
        validate_server(&self.server)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from(CONFIG_FILE_NAME), Path::new("config").join(CONFIG_FILE_NAME)]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_timeout(key: &str, timeout_secs: u64) -> Result<(), ConfigError> {
    if timeout_secs == 0 || timeout_secs > 300 {
        return Err(ConfigError::Validation(format!("{key} must be in range 1..=300")));
    }
    Ok(())
}

fn validate_http_url(key: &str, url: &str) -> Result<(), ConfigError> {
    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(ConfigError::Validation(format!("{key} must start with http:// or https://")));
    }
    Ok(())
}

fn secret_missing(secret: Option<&SecretString>) -> bool {
    secret.map(|value| value.expose_secret().trim().is_empty()).unwrap_or(true)
}

fn validate_llm(llm: &LlmConfig) -> Result<(), ConfigError> {
    if secret_missing(llm.api_key.as_ref()) {
        return Err(ConfigError::Validation(
            "llm.api_key is required. Set VERSE_LLM_API_KEY (or GEMINI_API_KEY) to a Gemini API key from https://aistudio.google.com/app/apikey".to_string(),
        ));
    }
    validate_http_url("llm.base_url", &llm.base_url)?;
    if llm.model.trim().is_empty() {
        return Err(ConfigError::Validation("llm.model must not be empty".to_string()));
    }
    validate_timeout("llm.timeout_secs", llm.timeout_secs)
}

fn validate_bible(bible: &BibleConfig) -> Result<(), ConfigError> {
    if secret_missing(bible.api_key.as_ref()) {
        return Err(ConfigError::Validation(
            "bible.api_key is required. Set VERSE_BIBLE_API_KEY (or BIBLE_API_KEY) to a key from https://scripture.api.bible".to_string(),
        ));
    }
    validate_http_url("bible.base_url", &bible.base_url)?;
    validate_http_url("bible.random_verse_url", &bible.random_verse_url)?;
    if bible.bible_id.trim().is_empty() {
        return Err(ConfigError::Validation("bible.bible_id must not be empty".to_string()));
    }
    if bible.search_limit == 0 || bible.search_limit > 100 {
        return Err(ConfigError::Validation(
            "bible.search_limit must be in range 1..=100".to_string(),
        ));
    }
    validate_timeout("bible.timeout_secs", bible.timeout_secs)
}

fn validate_schedule(schedule: &ScheduleConfig) -> Result<(), ConfigError> {
    match schedule.daily_post_time.as_deref() {
        Some(raw) => parse_post_time(raw).map(|_| ()),
        None => Ok(()),
    }
}

fn validate_telex(telex: &TelexConfig) -> Result<(), ConfigError> {
    validate_http_url("telex.base_url", &telex.base_url)?;
    validate_timeout("telex.timeout_secs", telex.timeout_secs)
}

fn validate_server(server: &ServerConfig) -> Result<(), ConfigError> {
    if server.port == 0 {
        return Err(ConfigError::Validation("server.port must be greater than zero".to_string()));
    }

    if server.graceful_shutdown_secs == 0 {
        return Err(ConfigError::Validation(
            "server.graceful_shutdown_secs must be greater than zero".to_string(),
        ));
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn read_env_any(keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| read_env(key))
}

fn parse_u16(key: &str, value: &str) -> Result<u16, ConfigError> {
    value.parse::<u16>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u32(key: &str, value: &str) -> Result<u32, ConfigError> {
    value.parse::<u32>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse::<u64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    llm: Option<LlmPatch>,
    bible: Option<BiblePatch>,
    schedule: Option<SchedulePatch>,
    telex: Option<TelexPatch>,
    server: Option<ServerPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct LlmPatch {
    api_key: Option<String>,
    base_url: Option<String>,
    model: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct BiblePatch {
    base_url: Option<String>,
    api_key: Option<String>,
    bible_id: Option<String>,
    random_verse_url: Option<String>,
    search_limit: Option<u32>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct SchedulePatch {
    daily_post_time: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct TelexPatch {
    base_url: Option<String>,
    webhook_hook_id: Option<String>,
    bearer_token: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerPatch {
    bind_address: Option<String>,
    port: Option<u16>,
    graceful_shutdown_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}
