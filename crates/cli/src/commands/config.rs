use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::SecretString;
use serde_json::json;
use toml::Value;
use verse_core::config::{AppConfig, CONFIG_FILE_NAME};

use crate::commands::{load_config, CommandResult};

/// Config key and the environment variables that can set it, in lookup order.
const FIELDS: &[(&str, &[&str])] = &[
    ("llm.api_key", &["VERSE_LLM_API_KEY", "GEMINI_API_KEY"]),
    ("llm.base_url", &["VERSE_LLM_BASE_URL"]),
    ("llm.model", &["VERSE_LLM_MODEL"]),
    ("llm.timeout_secs", &["VERSE_LLM_TIMEOUT_SECS"]),
    ("bible.base_url", &["VERSE_BIBLE_BASE_URL", "BIBLE_API_BASE_URL"]),
    ("bible.api_key", &["VERSE_BIBLE_API_KEY", "BIBLE_API_KEY"]),
    ("bible.bible_id", &["VERSE_BIBLE_ID", "BIBLE_ID"]),
    ("bible.random_verse_url", &["VERSE_BIBLE_RANDOM_VERSE_URL"]),
    ("bible.search_limit", &["VERSE_BIBLE_SEARCH_LIMIT"]),
    ("bible.timeout_secs", &["VERSE_BIBLE_TIMEOUT_SECS"]),
    ("schedule.daily_post_time", &["VERSE_DAILY_POST_TIME", "DAILY_POST_TIME"]),
    ("telex.base_url", &["VERSE_TELEX_BASE_URL", "TELEX_BASE_URL"]),
    ("telex.webhook_hook_id", &["VERSE_TELEX_WEBHOOK_HOOK_ID", "TELEX_WEBHOOK_HOOK_ID"]),
    ("telex.bearer_token", &["VERSE_TELEX_BEARER_TOKEN", "TELEX_BEARER_TOKEN"]),
    ("telex.timeout_secs", &["VERSE_TELEX_TIMEOUT_SECS"]),
    ("server.bind_address", &["VERSE_SERVER_BIND_ADDRESS"]),
    ("server.port", &["VERSE_SERVER_PORT", "PORT"]),
    ("server.graceful_shutdown_secs", &["VERSE_SERVER_GRACEFUL_SHUTDOWN_SECS"]),
    ("logging.level", &["VERSE_LOGGING_LEVEL", "VERSE_LOG_LEVEL"]),
    ("logging.format", &["VERSE_LOGGING_FORMAT", "VERSE_LOG_FORMAT"]),
];

pub fn run() -> CommandResult {
    let config = match load_config("config") {
        Ok(config) => config,
        Err(result) => return result,
    };

    let config_file_path = detect_config_path();
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let fields = FIELDS
        .iter()
        .map(|(key, env_keys)| {
            let source =
                field_source(key, env_keys, config_file_doc.as_ref(), config_file_path.as_deref());
            json!({ "key": key, "value": display_value(&config, key), "source": source })
        })
        .collect::<Vec<_>>();

    CommandResult::success_with_data(
        "config",
        "effective config (source precedence: env > file > default)",
        Some(json!({ "fields": fields })),
    )
}

fn display_value(config: &AppConfig, key: &str) -> String {
    let unset = || "<unset>".to_string();
    match key {
        "llm.api_key" => redact(config.llm.api_key.as_ref()),
        "llm.base_url" => config.llm.base_url.clone(),
        "llm.model" => config.llm.model.clone(),
        "llm.timeout_secs" => config.llm.timeout_secs.to_string(),
        "bible.base_url" => config.bible.base_url.clone(),
        "bible.api_key" => redact(config.bible.api_key.as_ref()),
        "bible.bible_id" => config.bible.bible_id.clone(),
        "bible.random_verse_url" => config.bible.random_verse_url.clone(),
        "bible.search_limit" => config.bible.search_limit.to_string(),
        "bible.timeout_secs" => config.bible.timeout_secs.to_string(),
        "schedule.daily_post_time" => {
            config.schedule.daily_post_time.clone().unwrap_or_else(unset)
        }
        "telex.base_url" => config.telex.base_url.clone(),
        "telex.webhook_hook_id" => config.telex.webhook_hook_id.clone().unwrap_or_else(unset),
        "telex.bearer_token" => redact(config.telex.bearer_token.as_ref()),
        "telex.timeout_secs" => config.telex.timeout_secs.to_string(),
        "server.bind_address" => config.server.bind_address.clone(),
        "server.port" => config.server.port.to_string(),
        "server.graceful_shutdown_secs" => config.server.graceful_shutdown_secs.to_string(),
        "logging.level" => config.logging.level.clone(),
        "logging.format" => format!("{:?}", config.logging.format),
        _ => unset(),
    }
}

fn redact(secret: Option<&SecretString>) -> String {
    let shown = if secret.is_some() { "<redacted>" } else { "<unset>" };
    shown.to_string()
}

fn detect_config_path() -> Option<PathBuf> {
    [PathBuf::from(CONFIG_FILE_NAME), Path::new("config").join(CONFIG_FILE_NAME)]
        .into_iter()
        .find(|path| path.exists())
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    let from_env = env_keys.iter().find(|env_key| {
        env::var(env_key).map(|value| !value.trim().is_empty()).unwrap_or(false)
    });
    if let Some(env_key) = from_env {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}
