use std::env;
use std::fs;
use std::sync::{Mutex, OnceLock};

use serde_json::Value;
use verse_cli::commands::{ask, config, daily, workflow};

const UNREACHABLE: &str = "http://127.0.0.1:9";

const REQUIRED_KEYS: [(&str, &str); 2] =
    [("VERSE_LLM_API_KEY", "llm-test-key"), ("VERSE_BIBLE_API_KEY", "bible-test-key")];

#[test]
fn ask_returns_config_failure_without_keys() {
    with_env(&[], || {
        let result = ask::run("a verse about hope");
        assert_eq!(result.exit_code, 2, "expected config validation failure code");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "ask");
        assert_eq!(payload["status"], "error");
        assert_eq!(payload["error_class"], "config_validation");
    });
}

#[test]
fn daily_returns_config_failure_without_keys() {
    with_env(&[("VERSE_LLM_API_KEY", "llm-test-key")], || {
        let result = daily::run(true);
        assert_eq!(result.exit_code, 2);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "daily");
        assert_eq!(payload["error_class"], "config_validation");
        let message = payload["message"].as_str().unwrap_or_default();
        assert!(message.contains("bible.api_key"), "unexpected message: {message}");
    });
}

#[test]
fn ask_reports_upstream_failure_when_the_model_is_unreachable() {
    with_env(
        &[
            REQUIRED_KEYS[0],
            REQUIRED_KEYS[1],
            ("VERSE_LLM_BASE_URL", UNREACHABLE),
            ("VERSE_LLM_TIMEOUT_SECS", "2"),
        ],
        || {
            let result = ask::run("I need a verse on patience");
            assert_eq!(result.exit_code, 4, "expected pipeline failure code");

            let payload = parse_payload(&result.output);
            assert_eq!(payload["command"], "ask");
            assert_eq!(payload["error_class"], "upstream_unavailable");
        },
    );
}

#[test]
fn daily_dry_run_reports_exhausted_fallbacks_when_sources_are_down() {
    with_env(
        &[
            REQUIRED_KEYS[0],
            REQUIRED_KEYS[1],
            ("VERSE_BIBLE_BASE_URL", UNREACHABLE),
            ("VERSE_BIBLE_RANDOM_VERSE_URL", UNREACHABLE),
            ("VERSE_BIBLE_TIMEOUT_SECS", "2"),
        ],
        || {
            let result = daily::run(true);
            assert_eq!(result.exit_code, 4);

            let payload = parse_payload(&result.output);
            assert_eq!(payload["command"], "daily");
            assert_eq!(payload["error_class"], "fallback_exhausted");
        },
    );
}

#[test]
fn config_redacts_secrets_and_attributes_sources() {
    with_env(
        &[
            ("GEMINI_API_KEY", "gemini-secret-value"),
            ("VERSE_BIBLE_API_KEY", "bible-secret-value"),
            ("VERSE_SERVER_PORT", "9100"),
        ],
        || {
            let result = config::run();
            assert_eq!(result.exit_code, 0);
            assert!(!result.output.contains("gemini-secret-value"), "llm key leaked");
            assert!(!result.output.contains("bible-secret-value"), "bible key leaked");

            let payload = parse_payload(&result.output);
            assert_eq!(payload["command"], "config");
            assert_eq!(payload["status"], "ok");

            let llm_key = config_field(&payload, "llm.api_key");
            assert_eq!(llm_key["value"], "<redacted>");
            assert_eq!(llm_key["source"], "env (GEMINI_API_KEY)");

            let bible_key = config_field(&payload, "bible.api_key");
            assert_eq!(bible_key["value"], "<redacted>");
            assert_eq!(bible_key["source"], "env (VERSE_BIBLE_API_KEY)");

            let port = config_field(&payload, "server.port");
            assert_eq!(port["value"], "9100");
            assert_eq!(port["source"], "env (VERSE_SERVER_PORT)");

            let token = config_field(&payload, "telex.bearer_token");
            assert_eq!(token["value"], "<unset>");
            assert_eq!(token["source"], "default");
        },
    );
}

#[test]
fn config_returns_config_failure_without_keys() {
    with_env(&[], || {
        let result = config::run();
        assert_eq!(result.exit_code, 2);
        assert_eq!(parse_payload(&result.output)["error_class"], "config_validation");
    });
}

#[test]
fn workflow_writes_the_descriptor_to_the_requested_file() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("workflow.json");

    let result = workflow::run("https://verses.example.com/a2a", Some(&path));
    assert_eq!(result.exit_code, 0);

    let payload = parse_payload(&result.output);
    assert_eq!(payload["command"], "workflow");
    assert_eq!(payload["status"], "ok");
    let written = fs::read_to_string(&path).expect("descriptor file");
    let written = parse_payload(&written);
    assert_eq!(payload["data"], written);
    assert_eq!(written["nodes"][0]["url"], "https://verses.example.com/a2a");
}

#[test]
fn workflow_without_out_prints_the_descriptor_as_data() {
    let result = workflow::run(workflow::DEFAULT_A2A_URL, None);
    assert_eq!(result.exit_code, 0);

    let payload = parse_payload(&result.output);
    assert_eq!(payload["data"]["name"], workflow::WORKFLOW_NAME);
    assert_eq!(payload["data"]["nodes"][0]["url"], workflow::DEFAULT_A2A_URL);
}

#[test]
fn workflow_reports_io_failure_for_unwritable_path() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("missing").join("workflow.json");

    let result = workflow::run(workflow::DEFAULT_A2A_URL, Some(&path));
    assert_eq!(result.exit_code, 6);

    let payload = parse_payload(&result.output);
    assert_eq!(payload["command"], "workflow");
    assert_eq!(payload["error_class"], "io");
}

fn parse_payload(output: &str) -> Value {
    serde_json::from_str(output).expect("command output should be valid JSON")
}

fn config_field<'a>(payload: &'a Value, key: &str) -> &'a Value {
    payload["data"]["fields"]
        .as_array()
        .and_then(|fields| fields.iter().find(|field| field["key"] == key))
        .unwrap_or_else(|| panic!("config output should list {key}"))
}

fn with_env(vars: &[(&str, &str)], test_fn: impl FnOnce()) {
    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    let _guard =
        ENV_LOCK.get_or_init(|| Mutex::new(())).lock().expect("env mutex should not be poisoned");

    let keys = [
        "VERSE_LLM_API_KEY",
        "GEMINI_API_KEY",
        "VERSE_LLM_BASE_URL",
        "VERSE_LLM_MODEL",
        "VERSE_LLM_TIMEOUT_SECS",
        "VERSE_BIBLE_BASE_URL",
        "BIBLE_API_BASE_URL",
        "VERSE_BIBLE_API_KEY",
        "BIBLE_API_KEY",
        "VERSE_BIBLE_ID",
        "BIBLE_ID",
        "VERSE_BIBLE_RANDOM_VERSE_URL",
        "VERSE_BIBLE_SEARCH_LIMIT",
        "VERSE_BIBLE_TIMEOUT_SECS",
        "VERSE_DAILY_POST_TIME",
        "DAILY_POST_TIME",
        "VERSE_TELEX_BASE_URL",
        "TELEX_BASE_URL",
        "VERSE_TELEX_WEBHOOK_HOOK_ID",
        "TELEX_WEBHOOK_HOOK_ID",
        "VERSE_TELEX_BEARER_TOKEN",
        "TELEX_BEARER_TOKEN",
        "VERSE_TELEX_TIMEOUT_SECS",
        "VERSE_SERVER_BIND_ADDRESS",
        "VERSE_SERVER_PORT",
        "PORT",
        "VERSE_SERVER_GRACEFUL_SHUTDOWN_SECS",
        "VERSE_LOGGING_LEVEL",
        "VERSE_LOGGING_FORMAT",
        "VERSE_LOG_LEVEL",
        "VERSE_LOG_FORMAT",
    ];

    let previous_values: Vec<(&str, Option<String>)> =
        keys.iter().map(|key| (*key, env::var(key).ok())).collect();

    for key in keys {
        env::remove_var(key);
    }
    for (key, value) in vars {
        env::set_var(key, value);
    }

    test_fn();

    for (key, value) in previous_values {
        match value {
            Some(value) => env::set_var(key, value),
            None => env::remove_var(key),
        }
    }
}
