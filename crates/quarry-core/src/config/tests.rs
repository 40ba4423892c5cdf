use std::io::Write;

use serial_test::serial;

use super::*;

const ENV_KEYS: [&str; 7] = [
    "QUARRY_MAX_TOOL_INVOCATIONS",
    "QUARRY_REASONING_TIMEOUT",
    "QUARRY_DEFAULT_K",
    "QUARRY_CHAT_COMMAND",
    "QUARRY_EMBED_COMMAND",
    "QUARRY_WIKIPEDIA_ENABLED",
    "QUARRY_WIKIPEDIA_LANG",
];

fn clear_env() {
    for key in ENV_KEYS {
        unsafe { std::env::remove_var(key) };
    }
}

fn write_config(dir: &tempfile::TempDir, body: &str) -> std::path::PathBuf {
    let path = dir.path().join("quarry.toml");
    let mut f = std::fs::File::create(&path).unwrap();
    write!(f, "{body}").unwrap();
    path
}

#[test]
fn defaults() {
    let config = Config::default();
    assert_eq!(config.agent.max_tool_invocations, 6);
    assert_eq!(config.agent.reasoning_timeout_secs, 120);
    assert!(config.agent.system_prompt.is_none());
    assert_eq!(config.index.default_k, 4);
    assert_eq!(config.index.chunk_size, 500);
    assert_eq!(config.index.chunk_overlap, 50);
    assert_eq!(config.llm.chat_command, ["llm", "-m", "gpt-4o-mini"]);
    assert_eq!(config.llm.timeout_secs, 120);
    assert_eq!(config.tools.retriever.k, 4);
    assert!(config.tools.wikipedia.enabled);
    config.validate().unwrap();
}

#[test]
#[serial]
fn missing_file_uses_defaults() {
    clear_env();
    let dir = tempfile::tempdir().unwrap();
    let config = Config::load(&dir.path().join("absent.toml")).unwrap();
    assert_eq!(config.agent.max_tool_invocations, 6);
}

#[test]
#[serial]
fn parse_valid_toml() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(
        &dir,
        r#"
[agent]
max_tool_invocations = 3
system_prompt = "Answer tersely."

[index]
default_k = 2
chunk_size = 800
chunk_overlap = 100

[llm]
chat_command = ["ollama", "run", "llama3"]
embed_command = ["embedder"]

[tools.wikipedia]
lang = "fr"
"#,
    );

    clear_env();

    let config = Config::load(&path).unwrap();
    assert_eq!(config.agent.max_tool_invocations, 3);
    assert_eq!(
        config.agent.system_prompt.as_deref(),
        Some("Answer tersely.")
    );
    assert_eq!(config.agent.reasoning_timeout_secs, 120);
    assert_eq!(config.index.default_k, 2);
    assert_eq!(config.index.chunk_size, 800);
    assert_eq!(config.llm.chat_command, ["ollama", "run", "llama3"]);
    assert_eq!(config.tools.wikipedia.lang, "fr");
    assert_eq!(config.tools.wikipedia.top_k_results, 3);
}

#[test]
#[serial]
fn malformed_toml_is_an_error() {
    clear_env();
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(&dir, "[agent\nmax_tool_invocations = ");
    let err = Config::load(&path).unwrap_err();
    assert!(err.to_string().contains("failed to parse config file"));
}

#[test]
#[serial]
fn env_overrides() {
    clear_env();
    unsafe {
        std::env::set_var("QUARRY_MAX_TOOL_INVOCATIONS", "2");
        std::env::set_var("QUARRY_REASONING_TIMEOUT", "30");
        std::env::set_var("QUARRY_DEFAULT_K", "7");
        std::env::set_var("QUARRY_CHAT_COMMAND", "ollama run mistral");
        std::env::set_var("QUARRY_EMBED_COMMAND", "embed-cli --json");
        std::env::set_var("QUARRY_WIKIPEDIA_ENABLED", "false");
        std::env::set_var("QUARRY_WIKIPEDIA_LANG", "de");
    }

    let dir = tempfile::tempdir().unwrap();
    let config = Config::load(&dir.path().join("absent.toml")).unwrap();
    clear_env();

    assert_eq!(config.agent.max_tool_invocations, 2);
    assert_eq!(config.agent.reasoning_timeout_secs, 30);
    assert_eq!(config.index.default_k, 7);
    assert_eq!(config.llm.chat_command, ["ollama", "run", "mistral"]);
    assert_eq!(config.llm.embed_command, ["embed-cli", "--json"]);
    assert!(!config.tools.wikipedia.enabled);
    assert_eq!(config.tools.wikipedia.lang, "de");
}

#[test]
#[serial]
fn invalid_env_values_are_ignored() {
    clear_env();
    unsafe {
        std::env::set_var("QUARRY_MAX_TOOL_INVOCATIONS", "many");
        std::env::set_var("QUARRY_WIKIPEDIA_ENABLED", "maybe");
    }

    let dir = tempfile::tempdir().unwrap();
    let config = Config::load(&dir.path().join("absent.toml")).unwrap();
    clear_env();

    assert_eq!(config.agent.max_tool_invocations, 6);
    assert!(config.tools.wikipedia.enabled);
}

#[test]
#[serial]
fn env_override_to_zero_fails_validation() {
    clear_env();
    unsafe { std::env::set_var("QUARRY_DEFAULT_K", "0") };

    let dir = tempfile::tempdir().unwrap();
    let err = Config::load(&dir.path().join("absent.toml")).unwrap_err();
    clear_env();

    assert!(err.to_string().contains("index.default_k"));
}

#[test]
fn validate_rejects_zero_tool_budget() {
    let mut config = Config::default();
    config.agent.max_tool_invocations = 0;
    assert!(config.validate().is_err());
}

#[test]
fn validate_rejects_overlap_not_below_size() {
    let mut config = Config::default();
    config.index.chunk_overlap = config.index.chunk_size;
    let err = config.validate().unwrap_err();
    assert!(err.to_string().contains("chunk_overlap"));
}

#[test]
fn validate_rejects_empty_commands() {
    let mut config = Config::default();
    config.llm.chat_command.clear();
    assert!(config.validate().is_err());

    let mut config = Config::default();
    config.llm.embed_command.clear();
    assert!(config.validate().is_err());
}

#[test]
fn validate_rejects_zero_result_caps() {
    let mut config = Config::default();
    config.tools.retriever.max_results = 0;
    let err = config.validate().unwrap_err();
    assert!(err.to_string().contains("tools.retriever.max_results"));

    let mut config = Config::default();
    config.tools.wikipedia.top_k_results = 0;
    let err = config.validate().unwrap_err();
    assert!(err.to_string().contains("tools.wikipedia.top_k_results"));
}

#[test]
#[serial]
fn zero_max_results_in_file_fails_load() {
    clear_env();
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(&dir, "[tools.retriever]\nmax_results = 0\n");
    assert!(Config::load(&path).is_err());
}
