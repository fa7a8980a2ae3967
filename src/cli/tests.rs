use crate::cli::Args;
use crate::config::LLMProvider;
use crate::i18n::TargetLanguage;
use clap::{CommandFactory, Parser};
use std::io::Write;
use std::path::PathBuf;
use tempfile::NamedTempFile;

#[test]
fn test_args_default_values() {
    let args = Args::try_parse_from(["newsroom-rs"]).unwrap();

    assert!(args.config.is_none());
    assert!(args.bind.is_none());
    assert!(args.topic.is_none());
    assert!(args.analyst_count.is_none());
    assert!(!args.verbose);
    assert!(!args.no_cache);
    assert!(!args.enable_cache);
}

#[test]
fn test_args_short_options() {
    let args = Args::try_parse_from([
        "newsroom-rs",
        "-c",
        "/etc/newsroom.toml",
        "-b",
        "0.0.0.0:9000",
        "-t",
        "Election misinformation",
        "-n",
        "4",
        "-v",
    ])
    .unwrap();

    assert_eq!(args.config, Some(PathBuf::from("/etc/newsroom.toml")));
    assert_eq!(args.bind.as_deref(), Some("0.0.0.0:9000"));
    assert_eq!(args.topic.as_deref(), Some("Election misinformation"));
    assert_eq!(args.analyst_count, Some(4));
    assert!(args.verbose);
}

#[test]
fn test_args_llm_options() {
    let args = Args::try_parse_from([
        "newsroom-rs",
        "--llm-provider",
        "deepseek",
        "--llm-api-key",
        "test-key",
        "--llm-api-base-url",
        "https://api.deepseek.com",
        "--model-efficient",
        "deepseek-chat",
        "--model-powerful",
        "deepseek-reasoner",
        "--max-tokens",
        "2048",
        "--temperature",
        "0.7",
        "--max-parallels",
        "5",
    ])
    .unwrap();

    assert_eq!(args.llm_provider.as_deref(), Some("deepseek"));
    assert_eq!(args.max_tokens, Some(2048));
    assert_eq!(args.temperature, Some(0.7));
    assert_eq!(args.max_parallels, Some(5));
}

#[test]
fn test_cache_flags_conflict() {
    let result = Args::try_parse_from(["newsroom-rs", "--enable-cache", "--no-cache"]);
    assert!(result.is_err());
}

#[test]
fn test_into_config_applies_overrides() {
    let args = Args::try_parse_from([
        "newsroom-rs",
        "--bind",
        "0.0.0.0:9000",
        "--database-url",
        "sqlite::memory:",
        "--analyst-count",
        "5",
        "--llm-provider",
        "anthropic",
        "--model-powerful",
        "claude-large",
        "--target-language",
        "zh",
        "--review-timeout-secs",
        "0",
        "--max-concurrent-runs",
        "2",
        "--enable-cache",
    ])
    .unwrap();

    let config = args.into_config().unwrap();
    assert_eq!(config.bind_address, "0.0.0.0:9000");
    assert_eq!(config.database_url, "sqlite::memory:");
    assert_eq!(config.default_analyst_count, 5);
    assert_eq!(config.llm.provider, LLMProvider::Anthropic);
    assert_eq!(config.llm.model_powerful, "claude-large");
    assert_eq!(config.target_language, TargetLanguage::Chinese);
    assert_eq!(config.workflow.review_timeout_secs, 0);
    assert_eq!(config.workflow.max_concurrent_runs, 2);
    assert!(config.cache.enabled);
}

#[test]
fn test_into_config_ignores_unknown_provider() {
    let args = Args::try_parse_from(["newsroom-rs", "--llm-provider", "nonexistent"]).unwrap();
    let config = args.into_config().unwrap();
    assert_eq!(config.llm.provider, LLMProvider::default());
}

#[test]
fn test_into_config_rejects_invalid_values() {
    let args = Args::try_parse_from(["newsroom-rs", "--analyst-count", "0"]).unwrap();
    assert!(args.into_config().is_err());

    let args = Args::try_parse_from(["newsroom-rs", "--temperature", "3.5"]).unwrap();
    assert!(args.into_config().is_err());

    let args = Args::try_parse_from(["newsroom-rs", "--analyst-count", "15"]).unwrap();
    assert!(args.into_config().is_err());

    let args =
        Args::try_parse_from(["newsroom-rs", "--review-timeout-secs", "18446744073709551615"])
            .unwrap();
    assert!(args.into_config().is_err());
}

#[test]
fn test_into_config_reads_explicit_file() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
bind_address = "127.0.0.1:7000"
default_analyst_count = 6

[workflow]
review_timeout_secs = 30
"#
    )
    .unwrap();

    let args = Args::try_parse_from([
        "newsroom-rs",
        "--config",
        file.path().to_str().unwrap(),
        "--analyst-count",
        "2",
    ])
    .unwrap();
    let config = args.into_config().unwrap();

    assert_eq!(config.bind_address, "127.0.0.1:7000");
    assert_eq!(config.workflow.review_timeout_secs, 30);
    // 命令行参数优先于配置文件
    assert_eq!(config.default_analyst_count, 2);
}

#[test]
fn test_into_config_missing_explicit_file_is_error() {
    let args = Args::try_parse_from([
        "newsroom-rs",
        "--config",
        "/definitely/not/here/newsroom.toml",
    ])
    .unwrap();
    assert!(args.into_config().is_err());
}

#[test]
fn test_help_lists_supported_providers() {
    let help = Args::command().render_long_help().to_string();
    for provider in ["openai", "deepseek", "openrouter", "anthropic", "gemini", "ollama"] {
        assert!(help.contains(provider), "{}", provider);
        assert!(provider.parse::<LLMProvider>().is_ok());
    }
    assert!(!help.contains("mistral"));
}
