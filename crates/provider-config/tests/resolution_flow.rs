use std::collections::BTreeMap;

use reason_provider_config::{
    CallerEnv, FileEnv, Provider, ProviderConfigEngine, SourceChain, SystemValidator,
};

fn caller(pairs: &[(&str, &str)]) -> CallerEnv {
    CallerEnv::from_map(
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect::<BTreeMap<_, _>>(),
    )
}

#[tokio::test]
async fn file_tier_feeds_resolution_and_caller_tier_overrides_it() {
    let dir = tempfile::tempdir().expect("tempdir");
    let env_path = dir.path().join(".env");
    std::fs::write(
        &env_path,
        "OPENAI_API_KEY=sk-abc123realkey\n\
         OPENAI_MODEL_DEFAULT=gpt-4o\n\
         LLM_TEMPERATURE_DEFAULT=0.5\n\
         LLM_MAX_TOKENS_DEFAULT=4096\n\
         LLM_TIMEOUT_DEFAULT=30000\n",
    )
    .expect("write env file");

    let chain = SourceChain::without_process_env(
        caller(&[("LLM_TEMPERATURE_DEFAULT", "0.2")]),
        FileEnv::load(&env_path),
    );
    let engine = ProviderConfigEngine::new(chain);

    let config = engine.resolve(Provider::OpenAi).await.expect("resolve");
    assert_eq!(config.model, "gpt-4o");
    // Caller tier shadows the file tier for the same key.
    assert_eq!(config.temperature, 0.2);
}

#[tokio::test]
async fn end_to_end_validation_reports_cross_dependency_and_provider_errors_together() {
    let chain = SourceChain::without_process_env(
        caller(&[
            ("DEFAULT_LLM_PROVIDER", "openai"),
            ("PROVIDER_SELECTION_PRIORITY", "anthropic,google"),
            ("ANTHROPIC_API_KEY", "sk-ant-realkey123"),
            // Anthropic has a key but no model chain: provider error.
            ("LLM_TEMPERATURE_DEFAULT", "0.5"),
            ("LLM_MAX_TOKENS_DEFAULT", "4096"),
            ("LLM_TIMEOUT_DEFAULT", "30000"),
        ]),
        FileEnv::empty(),
    );
    let engine = ProviderConfigEngine::new(chain);

    let report = SystemValidator::new(&engine).validate_system().await;
    assert!(!report.is_valid);
    // Both the global cross-dependency violation and the provider-level
    // failure are present in one report, global first.
    assert!(report.errors[0].field == "DEFAULT_LLM_PROVIDER");
    assert!(report
        .errors
        .iter()
        .any(|e| e.provider.as_deref() == Some("anthropic")));
}

#[tokio::test]
async fn placeholder_key_excludes_provider_from_selection() {
    let chain = SourceChain::without_process_env(
        caller(&[
            ("OPENAI_API_KEY", "your_openai_api_key_here"),
            ("ANTHROPIC_API_KEY", "sk-ant-realkey123"),
        ]),
        FileEnv::empty(),
    );
    let engine = ProviderConfigEngine::new(chain);

    assert!(!engine.is_configured(Provider::OpenAi));
    assert_eq!(
        engine.best_available().expect("select"),
        Some(Provider::Anthropic)
    );
}
