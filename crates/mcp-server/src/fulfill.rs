//! Per-operation fulfillment pipeline.
//!
//! resolve provider -> assemble file context -> template prompt -> invoke
//! backend -> parse the JSON-shaped reply -> record to the session store.
//! The session append happens only after a complete response (success or
//! handled failure), so a timeout never leaves partial history behind.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use reason_context_reader::assemble_context;
use reason_llm::backend_for;
use reason_provider_config::{Provider, ProviderConfig};
use reason_session::ValidationAttempt;

use crate::paths::resolve_root;
use crate::prompts::{build_user_prompt, Operation};
use crate::reply::parse_structured_reply;
use crate::schemas::{CommonArgs, FulfillmentResult};
use crate::service::ServiceState;

pub(crate) async fn fulfill(
    state: &ServiceState,
    operation: Operation,
    task: String,
    common: CommonArgs,
) -> Result<FulfillmentResult, String> {
    let provider = select_provider(state, common.provider.as_deref())?;
    let config = resolve_config(state, provider, common.env.clone()).await?;

    let (file_context, files_analyzed) = match &common.targets {
        Some(targets) if !targets.is_empty() => {
            let root = resolve_root(common.project_root.as_deref())?;
            let working_directory = common.working_directory.as_ref().map(PathBuf::from);
            let assembled =
                assemble_context(targets, &root, working_directory.as_deref()).await;
            (Some(assembled.content), assembled.files_analyzed)
        }
        _ => (None, 0),
    };

    let user_prompt = build_user_prompt(operation, &task, file_context.as_deref());
    let backend = backend_for(provider);
    log::debug!(
        "fulfilling {operation} via {provider} model={} files_analyzed={files_analyzed}",
        config.model
    );

    let reply = backend
        .invoke(operation.system_prompt(), &user_prompt, &config)
        .await
        .map_err(|err| format!("[{}] {err}", err.category()))?;
    let response = parse_structured_reply(&reply);

    let session_id = match common.session_id {
        Some(id) => {
            state.store.get_or_create(&id, serde_json::Value::Null).await;
            id
        }
        None => state.store.create(serde_json::Value::Null).await.id,
    };
    state
        .store
        .append(
            &session_id,
            ValidationAttempt {
                operation: operation.name().to_string(),
                provider: provider.as_str().to_string(),
                model: config.model.clone(),
                response: response.clone(),
                timestamp_ms: unix_ms_now(),
            },
        )
        .await;

    Ok(FulfillmentResult {
        operation: operation.name().to_string(),
        provider: provider.as_str().to_string(),
        model: config.model,
        response,
        files_analyzed,
        session_id: Some(session_id),
    })
}

fn select_provider(state: &ServiceState, requested: Option<&str>) -> Result<Provider, String> {
    if let Some(name) = requested.map(str::trim).filter(|n| !n.is_empty()) {
        return name
            .parse::<Provider>()
            .map_err(|unknown| unknown.to_string());
    }
    match state.engine.best_available() {
        Ok(Some(provider)) => Ok(provider),
        Ok(None) => Err(
            "No provider is configured. Set an API key (e.g. OPENAI_API_KEY or \
             ANTHROPIC_API_KEY) and the matching model/limit variables."
                .to_string(),
        ),
        Err(err) => Err(format_config_error(&err)),
    }
}

async fn resolve_config(
    state: &ServiceState,
    provider: Provider,
    overrides: Option<BTreeMap<String, String>>,
) -> Result<ProviderConfig, String> {
    let result = match overrides.filter(|o| !o.is_empty()) {
        Some(overrides) => state.engine.resolve_with_overrides(provider, overrides),
        None => state.engine.resolve(provider).await,
    };
    result.map_err(|err| format_config_error(&err))
}

pub(crate) fn format_config_error(err: &reason_provider_config::ConfigError) -> String {
    match err.hint() {
        Some(hint) => format!("[{}] {err}. Hint: {hint}", err.category()),
        None => format!("[{}] {err}", err.category()),
    }
}

fn unix_ms_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
}
