//! Reason MCP Server
//!
//! Exposes LLM-backed thinking-validation tools to AI agents via MCP.
//!
//! ## Tools
//!
//! - `validate_thinking` / `analyze_impact` / `check_assumptions` /
//!   `map_dependencies` / `optimize_strategy` - validation operations
//!   fulfilled by a configured model backend, optionally grounded in
//!   priority-ordered file context
//! - `read_file` / `read_multiple_files` / `list_directory` /
//!   `search_files` / `write_file` / `execute_command` - file-system helpers
//! - `validate_configuration` / `list_sessions` / `get_session` - diagnostics
//!
//! ## Usage
//!
//! Add to your MCP client configuration:
//! ```json
//! {
//!   "mcpServers": {
//!     "reason": {
//!       "command": "reason-mcp"
//!     }
//!   }
//! }
//! ```

use anyhow::Result;
use rmcp::transport::stdio;
use rmcp::ServiceExt;

use reason_mcp::{ReasonService, ServiceState};
use reason_provider_config::SystemValidator;

#[tokio::main]
async fn main() -> Result<()> {
    // Configure logging to stderr only (stdout is for MCP protocol)
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .target(env_logger::Target::Stderr)
        .init();

    log::info!("Starting Reason MCP server");

    let state = ServiceState::from_environment();

    // Fail-fast, not fail-first: print every error and warning so an
    // operator can fix the whole configuration in one pass.
    let report = SystemValidator::new(state.engine()).validate_system().await;
    for warning in &report.warnings {
        let scope = warning.provider.as_deref().unwrap_or("global");
        eprintln!("warning [{scope}] {}: {}", warning.field, warning.message);
    }
    if !report.is_valid {
        for error in &report.errors {
            let scope = error.provider.as_deref().unwrap_or("global");
            eprintln!(
                "error [{scope}] {} ({}): {}",
                error.field, error.category, error.message
            );
        }
        anyhow::bail!(
            "configuration validation failed with {} error(s); refusing to start",
            report.errors.len()
        );
    }

    match state.engine().best_available() {
        Ok(Some(provider)) => log::info!("best available provider: {provider}"),
        Ok(None) => log::warn!(
            "no provider is configured; validation tools will fail until an API key is set"
        ),
        Err(err) => log::warn!("provider selection unavailable: {err}"),
    }

    let service = ReasonService::with_state(state);
    let server = service.serve(stdio()).await?;

    server.waiting().await?;

    log::info!("Reason MCP server stopped");
    Ok(())
}
