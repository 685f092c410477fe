//! Reason MCP service: tool surface and composition root.

use std::collections::BTreeMap;
use std::sync::Arc;

use rmcp::handler::server::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{CallToolResult, Content, Implementation, ServerCapabilities, ServerInfo};
use rmcp::{tool, tool_handler, tool_router, ErrorData as McpError, ServerHandler};
use serde::Serialize;

use reason_context_reader::{read_file as read_file_slice, read_many, FileReadResult};
use reason_provider_config::{Provider, ProviderConfigEngine, SourceChain, SystemValidator};
use reason_session::SessionStore;

use crate::fs_tools;
use crate::fulfill::fulfill;
use crate::paths::{contain, resolve_root};
use crate::prompts::Operation;
use crate::schemas::*;
use crate::security::SecurityGate;

/// Process-wide state owned by the composition root and shared by every
/// connection. The configuration cache and in-flight map live inside the
/// engine; tests construct their own state and reset freely.
pub struct ServiceState {
    pub(crate) engine: ProviderConfigEngine,
    pub(crate) store: SessionStore,
    pub(crate) gate: SecurityGate,
}

impl ServiceState {
    pub fn from_environment() -> Self {
        Self {
            engine: ProviderConfigEngine::new(SourceChain::from_environment()),
            store: SessionStore::new(),
            gate: SecurityGate::from_env(),
        }
    }

    pub fn with_engine(engine: ProviderConfigEngine) -> Self {
        Self {
            engine,
            store: SessionStore::new(),
            gate: SecurityGate::from_env(),
        }
    }

    pub fn engine(&self) -> &ProviderConfigEngine {
        &self.engine
    }
}

#[derive(Clone)]
pub struct ReasonService {
    state: Arc<ServiceState>,
    tool_router: ToolRouter<Self>,
}

impl ReasonService {
    pub fn new() -> Self {
        Self::with_state(ServiceState::from_environment())
    }

    pub fn with_state(state: ServiceState) -> Self {
        Self {
            state: Arc::new(state),
            tool_router: Self::tool_router(),
        }
    }
}

impl Default for ReasonService {
    fn default() -> Self {
        Self::new()
    }
}

fn json_result<T: Serialize>(value: &T) -> Result<CallToolResult, McpError> {
    Ok(CallToolResult::success(vec![Content::text(
        serde_json::to_string_pretty(value).unwrap_or_default(),
    )]))
}

fn tool_error(message: impl Into<String>) -> Result<CallToolResult, McpError> {
    Ok(CallToolResult::error(vec![Content::text(message.into())]))
}

#[tool_router]
impl ReasonService {
    /// Validate a piece of reasoning against local code context.
    #[tool(
        description = "Validate reasoning or a conclusion for logical gaps and contradictions, optionally against targeted file context."
    )]
    pub async fn validate_thinking(
        &self,
        Parameters(request): Parameters<ValidateThinkingRequest>,
    ) -> Result<CallToolResult, McpError> {
        let mut task = format!("Statement to validate:\n{}", request.statement);
        if let Some(context) = &request.context {
            task.push_str(&format!("\n\nProblem context:\n{context}"));
        }
        match fulfill(&self.state, Operation::ValidateThinking, task, request.common).await {
            Ok(result) => json_result(&result),
            Err(message) => tool_error(message),
        }
    }

    /// Analyze the blast radius of a proposed change.
    #[tool(
        description = "Analyze the impact of a proposed change: affected components, behaviors, and contracts, with severity."
    )]
    pub async fn analyze_impact(
        &self,
        Parameters(request): Parameters<AnalyzeImpactRequest>,
    ) -> Result<CallToolResult, McpError> {
        let mut task = format!("Proposed change:\n{}", request.proposed_change);
        if let Some(scope) = &request.scope {
            task.push_str(&format!("\n\nScope:\n{scope}"));
        }
        match fulfill(&self.state, Operation::AnalyzeImpact, task, request.common).await {
            Ok(result) => json_result(&result),
            Err(message) => tool_error(message),
        }
    }

    /// Surface and check the assumptions behind a plan.
    #[tool(
        description = "Surface the assumptions behind a plan or statement and check each against the provided context."
    )]
    pub async fn check_assumptions(
        &self,
        Parameters(request): Parameters<CheckAssumptionsRequest>,
    ) -> Result<CallToolResult, McpError> {
        let mut task = format!("Statement:\n{}", request.statement);
        if let Some(assumptions) = &request.assumptions {
            task.push_str("\n\nKnown assumptions:\n");
            for assumption in assumptions {
                task.push_str(&format!("- {assumption}\n"));
            }
        }
        match fulfill(&self.state, Operation::CheckAssumptions, task, request.common).await {
            Ok(result) => json_result(&result),
            Err(message) => tool_error(message),
        }
    }

    /// Map dependencies between components.
    #[tool(
        description = "Map dependency relationships between components named in a plan or system description."
    )]
    pub async fn map_dependencies(
        &self,
        Parameters(request): Parameters<MapDependenciesRequest>,
    ) -> Result<CallToolResult, McpError> {
        let mut task = format!("Subject:\n{}", request.statement);
        if let Some(components) = &request.components {
            task.push_str("\n\nKnown components:\n");
            for component in components {
                task.push_str(&format!("- {component}\n"));
            }
        }
        match fulfill(&self.state, Operation::MapDependencies, task, request.common).await {
            Ok(result) => json_result(&result),
            Err(message) => tool_error(message),
        }
    }

    /// Review a strategy against its goal.
    #[tool(
        description = "Evaluate a strategy against its goal and propose ranked improvements."
    )]
    pub async fn optimize_strategy(
        &self,
        Parameters(request): Parameters<OptimizeStrategyRequest>,
    ) -> Result<CallToolResult, McpError> {
        let mut task = format!("Current strategy:\n{}", request.strategy);
        if let Some(goal) = &request.goal {
            task.push_str(&format!("\n\nGoal:\n{goal}"));
        }
        match fulfill(&self.state, Operation::OptimizeStrategy, task, request.common).await {
            Ok(result) => json_result(&result),
            Err(message) => tool_error(message),
        }
    }

    /// Targeted single-file read (full/head/tail/range).
    #[tool(
        description = "Read a file or a targeted slice of it (full, head, tail, or line range) without loading more than requested."
    )]
    pub async fn read_file(
        &self,
        Parameters(request): Parameters<ReadFileRequest>,
    ) -> Result<CallToolResult, McpError> {
        let root = match resolve_root(request.project_root.as_deref()) {
            Ok(root) => root,
            Err(message) => return tool_error(message),
        };
        let path = match contain(&root, &request.read.path) {
            Ok(path) => path,
            Err(message) => return tool_error(message),
        };
        let result = read_file_slice(&path, &request.read).await;
        json_result(&result)
    }

    /// Concurrent multi-file read with per-item failure capture.
    #[tool(
        description = "Read several files (or slices) concurrently; results preserve input order and one bad path never aborts the rest."
    )]
    pub async fn read_multiple_files(
        &self,
        Parameters(request): Parameters<ReadMultipleFilesRequest>,
    ) -> Result<CallToolResult, McpError> {
        let root = match resolve_root(request.project_root.as_deref()) {
            Ok(root) => root,
            Err(message) => return tool_error(message),
        };

        // Containment failures take their slot in the output; allowed
        // requests run as one concurrent batch.
        let mut slots: Vec<Option<FileReadResult>> = Vec::with_capacity(request.files.len());
        let mut allowed = Vec::new();
        let mut allowed_slots = Vec::new();
        for (index, file) in request.files.iter().enumerate() {
            match contain(&root, &file.path) {
                Ok(_) => {
                    slots.push(None);
                    allowed.push(file.clone());
                    allowed_slots.push(index);
                }
                Err(message) => slots.push(Some(FileReadResult::failed(&file.path, message))),
            }
        }

        let read = read_many(Some(&root), &allowed).await;
        for (slot, result) in allowed_slots.into_iter().zip(read) {
            slots[slot] = Some(result);
        }
        let results: Vec<FileReadResult> = slots
            .into_iter()
            .map(|slot| slot.expect("every slot filled"))
            .collect();

        json_result(&ReadMultipleFilesResult {
            success: true,
            results,
        })
    }

    /// Directory listing.
    #[tool(description = "List a directory within the project root.")]
    pub async fn list_directory(
        &self,
        Parameters(request): Parameters<ListDirectoryRequest>,
    ) -> Result<CallToolResult, McpError> {
        let root = match resolve_root(request.project_root.as_deref()) {
            Ok(root) => root,
            Err(message) => return tool_error(message),
        };
        match fs_tools::list_directory(&root, &request).await {
            Ok(result) => json_result(&result),
            Err(message) => tool_error(message),
        }
    }

    /// Regex search across project files.
    #[tool(description = "Search project files with a regex; returns file, line, and text per match.")]
    pub async fn search_files(
        &self,
        Parameters(request): Parameters<SearchFilesRequest>,
    ) -> Result<CallToolResult, McpError> {
        let root = match resolve_root(request.project_root.as_deref()) {
            Ok(root) => root,
            Err(message) => return tool_error(message),
        };
        match fs_tools::search_files(&root, &request).await {
            Ok(result) => json_result(&result),
            Err(message) => tool_error(message),
        }
    }

    /// Gated file write.
    #[tool(
        description = "Write a file within the project root. Secret-looking paths are refused."
    )]
    pub async fn write_file(
        &self,
        Parameters(request): Parameters<WriteFileRequest>,
    ) -> Result<CallToolResult, McpError> {
        let root = match resolve_root(request.project_root.as_deref()) {
            Ok(root) => root,
            Err(message) => return tool_error(message),
        };
        match fs_tools::write_file(&root, &self.state.gate, &request.path, &request.content).await
        {
            Ok(message) => Ok(CallToolResult::success(vec![Content::text(message)])),
            Err(message) => tool_error(message),
        }
    }

    /// Gated command execution.
    #[tool(
        description = "Run an allowlisted command inside the project root, bounded by the execution timeout."
    )]
    pub async fn execute_command(
        &self,
        Parameters(request): Parameters<ExecuteCommandRequest>,
    ) -> Result<CallToolResult, McpError> {
        let root = match resolve_root(request.project_root.as_deref()) {
            Ok(root) => root,
            Err(message) => return tool_error(message),
        };
        match fs_tools::execute_command(&root, &self.state.gate, &request).await {
            Ok(result) => json_result(&result),
            Err(message) => tool_error(message),
        }
    }

    /// Full configuration report: errors, warnings, provider availability.
    #[tool(
        description = "Validate provider configuration and report every error and warning, plus the best available provider."
    )]
    pub async fn validate_configuration(
        &self,
        Parameters(_request): Parameters<ValidateConfigurationRequest>,
    ) -> Result<CallToolResult, McpError> {
        let report = SystemValidator::new(&self.state.engine)
            .validate_system()
            .await;
        let best_available = self
            .state
            .engine
            .best_available()
            .ok()
            .flatten()
            .map(|p| p.as_str().to_string());
        let providers: BTreeMap<String, bool> = Provider::ALL
            .into_iter()
            .map(|p| (p.as_str().to_string(), self.state.engine.is_configured(p)))
            .collect();

        json_result(&ValidateConfigurationResult {
            report,
            best_available,
            providers,
        })
    }

    /// Known validation sessions.
    #[tool(description = "List validation session ids recorded in this process.")]
    pub async fn list_sessions(
        &self,
        Parameters(_request): Parameters<ListSessionsRequest>,
    ) -> Result<CallToolResult, McpError> {
        json_result(&ListSessionsResult {
            sessions: self.state.store.list_ids().await,
        })
    }

    /// One session's validation history.
    #[tool(description = "Fetch a validation session and its attempt history by id.")]
    pub async fn get_session(
        &self,
        Parameters(request): Parameters<GetSessionRequest>,
    ) -> Result<CallToolResult, McpError> {
        json_result(&GetSessionResult {
            session: self.state.store.get(&request.session_id).await,
        })
    }
}

#[tool_handler]
impl ServerHandler for ReasonService {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "Reason provides LLM-backed thinking-validation tools for AI agents. Use \
                 'validate_thinking' to check reasoning, 'analyze_impact' for change impact, \
                 'check_assumptions' and 'map_dependencies' for plan review, and \
                 'optimize_strategy' for approach review. Attach 'targets' (with priorities) \
                 to ground any operation in file context. 'validate_configuration' reports \
                 provider setup problems."
                    .into(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation::from_build_env(),
            ..Default::default()
        }
    }
}
