//! Tool input/output schemas.

use rmcp::schemars;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use reason_context_reader::{AnalysisTarget, FileReadRequest, FileReadResult};
use reason_protocol::ValidationReport;
use reason_session::Session;

/// Arguments shared by every validation operation.
#[derive(Debug, Clone, Default, Deserialize, schemars::JsonSchema)]
pub struct CommonArgs {
    /// Session id for recording the attempt (created on first use)
    #[schemars(description = "Session id for validation history; created on first use")]
    pub session_id: Option<String>,

    /// Provider override; defaults to the best available provider
    #[schemars(description = "Provider to use (openai, anthropic, google, deepseek)")]
    pub provider: Option<String>,

    /// Per-call environment overrides (highest configuration tier)
    #[schemars(description = "Per-call environment variable overrides")]
    pub env: Option<BTreeMap<String, String>>,

    /// File sections to read as context before prompting the model
    #[schemars(description = "File sections to read as context, with priorities")]
    pub targets: Option<Vec<AnalysisTarget>>,

    /// Project root for resolving relative target paths (defaults to cwd)
    #[schemars(description = "Project root directory")]
    pub project_root: Option<String>,

    /// Working directory override for relative target paths
    #[schemars(description = "Working directory for relative paths")]
    pub working_directory: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ValidateThinkingRequest {
    /// The reasoning or conclusion to validate
    #[schemars(description = "The reasoning or conclusion to validate")]
    pub statement: String,

    /// Optional problem context
    #[schemars(description = "Problem context (goal, constraints, tech)")]
    pub context: Option<String>,

    #[serde(flatten)]
    pub common: CommonArgs,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct AnalyzeImpactRequest {
    /// The proposed change to analyze
    #[schemars(description = "The proposed change to analyze for impact")]
    pub proposed_change: String,

    /// Optional scope hint (subsystem, service, module)
    #[schemars(description = "Scope hint: subsystem or component affected")]
    pub scope: Option<String>,

    #[serde(flatten)]
    pub common: CommonArgs,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct CheckAssumptionsRequest {
    /// The plan or statement whose assumptions should be surfaced and checked
    #[schemars(description = "Plan or statement whose assumptions to check")]
    pub statement: String,

    /// Explicit assumptions to verify, if already known
    #[schemars(description = "Explicit assumptions to verify")]
    pub assumptions: Option<Vec<String>>,

    #[serde(flatten)]
    pub common: CommonArgs,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct MapDependenciesRequest {
    /// The system, change, or plan to map dependencies for
    #[schemars(description = "System, change, or plan to map dependencies for")]
    pub statement: String,

    /// Known components to anchor the mapping
    #[schemars(description = "Known components to anchor the mapping")]
    pub components: Option<Vec<String>>,

    #[serde(flatten)]
    pub common: CommonArgs,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct OptimizeStrategyRequest {
    /// The current strategy or approach
    #[schemars(description = "The current strategy or approach")]
    pub strategy: String,

    /// The goal the strategy serves
    #[schemars(description = "The goal the strategy serves")]
    pub goal: Option<String>,

    #[serde(flatten)]
    pub common: CommonArgs,
}

/// Result of one fulfilled validation operation.
#[derive(Debug, Serialize, schemars::JsonSchema)]
pub struct FulfillmentResult {
    pub operation: String,
    pub provider: String,
    pub model: String,
    /// Structured reply parsed from the model output.
    pub response: serde_json::Value,
    pub files_analyzed: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ReadFileRequest {
    #[serde(flatten)]
    pub read: FileReadRequest,

    /// Project root for resolving a relative path (defaults to cwd)
    #[schemars(description = "Project root directory")]
    pub project_root: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ReadMultipleFilesRequest {
    /// Read requests, answered in input order
    #[schemars(description = "Read requests; results preserve input order")]
    pub files: Vec<FileReadRequest>,

    #[schemars(description = "Project root directory")]
    pub project_root: Option<String>,
}

#[derive(Debug, Serialize, schemars::JsonSchema)]
pub struct ReadMultipleFilesResult {
    /// Batch-level success: per-item failures do not clear this flag.
    pub success: bool,
    pub results: Vec<FileReadResult>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ListDirectoryRequest {
    /// Directory to list, relative to the project root
    #[schemars(description = "Directory to list (relative to project root)")]
    pub path: Option<String>,

    #[schemars(description = "Project root directory")]
    pub project_root: Option<String>,

    /// Maximum entries to return (default: 500)
    #[schemars(description = "Maximum entries to return")]
    pub max_entries: Option<usize>,
}

#[derive(Debug, Serialize, schemars::JsonSchema)]
pub struct DirectoryEntry {
    pub name: String,
    pub kind: String,
    pub size_bytes: Option<u64>,
}

#[derive(Debug, Serialize, schemars::JsonSchema)]
pub struct ListDirectoryResult {
    pub path: String,
    pub entries: Vec<DirectoryEntry>,
    pub truncated: bool,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct SearchFilesRequest {
    /// Regex pattern to search for
    #[schemars(description = "Regex pattern to search for")]
    pub pattern: String,

    /// Directory to search, relative to the project root
    #[schemars(description = "Directory to search (relative to project root)")]
    pub path: Option<String>,

    #[schemars(description = "Project root directory")]
    pub project_root: Option<String>,

    /// Case-sensitive matching (default: false)
    #[schemars(description = "Case-sensitive matching")]
    pub case_sensitive: Option<bool>,

    /// Maximum matches to return (default: 200)
    #[schemars(description = "Maximum matches to return")]
    pub max_matches: Option<usize>,
}

#[derive(Debug, Serialize, schemars::JsonSchema)]
pub struct SearchMatch {
    pub file: String,
    pub line: usize,
    pub text: String,
}

#[derive(Debug, Serialize, schemars::JsonSchema)]
pub struct SearchFilesResult {
    pub matches: Vec<SearchMatch>,
    pub truncated: bool,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct WriteFileRequest {
    /// File path, relative to the project root
    #[schemars(description = "File path (relative to project root)")]
    pub path: String,

    /// Full file contents to write
    #[schemars(description = "Full file contents to write")]
    pub content: String,

    #[schemars(description = "Project root directory")]
    pub project_root: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ExecuteCommandRequest {
    /// Program to run (must be on the allowlist)
    #[schemars(description = "Program to run (must be on the allowlist)")]
    pub command: String,

    /// Program arguments
    #[schemars(description = "Program arguments")]
    pub args: Option<Vec<String>>,

    /// Working directory, relative to the project root
    #[schemars(description = "Working directory (relative to project root)")]
    pub working_directory: Option<String>,

    #[schemars(description = "Project root directory")]
    pub project_root: Option<String>,
}

#[derive(Debug, Serialize, schemars::JsonSchema)]
pub struct ExecuteCommandResult {
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
    pub timed_out: bool,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ValidateConfigurationRequest {}

#[derive(Debug, Serialize, schemars::JsonSchema)]
pub struct ValidateConfigurationResult {
    pub report: ValidationReport,
    /// Best available provider, or null when none is configured.
    pub best_available: Option<String>,
    /// Configured flag per provider, in enumeration order.
    pub providers: BTreeMap<String, bool>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ListSessionsRequest {}

#[derive(Debug, Serialize, schemars::JsonSchema)]
pub struct ListSessionsResult {
    pub sessions: Vec<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct GetSessionRequest {
    #[schemars(description = "Session id")]
    pub session_id: String,
}

#[derive(Debug, Serialize, schemars::JsonSchema)]
pub struct GetSessionResult {
    pub session: Option<Session>,
}
