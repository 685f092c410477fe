//! Prompt templates for the validation operations.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Operation {
    ValidateThinking,
    AnalyzeImpact,
    CheckAssumptions,
    MapDependencies,
    OptimizeStrategy,
}

impl Operation {
    pub(crate) fn name(&self) -> &'static str {
        match self {
            Operation::ValidateThinking => "validate_thinking",
            Operation::AnalyzeImpact => "analyze_impact",
            Operation::CheckAssumptions => "check_assumptions",
            Operation::MapDependencies => "map_dependencies",
            Operation::OptimizeStrategy => "optimize_strategy",
        }
    }

    pub(crate) fn system_prompt(&self) -> &'static str {
        match self {
            Operation::ValidateThinking => {
                "You are a rigorous reasoning reviewer. Examine the statement for logical \
                 gaps, unsupported leaps, and contradictions with the provided code context. \
                 Be specific and cite the context where it contradicts the reasoning."
            }
            Operation::AnalyzeImpact => {
                "You are a change-impact analyst. Given a proposed change and code context, \
                 identify the components, behaviors, and contracts the change affects, with \
                 severity per finding."
            }
            Operation::CheckAssumptions => {
                "You are an assumption auditor. Surface the implicit and explicit assumptions \
                 behind the statement, then assess each against the provided context: \
                 confirmed, contradicted, or unverifiable."
            }
            Operation::MapDependencies => {
                "You are a dependency mapper. From the statement and code context, produce the \
                 dependency relationships between the named components, including direction \
                 and coupling strength."
            }
            Operation::OptimizeStrategy => {
                "You are a strategy reviewer. Evaluate the approach against its goal and the \
                 provided context; propose concrete improvements ranked by expected value."
            }
        }
    }

    fn response_shape(&self) -> &'static str {
        match self {
            Operation::ValidateThinking => {
                r#"{"verdict": "sound|flawed|uncertain", "issues": [{"claim": "...", "problem": "...", "severity": "low|medium|high"}], "summary": "..."}"#
            }
            Operation::AnalyzeImpact => {
                r#"{"impacts": [{"component": "...", "effect": "...", "severity": "low|medium|high"}], "risk_level": "low|medium|high", "summary": "..."}"#
            }
            Operation::CheckAssumptions => {
                r#"{"assumptions": [{"assumption": "...", "status": "confirmed|contradicted|unverifiable", "evidence": "..."}], "summary": "..."}"#
            }
            Operation::MapDependencies => {
                r#"{"dependencies": [{"from": "...", "to": "...", "kind": "...", "strength": "weak|moderate|strong"}], "summary": "..."}"#
            }
            Operation::OptimizeStrategy => {
                r#"{"recommendations": [{"change": "...", "rationale": "...", "value": "low|medium|high"}], "summary": "..."}"#
            }
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Final user prompt: the task, optional file context gathered by the
/// assembler, and the required reply shape.
pub(crate) fn build_user_prompt(
    operation: Operation,
    task: &str,
    file_context: Option<&str>,
) -> String {
    let mut prompt = String::with_capacity(task.len() + 512);
    prompt.push_str(task);

    if let Some(context) = file_context.filter(|c| !c.is_empty()) {
        prompt.push_str("\n\n## Code context\n\n");
        prompt.push_str(context);
    }

    prompt.push_str("\n\nReply with a single JSON object of this shape and nothing else:\n");
    prompt.push_str(operation.response_shape());
    prompt
}
