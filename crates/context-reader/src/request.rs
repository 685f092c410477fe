//! Read-request and analysis-target types.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::ReadError;

/// Upper bound on `lines` for head/tail requests. Tail accumulates up to
/// `lines` whole lines in memory, so an unbounded request against a huge
/// file with very long lines would defeat the bounded-read design.
pub const MAX_SLICE_LINES: usize = 10_000;

/// Wire-level read mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ReadModeKind {
    #[default]
    Full,
    Head,
    Tail,
    Range,
}

/// One file-section read request. Mode-specific parameters are mutually
/// exclusive and validated before any I/O happens.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct FileReadRequest {
    /// File path (absolute, or relative to the resolved root)
    #[schemars(description = "File path (absolute, or relative to the project root)")]
    pub path: String,

    /// Read mode (default: full)
    #[schemars(description = "Read mode: full, head, tail, or range")]
    #[serde(default)]
    pub mode: ReadModeKind,

    /// Line count for head/tail modes
    #[schemars(description = "Number of lines for head/tail (required for those modes)")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lines: Option<usize>,

    /// First line for range mode (1-based, inclusive)
    #[schemars(description = "First line for range mode (1-based, inclusive)")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_line: Option<usize>,

    /// Last line for range mode (1-based, inclusive)
    #[schemars(description = "Last line for range mode (1-based, inclusive)")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_line: Option<usize>,
}

impl FileReadRequest {
    pub fn full(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            mode: ReadModeKind::Full,
            lines: None,
            start_line: None,
            end_line: None,
        }
    }

    pub fn head(path: impl Into<String>, lines: usize) -> Self {
        Self {
            path: path.into(),
            mode: ReadModeKind::Head,
            lines: Some(lines),
            start_line: None,
            end_line: None,
        }
    }

    pub fn tail(path: impl Into<String>, lines: usize) -> Self {
        Self {
            path: path.into(),
            mode: ReadModeKind::Tail,
            lines: Some(lines),
            start_line: None,
            end_line: None,
        }
    }

    pub fn range(path: impl Into<String>, start_line: usize, end_line: usize) -> Self {
        Self {
            path: path.into(),
            mode: ReadModeKind::Range,
            lines: None,
            start_line: Some(start_line),
            end_line: Some(end_line),
        }
    }

    /// Validate the mode/parameter combination into a typed mode.
    pub fn resolve_mode(&self) -> Result<ReadMode, ReadError> {
        let forbid = |param: &str, present: bool| -> Result<(), ReadError> {
            if present {
                Err(ReadError::InvalidRequest(format!(
                    "'{param}' is not allowed for mode '{:?}'",
                    self.mode
                )))
            } else {
                Ok(())
            }
        };

        match self.mode {
            ReadModeKind::Full => {
                forbid("lines", self.lines.is_some())?;
                forbid("start_line", self.start_line.is_some())?;
                forbid("end_line", self.end_line.is_some())?;
                Ok(ReadMode::Full)
            }
            ReadModeKind::Head | ReadModeKind::Tail => {
                forbid("start_line", self.start_line.is_some())?;
                forbid("end_line", self.end_line.is_some())?;
                let lines = self.lines.ok_or_else(|| {
                    ReadError::InvalidRequest(format!(
                        "'lines' is required for mode '{:?}'",
                        self.mode
                    ))
                })?;
                if lines == 0 {
                    return Err(ReadError::InvalidRequest(
                        "'lines' must be a positive integer".to_string(),
                    ));
                }
                let lines = lines.min(MAX_SLICE_LINES);
                Ok(match self.mode {
                    ReadModeKind::Head => ReadMode::Head { lines },
                    _ => ReadMode::Tail { lines },
                })
            }
            ReadModeKind::Range => {
                forbid("lines", self.lines.is_some())?;
                let (Some(start), Some(end)) = (self.start_line, self.end_line) else {
                    return Err(ReadError::InvalidRequest(
                        "'start_line' and 'end_line' are both required for mode 'range'"
                            .to_string(),
                    ));
                };
                if start == 0 {
                    return Err(ReadError::InvalidRequest(
                        "'start_line' is 1-based and must be positive".to_string(),
                    ));
                }
                if start > end {
                    return Err(ReadError::InvalidRequest(format!(
                        "'start_line' ({start}) must not exceed 'end_line' ({end})"
                    )));
                }
                Ok(ReadMode::Range { start, end })
            }
        }
    }
}

/// Validated read strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadMode {
    Full,
    Head { lines: usize },
    Tail { lines: usize },
    Range { start: usize, end: usize },
}

impl fmt::Display for ReadMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReadMode::Full => write!(f, "full file"),
            ReadMode::Head { lines } => write!(f, "first {lines} lines"),
            ReadMode::Tail { lines } => write!(f, "last {lines} lines"),
            ReadMode::Range { start, end } => write!(f, "lines {start}-{end}"),
        }
    }
}

/// Outcome of one read request. Failures are captured here, never thrown
/// across a batch boundary.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct FileReadResult {
    pub path: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl FileReadResult {
    pub fn ok(path: impl Into<String>, content: String) -> Self {
        Self {
            path: path.into(),
            success: true,
            content: Some(content),
            error: None,
        }
    }

    pub fn failed(path: impl Into<String>, error: impl fmt::Display) -> Self {
        Self {
            path: path.into(),
            success: false,
            content: None,
            error: Some(error.to_string()),
        }
    }
}

/// Relative importance of an analysis target. Buckets are processed in
/// declaration order: critical, then important, then supplementary.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Critical,
    #[default]
    Important,
    Supplementary,
}

impl Priority {
    pub const ORDERED: [Priority; 3] = [
        Priority::Critical,
        Priority::Important,
        Priority::Supplementary,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Critical => "critical",
            Priority::Important => "important",
            Priority::Supplementary => "supplementary",
        }
    }
}

/// A file section the caller wants read as context, with its priority.
/// Supplied fresh per fulfillment call; never stored.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct AnalysisTarget {
    #[serde(flatten)]
    pub request: FileReadRequest,

    /// Defaults to "important" when absent.
    #[serde(default)]
    pub priority: Priority,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_mode_rejects_extra_parameters() {
        let mut request = FileReadRequest::full("a.txt");
        request.lines = Some(10);
        assert!(request.resolve_mode().is_err());

        let mut request = FileReadRequest::full("a.txt");
        request.start_line = Some(1);
        assert!(request.resolve_mode().is_err());
    }

    #[test]
    fn head_requires_lines_and_forbids_bounds() {
        let mut request = FileReadRequest::head("a.txt", 5);
        assert_eq!(request.resolve_mode().unwrap(), ReadMode::Head { lines: 5 });

        request.lines = None;
        assert!(request.resolve_mode().is_err());

        let mut request = FileReadRequest::head("a.txt", 5);
        request.end_line = Some(3);
        assert!(request.resolve_mode().is_err());
    }

    #[test]
    fn range_requires_both_bounds_in_order() {
        assert_eq!(
            FileReadRequest::range("a.txt", 10, 20).resolve_mode().unwrap(),
            ReadMode::Range { start: 10, end: 20 }
        );

        let mut request = FileReadRequest::range("a.txt", 10, 20);
        request.end_line = None;
        assert!(request.resolve_mode().is_err());

        assert!(FileReadRequest::range("a.txt", 20, 10).resolve_mode().is_err());
        assert!(FileReadRequest::range("a.txt", 0, 10).resolve_mode().is_err());

        let mut request = FileReadRequest::range("a.txt", 1, 2);
        request.lines = Some(4);
        assert!(request.resolve_mode().is_err());
    }

    #[test]
    fn zero_lines_is_invalid_and_huge_lines_clamp() {
        assert!(FileReadRequest::tail("a.txt", 0).resolve_mode().is_err());
        assert_eq!(
            FileReadRequest::tail("a.txt", usize::MAX).resolve_mode().unwrap(),
            ReadMode::Tail {
                lines: MAX_SLICE_LINES
            }
        );
    }

    #[test]
    fn priority_defaults_to_important_in_serde() {
        let target: AnalysisTarget =
            serde_json::from_str(r#"{"path":"a.txt","mode":"full"}"#).unwrap();
        assert_eq!(target.priority, Priority::Important);
    }
}
