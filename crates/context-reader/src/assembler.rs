//! Priority-ordered context assembly.
//!
//! Targets are partitioned into critical/important/supplementary buckets.
//! Buckets run strictly in that order; within a bucket every read is issued
//! concurrently and the whole batch is awaited before the next bucket
//! starts. Output preserves bucket order, then within-bucket input order —
//! that ordering is a contract, not an accident of completion timing. A
//! failed read keeps its position with its error text in place of content.

use std::path::Path;

use crate::batch::read_many;
use crate::request::{AnalysisTarget, Priority};

/// Assembled per-file context, ready to splice into a model prompt.
#[derive(Debug, Clone)]
pub struct AssembledContext {
    pub content: String,
    pub files_analyzed: usize,
}

pub async fn assemble_context(
    targets: &[AnalysisTarget],
    project_root: &Path,
    working_directory: Option<&Path>,
) -> AssembledContext {
    let base = working_directory.unwrap_or(project_root);

    let mut sections: Vec<String> = Vec::new();
    let mut files_analyzed = 0usize;

    for priority in Priority::ORDERED {
        let bucket: Vec<&AnalysisTarget> = targets
            .iter()
            .filter(|t| t.priority == priority)
            .collect();
        if bucket.is_empty() {
            continue;
        }

        let requests: Vec<_> = bucket.iter().map(|t| t.request.clone()).collect();
        let results = read_many(Some(base), &requests).await;

        for (target, result) in bucket.iter().zip(results) {
            let mode_label = target
                .request
                .resolve_mode()
                .map(|m| m.to_string())
                .unwrap_or_else(|_| "invalid request".to_string());
            let header = format!(
                "=== {} ({mode_label}, {}) ===",
                target.request.path,
                priority.as_str()
            );
            let body = if result.success {
                files_analyzed += 1;
                result.content.unwrap_or_default()
            } else {
                format!(
                    "[read error: {}]",
                    result.error.as_deref().unwrap_or("unknown")
                )
            };
            sections.push(format!("{header}\n{body}"));
        }
    }

    AssembledContext {
        content: sections.join("\n\n"),
        files_analyzed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::FileReadRequest;
    use tempfile::TempDir;

    fn target(request: FileReadRequest, priority: Priority) -> AnalysisTarget {
        AnalysisTarget { request, priority }
    }

    #[tokio::test]
    async fn output_order_follows_priority_then_input_order() {
        let dir = TempDir::new().expect("tempdir");
        for name in ["a.txt", "b.txt", "c.txt"] {
            tokio::fs::write(dir.path().join(name), format!("contents of {name}"))
                .await
                .unwrap();
        }

        // Input order deliberately disagrees with priority order.
        let targets = vec![
            target(FileReadRequest::full("a.txt"), Priority::Supplementary),
            target(FileReadRequest::full("b.txt"), Priority::Critical),
            target(FileReadRequest::full("c.txt"), Priority::Important),
        ];

        let assembled = assemble_context(&targets, dir.path(), None).await;
        let pos = |needle: &str| assembled.content.find(needle).expect(needle);
        assert!(pos("=== b.txt") < pos("=== c.txt"));
        assert!(pos("=== c.txt") < pos("=== a.txt"));
        assert_eq!(assembled.files_analyzed, 3);
    }

    #[tokio::test]
    async fn within_bucket_order_is_input_order() {
        let dir = TempDir::new().expect("tempdir");
        for name in ["one.txt", "two.txt", "three.txt"] {
            tokio::fs::write(dir.path().join(name), name).await.unwrap();
        }

        let targets = vec![
            target(FileReadRequest::full("two.txt"), Priority::Important),
            target(FileReadRequest::full("three.txt"), Priority::Important),
            target(FileReadRequest::full("one.txt"), Priority::Important),
        ];

        let assembled = assemble_context(&targets, dir.path(), None).await;
        let pos = |needle: &str| assembled.content.find(needle).expect(needle);
        assert!(pos("=== two.txt") < pos("=== three.txt"));
        assert!(pos("=== three.txt") < pos("=== one.txt"));
    }

    #[tokio::test]
    async fn failed_target_keeps_its_slot_with_error_text() {
        let dir = TempDir::new().expect("tempdir");
        tokio::fs::write(dir.path().join("real.txt"), "data").await.unwrap();

        let targets = vec![
            target(FileReadRequest::full("real.txt"), Priority::Critical),
            target(FileReadRequest::full("ghost.txt"), Priority::Critical),
        ];

        let assembled = assemble_context(&targets, dir.path(), None).await;
        assert!(assembled.content.contains("=== ghost.txt"));
        assert!(assembled.content.contains("[read error:"));
        assert_eq!(assembled.files_analyzed, 1);
    }

    #[tokio::test]
    async fn sections_carry_mode_and_priority_labels() {
        let dir = TempDir::new().expect("tempdir");
        tokio::fs::write(dir.path().join("log.txt"), "a\nb\nc\nd\n")
            .await
            .unwrap();

        let targets = vec![target(FileReadRequest::tail("log.txt", 2), Priority::Critical)];
        let assembled = assemble_context(&targets, dir.path(), None).await;
        assert!(assembled
            .content
            .contains("=== log.txt (last 2 lines, critical) ==="));
        assert!(assembled.content.ends_with("c\nd"));
    }

    #[tokio::test]
    async fn working_directory_overrides_project_root_for_relative_paths() {
        let root = TempDir::new().expect("tempdir");
        let wd = TempDir::new().expect("tempdir");
        tokio::fs::write(wd.path().join("local.txt"), "from wd").await.unwrap();

        let targets = vec![target(FileReadRequest::full("local.txt"), Priority::Important)];
        let assembled = assemble_context(&targets, root.path(), Some(wd.path())).await;
        assert!(assembled.content.contains("from wd"));
    }

    #[tokio::test]
    async fn empty_target_list_yields_empty_context() {
        let dir = TempDir::new().expect("tempdir");
        let assembled = assemble_context(&[], dir.path(), None).await;
        assert_eq!(assembled.content, "");
        assert_eq!(assembled.files_analyzed, 0);
    }
}
