//! File-system helper tools surrounding the validation operations.
//!
//! Reads go through the targeted reader crate; writes and command execution
//! sit behind the security gate. All paths are contained within the
//! resolved project root.

use std::path::Path;
use std::process::Stdio;

use regex::RegexBuilder;
use walkdir::WalkDir;

use crate::paths::contain;
use crate::schemas::{
    DirectoryEntry, ExecuteCommandRequest, ExecuteCommandResult, ListDirectoryRequest,
    ListDirectoryResult, SearchFilesRequest, SearchFilesResult, SearchMatch,
};
use crate::security::{is_potential_secret_path, SecurityGate};

const DEFAULT_MAX_ENTRIES: usize = 500;
const DEFAULT_MAX_MATCHES: usize = 200;
const MAX_SEARCH_FILE_BYTES: u64 = 2_000_000;

pub(crate) async fn list_directory(
    root: &Path,
    request: &ListDirectoryRequest,
) -> Result<ListDirectoryResult, String> {
    let target = contain(root, request.path.as_deref().unwrap_or("."))?;
    let max_entries = request.max_entries.unwrap_or(DEFAULT_MAX_ENTRIES).max(1);

    let mut reader = tokio::fs::read_dir(&target)
        .await
        .map_err(|e| format!("Cannot list '{}': {e}", target.display()))?;

    let mut entries = Vec::new();
    while let Some(entry) = reader
        .next_entry()
        .await
        .map_err(|e| format!("Cannot read directory entry: {e}"))?
    {
        let meta = entry.metadata().await.ok();
        let kind = match &meta {
            Some(m) if m.is_dir() => "dir",
            Some(m) if m.is_symlink() => "symlink",
            _ => "file",
        };
        entries.push(DirectoryEntry {
            name: entry.file_name().to_string_lossy().into_owned(),
            kind: kind.to_string(),
            size_bytes: meta.filter(|m| m.is_file()).map(|m| m.len()),
        });
    }
    entries.sort_by(|a, b| a.name.cmp(&b.name));

    let truncated = entries.len() > max_entries;
    entries.truncate(max_entries);

    Ok(ListDirectoryResult {
        path: target.to_string_lossy().into_owned(),
        entries,
        truncated,
    })
}

pub(crate) async fn search_files(
    root: &Path,
    request: &SearchFilesRequest,
) -> Result<SearchFilesResult, String> {
    let base = contain(root, request.path.as_deref().unwrap_or("."))?;
    let max_matches = request.max_matches.unwrap_or(DEFAULT_MAX_MATCHES).max(1);

    let regex = RegexBuilder::new(&request.pattern)
        .case_insensitive(!request.case_sensitive.unwrap_or(false))
        .build()
        .map_err(|e| format!("Invalid pattern: {e}"))?;

    let mut matches = Vec::new();
    let mut truncated = false;

    // The walk is synchronous but bounded by max_matches and the file-size
    // cap; fine for the tool's interactive use.
    'files: for entry in WalkDir::new(&base)
        .follow_links(false)
        .into_iter()
        .filter_entry(|e| !is_skipped_dir(e))
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
    {
        let display = entry
            .path()
            .strip_prefix(root)
            .unwrap_or(entry.path())
            .to_string_lossy()
            .into_owned();
        if is_potential_secret_path(&display) {
            continue;
        }
        if entry.metadata().map(|m| m.len()).unwrap_or(0) > MAX_SEARCH_FILE_BYTES {
            continue;
        }
        let Ok(content) = std::fs::read_to_string(entry.path()) else {
            // Binary or unreadable files are skipped, not errors.
            continue;
        };
        for (line_no, line) in content.lines().enumerate() {
            if regex.is_match(line) {
                if matches.len() >= max_matches {
                    truncated = true;
                    break 'files;
                }
                matches.push(SearchMatch {
                    file: display.clone(),
                    line: line_no + 1,
                    text: line.to_string(),
                });
            }
        }
    }

    Ok(SearchFilesResult { matches, truncated })
}

fn is_skipped_dir(entry: &walkdir::DirEntry) -> bool {
    entry.file_type().is_dir()
        && entry
            .file_name()
            .to_str()
            .map(|name| name == ".git" || name == "target" || name == "node_modules")
            .unwrap_or(false)
}

pub(crate) async fn write_file(
    root: &Path,
    gate: &SecurityGate,
    path: &str,
    content: &str,
) -> Result<String, String> {
    if !gate.is_write_allowed(path) {
        return Err(format!("Refusing to write potential secret file '{path}'"));
    }
    let target = contain(root, path)?;
    if let Some(parent) = target.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| format!("Cannot create parent directory: {e}"))?;
    }
    tokio::fs::write(&target, content)
        .await
        .map_err(|e| format!("Cannot write '{path}': {e}"))?;
    Ok(format!("Wrote {} bytes to {path}", content.len()))
}

pub(crate) async fn execute_command(
    root: &Path,
    gate: &SecurityGate,
    request: &ExecuteCommandRequest,
) -> Result<ExecuteCommandResult, String> {
    if !gate.is_command_allowed(&request.command) {
        return Err(format!(
            "Command '{}' is not on the execution allowlist",
            request.command
        ));
    }
    let cwd = contain(root, request.working_directory.as_deref().unwrap_or("."))?;

    let child = tokio::process::Command::new(request.command.trim())
        .args(request.args.as_deref().unwrap_or_default())
        .current_dir(&cwd)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| format!("Cannot start '{}': {e}", request.command))?;

    // kill_on_drop reaps the child when the timeout abandons the future.
    match tokio::time::timeout(gate.exec_timeout(), child.wait_with_output()).await {
        Ok(output) => {
            let output = output.map_err(|e| format!("Wait failed: {e}"))?;
            Ok(ExecuteCommandResult {
                exit_code: output.status.code(),
                stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
                timed_out: false,
            })
        }
        Err(_) => Ok(ExecuteCommandResult {
            exit_code: None,
            stdout: String::new(),
            stderr: String::new(),
            timed_out: true,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::security::SecurityGate;
    use std::time::Duration;
    use tempfile::TempDir;

    fn root(dir: &TempDir) -> std::path::PathBuf {
        dir.path().canonicalize().expect("canonicalize root")
    }

    #[tokio::test]
    async fn list_directory_reports_entries_sorted() {
        let dir = TempDir::new().expect("tempdir");
        tokio::fs::write(dir.path().join("b.txt"), "b").await.unwrap();
        tokio::fs::write(dir.path().join("a.txt"), "a").await.unwrap();
        tokio::fs::create_dir(dir.path().join("sub")).await.unwrap();

        let result = list_directory(
            &root(&dir),
            &ListDirectoryRequest {
                path: None,
                project_root: None,
                max_entries: None,
            },
        )
        .await
        .expect("list");

        let names: Vec<&str> = result.entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["a.txt", "b.txt", "sub"]);
        assert_eq!(result.entries[2].kind, "dir");
        assert!(!result.truncated);
    }

    #[tokio::test]
    async fn search_finds_matches_with_line_numbers() {
        let dir = TempDir::new().expect("tempdir");
        tokio::fs::write(dir.path().join("code.rs"), "fn alpha() {}\nfn beta() {}\n")
            .await
            .unwrap();

        let result = search_files(
            &root(&dir),
            &SearchFilesRequest {
                pattern: "fn BETA".to_string(),
                path: None,
                project_root: None,
                case_sensitive: None,
                max_matches: None,
            },
        )
        .await
        .expect("search");

        assert_eq!(result.matches.len(), 1);
        assert_eq!(result.matches[0].line, 2);

        let strict = search_files(
            &root(&dir),
            &SearchFilesRequest {
                pattern: "fn BETA".to_string(),
                path: None,
                project_root: None,
                case_sensitive: Some(true),
                max_matches: None,
            },
        )
        .await
        .expect("search");
        assert!(strict.matches.is_empty());
    }

    #[tokio::test]
    async fn write_refuses_secret_paths_and_escapes() {
        let dir = TempDir::new().expect("tempdir");
        let gate = SecurityGate::with_allowlist(&[], Duration::from_secs(5));
        let root = root(&dir);

        assert!(write_file(&root, &gate, ".env", "SECRET=1").await.is_err());
        assert!(write_file(&root, &gate, "../escape.txt", "x").await.is_err());

        let ok = write_file(&root, &gate, "notes/plan.md", "content")
            .await
            .expect("write");
        assert!(ok.contains("plan.md"));
        let written = tokio::fs::read_to_string(dir.path().join("notes/plan.md"))
            .await
            .unwrap();
        assert_eq!(written, "content");
    }

    #[tokio::test]
    async fn execute_rejects_unlisted_commands() {
        let dir = TempDir::new().expect("tempdir");
        let gate = SecurityGate::with_allowlist(&["echo"], Duration::from_secs(5));

        let err = execute_command(
            &root(&dir),
            &gate,
            &ExecuteCommandRequest {
                command: "rm".to_string(),
                args: None,
                working_directory: None,
                project_root: None,
            },
        )
        .await
        .unwrap_err();
        assert!(err.contains("allowlist"));
    }

    #[tokio::test]
    async fn execute_runs_allowlisted_command() {
        let dir = TempDir::new().expect("tempdir");
        let gate = SecurityGate::with_allowlist(&["echo"], Duration::from_secs(5));

        let result = execute_command(
            &root(&dir),
            &gate,
            &ExecuteCommandRequest {
                command: "echo".to_string(),
                args: Some(vec!["hello".to_string()]),
                working_directory: None,
                project_root: None,
            },
        )
        .await
        .expect("execute");
        assert_eq!(result.exit_code, Some(0));
        assert_eq!(result.stdout.trim(), "hello");
        assert!(!result.timed_out);
    }
}
