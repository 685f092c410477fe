//! Whitelist gate for the shell-execution and file-write tools.
//!
//! A disallowed operation is a terminal, reported failure; nothing here
//! retries. The check is best-effort and name-based; it does not attempt to
//! classify arbitrary commands or file contents.

use std::path::Path;
use std::time::Duration;

const DEFAULT_ALLOWED_COMMANDS: &[&str] = &[
    "ls", "cat", "head", "tail", "wc", "grep", "rg", "find", "git", "cargo", "file", "stat",
];

const DEFAULT_EXEC_TIMEOUT_MS: u64 = 30_000;

pub(crate) struct SecurityGate {
    allowed_commands: Vec<String>,
    exec_timeout: Duration,
}

impl SecurityGate {
    /// Build from the environment: `REASON_EXEC_ALLOWLIST` (comma-separated
    /// program names) and `REASON_EXEC_TIMEOUT_MS`.
    pub(crate) fn from_env() -> Self {
        let allowed_commands = std::env::var("REASON_EXEC_ALLOWLIST")
            .ok()
            .map(|raw| {
                raw.split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect::<Vec<_>>()
            })
            .filter(|list| !list.is_empty())
            .unwrap_or_else(|| {
                DEFAULT_ALLOWED_COMMANDS
                    .iter()
                    .map(|s| s.to_string())
                    .collect()
            });

        let exec_timeout = std::env::var("REASON_EXEC_TIMEOUT_MS")
            .ok()
            .and_then(|v| v.trim().parse::<u64>().ok())
            .filter(|ms| *ms > 0)
            .map(Duration::from_millis)
            .unwrap_or(Duration::from_millis(DEFAULT_EXEC_TIMEOUT_MS));

        Self {
            allowed_commands,
            exec_timeout,
        }
    }

    #[cfg(test)]
    pub(crate) fn with_allowlist(commands: &[&str], exec_timeout: Duration) -> Self {
        Self {
            allowed_commands: commands.iter().map(|s| s.to_string()).collect(),
            exec_timeout,
        }
    }

    pub(crate) fn exec_timeout(&self) -> Duration {
        self.exec_timeout
    }

    /// Whether `command` may be executed. Only bare program names pass:
    /// paths, shell metacharacters, and anything not on the allowlist are
    /// rejected.
    pub(crate) fn is_command_allowed(&self, command: &str) -> bool {
        let command = command.trim();
        if command.is_empty()
            || command.contains(['/', '\\', ';', '|', '&', '$', '`', '>', '<', ' '])
        {
            return false;
        }
        self.allowed_commands.iter().any(|c| c == command)
    }

    /// Whether `path` may be written. Refuses likely-secret filenames so an
    /// agent cannot be talked into overwriting credentials.
    pub(crate) fn is_write_allowed(&self, path: &str) -> bool {
        !is_potential_secret_path(path)
    }
}

/// Conservative denylist used to keep agent-facing tools away from secret
/// material, for writes and reads alike.
pub(crate) fn is_potential_secret_path(candidate: &str) -> bool {
    let file_name = Path::new(candidate)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("")
        .to_lowercase();

    match file_name.as_str() {
        ".env" | ".envrc" | ".npmrc" | ".netrc" | "id_rsa" | "id_ed25519" | "id_ecdsa"
        | "credentials" | "credentials.toml" => return true,
        _ => {}
    }

    if file_name.starts_with(".env.") {
        match file_name.as_str() {
            ".env.example" | ".env.sample" | ".env.template" => {}
            _ => return true,
        }
    }

    let ext = Path::new(candidate)
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or("")
        .to_lowercase();
    matches!(ext.as_str(), "pem" | "key" | "p12" | "pfx")
}
