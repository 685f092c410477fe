//! Environment source chain.
//!
//! Three named sources compose into one lookup view with fixed precedence:
//! caller-supplied overrides win over file-based values, which win over the
//! process environment. Lookup is pure; nothing here mutates process state.

use std::collections::BTreeMap;
use std::env;
use std::path::{Path, PathBuf};

/// One source of string key/value configuration.
pub trait EnvSource: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;

    fn has(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Full snapshot of this source. Used to build the merged view.
    fn entries(&self) -> BTreeMap<String, String>;
}

/// Live process environment (`std::env`).
#[derive(Debug, Default, Clone)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn get(&self, key: &str) -> Option<String> {
        env::var(key).ok()
    }

    fn entries(&self) -> BTreeMap<String, String> {
        env::vars().collect()
    }
}

/// Values parsed from a `.env`-style file.
///
/// Parsing is deliberately local: loading the file tier must not mutate the
/// process environment, or the caller/file/process precedence collapses into
/// one tier. A missing file is an empty source, not an error.
#[derive(Debug, Default, Clone)]
pub struct FileEnv {
    values: BTreeMap<String, String>,
}

impl FileEnv {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_map(values: BTreeMap<String, String>) -> Self {
        Self { values }
    }

    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(contents) => Self {
                values: parse_env_file(&contents),
            },
            Err(err) => {
                if path.exists() {
                    log::warn!("Cannot read env file {}: {err}", path.display());
                }
                Self::empty()
            }
        }
    }

    /// Resolve the file tier location: `REASON_ENV_FILE` override first,
    /// then `./.env` relative to the current directory.
    pub fn load_default() -> Self {
        let path = env::var("REASON_ENV_FILE")
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(".env"));
        Self::load(&path)
    }
}

impl EnvSource for FileEnv {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn entries(&self) -> BTreeMap<String, String> {
        self.values.clone()
    }
}

/// Per-request overrides supplied by the tool caller. Highest tier.
#[derive(Debug, Default, Clone)]
pub struct CallerEnv {
    values: BTreeMap<String, String>,
}

impl CallerEnv {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_map(values: BTreeMap<String, String>) -> Self {
        Self { values }
    }
}

impl EnvSource for CallerEnv {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn entries(&self) -> BTreeMap<String, String> {
        self.values.clone()
    }
}

/// The composed three-tier view. `get` walks tiers high to low and returns
/// the first present value; `merged` overlays snapshots low to high so the
/// final overlay agrees with `get` for every key present in any source.
pub struct SourceChain {
    caller: CallerEnv,
    file: FileEnv,
    process: Option<ProcessEnv>,
}

impl SourceChain {
    pub fn new(caller: CallerEnv, file: FileEnv) -> Self {
        Self {
            caller,
            file,
            process: Some(ProcessEnv),
        }
    }

    /// Chain with the process tier disabled. For test harnesses that need
    /// hermetic lookups regardless of the ambient environment.
    pub fn without_process_env(caller: CallerEnv, file: FileEnv) -> Self {
        Self {
            caller,
            file,
            process: None,
        }
    }

    /// Chain without caller overrides, file tier loaded from the default
    /// location.
    pub fn from_environment() -> Self {
        Self::new(CallerEnv::empty(), FileEnv::load_default())
    }

    /// A copy of this chain with a different caller tier. File and process
    /// tiers are shared semantics (the file snapshot is cloned; the process
    /// tier is live).
    pub fn with_caller(&self, caller: CallerEnv) -> Self {
        Self {
            caller,
            file: self.file.clone(),
            process: self.process.clone(),
        }
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.caller
            .get(key)
            .or_else(|| self.file.get(key))
            .or_else(|| self.process.as_ref().and_then(|p| p.get(key)))
    }

    pub fn has(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Trimmed, non-empty lookup. The tiered resolution chains treat
    /// whitespace-only values as unset.
    pub fn get_non_empty(&self, key: &str) -> Option<String> {
        self.get(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    pub fn merged(&self) -> BTreeMap<String, String> {
        let mut view = self
            .process
            .as_ref()
            .map(EnvSource::entries)
            .unwrap_or_default();
        view.extend(self.file.entries());
        view.extend(self.caller.entries());
        view
    }
}

/// Minimal `.env` grammar: `KEY=VALUE` lines, `#` comments, optional
/// `export ` prefix, single or double quotes stripped from values.
fn parse_env_file(contents: &str) -> BTreeMap<String, String> {
    let mut values = BTreeMap::new();
    for line in contents.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let line = line.strip_prefix("export ").unwrap_or(line).trim_start();
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let key = key.trim();
        if key.is_empty() || !key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            continue;
        }
        let value = value.trim();
        let value = value
            .strip_prefix('"')
            .and_then(|v| v.strip_suffix('"'))
            .or_else(|| value.strip_prefix('\'').and_then(|v| v.strip_suffix('\'')))
            .unwrap_or(value);
        values.insert(key.to_string(), value.to_string());
    }
    values
}
