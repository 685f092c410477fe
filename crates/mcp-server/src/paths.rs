//! Project-root resolution and containment checks for file tools.

use std::path::{Path, PathBuf};

/// Resolve the effective project root: explicit argument, `REASON_ROOT`
/// environment override, then the current directory.
pub(crate) fn resolve_root(explicit: Option<&str>) -> Result<PathBuf, String> {
    let candidate = if let Some(path) = explicit.map(str::trim).filter(|p| !p.is_empty()) {
        PathBuf::from(path)
    } else if let Some(path) = std::env::var("REASON_ROOT")
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
    {
        PathBuf::from(path)
    } else {
        std::env::current_dir().map_err(|e| format!("Cannot determine working directory: {e}"))?
    };

    candidate
        .canonicalize()
        .map_err(|e| format!("Invalid project root '{}': {e}", candidate.display()))
}

/// Join `raw` against the root and refuse paths that escape it.
/// The deepest existing ancestor is canonicalized so `..` segments cannot
/// sidestep the containment check for not-yet-existing files.
pub(crate) fn contain(root: &Path, raw: &str) -> Result<PathBuf, String> {
    let joined = {
        let candidate = Path::new(raw);
        if candidate.is_absolute() {
            candidate.to_path_buf()
        } else {
            root.join(candidate)
        }
    };

    let resolved = match joined.canonicalize() {
        Ok(path) => path,
        Err(_) => {
            let parent = joined
                .parent()
                .ok_or_else(|| format!("Invalid path '{raw}'"))?;
            let parent = parent
                .canonicalize()
                .map_err(|e| format!("Invalid path '{raw}': {e}"))?;
            parent.join(joined.file_name().ok_or_else(|| format!("Invalid path '{raw}'"))?)
        }
    };

    if !resolved.starts_with(root) {
        return Err(format!("Path '{raw}' is outside the project root"));
    }
    Ok(resolved)
}
