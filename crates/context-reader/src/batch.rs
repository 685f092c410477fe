//! Concurrent multi-file reads.
//!
//! All requests in a batch are issued together; results come back in input
//! order regardless of completion timing, and one bad path never aborts its
//! siblings.

use std::path::{Path, PathBuf};

use tokio::task::JoinSet;

use crate::reader::read_file;
use crate::request::{FileReadRequest, FileReadResult};

/// Resolve a request path against an optional base directory. Absolute
/// paths pass through untouched.
pub fn resolve_path(base: Option<&Path>, raw: &str) -> PathBuf {
    let candidate = Path::new(raw);
    if candidate.is_absolute() {
        return candidate.to_path_buf();
    }
    match base {
        Some(base) => base.join(candidate),
        None => candidate.to_path_buf(),
    }
}

/// Read every request concurrently. The returned vector is index-aligned
/// with `requests`; per-request failures occupy their slot as
/// `success:false` results.
pub async fn read_many(base: Option<&Path>, requests: &[FileReadRequest]) -> Vec<FileReadResult> {
    let mut join_set = JoinSet::new();
    for (index, request) in requests.iter().enumerate() {
        let request = request.clone();
        let path = resolve_path(base, &request.path);
        join_set.spawn(async move { (index, read_file(&path, &request).await) });
    }

    let mut slots: Vec<Option<FileReadResult>> = (0..requests.len()).map(|_| None).collect();
    while let Some(joined) = join_set.join_next().await {
        match joined {
            Ok((index, result)) => slots[index] = Some(result),
            Err(err) => {
                // A panicked read task loses its slot; the placeholder is
                // filled below so siblings still return.
                log::error!("file read task failed to join: {err}");
            }
        }
    }

    slots
        .into_iter()
        .enumerate()
        .map(|(index, slot)| {
            slot.unwrap_or_else(|| {
                FileReadResult::failed(&requests[index].path, "read task aborted")
            })
        })
        .collect()
}
