//! Targeted file reading.
//!
//! Only `full` loads a whole file. `head` and `range` stream forward and stop
//! as soon as the requested lines are in hand; `tail` walks fixed-size chunks
//! backward from end-of-file, stitching line fragments across chunk
//! boundaries. All four produce line content byte-for-byte identical to a
//! naive read-then-slice over the same file, including files with no trailing
//! newline and empty files.
//!
//! Line convention: content splits on `\n`; a terminating newline at
//! end-of-file closes the last line rather than opening an empty one; `\r`
//! is ordinary line content.

use std::collections::VecDeque;
use std::io::SeekFrom;
use std::path::Path;

use tokio::fs;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncSeekExt, BufReader};

use crate::error::Result;
use crate::request::{FileReadRequest, FileReadResult, ReadMode};

const TAIL_CHUNK_SIZE: u64 = 8192;

/// Execute one validated read request against a concrete path. Failures are
/// captured into the result, never raised.
pub async fn read_file(path: &Path, request: &FileReadRequest) -> FileReadResult {
    let mode = match request.resolve_mode() {
        Ok(mode) => mode,
        Err(err) => return FileReadResult::failed(&request.path, err),
    };
    match read_slice(path, mode).await {
        Ok(content) => FileReadResult::ok(&request.path, content),
        Err(err) => FileReadResult::failed(&request.path, err),
    }
}

pub async fn read_slice(path: &Path, mode: ReadMode) -> Result<String> {
    match mode {
        ReadMode::Full => read_full(path).await,
        ReadMode::Head { lines } => read_head(path, lines).await,
        ReadMode::Tail { lines } => read_tail(path, lines).await,
        ReadMode::Range { start, end } => read_range(path, start, end).await,
    }
}

async fn read_full(path: &Path) -> Result<String> {
    Ok(fs::read_to_string(path).await?)
}

/// First `n` lines via incremental buffered reads; stops as soon as `n`
/// complete lines are accumulated. A trailing partial line counts when EOF
/// arrives first.
async fn read_head(path: &Path, n: usize) -> Result<String> {
    let file = fs::File::open(path).await?;
    let mut reader = BufReader::new(file);

    let mut lines: Vec<String> = Vec::new();
    let mut buf = String::new();
    while lines.len() < n {
        buf.clear();
        let bytes_read = reader.read_line(&mut buf).await?;
        if bytes_read == 0 {
            break;
        }
        lines.push(buf.trim_end_matches('\n').to_string());
    }
    Ok(lines.join("\n"))
}

/// Lines `start..=end` (1-indexed, inclusive) via a forward scan that stops
/// immediately once `end` is reached.
async fn read_range(path: &Path, start: usize, end: usize) -> Result<String> {
    let file = fs::File::open(path).await?;
    let mut reader = BufReader::new(file);

    let mut lines: Vec<String> = Vec::new();
    let mut buf = String::new();
    let mut line_no = 0usize;
    loop {
        buf.clear();
        let bytes_read = reader.read_line(&mut buf).await?;
        if bytes_read == 0 {
            break;
        }
        line_no += 1;
        if line_no < start {
            continue;
        }
        lines.push(buf.trim_end_matches('\n').to_string());
        if line_no == end {
            break;
        }
    }
    Ok(lines.join("\n"))
}

/// Last `n` lines by reading fixed-size chunks backward from end-of-file.
///
/// State machine: `carry` holds the bytes of the leftmost, still-open line
/// fragment; each earlier chunk extends it to the left. Segments bounded by
/// newlines on both sides are complete and move into `collected`. Memory is
/// proportional to the requested lines plus one chunk, not to file size.
async fn read_tail(path: &Path, n: usize) -> Result<String> {
    let mut file = fs::File::open(path).await?;
    let len = file.metadata().await?.len();
    if len == 0 {
        return Ok(String::new());
    }

    // A newline at EOF terminates the final line; skip it so it does not
    // read as an empty last line.
    let mut end = len;
    {
        file.seek(SeekFrom::Start(len - 1)).await?;
        let mut last = [0u8; 1];
        file.read_exact(&mut last).await?;
        if last[0] == b'\n' {
            end -= 1;
        }
    }
    if end == 0 {
        // File is a single newline: one empty line.
        return Ok(String::new());
    }

    let mut collected: VecDeque<Vec<u8>> = VecDeque::new();
    let mut carry: Vec<u8> = Vec::new();
    let mut pos = end;

    while pos > 0 && collected.len() < n {
        let chunk_len = TAIL_CHUNK_SIZE.min(pos);
        pos -= chunk_len;
        file.seek(SeekFrom::Start(pos)).await?;
        let mut data = vec![0u8; chunk_len as usize];
        file.read_exact(&mut data).await?;

        data.extend_from_slice(&carry);
        let mut parts = data.split(|&b| b == b'\n');
        let open_fragment = parts.next().unwrap_or_default().to_vec();
        let complete: Vec<&[u8]> = parts.collect();
        for part in complete.into_iter().rev() {
            collected.push_front(part.to_vec());
        }
        carry = open_fragment;

        while collected.len() > n {
            collected.pop_front();
        }
    }

    if pos == 0 && collected.len() < n {
        // Start of file reached: the open fragment is the first line.
        collected.push_front(carry);
    }

    let mut joined: Vec<u8> = Vec::new();
    for (i, line) in collected.iter().enumerate() {
        if i > 0 {
            joined.push(b'\n');
        }
        joined.extend_from_slice(line);
    }
    Ok(String::from_utf8(joined)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::MAX_SLICE_LINES;
    use pretty_assertions::assert_eq;
    use std::path::PathBuf;
    use tempfile::TempDir;

    /// Naive reference: read everything, split on '\n', drop the empty
    /// trailing segment produced by a terminating newline.
    fn reference_lines(content: &str) -> Vec<String> {
        let mut lines: Vec<String> = content.split('\n').map(str::to_string).collect();
        if content.ends_with('\n') {
            lines.pop();
        }
        if content.is_empty() {
            lines.clear();
        }
        lines
    }

    async fn fixture(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        tokio::fs::write(&path, content).await.expect("write fixture");
        path
    }

    fn numbered_file(count: usize, trailing_newline: bool) -> String {
        let mut content = (1..=count)
            .map(|i| format!("line {i} with some padding text"))
            .collect::<Vec<_>>()
            .join("\n");
        if trailing_newline {
            content.push('\n');
        }
        content
    }

    #[tokio::test]
    async fn head_matches_reference_slice() {
        let dir = TempDir::new().expect("tempdir");
        let content = numbered_file(10_000, true);
        let path = fixture(&dir, "big.txt", &content).await;

        let got = read_slice(&path, ReadMode::Head { lines: 50 }).await.expect("head");
        let want = reference_lines(&content)[..50].join("\n");
        assert_eq!(got, want);
    }

    #[tokio::test]
    async fn tail_matches_reference_slice() {
        let dir = TempDir::new().expect("tempdir");
        let content = numbered_file(10_000, true);
        let path = fixture(&dir, "big.txt", &content).await;

        let got = read_slice(&path, ReadMode::Tail { lines: 50 }).await.expect("tail");
        let reference = reference_lines(&content);
        let want = reference[reference.len() - 50..].join("\n");
        assert_eq!(got, want);
    }

    #[tokio::test]
    async fn range_matches_reference_slice_inclusive() {
        let dir = TempDir::new().expect("tempdir");
        let content = numbered_file(10_000, true);
        let path = fixture(&dir, "big.txt", &content).await;

        let got = read_slice(&path, ReadMode::Range { start: 100, end: 150 })
            .await
            .expect("range");
        let want = reference_lines(&content)[99..150].join("\n");
        assert_eq!(got.split('\n').count(), 51);
        assert_eq!(got, want);
    }

    #[tokio::test]
    async fn no_trailing_newline_is_handled_in_all_modes() {
        let dir = TempDir::new().expect("tempdir");
        let content = numbered_file(100, false);
        let path = fixture(&dir, "plain.txt", &content).await;
        let reference = reference_lines(&content);

        let head = read_slice(&path, ReadMode::Head { lines: 100 }).await.expect("head");
        assert_eq!(head, reference.join("\n"));

        let tail = read_slice(&path, ReadMode::Tail { lines: 3 }).await.expect("tail");
        assert_eq!(tail, reference[97..].join("\n"));

        let range = read_slice(&path, ReadMode::Range { start: 99, end: 100 })
            .await
            .expect("range");
        assert_eq!(range, reference[98..].join("\n"));
    }

    #[tokio::test]
    async fn tail_stitches_lines_split_across_chunk_boundaries() {
        let dir = TempDir::new().expect("tempdir");
        // Long lines comparable to the chunk size force fragments that span
        // backward-read boundaries.
        let long = "x".repeat(TAIL_CHUNK_SIZE as usize - 17);
        let content = format!("first\n{long}\n{long}\nlast\n");
        let path = fixture(&dir, "long.txt", &content).await;

        let got = read_slice(&path, ReadMode::Tail { lines: 3 }).await.expect("tail");
        let reference = reference_lines(&content);
        assert_eq!(got, reference[1..].join("\n"));
    }

    #[tokio::test]
    async fn tail_of_more_lines_than_file_returns_whole_file() {
        let dir = TempDir::new().expect("tempdir");
        let content = "a\nb\nc";
        let path = fixture(&dir, "small.txt", content).await;

        let got = read_slice(&path, ReadMode::Tail { lines: 50 }).await.expect("tail");
        assert_eq!(got, "a\nb\nc");
    }

    #[tokio::test]
    async fn empty_file_reads_as_empty_content_in_all_modes() {
        let dir = TempDir::new().expect("tempdir");
        let path = fixture(&dir, "empty.txt", "").await;

        for mode in [
            ReadMode::Full,
            ReadMode::Head { lines: 5 },
            ReadMode::Tail { lines: 5 },
            ReadMode::Range { start: 1, end: 5 },
        ] {
            let got = read_slice(&path, mode).await.expect("read");
            assert_eq!(got, "", "mode {mode}");
        }
    }

    #[tokio::test]
    async fn crlf_content_is_preserved_byte_for_byte() {
        let dir = TempDir::new().expect("tempdir");
        let content = "alpha\r\nbeta\r\ngamma\r\n";
        let path = fixture(&dir, "crlf.txt", content).await;
        let reference = reference_lines(content);

        let head = read_slice(&path, ReadMode::Head { lines: 2 }).await.expect("head");
        assert_eq!(head, reference[..2].join("\n"));
        assert!(head.contains('\r'));

        let tail = read_slice(&path, ReadMode::Tail { lines: 2 }).await.expect("tail");
        assert_eq!(tail, reference[1..].join("\n"));
    }

    #[tokio::test]
    async fn missing_file_is_captured_not_thrown() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("absent.txt");
        let request = FileReadRequest::full("absent.txt");

        let result = read_file(&path, &request).await;
        assert!(!result.success);
        assert!(result.error.is_some());
        assert!(result.content.is_none());
    }

    #[tokio::test]
    async fn invalid_parameter_combination_is_captured_per_request() {
        let dir = TempDir::new().expect("tempdir");
        let path = fixture(&dir, "a.txt", "content").await;
        let mut request = FileReadRequest::full("a.txt");
        request.lines = Some(3);

        let result = read_file(&path, &request).await;
        assert!(!result.success);
        assert!(result.error.unwrap().contains("not allowed"));
    }

    #[tokio::test]
    async fn requested_lines_clamp_keeps_tail_bounded() {
        let dir = TempDir::new().expect("tempdir");
        let content = numbered_file(20, true);
        let path = fixture(&dir, "short.txt", &content).await;

        let request = FileReadRequest::tail("short.txt", MAX_SLICE_LINES * 10);
        let result = read_file(&path, &request).await;
        assert!(result.success);
        assert_eq!(result.content.unwrap(), reference_lines(&content).join("\n"));
    }
}
