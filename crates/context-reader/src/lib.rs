//! Targeted file reading and priority-ordered context assembly for
//! Reason MCP.
//!
//! Reads only the requested slice of each file (head/tail/range never load
//! whole files), executes batches concurrently with per-request failure
//! capture, and assembles caller-prioritized context sections in a
//! deterministic order.

mod assembler;
mod batch;
mod error;
mod reader;
mod request;

pub use assembler::{assemble_context, AssembledContext};
pub use batch::{read_many, resolve_path};
pub use error::{ReadError, Result};
pub use reader::{read_file, read_slice};
pub use request::{
    AnalysisTarget, FileReadRequest, FileReadResult, Priority, ReadMode, ReadModeKind,
    MAX_SLICE_LINES,
};
