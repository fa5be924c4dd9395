//! Driver glue: output path derivation and writing the finished module.
//!
//! Everything else a real driver would do — invoking a lexer/parser,
//! running semantic analysis, shelling out to `llc`/`clang` — is out of
//! scope; this crate only derives where the `.ll` file goes and writes
//! it once codegen has produced the whole buffer.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::codegen::error::CodegenError;

/// Derive `<out-dir>/<base>.ll` from a source path and an optional
/// output directory: `<base>` is the source filename stripped of its
/// directory and its last `.`-extension; an empty/absent `out_dir`
/// means the current directory.
pub fn output_path(source_path: &str, out_dir: Option<&str>) -> PathBuf {
    let dir = match out_dir {
        Some(d) if !d.is_empty() => d,
        _ => ".",
    };
    let stem = Path::new(source_path)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(source_path);
    Path::new(dir).join(format!("{stem}.ll"))
}

/// Write the finished IR text to disk. A failure here is fatal to the
/// codegen run: there is no partial-success recovery, and a truncated
/// or missing file on error is acceptable.
pub fn write_module(path: &Path, ir: &str) -> Result<(), CodegenError> {
    debug!(path = %path.display(), bytes = ir.len(), "writing module");
    std::fs::write(path, ir).map_err(CodegenError::Io)
}
