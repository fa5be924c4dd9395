//! Code generation error types.

/// Error type for code generation operations.
///
/// This allows proper error propagation using `?` for both logical
/// errors (unsupported constructs, missing `main`, a label overflowing
/// its placeholder) and the I/O failure of writing the finished module
/// out. Invariant violations that indicate a bug in this generator
/// itself (shadow-stack underflow, a tag mismatch on pop) are not
/// modeled here — they are `debug_assert!`/`unreachable!` panics,
/// since no caller could meaningfully recover from them.
#[derive(Debug)]
pub enum CodegenError {
    /// A logical error: an unsupported construct in this grammar
    /// subset, or a fatal-but-recoverable condition such as a forward
    /// label that doesn't fit in the reserved placeholder width.
    Logic(String),
    /// A formatting error while writing IR into the in-memory buffer.
    Format(std::fmt::Error),
    /// Failure opening or writing the output file.
    Io(std::io::Error),
}

impl std::fmt::Display for CodegenError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CodegenError::Logic(s) => write!(f, "{}", s),
            CodegenError::Format(e) => write!(f, "IR generation error: {}", e),
            CodegenError::Io(e) => write!(f, "output file error: {}", e),
        }
    }
}

impl std::error::Error for CodegenError {}

impl From<String> for CodegenError {
    fn from(s: String) -> Self {
        CodegenError::Logic(s)
    }
}

impl From<std::fmt::Error> for CodegenError {
    fn from(e: std::fmt::Error) -> Self {
        CodegenError::Format(e)
    }
}

impl From<std::io::Error> for CodegenError {
    fn from(e: std::io::Error) -> Self {
        CodegenError::Io(e)
    }
}
