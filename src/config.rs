//! Codegen configuration.
//!
//! A small struct with `with_*` setters and a `Default` impl,
//! constructed once and handed to the entry point that lowers a whole
//! [`crate::ast::ProgramNode`].

/// Tunables for a single codegen run.
#[derive(Debug, Clone)]
pub struct CodegenConfig {
    /// Directory the `.ll` file is written into. `None` means the
    /// current directory.
    pub output_dir: Option<String>,
    /// Width, in characters, reserved for a forward-referenced label
    /// placeholder. Must exceed the widest decimal label any one
    /// function will mint; exceeding it is an error, not silently
    /// truncated.
    pub label_placeholder_width: usize,
}

impl Default for CodegenConfig {
    fn default() -> Self {
        CodegenConfig {
            output_dir: None,
            // Wide enough for any label a realistic function mints.
            label_placeholder_width: 15,
        }
    }
}

impl CodegenConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_output_dir(mut self, dir: impl Into<String>) -> Self {
        self.output_dir = Some(dir.into());
        self
    }

    pub fn with_label_placeholder_width(mut self, width: usize) -> Self {
        self.label_placeholder_width = width;
        self
    }
}
