//! Runtime function declarations.
//!
//! This grammar subset calls exactly two C library functions: `printf`
//! for `print` and `__isoc99_scanf` (glibc's checked `scanf` alias,
//! matching what clang itself lowers a bare `scanf` call to on
//! `x86_64-pc-linux-gnu`) for `read`.

use std::fmt::Write as _;

use super::emitter::Emitter;
use super::error::CodegenError;

pub(super) fn emit_runtime_declarations(emitter: &mut Emitter) -> Result<(), CodegenError> {
    writeln!(emitter, "declare i32 @printf(i8*, ...)")?;
    writeln!(emitter, "declare i32 @__isoc99_scanf(i8*, ...)")?;
    Ok(())
}
