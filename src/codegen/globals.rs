//! Program-level globals: scalar `var` declarations and the one fixed
//! format-string constant every `print`/`read` call shares.
//!
//! Exactly one such constant is emitted up front and reused for every
//! `printf` and `scanf` call site; there's no string interning to do
//! here the way a richer language's string-literal globals would need,
//! since this grammar subset prints and reads integers only.

use std::fmt::Write as _;

use crate::ast::VariableNode;

use super::emitter::Emitter;
use super::error::CodegenError;

/// Name of the shared `"%d\n"` format-string constant.
pub(super) const INT_FORMAT_GLOBAL: &str = "@.str";

/// Emit the `%d\n` constant `printf`/`scanf` both point at.
pub(super) fn emit_int_format_constant(emitter: &mut Emitter) -> Result<(), CodegenError> {
    writeln!(
        emitter,
        "{} = private unnamed_addr constant [4 x i8] c\"%d\\0A\\00\", align 1",
        INT_FORMAT_GLOBAL
    )?;
    Ok(())
}

/// The `getelementptr` expression `printf`/`scanf` use to turn the
/// format constant into an `i8*` argument.
pub(super) fn format_ptr_expr() -> String {
    format!(
        "getelementptr inbounds ([4 x i8], [4 x i8]* {}, i64 0, i64 0)",
        INT_FORMAT_GLOBAL
    )
}

/// Emit a program-level `var` declaration. Only scalar globals are
/// supported; a global array has no natural LLVM lowering without also
/// picking an initializer shape, and this grammar subset doesn't need
/// one.
pub(super) fn codegen_global_variable(emitter: &mut Emitter, var: &VariableNode) -> Result<(), CodegenError> {
    if var.ty.is_array() {
        return Err(CodegenError::Logic(format!(
            "global array '{}' is not supported; arrays may only be declared locally",
            var.name
        )));
    }
    let init = var.initial.and_then(|c| c.as_integer()).unwrap_or(0);
    writeln!(emitter, "@{} = global i32 {}, align 4", var.name, init)?;
    Ok(())
}
