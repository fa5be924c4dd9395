//! Local variable declaration lowering: scalars and arrays, the latter
//! split between a function's own storage and a parameter's pointer.

use std::fmt::Write as _;

use crate::ast::VariableNode;

use super::error::CodegenError;
use super::expressions::array_llvm_type;
use super::state::Codegen;

pub(super) fn codegen_local_declaration(cg: &mut Codegen, var: &VariableNode) -> Result<(), CodegenError> {
    if var.ty.is_array() {
        codegen_local_array(cg, var)
    } else {
        codegen_local_scalar(cg, var)
    }
}

pub(super) fn codegen_local_scalar(cg: &mut Codegen, var: &VariableNode) -> Result<(), CodegenError> {
    let slot = cg.numbering.mint();
    cg.locals.bind(var.symbol, slot);
    writeln!(cg.emitter, "%{} = alloca i32, align 4", slot)?;
    if let Some(init) = var.initial.and_then(|c| c.as_integer()) {
        writeln!(cg.emitter, "store i32 {}, i32* %{}, align 4", init, slot)?;
    }
    Ok(())
}

fn codegen_local_array(cg: &mut Codegen, var: &VariableNode) -> Result<(), CodegenError> {
    let dims = var
        .ty
        .array_dimensions()
        .expect("array-typed local must carry its dimensions")
        .to_vec();
    let slot = cg.numbering.mint();
    cg.locals.bind(var.symbol, slot);
    writeln!(cg.emitter, "%{} = alloca {}, align 16", slot, array_llvm_type(&dims))?;
    Ok(())
}
