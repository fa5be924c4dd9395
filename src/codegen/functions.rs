//! `FunctionNode` lowering: signature, parameter-to-alloca spilling,
//! and body.
//!
//! Parameter numbers and the function's own local numbering share one
//! counter reset to zero at the top of every function, matching
//! [`super::numbering`]; one number is reserved for the (unlabeled)
//! entry block before any local gets one, even though the entry block
//! itself never gets a printed label.

use std::fmt::Write as _;

use tracing::debug;

use crate::ast::FunctionNode;
use crate::types::SourceType;

use super::context::{Scope, ScopeGuard};
use super::error::CodegenError;
use super::expressions::array_param_pointer_type;
use super::state::Codegen;
use super::statements::codegen_compound_statement;

fn param_llvm_type(ty: &SourceType) -> String {
    match ty {
        SourceType::Array { dimensions, .. } => array_param_pointer_type(dimensions),
        _ => "i32".to_string(),
    }
}

pub(super) fn codegen_function(cg: &mut Codegen, func: &FunctionNode) -> Result<(), CodegenError> {
    debug!(name = %func.name, params = func.parameters.len(), "lowering function");
    cg.numbering.reset();
    cg.locals.clear();
    let _guard = ScopeGuard::enter(&mut cg.context, &mut cg.symbols, Scope::Local);

    let param_types: Vec<String> = func.parameters.iter().map(|p| param_llvm_type(&p.ty)).collect();
    let signature: Vec<String> = param_types
        .iter()
        .enumerate()
        .map(|(i, ty)| format!("{} %{}", ty, i))
        .collect();
    writeln!(cg.emitter, "define i32 @{}({}) {{", func.name, signature.join(", "))?;

    // The incoming parameters themselves already occupy %0..%N-1, and
    // the (unlabeled) entry block claims one more after them, even
    // though it never gets a printed label. Both must be minted before
    // any alloca below, or the first alloca's destination collides with
    // a parameter register of the same number.
    for _ in 0..func.parameters.len() {
        cg.numbering.mint();
    }
    cg.numbering.mint();

    for (i, param) in func.parameters.iter().enumerate() {
        let slot = cg.numbering.mint();
        cg.locals.bind(param.symbol, slot);
        let ty = &param_types[i];
        writeln!(cg.emitter, "%{} = alloca {}, align 4", slot, ty)?;
        writeln!(cg.emitter, "store {} %{}, {}* %{}, align 4", ty, i, ty, slot)?;
    }

    let has_ret = codegen_compound_statement(cg, &func.body)?;
    if !has_ret {
        return Err(CodegenError::Logic(format!(
            "function '{}' does not return on every path",
            func.name
        )));
    }
    writeln!(cg.emitter, "}}")?;
    Ok(())
}
