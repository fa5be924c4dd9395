//! Program-level entry point: module header, globals, function
//! definitions, and `main`.

use std::fmt::Write as _;

use tracing::debug;

use crate::ast::{CompoundStatementNode, ProgramNode};
use crate::config::CodegenConfig;
use crate::symbol::SymbolManager;

use super::error::CodegenError;
use super::functions::codegen_function;
use super::globals::{codegen_global_variable, emit_int_format_constant};
use super::runtime::emit_runtime_declarations;
use super::state::Codegen;
use super::statements::codegen_compound_statement;

/// Target this engine's output is fixed to: textual LLVM IR for
/// `x86_64-pc-linux-gnu`.
pub const TARGET_TRIPLE: &str = "x86_64-pc-linux-gnu";
const TARGET_DATALAYOUT: &str =
    "e-m:e-p270:32:32-p271:32:32-p272:64:64-i64:64-f80:128-n8:16:32:64-S128";

/// Lower a whole program to a textual `.ll` module.
///
/// `symbols` is the already-resolved symbol table a front end this
/// crate doesn't implement would hand off — see [`crate::symbol`].
pub fn codegen_program(
    program: &ProgramNode,
    symbols: SymbolManager,
    config: &CodegenConfig,
) -> Result<String, CodegenError> {
    debug!(program = %program.name, functions = program.funcs.len(), globals = program.decls.len(), "lowering program");
    let mut cg = Codegen::new(symbols, config.clone());

    writeln!(cg.emitter, "source_filename = \"{}\"", program.name)?;
    writeln!(cg.emitter, "target datalayout = \"{}\"", TARGET_DATALAYOUT)?;
    writeln!(cg.emitter, "target triple = \"{}\"", TARGET_TRIPLE)?;
    writeln!(cg.emitter)?;

    emit_runtime_declarations(&mut cg.emitter)?;
    writeln!(cg.emitter)?;
    emit_int_format_constant(&mut cg.emitter)?;
    writeln!(cg.emitter)?;

    for decl in &program.decls {
        codegen_global_variable(&mut cg.emitter, decl)?;
    }
    if !program.decls.is_empty() {
        writeln!(cg.emitter)?;
    }

    for func in &program.funcs {
        codegen_function(&mut cg, func)?;
        writeln!(cg.emitter)?;
    }

    codegen_main(&mut cg, &program.body)?;

    let ir = cg.emitter.into_inner();
    debug!(bytes = ir.len(), "module lowered");
    Ok(ir)
}

fn codegen_main(cg: &mut Codegen, body: &CompoundStatementNode) -> Result<(), CodegenError> {
    cg.numbering.reset();
    cg.locals.clear();
    writeln!(cg.emitter, "define i32 @main() {{")?;
    let has_ret = codegen_compound_statement(cg, body)?;
    if !has_ret {
        writeln!(cg.emitter, "ret i32 0")?;
    }
    writeln!(cg.emitter, "}}")?;
    Ok(())
}
