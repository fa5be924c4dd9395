//! Statement dispatch: compound blocks, assignment, print, read, and
//! return.

use std::fmt::Write as _;

use crate::ast::{AssignmentNode, CompoundStatementNode, ExpressionNode, StatementNode, VariableReferenceNode};

use super::context::{Scope, ScopeGuard};
use super::control_flow::{codegen_for_statement, codegen_if_statement, codegen_while_statement};
use super::declarations::codegen_local_declaration;
use super::error::CodegenError;
use super::expressions::{codegen_expression, codegen_variable_reference};
use super::globals::format_ptr_expr;
use super::operators::operand_text;
use super::state::Codegen;
use super::value_stack::ShadowValue;

/// Lower a compound statement in its own scope. Returns whether every
/// path through it ends in a `return` — once that happens, remaining
/// statements in the same block would be dead code following a
/// terminator, so they're skipped rather than emitted as invalid IR.
pub(super) fn codegen_compound_statement(
    cg: &mut Codegen,
    node: &CompoundStatementNode,
) -> Result<bool, CodegenError> {
    let _guard = ScopeGuard::enter(&mut cg.context, &mut cg.symbols, Scope::Local);

    for decl in &node.decls {
        codegen_local_declaration(cg, decl)?;
    }

    let mut has_ret = false;
    for stmt in &node.statements {
        has_ret = codegen_statement(cg, stmt)?;
        if has_ret {
            break;
        }
    }
    Ok(has_ret)
}

fn codegen_statement(cg: &mut Codegen, stmt: &StatementNode) -> Result<bool, CodegenError> {
    match stmt {
        StatementNode::Compound(c) => codegen_compound_statement(cg, c),
        StatementNode::Print(e) => {
            codegen_print(cg, e)?;
            Ok(false)
        }
        StatementNode::Read(v) => {
            codegen_read(cg, v)?;
            Ok(false)
        }
        StatementNode::Assignment(a) => {
            codegen_assignment(cg, a)?;
            Ok(false)
        }
        StatementNode::If(i) => codegen_if_statement(cg, i),
        StatementNode::While(w) => codegen_while_statement(cg, w),
        StatementNode::For(f) => codegen_for_statement(cg, f),
        StatementNode::Return(e) => {
            codegen_return(cg, e)?;
            Ok(true)
        }
    }
}

fn codegen_print(cg: &mut Codegen, expr: &ExpressionNode) -> Result<(), CodegenError> {
    let value = codegen_expression(cg, expr, true, false)?;
    let text = operand_text(&value)?;
    let dest = cg.numbering.mint();
    writeln!(
        cg.emitter,
        "%{} = call i32 (i8*, ...) @printf(i8* {}, i32 {})",
        dest,
        format_ptr_expr(),
        text
    )?;
    Ok(())
}

fn codegen_read(cg: &mut Codegen, target: &VariableReferenceNode) -> Result<(), CodegenError> {
    let entry = cg.symbols.entry(target.symbol).clone();
    let addr = if entry.is_global() && target.indices.is_empty() {
        format!("@{}", target.name)
    } else {
        match codegen_variable_reference(cg, target, false, false)? {
            ShadowValue::Reg(n) => format!("%{}", n),
            ShadowValue::Global(name) => format!("@{}", name),
            _ => {
                return Err(CodegenError::Logic(
                    "read target must be an addressable variable".to_string(),
                ));
            }
        }
    };
    let dest = cg.numbering.mint();
    writeln!(
        cg.emitter,
        "%{} = call i32 (i8*, ...) @__isoc99_scanf(i8* {}, i32* {})",
        dest,
        format_ptr_expr(),
        addr
    )?;
    Ok(())
}

fn codegen_assignment(cg: &mut Codegen, node: &AssignmentNode) -> Result<(), CodegenError> {
    let rhs = codegen_expression(cg, &node.expr, true, false)?;
    let rhs_text = operand_text(&rhs)?;

    let entry = cg.symbols.entry(node.target.symbol).clone();
    if entry.ty.is_array() || !node.target.indices.is_empty() {
        let addr = match codegen_variable_reference(cg, &node.target, false, false)? {
            ShadowValue::Reg(n) => format!("%{}", n),
            ShadowValue::Global(name) => format!("@{}", name),
            _ => {
                return Err(CodegenError::Logic(
                    "assignment target must be addressable".to_string(),
                ));
            }
        };
        writeln!(cg.emitter, "store i32 {}, i32* {}, align 4", rhs_text, addr)?;
    } else if entry.is_global() {
        writeln!(cg.emitter, "store i32 {}, i32* @{}, align 4", rhs_text, node.target.name)?;
    } else {
        let slot = cg.locals.get(node.target.symbol).ok_or_else(|| {
            CodegenError::Logic(format!(
                "'{}' has no local storage slot bound in the current function",
                node.target.name
            ))
        })?;
        writeln!(cg.emitter, "store i32 {}, i32* %{}, align 4", rhs_text, slot)?;
    }
    Ok(())
}

fn codegen_return(cg: &mut Codegen, expr: &ExpressionNode) -> Result<(), CodegenError> {
    let value = codegen_expression(cg, expr, true, false)?;
    let text = operand_text(&value)?;
    writeln!(cg.emitter, "ret i32 {}", text)?;
    Ok(())
}
