//! If/else, while, and for lowering via in-memory forward-label
//! patching.
//!
//! `has_ret` — "did control flow reach the end of this construct via a
//! `return`, such that emitting anything after it would be dead code
//! following a terminator" — is the `bool` this module's functions
//! return, not a field flipped by the callee and read back by the
//! caller.

use std::fmt::Write as _;

use crate::ast::{ForNode, IfNode, WhileNode};

use super::context::{Scope, ScopeGuard};
use super::declarations::codegen_local_scalar;
use super::emitter::PatchPoint;
use super::error::CodegenError;
use super::expressions::codegen_expression;
use super::operators::operand_text;
use super::state::Codegen;
use super::statements::codegen_compound_statement;
use super::value_stack::ShadowValue;

/// Evaluate a condition expression and require it to already be a
/// register — this grammar subset's comparisons lower straight to an
/// `icmp ... i1` whose result register is usable directly as a `br i1`
/// operand, so there is no separate "truthiness" instruction to emit.
fn eval_condition(cg: &mut Codegen, expr: &crate::ast::ExpressionNode) -> Result<u32, CodegenError> {
    match codegen_expression(cg, expr, true, false)? {
        ShadowValue::Reg(n) => Ok(n),
        _ => Err(CodegenError::Logic(
            "a condition must be a comparison expression".to_string(),
        )),
    }
}

/// If the branch fell through (didn't return), reserve a forward `br`
/// to the eventual merge point and return its patch handle.
fn reserve_fallthrough_branch(cg: &mut Codegen, returns: bool) -> Result<Option<PatchPoint>, CodegenError> {
    if returns {
        return Ok(None);
    }
    write!(cg.emitter, "br label %")?;
    let patch = cg.emitter.reserve_patch();
    writeln!(cg.emitter)?;
    Ok(Some(patch))
}

pub(super) fn codegen_if_statement(cg: &mut Codegen, node: &IfNode) -> Result<bool, CodegenError> {
    let cond_reg = eval_condition(cg, &node.condition)?;

    let then_label = cg.numbering.peek_next();
    write!(cg.emitter, "br i1 %{}, label %{}, label %", cond_reg, then_label)?;
    let false_patch = cg.emitter.reserve_patch();
    writeln!(cg.emitter)?;

    cg.numbering.mint();
    writeln!(cg.emitter, "{}:", then_label)?;
    let then_returns = codegen_compound_statement(cg, &node.then_body)?;
    let then_fallthrough = reserve_fallthrough_branch(cg, then_returns)?;

    let (else_returns, else_fallthrough) = match &node.else_body {
        Some(else_body) => {
            let else_label = cg.numbering.peek_next();
            cg.emitter.patch(false_patch, else_label)?;
            cg.numbering.mint();
            writeln!(cg.emitter, "{}:", else_label)?;
            let returns = codegen_compound_statement(cg, else_body)?;
            let fallthrough = reserve_fallthrough_branch(cg, returns)?;
            (returns, fallthrough)
        }
        None => (false, None),
    };

    let has_ret = then_returns && node.else_body.is_some() && else_returns;

    if !has_ret {
        let merge_label = cg.numbering.peek_next();
        if node.else_body.is_none() {
            cg.emitter.patch(false_patch, merge_label)?;
        }
        if let Some(p) = then_fallthrough {
            cg.emitter.patch(p, merge_label)?;
        }
        if let Some(p) = else_fallthrough {
            cg.emitter.patch(p, merge_label)?;
        }
        cg.numbering.mint();
        writeln!(cg.emitter, "{}:", merge_label)?;
    }

    Ok(has_ret)
}

pub(super) fn codegen_while_statement(cg: &mut Codegen, node: &WhileNode) -> Result<bool, CodegenError> {
    let head_label = cg.numbering.peek_next();
    writeln!(cg.emitter, "br label %{}", head_label)?;
    cg.numbering.mint();
    writeln!(cg.emitter, "{}:", head_label)?;

    let cond_reg = eval_condition(cg, &node.condition)?;

    let body_label = cg.numbering.peek_next();
    write!(cg.emitter, "br i1 %{}, label %{}, label %", cond_reg, body_label)?;
    let out_patch = cg.emitter.reserve_patch();
    writeln!(cg.emitter)?;

    cg.numbering.mint();
    writeln!(cg.emitter, "{}:", body_label)?;
    codegen_compound_statement(cg, &node.body)?;
    writeln!(cg.emitter, "br label %{}", head_label)?;

    let out_label = cg.numbering.peek_next();
    cg.emitter.patch(out_patch, out_label)?;
    cg.numbering.mint();
    writeln!(cg.emitter, "{}:", out_label)?;

    // A loop body may itself return, but the loop as a whole is never
    // guaranteed to run, so it never counts as unconditionally returning.
    Ok(false)
}

pub(super) fn codegen_for_statement(cg: &mut Codegen, node: &ForNode) -> Result<bool, CodegenError> {
    let _guard = ScopeGuard::enter(&mut cg.context, &mut cg.symbols, Scope::Local);
    codegen_local_scalar(cg, &node.loop_var)?;
    let loop_slot = cg
        .locals
        .get(node.loop_var.symbol)
        .expect("loop variable was just bound to a slot");

    let init = codegen_expression(cg, &node.init, true, false)?;
    let init_text = operand_text(&init)?;
    writeln!(cg.emitter, "store i32 {}, i32* %{}, align 4", init_text, loop_slot)?;

    let head_label = cg.numbering.peek_next();
    writeln!(cg.emitter, "br label %{}", head_label)?;
    cg.numbering.mint();
    writeln!(cg.emitter, "{}:", head_label)?;

    let loaded = cg.numbering.mint();
    writeln!(cg.emitter, "%{} = load i32, i32* %{}, align 4", loaded, loop_slot)?;
    let bound = codegen_expression(cg, &node.upper_bound, true, false)?;
    let bound_text = operand_text(&bound)?;
    let cmp = cg.numbering.mint();
    writeln!(cg.emitter, "%{} = icmp slt i32 %{}, {}", cmp, loaded, bound_text)?;

    let body_label = cg.numbering.peek_next();
    write!(cg.emitter, "br i1 %{}, label %{}, label %", cmp, body_label)?;
    let out_patch = cg.emitter.reserve_patch();
    writeln!(cg.emitter)?;

    cg.numbering.mint();
    writeln!(cg.emitter, "{}:", body_label)?;
    codegen_compound_statement(cg, &node.body)?;

    let reloaded = cg.numbering.mint();
    writeln!(cg.emitter, "%{} = load i32, i32* %{}, align 4", reloaded, loop_slot)?;
    let incremented = cg.numbering.mint();
    writeln!(cg.emitter, "%{} = add nsw i32 %{}, 1", incremented, reloaded)?;
    writeln!(cg.emitter, "store i32 %{}, i32* %{}, align 4", incremented, loop_slot)?;
    writeln!(cg.emitter, "br label %{}", head_label)?;

    let out_label = cg.numbering.peek_next();
    cg.emitter.patch(out_patch, out_label)?;
    cg.numbering.mint();
    writeln!(cg.emitter, "{}:", out_label)?;

    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{CompoundStatementNode, ConstantValue, ExpressionNode, StatementNode};
    use crate::config::CodegenConfig;
    use crate::symbol::{SymbolKind, SymbolManager};
    use crate::types::{BinaryOp, SourceType};

    fn new_cg_with(symbols: SymbolManager) -> Codegen {
        Codegen::new(symbols, CodegenConfig::default())
    }

    fn comparison(op: BinaryOp) -> ExpressionNode {
        ExpressionNode::Binary(Box::new(crate::ast::BinaryOperatorNode {
            op,
            left: ExpressionNode::Constant(ConstantValue::Integer(1)),
            right: ExpressionNode::Constant(ConstantValue::Integer(2)),
        }))
    }

    fn empty_body() -> CompoundStatementNode {
        CompoundStatementNode { decls: vec![], statements: vec![] }
    }

    fn returning_body() -> CompoundStatementNode {
        CompoundStatementNode {
            decls: vec![],
            statements: vec![StatementNode::Return(ExpressionNode::Constant(ConstantValue::Integer(0)))],
        }
    }

    #[test]
    fn if_without_else_patches_false_branch_to_merge() {
        let mut cg = new_cg_with(SymbolManager::new());
        let node = IfNode { condition: comparison(BinaryOp::Lt), then_body: empty_body(), else_body: None };
        let has_ret = codegen_if_statement(&mut cg, &node).unwrap();
        assert!(!has_ret);
        let ir = cg.emitter.into_inner();
        // every label mentioned in a branch must itself appear as a definition
        for line in ir.lines() {
            if let Some(rest) = line.strip_prefix("br i1 ") {
                let parts: Vec<&str> = rest.split("label %").collect();
                for target in &parts[1..] {
                    let label = target.trim_end_matches(',').trim();
                    assert!(ir.contains(&format!("{}:", label)), "missing label {label} in:\n{ir}");
                }
            }
        }
    }

    #[test]
    fn if_with_both_branches_returning_has_ret_true_and_no_merge_block() {
        let mut cg = new_cg_with(SymbolManager::new());
        let then_body = returning_body();
        let else_body = returning_body();
        let node = IfNode { condition: comparison(BinaryOp::Ge), then_body, else_body: Some(else_body) };
        let has_ret = codegen_if_statement(&mut cg, &node).unwrap();
        assert!(has_ret);
    }

    #[test]
    fn if_with_only_then_returning_still_has_ret_false() {
        let mut cg = new_cg_with(SymbolManager::new());
        let then_body = returning_body();
        let node = IfNode { condition: comparison(BinaryOp::Eq), then_body, else_body: None };
        let has_ret = codegen_if_statement(&mut cg, &node).unwrap();
        assert!(!has_ret);
    }

    #[test]
    fn while_loop_branches_back_to_its_own_head() {
        let mut cg = new_cg_with(SymbolManager::new());
        let node = WhileNode { condition: comparison(BinaryOp::Lt), body: empty_body() };
        codegen_while_statement(&mut cg, &node).unwrap();
        let ir = cg.emitter.into_inner();
        assert!(ir.contains("br label %0"));
        assert!(ir.starts_with("br label %0\n0:"));
    }

    #[test]
    fn for_loop_increments_and_rechecks_bound() {
        let mut symbols = SymbolManager::new();
        let loop_var_id = symbols.declare("i", SymbolKind::Variable, SourceType::Integer);
        let mut cg = new_cg_with(symbols);
        let node = ForNode {
            loop_var: crate::ast::VariableNode {
                symbol: loop_var_id,
                name: "i".into(),
                ty: SourceType::Integer,
                initial: None,
            },
            init: ExpressionNode::Constant(ConstantValue::Integer(0)),
            upper_bound: ExpressionNode::Constant(ConstantValue::Integer(10)),
            body: empty_body(),
        };
        codegen_for_statement(&mut cg, &node).unwrap();
        let ir = cg.emitter.into_inner();
        assert!(ir.contains("icmp slt i32"));
        assert!(ir.contains("add nsw i32"));
    }
}
