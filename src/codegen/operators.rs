//! Binary and unary operator lowering.
//!
//! A naive dispatch handles each operator separately over every
//! combination of register and literal operands it might see, and it's
//! easy for some of those combinations to end up unhandled. Rendering
//! every operand as a plain LLVM operand string — a decimal literal or
//! a `%N` register reference — collapses that whole table to one
//! mnemonic per operator with no missing cells, which both supplies
//! the missing operators and fixes the partial ones at once.

use std::fmt::Write as _;

use crate::ast::{BinaryOperatorNode, UnaryOperatorNode};
use crate::types::{BinaryOp, UnaryOp};

use super::error::CodegenError;
use super::expressions::codegen_expression;
use super::state::Codegen;
use super::value_stack::ShadowValue;

/// Render a shadow value as the text of an LLVM operand. Arithmetic in
/// this grammar subset only ever operates on integers already resolved
/// to a literal or a register.
pub(super) fn operand_text(value: &ShadowValue) -> Result<String, CodegenError> {
    match value {
        ShadowValue::Int(n) => Ok(n.to_string()),
        ShadowValue::Reg(n) => Ok(format!("%{}", n)),
        ShadowValue::Float(_) => Err(CodegenError::Logic(
            "floating-point operands are not supported in this grammar subset".to_string(),
        )),
        ShadowValue::Str(_) => Err(CodegenError::Logic(
            "string operands are not valid in an arithmetic or comparison expression".to_string(),
        )),
        ShadowValue::Global(name) => Err(CodegenError::Logic(format!(
            "'{name}' must be loaded to a value before use in an expression"
        ))),
    }
}

fn mnemonic(op: BinaryOp) -> &'static str {
    match op {
        BinaryOp::Add => "add nsw i32",
        BinaryOp::Sub => "sub nsw i32",
        BinaryOp::Mul => "mul nsw i32",
        BinaryOp::Div => "sdiv exact i32",
        BinaryOp::Mod => "srem i32",
        BinaryOp::Lt => "icmp slt i32",
        BinaryOp::Le => "icmp sle i32",
        BinaryOp::Gt => "icmp sgt i32",
        BinaryOp::Ge => "icmp sge i32",
        BinaryOp::Eq => "icmp eq i32",
        BinaryOp::Ne => "icmp ne i32",
    }
}

pub(super) fn codegen_binary_operator(
    cg: &mut Codegen,
    node: &BinaryOperatorNode,
) -> Result<ShadowValue, CodegenError> {
    let left = codegen_expression(cg, &node.left, true, false)?;
    let right = codegen_expression(cg, &node.right, true, false)?;
    let lhs = operand_text(&left)?;
    let rhs = operand_text(&right)?;

    let dest = cg.numbering.mint();
    writeln!(cg.emitter, "%{} = {} {}, {}", dest, mnemonic(node.op), lhs, rhs)?;
    Ok(ShadowValue::Reg(dest))
}

pub(super) fn codegen_unary_operator(
    cg: &mut Codegen,
    node: &UnaryOperatorNode,
) -> Result<ShadowValue, CodegenError> {
    let operand = codegen_expression(cg, &node.operand, true, false)?;
    let text = operand_text(&operand)?;
    let dest = cg.numbering.mint();
    match node.op {
        UnaryOp::Neg => writeln!(cg.emitter, "%{} = sub nsw i32 0, {}", dest, text)?,
    }
    Ok(ShadowValue::Reg(dest))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{ConstantValue, ExpressionNode};
    use crate::config::CodegenConfig;
    use crate::symbol::SymbolManager;

    fn new_cg() -> Codegen {
        Codegen::new(SymbolManager::new(), CodegenConfig::default())
    }

    #[test]
    fn add_emits_nsw_add_over_two_literals() {
        let mut cg = new_cg();
        let node = BinaryOperatorNode {
            op: BinaryOp::Add,
            left: ExpressionNode::Constant(ConstantValue::Integer(2)),
            right: ExpressionNode::Constant(ConstantValue::Integer(3)),
        };
        let result = codegen_binary_operator(&mut cg, &node).unwrap();
        assert_eq!(result, ShadowValue::Reg(0));
        assert_eq!(cg.emitter.into_inner(), "%0 = add nsw i32 2, 3\n");
    }

    #[test]
    fn not_equal_is_implemented() {
        let mut cg = new_cg();
        let node = BinaryOperatorNode {
            op: BinaryOp::Ne,
            left: ExpressionNode::Constant(ConstantValue::Integer(1)),
            right: ExpressionNode::Constant(ConstantValue::Integer(2)),
        };
        codegen_binary_operator(&mut cg, &node).unwrap();
        assert!(cg.emitter.into_inner().contains("icmp ne i32 1, 2"));
    }

    #[test]
    fn greater_or_equal_is_implemented() {
        let mut cg = new_cg();
        let node = BinaryOperatorNode {
            op: BinaryOp::Ge,
            left: ExpressionNode::Constant(ConstantValue::Integer(5)),
            right: ExpressionNode::Constant(ConstantValue::Integer(1)),
        };
        codegen_binary_operator(&mut cg, &node).unwrap();
        assert!(cg.emitter.into_inner().contains("icmp sge i32 5, 1"));
    }

    #[test]
    fn negation_accepts_a_register_operand() {
        let mut cg = new_cg();
        let inner = BinaryOperatorNode {
            op: BinaryOp::Add,
            left: ExpressionNode::Constant(ConstantValue::Integer(1)),
            right: ExpressionNode::Constant(ConstantValue::Integer(1)),
        };
        let node = UnaryOperatorNode {
            op: UnaryOp::Neg,
            operand: ExpressionNode::Binary(Box::new(inner)),
        };
        let result = codegen_unary_operator(&mut cg, &node).unwrap();
        assert_eq!(result, ShadowValue::Reg(1));
        assert!(cg.emitter.into_inner().contains("sub nsw i32 0, %0"));
    }
}
