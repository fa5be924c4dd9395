//! Expression lowering: constants, variable references (including
//! array indexing), and function calls.
//!
//! `ref_to_value` and `dealing_params` are threaded as parameters
//! rather than carried as mutable fields: both flags only ever need to
//! be true for the duration of evaluating one expression subtree, and a
//! field that every caller must remember to flip back is exactly the
//! class of bug a parameter can't have.

use std::fmt::Write as _;

use crate::ast::{ConstantValue, ExpressionNode, FunctionInvocationNode, VariableReferenceNode};
use crate::symbol::{SymbolEntry, SymbolKind};

use super::error::CodegenError;
use super::operators::{codegen_binary_operator, codegen_unary_operator, operand_text};
use super::state::Codegen;
use super::value_stack::ShadowValue;

/// LLVM type of the aggregate an owning array declaration allocates.
pub(super) fn array_llvm_type(dims: &[usize]) -> String {
    match dims {
        [d0] => format!("[{} x i32]", d0),
        [d0, d1] => format!("[{} x [{} x i32]]", d0, d1),
        other => unreachable!("array rank {} is out of scope", other.len()),
    }
}

/// LLVM type of the pointer a non-owning array *parameter* holds
/// (the caller passes the address of its own storage; this function
/// never allocates the array itself).
pub(super) fn array_param_pointer_type(dims: &[usize]) -> String {
    match dims {
        [_d0] => "i32*".to_string(),
        [_d0, d1] => format!("[{} x i32]*", d1),
        other => unreachable!("array rank {} is out of scope", other.len()),
    }
}

pub(super) fn codegen_expression(
    cg: &mut Codegen,
    expr: &ExpressionNode,
    ref_to_value: bool,
    dealing_params: bool,
) -> Result<ShadowValue, CodegenError> {
    match expr {
        ExpressionNode::Constant(c) => codegen_constant(c),
        ExpressionNode::VariableReference(v) => {
            codegen_variable_reference(cg, v, ref_to_value, dealing_params)
        }
        ExpressionNode::Binary(b) => codegen_binary_operator(cg, b),
        ExpressionNode::Unary(u) => codegen_unary_operator(cg, u),
        ExpressionNode::FunctionInvocation(f) => codegen_function_invocation(cg, f),
    }
}

fn codegen_constant(c: &ConstantValue) -> Result<ShadowValue, CodegenError> {
    match c {
        ConstantValue::Integer(n) => Ok(ShadowValue::Int(*n)),
        ConstantValue::Boolean(b) => Ok(ShadowValue::Int(*b as i32)),
        ConstantValue::Real(_) => Err(CodegenError::Logic(
            "floating-point codegen is not supported in this grammar subset".to_string(),
        )),
    }
}

pub(super) fn codegen_variable_reference(
    cg: &mut Codegen,
    node: &VariableReferenceNode,
    ref_to_value: bool,
    dealing_params: bool,
) -> Result<ShadowValue, CodegenError> {
    let entry = cg.symbols.entry(node.symbol).clone();

    if entry.ty.is_array() {
        return codegen_array_reference(cg, node, &entry, ref_to_value, dealing_params);
    }

    if !node.indices.is_empty() {
        return Err(CodegenError::Logic(format!(
            "'{}' is not an array and cannot be indexed",
            node.name
        )));
    }

    let is_global = entry.is_global();
    if ref_to_value {
        let dest = cg.numbering.mint();
        if is_global {
            writeln!(cg.emitter, "%{} = load i32, i32* @{}, align 4", dest, node.name)?;
        } else {
            let slot = local_slot(cg, node)?;
            writeln!(cg.emitter, "%{} = load i32, i32* %{}, align 4", dest, slot)?;
        }
        Ok(ShadowValue::Reg(dest))
    } else if is_global {
        Ok(ShadowValue::Global(node.name.clone()))
    } else {
        Ok(ShadowValue::Reg(local_slot(cg, node)?))
    }
}

fn local_slot(cg: &Codegen, node: &VariableReferenceNode) -> Result<u32, CodegenError> {
    cg.locals.get(node.symbol).ok_or_else(|| {
        CodegenError::Logic(format!(
            "'{}' has no local storage slot bound in the current function",
            node.name
        ))
    })
}

fn codegen_array_reference(
    cg: &mut Codegen,
    node: &VariableReferenceNode,
    entry: &SymbolEntry,
    ref_to_value: bool,
    dealing_params: bool,
) -> Result<ShadowValue, CodegenError> {
    let dims = entry
        .ty
        .array_dimensions()
        .expect("array type carries its dimensions")
        .to_vec();
    let slot = local_slot(cg, node)?;
    let is_param = entry.kind == SymbolKind::Parameter;

    if node.indices.is_empty() {
        if !dealing_params {
            return Err(CodegenError::Logic(format!(
                "array '{}' used without an index outside of a call argument",
                node.name
            )));
        }
        return codegen_array_decay_to_pointer(cg, slot, is_param, &dims);
    }

    if node.indices.len() != dims.len() {
        return Err(CodegenError::Logic(format!(
            "'{}' is rank {} but indexed with {} subscript(s)",
            node.name,
            dims.len(),
            node.indices.len()
        )));
    }

    let mut index_texts = Vec::with_capacity(node.indices.len());
    for idx_expr in &node.indices {
        let v = codegen_expression(cg, idx_expr, true, false)?;
        index_texts.push(operand_text(&v)?);
    }

    let elem_addr = if is_param {
        codegen_array_param_element_address(cg, slot, &dims, &index_texts)?
    } else {
        codegen_array_owned_element_address(cg, slot, &dims, &index_texts)?
    };

    if ref_to_value {
        let dest = cg.numbering.mint();
        writeln!(cg.emitter, "%{} = load i32, i32* %{}, align 4", dest, elem_addr)?;
        Ok(ShadowValue::Reg(dest))
    } else {
        Ok(ShadowValue::Reg(elem_addr))
    }
}

/// Decay a bare array name (no index) to a pointer to its first
/// element, for passing as a call argument.
fn codegen_array_decay_to_pointer(
    cg: &mut Codegen,
    slot: u32,
    is_param: bool,
    dims: &[usize],
) -> Result<ShadowValue, CodegenError> {
    if is_param {
        // The parameter's own slot already holds a pointer of exactly
        // the type a further callee's array parameter expects — loading
        // it back out *is* the decayed pointer, with no indexing step.
        let ptr_ty = array_param_pointer_type(dims);
        let loaded = cg.numbering.mint();
        writeln!(cg.emitter, "%{} = load {}, {}* %{}, align 4", loaded, ptr_ty, ptr_ty, slot)?;
        return Ok(ShadowValue::Reg(loaded));
    }
    let array_ty = array_llvm_type(dims);
    let dest = cg.numbering.mint();
    writeln!(
        cg.emitter,
        "%{} = getelementptr inbounds {}, {}* %{}, i32 0, i32 0",
        dest, array_ty, array_ty, slot
    )?;
    Ok(ShadowValue::Reg(dest))
}

/// Element address for an array living in a parameter's pointer slot:
/// load the pointer, then index through it.
fn codegen_array_param_element_address(
    cg: &mut Codegen,
    slot: u32,
    dims: &[usize],
    index_texts: &[String],
) -> Result<u32, CodegenError> {
    let ptr_ty = array_param_pointer_type(dims);
    let loaded = cg.numbering.mint();
    writeln!(cg.emitter, "%{} = load {}, {}* %{}, align 4", loaded, ptr_ty, ptr_ty, slot)?;
    let dest = cg.numbering.mint();
    match dims.len() {
        1 => writeln!(
            cg.emitter,
            "%{} = getelementptr inbounds i32, i32* %{}, i32 {}",
            dest, loaded, index_texts[0]
        )?,
        2 => {
            // `loaded` has type `ptr_ty` (a pointer to one row); the
            // GEP's pointee type is that row, not a pointer to it.
            let row_ty = format!("[{} x i32]", dims[1]);
            writeln!(
                cg.emitter,
                "%{} = getelementptr inbounds {}, {}* %{}, i32 {}, i32 {}",
                dest, row_ty, row_ty, loaded, index_texts[0], index_texts[1]
            )?
        }
        other => unreachable!("array rank {} is out of scope", other),
    }
    Ok(dest)
}

/// Element address for an array this function owns the storage for
/// (an `alloca`'d aggregate): index straight into the alloca.
fn codegen_array_owned_element_address(
    cg: &mut Codegen,
    slot: u32,
    dims: &[usize],
    index_texts: &[String],
) -> Result<u32, CodegenError> {
    let array_ty = array_llvm_type(dims);
    let dest = cg.numbering.mint();
    match dims.len() {
        1 => writeln!(
            cg.emitter,
            "%{} = getelementptr inbounds {}, {}* %{}, i32 0, i32 {}",
            dest, array_ty, array_ty, slot, index_texts[0]
        )?,
        2 => writeln!(
            cg.emitter,
            "%{} = getelementptr inbounds {}, {}* %{}, i32 0, i32 {}, i32 {}",
            dest, array_ty, array_ty, slot, index_texts[0], index_texts[1]
        )?,
        other => unreachable!("array rank {} is out of scope", other),
    }
    Ok(dest)
}

pub(super) fn codegen_function_invocation(
    cg: &mut Codegen,
    node: &FunctionInvocationNode,
) -> Result<ShadowValue, CodegenError> {
    let mut arg_operands = Vec::with_capacity(node.arguments.len());
    for arg in &node.arguments {
        arg_operands.push(codegen_call_argument(cg, arg)?);
    }
    let dest = cg.numbering.mint();
    writeln!(
        cg.emitter,
        "%{} = call i32 @{}({})",
        dest,
        node.name,
        arg_operands.join(", ")
    )?;
    Ok(ShadowValue::Reg(dest))
}

/// Lower one call argument to a `<type> <operand>` pair. A bare array
/// name decays to a pointer and carries its own pointer type; every
/// other expression in this grammar subset is `i32`.
fn codegen_call_argument(cg: &mut Codegen, expr: &ExpressionNode) -> Result<String, CodegenError> {
    if let ExpressionNode::VariableReference(v) = expr {
        let entry = cg.symbols.entry(v.symbol).clone();
        if entry.ty.is_array() && v.indices.is_empty() {
            let dims = entry.ty.array_dimensions().unwrap().to_vec();
            let ty = if entry.kind == SymbolKind::Parameter {
                array_param_pointer_type(&dims)
            } else {
                format!("{}*", array_llvm_type(&dims))
            };
            let value = codegen_variable_reference(cg, v, true, true)?;
            return Ok(format!("{} {}", ty, operand_text(&value)?));
        }
    }
    let value = codegen_expression(cg, expr, true, false)?;
    Ok(format!("i32 {}", operand_text(&value)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::ConstantValue;
    use crate::config::CodegenConfig;
    use crate::symbol::SymbolManager;
    use crate::types::SourceType;

    fn new_cg() -> Codegen {
        Codegen::new(SymbolManager::new(), CodegenConfig::default())
    }

    #[test]
    fn integer_constant_is_an_immediate() {
        let v = codegen_constant(&ConstantValue::Integer(5)).unwrap();
        assert_eq!(v, ShadowValue::Int(5));
    }

    #[test]
    fn real_constant_is_rejected() {
        assert!(codegen_constant(&ConstantValue::Real(1.5)).is_err());
    }

    #[test]
    fn global_scalar_read_as_value_emits_a_load() {
        let mut cg = new_cg();
        let id = cg.symbols.declare("g", crate::symbol::SymbolKind::Variable, SourceType::Integer);
        let node = VariableReferenceNode { symbol: id, name: "g".into(), indices: vec![] };
        let v = codegen_variable_reference(&mut cg, &node, true, false).unwrap();
        assert_eq!(v, ShadowValue::Reg(0));
        assert!(cg.emitter.into_inner().contains("load i32, i32* @g"));
    }

    #[test]
    fn global_scalar_as_lvalue_yields_global_name() {
        let mut cg = new_cg();
        let id = cg.symbols.declare("g", crate::symbol::SymbolKind::Variable, SourceType::Integer);
        let node = VariableReferenceNode { symbol: id, name: "g".into(), indices: vec![] };
        let v = codegen_variable_reference(&mut cg, &node, false, false).unwrap();
        assert_eq!(v, ShadowValue::Global("g".to_string()));
    }

    #[test]
    fn local_scalar_as_lvalue_yields_its_own_slot_register() {
        let mut cg = new_cg();
        let id = cg.symbols.declare("x", crate::symbol::SymbolKind::Variable, SourceType::Integer);
        cg.locals.bind(id, 2);
        let node = VariableReferenceNode { symbol: id, name: "x".into(), indices: vec![] };
        let v = codegen_variable_reference(&mut cg, &node, false, false).unwrap();
        assert_eq!(v, ShadowValue::Reg(2));
    }

    #[test]
    fn owned_rank1_array_index_gep_uses_the_alloca_directly() {
        let mut cg = new_cg();
        let ty = SourceType::Array { element: Box::new(SourceType::Integer), dimensions: vec![4] };
        let id = cg.symbols.declare("a", crate::symbol::SymbolKind::Variable, ty);
        cg.locals.bind(id, 3);
        let node = VariableReferenceNode {
            symbol: id,
            name: "a".into(),
            indices: vec![ExpressionNode::Constant(ConstantValue::Integer(1))],
        };
        codegen_variable_reference(&mut cg, &node, true, false).unwrap();
        let ir = cg.emitter.into_inner();
        assert!(ir.contains("getelementptr inbounds [4 x i32], [4 x i32]* %3, i32 0, i32 1"));
        assert!(ir.contains("load i32, i32* %"));
    }

    #[test]
    fn param_rank1_array_loads_pointer_before_indexing() {
        let mut cg = new_cg();
        let ty = SourceType::Array { element: Box::new(SourceType::Integer), dimensions: vec![4] };
        let id = cg.symbols.declare("a", crate::symbol::SymbolKind::Parameter, ty);
        cg.locals.bind(id, 0);
        let node = VariableReferenceNode {
            symbol: id,
            name: "a".into(),
            indices: vec![ExpressionNode::Constant(ConstantValue::Integer(2))],
        };
        codegen_variable_reference(&mut cg, &node, true, false).unwrap();
        let ir = cg.emitter.into_inner();
        assert!(ir.contains("load i32*, i32** %0"));
        assert!(ir.contains("getelementptr inbounds i32, i32* %"));
    }

    #[test]
    fn param_rank2_array_index_gep_uses_the_row_type_not_a_pointer_to_it() {
        let mut cg = new_cg();
        let ty = SourceType::Array { element: Box::new(SourceType::Integer), dimensions: vec![2, 5] };
        let id = cg.symbols.declare("m", crate::symbol::SymbolKind::Parameter, ty);
        cg.locals.bind(id, 3);
        let node = VariableReferenceNode {
            symbol: id,
            name: "m".into(),
            indices: vec![
                ExpressionNode::Constant(ConstantValue::Integer(1)),
                ExpressionNode::Constant(ConstantValue::Integer(3)),
            ],
        };
        codegen_variable_reference(&mut cg, &node, true, false).unwrap();
        let ir = cg.emitter.into_inner();
        assert!(ir.contains("load [5 x i32]*, [5 x i32]** %3"));
        assert!(ir.contains("getelementptr inbounds [5 x i32], [5 x i32]* %"));
        assert!(ir.contains("i32 1, i32 3"));
    }

    #[test]
    fn param_rank1_array_decays_to_its_own_loaded_pointer() {
        let mut cg = new_cg();
        let ty = SourceType::Array { element: Box::new(SourceType::Integer), dimensions: vec![4] };
        let id = cg.symbols.declare("a", crate::symbol::SymbolKind::Parameter, ty);
        cg.locals.bind(id, 3);
        let node = VariableReferenceNode { symbol: id, name: "a".into(), indices: vec![] };
        let v = codegen_variable_reference(&mut cg, &node, true, true).unwrap();
        let ir = cg.emitter.into_inner();
        assert_eq!(ir, "%0 = load i32*, i32** %3, align 4\n");
        assert_eq!(v, ShadowValue::Reg(0));
    }

    #[test]
    fn param_rank2_array_decays_to_its_own_loaded_pointer() {
        let mut cg = new_cg();
        let ty = SourceType::Array { element: Box::new(SourceType::Integer), dimensions: vec![2, 5] };
        let id = cg.symbols.declare("m", crate::symbol::SymbolKind::Parameter, ty);
        cg.locals.bind(id, 3);
        let node = VariableReferenceNode { symbol: id, name: "m".into(), indices: vec![] };
        let v = codegen_variable_reference(&mut cg, &node, true, true).unwrap();
        let ir = cg.emitter.into_inner();
        assert_eq!(ir, "%0 = load [5 x i32]*, [5 x i32]** %3, align 4\n");
        assert_eq!(v, ShadowValue::Reg(0));
    }

    #[test]
    fn bare_array_name_outside_call_argument_is_rejected() {
        let mut cg = new_cg();
        let ty = SourceType::Array { element: Box::new(SourceType::Integer), dimensions: vec![4] };
        let id = cg.symbols.declare("a", crate::symbol::SymbolKind::Variable, ty);
        cg.locals.bind(id, 3);
        let node = VariableReferenceNode { symbol: id, name: "a".into(), indices: vec![] };
        assert!(codegen_variable_reference(&mut cg, &node, true, false).is_err());
    }

    #[test]
    fn function_call_renders_i32_typed_arguments() {
        let mut cg = new_cg();
        let node = FunctionInvocationNode {
            callee_symbol: cg.symbols.declare(
                "f",
                crate::symbol::SymbolKind::Function,
                SourceType::Integer,
            ),
            name: "f".into(),
            arguments: vec![ExpressionNode::Constant(ConstantValue::Integer(9))],
        };
        codegen_function_invocation(&mut cg, &node).unwrap();
        assert!(cg.emitter.into_inner().contains("call i32 @f(i32 9)"));
    }
}
