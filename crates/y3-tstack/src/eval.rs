//! Predefined operations
//!
//! One check/eval pair per opcode. The check verifies the frame shape
//! (operator, arity, argument tags) without touching anything; the eval
//! consumes the frame and replaces it with the result cell. Both receive
//! the index of the first argument cell and the argument count.
//!
//! Layout follows the operation families: definitions and bindings,
//! type constructors, term constructors, arithmetic, bit-vector
//! arithmetic, bit-vector logic, bit-vector atoms, result extraction.

use num_traits::{Signed, ToPrimitive, Zero};

use y3_core::{normalize64, BvConstant, CoreResult, TermId, TermStore, TypeStore, MAX_BV_WIDTH};

use crate::cell::{Tag, Value};
use crate::coerce::{
    bva64_add_elem, bva64_mul_elem, bva64_sub_elem, bva_add_elem, bva_mul_elem, bva_sub_elem,
    bvconst_of_elem, bvl_set_elem, elem_bits, elem_bitsize, external_error, get_integer, get_term,
    rat_add_elem, rat_mul_elem, rat_sub_elem, rational_of_elem,
};
use crate::error::{ErrorKind, StackResult};
use crate::op_table::{OpTable, Opcode};
use crate::stack::TermStack;

// ----------------------------------------------------------------------
// Check helpers
// ----------------------------------------------------------------------

pub(crate) fn check_op(stack: &TermStack, op: Opcode) -> StackResult<()> {
    if stack.top_op == op {
        Ok(())
    } else {
        Err(stack.frame_error(ErrorKind::Internal))
    }
}

pub(crate) fn check_size(stack: &TermStack, cond: bool) -> StackResult<()> {
    if cond {
        Ok(())
    } else {
        Err(stack.frame_error(ErrorKind::InvalidFrame))
    }
}

fn invalid_tag_kind(expected: Tag) -> ErrorKind {
    match expected {
        Tag::Symbol => ErrorKind::NotASymbol,
        Tag::String => ErrorKind::NotAString,
        Tag::Rational => ErrorKind::NotARational,
        Tag::Type => ErrorKind::NotAType,
        _ => ErrorKind::Internal,
    }
}

pub(crate) fn check_tag(stack: &TermStack, idx: usize, expected: Tag) -> StackResult<()> {
    if stack.elems[idx].value.tag() == expected {
        Ok(())
    } else {
        Err(stack.cell_error(idx, invalid_tag_kind(expected)))
    }
}

fn check_all_tags(stack: &TermStack, from: usize, to: usize, expected: Tag) -> StackResult<()> {
    for idx in from..to {
        check_tag(stack, idx, expected)?;
    }
    Ok(())
}

/// All cells in `f..f + count` are bindings with pairwise distinct names
fn check_distinct_binding_names(stack: &TermStack, f: usize, count: usize) -> StackResult<()> {
    for i in 0..count {
        let name_i = match &stack.elems[f + i].value {
            Value::TermBinding { name, .. } => name,
            _ => return Err(stack.cell_error(f + i, ErrorKind::Internal)),
        };
        for j in 0..i {
            if let Value::TermBinding { name, .. } = &stack.elems[f + j].value {
                if name == name_i {
                    return Err(stack.cell_error(f + i, ErrorKind::DuplicateVarName));
                }
            }
        }
    }
    Ok(())
}

fn check_distinct_scalar_names(stack: &TermStack, f: usize, count: usize) -> StackResult<()> {
    for i in 0..count {
        let name_i = match &stack.elems[f + i].value {
            Value::Symbol(name) => name,
            _ => return Err(stack.cell_error(f + i, ErrorKind::Internal)),
        };
        for j in 0..i {
            if let Value::Symbol(name) = &stack.elems[f + j].value {
                if name == name_i {
                    return Err(stack.cell_error(f + i, ErrorKind::DuplicateScalarName));
                }
            }
        }
    }
    Ok(())
}

// ----------------------------------------------------------------------
// Eval helpers
// ----------------------------------------------------------------------

pub(crate) fn get_term_args(stack: &mut TermStack, f: usize, n: u32) -> StackResult<Vec<TermId>> {
    let mut args = Vec::with_capacity(n as usize);
    for i in 0..n as usize {
        args.push(get_term(stack, f + i)?);
    }
    Ok(args)
}

pub(crate) fn finish_term(stack: &mut TermStack, t: CoreResult<TermId>) -> StackResult<()> {
    let t = t.map_err(|e| external_error(stack, &e))?;
    stack.pop_frame();
    stack.set_term_result(t);
    Ok(())
}

fn set_const_result(stack: &mut TermStack, c: BvConstant) {
    if c.width() <= 64 {
        let value = c.value().to_u64().unwrap_or(0);
        stack.set_bv64_result(c.width(), value);
    } else {
        stack.set_bv_result(c);
    }
}

/// Fold `op` over the frame when every argument is structurally constant
fn fold_all_const(
    stack: &mut TermStack,
    f: usize,
    n: u32,
    op: fn(&BvConstant, &BvConstant) -> BvConstant,
) -> StackResult<Option<BvConstant>> {
    let mut acc = match bvconst_of_elem(stack, f) {
        Some(c) => c,
        None => return Ok(None),
    };
    for i in 1..n as usize {
        match bvconst_of_elem(stack, f + i) {
            Some(c) => {
                if c.width() != acc.width() {
                    return Err(stack.cell_error(f + i, ErrorKind::IncompatibleBvSizes));
                }
                acc = op(&acc, &c);
            }
            None => return Ok(None),
        }
    }
    Ok(Some(acc))
}

// ----------------------------------------------------------------------
// Sentinel
// ----------------------------------------------------------------------

fn check_no_op(stack: &mut TermStack, _f: usize, _n: u32) -> StackResult<()> {
    Err(stack.frame_error(ErrorKind::InvalidOp))
}

fn eval_no_op(stack: &mut TermStack, _f: usize, _n: u32) -> StackResult<()> {
    Err(stack.frame_error(ErrorKind::InvalidOp))
}

// ----------------------------------------------------------------------
// Definitions: DEFINE_TYPE, DEFINE_TERM
// ----------------------------------------------------------------------

fn check_define_type(stack: &mut TermStack, f: usize, n: u32) -> StackResult<()> {
    check_op(stack, Opcode::DEFINE_TYPE)?;
    check_size(stack, n == 1 || n == 2)?;
    check_tag(stack, f, Tag::Symbol)?;
    if n == 2 {
        check_tag(stack, f + 1, Tag::Type)?;
    }
    Ok(())
}

fn eval_define_type(stack: &mut TermStack, f: usize, n: u32) -> StackResult<()> {
    let name = match &stack.elems[f].value {
        Value::Symbol(s) => s.clone(),
        _ => return Err(stack.cell_error(f, ErrorKind::Internal)),
    };
    let tau = if n == 2 {
        match &stack.elems[f + 1].value {
            Value::Type(ty) => *ty,
            _ => return Err(stack.cell_error(f + 1, ErrorKind::Internal)),
        }
    } else {
        stack.types.mk_uninterpreted()
    };
    stack.types.set_name(&name, tau);
    stack.pop_frame();
    stack.no_result();
    Ok(())
}

fn check_define_term(stack: &mut TermStack, f: usize, n: u32) -> StackResult<()> {
    check_op(stack, Opcode::DEFINE_TERM)?;
    check_size(stack, n == 2 || n == 3)?;
    check_tag(stack, f, Tag::Symbol)?;
    check_tag(stack, f + 1, Tag::Type)
    // the third argument is converted by get_term, which raises its own
    // error when the cell cannot denote a term
}

fn eval_define_term(stack: &mut TermStack, f: usize, n: u32) -> StackResult<()> {
    let name = match &stack.elems[f].value {
        Value::Symbol(s) => s.clone(),
        _ => return Err(stack.cell_error(f, ErrorKind::Internal)),
    };
    let tau = match &stack.elems[f + 1].value {
        Value::Type(ty) => *ty,
        _ => return Err(stack.cell_error(f + 1, ErrorKind::Internal)),
    };
    let t = if n == 2 {
        stack.terms.mk_uninterpreted(tau)
    } else {
        let t = get_term(stack, f + 2)?;
        if !stack.types.is_subtype(stack.terms.type_of(t), tau) {
            return Err(stack.cell_error(f + 2, ErrorKind::TypeErrorInDefinition));
        }
        t
    };
    stack.terms.set_name(&name, t);
    stack.pop_frame();
    stack.no_result();
    Ok(())
}

// ----------------------------------------------------------------------
// Bindings: BIND, DECLARE_VAR, DECLARE_TYPE_VAR, LET
// ----------------------------------------------------------------------

fn check_bind(stack: &mut TermStack, f: usize, n: u32) -> StackResult<()> {
    check_op(stack, Opcode::BIND)?;
    check_size(stack, n == 2)?;
    check_tag(stack, f, Tag::Symbol)
}

fn eval_bind(stack: &mut TermStack, f: usize, _n: u32) -> StackResult<()> {
    let name = match &stack.elems[f].value {
        Value::Symbol(s) => s.clone(),
        _ => return Err(stack.cell_error(f, ErrorKind::Internal)),
    };
    let t = get_term(stack, f + 1)?;
    stack.terms.set_name(&name, t);
    stack.pop_frame();
    stack.set_binding_result(name, t);
    Ok(())
}

fn check_declare_var(stack: &mut TermStack, f: usize, n: u32) -> StackResult<()> {
    check_op(stack, Opcode::DECLARE_VAR)?;
    check_size(stack, n == 2)?;
    check_tag(stack, f, Tag::Symbol)?;
    check_tag(stack, f + 1, Tag::Type)
}

fn eval_declare_var(stack: &mut TermStack, f: usize, _n: u32) -> StackResult<()> {
    let name = match &stack.elems[f].value {
        Value::Symbol(s) => s.clone(),
        _ => return Err(stack.cell_error(f, ErrorKind::Internal)),
    };
    let tau = match &stack.elems[f + 1].value {
        Value::Type(ty) => *ty,
        _ => return Err(stack.cell_error(f + 1, ErrorKind::Internal)),
    };
    let v = stack.terms.mk_variable(tau);
    stack.terms.set_name(&name, v);
    stack.pop_frame();
    stack.set_binding_result(name, v);
    Ok(())
}

fn check_declare_type_var(stack: &mut TermStack, f: usize, n: u32) -> StackResult<()> {
    check_op(stack, Opcode::DECLARE_TYPE_VAR)?;
    check_size(stack, n == 1)?;
    check_tag(stack, f, Tag::Symbol)
}

fn eval_declare_type_var(stack: &mut TermStack, f: usize, _n: u32) -> StackResult<()> {
    let name = match &stack.elems[f].value {
        Value::Symbol(s) => s.clone(),
        _ => return Err(stack.cell_error(f, ErrorKind::Internal)),
    };
    let index = stack.next_type_var();
    let tv = stack.types.mk_type_var(index);
    stack.types.set_name(&name, tv);
    stack.pop_frame();
    stack.set_type_binding_result(name, tv);
    Ok(())
}

fn check_let(stack: &mut TermStack, f: usize, n: u32) -> StackResult<()> {
    check_op(stack, Opcode::LET)?;
    check_size(stack, n >= 2)?;
    check_all_tags(stack, f, f + (n as usize - 1), Tag::TermBinding)
}

fn eval_let(stack: &mut TermStack, f: usize, n: u32) -> StackResult<()> {
    let last = f + n as usize - 1;
    // the body may still be an unresolved symbol
    if stack.elems[last].value.tag() == Tag::Symbol {
        let t = get_term(stack, last)?;
        stack.elems[last].value = Value::Term(t);
    }
    stack.copy_result_and_pop_frame(last);
    Ok(())
}

// ----------------------------------------------------------------------
// Type constructors
// ----------------------------------------------------------------------

fn check_mk_bv_type(stack: &mut TermStack, f: usize, n: u32) -> StackResult<()> {
    check_op(stack, Opcode::MK_BV_TYPE)?;
    check_size(stack, n == 1)?;
    check_tag(stack, f, Tag::Rational)
}

fn eval_mk_bv_type(stack: &mut TermStack, f: usize, _n: u32) -> StackResult<()> {
    let size = get_integer(stack, f)?;
    if size <= 0 {
        return Err(stack.cell_error(f, ErrorKind::NonPositiveBvSize));
    }
    let tau = stack
        .types
        .mk_bitvec(size as u32)
        .map_err(|e| external_error(stack, &e))?;
    stack.pop_frame();
    stack.set_type_result(tau);
    Ok(())
}

fn check_mk_scalar_type(stack: &mut TermStack, f: usize, n: u32) -> StackResult<()> {
    check_op(stack, Opcode::MK_SCALAR_TYPE)?;
    check_size(stack, n >= 1)?;
    check_all_tags(stack, f, f + n as usize, Tag::Symbol)?;
    check_distinct_scalar_names(stack, f, n as usize)
}

fn eval_mk_scalar_type(stack: &mut TermStack, f: usize, n: u32) -> StackResult<()> {
    let tau = stack.types.mk_scalar(n);
    for i in 0..n {
        let name = match &stack.elems[f + i as usize].value {
            Value::Symbol(s) => s.clone(),
            _ => return Err(stack.cell_error(f + i as usize, ErrorKind::Internal)),
        };
        let elem = stack
            .terms
            .mk_scalar_const(&stack.types, tau, i)
            .map_err(|e| external_error(stack, &e))?;
        stack.terms.set_name(&name, elem);
    }
    stack.pop_frame();
    stack.set_type_result(tau);
    Ok(())
}

fn check_mk_tuple_type(stack: &mut TermStack, f: usize, n: u32) -> StackResult<()> {
    check_op(stack, Opcode::MK_TUPLE_TYPE)?;
    check_size(stack, n >= 1)?;
    check_all_tags(stack, f, f + n as usize, Tag::Type)
}

fn eval_mk_tuple_type(stack: &mut TermStack, f: usize, n: u32) -> StackResult<()> {
    let mut components = Vec::with_capacity(n as usize);
    for i in 0..n as usize {
        if let Value::Type(ty) = &stack.elems[f + i].value {
            components.push(*ty);
        }
    }
    let tau = stack
        .types
        .mk_tuple(components)
        .map_err(|e| external_error(stack, &e))?;
    stack.pop_frame();
    stack.set_type_result(tau);
    Ok(())
}

fn check_mk_fun_type(stack: &mut TermStack, f: usize, n: u32) -> StackResult<()> {
    check_op(stack, Opcode::MK_FUN_TYPE)?;
    check_size(stack, n >= 2)?;
    check_all_tags(stack, f, f + n as usize, Tag::Type)
}

fn eval_mk_fun_type(stack: &mut TermStack, f: usize, n: u32) -> StackResult<()> {
    let mut domain = Vec::with_capacity(n as usize - 1);
    for i in 0..n as usize - 1 {
        if let Value::Type(ty) = &stack.elems[f + i].value {
            domain.push(*ty);
        }
    }
    let range = match &stack.elems[f + n as usize - 1].value {
        Value::Type(ty) => *ty,
        _ => return Err(stack.cell_error(f + n as usize - 1, ErrorKind::Internal)),
    };
    let tau = stack
        .types
        .mk_fun(domain, range)
        .map_err(|e| external_error(stack, &e))?;
    stack.pop_frame();
    stack.set_type_result(tau);
    Ok(())
}

fn check_mk_app_type(stack: &mut TermStack, f: usize, n: u32) -> StackResult<()> {
    check_op(stack, Opcode::MK_APP_TYPE)?;
    check_size(stack, n >= 2)?;
    check_tag(stack, f, Tag::Macro)?;
    check_all_tags(stack, f + 1, f + n as usize, Tag::Type)
}

fn eval_mk_app_type(stack: &mut TermStack, f: usize, n: u32) -> StackResult<()> {
    let mac = match &stack.elems[f].value {
        Value::Macro(m) => *m,
        _ => return Err(stack.cell_error(f, ErrorKind::Internal)),
    };
    let mut args = Vec::with_capacity(n as usize - 1);
    for i in 1..n as usize {
        if let Value::Type(ty) = &stack.elems[f + i].value {
            args.push(*ty);
        }
    }
    let tau = stack
        .types
        .mk_instance(mac, args)
        .map_err(|e| external_error(stack, &e))?;
    stack.pop_frame();
    stack.set_type_result(tau);
    Ok(())
}

// ----------------------------------------------------------------------
// Term constructors
// ----------------------------------------------------------------------

fn check_mk_apply(stack: &mut TermStack, _f: usize, n: u32) -> StackResult<()> {
    check_op(stack, Opcode::MK_APPLY)?;
    check_size(stack, n >= 2)
}

fn eval_mk_apply(stack: &mut TermStack, f: usize, n: u32) -> StackResult<()> {
    let fun = get_term(stack, f)?;
    let args = get_term_args(stack, f + 1, n - 1)?;
    let t = stack.terms.mk_apply(&stack.types, fun, args);
    finish_term(stack, t)
}

fn check_mk_ite(stack: &mut TermStack, _f: usize, n: u32) -> StackResult<()> {
    check_op(stack, Opcode::MK_ITE)?;
    check_size(stack, n == 3)
}

fn eval_mk_ite(stack: &mut TermStack, f: usize, _n: u32) -> StackResult<()> {
    let cond = get_term(stack, f)?;
    let left = get_term(stack, f + 1)?;
    let right = get_term(stack, f + 2)?;
    let t = stack.terms.mk_ite(&mut stack.types, cond, left, right);
    finish_term(stack, t)
}

fn check_mk_eq(stack: &mut TermStack, _f: usize, n: u32) -> StackResult<()> {
    check_op(stack, Opcode::MK_EQ)?;
    check_size(stack, n == 2)
}

fn eval_mk_eq(stack: &mut TermStack, f: usize, _n: u32) -> StackResult<()> {
    let left = get_term(stack, f)?;
    let right = get_term(stack, f + 1)?;
    let t = stack.terms.mk_eq(&mut stack.types, left, right);
    finish_term(stack, t)
}

fn check_mk_diseq(stack: &mut TermStack, _f: usize, n: u32) -> StackResult<()> {
    check_op(stack, Opcode::MK_DISEQ)?;
    check_size(stack, n == 2)
}

fn eval_mk_diseq(stack: &mut TermStack, f: usize, _n: u32) -> StackResult<()> {
    let left = get_term(stack, f)?;
    let right = get_term(stack, f + 1)?;
    let t = stack.terms.mk_neq(&mut stack.types, left, right);
    finish_term(stack, t)
}

fn check_mk_distinct(stack: &mut TermStack, _f: usize, n: u32) -> StackResult<()> {
    check_op(stack, Opcode::MK_DISTINCT)?;
    check_size(stack, n >= 2)
}

fn eval_mk_distinct(stack: &mut TermStack, f: usize, n: u32) -> StackResult<()> {
    let args = get_term_args(stack, f, n)?;
    let t = stack.terms.mk_distinct(&mut stack.types, args);
    finish_term(stack, t)
}

fn check_mk_not(stack: &mut TermStack, _f: usize, n: u32) -> StackResult<()> {
    check_op(stack, Opcode::MK_NOT)?;
    check_size(stack, n == 1)
}

fn eval_mk_not(stack: &mut TermStack, f: usize, _n: u32) -> StackResult<()> {
    let arg = get_term(stack, f)?;
    let t = stack.terms.mk_not(&stack.types, arg);
    finish_term(stack, t)
}

fn check_mk_or(stack: &mut TermStack, _f: usize, n: u32) -> StackResult<()> {
    check_op(stack, Opcode::MK_OR)?;
    check_size(stack, n >= 1)
}

fn eval_mk_or(stack: &mut TermStack, f: usize, n: u32) -> StackResult<()> {
    let args = get_term_args(stack, f, n)?;
    let t = stack.terms.mk_or(&stack.types, args);
    finish_term(stack, t)
}

fn check_mk_and(stack: &mut TermStack, _f: usize, n: u32) -> StackResult<()> {
    check_op(stack, Opcode::MK_AND)?;
    check_size(stack, n >= 1)
}

fn eval_mk_and(stack: &mut TermStack, f: usize, n: u32) -> StackResult<()> {
    let args = get_term_args(stack, f, n)?;
    let t = stack.terms.mk_and(&stack.types, args);
    finish_term(stack, t)
}

fn check_mk_xor(stack: &mut TermStack, _f: usize, n: u32) -> StackResult<()> {
    check_op(stack, Opcode::MK_XOR)?;
    check_size(stack, n >= 1)
}

fn eval_mk_xor(stack: &mut TermStack, f: usize, n: u32) -> StackResult<()> {
    let args = get_term_args(stack, f, n)?;
    let t = stack.terms.mk_xor(&stack.types, args);
    finish_term(stack, t)
}

fn check_mk_iff(stack: &mut TermStack, _f: usize, n: u32) -> StackResult<()> {
    check_op(stack, Opcode::MK_IFF)?;
    check_size(stack, n >= 1)
}

fn eval_mk_iff(stack: &mut TermStack, f: usize, n: u32) -> StackResult<()> {
    let mut t = get_term(stack, f)?;
    for i in 1..n as usize {
        let next = get_term(stack, f + i)?;
        t = stack
            .terms
            .mk_iff(&stack.types, t, next)
            .map_err(|e| external_error(stack, &e))?;
    }
    stack.pop_frame();
    stack.set_term_result(t);
    Ok(())
}

fn check_mk_implies(stack: &mut TermStack, _f: usize, n: u32) -> StackResult<()> {
    check_op(stack, Opcode::MK_IMPLIES)?;
    check_size(stack, n == 2)
}

fn eval_mk_implies(stack: &mut TermStack, f: usize, _n: u32) -> StackResult<()> {
    let left = get_term(stack, f)?;
    let right = get_term(stack, f + 1)?;
    let t = stack.terms.mk_implies(&stack.types, left, right);
    finish_term(stack, t)
}

fn check_mk_tuple(stack: &mut TermStack, _f: usize, n: u32) -> StackResult<()> {
    check_op(stack, Opcode::MK_TUPLE)?;
    check_size(stack, n >= 1)
}

fn eval_mk_tuple(stack: &mut TermStack, f: usize, n: u32) -> StackResult<()> {
    let args = get_term_args(stack, f, n)?;
    let t = stack.terms.mk_tuple(&mut stack.types, args);
    finish_term(stack, t)
}

fn check_mk_select(stack: &mut TermStack, f: usize, n: u32) -> StackResult<()> {
    check_op(stack, Opcode::MK_SELECT)?;
    check_size(stack, n == 2)?;
    check_tag(stack, f + 1, Tag::Rational)
}

fn eval_mk_select(stack: &mut TermStack, f: usize, _n: u32) -> StackResult<()> {
    let tuple = get_term(stack, f)?;
    let idx = get_integer(stack, f + 1)?;
    let index = u32::try_from(idx)
        .map_err(|_| stack.cell_error(f + 1, ErrorKind::External))?;
    let t = stack.terms.mk_select(&stack.types, tuple, index);
    finish_term(stack, t)
}

fn check_mk_tuple_update(stack: &mut TermStack, f: usize, n: u32) -> StackResult<()> {
    check_op(stack, Opcode::MK_TUPLE_UPDATE)?;
    check_size(stack, n == 3)?;
    check_tag(stack, f + 1, Tag::Rational)
}

fn eval_mk_tuple_update(stack: &mut TermStack, f: usize, _n: u32) -> StackResult<()> {
    let tuple = get_term(stack, f)?;
    let idx = get_integer(stack, f + 1)?;
    let index = u32::try_from(idx)
        .map_err(|_| stack.cell_error(f + 1, ErrorKind::External))?;
    let value = get_term(stack, f + 2)?;
    let t = stack.terms.mk_tuple_update(&stack.types, tuple, index, value);
    finish_term(stack, t)
}

fn check_mk_update(stack: &mut TermStack, _f: usize, n: u32) -> StackResult<()> {
    check_op(stack, Opcode::MK_UPDATE)?;
    check_size(stack, n >= 3)
}

fn eval_mk_update(stack: &mut TermStack, f: usize, n: u32) -> StackResult<()> {
    let fun = get_term(stack, f)?;
    let args = get_term_args(stack, f + 1, n - 2)?;
    let value = get_term(stack, f + n as usize - 1)?;
    let t = stack.terms.mk_update(&stack.types, fun, args, value);
    finish_term(stack, t)
}

fn binding_terms(stack: &TermStack, f: usize, count: usize) -> Vec<TermId> {
    (0..count)
        .filter_map(|i| match &stack.elems[f + i].value {
            Value::TermBinding { term, .. } => Some(*term),
            _ => None,
        })
        .collect()
}

fn check_quantifier(stack: &mut TermStack, op: Opcode, f: usize, n: u32) -> StackResult<()> {
    check_op(stack, op)?;
    check_size(stack, n >= 2)?;
    check_all_tags(stack, f, f + (n as usize - 1), Tag::TermBinding)?;
    check_distinct_binding_names(stack, f, n as usize - 1)
}

fn check_mk_forall(stack: &mut TermStack, f: usize, n: u32) -> StackResult<()> {
    check_quantifier(stack, Opcode::MK_FORALL, f, n)
}

fn eval_mk_forall(stack: &mut TermStack, f: usize, n: u32) -> StackResult<()> {
    let vars = binding_terms(stack, f, n as usize - 1);
    let body = get_term(stack, f + n as usize - 1)?;
    let t = stack.terms.mk_forall(&stack.types, vars, body);
    finish_term(stack, t)
}

fn check_mk_exists(stack: &mut TermStack, f: usize, n: u32) -> StackResult<()> {
    check_quantifier(stack, Opcode::MK_EXISTS, f, n)
}

fn eval_mk_exists(stack: &mut TermStack, f: usize, n: u32) -> StackResult<()> {
    let vars = binding_terms(stack, f, n as usize - 1);
    let body = get_term(stack, f + n as usize - 1)?;
    let t = stack.terms.mk_exists(&stack.types, vars, body);
    finish_term(stack, t)
}

fn check_mk_lambda(stack: &mut TermStack, f: usize, n: u32) -> StackResult<()> {
    check_quantifier(stack, Opcode::MK_LAMBDA, f, n)
}

fn eval_mk_lambda(stack: &mut TermStack, f: usize, n: u32) -> StackResult<()> {
    let vars = binding_terms(stack, f, n as usize - 1);
    let body = get_term(stack, f + n as usize - 1)?;
    let t = stack.terms.mk_lambda(&mut stack.types, vars, body);
    finish_term(stack, t)
}

// ----------------------------------------------------------------------
// Arithmetic
// ----------------------------------------------------------------------

fn check_mk_add(stack: &mut TermStack, _f: usize, n: u32) -> StackResult<()> {
    check_op(stack, Opcode::MK_ADD)?;
    check_size(stack, n >= 1)
}

fn eval_mk_add(stack: &mut TermStack, f: usize, n: u32) -> StackResult<()> {
    let mut b = stack.pool.acquire_rat();
    for i in 0..n as usize {
        rat_add_elem(stack, &mut b, f + i)?;
    }
    stack.pop_frame();
    stack.set_rat_buffer_result(b);
    Ok(())
}

fn check_mk_sub(stack: &mut TermStack, _f: usize, n: u32) -> StackResult<()> {
    check_op(stack, Opcode::MK_SUB)?;
    check_size(stack, n >= 2)
}

fn eval_mk_sub(stack: &mut TermStack, f: usize, n: u32) -> StackResult<()> {
    let mut b = stack.pool.acquire_rat();
    rat_add_elem(stack, &mut b, f)?;
    for i in 1..n as usize {
        rat_sub_elem(stack, &mut b, f + i)?;
    }
    stack.pop_frame();
    stack.set_rat_buffer_result(b);
    Ok(())
}

fn check_mk_neg(stack: &mut TermStack, _f: usize, n: u32) -> StackResult<()> {
    check_op(stack, Opcode::MK_NEG)?;
    check_size(stack, n == 1)
}

fn eval_mk_neg(stack: &mut TermStack, f: usize, _n: u32) -> StackResult<()> {
    let mut b = stack.pool.acquire_rat();
    rat_sub_elem(stack, &mut b, f)?;
    stack.pop_frame();
    stack.set_rat_buffer_result(b);
    Ok(())
}

fn check_mk_mul(stack: &mut TermStack, _f: usize, n: u32) -> StackResult<()> {
    check_op(stack, Opcode::MK_MUL)?;
    check_size(stack, n >= 1)
}

fn eval_mk_mul(stack: &mut TermStack, f: usize, n: u32) -> StackResult<()> {
    let mut b = stack.pool.acquire_rat();
    rat_add_elem(stack, &mut b, f)?;
    for i in 1..n as usize {
        rat_mul_elem(stack, &mut b, f + i)?;
    }
    stack.pop_frame();
    stack.set_rat_buffer_result(b);
    Ok(())
}

fn check_mk_division(stack: &mut TermStack, _f: usize, n: u32) -> StackResult<()> {
    check_op(stack, Opcode::MK_DIVISION)?;
    check_size(stack, n == 2)
}

fn eval_mk_division(stack: &mut TermStack, f: usize, _n: u32) -> StackResult<()> {
    let divisor = match rational_of_elem(stack, f + 1) {
        Some(q) => q,
        None => return Err(stack.cell_error(f + 1, ErrorKind::NonConstantDivisor)),
    };
    if divisor.is_zero() {
        return Err(stack.cell_error(f + 1, ErrorKind::DivideByZero));
    }
    let mut b = stack.pool.acquire_rat();
    rat_add_elem(stack, &mut b, f)?;
    b.mul_const(&divisor.recip());
    stack.pop_frame();
    stack.set_rat_buffer_result(b);
    Ok(())
}

fn check_mk_pow(stack: &mut TermStack, f: usize, n: u32) -> StackResult<()> {
    check_op(stack, Opcode::MK_POW)?;
    check_size(stack, n == 2)?;
    check_tag(stack, f + 1, Tag::Rational)
}

fn eval_mk_pow(stack: &mut TermStack, f: usize, _n: u32) -> StackResult<()> {
    let exponent = get_integer(stack, f + 1)?;
    if exponent < 0 {
        return Err(stack.cell_error(f + 1, ErrorKind::NegativeExponent));
    }
    let base = get_term(stack, f)?;
    let t = stack.terms.mk_arith_pow(&stack.types, base, exponent as u32);
    finish_term(stack, t)
}

type AtomFn = fn(&mut TermStore, &TypeStore, TermId, TermId) -> CoreResult<TermId>;

fn eval_binary_atom(stack: &mut TermStack, f: usize, mk: AtomFn) -> StackResult<()> {
    let left = get_term(stack, f)?;
    let right = get_term(stack, f + 1)?;
    let t = mk(&mut stack.terms, &stack.types, left, right);
    finish_term(stack, t)
}

fn check_mk_ge(stack: &mut TermStack, _f: usize, n: u32) -> StackResult<()> {
    check_op(stack, Opcode::MK_GE)?;
    check_size(stack, n == 2)
}

fn eval_mk_ge(stack: &mut TermStack, f: usize, _n: u32) -> StackResult<()> {
    eval_binary_atom(stack, f, TermStore::mk_arith_ge)
}

fn check_mk_gt(stack: &mut TermStack, _f: usize, n: u32) -> StackResult<()> {
    check_op(stack, Opcode::MK_GT)?;
    check_size(stack, n == 2)
}

fn eval_mk_gt(stack: &mut TermStack, f: usize, _n: u32) -> StackResult<()> {
    eval_binary_atom(stack, f, TermStore::mk_arith_gt)
}

fn check_mk_le(stack: &mut TermStack, _f: usize, n: u32) -> StackResult<()> {
    check_op(stack, Opcode::MK_LE)?;
    check_size(stack, n == 2)
}

fn eval_mk_le(stack: &mut TermStack, f: usize, _n: u32) -> StackResult<()> {
    eval_binary_atom(stack, f, TermStore::mk_arith_le)
}

fn check_mk_lt(stack: &mut TermStack, _f: usize, n: u32) -> StackResult<()> {
    check_op(stack, Opcode::MK_LT)?;
    check_size(stack, n == 2)
}

fn eval_mk_lt(stack: &mut TermStack, f: usize, _n: u32) -> StackResult<()> {
    eval_binary_atom(stack, f, TermStore::mk_arith_lt)
}

// ----------------------------------------------------------------------
// Bit-vector arithmetic
// ----------------------------------------------------------------------

/// Shared core of `MK_BV_CONST`; the SMT-LIB dialect swaps the argument
/// order, so the operand indices are explicit
pub(crate) fn mk_bv_const_core(
    stack: &mut TermStack,
    size_idx: usize,
    value_idx: usize,
) -> StackResult<()> {
    let size = get_integer(stack, size_idx)?;
    if size <= 0 {
        return Err(stack.cell_error(size_idx, ErrorKind::NonPositiveBvSize));
    }
    let width = size as u32;
    let q = match &stack.elems[value_idx].value {
        Value::Rational(q) => q.clone(),
        _ => return Err(stack.cell_error(value_idx, ErrorKind::Internal)),
    };
    if !q.is_integer() || q.is_negative() {
        return Err(stack.cell_error(value_idx, ErrorKind::InvalidBvConstant));
    }
    let value = q
        .to_integer()
        .to_biguint()
        .ok_or_else(|| stack.cell_error(value_idx, ErrorKind::InvalidBvConstant))?;
    let c = BvConstant::new(width, value)
        .map_err(|e| external_error(stack, &e))?;
    stack.pop_frame();
    set_const_result(stack, c);
    Ok(())
}

fn check_mk_bv_const(stack: &mut TermStack, f: usize, n: u32) -> StackResult<()> {
    check_op(stack, Opcode::MK_BV_CONST)?;
    check_size(stack, n == 2)?;
    check_tag(stack, f, Tag::Rational)?;
    check_tag(stack, f + 1, Tag::Rational)
}

fn eval_mk_bv_const(stack: &mut TermStack, f: usize, _n: u32) -> StackResult<()> {
    mk_bv_const_core(stack, f, f + 1)
}

fn check_mk_bv_add(stack: &mut TermStack, _f: usize, n: u32) -> StackResult<()> {
    check_op(stack, Opcode::MK_BV_ADD)?;
    check_size(stack, n >= 1)
}

fn eval_mk_bv_add(stack: &mut TermStack, f: usize, n: u32) -> StackResult<()> {
    let width = elem_bitsize(stack, f)?;
    if width <= 64 {
        let mut b = stack.pool.acquire_bv64(width);
        for i in 0..n as usize {
            bva64_add_elem(stack, &mut b, f + i)?;
        }
        stack.pop_frame();
        stack.set_bv64_buffer_result(b);
    } else {
        let mut b = stack.pool.acquire_bv(width);
        for i in 0..n as usize {
            bva_add_elem(stack, &mut b, f + i)?;
        }
        stack.pop_frame();
        stack.set_bv_buffer_result(b);
    }
    Ok(())
}

fn check_mk_bv_sub(stack: &mut TermStack, _f: usize, n: u32) -> StackResult<()> {
    check_op(stack, Opcode::MK_BV_SUB)?;
    check_size(stack, n >= 2)
}

fn eval_mk_bv_sub(stack: &mut TermStack, f: usize, n: u32) -> StackResult<()> {
    let width = elem_bitsize(stack, f)?;
    if width <= 64 {
        let mut b = stack.pool.acquire_bv64(width);
        bva64_add_elem(stack, &mut b, f)?;
        for i in 1..n as usize {
            bva64_sub_elem(stack, &mut b, f + i)?;
        }
        stack.pop_frame();
        stack.set_bv64_buffer_result(b);
    } else {
        let mut b = stack.pool.acquire_bv(width);
        bva_add_elem(stack, &mut b, f)?;
        for i in 1..n as usize {
            bva_sub_elem(stack, &mut b, f + i)?;
        }
        stack.pop_frame();
        stack.set_bv_buffer_result(b);
    }
    Ok(())
}

fn check_mk_bv_mul(stack: &mut TermStack, _f: usize, n: u32) -> StackResult<()> {
    check_op(stack, Opcode::MK_BV_MUL)?;
    check_size(stack, n >= 1)
}

fn eval_mk_bv_mul(stack: &mut TermStack, f: usize, n: u32) -> StackResult<()> {
    // all-constant products stay constant cells
    if let Some(c) = fold_all_const(stack, f, n, BvConstant::mul)? {
        stack.pop_frame();
        set_const_result(stack, c);
        return Ok(());
    }
    let width = elem_bitsize(stack, f)?;
    if width <= 64 {
        let mut b = stack.pool.acquire_bv64(width);
        bva64_add_elem(stack, &mut b, f)?;
        for i in 1..n as usize {
            bva64_mul_elem(stack, &mut b, f + i)?;
        }
        stack.pop_frame();
        stack.set_bv64_buffer_result(b);
    } else {
        let mut b = stack.pool.acquire_bv(width);
        bva_add_elem(stack, &mut b, f)?;
        for i in 1..n as usize {
            bva_mul_elem(stack, &mut b, f + i)?;
        }
        stack.pop_frame();
        stack.set_bv_buffer_result(b);
    }
    Ok(())
}

fn check_mk_bv_neg(stack: &mut TermStack, _f: usize, n: u32) -> StackResult<()> {
    check_op(stack, Opcode::MK_BV_NEG)?;
    check_size(stack, n == 1)
}

/// Negate the cell at `idx` in place, staying in its carrier when it is
/// a constant or a polynomial buffer
fn bvneg_elem(stack: &mut TermStack, idx: usize) -> StackResult<()> {
    match &mut stack.elems[idx].value {
        Value::Bv64 { width, value } => {
            *value = normalize64(value.wrapping_neg(), *width);
            Ok(())
        }
        Value::Bv(c) => {
            *c = c.neg();
            Ok(())
        }
        Value::Bv64Buffer(b) => {
            b.negate();
            Ok(())
        }
        Value::BvBuffer(b) => {
            b.negate();
            Ok(())
        }
        _ => {
            let width = elem_bitsize(stack, idx)?;
            if width <= 64 {
                let mut b = stack.pool.acquire_bv64(width);
                bva64_sub_elem(stack, &mut b, idx)?;
                let old = std::mem::replace(&mut stack.elems[idx].value, Value::Bv64Buffer(b));
                stack.free_value(old);
            } else {
                let mut b = stack.pool.acquire_bv(width);
                bva_sub_elem(stack, &mut b, idx)?;
                let old = std::mem::replace(&mut stack.elems[idx].value, Value::BvBuffer(b));
                stack.free_value(old);
            }
            Ok(())
        }
    }
}

fn eval_mk_bv_neg(stack: &mut TermStack, f: usize, _n: u32) -> StackResult<()> {
    bvneg_elem(stack, f)?;
    stack.copy_result_and_pop_frame(f);
    Ok(())
}

fn check_mk_bv_pow(stack: &mut TermStack, f: usize, n: u32) -> StackResult<()> {
    check_op(stack, Opcode::MK_BV_POW)?;
    check_size(stack, n == 2)?;
    check_tag(stack, f + 1, Tag::Rational)
}

fn eval_mk_bv_pow(stack: &mut TermStack, f: usize, _n: u32) -> StackResult<()> {
    let exponent = get_integer(stack, f + 1)?;
    if exponent < 0 {
        return Err(stack.cell_error(f + 1, ErrorKind::NegativeExponent));
    }
    if let Some(c) = bvconst_of_elem(stack, f) {
        stack.pop_frame();
        set_const_result(stack, c.pow(exponent as u32));
        return Ok(());
    }
    let base = get_term(stack, f)?;
    let t = stack.terms.mk_bv_pow(&mut stack.types, base, exponent as u32);
    finish_term(stack, t)
}

type BvTermFn = fn(&mut TermStore, &mut TypeStore, TermId, TermId) -> CoreResult<TermId>;

fn eval_bv_binary_term(stack: &mut TermStack, f: usize, mk: BvTermFn) -> StackResult<()> {
    let left = get_term(stack, f)?;
    let right = get_term(stack, f + 1)?;
    let t = mk(&mut stack.terms, &mut stack.types, left, right);
    finish_term(stack, t)
}

fn check_mk_bv_div(stack: &mut TermStack, _f: usize, n: u32) -> StackResult<()> {
    check_op(stack, Opcode::MK_BV_DIV)?;
    check_size(stack, n == 2)
}

fn eval_mk_bv_div(stack: &mut TermStack, f: usize, _n: u32) -> StackResult<()> {
    eval_bv_binary_term(stack, f, TermStore::mk_bv_div)
}

fn check_mk_bv_rem(stack: &mut TermStack, _f: usize, n: u32) -> StackResult<()> {
    check_op(stack, Opcode::MK_BV_REM)?;
    check_size(stack, n == 2)
}

fn eval_mk_bv_rem(stack: &mut TermStack, f: usize, _n: u32) -> StackResult<()> {
    eval_bv_binary_term(stack, f, TermStore::mk_bv_rem)
}

fn check_mk_bv_sdiv(stack: &mut TermStack, _f: usize, n: u32) -> StackResult<()> {
    check_op(stack, Opcode::MK_BV_SDIV)?;
    check_size(stack, n == 2)
}

fn eval_mk_bv_sdiv(stack: &mut TermStack, f: usize, _n: u32) -> StackResult<()> {
    eval_bv_binary_term(stack, f, TermStore::mk_bv_sdiv)
}

fn check_mk_bv_srem(stack: &mut TermStack, _f: usize, n: u32) -> StackResult<()> {
    check_op(stack, Opcode::MK_BV_SREM)?;
    check_size(stack, n == 2)
}

fn eval_mk_bv_srem(stack: &mut TermStack, f: usize, _n: u32) -> StackResult<()> {
    eval_bv_binary_term(stack, f, TermStore::mk_bv_srem)
}

fn check_mk_bv_smod(stack: &mut TermStack, _f: usize, n: u32) -> StackResult<()> {
    check_op(stack, Opcode::MK_BV_SMOD)?;
    check_size(stack, n == 2)
}

fn eval_mk_bv_smod(stack: &mut TermStack, f: usize, _n: u32) -> StackResult<()> {
    eval_bv_binary_term(stack, f, TermStore::mk_bv_smod)
}

// ----------------------------------------------------------------------
// Bit-vector logic
// ----------------------------------------------------------------------

fn check_mk_bv_not(stack: &mut TermStack, _f: usize, n: u32) -> StackResult<()> {
    check_op(stack, Opcode::MK_BV_NOT)?;
    check_size(stack, n == 1)
}

fn eval_mk_bv_not(stack: &mut TermStack, f: usize, _n: u32) -> StackResult<()> {
    let mut b = stack.pool.acquire_logic();
    bvl_set_elem(stack, &mut b, f)?;
    b.not(&mut stack.terms, &stack.types)
        .map_err(|e| external_error(stack, &e))?;
    stack.pop_frame();
    stack.set_logic_buffer_result(b);
    Ok(())
}

#[derive(Clone, Copy)]
enum BitwiseOp {
    And,
    Or,
    Xor,
}

fn eval_bitwise(
    stack: &mut TermStack,
    f: usize,
    n: u32,
    op: BitwiseOp,
    negate: bool,
) -> StackResult<()> {
    let mut b = stack.pool.acquire_logic();
    bvl_set_elem(stack, &mut b, f)?;
    for i in 1..n as usize {
        let bits = elem_bits(stack, f + i, Some(b.width()))?;
        let r = match op {
            BitwiseOp::And => b.and_bits(&mut stack.terms, &stack.types, &bits),
            BitwiseOp::Or => b.or_bits(&mut stack.terms, &stack.types, &bits),
            BitwiseOp::Xor => b.xor_bits(&mut stack.terms, &stack.types, &bits),
        };
        r.map_err(|e| external_error(stack, &e))?;
    }
    if negate {
        b.not(&mut stack.terms, &stack.types)
            .map_err(|e| external_error(stack, &e))?;
    }
    stack.pop_frame();
    stack.set_logic_buffer_result(b);
    Ok(())
}

fn check_mk_bv_and(stack: &mut TermStack, _f: usize, n: u32) -> StackResult<()> {
    check_op(stack, Opcode::MK_BV_AND)?;
    check_size(stack, n >= 1)
}

fn eval_mk_bv_and(stack: &mut TermStack, f: usize, n: u32) -> StackResult<()> {
    eval_bitwise(stack, f, n, BitwiseOp::And, false)
}

fn check_mk_bv_or(stack: &mut TermStack, _f: usize, n: u32) -> StackResult<()> {
    check_op(stack, Opcode::MK_BV_OR)?;
    check_size(stack, n >= 1)
}

fn eval_mk_bv_or(stack: &mut TermStack, f: usize, n: u32) -> StackResult<()> {
    eval_bitwise(stack, f, n, BitwiseOp::Or, false)
}

fn check_mk_bv_xor(stack: &mut TermStack, _f: usize, n: u32) -> StackResult<()> {
    check_op(stack, Opcode::MK_BV_XOR)?;
    check_size(stack, n >= 1)
}

fn eval_mk_bv_xor(stack: &mut TermStack, f: usize, n: u32) -> StackResult<()> {
    eval_bitwise(stack, f, n, BitwiseOp::Xor, false)
}

fn check_mk_bv_nand(stack: &mut TermStack, _f: usize, n: u32) -> StackResult<()> {
    check_op(stack, Opcode::MK_BV_NAND)?;
    check_size(stack, n >= 1)
}

fn eval_mk_bv_nand(stack: &mut TermStack, f: usize, n: u32) -> StackResult<()> {
    eval_bitwise(stack, f, n, BitwiseOp::And, true)
}

fn check_mk_bv_nor(stack: &mut TermStack, _f: usize, n: u32) -> StackResult<()> {
    check_op(stack, Opcode::MK_BV_NOR)?;
    check_size(stack, n >= 1)
}

fn eval_mk_bv_nor(stack: &mut TermStack, f: usize, n: u32) -> StackResult<()> {
    eval_bitwise(stack, f, n, BitwiseOp::Or, true)
}

fn check_mk_bv_xnor(stack: &mut TermStack, _f: usize, n: u32) -> StackResult<()> {
    check_op(stack, Opcode::MK_BV_XNOR)?;
    check_size(stack, n >= 1)
}

fn eval_mk_bv_xnor(stack: &mut TermStack, f: usize, n: u32) -> StackResult<()> {
    eval_bitwise(stack, f, n, BitwiseOp::Xor, true)
}

#[derive(Clone, Copy)]
enum FixedShift {
    Left0,
    Left1,
    Right0,
    Right1,
    ArithRight,
}

fn eval_fixed_shift(stack: &mut TermStack, f: usize, kind: FixedShift) -> StackResult<()> {
    let k = get_integer(stack, f + 1)?;
    let mut b = stack.pool.acquire_logic();
    bvl_set_elem(stack, &mut b, f)?;
    if k < 0 || k as u32 > b.width() {
        return Err(stack.cell_error(f + 1, ErrorKind::BvLogicError));
    }
    let k = k as u32;
    let tt = stack.terms.true_term();
    let ff = stack.terms.false_term();
    match kind {
        FixedShift::Left0 => b.shift_left(k, ff),
        FixedShift::Left1 => b.shift_left(k, tt),
        FixedShift::Right0 => b.shift_right(k, ff),
        FixedShift::Right1 => b.shift_right(k, tt),
        FixedShift::ArithRight => b.ashift_right(k),
    }
    stack.pop_frame();
    stack.set_logic_buffer_result(b);
    Ok(())
}

fn check_mk_bv_shift_left0(stack: &mut TermStack, f: usize, n: u32) -> StackResult<()> {
    check_op(stack, Opcode::MK_BV_SHIFT_LEFT0)?;
    check_size(stack, n == 2)?;
    check_tag(stack, f + 1, Tag::Rational)
}

fn eval_mk_bv_shift_left0(stack: &mut TermStack, f: usize, _n: u32) -> StackResult<()> {
    eval_fixed_shift(stack, f, FixedShift::Left0)
}

fn check_mk_bv_shift_left1(stack: &mut TermStack, f: usize, n: u32) -> StackResult<()> {
    check_op(stack, Opcode::MK_BV_SHIFT_LEFT1)?;
    check_size(stack, n == 2)?;
    check_tag(stack, f + 1, Tag::Rational)
}

fn eval_mk_bv_shift_left1(stack: &mut TermStack, f: usize, _n: u32) -> StackResult<()> {
    eval_fixed_shift(stack, f, FixedShift::Left1)
}

fn check_mk_bv_shift_right0(stack: &mut TermStack, f: usize, n: u32) -> StackResult<()> {
    check_op(stack, Opcode::MK_BV_SHIFT_RIGHT0)?;
    check_size(stack, n == 2)?;
    check_tag(stack, f + 1, Tag::Rational)
}

fn eval_mk_bv_shift_right0(stack: &mut TermStack, f: usize, _n: u32) -> StackResult<()> {
    eval_fixed_shift(stack, f, FixedShift::Right0)
}

fn check_mk_bv_shift_right1(stack: &mut TermStack, f: usize, n: u32) -> StackResult<()> {
    check_op(stack, Opcode::MK_BV_SHIFT_RIGHT1)?;
    check_size(stack, n == 2)?;
    check_tag(stack, f + 1, Tag::Rational)
}

fn eval_mk_bv_shift_right1(stack: &mut TermStack, f: usize, _n: u32) -> StackResult<()> {
    eval_fixed_shift(stack, f, FixedShift::Right1)
}

fn check_mk_bv_ashift_right(stack: &mut TermStack, f: usize, n: u32) -> StackResult<()> {
    check_op(stack, Opcode::MK_BV_ASHIFT_RIGHT)?;
    check_size(stack, n == 2)?;
    check_tag(stack, f + 1, Tag::Rational)
}

fn eval_mk_bv_ashift_right(stack: &mut TermStack, f: usize, _n: u32) -> StackResult<()> {
    eval_fixed_shift(stack, f, FixedShift::ArithRight)
}

/// Shared core of the rotations; the SMT-LIB dialect swaps the argument
/// order, so the operand indices are explicit
pub(crate) fn mk_bv_rotate_core(
    stack: &mut TermStack,
    bv_idx: usize,
    amount_idx: usize,
    left: bool,
) -> StackResult<()> {
    let k = get_integer(stack, amount_idx)?;
    let mut b = stack.pool.acquire_logic();
    bvl_set_elem(stack, &mut b, bv_idx)?;
    if k < 0 || k as u32 > b.width() {
        return Err(stack.cell_error(amount_idx, ErrorKind::BvLogicError));
    }
    let k = k as u32;
    // rotating by the full width is the identity
    if k < b.width() && k > 0 {
        if left {
            b.rotate_left(k);
        } else {
            b.rotate_right(k);
        }
    }
    stack.pop_frame();
    stack.set_logic_buffer_result(b);
    Ok(())
}

fn check_mk_bv_rotate_left(stack: &mut TermStack, f: usize, n: u32) -> StackResult<()> {
    check_op(stack, Opcode::MK_BV_ROTATE_LEFT)?;
    check_size(stack, n == 2)?;
    check_tag(stack, f + 1, Tag::Rational)
}

fn eval_mk_bv_rotate_left(stack: &mut TermStack, f: usize, _n: u32) -> StackResult<()> {
    mk_bv_rotate_core(stack, f, f + 1, true)
}

fn check_mk_bv_rotate_right(stack: &mut TermStack, f: usize, n: u32) -> StackResult<()> {
    check_op(stack, Opcode::MK_BV_ROTATE_RIGHT)?;
    check_size(stack, n == 2)?;
    check_tag(stack, f + 1, Tag::Rational)
}

fn eval_mk_bv_rotate_right(stack: &mut TermStack, f: usize, _n: u32) -> StackResult<()> {
    mk_bv_rotate_core(stack, f, f + 1, false)
}

#[derive(Clone, Copy)]
enum VarShift {
    Shl,
    Lshr,
    Ashr,
}

fn eval_var_shift(stack: &mut TermStack, f: usize, kind: VarShift) -> StackResult<()> {
    if let Some(c) = bvconst_of_elem(stack, f + 1) {
        // constant shift amount: stay in the logic buffer
        let mut b = stack.pool.acquire_logic();
        bvl_set_elem(stack, &mut b, f)?;
        if c.width() != b.width() {
            return Err(stack.cell_error(f + 1, ErrorKind::IncompatibleBvSizes));
        }
        let w = b.width();
        let amount = c.value().to_u32().map_or(w, |k| k.min(w));
        let ff = stack.terms.false_term();
        match kind {
            VarShift::Shl => b.shift_left(amount, ff),
            VarShift::Lshr => b.shift_right(amount, ff),
            VarShift::Ashr => b.ashift_right(amount),
        }
        stack.pop_frame();
        stack.set_logic_buffer_result(b);
        Ok(())
    } else {
        let mk: BvTermFn = match kind {
            VarShift::Shl => TermStore::mk_bv_shl,
            VarShift::Lshr => TermStore::mk_bv_lshr,
            VarShift::Ashr => TermStore::mk_bv_ashr,
        };
        eval_bv_binary_term(stack, f, mk)
    }
}

fn check_mk_bv_shl(stack: &mut TermStack, _f: usize, n: u32) -> StackResult<()> {
    check_op(stack, Opcode::MK_BV_SHL)?;
    check_size(stack, n == 2)
}

fn eval_mk_bv_shl(stack: &mut TermStack, f: usize, _n: u32) -> StackResult<()> {
    eval_var_shift(stack, f, VarShift::Shl)
}

fn check_mk_bv_lshr(stack: &mut TermStack, _f: usize, n: u32) -> StackResult<()> {
    check_op(stack, Opcode::MK_BV_LSHR)?;
    check_size(stack, n == 2)
}

fn eval_mk_bv_lshr(stack: &mut TermStack, f: usize, _n: u32) -> StackResult<()> {
    eval_var_shift(stack, f, VarShift::Lshr)
}

fn check_mk_bv_ashr(stack: &mut TermStack, _f: usize, n: u32) -> StackResult<()> {
    check_op(stack, Opcode::MK_BV_ASHR)?;
    check_size(stack, n == 2)
}

fn eval_mk_bv_ashr(stack: &mut TermStack, f: usize, _n: u32) -> StackResult<()> {
    eval_var_shift(stack, f, VarShift::Ashr)
}

fn check_mk_bv_extract(stack: &mut TermStack, f: usize, n: u32) -> StackResult<()> {
    check_op(stack, Opcode::MK_BV_EXTRACT)?;
    check_size(stack, n == 3)?;
    check_tag(stack, f, Tag::Rational)?;
    check_tag(stack, f + 1, Tag::Rational)
}

fn eval_mk_bv_extract(stack: &mut TermStack, f: usize, _n: u32) -> StackResult<()> {
    let high = get_integer(stack, f)?;
    let low = get_integer(stack, f + 1)?;
    let size = elem_bitsize(stack, f + 2)?;
    if low < 0 || high < low || high as u32 >= size {
        return Err(stack.cell_error(f, ErrorKind::BvLogicError));
    }
    if low == 0 && high as u32 == size - 1 {
        // whole-vector extraction is the identity
        stack.copy_result_and_pop_frame(f + 2);
        return Ok(());
    }
    let mut b = stack.pool.acquire_logic();
    bvl_set_elem(stack, &mut b, f + 2)?;
    b.extract(low as u32, high as u32);
    stack.pop_frame();
    stack.set_logic_buffer_result(b);
    Ok(())
}

fn check_mk_bv_concat(stack: &mut TermStack, _f: usize, n: u32) -> StackResult<()> {
    check_op(stack, Opcode::MK_BV_CONCAT)?;
    check_size(stack, n >= 1)
}

fn eval_mk_bv_concat(stack: &mut TermStack, f: usize, n: u32) -> StackResult<()> {
    let mut b = stack.pool.acquire_logic();
    for i in 0..n as usize {
        // each later operand lands below the bits accumulated so far
        let bits = elem_bits(stack, f + i, None)?;
        if b.width() as u64 + bits.len() as u64 > u64::from(MAX_BV_WIDTH) {
            return Err(stack.cell_error(f + i, ErrorKind::BvLogicError));
        }
        b.concat_low(&bits);
    }
    stack.pop_frame();
    stack.set_logic_buffer_result(b);
    Ok(())
}

/// Shared core of `MK_BV_REPEAT`
pub(crate) fn mk_bv_repeat_core(
    stack: &mut TermStack,
    bv_idx: usize,
    count_idx: usize,
) -> StackResult<()> {
    let k = get_integer(stack, count_idx)?;
    if k <= 0 {
        return Err(stack.cell_error(count_idx, ErrorKind::BvLogicError));
    }
    let mut b = stack.pool.acquire_logic();
    bvl_set_elem(stack, &mut b, bv_idx)?;
    if u64::from(b.width()) * k as u64 > u64::from(MAX_BV_WIDTH) {
        return Err(stack.cell_error(count_idx, ErrorKind::BvLogicError));
    }
    b.repeat(k as u32);
    stack.pop_frame();
    stack.set_logic_buffer_result(b);
    Ok(())
}

fn check_mk_bv_repeat(stack: &mut TermStack, f: usize, n: u32) -> StackResult<()> {
    check_op(stack, Opcode::MK_BV_REPEAT)?;
    check_size(stack, n == 2)?;
    check_tag(stack, f + 1, Tag::Rational)
}

fn eval_mk_bv_repeat(stack: &mut TermStack, f: usize, _n: u32) -> StackResult<()> {
    mk_bv_repeat_core(stack, f, f + 1)
}

/// Shared core of sign/zero extension: `count` extra bits
pub(crate) fn mk_bv_extend_core(
    stack: &mut TermStack,
    bv_idx: usize,
    count_idx: usize,
    signed: bool,
) -> StackResult<()> {
    let k = get_integer(stack, count_idx)?;
    if k < 0 {
        return Err(stack.cell_error(count_idx, ErrorKind::BvLogicError));
    }
    let mut b = stack.pool.acquire_logic();
    bvl_set_elem(stack, &mut b, bv_idx)?;
    if u64::from(b.width()) + k as u64 > u64::from(MAX_BV_WIDTH) {
        return Err(stack.cell_error(count_idx, ErrorKind::BvLogicError));
    }
    if signed {
        b.sign_extend(k as u32);
    } else {
        let ff = stack.terms.false_term();
        b.extend_high(k as u32, ff);
    }
    stack.pop_frame();
    stack.set_logic_buffer_result(b);
    Ok(())
}

fn check_mk_bv_sign_extend(stack: &mut TermStack, f: usize, n: u32) -> StackResult<()> {
    check_op(stack, Opcode::MK_BV_SIGN_EXTEND)?;
    check_size(stack, n == 2)?;
    check_tag(stack, f + 1, Tag::Rational)
}

fn eval_mk_bv_sign_extend(stack: &mut TermStack, f: usize, _n: u32) -> StackResult<()> {
    mk_bv_extend_core(stack, f, f + 1, true)
}

fn check_mk_bv_zero_extend(stack: &mut TermStack, f: usize, n: u32) -> StackResult<()> {
    check_op(stack, Opcode::MK_BV_ZERO_EXTEND)?;
    check_size(stack, n == 2)?;
    check_tag(stack, f + 1, Tag::Rational)
}

fn eval_mk_bv_zero_extend(stack: &mut TermStack, f: usize, _n: u32) -> StackResult<()> {
    mk_bv_extend_core(stack, f, f + 1, false)
}

fn check_mk_bv_redand(stack: &mut TermStack, _f: usize, n: u32) -> StackResult<()> {
    check_op(stack, Opcode::MK_BV_REDAND)?;
    check_size(stack, n == 1)
}

fn eval_mk_bv_redand(stack: &mut TermStack, f: usize, _n: u32) -> StackResult<()> {
    let mut b = stack.pool.acquire_logic();
    bvl_set_elem(stack, &mut b, f)?;
    b.redand(&mut stack.terms, &stack.types)
        .map_err(|e| external_error(stack, &e))?;
    stack.pop_frame();
    stack.set_logic_buffer_result(b);
    Ok(())
}

fn check_mk_bv_redor(stack: &mut TermStack, _f: usize, n: u32) -> StackResult<()> {
    check_op(stack, Opcode::MK_BV_REDOR)?;
    check_size(stack, n == 1)
}

fn eval_mk_bv_redor(stack: &mut TermStack, f: usize, _n: u32) -> StackResult<()> {
    let mut b = stack.pool.acquire_logic();
    bvl_set_elem(stack, &mut b, f)?;
    b.redor(&mut stack.terms, &stack.types)
        .map_err(|e| external_error(stack, &e))?;
    stack.pop_frame();
    stack.set_logic_buffer_result(b);
    Ok(())
}

fn check_mk_bv_comp(stack: &mut TermStack, _f: usize, n: u32) -> StackResult<()> {
    check_op(stack, Opcode::MK_BV_COMP)?;
    check_size(stack, n == 2)
}

fn eval_mk_bv_comp(stack: &mut TermStack, f: usize, _n: u32) -> StackResult<()> {
    let mut b = stack.pool.acquire_logic();
    bvl_set_elem(stack, &mut b, f)?;
    let bits = elem_bits(stack, f + 1, Some(b.width()))?;
    b.comp(&mut stack.terms, &stack.types, &bits)
        .map_err(|e| external_error(stack, &e))?;
    stack.pop_frame();
    stack.set_logic_buffer_result(b);
    Ok(())
}

// ----------------------------------------------------------------------
// Bit-vector atoms
// ----------------------------------------------------------------------

fn eval_bv_atom(stack: &mut TermStack, f: usize, mk: AtomFn) -> StackResult<()> {
    let left = get_term(stack, f)?;
    let right = get_term(stack, f + 1)?;
    let t = mk(&mut stack.terms, &stack.types, left, right);
    finish_term(stack, t)
}

fn check_mk_bv_ge(stack: &mut TermStack, _f: usize, n: u32) -> StackResult<()> {
    check_op(stack, Opcode::MK_BV_GE)?;
    check_size(stack, n == 2)
}

fn eval_mk_bv_ge(stack: &mut TermStack, f: usize, _n: u32) -> StackResult<()> {
    eval_bv_atom(stack, f, TermStore::mk_bv_ge)
}

fn check_mk_bv_gt(stack: &mut TermStack, _f: usize, n: u32) -> StackResult<()> {
    check_op(stack, Opcode::MK_BV_GT)?;
    check_size(stack, n == 2)
}

fn eval_mk_bv_gt(stack: &mut TermStack, f: usize, _n: u32) -> StackResult<()> {
    eval_bv_atom(stack, f, TermStore::mk_bv_gt)
}

fn check_mk_bv_le(stack: &mut TermStack, _f: usize, n: u32) -> StackResult<()> {
    check_op(stack, Opcode::MK_BV_LE)?;
    check_size(stack, n == 2)
}

fn eval_mk_bv_le(stack: &mut TermStack, f: usize, _n: u32) -> StackResult<()> {
    eval_bv_atom(stack, f, TermStore::mk_bv_le)
}

fn check_mk_bv_lt(stack: &mut TermStack, _f: usize, n: u32) -> StackResult<()> {
    check_op(stack, Opcode::MK_BV_LT)?;
    check_size(stack, n == 2)
}

fn eval_mk_bv_lt(stack: &mut TermStack, f: usize, _n: u32) -> StackResult<()> {
    eval_bv_atom(stack, f, TermStore::mk_bv_lt)
}

fn check_mk_bv_sge(stack: &mut TermStack, _f: usize, n: u32) -> StackResult<()> {
    check_op(stack, Opcode::MK_BV_SGE)?;
    check_size(stack, n == 2)
}

fn eval_mk_bv_sge(stack: &mut TermStack, f: usize, _n: u32) -> StackResult<()> {
    eval_bv_atom(stack, f, TermStore::mk_bv_sge)
}

fn check_mk_bv_sgt(stack: &mut TermStack, _f: usize, n: u32) -> StackResult<()> {
    check_op(stack, Opcode::MK_BV_SGT)?;
    check_size(stack, n == 2)
}

fn eval_mk_bv_sgt(stack: &mut TermStack, f: usize, _n: u32) -> StackResult<()> {
    eval_bv_atom(stack, f, TermStore::mk_bv_sgt)
}

fn check_mk_bv_sle(stack: &mut TermStack, _f: usize, n: u32) -> StackResult<()> {
    check_op(stack, Opcode::MK_BV_SLE)?;
    check_size(stack, n == 2)
}

fn eval_mk_bv_sle(stack: &mut TermStack, f: usize, _n: u32) -> StackResult<()> {
    eval_bv_atom(stack, f, TermStore::mk_bv_sle)
}

fn check_mk_bv_slt(stack: &mut TermStack, _f: usize, n: u32) -> StackResult<()> {
    check_op(stack, Opcode::MK_BV_SLT)?;
    check_size(stack, n == 2)
}

fn eval_mk_bv_slt(stack: &mut TermStack, f: usize, _n: u32) -> StackResult<()> {
    eval_bv_atom(stack, f, TermStore::mk_bv_slt)
}

// ----------------------------------------------------------------------
// Result extraction
// ----------------------------------------------------------------------

fn check_build_term(stack: &mut TermStack, _f: usize, n: u32) -> StackResult<()> {
    check_op(stack, Opcode::BUILD_TERM)?;
    check_size(stack, n == 1)
}

fn eval_build_term(stack: &mut TermStack, f: usize, _n: u32) -> StackResult<()> {
    let t = get_term(stack, f)?;
    stack.store_result_term(t);
    stack.pop_frame();
    stack.no_result();
    Ok(())
}

fn check_build_type(stack: &mut TermStack, f: usize, n: u32) -> StackResult<()> {
    check_op(stack, Opcode::BUILD_TYPE)?;
    check_size(stack, n == 1)?;
    check_tag(stack, f, Tag::Type)
}

fn eval_build_type(stack: &mut TermStack, f: usize, _n: u32) -> StackResult<()> {
    let tau = match &stack.elems[f].value {
        Value::Type(ty) => *ty,
        _ => return Err(stack.cell_error(f, ErrorKind::Internal)),
    };
    stack.store_result_type(tau);
    stack.pop_frame();
    stack.no_result();
    Ok(())
}

// ----------------------------------------------------------------------
// Table installation
// ----------------------------------------------------------------------

/// Install every predefined operation into `table`
pub(crate) fn install_base_ops(table: &mut OpTable) {
    table.register(Opcode::NO_OP, false, check_no_op, eval_no_op);
    table.register(Opcode::DEFINE_TYPE, false, check_define_type, eval_define_type);
    table.register(Opcode::DEFINE_TERM, false, check_define_term, eval_define_term);
    table.register(Opcode::BIND, false, check_bind, eval_bind);
    table.register(Opcode::DECLARE_VAR, false, check_declare_var, eval_declare_var);
    table.register(
        Opcode::DECLARE_TYPE_VAR,
        false,
        check_declare_type_var,
        eval_declare_type_var,
    );
    table.register(Opcode::LET, true, check_let, eval_let);
    table.register(Opcode::MK_BV_TYPE, false, check_mk_bv_type, eval_mk_bv_type);
    table.register(
        Opcode::MK_SCALAR_TYPE,
        false,
        check_mk_scalar_type,
        eval_mk_scalar_type,
    );
    table.register(
        Opcode::MK_TUPLE_TYPE,
        false,
        check_mk_tuple_type,
        eval_mk_tuple_type,
    );
    table.register(Opcode::MK_FUN_TYPE, false, check_mk_fun_type, eval_mk_fun_type);
    table.register(Opcode::MK_APP_TYPE, false, check_mk_app_type, eval_mk_app_type);
    table.register(Opcode::MK_APPLY, false, check_mk_apply, eval_mk_apply);
    table.register(Opcode::MK_ITE, false, check_mk_ite, eval_mk_ite);
    table.register(Opcode::MK_EQ, false, check_mk_eq, eval_mk_eq);
    table.register(Opcode::MK_DISEQ, false, check_mk_diseq, eval_mk_diseq);
    table.register(Opcode::MK_DISTINCT, false, check_mk_distinct, eval_mk_distinct);
    table.register(Opcode::MK_NOT, false, check_mk_not, eval_mk_not);
    table.register(Opcode::MK_OR, true, check_mk_or, eval_mk_or);
    table.register(Opcode::MK_AND, true, check_mk_and, eval_mk_and);
    table.register(Opcode::MK_XOR, true, check_mk_xor, eval_mk_xor);
    table.register(Opcode::MK_IFF, false, check_mk_iff, eval_mk_iff);
    table.register(Opcode::MK_IMPLIES, false, check_mk_implies, eval_mk_implies);
    table.register(Opcode::MK_TUPLE, false, check_mk_tuple, eval_mk_tuple);
    table.register(Opcode::MK_SELECT, false, check_mk_select, eval_mk_select);
    table.register(
        Opcode::MK_TUPLE_UPDATE,
        false,
        check_mk_tuple_update,
        eval_mk_tuple_update,
    );
    table.register(Opcode::MK_UPDATE, false, check_mk_update, eval_mk_update);
    table.register(Opcode::MK_FORALL, false, check_mk_forall, eval_mk_forall);
    table.register(Opcode::MK_EXISTS, false, check_mk_exists, eval_mk_exists);
    table.register(Opcode::MK_LAMBDA, false, check_mk_lambda, eval_mk_lambda);
    table.register(Opcode::MK_ADD, true, check_mk_add, eval_mk_add);
    table.register(Opcode::MK_SUB, false, check_mk_sub, eval_mk_sub);
    table.register(Opcode::MK_NEG, false, check_mk_neg, eval_mk_neg);
    table.register(Opcode::MK_MUL, true, check_mk_mul, eval_mk_mul);
    table.register(Opcode::MK_DIVISION, false, check_mk_division, eval_mk_division);
    table.register(Opcode::MK_POW, false, check_mk_pow, eval_mk_pow);
    table.register(Opcode::MK_GE, false, check_mk_ge, eval_mk_ge);
    table.register(Opcode::MK_GT, false, check_mk_gt, eval_mk_gt);
    table.register(Opcode::MK_LE, false, check_mk_le, eval_mk_le);
    table.register(Opcode::MK_LT, false, check_mk_lt, eval_mk_lt);
    table.register(Opcode::MK_BV_CONST, false, check_mk_bv_const, eval_mk_bv_const);
    table.register(Opcode::MK_BV_ADD, true, check_mk_bv_add, eval_mk_bv_add);
    table.register(Opcode::MK_BV_SUB, false, check_mk_bv_sub, eval_mk_bv_sub);
    table.register(Opcode::MK_BV_MUL, true, check_mk_bv_mul, eval_mk_bv_mul);
    table.register(Opcode::MK_BV_NEG, false, check_mk_bv_neg, eval_mk_bv_neg);
    table.register(Opcode::MK_BV_POW, false, check_mk_bv_pow, eval_mk_bv_pow);
    table.register(Opcode::MK_BV_DIV, false, check_mk_bv_div, eval_mk_bv_div);
    table.register(Opcode::MK_BV_REM, false, check_mk_bv_rem, eval_mk_bv_rem);
    table.register(Opcode::MK_BV_SDIV, false, check_mk_bv_sdiv, eval_mk_bv_sdiv);
    table.register(Opcode::MK_BV_SREM, false, check_mk_bv_srem, eval_mk_bv_srem);
    table.register(Opcode::MK_BV_SMOD, false, check_mk_bv_smod, eval_mk_bv_smod);
    table.register(Opcode::MK_BV_NOT, false, check_mk_bv_not, eval_mk_bv_not);
    table.register(Opcode::MK_BV_AND, true, check_mk_bv_and, eval_mk_bv_and);
    table.register(Opcode::MK_BV_OR, true, check_mk_bv_or, eval_mk_bv_or);
    table.register(Opcode::MK_BV_XOR, true, check_mk_bv_xor, eval_mk_bv_xor);
    table.register(Opcode::MK_BV_NAND, true, check_mk_bv_nand, eval_mk_bv_nand);
    table.register(Opcode::MK_BV_NOR, true, check_mk_bv_nor, eval_mk_bv_nor);
    table.register(Opcode::MK_BV_XNOR, true, check_mk_bv_xnor, eval_mk_bv_xnor);
    table.register(
        Opcode::MK_BV_SHIFT_LEFT0,
        false,
        check_mk_bv_shift_left0,
        eval_mk_bv_shift_left0,
    );
    table.register(
        Opcode::MK_BV_SHIFT_LEFT1,
        false,
        check_mk_bv_shift_left1,
        eval_mk_bv_shift_left1,
    );
    table.register(
        Opcode::MK_BV_SHIFT_RIGHT0,
        false,
        check_mk_bv_shift_right0,
        eval_mk_bv_shift_right0,
    );
    table.register(
        Opcode::MK_BV_SHIFT_RIGHT1,
        false,
        check_mk_bv_shift_right1,
        eval_mk_bv_shift_right1,
    );
    table.register(
        Opcode::MK_BV_ASHIFT_RIGHT,
        false,
        check_mk_bv_ashift_right,
        eval_mk_bv_ashift_right,
    );
    table.register(
        Opcode::MK_BV_ROTATE_LEFT,
        false,
        check_mk_bv_rotate_left,
        eval_mk_bv_rotate_left,
    );
    table.register(
        Opcode::MK_BV_ROTATE_RIGHT,
        false,
        check_mk_bv_rotate_right,
        eval_mk_bv_rotate_right,
    );
    table.register(Opcode::MK_BV_SHL, false, check_mk_bv_shl, eval_mk_bv_shl);
    table.register(Opcode::MK_BV_LSHR, false, check_mk_bv_lshr, eval_mk_bv_lshr);
    table.register(Opcode::MK_BV_ASHR, false, check_mk_bv_ashr, eval_mk_bv_ashr);
    table.register(Opcode::MK_BV_EXTRACT, false, check_mk_bv_extract, eval_mk_bv_extract);
    table.register(Opcode::MK_BV_CONCAT, true, check_mk_bv_concat, eval_mk_bv_concat);
    table.register(Opcode::MK_BV_REPEAT, false, check_mk_bv_repeat, eval_mk_bv_repeat);
    table.register(
        Opcode::MK_BV_SIGN_EXTEND,
        false,
        check_mk_bv_sign_extend,
        eval_mk_bv_sign_extend,
    );
    table.register(
        Opcode::MK_BV_ZERO_EXTEND,
        false,
        check_mk_bv_zero_extend,
        eval_mk_bv_zero_extend,
    );
    table.register(Opcode::MK_BV_REDAND, false, check_mk_bv_redand, eval_mk_bv_redand);
    table.register(Opcode::MK_BV_REDOR, false, check_mk_bv_redor, eval_mk_bv_redor);
    table.register(Opcode::MK_BV_COMP, false, check_mk_bv_comp, eval_mk_bv_comp);
    table.register(Opcode::MK_BV_GE, false, check_mk_bv_ge, eval_mk_bv_ge);
    table.register(Opcode::MK_BV_GT, false, check_mk_bv_gt, eval_mk_bv_gt);
    table.register(Opcode::MK_BV_LE, false, check_mk_bv_le, eval_mk_bv_le);
    table.register(Opcode::MK_BV_LT, false, check_mk_bv_lt, eval_mk_bv_lt);
    table.register(Opcode::MK_BV_SGE, false, check_mk_bv_sge, eval_mk_bv_sge);
    table.register(Opcode::MK_BV_SGT, false, check_mk_bv_sgt, eval_mk_bv_sgt);
    table.register(Opcode::MK_BV_SLE, false, check_mk_bv_sle, eval_mk_bv_sle);
    table.register(Opcode::MK_BV_SLT, false, check_mk_bv_slt, eval_mk_bv_slt);
    table.register(Opcode::BUILD_TERM, false, check_build_term, eval_build_term);
    table.register(Opcode::BUILD_TYPE, false, check_build_type, eval_build_type);
}
