//! SMT-LIB dialect operations
//!
//! The SMT-LIB notation permutes the argument order of a handful of
//! bit-vector constructors and generalizes equality to n arguments.
//! [`enable_smtlib`] re-registers those operations under the same
//! opcode numbers; nothing else in the engine changes.
//!
//! | default frame                     | SMT-LIB frame                    |
//! |-----------------------------------|----------------------------------|
//! | `[mk-eq a b]`                     | `[mk-eq a .. a]` (chained)       |
//! | `[mk-bv-const size value]`        | `[mk-bv-const value size]`       |
//! | `[mk-bv-rotate-left bv k]`        | `[mk-bv-rotate-left k bv]`       |
//! | `[mk-bv-rotate-right bv k]`       | `[mk-bv-rotate-right k bv]`      |
//! | `[mk-bv-repeat bv k]`             | `[mk-bv-repeat k bv]`            |
//! | `[mk-bv-sign-extend bv k]`        | `[mk-bv-sign-extend k bv]`       |
//! | `[mk-bv-zero-extend bv k]`        | `[mk-bv-zero-extend k bv]`       |

use crate::cell::Tag;
use crate::error::StackResult;
use crate::eval::{
    check_op, check_size, check_tag, finish_term, get_term_args, mk_bv_const_core,
    mk_bv_extend_core, mk_bv_repeat_core, mk_bv_rotate_core,
};
use crate::op_table::Opcode;
use crate::stack::TermStack;

/// Replace the argument-order-sensitive operations with their SMT-LIB
/// variants
///
/// # Errors
///
/// Propagates registration failures.
pub fn enable_smtlib(stack: &mut TermStack) -> StackResult<()> {
    stack.register(Opcode::MK_EQ, false, check_smt_mk_eq, eval_smt_mk_eq)?;
    stack.register(
        Opcode::MK_BV_CONST,
        false,
        check_smt_bv_const,
        eval_smt_bv_const,
    )?;
    stack.register(
        Opcode::MK_BV_ROTATE_LEFT,
        false,
        check_smt_index_then_bv,
        eval_smt_rotate_left,
    )?;
    stack.register(
        Opcode::MK_BV_ROTATE_RIGHT,
        false,
        check_smt_index_then_bv,
        eval_smt_rotate_right,
    )?;
    stack.register(
        Opcode::MK_BV_REPEAT,
        false,
        check_smt_index_then_bv,
        eval_smt_repeat,
    )?;
    stack.register(
        Opcode::MK_BV_SIGN_EXTEND,
        false,
        check_smt_index_then_bv,
        eval_smt_sign_extend,
    )?;
    stack.register(
        Opcode::MK_BV_ZERO_EXTEND,
        false,
        check_smt_index_then_bv,
        eval_smt_zero_extend,
    )?;
    Ok(())
}

fn check_smt_mk_eq(stack: &mut TermStack, _f: usize, n: u32) -> StackResult<()> {
    check_op(stack, Opcode::MK_EQ)?;
    check_size(stack, n >= 2)
}

/// n-ary equality: the conjunction of consecutive pairs
fn eval_smt_mk_eq(stack: &mut TermStack, f: usize, n: u32) -> StackResult<()> {
    let args = get_term_args(stack, f, n)?;
    if args.len() == 2 {
        let t = stack.terms.mk_eq(&mut stack.types, args[0], args[1]);
        return finish_term(stack, t);
    }
    let mut eqs = Vec::with_capacity(args.len() - 1);
    for pair in args.windows(2) {
        let eq = stack
            .terms
            .mk_eq(&mut stack.types, pair[0], pair[1])
            .map_err(|e| crate::coerce::external_error(stack, &e))?;
        eqs.push(eq);
    }
    let t = stack.terms.mk_and(&stack.types, eqs);
    finish_term(stack, t)
}

fn check_smt_bv_const(stack: &mut TermStack, f: usize, n: u32) -> StackResult<()> {
    check_op(stack, Opcode::MK_BV_CONST)?;
    check_size(stack, n == 2)?;
    check_tag(stack, f, Tag::Rational)?;
    check_tag(stack, f + 1, Tag::Rational)
}

fn eval_smt_bv_const(stack: &mut TermStack, f: usize, _n: u32) -> StackResult<()> {
    // value first, size second
    mk_bv_const_core(stack, f + 1, f)
}

fn check_smt_index_then_bv(stack: &mut TermStack, f: usize, n: u32) -> StackResult<()> {
    check_size(stack, n == 2)?;
    check_tag(stack, f, Tag::Rational)
}

fn eval_smt_rotate_left(stack: &mut TermStack, f: usize, _n: u32) -> StackResult<()> {
    mk_bv_rotate_core(stack, f + 1, f, true)
}

fn eval_smt_rotate_right(stack: &mut TermStack, f: usize, _n: u32) -> StackResult<()> {
    mk_bv_rotate_core(stack, f + 1, f, false)
}

fn eval_smt_repeat(stack: &mut TermStack, f: usize, _n: u32) -> StackResult<()> {
    mk_bv_repeat_core(stack, f + 1, f)
}

fn eval_smt_sign_extend(stack: &mut TermStack, f: usize, _n: u32) -> StackResult<()> {
    mk_bv_extend_core(stack, f + 1, f, true)
}

fn eval_smt_zero_extend(stack: &mut TermStack, f: usize, _n: u32) -> StackResult<()> {
    mk_bv_extend_core(stack, f + 1, f, false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::Loc;

    fn at(line: u32) -> Loc {
        Loc::new(line, 1)
    }

    #[test]
    fn test_smt_bv_const_order() {
        let mut stack = TermStack::new(Opcode::NUM_BASE_OPS);
        enable_smtlib(&mut stack).unwrap();
        stack.push_op(Opcode::BUILD_TERM, at(1)).unwrap();
        stack.push_op(Opcode::MK_BV_CONST, at(1)).unwrap();
        stack.push_rational("5", at(1)).unwrap(); // value
        stack.push_rational("4", at(1)).unwrap(); // size
        stack.evaluate().unwrap();
        stack.evaluate().unwrap();
        let t = stack.result_term().unwrap();
        let (width, value) = stack.terms.bv_const_value(t).unwrap();
        assert_eq!(width, 4);
        assert_eq!(value, &num_bigint::BigUint::from(5u32));
    }

    #[test]
    fn test_smt_nary_eq_chains() {
        let mut stack = TermStack::new(Opcode::NUM_BASE_OPS);
        enable_smtlib(&mut stack).unwrap();
        // (= 1 1 1) holds
        stack.push_op(Opcode::BUILD_TERM, at(1)).unwrap();
        stack.push_op(Opcode::MK_EQ, at(1)).unwrap();
        stack.push_rational("1", at(1)).unwrap();
        stack.push_rational("1", at(1)).unwrap();
        stack.push_rational("1", at(1)).unwrap();
        stack.evaluate().unwrap();
        stack.evaluate().unwrap();
        assert_eq!(stack.result_term(), Some(stack.terms.true_term()));
    }

    #[test]
    fn test_smt_rotate_order() {
        let mut stack = TermStack::new(Opcode::NUM_BASE_OPS);
        enable_smtlib(&mut stack).unwrap();
        stack.push_op(Opcode::BUILD_TERM, at(1)).unwrap();
        stack.push_op(Opcode::MK_BV_ROTATE_LEFT, at(1)).unwrap();
        stack.push_rational("1", at(1)).unwrap(); // amount first
        stack.push_bvbin("0011", at(1)).unwrap();
        stack.evaluate().unwrap();
        stack.evaluate().unwrap();
        let t = stack.result_term().unwrap();
        let (_, value) = stack.terms.bv_const_value(t).unwrap();
        assert_eq!(value, &num_bigint::BigUint::from(0b0110u32));
    }

    #[test]
    fn test_smt_zero_extend_order() {
        let mut stack = TermStack::new(Opcode::NUM_BASE_OPS);
        enable_smtlib(&mut stack).unwrap();
        stack.push_op(Opcode::BUILD_TERM, at(1)).unwrap();
        stack.push_op(Opcode::MK_BV_ZERO_EXTEND, at(1)).unwrap();
        stack.push_rational("4", at(1)).unwrap(); // extra bits first
        stack.push_bvbin("1111", at(1)).unwrap();
        stack.evaluate().unwrap();
        stack.evaluate().unwrap();
        let t = stack.result_term().unwrap();
        let (width, value) = stack.terms.bv_const_value(t).unwrap();
        assert_eq!(width, 8);
        assert_eq!(value, &num_bigint::BigUint::from(0x0fu32));
    }
}
