//! End-to-end push/eval scenarios against the predefined operations

use num_bigint::BigUint;
use num_rational::BigRational;
use y3_tstack::{ErrorKind, Loc, Opcode, TermStack};

fn new_stack() -> TermStack {
    TermStack::new(Opcode::NUM_BASE_OPS)
}

fn at(line: u32, column: u32) -> Loc {
    Loc::new(line, column)
}

fn bv_value(stack: &TermStack) -> (u32, BigUint) {
    let t = stack.result_term().expect("no result term");
    let (w, v) = stack.terms.bv_const_value(t).expect("result not a constant");
    (w, v.clone())
}

#[test]
fn test_and_of_constants() {
    let mut stack = new_stack();
    stack.push_op(Opcode::BUILD_TERM, at(1, 1)).unwrap();
    stack.push_op(Opcode::MK_AND, at(1, 2)).unwrap();
    stack.push_true(at(1, 6)).unwrap();
    stack.push_false(at(1, 11)).unwrap();
    stack.evaluate().unwrap();
    stack.evaluate().unwrap();
    assert_eq!(stack.result_term(), Some(stack.terms.false_term()));
    assert!(stack.is_empty());
}

#[test]
fn test_bv_add_constants() {
    let mut stack = new_stack();
    stack.push_op(Opcode::BUILD_TERM, at(1, 1)).unwrap();
    stack.push_op(Opcode::MK_BV_ADD, at(1, 2)).unwrap();
    stack.push_bvbin("0011", at(1, 9)).unwrap();
    stack.push_bvbin("0001", at(1, 16)).unwrap();
    stack.evaluate().unwrap();
    stack.evaluate().unwrap();
    assert_eq!(bv_value(&stack), (4, BigUint::from(0b0100u32)));
}

#[test]
fn test_identity_extract() {
    let mut stack = new_stack();
    stack.push_op(Opcode::BUILD_TERM, at(1, 1)).unwrap();
    stack.push_op(Opcode::MK_BV_EXTRACT, at(1, 2)).unwrap();
    stack.push_rational("3", at(1, 13)).unwrap();
    stack.push_rational("0", at(1, 15)).unwrap();
    stack.push_bvbin("1010", at(1, 17)).unwrap();
    stack.evaluate().unwrap();
    stack.evaluate().unwrap();
    assert_eq!(bv_value(&stack), (4, BigUint::from(0b1010u32)));
}

#[test]
fn test_proper_extract_slice() {
    let mut stack = new_stack();
    stack.push_op(Opcode::BUILD_TERM, at(1, 1)).unwrap();
    stack.push_op(Opcode::MK_BV_EXTRACT, at(1, 2)).unwrap();
    stack.push_rational("5", at(1, 13)).unwrap();
    stack.push_rational("2", at(1, 15)).unwrap();
    stack.push_bvbin("10100110", at(1, 17)).unwrap();
    stack.evaluate().unwrap();
    stack.evaluate().unwrap();
    assert_eq!(bv_value(&stack), (4, BigUint::from(0b1001u32)));
}

#[test]
fn test_incompatible_sizes_at_second_literal() {
    let mut stack = new_stack();
    stack.push_op(Opcode::MK_BV_ADD, at(2, 1)).unwrap();
    stack.push_bvbin("0011", at(2, 9)).unwrap();
    stack.push_bvbin("00000001", at(2, 16)).unwrap();
    let err = stack.evaluate().unwrap_err();
    assert_eq!(err.kind, ErrorKind::IncompatibleBvSizes);
    assert_eq!(err.loc, at(2, 16));
    stack.reset();
    assert!(stack.is_empty());
}

#[test]
fn test_let_binding_scoping() {
    let mut stack = new_stack();
    stack.push_op(Opcode::BUILD_TERM, at(1, 1)).unwrap();
    stack.push_op(Opcode::LET, at(1, 2)).unwrap();
    stack.push_op(Opcode::BIND, at(1, 7)).unwrap();
    stack.push_symbol("x", at(1, 8)).unwrap();
    stack.push_rational("1", at(1, 10)).unwrap();
    stack.evaluate().unwrap();
    // bound inside the let body
    assert!(stack.terms.get_by_name("x").is_some());
    stack.push_term_by_name("x", at(1, 13)).unwrap();
    stack.evaluate().unwrap();
    stack.evaluate().unwrap();
    let t = stack.result_term().unwrap();
    assert_eq!(
        stack.terms.rational_const_value(t),
        Some(&BigRational::from(num_bigint::BigInt::from(1)))
    );
    // unbound once the let frame is gone
    assert_eq!(stack.terms.get_by_name("x"), None);
}

#[test]
fn test_nested_let_shadows_lifo() {
    let mut stack = new_stack();
    stack.push_op(Opcode::BUILD_TERM, at(1, 1)).unwrap();
    stack.push_op(Opcode::LET, at(1, 2)).unwrap();
    stack.push_op(Opcode::BIND, at(1, 7)).unwrap();
    stack.push_symbol("x", at(1, 8)).unwrap();
    stack.push_rational("1", at(1, 10)).unwrap();
    stack.evaluate().unwrap();
    // the inner let folds into the same frame
    stack.push_op(Opcode::LET, at(2, 2)).unwrap();
    stack.push_op(Opcode::BIND, at(2, 7)).unwrap();
    stack.push_symbol("x", at(2, 8)).unwrap();
    stack.push_rational("2", at(2, 10)).unwrap();
    stack.evaluate().unwrap();
    // innermost binding shadows
    let inner = stack.terms.get_by_name("x").unwrap();
    assert_eq!(
        stack.terms.rational_const_value(inner),
        Some(&BigRational::from(num_bigint::BigInt::from(2)))
    );
    stack.push_term_by_name("x", at(2, 13)).unwrap();
    stack.evaluate().unwrap(); // consumes the fold
    stack.evaluate().unwrap(); // collapses the let
    stack.evaluate().unwrap(); // build-term
    let t = stack.result_term().unwrap();
    assert_eq!(
        stack.terms.rational_const_value(t),
        Some(&BigRational::from(num_bigint::BigInt::from(2)))
    );
    assert_eq!(stack.terms.get_by_name("x"), None);
}

#[test]
fn test_negative_exponent() {
    let mut stack = new_stack();
    stack.push_op(Opcode::MK_BV_POW, at(3, 1)).unwrap();
    stack.push_bvbin("00000010", at(3, 9)).unwrap();
    stack.push_rational("-2", at(3, 18)).unwrap();
    let err = stack.evaluate().unwrap_err();
    assert_eq!(err.kind, ErrorKind::NegativeExponent);
    assert_eq!(err.loc, at(3, 18));
}

#[test]
fn test_bv_pow_constant_folds() {
    let mut stack = new_stack();
    stack.push_op(Opcode::BUILD_TERM, at(1, 1)).unwrap();
    stack.push_op(Opcode::MK_BV_POW, at(1, 2)).unwrap();
    stack.push_bvbin("00000011", at(1, 9)).unwrap();
    stack.push_rational("4", at(1, 18)).unwrap();
    stack.evaluate().unwrap();
    stack.evaluate().unwrap();
    assert_eq!(bv_value(&stack), (8, BigUint::from(81u32)));
}

#[test]
fn test_associative_fold_equivalence() {
    // folded: push the operator once per nesting level
    let mut folded = new_stack();
    folded.push_op(Opcode::BUILD_TERM, at(1, 1)).unwrap();
    folded.push_op(Opcode::MK_BV_ADD, at(1, 2)).unwrap();
    folded.push_bvbin("0001", at(1, 9)).unwrap();
    folded.push_op(Opcode::MK_BV_ADD, at(1, 14)).unwrap();
    folded.push_bvbin("0010", at(1, 21)).unwrap();
    folded.push_bvbin("0100", at(1, 26)).unwrap();
    folded.evaluate().unwrap(); // consumes one fold
    folded.evaluate().unwrap(); // collapses the combined frame
    folded.evaluate().unwrap();

    // flat: one frame, all arguments
    let mut flat = new_stack();
    flat.push_op(Opcode::BUILD_TERM, at(1, 1)).unwrap();
    flat.push_op(Opcode::MK_BV_ADD, at(1, 2)).unwrap();
    flat.push_bvbin("0001", at(1, 9)).unwrap();
    flat.push_bvbin("0010", at(1, 14)).unwrap();
    flat.push_bvbin("0100", at(1, 19)).unwrap();
    flat.evaluate().unwrap();
    flat.evaluate().unwrap();

    let (wf, vf) = {
        let t = folded.result_term().unwrap();
        let (w, v) = folded.terms.bv_const_value(t).unwrap();
        (w, v.clone())
    };
    assert_eq!((wf, vf), (4, BigUint::from(0b0111u32)));
    assert_eq!(bv_value(&flat), (4, BigUint::from(0b0111u32)));
}

#[test]
fn test_error_location_inside_folded_frame() {
    let mut stack = new_stack();
    stack.push_op(Opcode::MK_BV_ADD, at(1, 1)).unwrap();
    stack.push_bvbin("0001", at(1, 9)).unwrap();
    stack.push_op(Opcode::MK_BV_ADD, at(1, 14)).unwrap();
    stack.push_bvbin("00000010", at(4, 21)).unwrap();
    stack.evaluate().unwrap(); // fold
    let err = stack.evaluate().unwrap_err();
    assert_eq!(err.kind, ErrorKind::IncompatibleBvSizes);
    // the offending argument's own location, not the operator's
    assert_eq!(err.loc, at(4, 21));
}

#[test]
fn test_coercion_idempotence() {
    let mut stack = new_stack();
    let int = stack.types.int_type();
    let t = stack.terms.mk_uninterpreted(int);
    stack.push_op(Opcode::BUILD_TERM, at(1, 1)).unwrap();
    stack.push_term(t, at(1, 5)).unwrap();
    stack.evaluate().unwrap();
    assert_eq!(stack.result_term(), Some(t));
}

#[test]
fn test_define_term_and_lookup() {
    let mut stack = new_stack();
    stack.push_op(Opcode::DEFINE_TERM, at(1, 1)).unwrap();
    stack.push_free_termname("counter", at(1, 9)).unwrap();
    stack.push_int_type(at(1, 17)).unwrap();
    stack.evaluate().unwrap();
    assert!(stack.is_empty());
    let t = stack.terms.get_by_name("counter").unwrap();
    assert_eq!(stack.terms.type_of(t), stack.types.int_type());

    // a second definition of the same name is refused at push time
    let err = stack.push_free_termname("counter", at(2, 9)).unwrap_err();
    assert_eq!(err.kind, ErrorKind::TermNameRedef);
}

#[test]
fn test_define_term_subtype_check() {
    let mut stack = new_stack();
    stack.push_op(Opcode::DEFINE_TERM, at(1, 1)).unwrap();
    stack.push_free_termname("flag", at(1, 9)).unwrap();
    stack.push_bool_type(at(1, 14)).unwrap();
    stack.push_rational("7", at(1, 19)).unwrap();
    let err = stack.evaluate().unwrap_err();
    assert_eq!(err.kind, ErrorKind::TypeErrorInDefinition);
    assert_eq!(err.loc, at(1, 19));
}

#[test]
fn test_define_type_and_bv_type() {
    let mut stack = new_stack();
    stack.push_op(Opcode::DEFINE_TYPE, at(1, 1)).unwrap();
    stack.push_free_typename("word", at(1, 9)).unwrap();
    stack.push_op(Opcode::MK_BV_TYPE, at(1, 14)).unwrap();
    stack.push_rational("16", at(1, 22)).unwrap();
    stack.evaluate().unwrap();
    stack.evaluate().unwrap();
    let ty = stack.types.get_by_name("word").unwrap();
    assert_eq!(stack.types.bv_width(ty), Some(16));
}

#[test]
fn test_nonpositive_bv_size() {
    let mut stack = new_stack();
    stack.push_op(Opcode::MK_BV_TYPE, at(1, 1)).unwrap();
    stack.push_rational("0", at(1, 9)).unwrap();
    let err = stack.evaluate().unwrap_err();
    assert_eq!(err.kind, ErrorKind::NonPositiveBvSize);
}

#[test]
fn test_scalar_type_defines_constants() {
    let mut stack = new_stack();
    stack.push_op(Opcode::BUILD_TYPE, at(1, 1)).unwrap();
    stack.push_op(Opcode::MK_SCALAR_TYPE, at(1, 2)).unwrap();
    stack.push_symbol("red", at(1, 12)).unwrap();
    stack.push_symbol("green", at(1, 16)).unwrap();
    stack.push_symbol("blue", at(1, 22)).unwrap();
    stack.evaluate().unwrap();
    stack.evaluate().unwrap();
    let ty = stack.result_type().unwrap();
    for name in ["red", "green", "blue"] {
        let t = stack.terms.get_by_name(name).unwrap();
        assert_eq!(stack.terms.type_of(t), ty);
    }
}

#[test]
fn test_duplicate_scalar_name() {
    let mut stack = new_stack();
    stack.push_op(Opcode::MK_SCALAR_TYPE, at(1, 1)).unwrap();
    stack.push_symbol("on", at(1, 12)).unwrap();
    stack.push_symbol("off", at(1, 15)).unwrap();
    stack.push_symbol("on", at(1, 19)).unwrap();
    let err = stack.evaluate().unwrap_err();
    assert_eq!(err.kind, ErrorKind::DuplicateScalarName);
    assert_eq!(err.loc, at(1, 19));
    assert_eq!(err.symbol.as_deref(), Some("on"));
}

#[test]
fn test_forall_duplicate_var_name() {
    let mut stack = new_stack();
    stack.push_op(Opcode::MK_FORALL, at(1, 1)).unwrap();
    stack.push_op(Opcode::DECLARE_VAR, at(1, 9)).unwrap();
    stack.push_symbol("i", at(1, 10)).unwrap();
    stack.push_int_type(at(1, 12)).unwrap();
    stack.evaluate().unwrap();
    stack.push_op(Opcode::DECLARE_VAR, at(1, 17)).unwrap();
    stack.push_symbol("i", at(1, 18)).unwrap();
    stack.push_int_type(at(1, 20)).unwrap();
    stack.evaluate().unwrap();
    stack.push_true(at(1, 25)).unwrap();
    let err = stack.evaluate().unwrap_err();
    assert_eq!(err.kind, ErrorKind::DuplicateVarName);
}

#[test]
fn test_forall_builds_quantified_term() {
    let mut stack = new_stack();
    stack.push_op(Opcode::BUILD_TERM, at(1, 1)).unwrap();
    stack.push_op(Opcode::MK_FORALL, at(1, 2)).unwrap();
    stack.push_op(Opcode::DECLARE_VAR, at(1, 9)).unwrap();
    stack.push_symbol("i", at(1, 10)).unwrap();
    stack.push_int_type(at(1, 12)).unwrap();
    stack.evaluate().unwrap();
    stack.push_op(Opcode::MK_GE, at(1, 17)).unwrap();
    stack.push_term_by_name("i", at(1, 20)).unwrap();
    stack.push_rational("0", at(1, 22)).unwrap();
    stack.evaluate().unwrap();
    stack.evaluate().unwrap();
    stack.evaluate().unwrap();
    let t = stack.result_term().unwrap();
    assert_eq!(stack.terms.type_of(t), stack.types.bool_type());
    // the bound name does not leak out of the frame
    assert_eq!(stack.terms.get_by_name("i"), None);
}

#[test]
fn test_division_requires_constant_divisor() {
    let mut stack = new_stack();
    let int = stack.types.int_type();
    let x = stack.terms.mk_uninterpreted(int);
    stack.push_op(Opcode::MK_DIVISION, at(1, 1)).unwrap();
    stack.push_rational("6", at(1, 9)).unwrap();
    stack.push_term(x, at(1, 11)).unwrap();
    let err = stack.evaluate().unwrap_err();
    assert_eq!(err.kind, ErrorKind::NonConstantDivisor);
    assert_eq!(err.loc, at(1, 11));

    stack.reset();
    stack.push_op(Opcode::MK_DIVISION, at(2, 1)).unwrap();
    stack.push_rational("6", at(2, 9)).unwrap();
    stack.push_rational("0", at(2, 11)).unwrap();
    let err = stack.evaluate().unwrap_err();
    assert_eq!(err.kind, ErrorKind::DivideByZero);
}

#[test]
fn test_arith_division_result() {
    let mut stack = new_stack();
    stack.push_op(Opcode::BUILD_TERM, at(1, 1)).unwrap();
    stack.push_op(Opcode::MK_DIVISION, at(1, 2)).unwrap();
    stack.push_rational("6", at(1, 9)).unwrap();
    stack.push_rational("4", at(1, 11)).unwrap();
    stack.evaluate().unwrap();
    stack.evaluate().unwrap();
    let t = stack.result_term().unwrap();
    assert_eq!(
        stack.terms.rational_const_value(t),
        Some(&BigRational::new(
            num_bigint::BigInt::from(3),
            num_bigint::BigInt::from(2)
        ))
    );
}

#[test]
fn test_bv_shift_with_symbolic_amount() {
    let mut stack = new_stack();
    let ty = stack.types.mk_bitvec(8).unwrap();
    let x = stack.terms.mk_uninterpreted(ty);
    stack.push_op(Opcode::BUILD_TERM, at(1, 1)).unwrap();
    stack.push_op(Opcode::MK_BV_SHL, at(1, 2)).unwrap();
    stack.push_bvbin("00000001", at(1, 9)).unwrap();
    stack.push_term(x, at(1, 20)).unwrap();
    stack.evaluate().unwrap();
    stack.evaluate().unwrap();
    let t = stack.result_term().unwrap();
    // symbolic amount: the builder produced a shift term, not a constant
    assert!(stack.terms.bv_const_value(t).is_none());
    assert_eq!(stack.terms.bv_width(&stack.types, t), Some(8));
}

#[test]
fn test_bv_shift_with_constant_amount() {
    let mut stack = new_stack();
    stack.push_op(Opcode::BUILD_TERM, at(1, 1)).unwrap();
    stack.push_op(Opcode::MK_BV_SHL, at(1, 2)).unwrap();
    stack.push_bvbin("00001111", at(1, 9)).unwrap();
    stack.push_bvbin("00000010", at(1, 20)).unwrap();
    stack.evaluate().unwrap();
    stack.evaluate().unwrap();
    assert_eq!(bv_value(&stack), (8, BigUint::from(0b0011_1100u32)));
}

#[test]
fn test_bv_concat_order() {
    let mut stack = new_stack();
    stack.push_op(Opcode::BUILD_TERM, at(1, 1)).unwrap();
    stack.push_op(Opcode::MK_BV_CONCAT, at(1, 2)).unwrap();
    stack.push_bvbin("1111", at(1, 12)).unwrap();
    stack.push_bvbin("0000", at(1, 17)).unwrap();
    stack.evaluate().unwrap();
    stack.evaluate().unwrap();
    // first operand is the high part
    assert_eq!(bv_value(&stack), (8, BigUint::from(0xf0u32)));
}

#[test]
fn test_bv_comp_and_reductions() {
    let mut stack = new_stack();
    stack.push_op(Opcode::BUILD_TERM, at(1, 1)).unwrap();
    stack.push_op(Opcode::MK_BV_COMP, at(1, 2)).unwrap();
    stack.push_bvbin("1010", at(1, 10)).unwrap();
    stack.push_bvbin("1010", at(1, 15)).unwrap();
    stack.evaluate().unwrap();
    stack.evaluate().unwrap();
    assert_eq!(bv_value(&stack), (1, BigUint::from(1u32)));

    stack.reset();
    stack.push_op(Opcode::BUILD_TERM, at(2, 1)).unwrap();
    stack.push_op(Opcode::MK_BV_REDAND, at(2, 2)).unwrap();
    stack.push_bvbin("1011", at(2, 12)).unwrap();
    stack.evaluate().unwrap();
    stack.evaluate().unwrap();
    assert_eq!(bv_value(&stack), (1, BigUint::from(0u32)));
}

#[test]
fn test_bv_rotate_by_width_is_identity() {
    let mut stack = new_stack();
    stack.push_op(Opcode::BUILD_TERM, at(1, 1)).unwrap();
    stack.push_op(Opcode::MK_BV_ROTATE_LEFT, at(1, 2)).unwrap();
    stack.push_bvbin("1001", at(1, 17)).unwrap();
    stack.push_rational("4", at(1, 22)).unwrap();
    stack.evaluate().unwrap();
    stack.evaluate().unwrap();
    assert_eq!(bv_value(&stack), (4, BigUint::from(0b1001u32)));
}

#[test]
fn test_bv_rotate_out_of_range() {
    let mut stack = new_stack();
    stack.push_op(Opcode::MK_BV_ROTATE_LEFT, at(1, 1)).unwrap();
    stack.push_bvbin("1001", at(1, 17)).unwrap();
    stack.push_rational("5", at(1, 22)).unwrap();
    let err = stack.evaluate().unwrap_err();
    assert_eq!(err.kind, ErrorKind::BvLogicError);
}

#[test]
fn test_wide_bv_arithmetic() {
    let mut stack = new_stack();
    stack.push_op(Opcode::BUILD_TERM, at(1, 1)).unwrap();
    stack.push_op(Opcode::MK_BV_ADD, at(1, 2)).unwrap();
    let ones = "1".repeat(72);
    stack.push_bvbin(&ones, at(1, 9)).unwrap();
    let one = format!("{}1", "0".repeat(71));
    stack.push_bvbin(&one, at(1, 84)).unwrap();
    stack.evaluate().unwrap();
    stack.evaluate().unwrap();
    // all-ones + 1 wraps to zero at width 72
    assert_eq!(bv_value(&stack), (72, BigUint::from(0u32)));
}

#[test]
fn test_bv_sub_demands_two_arguments() {
    let mut stack = new_stack();
    stack.push_op(Opcode::MK_BV_SUB, at(1, 1)).unwrap();
    stack.push_bvbin("0011", at(1, 9)).unwrap();
    let err = stack.evaluate().unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidFrame);
}

#[test]
fn test_associative_single_argument() {
    let mut stack = new_stack();
    stack.push_op(Opcode::BUILD_TERM, at(1, 1)).unwrap();
    stack.push_op(Opcode::MK_BV_AND, at(1, 2)).unwrap();
    stack.push_bvbin("0110", at(1, 9)).unwrap();
    stack.evaluate().unwrap();
    stack.evaluate().unwrap();
    assert_eq!(bv_value(&stack), (4, BigUint::from(0b0110u32)));
}

#[test]
fn test_reset_restores_fresh_state() {
    let mut stack = new_stack();
    stack.push_op(Opcode::MK_AND, at(1, 1)).unwrap();
    stack.push_true(at(1, 6)).unwrap();
    stack.push_op(Opcode::MK_BV_ADD, at(1, 11)).unwrap();
    stack.push_bvbin("0011", at(1, 20)).unwrap();
    assert!(!stack.is_empty());
    stack.reset();
    assert!(stack.is_empty());
    assert_eq!(stack.arena_depth(), 0);
    assert_eq!(stack.frame_index(), 0);
    assert_eq!(stack.result_term(), None);
    assert_eq!(stack.buffer_cells(), 0);

    // the stack is fully usable again
    stack.push_op(Opcode::BUILD_TERM, at(2, 1)).unwrap();
    stack.push_op(Opcode::MK_AND, at(2, 2)).unwrap();
    stack.push_true(at(2, 6)).unwrap();
    stack.evaluate().unwrap();
    stack.evaluate().unwrap();
    assert_eq!(stack.result_term(), Some(stack.terms.true_term()));
}

#[test]
fn test_reset_unregisters_bindings() {
    let mut stack = new_stack();
    stack.push_op(Opcode::LET, at(1, 1)).unwrap();
    stack.push_op(Opcode::BIND, at(1, 6)).unwrap();
    stack.push_symbol("leak", at(1, 7)).unwrap();
    stack.push_rational("9", at(1, 12)).unwrap();
    stack.evaluate().unwrap();
    assert!(stack.terms.get_by_name("leak").is_some());
    stack.reset();
    assert_eq!(stack.terms.get_by_name("leak"), None);
}

#[test]
fn test_build_type_result() {
    let mut stack = new_stack();
    stack.push_op(Opcode::BUILD_TYPE, at(1, 1)).unwrap();
    stack.push_op(Opcode::MK_TUPLE_TYPE, at(1, 2)).unwrap();
    stack.push_int_type(at(1, 16)).unwrap();
    stack.push_real_type(at(1, 20)).unwrap();
    stack.evaluate().unwrap();
    stack.evaluate().unwrap();
    let ty = stack.result_type().unwrap();
    assert!(matches!(
        stack.types.get(ty),
        y3_core::TypeData::Tuple(cs) if cs.len() == 2
    ));
}

#[test]
fn test_apply_uninterpreted_function() {
    let mut stack = new_stack();
    let int = stack.types.int_type();
    let fun_ty = stack.types.mk_fun(vec![int, int], int).unwrap();
    let f = stack.terms.mk_uninterpreted(fun_ty);
    stack.terms.set_name("f", f);

    stack.push_op(Opcode::BUILD_TERM, at(1, 1)).unwrap();
    stack.push_op(Opcode::MK_APPLY, at(1, 2)).unwrap();
    stack.push_term_by_name("f", at(1, 10)).unwrap();
    stack.push_rational("1", at(1, 12)).unwrap();
    stack.push_rational("2", at(1, 14)).unwrap();
    stack.evaluate().unwrap();
    stack.evaluate().unwrap();
    let t = stack.result_term().unwrap();
    assert_eq!(stack.terms.type_of(t), int);
}

#[test]
fn test_app_type_through_macro() {
    let mut stack = new_stack();
    stack.types.declare_macro("Set", 1);

    stack.push_op(Opcode::BUILD_TYPE, at(1, 1)).unwrap();
    stack.push_op(Opcode::MK_APP_TYPE, at(1, 2)).unwrap();
    stack.push_macro_by_name("Set", at(1, 15)).unwrap();
    stack.push_int_type(at(1, 19)).unwrap();
    stack.evaluate().unwrap();
    stack.evaluate().unwrap();
    let ty = stack.result_type().unwrap();
    assert!(matches!(
        stack.types.get(ty),
        y3_core::TypeData::Instance { args, .. } if args.len() == 1
    ));

    // the same application hash-conses to the same type
    stack.push_op(Opcode::BUILD_TYPE, at(2, 1)).unwrap();
    stack.push_op(Opcode::MK_APP_TYPE, at(2, 2)).unwrap();
    stack.push_macro_by_name("Set", at(2, 15)).unwrap();
    stack.push_int_type(at(2, 19)).unwrap();
    stack.evaluate().unwrap();
    stack.evaluate().unwrap();
    assert_eq!(stack.result_type(), Some(ty));
}

#[test]
fn test_undefined_macro_name() {
    let mut stack = new_stack();
    let err = stack.push_macro_by_name("Vec", at(1, 5)).unwrap_err();
    assert_eq!(err.kind, ErrorKind::UndefMacro);
    assert_eq!(err.symbol.as_deref(), Some("Vec"));
}

#[test]
fn test_tuple_select_and_update() {
    let mut stack = new_stack();
    stack.push_op(Opcode::BUILD_TERM, at(1, 1)).unwrap();
    stack.push_op(Opcode::MK_SELECT, at(1, 2)).unwrap();
    stack.push_op(Opcode::MK_TUPLE, at(1, 12)).unwrap();
    stack.push_rational("10", at(1, 21)).unwrap();
    stack.push_rational("20", at(1, 24)).unwrap();
    stack.evaluate().unwrap();
    stack.push_rational("2", at(1, 28)).unwrap();
    stack.evaluate().unwrap();
    stack.evaluate().unwrap();
    let t = stack.result_term().unwrap();
    assert_eq!(
        stack.terms.rational_const_value(t),
        Some(&BigRational::from(num_bigint::BigInt::from(20)))
    );

    // an out-of-range index is refused by the builder
    stack.push_op(Opcode::MK_SELECT, at(2, 2)).unwrap();
    stack.push_op(Opcode::MK_TUPLE, at(2, 12)).unwrap();
    stack.push_rational("10", at(2, 21)).unwrap();
    stack.evaluate().unwrap();
    stack.push_rational("4", at(2, 28)).unwrap();
    let err = stack.evaluate().unwrap_err();
    assert_eq!(err.kind, ErrorKind::External);
}

#[test]
fn test_function_update() {
    let mut stack = new_stack();
    let int = stack.types.int_type();
    let fun_ty = stack.types.mk_fun(vec![int], int).unwrap();
    let f = stack.terms.mk_uninterpreted(fun_ty);
    stack.push_op(Opcode::BUILD_TERM, at(1, 1)).unwrap();
    stack.push_op(Opcode::MK_UPDATE, at(1, 2)).unwrap();
    stack.push_term(f, at(1, 12)).unwrap();
    stack.push_rational("0", at(1, 14)).unwrap();
    stack.push_rational("42", at(1, 16)).unwrap();
    stack.evaluate().unwrap();
    stack.evaluate().unwrap();
    let t = stack.result_term().unwrap();
    assert_eq!(stack.terms.type_of(t), fun_ty);
}

#[test]
fn test_ite_over_bv_carriers() {
    let mut stack = new_stack();
    let ty = stack.types.mk_bitvec(4).unwrap();
    let c = stack.terms.mk_uninterpreted(stack.types.bool_type());
    let x = stack.terms.mk_uninterpreted(ty);
    stack.push_op(Opcode::BUILD_TERM, at(1, 1)).unwrap();
    stack.push_op(Opcode::MK_ITE, at(1, 2)).unwrap();
    stack.push_term(c, at(1, 9)).unwrap();
    stack.push_term(x, at(1, 11)).unwrap();
    stack.push_bvbin("0101", at(1, 13)).unwrap();
    stack.evaluate().unwrap();
    stack.evaluate().unwrap();
    let t = stack.result_term().unwrap();
    assert_eq!(stack.terms.bv_width(&stack.types, t), Some(4));
}
