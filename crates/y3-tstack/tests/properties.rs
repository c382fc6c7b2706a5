//! Property tests over randomized push/eval sequences
//!
//! Random Boolean and bit-vector expressions are driven through the
//! stack and cross-checked against direct evaluation; structural
//! invariants (frame chain shape, arena/frame parity, reset soundness)
//! are asserted along the way.

use num_bigint::BigUint;
use proptest::prelude::*;
use y3_tstack::{Loc, Opcode, Tag, TermStack};

fn at() -> Loc {
    Loc::new(1, 1)
}

/// Frame-chain well-formedness: strictly decreasing indices of operator
/// cells ending at the sentinel
fn assert_frames_well_formed(stack: &TermStack) {
    assert!(stack.top_index() >= 1);
    let chain = stack.frame_chain();
    assert_eq!(chain.last(), Some(&0));
    for w in chain.windows(2) {
        assert!(w[0] > w[1], "frame chain not strictly decreasing");
    }
    for &i in &chain {
        assert_eq!(stack.cell_tag(i), Some(Tag::Op));
    }
}

// ----------------------------------------------------------------------
// Boolean expressions
// ----------------------------------------------------------------------

#[derive(Clone, Debug)]
enum BoolExpr {
    Const(bool),
    Not(Box<BoolExpr>),
    And(Vec<BoolExpr>),
    Or(Vec<BoolExpr>),
    Xor(Vec<BoolExpr>),
}

impl BoolExpr {
    fn eval(&self) -> bool {
        match self {
            BoolExpr::Const(b) => *b,
            BoolExpr::Not(e) => !e.eval(),
            BoolExpr::And(es) => es.iter().all(BoolExpr::eval),
            BoolExpr::Or(es) => es.iter().any(BoolExpr::eval),
            BoolExpr::Xor(es) => es.iter().fold(false, |acc, e| acc ^ e.eval()),
        }
    }

    /// Push this expression as one argument cell, collapsing frames as
    /// they complete, and check the structural invariants at each step
    fn push(&self, stack: &mut TermStack) {
        match self {
            BoolExpr::Const(true) => stack.push_true(at()).unwrap(),
            BoolExpr::Const(false) => stack.push_false(at()).unwrap(),
            BoolExpr::Not(e) => {
                stack.push_op(Opcode::MK_NOT, at()).unwrap();
                e.push(stack);
                stack.evaluate().unwrap();
            }
            BoolExpr::And(es) => {
                stack.push_op(Opcode::MK_AND, at()).unwrap();
                for e in es {
                    e.push(stack);
                }
                stack.evaluate().unwrap();
            }
            BoolExpr::Or(es) => {
                stack.push_op(Opcode::MK_OR, at()).unwrap();
                for e in es {
                    e.push(stack);
                }
                stack.evaluate().unwrap();
            }
            BoolExpr::Xor(es) => {
                stack.push_op(Opcode::MK_XOR, at()).unwrap();
                for e in es {
                    e.push(stack);
                }
                stack.evaluate().unwrap();
            }
        }
        assert_frames_well_formed(stack);
        // no BIND frames here: one arena scope per open frame
        assert_eq!(stack.arena_depth(), stack.frame_chain().len() - 1);
    }
}

fn bool_expr() -> impl Strategy<Value = BoolExpr> {
    let leaf = any::<bool>().prop_map(BoolExpr::Const);
    leaf.prop_recursive(4, 24, 4, |inner| {
        prop_oneof![
            inner.clone().prop_map(|e| BoolExpr::Not(Box::new(e))),
            prop::collection::vec(inner.clone(), 1..4).prop_map(BoolExpr::And),
            prop::collection::vec(inner.clone(), 1..4).prop_map(BoolExpr::Or),
            prop::collection::vec(inner, 1..4).prop_map(BoolExpr::Xor),
        ]
    })
}

proptest! {
    /// Constant Boolean expressions fold to the expected constant
    #[test]
    fn prop_bool_expr_evaluates(e in bool_expr()) {
        let mut stack = TermStack::new(Opcode::NUM_BASE_OPS);
        stack.push_op(Opcode::BUILD_TERM, at()).unwrap();
        e.push(&mut stack);
        stack.evaluate().unwrap();
        let expected = if e.eval() {
            stack.terms.true_term()
        } else {
            stack.terms.false_term()
        };
        prop_assert_eq!(stack.result_term(), Some(expected));
        prop_assert!(stack.is_empty());
        prop_assert_eq!(stack.arena_depth(), 0);
    }

    /// Reset after an arbitrary prefix restores a usable empty stack
    #[test]
    fn prop_reset_soundness(e in bool_expr()) {
        let mut stack = TermStack::new(Opcode::NUM_BASE_OPS);
        stack.push_op(Opcode::BUILD_TERM, at()).unwrap();
        stack.push_op(Opcode::MK_AND, at()).unwrap();
        e.push(&mut stack);
        // abandon the construction mid-flight
        stack.reset();
        prop_assert!(stack.is_empty());
        prop_assert_eq!(stack.arena_depth(), 0);
        prop_assert_eq!(stack.buffer_cells(), 0);
        prop_assert_eq!(stack.result_term(), None);

        // the same stack still evaluates cleanly
        stack.push_op(Opcode::BUILD_TERM, at()).unwrap();
        e.push(&mut stack);
        stack.evaluate().unwrap();
        let expected = if e.eval() {
            stack.terms.true_term()
        } else {
            stack.terms.false_term()
        };
        prop_assert_eq!(stack.result_term(), Some(expected));
    }
}

// ----------------------------------------------------------------------
// Bit-vector expressions (fixed width 8)
// ----------------------------------------------------------------------

#[derive(Clone, Debug)]
enum BvExpr {
    Const(u8),
    Not(Box<BvExpr>),
    Neg(Box<BvExpr>),
    And(Box<BvExpr>, Box<BvExpr>),
    Or(Box<BvExpr>, Box<BvExpr>),
    Xor(Box<BvExpr>, Box<BvExpr>),
    Add(Vec<BvExpr>),
    Sub(Box<BvExpr>, Box<BvExpr>),
    Mul(Box<BvExpr>, Box<BvExpr>),
    RotateLeft(u32, Box<BvExpr>),
    ShiftLeft0(u32, Box<BvExpr>),
}

impl BvExpr {
    fn eval(&self) -> u8 {
        match self {
            BvExpr::Const(v) => *v,
            BvExpr::Not(e) => !e.eval(),
            BvExpr::Neg(e) => e.eval().wrapping_neg(),
            BvExpr::And(a, b) => a.eval() & b.eval(),
            BvExpr::Or(a, b) => a.eval() | b.eval(),
            BvExpr::Xor(a, b) => a.eval() ^ b.eval(),
            BvExpr::Add(es) => es.iter().fold(0u8, |acc, e| acc.wrapping_add(e.eval())),
            BvExpr::Sub(a, b) => a.eval().wrapping_sub(b.eval()),
            BvExpr::Mul(a, b) => a.eval().wrapping_mul(b.eval()),
            BvExpr::RotateLeft(k, e) => {
                let v = e.eval();
                if *k % 8 == 0 {
                    v
                } else {
                    v.rotate_left(*k % 8)
                }
            }
            BvExpr::ShiftLeft0(k, e) => {
                let v = e.eval();
                if *k >= 8 {
                    0
                } else {
                    v << k
                }
            }
        }
    }

    fn push(&self, stack: &mut TermStack) {
        match self {
            BvExpr::Const(v) => {
                let digits = format!("{v:08b}");
                stack.push_bvbin(&digits, at()).unwrap();
            }
            BvExpr::Not(e) => {
                stack.push_op(Opcode::MK_BV_NOT, at()).unwrap();
                e.push(stack);
                stack.evaluate().unwrap();
            }
            BvExpr::Neg(e) => {
                stack.push_op(Opcode::MK_BV_NEG, at()).unwrap();
                e.push(stack);
                stack.evaluate().unwrap();
            }
            BvExpr::And(a, b) => {
                stack.push_op(Opcode::MK_BV_AND, at()).unwrap();
                a.push(stack);
                b.push(stack);
                stack.evaluate().unwrap();
            }
            BvExpr::Or(a, b) => {
                stack.push_op(Opcode::MK_BV_OR, at()).unwrap();
                a.push(stack);
                b.push(stack);
                stack.evaluate().unwrap();
            }
            BvExpr::Xor(a, b) => {
                stack.push_op(Opcode::MK_BV_XOR, at()).unwrap();
                a.push(stack);
                b.push(stack);
                stack.evaluate().unwrap();
            }
            BvExpr::Add(es) => {
                stack.push_op(Opcode::MK_BV_ADD, at()).unwrap();
                for e in es {
                    e.push(stack);
                }
                stack.evaluate().unwrap();
            }
            BvExpr::Sub(a, b) => {
                stack.push_op(Opcode::MK_BV_SUB, at()).unwrap();
                a.push(stack);
                b.push(stack);
                stack.evaluate().unwrap();
            }
            BvExpr::Mul(a, b) => {
                stack.push_op(Opcode::MK_BV_MUL, at()).unwrap();
                a.push(stack);
                b.push(stack);
                stack.evaluate().unwrap();
            }
            BvExpr::RotateLeft(k, e) => {
                stack.push_op(Opcode::MK_BV_ROTATE_LEFT, at()).unwrap();
                e.push(stack);
                stack.push_rational(&k.to_string(), at()).unwrap();
                stack.evaluate().unwrap();
            }
            BvExpr::ShiftLeft0(k, e) => {
                stack.push_op(Opcode::MK_BV_SHIFT_LEFT0, at()).unwrap();
                e.push(stack);
                stack.push_rational(&k.to_string(), at()).unwrap();
                stack.evaluate().unwrap();
            }
        }
        assert_frames_well_formed(stack);
    }
}

fn bv_expr() -> impl Strategy<Value = BvExpr> {
    let leaf = any::<u8>().prop_map(BvExpr::Const);
    leaf.prop_recursive(4, 20, 3, |inner| {
        prop_oneof![
            inner.clone().prop_map(|e| BvExpr::Not(Box::new(e))),
            inner.clone().prop_map(|e| BvExpr::Neg(Box::new(e))),
            (inner.clone(), inner.clone())
                .prop_map(|(a, b)| BvExpr::And(Box::new(a), Box::new(b))),
            (inner.clone(), inner.clone())
                .prop_map(|(a, b)| BvExpr::Or(Box::new(a), Box::new(b))),
            (inner.clone(), inner.clone())
                .prop_map(|(a, b)| BvExpr::Xor(Box::new(a), Box::new(b))),
            prop::collection::vec(inner.clone(), 1..4).prop_map(BvExpr::Add),
            (inner.clone(), inner.clone())
                .prop_map(|(a, b)| BvExpr::Sub(Box::new(a), Box::new(b))),
            (inner.clone(), inner.clone())
                .prop_map(|(a, b)| BvExpr::Mul(Box::new(a), Box::new(b))),
            (0u32..=8, inner.clone()).prop_map(|(k, e)| BvExpr::RotateLeft(k, Box::new(e))),
            (0u32..=8, inner).prop_map(|(k, e)| BvExpr::ShiftLeft0(k, Box::new(e))),
        ]
    })
}

proptest! {
    /// Constant bit-vector expressions match direct machine evaluation
    #[test]
    fn prop_bv_expr_evaluates(e in bv_expr()) {
        let mut stack = TermStack::new(Opcode::NUM_BASE_OPS);
        stack.push_op(Opcode::BUILD_TERM, at()).unwrap();
        e.push(&mut stack);
        stack.evaluate().unwrap();
        let t = stack.result_term().expect("missing result");
        let (width, value) = stack.terms.bv_const_value(t).expect("result not constant");
        prop_assert_eq!(width, 8);
        prop_assert_eq!(value, &BigUint::from(e.eval()));
        prop_assert!(stack.is_empty());
        // after a full command the pool holds at most its four spares
        prop_assert!(stack.pool_occupied() <= 4);
        prop_assert_eq!(stack.buffer_cells(), 0);
    }

    /// Whole-vector extraction is the identity on any constant
    #[test]
    fn prop_identity_extract(v in any::<u64>(), width in 1u32..=64) {
        let mask = if width == 64 { u64::MAX } else { (1 << width) - 1 };
        let v = v & mask;
        let digits: String = (0..width).rev().map(|i| {
            if (v >> i) & 1 == 1 { '1' } else { '0' }
        }).collect();

        let mut stack = TermStack::new(Opcode::NUM_BASE_OPS);
        stack.push_op(Opcode::BUILD_TERM, at()).unwrap();
        stack.push_op(Opcode::MK_BV_EXTRACT, at()).unwrap();
        stack.push_rational(&(width - 1).to_string(), at()).unwrap();
        stack.push_rational("0", at()).unwrap();
        stack.push_bvbin(&digits, at()).unwrap();
        stack.evaluate().unwrap();
        stack.evaluate().unwrap();
        let t = stack.result_term().unwrap();
        let (w, value) = stack.terms.bv_const_value(t).unwrap();
        prop_assert_eq!(w, width);
        prop_assert_eq!(value, &BigUint::from(v));
    }

    /// Folded pushes of an associative operator equal the flat frame
    #[test]
    fn prop_assoc_fold_equivalence(values in prop::collection::vec(any::<u8>(), 2..6)) {
        // folded: re-push the operator before every argument after the first
        let mut folded = TermStack::new(Opcode::NUM_BASE_OPS);
        folded.push_op(Opcode::BUILD_TERM, at()).unwrap();
        folded.push_op(Opcode::MK_BV_ADD, at()).unwrap();
        folded.push_bvbin(&format!("{:08b}", values[0]), at()).unwrap();
        for v in &values[1..] {
            folded.push_op(Opcode::MK_BV_ADD, at()).unwrap();
            folded.push_bvbin(&format!("{v:08b}"), at()).unwrap();
        }
        for _ in 1..values.len() {
            folded.evaluate().unwrap(); // consume the folds
        }
        folded.evaluate().unwrap(); // collapse
        folded.evaluate().unwrap(); // build-term

        let mut flat = TermStack::new(Opcode::NUM_BASE_OPS);
        flat.push_op(Opcode::BUILD_TERM, at()).unwrap();
        flat.push_op(Opcode::MK_BV_ADD, at()).unwrap();
        for v in &values {
            flat.push_bvbin(&format!("{v:08b}"), at()).unwrap();
        }
        flat.evaluate().unwrap();
        flat.evaluate().unwrap();

        let expected = values.iter().fold(0u8, |acc, v| acc.wrapping_add(*v));
        for stack in [&folded, &flat] {
            let t = stack.result_term().unwrap();
            let (w, value) = stack.terms.bv_const_value(t).unwrap();
            prop_assert_eq!(w, 8);
            prop_assert_eq!(value, &BigUint::from(expected));
        }
    }
}
