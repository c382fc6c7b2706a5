//! Argument coercions
//!
//! Evaluators read stack cells through the conversions here. A cell may
//! hold a value in any of several carriers (literal constant, term
//! handle, polynomial buffer, logic buffer); the conversion to the form
//! an operation needs happens at evaluation time. Cross-carrier
//! conversions preserve bit widths or fail, and never take a buffer out
//! of its cell: buffer contents are read in place and the cell keeps
//! ownership until its frame is popped.

use num_bigint::BigUint;
use num_rational::BigRational;
use num_traits::ToPrimitive;

use y3_core::{BvConstant, CoreError, TermId};

use crate::buffer::{Bv64Poly, BvLogic, BvPoly, RatPoly};
use crate::cell::Value;
use crate::error::{ErrorKind, StackError, StackResult};
use crate::stack::TermStack;

/// Map a term/type builder refusal onto a stack error at the current
/// frame
///
/// Width mismatches and carrier misuse get their precise kinds; anything
/// else is reported as an external builder error.
pub(crate) fn external_error(stack: &TermStack, err: &CoreError) -> StackError {
    let kind = match err {
        CoreError::IncompatibleBvWidths(_, _) => ErrorKind::IncompatibleBvSizes,
        CoreError::NotABitvector => ErrorKind::BvArithError,
        CoreError::NotArithmetic => ErrorKind::ArithError,
        _ => ErrorKind::External,
    };
    stack.frame_error(kind)
}

/// Interpret the cell at `idx` as a term
///
/// Symbols resolve through the term-name registry; constants and
/// accumulator buffers are materialized through the term builder.
pub(crate) fn get_term(stack: &mut TermStack, idx: usize) -> StackResult<TermId> {
    match &stack.elems[idx].value {
        Value::Term(t) => Ok(*t),
        Value::Symbol(s) => match stack.terms.get_by_name(s) {
            Some(t) => Ok(t),
            None => Err(stack.cell_error(idx, ErrorKind::UndefTerm)),
        },
        Value::Bv64 { width, value } => {
            let (w, v) = (*width, *value);
            stack
                .terms
                .mk_bv_const(&mut stack.types, w, BigUint::from(v))
                .map_err(|e| external_error(stack, &e))
        }
        Value::Bv(c) => {
            let (w, v) = (c.width(), c.value().clone());
            stack
                .terms
                .mk_bv_const(&mut stack.types, w, v)
                .map_err(|e| external_error(stack, &e))
        }
        Value::Rational(q) => {
            let q = q.clone();
            Ok(stack.terms.mk_rational(&stack.types, q))
        }
        Value::RatBuffer(b) => b
            .to_term(&mut stack.terms, &stack.types)
            .map_err(|e| external_error(stack, &e)),
        Value::Bv64Buffer(b) => b
            .to_term(&mut stack.terms, &mut stack.types)
            .map_err(|e| external_error(stack, &e)),
        Value::BvBuffer(b) => b
            .to_term(&mut stack.terms, &mut stack.types)
            .map_err(|e| external_error(stack, &e)),
        Value::LogicBuffer(b) => b
            .to_term(&mut stack.terms, &mut stack.types)
            .map_err(|e| external_error(stack, &e)),
        _ => Err(stack.cell_error(idx, ErrorKind::Internal)),
    }
}

/// Integer value of a rational cell
///
/// The cell must already be tag-checked as a rational.
pub(crate) fn get_integer(stack: &TermStack, idx: usize) -> StackResult<i32> {
    match &stack.elems[idx].value {
        Value::Rational(q) => {
            if !q.is_integer() {
                return Err(stack.cell_error(idx, ErrorKind::NotAnInteger));
            }
            q.to_integer()
                .to_i32()
                .ok_or_else(|| stack.cell_error(idx, ErrorKind::IntegerOverflow))
        }
        _ => Err(stack.cell_error(idx, ErrorKind::Internal)),
    }
}

/// Bit width of the cell at `idx`, for any bit-vector carrier
pub(crate) fn elem_bitsize(stack: &TermStack, idx: usize) -> StackResult<u32> {
    match &stack.elems[idx].value {
        Value::Bv64 { width, .. } => Ok(*width),
        Value::Bv(c) => Ok(c.width()),
        Value::Term(t) => stack
            .terms
            .bv_width(&stack.types, *t)
            .ok_or_else(|| stack.cell_error(idx, ErrorKind::BvArithError)),
        Value::Bv64Buffer(b) => Ok(b.width()),
        Value::BvBuffer(b) => Ok(b.width()),
        Value::LogicBuffer(b) => {
            if b.is_empty() {
                Err(stack.cell_error(idx, ErrorKind::BvLogicError))
            } else {
                Ok(b.width())
            }
        }
        _ => Err(stack.cell_error(idx, ErrorKind::BvArithError)),
    }
}

/// Structural bit-vector constant value of the cell at `idx`, when the
/// cell is constant in its carrier
pub(crate) fn bvconst_of_elem(stack: &TermStack, idx: usize) -> Option<BvConstant> {
    match &stack.elems[idx].value {
        Value::Bv64 { width, value } => BvConstant::new(*width, BigUint::from(*value)).ok(),
        Value::Bv(c) => Some(c.clone()),
        Value::Term(t) => {
            let (w, v) = stack.terms.bv_const_value(*t)?;
            BvConstant::new(w, v.clone()).ok()
        }
        Value::Bv64Buffer(b) => {
            let v = b.constant_value()?;
            BvConstant::new(b.width(), BigUint::from(v)).ok()
        }
        Value::BvBuffer(b) => {
            let v = b.constant_value()?.clone();
            BvConstant::new(b.width(), v).ok()
        }
        Value::LogicBuffer(b) => b.const_value(&stack.terms),
        _ => None,
    }
}

/// Constant rational value of the cell at `idx`, when there is one
pub(crate) fn rational_of_elem(stack: &TermStack, idx: usize) -> Option<BigRational> {
    match &stack.elems[idx].value {
        Value::Rational(q) => Some(q.clone()),
        Value::Term(t) => stack.terms.rational_const_value(*t).cloned(),
        Value::RatBuffer(b) => b.constant_value().cloned(),
        _ => None,
    }
}

/// The Boolean bit row of the cell at `idx`
///
/// When `expect` is given, a row of any other width fails with
/// `INCOMPATIBLE_BVSIZES` at the cell.
pub(crate) fn elem_bits(
    stack: &mut TermStack,
    idx: usize,
    expect: Option<u32>,
) -> StackResult<Vec<TermId>> {
    let width = elem_bitsize(stack, idx)?;
    if let Some(w) = expect {
        if w != width {
            return Err(stack.cell_error(idx, ErrorKind::IncompatibleBvSizes));
        }
    }
    match &stack.elems[idx].value {
        Value::Bv64 { width, value } => {
            let (w, v) = (*width, *value);
            let tt = stack.terms.true_term();
            let ff = stack.terms.false_term();
            Ok((0..w)
                .map(|i| if (v >> i) & 1 == 1 { tt } else { ff })
                .collect())
        }
        Value::Bv(c) => {
            let c = c.clone();
            let tt = stack.terms.true_term();
            let ff = stack.terms.false_term();
            Ok((0..c.width())
                .map(|i| if c.bit(i) { tt } else { ff })
                .collect())
        }
        Value::LogicBuffer(b) => Ok(b.bits().to_vec()),
        _ => {
            // materialize the carrier as a term, then select its bits
            let t = get_term(stack, idx)?;
            let mut bits = Vec::with_capacity(width as usize);
            for i in 0..width {
                let bit = stack
                    .terms
                    .mk_bit_select(&stack.types, t, i)
                    .map_err(|e| external_error(stack, &e))?;
                bits.push(bit);
            }
            Ok(bits)
        }
    }
}

/// Load the cell at `idx` into a logic buffer
pub(crate) fn bvl_set_elem(
    stack: &mut TermStack,
    b: &mut BvLogic,
    idx: usize,
) -> StackResult<()> {
    let bits = elem_bits(stack, idx, None)?;
    b.set_bits(bits);
    Ok(())
}

fn check_term_width(stack: &TermStack, idx: usize, t: TermId, n: u32) -> StackResult<()> {
    match stack.terms.bv_width(&stack.types, t) {
        Some(w) if w == n => Ok(()),
        Some(_) => Err(stack.cell_error(idx, ErrorKind::IncompatibleBvSizes)),
        None => Err(stack.cell_error(idx, ErrorKind::BvArithError)),
    }
}

// ----------------------------------------------------------------------
// Small bit-vector polynomial: add / sub / mul one element
// ----------------------------------------------------------------------

/// Add the cell at `idx` to `b`
pub(crate) fn bva64_add_elem(
    stack: &mut TermStack,
    b: &mut Bv64Poly,
    idx: usize,
) -> StackResult<()> {
    let n = b.width();
    match &stack.elems[idx].value {
        Value::Bv64 { width, value } => {
            if *width != n {
                return Err(stack.cell_error(idx, ErrorKind::IncompatibleBvSizes));
            }
            b.add_const(*value);
            Ok(())
        }
        Value::Bv(_) | Value::BvBuffer(_) => {
            Err(stack.cell_error(idx, ErrorKind::IncompatibleBvSizes))
        }
        Value::Term(t) => {
            let t = *t;
            check_term_width(stack, idx, t, n)?;
            b.add_term(t);
            Ok(())
        }
        Value::Bv64Buffer(other) => {
            if other.width() != n {
                return Err(stack.cell_error(idx, ErrorKind::IncompatibleBvSizes));
            }
            b.add_poly(other);
            Ok(())
        }
        Value::LogicBuffer(other) => {
            if other.width() != n {
                return Err(stack.cell_error(idx, ErrorKind::IncompatibleBvSizes));
            }
            let t = other
                .to_term(&mut stack.terms, &mut stack.types)
                .map_err(|e| external_error(stack, &e))?;
            b.add_term(t);
            Ok(())
        }
        _ => Err(stack.cell_error(idx, ErrorKind::BvArithError)),
    }
}

/// Subtract the cell at `idx` from `b`
pub(crate) fn bva64_sub_elem(
    stack: &mut TermStack,
    b: &mut Bv64Poly,
    idx: usize,
) -> StackResult<()> {
    let n = b.width();
    match &stack.elems[idx].value {
        Value::Bv64 { width, value } => {
            if *width != n {
                return Err(stack.cell_error(idx, ErrorKind::IncompatibleBvSizes));
            }
            b.sub_const(*value);
            Ok(())
        }
        Value::Bv(_) | Value::BvBuffer(_) => {
            Err(stack.cell_error(idx, ErrorKind::IncompatibleBvSizes))
        }
        Value::Term(t) => {
            let t = *t;
            check_term_width(stack, idx, t, n)?;
            b.sub_term(t);
            Ok(())
        }
        Value::Bv64Buffer(other) => {
            if other.width() != n {
                return Err(stack.cell_error(idx, ErrorKind::IncompatibleBvSizes));
            }
            b.sub_poly(other);
            Ok(())
        }
        Value::LogicBuffer(other) => {
            if other.width() != n {
                return Err(stack.cell_error(idx, ErrorKind::IncompatibleBvSizes));
            }
            let t = other
                .to_term(&mut stack.terms, &mut stack.types)
                .map_err(|e| external_error(stack, &e))?;
            b.sub_term(t);
            Ok(())
        }
        _ => Err(stack.cell_error(idx, ErrorKind::BvArithError)),
    }
}

/// Multiply `b` by the cell at `idx`
pub(crate) fn bva64_mul_elem(
    stack: &mut TermStack,
    b: &mut Bv64Poly,
    idx: usize,
) -> StackResult<()> {
    let n = b.width();
    let width = elem_bitsize(stack, idx)?;
    if width != n {
        return Err(stack.cell_error(idx, ErrorKind::IncompatibleBvSizes));
    }
    if let Some(c) = bvconst_of_elem(stack, idx) {
        let v = c.value().to_u64().unwrap_or(0);
        b.mul_const(v);
        return Ok(());
    }
    let t = get_term(stack, idx)?;
    if let Some(c) = b.constant_value() {
        b.prepare(n);
        b.add_mono(c, t);
        return Ok(());
    }
    let left = b
        .to_term(&mut stack.terms, &mut stack.types)
        .map_err(|e| external_error(stack, &e))?;
    let product = stack
        .terms
        .mk_bv_mul(&mut stack.types, n, vec![left, t])
        .map_err(|e| external_error(stack, &e))?;
    b.prepare(n);
    b.add_term(product);
    Ok(())
}

// ----------------------------------------------------------------------
// Wide bit-vector polynomial: add / sub / mul one element
// ----------------------------------------------------------------------

/// Add the cell at `idx` to `b`
pub(crate) fn bva_add_elem(stack: &mut TermStack, b: &mut BvPoly, idx: usize) -> StackResult<()> {
    let n = b.width();
    match &stack.elems[idx].value {
        Value::Bv(c) => {
            if c.width() != n {
                return Err(stack.cell_error(idx, ErrorKind::IncompatibleBvSizes));
            }
            let v = c.value().clone();
            b.add_const(&v);
            Ok(())
        }
        Value::Bv64 { .. } | Value::Bv64Buffer(_) => {
            Err(stack.cell_error(idx, ErrorKind::IncompatibleBvSizes))
        }
        Value::Term(t) => {
            let t = *t;
            check_term_width(stack, idx, t, n)?;
            b.add_term(t);
            Ok(())
        }
        Value::BvBuffer(other) => {
            if other.width() != n {
                return Err(stack.cell_error(idx, ErrorKind::IncompatibleBvSizes));
            }
            b.add_poly(other);
            Ok(())
        }
        Value::LogicBuffer(other) => {
            if other.width() != n {
                return Err(stack.cell_error(idx, ErrorKind::IncompatibleBvSizes));
            }
            let t = other
                .to_term(&mut stack.terms, &mut stack.types)
                .map_err(|e| external_error(stack, &e))?;
            b.add_term(t);
            Ok(())
        }
        _ => Err(stack.cell_error(idx, ErrorKind::BvArithError)),
    }
}

/// Subtract the cell at `idx` from `b`
pub(crate) fn bva_sub_elem(stack: &mut TermStack, b: &mut BvPoly, idx: usize) -> StackResult<()> {
    let n = b.width();
    match &stack.elems[idx].value {
        Value::Bv(c) => {
            if c.width() != n {
                return Err(stack.cell_error(idx, ErrorKind::IncompatibleBvSizes));
            }
            let v = c.value().clone();
            b.sub_const(&v);
            Ok(())
        }
        Value::Bv64 { .. } | Value::Bv64Buffer(_) => {
            Err(stack.cell_error(idx, ErrorKind::IncompatibleBvSizes))
        }
        Value::Term(t) => {
            let t = *t;
            check_term_width(stack, idx, t, n)?;
            b.sub_term(t);
            Ok(())
        }
        Value::BvBuffer(other) => {
            if other.width() != n {
                return Err(stack.cell_error(idx, ErrorKind::IncompatibleBvSizes));
            }
            b.sub_poly(other);
            Ok(())
        }
        Value::LogicBuffer(other) => {
            if other.width() != n {
                return Err(stack.cell_error(idx, ErrorKind::IncompatibleBvSizes));
            }
            let t = other
                .to_term(&mut stack.terms, &mut stack.types)
                .map_err(|e| external_error(stack, &e))?;
            b.sub_term(t);
            Ok(())
        }
        _ => Err(stack.cell_error(idx, ErrorKind::BvArithError)),
    }
}

/// Multiply `b` by the cell at `idx`
pub(crate) fn bva_mul_elem(stack: &mut TermStack, b: &mut BvPoly, idx: usize) -> StackResult<()> {
    let n = b.width();
    let width = elem_bitsize(stack, idx)?;
    if width != n {
        return Err(stack.cell_error(idx, ErrorKind::IncompatibleBvSizes));
    }
    if let Some(c) = bvconst_of_elem(stack, idx) {
        b.mul_const(c.value());
        return Ok(());
    }
    let t = get_term(stack, idx)?;
    if let Some(c) = b.constant_value() {
        let c = c.clone();
        b.prepare(n);
        b.add_mono(c, t);
        return Ok(());
    }
    let left = b
        .to_term(&mut stack.terms, &mut stack.types)
        .map_err(|e| external_error(stack, &e))?;
    let product = stack
        .terms
        .mk_bv_mul(&mut stack.types, n, vec![left, t])
        .map_err(|e| external_error(stack, &e))?;
    b.prepare(n);
    b.add_term(product);
    Ok(())
}

// ----------------------------------------------------------------------
// Rational polynomial: add / sub / mul one element
// ----------------------------------------------------------------------

fn check_arith_term(stack: &TermStack, idx: usize, t: TermId) -> StackResult<()> {
    if stack.types.is_arith(stack.terms.type_of(t)) {
        Ok(())
    } else {
        Err(stack.cell_error(idx, ErrorKind::ArithError))
    }
}

/// Add the cell at `idx` to `b`
pub(crate) fn rat_add_elem(stack: &mut TermStack, b: &mut RatPoly, idx: usize) -> StackResult<()> {
    match &stack.elems[idx].value {
        Value::Rational(q) => {
            b.add_const(q);
            Ok(())
        }
        Value::Term(t) => {
            let t = *t;
            check_arith_term(stack, idx, t)?;
            b.add_term(t);
            Ok(())
        }
        Value::Symbol(_) => {
            let t = get_term(stack, idx)?;
            check_arith_term(stack, idx, t)?;
            b.add_term(t);
            Ok(())
        }
        Value::RatBuffer(other) => {
            b.add_poly(other);
            Ok(())
        }
        _ => Err(stack.cell_error(idx, ErrorKind::ArithError)),
    }
}

/// Subtract the cell at `idx` from `b`
pub(crate) fn rat_sub_elem(stack: &mut TermStack, b: &mut RatPoly, idx: usize) -> StackResult<()> {
    match &stack.elems[idx].value {
        Value::Rational(q) => {
            b.sub_const(q);
            Ok(())
        }
        Value::Term(t) => {
            let t = *t;
            check_arith_term(stack, idx, t)?;
            b.sub_term(t);
            Ok(())
        }
        Value::Symbol(_) => {
            let t = get_term(stack, idx)?;
            check_arith_term(stack, idx, t)?;
            b.sub_term(t);
            Ok(())
        }
        Value::RatBuffer(other) => {
            b.sub_poly(other);
            Ok(())
        }
        _ => Err(stack.cell_error(idx, ErrorKind::ArithError)),
    }
}

/// Multiply `b` by the cell at `idx`
pub(crate) fn rat_mul_elem(stack: &mut TermStack, b: &mut RatPoly, idx: usize) -> StackResult<()> {
    if let Some(q) = rational_of_elem(stack, idx) {
        b.mul_const(&q);
        return Ok(());
    }
    let t = match &stack.elems[idx].value {
        Value::Term(t) => *t,
        Value::Symbol(_) => get_term(stack, idx)?,
        Value::RatBuffer(other) => other
            .to_term(&mut stack.terms, &stack.types)
            .map_err(|e| external_error(stack, &e))?,
        _ => return Err(stack.cell_error(idx, ErrorKind::ArithError)),
    };
    check_arith_term(stack, idx, t)?;
    if let Some(c) = b.constant_value() {
        let c = c.clone();
        b.clear();
        b.add_mono(c, t);
        return Ok(());
    }
    let left = b
        .to_term(&mut stack.terms, &stack.types)
        .map_err(|e| external_error(stack, &e))?;
    let product = stack
        .terms
        .mk_arith_mul(&stack.types, vec![left, t])
        .map_err(|e| external_error(stack, &e))?;
    b.clear();
    b.add_term(product);
    Ok(())
}
