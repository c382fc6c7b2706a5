//! Recyclable accumulator buffers
//!
//! Four buffer kinds accumulate partial results during evaluation: a
//! rational polynomial, a small (<= 64 bit) bit-vector polynomial, a
//! wide bit-vector polynomial, and a bit-vector logic buffer holding one
//! Boolean term per bit. The [`BufferPool`] keeps at most one spare
//! instance of each kind; acquisition takes the slot (or lazily builds a
//! fresh buffer) and recycling returns it when the slot is free.
//!
//! Ownership moves make aliasing between the pool slot and a stack cell
//! unrepresentable: a buffer is either in the pool, held by an in-flight
//! evaluator, or stored in exactly one cell.

use num_bigint::BigUint;
use num_rational::BigRational;
use num_traits::{One, Zero};

use y3_core::{normalize, normalize64, BvConstant, CoreResult, TermId, TermStore, TypeStore};

/// Rational-coefficient polynomial accumulator
#[derive(Debug, Default)]
pub struct RatPoly {
    constant: BigRational,
    monomials: Vec<(BigRational, TermId)>,
}

impl RatPoly {
    /// Empty polynomial
    #[must_use]
    pub fn new() -> Self {
        RatPoly::default()
    }

    /// Reset to zero
    pub fn clear(&mut self) {
        self.constant = BigRational::zero();
        self.monomials.clear();
    }

    /// Whether the polynomial has no monomials
    #[must_use]
    pub fn is_constant(&self) -> bool {
        self.monomials.is_empty()
    }

    /// Constant value, when the polynomial is constant
    #[must_use]
    pub fn constant_value(&self) -> Option<&BigRational> {
        if self.is_constant() {
            Some(&self.constant)
        } else {
            None
        }
    }

    /// Add a constant
    pub fn add_const(&mut self, q: &BigRational) {
        self.constant += q;
    }

    /// Subtract a constant
    pub fn sub_const(&mut self, q: &BigRational) {
        self.constant -= q;
    }

    /// Add `coeff * t`, merging with an existing monomial on `t`
    pub fn add_mono(&mut self, coeff: BigRational, t: TermId) {
        if coeff.is_zero() {
            return;
        }
        if let Some(pos) = self.monomials.iter().position(|&(_, u)| u == t) {
            self.monomials[pos].0 += coeff;
            if self.monomials[pos].0.is_zero() {
                self.monomials.swap_remove(pos);
            }
        } else {
            self.monomials.push((coeff, t));
        }
    }

    /// Add a term with coefficient 1
    pub fn add_term(&mut self, t: TermId) {
        self.add_mono(BigRational::one(), t);
    }

    /// Subtract a term
    pub fn sub_term(&mut self, t: TermId) {
        self.add_mono(-BigRational::one(), t);
    }

    /// Add another polynomial
    pub fn add_poly(&mut self, other: &RatPoly) {
        self.constant += &other.constant;
        for (c, t) in &other.monomials {
            self.add_mono(c.clone(), *t);
        }
    }

    /// Subtract another polynomial
    pub fn sub_poly(&mut self, other: &RatPoly) {
        self.constant -= &other.constant;
        for (c, t) in &other.monomials {
            self.add_mono(-c.clone(), *t);
        }
    }

    /// Multiply by a constant
    pub fn mul_const(&mut self, q: &BigRational) {
        if q.is_zero() {
            self.clear();
            return;
        }
        self.constant *= q;
        for (c, _) in &mut self.monomials {
            *c *= q;
        }
    }

    /// Negate in place
    pub fn negate(&mut self) {
        self.constant = -self.constant.clone();
        for (c, _) in &mut self.monomials {
            *c = -c.clone();
        }
    }

    /// Materialize into the term table
    ///
    /// # Errors
    ///
    /// Propagates builder errors.
    pub fn to_term(&self, terms: &mut TermStore, types: &TypeStore) -> CoreResult<TermId> {
        terms.mk_arith_sum(types, self.constant.clone(), self.monomials.clone())
    }
}

/// Bit-vector polynomial accumulator, widths 1 to 64
#[derive(Debug)]
pub struct Bv64Poly {
    width: u32,
    constant: u64,
    monomials: Vec<(u64, TermId)>,
}

impl Bv64Poly {
    /// Zero polynomial of the given width
    #[must_use]
    pub fn new(width: u32) -> Self {
        debug_assert!(1 <= width && width <= 64);
        Bv64Poly {
            width,
            constant: 0,
            monomials: Vec::new(),
        }
    }

    /// Reset to zero and set the width
    pub fn prepare(&mut self, width: u32) {
        debug_assert!(1 <= width && width <= 64);
        self.width = width;
        self.constant = 0;
        self.monomials.clear();
    }

    /// Width in bits
    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Whether the polynomial has no monomials
    #[must_use]
    pub fn is_constant(&self) -> bool {
        self.monomials.is_empty()
    }

    /// Constant value, when the polynomial is constant
    #[must_use]
    pub fn constant_value(&self) -> Option<u64> {
        if self.is_constant() {
            Some(self.constant)
        } else {
            None
        }
    }

    /// Add a constant (wrapping)
    pub fn add_const(&mut self, v: u64) {
        self.constant = normalize64(self.constant.wrapping_add(v), self.width);
    }

    /// Subtract a constant (wrapping)
    pub fn sub_const(&mut self, v: u64) {
        self.constant = normalize64(self.constant.wrapping_sub(v), self.width);
    }

    /// Add `coeff * t`, merging with an existing monomial on `t`
    pub fn add_mono(&mut self, coeff: u64, t: TermId) {
        let coeff = normalize64(coeff, self.width);
        if coeff == 0 {
            return;
        }
        if let Some(pos) = self.monomials.iter().position(|&(_, u)| u == t) {
            let merged = normalize64(self.monomials[pos].0.wrapping_add(coeff), self.width);
            if merged == 0 {
                self.monomials.swap_remove(pos);
            } else {
                self.monomials[pos].0 = merged;
            }
        } else {
            self.monomials.push((coeff, t));
        }
    }

    /// Add a term with coefficient 1
    pub fn add_term(&mut self, t: TermId) {
        self.add_mono(1, t);
    }

    /// Subtract a term
    pub fn sub_term(&mut self, t: TermId) {
        self.add_mono(normalize64(u64::MAX, self.width), t);
    }

    /// Add another polynomial of the same width
    pub fn add_poly(&mut self, other: &Bv64Poly) {
        debug_assert_eq!(self.width, other.width);
        self.add_const(other.constant);
        for &(c, t) in &other.monomials {
            self.add_mono(c, t);
        }
    }

    /// Subtract another polynomial of the same width
    pub fn sub_poly(&mut self, other: &Bv64Poly) {
        debug_assert_eq!(self.width, other.width);
        self.sub_const(other.constant);
        for &(c, t) in &other.monomials {
            self.add_mono(normalize64(c.wrapping_neg(), self.width), t);
        }
    }

    /// Multiply by a constant (wrapping)
    pub fn mul_const(&mut self, v: u64) {
        let v = normalize64(v, self.width);
        if v == 0 {
            self.constant = 0;
            self.monomials.clear();
            return;
        }
        self.constant = normalize64(self.constant.wrapping_mul(v), self.width);
        let width = self.width;
        self.monomials.retain_mut(|(c, _)| {
            *c = normalize64(c.wrapping_mul(v), width);
            *c != 0
        });
    }

    /// Negate in place
    pub fn negate(&mut self) {
        self.constant = normalize64(self.constant.wrapping_neg(), self.width);
        for (c, _) in &mut self.monomials {
            *c = normalize64(c.wrapping_neg(), self.width);
        }
    }

    /// Materialize into the term table
    ///
    /// # Errors
    ///
    /// Propagates builder errors.
    pub fn to_term(&self, terms: &mut TermStore, types: &mut TypeStore) -> CoreResult<TermId> {
        let monomials = self
            .monomials
            .iter()
            .map(|&(c, t)| (BigUint::from(c), t))
            .collect();
        terms.mk_bv_sum(types, self.width, BigUint::from(self.constant), monomials)
    }
}

/// Bit-vector polynomial accumulator, widths above 64
#[derive(Debug)]
pub struct BvPoly {
    width: u32,
    constant: BigUint,
    monomials: Vec<(BigUint, TermId)>,
}

impl BvPoly {
    /// Zero polynomial of the given width
    #[must_use]
    pub fn new(width: u32) -> Self {
        debug_assert!(width > 64);
        BvPoly {
            width,
            constant: BigUint::zero(),
            monomials: Vec::new(),
        }
    }

    /// Reset to zero and set the width
    pub fn prepare(&mut self, width: u32) {
        debug_assert!(width > 64);
        self.width = width;
        self.constant = BigUint::zero();
        self.monomials.clear();
    }

    /// Width in bits
    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Whether the polynomial has no monomials
    #[must_use]
    pub fn is_constant(&self) -> bool {
        self.monomials.is_empty()
    }

    /// Constant value, when the polynomial is constant
    #[must_use]
    pub fn constant_value(&self) -> Option<&BigUint> {
        if self.is_constant() {
            Some(&self.constant)
        } else {
            None
        }
    }

    fn neg_coeff(&self, c: &BigUint) -> BigUint {
        if c.is_zero() {
            BigUint::zero()
        } else {
            (BigUint::one() << self.width) - c
        }
    }

    /// Add a constant
    pub fn add_const(&mut self, v: &BigUint) {
        self.constant = normalize(&self.constant + v, self.width);
    }

    /// Subtract a constant
    pub fn sub_const(&mut self, v: &BigUint) {
        let neg = self.neg_coeff(&normalize(v.clone(), self.width));
        self.constant = normalize(&self.constant + neg, self.width);
    }

    /// Add `coeff * t`, merging with an existing monomial on `t`
    pub fn add_mono(&mut self, coeff: BigUint, t: TermId) {
        let coeff = normalize(coeff, self.width);
        if coeff.is_zero() {
            return;
        }
        if let Some(pos) = self.monomials.iter().position(|&(_, u)| u == t) {
            let merged = normalize(&self.monomials[pos].0 + coeff, self.width);
            if merged.is_zero() {
                self.monomials.swap_remove(pos);
            } else {
                self.monomials[pos].0 = merged;
            }
        } else {
            self.monomials.push((coeff, t));
        }
    }

    /// Add a term with coefficient 1
    pub fn add_term(&mut self, t: TermId) {
        self.add_mono(BigUint::one(), t);
    }

    /// Subtract a term
    pub fn sub_term(&mut self, t: TermId) {
        let minus_one = self.neg_coeff(&BigUint::one());
        self.add_mono(minus_one, t);
    }

    /// Add another polynomial of the same width
    pub fn add_poly(&mut self, other: &BvPoly) {
        debug_assert_eq!(self.width, other.width);
        let c = other.constant.clone();
        self.add_const(&c);
        for (c, t) in &other.monomials {
            self.add_mono(c.clone(), *t);
        }
    }

    /// Subtract another polynomial of the same width
    pub fn sub_poly(&mut self, other: &BvPoly) {
        debug_assert_eq!(self.width, other.width);
        let c = other.constant.clone();
        self.sub_const(&c);
        for (c, t) in &other.monomials {
            let neg = self.neg_coeff(c);
            self.add_mono(neg, *t);
        }
    }

    /// Multiply by a constant
    pub fn mul_const(&mut self, v: &BigUint) {
        let v = normalize(v.clone(), self.width);
        if v.is_zero() {
            self.constant = BigUint::zero();
            self.monomials.clear();
            return;
        }
        self.constant = normalize(&self.constant * &v, self.width);
        let width = self.width;
        self.monomials.retain_mut(|(c, _)| {
            *c = normalize(&*c * &v, width);
            !c.is_zero()
        });
    }

    /// Negate in place
    pub fn negate(&mut self) {
        let neg = self.neg_coeff(&self.constant.clone());
        self.constant = neg;
        let width = self.width;
        for (c, _) in &mut self.monomials {
            if !c.is_zero() {
                *c = (BigUint::one() << width) - &*c;
            }
        }
    }

    /// Materialize into the term table
    ///
    /// # Errors
    ///
    /// Propagates builder errors.
    pub fn to_term(&self, terms: &mut TermStore, types: &mut TypeStore) -> CoreResult<TermId> {
        terms.mk_bv_sum(
            types,
            self.width,
            self.constant.clone(),
            self.monomials.clone(),
        )
    }
}

/// Bit-vector logic buffer: one Boolean term per bit, least significant
/// first
///
/// Constant bits are the term table's `true`/`false` handles, so bitwise
/// operations inherit the table's constant folding.
#[derive(Debug, Default)]
pub struct BvLogic {
    bits: Vec<TermId>,
}

impl BvLogic {
    /// Empty buffer
    #[must_use]
    pub fn new() -> Self {
        BvLogic::default()
    }

    /// Drop all bits
    pub fn clear(&mut self) {
        self.bits.clear();
    }

    /// Whether the buffer holds no bits
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    /// Width in bits
    #[must_use]
    pub fn width(&self) -> u32 {
        self.bits.len() as u32
    }

    /// The bit row, least significant first
    #[must_use]
    pub fn bits(&self) -> &[TermId] {
        &self.bits
    }

    /// Load a small constant
    pub fn set_constant64(&mut self, terms: &TermStore, width: u32, value: u64) {
        self.bits.clear();
        for i in 0..width {
            let b = (value >> i) & 1 == 1;
            self.bits.push(if b {
                terms.true_term()
            } else {
                terms.false_term()
            });
        }
    }

    /// Load a wide constant
    pub fn set_constant(&mut self, terms: &TermStore, value: &BvConstant) {
        self.bits.clear();
        for i in 0..value.width() {
            self.bits.push(if value.bit(i) {
                terms.true_term()
            } else {
                terms.false_term()
            });
        }
    }

    /// Load the bit row of a bit-vector term
    ///
    /// # Errors
    ///
    /// Fails if `t` is not a bit-vector.
    pub fn set_term(
        &mut self,
        terms: &mut TermStore,
        types: &TypeStore,
        t: TermId,
    ) -> CoreResult<()> {
        let width = terms
            .bv_width(types, t)
            .ok_or(y3_core::CoreError::NotABitvector)?;
        self.bits.clear();
        for i in 0..width {
            self.bits.push(terms.mk_bit_select(types, t, i)?);
        }
        Ok(())
    }

    /// Load an explicit bit row
    pub fn set_bits(&mut self, bits: Vec<TermId>) {
        self.bits = bits;
    }

    /// Complement every bit
    ///
    /// # Errors
    ///
    /// Propagates builder errors.
    pub fn not(&mut self, terms: &mut TermStore, types: &TypeStore) -> CoreResult<()> {
        for b in &mut self.bits {
            *b = terms.mk_not(types, *b)?;
        }
        Ok(())
    }

    /// Bitwise and with another row of the same width
    ///
    /// # Errors
    ///
    /// Propagates builder errors.
    pub fn and_bits(
        &mut self,
        terms: &mut TermStore,
        types: &TypeStore,
        other: &[TermId],
    ) -> CoreResult<()> {
        debug_assert_eq!(self.bits.len(), other.len());
        for (b, &o) in self.bits.iter_mut().zip(other) {
            *b = terms.mk_and(types, vec![*b, o])?;
        }
        Ok(())
    }

    /// Bitwise or with another row of the same width
    ///
    /// # Errors
    ///
    /// Propagates builder errors.
    pub fn or_bits(
        &mut self,
        terms: &mut TermStore,
        types: &TypeStore,
        other: &[TermId],
    ) -> CoreResult<()> {
        debug_assert_eq!(self.bits.len(), other.len());
        for (b, &o) in self.bits.iter_mut().zip(other) {
            *b = terms.mk_or(types, vec![*b, o])?;
        }
        Ok(())
    }

    /// Bitwise xor with another row of the same width
    ///
    /// # Errors
    ///
    /// Propagates builder errors.
    pub fn xor_bits(
        &mut self,
        terms: &mut TermStore,
        types: &TypeStore,
        other: &[TermId],
    ) -> CoreResult<()> {
        debug_assert_eq!(self.bits.len(), other.len());
        for (b, &o) in self.bits.iter_mut().zip(other) {
            *b = terms.mk_xor(types, vec![*b, o])?;
        }
        Ok(())
    }

    /// Shift toward the most significant end by `k`, filling with `fill`
    pub fn shift_left(&mut self, k: u32, fill: TermId) {
        let n = self.bits.len();
        let k = (k as usize).min(n);
        self.bits.truncate(n - k);
        self.bits.splice(0..0, std::iter::repeat(fill).take(k));
    }

    /// Shift toward the least significant end by `k`, filling with `fill`
    pub fn shift_right(&mut self, k: u32, fill: TermId) {
        let n = self.bits.len();
        let k = (k as usize).min(n);
        self.bits.drain(0..k);
        self.bits.extend(std::iter::repeat(fill).take(k));
    }

    /// Arithmetic shift right by `k` (sign bit fills)
    pub fn ashift_right(&mut self, k: u32) {
        let fill = *self.bits.last().expect("empty logic buffer");
        self.shift_right(k, fill);
    }

    /// Rotate toward the most significant end by `k < width`
    pub fn rotate_left(&mut self, k: u32) {
        let n = self.bits.len();
        debug_assert!((k as usize) < n);
        self.bits.rotate_right(k as usize % n);
    }

    /// Rotate toward the least significant end by `k < width`
    pub fn rotate_right(&mut self, k: u32) {
        let n = self.bits.len();
        debug_assert!((k as usize) < n);
        self.bits.rotate_left(k as usize % n);
    }

    /// Keep bits `low..=high`
    pub fn extract(&mut self, low: u32, high: u32) {
        debug_assert!(low <= high && (high as usize) < self.bits.len());
        self.bits.truncate(high as usize + 1);
        self.bits.drain(0..low as usize);
    }

    /// Insert another row below the current bits
    pub fn concat_low(&mut self, other: &[TermId]) {
        self.bits.splice(0..0, other.iter().copied());
    }

    /// Repeat the whole row `k >= 1` times
    pub fn repeat(&mut self, k: u32) {
        let base = self.bits.clone();
        for _ in 1..k {
            self.bits.extend_from_slice(&base);
        }
    }

    /// Append `k` copies of `fill` at the most significant end
    pub fn extend_high(&mut self, k: u32, fill: TermId) {
        self.bits.extend(std::iter::repeat(fill).take(k as usize));
    }

    /// Append `k` copies of the sign bit
    pub fn sign_extend(&mut self, k: u32) {
        let fill = *self.bits.last().expect("empty logic buffer");
        self.extend_high(k, fill);
    }

    /// Reduce to one bit: and over all bits
    ///
    /// # Errors
    ///
    /// Propagates builder errors.
    pub fn redand(&mut self, terms: &mut TermStore, types: &TypeStore) -> CoreResult<()> {
        let bit = terms.mk_and(types, self.bits.clone())?;
        self.bits = vec![bit];
        Ok(())
    }

    /// Reduce to one bit: or over all bits
    ///
    /// # Errors
    ///
    /// Propagates builder errors.
    pub fn redor(&mut self, terms: &mut TermStore, types: &TypeStore) -> CoreResult<()> {
        let bit = terms.mk_or(types, self.bits.clone())?;
        self.bits = vec![bit];
        Ok(())
    }

    /// Reduce to one bit: equality comparator against another row
    ///
    /// # Errors
    ///
    /// Propagates builder errors.
    pub fn comp(
        &mut self,
        terms: &mut TermStore,
        types: &TypeStore,
        other: &[TermId],
    ) -> CoreResult<()> {
        debug_assert_eq!(self.bits.len(), other.len());
        let mut eqs = Vec::with_capacity(self.bits.len());
        for (&b, &o) in self.bits.iter().zip(other) {
            eqs.push(terms.mk_iff(types, b, o)?);
        }
        let bit = terms.mk_and(types, eqs)?;
        self.bits = vec![bit];
        Ok(())
    }

    /// Whether every bit is a Boolean constant
    #[must_use]
    pub fn is_constant(&self, terms: &TermStore) -> bool {
        self.bits
            .iter()
            .all(|&b| terms.bool_const_value(b).is_some())
    }

    /// Assemble the constant value, when every bit is constant
    #[must_use]
    pub fn const_value(&self, terms: &TermStore) -> Option<BvConstant> {
        let mut value = BigUint::zero();
        for (i, &b) in self.bits.iter().enumerate() {
            match terms.bool_const_value(b)? {
                true => value.set_bit(i as u64, true),
                false => {}
            }
        }
        BvConstant::new(self.width(), value).ok()
    }

    /// Materialize into the term table
    ///
    /// # Errors
    ///
    /// Propagates builder errors.
    pub fn to_term(&self, terms: &mut TermStore, types: &mut TypeStore) -> CoreResult<TermId> {
        terms.mk_bv_from_bits(types, self.bits.clone())
    }
}

/// One-slot-per-kind pool of spare accumulators
#[derive(Debug, Default)]
pub struct BufferPool {
    rat: Option<Box<RatPoly>>,
    bv64: Option<Box<Bv64Poly>>,
    bv: Option<Box<BvPoly>>,
    logic: Option<Box<BvLogic>>,
}

impl BufferPool {
    /// Empty pool; buffers are built lazily on first acquisition
    #[must_use]
    pub fn new() -> Self {
        BufferPool::default()
    }

    /// Take a cleared rational polynomial
    pub fn acquire_rat(&mut self) -> Box<RatPoly> {
        match self.rat.take() {
            Some(mut b) => {
                b.clear();
                b
            }
            None => Box::new(RatPoly::new()),
        }
    }

    /// Take a zeroed small bit-vector polynomial of the given width
    pub fn acquire_bv64(&mut self, width: u32) -> Box<Bv64Poly> {
        match self.bv64.take() {
            Some(mut b) => {
                b.prepare(width);
                b
            }
            None => Box::new(Bv64Poly::new(width)),
        }
    }

    /// Take a zeroed wide bit-vector polynomial of the given width
    pub fn acquire_bv(&mut self, width: u32) -> Box<BvPoly> {
        match self.bv.take() {
            Some(mut b) => {
                b.prepare(width);
                b
            }
            None => Box::new(BvPoly::new(width)),
        }
    }

    /// Take a cleared logic buffer
    pub fn acquire_logic(&mut self) -> Box<BvLogic> {
        match self.logic.take() {
            Some(mut b) => {
                b.clear();
                b
            }
            None => Box::new(BvLogic::new()),
        }
    }

    /// Return a rational polynomial; dropped if the slot is taken
    pub fn recycle_rat(&mut self, b: Box<RatPoly>) {
        if self.rat.is_none() {
            self.rat = Some(b);
        }
    }

    /// Return a small bit-vector polynomial; dropped if the slot is taken
    pub fn recycle_bv64(&mut self, b: Box<Bv64Poly>) {
        if self.bv64.is_none() {
            self.bv64 = Some(b);
        }
    }

    /// Return a wide bit-vector polynomial; dropped if the slot is taken
    pub fn recycle_bv(&mut self, b: Box<BvPoly>) {
        if self.bv.is_none() {
            self.bv = Some(b);
        }
    }

    /// Return a logic buffer; dropped if the slot is taken
    pub fn recycle_logic(&mut self, b: Box<BvLogic>) {
        if self.logic.is_none() {
            self.logic = Some(b);
        }
    }

    /// Number of occupied slots (diagnostics)
    #[must_use]
    pub fn occupied(&self) -> usize {
        usize::from(self.rat.is_some())
            + usize::from(self.bv64.is_some())
            + usize::from(self.bv.is_some())
            + usize::from(self.logic.is_some())
    }
}
