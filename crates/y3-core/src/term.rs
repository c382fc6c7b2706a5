//! Hash-consed term table
//!
//! Terms are interned structurally with light canonicalization at
//! construction: Boolean connectives fold constants and duplicate
//! arguments, if-then-else folds constant conditions, sums keep a sorted
//! monomial form, and bit-vector operations on constant operands reduce
//! to constants. Uninterpreted terms and variables are nominal (a fresh
//! serial each time).
//!
//! Every constructor type-checks its operands against the [`TypeStore`]
//! and reports a [`CoreError`] instead of building an ill-typed term.
//! The term-name registry uses the same LIFO shadow/restore discipline
//! as the type names: registering a name pushes, removing pops and
//! restores whatever was shadowed.

use hashbrown::HashMap;
use num_bigint::BigUint;
use num_integer::Integer;
use num_rational::BigRational;
use num_traits::{One, Signed, ToPrimitive, Zero};

use crate::bvconst::{normalize, BvConstant};
use crate::error::{CoreError, CoreResult};
use crate::types::{TypeData, TypeId, TypeStore};

/// A term handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TermId(pub u32);

/// Structure of a term
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TermData {
    /// Boolean constant true
    True,
    /// Boolean constant false
    False,
    /// Rational constant
    Rational(BigRational),
    /// Bit-vector constant, value normalized mod 2^width
    BvConst { width: u32, value: BigUint },
    /// Element `index` of a scalar type
    ScalarConst { ty: TypeId, index: u32 },
    /// Uninterpreted constant or function; nominal
    Uninterpreted { serial: u32, ty: TypeId },
    /// Bound variable for quantifiers and lambda; nominal
    Variable { serial: u32, ty: TypeId },

    /// Negation
    Not(TermId),
    /// n-ary disjunction, arguments sorted and deduplicated
    Or(Vec<TermId>),
    /// n-ary conjunction, arguments sorted and deduplicated
    And(Vec<TermId>),
    /// n-ary exclusive or, arguments sorted, pairs cancelled
    Xor(Vec<TermId>),
    /// If-then-else
    Ite {
        cond: TermId,
        then_t: TermId,
        else_t: TermId,
    },
    /// Equality, operands ordered by id
    Eq(TermId, TermId),
    /// Pairwise distinction, arguments sorted
    Distinct(Vec<TermId>),

    /// Function application
    Apply { fun: TermId, args: Vec<TermId> },
    /// Tuple construction
    Tuple(Vec<TermId>),
    /// Tuple projection, 1-based index
    Select { tuple: TermId, index: u32 },
    /// Tuple with one component replaced, 1-based index
    TupleUpdate {
        tuple: TermId,
        index: u32,
        value: TermId,
    },
    /// Function update at a point
    Update {
        fun: TermId,
        args: Vec<TermId>,
        value: TermId,
    },
    /// Universal quantification
    Forall { vars: Vec<TermId>, body: TermId },
    /// Existential quantification
    Exists { vars: Vec<TermId>, body: TermId },
    /// Lambda abstraction
    Lambda { vars: Vec<TermId>, body: TermId },

    /// Rational-coefficient sum, monomials sorted by term id
    ArithSum {
        constant: BigRational,
        monomials: Vec<(BigRational, TermId)>,
    },
    /// Arithmetic product, arguments sorted
    ArithMul(Vec<TermId>),
    /// Arithmetic power
    ArithPow { base: TermId, exponent: u32 },
    /// a >= b
    ArithGe(TermId, TermId),
    /// a > b
    ArithGt(TermId, TermId),
    /// a <= b
    ArithLe(TermId, TermId),
    /// a < b
    ArithLt(TermId, TermId),

    /// Bit-vector sum, coefficients normalized mod 2^width
    BvSum {
        width: u32,
        constant: BigUint,
        monomials: Vec<(BigUint, TermId)>,
    },
    /// Bit-vector product, arguments sorted
    BvMul { width: u32, args: Vec<TermId> },
    /// Bit-vector power
    BvPow { base: TermId, exponent: u32 },
    /// Bit-vector assembled from Boolean bits, least significant first
    BvFromBits(Vec<TermId>),
    /// Boolean bit `index` of a bit-vector term
    BitSelect { bv: TermId, index: u32 },
    /// Unsigned division
    BvDiv(TermId, TermId),
    /// Unsigned remainder
    BvRem(TermId, TermId),
    /// Signed division, rounding toward zero
    BvSdiv(TermId, TermId),
    /// Signed remainder
    BvSrem(TermId, TermId),
    /// Signed modulo, sign of the divisor
    BvSmod(TermId, TermId),
    /// Shift left
    BvShl(TermId, TermId),
    /// Logical shift right
    BvLshr(TermId, TermId),
    /// Arithmetic shift right
    BvAshr(TermId, TermId),
    /// Unsigned a >= b
    BvGe(TermId, TermId),
    /// Unsigned a > b
    BvGt(TermId, TermId),
    /// Unsigned a <= b
    BvLe(TermId, TermId),
    /// Unsigned a < b
    BvLt(TermId, TermId),
    /// Signed a >= b
    BvSge(TermId, TermId),
    /// Signed a > b
    BvSgt(TermId, TermId),
    /// Signed a <= b
    BvSle(TermId, TermId),
    /// Signed a < b
    BvSlt(TermId, TermId),
}

/// The term table
pub struct TermStore {
    data: Vec<TermData>,
    types: Vec<TypeId>,
    interned: HashMap<TermData, TermId>,
    names: HashMap<String, Vec<TermId>>,
    next_serial: u32,
    true_id: TermId,
    false_id: TermId,
}

impl TermStore {
    /// Create a table with `true` and `false` pre-interned
    #[must_use]
    pub fn new(types: &TypeStore) -> Self {
        let bool_ty = types.bool_type();
        let mut store = TermStore {
            data: Vec::new(),
            types: Vec::new(),
            interned: HashMap::new(),
            names: HashMap::new(),
            next_serial: 0,
            true_id: TermId(0),
            false_id: TermId(0),
        };
        store.true_id = store.intern(TermData::True, bool_ty);
        store.false_id = store.intern(TermData::False, bool_ty);
        store
    }

    fn intern(&mut self, data: TermData, ty: TypeId) -> TermId {
        if let Some(&id) = self.interned.get(&data) {
            return id;
        }
        let id = TermId(self.data.len() as u32);
        self.data.push(data.clone());
        self.types.push(ty);
        self.interned.insert(data, id);
        id
    }

    fn fresh(&mut self, data: TermData, ty: TypeId) -> TermId {
        let id = TermId(self.data.len() as u32);
        self.data.push(data);
        self.types.push(ty);
        id
    }

    /// Structure of `t`
    #[must_use]
    pub fn get(&self, t: TermId) -> &TermData {
        &self.data[t.0 as usize]
    }

    /// Type of `t`
    #[must_use]
    pub fn type_of(&self, t: TermId) -> TypeId {
        self.types[t.0 as usize]
    }

    /// Number of terms in the table
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the table holds only the two Boolean constants
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.len() <= 2
    }

    // ------------------------------------------------------------------
    // Constants and atoms
    // ------------------------------------------------------------------

    /// The constant `true`
    #[inline]
    #[must_use]
    pub fn true_term(&self) -> TermId {
        self.true_id
    }

    /// The constant `false`
    #[inline]
    #[must_use]
    pub fn false_term(&self) -> TermId {
        self.false_id
    }

    fn mk_bool(&self, b: bool) -> TermId {
        if b {
            self.true_id
        } else {
            self.false_id
        }
    }

    /// Rational constant
    pub fn mk_rational(&mut self, types: &TypeStore, q: BigRational) -> TermId {
        let ty = if q.is_integer() {
            types.int_type()
        } else {
            types.real_type()
        };
        self.intern(TermData::Rational(q), ty)
    }

    /// Bit-vector constant; the value is reduced mod 2^width
    ///
    /// # Errors
    ///
    /// Fails if the width is invalid.
    pub fn mk_bv_const(
        &mut self,
        types: &mut TypeStore,
        width: u32,
        value: BigUint,
    ) -> CoreResult<TermId> {
        let ty = types.mk_bitvec(width)?;
        let value = normalize(value, width);
        Ok(self.intern(TermData::BvConst { width, value }, ty))
    }

    /// Element `index` of a scalar type (0-based)
    ///
    /// # Errors
    ///
    /// Fails if `ty` is not a scalar type or `index` is out of range.
    pub fn mk_scalar_const(
        &mut self,
        types: &TypeStore,
        ty: TypeId,
        index: u32,
    ) -> CoreResult<TermId> {
        match types.get(ty) {
            TypeData::Scalar { size, .. } if index < *size => {
                Ok(self.intern(TermData::ScalarConst { ty, index }, ty))
            }
            TypeData::Scalar { size, .. } => Err(CoreError::TupleIndexOutOfRange {
                index,
                arity: *size,
            }),
            _ => Err(CoreError::IncompatibleTypes),
        }
    }

    /// Fresh uninterpreted constant (or function, if `ty` is a function type)
    pub fn mk_uninterpreted(&mut self, ty: TypeId) -> TermId {
        let serial = self.next_serial;
        self.next_serial += 1;
        self.fresh(TermData::Uninterpreted { serial, ty }, ty)
    }

    /// Fresh bound variable
    pub fn mk_variable(&mut self, ty: TypeId) -> TermId {
        let serial = self.next_serial;
        self.next_serial += 1;
        self.fresh(TermData::Variable { serial, ty }, ty)
    }

    /// Whether `t` is a bound variable
    #[must_use]
    pub fn is_variable(&self, t: TermId) -> bool {
        matches!(self.get(t), TermData::Variable { .. })
    }

    /// Boolean constant value of `t`, when it is one
    #[must_use]
    pub fn bool_const_value(&self, t: TermId) -> Option<bool> {
        match self.get(t) {
            TermData::True => Some(true),
            TermData::False => Some(false),
            _ => None,
        }
    }

    /// Rational constant value of `t`, when it is one
    #[must_use]
    pub fn rational_const_value(&self, t: TermId) -> Option<&BigRational> {
        match self.get(t) {
            TermData::Rational(q) => Some(q),
            _ => None,
        }
    }

    /// Bit-vector constant value of `t`, when it is one
    #[must_use]
    pub fn bv_const_value(&self, t: TermId) -> Option<(u32, &BigUint)> {
        match self.get(t) {
            TermData::BvConst { width, value } => Some((*width, value)),
            _ => None,
        }
    }

    /// Width of `t` when its type is a bit-vector type
    #[must_use]
    pub fn bv_width(&self, types: &TypeStore, t: TermId) -> Option<u32> {
        types.bv_width(self.type_of(t))
    }

    fn is_const(&self, t: TermId) -> bool {
        matches!(
            self.get(t),
            TermData::True
                | TermData::False
                | TermData::Rational(_)
                | TermData::BvConst { .. }
                | TermData::ScalarConst { .. }
        )
    }

    fn check_bool(&self, types: &TypeStore, t: TermId) -> CoreResult<()> {
        if self.type_of(t) == types.bool_type() {
            Ok(())
        } else {
            Err(CoreError::NotABoolean)
        }
    }

    fn check_arith(&self, types: &TypeStore, t: TermId) -> CoreResult<()> {
        if types.is_arith(self.type_of(t)) {
            Ok(())
        } else {
            Err(CoreError::NotArithmetic)
        }
    }

    fn check_bv(&self, types: &TypeStore, t: TermId, width: u32) -> CoreResult<()> {
        match self.bv_width(types, t) {
            Some(w) if w == width => Ok(()),
            Some(w) => Err(CoreError::IncompatibleBvWidths(w, width)),
            None => Err(CoreError::NotABitvector),
        }
    }

    // ------------------------------------------------------------------
    // Boolean connectives
    // ------------------------------------------------------------------

    /// Negation
    ///
    /// # Errors
    ///
    /// Fails if `t` is not Boolean.
    pub fn mk_not(&mut self, types: &TypeStore, t: TermId) -> CoreResult<TermId> {
        self.check_bool(types, t)?;
        let id = match self.get(t) {
            TermData::True => self.false_id,
            TermData::False => self.true_id,
            TermData::Not(inner) => *inner,
            _ => self.intern(TermData::Not(t), types.bool_type()),
        };
        Ok(id)
    }

    /// n-ary disjunction (n >= 1)
    ///
    /// # Errors
    ///
    /// Fails on an empty list or a non-Boolean argument.
    pub fn mk_or(&mut self, types: &TypeStore, args: Vec<TermId>) -> CoreResult<TermId> {
        if args.is_empty() {
            return Err(CoreError::EmptyArguments);
        }
        let mut kept = Vec::with_capacity(args.len());
        for t in args {
            self.check_bool(types, t)?;
            match self.bool_const_value(t) {
                Some(true) => return Ok(self.true_id),
                Some(false) => {}
                None => kept.push(t),
            }
        }
        kept.sort_unstable();
        kept.dedup();
        Ok(match kept.len() {
            0 => self.false_id,
            1 => kept[0],
            _ => self.intern(TermData::Or(kept), types.bool_type()),
        })
    }

    /// n-ary conjunction (n >= 1)
    ///
    /// # Errors
    ///
    /// Fails on an empty list or a non-Boolean argument.
    pub fn mk_and(&mut self, types: &TypeStore, args: Vec<TermId>) -> CoreResult<TermId> {
        if args.is_empty() {
            return Err(CoreError::EmptyArguments);
        }
        let mut kept = Vec::with_capacity(args.len());
        for t in args {
            self.check_bool(types, t)?;
            match self.bool_const_value(t) {
                Some(false) => return Ok(self.false_id),
                Some(true) => {}
                None => kept.push(t),
            }
        }
        kept.sort_unstable();
        kept.dedup();
        Ok(match kept.len() {
            0 => self.true_id,
            1 => kept[0],
            _ => self.intern(TermData::And(kept), types.bool_type()),
        })
    }

    /// n-ary exclusive or (n >= 1); equal pairs cancel
    ///
    /// # Errors
    ///
    /// Fails on an empty list or a non-Boolean argument.
    pub fn mk_xor(&mut self, types: &TypeStore, args: Vec<TermId>) -> CoreResult<TermId> {
        if args.is_empty() {
            return Err(CoreError::EmptyArguments);
        }
        let mut parity = false;
        let mut kept = Vec::with_capacity(args.len());
        for t in args {
            self.check_bool(types, t)?;
            match self.bool_const_value(t) {
                Some(b) => parity ^= b,
                None => kept.push(t),
            }
        }
        kept.sort_unstable();
        // remove cancelling pairs
        let mut reduced: Vec<TermId> = Vec::with_capacity(kept.len());
        for t in kept {
            if reduced.last() == Some(&t) {
                reduced.pop();
            } else {
                reduced.push(t);
            }
        }
        let base = match reduced.len() {
            0 => self.mk_bool(false),
            1 => reduced[0],
            _ => self.intern(TermData::Xor(reduced), types.bool_type()),
        };
        if parity {
            self.mk_not(types, base)
        } else {
            Ok(base)
        }
    }

    /// Boolean equivalence
    ///
    /// # Errors
    ///
    /// Fails on non-Boolean arguments.
    pub fn mk_iff(&mut self, types: &TypeStore, a: TermId, b: TermId) -> CoreResult<TermId> {
        self.check_bool(types, a)?;
        self.check_bool(types, b)?;
        match (self.bool_const_value(a), self.bool_const_value(b)) {
            (Some(x), Some(y)) => Ok(self.mk_bool(x == y)),
            (Some(true), None) => Ok(b),
            (None, Some(true)) => Ok(a),
            (Some(false), None) => self.mk_not(types, b),
            (None, Some(false)) => self.mk_not(types, a),
            (None, None) => self.mk_eq_unchecked(types, a, b),
        }
    }

    /// Implication `a => b`
    ///
    /// # Errors
    ///
    /// Fails on non-Boolean arguments.
    pub fn mk_implies(&mut self, types: &TypeStore, a: TermId, b: TermId) -> CoreResult<TermId> {
        let na = self.mk_not(types, a)?;
        self.mk_or(types, vec![na, b])
    }

    /// If-then-else
    ///
    /// # Errors
    ///
    /// Fails if `cond` is not Boolean or the branches are incompatible.
    pub fn mk_ite(
        &mut self,
        types: &mut TypeStore,
        cond: TermId,
        then_t: TermId,
        else_t: TermId,
    ) -> CoreResult<TermId> {
        self.check_bool(types, cond)?;
        match self.bool_const_value(cond) {
            Some(true) => return Ok(then_t),
            Some(false) => return Ok(else_t),
            None => {}
        }
        if then_t == else_t {
            return Ok(then_t);
        }
        let ty = types
            .super_type(self.type_of(then_t), self.type_of(else_t))
            .ok_or(CoreError::IncompatibleTypes)?;
        Ok(self.intern(
            TermData::Ite {
                cond,
                then_t,
                else_t,
            },
            ty,
        ))
    }

    fn mk_eq_unchecked(&mut self, types: &TypeStore, a: TermId, b: TermId) -> CoreResult<TermId> {
        if a == b {
            return Ok(self.true_id);
        }
        if self.is_const(a) && self.is_const(b) {
            // distinct interned constants of compatible type are unequal
            return Ok(self.false_id);
        }
        let (x, y) = if a < b { (a, b) } else { (b, a) };
        Ok(self.intern(TermData::Eq(x, y), types.bool_type()))
    }

    /// Equality
    ///
    /// # Errors
    ///
    /// Fails if the argument types are incompatible.
    pub fn mk_eq(&mut self, types: &mut TypeStore, a: TermId, b: TermId) -> CoreResult<TermId> {
        if !types.compatible(self.type_of(a), self.type_of(b)) {
            return Err(CoreError::IncompatibleTypes);
        }
        self.mk_eq_unchecked(types, a, b)
    }

    /// Disequality, `not (= a b)`
    ///
    /// # Errors
    ///
    /// Fails if the argument types are incompatible.
    pub fn mk_neq(&mut self, types: &mut TypeStore, a: TermId, b: TermId) -> CoreResult<TermId> {
        let eq = self.mk_eq(types, a, b)?;
        self.mk_not(types, eq)
    }

    /// Pairwise distinction (n >= 2)
    ///
    /// # Errors
    ///
    /// Fails on fewer than two arguments or incompatible types.
    pub fn mk_distinct(&mut self, types: &mut TypeStore, args: Vec<TermId>) -> CoreResult<TermId> {
        if args.len() < 2 {
            return Err(CoreError::ArityMismatch {
                expected: 2,
                actual: args.len(),
            });
        }
        for pair in args.windows(2) {
            if !types.compatible(self.type_of(pair[0]), self.type_of(pair[1])) {
                return Err(CoreError::IncompatibleTypes);
            }
        }
        let mut sorted = args;
        sorted.sort_unstable();
        if sorted.windows(2).any(|w| w[0] == w[1]) {
            return Ok(self.false_id);
        }
        if sorted.len() == 2 {
            return self.mk_neq(types, sorted[0], sorted[1]);
        }
        if sorted.iter().all(|&t| self.is_const(t)) {
            // interned constants are distinct iff their handles are
            return Ok(self.true_id);
        }
        Ok(self.intern(TermData::Distinct(sorted), types.bool_type()))
    }

    // ------------------------------------------------------------------
    // Polymorphic constructors
    // ------------------------------------------------------------------

    /// Function application
    ///
    /// # Errors
    ///
    /// Fails if `fun` is not a function or the arguments do not fit its
    /// domain.
    pub fn mk_apply(
        &mut self,
        types: &TypeStore,
        fun: TermId,
        args: Vec<TermId>,
    ) -> CoreResult<TermId> {
        let (domain, range) = match types.get(self.type_of(fun)) {
            TypeData::Fun { domain, range } => (domain.clone(), *range),
            _ => return Err(CoreError::NotAFunction),
        };
        if args.len() != domain.len() {
            return Err(CoreError::ArityMismatch {
                expected: domain.len(),
                actual: args.len(),
            });
        }
        for (&arg, &dom) in args.iter().zip(&domain) {
            if !types.is_subtype(self.type_of(arg), dom) {
                return Err(CoreError::TypeMismatch);
            }
        }
        Ok(self.intern(TermData::Apply { fun, args }, range))
    }

    /// Tuple construction
    ///
    /// # Errors
    ///
    /// Fails on an empty component list.
    pub fn mk_tuple(&mut self, types: &mut TypeStore, args: Vec<TermId>) -> CoreResult<TermId> {
        let component_types: Vec<TypeId> = args.iter().map(|&t| self.type_of(t)).collect();
        let ty = types.mk_tuple(component_types)?;
        Ok(self.intern(TermData::Tuple(args), ty))
    }

    /// Tuple projection, 1-based index
    ///
    /// # Errors
    ///
    /// Fails if `tuple` is not a tuple or the index is out of range.
    pub fn mk_select(
        &mut self,
        types: &TypeStore,
        tuple: TermId,
        index: u32,
    ) -> CoreResult<TermId> {
        let components = match types.get(self.type_of(tuple)) {
            TypeData::Tuple(cs) => cs.clone(),
            _ => return Err(CoreError::NotATuple),
        };
        if index == 0 || index as usize > components.len() {
            return Err(CoreError::TupleIndexOutOfRange {
                index,
                arity: components.len() as u32,
            });
        }
        if let TermData::Tuple(elems) = self.get(tuple) {
            return Ok(elems[(index - 1) as usize]);
        }
        let ty = components[(index - 1) as usize];
        Ok(self.intern(TermData::Select { tuple, index }, ty))
    }

    /// Tuple with component `index` (1-based) replaced by `value`
    ///
    /// # Errors
    ///
    /// Fails if `tuple` is not a tuple, the index is out of range, or
    /// the value does not fit the component type.
    pub fn mk_tuple_update(
        &mut self,
        types: &TypeStore,
        tuple: TermId,
        index: u32,
        value: TermId,
    ) -> CoreResult<TermId> {
        let components = match types.get(self.type_of(tuple)) {
            TypeData::Tuple(cs) => cs.clone(),
            _ => return Err(CoreError::NotATuple),
        };
        if index == 0 || index as usize > components.len() {
            return Err(CoreError::TupleIndexOutOfRange {
                index,
                arity: components.len() as u32,
            });
        }
        if !types.is_subtype(self.type_of(value), components[(index - 1) as usize]) {
            return Err(CoreError::TypeMismatch);
        }
        let ty = self.type_of(tuple);
        Ok(self.intern(
            TermData::TupleUpdate {
                tuple,
                index,
                value,
            },
            ty,
        ))
    }

    /// Function update: `fun` with the value at `args` replaced
    ///
    /// # Errors
    ///
    /// Fails if `fun` is not a function or the point/value do not fit.
    pub fn mk_update(
        &mut self,
        types: &TypeStore,
        fun: TermId,
        args: Vec<TermId>,
        value: TermId,
    ) -> CoreResult<TermId> {
        let (domain, range) = match types.get(self.type_of(fun)) {
            TypeData::Fun { domain, range } => (domain.clone(), *range),
            _ => return Err(CoreError::NotAFunction),
        };
        if args.len() != domain.len() {
            return Err(CoreError::ArityMismatch {
                expected: domain.len(),
                actual: args.len(),
            });
        }
        for (&arg, &dom) in args.iter().zip(&domain) {
            if !types.is_subtype(self.type_of(arg), dom) {
                return Err(CoreError::TypeMismatch);
            }
        }
        if !types.is_subtype(self.type_of(value), range) {
            return Err(CoreError::TypeMismatch);
        }
        let ty = self.type_of(fun);
        Ok(self.intern(TermData::Update { fun, args, value }, ty))
    }

    fn check_binder(&self, vars: &[TermId]) -> CoreResult<()> {
        if vars.is_empty() {
            return Err(CoreError::EmptyArguments);
        }
        for &v in vars {
            if !self.is_variable(v) {
                return Err(CoreError::NotAVariable);
            }
        }
        Ok(())
    }

    /// Universal quantification
    ///
    /// # Errors
    ///
    /// Fails if a binder is not a variable or the body is not Boolean.
    pub fn mk_forall(
        &mut self,
        types: &TypeStore,
        vars: Vec<TermId>,
        body: TermId,
    ) -> CoreResult<TermId> {
        self.check_binder(&vars)?;
        self.check_bool(types, body)?;
        Ok(self.intern(TermData::Forall { vars, body }, types.bool_type()))
    }

    /// Existential quantification
    ///
    /// # Errors
    ///
    /// Fails if a binder is not a variable or the body is not Boolean.
    pub fn mk_exists(
        &mut self,
        types: &TypeStore,
        vars: Vec<TermId>,
        body: TermId,
    ) -> CoreResult<TermId> {
        self.check_binder(&vars)?;
        self.check_bool(types, body)?;
        Ok(self.intern(TermData::Exists { vars, body }, types.bool_type()))
    }

    /// Lambda abstraction
    ///
    /// # Errors
    ///
    /// Fails if a binder is not a variable.
    pub fn mk_lambda(
        &mut self,
        types: &mut TypeStore,
        vars: Vec<TermId>,
        body: TermId,
    ) -> CoreResult<TermId> {
        self.check_binder(&vars)?;
        let domain: Vec<TypeId> = vars.iter().map(|&v| self.type_of(v)).collect();
        let ty = types.mk_fun(domain, self.type_of(body))?;
        Ok(self.intern(TermData::Lambda { vars, body }, ty))
    }

    // ------------------------------------------------------------------
    // Arithmetic
    // ------------------------------------------------------------------

    /// Canonical sum of a constant and monomials
    ///
    /// Merges duplicate monomials, drops zero coefficients, and folds the
    /// all-constant and single-unit-monomial forms.
    ///
    /// # Errors
    ///
    /// Fails if a monomial term is not arithmetic.
    pub fn mk_arith_sum(
        &mut self,
        types: &TypeStore,
        constant: BigRational,
        monomials: Vec<(BigRational, TermId)>,
    ) -> CoreResult<TermId> {
        for (_, t) in &monomials {
            self.check_arith(types, *t)?;
        }
        let mut monomials = monomials;
        monomials.sort_unstable_by_key(|&(_, t)| t);
        let mut merged: Vec<(BigRational, TermId)> = Vec::with_capacity(monomials.len());
        for (c, t) in monomials {
            match merged.last_mut() {
                Some((lc, lt)) if *lt == t => *lc += c,
                _ => merged.push((c, t)),
            }
        }
        merged.retain(|(c, _)| !c.is_zero());

        if merged.is_empty() {
            return Ok(self.mk_rational(types, constant));
        }
        if constant.is_zero() && merged.len() == 1 && merged[0].0.is_one() {
            return Ok(merged[0].1);
        }
        let is_int = constant.is_integer()
            && merged
                .iter()
                .all(|(c, t)| c.is_integer() && self.type_of(*t) == types.int_type());
        let ty = if is_int {
            types.int_type()
        } else {
            types.real_type()
        };
        Ok(self.intern(
            TermData::ArithSum {
                constant,
                monomials: merged,
            },
            ty,
        ))
    }

    /// Arithmetic product (n >= 1)
    ///
    /// # Errors
    ///
    /// Fails on an empty list or a non-arithmetic argument.
    pub fn mk_arith_mul(&mut self, types: &TypeStore, args: Vec<TermId>) -> CoreResult<TermId> {
        if args.is_empty() {
            return Err(CoreError::EmptyArguments);
        }
        let mut coeff = BigRational::one();
        let mut kept = Vec::with_capacity(args.len());
        for t in args {
            self.check_arith(types, t)?;
            match self.rational_const_value(t) {
                Some(q) => coeff *= q.clone(),
                None => kept.push(t),
            }
        }
        if kept.is_empty() || coeff.is_zero() {
            return Ok(self.mk_rational(types, coeff));
        }
        kept.sort_unstable();
        let product = if kept.len() == 1 {
            kept[0]
        } else {
            let is_int = kept.iter().all(|&t| self.type_of(t) == types.int_type());
            let ty = if is_int {
                types.int_type()
            } else {
                types.real_type()
            };
            self.intern(TermData::ArithMul(kept), ty)
        };
        if coeff.is_one() {
            Ok(product)
        } else {
            self.mk_arith_sum(types, BigRational::zero(), vec![(coeff, product)])
        }
    }

    /// Arithmetic power with a non-negative integer exponent
    ///
    /// # Errors
    ///
    /// Fails if `base` is not arithmetic.
    pub fn mk_arith_pow(
        &mut self,
        types: &TypeStore,
        base: TermId,
        exponent: u32,
    ) -> CoreResult<TermId> {
        self.check_arith(types, base)?;
        if exponent == 0 {
            return Ok(self.mk_rational(types, BigRational::one()));
        }
        if exponent == 1 {
            return Ok(base);
        }
        if let Some(q) = self.rational_const_value(base) {
            let folded = q.pow(exponent as i32);
            return Ok(self.mk_rational(types, folded));
        }
        let ty = self.type_of(base);
        Ok(self.intern(TermData::ArithPow { base, exponent }, ty))
    }

    fn arith_cmp_consts(&self, a: TermId, b: TermId) -> Option<std::cmp::Ordering> {
        let x = self.rational_const_value(a)?;
        let y = self.rational_const_value(b)?;
        Some(x.cmp(y))
    }

    /// a >= b over Int/Real
    ///
    /// # Errors
    ///
    /// Fails on non-arithmetic arguments.
    pub fn mk_arith_ge(&mut self, types: &TypeStore, a: TermId, b: TermId) -> CoreResult<TermId> {
        self.check_arith(types, a)?;
        self.check_arith(types, b)?;
        if let Some(ord) = self.arith_cmp_consts(a, b) {
            return Ok(self.mk_bool(ord != std::cmp::Ordering::Less));
        }
        if a == b {
            return Ok(self.true_id);
        }
        Ok(self.intern(TermData::ArithGe(a, b), types.bool_type()))
    }

    /// a > b over Int/Real
    ///
    /// # Errors
    ///
    /// Fails on non-arithmetic arguments.
    pub fn mk_arith_gt(&mut self, types: &TypeStore, a: TermId, b: TermId) -> CoreResult<TermId> {
        self.check_arith(types, a)?;
        self.check_arith(types, b)?;
        if let Some(ord) = self.arith_cmp_consts(a, b) {
            return Ok(self.mk_bool(ord == std::cmp::Ordering::Greater));
        }
        if a == b {
            return Ok(self.false_id);
        }
        Ok(self.intern(TermData::ArithGt(a, b), types.bool_type()))
    }

    /// a <= b over Int/Real
    ///
    /// # Errors
    ///
    /// Fails on non-arithmetic arguments.
    pub fn mk_arith_le(&mut self, types: &TypeStore, a: TermId, b: TermId) -> CoreResult<TermId> {
        self.check_arith(types, a)?;
        self.check_arith(types, b)?;
        if let Some(ord) = self.arith_cmp_consts(a, b) {
            return Ok(self.mk_bool(ord != std::cmp::Ordering::Greater));
        }
        if a == b {
            return Ok(self.true_id);
        }
        Ok(self.intern(TermData::ArithLe(a, b), types.bool_type()))
    }

    /// a < b over Int/Real
    ///
    /// # Errors
    ///
    /// Fails on non-arithmetic arguments.
    pub fn mk_arith_lt(&mut self, types: &TypeStore, a: TermId, b: TermId) -> CoreResult<TermId> {
        self.check_arith(types, a)?;
        self.check_arith(types, b)?;
        if let Some(ord) = self.arith_cmp_consts(a, b) {
            return Ok(self.mk_bool(ord == std::cmp::Ordering::Less));
        }
        if a == b {
            return Ok(self.false_id);
        }
        Ok(self.intern(TermData::ArithLt(a, b), types.bool_type()))
    }

    // ------------------------------------------------------------------
    // Bit-vector constructors
    // ------------------------------------------------------------------

    /// Canonical bit-vector sum of a constant and monomials
    ///
    /// Coefficients are reduced mod 2^width; duplicate monomials merge;
    /// the all-constant and single-unit-monomial forms fold.
    ///
    /// # Errors
    ///
    /// Fails if a monomial term is not a bit-vector of the given width.
    pub fn mk_bv_sum(
        &mut self,
        types: &mut TypeStore,
        width: u32,
        constant: BigUint,
        monomials: Vec<(BigUint, TermId)>,
    ) -> CoreResult<TermId> {
        for (_, t) in &monomials {
            self.check_bv(types, *t, width)?;
        }
        let modulus = BigUint::one() << width;
        let mut monomials: Vec<(BigUint, TermId)> = monomials
            .into_iter()
            .map(|(c, t)| (c % &modulus, t))
            .collect();
        monomials.sort_unstable_by_key(|&(_, t)| t);
        let mut merged: Vec<(BigUint, TermId)> = Vec::with_capacity(monomials.len());
        for (c, t) in monomials {
            match merged.last_mut() {
                Some((lc, lt)) if *lt == t => *lc = (&*lc + c) % &modulus,
                _ => merged.push((c, t)),
            }
        }
        merged.retain(|(c, _)| !c.is_zero());

        let constant = constant % &modulus;
        if merged.is_empty() {
            return self.mk_bv_const(types, width, constant);
        }
        if constant.is_zero() && merged.len() == 1 && merged[0].0.is_one() {
            return Ok(merged[0].1);
        }
        let ty = types.mk_bitvec(width)?;
        Ok(self.intern(
            TermData::BvSum {
                width,
                constant,
                monomials: merged,
            },
            ty,
        ))
    }

    /// Bit-vector product (n >= 1)
    ///
    /// # Errors
    ///
    /// Fails on an empty list or mismatched widths.
    pub fn mk_bv_mul(
        &mut self,
        types: &mut TypeStore,
        width: u32,
        args: Vec<TermId>,
    ) -> CoreResult<TermId> {
        if args.is_empty() {
            return Err(CoreError::EmptyArguments);
        }
        let mut coeff = BvConstant::new(width, BigUint::one())?;
        let mut kept = Vec::with_capacity(args.len());
        for t in args {
            self.check_bv(types, t, width)?;
            match self.bv_const_value(t) {
                Some((_, v)) => {
                    let c = BvConstant::new(width, v.clone())?;
                    coeff = coeff.mul(&c);
                }
                None => kept.push(t),
            }
        }
        if kept.is_empty() || coeff.value().is_zero() {
            return self.mk_bv_const(types, width, coeff.into_value());
        }
        kept.sort_unstable();
        let product = if kept.len() == 1 {
            kept[0]
        } else {
            let ty = types.mk_bitvec(width)?;
            self.intern(TermData::BvMul { width, args: kept }, ty)
        };
        if coeff.value().is_one() {
            Ok(product)
        } else {
            self.mk_bv_sum(
                types,
                width,
                BigUint::zero(),
                vec![(coeff.into_value(), product)],
            )
        }
    }

    /// Bit-vector power with a non-negative integer exponent
    ///
    /// # Errors
    ///
    /// Fails if `base` is not a bit-vector.
    pub fn mk_bv_pow(
        &mut self,
        types: &mut TypeStore,
        base: TermId,
        exponent: u32,
    ) -> CoreResult<TermId> {
        let width = self
            .bv_width(types, base)
            .ok_or(CoreError::NotABitvector)?;
        if exponent == 0 {
            return self.mk_bv_const(types, width, BigUint::one());
        }
        if exponent == 1 {
            return Ok(base);
        }
        if let Some((_, v)) = self.bv_const_value(base) {
            let c = BvConstant::new(width, v.clone())?.pow(exponent);
            return self.mk_bv_const(types, width, c.into_value());
        }
        let ty = types.mk_bitvec(width)?;
        Ok(self.intern(TermData::BvPow { base, exponent }, ty))
    }

    /// Bit-vector assembled from Boolean bits, least significant first
    ///
    /// Folds the all-constant row to a constant and the complete
    /// in-order bit row of a single term back to that term.
    ///
    /// # Errors
    ///
    /// Fails on an empty row or a non-Boolean bit.
    pub fn mk_bv_from_bits(
        &mut self,
        types: &mut TypeStore,
        bits: Vec<TermId>,
    ) -> CoreResult<TermId> {
        if bits.is_empty() {
            return Err(CoreError::EmptyArguments);
        }
        let width = bits.len() as u32;
        for &b in &bits {
            self.check_bool(types, b)?;
        }
        if bits.iter().all(|&b| self.bool_const_value(b).is_some()) {
            let mut value = BigUint::zero();
            for (i, &b) in bits.iter().enumerate() {
                if self.bool_const_value(b) == Some(true) {
                    value.set_bit(i as u64, true);
                }
            }
            return self.mk_bv_const(types, width, value);
        }
        // identity row: bit i is (bit-select t i) for one term t of this width
        if let TermData::BitSelect { bv, index: 0 } = self.get(bits[0]) {
            let t = *bv;
            if self.bv_width(types, t) == Some(width) {
                let identity = bits.iter().enumerate().all(|(i, &b)| {
                    matches!(self.get(b),
                        TermData::BitSelect { bv, index } if *bv == t && *index == i as u32)
                });
                if identity {
                    return Ok(t);
                }
            }
        }
        let ty = types.mk_bitvec(width)?;
        Ok(self.intern(TermData::BvFromBits(bits), ty))
    }

    /// Boolean bit `index` of a bit-vector term
    ///
    /// # Errors
    ///
    /// Fails if `bv` is not a bit-vector or the index is out of range.
    pub fn mk_bit_select(
        &mut self,
        types: &TypeStore,
        bv: TermId,
        index: u32,
    ) -> CoreResult<TermId> {
        let width = self.bv_width(types, bv).ok_or(CoreError::NotABitvector)?;
        if index >= width {
            return Err(CoreError::TupleIndexOutOfRange {
                index,
                arity: width,
            });
        }
        match self.get(bv) {
            TermData::BvConst { value, .. } => {
                let b = value.bit(u64::from(index));
                Ok(self.mk_bool(b))
            }
            TermData::BvFromBits(bits) => Ok(bits[index as usize]),
            _ => Ok(self.intern(TermData::BitSelect { bv, index }, types.bool_type())),
        }
    }

    fn bv_binop_widths(
        &self,
        types: &TypeStore,
        a: TermId,
        b: TermId,
    ) -> CoreResult<u32> {
        let wa = self.bv_width(types, a).ok_or(CoreError::NotABitvector)?;
        let wb = self.bv_width(types, b).ok_or(CoreError::NotABitvector)?;
        if wa != wb {
            return Err(CoreError::IncompatibleBvWidths(wa, wb));
        }
        Ok(wa)
    }

    fn bv_const_pair(&self, a: TermId, b: TermId) -> Option<(BvConstant, BvConstant)> {
        let (wa, va) = self.bv_const_value(a)?;
        let (wb, vb) = self.bv_const_value(b)?;
        let ca = BvConstant::new(wa, va.clone()).ok()?;
        let cb = BvConstant::new(wb, vb.clone()).ok()?;
        Some((ca, cb))
    }

    /// Unsigned division (SMT-LIB `bvudiv`); division by a zero constant
    /// stays symbolic
    ///
    /// # Errors
    ///
    /// Fails on mismatched widths.
    pub fn mk_bv_div(&mut self, types: &mut TypeStore, a: TermId, b: TermId) -> CoreResult<TermId> {
        let width = self.bv_binop_widths(types, a, b)?;
        if let Some((ca, cb)) = self.bv_const_pair(a, b) {
            if let Some(q) = ca.udiv(&cb) {
                return self.mk_bv_const(types, width, q.into_value());
            }
        }
        let ty = types.mk_bitvec(width)?;
        Ok(self.intern(TermData::BvDiv(a, b), ty))
    }

    /// Unsigned remainder
    ///
    /// # Errors
    ///
    /// Fails on mismatched widths.
    pub fn mk_bv_rem(&mut self, types: &mut TypeStore, a: TermId, b: TermId) -> CoreResult<TermId> {
        let width = self.bv_binop_widths(types, a, b)?;
        if let Some((ca, cb)) = self.bv_const_pair(a, b) {
            if let Some(r) = ca.urem(&cb) {
                return self.mk_bv_const(types, width, r.into_value());
            }
        }
        let ty = types.mk_bitvec(width)?;
        Ok(self.intern(TermData::BvRem(a, b), ty))
    }

    /// Signed division, rounding toward zero
    ///
    /// # Errors
    ///
    /// Fails on mismatched widths.
    pub fn mk_bv_sdiv(
        &mut self,
        types: &mut TypeStore,
        a: TermId,
        b: TermId,
    ) -> CoreResult<TermId> {
        let width = self.bv_binop_widths(types, a, b)?;
        if let Some((ca, cb)) = self.bv_const_pair(a, b) {
            if !cb.value().is_zero() {
                // BigInt division truncates toward zero, the bvsdiv rounding
                let q = ca.signed_value() / cb.signed_value();
                let v = signed_to_unsigned(q, width);
                return self.mk_bv_const(types, width, v);
            }
        }
        let ty = types.mk_bitvec(width)?;
        Ok(self.intern(TermData::BvSdiv(a, b), ty))
    }

    /// Signed remainder (sign of the dividend)
    ///
    /// # Errors
    ///
    /// Fails on mismatched widths.
    pub fn mk_bv_srem(
        &mut self,
        types: &mut TypeStore,
        a: TermId,
        b: TermId,
    ) -> CoreResult<TermId> {
        let width = self.bv_binop_widths(types, a, b)?;
        if let Some((ca, cb)) = self.bv_const_pair(a, b) {
            if !cb.value().is_zero() {
                // % keeps the dividend's sign, the bvsrem convention
                let r = ca.signed_value() % cb.signed_value();
                let v = signed_to_unsigned(r, width);
                return self.mk_bv_const(types, width, v);
            }
        }
        let ty = types.mk_bitvec(width)?;
        Ok(self.intern(TermData::BvSrem(a, b), ty))
    }

    /// Signed modulo (sign of the divisor)
    ///
    /// # Errors
    ///
    /// Fails on mismatched widths.
    pub fn mk_bv_smod(
        &mut self,
        types: &mut TypeStore,
        a: TermId,
        b: TermId,
    ) -> CoreResult<TermId> {
        let width = self.bv_binop_widths(types, a, b)?;
        if let Some((ca, cb)) = self.bv_const_pair(a, b) {
            if !cb.value().is_zero() {
                // floor modulo keeps the divisor's sign, the bvsmod convention
                let m = ca.signed_value().mod_floor(&cb.signed_value());
                let v = signed_to_unsigned(m, width);
                return self.mk_bv_const(types, width, v);
            }
        }
        let ty = types.mk_bitvec(width)?;
        Ok(self.intern(TermData::BvSmod(a, b), ty))
    }

    fn shift_amount(&self, b: TermId, width: u32) -> Option<u32> {
        let (_, v) = self.bv_const_value(b)?;
        Some(v.to_u32().map_or(width, |k| k.min(width)))
    }

    /// Shift left by a symbolic amount
    ///
    /// # Errors
    ///
    /// Fails on mismatched widths.
    pub fn mk_bv_shl(&mut self, types: &mut TypeStore, a: TermId, b: TermId) -> CoreResult<TermId> {
        let width = self.bv_binop_widths(types, a, b)?;
        if let Some(k) = self.shift_amount(b, width) {
            if let Some((_, va)) = self.bv_const_value(a) {
                let c = BvConstant::new(width, va.clone())?.shl(k);
                return self.mk_bv_const(types, width, c.into_value());
            }
        }
        let ty = types.mk_bitvec(width)?;
        Ok(self.intern(TermData::BvShl(a, b), ty))
    }

    /// Logical shift right by a symbolic amount
    ///
    /// # Errors
    ///
    /// Fails on mismatched widths.
    pub fn mk_bv_lshr(
        &mut self,
        types: &mut TypeStore,
        a: TermId,
        b: TermId,
    ) -> CoreResult<TermId> {
        let width = self.bv_binop_widths(types, a, b)?;
        if let Some(k) = self.shift_amount(b, width) {
            if let Some((_, va)) = self.bv_const_value(a) {
                let c = BvConstant::new(width, va.clone())?.lshr(k);
                return self.mk_bv_const(types, width, c.into_value());
            }
        }
        let ty = types.mk_bitvec(width)?;
        Ok(self.intern(TermData::BvLshr(a, b), ty))
    }

    /// Arithmetic shift right by a symbolic amount
    ///
    /// # Errors
    ///
    /// Fails on mismatched widths.
    pub fn mk_bv_ashr(
        &mut self,
        types: &mut TypeStore,
        a: TermId,
        b: TermId,
    ) -> CoreResult<TermId> {
        let width = self.bv_binop_widths(types, a, b)?;
        if let Some(k) = self.shift_amount(b, width) {
            if let Some((_, va)) = self.bv_const_value(a) {
                let c = BvConstant::new(width, va.clone())?.ashr(k);
                return self.mk_bv_const(types, width, c.into_value());
            }
        }
        let ty = types.mk_bitvec(width)?;
        Ok(self.intern(TermData::BvAshr(a, b), ty))
    }

    fn mk_bv_atom(
        &mut self,
        types: &TypeStore,
        a: TermId,
        b: TermId,
        signed: bool,
        test: fn(std::cmp::Ordering) -> bool,
        equal_result: bool,
        build: fn(TermId, TermId) -> TermData,
    ) -> CoreResult<TermId> {
        self.bv_binop_widths(types, a, b)?;
        if a == b {
            return Ok(self.mk_bool(equal_result));
        }
        if let Some((ca, cb)) = self.bv_const_pair(a, b) {
            let ord = if signed { ca.scmp(&cb) } else { ca.ucmp(&cb) };
            return Ok(self.mk_bool(test(ord)));
        }
        Ok(self.intern(build(a, b), types.bool_type()))
    }

    /// Unsigned a >= b
    ///
    /// # Errors
    ///
    /// Fails on mismatched widths.
    pub fn mk_bv_ge(&mut self, types: &TypeStore, a: TermId, b: TermId) -> CoreResult<TermId> {
        self.mk_bv_atom(types, a, b, false, |o| o != std::cmp::Ordering::Less, true, TermData::BvGe)
    }

    /// Unsigned a > b
    ///
    /// # Errors
    ///
    /// Fails on mismatched widths.
    pub fn mk_bv_gt(&mut self, types: &TypeStore, a: TermId, b: TermId) -> CoreResult<TermId> {
        self.mk_bv_atom(
            types,
            a,
            b,
            false,
            |o| o == std::cmp::Ordering::Greater,
            false,
            TermData::BvGt,
        )
    }

    /// Unsigned a <= b
    ///
    /// # Errors
    ///
    /// Fails on mismatched widths.
    pub fn mk_bv_le(&mut self, types: &TypeStore, a: TermId, b: TermId) -> CoreResult<TermId> {
        self.mk_bv_atom(
            types,
            a,
            b,
            false,
            |o| o != std::cmp::Ordering::Greater,
            true,
            TermData::BvLe,
        )
    }

    /// Unsigned a < b
    ///
    /// # Errors
    ///
    /// Fails on mismatched widths.
    pub fn mk_bv_lt(&mut self, types: &TypeStore, a: TermId, b: TermId) -> CoreResult<TermId> {
        self.mk_bv_atom(
            types,
            a,
            b,
            false,
            |o| o == std::cmp::Ordering::Less,
            false,
            TermData::BvLt,
        )
    }

    /// Signed a >= b
    ///
    /// # Errors
    ///
    /// Fails on mismatched widths.
    pub fn mk_bv_sge(&mut self, types: &TypeStore, a: TermId, b: TermId) -> CoreResult<TermId> {
        self.mk_bv_atom(types, a, b, true, |o| o != std::cmp::Ordering::Less, true, TermData::BvSge)
    }

    /// Signed a > b
    ///
    /// # Errors
    ///
    /// Fails on mismatched widths.
    pub fn mk_bv_sgt(&mut self, types: &TypeStore, a: TermId, b: TermId) -> CoreResult<TermId> {
        self.mk_bv_atom(
            types,
            a,
            b,
            true,
            |o| o == std::cmp::Ordering::Greater,
            false,
            TermData::BvSgt,
        )
    }

    /// Signed a <= b
    ///
    /// # Errors
    ///
    /// Fails on mismatched widths.
    pub fn mk_bv_sle(&mut self, types: &TypeStore, a: TermId, b: TermId) -> CoreResult<TermId> {
        self.mk_bv_atom(
            types,
            a,
            b,
            true,
            |o| o != std::cmp::Ordering::Greater,
            true,
            TermData::BvSle,
        )
    }

    /// Signed a < b
    ///
    /// # Errors
    ///
    /// Fails on mismatched widths.
    pub fn mk_bv_slt(&mut self, types: &TypeStore, a: TermId, b: TermId) -> CoreResult<TermId> {
        self.mk_bv_atom(
            types,
            a,
            b,
            true,
            |o| o == std::cmp::Ordering::Less,
            false,
            TermData::BvSlt,
        )
    }

    // ------------------------------------------------------------------
    // Name registry
    // ------------------------------------------------------------------

    /// Register `name -> t`, shadowing any previous registration
    pub fn set_name(&mut self, name: &str, t: TermId) {
        self.names.entry(name.to_string()).or_default().push(t);
    }

    /// Current term registered under `name`
    #[must_use]
    pub fn get_by_name(&self, name: &str) -> Option<TermId> {
        self.names.get(name).and_then(|stack| stack.last().copied())
    }

    /// Remove the current registration of `name`, restoring what it shadowed
    pub fn remove_name(&mut self, name: &str) {
        if let Some(stack) = self.names.get_mut(name) {
            stack.pop();
            if stack.is_empty() {
                self.names.remove(name);
            }
        }
    }
}

/// Reduce a signed value into [0, 2^width)
fn signed_to_unsigned(v: num_bigint::BigInt, width: u32) -> BigUint {
    let modulus = num_bigint::BigInt::one() << width;
    let mut v = v % &modulus;
    if v.is_negative() {
        v += &modulus;
    }
    v.to_biguint().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_bigint::BigInt;

    fn setup() -> (TypeStore, TermStore) {
        let types = TypeStore::new();
        let terms = TermStore::new(&types);
        (types, terms)
    }

    fn int(terms: &mut TermStore, types: &TypeStore, v: i64) -> TermId {
        terms.mk_rational(types, BigRational::from(BigInt::from(v)))
    }

    fn bv(terms: &mut TermStore, types: &mut TypeStore, width: u32, v: u64) -> TermId {
        terms.mk_bv_const(types, width, BigUint::from(v)).unwrap()
    }

    #[test]
    fn test_bool_folding() {
        let (types, mut terms) = setup();
        let tt = terms.true_term();
        let ff = terms.false_term();
        assert_eq!(terms.mk_and(&types, vec![tt, ff]).unwrap(), ff);
        assert_eq!(terms.mk_or(&types, vec![tt, ff]).unwrap(), tt);
        assert_eq!(terms.mk_not(&types, tt).unwrap(), ff);
        let nn = terms.mk_not(&types, ff).unwrap();
        assert_eq!(nn, tt);
    }

    #[test]
    fn test_double_negation() {
        let (types, mut terms) = setup();
        let x = terms.mk_uninterpreted(types.bool_type());
        let nx = terms.mk_not(&types, x).unwrap();
        assert_eq!(terms.mk_not(&types, nx).unwrap(), x);
    }

    #[test]
    fn test_or_dedup_and_sort() {
        let (types, mut terms) = setup();
        let x = terms.mk_uninterpreted(types.bool_type());
        let y = terms.mk_uninterpreted(types.bool_type());
        let a = terms.mk_or(&types, vec![y, x, y]).unwrap();
        let b = terms.mk_or(&types, vec![x, y]).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_xor_cancellation() {
        let (types, mut terms) = setup();
        let x = terms.mk_uninterpreted(types.bool_type());
        let y = terms.mk_uninterpreted(types.bool_type());
        assert_eq!(
            terms.mk_xor(&types, vec![x, y, x]).unwrap(),
            y
        );
        let tt = terms.true_term();
        let nx = terms.mk_not(&types, x).unwrap();
        assert_eq!(terms.mk_xor(&types, vec![x, tt]).unwrap(), nx);
    }

    #[test]
    fn test_eq_folding() {
        let (mut types, mut terms) = setup();
        let a = int(&mut terms, &types, 1);
        let b = int(&mut terms, &types, 2);
        assert_eq!(terms.mk_eq(&mut types, a, a).unwrap(), terms.true_term());
        assert_eq!(terms.mk_eq(&mut types, a, b).unwrap(), terms.false_term());
        let x = terms.mk_uninterpreted(types.int_type());
        let e1 = terms.mk_eq(&mut types, x, a).unwrap();
        let e2 = terms.mk_eq(&mut types, a, x).unwrap();
        assert_eq!(e1, e2);
    }

    #[test]
    fn test_eq_incompatible() {
        let (mut types, mut terms) = setup();
        let a = int(&mut terms, &types, 1);
        let b = terms.true_term();
        assert!(terms.mk_eq(&mut types, a, b).is_err());
    }

    #[test]
    fn test_ite_folding() {
        let (mut types, mut terms) = setup();
        let a = int(&mut terms, &types, 1);
        let b = int(&mut terms, &types, 2);
        let tt = terms.true_term();
        assert_eq!(terms.mk_ite(&mut types, tt, a, b).unwrap(), a);
        let c = terms.mk_uninterpreted(types.bool_type());
        assert_eq!(terms.mk_ite(&mut types, c, a, a).unwrap(), a);
        // int/real branches widen to real
        let half = terms.mk_rational(&types, BigRational::new(BigInt::from(1), BigInt::from(2)));
        let ite = terms.mk_ite(&mut types, c, a, half).unwrap();
        assert_eq!(terms.type_of(ite), types.real_type());
    }

    #[test]
    fn test_arith_sum_canonical() {
        let (types, mut terms) = setup();
        let x = terms.mk_uninterpreted(types.int_type());
        let one = BigRational::one();
        // x + x -> 2x ; 2x - 2x -> 0
        let s = terms
            .mk_arith_sum(
                &types,
                BigRational::zero(),
                vec![(one.clone(), x), (one.clone(), x)],
            )
            .unwrap();
        match terms.get(s) {
            TermData::ArithSum { monomials, .. } => {
                assert_eq!(monomials.len(), 1);
                assert_eq!(monomials[0].0, BigRational::from(BigInt::from(2)));
            }
            other => panic!("expected sum, got {other:?}"),
        }
        let z = terms
            .mk_arith_sum(
                &types,
                BigRational::zero(),
                vec![(one.clone(), x), (-one.clone(), x)],
            )
            .unwrap();
        assert_eq!(terms.rational_const_value(z), Some(&BigRational::zero()));
        // unit monomial folds to the term itself
        let u = terms
            .mk_arith_sum(&types, BigRational::zero(), vec![(one, x)])
            .unwrap();
        assert_eq!(u, x);
    }

    #[test]
    fn test_arith_mul_folding() {
        let (types, mut terms) = setup();
        let a = int(&mut terms, &types, 6);
        let b = int(&mut terms, &types, 7);
        let p = terms.mk_arith_mul(&types, vec![a, b]).unwrap();
        assert_eq!(
            terms.rational_const_value(p),
            Some(&BigRational::from(BigInt::from(42)))
        );
    }

    #[test]
    fn test_bv_const_normalized() {
        let (mut types, mut terms) = setup();
        let a = bv(&mut terms, &mut types, 4, 0x1f);
        let b = bv(&mut terms, &mut types, 4, 0x0f);
        assert_eq!(a, b);
    }

    #[test]
    fn test_bv_sum_folding() {
        let (mut types, mut terms) = setup();
        let ty = types.mk_bitvec(4).unwrap();
        let x = terms.mk_uninterpreted(ty);
        let one = BigUint::one();
        // x + x merges to 2x
        let s = terms
            .mk_bv_sum(
                &mut types,
                4,
                BigUint::zero(),
                vec![(one.clone(), x), (one.clone(), x)],
            )
            .unwrap();
        match terms.get(s) {
            TermData::BvSum { monomials, .. } => {
                assert_eq!(monomials.len(), 1);
                assert_eq!(monomials[0].0, BigUint::from(2u32));
            }
            other => panic!("expected sum, got {other:?}"),
        }
        // 15x + x cancels mod 16
        let c15 = BigUint::from(15u32);
        let z = terms
            .mk_bv_sum(&mut types, 4, BigUint::zero(), vec![(c15, x), (one.clone(), x)])
            .unwrap();
        assert_eq!(
            terms.bv_const_value(z).map(|(_, v)| v.clone()),
            Some(BigUint::zero())
        );
        // unit monomial folds to the term itself
        let u = terms
            .mk_bv_sum(&mut types, 4, BigUint::zero(), vec![(one, x)])
            .unwrap();
        assert_eq!(u, x);
    }

    #[test]
    fn test_bv_atoms_fold() {
        let (mut types, mut terms) = setup();
        let a = bv(&mut terms, &mut types, 4, 15);
        let b = bv(&mut terms, &mut types, 4, 0);
        let tt = terms.true_term();
        let ff = terms.false_term();
        assert_eq!(terms.mk_bv_gt(&types, a, b).unwrap(), tt);
        // signed: 15 is -1
        assert_eq!(terms.mk_bv_sgt(&types, a, b).unwrap(), ff);
        assert_eq!(terms.mk_bv_ge(&types, a, a).unwrap(), tt);
    }

    #[test]
    fn test_bv_width_mismatch() {
        let (mut types, mut terms) = setup();
        let a = bv(&mut terms, &mut types, 4, 1);
        let b = bv(&mut terms, &mut types, 8, 1);
        assert_eq!(
            terms.mk_bv_div(&mut types, a, b),
            Err(CoreError::IncompatibleBvWidths(4, 8))
        );
    }

    #[test]
    fn test_bv_division_folding() {
        let (mut types, mut terms) = setup();
        let a = bv(&mut terms, &mut types, 8, 100);
        let b = bv(&mut terms, &mut types, 8, 7);
        let q = terms.mk_bv_div(&mut types, a, b).unwrap();
        assert_eq!(
            terms.bv_const_value(q).map(|(_, v)| v.clone()),
            Some(BigUint::from(14u32))
        );
        // division by a zero constant stays symbolic
        let z = bv(&mut terms, &mut types, 8, 0);
        let d = terms.mk_bv_div(&mut types, a, z).unwrap();
        assert!(terms.bv_const_value(d).is_none());
    }

    #[test]
    fn test_bv_sdiv_rounding() {
        let (mut types, mut terms) = setup();
        // -7 / 2 = -3 (truncation toward zero)
        let a = bv(&mut terms, &mut types, 8, 0xf9); // -7
        let b = bv(&mut terms, &mut types, 8, 2);
        let q = terms.mk_bv_sdiv(&mut types, a, b).unwrap();
        assert_eq!(
            terms.bv_const_value(q).map(|(_, v)| v.clone()),
            Some(BigUint::from(0xfdu32)) // -3
        );
    }

    #[test]
    fn test_bits_roundtrip_identity() {
        let (mut types, mut terms) = setup();
        let ty = types.mk_bitvec(4).unwrap();
        let x = terms.mk_uninterpreted(ty);
        let bits: Vec<TermId> = (0..4)
            .map(|i| terms.mk_bit_select(&types, x, i).unwrap())
            .collect();
        assert_eq!(terms.mk_bv_from_bits(&mut types, bits).unwrap(), x);
    }

    #[test]
    fn test_bits_constant_fold() {
        let (mut types, mut terms) = setup();
        let tt = terms.true_term();
        let ff = terms.false_term();
        // 0b0101 lsb-first = [1, 0, 1, 0]
        let v = terms
            .mk_bv_from_bits(&mut types, vec![tt, ff, tt, ff])
            .unwrap();
        assert_eq!(
            terms.bv_const_value(v).map(|(_, x)| x.clone()),
            Some(BigUint::from(5u32))
        );
    }

    #[test]
    fn test_apply_type_check() {
        let (mut types, mut terms) = setup();
        let int = types.int_type();
        let fun_ty = types.mk_fun(vec![int], int).unwrap();
        let f = terms.mk_uninterpreted(fun_ty);
        let a = int_term(&mut terms, &types, 3);
        let app = terms.mk_apply(&types, f, vec![a]).unwrap();
        assert_eq!(terms.type_of(app), int);
        let b = terms.true_term();
        assert!(terms.mk_apply(&types, f, vec![b]).is_err());
        assert!(terms.mk_apply(&types, f, vec![a, a]).is_err());
    }

    fn int_term(terms: &mut TermStore, types: &TypeStore, v: i64) -> TermId {
        terms.mk_rational(types, BigRational::from(BigInt::from(v)))
    }

    #[test]
    fn test_tuple_select() {
        let (mut types, mut terms) = setup();
        let a = int_term(&mut terms, &types, 1);
        let b = int_term(&mut terms, &types, 2);
        let t = terms.mk_tuple(&mut types, vec![a, b]).unwrap();
        assert_eq!(terms.mk_select(&types, t, 1).unwrap(), a);
        assert_eq!(terms.mk_select(&types, t, 2).unwrap(), b);
        assert!(terms.mk_select(&types, t, 0).is_err());
        assert!(terms.mk_select(&types, t, 3).is_err());
    }

    #[test]
    fn test_forall_requires_variables() {
        let (types, mut terms) = setup();
        let int = types.int_type();
        let v = terms.mk_variable(int);
        let c = terms.mk_uninterpreted(int);
        let body = terms.mk_arith_ge(&types, v, c).unwrap();
        assert!(terms.mk_forall(&types, vec![v], body).is_ok());
        assert!(terms.mk_forall(&types, vec![c], body).is_err());
    }

    #[test]
    fn test_name_shadowing() {
        let (types, mut terms) = setup();
        let a = terms.mk_uninterpreted(types.int_type());
        let b = terms.mk_uninterpreted(types.int_type());
        terms.set_name("x", a);
        terms.set_name("x", b);
        assert_eq!(terms.get_by_name("x"), Some(b));
        terms.remove_name("x");
        assert_eq!(terms.get_by_name("x"), Some(a));
        terms.remove_name("x");
        assert_eq!(terms.get_by_name("x"), None);
    }
}
