//! The operator-evaluation stack
//!
//! The stack is driven by a parser: pushes place leaf values or open
//! operator frames, `evaluate` collapses the innermost frame into a
//! single result cell. Index 0 always holds a sentinel operator so that
//! the frame chain is never empty.
//!
//! Every entry point returns `Result`. After the first error the stack
//! is poisoned and refuses further work until [`TermStack::reset`] is
//! called; the error value carries the kind, the offending source
//! location, the opcode under evaluation, and the offending symbol when
//! there is one.

use std::rc::Rc;

use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{One, Zero};

use y3_core::{BvConstant, MacroId, TermId, TermStore, TypeId, TypeStore};

use crate::arena::StringArena;
use crate::buffer::{Bv64Poly, BvLogic, BvPoly, BufferPool, RatPoly};
use crate::cell::{Cell, Loc, OpVal, Tag, Value};
use crate::error::{ErrorKind, StackError, StackResult};
use crate::op_table::{CheckFn, EvalFn, OpTable, Opcode};

/// Initial capacity of the value array
pub const DEFAULT_STACK_CAPACITY: usize = 256;

/// Hard cap on the value array; exceeding it is fatal
pub const MAX_STACK_SIZE: usize = (u32::MAX / 64) as usize;

/// The term-construction stack
pub struct TermStack {
    pub(crate) elems: Vec<Cell>,
    pub(crate) frame: usize,
    pub(crate) top_op: Opcode,

    pub(crate) op_table: OpTable,
    pub(crate) arena: StringArena,
    pub(crate) pool: BufferPool,

    /// The term table this stack builds into
    pub terms: TermStore,
    /// The type table this stack builds into
    pub types: TypeStore,

    tvar_counter: u32,
    result_term: Option<TermId>,
    result_type: Option<TypeId>,
    poisoned: bool,
}

impl TermStack {
    /// Create a stack whose operator table has room for `op_capacity`
    /// opcodes; the predefined operations are installed
    ///
    /// # Panics
    ///
    /// Panics if `op_capacity` is below the predefined opcode count.
    #[must_use]
    pub fn new(op_capacity: u32) -> Self {
        assert!(
            op_capacity >= Opcode::NUM_BASE_OPS,
            "operator table too small for the predefined operations"
        );
        let types = TypeStore::new();
        let terms = TermStore::new(&types);
        let mut elems = Vec::with_capacity(DEFAULT_STACK_CAPACITY);
        elems.push(Cell::new(
            Value::Op(OpVal {
                opcode: Opcode::NO_OP,
                multiplicity: 0,
                prev: 0,
            }),
            Loc::default(),
        ));
        let mut op_table = OpTable::new(op_capacity);
        crate::eval::install_base_ops(&mut op_table);
        TermStack {
            elems,
            frame: 0,
            top_op: Opcode::NO_OP,
            op_table,
            arena: StringArena::new(),
            pool: BufferPool::new(),
            terms,
            types,
            tvar_counter: 0,
            result_term: None,
            result_type: None,
            poisoned: false,
        }
    }

    // ------------------------------------------------------------------
    // Error plumbing
    // ------------------------------------------------------------------

    fn seal<T>(&mut self, r: StackResult<T>) -> StackResult<T> {
        if r.is_err() {
            self.poisoned = true;
        }
        r
    }

    fn guard(&self) -> StackResult<()> {
        if self.poisoned {
            Err(StackError {
                kind: ErrorKind::Internal,
                loc: Loc::default(),
                op: self.top_op,
                symbol: None,
            })
        } else {
            Ok(())
        }
    }

    /// Error on a push, before any cell exists for it
    pub(crate) fn push_error(&self, loc: Loc, kind: ErrorKind, text: Option<&str>) -> StackError {
        StackError {
            kind,
            loc,
            op: Opcode::NO_OP,
            symbol: text.map(str::to_string),
        }
    }

    /// Error attributed to the cell at `idx`
    pub(crate) fn cell_error(&self, idx: usize, kind: ErrorKind) -> StackError {
        let cell = &self.elems[idx];
        StackError {
            kind,
            loc: cell.loc,
            op: self.top_op,
            symbol: cell.value.symbol_text().map(str::to_string),
        }
    }

    /// Error attributed to the current frame's operator cell
    pub(crate) fn frame_error(&self, kind: ErrorKind) -> StackError {
        self.cell_error(self.frame, kind)
    }

    // ------------------------------------------------------------------
    // Cell plumbing
    // ------------------------------------------------------------------

    fn ensure_slot(&mut self) {
        if self.elems.len() == self.elems.capacity() {
            let cap = self.elems.capacity();
            let want = cap + 1 + (cap + 1) / 2;
            assert!(want <= MAX_STACK_SIZE, "term stack exceeded maximum size");
            self.elems.reserve_exact(want - self.elems.len());
        }
    }

    fn push_cell(&mut self, value: Value, loc: Loc) {
        self.ensure_slot();
        self.elems.push(Cell::new(value, loc));
    }

    /// Release whatever `value` owns: recycle buffers, unregister bindings
    pub(crate) fn free_value(&mut self, value: Value) {
        match value {
            Value::TermBinding { name, .. } => self.terms.remove_name(&name),
            Value::TypeBinding { name, .. } => self.types.remove_name(&name),
            Value::RatBuffer(b) => self.pool.recycle_rat(b),
            Value::Bv64Buffer(b) => self.pool.recycle_bv64(b),
            Value::BvBuffer(b) => self.pool.recycle_bv(b),
            Value::LogicBuffer(b) => self.pool.recycle_logic(b),
            _ => {}
        }
    }

    fn free_cell(&mut self, cell: Cell) {
        self.free_value(cell.value);
    }

    /// Remove the argument cells of the top frame, leaving its operator
    /// cell in place, and restore the enclosing frame
    ///
    /// Closes the frame's arena scope unless the frame is a `BIND`.
    pub(crate) fn pop_frame(&mut self) {
        let f = self.frame;
        let op = self.top_op;
        debug_assert!(0 < f && f < self.elems.len());
        let prev = match &self.elems[f].value {
            Value::Op(o) => o.prev,
            _ => unreachable!("frame index does not point at an operator cell"),
        };
        self.frame = prev;
        self.top_op = match &self.elems[prev].value {
            Value::Op(o) => o.opcode,
            _ => unreachable!("frame chain does not point at an operator cell"),
        };
        while self.elems.len() > f + 1 {
            if let Some(cell) = self.elems.pop() {
                self.free_cell(cell);
            }
        }
        if op != Opcode::BIND {
            self.arena.pop_scope();
        }
    }

    /// Move the value at `idx` into the frame's place, then pop the frame
    pub(crate) fn copy_result_and_pop_frame(&mut self, idx: usize) {
        debug_assert!(self.frame < idx && idx < self.elems.len());
        let value = std::mem::replace(&mut self.elems[idx].value, Value::None);
        let loc = self.elems[idx].loc;
        let f = self.frame;
        self.pop_frame();
        self.elems[f] = Cell::new(value, loc);
    }

    fn set_top(&mut self, value: Value) {
        let top = self.elems.len() - 1;
        self.elems[top].value = value;
    }

    pub(crate) fn set_term_result(&mut self, t: TermId) {
        self.set_top(Value::Term(t));
    }

    pub(crate) fn set_type_result(&mut self, ty: TypeId) {
        self.set_top(Value::Type(ty));
    }

    pub(crate) fn set_bv64_result(&mut self, width: u32, value: u64) {
        self.set_top(Value::Bv64 { width, value });
    }

    pub(crate) fn set_bv_result(&mut self, value: BvConstant) {
        self.set_top(Value::Bv(value));
    }

    pub(crate) fn set_rat_buffer_result(&mut self, b: Box<RatPoly>) {
        self.set_top(Value::RatBuffer(b));
    }

    pub(crate) fn set_bv64_buffer_result(&mut self, b: Box<Bv64Poly>) {
        self.set_top(Value::Bv64Buffer(b));
    }

    pub(crate) fn set_bv_buffer_result(&mut self, b: Box<BvPoly>) {
        self.set_top(Value::BvBuffer(b));
    }

    pub(crate) fn set_logic_buffer_result(&mut self, b: Box<BvLogic>) {
        self.set_top(Value::LogicBuffer(b));
    }

    pub(crate) fn set_binding_result(&mut self, name: Rc<str>, term: TermId) {
        self.set_top(Value::TermBinding { name, term });
    }

    pub(crate) fn set_type_binding_result(&mut self, name: Rc<str>, ty: TypeId) {
        self.set_top(Value::TypeBinding { name, ty });
    }

    /// Remove the top cell; used by operations that produce no result
    pub(crate) fn no_result(&mut self) {
        if let Some(cell) = self.elems.pop() {
            self.free_cell(cell);
        }
    }

    pub(crate) fn store_result_term(&mut self, t: TermId) {
        self.result_term = Some(t);
    }

    pub(crate) fn store_result_type(&mut self, ty: TypeId) {
        self.result_type = Some(ty);
    }

    pub(crate) fn next_type_var(&mut self) -> u32 {
        let id = self.tvar_counter;
        self.tvar_counter += 1;
        id
    }

    // ------------------------------------------------------------------
    // Registration
    // ------------------------------------------------------------------

    /// Insert or replace an operator registration
    ///
    /// # Errors
    ///
    /// Fails with [`ErrorKind::InvalidOp`] when `op` is outside the
    /// table's capacity.
    pub fn register(
        &mut self,
        op: Opcode,
        assoc: bool,
        check: CheckFn,
        eval: EvalFn,
    ) -> StackResult<()> {
        if self.op_table.register(op, assoc, check, eval) {
            Ok(())
        } else {
            Err(self.push_error(Loc::default(), ErrorKind::InvalidOp, None))
        }
    }

    // ------------------------------------------------------------------
    // Push operations
    // ------------------------------------------------------------------

    /// Open an operator frame, or fold into the current frame when `op`
    /// is associative and already on top
    ///
    /// # Errors
    ///
    /// Fails with [`ErrorKind::InvalidOp`] on an unregistered opcode.
    pub fn push_op(&mut self, op: Opcode, loc: Loc) -> StackResult<()> {
        self.guard()?;
        let r = self.push_op_inner(op, loc);
        self.seal(r)
    }

    fn push_op_inner(&mut self, op: Opcode, loc: Loc) -> StackResult<()> {
        if !self.op_table.is_valid(op) {
            return Err(StackError {
                kind: ErrorKind::InvalidOp,
                loc,
                op,
                symbol: None,
            });
        }
        if self.op_table.is_assoc(op) && self.top_op == op {
            let f = self.frame;
            if let Value::Op(o) = &mut self.elems[f].value {
                o.multiplicity += 1;
            }
            return Ok(());
        }
        let i = self.elems.len();
        self.push_cell(
            Value::Op(OpVal {
                opcode: op,
                multiplicity: 0,
                prev: self.frame,
            }),
            loc,
        );
        self.frame = i;
        self.top_op = op;
        if op != Opcode::BIND {
            self.arena.push_scope();
        }
        Ok(())
    }

    /// Push a symbol
    ///
    /// # Errors
    ///
    /// Fails only when the stack is poisoned.
    pub fn push_symbol(&mut self, s: &str, loc: Loc) -> StackResult<()> {
        self.guard()?;
        let owned = self.arena.alloc(s);
        self.push_cell(Value::Symbol(owned), loc);
        Ok(())
    }

    /// Push a string constant
    ///
    /// # Errors
    ///
    /// Fails only when the stack is poisoned.
    pub fn push_string(&mut self, s: &str, loc: Loc) -> StackResult<()> {
        self.guard()?;
        let owned = self.arena.alloc(s);
        self.push_cell(Value::String(owned), loc);
        Ok(())
    }

    /// Push a symbol that must not already name a type
    ///
    /// # Errors
    ///
    /// Fails with [`ErrorKind::TypeNameRedef`] when the name is taken.
    pub fn push_free_typename(&mut self, s: &str, loc: Loc) -> StackResult<()> {
        self.guard()?;
        if self.types.get_by_name(s).is_some() {
            let e = self.push_error(loc, ErrorKind::TypeNameRedef, Some(s));
            return self.seal(Err(e));
        }
        self.push_symbol(s, loc)
    }

    /// Push a symbol that must not already name a term
    ///
    /// # Errors
    ///
    /// Fails with [`ErrorKind::TermNameRedef`] when the name is taken.
    pub fn push_free_termname(&mut self, s: &str, loc: Loc) -> StackResult<()> {
        self.guard()?;
        if self.terms.get_by_name(s).is_some() {
            let e = self.push_error(loc, ErrorKind::TermNameRedef, Some(s));
            return self.seal(Err(e));
        }
        self.push_symbol(s, loc)
    }

    /// Push a symbol that must not already name a type macro
    ///
    /// # Errors
    ///
    /// Fails with [`ErrorKind::MacroRedef`] when the name is taken.
    pub fn push_free_macroname(&mut self, s: &str, loc: Loc) -> StackResult<()> {
        self.guard()?;
        if self.types.macro_by_name(s).is_some() {
            let e = self.push_error(loc, ErrorKind::MacroRedef, Some(s));
            return self.seal(Err(e));
        }
        self.push_symbol(s, loc)
    }

    /// Resolve a type name and push the type
    ///
    /// # Errors
    ///
    /// Fails with [`ErrorKind::UndefType`] on an unknown name.
    pub fn push_type_by_name(&mut self, s: &str, loc: Loc) -> StackResult<()> {
        self.guard()?;
        match self.types.get_by_name(s) {
            Some(ty) => {
                self.push_cell(Value::Type(ty), loc);
                Ok(())
            }
            None => {
                let e = self.push_error(loc, ErrorKind::UndefType, Some(s));
                self.seal(Err(e))
            }
        }
    }

    /// Resolve a term name and push the term
    ///
    /// # Errors
    ///
    /// Fails with [`ErrorKind::UndefTerm`] on an unknown name.
    pub fn push_term_by_name(&mut self, s: &str, loc: Loc) -> StackResult<()> {
        self.guard()?;
        match self.terms.get_by_name(s) {
            Some(t) => {
                self.push_cell(Value::Term(t), loc);
                Ok(())
            }
            None => {
                let e = self.push_error(loc, ErrorKind::UndefTerm, Some(s));
                self.seal(Err(e))
            }
        }
    }

    /// Resolve a macro name and push the macro handle
    ///
    /// # Errors
    ///
    /// Fails with [`ErrorKind::UndefMacro`] on an unknown name.
    pub fn push_macro_by_name(&mut self, s: &str, loc: Loc) -> StackResult<()> {
        self.guard()?;
        match self.types.macro_by_name(s) {
            Some(m) => {
                self.push_cell(Value::Macro(m), loc);
                Ok(())
            }
            None => {
                let e = self.push_error(loc, ErrorKind::UndefMacro, Some(s));
                self.seal(Err(e))
            }
        }
    }

    /// Parse a rational literal (`123`, `-4/5`) and push it
    ///
    /// # Errors
    ///
    /// Fails with [`ErrorKind::RationalFormat`] or
    /// [`ErrorKind::DivideByZero`].
    pub fn push_rational(&mut self, s: &str, loc: Loc) -> StackResult<()> {
        self.guard()?;
        match parse_rational(s) {
            Ok(q) => {
                self.push_cell(Value::Rational(q), loc);
                Ok(())
            }
            Err(kind) => {
                let e = self.push_error(loc, kind, Some(s));
                self.seal(Err(e))
            }
        }
    }

    /// Parse a floating-point literal (`1.5`, `-2.25e3`) and push it as
    /// an exact rational
    ///
    /// # Errors
    ///
    /// Fails with [`ErrorKind::FloatFormat`].
    pub fn push_float(&mut self, s: &str, loc: Loc) -> StackResult<()> {
        self.guard()?;
        match parse_float(s) {
            Ok(q) => {
                self.push_cell(Value::Rational(q), loc);
                Ok(())
            }
            Err(kind) => {
                let e = self.push_error(loc, kind, Some(s));
                self.seal(Err(e))
            }
        }
    }

    /// Parse binary digits (no prefix) and push a bit-vector constant of
    /// that many bits
    ///
    /// # Errors
    ///
    /// Fails with [`ErrorKind::BvBinFormat`].
    pub fn push_bvbin(&mut self, s: &str, loc: Loc) -> StackResult<()> {
        self.guard()?;
        if s.is_empty() || !s.bytes().all(|b| b == b'0' || b == b'1') {
            let e = self.push_error(loc, ErrorKind::BvBinFormat, Some(s));
            return self.seal(Err(e));
        }
        if s.len() <= 64 {
            match u64::from_str_radix(s, 2) {
                Ok(value) => {
                    self.push_cell(
                        Value::Bv64 {
                            width: s.len() as u32,
                            value,
                        },
                        loc,
                    );
                    Ok(())
                }
                Err(_) => {
                    let e = self.push_error(loc, ErrorKind::BvBinFormat, Some(s));
                    self.seal(Err(e))
                }
            }
        } else {
            match BvConstant::from_binary(s) {
                Some(c) => {
                    self.push_cell(Value::Bv(c), loc);
                    Ok(())
                }
                None => {
                    let e = self.push_error(loc, ErrorKind::BvBinFormat, Some(s));
                    self.seal(Err(e))
                }
            }
        }
    }

    /// Parse hexadecimal digits (no prefix) and push a bit-vector
    /// constant of four bits per digit
    ///
    /// # Errors
    ///
    /// Fails with [`ErrorKind::BvHexFormat`].
    pub fn push_bvhex(&mut self, s: &str, loc: Loc) -> StackResult<()> {
        self.guard()?;
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_hexdigit()) {
            let e = self.push_error(loc, ErrorKind::BvHexFormat, Some(s));
            return self.seal(Err(e));
        }
        if s.len() <= 16 {
            match u64::from_str_radix(s, 16) {
                Ok(value) => {
                    self.push_cell(
                        Value::Bv64 {
                            width: 4 * s.len() as u32,
                            value,
                        },
                        loc,
                    );
                    Ok(())
                }
                Err(_) => {
                    let e = self.push_error(loc, ErrorKind::BvHexFormat, Some(s));
                    self.seal(Err(e))
                }
            }
        } else {
            match BvConstant::from_hex(s) {
                Some(c) => {
                    self.push_cell(Value::Bv(c), loc);
                    Ok(())
                }
                None => {
                    let e = self.push_error(loc, ErrorKind::BvHexFormat, Some(s));
                    self.seal(Err(e))
                }
            }
        }
    }

    /// Push the Boolean type
    ///
    /// # Errors
    ///
    /// Fails only when the stack is poisoned.
    pub fn push_bool_type(&mut self, loc: Loc) -> StackResult<()> {
        self.guard()?;
        let ty = self.types.bool_type();
        self.push_cell(Value::Type(ty), loc);
        Ok(())
    }

    /// Push the integer type
    ///
    /// # Errors
    ///
    /// Fails only when the stack is poisoned.
    pub fn push_int_type(&mut self, loc: Loc) -> StackResult<()> {
        self.guard()?;
        let ty = self.types.int_type();
        self.push_cell(Value::Type(ty), loc);
        Ok(())
    }

    /// Push the real type
    ///
    /// # Errors
    ///
    /// Fails only when the stack is poisoned.
    pub fn push_real_type(&mut self, loc: Loc) -> StackResult<()> {
        self.guard()?;
        let ty = self.types.real_type();
        self.push_cell(Value::Type(ty), loc);
        Ok(())
    }

    /// Push the constant `true`
    ///
    /// # Errors
    ///
    /// Fails only when the stack is poisoned.
    pub fn push_true(&mut self, loc: Loc) -> StackResult<()> {
        self.guard()?;
        let t = self.terms.true_term();
        self.push_cell(Value::Term(t), loc);
        Ok(())
    }

    /// Push the constant `false`
    ///
    /// # Errors
    ///
    /// Fails only when the stack is poisoned.
    pub fn push_false(&mut self, loc: Loc) -> StackResult<()> {
        self.guard()?;
        let t = self.terms.false_term();
        self.push_cell(Value::Term(t), loc);
        Ok(())
    }

    /// Push a machine integer as a rational cell
    ///
    /// # Errors
    ///
    /// Fails only when the stack is poisoned.
    pub fn push_int32(&mut self, v: i32, loc: Loc) -> StackResult<()> {
        self.guard()?;
        self.push_cell(Value::Rational(BigRational::from(BigInt::from(v))), loc);
        Ok(())
    }

    /// Push a pre-built term handle
    ///
    /// # Errors
    ///
    /// Fails only when the stack is poisoned.
    pub fn push_term(&mut self, t: TermId, loc: Loc) -> StackResult<()> {
        self.guard()?;
        self.push_cell(Value::Term(t), loc);
        Ok(())
    }

    /// Push a pre-built type handle
    ///
    /// # Errors
    ///
    /// Fails only when the stack is poisoned.
    pub fn push_type(&mut self, ty: TypeId, loc: Loc) -> StackResult<()> {
        self.guard()?;
        self.push_cell(Value::Type(ty), loc);
        Ok(())
    }

    /// Push a pre-built macro handle
    ///
    /// # Errors
    ///
    /// Fails only when the stack is poisoned.
    pub fn push_macro(&mut self, m: MacroId, loc: Loc) -> StackResult<()> {
        self.guard()?;
        self.push_cell(Value::Macro(m), loc);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Evaluation
    // ------------------------------------------------------------------

    /// Collapse the innermost frame
    ///
    /// When the frame carries folded pushes of an associative operator,
    /// one fold is consumed and nothing else happens; the outermost
    /// matching `evaluate` performs the real collapse.
    ///
    /// # Errors
    ///
    /// Any check or evaluation failure; the stack must then be `reset`.
    pub fn evaluate(&mut self) -> StackResult<()> {
        self.guard()?;
        let r = self.evaluate_inner();
        self.seal(r)
    }

    fn evaluate_inner(&mut self) -> StackResult<()> {
        let f = self.frame;
        if let Value::Op(o) = &mut self.elems[f].value {
            if o.multiplicity > 0 {
                o.multiplicity -= 1;
                return Ok(());
            }
        }
        let op = self.top_op;
        let entry = self
            .op_table
            .get(op)
            .ok_or_else(|| self.frame_error(ErrorKind::InvalidOp))?;
        let (check, eval) = (entry.check, entry.eval);
        let n = (self.elems.len() - f - 1) as u32;
        check(self, f + 1, n)?;
        eval(self, f + 1, n)
    }

    // ------------------------------------------------------------------
    // Results, reset, diagnostics
    // ------------------------------------------------------------------

    /// Term stored by the last `BUILD_TERM`
    #[must_use]
    pub fn result_term(&self) -> Option<TermId> {
        self.result_term
    }

    /// Type stored by the last `BUILD_TYPE`
    #[must_use]
    pub fn result_type(&self) -> Option<TypeId> {
        self.result_type
    }

    /// Empty the stack and clear the error state
    ///
    /// Mandatory after any failed operation. Bindings still on the stack
    /// are unregistered and buffers are recycled; the operator table and
    /// the term/type tables keep their contents.
    pub fn reset(&mut self) {
        while self.elems.len() > 1 {
            if let Some(cell) = self.elems.pop() {
                self.free_cell(cell);
            }
        }
        self.arena.reset();
        self.frame = 0;
        self.top_op = Opcode::NO_OP;
        self.tvar_counter = 0;
        self.result_term = None;
        self.result_type = None;
        self.poisoned = false;
    }

    /// Whether only the sentinel remains
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elems.len() == 1
    }

    /// Number of cells including the sentinel (diagnostics)
    #[must_use]
    pub fn top_index(&self) -> usize {
        self.elems.len()
    }

    /// Index of the innermost frame's operator cell (diagnostics)
    #[must_use]
    pub fn frame_index(&self) -> usize {
        self.frame
    }

    /// Opcode of the innermost frame (diagnostics)
    #[must_use]
    pub fn current_opcode(&self) -> Opcode {
        self.top_op
    }

    /// Tag of the cell at `idx` (diagnostics)
    #[must_use]
    pub fn cell_tag(&self, idx: usize) -> Option<Tag> {
        self.elems.get(idx).map(|c| c.value.tag())
    }

    /// The frame chain from the innermost frame down to the sentinel
    /// (diagnostics)
    #[must_use]
    pub fn frame_chain(&self) -> Vec<usize> {
        let mut chain = Vec::new();
        let mut i = self.frame;
        loop {
            chain.push(i);
            if i == 0 {
                break;
            }
            match &self.elems[i].value {
                Value::Op(o) => i = o.prev,
                _ => break,
            }
        }
        chain
    }

    /// Number of open arena scopes (diagnostics)
    #[must_use]
    pub fn arena_depth(&self) -> usize {
        self.arena.depth()
    }

    /// Number of occupied buffer-pool slots (diagnostics)
    #[must_use]
    pub fn pool_occupied(&self) -> usize {
        self.pool.occupied()
    }

    /// Number of buffer cells currently on the stack (diagnostics)
    #[must_use]
    pub fn buffer_cells(&self) -> usize {
        self.elems
            .iter()
            .filter(|c| {
                matches!(
                    c.value.tag(),
                    Tag::RatBuffer | Tag::Bv64Buffer | Tag::BvBuffer | Tag::LogicBuffer
                )
            })
            .count()
    }
}

fn parse_rational(s: &str) -> Result<BigRational, ErrorKind> {
    if let Some((num, den)) = s.split_once('/') {
        let n: BigInt = num.parse().map_err(|_| ErrorKind::RationalFormat)?;
        let d: BigInt = den.parse().map_err(|_| ErrorKind::RationalFormat)?;
        if d.is_zero() {
            return Err(ErrorKind::DivideByZero);
        }
        Ok(BigRational::new(n, d))
    } else {
        let n: BigInt = s.parse().map_err(|_| ErrorKind::RationalFormat)?;
        Ok(BigRational::from(n))
    }
}

fn parse_float(s: &str) -> Result<BigRational, ErrorKind> {
    let (mantissa, exponent) = match s.find(['e', 'E']) {
        Some(i) => {
            let exp: i32 = s[i + 1..].parse().map_err(|_| ErrorKind::FloatFormat)?;
            (&s[..i], exp)
        }
        None => (s, 0),
    };
    let (sign, digits) = match mantissa.strip_prefix('-') {
        Some(rest) => (-1, rest),
        None => (1, mantissa.strip_prefix('+').unwrap_or(mantissa)),
    };
    let (int_part, frac_part) = match digits.split_once('.') {
        Some((i, f)) => (i, f),
        None => (digits, ""),
    };
    if int_part.is_empty() && frac_part.is_empty() {
        return Err(ErrorKind::FloatFormat);
    }
    if !int_part.bytes().all(|b| b.is_ascii_digit())
        || !frac_part.bytes().all(|b| b.is_ascii_digit())
    {
        return Err(ErrorKind::FloatFormat);
    }
    let mut numer = BigInt::zero();
    for b in int_part.bytes().chain(frac_part.bytes()) {
        numer = numer * 10 + i64::from(b - b'0');
    }
    numer *= sign;
    let mut denom = BigInt::one();
    for _ in 0..frac_part.len() {
        denom *= 10;
    }
    let scale = num_traits::pow(BigInt::from(10), exponent.unsigned_abs() as usize);
    if exponent >= 0 {
        numer *= scale;
    } else {
        denom *= scale;
    }
    Ok(BigRational::new(numer, denom))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rational() {
        assert_eq!(
            parse_rational("42"),
            Ok(BigRational::from(BigInt::from(42)))
        );
        assert_eq!(
            parse_rational("-3/4"),
            Ok(BigRational::new(BigInt::from(-3), BigInt::from(4)))
        );
        assert_eq!(parse_rational("1/0"), Err(ErrorKind::DivideByZero));
        assert_eq!(parse_rational("x"), Err(ErrorKind::RationalFormat));
        assert_eq!(parse_rational(""), Err(ErrorKind::RationalFormat));
    }

    #[test]
    fn test_parse_float() {
        assert_eq!(
            parse_float("1.5"),
            Ok(BigRational::new(BigInt::from(3), BigInt::from(2)))
        );
        assert_eq!(
            parse_float("-0.25e2"),
            Ok(BigRational::from(BigInt::from(-25)))
        );
        assert_eq!(
            parse_float("25E-2"),
            Ok(BigRational::new(BigInt::from(1), BigInt::from(4)))
        );
        assert_eq!(parse_float("2."), Ok(BigRational::from(BigInt::from(2))));
        assert_eq!(parse_float(".5"), Ok(BigRational::new(BigInt::from(1), BigInt::from(2))));
        assert_eq!(parse_float("."), Err(ErrorKind::FloatFormat));
        assert_eq!(parse_float("1.2.3"), Err(ErrorKind::FloatFormat));
        assert_eq!(parse_float("1e"), Err(ErrorKind::FloatFormat));
    }

    #[test]
    fn test_sentinel_and_empty() {
        let stack = TermStack::new(Opcode::NUM_BASE_OPS);
        assert!(stack.is_empty());
        assert_eq!(stack.top_index(), 1);
        assert_eq!(stack.frame_index(), 0);
        assert_eq!(stack.current_opcode(), Opcode::NO_OP);
        assert_eq!(stack.cell_tag(0), Some(Tag::Op));
    }

    #[test]
    fn test_push_op_opens_scope() {
        let mut stack = TermStack::new(Opcode::NUM_BASE_OPS);
        stack.push_op(Opcode::MK_AND, Loc::new(1, 1)).unwrap();
        assert_eq!(stack.arena_depth(), 1);
        assert_eq!(stack.frame_index(), 1);
        assert_eq!(stack.current_opcode(), Opcode::MK_AND);
    }

    #[test]
    fn test_associative_fold_no_new_frame() {
        let mut stack = TermStack::new(Opcode::NUM_BASE_OPS);
        stack.push_op(Opcode::MK_AND, Loc::new(1, 1)).unwrap();
        stack.push_op(Opcode::MK_AND, Loc::new(1, 5)).unwrap();
        stack.push_op(Opcode::MK_AND, Loc::new(1, 9)).unwrap();
        assert_eq!(stack.frame_index(), 1);
        assert_eq!(stack.arena_depth(), 1);
        assert_eq!(stack.top_index(), 2);
    }

    #[test]
    fn test_non_associative_opens_frames() {
        let mut stack = TermStack::new(Opcode::NUM_BASE_OPS);
        stack.push_op(Opcode::MK_EQ, Loc::new(1, 1)).unwrap();
        stack.push_op(Opcode::MK_EQ, Loc::new(1, 5)).unwrap();
        assert_eq!(stack.frame_chain(), vec![2, 1, 0]);
        assert_eq!(stack.arena_depth(), 2);
    }

    #[test]
    fn test_invalid_opcode() {
        let mut stack = TermStack::new(Opcode::NUM_BASE_OPS);
        let err = stack.push_op(Opcode(9999), Loc::new(3, 7)).unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidOp);
        assert_eq!(err.loc, Loc::new(3, 7));
    }

    #[test]
    fn test_poisoned_until_reset() {
        let mut stack = TermStack::new(Opcode::NUM_BASE_OPS);
        assert!(stack.push_op(Opcode(9999), Loc::default()).is_err());
        let err = stack.push_true(Loc::default()).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Internal);
        stack.reset();
        assert!(stack.push_true(Loc::default()).is_ok());
    }

    #[test]
    fn test_bv_literal_pushes() {
        let mut stack = TermStack::new(Opcode::NUM_BASE_OPS);
        stack.push_bvbin("0011", Loc::default()).unwrap();
        assert_eq!(stack.cell_tag(1), Some(Tag::Bv64));
        stack.push_bvhex("DEADBEEF11223344F", Loc::default()).unwrap();
        assert_eq!(stack.cell_tag(2), Some(Tag::Bv));
        let err = stack.push_bvbin("012", Loc::default()).unwrap_err();
        assert_eq!(err.kind, ErrorKind::BvBinFormat);
        assert_eq!(err.symbol.as_deref(), Some("012"));
    }

    #[test]
    fn test_free_name_checks() {
        let mut stack = TermStack::new(Opcode::NUM_BASE_OPS);
        let int = stack.types.int_type();
        let t = stack.terms.mk_uninterpreted(int);
        stack.terms.set_name("x", t);
        let err = stack.push_free_termname("x", Loc::new(2, 2)).unwrap_err();
        assert_eq!(err.kind, ErrorKind::TermNameRedef);
        stack.reset();
        assert!(stack.push_free_termname("y", Loc::new(2, 2)).is_ok());
    }

    #[test]
    fn test_name_resolution_pushes() {
        let mut stack = TermStack::new(Opcode::NUM_BASE_OPS);
        let err = stack.push_term_by_name("nope", Loc::default()).unwrap_err();
        assert_eq!(err.kind, ErrorKind::UndefTerm);
        assert_eq!(err.symbol.as_deref(), Some("nope"));
        stack.reset();
        let int = stack.types.int_type();
        let t = stack.terms.mk_uninterpreted(int);
        stack.terms.set_name("k", t);
        stack.push_term_by_name("k", Loc::default()).unwrap();
        assert_eq!(stack.cell_tag(1), Some(Tag::Term));
    }
}
