//! Operator table
//!
//! Maps an opcode to its associativity flag and its check/eval function
//! pair. The table has a fixed capacity chosen at construction; the
//! predefined operations occupy the low opcodes and dialect layers may
//! re-register replacements under the same numbers or add new
//! operations above them.

use crate::error::StackResult;
use crate::stack::TermStack;

/// An operation code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Opcode(pub u32);

impl Opcode {
    /// Sentinel, never evaluated
    pub const NO_OP: Opcode = Opcode(0);
    /// `[define-type name]` or `[define-type name type]`
    pub const DEFINE_TYPE: Opcode = Opcode(1);
    /// `[define-term name type]` or `[define-term name type value]`
    pub const DEFINE_TERM: Opcode = Opcode(2);
    /// `[bind name term]`
    pub const BIND: Opcode = Opcode(3);
    /// `[declare-var name type]`
    pub const DECLARE_VAR: Opcode = Opcode(4);
    /// `[declare-type-var name]`
    pub const DECLARE_TYPE_VAR: Opcode = Opcode(5);
    /// `[let binding .. binding body]`
    pub const LET: Opcode = Opcode(6);
    /// `[mk-bv-type size]`
    pub const MK_BV_TYPE: Opcode = Opcode(7);
    /// `[mk-scalar-type name .. name]`
    pub const MK_SCALAR_TYPE: Opcode = Opcode(8);
    /// `[mk-tuple-type type .. type]`
    pub const MK_TUPLE_TYPE: Opcode = Opcode(9);
    /// `[mk-fun-type domain .. domain range]`
    pub const MK_FUN_TYPE: Opcode = Opcode(10);
    /// `[mk-app-type macro type .. type]`
    pub const MK_APP_TYPE: Opcode = Opcode(11);
    /// `[mk-apply fun arg .. arg]`
    pub const MK_APPLY: Opcode = Opcode(12);
    /// `[mk-ite cond then else]`
    pub const MK_ITE: Opcode = Opcode(13);
    /// `[mk-eq a b]`
    pub const MK_EQ: Opcode = Opcode(14);
    /// `[mk-diseq a b]`
    pub const MK_DISEQ: Opcode = Opcode(15);
    /// `[mk-distinct a .. a]`
    pub const MK_DISTINCT: Opcode = Opcode(16);
    /// `[mk-not a]`
    pub const MK_NOT: Opcode = Opcode(17);
    /// `[mk-or a .. a]`
    pub const MK_OR: Opcode = Opcode(18);
    /// `[mk-and a .. a]`
    pub const MK_AND: Opcode = Opcode(19);
    /// `[mk-xor a .. a]`
    pub const MK_XOR: Opcode = Opcode(20);
    /// `[mk-iff a .. a]`
    pub const MK_IFF: Opcode = Opcode(21);
    /// `[mk-implies a b]`
    pub const MK_IMPLIES: Opcode = Opcode(22);
    /// `[mk-tuple a .. a]`
    pub const MK_TUPLE: Opcode = Opcode(23);
    /// `[mk-select tuple index]`
    pub const MK_SELECT: Opcode = Opcode(24);
    /// `[mk-tuple-update tuple index value]`
    pub const MK_TUPLE_UPDATE: Opcode = Opcode(25);
    /// `[mk-update fun arg .. arg value]`
    pub const MK_UPDATE: Opcode = Opcode(26);
    /// `[mk-forall binding .. binding body]`
    pub const MK_FORALL: Opcode = Opcode(27);
    /// `[mk-exists binding .. binding body]`
    pub const MK_EXISTS: Opcode = Opcode(28);
    /// `[mk-lambda binding .. binding body]`
    pub const MK_LAMBDA: Opcode = Opcode(29);
    /// `[mk-add a .. a]`
    pub const MK_ADD: Opcode = Opcode(30);
    /// `[mk-sub a b .. ]`, left fold
    pub const MK_SUB: Opcode = Opcode(31);
    /// `[mk-neg a]`
    pub const MK_NEG: Opcode = Opcode(32);
    /// `[mk-mul a .. a]`
    pub const MK_MUL: Opcode = Opcode(33);
    /// `[mk-division a b]`, constant divisor
    pub const MK_DIVISION: Opcode = Opcode(34);
    /// `[mk-pow a k]`
    pub const MK_POW: Opcode = Opcode(35);
    /// `[mk-ge a b]`
    pub const MK_GE: Opcode = Opcode(36);
    /// `[mk-gt a b]`
    pub const MK_GT: Opcode = Opcode(37);
    /// `[mk-le a b]`
    pub const MK_LE: Opcode = Opcode(38);
    /// `[mk-lt a b]`
    pub const MK_LT: Opcode = Opcode(39);
    /// `[mk-bv-const size value]`
    pub const MK_BV_CONST: Opcode = Opcode(40);
    /// `[mk-bv-add bv .. bv]`
    pub const MK_BV_ADD: Opcode = Opcode(41);
    /// `[mk-bv-sub bv bv .. ]`, left fold
    pub const MK_BV_SUB: Opcode = Opcode(42);
    /// `[mk-bv-mul bv .. bv]`
    pub const MK_BV_MUL: Opcode = Opcode(43);
    /// `[mk-bv-neg bv]`
    pub const MK_BV_NEG: Opcode = Opcode(44);
    /// `[mk-bv-pow bv k]`
    pub const MK_BV_POW: Opcode = Opcode(45);
    /// `[mk-bv-div bv bv]`
    pub const MK_BV_DIV: Opcode = Opcode(46);
    /// `[mk-bv-rem bv bv]`
    pub const MK_BV_REM: Opcode = Opcode(47);
    /// `[mk-bv-sdiv bv bv]`
    pub const MK_BV_SDIV: Opcode = Opcode(48);
    /// `[mk-bv-srem bv bv]`
    pub const MK_BV_SREM: Opcode = Opcode(49);
    /// `[mk-bv-smod bv bv]`
    pub const MK_BV_SMOD: Opcode = Opcode(50);
    /// `[mk-bv-not bv]`
    pub const MK_BV_NOT: Opcode = Opcode(51);
    /// `[mk-bv-and bv .. bv]`
    pub const MK_BV_AND: Opcode = Opcode(52);
    /// `[mk-bv-or bv .. bv]`
    pub const MK_BV_OR: Opcode = Opcode(53);
    /// `[mk-bv-xor bv .. bv]`
    pub const MK_BV_XOR: Opcode = Opcode(54);
    /// `[mk-bv-nand bv .. bv]`
    pub const MK_BV_NAND: Opcode = Opcode(55);
    /// `[mk-bv-nor bv .. bv]`
    pub const MK_BV_NOR: Opcode = Opcode(56);
    /// `[mk-bv-xnor bv .. bv]`
    pub const MK_BV_XNOR: Opcode = Opcode(57);
    /// `[mk-bv-shift-left0 bv k]`
    pub const MK_BV_SHIFT_LEFT0: Opcode = Opcode(58);
    /// `[mk-bv-shift-left1 bv k]`
    pub const MK_BV_SHIFT_LEFT1: Opcode = Opcode(59);
    /// `[mk-bv-shift-right0 bv k]`
    pub const MK_BV_SHIFT_RIGHT0: Opcode = Opcode(60);
    /// `[mk-bv-shift-right1 bv k]`
    pub const MK_BV_SHIFT_RIGHT1: Opcode = Opcode(61);
    /// `[mk-bv-ashift-right bv k]`
    pub const MK_BV_ASHIFT_RIGHT: Opcode = Opcode(62);
    /// `[mk-bv-rotate-left bv k]`
    pub const MK_BV_ROTATE_LEFT: Opcode = Opcode(63);
    /// `[mk-bv-rotate-right bv k]`
    pub const MK_BV_ROTATE_RIGHT: Opcode = Opcode(64);
    /// `[mk-bv-shl bv bv]`
    pub const MK_BV_SHL: Opcode = Opcode(65);
    /// `[mk-bv-lshr bv bv]`
    pub const MK_BV_LSHR: Opcode = Opcode(66);
    /// `[mk-bv-ashr bv bv]`
    pub const MK_BV_ASHR: Opcode = Opcode(67);
    /// `[mk-bv-extract high low bv]`
    pub const MK_BV_EXTRACT: Opcode = Opcode(68);
    /// `[mk-bv-concat bv .. bv]`
    pub const MK_BV_CONCAT: Opcode = Opcode(69);
    /// `[mk-bv-repeat bv k]`
    pub const MK_BV_REPEAT: Opcode = Opcode(70);
    /// `[mk-bv-sign-extend bv k]`
    pub const MK_BV_SIGN_EXTEND: Opcode = Opcode(71);
    /// `[mk-bv-zero-extend bv k]`
    pub const MK_BV_ZERO_EXTEND: Opcode = Opcode(72);
    /// `[mk-bv-redand bv]`
    pub const MK_BV_REDAND: Opcode = Opcode(73);
    /// `[mk-bv-redor bv]`
    pub const MK_BV_REDOR: Opcode = Opcode(74);
    /// `[mk-bv-comp bv bv]`
    pub const MK_BV_COMP: Opcode = Opcode(75);
    /// `[mk-bv-ge bv bv]`
    pub const MK_BV_GE: Opcode = Opcode(76);
    /// `[mk-bv-gt bv bv]`
    pub const MK_BV_GT: Opcode = Opcode(77);
    /// `[mk-bv-le bv bv]`
    pub const MK_BV_LE: Opcode = Opcode(78);
    /// `[mk-bv-lt bv bv]`
    pub const MK_BV_LT: Opcode = Opcode(79);
    /// `[mk-bv-sge bv bv]`
    pub const MK_BV_SGE: Opcode = Opcode(80);
    /// `[mk-bv-sgt bv bv]`
    pub const MK_BV_SGT: Opcode = Opcode(81);
    /// `[mk-bv-sle bv bv]`
    pub const MK_BV_SLE: Opcode = Opcode(82);
    /// `[mk-bv-slt bv bv]`
    pub const MK_BV_SLT: Opcode = Opcode(83);
    /// `[build-term term]`, stores the final term
    pub const BUILD_TERM: Opcode = Opcode(84);
    /// `[build-type type]`, stores the final type
    pub const BUILD_TYPE: Opcode = Opcode(85);

    /// Number of predefined opcodes
    pub const NUM_BASE_OPS: u32 = 86;

    /// Index into the operator table
    #[inline]
    #[must_use]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Check function: verifies the frame shape before evaluation touches it
pub type CheckFn = fn(&mut TermStack, usize, u32) -> StackResult<()>;
/// Eval function: replaces the frame with the operation's result
pub type EvalFn = CheckFn;

/// One operator's registration
#[derive(Clone, Copy)]
pub struct OpEntry {
    /// Repeated pushes fold via the multiplicity counter
    pub assoc: bool,
    /// Frame-shape check
    pub check: CheckFn,
    /// Evaluator
    pub eval: EvalFn,
}

/// Dense opcode table
pub struct OpTable {
    entries: Vec<Option<OpEntry>>,
}

impl OpTable {
    /// Table with room for `capacity` opcodes, all unregistered
    #[must_use]
    pub fn new(capacity: u32) -> Self {
        OpTable {
            entries: (0..capacity).map(|_| None).collect(),
        }
    }

    /// Capacity in opcodes
    #[must_use]
    pub fn capacity(&self) -> u32 {
        self.entries.len() as u32
    }

    /// Insert or replace an operator; `false` when out of bounds
    pub fn register(&mut self, op: Opcode, assoc: bool, check: CheckFn, eval: EvalFn) -> bool {
        match self.entries.get_mut(op.index()) {
            Some(slot) => {
                *slot = Some(OpEntry { assoc, check, eval });
                true
            }
            None => false,
        }
    }

    /// Registration for `op`, if any
    #[must_use]
    pub fn get(&self, op: Opcode) -> Option<&OpEntry> {
        self.entries.get(op.index()).and_then(Option::as_ref)
    }

    /// Whether `op` is registered
    #[must_use]
    pub fn is_valid(&self, op: Opcode) -> bool {
        self.get(op).is_some()
    }

    /// Whether `op` is registered as associative
    #[must_use]
    pub fn is_assoc(&self, op: Opcode) -> bool {
        self.get(op).is_some_and(|e| e.assoc)
    }
}
