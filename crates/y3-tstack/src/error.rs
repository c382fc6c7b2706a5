//! Error kinds and the stack error record
//!
//! Every failure inside the stack is reported as a [`StackError`]: an
//! error kind, the source location of the offending cell, the opcode
//! being evaluated (or [`Opcode::NO_OP`] for a push failure), and the
//! offending symbol or literal text when there is one.
//!
//! After the first error the stack is poisoned: any further push or
//! evaluate fails with [`ErrorKind::Internal`] until [`reset`] is
//! called.
//!
//! [`reset`]: crate::stack::TermStack::reset

use thiserror::Error;

use crate::cell::Loc;
use crate::op_table::Opcode;

/// What went wrong
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ErrorKind {
    /// Invariant violation; indicates a bug or a use after an error
    #[error("internal error")]
    Internal,
    /// Registered opcode with no implementation
    #[error("operation not implemented")]
    OpNotImplemented,
    /// Opcode outside the operator table
    #[error("invalid operation")]
    InvalidOp,
    /// Wrong argument count for the operator
    #[error("wrong number of arguments")]
    InvalidFrame,
    /// Name does not resolve to a term
    #[error("undefined term name")]
    UndefTerm,
    /// Name does not resolve to a type
    #[error("undefined type name")]
    UndefType,
    /// Name does not resolve to a type macro
    #[error("undefined type macro")]
    UndefMacro,
    /// Malformed rational literal
    #[error("invalid rational format")]
    RationalFormat,
    /// Malformed floating-point literal
    #[error("invalid floating-point format")]
    FloatFormat,
    /// Malformed binary bit-vector literal
    #[error("invalid binary bitvector format")]
    BvBinFormat,
    /// Malformed hexadecimal bit-vector literal
    #[error("invalid hexadecimal bitvector format")]
    BvHexFormat,
    /// Type name already in use
    #[error("typename already defined")]
    TypeNameRedef,
    /// Term name already in use
    #[error("term name already defined")]
    TermNameRedef,
    /// Macro name already in use
    #[error("macro name already defined")]
    MacroRedef,
    /// Repeated element name in a scalar type
    #[error("duplicate name in scalar type")]
    DuplicateScalarName,
    /// Repeated name in a binder list
    #[error("duplicate variable name")]
    DuplicateVarName,
    /// Integer does not fit a machine word
    #[error("integer overflow")]
    IntegerOverflow,
    /// Exponent must be non-negative
    #[error("negative exponent")]
    NegativeExponent,
    /// Rational with a non-unit denominator where an integer is needed
    #[error("not an integer")]
    NotAnInteger,
    /// Argument is not a string
    #[error("not a string")]
    NotAString,
    /// Argument is not a symbol
    #[error("not a symbol")]
    NotASymbol,
    /// Argument is not a rational
    #[error("not a rational")]
    NotARational,
    /// Argument is not a type
    #[error("not a type")]
    NotAType,
    /// Argument is not arithmetic
    #[error("arithmetic error")]
    ArithError,
    /// Division by zero
    #[error("division by zero")]
    DivideByZero,
    /// Division requires a constant divisor
    #[error("divisor is not a constant")]
    NonConstantDivisor,
    /// Bit-vector sizes must be positive
    #[error("bitvector size must be positive")]
    NonPositiveBvSize,
    /// Bit-vector operands of different widths
    #[error("incompatible bitvector sizes")]
    IncompatibleBvSizes,
    /// Bit-vector constant value out of domain
    #[error("invalid bitvector constant")]
    InvalidBvConstant,
    /// Argument is not a bit-vector carrier
    #[error("bitvector arithmetic error")]
    BvArithError,
    /// Bit-level precondition failed (shift, rotate, extract, repeat)
    #[error("bitvector logic error")]
    BvLogicError,
    /// Definition body is not a subtype of the declared type
    #[error("type error in definition")]
    TypeErrorInDefinition,
    /// The term/type builder refused the construction
    #[error("term builder error")]
    External,
}

/// An error escaping the stack, with diagnosis data
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{kind} at {loc}")]
pub struct StackError {
    /// Error kind
    pub kind: ErrorKind,
    /// Location of the offending cell (or of the push)
    pub loc: Loc,
    /// Opcode being evaluated; `NO_OP` for push failures
    pub op: Opcode,
    /// Offending symbol or literal text, when the erroneous cell has one
    pub symbol: Option<String>,
}

/// Result type for stack operations
pub type StackResult<T> = Result<T, StackError>;
