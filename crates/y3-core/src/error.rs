//! Error type for the term and type tables

use thiserror::Error;

/// Errors raised by the term/type builders when a construction request
/// is ill-typed or out of range.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CoreError {
    /// Width is zero or exceeds the supported maximum
    #[error("invalid bitvector width: {0}")]
    InvalidBvWidth(u64),

    /// Two bit-vector operands of different widths
    #[error("incompatible bitvector widths: {0} and {1}")]
    IncompatibleBvWidths(u32, u32),

    /// Operand is not a bit-vector
    #[error("not a bitvector term")]
    NotABitvector,

    /// Operand is not Boolean
    #[error("not a boolean term")]
    NotABoolean,

    /// Operand is not Int or Real
    #[error("not an arithmetic term")]
    NotArithmetic,

    /// Operand does not have a function type
    #[error("not a function term")]
    NotAFunction,

    /// Operand does not have a tuple type
    #[error("not a tuple term")]
    NotATuple,

    /// Tuple or scalar index outside the valid range
    #[error("tuple index {index} out of range for arity {arity}")]
    TupleIndexOutOfRange {
        /// Requested index
        index: u32,
        /// Number of components
        arity: u32,
    },

    /// Argument count does not match the expected arity
    #[error("wrong number of arguments: expected {expected}, got {actual}")]
    ArityMismatch {
        /// Expected argument count
        expected: usize,
        /// Provided argument count
        actual: usize,
    },

    /// Argument type does not fit the declared domain
    #[error("type mismatch in application")]
    TypeMismatch,

    /// Binder list contains a non-variable term
    #[error("binder argument is not a variable")]
    NotAVariable,

    /// Macro applied to the wrong number of type arguments
    #[error("macro arity mismatch: expected {expected}, got {actual}")]
    MacroArityMismatch {
        /// The macro's declared arity
        expected: u32,
        /// Provided argument count
        actual: usize,
    },

    /// An argument list that must not be empty is empty
    #[error("empty argument list")]
    EmptyArguments,

    /// Operand types have no common supertype
    #[error("incompatible types")]
    IncompatibleTypes,
}

/// Result type for table operations
pub type CoreResult<T> = Result<T, CoreError>;
