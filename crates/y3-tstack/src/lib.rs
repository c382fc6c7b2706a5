//! Operator-evaluation stack for parser-driven term construction
//!
//! A parser drives this stack with pushes and evaluations: leaf pushes
//! place typed literals, symbols, and pre-built handles; an operator
//! push opens a frame; `evaluate` collapses the innermost frame by
//! dispatching through an extensible operator table. Associative
//! operators fold repeated pushes into a single frame, bit-vector
//! arguments move between carriers (literal, term, polynomial buffer,
//! logic buffer) on demand, and every failure unwinds with the
//! offending cell's source location.
//!
//! The final `BUILD_TERM`/`BUILD_TYPE` operation deposits a handle from
//! the [`y3_core`] term and type tables into the result slot.

#![warn(missing_docs)]
#![warn(clippy::all)]

mod arena;
mod buffer;
mod cell;
mod coerce;
mod error;
mod eval;
mod op_table;
mod smt_ops;
mod stack;

pub use cell::{Loc, Tag};
pub use error::{ErrorKind, StackError, StackResult};
pub use op_table::{CheckFn, EvalFn, OpEntry, OpTable, Opcode};
pub use smt_ops::enable_smtlib;
pub use stack::{TermStack, DEFAULT_STACK_CAPACITY, MAX_STACK_SIZE};
