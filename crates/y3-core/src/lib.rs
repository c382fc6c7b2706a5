//! Y3 core: hash-consed term and type tables
//!
//! This crate holds the logical infrastructure the Y3 frontend builds
//! on: a structurally interned type table with macros and name
//! registries, a term table with typed constructors and light
//! canonicalization, and arbitrary-width bit-vector constant
//! arithmetic.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod bvconst;
pub mod error;
pub mod term;
pub mod types;

pub use bvconst::{normalize, normalize64, BvConstant, MAX_BV_WIDTH};
pub use error::{CoreError, CoreResult};
pub use term::{TermData, TermId, TermStore};
pub use types::{MacroDef, MacroId, TypeData, TypeId, TypeStore};
