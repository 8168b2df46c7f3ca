//! The lowering engine: AST → LLVM IR.
//!
//! Walks a parsed [`crate::ast::Block`] and emits instructions into an
//! `inkwell` module via a scope stack threaded explicitly through the
//! engine's state (no parent pointers, no implicit builder cursor).

mod builtins;
mod engine;
mod error;
mod scope;
mod types;

pub use engine::lower_program;
pub use error::LowerError;
pub use types::{is_valid_type, type_of};
