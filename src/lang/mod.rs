//! # Ember language model
//!
//! The AST handed over by the parser (`node`, `program`) and the runtime
//! values the VM operates on (`value`), together with the name-based member
//! protocol (`members`) and the builtin function table (`builtins`).

pub mod builtins;
pub mod members;
pub mod node;
pub mod program;
pub mod value;
