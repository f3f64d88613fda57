//! # Bytecode
//!
//! Lowering of the AST into a flat, byte-encoded instruction stream.
//!
//! `op` defines the instruction set and its encoding, `ir` the containers the
//! compiler produces, `symbol_table` the lexical scoping rules, `compile` the
//! single pass from AST to bytecode and `disasm` a human-readable listing.

pub mod compile;
pub mod compile_error;
pub mod disasm;
pub mod ir;
pub mod op;
pub mod symbol_table;

pub use compile::Compiler;
pub use compile_error::CompileError;
pub use ir::{Bytecode, Instructions};
pub use op::Op;
