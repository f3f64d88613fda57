//! # Runtime
//!
//! The stack machine that executes compiled bytecode (`vm`) and the errors it
//! reports (`runtime_error`).

pub mod runtime_error;
pub mod vm;

pub use runtime_error::{RuntimeError, RuntimeErrorKind};
pub use vm::{Vm, VmConfig};
