//! # Ember
//!
//! Bytecode compiler and stack virtual machine for the Ember scripting
//! language.
//!
//! A parsed [`Program`](lang::program::Program) is lowered in one pass by
//! [`Compiler`](bytecode::Compiler) into [`Bytecode`](bytecode::Bytecode): a
//! flat instruction stream plus a constant pool. [`Vm`](runtime::Vm) executes
//! it with closures, native builtins and name-dispatched members.
//!
//! ```no_run
//! use ember::lang::node::{Expression as E, Statement as S};
//! use ember::lang::program::Program;
//!
//! let program = Program::new(vec![S::expr(E::infix(E::int(1), "+", E::int(2)))]);
//! let value = ember::run(&program).unwrap();
//! assert_eq!(value.to_string(), "3");
//! ```

pub mod bytecode;
pub mod error;
pub mod lang;
pub mod runtime;

pub use error::Error;

use crate::bytecode::{Bytecode, Compiler};
use crate::lang::program::Program;
use crate::lang::value::Value;
use crate::runtime::{Vm, VmConfig};

pub fn compile(program: &Program) -> Result<Bytecode, Error> {
    Ok(Compiler::new().compile_program(program)?)
}

/// Compile and execute `program`, returning the value of its last expression
/// statement.
pub fn run(program: &Program) -> Result<Value, Error> {
    run_with_config(program, VmConfig::default())
}

pub fn run_with_config(program: &Program, config: VmConfig) -> Result<Value, Error> {
    let bytecode = compile(program)?;
    Ok(Vm::with_config(bytecode, config).run()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lang::node::{Block, Expression as E, Statement as S};

    #[test]
    fn test_run_returns_last_expression_value() {
        let program = Program::new(vec![
            S::var("x", E::int(20)),
            S::expr(E::infix(E::ident("x"), "+", E::int(22))),
        ]);

        assert_eq!(run(&program).unwrap(), Value::Integer(42));
    }

    #[test]
    fn test_compile_error_surfaces() {
        let program = Program::new(vec![S::expr(E::ident("missing"))]);

        let err = run(&program).unwrap_err();
        assert!(matches!(err, Error::Compile(_)));
        assert!(err.to_string().contains("undefined symbol 'missing'"));
    }

    #[test]
    fn test_runtime_error_surfaces() {
        let program = Program::new(vec![S::expr(E::call(
            E::function(&[], Block::expr(E::call(E::int(5), vec![]))),
            vec![],
        ))]);

        let err = run(&program).unwrap_err();
        assert!(matches!(err, Error::Runtime(_)));
        assert!(err.to_string().contains("integer is not callable"));
    }

    #[test]
    fn test_step_limit_through_config() {
        let program = Program::new(vec![S::expr(E::Loop {
            bound: Box::new(E::int(1_000_000)),
            index: None,
            body: Block::default(),
        })]);
        let config = VmConfig {
            max_steps: Some(1_000),
            ..VmConfig::default()
        };

        let err = run_with_config(&program, config).unwrap_err();
        assert!(err.to_string().contains("step limit"));
    }

    #[test]
    fn test_decode_error_wraps_postcard() {
        let err: Error = Bytecode::from_bytes(&[0xFF, 0xFF, 0xFF]).unwrap_err().into();

        assert!(matches!(err, Error::Decode(_)));
    }
}
