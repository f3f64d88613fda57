use crate::bytecode::op::EncodingError;

#[derive(Debug, Clone, PartialEq)]
pub enum CompileError {
    /// A name with no binding in any enclosing scope
    UndefinedSymbol { name: String, hint: Option<String> },
    /// `receiver.member` where no type provides `member`
    UndefinedMember { name: String },
    /// An operator token the bytecode has no instruction for
    UnsupportedOperator {
        operator: String,
        position: &'static str,
    },
    /// Assignment to a `const`, a builtin or a function's own name
    AssignToConst { name: String },
    /// Assignment to a variable captured from an enclosing function
    AssignToCaptured { name: String },
    /// A construct that is valid syntax but cannot appear where it is
    InvalidPosition {
        construct: String,
        reason: String,
        hint: Option<String>,
    },
    /// An instruction could not be encoded (operand too large, etc.)
    Encoding {
        construct: String,
        source: EncodingError,
    },
    /// Internal compiler error (shouldn't happen in normal use)
    Internal(String),
}

impl CompileError {
    pub fn undefined_symbol(name: &str) -> Self {
        CompileError::UndefinedSymbol {
            name: name.to_string(),
            hint: Some("names must be declared with var, const or func before use".to_string()),
        }
    }

    pub fn undefined_member(name: &str) -> Self {
        CompileError::UndefinedMember {
            name: name.to_string(),
        }
    }

    pub fn unsupported_operator(operator: &str, position: &'static str) -> Self {
        CompileError::UnsupportedOperator {
            operator: operator.to_string(),
            position,
        }
    }

    pub fn assign_to_const(name: &str) -> Self {
        CompileError::AssignToConst {
            name: name.to_string(),
        }
    }

    pub fn assign_to_captured(name: &str) -> Self {
        CompileError::AssignToCaptured {
            name: name.to_string(),
        }
    }

    /// Iteration bodies run as closures, so the enclosing function's locals
    /// are captured copies there.
    pub fn assign_in_iteration(name: &str) -> Self {
        CompileError::InvalidPosition {
            construct: "assignment".to_string(),
            reason: format!(
                "'{}' belongs to the enclosing function and cannot be assigned inside a loop, range, map, filter or reduce body",
                name
            ),
            hint: Some(format!(
                "carry the value through reduce's accumulator, or make '{}' a top-level variable",
                name
            )),
        }
    }

    pub fn return_outside_function() -> Self {
        CompileError::InvalidPosition {
            construct: "return".to_string(),
            reason: "return cannot appear at the top level".to_string(),
            hint: Some("the value of the last expression statement is the program's result".to_string()),
        }
    }

    pub fn return_in_iteration() -> Self {
        CompileError::InvalidPosition {
            construct: "return".to_string(),
            reason: "return cannot appear directly inside a loop, range, map, filter or reduce body"
                .to_string(),
            hint: Some("the body's last expression is its value".to_string()),
        }
    }

    pub fn encoding(construct: impl Into<String>, source: EncodingError) -> Self {
        CompileError::Encoding {
            construct: construct.into(),
            source,
        }
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        CompileError::Internal(msg.into())
    }
}

impl std::fmt::Display for CompileError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CompileError::UndefinedSymbol { name, hint } => {
                write!(f, "compile error: undefined symbol '{}'", name)?;
                if let Some(h) = hint {
                    write!(f, "\n  hint: {}", h)?;
                }
                Ok(())
            }
            CompileError::UndefinedMember { name } => {
                write!(f, "compile error: no type has a member named '{}'", name)
            }
            CompileError::UnsupportedOperator { operator, position } => write!(
                f,
                "compile error: unsupported {} operator '{}'",
                position, operator
            ),
            CompileError::AssignToConst { name } => {
                write!(f, "compile error: cannot assign to constant '{}'", name)?;
                write!(f, "\n  hint: declare it with var to make it assignable")
            }
            CompileError::AssignToCaptured { name } => {
                write!(
                    f,
                    "compile error: cannot assign to captured variable '{}'",
                    name
                )?;
                write!(
                    f,
                    "\n  hint: closures hold a copy of '{}'; assign it in the function that declares it",
                    name
                )
            }
            CompileError::InvalidPosition {
                construct,
                reason,
                hint,
            } => {
                write!(f, "compile error: {}: {}", construct, reason)?;
                if let Some(h) = hint {
                    write!(f, "\n  hint: {}", h)?;
                }
                Ok(())
            }
            CompileError::Encoding { construct, source } => {
                write!(f, "compile error: in {}: {}", construct, source)
            }
            CompileError::Internal(msg) => {
                write!(f, "compile error: internal error: {}", msg)
            }
        }
    }
}

impl std::error::Error for CompileError {}
