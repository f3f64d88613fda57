use crate::bytecode::op::EncodingError;

/// What went wrong while executing bytecode.
#[derive(Debug, Clone, PartialEq)]
pub enum RuntimeErrorKind {
    /// An operator was applied to operand types it does not support.
    UnsupportedOperation {
        op: String,
        left: &'static str,
        right: Option<&'static str>,
    },
    /// A value that cannot be used as a hash key.
    NotHashable { type_name: &'static str },
    /// A call instruction found a non-callable value in callee position.
    NotCallable { type_name: &'static str },
    /// A member name that the receiver's type does not provide.
    NoSuchMember {
        name: String,
        type_name: &'static str,
    },
    /// An element was requested from an empty array.
    EmptyArray { op: String },
    IndexOutOfBounds { index: i64, len: usize },
    DivisionByZero,
    WrongArgumentCount {
        callee: String,
        expected: usize,
        got: usize,
    },
    /// The operand stack or the frame stack hit its configured limit.
    StackOverflow { stack: &'static str, limit: usize },
    StackUnderflow,
    StepLimit { max: usize },
    /// Malformed instruction stream or constant reference.
    Bytecode(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct RuntimeError {
    pub kind: RuntimeErrorKind,
    pub call_stack: Vec<String>,
}

impl std::fmt::Display for RuntimeErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RuntimeErrorKind::UnsupportedOperation { op, left, right } => match right {
                Some(right) => write!(
                    f,
                    "unsupported operation '{}' for {} and {}",
                    op, left, right
                ),
                None => write!(f, "unsupported operation '{}' for {}", op, left),
            },
            RuntimeErrorKind::NotHashable { type_name } => {
                write!(f, "{} is not hashable", type_name)
            }
            RuntimeErrorKind::NotCallable { type_name } => {
                write!(f, "{} is not callable", type_name)
            }
            RuntimeErrorKind::NoSuchMember { name, type_name } => {
                write!(f, "{} has no member '{}'", type_name, name)
            }
            RuntimeErrorKind::EmptyArray { op } => write!(f, "'{}' on an empty array", op),
            RuntimeErrorKind::IndexOutOfBounds { index, len } => {
                write!(f, "index {} out of bounds for length {}", index, len)
            }
            RuntimeErrorKind::DivisionByZero => write!(f, "division by zero"),
            RuntimeErrorKind::WrongArgumentCount {
                callee,
                expected,
                got,
            } => write!(
                f,
                "{} expects {} argument(s), got {}",
                callee, expected, got
            ),
            RuntimeErrorKind::StackOverflow { stack, limit } => {
                write!(f, "{} stack overflow (limit {})", stack, limit)
            }
            RuntimeErrorKind::StackUnderflow => write!(f, "operand stack underflow"),
            RuntimeErrorKind::StepLimit { max } => {
                write!(f, "execution step limit exceeded ({})", max)
            }
            RuntimeErrorKind::Bytecode(msg) => write!(f, "malformed bytecode: {}", msg),
        }
    }
}

impl std::fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "runtime error: {}", self.kind)?;

        if !self.call_stack.is_empty() {
            write!(f, "\n  call stack:")?;

            for (i, frame) in self.call_stack.iter().rev().enumerate() {
                write!(f, "\n    {}: {}", i, frame)?;
            }
        }
        Ok(())
    }
}

impl std::error::Error for RuntimeError {}

impl From<RuntimeErrorKind> for RuntimeError {
    fn from(kind: RuntimeErrorKind) -> Self {
        RuntimeError::new(kind)
    }
}

impl From<EncodingError> for RuntimeError {
    fn from(err: EncodingError) -> Self {
        RuntimeError::new(RuntimeErrorKind::Bytecode(err.to_string()))
    }
}

impl RuntimeError {
    pub fn new(kind: RuntimeErrorKind) -> Self {
        RuntimeError {
            kind,
            call_stack: Vec::new(),
        }
    }

    pub fn with_context(mut self, context: &str) -> Self {
        self.call_stack.push(context.to_string());
        self
    }

    pub fn unsupported(op: impl Into<String>, type_name: &'static str) -> Self {
        Self::new(RuntimeErrorKind::UnsupportedOperation {
            op: op.into(),
            left: type_name,
            right: None,
        })
    }

    pub fn unsupported_binary(
        op: impl Into<String>,
        left: &'static str,
        right: &'static str,
    ) -> Self {
        Self::new(RuntimeErrorKind::UnsupportedOperation {
            op: op.into(),
            left,
            right: Some(right),
        })
    }

    pub fn not_hashable(type_name: &'static str) -> Self {
        Self::new(RuntimeErrorKind::NotHashable { type_name })
    }

    pub fn not_callable(type_name: &'static str) -> Self {
        Self::new(RuntimeErrorKind::NotCallable { type_name })
    }

    pub fn no_such_member(name: impl Into<String>, type_name: &'static str) -> Self {
        Self::new(RuntimeErrorKind::NoSuchMember {
            name: name.into(),
            type_name,
        })
    }

    pub fn empty_array(op: impl Into<String>) -> Self {
        Self::new(RuntimeErrorKind::EmptyArray { op: op.into() })
    }

    pub fn index_out_of_bounds(index: i64, len: usize) -> Self {
        Self::new(RuntimeErrorKind::IndexOutOfBounds { index, len })
    }

    pub fn division_by_zero() -> Self {
        Self::new(RuntimeErrorKind::DivisionByZero)
    }

    pub fn wrong_argument_count(callee: impl Into<String>, expected: usize, got: usize) -> Self {
        Self::new(RuntimeErrorKind::WrongArgumentCount {
            callee: callee.into(),
            expected,
            got,
        })
    }

    pub fn stack_overflow(stack: &'static str, limit: usize) -> Self {
        Self::new(RuntimeErrorKind::StackOverflow { stack, limit })
    }

    pub fn stack_underflow() -> Self {
        Self::new(RuntimeErrorKind::StackUnderflow)
    }

    pub fn bytecode(msg: impl Into<String>) -> Self {
        Self::new(RuntimeErrorKind::Bytecode(msg.into()))
    }
}
