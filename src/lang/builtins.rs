use crate::lang::members::{CallContext, expect_args};
use crate::lang::value::{Builtin, Value};
use crate::runtime::runtime_error::RuntimeError;

/// Builtin slot table. `OpGetBuiltin` operands index into it, so the order is
/// part of the bytecode format.
pub const BUILTINS: &[Builtin] = &[
    Builtin {
        name: "len",
        func: builtin_len,
    },
    Builtin {
        name: "puts",
        func: builtin_puts,
    },
    Builtin {
        name: "type",
        func: builtin_type,
    },
    Builtin {
        name: "str",
        func: builtin_str,
    },
    Builtin {
        name: "first",
        func: builtin_first,
    },
    Builtin {
        name: "last",
        func: builtin_last,
    },
    Builtin {
        name: "tail",
        func: builtin_tail,
    },
    Builtin {
        name: "push",
        func: builtin_push,
    },
];

pub fn builtin_index(name: &str) -> Option<usize> {
    BUILTINS.iter().position(|b| b.name == name)
}

fn builtin_len(ctx: &mut dyn CallContext, args: Vec<Value>) -> Result<Value, RuntimeError> {
    expect_args("len", &args, 1)?;
    match &args[0] {
        v @ (Value::String(_) | Value::Array(_) | Value::Hash(_)) => {
            v.call_member(ctx, "len", vec![])
        }
        other => Err(RuntimeError::unsupported("len", other.type_name())),
    }
}

fn builtin_puts(_: &mut dyn CallContext, args: Vec<Value>) -> Result<Value, RuntimeError> {
    for arg in &args {
        println!("{}", arg);
    }
    Ok(Value::Null)
}

fn builtin_type(_: &mut dyn CallContext, args: Vec<Value>) -> Result<Value, RuntimeError> {
    expect_args("type", &args, 1)?;
    Ok(Value::string(args[0].type_name()))
}

fn builtin_str(_: &mut dyn CallContext, args: Vec<Value>) -> Result<Value, RuntimeError> {
    expect_args("str", &args, 1)?;
    Ok(Value::String(args[0].to_string()))
}

// The list helpers forward to the array members of their first argument.
fn forward(
    ctx: &mut dyn CallContext,
    name: &str,
    mut args: Vec<Value>,
) -> Result<Value, RuntimeError> {
    if args.is_empty() {
        return Err(RuntimeError::wrong_argument_count(name, 1, 0));
    }
    let receiver = args.remove(0);
    match receiver {
        Value::Array(_) => receiver.call_member(ctx, name, args),
        other => Err(RuntimeError::unsupported(name, other.type_name())),
    }
}

fn builtin_first(ctx: &mut dyn CallContext, args: Vec<Value>) -> Result<Value, RuntimeError> {
    forward(ctx, "first", args)
}

fn builtin_last(ctx: &mut dyn CallContext, args: Vec<Value>) -> Result<Value, RuntimeError> {
    forward(ctx, "last", args)
}

fn builtin_tail(ctx: &mut dyn CallContext, args: Vec<Value>) -> Result<Value, RuntimeError> {
    forward(ctx, "tail", args)
}

fn builtin_push(ctx: &mut dyn CallContext, args: Vec<Value>) -> Result<Value, RuntimeError> {
    forward(ctx, "push", args)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::runtime_error::RuntimeErrorKind;

    struct NoCallbacks;

    impl CallContext for NoCallbacks {
        fn call_value(&mut self, callee: &Value, _: Vec<Value>) -> Result<Value, RuntimeError> {
            Err(RuntimeError::not_callable(callee.type_name()))
        }
    }

    fn call(name: &str, args: Vec<Value>) -> Result<Value, RuntimeError> {
        let builtin = BUILTINS[builtin_index(name).unwrap()];
        (builtin.func)(&mut NoCallbacks, args)
    }

    #[test]
    fn test_builtin_indices_are_stable() {
        assert_eq!(builtin_index("len"), Some(0));
        assert_eq!(builtin_index("push"), Some(7));
        assert_eq!(builtin_index("nope"), None);
    }

    #[test]
    fn test_len() {
        assert_eq!(
            call("len", vec![Value::string("four")]).unwrap(),
            Value::Integer(4)
        );
        let err = call("len", vec![Value::Integer(1)]).unwrap_err();
        assert!(matches!(
            err.kind,
            RuntimeErrorKind::UnsupportedOperation { .. }
        ));
    }

    #[test]
    fn test_type_and_str() {
        assert_eq!(
            call("type", vec![Value::Null]).unwrap(),
            Value::string("null")
        );
        assert_eq!(
            call("str", vec![Value::Integer(12)]).unwrap(),
            Value::string("12")
        );
    }

    #[test]
    fn test_list_helpers_forward() {
        let xs = Value::array(vec![Value::Integer(1), Value::Integer(2)]);

        assert_eq!(call("last", vec![xs.clone()]).unwrap(), Value::Integer(2));
        assert_eq!(
            call("push", vec![xs, Value::Integer(3)]).unwrap(),
            Value::array(vec![Value::Integer(1), Value::Integer(2), Value::Integer(3)])
        );
        assert!(call("first", vec![Value::string("x")]).is_err());
    }
}
