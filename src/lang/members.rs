//! Name-based member dispatch.
//!
//! Each receiver type owns a table of `(name, thunk)` pairs. The compiler
//! refers to member names by their position in [`METHOD_NAMES`]; the VM turns
//! that index back into a name and binds it to the receiver.

use crate::lang::value::{HashKey, HashPair, Value, array_slot};
use crate::runtime::runtime_error::RuntimeError;
use std::collections::BTreeMap;
use std::rc::Rc;

/// Lets native code call back into the running VM.
pub trait CallContext {
    fn call_value(&mut self, callee: &Value, args: Vec<Value>) -> Result<Value, RuntimeError>;
}

pub type BuiltinFn = fn(&mut dyn CallContext, Vec<Value>) -> Result<Value, RuntimeError>;

pub type MemberFn = fn(&mut dyn CallContext, &Value, Vec<Value>) -> Result<Value, RuntimeError>;

/// Member names addressable by `OpGetMethod`. Order is part of the bytecode
/// format.
pub const METHOD_NAMES: &[&str] = &[
    "len", "index", "set", "first", "last", "tail", "push", "map", "filter", "reduce", "iter",
    "upper", "lower", "keys", "values",
];

const ARRAY_MEMBERS: &[(&str, MemberFn)] = &[
    ("len", array_len as MemberFn),
    ("index", array_index as MemberFn),
    ("set", array_set as MemberFn),
    ("first", array_first as MemberFn),
    ("last", array_last as MemberFn),
    ("tail", array_tail as MemberFn),
    ("push", array_push as MemberFn),
    ("map", array_map as MemberFn),
    ("filter", array_filter as MemberFn),
    ("reduce", array_reduce as MemberFn),
];

const HASH_MEMBERS: &[(&str, MemberFn)] = &[
    ("len", hash_len as MemberFn),
    ("index", hash_index as MemberFn),
    ("set", hash_set as MemberFn),
    ("iter", hash_iter as MemberFn),
    ("keys", hash_keys as MemberFn),
    ("values", hash_values as MemberFn),
];

const STRING_MEMBERS: &[(&str, MemberFn)] = &[
    ("len", string_len as MemberFn),
    ("index", string_index as MemberFn),
    ("upper", string_upper as MemberFn),
    ("lower", string_lower as MemberFn),
];

pub fn lookup_member(receiver: &Value, name: &str) -> Option<MemberFn> {
    let table = match receiver {
        Value::Array(_) => ARRAY_MEMBERS,
        Value::Hash(_) => HASH_MEMBERS,
        Value::String(_) => STRING_MEMBERS,
        _ => return None,
    };
    table
        .iter()
        .find(|(member, _)| *member == name)
        .map(|(_, thunk)| *thunk)
}

// Argument helpers

pub(crate) fn expect_args(
    callee: &str,
    args: &[Value],
    expected: usize,
) -> Result<(), RuntimeError> {
    if args.len() != expected {
        return Err(RuntimeError::wrong_argument_count(
            callee,
            expected,
            args.len(),
        ));
    }
    Ok(())
}

fn expect_integer(op: &str, value: &Value) -> Result<i64, RuntimeError> {
    match value {
        Value::Integer(n) => Ok(*n),
        other => Err(RuntimeError::unsupported(op, other.type_name())),
    }
}

fn items(receiver: &Value) -> &[Value] {
    match receiver {
        Value::Array(items) => items.as_slice(),
        _ => &[],
    }
}

fn pairs(receiver: &Value) -> Option<&BTreeMap<HashKey, HashPair>> {
    match receiver {
        Value::Hash(pairs) => Some(&**pairs),
        _ => None,
    }
}

// Array members

fn array_len(_: &mut dyn CallContext, recv: &Value, args: Vec<Value>) -> Result<Value, RuntimeError> {
    expect_args("array.len", &args, 0)?;
    Ok(Value::Integer(items(recv).len() as i64))
}

fn array_index(_: &mut dyn CallContext, recv: &Value, args: Vec<Value>) -> Result<Value, RuntimeError> {
    expect_args("array.index", &args, 1)?;
    recv.index(&args[0])
}

fn array_set(_: &mut dyn CallContext, recv: &Value, args: Vec<Value>) -> Result<Value, RuntimeError> {
    expect_args("array.set", &args, 2)?;
    let mut args = args.into_iter();
    let (index, value) = match (args.next(), args.next()) {
        (Some(index), Some(value)) => (index, value),
        _ => return Err(RuntimeError::stack_underflow()),
    };
    let index = expect_integer("set", &index)?;
    let mut updated = items(recv).to_vec();
    let slot = array_slot(&updated, index, "set")?;
    updated[slot] = value;
    Ok(Value::array(updated))
}

fn array_first(_: &mut dyn CallContext, recv: &Value, args: Vec<Value>) -> Result<Value, RuntimeError> {
    expect_args("array.first", &args, 0)?;
    items(recv)
        .first()
        .cloned()
        .ok_or_else(|| RuntimeError::empty_array("first"))
}

fn array_last(_: &mut dyn CallContext, recv: &Value, args: Vec<Value>) -> Result<Value, RuntimeError> {
    expect_args("array.last", &args, 0)?;
    items(recv)
        .last()
        .cloned()
        .ok_or_else(|| RuntimeError::empty_array("last"))
}

fn array_tail(_: &mut dyn CallContext, recv: &Value, args: Vec<Value>) -> Result<Value, RuntimeError> {
    expect_args("array.tail", &args, 0)?;
    match items(recv).split_first() {
        Some((_, rest)) => Ok(Value::array(rest.to_vec())),
        None => Err(RuntimeError::empty_array("tail")),
    }
}

fn array_push(_: &mut dyn CallContext, recv: &Value, args: Vec<Value>) -> Result<Value, RuntimeError> {
    expect_args("array.push", &args, 1)?;
    let mut updated = items(recv).to_vec();
    updated.extend(args);
    Ok(Value::array(updated))
}

fn array_map(ctx: &mut dyn CallContext, recv: &Value, args: Vec<Value>) -> Result<Value, RuntimeError> {
    expect_args("array.map", &args, 1)?;
    let f = &args[0];
    let mapped = items(recv)
        .iter()
        .map(|item| ctx.call_value(f, vec![item.clone()]))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Value::array(mapped))
}

fn array_filter(ctx: &mut dyn CallContext, recv: &Value, args: Vec<Value>) -> Result<Value, RuntimeError> {
    expect_args("array.filter", &args, 1)?;
    let f = &args[0];
    let mut kept = Vec::new();
    for item in items(recv) {
        if ctx.call_value(f, vec![item.clone()])?.truthy() {
            kept.push(item.clone());
        }
    }
    Ok(Value::array(kept))
}

fn array_reduce(ctx: &mut dyn CallContext, recv: &Value, args: Vec<Value>) -> Result<Value, RuntimeError> {
    expect_args("array.reduce", &args, 2)?;
    let f = &args[0];
    let mut acc = args[1].clone();
    for item in items(recv) {
        acc = ctx.call_value(f, vec![acc, item.clone()])?;
    }
    Ok(acc)
}

// Hash members

fn hash_len(_: &mut dyn CallContext, recv: &Value, args: Vec<Value>) -> Result<Value, RuntimeError> {
    expect_args("hash.len", &args, 0)?;
    Ok(Value::Integer(pairs(recv).map_or(0, |p| p.len()) as i64))
}

fn hash_index(_: &mut dyn CallContext, recv: &Value, args: Vec<Value>) -> Result<Value, RuntimeError> {
    expect_args("hash.index", &args, 1)?;
    recv.index(&args[0])
}

fn hash_set(_: &mut dyn CallContext, recv: &Value, args: Vec<Value>) -> Result<Value, RuntimeError> {
    expect_args("hash.set", &args, 2)?;
    let mut args = args.into_iter();
    let (key, value) = match (args.next(), args.next()) {
        (Some(key), Some(value)) => (key, value),
        _ => return Err(RuntimeError::stack_underflow()),
    };
    let mut updated = pairs(recv).cloned().unwrap_or_default();
    updated.insert(key.hash_key()?, HashPair { key, value });
    Ok(Value::Hash(Rc::new(updated)))
}

fn hash_iter(_: &mut dyn CallContext, recv: &Value, args: Vec<Value>) -> Result<Value, RuntimeError> {
    expect_args("hash.iter", &args, 0)?;
    let entries = pairs(recv)
        .into_iter()
        .flat_map(|p| p.values())
        .map(|pair| Value::array(vec![pair.key.clone(), pair.value.clone()]))
        .collect();
    Ok(Value::array(entries))
}

fn hash_keys(_: &mut dyn CallContext, recv: &Value, args: Vec<Value>) -> Result<Value, RuntimeError> {
    expect_args("hash.keys", &args, 0)?;
    let keys = pairs(recv)
        .into_iter()
        .flat_map(|p| p.values())
        .map(|pair| pair.key.clone())
        .collect();
    Ok(Value::array(keys))
}

fn hash_values(_: &mut dyn CallContext, recv: &Value, args: Vec<Value>) -> Result<Value, RuntimeError> {
    expect_args("hash.values", &args, 0)?;
    let values = pairs(recv)
        .into_iter()
        .flat_map(|p| p.values())
        .map(|pair| pair.value.clone())
        .collect();
    Ok(Value::array(values))
}

// String members

fn text(recv: &Value) -> &str {
    match recv {
        Value::String(s) => s.as_str(),
        _ => "",
    }
}

fn string_len(_: &mut dyn CallContext, recv: &Value, args: Vec<Value>) -> Result<Value, RuntimeError> {
    expect_args("string.len", &args, 0)?;
    Ok(Value::Integer(text(recv).chars().count() as i64))
}

fn string_index(_: &mut dyn CallContext, recv: &Value, args: Vec<Value>) -> Result<Value, RuntimeError> {
    expect_args("string.index", &args, 1)?;
    recv.index(&args[0])
}

fn string_upper(_: &mut dyn CallContext, recv: &Value, args: Vec<Value>) -> Result<Value, RuntimeError> {
    expect_args("string.upper", &args, 0)?;
    Ok(Value::String(text(recv).to_uppercase()))
}

fn string_lower(_: &mut dyn CallContext, recv: &Value, args: Vec<Value>) -> Result<Value, RuntimeError> {
    expect_args("string.lower", &args, 0)?;
    Ok(Value::String(text(recv).to_lowercase()))
}
