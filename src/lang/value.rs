use crate::bytecode::ir::Instructions;
use crate::lang::members::{self, BuiltinFn, MemberFn};
use crate::runtime::runtime_error::RuntimeError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::rc::Rc;

/// Runtime value of the Ember language.
///
/// Arrays and hashes are immutable once built; members such as `push` and
/// `set` return a new container. Function forms never appear in a serialized
/// constant pool except `CompiledFunction`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// 64-bit signed integer.
    Integer(i64),

    /// UTF-8 string value.
    String(String),

    Boolean(bool),

    Null,

    Array(Rc<Vec<Value>>),

    Hash(Rc<BTreeMap<HashKey, HashPair>>),

    /// Function body as emitted by the compiler. Holds no captured values.
    CompiledFunction(Rc<CompiledFunction>),

    // Runtime-only forms stay last so serialized variant indices are stable.
    /// Native function from the builtin table.
    #[serde(skip)]
    Builtin(Builtin),

    /// A compiled function paired with the values it captured.
    #[serde(skip)]
    Closure(Rc<Closure>),

    /// A member looked up on a receiver, waiting to be called.
    #[serde(skip)]
    BoundMethod(Rc<BoundMethod>),
}

/// Key of a hash entry. Only integers, strings and booleans are hashable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum HashKey {
    Integer(i64),
    String(String),
    Boolean(bool),
}

/// A hash entry keeps the original key value next to the value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HashPair {
    pub key: Value,
    pub value: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompiledFunction {
    pub instructions: Instructions,
    pub num_locals: usize,
    pub num_parameters: usize,
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Closure {
    pub func: Rc<CompiledFunction>,
    pub free: Vec<Value>,
}

impl Closure {
    pub fn name(&self) -> &str {
        self.func.name.as_deref().unwrap_or("<anonymous>")
    }
}

#[derive(Clone, Copy)]
pub struct Builtin {
    pub name: &'static str,
    pub func: BuiltinFn,
}

impl std::fmt::Debug for Builtin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Builtin({})", self.name)
    }
}

impl PartialEq for Builtin {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

#[derive(Clone)]
pub struct BoundMethod {
    pub receiver: Value,
    pub name: &'static str,
    pub thunk: MemberFn,
}

impl std::fmt::Debug for BoundMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoundMethod")
            .field("receiver", &self.receiver)
            .field("name", &self.name)
            .finish()
    }
}

impl PartialEq for BoundMethod {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.receiver == other.receiver
    }
}

/// Binary operators understood by [`Value::calc`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Lt,
    Gt,
    Leq,
    Geq,
    Eq,
    Neq,
    And,
    Or,
}

impl BinaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
            BinaryOp::Lt => "<",
            BinaryOp::Gt => ">",
            BinaryOp::Leq => "<=",
            BinaryOp::Geq => ">=",
            BinaryOp::Eq => "==",
            BinaryOp::Neq => "!=",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
        }
    }
}

impl Value {
    pub fn string(s: impl Into<String>) -> Self {
        Value::String(s.into())
    }

    pub fn array(items: Vec<Value>) -> Self {
        Value::Array(Rc::new(items))
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Integer(_) => "integer",
            Value::String(_) => "string",
            Value::Boolean(_) => "boolean",
            Value::Null => "null",
            Value::Array(_) => "array",
            Value::Hash(_) => "hash",
            Value::Builtin(_) => "builtin",
            Value::CompiledFunction(_) => "function",
            Value::Closure(_) => "closure",
            Value::BoundMethod(_) => "bound method",
        }
    }

    /// Condition value as seen by conditional jumps.
    ///
    /// Arrays and hashes are falsy whatever their contents.
    pub fn truthy(&self) -> bool {
        match self {
            Value::Boolean(b) => *b,
            Value::Integer(n) => *n != 0,
            Value::String(s) => !s.is_empty(),
            Value::Null => false,
            Value::Array(_) | Value::Hash(_) => false,
            Value::Builtin(_)
            | Value::CompiledFunction(_)
            | Value::Closure(_)
            | Value::BoundMethod(_) => true,
        }
    }

    pub fn callable(&self) -> bool {
        matches!(
            self,
            Value::Builtin(_)
                | Value::CompiledFunction(_)
                | Value::Closure(_)
                | Value::BoundMethod(_)
        )
    }

    pub fn hash_key(&self) -> Result<HashKey, RuntimeError> {
        match self {
            Value::Integer(n) => Ok(HashKey::Integer(*n)),
            Value::String(s) => Ok(HashKey::String(s.clone())),
            Value::Boolean(b) => Ok(HashKey::Boolean(*b)),
            other => Err(RuntimeError::not_hashable(other.type_name())),
        }
    }

    /// Structural equality. Function forms compare by identity.
    pub fn equals(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Null, Value::Null) => true,
            (Value::Array(a), Value::Array(b)) => {
                a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| x.equals(y))
            }
            (Value::Hash(a), Value::Hash(b)) => {
                a.len() == b.len()
                    && a.iter().all(|(key, pair)| {
                        b.get(key)
                            .is_some_and(|other| pair.value.equals(&other.value))
                    })
            }
            (Value::Builtin(a), Value::Builtin(b)) => a.name == b.name,
            (Value::CompiledFunction(a), Value::CompiledFunction(b)) => Rc::ptr_eq(a, b),
            (Value::Closure(a), Value::Closure(b)) => Rc::ptr_eq(a, b),
            (Value::BoundMethod(a), Value::BoundMethod(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// Combine `self` (left operand) with `right`.
    pub fn calc(&self, op: BinaryOp, right: &Value) -> Result<Value, RuntimeError> {
        match op {
            BinaryOp::Eq => return Ok(Value::Boolean(self.equals(right))),
            BinaryOp::Neq => return Ok(Value::Boolean(!self.equals(right))),
            BinaryOp::And | BinaryOp::Or => return Ok(self.logical(op, right)),
            _ => {}
        }

        match (self, right) {
            (Value::Integer(l), Value::Integer(r)) => integer_calc(op, *l, *r),
            (Value::String(l), Value::String(r)) => string_calc(op, l, r),
            (Value::Array(l), Value::Array(r)) if op == BinaryOp::Add => {
                let mut items = Vec::with_capacity(l.len() + r.len());
                items.extend(l.iter().cloned());
                items.extend(r.iter().cloned());
                Ok(Value::array(items))
            }
            _ => Err(RuntimeError::unsupported_binary(
                op.symbol(),
                self.type_name(),
                right.type_name(),
            )),
        }
    }

    // `&&`/`||` hand back an operand unless a boolean is involved.
    fn logical(&self, op: BinaryOp, right: &Value) -> Value {
        if matches!(self, Value::Boolean(_)) || matches!(right, Value::Boolean(_)) {
            let (l, r) = (self.truthy(), right.truthy());
            return Value::Boolean(match op {
                BinaryOp::And => l && r,
                _ => l || r,
            });
        }

        let pick_left = match op {
            BinaryOp::And => !self.truthy(),
            _ => self.truthy(),
        };
        if pick_left { self.clone() } else { right.clone() }
    }

    pub fn negate(&self) -> Result<Value, RuntimeError> {
        match self {
            Value::Integer(n) => Ok(Value::Integer(n.wrapping_neg())),
            other => Err(RuntimeError::unsupported("-", other.type_name())),
        }
    }

    /// `left[index]`.
    pub fn index(&self, index: &Value) -> Result<Value, RuntimeError> {
        match (self, index) {
            (Value::Array(items), Value::Integer(i)) => {
                let slot = array_slot(items, *i, "index")?;
                Ok(items[slot].clone())
            }
            (Value::Hash(pairs), key) => {
                let key = key.hash_key()?;
                Ok(pairs
                    .get(&key)
                    .map(|pair| pair.value.clone())
                    .unwrap_or(Value::Null))
            }
            (Value::String(s), Value::Integer(i)) => {
                let len = s.chars().count();
                usize::try_from(*i)
                    .ok()
                    .and_then(|at| s.chars().nth(at))
                    .map(|c| Value::String(c.to_string()))
                    .ok_or_else(|| RuntimeError::index_out_of_bounds(*i, len))
            }
            _ => Err(RuntimeError::unsupported_binary(
                "[]",
                self.type_name(),
                index.type_name(),
            )),
        }
    }

    /// Look up `name` on this value and pair it with the receiver.
    pub fn bind_member(&self, name: &'static str) -> Result<Value, RuntimeError> {
        let thunk = members::lookup_member(self, name)
            .ok_or_else(|| RuntimeError::no_such_member(name, self.type_name()))?;
        Ok(Value::BoundMethod(Rc::new(BoundMethod {
            receiver: self.clone(),
            name,
            thunk,
        })))
    }

    pub fn call_member(
        &self,
        ctx: &mut dyn members::CallContext,
        name: &str,
        args: Vec<Value>,
    ) -> Result<Value, RuntimeError> {
        let thunk = members::lookup_member(self, name)
            .ok_or_else(|| RuntimeError::no_such_member(name, self.type_name()))?;
        thunk(ctx, self, args)
    }

    /// Display form with strings quoted, used inside containers.
    pub fn inspect(&self) -> String {
        match self {
            Value::String(s) => format!("{:?}", s),
            other => other.to_string(),
        }
    }
}

/// Resolve an array position, distinguishing an empty array from a bad index.
pub(crate) fn array_slot(items: &[Value], index: i64, op: &str) -> Result<usize, RuntimeError> {
    if items.is_empty() {
        return Err(RuntimeError::empty_array(op));
    }
    usize::try_from(index)
        .ok()
        .filter(|&i| i < items.len())
        .ok_or_else(|| RuntimeError::index_out_of_bounds(index, items.len()))
}

fn integer_calc(op: BinaryOp, l: i64, r: i64) -> Result<Value, RuntimeError> {
    Ok(match op {
        BinaryOp::Add => Value::Integer(l.wrapping_add(r)),
        BinaryOp::Sub => Value::Integer(l.wrapping_sub(r)),
        BinaryOp::Mul => Value::Integer(l.wrapping_mul(r)),
        BinaryOp::Div => {
            if r == 0 {
                return Err(RuntimeError::division_by_zero());
            }
            Value::Integer(l.wrapping_div(r))
        }
        BinaryOp::Mod => {
            if r == 0 {
                return Err(RuntimeError::division_by_zero());
            }
            Value::Integer(l.wrapping_rem(r))
        }
        BinaryOp::Lt => Value::Boolean(l < r),
        BinaryOp::Gt => Value::Boolean(l > r),
        BinaryOp::Leq => Value::Boolean(l <= r),
        BinaryOp::Geq => Value::Boolean(l >= r),
        BinaryOp::Eq => Value::Boolean(l == r),
        BinaryOp::Neq => Value::Boolean(l != r),
        BinaryOp::And | BinaryOp::Or => {
            return Err(RuntimeError::unsupported_binary(
                op.symbol(),
                "integer",
                "integer",
            ));
        }
    })
}

fn string_calc(op: BinaryOp, l: &str, r: &str) -> Result<Value, RuntimeError> {
    Ok(match op {
        BinaryOp::Add => Value::String(format!("{}{}", l, r)),
        BinaryOp::Lt => Value::Boolean(l < r),
        BinaryOp::Gt => Value::Boolean(l > r),
        BinaryOp::Leq => Value::Boolean(l <= r),
        BinaryOp::Geq => Value::Boolean(l >= r),
        _ => {
            return Err(RuntimeError::unsupported_binary(
                op.symbol(),
                "string",
                "string",
            ));
        }
    })
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Integer(n) => write!(f, "{}", n),
            Value::String(s) => write!(f, "{}", s),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Null => write!(f, "null"),
            Value::Array(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item.inspect())?;
                }
                write!(f, "]")
            }
            Value::Hash(pairs) => {
                write!(f, "{{")?;
                for (i, pair) in pairs.values().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", pair.key.inspect(), pair.value.inspect())?;
                }
                write!(f, "}}")
            }
            Value::Builtin(b) => write!(f, "<builtin {}>", b.name),
            Value::CompiledFunction(func) => write!(
                f,
                "<function {}>",
                func.name.as_deref().unwrap_or("<anonymous>")
            ),
            Value::Closure(closure) => write!(f, "<closure {}>", closure.name()),
            Value::BoundMethod(bound) => {
                write!(f, "<bound {}.{}>", bound.receiver.type_name(), bound.name)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::runtime_error::RuntimeErrorKind;

    fn int(n: i64) -> Value {
        Value::Integer(n)
    }

    fn hash(pairs: &[(Value, Value)]) -> Value {
        let map = pairs
            .iter()
            .map(|(k, v)| {
                (
                    k.hash_key().unwrap(),
                    HashPair {
                        key: k.clone(),
                        value: v.clone(),
                    },
                )
            })
            .collect();
        Value::Hash(Rc::new(map))
    }

    #[test]
    fn test_truthiness_table() {
        assert!(!int(0).truthy());
        assert!(int(-3).truthy());
        assert!(!Value::string("").truthy());
        assert!(Value::string("x").truthy());
        assert!(!Value::Null.truthy());
        assert!(Value::Boolean(true).truthy());
        assert!(!Value::array(vec![]).truthy());
        assert!(!Value::array(vec![int(1)]).truthy());
        assert!(!hash(&[(int(1), int(2))]).truthy());
    }

    #[test]
    fn test_integer_arithmetic_matches_host() {
        let pairs = [(7, 2), (-7, 2), (7, -2), (0, 5), (13, 13), (-9, -4)];
        for (a, b) in pairs {
            let expected = [
                (BinaryOp::Add, int(a + b)),
                (BinaryOp::Sub, int(a - b)),
                (BinaryOp::Mul, int(a * b)),
                (BinaryOp::Div, int(a / b)),
                (BinaryOp::Mod, int(a % b)),
                (BinaryOp::Lt, Value::Boolean(a < b)),
                (BinaryOp::Gt, Value::Boolean(a > b)),
                (BinaryOp::Leq, Value::Boolean(a <= b)),
                (BinaryOp::Geq, Value::Boolean(a >= b)),
                (BinaryOp::Eq, Value::Boolean(a == b)),
                (BinaryOp::Neq, Value::Boolean(a != b)),
            ];
            for (op, value) in expected {
                assert_eq!(
                    int(a).calc(op, &int(b)).unwrap(),
                    value,
                    "{} {} {}",
                    a,
                    op.symbol(),
                    b
                );
            }
        }
    }

    #[test]
    fn test_division_truncates_toward_zero() {
        assert_eq!(int(-7).calc(BinaryOp::Div, &int(2)).unwrap(), int(-3));
    }

    #[test]
    fn test_division_by_zero() {
        let err = int(1).calc(BinaryOp::Div, &int(0)).unwrap_err();

        assert_eq!(err.kind, RuntimeErrorKind::DivisionByZero);
    }

    #[test]
    fn test_unsupported_mixed_operands() {
        let err = int(1).calc(BinaryOp::Add, &Value::string("a")).unwrap_err();

        assert_eq!(
            err.kind,
            RuntimeErrorKind::UnsupportedOperation {
                op: "+".to_string(),
                left: "integer",
                right: Some("string"),
            }
        );
    }

    #[test]
    fn test_string_concat_and_compare() {
        let a = Value::string("ab");
        let b = Value::string("c");

        assert_eq!(a.calc(BinaryOp::Add, &b).unwrap(), Value::string("abc"));
        assert_eq!(a.calc(BinaryOp::Lt, &b).unwrap(), Value::Boolean(true));
        assert!(a.calc(BinaryOp::Sub, &b).is_err());
    }

    #[test]
    fn test_equality_never_fails_across_types() {
        assert_eq!(
            int(1).calc(BinaryOp::Eq, &Value::string("1")).unwrap(),
            Value::Boolean(false)
        );
        assert_eq!(
            Value::Null.calc(BinaryOp::Neq, &Value::Null).unwrap(),
            Value::Boolean(false)
        );
    }

    #[test]
    fn test_logical_operators_return_operands() {
        let a = Value::string("a");
        let b = int(2);

        assert_eq!(a.calc(BinaryOp::And, &b).unwrap(), b);
        assert_eq!(a.calc(BinaryOp::Or, &b).unwrap(), a);
        assert_eq!(int(0).calc(BinaryOp::And, &b).unwrap(), int(0));
        assert_eq!(int(0).calc(BinaryOp::Or, &b).unwrap(), b);
    }

    #[test]
    fn test_logical_operators_coerce_with_booleans() {
        assert_eq!(
            Value::Boolean(true).calc(BinaryOp::And, &int(5)).unwrap(),
            Value::Boolean(true)
        );
        assert_eq!(
            int(0).calc(BinaryOp::Or, &Value::Boolean(false)).unwrap(),
            Value::Boolean(false)
        );
    }

    #[test]
    fn test_structural_equality() {
        let a = Value::array(vec![int(1), Value::string("x")]);
        let b = Value::array(vec![int(1), Value::string("x")]);
        assert!(a.equals(&b));

        let h1 = hash(&[(Value::string("k"), int(1))]);
        let h2 = hash(&[(Value::string("k"), int(1))]);
        let h3 = hash(&[(Value::string("k"), int(2))]);
        assert!(h1.equals(&h2));
        assert!(!h1.equals(&h3));
    }

    #[test]
    fn test_hash_key_consistent_with_equals() {
        let a = Value::string("name");
        let b = Value::string("name");

        assert!(a.equals(&b));
        assert_eq!(a.hash_key().unwrap(), b.hash_key().unwrap());
        assert_ne!(
            int(1).hash_key().unwrap(),
            Value::Boolean(true).hash_key().unwrap()
        );
    }

    #[test]
    fn test_unhashable_values() {
        let err = Value::array(vec![]).hash_key().unwrap_err();

        assert_eq!(err.kind, RuntimeErrorKind::NotHashable { type_name: "array" });
    }

    #[test]
    fn test_index_empty_array() {
        let err = Value::array(vec![]).index(&int(0)).unwrap_err();

        assert!(matches!(err.kind, RuntimeErrorKind::EmptyArray { .. }));
    }

    #[test]
    fn test_index_out_of_bounds() {
        let err = Value::array(vec![int(1)]).index(&int(1)).unwrap_err();

        assert_eq!(
            err.kind,
            RuntimeErrorKind::IndexOutOfBounds { index: 1, len: 1 }
        );
    }

    #[test]
    fn test_index_hash_missing_key_is_null() {
        let h = hash(&[(int(1), Value::string("one"))]);

        assert_eq!(h.index(&int(1)).unwrap(), Value::string("one"));
        assert_eq!(h.index(&int(2)).unwrap(), Value::Null);
    }

    #[test]
    fn test_callable() {
        assert!(!int(5).callable());
        assert!(
            Value::CompiledFunction(Rc::new(CompiledFunction {
                instructions: Instructions::new(),
                num_locals: 0,
                num_parameters: 0,
                name: None,
            }))
            .callable()
        );
    }

    #[test]
    fn test_display_nested() {
        let v = Value::array(vec![int(1), Value::string("a"), Value::Null]);

        assert_eq!(v.to_string(), "[1, \"a\", null]");
    }
}
