use serde::{Deserialize, Serialize};

/// A `{ ... }` sequence of statements. Its value is the value of the last
/// statement when that is an expression statement, otherwise `null`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub statements: Vec<Statement>,
}

impl Block {
    pub fn new(statements: Vec<Statement>) -> Self {
        Self { statements }
    }

    /// A block holding a single expression statement.
    pub fn expr(expression: Expression) -> Self {
        Self::new(vec![Statement::Expression(expression)])
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Statement {
    /// `var name = value`
    Var { name: String, value: Expression },

    /// `const name = value`
    Const { name: String, value: Expression },

    /// `func name(params) { body }`
    Function {
        name: String,
        function: FunctionLiteral,
    },

    /// `name = value`, only valid for `var` bindings.
    Assign { name: String, value: Expression },

    /// `return value`
    Return(Expression),

    Expression(Expression),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionLiteral {
    /// Set for named functions; lets the body call itself.
    pub name: Option<String>,
    pub parameters: Vec<String>,
    pub body: Block,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expression {
    // ───────────────────────────── Literals ─────────────────────────────
    Integer(i64),
    String(String),
    Boolean(bool),
    Null,
    Array(Vec<Expression>),
    Hash(Vec<(Expression, Expression)>),

    Identifier(String),

    // ───────────────────────────── Operators ────────────────────────────
    /// `!x`, `-x`. The operator is the source token text.
    Prefix {
        operator: String,
        right: Box<Expression>,
    },

    /// `a + b` and friends. The operator is the source token text.
    Infix {
        left: Box<Expression>,
        operator: String,
        right: Box<Expression>,
    },

    // ──────────────────────────── Control flow ──────────────────────────
    /// `condition ? yes : no`
    Conditional {
        condition: Box<Expression>,
        yes: Box<Expression>,
        no: Box<Expression>,
    },

    /// `if (condition) { ... } else { ... }`; `else if` nests another `If`
    /// as the only statement of the alternative.
    If {
        condition: Box<Expression>,
        consequence: Block,
        alternative: Option<Block>,
    },

    // ───────────────────────────── Functions ────────────────────────────
    Function(FunctionLiteral),

    /// `function(arguments)`
    Call {
        function: Box<Expression>,
        arguments: Vec<Expression>,
    },

    /// `receiver.member(arguments)`
    CallMember {
        receiver: Box<Expression>,
        member: String,
        arguments: Vec<Expression>,
    },

    /// `receiver.member`, evaluates to a bound method.
    ObjectMember {
        receiver: Box<Expression>,
        member: String,
    },

    /// `left[index]`
    Index {
        left: Box<Expression>,
        index: Box<Expression>,
    },

    // ──────────────────────────── Iteration ─────────────────────────────
    /// `loop (bound) { body }` or `loop (i : bound) { body }`; evaluates to
    /// `null`.
    Loop {
        bound: Box<Expression>,
        index: Option<String>,
        body: Block,
    },

    /// `range(bound)`, the array `[0, 1, ..., bound - 1]`.
    Range { bound: Box<Expression> },

    /// `map(subject, item) { body }`
    Map {
        subject: Box<Expression>,
        item: String,
        body: Block,
    },

    /// `filter(subject, item) { body }`
    Filter {
        subject: Box<Expression>,
        item: String,
        body: Block,
    },

    /// `reduce(subject, accumulator, item, initial) { body }`
    Reduce {
        subject: Box<Expression>,
        accumulator: String,
        item: String,
        initial: Box<Expression>,
        body: Block,
    },
}

// Builders used by embedders and tests that construct trees by hand.
impl Expression {
    pub fn int(n: i64) -> Self {
        Expression::Integer(n)
    }

    pub fn string(s: &str) -> Self {
        Expression::String(s.to_string())
    }

    pub fn ident(name: &str) -> Self {
        Expression::Identifier(name.to_string())
    }

    pub fn prefix(operator: &str, right: Expression) -> Self {
        Expression::Prefix {
            operator: operator.to_string(),
            right: Box::new(right),
        }
    }

    pub fn infix(left: Expression, operator: &str, right: Expression) -> Self {
        Expression::Infix {
            left: Box::new(left),
            operator: operator.to_string(),
            right: Box::new(right),
        }
    }

    pub fn conditional(condition: Expression, yes: Expression, no: Expression) -> Self {
        Expression::Conditional {
            condition: Box::new(condition),
            yes: Box::new(yes),
            no: Box::new(no),
        }
    }

    pub fn if_else(condition: Expression, consequence: Block, alternative: Option<Block>) -> Self {
        Expression::If {
            condition: Box::new(condition),
            consequence,
            alternative,
        }
    }

    pub fn function(parameters: &[&str], body: Block) -> Self {
        Expression::Function(FunctionLiteral {
            name: None,
            parameters: parameters.iter().map(|p| p.to_string()).collect(),
            body,
        })
    }

    pub fn call(function: Expression, arguments: Vec<Expression>) -> Self {
        Expression::Call {
            function: Box::new(function),
            arguments,
        }
    }

    pub fn call_member(receiver: Expression, member: &str, arguments: Vec<Expression>) -> Self {
        Expression::CallMember {
            receiver: Box::new(receiver),
            member: member.to_string(),
            arguments,
        }
    }

    pub fn member(receiver: Expression, member: &str) -> Self {
        Expression::ObjectMember {
            receiver: Box::new(receiver),
            member: member.to_string(),
        }
    }

    pub fn index(left: Expression, index: Expression) -> Self {
        Expression::Index {
            left: Box::new(left),
            index: Box::new(index),
        }
    }
}

impl Statement {
    pub fn var(name: &str, value: Expression) -> Self {
        Statement::Var {
            name: name.to_string(),
            value,
        }
    }

    pub fn constant(name: &str, value: Expression) -> Self {
        Statement::Const {
            name: name.to_string(),
            value,
        }
    }

    pub fn assign(name: &str, value: Expression) -> Self {
        Statement::Assign {
            name: name.to_string(),
            value,
        }
    }

    pub fn function(name: &str, parameters: &[&str], body: Block) -> Self {
        Statement::Function {
            name: name.to_string(),
            function: FunctionLiteral {
                name: Some(name.to_string()),
                parameters: parameters.iter().map(|p| p.to_string()).collect(),
                body,
            },
        }
    }

    pub fn expr(expression: Expression) -> Self {
        Statement::Expression(expression)
    }
}
