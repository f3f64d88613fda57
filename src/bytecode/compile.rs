use std::rc::Rc;

use tracing::{debug, warn};

use crate::{
    bytecode::{
        Bytecode, Instructions,
        compile_error::CompileError,
        op::{Op, make},
        symbol_table::{Symbol, SymbolScope, SymbolTable},
    },
    lang::{
        builtins::{BUILTINS, builtin_index},
        members::METHOD_NAMES,
        node::{Block, Expression, FunctionLiteral, Statement},
        program::Program,
        value::{CompiledFunction, Value},
    },
};

/// Operand written into a forward jump until its target is known.
const PLACEHOLDER: usize = 9999;

#[derive(Debug, Clone, Copy)]
struct EmittedInstruction {
    op: Op,
    position: usize,
}

/// Instruction buffer of one function body (or of the main program).
#[derive(Debug, Default)]
struct CompilationScope {
    instructions: Instructions,
    last_instruction: Option<EmittedInstruction>,
    previous_instruction: Option<EmittedInstruction>,
    /// Set for the synthetic closures behind loop/range/map/filter/reduce.
    iteration: bool,
}

struct LeftScope {
    instructions: Instructions,
    free_symbols: Vec<Symbol>,
    num_locals: usize,
}

/// One arm of a conditional.
enum Branch<'a> {
    Expression(&'a Expression),
    Block(&'a Block),
    Empty,
}

/// The five iteration forms differ only in how they seed, step and finish.
enum LoopKind<'a> {
    Repeat {
        index: Option<&'a str>,
        body: &'a Block,
    },
    Range,
    Map {
        item: &'a str,
        body: &'a Block,
    },
    Filter {
        item: &'a str,
        body: &'a Block,
    },
    Reduce {
        accumulator: &'a str,
        item: &'a str,
        body: &'a Block,
    },
}

impl LoopKind<'_> {
    fn name(&self) -> &'static str {
        match self {
            LoopKind::Repeat { .. } => "loop",
            LoopKind::Range => "range",
            LoopKind::Map { .. } => "map",
            LoopKind::Filter { .. } => "filter",
            LoopKind::Reduce { .. } => "reduce",
        }
    }

    fn index_name(&self) -> &str {
        match self {
            LoopKind::Repeat {
                index: Some(index), ..
            } => *index,
            _ => "$i",
        }
    }

    fn item_name(&self) -> Option<&str> {
        match self {
            LoopKind::Map { item, .. }
            | LoopKind::Filter { item, .. }
            | LoopKind::Reduce { item, .. } => Some(*item),
            LoopKind::Repeat { .. } | LoopKind::Range => None,
        }
    }

    /// Whether the limit is the subject's length rather than the subject.
    fn iterates_array(&self) -> bool {
        self.item_name().is_some()
    }
}

/// Which source construct an instruction belongs to, for encoding errors.
fn construct_of(op: Op) -> &'static str {
    match op {
        Op::Constant | Op::Closure => "constant pool",
        Op::Array => "array literal",
        Op::Hash => "hash literal",
        Op::Jump | Op::JumpIfFalse => "jump target",
        Op::GetGlobal | Op::SetGlobal => "global bindings",
        Op::GetLocal | Op::SetLocal | Op::IncLocal | Op::AppendLocal => "local bindings",
        Op::GetFree => "captured variables",
        Op::Call => "call arguments",
        _ => op.definition().name,
    }
}

fn infix_op(operator: &str) -> Option<Op> {
    Some(match operator {
        "+" => Op::Add,
        "-" => Op::Sub,
        "*" => Op::Mul,
        "/" => Op::Div,
        "%" => Op::Mod,
        "<" => Op::Lt,
        ">" => Op::Gt,
        "<=" => Op::Leq,
        ">=" => Op::Geq,
        "==" => Op::Eq,
        "!=" => Op::Neq,
        "&&" => Op::And,
        "||" => Op::Or,
        _ => return None,
    })
}

pub struct Compiler {
    /// Shared by every function compiled from the program
    constants: Vec<Value>,

    /// Table of the innermost scope being compiled
    symbol_table: SymbolTable,

    /// One entry per function body being compiled; `scopes[0]` is main
    scopes: Vec<CompilationScope>,
}

impl Default for Compiler {
    fn default() -> Self {
        Self::new()
    }
}

impl Compiler {
    pub fn new() -> Self {
        let mut symbol_table = SymbolTable::new();
        for (i, builtin) in BUILTINS.iter().enumerate() {
            symbol_table.define_builtin(i, builtin.name);
        }
        for (i, name) in METHOD_NAMES.iter().enumerate() {
            symbol_table.define_object_method(i, name);
        }

        Self {
            constants: Vec::new(),
            symbol_table,
            scopes: vec![CompilationScope::default()],
        }
    }

    pub fn compile_program(mut self, program: &Program) -> Result<Bytecode, CompileError> {
        for statement in &program.statements {
            self.compile_statement(statement)?;
        }
        debug!(
            constants = self.constants.len(),
            "compiled program"
        );
        Ok(self.bytecode())
    }

    fn bytecode(self) -> Bytecode {
        Bytecode {
            instructions: self
                .scopes
                .into_iter()
                .next()
                .map(|scope| scope.instructions)
                .unwrap_or_default(),
            constants: self.constants,
        }
    }

    // =========================================================================
    // Statements
    // =========================================================================

    fn compile_statement(&mut self, statement: &Statement) -> Result<(), CompileError> {
        match statement {
            Statement::Expression(expression) => {
                self.compile_expression(expression)?;
                self.emit(Op::Pop, &[])?;
            }

            Statement::Var { name, value } => self.compile_binding(name, value, true)?,
            Statement::Const { name, value } => self.compile_binding(name, value, false)?,

            Statement::Function { name, function } => {
                self.warn_redeclared(name);
                let symbol = self.symbol_table.define(name, false);
                self.compile_function(function, Some(name.as_str()))?;
                self.store_symbol(&symbol)?;
            }

            Statement::Assign { name, value } => {
                let symbol = self.symbol_table.resolve(name)?;
                match symbol.scope {
                    SymbolScope::Free if self.in_iteration() => {
                        return Err(CompileError::assign_in_iteration(name));
                    }
                    SymbolScope::Free => return Err(CompileError::assign_to_captured(name)),
                    SymbolScope::Global | SymbolScope::Local if symbol.mutable => {}
                    _ => return Err(CompileError::assign_to_const(name)),
                }
                self.compile_expression(value)?;
                self.store_symbol(&symbol)?;
            }

            Statement::Return(value) => {
                if self.scopes.len() == 1 {
                    return Err(CompileError::return_outside_function());
                }
                if self.in_iteration() {
                    return Err(CompileError::return_in_iteration());
                }
                self.compile_expression(value)?;
                self.emit(Op::ReturnValue, &[])?;
            }
        }

        Ok(())
    }

    /// The name is defined before the value is compiled so a function value
    /// can refer to itself.
    fn compile_binding(
        &mut self,
        name: &str,
        value: &Expression,
        mutable: bool,
    ) -> Result<(), CompileError> {
        self.warn_redeclared(name);
        let symbol = self.symbol_table.define(name, mutable);

        match value {
            Expression::Function(function) => self.compile_function(function, Some(name))?,
            other => self.compile_expression(other)?,
        }

        self.store_symbol(&symbol)
    }

    fn warn_redeclared(&self, name: &str) {
        if self.symbol_table.defined_here(name) {
            warn!(binding = name, "redeclaring a binding in the same scope");
        }
    }

    /// Compile a block for its value: the trailing pop of a final expression
    /// statement is dropped, anything else leaves `null`.
    fn compile_block_value(&mut self, block: &Block) -> Result<(), CompileError> {
        for statement in &block.statements {
            self.compile_statement(statement)?;
        }

        if matches!(block.statements.last(), Some(Statement::Expression(_))) {
            self.remove_last_pop()
        } else {
            self.emit(Op::Null, &[]).map(|_| ())
        }
    }

    // =========================================================================
    // Expressions
    // =========================================================================

    fn compile_expression(&mut self, expression: &Expression) -> Result<(), CompileError> {
        match expression {
            Expression::Integer(n) => {
                let index = self.add_constant(Value::Integer(*n));
                self.emit(Op::Constant, &[index])?;
            }
            Expression::String(s) => {
                let index = self.add_constant(Value::String(s.clone()));
                self.emit(Op::Constant, &[index])?;
            }
            Expression::Boolean(true) => {
                self.emit(Op::True, &[])?;
            }
            Expression::Boolean(false) => {
                self.emit(Op::False, &[])?;
            }
            Expression::Null => {
                self.emit(Op::Null, &[])?;
            }

            Expression::Array(items) => {
                for item in items {
                    self.compile_expression(item)?;
                }
                self.emit(Op::Array, &[items.len()])?;
            }

            Expression::Hash(pairs) => {
                for (key, value) in pairs {
                    self.compile_expression(key)?;
                    self.compile_expression(value)?;
                }
                self.emit(Op::Hash, &[pairs.len() * 2])?;
            }

            Expression::Identifier(name) => {
                let symbol = self.symbol_table.resolve(name)?;
                self.load_symbol(&symbol)?;
            }

            Expression::Prefix { operator, right } => {
                let op = match operator.as_str() {
                    "!" => Op::Not,
                    "-" => Op::Neg,
                    other => return Err(CompileError::unsupported_operator(other, "prefix")),
                };
                self.compile_expression(right)?;
                self.emit(op, &[])?;
            }

            Expression::Infix {
                left,
                operator,
                right,
            } => {
                let op = infix_op(operator)
                    .ok_or_else(|| CompileError::unsupported_operator(operator, "infix"))?;
                self.compile_expression(left)?;
                self.compile_expression(right)?;
                self.emit(op, &[])?;
            }

            Expression::Conditional { condition, yes, no } => {
                self.compile_conditional(condition, Branch::Expression(yes), Branch::Expression(no))?;
            }

            Expression::If {
                condition,
                consequence,
                alternative,
            } => {
                let no = match alternative {
                    Some(block) => Branch::Block(block),
                    None => Branch::Empty,
                };
                self.compile_conditional(condition, Branch::Block(consequence), no)?;
            }

            Expression::Function(function) => self.compile_function(function, None)?,

            Expression::Call {
                function,
                arguments,
            } => {
                self.compile_expression(function)?;
                for argument in arguments {
                    self.compile_expression(argument)?;
                }
                self.emit(Op::Call, &[arguments.len()])?;
            }

            Expression::CallMember {
                receiver,
                member,
                arguments,
            } => {
                self.compile_expression(receiver)?;
                self.emit_member(member)?;
                for argument in arguments {
                    self.compile_expression(argument)?;
                }
                self.emit(Op::Call, &[arguments.len()])?;
            }

            Expression::ObjectMember { receiver, member } => {
                self.compile_expression(receiver)?;
                self.emit_member(member)?;
            }

            Expression::Index { left, index } => {
                self.compile_expression(left)?;
                self.compile_expression(index)?;
                self.emit(Op::Index, &[])?;
            }

            Expression::Loop { bound, index, body } => {
                let kind = LoopKind::Repeat {
                    index: index.as_deref(),
                    body,
                };
                self.compile_indexed_loop(kind, bound, None)?;
            }
            Expression::Range { bound } => {
                self.compile_indexed_loop(LoopKind::Range, bound, None)?;
            }
            Expression::Map {
                subject,
                item,
                body,
            } => {
                self.compile_indexed_loop(LoopKind::Map { item, body }, subject, None)?;
            }
            Expression::Filter {
                subject,
                item,
                body,
            } => {
                self.compile_indexed_loop(LoopKind::Filter { item, body }, subject, None)?;
            }
            Expression::Reduce {
                subject,
                accumulator,
                item,
                initial,
                body,
            } => {
                let kind = LoopKind::Reduce {
                    accumulator,
                    item,
                    body,
                };
                self.compile_indexed_loop(kind, subject, Some(initial.as_ref()))?;
            }
        }

        Ok(())
    }

    /// ```text
    ///   <condition>
    ///   JumpIfFalse  no
    ///   <yes>
    ///   Jump         end
    /// no:
    ///   <no>
    /// end:
    /// ```
    fn compile_conditional(
        &mut self,
        condition: &Expression,
        yes: Branch<'_>,
        no: Branch<'_>,
    ) -> Result<(), CompileError> {
        self.compile_expression(condition)?;
        let jump_if_false = self.emit(Op::JumpIfFalse, &[PLACEHOLDER])?;

        self.compile_branch(yes)?;
        let jump_to_end = self.emit(Op::Jump, &[PLACEHOLDER])?;

        let no_start = self.current_len();
        self.change_operand(jump_if_false, no_start)?;

        self.compile_branch(no)?;

        let end = self.current_len();
        self.change_operand(jump_to_end, end)
    }

    fn compile_branch(&mut self, branch: Branch<'_>) -> Result<(), CompileError> {
        match branch {
            Branch::Expression(expression) => self.compile_expression(expression),
            Branch::Block(block) => self.compile_block_value(block),
            Branch::Empty => self.emit(Op::Null, &[]).map(|_| ()),
        }
    }

    /// Compile a function body into a constant and emit the closure that
    /// captures its free variables in the enclosing scope.
    fn compile_function(
        &mut self,
        function: &FunctionLiteral,
        binding: Option<&str>,
    ) -> Result<(), CompileError> {
        let name = function.name.as_deref().or(binding).map(str::to_string);

        self.enter_scope(false);

        if let Some(name) = &name {
            self.symbol_table.define_function_name(name);
        }
        for parameter in &function.parameters {
            self.symbol_table.define(parameter, true);
        }

        for statement in &function.body.statements {
            self.compile_statement(statement)?;
        }
        self.replace_last_pop_with_return()?;
        if !self.last_instruction_is(Op::ReturnValue) {
            self.emit(Op::Return, &[])?;
        }

        let left = self.leave_scope()?;
        self.finish_closure(left, function.parameters.len(), name)
    }

    fn finish_closure(
        &mut self,
        left: LeftScope,
        num_parameters: usize,
        name: Option<String>,
    ) -> Result<(), CompileError> {
        for symbol in &left.free_symbols {
            self.load_symbol(symbol)?;
        }

        debug!(
            function = name.as_deref().unwrap_or("<anonymous>"),
            locals = left.num_locals,
            free = left.free_symbols.len(),
            "compiled function"
        );

        let func = CompiledFunction {
            instructions: left.instructions,
            num_locals: left.num_locals,
            num_parameters,
            name,
        };
        let index = self.add_constant(Value::CompiledFunction(Rc::new(func)));
        self.emit(Op::Closure, &[index, left.free_symbols.len()])?;
        Ok(())
    }

    // =========================================================================
    // Iteration
    // =========================================================================

    /// Lower an iteration form to a synthetic closure and call it.
    ///
    /// The closure takes `(index, subject[, accumulator])` and runs
    ///
    /// ```text
    ///   $limit = subject            ; or len(subject) for arrays
    ///   $acc   = []                 ; range, map, filter
    /// cond:
    ///   JumpIfFalse(index < $limit) exit
    ///   item = subject[index]       ; map, filter, reduce
    ///   <step>                      ; AppendLocal $acc for collecting forms
    ///   IncLocal index
    ///   Jump cond
    /// exit:
    ///   ReturnValue $acc            ; or null for loop
    /// ```
    ///
    /// and the call site pushes the closure, `0`, the subject and, for
    /// reduce, the initial accumulator.
    fn compile_indexed_loop(
        &mut self,
        kind: LoopKind<'_>,
        subject: &Expression,
        initial: Option<&Expression>,
    ) -> Result<(), CompileError> {
        self.enter_scope(true);

        let index = self.symbol_table.define(kind.index_name(), false);
        let subject_slot = self.symbol_table.define("$subject", false);
        let mut accumulator = match &kind {
            LoopKind::Reduce { accumulator, .. } => Some(self.symbol_table.define(accumulator, true)),
            _ => None,
        };
        let num_parameters = self.symbol_table.num_definitions();

        let limit = self.symbol_table.define("$limit", false);
        if kind.iterates_array() {
            let len = builtin_index("len")
                .ok_or_else(|| CompileError::internal("builtin 'len' is missing"))?;
            self.emit(Op::GetBuiltin, &[len])?;
            self.load_symbol(&subject_slot)?;
            self.emit(Op::Call, &[1])?;
        } else {
            self.load_symbol(&subject_slot)?;
        }
        self.store_symbol(&limit)?;

        if matches!(
            kind,
            LoopKind::Range | LoopKind::Map { .. } | LoopKind::Filter { .. }
        ) {
            let acc = self.symbol_table.define("$acc", true);
            self.emit(Op::Array, &[0])?;
            self.store_symbol(&acc)?;
            accumulator = Some(acc);
        }

        let item = kind
            .item_name()
            .map(|name| self.symbol_table.define(name, false));

        let condition = self.current_len();
        self.load_symbol(&index)?;
        self.load_symbol(&limit)?;
        self.emit(Op::Lt, &[])?;
        let exit = self.emit(Op::JumpIfFalse, &[PLACEHOLDER])?;

        if let Some(item) = &item {
            self.load_symbol(&subject_slot)?;
            self.load_symbol(&index)?;
            self.emit(Op::Index, &[])?;
            self.store_symbol(item)?;
        }

        match &kind {
            LoopKind::Repeat { body, .. } => {
                self.compile_block_value(body)?;
                self.emit(Op::Pop, &[])?;
            }
            LoopKind::Range => {
                let acc = required(&accumulator)?;
                self.load_symbol(&index)?;
                self.append_local(acc)?;
            }
            LoopKind::Map { body, .. } => {
                let acc = required(&accumulator)?;
                self.compile_block_value(body)?;
                self.append_local(acc)?;
            }
            LoopKind::Filter { body, .. } => {
                let acc = required(&accumulator)?;
                let item = required(&item)?;
                self.compile_block_value(body)?;
                let skip = self.emit(Op::JumpIfFalse, &[PLACEHOLDER])?;
                self.load_symbol(item)?;
                self.append_local(acc)?;
                let after = self.current_len();
                self.change_operand(skip, after)?;
            }
            LoopKind::Reduce { body, .. } => {
                let acc = required(&accumulator)?;
                self.compile_block_value(body)?;
                self.store_symbol(acc)?;
            }
        }

        self.emit(Op::IncLocal, &[index.index])?;
        self.emit(Op::Jump, &[condition])?;

        let after_loop = self.current_len();
        self.change_operand(exit, after_loop)?;

        match &accumulator {
            Some(acc) => self.load_symbol(acc)?,
            None => {
                self.emit(Op::Null, &[])?;
            }
        }
        self.emit(Op::ReturnValue, &[])?;

        let left = self.leave_scope()?;
        self.finish_closure(left, num_parameters, Some(format!("<{}>", kind.name())))?;

        let zero = self.add_constant(Value::Integer(0));
        self.emit(Op::Constant, &[zero])?;
        self.compile_expression(subject)?;
        if let Some(initial) = initial {
            self.compile_expression(initial)?;
        }
        self.emit(Op::Call, &[num_parameters])?;
        Ok(())
    }

    // =========================================================================
    // Symbols
    // =========================================================================

    fn load_symbol(&mut self, symbol: &Symbol) -> Result<(), CompileError> {
        match symbol.scope {
            SymbolScope::Global => self.emit(Op::GetGlobal, &[symbol.index]),
            SymbolScope::Local => self.emit(Op::GetLocal, &[symbol.index]),
            SymbolScope::Builtin => self.emit(Op::GetBuiltin, &[symbol.index]),
            SymbolScope::Free => self.emit(Op::GetFree, &[symbol.index]),
            SymbolScope::Function => self.emit(Op::CurrentClosure, &[]),
            SymbolScope::ObjectMethod => {
                return Err(CompileError::internal(format!(
                    "member '{}' loaded without a receiver",
                    symbol.name
                )));
            }
        }?;
        Ok(())
    }

    /// The accumulator of a collecting form is always a local of the
    /// synthetic closure, so it can be extended in place.
    fn append_local(&mut self, symbol: &Symbol) -> Result<(), CompileError> {
        if symbol.scope != SymbolScope::Local {
            return Err(CompileError::internal(format!(
                "cannot append to {:?} symbol '{}'",
                symbol.scope, symbol.name
            )));
        }
        self.emit(Op::AppendLocal, &[symbol.index])?;
        Ok(())
    }

    fn store_symbol(&mut self, symbol: &Symbol) -> Result<(), CompileError> {
        match symbol.scope {
            SymbolScope::Global => self.emit(Op::SetGlobal, &[symbol.index]),
            SymbolScope::Local => self.emit(Op::SetLocal, &[symbol.index]),
            _ => {
                return Err(CompileError::internal(format!(
                    "cannot store into {:?} symbol '{}'",
                    symbol.scope, symbol.name
                )));
            }
        }?;
        Ok(())
    }

    fn emit_member(&mut self, member: &str) -> Result<(), CompileError> {
        let symbol = self
            .symbol_table
            .resolve_method(member)
            .ok_or_else(|| CompileError::undefined_member(member))?;
        self.emit(Op::GetMethod, &[symbol.index])?;
        Ok(())
    }

    fn add_constant(&mut self, value: Value) -> usize {
        self.constants.push(value);
        self.constants.len() - 1
    }

    // =========================================================================
    // Scopes and emission
    // =========================================================================

    fn in_iteration(&self) -> bool {
        self.scopes.last().is_some_and(|scope| scope.iteration)
    }

    fn enter_scope(&mut self, iteration: bool) {
        self.scopes.push(CompilationScope {
            iteration,
            ..CompilationScope::default()
        });
        let outer = std::mem::take(&mut self.symbol_table);
        self.symbol_table = SymbolTable::new_enclosed(outer);
        debug!(depth = self.scopes.len(), iteration, "enter scope");
    }

    fn leave_scope(&mut self) -> Result<LeftScope, CompileError> {
        let scope = self
            .scopes
            .pop()
            .ok_or_else(|| CompileError::internal("no scope to leave"))?;
        let table = std::mem::take(&mut self.symbol_table);
        let free_symbols = table.free_symbols().to_vec();
        let num_locals = table.num_definitions();
        self.symbol_table = table
            .into_outer()
            .ok_or_else(|| CompileError::internal("left the global scope"))?;
        debug!(depth = self.scopes.len(), "leave scope");

        Ok(LeftScope {
            instructions: scope.instructions,
            free_symbols,
            num_locals,
        })
    }

    fn scope_mut(&mut self) -> Result<&mut CompilationScope, CompileError> {
        self.scopes
            .last_mut()
            .ok_or_else(|| CompileError::internal("no compilation scope"))
    }

    fn current_len(&self) -> usize {
        self.scopes.last().map_or(0, |scope| scope.instructions.len())
    }

    fn emit(&mut self, op: Op, operands: &[usize]) -> Result<usize, CompileError> {
        let instruction =
            make(op, operands).map_err(|e| CompileError::encoding(construct_of(op), e))?;

        let scope = self.scope_mut()?;
        let position = scope.instructions.push(&instruction);
        scope.previous_instruction = scope.last_instruction;
        scope.last_instruction = Some(EmittedInstruction { op, position });

        Ok(position)
    }

    fn last_instruction_is(&self, op: Op) -> bool {
        self.scopes
            .last()
            .and_then(|scope| scope.last_instruction)
            .is_some_and(|last| last.op == op)
    }

    fn remove_last_pop(&mut self) -> Result<(), CompileError> {
        let scope = self.scope_mut()?;
        if let Some(last) = scope.last_instruction.filter(|last| last.op == Op::Pop) {
            scope.instructions.truncate(last.position);
            scope.last_instruction = scope.previous_instruction;
        }
        Ok(())
    }

    fn replace_last_pop_with_return(&mut self) -> Result<(), CompileError> {
        let instruction = make(Op::ReturnValue, &[])
            .map_err(|e| CompileError::encoding(construct_of(Op::ReturnValue), e))?;
        let scope = self.scope_mut()?;
        if let Some(last) = scope.last_instruction.filter(|last| last.op == Op::Pop) {
            scope.instructions.patch(last.position, &instruction);
            scope.last_instruction = Some(EmittedInstruction {
                op: Op::ReturnValue,
                position: last.position,
            });
        }
        Ok(())
    }

    /// Back-patch the single operand of the instruction at `position`.
    fn change_operand(&mut self, position: usize, operand: usize) -> Result<(), CompileError> {
        let scope = self.scope_mut()?;
        let byte = scope
            .instructions
            .as_bytes()
            .get(position)
            .copied()
            .ok_or_else(|| CompileError::internal(format!("no instruction at {}", position)))?;
        let op = Op::try_from(byte).map_err(|e| CompileError::encoding("jump target", e))?;
        let instruction =
            make(op, &[operand]).map_err(|e| CompileError::encoding(construct_of(op), e))?;
        scope.instructions.patch(position, &instruction);
        Ok(())
    }
}

fn required(symbol: &Option<Symbol>) -> Result<&Symbol, CompileError> {
    symbol
        .as_ref()
        .ok_or_else(|| CompileError::internal("iteration slot missing"))
}
