use crate::bytecode::Bytecode;
use crate::bytecode::op::{Op, read_u8, read_u16};
use crate::lang::builtins::BUILTINS;
use crate::lang::members::{CallContext, METHOD_NAMES};
use crate::lang::value::{BinaryOp, Closure, CompiledFunction, HashPair, Value};
use crate::runtime::runtime_error::{RuntimeError, RuntimeErrorKind};
use std::collections::BTreeMap;
use std::rc::Rc;
use tracing::{debug, trace};

#[derive(Debug, Clone)]
pub struct VmConfig {
    /// Operand stack slots, locals included.
    pub stack_size: usize,
    /// Nested calls before the frame stack overflows.
    pub max_frames: usize,
    pub globals_size: usize,
    pub max_steps: Option<usize>,
}

impl Default for VmConfig {
    fn default() -> Self {
        VmConfig {
            stack_size: 2048,
            max_frames: 1024,
            globals_size: 65536,
            max_steps: None,
        }
    }
}

/// Activation record of one closure call.
#[derive(Debug)]
struct Frame {
    closure: Rc<Closure>,
    ip: usize,
    /// Stack index of the first local; the callee sits just below it.
    base_pointer: usize,
}

impl Frame {
    fn name(&self) -> &str {
        self.closure.name()
    }
}

pub struct Vm {
    constants: Vec<Value>,
    main: Rc<Closure>,
    stack: Vec<Value>,
    globals: Vec<Value>,
    frames: Vec<Frame>,
    last_popped: Value,
    // Safety limits
    config: VmConfig,
    steps: usize,
}

impl Vm {
    pub fn new(bytecode: Bytecode) -> Self {
        Self::with_config(bytecode, VmConfig::default())
    }

    pub fn with_config(bytecode: Bytecode, config: VmConfig) -> Self {
        let main = Rc::new(Closure {
            func: Rc::new(CompiledFunction {
                instructions: bytecode.instructions,
                num_locals: 0,
                num_parameters: 0,
                name: Some("<main>".to_string()),
            }),
            free: Vec::new(),
        });

        Self {
            constants: bytecode.constants,
            main,
            stack: Vec::with_capacity(config.stack_size.min(1024)),
            globals: Vec::new(),
            frames: Vec::new(),
            last_popped: Value::Null,
            config,
            steps: 0,
        }
    }

    /// Value most recently removed by `OpPop`; after `run` this is the value
    /// of the program's last expression statement.
    pub fn last_popped(&self) -> &Value {
        &self.last_popped
    }

    pub fn stack_pointer(&self) -> usize {
        self.stack.len()
    }

    pub fn globals(&self) -> &[Value] {
        &self.globals
    }

    /// Execute the main program from the start. Globals survive between runs.
    pub fn run(&mut self) -> Result<Value, RuntimeError> {
        self.reset_execution_state();
        self.frames.push(Frame {
            closure: Rc::clone(&self.main),
            ip: 0,
            base_pointer: 0,
        });

        debug!(
            instructions = self.main.func.instructions.len(),
            constants = self.constants.len(),
            "run"
        );

        match self.execute(0) {
            Ok(_) => Ok(self.last_popped.clone()),
            Err(err) => Err(self
                .frames
                .iter()
                .fold(err, |err, frame| err.with_context(frame.name()))),
        }
    }

    fn reset_execution_state(&mut self) {
        self.stack.clear();
        self.frames.clear();
        self.last_popped = Value::Null;
        self.steps = 0;
    }

    // =========================================================================
    // Execution
    // =========================================================================

    fn check_limits(&mut self) -> Result<(), RuntimeError> {
        self.steps += 1;

        if let Some(max) = self.config.max_steps {
            if self.steps > max {
                return Err(RuntimeErrorKind::StepLimit { max }.into());
            }
        }
        Ok(())
    }

    /// Run until the frame stack shrinks back to `floor` frames and return
    /// the value handed back by the frame that brought it there.
    fn execute(&mut self, floor: usize) -> Result<Value, RuntimeError> {
        loop {
            let Some(byte) = self.next_byte()? else {
                if self.frames.len() == 1 {
                    // main ran off its end
                    self.frames.pop();
                    return Ok(Value::Null);
                }
                match self.return_from_frame(Value::Null, floor)? {
                    Some(value) => return Ok(value),
                    None => continue,
                }
            };

            self.check_limits()?;
            let op = Op::try_from(byte)?;
            trace!(op = op.definition().name, depth = self.frames.len(), "exec");

            match op {
                Op::Constant => {
                    let index = self.fetch_u16()?;
                    let value = self.constant(index)?.clone();
                    self.push(value)?;
                }
                Op::True => self.push(Value::Boolean(true))?,
                Op::False => self.push(Value::Boolean(false))?,
                Op::Null => self.push(Value::Null)?,

                Op::Array => {
                    let count = self.fetch_u16()?;
                    let items = self.pop_n(count)?;
                    self.push(Value::array(items))?;
                }
                Op::Hash => {
                    let count = self.fetch_u16()?;
                    let items = self.pop_n(count)?;
                    let hash = build_hash(items)?;
                    self.push(hash)?;
                }

                Op::JumpIfFalse => {
                    let target = self.fetch_u16()?;
                    if !self.pop()?.truthy() {
                        self.jump(target)?;
                    }
                }
                Op::Jump => {
                    let target = self.fetch_u16()?;
                    self.jump(target)?;
                }

                Op::GetGlobal => {
                    let index = self.fetch_u16()?;
                    let value = self.globals.get(index).cloned().unwrap_or(Value::Null);
                    self.push(value)?;
                }
                Op::SetGlobal => {
                    let index = self.fetch_u16()?;
                    let value = self.pop()?;
                    self.set_global(index, value)?;
                }

                Op::GetLocal => {
                    let slot = self.local_slot()?;
                    let value = self.stack[slot].clone();
                    self.push(value)?;
                }
                Op::SetLocal => {
                    let slot = self.local_slot()?;
                    let value = self.pop()?;
                    self.stack[slot] = value;
                }
                Op::IncLocal => {
                    let slot = self.local_slot()?;
                    let next = match &self.stack[slot] {
                        Value::Integer(n) => Value::Integer(n.wrapping_add(1)),
                        other => return Err(RuntimeError::unsupported("++", other.type_name())),
                    };
                    self.stack[slot] = next;
                }
                Op::AppendLocal => {
                    let slot = self.local_slot()?;
                    let value = self.pop()?;
                    match self.stack.get_mut(slot) {
                        // the slot holds the only reference, so this never copies
                        Some(Value::Array(items)) => Rc::make_mut(items).push(value),
                        Some(other) => {
                            return Err(RuntimeError::unsupported("push", other.type_name()));
                        }
                        None => return Err(RuntimeError::stack_underflow()),
                    }
                }

                Op::GetBuiltin => {
                    let index = self.fetch_u8()?;
                    let builtin = BUILTINS.get(index).copied().ok_or_else(|| {
                        RuntimeError::bytecode(format!("no builtin at index {}", index))
                    })?;
                    self.push(Value::Builtin(builtin))?;
                }
                Op::GetMethod => {
                    let index = self.fetch_u8()?;
                    let name = METHOD_NAMES.get(index).copied().ok_or_else(|| {
                        RuntimeError::bytecode(format!("no member at index {}", index))
                    })?;
                    let receiver = self.pop()?;
                    self.push(receiver.bind_member(name)?)?;
                }
                Op::GetFree => {
                    let index = self.fetch_u8()?;
                    let value = self
                        .current_frame()?
                        .closure
                        .free
                        .get(index)
                        .cloned()
                        .ok_or_else(|| {
                            RuntimeError::bytecode(format!("no free variable at index {}", index))
                        })?;
                    self.push(value)?;
                }
                Op::CurrentClosure => {
                    let closure = Rc::clone(&self.current_frame()?.closure);
                    self.push(Value::Closure(closure))?;
                }
                Op::Closure => {
                    let index = self.fetch_u16()?;
                    let num_free = self.fetch_u8()?;
                    let func = match self.constant(index)? {
                        Value::CompiledFunction(func) => Rc::clone(func),
                        other => {
                            return Err(RuntimeError::bytecode(format!(
                                "constant {} is {}, not a function",
                                index,
                                other.type_name()
                            )));
                        }
                    };
                    let free = self.pop_n(num_free)?;
                    self.push(Value::Closure(Rc::new(Closure { func, free })))?;
                }

                Op::Call => {
                    let argc = self.fetch_u8()?;
                    self.call_value_at(argc)?;
                }
                Op::ReturnValue => {
                    let value = self.pop()?;
                    if let Some(value) = self.return_from_frame(value, floor)? {
                        return Ok(value);
                    }
                }
                Op::Return => {
                    if let Some(value) = self.return_from_frame(Value::Null, floor)? {
                        return Ok(value);
                    }
                }

                Op::Pop => {
                    self.last_popped = self.pop()?;
                }

                Op::Index => {
                    let index = self.pop()?;
                    let left = self.pop()?;
                    self.push(left.index(&index)?)?;
                }

                Op::Not => {
                    let value = self.pop()?;
                    self.push(Value::Boolean(!value.truthy()))?;
                }
                Op::Neg => {
                    let value = self.pop()?;
                    self.push(value.negate()?)?;
                }

                Op::Add
                | Op::Sub
                | Op::Mul
                | Op::Div
                | Op::Mod
                | Op::Lt
                | Op::Gt
                | Op::Eq
                | Op::Neq
                | Op::Leq
                | Op::Geq
                | Op::And
                | Op::Or => {
                    let right = self.pop()?;
                    let left = self.pop()?;
                    self.push(left.calc(binary_op(op)?, &right)?)?;
                }
            }
        }
    }

    // =========================================================================
    // Calls
    // =========================================================================

    /// Call the value sitting below the top `argc` stack slots. Closures get
    /// a new frame; native callees run to completion and leave their result.
    fn call_value_at(&mut self, argc: usize) -> Result<(), RuntimeError> {
        let callee_slot = self
            .stack
            .len()
            .checked_sub(argc + 1)
            .ok_or_else(RuntimeError::stack_underflow)?;

        match self.stack[callee_slot].clone() {
            Value::Closure(closure) => self.push_frame(closure, argc),
            Value::CompiledFunction(func) => self.push_frame(
                Rc::new(Closure {
                    func,
                    free: Vec::new(),
                }),
                argc,
            ),
            Value::Builtin(builtin) => {
                let args = self.stack.split_off(callee_slot + 1);
                self.stack.truncate(callee_slot);
                let result = (builtin.func)(self, args)?;
                self.push(result)
            }
            Value::BoundMethod(method) => {
                let args = self.stack.split_off(callee_slot + 1);
                self.stack.truncate(callee_slot);
                let result = (method.thunk)(self, &method.receiver, args)?;
                self.push(result)
            }
            other => Err(RuntimeError::not_callable(other.type_name())),
        }
    }

    fn push_frame(&mut self, closure: Rc<Closure>, argc: usize) -> Result<(), RuntimeError> {
        if argc != closure.func.num_parameters {
            return Err(RuntimeError::wrong_argument_count(
                closure.name(),
                closure.func.num_parameters,
                argc,
            ));
        }
        if self.frames.len() >= self.config.max_frames {
            return Err(RuntimeError::stack_overflow("frame", self.config.max_frames));
        }

        let base_pointer = self.stack.len() - argc;
        let top = base_pointer + closure.func.num_locals.max(argc);
        if top > self.config.stack_size {
            return Err(RuntimeError::stack_overflow("operand", self.config.stack_size));
        }
        self.stack.resize(top, Value::Null);

        trace!(callee = closure.name(), base_pointer, "call");
        self.frames.push(Frame {
            closure,
            ip: 0,
            base_pointer,
        });
        Ok(())
    }

    /// Pop the current frame along with its locals and callee slot. Returns
    /// the value when the frame stack is back at `floor`, otherwise pushes it
    /// for the caller.
    fn return_from_frame(
        &mut self,
        value: Value,
        floor: usize,
    ) -> Result<Option<Value>, RuntimeError> {
        let frame = self
            .frames
            .pop()
            .ok_or_else(|| RuntimeError::bytecode("return without a frame"))?;
        self.stack.truncate(frame.base_pointer.saturating_sub(1));
        trace!(callee = frame.name(), "return");

        if self.frames.len() == floor {
            return Ok(Some(value));
        }
        self.push(value)?;
        Ok(None)
    }

    // =========================================================================
    // Frame and stack helpers
    // =========================================================================

    fn current_frame(&self) -> Result<&Frame, RuntimeError> {
        self.frames
            .last()
            .ok_or_else(|| RuntimeError::bytecode("no active frame"))
    }

    fn current_frame_mut(&mut self) -> Result<&mut Frame, RuntimeError> {
        self.frames
            .last_mut()
            .ok_or_else(|| RuntimeError::bytecode("no active frame"))
    }

    /// Opcode byte at the instruction pointer, or `None` at the end of the
    /// frame's code.
    fn next_byte(&mut self) -> Result<Option<u8>, RuntimeError> {
        let frame = self.current_frame_mut()?;
        let byte = frame
            .closure
            .func
            .instructions
            .as_bytes()
            .get(frame.ip)
            .copied();
        if byte.is_some() {
            frame.ip += 1;
        }
        Ok(byte)
    }

    fn fetch_u8(&mut self) -> Result<usize, RuntimeError> {
        let frame = self.current_frame_mut()?;
        let operand = read_u8(frame.closure.func.instructions.as_bytes(), frame.ip)?;
        frame.ip += 1;
        Ok(operand)
    }

    fn fetch_u16(&mut self) -> Result<usize, RuntimeError> {
        let frame = self.current_frame_mut()?;
        let operand = read_u16(frame.closure.func.instructions.as_bytes(), frame.ip)?;
        frame.ip += 2;
        Ok(operand)
    }

    fn jump(&mut self, target: usize) -> Result<(), RuntimeError> {
        let frame = self.current_frame_mut()?;
        if target > frame.closure.func.instructions.len() {
            return Err(RuntimeError::bytecode(format!(
                "jump to {} outside of {}",
                target,
                frame.name()
            )));
        }
        frame.ip = target;
        Ok(())
    }

    /// Stack index of the local named by the next operand.
    fn local_slot(&mut self) -> Result<usize, RuntimeError> {
        let index = self.fetch_u8()?;
        let slot = self.current_frame()?.base_pointer + index;
        if slot >= self.stack.len() {
            return Err(RuntimeError::bytecode(format!(
                "local {} outside of the frame",
                index
            )));
        }
        Ok(slot)
    }

    fn constant(&self, index: usize) -> Result<&Value, RuntimeError> {
        self.constants
            .get(index)
            .ok_or_else(|| RuntimeError::bytecode(format!("no constant at index {}", index)))
    }

    fn set_global(&mut self, index: usize, value: Value) -> Result<(), RuntimeError> {
        if index >= self.config.globals_size {
            return Err(RuntimeError::stack_overflow("globals", self.config.globals_size));
        }
        if index >= self.globals.len() {
            self.globals.resize(index + 1, Value::Null);
        }
        self.globals[index] = value;
        Ok(())
    }

    fn push(&mut self, value: Value) -> Result<(), RuntimeError> {
        if self.stack.len() >= self.config.stack_size {
            return Err(RuntimeError::stack_overflow("operand", self.config.stack_size));
        }
        self.stack.push(value);
        Ok(())
    }

    fn pop(&mut self) -> Result<Value, RuntimeError> {
        self.stack.pop().ok_or_else(RuntimeError::stack_underflow)
    }

    /// Remove the top `count` values, oldest first.
    fn pop_n(&mut self, count: usize) -> Result<Vec<Value>, RuntimeError> {
        let start = self
            .stack
            .len()
            .checked_sub(count)
            .ok_or_else(RuntimeError::stack_underflow)?;
        Ok(self.stack.split_off(start))
    }
}

impl CallContext for Vm {
    fn call_value(&mut self, callee: &Value, args: Vec<Value>) -> Result<Value, RuntimeError> {
        let floor = self.frames.len();
        let argc = args.len();

        self.push(callee.clone())?;
        for arg in args {
            self.push(arg)?;
        }
        self.call_value_at(argc)?;

        if self.frames.len() > floor {
            self.execute(floor)
        } else {
            self.pop()
        }
    }
}

fn binary_op(op: Op) -> Result<BinaryOp, RuntimeError> {
    Ok(match op {
        Op::Add => BinaryOp::Add,
        Op::Sub => BinaryOp::Sub,
        Op::Mul => BinaryOp::Mul,
        Op::Div => BinaryOp::Div,
        Op::Mod => BinaryOp::Mod,
        Op::Lt => BinaryOp::Lt,
        Op::Gt => BinaryOp::Gt,
        Op::Leq => BinaryOp::Leq,
        Op::Geq => BinaryOp::Geq,
        Op::Eq => BinaryOp::Eq,
        Op::Neq => BinaryOp::Neq,
        Op::And => BinaryOp::And,
        Op::Or => BinaryOp::Or,
        other => {
            return Err(RuntimeError::bytecode(format!(
                "{} is not a binary operator",
                other.definition().name
            )));
        }
    })
}

/// Build a hash from alternating keys and values. Later keys win.
fn build_hash(items: Vec<Value>) -> Result<Value, RuntimeError> {
    let mut pairs = BTreeMap::new();
    let mut items = items.into_iter();
    while let Some(key) = items.next() {
        let value = items
            .next()
            .ok_or_else(|| RuntimeError::bytecode("hash literal with a key but no value"))?;
        pairs.insert(key.hash_key()?, HashPair { key, value });
    }
    Ok(Value::Hash(Rc::new(pairs)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bytecode::Instructions;
    use crate::bytecode::op::make;

    // ============================================================
    // Test Helpers
    // ============================================================

    fn program(parts: &[(Op, &[usize])], constants: Vec<Value>) -> Bytecode {
        Bytecode {
            instructions: parts
                .iter()
                .map(|(op, operands)| make(*op, operands).unwrap())
                .collect::<Instructions>(),
            constants,
        }
    }

    fn run_program(bytecode: Bytecode) -> Result<Value, RuntimeError> {
        Vm::new(bytecode).run()
    }

    // ============================================================
    // Instructions
    // ============================================================

    #[test]
    fn test_constants_and_add() {
        let bc = program(
            &[
                (Op::Constant, &[0]),
                (Op::Constant, &[1]),
                (Op::Add, &[]),
                (Op::Pop, &[]),
            ],
            vec![Value::Integer(1), Value::Integer(2)],
        );

        let mut vm = Vm::new(bc);
        assert_eq!(vm.run().unwrap(), Value::Integer(3));
        assert_eq!(vm.stack_pointer(), 0);
    }

    #[test]
    fn test_conditional_jump() {
        // false ? 10 : 20
        let bc = program(
            &[
                (Op::False, &[]),
                (Op::JumpIfFalse, &[10]),
                (Op::Constant, &[0]),
                (Op::Jump, &[13]),
                (Op::Constant, &[1]),
                (Op::Pop, &[]),
            ],
            vec![Value::Integer(10), Value::Integer(20)],
        );

        assert_eq!(run_program(bc).unwrap(), Value::Integer(20));
    }

    #[test]
    fn test_globals() {
        let bc = program(
            &[
                (Op::Constant, &[0]),
                (Op::SetGlobal, &[0]),
                (Op::GetGlobal, &[0]),
                (Op::GetGlobal, &[0]),
                (Op::Mul, &[]),
                (Op::Pop, &[]),
            ],
            vec![Value::Integer(7)],
        );

        let mut vm = Vm::new(bc);
        assert_eq!(vm.run().unwrap(), Value::Integer(49));
        assert_eq!(vm.globals(), &[Value::Integer(7)]);
    }

    #[test]
    fn test_hash_literal_later_keys_win() {
        let bc = program(
            &[
                (Op::Constant, &[0]),
                (Op::Constant, &[1]),
                (Op::Constant, &[0]),
                (Op::Constant, &[2]),
                (Op::Hash, &[4]),
                (Op::Constant, &[0]),
                (Op::Index, &[]),
                (Op::Pop, &[]),
            ],
            vec![Value::string("k"), Value::Integer(1), Value::Integer(2)],
        );

        assert_eq!(run_program(bc).unwrap(), Value::Integer(2));
    }

    #[test]
    fn test_unhashable_key() {
        let bc = program(
            &[
                (Op::Array, &[0]),
                (Op::Null, &[]),
                (Op::Hash, &[2]),
                (Op::Pop, &[]),
            ],
            vec![],
        );

        let err = run_program(bc).unwrap_err();
        assert_eq!(err.kind, RuntimeErrorKind::NotHashable { type_name: "array" });
    }

    #[test]
    fn test_calling_integer_fails() {
        let bc = program(
            &[(Op::Constant, &[0]), (Op::Call, &[0]), (Op::Pop, &[])],
            vec![Value::Integer(5)],
        );

        let err = run_program(bc).unwrap_err();
        assert_eq!(err.kind, RuntimeErrorKind::NotCallable { type_name: "integer" });
        assert_eq!(err.call_stack, vec!["<main>".to_string()]);
    }

    #[test]
    fn test_unknown_opcode() {
        let bc = Bytecode {
            instructions: Instructions::from(vec![0xEE]),
            constants: vec![],
        };

        let err = run_program(bc).unwrap_err();
        assert!(matches!(err.kind, RuntimeErrorKind::Bytecode(_)));
    }

    #[test]
    fn test_truncated_operand() {
        let bc = Bytecode {
            instructions: Instructions::from(vec![Op::Constant as u8, 0]),
            constants: vec![Value::Null],
        };

        let err = run_program(bc).unwrap_err();
        assert!(matches!(err.kind, RuntimeErrorKind::Bytecode(_)));
    }

    #[test]
    fn test_step_limit() {
        let bc = program(&[(Op::Jump, &[0])], vec![]);
        let config = VmConfig {
            max_steps: Some(100),
            ..VmConfig::default()
        };

        let err = Vm::with_config(bc, config).run().unwrap_err();
        assert_eq!(err.kind, RuntimeErrorKind::StepLimit { max: 100 });
    }

    #[test]
    fn test_operand_stack_limit() {
        let bc = program(
            &[(Op::Null, &[]), (Op::Null, &[]), (Op::Null, &[])],
            vec![],
        );
        let config = VmConfig {
            stack_size: 2,
            ..VmConfig::default()
        };

        let err = Vm::with_config(bc, config).run().unwrap_err();
        assert_eq!(
            err.kind,
            RuntimeErrorKind::StackOverflow {
                stack: "operand",
                limit: 2
            }
        );
    }

    #[test]
    fn test_globals_limit() {
        let bc = program(&[(Op::Null, &[]), (Op::SetGlobal, &[4])], vec![]);
        let config = VmConfig {
            globals_size: 4,
            ..VmConfig::default()
        };

        let err = Vm::with_config(bc, config).run().unwrap_err();
        assert!(matches!(
            err.kind,
            RuntimeErrorKind::StackOverflow { stack: "globals", .. }
        ));
    }

    #[test]
    fn test_pop_on_empty_stack() {
        let bc = program(&[(Op::Pop, &[])], vec![]);

        let err = run_program(bc).unwrap_err();
        assert_eq!(err.kind, RuntimeErrorKind::StackUnderflow);
    }

    #[test]
    fn test_run_twice_keeps_globals() {
        let bc = program(
            &[
                (Op::GetGlobal, &[0]),
                (Op::Pop, &[]),
                (Op::Constant, &[0]),
                (Op::SetGlobal, &[0]),
            ],
            vec![Value::Integer(9)],
        );

        let mut vm = Vm::new(bc);
        assert_eq!(vm.run().unwrap(), Value::Null);
        assert_eq!(vm.run().unwrap(), Value::Integer(9));
    }

    #[test]
    fn test_append_local_extends_array_in_slot() {
        let bc = program(
            &[
                (Op::Array, &[0]),
                (Op::Constant, &[0]),
                (Op::AppendLocal, &[0]),
                (Op::Constant, &[1]),
                (Op::AppendLocal, &[0]),
                (Op::Pop, &[]),
            ],
            vec![Value::Integer(1), Value::Integer(2)],
        );

        let mut vm = Vm::new(bc);
        assert_eq!(
            vm.run().unwrap(),
            Value::array(vec![Value::Integer(1), Value::Integer(2)])
        );
        assert_eq!(vm.stack_pointer(), 0);
    }

    #[test]
    fn test_append_local_requires_array() {
        let bc = program(
            &[
                (Op::Constant, &[0]),
                (Op::Constant, &[0]),
                (Op::AppendLocal, &[0]),
            ],
            vec![Value::Integer(1)],
        );

        let err = run_program(bc).unwrap_err();
        assert_eq!(
            err.kind,
            RuntimeErrorKind::UnsupportedOperation {
                op: "push".to_string(),
                left: "integer",
                right: None,
            }
        );
    }
}
