// =============================================================================
// OP - Bytecode instructions
// =============================================================================
//
// An instruction is one opcode byte followed by its operands. Operand widths
// are fixed per opcode and encoded big-endian.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Op {
    // literals
    Constant,
    True,
    False,
    Null,
    Array,
    Hash,

    // control flow
    JumpIfFalse,
    Jump,

    // bindings
    GetGlobal,
    SetGlobal,
    GetLocal,
    SetLocal,
    IncLocal,
    /// Append the popped value to the array held in a local slot.
    AppendLocal,
    GetBuiltin,
    GetMethod,
    GetFree,
    CurrentClosure,

    // functions
    Closure,
    Call,
    ReturnValue,
    Return,

    Pop,
    Index,

    // prefix
    Not,
    Neg,

    // infix
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Lt,
    Gt,
    Eq,
    Neq,
    Leq,
    Geq,
    And,
    Or,
}

/// Every opcode in discriminant order.
const ALL_OPS: [Op; 39] = [
    Op::Constant,
    Op::True,
    Op::False,
    Op::Null,
    Op::Array,
    Op::Hash,
    Op::JumpIfFalse,
    Op::Jump,
    Op::GetGlobal,
    Op::SetGlobal,
    Op::GetLocal,
    Op::SetLocal,
    Op::IncLocal,
    Op::AppendLocal,
    Op::GetBuiltin,
    Op::GetMethod,
    Op::GetFree,
    Op::CurrentClosure,
    Op::Closure,
    Op::Call,
    Op::ReturnValue,
    Op::Return,
    Op::Pop,
    Op::Index,
    Op::Not,
    Op::Neg,
    Op::Add,
    Op::Sub,
    Op::Mul,
    Op::Div,
    Op::Mod,
    Op::Lt,
    Op::Gt,
    Op::Eq,
    Op::Neq,
    Op::Leq,
    Op::Geq,
    Op::And,
    Op::Or,
];

/// Mnemonic and operand widths (in bytes) of an opcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Definition {
    pub name: &'static str,
    pub operand_widths: &'static [usize],
}

impl Definition {
    /// Total encoded size of an instruction, opcode byte included.
    pub fn instruction_len(&self) -> usize {
        1 + self.operand_widths.iter().sum::<usize>()
    }
}

impl Op {
    pub fn definition(self) -> Definition {
        let (name, operand_widths): (&'static str, &'static [usize]) = match self {
            Op::Constant => ("OpConst", &[2]),
            Op::True => ("OpTrue", &[]),
            Op::False => ("OpFalse", &[]),
            Op::Null => ("OpNull", &[]),
            Op::Array => ("OpArray", &[2]),
            Op::Hash => ("OpHash", &[2]),
            Op::JumpIfFalse => ("OpJumpIfFalse", &[2]),
            Op::Jump => ("OpJump", &[2]),
            Op::GetGlobal => ("OpGetGlobal", &[2]),
            Op::SetGlobal => ("OpSetGlobal", &[2]),
            Op::GetLocal => ("OpGetLocal", &[1]),
            Op::SetLocal => ("OpSetLocal", &[1]),
            Op::IncLocal => ("OpIncLocal", &[1]),
            Op::AppendLocal => ("OpAppendLocal", &[1]),
            Op::GetBuiltin => ("OpGetBuiltin", &[1]),
            Op::GetMethod => ("OpGetMethod", &[1]),
            Op::GetFree => ("OpGetFree", &[1]),
            Op::CurrentClosure => ("OpCurrentClosure", &[]),
            Op::Closure => ("OpClosure", &[2, 1]),
            Op::Call => ("OpCall", &[1]),
            Op::ReturnValue => ("OpReturnValue", &[]),
            Op::Return => ("OpReturn", &[]),
            Op::Pop => ("OpPop", &[]),
            Op::Index => ("OpIndex", &[]),
            Op::Not => ("OpNot", &[]),
            Op::Neg => ("OpNeg", &[]),
            Op::Add => ("OpAdd", &[]),
            Op::Sub => ("OpSub", &[]),
            Op::Mul => ("OpMul", &[]),
            Op::Div => ("OpDiv", &[]),
            Op::Mod => ("OpMod", &[]),
            Op::Lt => ("OpLt", &[]),
            Op::Gt => ("OpGt", &[]),
            Op::Eq => ("OpEq", &[]),
            Op::Neq => ("OpNeq", &[]),
            Op::Leq => ("OpLeq", &[]),
            Op::Geq => ("OpGeq", &[]),
            Op::And => ("OpAnd", &[]),
            Op::Or => ("OpOr", &[]),
        };
        Definition {
            name,
            operand_widths,
        }
    }
}

impl TryFrom<u8> for Op {
    type Error = EncodingError;

    fn try_from(byte: u8) -> Result<Self, Self::Error> {
        ALL_OPS
            .get(byte as usize)
            .copied()
            .ok_or(EncodingError::UnknownOpcode(byte))
    }
}

/// Signature of an opcode.
pub fn lookup(op: Op) -> Definition {
    op.definition()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EncodingError {
    UnknownOpcode(u8),
    OperandCount {
        op: &'static str,
        expected: usize,
        got: usize,
    },
    /// The operand value does not fit in the operand's width.
    OperandOverflow {
        op: &'static str,
        operand: usize,
        width: usize,
    },
    UnsupportedWidth { op: &'static str, width: usize },
    /// The instruction stream ends in the middle of an instruction.
    Truncated { offset: usize },
}

impl std::fmt::Display for EncodingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EncodingError::UnknownOpcode(byte) => write!(f, "unknown opcode {}", byte),
            EncodingError::OperandCount { op, expected, got } => write!(
                f,
                "{} takes {} operand(s), got {}",
                op, expected, got
            ),
            EncodingError::OperandOverflow { op, operand, width } => write!(
                f,
                "{} operand {} does not fit in {} byte(s)",
                op, operand, width
            ),
            EncodingError::UnsupportedWidth { op, width } => {
                write!(f, "{} has unsupported operand width {}", op, width)
            }
            EncodingError::Truncated { offset } => {
                write!(f, "instruction at offset {} is truncated", offset)
            }
        }
    }
}

impl std::error::Error for EncodingError {}

/// Encode one instruction.
pub fn make(op: Op, operands: &[usize]) -> Result<Vec<u8>, EncodingError> {
    let def = op.definition();

    if operands.len() != def.operand_widths.len() {
        return Err(EncodingError::OperandCount {
            op: def.name,
            expected: def.operand_widths.len(),
            got: operands.len(),
        });
    }

    let mut instruction = Vec::with_capacity(def.instruction_len());
    instruction.push(op as u8);

    for (&operand, &width) in operands.iter().zip(def.operand_widths) {
        let overflow = || EncodingError::OperandOverflow {
            op: def.name,
            operand,
            width,
        };
        match width {
            2 => {
                let value = u16::try_from(operand).map_err(|_| overflow())?;
                instruction.extend_from_slice(&value.to_be_bytes());
            }
            1 => {
                let value = u8::try_from(operand).map_err(|_| overflow())?;
                instruction.push(value);
            }
            width => {
                return Err(EncodingError::UnsupportedWidth {
                    op: def.name,
                    width,
                });
            }
        }
    }

    Ok(instruction)
}

/// Decode the operands that follow an opcode byte.
///
/// `ins` starts right after the opcode. Returns the operands and the number
/// of bytes they occupy.
pub fn read_operands(def: &Definition, ins: &[u8]) -> Result<(Vec<usize>, usize), EncodingError> {
    let mut operands = Vec::with_capacity(def.operand_widths.len());
    let mut offset = 0;

    for &width in def.operand_widths {
        let operand = match width {
            2 => read_u16(ins, offset)?,
            1 => read_u8(ins, offset)?,
            width => {
                return Err(EncodingError::UnsupportedWidth {
                    op: def.name,
                    width,
                });
            }
        };
        operands.push(operand);
        offset += width;
    }

    Ok((operands, offset))
}

pub fn read_u16(ins: &[u8], offset: usize) -> Result<usize, EncodingError> {
    match ins.get(offset..offset + 2) {
        Some(&[hi, lo]) => Ok(u16::from_be_bytes([hi, lo]) as usize),
        _ => Err(EncodingError::Truncated { offset }),
    }
}

pub fn read_u8(ins: &[u8], offset: usize) -> Result<usize, EncodingError> {
    ins.get(offset)
        .map(|&b| b as usize)
        .ok_or(EncodingError::Truncated { offset })
}
