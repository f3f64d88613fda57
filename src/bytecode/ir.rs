use crate::lang::value::Value;
use serde::{Deserialize, Serialize};

/// A flat, encoded instruction stream.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instructions(Vec<u8>);

impl Instructions {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Append an encoded instruction, returning its offset.
    pub fn push(&mut self, instruction: &[u8]) -> usize {
        let position = self.0.len();
        self.0.extend_from_slice(instruction);
        position
    }

    /// Overwrite already emitted bytes starting at `position`.
    pub fn patch(&mut self, position: usize, instruction: &[u8]) {
        self.0[position..position + instruction.len()].copy_from_slice(instruction);
    }

    pub fn truncate(&mut self, len: usize) {
        self.0.truncate(len);
    }
}

impl From<Vec<u8>> for Instructions {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl FromIterator<Vec<u8>> for Instructions {
    fn from_iter<I: IntoIterator<Item = Vec<u8>>>(iter: I) -> Self {
        Self(iter.into_iter().flatten().collect())
    }
}

/// A compiled program: the main instruction stream plus the constant pool
/// shared by every function in it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bytecode {
    pub instructions: Instructions,
    pub constants: Vec<Value>,
}

impl Bytecode {
    pub fn to_bytes(&self) -> Result<Vec<u8>, postcard::Error> {
        postcard::to_allocvec(self)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, postcard::Error> {
        postcard::from_bytes(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bytecode::op::{Op, make};
    use crate::lang::value::CompiledFunction;
    use std::rc::Rc;

    #[test]
    fn test_patch_overwrites_operand() {
        let mut ins = Instructions::new();
        let pos = ins.push(&make(Op::Jump, &[9999]).unwrap());
        ins.patch(pos, &make(Op::Jump, &[3]).unwrap());

        assert_eq!(ins.as_bytes(), &[Op::Jump as u8, 0, 3]);
    }

    #[test]
    fn test_bytecode_survives_postcard() {
        let body: Instructions = vec![
            make(Op::GetLocal, &[0]).unwrap(),
            make(Op::ReturnValue, &[]).unwrap(),
        ]
        .into_iter()
        .collect();
        let bytecode = Bytecode {
            instructions: vec![make(Op::Constant, &[0]).unwrap(), make(Op::Pop, &[]).unwrap()]
                .into_iter()
                .collect(),
            constants: vec![
                Value::Integer(7),
                Value::String("seven".to_string()),
                Value::CompiledFunction(Rc::new(CompiledFunction {
                    instructions: body,
                    num_locals: 1,
                    num_parameters: 1,
                    name: Some("id".to_string()),
                })),
            ],
        };

        let bytes = bytecode.to_bytes().unwrap();
        let decoded = Bytecode::from_bytes(&bytes).unwrap();

        assert_eq!(decoded, bytecode);
    }
}
