use crate::bytecode::ir::{Bytecode, Instructions};
use crate::bytecode::op::{EncodingError, Op, read_operands};
use crate::lang::value::Value;
use std::fmt::{self, Write};

/// Render an instruction stream as `offset mnemonic operand...`, one
/// instruction per line.
pub fn disassemble(ins: &Instructions) -> Result<String, EncodingError> {
    let bytes = ins.as_bytes();
    let mut out = String::new();
    let mut offset = 0;

    while offset < bytes.len() {
        let op = Op::try_from(bytes[offset])?;
        let def = op.definition();
        let (operands, read) = read_operands(&def, &bytes[offset + 1..])
            .map_err(|_| EncodingError::Truncated { offset })?;

        let _ = write!(out, "{:04} {}", offset, def.name);
        for operand in operands {
            let _ = write!(out, " {}", operand);
        }
        out.push('\n');

        offset += 1 + read;
    }

    Ok(out)
}

impl fmt::Display for Instructions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match disassemble(self) {
            Ok(text) => f.write_str(&text),
            Err(e) => write!(f, "ERROR: {}", e),
        }
    }
}

/// Disassemble the main stream and every function in the constant pool.
pub fn disassemble_program(bc: &Bytecode) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "════════════════════════════════════════");
    let _ = writeln!(out, " main");
    let _ = writeln!(out, " {} bytes", bc.instructions.len());
    let _ = writeln!(out, "════════════════════════════════════════");
    let _ = writeln!(out, "{}", bc.instructions);

    for (i, constant) in bc.constants.iter().enumerate() {
        if let Value::CompiledFunction(func) = constant {
            let _ = writeln!(out, "════════════════════════════════════════");
            let _ = writeln!(
                out,
                " constant {}: {}",
                i,
                func.name.as_deref().unwrap_or("<anonymous>")
            );
            let _ = writeln!(
                out,
                " {} params, {} locals, {} bytes",
                func.num_parameters,
                func.num_locals,
                func.instructions.len()
            );
            let _ = writeln!(out, "════════════════════════════════════════");
            let _ = writeln!(out, "{}", func.instructions);
        }
    }

    let _ = writeln!(out, "constants:");
    for (i, constant) in bc.constants.iter().enumerate() {
        if !matches!(constant, Value::CompiledFunction(_)) {
            let _ = writeln!(out, "  {:04} {}", i, constant.inspect());
        }
    }

    out
}
