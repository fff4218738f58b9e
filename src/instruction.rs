//! Decodes an `OpCode` and its operand from a `(Script, offset)` pair.

use crate::error::VmError;
use crate::op_code::OpCode;

#[derive(Debug, Clone)]
pub struct Instruction {
    pub opcode: OpCode,
    pub raw_opcode: u8,
    pub operand: Vec<u8>,
    pub size: usize,
}

impl Instruction {
    /// A synthetic RET used when the instruction pointer runs past the end
    /// of the script (the implicit-return convention).
    pub fn synthetic_ret() -> Instruction {
        Instruction {
            opcode: OpCode::RET,
            raw_opcode: OpCode::RET as u8,
            operand: Vec::new(),
            size: 1,
        }
    }

    pub fn parse(script: &[u8], position: usize) -> Result<Instruction, VmError> {
        if position >= script.len() {
            return Ok(Instruction::synthetic_ret());
        }
        let raw = script[position];
        let opcode = OpCode::from_byte(raw)
            .ok_or(VmError::MalformedInstruction(position, format!("unknown opcode 0x{raw:02X}")))?;

        let body = &script[position + 1..];

        // PUSHBYTES1..PUSHBYTES75: the raw byte itself is the operand length.
        if (0x01..=0x4B).contains(&raw) {
            let n = raw as usize;
            if body.len() < n {
                return Err(VmError::MalformedInstruction(position, "PUSHBYTES operand truncated".into()));
            }
            return Ok(Instruction {
                opcode,
                raw_opcode: raw,
                operand: body[..n].to_vec(),
                size: 1 + n,
            });
        }

        match opcode {
            OpCode::PUSHDATA1 => read_length_prefixed(opcode, raw, body, position, 1),
            OpCode::PUSHDATA2 => read_length_prefixed(opcode, raw, body, position, 2),
            OpCode::PUSHDATA4 => read_length_prefixed(opcode, raw, body, position, 4),
            OpCode::JMP | OpCode::JMPIF | OpCode::JMPIFNOT | OpCode::CALL => {
                require_len(body, 2, position)?;
                Ok(Instruction {
                    opcode,
                    raw_opcode: raw,
                    operand: body[..2].to_vec(),
                    size: 3,
                })
            }
            OpCode::APPCALL | OpCode::TAILCALL => {
                require_len(body, 20, position)?;
                Ok(Instruction {
                    opcode,
                    raw_opcode: raw,
                    operand: body[..20].to_vec(),
                    size: 21,
                })
            }
            OpCode::SYSCALL => {
                require_len(body, 1, position)?;
                let n = body[0] as usize;
                if n > 252 {
                    return Err(VmError::MalformedInstruction(position, "SYSCALL name too long".into()));
                }
                require_len(body, 1 + n, position)?;
                Ok(Instruction {
                    opcode,
                    raw_opcode: raw,
                    operand: body[1..1 + n].to_vec(),
                    size: 2 + n,
                })
            }
            OpCode::CALL_I => {
                require_len(body, 4, position)?;
                Ok(Instruction {
                    opcode,
                    raw_opcode: raw,
                    operand: body[..4].to_vec(),
                    size: 5,
                })
            }
            OpCode::CALL_E | OpCode::CALL_ET => {
                require_len(body, 22, position)?;
                Ok(Instruction {
                    opcode,
                    raw_opcode: raw,
                    operand: body[..22].to_vec(),
                    size: 23,
                })
            }
            OpCode::CALL_ED | OpCode::CALL_EDT => {
                require_len(body, 2, position)?;
                Ok(Instruction {
                    opcode,
                    raw_opcode: raw,
                    operand: body[..2].to_vec(),
                    size: 3,
                })
            }
            _ => Ok(Instruction {
                opcode,
                raw_opcode: raw,
                operand: Vec::new(),
                size: 1,
            }),
        }
    }

    /// The 2-byte signed little-endian relative offset used by
    /// JMP/JMPIF/JMPIFNOT/CALL.
    pub fn token_i16(&self) -> i16 {
        i16::from_le_bytes([self.operand[0], self.operand[1]])
    }

    /// For CALL_I: `operand[2..4]` as a signed little-endian offset.
    pub fn token_i16_at(&self, offset: usize) -> i16 {
        i16::from_le_bytes([self.operand[offset], self.operand[offset + 1]])
    }
}

fn require_len(body: &[u8], n: usize, position: usize) -> Result<(), VmError> {
    if body.len() < n {
        Err(VmError::MalformedInstruction(position, "operand truncated".into()))
    } else {
        Ok(())
    }
}

fn read_length_prefixed(
    opcode: OpCode,
    raw: u8,
    body: &[u8],
    position: usize,
    prefix_len: usize,
) -> Result<Instruction, VmError> {
    require_len(body, prefix_len, position)?;
    let n = match prefix_len {
        1 => body[0] as usize,
        2 => u16::from_le_bytes([body[0], body[1]]) as usize,
        4 => u32::from_le_bytes([body[0], body[1], body[2], body[3]]) as usize,
        _ => unreachable!(),
    };
    require_len(body, prefix_len + n, position)?;
    Ok(Instruction {
        opcode,
        raw_opcode: raw,
        operand: body[prefix_len..prefix_len + n].to_vec(),
        size: 1 + prefix_len + n,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_pushbytes() {
        let script = [0x03u8, 1, 2, 3];
        let ins = Instruction::parse(&script, 0).unwrap();
        assert_eq!(ins.operand, vec![1, 2, 3]);
        assert_eq!(ins.size, 4);
    }

    #[test]
    fn decodes_jmp_offset() {
        let script = [OpCode::JMP as u8, 0x05, 0x00];
        let ins = Instruction::parse(&script, 0).unwrap();
        assert_eq!(ins.token_i16(), 5);
    }

    #[test]
    fn past_end_synthesizes_ret() {
        let script: [u8; 0] = [];
        let ins = Instruction::parse(&script, 0).unwrap();
        assert_eq!(ins.opcode, OpCode::RET);
    }
}
