//! Dense, array-indexed opcode dispatch table.

use crate::error::{VmError, VmResult};
use crate::execution_engine::ExecutionEngine;
use crate::instruction::Instruction;
use crate::op_code::OpCode;
use crate::ops;

/// A handler returns `Ok(true)` when it has already repositioned the
/// instruction pointer itself (a branch, call, or return): the engine must
/// not additionally advance by `Instruction::size` in that case.
pub type Handler = fn(&mut ExecutionEngine, &Instruction) -> VmResult<bool>;

pub struct JumpTable {
    handlers: [Option<Handler>; 256],
}

impl JumpTable {
    pub fn new() -> JumpTable {
        let mut handlers: [Option<Handler>; 256] = [None; 256];
        ops::push::register(&mut handlers);
        ops::control::register(&mut handlers);
        ops::stack_ops::register(&mut handlers);
        ops::splice::register(&mut handlers);
        ops::numeric::register(&mut handlers);
        ops::crypto_ops::register(&mut handlers);
        ops::compound::register(&mut handlers);
        JumpTable { handlers }
    }

    pub fn set(&mut self, opcode: OpCode, handler: Handler) {
        self.handlers[opcode as usize] = Some(handler);
    }

    /// PUSHBYTES1..75 share one registration slot keyed at `OpCode::PUSHBYTES1`,
    /// but the dispatch itself must route every raw byte in that range.
    pub fn execute(&self, engine: &mut ExecutionEngine, instruction: &Instruction) -> VmResult<bool> {
        if (0x01..=0x4B).contains(&instruction.raw_opcode) {
            return ops::push::exec_pushbytes(engine, instruction);
        }
        match self.handlers[instruction.raw_opcode as usize] {
            Some(h) => h(engine, instruction),
            None => Err(VmError::UnknownOpcode(instruction.raw_opcode)),
        }
    }
}

impl Default for JumpTable {
    fn default() -> Self {
        JumpTable::new()
    }
}
