//! Constant-pushing opcodes.

use crate::error::{VmError, VmResult};
use crate::execution_engine::ExecutionEngine;
use crate::instruction::Instruction;
use crate::jump_table::Handler;
use crate::op_code::OpCode;
use crate::stack_item::{StackItem, MAX_ITEM_SIZE};

pub fn register(handlers: &mut [Option<Handler>; 256]) {
    handlers[OpCode::PUSH0 as usize] = Some(exec_push0);
    handlers[OpCode::PUSHDATA1 as usize] = Some(exec_pushdata);
    handlers[OpCode::PUSHDATA2 as usize] = Some(exec_pushdata);
    handlers[OpCode::PUSHDATA4 as usize] = Some(exec_pushdata);
    handlers[OpCode::PUSHM1 as usize] = Some(exec_pushops);
    for op in [
        OpCode::PUSH1,
        OpCode::PUSH2,
        OpCode::PUSH3,
        OpCode::PUSH4,
        OpCode::PUSH5,
        OpCode::PUSH6,
        OpCode::PUSH7,
        OpCode::PUSH8,
        OpCode::PUSH9,
        OpCode::PUSH10,
        OpCode::PUSH11,
        OpCode::PUSH12,
        OpCode::PUSH13,
        OpCode::PUSH14,
        OpCode::PUSH15,
        OpCode::PUSH16,
    ] {
        handlers[op as usize] = Some(exec_pushops);
    }
}

fn push_checked(engine: &mut ExecutionEngine, bytes: Vec<u8>) -> VmResult<bool> {
    if bytes.len() > MAX_ITEM_SIZE {
        return Err(VmError::CatExceedMaxItemSize);
    }
    engine.push(StackItem::from_bytes(bytes))?;
    Ok(false)
}

fn exec_push0(engine: &mut ExecutionEngine, _ins: &Instruction) -> VmResult<bool> {
    push_checked(engine, Vec::new())
}

/// Handles the dense PUSHBYTES1..PUSHBYTES75 range (dispatched directly by
/// the jump table rather than through the 256-entry array, since they share
/// one semantic but differ in operand length per raw byte value).
pub fn exec_pushbytes(engine: &mut ExecutionEngine, ins: &Instruction) -> VmResult<bool> {
    push_checked(engine, ins.operand.clone())
}

fn exec_pushdata(engine: &mut ExecutionEngine, ins: &Instruction) -> VmResult<bool> {
    push_checked(engine, ins.operand.clone())
}

fn exec_pushops(engine: &mut ExecutionEngine, ins: &Instruction) -> VmResult<bool> {
    let value: i64 = if ins.opcode == OpCode::PUSHM1 {
        -1
    } else {
        (ins.raw_opcode as i64) - (OpCode::PUSH1 as i64) + 1
    };
    engine.push(StackItem::from_int(value))?;
    Ok(false)
}
