//! Byte-array slicing and the general value-equality opcode.

use crate::error::{VmError, VmResult};
use crate::execution_engine::ExecutionEngine;
use crate::instruction::Instruction;
use crate::jump_table::Handler;
use crate::op_code::OpCode;
use crate::stack_item::{StackItem, MAX_ITEM_SIZE};

pub fn register(handlers: &mut [Option<Handler>; 256]) {
    handlers[OpCode::CAT as usize] = Some(exec_cat);
    handlers[OpCode::SUBSTR as usize] = Some(exec_substr);
    handlers[OpCode::LEFT as usize] = Some(exec_left);
    handlers[OpCode::RIGHT as usize] = Some(exec_right);
    handlers[OpCode::SIZE as usize] = Some(exec_size);
    handlers[OpCode::EQUAL as usize] = Some(exec_equal);
}

fn exec_cat(engine: &mut ExecutionEngine, _ins: &Instruction) -> VmResult<bool> {
    let b = engine.pop()?.as_bytes()?;
    let a = engine.pop()?.as_bytes()?;
    if a.len() + b.len() > MAX_ITEM_SIZE {
        return Err(VmError::CatExceedMaxItemSize);
    }
    let mut result = a;
    result.extend(b);
    engine.push(StackItem::from_bytes(result))?;
    Ok(false)
}

fn exec_substr(engine: &mut ExecutionEngine, _ins: &Instruction) -> VmResult<bool> {
    let count = engine.pop()?.to_usize()?;
    let index = engine.pop()?.to_usize()?;
    let bytes = engine.pop()?.as_bytes()?;
    if index > bytes.len() {
        return Err(VmError::SubstrInvalidIndex);
    }
    if index + count > bytes.len() {
        return Err(VmError::SubstrInvalidLength);
    }
    engine.push(StackItem::from_bytes(bytes[index..index + count].to_vec()))?;
    Ok(false)
}

fn exec_left(engine: &mut ExecutionEngine, _ins: &Instruction) -> VmResult<bool> {
    let count = engine.pop()?.to_usize()?;
    let bytes = engine.pop()?.as_bytes()?;
    if count > bytes.len() {
        return Err(VmError::LeftInvalidCount);
    }
    engine.push(StackItem::from_bytes(bytes[..count].to_vec()))?;
    Ok(false)
}

fn exec_right(engine: &mut ExecutionEngine, _ins: &Instruction) -> VmResult<bool> {
    let count = engine.pop()?.to_usize()?;
    let bytes = engine.pop()?.as_bytes()?;
    if count > bytes.len() {
        return Err(VmError::RightInvalidCount);
    }
    engine.push(StackItem::from_bytes(bytes[bytes.len() - count..].to_vec()))?;
    Ok(false)
}

fn exec_size(engine: &mut ExecutionEngine, _ins: &Instruction) -> VmResult<bool> {
    let item = engine.pop()?;
    let len = item.as_bytes()?.len();
    engine.push(StackItem::from_int(len as i64))?;
    Ok(false)
}

fn exec_equal(engine: &mut ExecutionEngine, _ins: &Instruction) -> VmResult<bool> {
    let b = engine.pop()?;
    let a = engine.pop()?;
    engine.push(StackItem::from_bool(a.equals(&b)))?;
    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::Secp256k1Crypto;
    use crate::execution_engine::ExecutionEngine;

    #[test]
    fn cat_concatenates_bytes() {
        let mut e = ExecutionEngine::new(None, Box::new(Secp256k1Crypto), None, None, true);
        e.load_script(
            vec![
                0x02, b'h', b'i', // PUSHBYTES2 "hi"
                0x03, b'y', b'o', b'u', // PUSHBYTES3 "you"
                OpCode::CAT as u8,
                OpCode::RET as u8,
            ],
            -1,
        );
        assert!(e.execute());
        let top = e.result_stack().peek(0).unwrap();
        assert_eq!(top.as_bytes().unwrap(), b"hiyou".to_vec());
    }
}
