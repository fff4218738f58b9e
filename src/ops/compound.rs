//! Array, struct, and map opcodes.
//!
//! Reads and writes that cross a Struct boundary go through
//! `deep_clone_for_assignment` so Struct's value semantics hold even when a
//! Struct is nested inside an Array or Map.

use crate::error::{VmError, VmResult};
use crate::execution_engine::ExecutionEngine;
use crate::instruction::Instruction;
use crate::jump_table::Handler;
use crate::op_code::OpCode;
use crate::stack_item::{deep_clone_for_assignment, StackItem, MAX_ARRAY_SIZE};

pub fn register(handlers: &mut [Option<Handler>; 256]) {
    handlers[OpCode::ARRAYSIZE as usize] = Some(exec_arraysize);
    handlers[OpCode::PACK as usize] = Some(exec_pack);
    handlers[OpCode::UNPACK as usize] = Some(exec_unpack);
    handlers[OpCode::PICKITEM as usize] = Some(exec_pickitem);
    handlers[OpCode::SETITEM as usize] = Some(exec_setitem);
    handlers[OpCode::NEWARRAY as usize] = Some(exec_newarray);
    handlers[OpCode::NEWSTRUCT as usize] = Some(exec_newstruct);
    handlers[OpCode::NEWMAP as usize] = Some(exec_newmap);
    handlers[OpCode::APPEND as usize] = Some(exec_append);
    handlers[OpCode::REVERSE as usize] = Some(exec_reverse);
    handlers[OpCode::REMOVE as usize] = Some(exec_remove);
    handlers[OpCode::HASKEY as usize] = Some(exec_haskey);
    handlers[OpCode::KEYS as usize] = Some(exec_keys);
    handlers[OpCode::VALUES as usize] = Some(exec_values);
}

fn exec_arraysize(engine: &mut ExecutionEngine, _ins: &Instruction) -> VmResult<bool> {
    let x = engine.pop()?;
    let len = match &x {
        StackItem::Array(a) | StackItem::Struct(a) => a.borrow().len(),
        StackItem::Map(m) => m.borrow().len(),
        _ => x.as_bytes()?.len(),
    };
    engine.push(StackItem::from_int(len as i64))?;
    Ok(false)
}

fn exec_pack(engine: &mut ExecutionEngine, _ins: &Instruction) -> VmResult<bool> {
    let n = engine.pop()?.to_usize()?;
    if n > MAX_ARRAY_SIZE {
        return Err(VmError::NewArrayExceedArrayLimit);
    }
    let mut items = Vec::with_capacity(n);
    for _ in 0..n {
        items.push(engine.pop()?);
    }
    engine.push(StackItem::new_array(items))?;
    Ok(false)
}

fn exec_unpack(engine: &mut ExecutionEngine, _ins: &Instruction) -> VmResult<bool> {
    let top = engine.pop()?;
    let arr = top.as_array().map_err(|_| VmError::UnpackInvalidType)?;
    let items = arr.borrow().clone();
    for item in items.iter().rev() {
        engine.push(item.clone())?;
    }
    engine.push(StackItem::from_int(items.len() as i64))?;
    Ok(false)
}

fn exec_pickitem(engine: &mut ExecutionEngine, _ins: &Instruction) -> VmResult<bool> {
    let index = engine.pop()?;
    let container = engine.pop()?;
    match &container {
        StackItem::Array(a) | StackItem::Struct(a) => {
            let idx = index.to_usize().map_err(|_| VmError::PickItemNegativeIndex)?;
            let items = a.borrow();
            if idx >= items.len() {
                return Err(VmError::PickItemInvalidIndex(idx, items.len()));
            }
            engine.push(deep_clone_for_assignment(&items[idx]))?;
        }
        StackItem::Map(m) => {
            let entries = m.borrow();
            match entries.iter().find(|(k, _)| k.equals(&index)) {
                Some((_, v)) => {
                    let v = deep_clone_for_assignment(v);
                    drop(entries);
                    engine.push(v)?;
                }
                None => return Err(VmError::PickItemDictKeyNotFound),
            }
        }
        _ => return Err(VmError::PickItemInvalidType),
    }
    Ok(false)
}

fn exec_setitem(engine: &mut ExecutionEngine, _ins: &Instruction) -> VmResult<bool> {
    let value = engine.pop()?;
    let index = engine.pop()?;
    let container = engine.pop()?;
    match &container {
        StackItem::Array(a) | StackItem::Struct(a) => {
            let idx = index.to_usize().map_err(|_| VmError::SetItemNegativeIndex)?;
            let mut items = a.borrow_mut();
            if idx >= items.len() {
                return Err(VmError::SetItemInvalidIndex(idx, items.len()));
            }
            items[idx] = deep_clone_for_assignment(&value);
        }
        StackItem::Map(m) => {
            if index.is_collection() {
                return Err(VmError::KeyIsCollection);
            }
            let mut entries = m.borrow_mut();
            let stored = deep_clone_for_assignment(&value);
            match entries.iter_mut().find(|(k, _)| k.equals(&index)) {
                Some((_, v)) => *v = stored,
                None => entries.push((index, stored)),
            }
        }
        _ => return Err(VmError::SetItemInvalidType),
    }
    Ok(false)
}

fn exec_newarray(engine: &mut ExecutionEngine, _ins: &Instruction) -> VmResult<bool> {
    let top = engine.pop()?;
    match top {
        StackItem::Array(a) => {
            engine.push(StackItem::Array(a))?;
        }
        StackItem::Struct(a) => {
            engine.push(StackItem::new_array(a.borrow().clone()))?;
        }
        other => {
            let n = other.to_isize().map_err(|_| VmError::NewArrayNegativeCount)?;
            if n < 0 {
                return Err(VmError::NewArrayNegativeCount);
            }
            if n as usize > MAX_ARRAY_SIZE {
                return Err(VmError::NewArrayExceedArrayLimit);
            }
            engine.push(StackItem::new_array(vec![StackItem::from_bool(false); n as usize]))?;
        }
    }
    Ok(false)
}

fn exec_newstruct(engine: &mut ExecutionEngine, _ins: &Instruction) -> VmResult<bool> {
    let top = engine.pop()?;
    match top {
        StackItem::Struct(a) => {
            engine.push(StackItem::Struct(a))?;
        }
        StackItem::Array(a) => {
            engine.push(StackItem::new_struct(a.borrow().clone()))?;
        }
        other => {
            let n = other.to_isize().map_err(|_| VmError::NewArrayNegativeCount)?;
            if n < 0 {
                return Err(VmError::NewArrayNegativeCount);
            }
            if n as usize > MAX_ARRAY_SIZE {
                return Err(VmError::NewArrayExceedArrayLimit);
            }
            engine.push(StackItem::new_struct(vec![StackItem::from_bool(false); n as usize]))?;
        }
    }
    Ok(false)
}

fn exec_newmap(engine: &mut ExecutionEngine, _ins: &Instruction) -> VmResult<bool> {
    engine.push(StackItem::new_map())?;
    Ok(false)
}

fn exec_append(engine: &mut ExecutionEngine, _ins: &Instruction) -> VmResult<bool> {
    let item = engine.pop()?;
    let container = engine.pop()?;
    let arr = container.as_array().map_err(|_| VmError::AppendInvalidType)?;
    if arr.borrow().len() >= MAX_ARRAY_SIZE {
        return Err(VmError::NewArrayExceedArrayLimit);
    }
    arr.borrow_mut().push(deep_clone_for_assignment(&item));
    Ok(false)
}

fn exec_reverse(engine: &mut ExecutionEngine, _ins: &Instruction) -> VmResult<bool> {
    let container = engine.pop()?;
    let arr = container.as_array().map_err(|_| VmError::ReverseInvalidType)?;
    arr.borrow_mut().reverse();
    Ok(false)
}

fn exec_remove(engine: &mut ExecutionEngine, _ins: &Instruction) -> VmResult<bool> {
    let index = engine.pop()?;
    let container = engine.pop()?;
    match &container {
        StackItem::Array(a) | StackItem::Struct(a) => {
            let mut items = a.borrow_mut();
            let idx = index.to_isize().unwrap_or(-1);
            if idx < 0 || idx as usize >= items.len() {
                return Err(VmError::RemoveInvalidIndex(idx as i64, items.len()));
            }
            items.remove(idx as usize);
        }
        StackItem::Map(m) => {
            let mut entries = m.borrow_mut();
            if let Some(pos) = entries.iter().position(|(k, _)| k.equals(&index)) {
                entries.remove(pos);
            }
        }
        _ => return Err(VmError::RemoveInvalidType),
    }
    Ok(false)
}

fn exec_haskey(engine: &mut ExecutionEngine, _ins: &Instruction) -> VmResult<bool> {
    let index = engine.pop()?;
    let container = engine.pop()?;
    let result = match &container {
        StackItem::Array(a) | StackItem::Struct(a) => {
            let len = a.borrow().len();
            index.to_isize().map(|i| i >= 0 && (i as usize) < len).unwrap_or(false)
        }
        StackItem::Map(m) => m.borrow().iter().any(|(k, _)| k.equals(&index)),
        _ => return Err(VmError::PickItemInvalidType),
    };
    engine.push(StackItem::from_bool(result))?;
    Ok(false)
}

fn exec_keys(engine: &mut ExecutionEngine, _ins: &Instruction) -> VmResult<bool> {
    let container = engine.pop()?;
    let m = container.as_map().map_err(|_| VmError::PickItemInvalidType)?;
    let keys: Vec<StackItem> = m.borrow().iter().map(|(k, _)| k.clone()).collect();
    engine.push(StackItem::new_array(keys))?;
    Ok(false)
}

fn exec_values(engine: &mut ExecutionEngine, _ins: &Instruction) -> VmResult<bool> {
    let container = engine.pop()?;
    let m = container.as_map().map_err(|_| VmError::PickItemInvalidType)?;
    let values: Vec<StackItem> = m
        .borrow()
        .iter()
        .map(|(_, v)| deep_clone_for_assignment(v))
        .collect();
    engine.push(StackItem::new_array(values))?;
    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::Secp256k1Crypto;
    use crate::execution_engine::ExecutionEngine;

    #[test]
    fn newarray_then_arraysize() {
        let mut e = ExecutionEngine::new(None, Box::new(Secp256k1Crypto), None, None, true);
        e.load_script(
            vec![
                OpCode::PUSH3 as u8,
                OpCode::NEWARRAY as u8,
                OpCode::ARRAYSIZE as u8,
                OpCode::RET as u8,
            ],
            -1,
        );
        assert!(e.execute());
        assert_eq!(e.result_stack().peek(0).unwrap().as_bigint().unwrap(), 3.into());
    }

    #[test]
    fn newarray_coerces_existing_struct() {
        let mut e = ExecutionEngine::new(None, Box::new(Secp256k1Crypto), None, None, true);
        e.load_script(vec![OpCode::NEWARRAY as u8, OpCode::ARRAYSIZE as u8, OpCode::RET as u8], -1);
        e.push(StackItem::new_struct(vec![StackItem::from_int(1), StackItem::from_int(2)]))
            .unwrap();
        assert!(e.execute());
        assert_eq!(e.result_stack().peek(0).unwrap().as_bigint().unwrap(), 2.into());
    }

    #[test]
    fn pickitem_out_of_range_faults() {
        let mut e = ExecutionEngine::new(None, Box::new(Secp256k1Crypto), None, None, true);
        e.load_script(
            vec![
                OpCode::PUSH1 as u8,
                OpCode::NEWARRAY as u8,
                OpCode::PUSH5 as u8,
                OpCode::PICKITEM as u8,
                OpCode::RET as u8,
            ],
            -1,
        );
        assert!(!e.execute());
        assert!(e.state().is_fault());
    }

    #[test]
    fn struct_setitem_does_not_alias() {
        let inner = StackItem::new_struct(vec![StackItem::from_int(1)]);
        let outer = StackItem::new_array(vec![inner.clone()]);
        let cloned = deep_clone_for_assignment(&inner);
        if let (StackItem::Array(a), StackItem::Struct(s)) = (&outer, &cloned) {
            a.borrow_mut()[0] = StackItem::Struct(s.clone());
        }
        if let StackItem::Struct(s) = &cloned {
            s.borrow_mut()[0] = StackItem::from_int(99);
        }
        if let StackItem::Struct(orig) = &inner {
            assert_eq!(orig.borrow()[0].as_bigint().unwrap(), 1.into());
        }
    }
}
