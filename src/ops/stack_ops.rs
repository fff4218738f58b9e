//! Stack-shuffling opcodes (no arithmetic, no type inspection).

use crate::error::VmResult;
use crate::execution_engine::ExecutionEngine;
use crate::instruction::Instruction;
use crate::jump_table::Handler;
use crate::op_code::OpCode;
use crate::stack_item::StackItem;

pub fn register(handlers: &mut [Option<Handler>; 256]) {
    handlers[OpCode::DUPFROMALTSTACK as usize] = Some(exec_dupfromaltstack);
    handlers[OpCode::TOALTSTACK as usize] = Some(exec_toaltstack);
    handlers[OpCode::FROMALTSTACK as usize] = Some(exec_fromaltstack);
    handlers[OpCode::XDROP as usize] = Some(exec_xdrop);
    handlers[OpCode::XSWAP as usize] = Some(exec_xswap);
    handlers[OpCode::XTUCK as usize] = Some(exec_xtuck);
    handlers[OpCode::DEPTH as usize] = Some(exec_depth);
    handlers[OpCode::DROP as usize] = Some(exec_drop);
    handlers[OpCode::DUP as usize] = Some(exec_dup);
    handlers[OpCode::NIP as usize] = Some(exec_nip);
    handlers[OpCode::OVER as usize] = Some(exec_over);
    handlers[OpCode::PICK as usize] = Some(exec_pick);
    handlers[OpCode::ROLL as usize] = Some(exec_roll);
    handlers[OpCode::ROT as usize] = Some(exec_rot);
    handlers[OpCode::SWAP as usize] = Some(exec_swap);
    handlers[OpCode::TUCK as usize] = Some(exec_tuck);
}

fn ctx(engine: &mut ExecutionEngine) -> &mut crate::execution_context::ExecutionContext {
    engine.current_context_mut().expect("stack op with no active context")
}

fn exec_dupfromaltstack(engine: &mut ExecutionEngine, _ins: &Instruction) -> VmResult<bool> {
    let item = ctx(engine).alt_stack().peek(0)?;
    ctx(engine).evaluation_stack_mut().push(item)?;
    Ok(false)
}

fn exec_toaltstack(engine: &mut ExecutionEngine, _ins: &Instruction) -> VmResult<bool> {
    let item = ctx(engine).evaluation_stack_mut().pop()?;
    ctx(engine).alt_stack_mut().push(item)?;
    Ok(false)
}

fn exec_fromaltstack(engine: &mut ExecutionEngine, _ins: &Instruction) -> VmResult<bool> {
    let item = ctx(engine).alt_stack_mut().pop()?;
    ctx(engine).evaluation_stack_mut().push(item)?;
    Ok(false)
}

fn exec_xdrop(engine: &mut ExecutionEngine, _ins: &Instruction) -> VmResult<bool> {
    let n = engine.pop()?.to_usize()?;
    ctx(engine).evaluation_stack_mut().remove(n)?;
    Ok(false)
}

fn exec_xswap(engine: &mut ExecutionEngine, _ins: &Instruction) -> VmResult<bool> {
    let n = engine.pop()?.to_usize()?;
    if n > 0 {
        ctx(engine).evaluation_stack_mut().swap(0, n)?;
    }
    Ok(false)
}

fn exec_xtuck(engine: &mut ExecutionEngine, _ins: &Instruction) -> VmResult<bool> {
    let n = engine.pop()?.to_usize()?;
    let item = ctx(engine).evaluation_stack().peek(0)?;
    ctx(engine).evaluation_stack_mut().insert(n, item)?;
    Ok(false)
}

fn exec_depth(engine: &mut ExecutionEngine, _ins: &Instruction) -> VmResult<bool> {
    let n = ctx(engine).evaluation_stack().count();
    engine.push(StackItem::from_int(n as i64))?;
    Ok(false)
}

fn exec_drop(engine: &mut ExecutionEngine, _ins: &Instruction) -> VmResult<bool> {
    engine.pop()?;
    Ok(false)
}

fn exec_dup(engine: &mut ExecutionEngine, _ins: &Instruction) -> VmResult<bool> {
    let item = engine.peek(0)?;
    engine.push(item)?;
    Ok(false)
}

fn exec_nip(engine: &mut ExecutionEngine, _ins: &Instruction) -> VmResult<bool> {
    ctx(engine).evaluation_stack_mut().remove(1)?;
    Ok(false)
}

fn exec_over(engine: &mut ExecutionEngine, _ins: &Instruction) -> VmResult<bool> {
    let item = engine.peek(1)?;
    engine.push(item)?;
    Ok(false)
}

fn exec_pick(engine: &mut ExecutionEngine, _ins: &Instruction) -> VmResult<bool> {
    let n = engine.pop()?.to_usize()?;
    let item = engine.peek(n)?;
    engine.push(item)?;
    Ok(false)
}

fn exec_roll(engine: &mut ExecutionEngine, _ins: &Instruction) -> VmResult<bool> {
    let n = engine.pop()?.to_usize()?;
    if n > 0 {
        let item = ctx(engine).evaluation_stack_mut().remove(n)?;
        ctx(engine).evaluation_stack_mut().push(item)?;
    }
    Ok(false)
}

fn exec_rot(engine: &mut ExecutionEngine, _ins: &Instruction) -> VmResult<bool> {
    let item = ctx(engine).evaluation_stack_mut().remove(2)?;
    ctx(engine).evaluation_stack_mut().push(item)?;
    Ok(false)
}

fn exec_swap(engine: &mut ExecutionEngine, _ins: &Instruction) -> VmResult<bool> {
    ctx(engine).evaluation_stack_mut().swap(0, 1)?;
    Ok(false)
}

fn exec_tuck(engine: &mut ExecutionEngine, _ins: &Instruction) -> VmResult<bool> {
    let item = ctx(engine).evaluation_stack().peek(0)?;
    ctx(engine).evaluation_stack_mut().insert(2, item)?;
    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::Secp256k1Crypto;
    use crate::execution_engine::ExecutionEngine;

    fn engine_with(script: Vec<u8>) -> ExecutionEngine {
        let mut e = ExecutionEngine::new(None, Box::new(Secp256k1Crypto), None, None, true);
        e.load_script(script, -1);
        e
    }

    #[test]
    fn swap_exchanges_top_two() {
        let mut e = engine_with(vec![
            OpCode::PUSH1 as u8,
            OpCode::PUSH2 as u8,
            OpCode::SWAP as u8,
            OpCode::RET as u8,
        ]);
        assert!(e.execute());
        assert_eq!(e.result_stack().peek(0).unwrap().as_bigint().unwrap(), 1.into());
        assert_eq!(e.result_stack().peek(1).unwrap().as_bigint().unwrap(), 2.into());
    }

    #[test]
    fn depth_counts_items() {
        let mut e = engine_with(vec![
            OpCode::PUSH1 as u8,
            OpCode::PUSH2 as u8,
            OpCode::DEPTH as u8,
            OpCode::RET as u8,
        ]);
        assert!(e.execute());
        assert_eq!(e.result_stack().peek(0).unwrap().as_bigint().unwrap(), 2.into());
    }
}
