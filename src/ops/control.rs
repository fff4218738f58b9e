//! Flow control: jumps, calls, return, syscalls, exceptions.

use crate::error::{VmError, VmResult};
use crate::execution_engine::ExecutionEngine;
use crate::instruction::Instruction;
use crate::jump_table::Handler;
use crate::op_code::OpCode;

pub fn register(handlers: &mut [Option<Handler>; 256]) {
    handlers[OpCode::NOP as usize] = Some(exec_nop);
    handlers[OpCode::JMP as usize] = Some(exec_jmp_all);
    handlers[OpCode::JMPIF as usize] = Some(exec_jmp_all);
    handlers[OpCode::JMPIFNOT as usize] = Some(exec_jmp_all);
    handlers[OpCode::CALL as usize] = Some(exec_call);
    handlers[OpCode::RET as usize] = Some(exec_ret);
    handlers[OpCode::APPCALL as usize] = Some(exec_app_tail_call);
    handlers[OpCode::TAILCALL as usize] = Some(exec_app_tail_call);
    handlers[OpCode::SYSCALL as usize] = Some(exec_syscall);
    handlers[OpCode::CALL_I as usize] = Some(exec_call_i);
    handlers[OpCode::CALL_E as usize] = Some(exec_call_e);
    handlers[OpCode::CALL_ED as usize] = Some(exec_call_e);
    handlers[OpCode::CALL_ET as usize] = Some(exec_call_e);
    handlers[OpCode::CALL_EDT as usize] = Some(exec_call_e);
    handlers[OpCode::THROW as usize] = Some(exec_throw);
    handlers[OpCode::THROWIFNOT as usize] = Some(exec_throwifnot);
}

fn exec_nop(_engine: &mut ExecutionEngine, _ins: &Instruction) -> VmResult<bool> {
    Ok(false)
}

fn exec_jmp_all(engine: &mut ExecutionEngine, ins: &Instruction) -> VmResult<bool> {
    let mut condition = true;
    if ins.opcode != OpCode::JMP {
        let v = engine.pop()?.as_bool();
        condition = if ins.opcode == OpCode::JMPIFNOT { !v } else { v };
    }
    if !condition {
        return Ok(false); // fall through to the normal +size advance (3 bytes)
    }
    let ip = engine.current_context().unwrap().instruction_pointer();
    let target = ip as i64 + ins.token_i16() as i64;
    let script_len = engine.current_context().unwrap().script().len() as i64;
    if target < 0 || target > script_len {
        return Err(VmError::InvalidJump);
    }
    engine.current_context_mut().unwrap().set_instruction_pointer(target as usize);
    Ok(true)
}

fn exec_call(engine: &mut ExecutionEngine, ins: &Instruction) -> VmResult<bool> {
    if !engine.check_max_invocation_stack() {
        return Err(VmError::CallExceedMaxInvocationStackSize);
    }
    let caller_ip = engine.current_context().unwrap().instruction_pointer();
    let target = caller_ip as i64 + ins.token_i16() as i64;
    let script_len = engine.current_context().unwrap().script().len() as i64;
    if target < 0 || target > script_len {
        return Err(VmError::InvalidJump);
    }

    let mut callee = engine.clone_current_context_for_call(-1);
    callee.set_instruction_pointer(target as usize);

    engine
        .current_context()
        .unwrap()
        .evaluation_stack()
        .copy_to(callee.evaluation_stack_mut(), None)?;
    engine.current_context_mut().unwrap().evaluation_stack_mut().clear();

    // Advance the caller past this CALL before the callee takes over, so RET
    // resumes execution after it instead of re-entering the same CALL.
    engine
        .current_context_mut()
        .unwrap()
        .set_instruction_pointer(caller_ip + ins.size);

    engine.push_context(callee);
    Ok(true)
}

fn exec_ret(engine: &mut ExecutionEngine, _ins: &Instruction) -> VmResult<bool> {
    let popped = engine.pop_context().expect("RET with empty invocation stack");
    let mut rvcount = popped.rvcount();
    if rvcount == -1 {
        rvcount = popped.evaluation_stack().count() as i32;
    }

    if rvcount > 0 {
        if (popped.evaluation_stack().count() as i32) < rvcount {
            return Err(VmError::InsufficientReturnValues);
        }
        if engine.invocation_stack_len() == 0 {
            for i in (0..rvcount as usize).rev() {
                let item = popped.evaluation_stack().peek(i)?;
                engine.push_result(item)?;
            }
        } else {
            let dest_ctx = engine.current_context_mut().unwrap();
            popped
                .evaluation_stack()
                .copy_to(dest_ctx.evaluation_stack_mut(), Some(rvcount as usize))?;
        }
    }

    if popped.rvcount() == -1 && engine.invocation_stack_len() > 0 {
        let dest_ctx = engine.current_context_mut().unwrap();
        popped.alt_stack().copy_to(dest_ctx.alt_stack_mut(), None)?;
    }

    engine.halt_if_invocation_stack_empty();
    Ok(true)
}

fn exec_app_tail_call(engine: &mut ExecutionEngine, ins: &Instruction) -> VmResult<bool> {
    if ins.opcode == OpCode::APPCALL && !engine.check_max_invocation_stack() {
        return Err(VmError::AppCallExceedMaxInvocationStackSize);
    }

    let mut hash_bytes = ins.operand.clone();
    let is_dynamic = hash_bytes.iter().all(|&b| b == 0);
    if is_dynamic {
        hash_bytes = engine.pop()?.as_bytes()?;
    }
    if hash_bytes.len() != 20 {
        return Err(VmError::InvalidContract(hex::encode(&hash_bytes)));
    }
    let mut hash = [0u8; 20];
    hash.copy_from_slice(&hash_bytes);

    // Advance the caller past this instruction before the callee is pushed;
    // the callee itself starts at instruction pointer 0 of its own script.
    let caller_ip = engine.current_context().unwrap().instruction_pointer();
    engine
        .current_context_mut()
        .unwrap()
        .set_instruction_pointer(caller_ip + ins.size);

    engine.load_script_by_hash(&hash, -1)?;

    // Caller is now one frame below the newly pushed callee.
    engine.copy_eval_stack_frames(1, 0, None)?;

    if ins.opcode == OpCode::TAILCALL {
        engine.remove_context(1);
    } else {
        engine.clear_eval_stack_at(1);
    }
    Ok(true)
}

fn exec_syscall(engine: &mut ExecutionEngine, ins: &Instruction) -> VmResult<bool> {
    if ins.operand.len() > 252 {
        return Err(VmError::SyscallError(ins.operand.clone()));
    }
    let service = engine
        .take_interop_service()
        .ok_or(VmError::NoInteropService)?;
    // `invoke` needs `engine` mutably while the service itself is borrowed from
    // `engine`; take the service out for the duration of the call and restore
    // it afterwards so the borrow checker sees two disjoint values instead of
    // one self-referential borrow.
    let result = service.invoke(&ins.operand, engine);
    engine.restore_interop_service(service);
    let ok = result?;
    if !ok {
        return Err(VmError::SyscallError(ins.operand.clone()));
    }
    Ok(false)
}

fn exec_call_i(engine: &mut ExecutionEngine, ins: &Instruction) -> VmResult<bool> {
    if !engine.check_max_invocation_stack() {
        return Err(VmError::CallIExceedMaxInvocationStackSize);
    }
    let rvcount = ins.operand[0] as i32;
    let pcount = ins.operand[1] as usize;

    if engine.current_context().unwrap().evaluation_stack().count() < pcount {
        return Err(VmError::UnknownStackIsolation);
    }

    let caller_ip = engine.current_context().unwrap().instruction_pointer();
    let offset = ins.token_i16_at(2) as i64;
    let target = caller_ip as i64 + offset;
    let script_len = engine.current_context().unwrap().script().len() as i64;
    if target < 0 || target > script_len {
        return Err(VmError::InvalidJump);
    }

    let mut callee = engine.clone_current_context_for_call(rvcount);
    callee.set_instruction_pointer(target as usize);

    engine
        .current_context()
        .unwrap()
        .evaluation_stack()
        .copy_to(callee.evaluation_stack_mut(), Some(pcount))?;
    for _ in 0..pcount {
        engine.pop()?;
    }

    // Advance the caller past this CALL_I before the callee takes over, so
    // RET resumes execution after it instead of re-entering the same call.
    engine
        .current_context_mut()
        .unwrap()
        .set_instruction_pointer(caller_ip + ins.size);

    engine.push_context(callee);
    Ok(true)
}

fn exec_call_e(engine: &mut ExecutionEngine, ins: &Instruction) -> VmResult<bool> {
    let rvcount = ins.operand[0] as i32;
    let pcount = ins.operand[1] as usize;

    if engine.current_context().unwrap().evaluation_stack().count() < pcount {
        return Err(VmError::UnknownStackIsolation);
    }

    let is_tail = matches!(ins.opcode, OpCode::CALL_ET | OpCode::CALL_EDT);
    if is_tail {
        if engine.current_context().unwrap().rvcount() != rvcount {
            return Err(VmError::UnknownStackIsolation3);
        }
    } else if !engine.check_max_invocation_stack() {
        return Err(VmError::CallEExceedMaxInvocationStackSize);
    }

    let is_dynamic = matches!(ins.opcode, OpCode::CALL_ED | OpCode::CALL_EDT);
    let hash_bytes = if is_dynamic {
        engine.pop()?.as_bytes()?
    } else {
        ins.operand[2..22].to_vec()
    };
    if hash_bytes.len() != 20 {
        return Err(VmError::InvalidContract(hex::encode(&hash_bytes)));
    }
    let mut hash = [0u8; 20];
    hash.copy_from_slice(&hash_bytes);

    // Advance the caller past this instruction before the callee is pushed;
    // the callee itself starts at instruction pointer 0 of its own script.
    let caller_ip = engine.current_context().unwrap().instruction_pointer();
    engine
        .current_context_mut()
        .unwrap()
        .set_instruction_pointer(caller_ip + ins.size);

    engine.load_script_by_hash(&hash, rvcount)?;

    engine.copy_eval_stack_frames(1, 0, Some(pcount))?;

    if is_tail {
        engine.remove_context(1);
    } else {
        for _ in 0..pcount {
            engine
                .current_context_mut_at(1)
                .expect("caller frame present")
                .evaluation_stack_mut()
                .pop()?;
        }
    }
    Ok(true)
}

fn exec_throw(_engine: &mut ExecutionEngine, _ins: &Instruction) -> VmResult<bool> {
    Err(VmError::Throw)
}

fn exec_throwifnot(engine: &mut ExecutionEngine, _ins: &Instruction) -> VmResult<bool> {
    if !engine.pop()?.as_bool() {
        return Err(VmError::ThrowIfNot);
    }
    Ok(false)
}
