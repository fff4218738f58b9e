//! Hashing and signature-verification opcodes.
//!
//! CHECKSIG/VERIFY/CHECKMULTISIG never fault on a verification mismatch or a
//! malformed key/signature: `Crypto::verify_signature` already swallows any
//! such failure and reports `false`, so the opcode simply pushes whatever it
//! returns. Only structural errors (an empty public-key set, more signatures
//! than keys) are treated as VM faults.

use sha1::Sha1;
use sha2::{Digest, Sha256};

use crate::error::{VmError, VmResult};
use crate::execution_engine::ExecutionEngine;
use crate::instruction::Instruction;
use crate::jump_table::Handler;
use crate::op_code::OpCode;
use crate::stack_item::StackItem;

pub fn register(handlers: &mut [Option<Handler>; 256]) {
    handlers[OpCode::SHA1 as usize] = Some(exec_sha1);
    handlers[OpCode::SHA256 as usize] = Some(exec_sha256);
    handlers[OpCode::HASH160 as usize] = Some(exec_hash160);
    handlers[OpCode::HASH256 as usize] = Some(exec_hash256);
    handlers[OpCode::CHECKSIG as usize] = Some(exec_checksig);
    handlers[OpCode::VERIFY as usize] = Some(exec_verify);
    handlers[OpCode::CHECKMULTISIG as usize] = Some(exec_checkmultisig);
}

fn exec_sha1(engine: &mut ExecutionEngine, _ins: &Instruction) -> VmResult<bool> {
    let x = engine.pop()?.as_bytes()?;
    let digest = Sha1::digest(&x);
    engine.push(StackItem::from_bytes(digest.to_vec()))?;
    Ok(false)
}

fn exec_sha256(engine: &mut ExecutionEngine, _ins: &Instruction) -> VmResult<bool> {
    let x = engine.pop()?.as_bytes()?;
    let digest = Sha256::digest(&x);
    engine.push(StackItem::from_bytes(digest.to_vec()))?;
    Ok(false)
}

fn exec_hash160(engine: &mut ExecutionEngine, _ins: &Instruction) -> VmResult<bool> {
    let x = engine.pop()?.as_bytes()?;
    let hash = engine.crypto().hash160(&x);
    engine.push(StackItem::from_bytes(hash.to_vec()))?;
    Ok(false)
}

fn exec_hash256(engine: &mut ExecutionEngine, _ins: &Instruction) -> VmResult<bool> {
    let x = engine.pop()?.as_bytes()?;
    let hash = engine.crypto().hash256(&x);
    engine.push(StackItem::from_bytes(hash.to_vec()))?;
    Ok(false)
}

fn container_message(engine: &ExecutionEngine) -> Vec<u8> {
    engine.script_container().map(|c| c.get_message()).unwrap_or_default()
}

fn exec_checksig(engine: &mut ExecutionEngine, _ins: &Instruction) -> VmResult<bool> {
    let pubkey = engine.pop()?.as_bytes()?;
    let sig = engine.pop()?.as_bytes()?;
    let message = container_message(engine);
    let ok = engine.crypto().verify_signature(&message, &sig, &pubkey);
    engine.push(StackItem::from_bool(ok))?;
    Ok(false)
}

fn exec_verify(engine: &mut ExecutionEngine, _ins: &Instruction) -> VmResult<bool> {
    let pubkey = engine.pop()?.as_bytes()?;
    let sig = engine.pop()?.as_bytes()?;
    let message = engine.pop()?.as_bytes()?;
    let ok = engine.crypto().verify_signature(&message, &sig, &pubkey);
    engine.push(StackItem::from_bool(ok))?;
    Ok(false)
}

/// Pop either an Array of byte-string items, or a count followed by that
/// many individually-pushed byte-string items: both historical calling
/// conventions for CHECKMULTISIG's key/signature lists.
fn pop_multi(engine: &mut ExecutionEngine) -> VmResult<Vec<Vec<u8>>> {
    let top = engine.pop()?;
    if top.is_collection() {
        let arr = top.as_array()?;
        let items = arr.borrow().clone();
        items.iter().map(|i| i.as_bytes()).collect()
    } else {
        let n = top.to_usize()?;
        let mut v = Vec::with_capacity(n);
        for _ in 0..n {
            v.push(engine.pop()?.as_bytes()?);
        }
        Ok(v)
    }
}

fn exec_checkmultisig(engine: &mut ExecutionEngine, _ins: &Instruction) -> VmResult<bool> {
    let pubkeys = pop_multi(engine)?;
    let sigs = pop_multi(engine)?;

    if pubkeys.is_empty() {
        return Err(VmError::CheckMultisigInvalidPublicKeyCount);
    }
    if sigs.len() > pubkeys.len() {
        return Err(VmError::CheckMultisigSignatureError(sigs.len(), pubkeys.len()));
    }

    let message = container_message(engine);
    let mut sig_idx = 0usize;
    let mut key_idx = 0usize;
    let mut success = true;
    while sig_idx < sigs.len() {
        if sigs.len() - sig_idx > pubkeys.len() - key_idx {
            success = false;
            break;
        }
        if engine.crypto().verify_signature(&message, &sigs[sig_idx], &pubkeys[key_idx]) {
            sig_idx += 1;
        }
        key_idx += 1;
    }
    engine.push(StackItem::from_bool(success))?;
    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::Secp256k1Crypto;
    use crate::execution_engine::ExecutionEngine;

    #[test]
    fn checksig_with_garbage_returns_false_not_fault() {
        let mut e = ExecutionEngine::new(None, Box::new(Secp256k1Crypto), None, None, true);
        e.load_script(
            vec![
                0x01, 0xAA, // PUSHBYTES1 sig
                0x01, 0xBB, // PUSHBYTES1 pubkey
                OpCode::CHECKSIG as u8,
                OpCode::RET as u8,
            ],
            -1,
        );
        assert!(e.execute());
        assert!(!e.result_stack().peek(0).unwrap().as_bool());
    }

    #[test]
    fn checkmultisig_zero_pubkeys_faults() {
        let mut e = ExecutionEngine::new(None, Box::new(Secp256k1Crypto), None, None, true);
        e.load_script(
            vec![
                OpCode::PUSH0 as u8, // 0 pubkeys
                OpCode::PUSH0 as u8, // 0 sigs
                OpCode::CHECKMULTISIG as u8,
                OpCode::RET as u8,
            ],
            -1,
        );
        assert!(!e.execute());
        assert!(e.state().is_fault());
    }
}
