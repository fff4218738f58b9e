//! End-to-end scenarios and cross-module invariants, run against the public
//! `ExecutionEngine` API rather than against individual opcode handlers.

use neo_legacy_vm::{
    Crypto, ExecutionEngine, OpCode, ScriptContainer, ScriptTable, Secp256k1Crypto, VmError,
};

fn engine() -> ExecutionEngine {
    ExecutionEngine::new(None, Box::new(Secp256k1Crypto), None, None, true)
}

fn op(code: OpCode) -> u8 {
    code as u8
}

#[test]
fn scenario_arith() {
    let mut e = engine();
    e.load_script(
        vec![op(OpCode::PUSH3), op(OpCode::PUSH5), op(OpCode::ADD), op(OpCode::RET)],
        -1,
    );
    assert!(e.execute());
    assert!(e.state().is_halt());
    assert_eq!(e.result_stack().count(), 1);
    assert_eq!(e.result_stack().peek(0).unwrap().as_bigint().unwrap(), 8.into());
}

#[test]
fn scenario_branch() {
    // PUSH1 JMPIF <+5> PUSH7 RET PUSH9 RET -> condition is true, so the jump
    // is taken and PUSH7/RET are skipped; result is [9].
    let mut e = engine();
    let script = vec![
        op(OpCode::PUSH1),
        op(OpCode::JMPIF),
        0x05,
        0x00,
        op(OpCode::PUSH7),
        op(OpCode::RET),
        op(OpCode::PUSH9),
        op(OpCode::RET),
    ];
    e.load_script(script, -1);
    assert!(e.execute());
    assert!(e.state().is_halt());
    assert_eq!(e.result_stack().peek(0).unwrap().as_bigint().unwrap(), 9.into());
}

#[test]
fn scenario_guard_oversized_bytearray_faults() {
    let mut e = engine();
    let payload = vec![0u8; 1024 * 1024 + 1];
    let mut script = vec![op(OpCode::PUSHDATA4)];
    script.extend_from_slice(&(payload.len() as u32).to_le_bytes());
    script.extend_from_slice(&payload);
    script.push(op(OpCode::RET));
    e.load_script(script, -1);
    assert!(!e.execute());
    assert!(e.state().is_fault());
}

#[test]
fn scenario_bigint_overflow_faults() {
    // A 33-byte positive integer (top byte 0x01, not sign padding) already
    // needs more than the 32-byte limit; ADD 1 keeps it oversized.
    let mut e = engine();
    let mut huge = vec![0u8; 32];
    huge.push(0x01);
    let mut script = vec![op(OpCode::PUSHDATA1), huge.len() as u8];
    script.extend_from_slice(&huge);
    script.push(op(OpCode::PUSH1));
    script.push(op(OpCode::ADD));
    script.push(op(OpCode::RET));
    e.load_script(script, -1);
    assert!(!e.execute());
    assert!(e.state().is_fault());
}

#[test]
fn scenario_map_ops() {
    // NEWMAP DUP PUSH"k" PUSH42 SETITEM PUSH"k" PICKITEM RET
    //
    // SETITEM pops its container argument (classic pop-based semantics), so
    // the map reference must be duplicated beforehand to survive for the
    // later PICKITEM; see DESIGN.md's note on this scenario's op ordering.
    //
    // PUSH42 has no dedicated constant opcode (the ladder tops out at
    // PUSH16), so the key and the value are both pushed as PUSHBYTES1
    // operands; integer ops read a ByteArray the same way.
    let mut e = engine();
    let script = vec![
        op(OpCode::NEWMAP),
        op(OpCode::DUP),
        0x01,
        b'k',
        0x01,
        42u8,
        op(OpCode::SETITEM),
        0x01,
        b'k',
        op(OpCode::PICKITEM),
        op(OpCode::RET),
    ];
    e.load_script(script, -1);
    assert!(e.execute());
    assert_eq!(e.result_stack().peek(0).unwrap().as_bigint().unwrap(), 42.into());
}

struct FixedContainer(Vec<u8>);

impl ScriptContainer for FixedContainer {
    fn get_message(&self) -> Vec<u8> {
        self.0.clone()
    }
}

fn compact_sig(secp: &secp256k1::Secp256k1<secp256k1::All>, sk: &secp256k1::SecretKey, message: &[u8]) -> Vec<u8> {
    let hash = Secp256k1Crypto.hash256(message);
    let msg = secp256k1::Message::from_digest_slice(&hash).unwrap();
    secp.sign_ecdsa(&msg, sk).serialize_compact().to_vec()
}

#[test]
fn scenario_checkmultisig_2_of_3() {
    let secp = secp256k1::Secp256k1::new();
    let sk1 = secp256k1::SecretKey::from_slice(&[1u8; 32]).unwrap();
    let sk2 = secp256k1::SecretKey::from_slice(&[2u8; 32]).unwrap();
    let sk3 = secp256k1::SecretKey::from_slice(&[3u8; 32]).unwrap();
    let pk1 = secp256k1::PublicKey::from_secret_key(&secp, &sk1).serialize().to_vec();
    let pk2 = secp256k1::PublicKey::from_secret_key(&secp, &sk2).serialize().to_vec();
    let pk3 = secp256k1::PublicKey::from_secret_key(&secp, &sk3).serialize().to_vec();

    let message = b"multisig test message".to_vec();
    let sig1 = compact_sig(&secp, &sk1, &message);
    let sig3 = compact_sig(&secp, &sk3, &message);

    let push_bytes = |script: &mut Vec<u8>, bytes: &[u8]| {
        assert!(bytes.len() <= 75);
        script.push(bytes.len() as u8);
        script.extend_from_slice(bytes);
    };

    let build = |sig_a: &[u8], sig_b: &[u8]| -> Vec<u8> {
        let mut script = Vec::new();
        // sigs: pushed sig1 then sig3 so pop_multi (which reverses) yields
        // [sig3, sig1], matching pubkeys popped in [pk3, pk2, pk1] order.
        push_bytes(&mut script, sig_a);
        push_bytes(&mut script, sig_b);
        script.push(op(OpCode::PUSH2));
        push_bytes(&mut script, &pk1);
        push_bytes(&mut script, &pk2);
        push_bytes(&mut script, &pk3);
        script.push(op(OpCode::PUSH3));
        script.push(op(OpCode::CHECKMULTISIG));
        script.push(op(OpCode::RET));
        script
    };

    let mut e = ExecutionEngine::new(
        Some(Box::new(FixedContainer(message.clone()))),
        Box::new(Secp256k1Crypto),
        None,
        None,
        true,
    );
    e.load_script(build(&sig1, &sig3), -1);
    assert!(e.execute());
    assert!(e.result_stack().peek(0).unwrap().as_bool());

    let garbage = vec![0xAB; sig1.len()];
    let mut e2 = ExecutionEngine::new(
        Some(Box::new(FixedContainer(message))),
        Box::new(Secp256k1Crypto),
        None,
        None,
        true,
    );
    e2.load_script(build(&garbage, &sig3), -1);
    assert!(e2.execute());
    assert!(!e2.result_stack().peek(0).unwrap().as_bool());
}

struct LoopTable {
    hash: [u8; 20],
    script: Vec<u8>,
}

impl ScriptTable for LoopTable {
    fn get_script(&self, hash: &[u8; 20]) -> Option<Vec<u8>> {
        if *hash == self.hash {
            Some(self.script.clone())
        } else {
            None
        }
    }
}

#[test]
fn scenario_call_returns_and_resumes_caller() {
    // PUSH5 CALL <+5> PUSH9 RET [subroutine: PUSH2 ADD RET]
    //
    // The subroutine adds 2 to the caller's pushed 5 and returns; the caller
    // must then resume after the CALL (not re-enter it) and push 9.
    let script = vec![
        op(OpCode::PUSH5),
        op(OpCode::CALL),
        0x05,
        0x00,
        op(OpCode::PUSH9),
        op(OpCode::RET),
        op(OpCode::PUSH2),
        op(OpCode::ADD),
        op(OpCode::RET),
    ];
    let mut e = engine();
    e.load_script(script, -1);
    assert!(e.execute());
    assert!(e.state().is_halt());
    assert_eq!(e.result_stack().count(), 2);
    assert_eq!(e.result_stack().peek(0).unwrap().as_bigint().unwrap(), 9.into());
    assert_eq!(e.result_stack().peek(1).unwrap().as_bigint().unwrap(), 7.into());
}

#[test]
fn scenario_appcall_recursion_exceeds_invocation_stack() {
    let hash = [0xABu8; 20];
    let mut script = vec![op(OpCode::APPCALL)];
    script.extend_from_slice(&hash);
    script.push(op(OpCode::RET));

    let mut e = ExecutionEngine::new(
        None,
        Box::new(Secp256k1Crypto),
        Some(Box::new(LoopTable { hash, script: script.clone() })),
        None,
        true,
    );
    e.load_script(script, -1);
    assert!(!e.execute());
    assert!(e.state().is_fault());
}

#[test]
fn invariant_pack_then_unpack_roundtrip() {
    let mut e = engine();
    let script = vec![
        op(OpCode::PUSH1),
        op(OpCode::PUSH2),
        op(OpCode::PUSH3),
        op(OpCode::PUSH3), // count for PACK
        op(OpCode::PACK),
        op(OpCode::UNPACK),
        op(OpCode::RET),
    ];
    e.load_script(script, -1);
    assert!(e.execute());
    // UNPACK leaves [item0, item1, item2, count] on the stack (top = count).
    assert_eq!(e.result_stack().count(), 4);
    assert_eq!(e.result_stack().peek(0).unwrap().as_bigint().unwrap(), 3.into());
}

#[test]
fn invariant_stack_size_limit_faults_end_to_end() {
    // Push more single-item scalars than maxStackSize allows.
    let limits = neo_legacy_vm::ExecutionEngineLimits {
        max_stack_size: 4,
        ..Default::default()
    };
    let mut e =
        ExecutionEngine::with_limits(None, Box::new(Secp256k1Crypto), None, None, true, limits);
    let mut script = Vec::new();
    for _ in 0..6 {
        script.push(op(OpCode::PUSH1));
    }
    script.push(op(OpCode::RET));
    e.load_script(script, -1);
    assert!(!e.execute());
    assert!(e.state().is_fault());
}

#[test]
fn invalid_jump_target_faults() {
    let mut e = engine();
    let script = vec![op(OpCode::JMP), 0x7F, 0x7F]; // wildly out of range offset
    e.load_script(script, -1);
    assert!(!e.execute());
    match e.state() {
        s if s.is_fault() => {}
        _ => panic!("expected FAULT"),
    }
}

#[test]
fn vmerror_code_is_stable() {
    assert_eq!(VmError::InvalidJump.code(), "INVALID_JUMP");
    assert_eq!(VmError::DivisionByZero.code(), "DIVISION_BY_ZERO");
}
