//! Bitwise logic, arithmetic, and comparison opcodes.
//!
//! Bitwise AND/OR/XOR/INVERT operate on the minimal two's-complement
//! representation, sign-extending the shorter operand, matching the
//! historical dialect's BigInteger bitwise semantics rather than a
//! fixed-width machine-word one.

use num_bigint::{BigInt, Sign};
use num_traits::{Signed, Zero};

use crate::error::{VmError, VmResult};
use crate::execution_engine::ExecutionEngine;
use crate::instruction::Instruction;
use crate::jump_table::Handler;
use crate::op_code::OpCode;
use crate::stack_item::{bigint_to_bytes, bytes_to_bigint, StackItem};

pub fn register(handlers: &mut [Option<Handler>; 256]) {
    handlers[OpCode::INVERT as usize] = Some(exec_invert);
    handlers[OpCode::AND as usize] = Some(exec_and);
    handlers[OpCode::OR as usize] = Some(exec_or);
    handlers[OpCode::XOR as usize] = Some(exec_xor);
    handlers[OpCode::INC as usize] = Some(exec_inc);
    handlers[OpCode::DEC as usize] = Some(exec_dec);
    handlers[OpCode::SIGN as usize] = Some(exec_sign);
    handlers[OpCode::NEGATE as usize] = Some(exec_negate);
    handlers[OpCode::ABS as usize] = Some(exec_abs);
    handlers[OpCode::NOT as usize] = Some(exec_not);
    handlers[OpCode::NZ as usize] = Some(exec_nz);
    handlers[OpCode::ADD as usize] = Some(exec_add);
    handlers[OpCode::SUB as usize] = Some(exec_sub);
    handlers[OpCode::MUL as usize] = Some(exec_mul);
    handlers[OpCode::DIV as usize] = Some(exec_div);
    handlers[OpCode::MOD as usize] = Some(exec_mod);
    handlers[OpCode::SHL as usize] = Some(exec_shl);
    handlers[OpCode::SHR as usize] = Some(exec_shr);
    handlers[OpCode::BOOLAND as usize] = Some(exec_booland);
    handlers[OpCode::BOOLOR as usize] = Some(exec_boolor);
    handlers[OpCode::NUMEQUAL as usize] = Some(exec_numequal);
    handlers[OpCode::NUMNOTEQUAL as usize] = Some(exec_numnotequal);
    handlers[OpCode::LT as usize] = Some(exec_lt);
    handlers[OpCode::GT as usize] = Some(exec_gt);
    handlers[OpCode::LTE as usize] = Some(exec_lte);
    handlers[OpCode::GTE as usize] = Some(exec_gte);
    handlers[OpCode::MIN as usize] = Some(exec_min);
    handlers[OpCode::MAX as usize] = Some(exec_max);
    handlers[OpCode::WITHIN as usize] = Some(exec_within);
}

fn push_int_checked(engine: &mut ExecutionEngine, value: BigInt) -> VmResult<bool> {
    let limit = engine.limits().max_size_for_big_integer;
    if bigint_to_bytes(&value).len() > limit {
        return Err(VmError::BigIntegerExceedLimit(limit));
    }
    engine.push(StackItem::Integer(value))?;
    Ok(false)
}

fn sign_byte(v: &BigInt) -> u8 {
    if v.sign() == Sign::Minus {
        0xFF
    } else {
        0x00
    }
}

fn bitwise_op(a: &BigInt, b: &BigInt, f: impl Fn(u8, u8) -> u8) -> BigInt {
    let mut ab = bigint_to_bytes(a);
    let mut bb = bigint_to_bytes(b);
    let a_sign = sign_byte(a);
    let b_sign = sign_byte(b);
    let len = ab.len().max(bb.len()).max(1);
    ab.resize(len, a_sign);
    bb.resize(len, b_sign);
    let result: Vec<u8> = ab.iter().zip(bb.iter()).map(|(&x, &y)| f(x, y)).collect();
    bytes_to_bigint(&result)
}

fn exec_invert(engine: &mut ExecutionEngine, _ins: &Instruction) -> VmResult<bool> {
    let x = engine.pop()?.as_bigint()?;
    let mut bytes = bigint_to_bytes(&x);
    if bytes.is_empty() {
        bytes.push(0);
    }
    for b in bytes.iter_mut() {
        *b = !*b;
    }
    push_int_checked(engine, bytes_to_bigint(&bytes))
}

fn exec_and(engine: &mut ExecutionEngine, _ins: &Instruction) -> VmResult<bool> {
    let b = engine.pop()?.as_bigint()?;
    let a = engine.pop()?.as_bigint()?;
    push_int_checked(engine, bitwise_op(&a, &b, |x, y| x & y))
}

fn exec_or(engine: &mut ExecutionEngine, _ins: &Instruction) -> VmResult<bool> {
    let b = engine.pop()?.as_bigint()?;
    let a = engine.pop()?.as_bigint()?;
    push_int_checked(engine, bitwise_op(&a, &b, |x, y| x | y))
}

fn exec_xor(engine: &mut ExecutionEngine, _ins: &Instruction) -> VmResult<bool> {
    let b = engine.pop()?.as_bigint()?;
    let a = engine.pop()?.as_bigint()?;
    push_int_checked(engine, bitwise_op(&a, &b, |x, y| x ^ y))
}

fn exec_inc(engine: &mut ExecutionEngine, _ins: &Instruction) -> VmResult<bool> {
    let x = engine.pop()?.as_bigint()?;
    push_int_checked(engine, x + 1)
}

/// `x - 1`, enforcing the size bound against the actual result, not `x` itself.
fn exec_dec(engine: &mut ExecutionEngine, _ins: &Instruction) -> VmResult<bool> {
    let x = engine.pop()?.as_bigint()?;
    push_int_checked(engine, x - 1)
}

fn exec_sign(engine: &mut ExecutionEngine, _ins: &Instruction) -> VmResult<bool> {
    let x = engine.pop()?.as_bigint()?;
    let s: i64 = match x.sign() {
        Sign::Plus => 1,
        Sign::Minus => -1,
        Sign::NoSign => 0,
    };
    engine.push(StackItem::from_int(s))?;
    Ok(false)
}

fn exec_negate(engine: &mut ExecutionEngine, _ins: &Instruction) -> VmResult<bool> {
    let x = engine.pop()?.as_bigint()?;
    push_int_checked(engine, -x)
}

fn exec_abs(engine: &mut ExecutionEngine, _ins: &Instruction) -> VmResult<bool> {
    let x = engine.pop()?.as_bigint()?;
    push_int_checked(engine, x.abs())
}

fn exec_not(engine: &mut ExecutionEngine, _ins: &Instruction) -> VmResult<bool> {
    let x = engine.pop()?.as_bool();
    engine.push(StackItem::from_bool(!x))?;
    Ok(false)
}

/// Value inequality (`x != 0`) rather than the historical dialect's identity
/// comparison bug.
fn exec_nz(engine: &mut ExecutionEngine, _ins: &Instruction) -> VmResult<bool> {
    let x = engine.pop()?.as_bigint()?;
    engine.push(StackItem::from_bool(!x.is_zero()))?;
    Ok(false)
}

fn exec_add(engine: &mut ExecutionEngine, _ins: &Instruction) -> VmResult<bool> {
    let b = engine.pop()?.as_bigint()?;
    let a = engine.pop()?.as_bigint()?;
    push_int_checked(engine, a + b)
}

fn exec_sub(engine: &mut ExecutionEngine, _ins: &Instruction) -> VmResult<bool> {
    let b = engine.pop()?.as_bigint()?;
    let a = engine.pop()?.as_bigint()?;
    push_int_checked(engine, a - b)
}

fn exec_mul(engine: &mut ExecutionEngine, _ins: &Instruction) -> VmResult<bool> {
    let b = engine.pop()?.as_bigint()?;
    let a = engine.pop()?.as_bigint()?;
    push_int_checked(engine, a * b)
}

fn exec_div(engine: &mut ExecutionEngine, _ins: &Instruction) -> VmResult<bool> {
    let b = engine.pop()?.as_bigint()?;
    let a = engine.pop()?.as_bigint()?;
    if b.is_zero() {
        return Err(VmError::DivisionByZero);
    }
    push_int_checked(engine, a / b)
}

fn exec_mod(engine: &mut ExecutionEngine, _ins: &Instruction) -> VmResult<bool> {
    let b = engine.pop()?.as_bigint()?;
    let a = engine.pop()?.as_bigint()?;
    if b.is_zero() {
        return Err(VmError::DivisionByZero);
    }
    push_int_checked(engine, a % b)
}

fn shift_amount(engine: &ExecutionEngine, item: StackItem) -> VmResult<i64> {
    use num_traits::ToPrimitive;
    let n = item
        .as_bigint()?
        .to_i64()
        .ok_or(VmError::InvalidShift)?;
    let limits = engine.limits();
    if n < limits.min_shl_shr || n > limits.max_shl_shr {
        return Err(VmError::InvalidShift);
    }
    Ok(n)
}

fn exec_shl(engine: &mut ExecutionEngine, _ins: &Instruction) -> VmResult<bool> {
    let n_item = engine.pop()?;
    let n = shift_amount(engine, n_item)?;
    let x = engine.pop()?.as_bigint()?;
    let result = if n >= 0 { x << n as usize } else { x >> (-n) as usize };
    push_int_checked(engine, result)
}

fn exec_shr(engine: &mut ExecutionEngine, _ins: &Instruction) -> VmResult<bool> {
    let n_item = engine.pop()?;
    let n = shift_amount(engine, n_item)?;
    let x = engine.pop()?.as_bigint()?;
    let result = if n >= 0 { x >> n as usize } else { x << (-n) as usize };
    push_int_checked(engine, result)
}

fn exec_booland(engine: &mut ExecutionEngine, _ins: &Instruction) -> VmResult<bool> {
    let b = engine.pop()?.as_bool();
    let a = engine.pop()?.as_bool();
    engine.push(StackItem::from_bool(a && b))?;
    Ok(false)
}

fn exec_boolor(engine: &mut ExecutionEngine, _ins: &Instruction) -> VmResult<bool> {
    let b = engine.pop()?.as_bool();
    let a = engine.pop()?.as_bool();
    engine.push(StackItem::from_bool(a || b))?;
    Ok(false)
}

fn exec_numequal(engine: &mut ExecutionEngine, _ins: &Instruction) -> VmResult<bool> {
    let b = engine.pop()?.as_bigint()?;
    let a = engine.pop()?.as_bigint()?;
    engine.push(StackItem::from_bool(a == b))?;
    Ok(false)
}

fn exec_numnotequal(engine: &mut ExecutionEngine, _ins: &Instruction) -> VmResult<bool> {
    let b = engine.pop()?.as_bigint()?;
    let a = engine.pop()?.as_bigint()?;
    engine.push(StackItem::from_bool(a != b))?;
    Ok(false)
}

fn exec_lt(engine: &mut ExecutionEngine, _ins: &Instruction) -> VmResult<bool> {
    let b = engine.pop()?.as_bigint()?;
    let a = engine.pop()?.as_bigint()?;
    engine.push(StackItem::from_bool(a < b))?;
    Ok(false)
}

fn exec_gt(engine: &mut ExecutionEngine, _ins: &Instruction) -> VmResult<bool> {
    let b = engine.pop()?.as_bigint()?;
    let a = engine.pop()?.as_bigint()?;
    engine.push(StackItem::from_bool(a > b))?;
    Ok(false)
}

fn exec_lte(engine: &mut ExecutionEngine, _ins: &Instruction) -> VmResult<bool> {
    let b = engine.pop()?.as_bigint()?;
    let a = engine.pop()?.as_bigint()?;
    engine.push(StackItem::from_bool(a <= b))?;
    Ok(false)
}

fn exec_gte(engine: &mut ExecutionEngine, _ins: &Instruction) -> VmResult<bool> {
    let b = engine.pop()?.as_bigint()?;
    let a = engine.pop()?.as_bigint()?;
    engine.push(StackItem::from_bool(a >= b))?;
    Ok(false)
}

fn exec_min(engine: &mut ExecutionEngine, _ins: &Instruction) -> VmResult<bool> {
    let b = engine.pop()?.as_bigint()?;
    let a = engine.pop()?.as_bigint()?;
    push_int_checked(engine, if a < b { a } else { b })
}

fn exec_max(engine: &mut ExecutionEngine, _ins: &Instruction) -> VmResult<bool> {
    let b = engine.pop()?.as_bigint()?;
    let a = engine.pop()?.as_bigint()?;
    push_int_checked(engine, if a > b { a } else { b })
}

fn exec_within(engine: &mut ExecutionEngine, _ins: &Instruction) -> VmResult<bool> {
    let max = engine.pop()?.as_bigint()?;
    let min = engine.pop()?.as_bigint()?;
    let x = engine.pop()?.as_bigint()?;
    engine.push(StackItem::from_bool(min <= x && x < max))?;
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
    fn dec_checks_actual_result_size() {
        let mut e = engine_with(vec![OpCode::PUSH1 as u8, OpCode::DEC as u8, OpCode::RET as u8]);
        assert!(e.execute());
        assert_eq!(e.result_stack().peek(0).unwrap().as_bigint().unwrap(), 0.into());
    }

    #[test]
    fn nz_is_value_inequality() {
        let mut e = engine_with(vec![OpCode::PUSH0 as u8, OpCode::NZ as u8, OpCode::RET as u8]);
        assert!(e.execute());
        assert!(!e.result_stack().peek(0).unwrap().as_bool());
    }

    #[test]
    fn div_by_zero_faults() {
        let mut e = engine_with(vec![
            OpCode::PUSH1 as u8,
            OpCode::PUSH0 as u8,
            OpCode::DIV as u8,
            OpCode::RET as u8,
        ]);
        assert!(!e.execute());
        assert!(e.state().is_fault());
    }

    #[test]
    fn within_is_half_open() {
        let mut e = engine_with(vec![
            OpCode::PUSH5 as u8,
            OpCode::PUSH1 as u8,
            OpCode::PUSH5 as u8,
            OpCode::WITHIN as u8,
            OpCode::RET as u8,
        ]);
        assert!(e.execute());
        assert!(!e.result_stack().peek(0).unwrap().as_bool());
    }
}
