//! The interpreter loop: opcode dispatch, invocation stack, result stack,
//! resource limits, and fault reporting.

use std::rc::Rc;

use crate::collaborators::{Crypto, ScriptContainer, ScriptTable};
use crate::engine_limits::ExecutionEngineLimits;
use crate::error::{VmError, VmResult};
use crate::execution_context::ExecutionContext;
use crate::instruction::Instruction;
use crate::jump_table::JumpTable;
use crate::random_access_stack::{RandomAccessStack, StackAccounting};
use crate::script::Script;
use crate::stack_item::StackItem;
use crate::vm_state::VMState;

/// `Invoke(name, engine) -> bool`; a service mutates the current context's
/// evaluation stack directly rather than returning a value.
pub trait InteropService {
    fn invoke(&self, name: &[u8], engine: &mut ExecutionEngine) -> VmResult<bool>;
}

/// Host-visible veto points bracketing each step. Either may abort the
/// instruction by returning `false`, which faults the engine, without
/// otherwise influencing dispatch. Default implementations never veto.
pub trait ExecutionHooks {
    fn pre_execute(&self, _engine: &mut ExecutionEngine, _instruction: &Instruction) -> bool {
        true
    }

    fn post_execute(&self, _engine: &mut ExecutionEngine, _instruction: &Instruction) -> bool {
        true
    }
}

pub struct ExecutionEngine {
    state: VMState,
    limits: ExecutionEngineLimits,
    accounting: StackAccounting,
    jump_table: Rc<JumpTable>,

    invocation_stack: Vec<ExecutionContext>,
    result_stack: RandomAccessStack,
    executed_script_hashes: Vec<[u8; 20]>,
    ops_processed: u64,

    crypto: Box<dyn Crypto>,
    script_container: Option<Box<dyn ScriptContainer>>,
    script_table: Option<Box<dyn ScriptTable>>,
    interop_service: Option<Box<dyn InteropService>>,
    hooks: Option<Box<dyn ExecutionHooks>>,

    exit_on_error: bool,
}

impl ExecutionEngine {
    pub fn new(
        script_container: Option<Box<dyn ScriptContainer>>,
        crypto: Box<dyn Crypto>,
        script_table: Option<Box<dyn ScriptTable>>,
        interop_service: Option<Box<dyn InteropService>>,
        exit_on_error: bool,
    ) -> ExecutionEngine {
        Self::with_limits(
            script_container,
            crypto,
            script_table,
            interop_service,
            exit_on_error,
            ExecutionEngineLimits::default(),
        )
    }

    pub fn with_limits(
        script_container: Option<Box<dyn ScriptContainer>>,
        crypto: Box<dyn Crypto>,
        script_table: Option<Box<dyn ScriptTable>>,
        interop_service: Option<Box<dyn InteropService>>,
        exit_on_error: bool,
        limits: ExecutionEngineLimits,
    ) -> ExecutionEngine {
        let accounting = StackAccounting::new(limits.max_stack_size);
        ExecutionEngine {
            state: VMState::BREAK,
            limits,
            accounting: accounting.clone(),
            jump_table: Rc::new(JumpTable::new()),
            invocation_stack: Vec::new(),
            result_stack: RandomAccessStack::new(accounting),
            executed_script_hashes: Vec::new(),
            ops_processed: 0,
            crypto,
            script_container,
            script_table,
            interop_service,
            hooks: None,
            exit_on_error,
        }
    }

    pub fn set_hooks(&mut self, hooks: Box<dyn ExecutionHooks>) {
        self.hooks = Some(hooks);
    }

    pub fn limits(&self) -> &ExecutionEngineLimits {
        &self.limits
    }

    pub fn crypto(&self) -> &dyn Crypto {
        self.crypto.as_ref()
    }

    pub fn script_container(&self) -> Option<&dyn ScriptContainer> {
        self.script_container.as_deref()
    }

    pub fn state(&self) -> VMState {
        self.state
    }

    fn set_state(&mut self, state: VMState) {
        self.state = state;
    }

    pub fn result_stack(&self) -> &RandomAccessStack {
        &self.result_stack
    }

    pub fn invocation_stack_len(&self) -> usize {
        self.invocation_stack.len()
    }

    pub fn executed_script_hashes(&self) -> &[[u8; 20]] {
        &self.executed_script_hashes
    }

    pub fn current_context(&self) -> Option<&ExecutionContext> {
        self.invocation_stack.last()
    }

    pub fn current_context_mut(&mut self) -> Option<&mut ExecutionContext> {
        self.invocation_stack.last_mut()
    }

    pub fn calling_context(&self) -> Option<&ExecutionContext> {
        if self.invocation_stack.len() > 1 {
            self.invocation_stack.get(self.invocation_stack.len() - 2)
        } else {
            None
        }
    }

    pub fn entry_context(&self) -> Option<&ExecutionContext> {
        self.invocation_stack.first()
    }

    pub fn check_max_invocation_stack(&self) -> bool {
        self.invocation_stack.len() < self.limits.max_invocation_stack_size
    }

    pub fn load_script(&mut self, bytes: Vec<u8>, rvcount: i32) -> &mut ExecutionContext {
        let script = Rc::new(Script::new(bytes));
        self.load_script_internal(script, rvcount)
    }

    fn load_script_internal(&mut self, script: Rc<Script>, rvcount: i32) -> &mut ExecutionContext {
        let hash = script.script_hash();
        let ctx = ExecutionContext::new(script, rvcount, self.accounting.clone());
        self.invocation_stack.push(ctx);
        self.executed_script_hashes.push(hash);
        self.invocation_stack.last_mut().unwrap()
    }

    pub fn load_script_by_hash(&mut self, hash: &[u8; 20], rvcount: i32) -> VmResult<()> {
        let table = self
            .script_table
            .as_ref()
            .ok_or_else(|| VmError::InvalidContract(hex::encode(hash)))?;
        let bytes = table
            .get_script(hash)
            .ok_or_else(|| VmError::InvalidContract(hex::encode(hash)))?;
        self.load_script_internal(Rc::new(Script::new(bytes)), rvcount);
        Ok(())
    }

    /// Run to completion. Returns `true` iff the engine did not FAULT.
    pub fn execute(&mut self) -> bool {
        self.state.remove(VMState::BREAK);
        while !self.state.is_halt() && !self.state.is_fault() {
            self.execute_next();
        }
        !self.state.is_fault()
    }

    pub fn execute_next(&mut self) {
        if self.invocation_stack.is_empty() {
            self.set_state(VMState::HALT);
            return;
        }
        self.ops_processed += 1;

        let jump_table = self.jump_table.clone();
        let instruction = match self
            .current_context_mut()
            .unwrap()
            .current_instruction()
        {
            Ok(ins) => ins,
            Err(e) => {
                self.fault(e);
                return;
            }
        };

        log::trace!("({}) {:?} ip={}", self.ops_processed, instruction.opcode, self.current_context().unwrap().instruction_pointer());

        let hooks = self.hooks.take();
        let pre_ok = hooks.as_deref().map_or(true, |h| h.pre_execute(self, &instruction));
        self.hooks = hooks;
        if !pre_ok {
            self.fault(VmError::VetoedByHost);
            return;
        }

        match jump_table.execute(self, &instruction) {
            Ok(branched) => {
                if self.state.is_fault() {
                    return;
                }
                if self.state.is_halt() {
                    return;
                }

                let hooks = self.hooks.take();
                let post_ok = hooks.as_deref().map_or(true, |h| h.post_execute(self, &instruction));
                self.hooks = hooks;
                if !post_ok {
                    self.fault(VmError::VetoedByHost);
                    return;
                }

                if !branched {
                    if let Some(ctx) = self.current_context_mut() {
                        let next = ctx.instruction_pointer() + instruction.size;
                        ctx.set_instruction_pointer(next);
                    }
                }
            }
            Err(e) => self.fault(e),
        }
    }

    pub fn fault(&mut self, err: VmError) {
        log::debug!("({}) VM FAULT: {} [{}]", self.ops_processed, err, err.code());
        self.set_state(VMState::FAULT);
    }

    // -- convenience accessors used heavily by opcode handlers --

    pub fn push(&mut self, item: StackItem) -> VmResult<()> {
        self.current_context_mut()
            .expect("push with no active context")
            .evaluation_stack_mut()
            .push(item)
    }

    pub fn pop(&mut self) -> VmResult<StackItem> {
        self.current_context_mut()
            .expect("pop with no active context")
            .evaluation_stack_mut()
            .pop()
    }

    pub fn peek(&mut self, n: usize) -> VmResult<StackItem> {
        self.current_context()
            .expect("peek with no active context")
            .evaluation_stack()
            .peek(n)
    }

    pub fn halt_if_invocation_stack_empty(&mut self) {
        if self.invocation_stack.is_empty() {
            self.set_state(VMState::HALT);
        }
    }

    pub fn pop_context(&mut self) -> Option<ExecutionContext> {
        self.invocation_stack.pop()
    }

    pub fn push_context(&mut self, ctx: ExecutionContext) {
        self.invocation_stack.push(ctx);
    }

    pub fn remove_context(&mut self, index_from_top: usize) -> Option<ExecutionContext> {
        let len = self.invocation_stack.len();
        if index_from_top >= len {
            return None;
        }
        Some(self.invocation_stack.remove(len - 1 - index_from_top))
    }

    /// A fresh frame over the current top frame's Script (local CALL/CALL_I).
    pub fn clone_current_context_for_call(&self, rvcount: i32) -> ExecutionContext {
        let script = self.current_context().expect("no active context").script().clone();
        ExecutionContext::new(script, rvcount, self.accounting.clone())
    }

    pub fn push_result(&mut self, item: StackItem) -> VmResult<()> {
        self.result_stack.push(item)
    }

    pub fn current_context_mut_at(&mut self, index_from_top: usize) -> Option<&mut ExecutionContext> {
        let len = self.invocation_stack.len();
        if index_from_top >= len {
            return None;
        }
        self.invocation_stack.get_mut(len - 1 - index_from_top)
    }

    /// Copy the top `count` (or all) evaluation-stack items of the frame at
    /// `source_index_from_top` into the frame at `dest_index_from_top`.
    /// Used by APPCALL/TAILCALL/CALL_E, where both frames already live in
    /// `invocation_stack` (the callee was just pushed by `load_script_by_hash`).
    pub fn copy_eval_stack_frames(
        &mut self,
        source_index_from_top: usize,
        dest_index_from_top: usize,
        count: Option<usize>,
    ) -> VmResult<()> {
        let len = self.invocation_stack.len();
        let src = len - 1 - source_index_from_top;
        let dst = len - 1 - dest_index_from_top;
        if src == dst {
            return Ok(());
        }
        if src < dst {
            let (left, right) = self.invocation_stack.split_at_mut(dst);
            left[src].evaluation_stack().copy_to(right[0].evaluation_stack_mut(), count)
        } else {
            let (left, right) = self.invocation_stack.split_at_mut(src);
            right[0].evaluation_stack().copy_to(left[dst].evaluation_stack_mut(), count)
        }
    }

    pub fn clear_eval_stack_at(&mut self, index_from_top: usize) {
        if let Some(ctx) = self.current_context_mut_at(index_from_top) {
            ctx.evaluation_stack_mut().clear();
        }
    }

    pub fn new_accounting_stack(&self) -> RandomAccessStack {
        RandomAccessStack::new(self.accounting.clone())
    }

    pub fn interop_service(&self) -> Option<&dyn InteropService> {
        self.interop_service.as_deref()
    }

    pub(crate) fn take_interop_service(&mut self) -> Option<Box<dyn InteropService>> {
        self.interop_service.take()
    }

    pub(crate) fn restore_interop_service(&mut self, service: Box<dyn InteropService>) {
        self.interop_service = Some(service);
    }

    pub fn exit_on_error(&self) -> bool {
        self.exit_on_error
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::Secp256k1Crypto;

    fn engine() -> ExecutionEngine {
        ExecutionEngine::new(None, Box::new(Secp256k1Crypto), None, None, true)
    }

    #[test]
    fn empty_invocation_stack_halts() {
        let mut e = engine();
        e.execute_next();
        assert!(e.state().is_halt());
    }

    #[test]
    fn arith_script_halts_with_result() {
        use crate::op_code::OpCode;
        let mut e = engine();
        let script = vec![
            OpCode::PUSH3 as u8,
            OpCode::PUSH5 as u8,
            OpCode::ADD as u8,
            OpCode::RET as u8,
        ];
        e.load_script(script, -1);
        assert!(e.execute());
        assert_eq!(e.result_stack().count(), 1);
        assert_eq!(e.result_stack().peek(0).unwrap().as_bigint().unwrap(), 8.into());
    }
}
