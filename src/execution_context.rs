//! One active invocation of a Script: its own instruction pointer,
//! evaluation stack, and alt stack.

use std::collections::HashMap;
use std::rc::Rc;

use crate::error::VmError;
use crate::instruction::Instruction;
use crate::random_access_stack::{RandomAccessStack, StackAccounting};
use crate::script::Script;

pub struct ExecutionContext {
    script: Rc<Script>,
    instruction_pointer: usize,
    evaluation_stack: RandomAccessStack,
    alt_stack: RandomAccessStack,
    /// -1 means "all remaining items on return".
    rvcount: i32,
    instruction_cache: HashMap<usize, Instruction>,
}

impl ExecutionContext {
    pub fn new(script: Rc<Script>, rvcount: i32, accounting: StackAccounting) -> ExecutionContext {
        ExecutionContext {
            script,
            instruction_pointer: 0,
            evaluation_stack: RandomAccessStack::new(accounting.clone()),
            alt_stack: RandomAccessStack::new(accounting),
            rvcount,
            instruction_cache: HashMap::new(),
        }
    }

    /// A fresh frame over the *same* Script, used by local CALL.
    pub fn clone_for_call(&self, rvcount: i32, accounting: StackAccounting) -> ExecutionContext {
        ExecutionContext::new(self.script.clone(), rvcount, accounting)
    }

    pub fn script(&self) -> &Rc<Script> {
        &self.script
    }

    pub fn script_hash(&self) -> [u8; crate::script::HASH160_LEN] {
        self.script.script_hash()
    }

    pub fn instruction_pointer(&self) -> usize {
        self.instruction_pointer
    }

    pub fn set_instruction_pointer(&mut self, ip: usize) {
        self.instruction_pointer = ip;
    }

    pub fn rvcount(&self) -> i32 {
        self.rvcount
    }

    pub fn evaluation_stack(&self) -> &RandomAccessStack {
        &self.evaluation_stack
    }

    pub fn evaluation_stack_mut(&mut self) -> &mut RandomAccessStack {
        &mut self.evaluation_stack
    }

    pub fn alt_stack(&self) -> &RandomAccessStack {
        &self.alt_stack
    }

    pub fn alt_stack_mut(&mut self) -> &mut RandomAccessStack {
        &mut self.alt_stack
    }

    /// Decode (and memoize) the instruction at `ip`. Past end-of-script
    /// synthesizes a virtual RET rather than faulting.
    pub fn instruction_at(&mut self, ip: usize) -> Result<Instruction, VmError> {
        if let Some(ins) = self.instruction_cache.get(&ip) {
            return Ok(ins.clone());
        }
        let ins = Instruction::parse(self.script.bytes(), ip)?;
        self.instruction_cache.insert(ip, ins.clone());
        Ok(ins)
    }

    pub fn current_instruction(&mut self) -> Result<Instruction, VmError> {
        self.instruction_at(self.instruction_pointer)
    }
}
