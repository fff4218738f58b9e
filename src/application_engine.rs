//! A thin refinement of `ExecutionEngine` that carries a `TriggerType`
//! alongside the usual collaborators. The VM core never branches on the
//! trigger itself: it's opaque data exposed to whatever `InteropService`
//! the host supplies.

use crate::collaborators::{Crypto, ScriptContainer, ScriptTable};
use crate::engine_limits::ExecutionEngineLimits;
use crate::error::VmResult;
use crate::execution_context::ExecutionContext;
use crate::execution_engine::{ExecutionEngine, InteropService};
use crate::random_access_stack::RandomAccessStack;
use crate::stack_item::StackItem;
use crate::vm_state::VMState;

/// Mirrors the historical `TriggerType` flags relevant to script execution;
/// flags outside this VM's concern (e.g. persisting-block triggers) are not
/// represented here since nothing in this crate branches on them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerType {
    Verification,
    Application,
}

pub struct ApplicationEngine {
    engine: ExecutionEngine,
    trigger: TriggerType,
}

impl ApplicationEngine {
    pub fn new(
        trigger: TriggerType,
        script_container: Option<Box<dyn ScriptContainer>>,
        crypto: Box<dyn Crypto>,
        script_table: Option<Box<dyn ScriptTable>>,
        interop_service: Option<Box<dyn InteropService>>,
        exit_on_error: bool,
    ) -> ApplicationEngine {
        ApplicationEngine {
            engine: ExecutionEngine::new(script_container, crypto, script_table, interop_service, exit_on_error),
            trigger,
        }
    }

    pub fn with_limits(
        trigger: TriggerType,
        script_container: Option<Box<dyn ScriptContainer>>,
        crypto: Box<dyn Crypto>,
        script_table: Option<Box<dyn ScriptTable>>,
        interop_service: Option<Box<dyn InteropService>>,
        exit_on_error: bool,
        limits: ExecutionEngineLimits,
    ) -> ApplicationEngine {
        ApplicationEngine {
            engine: ExecutionEngine::with_limits(
                script_container,
                crypto,
                script_table,
                interop_service,
                exit_on_error,
                limits,
            ),
            trigger,
        }
    }

    pub fn trigger(&self) -> TriggerType {
        self.trigger
    }

    pub fn engine(&self) -> &ExecutionEngine {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut ExecutionEngine {
        &mut self.engine
    }

    pub fn load_script(&mut self, bytes: Vec<u8>, rvcount: i32) -> &mut ExecutionContext {
        self.engine.load_script(bytes, rvcount)
    }

    pub fn execute(&mut self) -> bool {
        self.engine.execute()
    }

    pub fn state(&self) -> VMState {
        self.engine.state()
    }

    pub fn result_stack(&self) -> &RandomAccessStack {
        self.engine.result_stack()
    }

    pub fn push(&mut self, item: StackItem) -> VmResult<()> {
        self.engine.push(item)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::Secp256k1Crypto;
    use crate::op_code::OpCode;

    #[test]
    fn trigger_is_opaque_passthrough() {
        let mut app = ApplicationEngine::new(
            TriggerType::Verification,
            None,
            Box::new(Secp256k1Crypto),
            None,
            None,
            true,
        );
        assert_eq!(app.trigger(), TriggerType::Verification);
        app.load_script(vec![OpCode::PUSH1 as u8, OpCode::RET as u8], -1);
        assert!(app.execute());
        assert_eq!(app.result_stack().count(), 1);
    }
}
