//! Stack-based bytecode virtual machine for the legacy NEO/AntShares smart
//! contract dialect: decode, dispatch, execute.

pub mod application_engine;
pub mod collaborators;
pub mod engine_limits;
pub mod error;
pub mod execution_context;
pub mod execution_engine;
pub mod instruction;
pub mod jump_table;
pub mod op_code;
mod ops;
pub mod random_access_stack;
pub mod script;
pub mod stack_item;
pub mod vm_state;

pub use application_engine::{ApplicationEngine, TriggerType};
pub use collaborators::{Crypto, ScriptContainer, ScriptTable, Secp256k1Crypto};
pub use engine_limits::ExecutionEngineLimits;
pub use error::{VmError, VmResult};
pub use execution_context::ExecutionContext;
pub use execution_engine::{ExecutionEngine, ExecutionHooks, InteropService};
pub use instruction::Instruction;
pub use op_code::OpCode;
pub use script::Script;
pub use stack_item::StackItem;
pub use vm_state::VMState;
