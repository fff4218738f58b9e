//! Resource bounds, overridable by an embedding host or a test harness.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutionEngineLimits {
    pub max_size_for_big_integer: usize,
    pub max_item_size: usize,
    pub max_array_size: usize,
    pub max_invocation_stack_size: usize,
    pub max_stack_size: usize,
    pub max_shl_shr: i64,
    pub min_shl_shr: i64,
}

impl Default for ExecutionEngineLimits {
    fn default() -> Self {
        ExecutionEngineLimits {
            max_size_for_big_integer: 32,
            max_item_size: 1024 * 1024,
            max_array_size: 1024,
            max_invocation_stack_size: 1024,
            max_stack_size: 2048,
            max_shl_shr: 256,
            min_shl_shr: -256,
        }
    }
}
