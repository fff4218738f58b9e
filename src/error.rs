//! The VM's single structural-failure taxonomy.
//!
//! Every fault below sets the engine's `FAULT` state bit and halts the
//! interpreter loop; none of them are caught and resumed locally. Host
//! crypto failures inside CHECKSIG/VERIFY/CHECKMULTISIG are a deliberate
//! exception to that rule and never construct a `VmError` at all: they are
//! swallowed at the call site and surface as a pushed `Boolean(false)`.

use thiserror::Error;

pub type VmResult<T> = Result<T, VmError>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum VmError {
    #[error("attempted to jump to an invalid location")]
    InvalidJump,

    #[error("unknown contract with script hash {0}")]
    InvalidContract(String),

    #[error("syscall {0:?} returned false")]
    SyscallError(Vec<u8>),

    #[error("BigInteger exceeds the {0}-byte size limit")]
    BigIntegerExceedLimit(usize),

    #[error("shift amount out of range")]
    InvalidShift,

    #[error("division or modulo by zero")]
    DivisionByZero,

    #[error("host hook vetoed the instruction")]
    VetoedByHost,

    #[error("CAT result exceeds maxItemSize")]
    CatExceedMaxItemSize,

    #[error("SUBSTR index out of range")]
    SubstrInvalidIndex,

    #[error("SUBSTR length out of range")]
    SubstrInvalidLength,

    #[error("LEFT count out of range")]
    LeftInvalidCount,

    #[error("RIGHT count out of range")]
    RightInvalidCount,

    #[error("CHECKMULTISIG public key count is less than 1")]
    CheckMultisigInvalidPublicKeyCount,

    #[error("CHECKMULTISIG requires at least {0} signatures, but only {1} public keys remain")]
    CheckMultisigSignatureError(usize, usize),

    #[error("UNPACK operand is not an Array")]
    UnpackInvalidType,

    #[error("PICKITEM target is not an Array or Map")]
    PickItemInvalidType,

    #[error("PICKITEM index is negative")]
    PickItemNegativeIndex,

    #[error("PICKITEM index {0} exceeds length {1}")]
    PickItemInvalidIndex(usize, usize),

    #[error("PICKITEM key not found in Map")]
    PickItemDictKeyNotFound,

    #[error("SETITEM target is not an Array or Map")]
    SetItemInvalidType,

    #[error("SETITEM index is negative")]
    SetItemNegativeIndex,

    #[error("SETITEM index {0} exceeds length {1}")]
    SetItemInvalidIndex(usize, usize),

    #[error("APPEND target is not an Array")]
    AppendInvalidType,

    #[error("REVERSE target is not an Array")]
    ReverseInvalidType,

    #[error("REMOVE target is not an Array or Map")]
    RemoveInvalidType,

    #[error("REMOVE index {0} out of range for length {1}")]
    RemoveInvalidIndex(i64, usize),

    #[error("Map key is itself a collection")]
    KeyIsCollection,

    #[error("Map key error")]
    DictKeyError,

    #[error("NEWARRAY/NEWSTRUCT count is negative")]
    NewArrayNegativeCount,

    #[error("NEWARRAY/NEWSTRUCT count exceeds maxArraySize")]
    NewArrayExceedArrayLimit,

    #[error("CALL would exceed the maximum invocation stack size")]
    CallExceedMaxInvocationStackSize,

    #[error("APPCALL would exceed the maximum invocation stack size")]
    AppCallExceedMaxInvocationStackSize,

    #[error("CALL_I would exceed the maximum invocation stack size")]
    CallIExceedMaxInvocationStackSize,

    #[error("CALL_E would exceed the maximum invocation stack size")]
    CallEExceedMaxInvocationStackSize,

    #[error("stack isolation call has too few parameters on the stack")]
    UnknownStackIsolation,

    #[error("CALL_E requires a script table")]
    UnknownStackIsolation2,

    #[error("tail-call RVCount does not match the caller's declared RVCount")]
    UnknownStackIsolation3,

    #[error("the global recursive stack-item total would exceed maxStackSize")]
    InvalidStackSize,

    #[error("unknown opcode 0x{0:02X}")]
    UnknownOpcode(u8),

    #[error("THROW")]
    Throw,

    #[error("THROWIFNOT")]
    ThrowIfNot,

    #[error("RET requested more items than are on the evaluation stack")]
    InsufficientReturnValues,

    #[error("no InteropService bound to this engine")]
    NoInteropService,

    #[error("malformed instruction at offset {0}: {1}")]
    MalformedInstruction(usize, String),
}

impl VmError {
    /// A short, stable identifier suitable for fault-taxonomy comparisons in
    /// tests, independent of the human-readable `Display` message.
    pub fn code(&self) -> &'static str {
        match self {
            VmError::InvalidJump => "INVALID_JUMP",
            VmError::InvalidContract(_) => "INVALID_CONTRACT",
            VmError::SyscallError(_) => "SYSCALL_ERROR",
            VmError::BigIntegerExceedLimit(_) => "BIGINTEGER_EXCEED_LIMIT",
            VmError::InvalidShift => "INVALID_SHIFT",
            VmError::DivisionByZero => "DIVISION_BY_ZERO",
            VmError::VetoedByHost => "VETOED_BY_HOST",
            VmError::CatExceedMaxItemSize => "CAT_EXCEED_MAXITEMSIZE",
            VmError::SubstrInvalidIndex => "SUBSTR_INVALID_INDEX",
            VmError::SubstrInvalidLength => "SUBSTR_INVALID_LENGTH",
            VmError::LeftInvalidCount => "LEFT_INVALID_COUNT",
            VmError::RightInvalidCount => "RIGHT_INVALID_COUNT",
            VmError::CheckMultisigInvalidPublicKeyCount => "CHECKMULTISIG_INVALID_PUBLICKEY_COUNT",
            VmError::CheckMultisigSignatureError(..) => "CHECKMULTISIG_SIGNATURE_ERROR",
            VmError::UnpackInvalidType => "UNPACK_INVALID_TYPE",
            VmError::PickItemInvalidType => "PICKITEM_INVALID_TYPE",
            VmError::PickItemNegativeIndex => "PICKITEM_NEGATIVE_INDEX",
            VmError::PickItemInvalidIndex(..) => "PICKITEM_INVALID_INDEX",
            VmError::PickItemDictKeyNotFound => "PICKITEM_DICT_KEY_NOT_FOUND",
            VmError::SetItemInvalidType => "SETITEM_INVALID_TYPE",
            VmError::SetItemNegativeIndex => "SETITEM_NEGATIVE_INDEX",
            VmError::SetItemInvalidIndex(..) => "SETITEM_INVALID_INDEX",
            VmError::AppendInvalidType => "APPEND_INVALID_TYPE",
            VmError::ReverseInvalidType => "REVERSE_INVALID_TYPE",
            VmError::RemoveInvalidType => "REMOVE_INVALID_TYPE",
            VmError::RemoveInvalidIndex(..) => "REMOVE_INVALID_INDEX",
            VmError::KeyIsCollection => "KEY_IS_COLLECTION",
            VmError::DictKeyError => "DICT_KEY_ERROR",
            VmError::NewArrayNegativeCount => "NEWARRAY_NEGATIVE_COUNT",
            VmError::NewArrayExceedArrayLimit => "NEWARRAY_EXCEED_ARRAYLIMIT",
            VmError::CallExceedMaxInvocationStackSize => "CALL_EXCEED_MAX_INVOCATIONSTACK_SIZE",
            VmError::AppCallExceedMaxInvocationStackSize => "APPCALL_EXCEED_MAX_INVOCATIONSTACK_SIZE",
            VmError::CallIExceedMaxInvocationStackSize => "CALL_I_EXCEED_MAX_INVOCATIONSTACK_SIZE",
            VmError::CallEExceedMaxInvocationStackSize => "CALL_E_EXCEED_MAX_INVOCATIONSTACK_SIZE",
            VmError::UnknownStackIsolation => "UNKNOWN_STACKISOLATION",
            VmError::UnknownStackIsolation2 => "UNKNOWN_STACKISOLATION2",
            VmError::UnknownStackIsolation3 => "UNKNOWN_STACKISOLATION3",
            VmError::InvalidStackSize => "INVALID_STACKSIZE",
            VmError::UnknownOpcode(_) => "UNKNOWN_OPCODE",
            VmError::Throw => "THROW",
            VmError::ThrowIfNot => "THROWIFNOT",
            VmError::InsufficientReturnValues => "INVALID_STACKSIZE",
            VmError::NoInteropService => "SYSCALL_ERROR",
            VmError::MalformedInstruction(..) => "UNKNOWN_OPCODE",
        }
    }
}
