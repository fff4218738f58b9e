//! The legacy NEO/AntShares opcode set.
//!
//! Byte values follow the historical legacy VM dialect. `OpCode.py` itself was
//! not part of the retrieved source material; the constants below reconstruct
//! the well-known legacy numbering (documented in `DESIGN.md`), with the
//! CALL_I/CALL_E family (a fork-specific "stack isolation" call extension)
//! placed in an otherwise unused byte range.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum OpCode {
    // -- Constants --
    PUSH0 = 0x00,
    PUSHBYTES1 = 0x01,
    // PUSHBYTES2..PUSHBYTES75 occupy 0x02..0x4B inclusive; see `From<u8>`.
    PUSHDATA1 = 0x4C,
    PUSHDATA2 = 0x4D,
    PUSHDATA4 = 0x4E,
    PUSHM1 = 0x4F,
    PUSH1 = 0x51,
    PUSH2 = 0x52,
    PUSH3 = 0x53,
    PUSH4 = 0x54,
    PUSH5 = 0x55,
    PUSH6 = 0x56,
    PUSH7 = 0x57,
    PUSH8 = 0x58,
    PUSH9 = 0x59,
    PUSH10 = 0x5A,
    PUSH11 = 0x5B,
    PUSH12 = 0x5C,
    PUSH13 = 0x5D,
    PUSH14 = 0x5E,
    PUSH15 = 0x5F,
    PUSH16 = 0x60,

    // -- Flow control --
    NOP = 0x61,
    JMP = 0x62,
    JMPIF = 0x63,
    JMPIFNOT = 0x64,
    CALL = 0x65,
    RET = 0x66,
    APPCALL = 0x67,
    SYSCALL = 0x68,
    TAILCALL = 0x69,

    // -- Stack --
    DUPFROMALTSTACK = 0x6A,
    TOALTSTACK = 0x6B,
    FROMALTSTACK = 0x6C,
    XDROP = 0x6D,
    XSWAP = 0x72,
    XTUCK = 0x73,
    DEPTH = 0x74,
    DROP = 0x75,
    DUP = 0x76,
    NIP = 0x77,
    OVER = 0x78,
    PICK = 0x79,
    ROLL = 0x7A,
    ROT = 0x7B,
    SWAP = 0x7C,
    TUCK = 0x7D,

    // -- Splice / bytes --
    CAT = 0x7E,
    SUBSTR = 0x7F,
    LEFT = 0x80,
    RIGHT = 0x81,
    SIZE = 0x82,

    // -- Bitwise logic --
    INVERT = 0x83,
    AND = 0x84,
    OR = 0x85,
    XOR = 0x86,
    EQUAL = 0x87,

    // -- Arithmetic --
    INC = 0x8B,
    DEC = 0x8C,
    SIGN = 0x8D,
    NEGATE = 0x8F,
    ABS = 0x90,
    NOT = 0x91,
    NZ = 0x92,
    ADD = 0x93,
    SUB = 0x94,
    MUL = 0x95,
    DIV = 0x96,
    MOD = 0x97,
    SHL = 0x98,
    SHR = 0x99,
    BOOLAND = 0x9A,
    BOOLOR = 0x9B,
    NUMEQUAL = 0x9C,
    NUMNOTEQUAL = 0x9E,
    LT = 0x9F,
    GT = 0xA0,
    LTE = 0xA1,
    GTE = 0xA2,
    MIN = 0xA3,
    MAX = 0xA4,
    WITHIN = 0xA5,

    // -- Crypto --
    SHA1 = 0xA7,
    SHA256 = 0xA8,
    HASH160 = 0xA9,
    HASH256 = 0xAA,
    CHECKSIG = 0xAC,
    VERIFY = 0xAD,
    CHECKMULTISIG = 0xAE,

    // -- Collections --
    ARRAYSIZE = 0xC0,
    PACK = 0xC1,
    UNPACK = 0xC2,
    PICKITEM = 0xC3,
    SETITEM = 0xC4,
    NEWARRAY = 0xC5,
    NEWSTRUCT = 0xC6,
    NEWMAP = 0xC7,
    APPEND = 0xC8,
    REVERSE = 0xC9,
    REMOVE = 0xCA,
    HASKEY = 0xCB,
    KEYS = 0xCC,
    VALUES = 0xCD,

    // -- Cross-script, stack-isolated calls --
    CALL_I = 0xE0,
    CALL_E = 0xE1,
    CALL_ED = 0xE2,
    CALL_ET = 0xE3,
    CALL_EDT = 0xE4,

    // -- Exceptions --
    THROW = 0xF0,
    THROWIFNOT = 0xF1,
}

impl OpCode {
    /// Decode a raw opcode byte, including the dense PUSHBYTES1..75 range.
    pub fn from_byte(b: u8) -> Option<OpCode> {
        if (0x01..=0x4B).contains(&b) {
            // PUSHBYTES1..PUSHBYTES75 share a single variant tag; the byte
            // value itself *is* the operand length, recovered by the caller.
            return Some(OpCode::PUSHBYTES1);
        }
        Some(match b {
            0x00 => OpCode::PUSH0,
            0x4C => OpCode::PUSHDATA1,
            0x4D => OpCode::PUSHDATA2,
            0x4E => OpCode::PUSHDATA4,
            0x4F => OpCode::PUSHM1,
            0x51 => OpCode::PUSH1,
            0x52 => OpCode::PUSH2,
            0x53 => OpCode::PUSH3,
            0x54 => OpCode::PUSH4,
            0x55 => OpCode::PUSH5,
            0x56 => OpCode::PUSH6,
            0x57 => OpCode::PUSH7,
            0x58 => OpCode::PUSH8,
            0x59 => OpCode::PUSH9,
            0x5A => OpCode::PUSH10,
            0x5B => OpCode::PUSH11,
            0x5C => OpCode::PUSH12,
            0x5D => OpCode::PUSH13,
            0x5E => OpCode::PUSH14,
            0x5F => OpCode::PUSH15,
            0x60 => OpCode::PUSH16,
            0x61 => OpCode::NOP,
            0x62 => OpCode::JMP,
            0x63 => OpCode::JMPIF,
            0x64 => OpCode::JMPIFNOT,
            0x65 => OpCode::CALL,
            0x66 => OpCode::RET,
            0x67 => OpCode::APPCALL,
            0x68 => OpCode::SYSCALL,
            0x69 => OpCode::TAILCALL,
            0x6A => OpCode::DUPFROMALTSTACK,
            0x6B => OpCode::TOALTSTACK,
            0x6C => OpCode::FROMALTSTACK,
            0x6D => OpCode::XDROP,
            0x72 => OpCode::XSWAP,
            0x73 => OpCode::XTUCK,
            0x74 => OpCode::DEPTH,
            0x75 => OpCode::DROP,
            0x76 => OpCode::DUP,
            0x77 => OpCode::NIP,
            0x78 => OpCode::OVER,
            0x79 => OpCode::PICK,
            0x7A => OpCode::ROLL,
            0x7B => OpCode::ROT,
            0x7C => OpCode::SWAP,
            0x7D => OpCode::TUCK,
            0x7E => OpCode::CAT,
            0x7F => OpCode::SUBSTR,
            0x80 => OpCode::LEFT,
            0x81 => OpCode::RIGHT,
            0x82 => OpCode::SIZE,
            0x83 => OpCode::INVERT,
            0x84 => OpCode::AND,
            0x85 => OpCode::OR,
            0x86 => OpCode::XOR,
            0x87 => OpCode::EQUAL,
            0x8B => OpCode::INC,
            0x8C => OpCode::DEC,
            0x8D => OpCode::SIGN,
            0x8F => OpCode::NEGATE,
            0x90 => OpCode::ABS,
            0x91 => OpCode::NOT,
            0x92 => OpCode::NZ,
            0x93 => OpCode::ADD,
            0x94 => OpCode::SUB,
            0x95 => OpCode::MUL,
            0x96 => OpCode::DIV,
            0x97 => OpCode::MOD,
            0x98 => OpCode::SHL,
            0x99 => OpCode::SHR,
            0x9A => OpCode::BOOLAND,
            0x9B => OpCode::BOOLOR,
            0x9C => OpCode::NUMEQUAL,
            0x9E => OpCode::NUMNOTEQUAL,
            0x9F => OpCode::LT,
            0xA0 => OpCode::GT,
            0xA1 => OpCode::LTE,
            0xA2 => OpCode::GTE,
            0xA3 => OpCode::MIN,
            0xA4 => OpCode::MAX,
            0xA5 => OpCode::WITHIN,
            0xA7 => OpCode::SHA1,
            0xA8 => OpCode::SHA256,
            0xA9 => OpCode::HASH160,
            0xAA => OpCode::HASH256,
            0xAC => OpCode::CHECKSIG,
            0xAD => OpCode::VERIFY,
            0xAE => OpCode::CHECKMULTISIG,
            0xC0 => OpCode::ARRAYSIZE,
            0xC1 => OpCode::PACK,
            0xC2 => OpCode::UNPACK,
            0xC3 => OpCode::PICKITEM,
            0xC4 => OpCode::SETITEM,
            0xC5 => OpCode::NEWARRAY,
            0xC6 => OpCode::NEWSTRUCT,
            0xC7 => OpCode::NEWMAP,
            0xC8 => OpCode::APPEND,
            0xC9 => OpCode::REVERSE,
            0xCA => OpCode::REMOVE,
            0xCB => OpCode::HASKEY,
            0xCC => OpCode::KEYS,
            0xCD => OpCode::VALUES,
            0xE0 => OpCode::CALL_I,
            0xE1 => OpCode::CALL_E,
            0xE2 => OpCode::CALL_ED,
            0xE3 => OpCode::CALL_ET,
            0xE4 => OpCode::CALL_EDT,
            0xF0 => OpCode::THROW,
            0xF1 => OpCode::THROWIFNOT,
            _ => return None,
        })
    }
}
