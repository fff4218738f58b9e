//! Immutable bytecode sequence with a lazily-computed content hash.

use once_cell::unsync::OnceCell;

use ripemd::Ripemd160;
use sha2::{Digest, Sha256};

pub const HASH160_LEN: usize = 20;

#[derive(Debug)]
pub struct Script {
    bytes: Vec<u8>,
    hash: OnceCell<[u8; HASH160_LEN]>,
}

impl Script {
    pub fn new(bytes: Vec<u8>) -> Script {
        Script {
            bytes,
            hash: OnceCell::new(),
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Hash160 = RIPEMD160(SHA256(bytes)).
    pub fn script_hash(&self) -> [u8; HASH160_LEN] {
        *self.hash.get_or_init(|| {
            let sha = Sha256::digest(&self.bytes);
            let rip = Ripemd160::digest(sha);
            let mut out = [0u8; HASH160_LEN];
            out.copy_from_slice(&rip);
            out
        })
    }
}

pub fn hash160(bytes: &[u8]) -> [u8; HASH160_LEN] {
    let sha = Sha256::digest(bytes);
    let rip = Ripemd160::digest(sha);
    let mut out = [0u8; HASH160_LEN];
    out.copy_from_slice(&rip);
    out
}

pub fn hash256(bytes: &[u8]) -> [u8; 32] {
    let first = Sha256::digest(bytes);
    let second = Sha256::digest(first);
    let mut out = [0u8; 32];
    out.copy_from_slice(&second);
    out
}
