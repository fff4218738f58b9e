//! Host-supplied collaborator contracts the engine consumes but never
//! implements itself (aside from the one concrete `Crypto` below).

pub trait Crypto {
    fn hash160(&self, bytes: &[u8]) -> [u8; 20];
    fn hash256(&self, bytes: &[u8]) -> [u8; 32];
    fn verify_signature(&self, message: &[u8], signature: &[u8], pubkey: &[u8]) -> bool;
}

/// `hash20 -> bytes | None`.
pub trait ScriptTable {
    fn get_script(&self, hash: &[u8; 20]) -> Option<Vec<u8>>;
}

/// Provides the message bytes signed in CHECKSIG.
pub trait ScriptContainer {
    fn get_message(&self) -> Vec<u8>;
}

/// The one concrete `Crypto` implementation this crate ships, built on the
/// workspace's `sha2`/`ripemd`/`secp256k1` stack. Hosts may supply their own.
pub struct Secp256k1Crypto;

impl Crypto for Secp256k1Crypto {
    fn hash160(&self, bytes: &[u8]) -> [u8; 20] {
        crate::script::hash160(bytes)
    }

    fn hash256(&self, bytes: &[u8]) -> [u8; 32] {
        crate::script::hash256(bytes)
    }

    fn verify_signature(&self, message: &[u8], signature: &[u8], pubkey: &[u8]) -> bool {
        use secp256k1::ecdsa::Signature;
        use secp256k1::{Message, PublicKey, Secp256k1};

        let secp = Secp256k1::verification_only();
        let digest = crate::script::hash256(message);
        let msg = match Message::from_digest_slice(&digest) {
            Ok(m) => m,
            Err(_) => return false,
        };
        let sig = match Signature::from_compact(signature).or_else(|_| Signature::from_der(signature)) {
            Ok(s) => s,
            Err(_) => return false,
        };
        let key = match PublicKey::from_slice(pubkey) {
            Ok(k) => k,
            Err(_) => return false,
        };
        secp.verify_ecdsa(&msg, &sig, &key).is_ok()
    }
}
