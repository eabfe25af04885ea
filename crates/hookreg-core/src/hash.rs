//! Hashing helpers with explicit domain separation.
//!
//! Every discriminator in the wire format is a prefix of a sha256 digest over
//! a namespaced label. The labels must never change: they are what the
//! deployed programs compare against.

use sha2::{Digest, Sha256};

/// Namespace prefix for account-state discriminators.
pub const ACCOUNT_NAMESPACE: &str = "account";

/// sha256 over the concatenation of `parts`.
pub fn sha256(parts: &[&[u8]]) -> [u8; 32] {
    let mut h = Sha256::new();
    for p in parts {
        h.update(p);
    }
    h.finalize().into()
}

/// First 8 bytes of sha256(`label`).
pub fn discriminator(label: &str) -> [u8; 8] {
    let digest = sha256(&[label.as_bytes()]);
    let mut out = [0u8; 8];
    out.copy_from_slice(&digest[..8]);
    out
}

/// Discriminator leading an account of the given type: sha256("account:<Type>")[..8].
pub fn account_discriminator(type_name: &str) -> [u8; 8] {
    discriminator(&format!("{ACCOUNT_NAMESPACE}:{type_name}"))
}
