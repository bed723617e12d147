//! Secret comparison strategy
//!
//! Login compares the presented secret with the stored one through this trait,
//! so swapping plaintext for a salted hash only changes the verifier.

/// Opaque equality check between a presented secret and the stored value
pub trait CredentialVerifier: Send + Sync {
    fn verify(&self, presented: &str, stored: &str) -> bool;
}

/// Stored secrets are kept as-is; not suitable for production credentials
#[derive(Debug, Default, Clone, Copy)]
pub struct PlaintextVerifier;

impl CredentialVerifier for PlaintextVerifier {
    fn verify(&self, presented: &str, stored: &str) -> bool {
        let (a, b) = (presented.as_bytes(), stored.as_bytes());
        // Length leaks anyway; avoid short-circuiting on the first differing byte
        a.len() == b.len() && a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
    }
}
