//! Symmetric encryption helpers backing the `encryption` option on HTTP/WebSocket payloads.
//!
//! Keys are derived from a passphrase + salt via PBKDF2-HMAC-SHA256, and payloads are
//! sealed with AES-256-GCM. The nonce is generated per call and prepended to the ciphertext.

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use hmac::Hmac;
use pbkdf2::pbkdf2;
use rand::RngCore;
use sha2::Sha256;
use std::fmt;

const NONCE_LEN: usize = 12;
const PBKDF2_ROUNDS: u32 = 100_000;

#[derive(Debug)]
pub enum EndeError {
    Seal,
    Open,
    Truncated,
}

impl fmt::Display for EndeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Seal => write!(f, "failed to seal payload"),
            Self::Open => write!(f, "failed to open sealed payload (bad key or tampered data)"),
            Self::Truncated => write!(f, "sealed payload shorter than the nonce"),
        }
    }
}

impl std::error::Error for EndeError {}

/// Derives a 256-bit AES key from a passphrase and salt.
pub fn derive_key(pass: &str, salt: &[u8]) -> [u8; 32] {
    let mut key = [0u8; 32];
    pbkdf2::<Hmac<Sha256>>(pass.as_bytes(), salt, PBKDF2_ROUNDS, &mut key)
        .expect("pbkdf2 output length is valid for HMAC-SHA256");
    key
}

/// Encrypts `plaintext` under `key`, returning `nonce || ciphertext || tag`.
pub fn seal(key: &[u8; 32], plaintext: &[u8]) -> Result<Vec<u8>, EndeError> {
    let cipher = Aes256Gcm::new_from_slice(key).map_err(|_| EndeError::Seal)?;
    let mut nonce_bytes = [0u8; NONCE_LEN];
    rand::rng().fill_bytes(&mut nonce_bytes);
    let nonce = Nonce::from_slice(&nonce_bytes);
    let mut out = Vec::with_capacity(NONCE_LEN + plaintext.len() + 16);
    out.extend_from_slice(&nonce_bytes);
    out.extend(
        cipher
            .encrypt(nonce, plaintext)
            .map_err(|_| EndeError::Seal)?,
    );
    Ok(out)
}

/// Decrypts a buffer produced by [`seal`].
pub fn open(key: &[u8; 32], sealed: &[u8]) -> Result<Vec<u8>, EndeError> {
    if sealed.len() < NONCE_LEN {
        return Err(EndeError::Truncated);
    }
    let (nonce_bytes, ciphertext) = sealed.split_at(NONCE_LEN);
    let cipher = Aes256Gcm::new_from_slice(key).map_err(|_| EndeError::Open)?;
    cipher
        .decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
        .map_err(|_| EndeError::Open)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seals_and_opens_round_trip() {
        let key = derive_key("hunter2", b"some-salt");
        let sealed = seal(&key, b"hello multiplexer").unwrap();
        assert_eq!(open(&key, &sealed).unwrap(), b"hello multiplexer");
    }

    #[test]
    fn wrong_key_fails_to_open() {
        let key_a = derive_key("a", b"salt");
        let key_b = derive_key("b", b"salt");
        let sealed = seal(&key_a, b"payload").unwrap();
        assert!(open(&key_b, &sealed).is_err());
    }
}
