//! Sealed blob format: AES-256-GCM under the 32-byte data key.
//!
//! ```text
//! [ "SS1" | 12-byte nonce | ciphertext + 16-byte auth tag ]
//! ```
//!
//! The key is a fixed-size array, so a wrong-length key cannot reach the
//! cipher.  Every seal draws a fresh nonce.

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use rand::RngCore;

use crate::errors::{Result, SecretsError};

/// Length of the data key (256 bits).
pub const KEY_LEN: usize = 32;

/// Format tag at the start of every sealed blob.
const HEADER: &[u8; 3] = b"SS1";

const NONCE_LEN: usize = 12;
const TAG_LEN: usize = 16;

fn cipher(key: &[u8; KEY_LEN]) -> Aes256Gcm {
    Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key))
}

/// Seal `plaintext` into the blob layout above.
///
/// The cipher only fails here if it refuses to run at all, which the
/// caller sees as encryption being unavailable.
pub fn seal(key: &[u8; KEY_LEN], plaintext: &[u8]) -> Result<Vec<u8>> {
    let mut nonce = [0u8; NONCE_LEN];
    rand::rng().fill_bytes(&mut nonce);

    let body = cipher(key)
        .encrypt(Nonce::from_slice(&nonce), plaintext)
        .map_err(|_| SecretsError::EncryptionUnavailable)?;

    let mut blob = Vec::with_capacity(HEADER.len() + NONCE_LEN + body.len());
    blob.extend_from_slice(HEADER);
    blob.extend_from_slice(&nonce);
    blob.extend_from_slice(&body);
    Ok(blob)
}

/// Open a blob produced by `seal`.
///
/// A missing header, a short buffer, a wrong key and a flipped bit are all
/// `CorruptData`.
pub fn open(key: &[u8; KEY_LEN], blob: &[u8]) -> Result<Vec<u8>> {
    let rest = blob
        .strip_prefix(HEADER.as_slice())
        .ok_or_else(|| SecretsError::CorruptData("unrecognised blob header".into()))?;

    if rest.len() < NONCE_LEN + TAG_LEN {
        return Err(SecretsError::CorruptData("blob is truncated".into()));
    }
    let (nonce, body) = rest.split_at(NONCE_LEN);

    cipher(key)
        .decrypt(Nonce::from_slice(nonce), body)
        .map_err(|_| SecretsError::CorruptData("authentication failed (wrong key or tampered data)".into()))
}
