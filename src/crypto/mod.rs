//! Cryptographic primitives for SecretSafe.
//!
//! This module provides:
//! - AES-256-GCM encryption and decryption (`encryption`)
//! - The host secure-storage seam and its backends (`backend`)
//! - OS keyring access for the data key (`keyring`)

pub mod backend;
pub mod encryption;

#[cfg(feature = "keyring-store")]
pub mod keyring;

// Re-export the most commonly used items so callers can write:
//   use crate::crypto::{SecureStorage, KeyringStorage, ...};
pub use backend::{DataKey, KeyringStorage, SecureStorage, StaticKeyStorage, MASTER_KEY_ENV};
