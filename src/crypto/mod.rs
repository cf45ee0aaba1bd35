//! Cryptographic primitives for the credential vault
//!
//! This module provides:
//! - AES-256-GCM authenticated encryption behind the [`Cipher`] handle
//! - the [`EncryptedValue`] ciphertext envelope (nonce + tag + ciphertext)
//! - secure memory handling with zeroize

mod cipher;
mod keys;

pub use cipher::{Cipher, EncryptedValue, NONCE_LEN, TAG_LEN};
pub use keys::{MasterKey, SecretString};
