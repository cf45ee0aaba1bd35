//! Secure memory handling with automatic zeroization

use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::{Result, VaultError};

/// Process-wide encryption key - automatically zeroed when dropped
///
/// Loaded once at startup from the embedding process's secret source and
/// handed to [`super::Cipher`]; never derived from user input and never
/// printed.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct MasterKey {
    key: [u8; 32],
}

impl MasterKey {
    /// Create a new master key from raw bytes
    pub fn new(key: [u8; 32]) -> Self {
        Self { key }
    }

    /// Borrow the key bytes for cipher construction
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.key
    }

    /// Create from a slice, rejecting anything that is not exactly 32 bytes
    pub fn from_slice(slice: &[u8]) -> Option<Self> {
        let key: [u8; 32] = slice.try_into().ok()?;
        Some(Self { key })
    }

    /// Create from a hex string, the usual shape a key arrives in from
    /// environment-style configuration
    pub fn from_hex(hex_key: &str) -> Result<Self> {
        let mut bytes = hex::decode(hex_key.trim())
            .map_err(|e| VaultError::InvalidKey(format!("not valid hex: {}", e)))?;
        let key = Self::from_slice(&bytes)
            .ok_or_else(|| VaultError::InvalidKey(format!("expected 32 bytes, got {}", bytes.len())));
        bytes.zeroize();
        key
    }
}

impl std::fmt::Debug for MasterKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MasterKey")
            .field("key", &"[REDACTED]")
            .finish()
    }
}

/// Decrypted secret value - automatically zeroed when dropped
///
/// The plaintext never leaves the wrapper; callers borrow it through
/// [`SecretString::expose`] for the duration of one use.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct SecretString {
    value: String,
}

impl SecretString {
    /// Wrap a freshly decrypted value
    pub fn new(value: String) -> Self {
        Self { value }
    }

    /// Borrow the secret value (use carefully)
    pub fn expose(&self) -> &str {
        &self.value
    }
}

impl std::fmt::Debug for SecretString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretString")
            .field("value", &"[REDACTED]")
            .finish()
    }
}
