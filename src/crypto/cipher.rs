//! AES-256-GCM authenticated encryption
//!
//! Persisted wire format: `{nonce_hex}:{tag_hex}:{ciphertext_hex}`
//! - Nonce: 12 bytes (96 bits) - standard for GCM
//! - Auth tag: 16 bytes (128 bits)
//! - Ciphertext: variable length

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::MasterKey;
use crate::error::{Result, VaultError};

/// GCM nonce length in bytes
pub const NONCE_LEN: usize = 12;
/// GCM authentication tag length in bytes
pub const TAG_LEN: usize = 16;

/// Ciphertext envelope: the randomness needed to decrypt plus the tag that
/// authenticates it
///
/// Never logged and never compared as plaintext; `Debug` prints lengths only.
#[derive(Clone)]
pub struct EncryptedValue {
    /// Per-encryption random nonce
    pub nonce: [u8; NONCE_LEN],
    /// Authentication tag
    pub tag: [u8; TAG_LEN],
    /// Encrypted payload
    pub ciphertext: Vec<u8>,
}

impl std::fmt::Display for EncryptedValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}:{}:{}",
            hex::encode(self.nonce),
            hex::encode(self.tag),
            hex::encode(&self.ciphertext)
        )
    }
}

impl std::fmt::Debug for EncryptedValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncryptedValue")
            .field("ciphertext_len", &self.ciphertext.len())
            .finish_non_exhaustive()
    }
}

impl EncryptedValue {
    /// Parse from the format: `{nonce_hex}:{tag_hex}:{ciphertext_hex}`
    pub fn from_string(s: &str) -> Result<Self> {
        let parts: Vec<&str> = s.split(':').collect();
        if parts.len() != 3 {
            return Err(VaultError::DecryptionError(
                "invalid envelope format: expected nonce:tag:ciphertext".to_string(),
            ));
        }

        let nonce_bytes = hex::decode(parts[0])
            .map_err(|e| VaultError::DecryptionError(format!("invalid nonce hex: {}", e)))?;
        let tag_bytes = hex::decode(parts[1])
            .map_err(|e| VaultError::DecryptionError(format!("invalid tag hex: {}", e)))?;
        let ciphertext = hex::decode(parts[2])
            .map_err(|e| VaultError::DecryptionError(format!("invalid ciphertext hex: {}", e)))?;

        if nonce_bytes.len() != NONCE_LEN {
            return Err(VaultError::DecryptionError(format!(
                "invalid nonce length: expected {}, got {}",
                NONCE_LEN,
                nonce_bytes.len()
            )));
        }
        if tag_bytes.len() != TAG_LEN {
            return Err(VaultError::DecryptionError(format!(
                "invalid tag length: expected {}, got {}",
                TAG_LEN,
                tag_bytes.len()
            )));
        }

        let mut nonce = [0u8; NONCE_LEN];
        nonce.copy_from_slice(&nonce_bytes);

        let mut tag = [0u8; TAG_LEN];
        tag.copy_from_slice(&tag_bytes);

        Ok(Self {
            nonce,
            tag,
            ciphertext,
        })
    }
}

// Persisted records carry the envelope in its string form so nonce, tag and
// ciphertext stay individually recoverable.
impl Serialize for EncryptedValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for EncryptedValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        EncryptedValue::from_string(&raw).map_err(serde::de::Error::custom)
    }
}

/// AES-256-GCM cipher handle
///
/// Constructed once at process start from the externally provisioned
/// [`MasterKey`] and injected wherever encryption is needed - there is no
/// process-global key state. Pure CPU, no I/O.
pub struct Cipher {
    aead: Aes256Gcm,
}

impl Cipher {
    /// Create a cipher from a 256-bit master key
    pub fn new(key: &MasterKey) -> Self {
        let aead = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key.as_bytes()));
        Self { aead }
    }

    /// Encrypt a payload under a fresh random nonce
    ///
    /// Each call draws its nonce from the OS CSPRNG; a nonce is never reused.
    pub fn encrypt(&self, plaintext: &[u8]) -> Result<EncryptedValue> {
        let mut nonce = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut nonce);

        // aes-gcm appends the auth tag to the ciphertext
        let sealed = self
            .aead
            .encrypt(Nonce::from_slice(&nonce), plaintext)
            .map_err(|e| VaultError::EncryptionError(e.to_string()))?;

        if sealed.len() < TAG_LEN {
            return Err(VaultError::EncryptionError(
                "sealed output too short".to_string(),
            ));
        }

        let split = sealed.len() - TAG_LEN;
        let mut tag = [0u8; TAG_LEN];
        tag.copy_from_slice(&sealed[split..]);

        Ok(EncryptedValue {
            nonce,
            tag,
            ciphertext: sealed[..split].to_vec(),
        })
    }

    /// Encrypt a string payload
    pub fn encrypt_str(&self, plaintext: &str) -> Result<EncryptedValue> {
        self.encrypt(plaintext.as_bytes())
    }

    /// Decrypt an envelope, verifying its authentication tag
    ///
    /// Tag verification inside the AEAD is constant-time; a mismatch reports
    /// only that authentication failed, not where.
    pub fn decrypt(&self, value: &EncryptedValue) -> Result<Vec<u8>> {
        let mut sealed = value.ciphertext.clone();
        sealed.extend_from_slice(&value.tag);

        self.aead
            .decrypt(Nonce::from_slice(&value.nonce), sealed.as_slice())
            .map_err(|_| VaultError::DecryptionError("authentication failed".to_string()))
    }

    /// Decrypt an envelope into a UTF-8 string
    pub fn decrypt_str(&self, value: &EncryptedValue) -> Result<String> {
        let plaintext = self.decrypt(value)?;
        String::from_utf8(plaintext)
            .map_err(|_| VaultError::DecryptionError("plaintext is not valid UTF-8".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn test_cipher() -> Cipher {
        Cipher::new(&MasterKey::new([7u8; 32]))
    }

    #[test]
    fn test_encrypt_decrypt_roundtrip() {
        let cipher = test_cipher();
        let plaintext = b"https://panel.example.com";

        let encrypted = cipher.encrypt(plaintext).unwrap();
        let decrypted = cipher.decrypt(&encrypted).unwrap();

        assert_eq!(decrypted, plaintext);
    }

    #[test]
    fn test_empty_payload_roundtrip() {
        let cipher = test_cipher();

        let encrypted = cipher.encrypt(b"").unwrap();
        assert!(encrypted.ciphertext.is_empty());

        let decrypted = cipher.decrypt(&encrypted).unwrap();
        assert!(decrypted.is_empty());
    }

    #[test]
    fn test_string_roundtrip() {
        let cipher = test_cipher();

        let encrypted = cipher.encrypt_str("tok123").unwrap();
        let decrypted = cipher.decrypt_str(&encrypted).unwrap();

        assert_eq!(decrypted, "tok123");
    }

    #[test]
    fn test_nonces_are_pairwise_distinct() {
        let cipher = test_cipher();

        let nonces: HashSet<[u8; NONCE_LEN]> = (0..1000)
            .map(|_| cipher.encrypt(b"same plaintext").unwrap().nonce)
            .collect();

        assert_eq!(nonces.len(), 1000);
    }

    #[test]
    fn test_tampered_ciphertext_fails_decryption() {
        let cipher = test_cipher();

        let mut encrypted = cipher.encrypt(b"secret data").unwrap();
        for bit in 0..8 {
            encrypted.ciphertext[0] ^= 1 << bit;
            assert!(matches!(
                cipher.decrypt(&encrypted),
                Err(VaultError::DecryptionError(_))
            ));
            encrypted.ciphertext[0] ^= 1 << bit;
        }

        // untampered envelope still decrypts
        assert_eq!(cipher.decrypt(&encrypted).unwrap(), b"secret data");
    }

    #[test]
    fn test_tampered_tag_fails_decryption() {
        let cipher = test_cipher();

        let mut encrypted = cipher.encrypt(b"secret data").unwrap();
        encrypted.tag[TAG_LEN - 1] ^= 0x01;

        assert!(matches!(
            cipher.decrypt(&encrypted),
            Err(VaultError::DecryptionError(_))
        ));
    }

    #[test]
    fn test_wrong_key_fails_decryption() {
        let cipher = test_cipher();
        let other = Cipher::new(&MasterKey::new([8u8; 32]));

        let encrypted = cipher.encrypt(b"secret data").unwrap();
        assert!(other.decrypt(&encrypted).is_err());
    }

    #[test]
    fn test_envelope_string_roundtrip() {
        let cipher = test_cipher();

        let encrypted = cipher.encrypt(b"payload").unwrap();
        let parsed = EncryptedValue::from_string(&encrypted.to_string()).unwrap();

        assert_eq!(parsed.nonce, encrypted.nonce);
        assert_eq!(parsed.tag, encrypted.tag);
        assert_eq!(parsed.ciphertext, encrypted.ciphertext);
        assert_eq!(cipher.decrypt(&parsed).unwrap(), b"payload");
    }

    #[test]
    fn test_invalid_envelope_parsing() {
        assert!(EncryptedValue::from_string("garbage").is_err());
        assert!(EncryptedValue::from_string("a:b").is_err());
        assert!(EncryptedValue::from_string("a:b:c:d").is_err());
        assert!(EncryptedValue::from_string("zz:zz:zz").is_err());
        // hex-valid but wrong lengths
        assert!(EncryptedValue::from_string("0011:00112233445566778899aabbccddeeff:00").is_err());
    }

    #[test]
    fn test_serde_roundtrip() {
        let cipher = test_cipher();

        let encrypted = cipher.encrypt(b"payload").unwrap();
        let json = serde_json::to_string(&encrypted).unwrap();
        let parsed: EncryptedValue = serde_json::from_str(&json).unwrap();

        assert_eq!(cipher.decrypt(&parsed).unwrap(), b"payload");
    }

    #[test]
    fn test_debug_hides_contents() {
        let cipher = test_cipher();
        let encrypted = cipher.encrypt(b"payload").unwrap();

        let debug = format!("{:?}", encrypted);
        assert!(!debug.contains(&hex::encode(&encrypted.ciphertext)));
    }
}
