//! Encryption service for stored platform credentials
//!
//! Brand access tokens are stored as AES-256-GCM ciphertext with the IV and
//! the authentication tag kept as separate base64 fields on the brand record.
//! Decryption reassembles ciphertext and tag and verifies integrity; a tag
//! mismatch means the stored credential is corrupt or the key rotated.

use crate::AppError;
use aes_gcm::{
    aead::{Aead, AeadCore, KeyInit, OsRng},
    Aes256Gcm, Key, Nonce,
};
use base64::{engine::general_purpose, Engine as _};
use std::env;

const GCM_NONCE_LEN: usize = 12;
const GCM_TAG_LEN: usize = 16;

/// Authenticated decryption of brand access tokens.
#[derive(Clone)]
pub struct TokenCipher {
    cipher: Aes256Gcm,
}

impl TokenCipher {
    /// Create a new cipher from raw 32-byte key (e.g. for tests; avoids env mutation).
    pub fn from_key_bytes(key_bytes: &[u8]) -> Result<Self, AppError> {
        if key_bytes.len() != 32 {
            return Err(AppError::Encryption(
                "Encryption key must be 32 bytes (256 bits)".to_string(),
            ));
        }
        let key = Key::<Aes256Gcm>::from_slice(key_bytes);
        Ok(Self {
            cipher: Aes256Gcm::new(key),
        })
    }

    /// Create a new cipher from environment variable.
    /// Expects ENCRYPTION_KEY to be a base64-encoded 32-byte key.
    pub fn from_env() -> Result<Self, AppError> {
        let key_str = env::var("ENCRYPTION_KEY").map_err(|_| {
            AppError::Encryption("ENCRYPTION_KEY environment variable not set".to_string())
        })?;

        let key_bytes = general_purpose::STANDARD
            .decode(&key_str)
            .map_err(|e| AppError::Encryption(format!("Failed to decode encryption key: {}", e)))?;

        Self::from_key_bytes(&key_bytes)
    }

    /// Decrypt a stored token given its three base64 fields.
    pub fn decrypt_token(
        &self,
        ciphertext_b64: &str,
        iv_b64: &str,
        auth_tag_b64: &str,
    ) -> Result<String, AppError> {
        let ciphertext = general_purpose::STANDARD
            .decode(ciphertext_b64)
            .map_err(|e| AppError::Encryption(format!("Failed to decode ciphertext: {}", e)))?;
        let iv = general_purpose::STANDARD
            .decode(iv_b64)
            .map_err(|e| AppError::Encryption(format!("Failed to decode IV: {}", e)))?;
        let tag = general_purpose::STANDARD
            .decode(auth_tag_b64)
            .map_err(|e| AppError::Encryption(format!("Failed to decode auth tag: {}", e)))?;

        if iv.len() != GCM_NONCE_LEN {
            return Err(AppError::Encryption(format!(
                "IV must be {} bytes, got {}",
                GCM_NONCE_LEN,
                iv.len()
            )));
        }
        if tag.len() != GCM_TAG_LEN {
            return Err(AppError::Encryption(format!(
                "Auth tag must be {} bytes, got {}",
                GCM_TAG_LEN,
                tag.len()
            )));
        }

        // The aead API expects the tag appended to the ciphertext
        let mut combined = ciphertext;
        combined.extend_from_slice(&tag);

        let nonce = Nonce::from_slice(&iv);
        let plaintext = self
            .cipher
            .decrypt(nonce, combined.as_ref())
            .map_err(|_| AppError::Encryption("Decryption failed: auth tag mismatch".to_string()))?;

        String::from_utf8(plaintext)
            .map_err(|e| AppError::Encryption(format!("Invalid UTF-8 in decrypted token: {}", e)))
    }

    /// Encrypt a token, returning (ciphertext, iv, auth_tag) as base64.
    /// Used by the credential-ingestion side and by tests.
    pub fn encrypt_token(&self, plaintext: &str) -> Result<(String, String, String), AppError> {
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let mut combined = self
            .cipher
            .encrypt(&nonce, plaintext.as_bytes())
            .map_err(|e| AppError::Encryption(format!("Encryption failed: {}", e)))?;

        // Split the appended tag back out so the record stores it separately
        let tag = combined.split_off(combined.len() - GCM_TAG_LEN);

        Ok((
            general_purpose::STANDARD.encode(&combined),
            general_purpose::STANDARD.encode(nonce),
            general_purpose::STANDARD.encode(&tag),
        ))
    }
}
