use aes_gcm::aead::{Aead, AeadCore, KeyInit, OsRng};
use aes_gcm::{Aes128Gcm, Key, Nonce};

use crate::error::{CipherError, Result};
use crate::key::CipherKey;

/// Nonce size in bytes (96-bit GCM nonce).
pub const NONCE_SIZE: usize = 12;

/// Authentication tag size in bytes.
pub const TAG_SIZE: usize = 16;

/// Symmetric message cipher over the pre-shared key.
///
/// Pure transformation: no state is carried between calls, so messages can
/// be decrypted in any order and after arbitrary loss.
pub struct MessageCipher {
    cipher: Aes128Gcm,
}

impl MessageCipher {
    /// Build a cipher from the pre-shared key.
    pub fn new(key: &CipherKey) -> Self {
        Self {
            cipher: Aes128Gcm::new(Key::<Aes128Gcm>::from_slice(key.as_bytes())),
        }
    }

    /// Seal a plaintext: fresh random nonce, output `nonce || ciphertext || tag`.
    pub fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>> {
        let nonce = Aes128Gcm::generate_nonce(&mut OsRng);
        let sealed = self
            .cipher
            .encrypt(&nonce, plaintext)
            .map_err(|_| CipherError::SealFailed)?;

        let mut out = Vec::with_capacity(NONCE_SIZE + sealed.len());
        out.extend_from_slice(&nonce);
        out.extend_from_slice(&sealed);
        Ok(out)
    }

    /// Open `nonce || ciphertext || tag` produced by [`Self::encrypt`].
    ///
    /// Fails with [`CipherError::TooShort`] when the input cannot carry a
    /// nonce and tag, and [`CipherError::AuthFailed`] when the tag does not
    /// verify — wrong key and corrupted ciphertext are indistinguishable by
    /// design, and both are distinguishable from "not encrypted" (the frame
    /// flag carries that).
    pub fn decrypt(&self, data: &[u8]) -> Result<Vec<u8>> {
        let min = NONCE_SIZE + TAG_SIZE;
        if data.len() < min {
            return Err(CipherError::TooShort {
                len: data.len(),
                min,
            });
        }
        let (nonce, sealed) = data.split_at(NONCE_SIZE);
        self.cipher
            .decrypt(Nonce::from_slice(nonce), sealed)
            .map_err(|_| CipherError::AuthFailed)
    }
}
