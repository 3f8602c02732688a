/// Errors that can occur in cipher operations.
#[derive(Debug, thiserror::Error)]
pub enum CipherError {
    /// The key is not exactly [`crate::KEY_SIZE`] bytes.
    #[error("invalid key length ({len} bytes, expected {expected})")]
    InvalidKeyLength { len: usize, expected: usize },

    /// The key string is not valid hex.
    #[error("invalid key encoding: {0}")]
    InvalidKeyEncoding(#[from] hex::FromHexError),

    /// The underlying AEAD reported a failure while sealing.
    #[error("encryption failed")]
    SealFailed,

    /// The input is too short to carry a nonce and authentication tag.
    #[error("ciphertext too short ({len} bytes, minimum {min})")]
    TooShort { len: usize, min: usize },

    /// The authentication tag failed to verify: wrong key or corrupted
    /// ciphertext.
    #[error("authentication failed (wrong key or corrupted ciphertext)")]
    AuthFailed,
}

pub type Result<T> = std::result::Result<T, CipherError>;
