//! Authenticated payload encryption for foxwire messages.
//!
//! AES-128-GCM with a fresh random 96-bit nonce per message, prepended to
//! the ciphertext so decryption is stateless and order-independent. The
//! authentication tag makes decryption failure a reliable signal — a frame
//! whose encrypted flag is set either decrypts exactly or is reported
//! corrupt, never guessed at.

pub mod cipher;
pub mod error;
pub mod key;

pub use cipher::{MessageCipher, NONCE_SIZE, TAG_SIZE};
pub use error::{CipherError, Result};
pub use key::{CipherKey, KEY_SIZE};
