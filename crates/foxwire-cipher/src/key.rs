use std::fmt;

use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::{CipherError, Result};

/// Key size in bytes (AES-128).
pub const KEY_SIZE: usize = 16;

/// Pre-shared 128-bit cipher key.
///
/// Loaded once at startup and threaded through constructors by value.
/// Zeroized on drop; Debug output is redacted so key material cannot leak
/// through logging.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct CipherKey([u8; KEY_SIZE]);

impl CipherKey {
    /// Build a key from exactly [`KEY_SIZE`] raw bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let bytes: [u8; KEY_SIZE] = bytes
            .try_into()
            .map_err(|_| CipherError::InvalidKeyLength {
                len: bytes.len(),
                expected: KEY_SIZE,
            })?;
        Ok(Self(bytes))
    }

    /// Parse a key from its 32-character hex form.
    pub fn from_hex(hex_str: &str) -> Result<Self> {
        let mut decoded = hex::decode(hex_str.trim())?;
        let key = Self::from_bytes(&decoded);
        decoded.zeroize();
        key
    }

    pub(crate) fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.0
    }
}

impl fmt::Debug for CipherKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("CipherKey")
            .field(&format_args!("<redacted:{KEY_SIZE} bytes>"))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_hex_roundtrip() {
        let key = CipherKey::from_hex("000102030405060708090a0b0c0d0e0f").unwrap();
        assert_eq!(
            key.as_bytes(),
            &[0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15]
        );
    }

    #[test]
    fn from_hex_trims_whitespace() {
        assert!(CipherKey::from_hex(" 000102030405060708090a0b0c0d0e0f\n").is_ok());
    }

    #[test]
    fn rejects_wrong_length() {
        let err = CipherKey::from_hex("0001").unwrap_err();
        assert!(matches!(
            err,
            CipherError::InvalidKeyLength {
                len: 2,
                expected: KEY_SIZE
            }
        ));
    }

    #[test]
    fn rejects_bad_hex() {
        let err = CipherKey::from_hex("zz0102030405060708090a0b0c0d0e0f").unwrap_err();
        assert!(matches!(err, CipherError::InvalidKeyEncoding(_)));
    }

    #[test]
    fn debug_output_is_redacted() {
        let key = CipherKey::from_bytes(&[7u8; KEY_SIZE]).unwrap();
        let rendered = format!("{key:?}");
        assert!(rendered.contains("redacted"));
        assert!(!rendered.contains('7'));
    }
}
