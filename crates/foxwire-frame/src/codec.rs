use bytes::{BufMut, Bytes, BytesMut};

use crate::error::{FrameError, Result};

/// Frame header: magic (2) + flags (1) + length (2) = 5 bytes.
pub const HEADER_SIZE: usize = 5;

/// Trailing CRC32 size in bytes.
pub const CHECKSUM_SIZE: usize = 4;

/// Magic marker: 0xAA 0x55, an alternating bit pattern that is statistically
/// unlikely to occur in plain-text traffic. Resynchronization anchor only,
/// not a security boundary.
pub const MAGIC: [u8; 2] = [0xAA, 0x55];

/// Maximum payload size: 4 KiB. Bounded by the practical throughput of the
/// slow modulation modes this framing rides on.
pub const DEFAULT_MAX_PAYLOAD: usize = 4096;

/// FLAGS bit 0: the payload is encrypted.
pub const FLAG_ENCRYPTED: u8 = 0x01;

/// A framed message payload with its flags byte.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// The wire flags byte. Bit 0 is the encrypted flag; remaining bits are
    /// reserved and preserved as received.
    pub flags: u8,
    /// The message payload.
    pub payload: Bytes,
}

impl Frame {
    /// Create a new frame.
    pub fn new(payload: impl Into<Bytes>, encrypted: bool) -> Self {
        Self {
            flags: if encrypted { FLAG_ENCRYPTED } else { 0 },
            payload: payload.into(),
        }
    }

    /// Whether the encrypted flag is set.
    pub fn encrypted(&self) -> bool {
        self.flags & FLAG_ENCRYPTED != 0
    }

    /// The total wire size of this frame (header + payload + checksum).
    pub fn wire_size(&self) -> usize {
        HEADER_SIZE + self.payload.len() + CHECKSUM_SIZE
    }
}

/// CRC32 over flags + length + payload, exactly as they appear on the wire.
pub fn checksum(flags: u8, payload: &[u8]) -> u32 {
    let mut hasher = crc32fast::Hasher::new();
    hasher.update(&[flags]);
    hasher.update(&(payload.len() as u16).to_le_bytes());
    hasher.update(payload);
    hasher.finalize()
}

/// Encode a frame into the wire format.
///
/// Wire format:
/// ```text
/// ┌──────────────┬───────────┬───────────┬─────────────────┬──────────────┐
/// │ Magic (2B)   │ Flags     │ Length    │ Payload          │ CRC32        │
/// │ 0xAA 0x55    │ (1B)      │ (2B LE)   │ (Length bytes)   │ (4B LE)      │
/// └──────────────┴───────────┴───────────┴─────────────────┴──────────────┘
/// ```
///
/// The checksum covers flags, length, and payload.
pub fn encode_frame(payload: &[u8], encrypted: bool, dst: &mut BytesMut) -> Result<()> {
    if payload.len() > DEFAULT_MAX_PAYLOAD {
        return Err(FrameError::PayloadTooLarge {
            size: payload.len(),
            max: DEFAULT_MAX_PAYLOAD,
        });
    }
    let flags = if encrypted { FLAG_ENCRYPTED } else { 0 };
    dst.reserve(HEADER_SIZE + payload.len() + CHECKSUM_SIZE);
    dst.put_slice(&MAGIC);
    dst.put_u8(flags);
    dst.put_u16_le(payload.len() as u16);
    dst.put_slice(payload);
    dst.put_u32_le(checksum(flags, payload));
    Ok(())
}
