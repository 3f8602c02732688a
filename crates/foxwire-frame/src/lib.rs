//! Self-delimiting message framing for a lossy RF byte stream.
//!
//! This is the core value-add layer of foxwire. Every message is framed with:
//! - A 2-byte magic marker (0xAA 0x55) used as a resynchronization anchor
//! - A 1-byte flags field (bit 0: payload is encrypted)
//! - A 2-byte little-endian payload length
//! - A 4-byte CRC32 over flags + length + payload
//!
//! The decoder scans forward to the next marker after any corruption instead
//! of failing the stream — on an RF channel, garbled bytes are expected noise
//! and one bad frame must not desynchronize everything after it.

pub mod codec;
pub mod decoder;
pub mod error;

pub use codec::{
    checksum, encode_frame, Frame, CHECKSUM_SIZE, DEFAULT_MAX_PAYLOAD, FLAG_ENCRYPTED, HEADER_SIZE,
    MAGIC,
};
pub use decoder::FrameDecoder;
pub use error::{FrameError, Result};
