/// Errors that can occur during frame encoding.
///
/// Decoding never fails: corrupt input is consumed by resynchronization
/// inside [`crate::FrameDecoder`] instead of being reported as an error.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The payload exceeds the maximum size a frame can carry.
    #[error("payload too large ({size} bytes, max {max})")]
    PayloadTooLarge { size: usize, max: usize },
}

pub type Result<T> = std::result::Result<T, FrameError>;
