use foxwire_cipher::CipherError;
use foxwire_frame::FrameError;
use foxwire_modem::ModemError;

/// Errors that can occur in link operations.
#[derive(Debug, thiserror::Error)]
pub enum LinkError {
    /// The channel is mid-transmission or mid-receive. Retry later.
    #[error("channel busy")]
    ChannelBusy,

    /// A mode change was requested while a transmission is in flight.
    /// Changing modulation mid-frame corrupts the frame on the air.
    #[error("mode change refused while transmitting")]
    ModeChangeWhileBusy,

    /// The message exceeds the configured maximum length.
    #[error("message too large ({size} bytes, max {max})")]
    MessageTooLarge { size: usize, max: usize },

    /// Encryption was requested but no cipher key is configured.
    #[error("encryption requested but no cipher key is configured")]
    NoCipherKey,

    /// Modem-level error.
    #[error("modem error: {0}")]
    Modem(#[from] ModemError),

    /// Cipher-level error on the send path.
    #[error("cipher error: {0}")]
    Cipher(#[from] CipherError),

    /// Frame-level error on the send path.
    #[error("frame error: {0}")]
    Frame(#[from] FrameError),
}

pub type Result<T> = std::result::Result<T, LinkError>;
