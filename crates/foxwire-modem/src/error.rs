use std::time::Duration;

use crate::mode::Mode;

/// Errors that can occur talking to the external modem process.
#[derive(Debug, thiserror::Error)]
pub enum ModemError {
    /// The modem controller connection is down (likely mid-restart).
    /// Retryable with backoff.
    #[error("modem unavailable at {addr}: {source}")]
    Unavailable {
        addr: String,
        source: std::io::Error,
    },

    /// A modem call did not complete within the bounded timeout. Retryable.
    #[error("modem call timed out after {0:?}")]
    Timeout(Duration),

    /// The modem answered with something this client cannot interpret.
    #[error("modem protocol error: {0}")]
    Protocol(String),

    /// The modem rejected a call with an explicit fault.
    #[error("modem fault {code}: {message}")]
    Fault { code: i32, message: String },

    /// The requested mode is not in the modem's live supported set.
    /// A configuration error, not a transport error.
    #[error("mode {0} not supported by the connected modem")]
    UnsupportedMode(Mode),
}

pub type Result<T> = std::result::Result<T, ModemError>;
