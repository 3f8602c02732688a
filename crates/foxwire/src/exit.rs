use std::fmt;

use foxwire_link::LinkError;
use foxwire_modem::ModemError;

// Exit codes loosely following sysexits conventions.
pub const SUCCESS: i32 = 0;
#[allow(dead_code)]
pub const FAILURE: i32 = 1;
pub const TRANSPORT_ERROR: i32 = 3;
pub const DATA_INVALID: i32 = 60;
pub const USAGE: i32 = 64;
/// Temporary failure: channel busy, retry later (EX_TEMPFAIL).
pub const CHANNEL_BUSY: i32 = 75;
pub const TIMEOUT: i32 = 124;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub fn modem_error(context: &str, err: ModemError) -> CliError {
    let code = match &err {
        ModemError::Unavailable { .. } => TRANSPORT_ERROR,
        ModemError::Timeout(_) => TIMEOUT,
        ModemError::Protocol(_) | ModemError::Fault { .. } => TRANSPORT_ERROR,
        ModemError::UnsupportedMode(_) => USAGE,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn link_error(context: &str, err: LinkError) -> CliError {
    match err {
        LinkError::Modem(err) => modem_error(context, err),
        LinkError::ChannelBusy | LinkError::ModeChangeWhileBusy => {
            CliError::new(CHANNEL_BUSY, format!("{context}: {err}"))
        }
        LinkError::MessageTooLarge { .. } => CliError::new(DATA_INVALID, format!("{context}: {err}")),
        LinkError::NoCipherKey => CliError::new(USAGE, format!("{context}: {err}")),
        other => CliError::new(INTERNAL, format!("{context}: {other}")),
    }
}
