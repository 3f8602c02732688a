use std::time::Duration;

use clap::{Args, Subcommand};
use foxwire_cipher::CipherKey;

use crate::exit::{CliError, CliResult, DATA_INVALID, USAGE};
use crate::output::OutputFormat;

pub mod listen;
pub mod mode;
pub mod send;
pub mod status;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Broadcast a message over the RF channel.
    Send(SendArgs),
    /// Poll the modem and print received messages.
    Listen(ListenArgs),
    /// Get or set the modem's operating mode.
    Mode(ModeArgs),
    /// Show modem status: mode, busy flag, supported modes.
    Status(StatusArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, modem_addr: &str, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Send(args) => send::run(args, modem_addr, format),
        Command::Listen(args) => listen::run(args, modem_addr, format),
        Command::Mode(args) => mode::run(args, modem_addr, format),
        Command::Status(args) => status::run(args, modem_addr, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct SendArgs {
    /// Message text to broadcast.
    pub message: String,
    /// Encrypt the message with the pre-shared key.
    #[arg(long)]
    pub encrypt: bool,
    /// Pre-shared 128-bit key, hex-encoded.
    #[arg(long, value_name = "HEX", env = "FOXWIRE_KEY", hide_env_values = true)]
    pub key: Option<String>,
    /// Switch to this operating mode before transmitting.
    #[arg(long, value_name = "MODE")]
    pub mode: Option<String>,
    /// How long to keep retrying while the channel is busy (e.g. 30s, 500ms).
    #[arg(long, default_value = "30s")]
    pub busy_wait: String,
}

#[derive(Args, Debug)]
pub struct ListenArgs {
    /// Poll interval (e.g. 500ms, 2s).
    #[arg(long, default_value = "500ms")]
    pub interval: String,
    /// Exit after printing N messages.
    #[arg(long)]
    pub count: Option<usize>,
    /// Pre-shared 128-bit key for decrypting received traffic, hex-encoded.
    #[arg(long, value_name = "HEX", env = "FOXWIRE_KEY", hide_env_values = true)]
    pub key: Option<String>,
}

#[derive(Args, Debug)]
pub struct ModeArgs {
    /// Mode name to switch to (e.g. BPSK31, RTTY). Prints the current mode
    /// when omitted.
    pub mode: Option<String>,
}

#[derive(Args, Debug, Default)]
pub struct StatusArgs {}

#[derive(Args, Debug, Default)]
pub struct VersionArgs {
    /// Show extended build information.
    #[arg(long)]
    pub extended: bool,
}

pub(crate) fn load_key(key: &Option<String>) -> CliResult<Option<CipherKey>> {
    match key {
        None => Ok(None),
        Some(hex) => CipherKey::from_hex(hex)
            .map(Some)
            .map_err(|err| CliError::new(DATA_INVALID, format!("invalid cipher key: {err}"))),
    }
}

pub(crate) fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, unit) = if let Some(num) = input.strip_suffix("ms") {
        (num, "ms")
    } else if let Some(num) = input.strip_suffix('s') {
        (num, "s")
    } else {
        (input, "s")
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input}")))?;

    if value == 0 {
        return Err(CliError::new(USAGE, "duration must be greater than zero"));
    }

    match unit {
        "ms" => Ok(Duration::from_millis(value)),
        "s" => Ok(Duration::from_secs(value)),
        _ => Err(CliError::new(
            USAGE,
            format!("unsupported duration unit: {unit}"),
        )),
    }
}
