use std::thread;
use std::time::{Duration, Instant};

use foxwire_link::{LinkConfig, LinkController, LinkError};
use foxwire_modem::{FldigiModem, Mode};
use tracing::info;

use crate::cmd::{load_key, parse_duration, SendArgs};
use crate::exit::{link_error, CliError, CliResult, SUCCESS, USAGE};
use crate::output::{print_message, OutputFormat};

const BUSY_RETRY_INTERVAL: Duration = Duration::from_millis(500);

pub fn run(args: SendArgs, modem_addr: &str, format: OutputFormat) -> CliResult<i32> {
    if args.encrypt && args.key.is_none() {
        return Err(CliError::new(
            USAGE,
            "--encrypt requires --key or the FOXWIRE_KEY environment variable",
        ));
    }
    let key = load_key(&args.key)?;
    let busy_wait = parse_duration(&args.busy_wait)?;

    let mut link = LinkController::new(FldigiModem::new(modem_addr), key, LinkConfig::default());

    if let Some(name) = &args.mode {
        let mode: Mode = name
            .parse()
            .map_err(|err| CliError::new(USAGE, format!("{err}")))?;
        link.set_operating_mode(mode)
            .map_err(|err| link_error("mode change failed", err))?;
    }

    let deadline = Instant::now() + busy_wait;
    let id = loop {
        match link.send(&args.message, args.encrypt) {
            Ok(id) => break id,
            Err(LinkError::ChannelBusy) if Instant::now() < deadline => {
                thread::sleep(BUSY_RETRY_INTERVAL);
            }
            Err(err) => return Err(link_error("send failed", err)),
        }
    };
    info!(%id, encrypted = args.encrypt, "message accepted for transmission");

    if let Some(message) = link.messages().last() {
        print_message(message, format);
    }
    Ok(SUCCESS)
}
