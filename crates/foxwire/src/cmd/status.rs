use foxwire_link::{LinkConfig, LinkController};
use foxwire_modem::{FldigiModem, Mode};

use crate::cmd::StatusArgs;
use crate::exit::{link_error, CliResult, SUCCESS};
use crate::output::{print_status, OutputFormat, StatusOutput};

pub fn run(_args: StatusArgs, modem_addr: &str, format: OutputFormat) -> CliResult<i32> {
    let mut link = LinkController::new(FldigiModem::new(modem_addr), None, LinkConfig::default());

    let mode = link
        .operating_mode()
        .map_err(|err| link_error("mode query failed", err))?;
    let busy = link
        .channel_busy()
        .map_err(|err| link_error("busy query failed", err))?;
    let supported = link
        .supported_modes()
        .map_err(|err| link_error("mode list query failed", err))?;

    let status = StatusOutput {
        addr: modem_addr.to_string(),
        mode: mode.as_name().to_string(),
        busy,
        supported_modes: supported.iter().map(|m| Mode::as_name(*m).to_string()).collect(),
    };
    print_status(&status, format);
    Ok(SUCCESS)
}
