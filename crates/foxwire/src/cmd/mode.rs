use foxwire_link::{LinkConfig, LinkController};
use foxwire_modem::{FldigiModem, Mode};

use crate::cmd::ModeArgs;
use crate::exit::{link_error, CliError, CliResult, SUCCESS, USAGE};
use crate::output::{print_mode, OutputFormat};

pub fn run(args: ModeArgs, modem_addr: &str, format: OutputFormat) -> CliResult<i32> {
    let mut link = LinkController::new(FldigiModem::new(modem_addr), None, LinkConfig::default());

    match &args.mode {
        Some(name) => {
            let mode: Mode = name
                .parse()
                .map_err(|err| CliError::new(USAGE, format!("{err}")))?;
            link.set_operating_mode(mode)
                .map_err(|err| link_error("mode change failed", err))?;
            print_mode(mode, format);
        }
        None => {
            let mode = link
                .operating_mode()
                .map_err(|err| link_error("mode query failed", err))?;
            print_mode(mode, format);
        }
    }
    Ok(SUCCESS)
}
