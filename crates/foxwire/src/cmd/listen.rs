use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use foxwire_link::{LinkConfig, LinkController};
use foxwire_modem::FldigiModem;

use crate::cmd::{load_key, parse_duration, ListenArgs};
use crate::exit::{link_error, CliError, CliResult, SUCCESS};
use crate::output::{print_message, OutputFormat};

pub fn run(args: ListenArgs, modem_addr: &str, format: OutputFormat) -> CliResult<i32> {
    let key = load_key(&args.key)?;
    let interval = parse_duration(&args.interval)?;

    let mut link = LinkController::new(FldigiModem::new(modem_addr), key, LinkConfig::default());

    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(running.clone())?;

    let mut printed = 0usize;
    while running.load(Ordering::SeqCst) {
        let delivered = link
            .poll_receive()
            .map_err(|err| link_error("receive failed", err))?;

        for message in &delivered {
            print_message(message, format);
            printed = printed.saturating_add(1);

            if let Some(count) = args.count {
                if printed >= count {
                    return Ok(SUCCESS);
                }
            }
        }

        thread::sleep(interval);
    }

    Ok(SUCCESS)
}

fn install_ctrlc_handler(running: Arc<AtomicBool>) -> CliResult<()> {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    })
    .map_err(|err| {
        CliError::new(
            crate::exit::INTERNAL,
            format!("signal handler setup failed: {err}"),
        )
    })
}
