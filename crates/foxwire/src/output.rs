use std::io::IsTerminal;

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use foxwire_link::{CorruptKind, Direction, Message, MessageBody};
use foxwire_modem::Mode;
use serde::Serialize;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

pub fn print_message(message: &Message, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string(message).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["ID", "DIR", "TIME", "ENC", "MESSAGE"])
                .add_row(vec![
                    message.id.to_string(),
                    direction_label(message.direction).to_string(),
                    message.timestamp.to_string(),
                    if message.encrypted { "yes" } else { "no" }.to_string(),
                    body_label(message),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!(
                "[{}] {} {}{}",
                message.timestamp,
                direction_label(message.direction),
                if message.encrypted { "(sealed) " } else { "" },
                body_label(message)
            );
        }
        OutputFormat::Raw => {
            if let Some(text) = message.text() {
                println!("{text}");
            }
        }
    }
}

#[derive(Serialize)]
pub struct StatusOutput {
    pub addr: String,
    pub mode: String,
    pub busy: bool,
    pub supported_modes: Vec<String>,
}

pub fn print_status(status: &StatusOutput, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string(status).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["MODEM", "MODE", "BUSY", "SUPPORTED"])
                .add_row(vec![
                    status.addr.clone(),
                    status.mode.clone(),
                    if status.busy { "yes" } else { "no" }.to_string(),
                    status.supported_modes.join(", "),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty | OutputFormat::Raw => {
            println!(
                "modem={} mode={} busy={} supported={}",
                status.addr,
                status.mode,
                status.busy,
                status.supported_modes.join(",")
            );
        }
    }
}

pub fn print_mode(mode: Mode, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::json!({ "mode": mode.as_name() }));
        }
        _ => println!("{mode}"),
    }
}

fn direction_label(direction: Direction) -> &'static str {
    match direction {
        Direction::Outbound => "tx",
        Direction::Inbound => "rx",
    }
}

fn body_label(message: &Message) -> String {
    match &message.body {
        MessageBody::Text(text) => text.clone(),
        MessageBody::Corrupt(kind) => match kind {
            CorruptKind::Undecryptable => "<undecryptable message>".to_string(),
            CorruptKind::NoKey => "<encrypted message, no key configured>".to_string(),
            CorruptKind::InvalidUtf8 => "<invalid utf-8 payload>".to_string(),
        },
    }
}
