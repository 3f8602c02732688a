//! Half-duplex RF link controller.
//!
//! This is the "just works" layer. One [`LinkController`] drives one modem
//! connection: it serializes outbound sends, drains and reassembles inbound
//! frames across poll cycles, and keeps the transmit/receive history. The
//! host schedules [`LinkController::poll_receive`] on a short fixed interval
//! (100–500 ms works well); nothing here blocks waiting for bytes.

pub mod controller;
pub mod error;
pub mod message;

pub use controller::{ChannelState, LinkConfig, LinkController};
pub use error::{LinkError, Result};
pub use message::{CorruptKind, Direction, Message, MessageBody, MessageId};
