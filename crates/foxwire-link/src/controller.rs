use std::time::{Duration, Instant};

use bytes::BytesMut;
use tracing::{debug, warn};

use foxwire_cipher::{CipherKey, MessageCipher};
use foxwire_frame::{encode_frame, Frame, FrameDecoder};
use foxwire_modem::{Mode, ModemControl, ModemError};

use crate::error::{LinkError, Result};
use crate::message::{now_unix, CorruptKind, Direction, Message, MessageBody, MessageId};

/// What the half-duplex channel is doing right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    Idle,
    /// Our transmission is on the air.
    Sending,
    /// A partial inbound frame is mid-assembly across poll cycles.
    Receiving,
}

/// Link controller tuning.
#[derive(Debug, Clone)]
pub struct LinkConfig {
    /// Maximum message text length in bytes. Default: 2 KiB.
    pub max_message_len: usize,
    /// First receive-poll backoff after the modem goes unavailable.
    pub backoff_initial: Duration,
    /// Backoff ceiling while the modem stays unavailable.
    pub backoff_cap: Duration,
    /// How long a partial inbound frame blocks sending before it is
    /// written off as channel noise.
    pub partial_expiry: Duration,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            max_message_len: 2048,
            backoff_initial: Duration::from_secs(1),
            backoff_cap: Duration::from_secs(30),
            partial_expiry: Duration::from_secs(10),
        }
    }
}

/// State machine coordinating the frame codec and the modem.
///
/// Exactly one controller drives a given modem connection; every method
/// takes `&mut self`, so polling and sending are structurally serialized.
/// Hosts with multiple threads put the controller behind a single lock.
pub struct LinkController<M> {
    modem: M,
    cipher: Option<MessageCipher>,
    config: LinkConfig,
    decoder: FrameDecoder,
    history: Vec<Message>,
    next_id: u64,
    partial_since: Option<Instant>,
    retry_at: Option<Instant>,
    backoff: Duration,
}

impl<M: ModemControl> LinkController<M> {
    /// Build a controller over a modem binding.
    ///
    /// The cipher key is optional: without one, outbound encryption is
    /// refused and inbound encrypted frames surface as corrupt messages.
    pub fn new(modem: M, key: Option<CipherKey>, config: LinkConfig) -> Self {
        let backoff = config.backoff_initial;
        Self {
            modem,
            cipher: key.map(|key| MessageCipher::new(&key)),
            config,
            decoder: FrameDecoder::new(),
            history: Vec::new(),
            next_id: 0,
            partial_since: None,
            retry_at: None,
            backoff,
        }
    }

    /// Queue a message for transmission.
    ///
    /// Fails with [`LinkError::ChannelBusy`] while the channel is
    /// mid-transmission or a fresh partial inbound frame is mid-assembly;
    /// both are retryable. A failed send is always reported — nothing is
    /// silently dropped. On success the message is in the modem's hands
    /// and can no longer be cancelled from this layer.
    pub fn send(&mut self, text: &str, encrypt: bool) -> Result<MessageId> {
        if text.len() > self.config.max_message_len {
            return Err(LinkError::MessageTooLarge {
                size: text.len(),
                max: self.config.max_message_len,
            });
        }

        let payload = match (&self.cipher, encrypt) {
            (Some(cipher), true) => cipher.encrypt(text.as_bytes())?,
            (None, true) => return Err(LinkError::NoCipherKey),
            (_, false) => text.as_bytes().to_vec(),
        };

        if self.modem.is_busy()? {
            debug!("send refused: channel mid-transmission");
            return Err(LinkError::ChannelBusy);
        }
        if self.partial_inbound_fresh() {
            debug!("send refused: partial inbound frame mid-assembly");
            return Err(LinkError::ChannelBusy);
        }

        let mut wire = BytesMut::new();
        encode_frame(&payload, encrypt, &mut wire)?;
        self.modem.transmit(&wire)?;

        let id = self.alloc_id();
        self.history.push(Message {
            id,
            direction: Direction::Outbound,
            timestamp: now_unix(),
            encrypted: encrypt,
            body: MessageBody::Text(text.to_string()),
        });
        debug!(%id, bytes = wire.len(), encrypted = encrypt, "message accepted for transmission");
        Ok(id)
    }

    /// Drain the modem's receive side and deliver every complete message.
    ///
    /// Never blocks; safe to call on a fixed interval. With no new bytes
    /// this returns an empty sequence and leaves the residual buffer
    /// untouched. A modem that is down (or timing out) yields an empty
    /// result and starts an exponential backoff window instead of an error.
    pub fn poll_receive(&mut self) -> Result<Vec<Message>> {
        if let Some(at) = self.retry_at {
            if Instant::now() < at {
                return Ok(Vec::new());
            }
            self.retry_at = None;
        }

        let bytes = match self.modem.receive_available() {
            Ok(bytes) => {
                self.backoff = self.config.backoff_initial;
                bytes
            }
            Err(err @ (ModemError::Unavailable { .. } | ModemError::Timeout(_))) => {
                warn!(%err, backoff = ?self.backoff, "modem not answering, backing off");
                self.retry_at = Some(Instant::now() + self.backoff);
                self.backoff = (self.backoff * 2).min(self.config.backoff_cap);
                return Ok(Vec::new());
            }
            Err(err) => return Err(err.into()),
        };

        let frames = self.decoder.feed(&bytes);
        self.track_partial();

        let mut delivered = Vec::with_capacity(frames.len());
        for frame in frames {
            let message = self.deliver(frame);
            self.history.push(message.clone());
            delivered.push(message);
        }
        Ok(delivered)
    }

    /// Switch the modem's operating mode.
    ///
    /// Refused while a transmission is in flight; the modem binding
    /// validates the mode against its live supported set.
    pub fn set_operating_mode(&mut self, mode: Mode) -> Result<()> {
        if self.modem.is_busy()? {
            return Err(LinkError::ModeChangeWhileBusy);
        }
        self.modem.set_mode(mode)?;
        Ok(())
    }

    /// The modem's current operating mode.
    pub fn operating_mode(&mut self) -> Result<Mode> {
        Ok(self.modem.mode()?)
    }

    /// The modem's live set of supported modes.
    pub fn supported_modes(&mut self) -> Result<Vec<Mode>> {
        Ok(self.modem.supported_modes()?)
    }

    /// Whether the channel is currently mid-transmission.
    pub fn channel_busy(&mut self) -> Result<bool> {
        Ok(self.modem.is_busy()?)
    }

    /// Snapshot of the channel state. Queries the modem for the busy flag.
    pub fn state(&mut self) -> Result<ChannelState> {
        if self.modem.is_busy()? {
            return Ok(ChannelState::Sending);
        }
        if self.partial_inbound_fresh() {
            return Ok(ChannelState::Receiving);
        }
        Ok(ChannelState::Idle)
    }

    /// Chronological transmit/receive history.
    pub fn messages(&self) -> &[Message] {
        &self.history
    }

    /// Borrow the underlying modem binding.
    pub fn modem(&self) -> &M {
        &self.modem
    }

    /// Mutably borrow the underlying modem binding.
    pub fn modem_mut(&mut self) -> &mut M {
        &mut self.modem
    }

    fn deliver(&mut self, frame: Frame) -> Message {
        let encrypted = frame.encrypted();
        let body = if encrypted {
            match &self.cipher {
                None => {
                    warn!("encrypted message received but no key is configured");
                    MessageBody::Corrupt(CorruptKind::NoKey)
                }
                Some(cipher) => match cipher.decrypt(&frame.payload) {
                    Ok(plain) => into_text_body(plain),
                    Err(err) => {
                        warn!(%err, "undecryptable message received");
                        MessageBody::Corrupt(CorruptKind::Undecryptable)
                    }
                },
            }
        } else {
            into_text_body(frame.payload.to_vec())
        };

        Message {
            id: self.alloc_id(),
            direction: Direction::Inbound,
            timestamp: now_unix(),
            encrypted,
            body,
        }
    }

    fn track_partial(&mut self) {
        if self.decoder.has_partial() {
            if self.partial_since.is_none() {
                self.partial_since = Some(Instant::now());
            }
        } else {
            self.partial_since = None;
        }
    }

    fn partial_inbound_fresh(&self) -> bool {
        self.decoder.has_partial()
            && self
                .partial_since
                .map_or(true, |since| since.elapsed() < self.config.partial_expiry)
    }

    fn alloc_id(&mut self) -> MessageId {
        self.next_id += 1;
        MessageId(self.next_id)
    }
}

fn into_text_body(bytes: Vec<u8>) -> MessageBody {
    match String::from_utf8(bytes) {
        Ok(text) => MessageBody::Text(text),
        Err(_) => MessageBody::Corrupt(CorruptKind::InvalidUtf8),
    }
}

#[cfg(test)]
mod tests {
    use foxwire_cipher::KEY_SIZE;
    use foxwire_modem::MockModem;

    use super::*;

    fn key(byte: u8) -> CipherKey {
        CipherKey::from_bytes(&[byte; KEY_SIZE]).unwrap()
    }

    fn controller(key: Option<CipherKey>) -> LinkController<MockModem> {
        LinkController::new(MockModem::new(), key, LinkConfig::default())
    }

    fn wire_for(text: &str, encrypted: bool) -> Vec<u8> {
        let mut buf = BytesMut::new();
        encode_frame(text.as_bytes(), encrypted, &mut buf).unwrap();
        buf.to_vec()
    }

    #[test]
    fn send_frames_the_message() {
        let mut link = controller(None);
        let id = link.send("HELLO", false).unwrap();
        assert_eq!(id, MessageId(1));

        let transmitted = link.modem().transmitted();
        assert_eq!(transmitted.len(), 1);

        let mut decoder = FrameDecoder::new();
        let frames = decoder.feed(&transmitted[0]);
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].payload.as_ref(), b"HELLO");
        assert!(!frames[0].encrypted());
    }

    #[test]
    fn send_while_busy_is_rejected_without_transmit() {
        let mut link = controller(None);
        link.modem_mut().set_busy(true);

        let err = link.send("blocked", false).unwrap_err();
        assert!(matches!(err, LinkError::ChannelBusy));
        assert!(link.modem().transmitted().is_empty());
        assert!(link.messages().is_empty());
    }

    #[test]
    fn send_encrypted_roundtrips_through_cipher() {
        let mut link = controller(Some(key(0x11)));
        link.send("secret", true).unwrap();

        let transmitted = link.modem().transmitted()[0].clone();
        let mut decoder = FrameDecoder::new();
        let frames = decoder.feed(&transmitted);
        assert!(frames[0].encrypted());

        let cipher = MessageCipher::new(&key(0x11));
        assert_eq!(cipher.decrypt(&frames[0].payload).unwrap(), b"secret");
    }

    #[test]
    fn send_encrypted_without_key_is_refused() {
        let mut link = controller(None);
        let err = link.send("secret", true).unwrap_err();
        assert!(matches!(err, LinkError::NoCipherKey));
        assert!(link.modem().transmitted().is_empty());
    }

    #[test]
    fn oversized_message_is_refused() {
        let mut link = controller(None);
        let text = "x".repeat(4000);
        let err = link.send(&text, false).unwrap_err();
        assert!(matches!(err, LinkError::MessageTooLarge { .. }));
    }

    #[test]
    fn send_failure_is_reported() {
        let mut link = controller(None);
        link.modem_mut().set_unavailable(true);
        let err = link.send("lost?", false).unwrap_err();
        assert!(matches!(err, LinkError::Modem(ModemError::Unavailable { .. })));
    }

    #[test]
    fn poll_delivers_inbound_message() {
        let mut link = controller(None);
        link.modem_mut().inject_rx(wire_for("CQ CQ", false));

        let delivered = link.poll_receive().unwrap();
        assert_eq!(delivered.len(), 1);
        assert_eq!(delivered[0].text(), Some("CQ CQ"));
        assert_eq!(delivered[0].direction, Direction::Inbound);
        assert!(!delivered[0].encrypted);
    }

    #[test]
    fn poll_with_nothing_new_is_idempotent() {
        let mut link = controller(None);
        let partial = wire_for("pending", false);
        link.modem_mut().inject_rx(partial[..4].to_vec());
        assert!(link.poll_receive().unwrap().is_empty());

        let pending = link.decoder.pending();
        assert!(link.poll_receive().unwrap().is_empty());
        assert_eq!(link.decoder.pending(), pending);
        assert!(link.messages().is_empty());
    }

    #[test]
    fn partial_frame_completes_across_polls() {
        let mut link = controller(None);
        let wire = wire_for("two-part", false);
        let split = wire.len() / 2;
        link.modem_mut().inject_rx(wire[..split].to_vec());
        link.modem_mut().inject_rx(wire[split..].to_vec());

        assert!(link.poll_receive().unwrap().is_empty());
        let delivered = link.poll_receive().unwrap();
        assert_eq!(delivered.len(), 1);
        assert_eq!(delivered[0].text(), Some("two-part"));
    }

    #[test]
    fn encrypted_inbound_decrypts_with_matching_key() {
        let mut link = controller(Some(key(0x22)));
        let cipher = MessageCipher::new(&key(0x22));
        let sealed = cipher.encrypt(b"for your eyes").unwrap();

        let mut buf = BytesMut::new();
        encode_frame(&sealed, true, &mut buf).unwrap();
        link.modem_mut().inject_rx(buf.to_vec());

        let delivered = link.poll_receive().unwrap();
        assert_eq!(delivered[0].text(), Some("for your eyes"));
        assert!(delivered[0].encrypted);
    }

    #[test]
    fn wrong_key_surfaces_corrupt_message() {
        let mut link = controller(Some(key(0x33)));
        let sealed = MessageCipher::new(&key(0x44)).encrypt(b"mismatch").unwrap();

        let mut buf = BytesMut::new();
        encode_frame(&sealed, true, &mut buf).unwrap();
        link.modem_mut().inject_rx(buf.to_vec());

        let delivered = link.poll_receive().unwrap();
        assert_eq!(delivered.len(), 1);
        assert_eq!(
            delivered[0].body,
            MessageBody::Corrupt(CorruptKind::Undecryptable)
        );
    }

    #[test]
    fn encrypted_inbound_without_key_surfaces_corrupt_message() {
        let mut link = controller(None);
        let sealed = MessageCipher::new(&key(0x55)).encrypt(b"sealed").unwrap();

        let mut buf = BytesMut::new();
        encode_frame(&sealed, true, &mut buf).unwrap();
        link.modem_mut().inject_rx(buf.to_vec());

        let delivered = link.poll_receive().unwrap();
        assert_eq!(delivered[0].body, MessageBody::Corrupt(CorruptKind::NoKey));
    }

    #[test]
    fn non_utf8_plaintext_surfaces_corrupt_message() {
        let mut link = controller(None);
        let mut buf = BytesMut::new();
        encode_frame(&[0xFF, 0xFE, 0xFD], false, &mut buf).unwrap();
        link.modem_mut().inject_rx(buf.to_vec());

        let delivered = link.poll_receive().unwrap();
        assert_eq!(
            delivered[0].body,
            MessageBody::Corrupt(CorruptKind::InvalidUtf8)
        );
    }

    #[test]
    fn unavailable_modem_polls_empty_and_backs_off() {
        let mut link = controller(None);
        link.modem_mut().set_unavailable(true);
        assert!(link.poll_receive().unwrap().is_empty());

        // Back up and queue real data; the backoff window still applies.
        link.modem_mut().set_unavailable(false);
        link.modem_mut().inject_rx(wire_for("late", false));
        assert!(link.poll_receive().unwrap().is_empty());
    }

    #[test]
    fn backoff_window_expires_and_polling_resumes() {
        let config = LinkConfig {
            backoff_initial: Duration::ZERO,
            ..LinkConfig::default()
        };
        let mut link = LinkController::new(MockModem::new(), None, config);
        link.modem_mut().set_unavailable(true);
        assert!(link.poll_receive().unwrap().is_empty());

        link.modem_mut().set_unavailable(false);
        link.modem_mut().inject_rx(wire_for("recovered", false));
        let delivered = link.poll_receive().unwrap();
        assert_eq!(delivered.len(), 1);
        assert_eq!(delivered[0].text(), Some("recovered"));
    }

    #[test]
    fn fresh_partial_inbound_blocks_send() {
        let mut link = controller(None);
        link.modem_mut().inject_rx(wire_for("half-received", false)[..6].to_vec());
        assert!(link.poll_receive().unwrap().is_empty());

        let err = link.send("interrupting", false).unwrap_err();
        assert!(matches!(err, LinkError::ChannelBusy));
        assert_eq!(link.state().unwrap(), ChannelState::Receiving);
    }

    #[test]
    fn expired_partial_no_longer_blocks_send() {
        let config = LinkConfig {
            partial_expiry: Duration::ZERO,
            ..LinkConfig::default()
        };
        let mut link = LinkController::new(MockModem::new(), None, config);
        link.modem_mut().inject_rx(wire_for("stale", false)[..6].to_vec());
        assert!(link.poll_receive().unwrap().is_empty());

        assert!(link.send("goes through", false).is_ok());
        assert_eq!(link.state().unwrap(), ChannelState::Idle);
    }

    #[test]
    fn mode_change_refused_while_busy() {
        let mut link = controller(None);
        link.modem_mut().set_busy(true);
        let err = link.set_operating_mode(Mode::Rtty).unwrap_err();
        assert!(matches!(err, LinkError::ModeChangeWhileBusy));
        assert_eq!(link.state().unwrap(), ChannelState::Sending);
    }

    #[test]
    fn mode_change_forwards_to_modem() {
        let mut link = controller(None);
        link.set_operating_mode(Mode::Rtty).unwrap();
        assert_eq!(link.operating_mode().unwrap(), Mode::Rtty);
    }

    #[test]
    fn unsupported_mode_is_a_configuration_error() {
        let modem = MockModem::new().with_supported_modes(&[Mode::Psk31]);
        let mut link = LinkController::new(modem, None, LinkConfig::default());
        let err = link.set_operating_mode(Mode::Cw).unwrap_err();
        assert!(matches!(
            err,
            LinkError::Modem(ModemError::UnsupportedMode(Mode::Cw))
        ));
    }

    #[test]
    fn history_is_chronological_with_increasing_ids() {
        let mut link = controller(None);
        link.send("first out", false).unwrap();
        link.modem_mut().inject_rx(wire_for("then in", false));
        link.poll_receive().unwrap();
        link.send("last out", false).unwrap();

        let history = link.messages();
        assert_eq!(history.len(), 3);
        assert_eq!(history[0].direction, Direction::Outbound);
        assert_eq!(history[1].direction, Direction::Inbound);
        assert_eq!(history[2].direction, Direction::Outbound);
        assert!(history.windows(2).all(|pair| pair[0].id < pair[1].id));
    }
}
