use std::collections::VecDeque;
use std::io::ErrorKind;

use crate::error::{ModemError, Result};
use crate::mode::Mode;
use crate::traits::ModemControl;

/// In-memory fake modem for tests and offline development.
///
/// Transmitted bytes are captured; received bytes are injected. The busy
/// flag and an unavailable switch let tests script channel conditions.
pub struct MockModem {
    mode: Mode,
    supported: Vec<Mode>,
    busy: bool,
    unavailable: bool,
    transmitted: Vec<Vec<u8>>,
    rx_queue: VecDeque<Vec<u8>>,
}

impl MockModem {
    pub fn new() -> Self {
        Self {
            mode: Mode::Psk31,
            supported: Mode::ALL.to_vec(),
            busy: false,
            unavailable: false,
            transmitted: Vec::new(),
            rx_queue: VecDeque::new(),
        }
    }

    /// Restrict the supported-mode set.
    pub fn with_supported_modes(mut self, modes: &[Mode]) -> Self {
        self.supported = modes.to_vec();
        self
    }

    /// Script the channel-busy flag.
    pub fn set_busy(&mut self, busy: bool) {
        self.busy = busy;
    }

    /// Script the modem-process-down condition.
    pub fn set_unavailable(&mut self, unavailable: bool) {
        self.unavailable = unavailable;
    }

    /// Queue bytes to be returned by the next `receive_available` call.
    pub fn inject_rx(&mut self, bytes: impl Into<Vec<u8>>) {
        self.rx_queue.push_back(bytes.into());
    }

    /// Every byte block submitted for transmission, in order.
    pub fn transmitted(&self) -> &[Vec<u8>] {
        &self.transmitted
    }

    fn check_available(&self) -> Result<()> {
        if self.unavailable {
            return Err(ModemError::Unavailable {
                addr: "mock".to_string(),
                source: std::io::Error::new(ErrorKind::ConnectionRefused, "modem offline"),
            });
        }
        Ok(())
    }
}

impl Default for MockModem {
    fn default() -> Self {
        Self::new()
    }
}

impl ModemControl for MockModem {
    fn mode(&mut self) -> Result<Mode> {
        self.check_available()?;
        Ok(self.mode)
    }

    fn set_mode(&mut self, mode: Mode) -> Result<()> {
        self.check_available()?;
        if !self.supported.contains(&mode) {
            return Err(ModemError::UnsupportedMode(mode));
        }
        self.mode = mode;
        Ok(())
    }

    fn supported_modes(&mut self) -> Result<Vec<Mode>> {
        self.check_available()?;
        Ok(self.supported.clone())
    }

    fn is_busy(&mut self) -> Result<bool> {
        self.check_available()?;
        Ok(self.busy)
    }

    fn transmit(&mut self, data: &[u8]) -> Result<()> {
        self.check_available()?;
        self.transmitted.push(data.to_vec());
        Ok(())
    }

    fn receive_available(&mut self) -> Result<Vec<u8>> {
        self.check_available()?;
        Ok(self.rx_queue.pop_front().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn captures_transmissions() {
        let mut modem = MockModem::new();
        modem.transmit(b"abc").unwrap();
        modem.transmit(b"def").unwrap();
        assert_eq!(modem.transmitted(), &[b"abc".to_vec(), b"def".to_vec()]);
    }

    #[test]
    fn drains_injected_rx() {
        let mut modem = MockModem::new();
        modem.inject_rx(b"first".to_vec());
        assert_eq!(modem.receive_available().unwrap(), b"first");
        assert!(modem.receive_available().unwrap().is_empty());
    }

    #[test]
    fn validates_mode_against_supported_set() {
        let mut modem = MockModem::new().with_supported_modes(&[Mode::Psk31, Mode::Rtty]);
        assert!(modem.set_mode(Mode::Rtty).is_ok());
        assert_eq!(modem.mode().unwrap(), Mode::Rtty);
        assert!(matches!(
            modem.set_mode(Mode::Cw).unwrap_err(),
            ModemError::UnsupportedMode(Mode::Cw)
        ));
    }

    #[test]
    fn unavailable_fails_every_call() {
        let mut modem = MockModem::new();
        modem.set_unavailable(true);
        assert!(matches!(
            modem.is_busy().unwrap_err(),
            ModemError::Unavailable { .. }
        ));
        assert!(matches!(
            modem.transmit(b"x").unwrap_err(),
            ModemError::Unavailable { .. }
        ));
        modem.set_unavailable(false);
        assert!(modem.is_busy().is_ok());
    }
}
