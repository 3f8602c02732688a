use crate::error::Result;
use crate::mode::Mode;

/// Capability interface to the external modem process.
///
/// This is the full control/data surface the transport layer needs, and
/// nothing more. Implementations are not required to be thread-safe; one
/// connection is driven by exactly one owner.
pub trait ModemControl {
    /// The modem's current operating mode.
    fn mode(&mut self) -> Result<Mode>;

    /// Switch the modem's operating mode.
    ///
    /// The mode is validated against [`Self::supported_modes`] first;
    /// requesting a mode outside that set fails with
    /// [`crate::ModemError::UnsupportedMode`].
    fn set_mode(&mut self, mode: Mode) -> Result<()>;

    /// The modem's live set of supported modes.
    fn supported_modes(&mut self) -> Result<Vec<Mode>>;

    /// Whether the modem is mid-transmission.
    fn is_busy(&mut self) -> Result<bool>;

    /// Submit bytes for modulation.
    ///
    /// Returns once the bytes are accepted for transmission, not once RF
    /// transmission completes. Not abortable from this layer afterwards.
    fn transmit(&mut self, data: &[u8]) -> Result<()>;

    /// Drain currently decoded receive bytes. Non-blocking; empty when
    /// nothing new has been demodulated.
    fn receive_available(&mut self) -> Result<Vec<u8>>;
}
