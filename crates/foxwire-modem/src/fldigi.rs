use std::time::Duration;

use tracing::debug;

use crate::error::{ModemError, Result};
use crate::mode::Mode;
use crate::traits::ModemControl;
use crate::xmlrpc::{Value, XmlRpcClient};

/// Default fldigi XML-RPC endpoint.
pub const DEFAULT_FLDIGI_ADDR: &str = "127.0.0.1:7362";

/// Default per-call timeout.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// The real modem binding: fldigi driven over its XML-RPC control surface.
pub struct FldigiModem {
    rpc: XmlRpcClient,
}

impl FldigiModem {
    /// Connect parameters for an fldigi instance at `addr` (host:port).
    pub fn new(addr: impl Into<String>) -> Self {
        Self::with_timeout(addr, DEFAULT_TIMEOUT)
    }

    /// Connect parameters with an explicit per-call timeout.
    pub fn with_timeout(addr: impl Into<String>, timeout: Duration) -> Self {
        Self {
            rpc: XmlRpcClient::new(addr, timeout),
        }
    }

    /// The configured endpoint address.
    pub fn addr(&self) -> &str {
        self.rpc.addr()
    }

    fn call_string(&self, method: &str, params: &[Value]) -> Result<String> {
        match self.rpc.call(method, params)? {
            Value::Str(text) => Ok(text),
            Value::Bytes(bytes) => Ok(String::from_utf8_lossy(&bytes).into_owned()),
            other => Err(ModemError::Protocol(format!(
                "{method}: expected string result, got {other:?}"
            ))),
        }
    }
}

impl ModemControl for FldigiModem {
    fn mode(&mut self) -> Result<Mode> {
        let name = self.call_string("modem.get_name", &[])?;
        Mode::from_name(&name)
            .ok_or_else(|| ModemError::Protocol(format!("unrecognized modem mode '{name}'")))
    }

    fn set_mode(&mut self, mode: Mode) -> Result<()> {
        let supported = self.supported_modes()?;
        if !supported.contains(&mode) {
            return Err(ModemError::UnsupportedMode(mode));
        }
        self.rpc
            .call("modem.set_by_name", &[Value::Str(mode.as_name().to_string())])?;
        debug!(%mode, "modem mode set");
        Ok(())
    }

    fn supported_modes(&mut self) -> Result<Vec<Mode>> {
        // Names outside the set this client models are skipped.
        let names = self.rpc.call_strings("modem.get_names", &[])?;
        Ok(names.iter().filter_map(|name| Mode::from_name(name)).collect())
    }

    fn is_busy(&mut self) -> Result<bool> {
        let state = self.call_string("trx.get_state", &[])?;
        Ok(matches!(state.trim(), "TX" | "TUNE"))
    }

    fn transmit(&mut self, data: &[u8]) -> Result<()> {
        self.rpc.call("text.clear_tx", &[])?;
        self.rpc
            .call("text.add_tx_bytes", &[Value::Bytes(data.to_vec())])?;
        self.rpc.call("main.tx", &[])?;
        debug!(bytes = data.len(), "submitted for transmission");
        Ok(())
    }

    fn receive_available(&mut self) -> Result<Vec<u8>> {
        match self.rpc.call("rx.get_data", &[])? {
            Value::Bytes(bytes) => Ok(bytes),
            Value::Str(text) => Ok(text.into_bytes()),
            Value::Nothing => Ok(Vec::new()),
            other => Err(ModemError::Protocol(format!(
                "rx.get_data: expected bytes, got {other:?}"
            ))),
        }
    }
}
