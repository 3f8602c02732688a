//! Minimal XML-RPC client for the fldigi control surface.
//!
//! fldigi's RPC vocabulary is small and flat — scalar params, scalar or
//! string-array results — so this codec handles exactly that subset: method
//! call marshalling, string/base64/boolean/int scalars, fault detection.
//! One short-lived TCP connection per call; a restarting modem process can
//! never wedge a held socket.

use std::io::{ErrorKind, Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use tracing::trace;

use crate::error::{ModemError, Result};

/// An XML-RPC scalar.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Value {
    Nothing,
    Bool(bool),
    Int(i32),
    Str(String),
    Bytes(Vec<u8>),
}

pub(crate) struct XmlRpcClient {
    addr: String,
    timeout: Duration,
}

impl XmlRpcClient {
    pub(crate) fn new(addr: impl Into<String>, timeout: Duration) -> Self {
        Self {
            addr: addr.into(),
            timeout,
        }
    }

    pub(crate) fn addr(&self) -> &str {
        &self.addr
    }

    /// Invoke a method expecting a scalar (or empty) result.
    pub(crate) fn call(&self, method: &str, params: &[Value]) -> Result<Value> {
        let body = self.exchange(method, params)?;
        if let Some(fault) = parse_fault(&body) {
            return Err(fault);
        }
        parse_scalar(&body)
    }

    /// Invoke a method expecting an array-of-strings result.
    pub(crate) fn call_strings(&self, method: &str, params: &[Value]) -> Result<Vec<String>> {
        let body = self.exchange(method, params)?;
        if let Some(fault) = parse_fault(&body) {
            return Err(fault);
        }
        Ok(extract_all(&body, "string").into_iter().map(unescape).collect())
    }

    fn exchange(&self, method: &str, params: &[Value]) -> Result<String> {
        let request = render_call(method, params);
        trace!(method, addr = %self.addr, "xmlrpc call");

        let mut stream = self.connect()?;
        let http = format!(
            "POST /RPC2 HTTP/1.0\r\n\
             Host: {}\r\n\
             Content-Type: text/xml\r\n\
             Content-Length: {}\r\n\
             \r\n\
             {}",
            self.addr,
            request.len(),
            request
        );
        stream
            .write_all(http.as_bytes())
            .map_err(|err| self.io_error(err))?;

        let mut response = Vec::new();
        stream
            .read_to_end(&mut response)
            .map_err(|err| self.io_error(err))?;
        let response = String::from_utf8_lossy(&response);

        let Some((head, body)) = response.split_once("\r\n\r\n") else {
            return Err(ModemError::Protocol("truncated HTTP response".to_string()));
        };
        let status = head.lines().next().unwrap_or_default();
        if !status.contains("200") {
            return Err(ModemError::Protocol(format!("HTTP error: {status}")));
        }
        Ok(body.to_string())
    }

    fn connect(&self) -> Result<TcpStream> {
        let addrs = self
            .addr
            .to_socket_addrs()
            .map_err(|err| self.io_error(err))?;

        let mut last_err = None;
        for addr in addrs {
            match TcpStream::connect_timeout(&addr, self.timeout) {
                Ok(stream) => {
                    stream
                        .set_read_timeout(Some(self.timeout))
                        .map_err(|err| self.io_error(err))?;
                    stream
                        .set_write_timeout(Some(self.timeout))
                        .map_err(|err| self.io_error(err))?;
                    return Ok(stream);
                }
                Err(err) => last_err = Some(err),
            }
        }
        Err(self.io_error(last_err.unwrap_or_else(|| {
            std::io::Error::new(ErrorKind::AddrNotAvailable, "no addresses resolved")
        })))
    }

    fn io_error(&self, err: std::io::Error) -> ModemError {
        match err.kind() {
            ErrorKind::TimedOut | ErrorKind::WouldBlock => ModemError::Timeout(self.timeout),
            _ => ModemError::Unavailable {
                addr: self.addr.clone(),
                source: err,
            },
        }
    }
}

fn render_call(method: &str, params: &[Value]) -> String {
    let mut xml = String::from("<?xml version=\"1.0\"?><methodCall><methodName>");
    xml.push_str(method);
    xml.push_str("</methodName><params>");
    for param in params {
        xml.push_str("<param><value>");
        match param {
            Value::Nothing => {}
            Value::Bool(flag) => {
                xml.push_str("<boolean>");
                xml.push(if *flag { '1' } else { '0' });
                xml.push_str("</boolean>");
            }
            Value::Int(num) => {
                xml.push_str("<i4>");
                xml.push_str(&num.to_string());
                xml.push_str("</i4>");
            }
            Value::Str(text) => {
                xml.push_str("<string>");
                xml.push_str(&escape(text));
                xml.push_str("</string>");
            }
            Value::Bytes(bytes) => {
                xml.push_str("<base64>");
                xml.push_str(&BASE64.encode(bytes));
                xml.push_str("</base64>");
            }
        }
        xml.push_str("</value></param>");
    }
    xml.push_str("</params></methodCall>");
    xml
}

fn parse_fault(body: &str) -> Option<ModemError> {
    let fault = extract(body, "fault")?;
    let code = extract(fault, "i4")
        .or_else(|| extract(fault, "int"))
        .and_then(|num| num.trim().parse().ok())
        .unwrap_or(0);
    let message = extract(fault, "string")
        .map(unescape)
        .unwrap_or_else(|| "unknown fault".to_string());
    Some(ModemError::Fault { code, message })
}

fn parse_scalar(body: &str) -> Result<Value> {
    let Some(value) = extract(body, "value") else {
        return Ok(Value::Nothing);
    };
    if let Some(b64) = extract(value, "base64") {
        let compact: String = b64.chars().filter(|c| !c.is_whitespace()).collect();
        return BASE64
            .decode(compact.as_bytes())
            .map(Value::Bytes)
            .map_err(|err| ModemError::Protocol(format!("bad base64 payload: {err}")));
    }
    if let Some(flag) = extract(value, "boolean") {
        return Ok(Value::Bool(flag.trim() == "1"));
    }
    if let Some(num) = extract(value, "i4").or_else(|| extract(value, "int")) {
        return num
            .trim()
            .parse()
            .map(Value::Int)
            .map_err(|err| ModemError::Protocol(format!("bad integer payload: {err}")));
    }
    if let Some(text) = extract(value, "string") {
        return Ok(Value::Str(unescape(text)));
    }
    // Untyped <value> content is a string per the XML-RPC spec.
    Ok(Value::Str(unescape(value.trim())))
}

fn extract<'a>(source: &'a str, tag: &str) -> Option<&'a str> {
    let open = format!("<{tag}>");
    let close = format!("</{tag}>");
    let start = source.find(&open)? + open.len();
    let len = source[start..].find(&close)?;
    Some(&source[start..start + len])
}

fn extract_all<'a>(source: &'a str, tag: &str) -> Vec<&'a str> {
    let open = format!("<{tag}>");
    let close = format!("</{tag}>");
    let mut out = Vec::new();
    let mut rest = source;
    while let Some(pos) = rest.find(&open) {
        let start = pos + open.len();
        let Some(len) = rest[start..].find(&close) else {
            break;
        };
        out.push(&rest[start..start + len]);
        rest = &rest[start + len + close.len()..];
    }
    out
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
    out
}

fn unescape(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}
