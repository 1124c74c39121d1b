//! Transport abstraction.
//!
//! A [`Transport`] carries one SMP request frame to the device and returns
//! the matching response frame. The client is transport-agnostic: serial,
//! BLE, and UDP carriers all present the same request/response surface.
//!
//! # Contract
//!
//! - `send` covers one full exchange: write the frame, wait for the
//!   response. The implementation enforces its own per-exchange deadline
//!   and maps a missing response to [`SmpError::Timeout`].
//! - Implementations must be safe to call from multiple tasks at once;
//!   the upload engine keeps several exchanges in flight.
//!
//! [`SmpError::Timeout`]: crate::error::SmpError::Timeout

use std::collections::HashMap;

use async_trait::async_trait;

use crate::error::Result;
use crate::protocol::Frame;

/// Carrier-specific connection parameters as string key/value pairs.
///
/// Keys are carrier-defined, e.g. a serial transport reads `device` and
/// `baud`, a BLE transport reads `peripheral_id`.
#[derive(Debug, Clone, Default)]
pub struct ConnectParams {
    params: HashMap<String, String>,
}

impl ConnectParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a parameter, replacing any previous value.
    pub fn set(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// Look up a parameter.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    /// Look up a parameter, falling back to a default.
    pub fn get_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.get(key).unwrap_or(default)
    }
}

/// A bidirectional carrier for SMP frames.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Establish the connection to the device.
    async fn connect(&self, params: &ConnectParams) -> Result<()>;

    /// Perform one request/response exchange.
    ///
    /// # Errors
    ///
    /// Returns [`SmpError::Timeout`] when no response arrives within the
    /// transport's deadline, or a transport-specific error when the
    /// exchange fails outright.
    ///
    /// [`SmpError::Timeout`]: crate::error::SmpError::Timeout
    async fn send(&self, frame: Frame) -> Result<Frame>;

    /// Tear down the connection.
    async fn close(&self) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connect_params_lookup() {
        let params = ConnectParams::new()
            .set("device", "/dev/ttyACM0")
            .set("baud", "115200");

        assert_eq!(params.get("device"), Some("/dev/ttyACM0"));
        assert_eq!(params.get("missing"), None);
        assert_eq!(params.get_or("baud", "9600"), "115200");
        assert_eq!(params.get_or("mtu", "256"), "256");
    }
}
