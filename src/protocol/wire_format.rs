//! Wire format encoding and decoding.
//!
//! Implements the 8-byte SMP header format:
//! ```text
//! ┌───────────────┬───────┬──────────┬──────────┬───────┬─────┬─────┐
//! │ Ver | Op      │ Flags │ Length   │ Reserved │ Group │ Seq │ Cmd │
//! │ byte0         │ byte1 │ 2 bytes  │ byte4    │ byte5 │  6  │  7  │
//! │ (v<<3)|(op&7) │       │ uint16 BE│ (zero)   │       │     │     │
//! └───────────────┴───────┴──────────┴──────────┴───────┴─────┴─────┘
//! ```
//!
//! The payload length is Big Endian; all other fields are single bytes.

use std::sync::atomic::{AtomicU32, Ordering};

use crate::error::{Result, SmpError};

/// Header size in bytes (fixed, exactly 8).
pub const HEADER_SIZE: usize = 8;

/// Legacy SMP protocol version.
pub const VERSION_LEGACY: u8 = 0b00;

/// SMP protocol version 2.
pub const VERSION_2: u8 = 0b01;

/// Operation codes for the header.
pub mod op {
    /// Read request.
    pub const READ_REQUEST: u8 = 0x00;
    /// Read response.
    pub const READ_RESPONSE: u8 = 0x01;
    /// Write request.
    pub const WRITE_REQUEST: u8 = 0x02;
    /// Write response.
    pub const WRITE_RESPONSE: u8 = 0x03;
}

/// Group identifiers.
pub mod group {
    /// OS management group.
    pub const OS: u8 = 0x00;
    /// Image management group.
    pub const IMAGE: u8 = 0x01;
    /// Echo group.
    pub const ECHO: u8 = 0x02;
    /// Log group.
    pub const LOG: u8 = 0x04;
    /// Shell group.
    pub const SHELL: u8 = 0x08;
    /// File system group.
    pub const FS: u8 = 0x09;
    /// Base of the user-defined group range.
    pub const USER_DEFINED: u8 = 0x40;
}

/// Command identifiers for the OS group.
pub mod cmd_os {
    /// Echo command.
    pub const ECHO: u8 = 0x00;
    /// Device reset command.
    pub const RESET: u8 = 0x05;
}

/// Command identifiers for the image group.
pub mod cmd_image {
    /// Image state command.
    pub const STATE: u8 = 0x00;
    /// Image upload command.
    pub const UPLOAD: u8 = 0x01;
    /// Image erase command.
    pub const ERASE: u8 = 0x05;
}

/// Decoded header from wire format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    /// Protocol version (2 bits on the wire).
    pub version: u8,
    /// Operation code (3 bits on the wire).
    pub op: u8,
    /// Flags byte.
    pub flags: u8,
    /// Payload length in bytes.
    pub payload_length: u16,
    /// Group identifier.
    pub group_id: u8,
    /// Sequence number correlating request and response.
    pub sequence: u8,
    /// Command identifier within the group.
    pub command_id: u8,
}

impl Header {
    /// Create a new header with zero flags.
    pub fn new(
        version: u8,
        op: u8,
        group_id: u8,
        sequence: u8,
        command_id: u8,
        payload_length: u16,
    ) -> Self {
        Self {
            version,
            op,
            flags: 0x00,
            payload_length,
            group_id,
            sequence,
            command_id,
        }
    }

    /// Encode header to bytes.
    ///
    /// # Example
    ///
    /// ```
    /// use smp_client::protocol::{op, group, Header, VERSION_2};
    ///
    /// let header = Header::new(VERSION_2, op::WRITE_REQUEST, group::IMAGE, 7, 1, 100);
    /// let bytes = header.encode();
    /// assert_eq!(bytes.len(), 8);
    /// ```
    pub fn encode(&self) -> [u8; HEADER_SIZE] {
        let mut buf = [0u8; HEADER_SIZE];
        buf[0] = (self.version << 3) | (self.op & 0x07);
        buf[1] = self.flags;
        buf[2..4].copy_from_slice(&self.payload_length.to_be_bytes());
        // buf[4] is reserved and stays zero
        buf[5] = self.group_id;
        buf[6] = self.sequence;
        buf[7] = self.command_id;
        buf
    }

    /// Decode header from bytes.
    ///
    /// Returns `None` if the buffer is too short.
    pub fn decode(buf: &[u8]) -> Option<Self> {
        if buf.len() < HEADER_SIZE {
            return None;
        }
        Some(Self {
            version: (buf[0] >> 3) & 0x03,
            op: buf[0] & 0x07,
            flags: buf[1],
            payload_length: u16::from_be_bytes([buf[2], buf[3]]),
            group_id: buf[5],
            sequence: buf[6],
            command_id: buf[7],
        })
    }

    /// Check if the version field is one of the recognized protocol versions.
    #[inline]
    pub fn version_recognized(&self) -> bool {
        self.version == VERSION_LEGACY || self.version == VERSION_2
    }

    /// Check if this is a response op code.
    #[inline]
    pub fn is_response(&self) -> bool {
        self.op == op::READ_RESPONSE || self.op == op::WRITE_RESPONSE
    }
}

/// Per-client frame sequence number generator.
///
/// Owned by each [`SmpClient`](crate::SmpClient) instance so that
/// independent clients in one process never collide on sequence numbers.
/// Wraps modulo 255 and may yield 0 on wrap-around, which the protocol
/// permits.
#[derive(Debug, Default)]
pub struct SequenceCounter(AtomicU32);

impl SequenceCounter {
    /// Create a counter whose first value is 1.
    pub fn new() -> Self {
        Self(AtomicU32::new(0))
    }

    /// Atomically produce the next sequence number.
    pub fn next(&self) -> u8 {
        (self.0.fetch_add(1, Ordering::Relaxed).wrapping_add(1) % 0xff) as u8
    }
}

/// Validate a header/payload pairing for protocol compliance.
///
/// Checks:
/// - the declared payload length equals the actual payload size
/// - the version field is a recognized protocol version
pub fn validate_header(header: &Header, payload_len: usize) -> Result<()> {
    if usize::from(header.payload_length) != payload_len {
        return Err(SmpError::FrameValidation(format!(
            "payload length mismatch: header={}, actual={}",
            header.payload_length, payload_len
        )));
    }

    if !header.version_recognized() {
        return Err(SmpError::FrameValidation(format!(
            "unrecognized version: {}",
            header.version
        )));
    }

    Ok(())
}
