//! Frame struct with encode/parse and validation.
//!
//! Represents a complete SMP message: the fixed 8-byte header followed by an
//! opaque CBOR payload. Uses `bytes::Bytes` for zero-copy payload sharing.
//!
//! # Example
//!
//! ```
//! use smp_client::protocol::{op, group, Frame, Header, VERSION_2};
//! use bytes::Bytes;
//!
//! let header = Header::new(VERSION_2, op::WRITE_REQUEST, group::IMAGE, 9, 1, 5);
//! let frame = Frame::new(header, Bytes::from_static(b"hello"));
//!
//! assert!(frame.validate().is_ok());
//! assert_eq!(frame.payload(), b"hello");
//! ```

use bytes::Bytes;

use super::wire_format::{validate_header, Header, HEADER_SIZE};
use crate::error::{Result, SmpError};

/// A complete SMP frame.
#[derive(Debug, Clone)]
pub struct Frame {
    /// Decoded header.
    pub header: Header,
    /// Payload bytes (zero-copy via `bytes::Bytes`).
    pub payload: Bytes,
}

impl Frame {
    /// Create a new frame from header and payload.
    pub fn new(header: Header, payload: Bytes) -> Self {
        Self { header, payload }
    }

    /// Get a reference to the payload bytes.
    #[inline]
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Get the sequence number.
    #[inline]
    pub fn sequence(&self) -> u8 {
        self.header.sequence
    }

    /// Validate the frame for protocol compliance.
    ///
    /// Fails with [`SmpError::FrameValidation`] when the declared payload
    /// length does not match the actual payload size, or when the version
    /// field is not a recognized protocol version.
    pub fn validate(&self) -> Result<()> {
        validate_header(&self.header, self.payload.len())
    }

    /// Encode the frame into its wire representation: header then payload.
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(HEADER_SIZE + self.payload.len());
        buf.extend_from_slice(&self.header.encode());
        buf.extend_from_slice(&self.payload);
        buf
    }

    /// Parse a frame from its wire representation.
    ///
    /// # Errors
    ///
    /// Returns [`SmpError::FrameValidation`] when the buffer is shorter than
    /// the fixed header or the declared payload length does not match the
    /// remaining bytes.
    pub fn parse(data: &[u8]) -> Result<Self> {
        let header = Header::decode(data).ok_or_else(|| {
            SmpError::FrameValidation(format!(
                "frame too small: {} bytes, minimum {}",
                data.len(),
                HEADER_SIZE
            ))
        })?;

        let payload = &data[HEADER_SIZE..];
        if usize::from(header.payload_length) != payload.len() {
            return Err(SmpError::FrameValidation(format!(
                "payload length mismatch: header={}, actual={}",
                header.payload_length,
                payload.len()
            )));
        }

        Ok(Self {
            header,
            payload: Bytes::copy_from_slice(payload),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::wire_format::{cmd_image, group, op, VERSION_2};

    fn sample_header(payload_len: u16) -> Header {
        Header::new(
            VERSION_2,
            op::WRITE_REQUEST,
            group::IMAGE,
            42,
            cmd_image::UPLOAD,
            payload_len,
        )
    }

    #[test]
    fn test_encode_parse_roundtrip() {
        let frame = Frame::new(sample_header(5), Bytes::from_static(b"hello"));
        let bytes = frame.encode();
        assert_eq!(bytes.len(), HEADER_SIZE + 5);

        let parsed = Frame::parse(&bytes).unwrap();
        assert_eq!(parsed.header, frame.header);
        assert_eq!(parsed.payload(), b"hello");
    }

    #[test]
    fn test_parse_too_short() {
        let result = Frame::parse(&[0u8; 4]);
        assert!(matches!(result, Err(SmpError::FrameValidation(_))));
    }

    #[test]
    fn test_parse_length_mismatch() {
        let mut bytes = Frame::new(sample_header(5), Bytes::from_static(b"hello")).encode();
        bytes.truncate(HEADER_SIZE + 3);
        let result = Frame::parse(&bytes);
        assert!(matches!(result, Err(SmpError::FrameValidation(_))));
    }

    #[test]
    fn test_validate_detects_length_mismatch() {
        let frame = Frame::new(sample_header(6), Bytes::from_static(b"hello"));
        assert!(frame.validate().is_err());
    }

    #[test]
    fn test_empty_payload() {
        let frame = Frame::new(sample_header(0), Bytes::new());
        assert!(frame.validate().is_ok());
        let parsed = Frame::parse(&frame.encode()).unwrap();
        assert!(parsed.payload().is_empty());
    }
}
