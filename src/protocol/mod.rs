//! Protocol module - wire format and frame types.
//!
//! This module implements the SMP binary envelope:
//! - 8-byte header encoding/decoding
//! - Frame struct with validation
//! - Per-client sequence number generation

mod frame;
mod wire_format;

pub use frame::Frame;
pub use wire_format::{
    cmd_image, cmd_os, group, op, validate_header, Header, SequenceCounter, HEADER_SIZE,
    VERSION_2, VERSION_LEGACY,
};
