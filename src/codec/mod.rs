//! Codec module - structured body serialization.
//!
//! SMP bodies travel as CBOR maps; [`CborCodec`] is the single
//! encode/decode entry point used by every command.

mod cbor;

pub use cbor::CborCodec;
