//! CBOR codec using `ciborium`.
//!
//! SMP request and response bodies are CBOR maps keyed by field name.
//! `ciborium` serializes serde structs as maps by default, which is exactly
//! what the device firmware expects; optional fields are omitted entirely
//! when absent rather than encoded as nulls.
//!
//! # Example
//!
//! ```
//! use smp_client::codec::CborCodec;
//! use serde::{Serialize, Deserialize};
//!
//! #[derive(Serialize, Deserialize, PartialEq, Debug)]
//! struct Body {
//!     off: u32,
//! }
//!
//! let body = Body { off: 512 };
//! let encoded = CborCodec::encode(&body).unwrap();
//! let decoded: Body = CborCodec::decode(&encoded).unwrap();
//! assert_eq!(decoded, body);
//! ```

use crate::error::Result;

/// CBOR codec for structured request/response bodies.
pub struct CborCodec;

impl CborCodec {
    /// Encode a value to CBOR bytes.
    ///
    /// # Errors
    ///
    /// Returns error if the value cannot be serialized.
    pub fn encode<T: serde::Serialize>(value: &T) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        ciborium::ser::into_writer(value, &mut buf)?;
        Ok(buf)
    }

    /// Decode CBOR bytes to a value.
    ///
    /// # Errors
    ///
    /// Returns error if the bytes cannot be deserialized to type T.
    pub fn decode<T: serde::de::DeserializeOwned>(bytes: &[u8]) -> Result<T> {
        Ok(ciborium::de::from_reader(bytes)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Serialize, Deserialize, PartialEq, Debug)]
    struct TestBody {
        off: u32,
        #[serde(skip_serializing_if = "Option::is_none")]
        len: Option<u32>,
    }

    #[test]
    fn test_encode_decode_struct() {
        let original = TestBody {
            off: 1024,
            len: Some(4096),
        };
        let encoded = CborCodec::encode(&original).unwrap();
        let decoded: TestBody = CborCodec::decode(&encoded).unwrap();
        assert_eq!(decoded, original);
    }

    #[test]
    fn test_struct_encodes_as_map() {
        let body = TestBody { off: 1, len: None };
        let encoded = CborCodec::encode(&body).unwrap();

        // CBOR major type 5 (map) with one entry: 0xa1
        assert_eq!(encoded[0], 0xa1, "expected a one-entry CBOR map");
    }

    #[test]
    fn test_absent_option_is_omitted_not_null() {
        let body = TestBody { off: 1, len: None };
        let encoded = CborCodec::encode(&body).unwrap();

        // CBOR null is 0xf6; it must not appear for a skipped field.
        assert!(!encoded.contains(&0xf6));
    }

    #[test]
    fn test_missing_option_decodes_as_none() {
        let encoded = CborCodec::encode(&TestBody { off: 7, len: None }).unwrap();
        let decoded: TestBody = CborCodec::decode(&encoded).unwrap();
        assert_eq!(decoded.off, 7);
        assert_eq!(decoded.len, None);
    }

    #[test]
    fn test_byte_fields_encode_as_byte_strings() {
        #[derive(Serialize, Deserialize, PartialEq, Debug)]
        struct Blob {
            data: serde_bytes::ByteBuf,
        }

        let blob = Blob {
            data: serde_bytes::ByteBuf::from(vec![1u8, 2, 3, 4, 5]),
        };
        let encoded = CborCodec::encode(&blob).unwrap();

        // Map key "data" followed by a definite-length byte string (major
        // type 2): 0x45 for five bytes.
        assert!(encoded.windows(1).any(|w| w[0] == 0x45));

        let decoded: Blob = CborCodec::decode(&encoded).unwrap();
        assert_eq!(decoded, blob);
    }

    #[test]
    fn test_decode_error_on_invalid_data() {
        let invalid = b"not valid cbor at all";
        let result: Result<TestBody> = CborCodec::decode(invalid);
        assert!(result.is_err());
    }

    #[test]
    fn test_decode_error_on_wrong_shape() {
        let encoded = CborCodec::encode(&vec![1u32, 2, 3]).unwrap();
        let result: Result<TestBody> = CborCodec::decode(&encoded);
        assert!(result.is_err());
    }
}
