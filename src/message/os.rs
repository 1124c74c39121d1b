//! OS group command bodies.

use serde::{Deserialize, Serialize};

use super::ErrorResponse;

/// Body of an OS reset request.
///
/// `force` asks the device to reboot even when it would normally refuse,
/// e.g. while a firmware slot is still being validated.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResetRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub force: Option<bool>,
}

impl ResetRequest {
    /// Build a reset request; `force` is only encoded when set.
    pub fn new(force: bool) -> Self {
        Self {
            force: force.then_some(true),
        }
    }
}

/// Body of an OS reset response.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResetResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub err: Option<ErrorResponse>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::CborCodec;

    #[test]
    fn test_force_false_is_omitted() {
        let encoded = CborCodec::encode(&ResetRequest::new(false)).unwrap();
        // Empty CBOR map.
        assert_eq!(encoded, vec![0xa0]);
    }

    #[test]
    fn test_force_true_is_encoded() {
        let encoded = CborCodec::encode(&ResetRequest::new(true)).unwrap();
        let decoded: ResetRequest = CborCodec::decode(&encoded).unwrap();
        assert_eq!(decoded.force, Some(true));
    }

    #[test]
    fn test_empty_response_body() {
        let decoded: ResetResponse = CborCodec::decode(&[0xa0]).unwrap();
        assert!(decoded.err.is_none());
    }
}
