//! Image group command bodies.
//!
//! The upload request follows the firmware's expectations closely: the first
//! chunk (offset zero) carries the total image length, target image number,
//! the SHA-256 of the whole image, and the upgrade-only flag; subsequent
//! chunks carry only offset and data. Fields with default values are omitted
//! from the encoded map entirely.

use serde::{Deserialize, Serialize};
use serde_bytes::ByteBuf;

use super::ErrorResponse;

/// One chunk of a firmware image upload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageUploadRequest {
    /// Target image number; omitted for image zero.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<u32>,
    /// Total image length; present only on the first chunk.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub len: Option<u32>,
    /// Byte offset of this chunk within the image.
    pub off: u32,
    /// SHA-256 of the complete image; present only on the first chunk.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha: Option<ByteBuf>,
    /// Chunk payload.
    pub data: ByteBuf,
    /// Mark the uploaded image for upgrade only; present only on the first
    /// chunk and omitted when false.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upgrade: Option<bool>,
}

impl ImageUploadRequest {
    /// Build the request for the chunk starting at `off`.
    ///
    /// Only the first chunk announces the image metadata; every later chunk
    /// is offset plus data.
    pub fn for_chunk(
        image: u32,
        off: u32,
        data: Vec<u8>,
        total_len: u32,
        sha: &[u8; 32],
        upgrade: bool,
    ) -> Self {
        if off == 0 {
            Self {
                image: (image != 0).then_some(image),
                len: (total_len != 0).then_some(total_len),
                off,
                sha: Some(ByteBuf::from(sha.to_vec())),
                data: ByteBuf::from(data),
                upgrade: upgrade.then_some(true),
            }
        } else {
            Self {
                image: None,
                len: None,
                off,
                sha: None,
                data: ByteBuf::from(data),
                upgrade: None,
            }
        }
    }
}

/// Device response to one upload chunk.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImageUploadResponse {
    /// Next offset the device expects.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub off: Option<u32>,
    /// Whether the announced SHA matched an already-present image.
    #[serde(
        rename = "match",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub matches: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub err: Option<ErrorResponse>,
}

/// Body of an image state read request; always an empty map.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImageStateRequest {}

/// Description of one firmware slot.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImageInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<u32>,
    #[serde(default)]
    pub slot: u32,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub hash: ByteBuf,
    #[serde(default)]
    pub bootable: bool,
    #[serde(default)]
    pub pending: bool,
    #[serde(default)]
    pub confirmed: bool,
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub permanent: bool,
}

/// Device response to an image state read.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImageStateResponse {
    #[serde(default)]
    pub images: Vec<ImageInfo>,
    #[serde(
        rename = "splitStatus",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub split_status: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub err: Option<ErrorResponse>,
}

/// Body of an image erase request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImageEraseRequest {
    /// Slot to erase; the device erases the inactive slot when omitted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slot: Option<u32>,
}

/// Device response to an image erase.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImageEraseResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub err: Option<ErrorResponse>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::CborCodec;

    fn sha() -> [u8; 32] {
        [0xab; 32]
    }

    #[test]
    fn test_first_chunk_carries_metadata() {
        let req = ImageUploadRequest::for_chunk(1, 0, vec![1, 2, 3], 4096, &sha(), true);
        assert_eq!(req.image, Some(1));
        assert_eq!(req.len, Some(4096));
        assert_eq!(req.off, 0);
        assert_eq!(req.sha.as_ref().map(|s| s.to_vec()), Some(sha().to_vec()));
        assert_eq!(req.upgrade, Some(true));
    }

    #[test]
    fn test_later_chunks_are_offset_and_data_only() {
        let req = ImageUploadRequest::for_chunk(1, 512, vec![9, 9], 4096, &sha(), true);
        assert!(req.image.is_none());
        assert!(req.len.is_none());
        assert!(req.sha.is_none());
        assert!(req.upgrade.is_none());
        assert_eq!(req.off, 512);
        assert_eq!(&req.data[..], &[9, 9]);
    }

    #[test]
    fn test_image_zero_is_omitted_on_first_chunk() {
        let req = ImageUploadRequest::for_chunk(0, 0, vec![1], 64, &sha(), false);
        assert!(req.image.is_none());
        assert!(req.upgrade.is_none());

        let encoded = CborCodec::encode(&req).unwrap();
        let decoded: ImageUploadRequest = CborCodec::decode(&encoded).unwrap();
        assert!(decoded.image.is_none());
        assert_eq!(decoded.len, Some(64));
    }

    #[test]
    fn test_upload_response_match_key() {
        // {"off": 512, "match": true}
        let resp = ImageUploadResponse {
            off: Some(512),
            matches: Some(true),
            err: None,
        };
        let encoded = CborCodec::encode(&resp).unwrap();
        // Key "match" must appear literally in the map.
        assert!(encoded
            .windows(5)
            .any(|w| w == b"match"));

        let decoded: ImageUploadResponse = CborCodec::decode(&encoded).unwrap();
        assert_eq!(decoded.off, Some(512));
        assert_eq!(decoded.matches, Some(true));
    }

    #[test]
    fn test_state_request_is_empty_map() {
        let encoded = CborCodec::encode(&ImageStateRequest::default()).unwrap();
        assert_eq!(encoded, vec![0xa0]);
    }

    #[test]
    fn test_state_response_defaults() {
        let decoded: ImageStateResponse = CborCodec::decode(&[0xa0]).unwrap();
        assert!(decoded.images.is_empty());
        assert!(decoded.split_status.is_none());
        assert!(decoded.err.is_none());
    }

    #[test]
    fn test_erase_request_without_slot_is_empty_map() {
        let encoded = CborCodec::encode(&ImageEraseRequest::default()).unwrap();
        assert_eq!(encoded, vec![0xa0]);
    }
}
