//! Request and response body types for SMP commands.
//!
//! Every body is a CBOR map keyed by field name; fields tagged with
//! `skip_serializing_if` are omitted from the map entirely when absent,
//! matching the device firmware's expectations.

mod image;
mod os;

pub use image::{
    ImageEraseRequest, ImageEraseResponse, ImageInfo, ImageStateRequest, ImageStateResponse,
    ImageUploadRequest, ImageUploadResponse,
};
pub use os::{ResetRequest, ResetResponse};

use serde::{Deserialize, Serialize};

use crate::error::SmpError;

/// Management-level error reported by the device in a response body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Group the error originates from.
    pub group: u8,
    /// Result code; zero means success.
    pub rc: u8,
}

impl ErrorResponse {
    /// Check whether this entry actually reports a failure.
    #[inline]
    pub fn is_failure(&self) -> bool {
        self.rc != 0
    }
}

impl From<ErrorResponse> for SmpError {
    fn from(err: ErrorResponse) -> Self {
        SmpError::Device {
            group: err.group,
            rc: err.rc,
        }
    }
}

/// Map an optional `err` entry from a response body to a result.
///
/// A present entry with non-zero `rc` is terminal for the command; a zero
/// `rc` (or no entry at all) is success.
pub fn check_device_error(err: Option<ErrorResponse>) -> crate::error::Result<()> {
    match err {
        Some(e) if e.is_failure() => Err(e.into()),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_rc_is_success() {
        assert!(check_device_error(Some(ErrorResponse { group: 1, rc: 0 })).is_ok());
        assert!(check_device_error(None).is_ok());
    }

    #[test]
    fn test_nonzero_rc_is_terminal() {
        let result = check_device_error(Some(ErrorResponse { group: 1, rc: 3 }));
        assert!(matches!(
            result,
            Err(SmpError::Device { group: 1, rc: 3 })
        ));
    }
}
