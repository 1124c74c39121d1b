//! Error types for smp-client.

use thiserror::Error;

/// Main error type for all SMP operations.
#[derive(Debug, Error)]
pub enum SmpError {
    /// I/O error from the underlying link.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Link-level transport failure. Terminal for the operation.
    #[error("transport error: {0}")]
    Transport(String),

    /// No response arrived within the transport's per-call deadline.
    ///
    /// Transient during image upload: the chunk worker backs off one window
    /// and retries until the job is cancelled.
    #[error("response timeout")]
    Timeout,

    /// Malformed frame: declared payload length mismatch or unknown version.
    #[error("frame validation failed: {0}")]
    FrameValidation(String),

    /// CBOR serialization error.
    #[error("CBOR encode error: {0}")]
    CborEncode(#[from] ciborium::ser::Error<std::io::Error>),

    /// CBOR deserialization error.
    #[error("CBOR decode error: {0}")]
    CborDecode(#[from] ciborium::de::Error<std::io::Error>),

    /// The device reported a management-level error for the command.
    #[error("device error: group={group}, rc={rc}")]
    Device {
        /// Group the error originates from.
        group: u8,
        /// Result code reported by the device.
        rc: u8,
    },

    /// The caller's cancellation token fired.
    #[error("operation canceled")]
    Canceled,

    /// The caller's deadline elapsed before the operation completed.
    #[error("deadline exceeded")]
    DeadlineExceeded,

    /// The per-chunk attempt budget was consumed without success.
    #[error("retries exhausted after {0} attempts")]
    RetriesExhausted(u32),

    /// Upload was requested with a zero chunk size.
    #[error("invalid chunk size: {0}")]
    InvalidChunkSize(u32),

    /// Connection closed unexpectedly.
    #[error("connection closed")]
    ConnectionClosed,
}

/// Result type alias using SmpError.
pub type Result<T> = std::result::Result<T, SmpError>;
