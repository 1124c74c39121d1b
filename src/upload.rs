//! Windowed firmware upload engine.
//!
//! An upload walks the image in fixed `chunk_size` strides, dispatching one
//! worker per chunk under the [`WindowBudget`]. Concurrency starts at a
//! single in-flight chunk and grows as the transfer proves the link can keep
//! up; the first timeout freezes and shrinks the budget instead.
//!
//! Failure handling is first-writer-wins: the first worker error is recorded
//! and cancels the job's internal token, which aborts in-flight sends and
//! stops dispatch. Exactly one error (or none) is reported per upload.
//!
//! Chunks are dispatched in ascending offset order, but completion order is
//! not guaranteed once more than one window is active; the per-chunk
//! callback may fire out of order.

use std::sync::{Arc, Mutex};

use bytes::Bytes;
use sha2::{Digest, Sha256};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::client::SmpClient;
use crate::codec::CborCodec;
use crate::error::{Result, SmpError};
use crate::message::{check_device_error, ImageUploadRequest, ImageUploadResponse};
use crate::protocol::{cmd_image, group, op};
use crate::window::WindowBudget;

/// Default ceiling for concurrent in-flight chunks.
pub const DEFAULT_MAX_WINDOWS: u32 = 5;

/// Default number of dispatched chunks between budget growth attempts.
pub const DEFAULT_WINDOW_GROW_INTERVAL: u32 = 50;

/// Default per-chunk resend count after which retries are logged at warn
/// level.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Tuning knobs for firmware uploads.
#[derive(Debug, Clone)]
pub struct UploadConfig {
    /// Ceiling for concurrent in-flight chunks.
    pub max_windows: u32,
    /// Grow the window budget by one every this many dispatched chunks.
    pub window_grow_interval: u32,
    /// Timeout resends for one chunk after which further retries are
    /// logged at warn level. Resends themselves are bounded only by
    /// cancellation.
    pub max_attempts: u32,
    /// Target image number.
    pub image: u32,
    /// Mark the uploaded image for upgrade only.
    pub upgrade: bool,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_windows: DEFAULT_MAX_WINDOWS,
            window_grow_interval: DEFAULT_WINDOW_GROW_INTERVAL,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            image: 0,
            upgrade: false,
        }
    }
}

/// Callback fired for each successfully delivered chunk, with the request
/// that was actually sent.
pub type ChunkCallback = Arc<dyn Fn(&ImageUploadRequest) + Send + Sync>;

/// Compute the ascending chunk offsets covering `len` bytes.
///
/// Ranges are disjoint and their union is the whole image; the last chunk
/// may be short.
fn plan_chunks(len: u32, chunk_size: u32) -> Vec<u32> {
    (0..len).step_by(chunk_size as usize).collect()
}

/// Shared state of one upload run.
struct UploadJob {
    client: SmpClient,
    image: Bytes,
    total_len: u32,
    chunk_size: u32,
    sha: [u8; 32],
    config: UploadConfig,
    budget: WindowBudget,
    /// Internal token; child of the caller's token, additionally cancelled
    /// by the first worker error.
    cancel: CancellationToken,
    /// First worker error wins; later errors are dropped.
    first_err: Mutex<Option<SmpError>>,
    on_chunk: ChunkCallback,
}

impl UploadJob {
    /// Record a worker error and abort the rest of the job. Only the first
    /// recorded error survives.
    fn record_error(&self, err: SmpError) {
        let mut slot = match self.first_err.lock() {
            Ok(slot) => slot,
            Err(poisoned) => poisoned.into_inner(),
        };
        if slot.is_none() {
            tracing::error!(error = %err, "upload chunk failed, aborting transfer");
            *slot = Some(err);
            self.cancel.cancel();
        }
    }

    fn take_error(&self) -> Option<SmpError> {
        match self.first_err.lock() {
            Ok(mut slot) => slot.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        }
    }

    /// Deliver the chunk starting at `off`.
    async fn transfer_chunk(&self, off: u32) -> Result<()> {
        let end = off.saturating_add(self.chunk_size).min(self.total_len);
        let data = self.image.slice(off as usize..end as usize);
        let request = ImageUploadRequest::for_chunk(
            self.config.image,
            off,
            data.to_vec(),
            self.total_len,
            &self.sha,
            self.config.upgrade,
        );
        let payload = Bytes::from(CborCodec::encode(&request)?);

        let mut resends = 0u32;
        let mut backed_off = false;

        // Every non-timeout failure is terminal, so cancellation is the
        // only exit without a result.
        loop {
            if self.cancel.is_cancelled() {
                return Err(SmpError::Canceled);
            }

            // Fresh sequence number per attempt.
            let frame = self.client.create_frame(
                op::WRITE_REQUEST,
                group::IMAGE,
                cmd_image::UPLOAD,
                payload.clone(),
            )?;

            let response = tokio::select! {
                result = self.client.transport().send(frame) => result,
                _ = self.cancel.cancelled() => return Err(SmpError::Canceled),
            };

            let response = match response {
                Ok(frame) => frame,
                Err(SmpError::Timeout) => {
                    // The first timeout for a chunk sheds one window;
                    // timeout resends are bounded only by cancellation.
                    if !backed_off {
                        backed_off = true;
                        if self.budget.active() > 1 {
                            self.budget.back_off();
                        }
                    }
                    resends += 1;
                    if resends >= self.config.max_attempts {
                        tracing::warn!(off, resends, "chunk still timing out, resending");
                    } else {
                        tracing::debug!(off, resends, "chunk timed out, resending");
                    }
                    continue;
                }
                Err(err) => return Err(err),
            };

            response.validate()?;
            let body: ImageUploadResponse = CborCodec::decode(response.payload())?;
            check_device_error(body.err)?;

            (self.on_chunk)(&request);
            return Ok(());
        }
    }
}

/// Run a complete windowed upload.
pub(crate) async fn run_upload(
    client: SmpClient,
    cancel: CancellationToken,
    image: Bytes,
    chunk_size: u32,
    on_chunk: ChunkCallback,
) -> Result<()> {
    if chunk_size == 0 {
        return Err(SmpError::InvalidChunkSize(chunk_size));
    }
    if image.is_empty() {
        return Ok(());
    }
    let total_len = u32::try_from(image.len()).map_err(|_| {
        SmpError::FrameValidation(format!(
            "image length {} exceeds the 32-bit offset space",
            image.len()
        ))
    })?;

    let config = client.upload_config().clone();
    let offsets = plan_chunks(total_len, chunk_size);
    let grow_interval = config.window_grow_interval.max(1);

    tracing::info!(
        total_len,
        chunk_size,
        chunks = offsets.len(),
        max_windows = config.max_windows,
        "starting firmware upload"
    );

    let sha: [u8; 32] = Sha256::digest(&image).into();
    let job = Arc::new(UploadJob {
        client,
        image,
        total_len,
        chunk_size,
        sha,
        budget: WindowBudget::new(config.max_windows),
        config,
        cancel: cancel.child_token(),
        first_err: Mutex::new(None),
        on_chunk,
    });

    let mut workers = JoinSet::new();
    for (index, off) in offsets.into_iter().enumerate() {
        if !job.budget.acquire(&job.cancel).await {
            break;
        }

        let job = Arc::clone(&job);
        workers.spawn(async move {
            let result = job.transfer_chunk(off).await;
            match result {
                Ok(()) => {
                    if index as u32 % grow_interval == 0 {
                        job.budget.grow();
                    }
                }
                // Record (and cancel) before releasing the window, so the
                // dispatcher observes the abort rather than a free slot.
                Err(err) => job.record_error(err),
            }
            job.budget.release();
        });
    }

    while let Some(joined) = workers.join_next().await {
        if let Err(err) = joined {
            job.record_error(SmpError::Transport(format!("chunk worker failed: {err}")));
        }
    }
    debug_assert_eq!(
        job.budget.active(),
        0,
        "windows still held after every worker joined"
    );

    if let Some(err) = job.take_error() {
        return Err(err);
    }
    if cancel.is_cancelled() {
        return Err(SmpError::Canceled);
    }

    tracing::info!(total_len, "firmware upload complete");
    Ok(())
}
