//! SMP client.
//!
//! [`SmpClient`] drives device management commands over a pluggable
//! [`Transport`]: device reset, image state inspection, image erase, and the
//! windowed firmware upload. Every command goes through one generic
//! send/validate/decode path.
//!
//! The client is cheaply cloneable; clones share the transport and the
//! sequence counter, so several commands can run from one connection.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use bytes::Bytes;
//! use tokio_util::sync::CancellationToken;
//! use smp_client::{ConnectParams, SmpClient, Transport};
//!
//! async fn flash(transport: Arc<dyn Transport>, firmware: Bytes) -> smp_client::Result<()> {
//!     let client = SmpClient::new(transport);
//!     client.connect(&ConnectParams::new().set("device", "/dev/ttyACM0")).await?;
//!
//!     client
//!         .upload_image(CancellationToken::new(), firmware, 512, |chunk| {
//!             println!("sent offset {}", chunk.off);
//!         })
//!         .await?;
//!
//!     client.reset(false).await?;
//!     client.close().await
//! }
//! ```

use std::sync::Arc;

use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::codec::CborCodec;
use crate::error::{Result, SmpError};
use crate::message::{
    check_device_error, ImageEraseRequest, ImageEraseResponse, ImageStateRequest,
    ImageStateResponse, ImageUploadRequest, ResetRequest, ResetResponse,
};
use crate::protocol::{cmd_image, cmd_os, group, op, Frame, Header, SequenceCounter, VERSION_2};
use crate::transport::{ConnectParams, Transport};
use crate::upload::{self, UploadConfig};

/// Client for SMP device management commands.
#[derive(Clone)]
pub struct SmpClient {
    transport: Arc<dyn Transport>,
    sequence: Arc<SequenceCounter>,
    config: UploadConfig,
}

impl SmpClient {
    /// Create a client over the given transport with default upload
    /// configuration.
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self::with_config(transport, UploadConfig::default())
    }

    /// Create a client with explicit upload configuration.
    pub fn with_config(transport: Arc<dyn Transport>, config: UploadConfig) -> Self {
        Self {
            transport,
            sequence: Arc::new(SequenceCounter::new()),
            config,
        }
    }

    /// Establish the transport connection.
    pub async fn connect(&self, params: &ConnectParams) -> Result<()> {
        self.transport.connect(params).await
    }

    /// Tear down the transport connection.
    pub async fn close(&self) -> Result<()> {
        self.transport.close().await
    }

    pub(crate) fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    pub(crate) fn upload_config(&self) -> &UploadConfig {
        &self.config
    }

    /// Build a request frame around the payload, assigning the next
    /// sequence number.
    pub(crate) fn create_frame(
        &self,
        op: u8,
        group_id: u8,
        command_id: u8,
        payload: Bytes,
    ) -> Result<Frame> {
        let payload_length = u16::try_from(payload.len()).map_err(|_| {
            SmpError::FrameValidation(format!(
                "payload of {} bytes exceeds the 16-bit length field",
                payload.len()
            ))
        })?;
        let header = Header::new(
            VERSION_2,
            op,
            group_id,
            self.sequence.next(),
            command_id,
            payload_length,
        );
        Ok(Frame::new(header, payload))
    }

    /// One request/response exchange: encode, frame, send, validate, decode.
    async fn send_request<Req, Resp>(
        &self,
        op: u8,
        group_id: u8,
        command_id: u8,
        body: &Req,
    ) -> Result<Resp>
    where
        Req: Serialize,
        Resp: DeserializeOwned,
    {
        let payload = Bytes::from(CborCodec::encode(body)?);
        let frame = self.create_frame(op, group_id, command_id, payload)?;

        tracing::debug!(
            group = group_id,
            command = command_id,
            sequence = frame.sequence(),
            "sending request"
        );

        let response = self.transport.send(frame).await?;
        response.validate()?;
        CborCodec::decode(response.payload())
    }

    /// Reboot the device. `force` reboots even when the device would
    /// normally refuse.
    pub async fn reset(&self, force: bool) -> Result<()> {
        let response: ResetResponse = self
            .send_request(
                op::WRITE_REQUEST,
                group::OS,
                cmd_os::RESET,
                &ResetRequest::new(force),
            )
            .await?;
        check_device_error(response.err)
    }

    /// Read the state of the device's firmware slots.
    pub async fn image_state(&self) -> Result<ImageStateResponse> {
        let response: ImageStateResponse = self
            .send_request(
                op::READ_REQUEST,
                group::IMAGE,
                cmd_image::STATE,
                &ImageStateRequest::default(),
            )
            .await?;
        check_device_error(response.err)?;
        Ok(response)
    }

    /// Erase a firmware slot. The device picks the inactive slot when
    /// `slot` is `None`.
    pub async fn image_erase(&self, slot: Option<u32>) -> Result<()> {
        let response: ImageEraseResponse = self
            .send_request(
                op::WRITE_REQUEST,
                group::IMAGE,
                cmd_image::ERASE,
                &ImageEraseRequest { slot },
            )
            .await?;
        check_device_error(response.err)
    }

    /// Upload a firmware image in `chunk_size` strides under the windowed
    /// upload engine.
    ///
    /// `on_chunk` fires once per successfully delivered chunk, with the
    /// request that was sent; once more than one window is active the calls
    /// may arrive out of chunk order. Cancelling `cancel` aborts the
    /// transfer with [`SmpError::Canceled`].
    ///
    /// # Errors
    ///
    /// At most one error is reported per upload; the first chunk failure
    /// aborts the rest of the transfer.
    pub async fn upload_image(
        &self,
        cancel: CancellationToken,
        image: Bytes,
        chunk_size: u32,
        on_chunk: impl Fn(&ImageUploadRequest) + Send + Sync + 'static,
    ) -> Result<()> {
        upload::run_upload(self.clone(), cancel, image, chunk_size, Arc::new(on_chunk)).await
    }
}
