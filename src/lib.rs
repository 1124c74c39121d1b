//! # smp-client
//!
//! Rust client SDK for the SMP device management protocol.
//!
//! This crate talks to embedded devices running an SMP server (mcumgr
//! style): device reset, firmware slot inspection and erase, and firmware
//! upload over a pluggable transport such as BLE or serial.
//!
//! ## Architecture
//!
//! - **Protocol**: 8-byte binary header plus CBOR-encoded bodies
//! - **Transport**: request/response carrier behind the [`Transport`] trait
//! - **Upload engine**: windowed, adaptively concurrent firmware transfer —
//!   concurrency starts at one in-flight chunk, grows while the link keeps
//!   up, and backs off permanently on the first timeout
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use bytes::Bytes;
//! use tokio_util::sync::CancellationToken;
//! use smp_client::{ConnectParams, SmpClient};
//!
//! #[tokio::main]
//! async fn main() -> smp_client::Result<()> {
//!     let transport = Arc::new(my_ble_transport());
//!     let client = SmpClient::new(transport);
//!     client.connect(&ConnectParams::new().set("peripheral_id", "AA:BB")).await?;
//!
//!     let firmware = Bytes::from(std::fs::read("app.bin")?);
//!     client
//!         .upload_image(CancellationToken::new(), firmware, 512, |chunk| {
//!             println!("offset {} delivered", chunk.off);
//!         })
//!         .await?;
//!
//!     client.reset(false).await
//! }
//! ```

pub mod codec;
pub mod error;
pub mod message;
pub mod protocol;
pub mod transport;

mod client;
mod upload;
mod window;

pub use client::SmpClient;
pub use error::{Result, SmpError};
pub use message::{
    ErrorResponse, ImageInfo, ImageStateResponse, ImageUploadRequest, ImageUploadResponse,
};
pub use protocol::Frame;
pub use transport::{ConnectParams, Transport};
pub use upload::{
    UploadConfig, DEFAULT_MAX_ATTEMPTS, DEFAULT_MAX_WINDOWS, DEFAULT_WINDOW_GROW_INTERVAL,
};
pub use window::WindowBudget;
