//! # sengled_bridge
//!
//! An async Rust library that keeps Sengled cloud lights and plugs in sync
//! with a HomeKit-style accessory host.
//!
//! The bridge polls the Sengled cloud for the full device list, registers an
//! accessory for every supported device, removes accessories whose device
//! disappeared, and pushes state changes to the host. Wi-Fi color lights
//! additionally stream fine-grained updates over a per-device push channel.
//! Host writes are translated into device commands; hue and saturation are
//! paired into one color command.
//!
//! The cloud and the host are collaborators behind the [`CloudClient`] and
//! [`ControlSurface`] traits.
//!
//! ## Quick Start
//!
//! ```ignore
//! use sengled_bridge::{Bridge, BridgeConfig, runtime::ShutdownToken};
//!
//! async fn serve(cloud: MyCloud, host: MyHost) {
//!     let bridge = Bridge::new(cloud, host, BridgeConfig::default());
//!     for identity in host_cache() {
//!         bridge.restore_accessory(identity).await;
//!     }
//!
//!     let shutdown = ShutdownToken::new();
//!     bridge.run(shutdown).await;
//! }
//! ```
//!
//! ## Features
//!
//! - **Reconciliation**: one accessory per device identifier, no duplicates
//!   or orphans, see [`ReconcileReport`]
//! - **Throttling**: late snapshots are held back per accessory, see
//!   [`throttle::UpdateThrottle`]
//! - **Push**: `wifielement/<id>/status` payloads applied as they arrive,
//!   see [`push`]
//! - **Color writes**: hue and saturation coalesced by
//!   [`coalescer::PairedWriteCoalescer`]
//! - **Translation**: brightness, color temperature and color mapped
//!   between host and device ranges in [`translate`]
//!
//! ## Runtime Selection
//!
//! This library is runtime-agnostic. Select your preferred runtime using feature flags:
//!
//! ### Using tokio (default)
//!
//! ```toml
//! [dependencies]
//! sengled-bridge = "0.1"
//! tokio = { version = "1", features = ["rt-multi-thread", "macros"] }
//! ```
//!
//! ### Using async-std
//!
//! ```toml
//! [dependencies]
//! sengled-bridge = { version = "0.1", default-features = false, features = ["runtime-async-std"] }
//! async-std = { version = "1.12", features = ["attributes"] }
//! ```
//!
//! ### Using smol
//!
//! ```toml
//! [dependencies]
//! sengled-bridge = { version = "0.1", default-features = false, features = ["runtime-smol"] }
//! smol = "2"
//! ```
//!
//! ## Feature Flags
//!
//! - `runtime-tokio` (default): Use the tokio async runtime
//! - `runtime-async-std`: Use the async-std runtime
//! - `runtime-smol`: Use the smol runtime

mod accessory;
mod bridge;
pub mod client;
pub mod coalescer;
mod config;
mod errors;
mod identity;
mod kind;
pub mod push;
mod registry;
pub mod runtime;
mod snapshot;
mod state;
mod surface;
pub mod throttle;
pub mod translate;
mod types;

// Re-export public API
pub use accessory::Accessory;
pub use bridge::Bridge;
pub use client::{CloudClient, DeviceCommand};
pub use config::BridgeConfig;
pub use errors::{ClientError, Error};
pub use identity::{AccessoryIdentity, accessory_uuid};
pub use kind::{DeviceKind, Features};
pub use registry::{ReconcileReport, Registry};
pub use snapshot::{DeviceAttributes, DeviceList, DeviceSnapshot};
pub use state::LightState;
pub use surface::{Characteristic, CharacteristicValue, ControlSurface, UpdateValue};
pub use types::{Brightness, Color, HueSaturation, Kelvin, Mired, PowerState};
