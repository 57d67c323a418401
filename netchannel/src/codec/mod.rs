//
// Copyright 2026 Hans W. Uhlig. All Rights Reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//

//! Frame codec contract.
//!
//! A channel turns messages into frames and back through four pluggable
//! roles, plus an optional heartbeat role:
//!
//! | Role | Trait |
//! |---|---|
//! | send header | [`PacketSendHeaderHandler`] |
//! | send body | [`PacketSendBodyHandler`] |
//! | receive header | [`PacketReceiveHeaderHandler`] |
//! | receive body | [`PacketReceiveBodyHandler`] |
//! | heartbeat | [`PacketHeartbeatHandler`] |
//!
//! Handlers are registered explicitly with [`CodecConfig::builder`]. The
//! [`frame`] module provides the length-prefixed header layout and
//! [`JsonCodec`] (feature `json`) a complete reference codec on top of it.
//!
//! # Examples
//!
//! ```rust
//! use netchannel::codec::{CodecConfig, IntervalHeartbeat, JsonCodec, Message};
//! use serde::{Deserialize, Serialize};
//! use std::time::Duration;
//!
//! #[derive(Debug, Serialize, Deserialize)]
//! #[serde(untagged)]
//! enum Msg {
//!     Ping,
//! }
//!
//! impl Message for Msg {
//!     fn message_id(&self) -> u32 {
//!         0
//!     }
//! }
//!
//! let config: CodecConfig<Msg> = JsonCodec::new()
//!     .register_with(0, |_| Ok(Msg::Ping))
//!     .into_config()
//!     .heartbeat(IntervalHeartbeat::new(|| Msg::Ping).with_interval(Duration::from_secs(5)))
//!     .build()
//!     .unwrap();
//! assert!(config.has_heartbeat());
//! ```

mod config;
mod error;
pub mod frame;
mod heartbeat;
#[cfg(feature = "json")]
mod json;
mod traits;

pub use config::{CodecConfig, CodecConfigBuilder};
pub use error::{ConfigError, DeserializationError, SerializationError};
pub use frame::{LengthPrefixedHeader, RawBody};
pub use heartbeat::IntervalHeartbeat;
#[cfg(feature = "json")]
pub use json::{JsonCodec, JsonReceiveBody, JsonSendHeader};
pub use traits::{
    CustomErrorData, DecodedBody, Message, Packet, PacketHeader, PacketHeartbeatHandler,
    PacketReceiveBodyHandler, PacketReceiveHeaderHandler, PacketSendBodyHandler,
    PacketSendHeaderHandler, UserData,
};
