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


//! # netchannel
//!
//! Client-side network channels for tick-driven applications such as game
//! clients. A channel connects to a server over a pluggable transport, frames
//! outbound messages through a configurable codec, reassembles inbound frames
//! from arbitrary chunks, keeps the connection alive with heartbeat probes,
//! and hands received packets to subscribers on the owner's thread.
//!
//! ## Layers
//!
//! - [`transport`]: connectors for TCP, WebSocket and in-memory pipes
//! - [`codec`]: the four frame roles (send header, send body, receive header,
//!   receive body), an optional heartbeat role, and a JSON codec
//! - [`channel`]: the channel state machine, receive pipeline, heartbeat
//!   monitor, dispatch queue and channel registry
//! - [`tick`]: host ticks driving every channel
//! - [`observability`]: per-channel counters and logging
//!
//! ## Example
//!
//! ```rust,no_run
//! use netchannel::channel::{ChannelConfig, ChannelRegistry};
//! use netchannel::codec::{JsonCodec, Message};
//! use netchannel::Ticker;
//! use serde::{Deserialize, Serialize};
//! use std::time::Duration;
//!
//! #[derive(Debug, Serialize, Deserialize)]
//! struct Position {
//!     x: i32,
//!     y: i32,
//! }
//!
//! impl Message for Position {
//!     fn message_id(&self) -> u32 {
//!         1
//!     }
//! }
//!
//! # async fn example() -> Result<(), netchannel::NetError> {
//! let codec = JsonCodec::<Position>::new()
//!     .register::<Position>(1)
//!     .into_config()
//!     .build()?;
//!
//! let mut registry = ChannelRegistry::new();
//! let world = registry.create_channel("world", ChannelConfig::tcp(codec))?;
//! world.subscribe(1, |packet| println!("moved to {:?}", packet.payload));
//! world.connect("game.example.com:7777", None)?;
//!
//! let mut ticker = Ticker::new();
//! loop {
//!     registry.update(ticker.tick())?;
//!     tokio::time::sleep(Duration::from_millis(16)).await;
//! }
//! # }
//! ```
//!
//! ## Features
//!
//! - `observability` (default): `tracing` spans and events, `metrics` counters
//! - `json` (default): [`codec::JsonCodec`]
//! - `websocket` (default): [`transport::WebSocketConnector`]
//! - `serde` (default): serde support for configuration types

#![allow(clippy::module_inception)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod channel;
pub mod codec;
pub mod error;
pub mod observability;
pub mod tick;
pub mod transport;

pub use channel::{
    Channel, ChannelConfig, ChannelError, ChannelEventHandler, ChannelOptions, ChannelRegistry,
    ChannelState, ErrorKind,
};
pub use codec::{CodecConfig, Message, Packet};
pub use error::NetError;
pub use tick::{Tick, Ticker};
pub use transport::{Connector, TransportError};
