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


//! Channel layer.
//!
//! A [`Channel`] is a named client connection carrying framed messages over a
//! pluggable transport. The owner drives it with host ticks; the I/O happens
//! on background tasks.
//!
//! # Architecture
//!
//! ```text
//!   owner thread                         tokio runtime
//!  ┌────────────────────────┐          ┌──────────────────────────────┐
//!  │ Channel::send ─────────┼─ queue ─▶│ writer: codec ▶ TransportWriter
//!  │                        │          │                              │
//!  │ Channel::update        │          │ reader: TransportReader      │
//!  │  1. session events ◀───┼─ inbox ──┤         ▶ ReceivePipeline    │
//!  │  2. DispatchQueue ◀────┼─ packets─┤                              │
//!  │  3. HeartbeatMonitor   │          └──────────────────────────────┘
//!  └────────────────────────┘
//! ```
//!
//! - [`Channel`]: connect, send, update, close
//! - [`ChannelRegistry`]: named channels ticked together, with event fan-out
//! - [`ReceivePipeline`]: chunk-independent frame parser
//! - [`HeartbeatMonitor`]: keepalive probes and timeout detection
//! - [`DispatchQueue`]: delivers received packets to subscribers on update
//! - [`ChannelEventHandler`]: lifecycle and error notifications
//!
//! # Ordering Guarantees
//!
//! Within a channel, messages are written in send order and packets are
//! dispatched in arrival order. There is no ordering across channels.
//!
//! # Errors
//!
//! Operations on the call path return [`ChannelError`] directly. Errors that
//! happen in the background go to the channel's [`ChannelEventHandler`], or
//! are returned from the next [`Channel::update`] when no handler consumes
//! them.

#[allow(clippy::module_inception)]
mod channel;
mod config;
mod dispatch;
mod error;
mod events;
mod heartbeat;
mod receive;
mod registry;
mod send;
mod session;
mod state;

pub use channel::Channel;
pub use config::{ChannelConfig, ChannelOptions};
pub use dispatch::{DispatchQueue, PacketHandler};
pub use error::{ChannelError, ErrorKind};
pub use events::ChannelEventHandler;
pub use heartbeat::{HeartbeatDue, HeartbeatMonitor, HeartbeatState};
pub use receive::{ReceiveError, ReceivePipeline};
pub use registry::ChannelRegistry;
pub use state::ChannelState;
