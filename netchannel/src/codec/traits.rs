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

//! Frame handler roles.
//!
//! A channel holds exactly one handler for each of the four frame roles plus
//! an optional heartbeat handler. Handlers are shared across the channel's
//! tasks, so every role is `Send + Sync` and takes `&self`.

use crate::codec::{DeserializationError, SerializationError};
use bytes::{Bytes, BytesMut};
use std::any::Any;
use std::sync::Arc;
use std::time::Duration;

/// Opaque data supplied to [`Channel::connect`](crate::channel::Channel::connect)
/// and returned with the `Connected` event.
pub type UserData = Arc<dyn Any + Send + Sync>;

/// Opaque side data a receive-body handler attaches to a decoded packet.
pub type CustomErrorData = Arc<dyn Any + Send + Sync>;

/// An application message that knows its protocol level id.
///
/// # Examples
///
/// ```rust
/// use netchannel::codec::Message;
///
/// struct Ping;
///
/// impl Message for Ping {
///     fn message_id(&self) -> u32 {
///         1
///     }
/// }
///
/// assert_eq!(Ping.message_id(), 1);
/// ```
pub trait Message: Send + 'static {
    /// Returns the id written into the frame header.
    fn message_id(&self) -> u32;
}

/// A decoded frame header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacketHeader {
    /// Protocol level message id.
    pub id: u32,
    /// Total frame length in bytes, header included.
    pub packet_length: usize,
}

/// A decoded inbound message, consumed exactly once by a dispatch subscriber.
#[derive(Debug, Clone, PartialEq)]
pub struct Packet<M> {
    /// Protocol level message id taken from the frame header.
    pub message_id: u32,
    /// The decoded message.
    pub payload: M,
}

impl<M> Packet<M> {
    /// Creates a packet.
    pub fn new(message_id: u32, payload: M) -> Self {
        Self {
            message_id,
            payload,
        }
    }
}

/// Result of decoding a frame body.
///
/// The optional `custom_error` is raised as a custom error event on the
/// owning channel while the message is still dispatched.
pub struct DecodedBody<M> {
    /// The decoded message.
    pub message: M,
    /// Side data surfaced through `on_custom_error`.
    pub custom_error: Option<CustomErrorData>,
}

impl<M> DecodedBody<M> {
    /// Attaches custom error data to the decoded message.
    pub fn with_custom_error(mut self, data: CustomErrorData) -> Self {
        self.custom_error = Some(data);
        self
    }
}

impl<M> From<M> for DecodedBody<M> {
    fn from(message: M) -> Self {
        Self {
            message,
            custom_error: None,
        }
    }
}

/// Writes the header of an outbound frame.
pub trait PacketSendHeaderHandler<M>: Send + Sync + 'static {
    /// Rejects messages that must never reach the wire.
    ///
    /// A rejected message fails [`Channel::send`](crate::channel::Channel::send)
    /// with an invalid message error before it is queued.
    fn validate(&self, _message: &M) -> Result<(), String> {
        Ok(())
    }

    /// Encodes `message`, writes its header into `destination` and returns the
    /// body bytes for the send-body handler.
    fn handle(&self, message: &M, destination: &mut BytesMut) -> Result<Bytes, SerializationError>;
}

/// Appends the body of an outbound frame.
pub trait PacketSendBodyHandler: Send + Sync + 'static {
    /// Appends `body` to `destination`, directly after the header.
    fn handle(&self, body: &[u8], destination: &mut BytesMut) -> Result<(), SerializationError>;
}

/// Parses the fixed length header of an inbound frame.
pub trait PacketReceiveHeaderHandler: Send + Sync + 'static {
    /// Length of every header in bytes.
    fn header_length(&self) -> usize;

    /// Parses exactly [`header_length`](Self::header_length) bytes.
    fn handle(&self, header: &[u8]) -> Result<PacketHeader, DeserializationError>;
}

/// Decodes the body of an inbound frame.
pub trait PacketReceiveBodyHandler<M>: Send + Sync + 'static {
    /// Decodes `body` for the message announced by `message_id`. `body` is
    /// empty for header-only frames.
    fn handle(&self, body: &[u8], message_id: u32) -> Result<DecodedBody<M>, DeserializationError>;
}

/// Produces keepalive probes.
///
/// Positive overrides returned here take precedence over the channel options.
pub trait PacketHeartbeatHandler<M>: Send + Sync + 'static {
    /// Interval override. `None` or zero keeps the channel option.
    fn heartbeat_interval(&self) -> Option<Duration> {
        None
    }

    /// Miss threshold override. `None` or zero keeps the channel option.
    fn miss_threshold(&self) -> Option<u32> {
        None
    }

    /// Builds the next probe. `None` skips this interval's probe.
    fn probe(&self) -> Option<M>;
}
