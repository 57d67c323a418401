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

//! Error types for the channel layer.

use crate::codec::{DeserializationError, SerializationError};
use crate::transport::TransportError;
use std::fmt;
use thiserror::Error;

/// Classification of every channel failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The connect address is not IPv4, IPv6 or a host name.
    AddressFamilyUnsupported,
    /// The transport could not be established.
    ConnectError,
    /// A message was rejected before it was queued.
    SendError,
    /// The codec failed to encode an outbound message.
    SerializeError,
    /// The codec failed to parse an inbound frame header.
    DeserializeHeaderError,
    /// The codec failed to decode an inbound frame body.
    DeserializeBodyError,
    /// Too many consecutive heartbeat probes went unanswered.
    HeartbeatTimeout,
    /// The transport failed while connected.
    SocketError,
    /// A registry already holds a channel with this name.
    DuplicateChannel,
    /// The channel already has a transport session.
    AlreadyConnected,
    /// The channel is not connected.
    NotConnected,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::AddressFamilyUnsupported => "AddressFamilyUnsupported",
            ErrorKind::ConnectError => "ConnectError",
            ErrorKind::SendError => "SendError",
            ErrorKind::SerializeError => "SerializeError",
            ErrorKind::DeserializeHeaderError => "DeserializeHeaderError",
            ErrorKind::DeserializeBodyError => "DeserializeBodyError",
            ErrorKind::HeartbeatTimeout => "HeartbeatTimeout",
            ErrorKind::SocketError => "SocketError",
            ErrorKind::DuplicateChannel => "DuplicateChannel",
            ErrorKind::AlreadyConnected => "AlreadyConnected",
            ErrorKind::NotConnected => "NotConnected",
        };
        f.write_str(name)
    }
}

/// Errors raised by channels and the channel registry.
///
/// Every variant names the channel it concerns. Transport failures keep the
/// underlying [`TransportError`], and with it the OS error code.
///
/// # Examples
///
/// ```rust
/// use netchannel::channel::{ChannelError, ErrorKind};
///
/// let error = ChannelError::NotConnected {
///     channel: "lobby".to_string(),
/// };
/// assert_eq!(error.kind(), ErrorKind::NotConnected);
/// assert_eq!(error.channel_name(), "lobby");
/// assert!(error.is_recoverable());
/// ```
#[derive(Debug, Error)]
pub enum ChannelError {
    /// The connect address could not be classified.
    #[error("channel '{channel}': unsupported address family for '{address}'")]
    AddressFamilyUnsupported {
        /// Channel name
        channel: String,
        /// The rejected address
        address: String,
    },

    /// Connecting the transport failed.
    #[error("channel '{channel}': connect failed: {source}")]
    Connect {
        /// Channel name
        channel: String,
        /// The underlying transport error
        #[source]
        source: TransportError,
    },

    /// A message was rejected by the codec's validation.
    #[error("channel '{channel}': invalid message: {reason}")]
    InvalidMessage {
        /// Channel name
        channel: String,
        /// Why the message was rejected
        reason: String,
    },

    /// Encoding an outbound message failed.
    #[error("channel '{channel}': {source}")]
    Serialize {
        /// Channel name
        channel: String,
        /// The codec error
        #[source]
        source: SerializationError,
    },

    /// Parsing an inbound frame header failed.
    #[error("channel '{channel}': bad frame header: {source}")]
    DeserializeHeader {
        /// Channel name
        channel: String,
        /// The codec error
        #[source]
        source: DeserializationError,
    },

    /// Decoding an inbound frame body failed.
    #[error("channel '{channel}': bad body for message {message_id}: {source}")]
    DeserializeBody {
        /// Channel name
        channel: String,
        /// Id from the frame header
        message_id: u32,
        /// The codec error
        #[source]
        source: DeserializationError,
    },

    /// The peer stopped answering heartbeat probes.
    #[error("channel '{channel}': heartbeat timeout after {missed} missed probes")]
    HeartbeatTimeout {
        /// Channel name
        channel: String,
        /// Consecutive misses at the time of the timeout
        missed: u32,
    },

    /// The transport failed while connected.
    #[error("channel '{channel}': socket error: {source}")]
    Socket {
        /// Channel name
        channel: String,
        /// The underlying transport error
        #[source]
        source: TransportError,
    },

    /// The registry already holds a channel with this name.
    #[error("channel '{channel}' already exists")]
    DuplicateChannel {
        /// Channel name
        channel: String,
    },

    /// The channel already has a transport session.
    #[error("channel '{channel}' is already connected")]
    AlreadyConnected {
        /// Channel name
        channel: String,
    },

    /// The channel is not connected.
    #[error("channel '{channel}' is not connected")]
    NotConnected {
        /// Channel name
        channel: String,
    },
}

impl ChannelError {
    /// Returns the classification of this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::AddressFamilyUnsupported { .. } => ErrorKind::AddressFamilyUnsupported,
            Self::Connect { .. } => ErrorKind::ConnectError,
            Self::InvalidMessage { .. } => ErrorKind::SendError,
            Self::Serialize { .. } => ErrorKind::SerializeError,
            Self::DeserializeHeader { .. } => ErrorKind::DeserializeHeaderError,
            Self::DeserializeBody { .. } => ErrorKind::DeserializeBodyError,
            Self::HeartbeatTimeout { .. } => ErrorKind::HeartbeatTimeout,
            Self::Socket { .. } => ErrorKind::SocketError,
            Self::DuplicateChannel { .. } => ErrorKind::DuplicateChannel,
            Self::AlreadyConnected { .. } => ErrorKind::AlreadyConnected,
            Self::NotConnected { .. } => ErrorKind::NotConnected,
        }
    }

    /// Returns the name of the channel this error concerns.
    #[must_use]
    pub fn channel_name(&self) -> &str {
        match self {
            Self::AddressFamilyUnsupported { channel, .. }
            | Self::Connect { channel, .. }
            | Self::InvalidMessage { channel, .. }
            | Self::Serialize { channel, .. }
            | Self::DeserializeHeader { channel, .. }
            | Self::DeserializeBody { channel, .. }
            | Self::HeartbeatTimeout { channel, .. }
            | Self::Socket { channel, .. }
            | Self::DuplicateChannel { channel }
            | Self::AlreadyConnected { channel }
            | Self::NotConnected { channel } => channel,
        }
    }

    /// Returns `true` if the channel can be used again after this error
    /// without reconnecting.
    ///
    /// Corrupted streams and dead transports are not recoverable; the caller
    /// must close the channel and connect again.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::InvalidMessage { .. }
            | Self::DuplicateChannel { .. }
            | Self::AlreadyConnected { .. }
            | Self::NotConnected { .. }
            | Self::AddressFamilyUnsupported { .. } => true,
            Self::Connect { source, .. } => source.is_recoverable(),
            Self::Serialize { .. }
            | Self::DeserializeHeader { .. }
            | Self::DeserializeBody { .. }
            | Self::HeartbeatTimeout { .. }
            | Self::Socket { .. } => false,
        }
    }

    /// Returns the OS error code of the underlying transport failure, if any.
    #[must_use]
    pub fn raw_os_error(&self) -> Option<i32> {
        match self {
            Self::Connect { source, .. } | Self::Socket { source, .. } => source.raw_os_error(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_kind_mapping() {
        let error = ChannelError::InvalidMessage {
            channel: "c".to_string(),
            reason: "empty".to_string(),
        };
        assert_eq!(error.kind(), ErrorKind::SendError);

        let error = ChannelError::DeserializeBody {
            channel: "c".to_string(),
            message_id: 9,
            source: DeserializationError::new("bad"),
        };
        assert_eq!(error.kind(), ErrorKind::DeserializeBodyError);
        assert!(!error.is_recoverable());
        assert!(error.to_string().contains("message 9"));
    }

    #[test]
    fn test_socket_error_carries_os_code() {
        let error = ChannelError::Socket {
            channel: "world".to_string(),
            source: TransportError::ReadFailed {
                source: io::Error::from_raw_os_error(104),
            },
        };
        assert_eq!(error.kind(), ErrorKind::SocketError);
        assert_eq!(error.raw_os_error(), Some(104));
        assert_eq!(error.channel_name(), "world");
    }

    #[test]
    fn test_connect_recoverability_follows_transport() {
        let error = ChannelError::Connect {
            channel: "c".to_string(),
            source: TransportError::ConnectionFailed {
                address: "127.0.0.1:1".to_string(),
                source: io::Error::new(io::ErrorKind::ConnectionRefused, "refused"),
            },
        };
        assert_eq!(error.kind(), ErrorKind::ConnectError);
        assert!(error.is_recoverable());
    }

    #[test]
    fn test_kind_display() {
        assert_eq!(ErrorKind::HeartbeatTimeout.to_string(), "HeartbeatTimeout");
    }
}
