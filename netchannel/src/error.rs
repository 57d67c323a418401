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


//! Top-level error type.
//!
//! Every layer has its own error:
//!
//! 1. **Transport**: connection and socket failures ([`TransportError`])
//! 2. **Codec**: framing and encoding failures ([`SerializationError`],
//!    [`DeserializationError`]) and incomplete codecs ([`ConfigError`])
//! 3. **Channel**: lifecycle and protocol failures of a named channel
//!    ([`ChannelError`])
//!
//! [`NetError`] composes them for applications that want a single error type.
//!
//! # Examples
//!
//! ```rust
//! use netchannel::NetError;
//! use netchannel::transport::TransportError;
//! use netchannel::channel::ChannelError;
//!
//! let error: NetError = TransportError::Closed.into();
//! assert!(error.is_transport_error());
//!
//! let error: NetError = ChannelError::NotConnected { channel: "lobby".into() }.into();
//! assert!(error.is_channel_error());
//! assert!(error.is_recoverable());
//! ```

use crate::channel::ChannelError;
use crate::codec::{ConfigError, DeserializationError, SerializationError};
use crate::transport::TransportError;
use std::error::Error as StdError;
use std::fmt;

/// Any error produced by this crate.
#[derive(Debug)]
pub enum NetError {
    /// A transport failed.
    Transport(TransportError),

    /// A channel operation failed.
    Channel(ChannelError),

    /// Encoding an outbound message failed.
    Serialization(SerializationError),

    /// Decoding an inbound frame failed.
    Deserialization(DeserializationError),

    /// A codec configuration was incomplete.
    Config(ConfigError),
}

impl NetError {
    /// Returns `true` for [`NetError::Transport`].
    #[must_use]
    pub const fn is_transport_error(&self) -> bool {
        matches!(self, Self::Transport(_))
    }

    /// Returns `true` for [`NetError::Channel`].
    #[must_use]
    pub const fn is_channel_error(&self) -> bool {
        matches!(self, Self::Channel(_))
    }

    /// Returns `true` for codec failures, including configuration errors.
    #[must_use]
    pub const fn is_codec_error(&self) -> bool {
        matches!(
            self,
            Self::Serialization(_) | Self::Deserialization(_) | Self::Config(_)
        )
    }

    /// Returns `true` if retrying or continuing may succeed.
    ///
    /// Codec failures are never recoverable: the same input fails the same
    /// way, and a failed frame leaves the stream unreadable.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_recoverable(),
            Self::Channel(e) => e.is_recoverable(),
            Self::Serialization(_) | Self::Deserialization(_) | Self::Config(_) => false,
        }
    }

    /// Returns the OS error code of an underlying socket failure, if any.
    #[must_use]
    pub fn raw_os_error(&self) -> Option<i32> {
        match self {
            Self::Transport(e) => e.raw_os_error(),
            Self::Channel(e) => e.raw_os_error(),
            _ => None,
        }
    }
}

impl fmt::Display for NetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport(e) => write!(f, "transport error: {}", e),
            Self::Channel(e) => write!(f, "channel error: {}", e),
            Self::Serialization(e) => write!(f, "codec error: {}", e),
            Self::Deserialization(e) => write!(f, "codec error: {}", e),
            Self::Config(e) => write!(f, "configuration error: {}", e),
        }
    }
}

impl StdError for NetError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Self::Transport(e) => Some(e),
            Self::Channel(e) => Some(e),
            Self::Serialization(e) => Some(e),
            Self::Deserialization(e) => Some(e),
            Self::Config(e) => Some(e),
        }
    }
}

impl From<TransportError> for NetError {
    fn from(error: TransportError) -> Self {
        Self::Transport(error)
    }
}

impl From<ChannelError> for NetError {
    fn from(error: ChannelError) -> Self {
        Self::Channel(error)
    }
}

impl From<SerializationError> for NetError {
    fn from(error: SerializationError) -> Self {
        Self::Serialization(error)
    }
}

impl From<DeserializationError> for NetError {
    fn from(error: DeserializationError) -> Self {
        Self::Deserialization(error)
    }
}

impl From<ConfigError> for NetError {
    fn from(error: ConfigError) -> Self {
        Self::Config(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_classification() {
        let error = NetError::from(TransportError::Closed);
        assert!(error.is_transport_error());
        assert!(!error.is_channel_error());
        assert!(!error.is_codec_error());

        let error = NetError::from(ConfigError::MissingHandler("send header"));
        assert!(error.is_codec_error());
        assert!(!error.is_recoverable());
    }

    #[test]
    fn test_os_error_passes_through_channel() {
        let error = NetError::from(ChannelError::Socket {
            channel: "c".into(),
            source: TransportError::ReadFailed {
                source: io::Error::from_raw_os_error(104),
            },
        });
        assert_eq!(error.raw_os_error(), Some(104));
        assert!(!error.is_recoverable());
    }

    #[test]
    fn test_display_and_source() {
        let error = NetError::from(DeserializationError::new("bad header"));
        assert!(error.to_string().starts_with("codec error: "));
        assert!(error.source().is_some());
    }
}
