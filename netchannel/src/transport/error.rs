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

//! Transport layer error types.
//!
//! Transport errors are the lowest layer of the error hierarchy. They describe
//! failures of the underlying conduit (socket, WebSocket, in-memory pipe) and
//! carry the operating system error code, when there is one, so channel level
//! error reports can attach it for diagnostics.

use std::io;
use thiserror::Error;

/// Errors that can occur in the transport layer.
///
/// # Examples
///
/// ```rust
/// use netchannel::transport::TransportError;
/// use std::io;
///
/// let error = TransportError::ConnectionFailed {
///     address: "127.0.0.1:8080".to_string(),
///     source: io::Error::new(io::ErrorKind::ConnectionRefused, "connection refused"),
/// };
///
/// assert!(error.is_recoverable());
/// assert!(!error.should_close_transport());
/// ```
#[derive(Debug, Error)]
pub enum TransportError {
    /// Failed to establish a connection to the remote endpoint.
    #[error("failed to connect to {address}: {source}")]
    ConnectionFailed {
        /// The address that failed to connect
        address: String,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },

    /// Connection was lost during operation.
    #[error("connection lost: {reason}")]
    ConnectionLost {
        /// Description of why the connection was lost
        reason: String,
        /// The underlying I/O error, if available
        #[source]
        source: Option<io::Error>,
    },

    /// Failed to read from the transport.
    #[error("read failed: {source}")]
    ReadFailed {
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },

    /// Failed to write to the transport.
    #[error("write failed: {source}")]
    WriteFailed {
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },

    /// The address could not be interpreted by any supported address family.
    #[error("unsupported address family for '{address}'")]
    AddressFamilyUnsupported {
        /// The rejected address
        address: String,
    },

    /// An inbound message exceeded the configured size limit.
    #[error("inbound message of {size} bytes exceeds limit of {limit} bytes")]
    MessageTooLarge {
        /// Size of the rejected message
        size: usize,
        /// Configured limit
        limit: usize,
    },

    /// Invalid transport configuration.
    #[error("invalid configuration: {reason}")]
    InvalidConfiguration {
        /// Description of the configuration error
        reason: String,
    },

    /// Transport is already closed.
    #[error("transport is closed")]
    Closed,

    /// An unexpected I/O error occurred.
    #[error("I/O error: {source}")]
    Io {
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },

    /// WebSocket-specific error occurred.
    #[cfg(feature = "websocket")]
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// The peer sent a WebSocket frame this transport does not accept.
    #[cfg(feature = "websocket")]
    #[error("WebSocket protocol violation: {reason}")]
    WebSocketProtocol {
        /// Description of the violation
        reason: String,
    },
}

impl TransportError {
    /// Returns `true` if a fresh connection attempt may succeed.
    pub fn is_recoverable(&self) -> bool {
        match self {
            TransportError::ConnectionFailed { .. } | TransportError::ConnectionLost { .. } => true,

            TransportError::ReadFailed { source }
            | TransportError::WriteFailed { source }
            | TransportError::Io { source } => matches!(
                source.kind(),
                io::ErrorKind::Interrupted
                    | io::ErrorKind::WouldBlock
                    | io::ErrorKind::TimedOut
                    | io::ErrorKind::ConnectionReset
                    | io::ErrorKind::ConnectionAborted
            ),

            #[cfg(feature = "websocket")]
            TransportError::WebSocket(e) => {
                use tokio_tungstenite::tungstenite::Error as WsError;
                matches!(
                    e,
                    WsError::Io(_) | WsError::ConnectionClosed | WsError::AlreadyClosed
                )
            }

            #[cfg(feature = "websocket")]
            TransportError::WebSocketProtocol { .. } => false,

            TransportError::AddressFamilyUnsupported { .. }
            | TransportError::MessageTooLarge { .. }
            | TransportError::InvalidConfiguration { .. }
            | TransportError::Closed => false,
        }
    }

    /// Returns `true` if the transport that produced this error is unusable.
    pub fn should_close_transport(&self) -> bool {
        match self {
            // Never established, nothing to close.
            TransportError::ConnectionFailed { .. }
            | TransportError::AddressFamilyUnsupported { .. }
            | TransportError::InvalidConfiguration { .. } => false,

            TransportError::ReadFailed { source }
            | TransportError::WriteFailed { source }
            | TransportError::Io { source } => !matches!(
                source.kind(),
                io::ErrorKind::Interrupted | io::ErrorKind::WouldBlock
            ),

            TransportError::ConnectionLost { .. }
            | TransportError::MessageTooLarge { .. }
            | TransportError::Closed => true,

            #[cfg(feature = "websocket")]
            TransportError::WebSocket(_) | TransportError::WebSocketProtocol { .. } => true,
        }
    }

    /// Returns the operating system error code behind this error, if any.
    ///
    /// ```rust
    /// use netchannel::transport::TransportError;
    /// use std::io;
    ///
    /// let error = TransportError::ReadFailed {
    ///     source: io::Error::from_raw_os_error(104),
    /// };
    /// assert_eq!(error.raw_os_error(), Some(104));
    /// assert_eq!(TransportError::Closed.raw_os_error(), None);
    /// ```
    pub fn raw_os_error(&self) -> Option<i32> {
        match self {
            TransportError::ConnectionFailed { source, .. }
            | TransportError::ReadFailed { source }
            | TransportError::WriteFailed { source }
            | TransportError::Io { source } => source.raw_os_error(),
            TransportError::ConnectionLost { source, .. } => {
                source.as_ref().and_then(io::Error::raw_os_error)
            }
            #[cfg(feature = "websocket")]
            TransportError::WebSocket(tokio_tungstenite::tungstenite::Error::Io(source)) => {
                source.raw_os_error()
            }
            _ => None,
        }
    }

    /// Create a connection lost error for testing.
    #[cfg(test)]
    pub fn connection_lost(reason: impl Into<String>) -> Self {
        TransportError::ConnectionLost {
            reason: reason.into(),
            source: None,
        }
    }
}

impl From<io::Error> for TransportError {
    fn from(error: io::Error) -> Self {
        TransportError::Io { source: error }
    }
}
