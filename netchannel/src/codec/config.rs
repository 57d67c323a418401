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

//! Explicit registration of a channel's frame handlers.

use crate::codec::{
    ConfigError, PacketHeartbeatHandler, PacketReceiveBodyHandler, PacketReceiveHeaderHandler,
    PacketSendBodyHandler, PacketSendHeaderHandler, SerializationError,
};
use bytes::BytesMut;
use std::fmt;
use std::sync::Arc;

/// The complete set of frame handlers for one channel.
///
/// Built once, before connecting, with [`CodecConfig::builder`]. Cloning is
/// cheap; handlers are shared.
pub struct CodecConfig<M> {
    pub(crate) send_header: Arc<dyn PacketSendHeaderHandler<M>>,
    pub(crate) send_body: Arc<dyn PacketSendBodyHandler>,
    pub(crate) receive_header: Arc<dyn PacketReceiveHeaderHandler>,
    pub(crate) receive_body: Arc<dyn PacketReceiveBodyHandler<M>>,
    pub(crate) heartbeat: Option<Arc<dyn PacketHeartbeatHandler<M>>>,
}

impl<M> CodecConfig<M> {
    /// Starts an empty builder.
    pub fn builder() -> CodecConfigBuilder<M> {
        CodecConfigBuilder::default()
    }

    /// Returns the receive-header handler's fixed header length.
    pub fn header_length(&self) -> usize {
        self.receive_header.header_length()
    }

    /// Returns `true` if a heartbeat handler is registered.
    pub fn has_heartbeat(&self) -> bool {
        self.heartbeat.is_some()
    }

    /// Appends the complete frame for `message` to `destination`, running
    /// the send-header and send-body handlers in turn.
    ///
    /// On failure `destination` may hold a partial frame.
    pub fn encode(&self, message: &M, destination: &mut BytesMut) -> Result<(), SerializationError>
    where
        M: 'static,
    {
        let body = self.send_header.handle(message, destination)?;
        self.send_body.handle(&body, destination)
    }
}

impl<M> Clone for CodecConfig<M> {
    fn clone(&self) -> Self {
        Self {
            send_header: Arc::clone(&self.send_header),
            send_body: Arc::clone(&self.send_body),
            receive_header: Arc::clone(&self.receive_header),
            receive_body: Arc::clone(&self.receive_body),
            heartbeat: self.heartbeat.clone(),
        }
    }
}

impl<M> fmt::Debug for CodecConfig<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CodecConfig")
            .field("header_length", &self.header_length())
            .field("heartbeat", &self.has_heartbeat())
            .finish()
    }
}

/// Builder for [`CodecConfig`].
///
/// # Examples
///
/// ```rust
/// use netchannel::codec::{CodecConfig, ConfigError};
///
/// struct Msg;
///
/// let err = CodecConfig::<Msg>::builder().build().unwrap_err();
/// assert_eq!(err, ConfigError::MissingHandler("send-header"));
/// ```
pub struct CodecConfigBuilder<M> {
    send_header: Option<Arc<dyn PacketSendHeaderHandler<M>>>,
    send_body: Option<Arc<dyn PacketSendBodyHandler>>,
    receive_header: Option<Arc<dyn PacketReceiveHeaderHandler>>,
    receive_body: Option<Arc<dyn PacketReceiveBodyHandler<M>>>,
    heartbeat: Option<Arc<dyn PacketHeartbeatHandler<M>>>,
}

impl<M> Default for CodecConfigBuilder<M> {
    fn default() -> Self {
        Self {
            send_header: None,
            send_body: None,
            receive_header: None,
            receive_body: None,
            heartbeat: None,
        }
    }
}

impl<M> CodecConfigBuilder<M> {
    /// Registers the send-header handler.
    pub fn send_header(mut self, handler: impl PacketSendHeaderHandler<M>) -> Self {
        self.send_header = Some(Arc::new(handler));
        self
    }

    /// Registers the send-body handler.
    pub fn send_body(mut self, handler: impl PacketSendBodyHandler) -> Self {
        self.send_body = Some(Arc::new(handler));
        self
    }

    /// Registers the receive-header handler.
    pub fn receive_header(mut self, handler: impl PacketReceiveHeaderHandler) -> Self {
        self.receive_header = Some(Arc::new(handler));
        self
    }

    /// Registers the receive-body handler.
    pub fn receive_body(mut self, handler: impl PacketReceiveBodyHandler<M>) -> Self {
        self.receive_body = Some(Arc::new(handler));
        self
    }

    /// Registers the heartbeat handler. Without one, heartbeats are disabled.
    pub fn heartbeat(mut self, handler: impl PacketHeartbeatHandler<M>) -> Self {
        self.heartbeat = Some(Arc::new(handler));
        self
    }

    /// Validates that all four frame roles are present and that the
    /// receive header has a non-zero length.
    pub fn build(self) -> Result<CodecConfig<M>, ConfigError> {
        let config = CodecConfig {
            send_header: self
                .send_header
                .ok_or(ConfigError::MissingHandler("send-header"))?,
            send_body: self
                .send_body
                .ok_or(ConfigError::MissingHandler("send-body"))?,
            receive_header: self
                .receive_header
                .ok_or(ConfigError::MissingHandler("receive-header"))?,
            receive_body: self
                .receive_body
                .ok_or(ConfigError::MissingHandler("receive-body"))?,
            heartbeat: self.heartbeat,
        };
        if config.header_length() == 0 {
            return Err(ConfigError::EmptyHeader);
        }
        Ok(config)
    }
}
