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

//! WebSocket transport implementation.
//!
//! The message-oriented backend. Every outbound frame is sent as one binary
//! WebSocket message; every inbound binary message is handed to the receive
//! pipeline as one chunk, which may still carry zero, one or many frames when
//! the peer coalesces writes.
//!
//! # Examples
//!
//! ```rust,no_run
//! use netchannel::transport::{Connector, WebSocketConfig, WebSocketConnector};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let connector = WebSocketConnector::new(WebSocketConfig::default());
//! let connection = connector.connect("ws://localhost:8080/game").await?;
//! println!("Connected to {:?}", connection.metadata.peer_addr);
//! # Ok(())
//! # }
//! ```

use crate::transport::{
    Connection, Connector, TransportError, TransportKind, TransportMetadata, TransportReader,
    TransportWriter,
};
use async_trait::async_trait;
use bytes::BytesMut;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::protocol::WebSocketConfig as ProtocolConfig;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async_with_config, MaybeTlsStream, WebSocketStream};

#[cfg(feature = "observability")]
use tracing::{debug, info, instrument, warn};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Configuration for WebSocket connections.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct WebSocketConfig {
    /// Maximum size of a single WebSocket frame in bytes.
    pub max_frame_size: usize,

    /// Maximum size of a complete inbound message in bytes.
    pub max_message_size: usize,

    /// Disable Nagle's algorithm on the underlying TCP stream.
    pub nodelay: bool,
}

impl Default for WebSocketConfig {
    fn default() -> Self {
        Self {
            max_frame_size: 16 * 1024 * 1024,   // 16 MB
            max_message_size: 64 * 1024 * 1024, // 64 MB
            nodelay: true,
        }
    }
}

impl WebSocketConfig {
    fn protocol_config(&self) -> ProtocolConfig {
        let mut config = ProtocolConfig::default();
        config.max_frame_size = Some(self.max_frame_size);
        config.max_message_size = Some(self.max_message_size);
        config
    }
}

/// Connector for the WebSocket backend.
///
/// Addresses without a scheme are treated as `ws://` URLs.
#[derive(Debug, Clone, Default)]
pub struct WebSocketConnector {
    config: WebSocketConfig,
}

impl WebSocketConnector {
    /// Creates a connector with the given configuration.
    pub fn new(config: WebSocketConfig) -> Self {
        Self { config }
    }

    /// Returns the connector configuration.
    pub fn config(&self) -> &WebSocketConfig {
        &self.config
    }
}

fn websocket_url(address: &str) -> String {
    if address.contains("://") {
        address.to_string()
    } else {
        format!("ws://{address}")
    }
}

#[async_trait]
impl Connector for WebSocketConnector {
    fn kind(&self) -> TransportKind {
        TransportKind::Message
    }

    #[cfg_attr(feature = "observability", instrument(skip(self)))]
    async fn connect(&self, address: &str) -> Result<Connection, TransportError> {
        let url = websocket_url(address);

        #[cfg(feature = "observability")]
        info!(%url, "Connecting to WebSocket endpoint");

        let (stream, _response) = connect_async_with_config(
            url.as_str(),
            Some(self.config.protocol_config()),
            self.config.nodelay,
        )
        .await?;

        let mut metadata = TransportMetadata::new("websocket", TransportKind::Message);
        if let MaybeTlsStream::Plain(tcp) = stream.get_ref() {
            if let Ok(addr) = tcp.peer_addr() {
                metadata = metadata.with_peer_addr(addr);
            }
            if let Ok(addr) = tcp.local_addr() {
                metadata = metadata.with_local_addr(addr);
            }
        }

        #[cfg(feature = "observability")]
        debug!(transport_id = %metadata.id, "WebSocket connection established");

        let (sink, stream) = stream.split();
        Ok(Connection::new(
            Box::new(WebSocketReader {
                stream,
                max_message_size: self.config.max_message_size,
            }),
            Box::new(WebSocketWriter { sink }),
            metadata,
        ))
    }
}

/// Read half of a WebSocket connection.
struct WebSocketReader {
    stream: SplitStream<WsStream>,
    max_message_size: usize,
}

#[async_trait]
impl TransportReader for WebSocketReader {
    async fn read_chunk(&mut self, buf: &mut BytesMut) -> Result<usize, TransportError> {
        loop {
            match self.stream.next().await {
                Some(Ok(Message::Binary(data))) => {
                    if data.len() > self.max_message_size {
                        return Err(TransportError::MessageTooLarge {
                            size: data.len(),
                            limit: self.max_message_size,
                        });
                    }
                    // An empty message carries no frames; zero is reserved for close.
                    if data.is_empty() {
                        continue;
                    }
                    buf.extend_from_slice(&data);
                    return Ok(data.len());
                }
                // Pings are answered by the protocol layer.
                Some(Ok(Message::Ping(_) | Message::Pong(_) | Message::Frame(_))) => continue,
                Some(Ok(Message::Close(_))) | None => return Ok(0),
                Some(Ok(Message::Text(_))) => {
                    #[cfg(feature = "observability")]
                    warn!("Received text message on binary channel");
                    return Err(TransportError::WebSocketProtocol {
                        reason: "received text message, expected binary".to_string(),
                    });
                }
                Some(Err(e)) => return Err(TransportError::WebSocket(e)),
            }
        }
    }
}

/// Write half of a WebSocket connection.
struct WebSocketWriter {
    sink: SplitSink<WsStream, Message>,
}

#[async_trait]
impl TransportWriter for WebSocketWriter {
    async fn write_frame(&mut self, frame: &[u8]) -> Result<(), TransportError> {
        self.sink.send(Message::Binary(frame.to_vec())).await?;
        Ok(())
    }

    async fn shutdown(&mut self) -> Result<(), TransportError> {
        self.sink.close().await?;
        Ok(())
    }
}
