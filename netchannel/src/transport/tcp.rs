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

//! TCP transport implementation.
//!
//! This module provides the stream-oriented backend built on Tokio's
//! `TcpStream`, and the [`TcpConnector`] channels use to open it.

use crate::transport::{
    Connection, Connector, Transport, TransportError, TransportKind, TransportMetadata,
};
use async_trait::async_trait;
use std::io;
use std::net::SocketAddr;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tokio::net::TcpStream;

#[cfg(feature = "observability")]
use tracing::{debug, error, info, instrument};

/// TCP transport over a connected `TcpStream`.
///
/// # Examples
///
/// ```rust,no_run
/// use netchannel::transport::{Transport, TcpTransport};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let transport = TcpTransport::connect("127.0.0.1:8080").await?;
/// transport.set_nodelay(true)?;
/// println!("Peer: {:?}", transport.metadata().peer_addr);
/// # Ok(())
/// # }
/// ```
pub struct TcpTransport {
    stream: TcpStream,
    metadata: TransportMetadata,
}

impl TcpTransport {
    /// Wraps an already connected stream.
    #[cfg_attr(
        feature = "observability",
        instrument(skip(stream), fields(transport_id, peer_addr))
    )]
    pub fn from_stream(stream: TcpStream) -> io::Result<Self> {
        let local_addr = stream.local_addr()?;
        let peer_addr = stream.peer_addr()?;
        let metadata = TransportMetadata::new("tcp", TransportKind::Stream)
            .with_local_addr(local_addr)
            .with_peer_addr(peer_addr);

        #[cfg(feature = "observability")]
        {
            tracing::Span::current().record("transport_id", format!("{}", metadata.id));
            tracing::Span::current().record("peer_addr", format!("{}", peer_addr));
            debug!("Created TCP transport from stream");
        }

        Ok(Self { stream, metadata })
    }

    /// Connects to a remote TCP endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::ConnectionFailed`] carrying the OS error when
    /// the connection cannot be established.
    #[cfg_attr(feature = "observability", instrument(skip(addr), fields(address)))]
    pub async fn connect(addr: impl Into<String>) -> Result<Self, TransportError> {
        let addr_str = addr.into();

        #[cfg(feature = "observability")]
        {
            tracing::Span::current().record("address", addr_str.as_str());
            info!("Connecting to TCP endpoint");
        }

        let stream = TcpStream::connect(&addr_str).await.map_err(|e| {
            #[cfg(feature = "observability")]
            error!("Failed to connect: {}", e);
            TransportError::ConnectionFailed {
                address: addr_str.clone(),
                source: e,
            }
        })?;

        Self::from_stream(stream).map_err(|e| TransportError::Io { source: e })
    }

    /// Returns the local address.
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.stream.local_addr()
    }

    /// Enables or disables Nagle's algorithm.
    pub fn set_nodelay(&self, nodelay: bool) -> io::Result<()> {
        self.stream.set_nodelay(nodelay)
    }

    /// Returns whether Nagle's algorithm is disabled.
    pub fn nodelay(&self) -> io::Result<bool> {
        self.stream.nodelay()
    }
}

impl Transport for TcpTransport {
    fn metadata(&self) -> &TransportMetadata {
        &self.metadata
    }
}

impl AsyncRead for TcpTransport {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        Pin::new(&mut self.stream).poll_read(cx, buf)
    }
}

impl AsyncWrite for TcpTransport {
    fn poll_write(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        Pin::new(&mut self.stream).poll_write(cx, buf)
    }

    fn poll_flush(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.stream).poll_flush(cx)
    }

    fn poll_shutdown(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.stream).poll_shutdown(cx)
    }
}

/// Connector producing [`TcpTransport`] connections.
#[derive(Debug, Clone)]
pub struct TcpConnector {
    nodelay: bool,
}

impl TcpConnector {
    /// Creates a connector. `nodelay` controls `TCP_NODELAY` on new streams.
    pub fn new(nodelay: bool) -> Self {
        Self { nodelay }
    }
}

impl Default for TcpConnector {
    fn default() -> Self {
        Self::new(true)
    }
}

#[async_trait]
impl Connector for TcpConnector {
    fn kind(&self) -> TransportKind {
        TransportKind::Stream
    }

    async fn connect(&self, address: &str) -> Result<Connection, TransportError> {
        let transport = TcpTransport::connect(address).await?;
        transport
            .set_nodelay(self.nodelay)
            .map_err(|source| TransportError::Io { source })?;
        Ok(Connection::from_stream(transport))
    }
}
