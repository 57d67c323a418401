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

//! In-memory transport implementation for testing.
//!
//! This module provides a stream transport backed by Tokio channels, and a
//! [`MemoryConnector`] that hands the accepting side of every connection to a
//! [`MemoryListener`]. Channels can be exercised end to end without sockets.

use crate::transport::{
    Connection, Connector, Transport, TransportError, TransportKind, TransportMetadata,
};
use async_trait::async_trait;
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tokio::sync::mpsc;

#[cfg(feature = "observability")]
use tracing::debug;

/// Default buffer size for memory transport channels.
const DEFAULT_BUFFER_SIZE: usize = 1024;

/// In-memory stream transport.
///
/// Each write is delivered as one chunk; reads may return part of a chunk.
/// Shutting down the write side closes the peer's read side, which then
/// observes end of stream.
///
/// # Examples
///
/// ```rust
/// use netchannel::transport::MemoryTransport;
/// use tokio::io::{AsyncReadExt, AsyncWriteExt};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let (mut client, mut server) = MemoryTransport::pair(16);
///
/// client.write_all(b"Hello!").await?;
///
/// let mut buffer = vec![0u8; 64];
/// let n = server.read(&mut buffer).await?;
/// assert_eq!(&buffer[..n], b"Hello!");
/// # Ok(())
/// # }
/// ```
pub struct MemoryTransport {
    metadata: TransportMetadata,
    rx: mpsc::Receiver<Vec<u8>>,
    tx: Option<mpsc::Sender<Vec<u8>>>,
    current_chunk: Option<Vec<u8>>,
    chunk_offset: usize,
}

impl MemoryTransport {
    /// Creates a pair of connected memory transports.
    ///
    /// `buffer_size` is the number of unread writes each direction holds
    /// before writers wait.
    pub fn pair(buffer_size: usize) -> (Self, Self) {
        let (tx1, rx1) = mpsc::channel(buffer_size.max(1));
        let (tx2, rx2) = mpsc::channel(buffer_size.max(1));

        let first = Self::new(rx2, tx1);
        let second = Self::new(rx1, tx2);

        #[cfg(feature = "observability")]
        debug!(
            first = %first.metadata.id,
            second = %second.metadata.id,
            "Created memory transport pair"
        );

        (first, second)
    }

    /// Creates a pair with the default buffer size.
    pub fn pair_default() -> (Self, Self) {
        Self::pair(DEFAULT_BUFFER_SIZE)
    }

    fn new(rx: mpsc::Receiver<Vec<u8>>, tx: mpsc::Sender<Vec<u8>>) -> Self {
        Self {
            metadata: TransportMetadata::new("memory", TransportKind::Stream),
            rx,
            tx: Some(tx),
            current_chunk: None,
            chunk_offset: 0,
        }
    }
}

impl Transport for MemoryTransport {
    fn metadata(&self) -> &TransportMetadata {
        &self.metadata
    }
}

impl AsyncRead for MemoryTransport {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = &mut *self;
        loop {
            if let Some(chunk) = &this.current_chunk {
                let remaining = &chunk[this.chunk_offset..];
                let to_read = remaining.len().min(buf.remaining());
                buf.put_slice(&remaining[..to_read]);
                this.chunk_offset += to_read;
                if this.chunk_offset >= chunk.len() {
                    this.current_chunk = None;
                    this.chunk_offset = 0;
                }
                return Poll::Ready(Ok(()));
            }

            match this.rx.poll_recv(cx) {
                Poll::Ready(Some(chunk)) if chunk.is_empty() => continue,
                Poll::Ready(Some(chunk)) => {
                    this.current_chunk = Some(chunk);
                    this.chunk_offset = 0;
                }
                // All senders dropped: end of stream.
                Poll::Ready(None) => return Poll::Ready(Ok(())),
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}

impl AsyncWrite for MemoryTransport {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        if buf.is_empty() {
            return Poll::Ready(Ok(0));
        }
        let this = self.get_mut();
        let Some(tx) = this.tx.as_ref() else {
            return Poll::Ready(Err(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "memory transport shut down",
            )));
        };
        match tx.try_send(buf.to_vec()) {
            Ok(()) => Poll::Ready(Ok(buf.len())),
            Err(mpsc::error::TrySendError::Full(_)) => {
                cx.waker().wake_by_ref();
                Poll::Pending
            }
            Err(mpsc::error::TrySendError::Closed(_)) => Poll::Ready(Err(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "memory transport closed",
            ))),
        }
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        // Dropping the sender ends the peer's stream.
        self.get_mut().tx = None;
        Poll::Ready(Ok(()))
    }
}

/// Connector that creates in-process [`MemoryTransport`] pairs.
///
/// Every successful `connect` delivers the accepting half to the paired
/// [`MemoryListener`]. Once the listener is dropped, connects fail with
/// `ConnectionRefused`.
///
/// # Examples
///
/// ```rust
/// use netchannel::transport::{Connector, MemoryConnector};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let (connector, mut listener) = MemoryConnector::new(64);
/// let connection = connector.connect("memory:1").await?;
/// let server_side = listener.accept().await.expect("accepted");
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct MemoryConnector {
    buffer_size: usize,
    accepted: mpsc::UnboundedSender<MemoryTransport>,
}

impl MemoryConnector {
    /// Creates a connector and the listener receiving its server halves.
    pub fn new(buffer_size: usize) -> (Self, MemoryListener) {
        let (accepted, incoming) = mpsc::unbounded_channel();
        (
            Self {
                buffer_size,
                accepted,
            },
            MemoryListener { incoming },
        )
    }
}

#[async_trait]
impl Connector for MemoryConnector {
    fn kind(&self) -> TransportKind {
        TransportKind::Stream
    }

    async fn connect(&self, address: &str) -> Result<Connection, TransportError> {
        let (client, server) = MemoryTransport::pair(self.buffer_size);
        self.accepted
            .send(server)
            .map_err(|_| TransportError::ConnectionFailed {
                address: address.to_string(),
                source: io::Error::new(io::ErrorKind::ConnectionRefused, "no memory listener"),
            })?;
        Ok(Connection::from_stream(client))
    }
}

/// Receives the server halves of [`MemoryConnector`] connections.
#[derive(Debug)]
pub struct MemoryListener {
    incoming: mpsc::UnboundedReceiver<MemoryTransport>,
}

impl MemoryListener {
    /// Waits for the next connection. Returns `None` once every connector
    /// clone has been dropped.
    pub async fn accept(&mut self) -> Option<MemoryTransport> {
        self.incoming.recv().await
    }
}

impl std::fmt::Debug for MemoryTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryTransport")
            .field("metadata", &self.metadata)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::BytesMut;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    #[tokio::test]
    async fn test_memory_transport_bidirectional() {
        let (mut t1, mut t2) = MemoryTransport::pair_default();

        t1.write_all(b"Hello").await.unwrap();
        let mut buffer = vec![0u8; 1024];
        let n = t2.read(&mut buffer).await.unwrap();
        assert_eq!(&buffer[..n], b"Hello");

        t2.write_all(b"World").await.unwrap();
        let n = t1.read(&mut buffer).await.unwrap();
        assert_eq!(&buffer[..n], b"World");
    }

    #[tokio::test]
    async fn test_memory_transport_partial_reads() {
        let (mut tx, mut rx) = MemoryTransport::pair_default();
        tx.write_all(b"abcdef").await.unwrap();

        let mut small = [0u8; 4];
        let n = rx.read(&mut small).await.unwrap();
        assert_eq!(&small[..n], b"abcd");
        let n = rx.read(&mut small).await.unwrap();
        assert_eq!(&small[..n], b"ef");
    }

    #[tokio::test]
    async fn test_memory_transport_shutdown_is_eof() {
        let (mut tx, mut rx) = MemoryTransport::pair_default();
        tx.write_all(b"last").await.unwrap();
        tx.shutdown().await.unwrap();

        let mut buffer = Vec::new();
        rx.read_to_end(&mut buffer).await.unwrap();
        assert_eq!(buffer, b"last");
        assert!(tx.write_all(b"more").await.is_err());
    }

    #[tokio::test]
    async fn test_memory_connector_delivers_server_half() {
        let (connector, mut listener) = MemoryConnector::new(8);
        assert_eq!(connector.kind(), TransportKind::Stream);

        let mut connection = connector.connect("memory:test").await.unwrap();
        let mut server = listener.accept().await.unwrap();
        assert_eq!(connection.metadata.transport_type, "memory");

        connection.writer.write_frame(b"ping").await.unwrap();
        let mut buf = [0u8; 4];
        server.read_exact(&mut buf).await.unwrap();
        assert_eq!(&buf, b"ping");

        server.write_all(b"pong").await.unwrap();
        let mut chunk = BytesMut::new();
        let n = connection.reader.read_chunk(&mut chunk).await.unwrap();
        assert_eq!(&chunk[..n], b"pong");
    }

    #[tokio::test]
    async fn test_memory_connector_refused_without_listener() {
        let (connector, listener) = MemoryConnector::new(8);
        drop(listener);

        let err = connector.connect("memory:gone").await.unwrap_err();
        assert!(matches!(err, TransportError::ConnectionFailed { .. }));
    }
}
