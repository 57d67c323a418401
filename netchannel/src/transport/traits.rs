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

//! Core transport traits.

use crate::transport::stream::{StreamReader, StreamWriter};
use crate::transport::{TransportError, TransportKind, TransportMetadata};
use async_trait::async_trait;
use bytes::BytesMut;
use tokio::io::{AsyncRead, AsyncWrite};

/// A connected byte stream.
///
/// Stream backends (TCP, in-memory pipes) implement this trait and are turned
/// into a [`Connection`] with [`Connection::from_stream`], which splits them
/// into independently owned read and write halves.
///
/// # Examples
///
/// ```rust
/// use netchannel::transport::{MemoryTransport, Transport};
///
/// let (client, _server) = MemoryTransport::pair(16);
/// assert_eq!(client.metadata().transport_type, "memory");
/// ```
pub trait Transport: AsyncRead + AsyncWrite + Send + Sync + Unpin + 'static {
    /// Returns metadata about this transport.
    fn metadata(&self) -> &TransportMetadata;
}

/// Read half of an established connection.
///
/// Owned by the channel's single reader task.
#[async_trait]
pub trait TransportReader: Send + 'static {
    /// Appends whatever arrived next to `buf` and returns the number of bytes
    /// appended.
    ///
    /// Stream backends perform one read; message backends append one inbound
    /// message. The appended bytes may hold a partial frame, exactly one
    /// frame, or several frames. `Ok(0)` means the peer closed the
    /// connection.
    async fn read_chunk(&mut self, buf: &mut BytesMut) -> Result<usize, TransportError>;
}

/// Write half of an established connection.
///
/// Owned by the channel's single writer task, so at most one write is in
/// flight per connection.
#[async_trait]
pub trait TransportWriter: Send + 'static {
    /// Writes one complete frame.
    async fn write_frame(&mut self, frame: &[u8]) -> Result<(), TransportError>;

    /// Half-closes the connection. No further frames may be written.
    async fn shutdown(&mut self) -> Result<(), TransportError>;
}

/// Establishes connections for a channel.
///
/// A connector is shared by every connect attempt of a channel, so it holds
/// configuration only and produces a fresh [`Connection`] per attempt.
#[async_trait]
pub trait Connector: Send + Sync + 'static {
    /// Whether connections from this connector are stream or message based.
    fn kind(&self) -> TransportKind;

    /// Connects to `address`.
    async fn connect(&self, address: &str) -> Result<Connection, TransportError>;
}

/// An established connection, split into its read and write halves.
///
/// Dropping both halves releases the underlying transport.
pub struct Connection {
    /// Read half.
    pub reader: Box<dyn TransportReader>,
    /// Write half.
    pub writer: Box<dyn TransportWriter>,
    /// Metadata captured when the connection was established.
    pub metadata: TransportMetadata,
}

impl Connection {
    /// Creates a connection from explicit halves.
    pub fn new(
        reader: Box<dyn TransportReader>,
        writer: Box<dyn TransportWriter>,
        metadata: TransportMetadata,
    ) -> Self {
        Self {
            reader,
            writer,
            metadata,
        }
    }

    /// Splits a stream transport into a connection.
    pub fn from_stream<T: Transport>(transport: T) -> Self {
        let metadata = transport.metadata().clone();
        let (read_half, write_half) = tokio::io::split(transport);
        Self {
            reader: Box::new(StreamReader::new(read_half)),
            writer: Box::new(StreamWriter::new(write_half)),
            metadata,
        }
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("metadata", &self.metadata)
            .finish_non_exhaustive()
    }
}
