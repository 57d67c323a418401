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

//! Transport layer abstractions.
//!
//! A channel never talks to a socket directly. It asks its [`Connector`] for a
//! [`Connection`], which is split into a [`TransportReader`] owned by the
//! channel's reader task and a [`TransportWriter`] owned by its writer task.
//!
//! Two kinds of backend are provided:
//!
//! - stream oriented: [`TcpTransport`] via [`TcpConnector`], and the
//!   in-process [`MemoryTransport`] via [`MemoryConnector`];
//! - message oriented: WebSocket via [`WebSocketConnector`] (requires the
//!   `websocket` feature).
//!
//! Both kinds deliver chunks into the same receive pipeline, which never
//! assumes a chunk holds exactly one frame.
//!
//! # Examples
//!
//! ```rust
//! use netchannel::transport::{Connector, MemoryConnector};
//! use bytes::BytesMut;
//! use tokio::io::AsyncWriteExt;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let (connector, mut listener) = MemoryConnector::new(32);
//! let mut connection = connector.connect("memory:demo").await?;
//!
//! let mut server = listener.accept().await.expect("server half");
//! server.write_all(b"\x00\x01\x00\x04").await?;
//!
//! let mut buf = BytesMut::new();
//! let n = connection.reader.read_chunk(&mut buf).await?;
//! assert_eq!(n, 4);
//! # Ok(())
//! # }
//! ```

mod error;
mod memory;
mod stream;
mod tcp;
mod traits;
mod types;
#[cfg(feature = "websocket")]
mod websocket;

pub use error::TransportError;
pub use memory::{MemoryConnector, MemoryListener, MemoryTransport};
pub use stream::{StreamReader, StreamWriter};
pub use tcp::{TcpConnector, TcpTransport};
pub use traits::{Connection, Connector, Transport, TransportReader, TransportWriter};
pub use types::{AddressFamily, TransportId, TransportKind, TransportMetadata};
#[cfg(feature = "websocket")]
pub use websocket::{WebSocketConfig, WebSocketConnector};
