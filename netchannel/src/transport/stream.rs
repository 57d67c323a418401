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

//! Reader and writer halves shared by all byte stream transports.

use crate::transport::{TransportError, TransportReader, TransportWriter};
use async_trait::async_trait;
use bytes::BytesMut;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, ReadHalf, WriteHalf};

/// Minimum spare capacity reserved before each read.
const READ_RESERVE: usize = 4096;

/// Read half of a stream transport.
pub struct StreamReader<T> {
    inner: ReadHalf<T>,
}

impl<T> StreamReader<T> {
    pub(crate) fn new(inner: ReadHalf<T>) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<T> TransportReader for StreamReader<T>
where
    T: AsyncRead + Send + 'static,
{
    async fn read_chunk(&mut self, buf: &mut BytesMut) -> Result<usize, TransportError> {
        buf.reserve(READ_RESERVE);
        self.inner
            .read_buf(buf)
            .await
            .map_err(|source| TransportError::ReadFailed { source })
    }
}

/// Write half of a stream transport.
pub struct StreamWriter<T> {
    inner: WriteHalf<T>,
}

impl<T> StreamWriter<T> {
    pub(crate) fn new(inner: WriteHalf<T>) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<T> TransportWriter for StreamWriter<T>
where
    T: AsyncWrite + Send + 'static,
{
    async fn write_frame(&mut self, frame: &[u8]) -> Result<(), TransportError> {
        self.inner
            .write_all(frame)
            .await
            .map_err(|source| TransportError::WriteFailed { source })?;
        self.inner
            .flush()
            .await
            .map_err(|source| TransportError::WriteFailed { source })
    }

    async fn shutdown(&mut self) -> Result<(), TransportError> {
        self.inner.shutdown().await.map_err(TransportError::from)
    }
}
