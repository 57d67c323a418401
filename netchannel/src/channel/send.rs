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

//! Send pipeline.
//!
//! Outbound messages wait in a [`SendQueue`] until the channel's writer task
//! drains them. The writer serializes one message at a time into its
//! [`SendState`] scratch buffer, writes the frame and only then takes the next
//! message, so frames leave in enqueue order and never interleave.

use crate::channel::session::{SessionEvent, SessionInbox};
use crate::codec::{CodecConfig, SerializationError};
use crate::observability::ChannelMetrics;
use crate::transport::TransportWriter;
use bytes::BytesMut;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;

#[cfg(feature = "observability")]
use tracing::{debug, trace, warn};

/// Thread-safe FIFO of outbound messages.
pub(crate) struct SendQueue<M> {
    queue: Mutex<VecDeque<M>>,
    notify: Notify,
}

impl<M> SendQueue<M> {
    pub(crate) fn new() -> Self {
        Self {
            queue: Mutex::new(VecDeque::new()),
            notify: Notify::new(),
        }
    }

    /// Appends a message and wakes the writer.
    pub(crate) fn push(&self, message: M) {
        self.queue.lock().push_back(message);
        self.notify.notify_one();
    }

    pub(crate) fn pop(&self) -> Option<M> {
        self.queue.lock().pop_front()
    }

    pub(crate) fn len(&self) -> usize {
        self.queue.lock().len()
    }

    pub(crate) fn clear(&self) {
        self.queue.lock().clear();
    }

    /// Wakes the writer without queuing anything.
    pub(crate) fn wake(&self) {
        self.notify.notify_one();
    }

    async fn notified(&self) {
        self.notify.notified().await;
    }
}

/// Scratch buffer holding the one frame currently in flight.
pub(crate) struct SendState {
    buffer: BytesMut,
}

impl SendState {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: BytesMut::with_capacity(capacity),
        }
    }

    /// Serializes `message` into the scratch buffer and returns the frame.
    ///
    /// The buffer must be empty; a failed serialization leaves it empty.
    pub(crate) fn serialize<M: 'static>(
        &mut self,
        codec: &CodecConfig<M>,
        message: &M,
    ) -> Result<&[u8], SerializationError> {
        debug_assert!(self.buffer.is_empty(), "previous frame still in flight");
        match codec.encode(message, &mut self.buffer) {
            Ok(()) => Ok(&self.buffer[..]),
            Err(e) => {
                self.buffer.clear();
                Err(e)
            }
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Releases the frame after a successful write.
    pub(crate) fn reset(&mut self) {
        self.buffer.clear();
    }
}

/// Everything the writer task owns.
pub(crate) struct Writer<M> {
    pub(crate) channel: String,
    pub(crate) codec: CodecConfig<M>,
    pub(crate) queue: Arc<SendQueue<M>>,
    pub(crate) writer: Box<dyn TransportWriter>,
    pub(crate) inbox: Arc<SessionInbox>,
    pub(crate) metrics: Arc<ChannelMetrics>,
    pub(crate) cancel: CancellationToken,
    pub(crate) state: SendState,
}

impl<M: Send + 'static> Writer<M> {
    /// Drains the queue until the session is cancelled or fails.
    pub(crate) async fn run(mut self) {
        loop {
            while self.state.is_empty() {
                let Some(message) = self.queue.pop() else {
                    break;
                };
                if !self.write_one(message).await {
                    return;
                }
            }

            tokio::select! {
                _ = self.cancel.cancelled() => break,
                _ = self.queue.notified() => {}
            }
        }

        #[cfg(feature = "observability")]
        debug!(channel = %self.channel, "Writer cancelled, shutting down transport");

        if let Err(_e) = self.writer.shutdown().await {
            #[cfg(feature = "observability")]
            trace!(channel = %self.channel, error = %_e, "Transport shutdown failed");
        }
    }

    /// Serializes and writes one frame. Returns `false` when the writer must
    /// stop.
    async fn write_one(&mut self, message: M) -> bool {
        let frame = match self.state.serialize(&self.codec, &message) {
            Ok(frame) => frame,
            Err(error) => {
                #[cfg(feature = "observability")]
                warn!(channel = %self.channel, %error, "Failed to serialize message");
                self.metrics.record_error();
                self.inbox.push(SessionEvent::SerializeFailed(error));
                return false;
            }
        };
        let length = frame.len();

        tokio::select! {
            _ = self.cancel.cancelled() => return false,
            result = self.writer.write_frame(frame) => {
                if let Err(error) = result {
                    #[cfg(feature = "observability")]
                    warn!(channel = %self.channel, %error, "Failed to write frame");
                    self.metrics.record_error();
                    self.inbox.push(SessionEvent::TransportFailed(error));
                    return false;
                }
            }
        }

        self.metrics.record_sent(length);
        self.state.reset();

        #[cfg(feature = "observability")]
        trace!(channel = %self.channel, bytes = length, "Frame written");

        true
    }
}
