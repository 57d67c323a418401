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

//! State of one connect..close cycle.
//!
//! Every `connect` builds a fresh [`Session`]: new queues, counters, heartbeat
//! state and event inbox, plus the cancellation token its tasks watch. Tasks
//! only ever hold `Arc`s into their own session, so once a channel drops a
//! session nothing those tasks do can reach the next one.

use crate::channel::dispatch::PacketQueue;
use crate::channel::heartbeat::HeartbeatHandle;
use crate::channel::receive::{ReceiveError, ReceivePipeline, Reader};
use crate::channel::send::{SendQueue, SendState, Writer};
use crate::codec::{CodecConfig, CustomErrorData, SerializationError};
use crate::observability::ChannelMetrics;
use crate::transport::{
    AddressFamily, Connection, Connector, TransportError, TransportMetadata,
};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

#[cfg(feature = "observability")]
use tracing::{debug, info, warn};

/// Reports from a session's background tasks, applied on the next tick.
pub(crate) enum SessionEvent {
    Connected(TransportMetadata),
    ConnectFailed(TransportError),
    PeerClosed,
    TransportFailed(TransportError),
    SerializeFailed(SerializationError),
    ReceiveFailed(ReceiveError),
    CustomError(CustomErrorData),
}

/// Thread-safe queue of [`SessionEvent`]s.
#[derive(Default)]
pub(crate) struct SessionInbox {
    events: Mutex<VecDeque<SessionEvent>>,
}

impl SessionInbox {
    pub(crate) fn push(&self, event: SessionEvent) {
        self.events.lock().push_back(event);
    }

    pub(crate) fn take(&self) -> VecDeque<SessionEvent> {
        std::mem::take(&mut *self.events.lock())
    }
}

/// Parameters a session's tasks need, captured at connect time.
pub(crate) struct SessionSpec<M> {
    pub(crate) channel: String,
    pub(crate) address: String,
    pub(crate) codec: CodecConfig<M>,
    pub(crate) connector: Arc<dyn Connector>,
    pub(crate) packets: Arc<PacketQueue<M>>,
    pub(crate) receive_buffer_capacity: usize,
    pub(crate) max_frame_size: usize,
    pub(crate) reset_heartbeat_on_receive: bool,
}

/// Shared state of one transport session.
pub(crate) struct Session<M> {
    pub(crate) family: AddressFamily,
    pub(crate) send_queue: Arc<SendQueue<M>>,
    pub(crate) heartbeat: HeartbeatHandle,
    pub(crate) metrics: Arc<ChannelMetrics>,
    pub(crate) inbox: Arc<SessionInbox>,
    pub(crate) cancel: CancellationToken,
    pub(crate) metadata: Option<TransportMetadata>,
}

impl<M: Send + 'static> Session<M> {
    /// Creates the session and spawns its connect task on `runtime`.
    pub(crate) fn start(
        spec: SessionSpec<M>,
        family: AddressFamily,
        runtime: &tokio::runtime::Handle,
    ) -> Self {
        let session = Self {
            family,
            send_queue: Arc::new(SendQueue::new()),
            heartbeat: HeartbeatHandle::default(),
            metrics: Arc::new(ChannelMetrics::new(spec.channel.clone())),
            inbox: Arc::new(SessionInbox::default()),
            cancel: CancellationToken::new(),
            metadata: None,
        };

        let tasks = SessionTasks {
            spec,
            send_queue: Arc::clone(&session.send_queue),
            heartbeat: session.heartbeat.clone(),
            metrics: Arc::clone(&session.metrics),
            inbox: Arc::clone(&session.inbox),
            cancel: session.cancel.clone(),
        };
        runtime.spawn(tasks.run());

        session
    }
}

impl<M> Drop for Session<M> {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Handles moved into the connect task.
struct SessionTasks<M> {
    spec: SessionSpec<M>,
    send_queue: Arc<SendQueue<M>>,
    heartbeat: HeartbeatHandle,
    metrics: Arc<ChannelMetrics>,
    inbox: Arc<SessionInbox>,
    cancel: CancellationToken,
}

impl<M: Send + 'static> SessionTasks<M> {
    /// Connects, then runs the writer on its own task and the reader here.
    async fn run(self) {
        let SessionTasks {
            spec,
            send_queue,
            heartbeat,
            metrics,
            inbox,
            cancel,
        } = self;

        #[cfg(feature = "observability")]
        info!(channel = %spec.channel, address = %spec.address, "Connecting");

        let connection = tokio::select! {
            _ = cancel.cancelled() => return,
            result = spec.connector.connect(&spec.address) => result,
        };

        let Connection {
            reader,
            writer,
            metadata,
        } = match connection {
            Ok(connection) => connection,
            Err(error) => {
                #[cfg(feature = "observability")]
                warn!(channel = %spec.channel, %error, "Connect failed");
                inbox.push(SessionEvent::ConnectFailed(error));
                return;
            }
        };

        #[cfg(feature = "observability")]
        debug!(
            channel = %spec.channel,
            transport_id = %metadata.id,
            transport_type = %metadata.transport_type,
            "Transport established"
        );

        inbox.push(SessionEvent::Connected(metadata));

        let writer = Writer {
            channel: spec.channel.clone(),
            codec: spec.codec.clone(),
            queue: send_queue,
            writer,
            inbox: Arc::clone(&inbox),
            metrics: Arc::clone(&metrics),
            cancel: cancel.clone(),
            state: SendState::with_capacity(spec.receive_buffer_capacity),
        };
        tokio::spawn(writer.run());

        let reader = Reader {
            pipeline: ReceivePipeline::new(
                &spec.codec,
                spec.receive_buffer_capacity,
                spec.max_frame_size,
            ),
            channel: spec.channel,
            reader,
            packets: spec.packets,
            heartbeat,
            reset_heartbeat_on_receive: spec.reset_heartbeat_on_receive,
            inbox,
            metrics,
            cancel,
        };
        reader.run().await;
    }
}
