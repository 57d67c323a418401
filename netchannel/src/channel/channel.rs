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

//! The channel state machine.

use crate::channel::config::ChannelConfig;
use crate::channel::dispatch::DispatchQueue;
use crate::channel::events::ChannelEventHandler;
use crate::channel::heartbeat::HeartbeatMonitor;
use crate::channel::receive::ReceiveError;
use crate::channel::session::{Session, SessionEvent, SessionSpec};
use crate::channel::{ChannelError, ChannelState};
use crate::codec::{DeserializationError, Message, Packet, UserData};
use crate::observability::ChannelMetrics;
use crate::tick::Tick;
use crate::transport::{AddressFamily, TransportError, TransportMetadata};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;

#[cfg(feature = "observability")]
use tracing::{debug, info, instrument, warn};

/// A named, client-side connection that sends and receives framed messages.
///
/// A channel is owned and driven by one thread. [`connect`](Self::connect)
/// starts a transport session on the tokio runtime; from then on a reader
/// task and a writer task do the I/O while the owner calls
/// [`update`](Self::update) at its own cadence. Each update applies what the
/// background tasks reported, delivers received packets to subscribers and
/// runs the heartbeat, so every callback executes on the owner's thread.
///
/// # Ordering
///
/// - Messages are written in the order they were sent.
/// - Packets are dispatched in the order they arrived.
/// - The heartbeat is evaluated after the tick's dispatch.
///
/// # Example
///
/// ```rust,no_run
/// use netchannel::channel::{Channel, ChannelConfig};
/// use netchannel::codec::{JsonCodec, Message};
/// use netchannel::Tick;
/// use serde::{Deserialize, Serialize};
/// use std::time::Duration;
///
/// #[derive(Debug, Serialize, Deserialize)]
/// struct Chat {
///     text: String,
/// }
///
/// impl Message for Chat {
///     fn message_id(&self) -> u32 {
///         1
///     }
/// }
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let codec = JsonCodec::<Chat>::new().register::<Chat>(1).into_config().build()?;
/// let mut channel = Channel::new("chat", ChannelConfig::tcp(codec));
/// channel.subscribe(1, |packet| println!("{}", packet.payload.text));
/// channel.connect("127.0.0.1:7777", None)?;
///
/// loop {
///     channel.update(Tick::fixed(Duration::from_millis(16)))?;
///     if channel.is_active() {
///         channel.send(Chat { text: "hello".into() })?;
///     }
///     tokio::time::sleep(Duration::from_millis(16)).await;
/// }
/// # }
/// ```
pub struct Channel<M: Message> {
    name: String,
    config: ChannelConfig<M>,
    state: ChannelState,
    session: Option<Session<M>>,
    dispatch: DispatchQueue<M>,
    handler: Option<Arc<dyn ChannelEventHandler>>,
    monitor: HeartbeatMonitor,
    user_data: Option<UserData>,
}

impl<M: Message> Channel<M> {
    /// Creates an idle channel.
    pub fn new(name: impl Into<String>, config: ChannelConfig<M>) -> Self {
        Self {
            name: name.into(),
            config,
            state: ChannelState::Idle,
            session: None,
            dispatch: DispatchQueue::new(),
            handler: None,
            monitor: HeartbeatMonitor::disabled(),
            user_data: None,
        }
    }

    /// Returns the channel name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the configuration.
    pub fn config(&self) -> &ChannelConfig<M> {
        &self.config
    }

    /// Returns the lifecycle state.
    pub fn state(&self) -> ChannelState {
        self.state
    }

    /// Returns `true` while the channel is connected and accepting sends.
    pub fn is_active(&self) -> bool {
        self.state.is_connected()
    }

    /// Starts connecting to `address` on the current tokio runtime.
    ///
    /// Returns once the attempt is under way; the outcome is reported by a
    /// later [`update`](Self::update), through
    /// [`ChannelEventHandler::on_connected`] or a connect error. `user_data`
    /// is handed back with the connected event.
    ///
    /// # Errors
    ///
    /// - [`ChannelError::AlreadyConnected`] if a session exists; close first.
    /// - [`ChannelError::AddressFamilyUnsupported`] if `address` is neither
    ///   an IP endpoint nor a `host:port` pair.
    /// - [`ChannelError::Socket`] if called outside a tokio runtime.
    pub fn connect(&mut self, address: &str, user_data: Option<UserData>) -> Result<(), ChannelError> {
        let runtime = Handle::try_current().map_err(|e| ChannelError::Socket {
            channel: self.name.clone(),
            source: TransportError::InvalidConfiguration {
                reason: format!("connect requires a tokio runtime: {e}"),
            },
        })?;
        self.connect_on(address, user_data, &runtime)
    }

    /// Like [`connect`](Self::connect), spawning the session on `runtime`.
    #[cfg_attr(
        feature = "observability",
        instrument(skip(self, user_data, runtime), fields(channel = %self.name))
    )]
    pub fn connect_on(
        &mut self,
        address: &str,
        user_data: Option<UserData>,
        runtime: &Handle,
    ) -> Result<(), ChannelError> {
        if self.session.is_some() {
            return Err(ChannelError::AlreadyConnected {
                channel: self.name.clone(),
            });
        }

        let family = AddressFamily::resolve(address).map_err(|_| ChannelError::AddressFamilyUnsupported {
            channel: self.name.clone(),
            address: address.to_string(),
        })?;

        let options = &self.config.options;
        let spec = SessionSpec {
            channel: self.name.clone(),
            address: address.to_string(),
            codec: self.config.codec.clone(),
            connector: Arc::clone(&self.config.connector),
            packets: self.dispatch.renew(),
            receive_buffer_capacity: options.receive_buffer_capacity,
            max_frame_size: options.max_frame_size,
            reset_heartbeat_on_receive: options.reset_heartbeat_on_receive,
        };
        self.monitor = self.resolve_heartbeat();
        self.user_data = user_data;
        self.session = Some(Session::start(spec, family, runtime));
        self.transition(ChannelState::Connecting);

        #[cfg(feature = "observability")]
        debug!(?family, heartbeat = ?self.monitor, "Connect started");

        Ok(())
    }

    /// Queues `message` for the writer task.
    ///
    /// # Errors
    ///
    /// - [`ChannelError::NotConnected`] unless the channel is connected.
    /// - [`ChannelError::InvalidMessage`] if the send-header handler rejects
    ///   the message.
    pub fn send(&self, message: M) -> Result<(), ChannelError> {
        let session = match (&self.session, self.state) {
            (Some(session), ChannelState::Connected) => session,
            _ => {
                return Err(ChannelError::NotConnected {
                    channel: self.name.clone(),
                })
            }
        };

        self.config
            .codec
            .send_header
            .validate(&message)
            .map_err(|reason| ChannelError::InvalidMessage {
                channel: self.name.clone(),
                reason,
            })?;

        session.send_queue.push(message);
        Ok(())
    }

    /// Advances the channel by one host tick.
    ///
    /// Applies background reports (connect completion, peer close, I/O and
    /// codec failures), then, if still connected, wakes the writer, dispatches
    /// received packets and runs the heartbeat.
    ///
    /// # Errors
    ///
    /// Without an event handler that [handles errors](ChannelEventHandler::handles_errors),
    /// the first background error of this tick is returned here. Further
    /// errors of the same tick are logged.
    pub fn update(&mut self, tick: Tick) -> Result<(), ChannelError> {
        let mut first_error = None;
        self.apply_session_events(&mut first_error);
        if self.state.is_connected() {
            self.tick_connected(tick, &mut first_error);
        }
        match first_error {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    /// Closes the session.
    ///
    /// Cancels the reader and writer, drops queued sends and undelivered
    /// packets, and raises [`ChannelEventHandler::on_closed`]. Closing a
    /// channel without a session does nothing, so the event fires once per
    /// session.
    pub fn close(&mut self) {
        let Some(session) = self.session.take() else {
            return;
        };
        session.send_queue.clear();
        drop(session);

        self.dispatch.clear();
        self.user_data = None;
        self.transition(ChannelState::Closed);

        #[cfg(feature = "observability")]
        info!(channel = %self.name, "Channel closed");

        if let Some(handler) = &self.handler {
            handler.on_closed(&self.name);
        }
    }

    /// Closes the channel and drops all packet subscribers.
    pub fn shutdown(&mut self) {
        self.close();
        self.dispatch.clear_handlers();
    }

    /// Routes received packets with `message_id` to `handler`.
    pub fn subscribe<F>(&mut self, message_id: u32, handler: F)
    where
        F: FnMut(Packet<M>) + Send + 'static,
    {
        self.dispatch.subscribe(message_id, handler);
    }

    /// Removes the subscriber for `message_id`.
    pub fn unsubscribe(&mut self, message_id: u32) -> bool {
        self.dispatch.unsubscribe(message_id)
    }

    /// Routes packets without a per-id subscriber to `handler`.
    pub fn set_default_handler<F>(&mut self, handler: F)
    where
        F: FnMut(Packet<M>) + Send + 'static,
    {
        self.dispatch.set_default_handler(handler);
    }

    /// Registers the lifecycle event handler, replacing any previous one.
    pub fn set_event_handler(&mut self, handler: Arc<dyn ChannelEventHandler>) {
        self.handler = Some(handler);
    }

    /// Removes the lifecycle event handler.
    pub fn clear_event_handler(&mut self) -> Option<Arc<dyn ChannelEventHandler>> {
        self.handler.take()
    }

    /// Frames written during the current session.
    pub fn sent_count(&self) -> u64 {
        self.metrics().map_or(0, ChannelMetrics::sent_count)
    }

    /// Packets received during the current session.
    pub fn received_count(&self) -> u64 {
        self.metrics().map_or(0, ChannelMetrics::received_count)
    }

    /// Counters of the current session.
    pub fn metrics(&self) -> Option<&ChannelMetrics> {
        self.session.as_ref().map(|session| session.metrics.as_ref())
    }

    /// Messages queued but not yet written.
    pub fn pending_send_count(&self) -> usize {
        self.session
            .as_ref()
            .map_or(0, |session| session.send_queue.len())
    }

    /// Packets received but not yet dispatched.
    pub fn pending_receive_count(&self) -> usize {
        self.dispatch.pending_count()
    }

    /// Consecutive unanswered heartbeat probes.
    pub fn missed_heartbeat_count(&self) -> u32 {
        self.session
            .as_ref()
            .map_or(0, |session| session.heartbeat.snapshot().missed)
    }

    /// Time accumulated towards the next heartbeat probe.
    pub fn heartbeat_elapsed(&self) -> Duration {
        self.session
            .as_ref()
            .map_or(Duration::ZERO, |session| session.heartbeat.snapshot().elapsed)
    }

    /// The heartbeat settings in effect for the current session.
    pub fn heartbeat(&self) -> HeartbeatMonitor {
        self.monitor
    }

    /// Address family of the current session's address.
    pub fn address_family(&self) -> Option<AddressFamily> {
        self.session.as_ref().map(|session| session.family)
    }

    /// Metadata of the connected transport.
    pub fn transport_metadata(&self) -> Option<&TransportMetadata> {
        self.session.as_ref().and_then(|session| session.metadata.as_ref())
    }

    /// User data passed to the current [`connect`](Self::connect).
    pub fn user_data(&self) -> Option<&UserData> {
        self.user_data.as_ref()
    }

    /// Interval and threshold for the next session. A heartbeat handler's
    /// positive overrides win; without a handler there is no heartbeat.
    fn resolve_heartbeat(&self) -> HeartbeatMonitor {
        let Some(handler) = &self.config.codec.heartbeat else {
            return HeartbeatMonitor::disabled();
        };
        let options = &self.config.options;
        let interval = handler
            .heartbeat_interval()
            .filter(|interval| !interval.is_zero())
            .unwrap_or(options.heartbeat_interval);
        let threshold = handler
            .miss_threshold()
            .filter(|threshold| *threshold > 0)
            .unwrap_or(options.miss_threshold);
        HeartbeatMonitor::new(interval, threshold)
    }

    fn apply_session_events(&mut self, first_error: &mut Option<ChannelError>) {
        let Some(session) = &self.session else {
            return;
        };
        let events = session.inbox.take();

        for event in events {
            // An earlier event may have ended the session.
            if self.session.is_none() {
                break;
            }
            match event {
                SessionEvent::Connected(metadata) => self.on_transport_connected(metadata),
                SessionEvent::ConnectFailed(source) => {
                    self.session = None;
                    self.transition(ChannelState::Idle);
                    let error = ChannelError::Connect {
                        channel: self.name.clone(),
                        source,
                    };
                    self.report(error, first_error);
                }
                SessionEvent::PeerClosed => {
                    #[cfg(feature = "observability")]
                    info!(channel = %self.name, "Peer closed the connection");
                    self.close();
                }
                SessionEvent::TransportFailed(source) => {
                    let error = ChannelError::Socket {
                        channel: self.name.clone(),
                        source,
                    };
                    self.fault(error, first_error);
                }
                SessionEvent::SerializeFailed(source) => {
                    let error = ChannelError::Serialize {
                        channel: self.name.clone(),
                        source,
                    };
                    self.fault(error, first_error);
                }
                SessionEvent::ReceiveFailed(failure) => {
                    let error = self.receive_error(failure);
                    self.fault(error, first_error);
                }
                SessionEvent::CustomError(data) => {
                    if let Some(handler) = &self.handler {
                        handler.on_custom_error(&self.name, &data);
                    }
                }
            }
        }
    }

    fn on_transport_connected(&mut self, metadata: TransportMetadata) {
        if !self.transition(ChannelState::Connected) {
            return;
        }

        #[cfg(feature = "observability")]
        info!(
            channel = %self.name,
            transport_id = %metadata.id,
            peer = ?metadata.peer_addr,
            "Channel connected"
        );

        if let Some(session) = &mut self.session {
            session.heartbeat.reset();
            session.metadata = Some(metadata);
        }
        if let Some(handler) = &self.handler {
            handler.on_connected(&self.name, self.user_data.as_ref());
        }
    }

    fn tick_connected(&mut self, tick: Tick, first_error: &mut Option<ChannelError>) {
        let Some(session) = &self.session else {
            return;
        };

        session.send_queue.wake();
        self.dispatch.update();

        let Some(due) = session.heartbeat.tick(&self.monitor, tick.real_delta) else {
            return;
        };

        if due.missed_before > 0 {
            session.metrics.record_missed_heartbeat();

            #[cfg(feature = "observability")]
            warn!(channel = %self.name, missed = due.missed_before, "Heartbeat missed");

            if let Some(handler) = &self.handler {
                handler.on_missed_heartbeat(&self.name, due.missed_before);
            }
        }

        if let Some(probe) = self.config.codec.heartbeat.as_ref().and_then(|h| h.probe()) {
            session.send_queue.push(probe);
        }

        // The probe that exceeds the threshold is discarded unsent by close.
        if due.timed_out {
            let error = ChannelError::HeartbeatTimeout {
                channel: self.name.clone(),
                missed: due.missed_before + 1,
            };
            self.report(error, first_error);
            self.close();
        }
    }

    fn receive_error(&self, failure: ReceiveError) -> ChannelError {
        let channel = self.name.clone();
        match failure {
            ReceiveError::Header(source) => ChannelError::DeserializeHeader { channel, source },
            ReceiveError::Body { message_id, source } => ChannelError::DeserializeBody {
                channel,
                message_id,
                source,
            },
            ReceiveError::Poisoned => ChannelError::DeserializeHeader {
                channel,
                source: DeserializationError::new("receive pipeline rejected input after an earlier error"),
            },
        }
    }

    /// Marks the session unusable and reports `error`.
    fn fault(&mut self, error: ChannelError, first_error: &mut Option<ChannelError>) {
        if self.state.is_connected() {
            self.transition(ChannelState::Faulted(error.kind()));
        }
        self.report(error, first_error);
    }

    /// Hands a background error to the event handler, or keeps it for the
    /// caller of `update`.
    fn report(&self, error: ChannelError, first_error: &mut Option<ChannelError>) {
        #[cfg(feature = "observability")]
        warn!(channel = %self.name, kind = %error.kind(), %error, "Channel error");

        match &self.handler {
            Some(handler) if handler.handles_errors() => handler.on_error(&self.name, &error),
            _ if first_error.is_none() => *first_error = Some(error),
            _ => {
                #[cfg(feature = "observability")]
                debug!(channel = %self.name, "Earlier error of this tick takes precedence");
            }
        }
    }

    fn transition(&mut self, next: ChannelState) -> bool {
        if !self.state.can_transition_to(next) {
            #[cfg(feature = "observability")]
            debug!(channel = %self.name, from = %self.state, to = %next, "Ignoring state change");
            return false;
        }
        self.state = next;
        true
    }
}

impl<M: Message> fmt::Debug for Channel<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Channel")
            .field("name", &self.name)
            .field("state", &self.state)
            .field("dispatch", &self.dispatch)
            .field("heartbeat", &self.monitor)
            .finish()
    }
}
