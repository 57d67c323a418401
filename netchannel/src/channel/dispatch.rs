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

//! Dispatch queue.
//!
//! Decoded packets are pushed from the reader task into a [`PacketQueue`] and
//! delivered to subscribers only when the owner ticks the channel, so message
//! handlers always run on the owner's thread.

use crate::codec::Packet;
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::sync::Arc;

#[cfg(feature = "observability")]
use tracing::warn;

/// Subscriber invoked with each dispatched packet.
pub type PacketHandler<M> = Box<dyn FnMut(Packet<M>) + Send>;

/// Thread-safe FIFO of decoded packets.
pub(crate) struct PacketQueue<M> {
    queue: Mutex<VecDeque<Packet<M>>>,
}

impl<M> PacketQueue<M> {
    pub(crate) fn new() -> Self {
        Self {
            queue: Mutex::new(VecDeque::new()),
        }
    }

    pub(crate) fn push(&self, packet: Packet<M>) {
        self.queue.lock().push_back(packet);
    }

    pub(crate) fn len(&self) -> usize {
        self.queue.lock().len()
    }

    /// Moves every queued packet into `out`, preserving order.
    fn drain_into(&self, out: &mut VecDeque<Packet<M>>) {
        let mut queue = self.queue.lock();
        if out.is_empty() {
            std::mem::swap(&mut *queue, out);
        } else {
            out.extend(queue.drain(..));
        }
    }

    fn clear(&self) {
        self.queue.lock().clear();
    }
}

/// Packet subscribers plus the queue feeding them.
///
/// # Examples
///
/// ```rust
/// use netchannel::channel::DispatchQueue;
/// use netchannel::codec::Packet;
/// use std::sync::{Arc, Mutex};
///
/// let seen = Arc::new(Mutex::new(Vec::new()));
/// let mut dispatch = DispatchQueue::<&'static str>::new();
///
/// let sink = Arc::clone(&seen);
/// dispatch.subscribe(7, move |packet| sink.lock().unwrap().push(packet.payload));
///
/// dispatch.push(Packet::new(7, "hello"));
/// dispatch.push(Packet::new(8, "dropped"));
/// assert_eq!(dispatch.update(), 1);
/// assert_eq!(*seen.lock().unwrap(), vec!["hello"]);
/// ```
pub struct DispatchQueue<M> {
    packets: Arc<PacketQueue<M>>,
    handlers: HashMap<u32, PacketHandler<M>>,
    default_handler: Option<PacketHandler<M>>,
    scratch: VecDeque<Packet<M>>,
}

impl<M> DispatchQueue<M> {
    /// Creates an empty queue with no subscribers.
    pub fn new() -> Self {
        Self {
            packets: Arc::new(PacketQueue::new()),
            handlers: HashMap::new(),
            default_handler: None,
            scratch: VecDeque::new(),
        }
    }

    /// Routes packets with `message_id` to `handler`, replacing any previous
    /// subscriber for that id.
    pub fn subscribe<F>(&mut self, message_id: u32, handler: F)
    where
        F: FnMut(Packet<M>) + Send + 'static,
    {
        self.handlers.insert(message_id, Box::new(handler));
    }

    /// Removes the subscriber for `message_id`. Returns `true` if one existed.
    pub fn unsubscribe(&mut self, message_id: u32) -> bool {
        self.handlers.remove(&message_id).is_some()
    }

    /// Routes packets without a per-id subscriber to `handler`.
    pub fn set_default_handler<F>(&mut self, handler: F)
    where
        F: FnMut(Packet<M>) + Send + 'static,
    {
        self.default_handler = Some(Box::new(handler));
    }

    /// Queues a packet for the next [`update`](Self::update).
    pub fn push(&self, packet: Packet<M>) {
        self.packets.push(packet);
    }

    /// Delivers queued packets in arrival order and returns how many reached
    /// a subscriber.
    ///
    /// Packets with neither a per-id subscriber nor a default handler are
    /// logged and dropped.
    pub fn update(&mut self) -> usize {
        self.packets.drain_into(&mut self.scratch);
        let mut delivered = 0;
        while let Some(packet) = self.scratch.pop_front() {
            let handler = match self.handlers.get_mut(&packet.message_id) {
                Some(handler) => Some(handler),
                None => self.default_handler.as_mut(),
            };
            match handler {
                Some(handler) => {
                    handler(packet);
                    delivered += 1;
                }
                None => {
                    #[cfg(feature = "observability")]
                    warn!(message_id = packet.message_id, "No handler for packet, dropping");
                }
            }
        }
        delivered
    }

    /// Number of packets waiting for the next update.
    pub fn pending_count(&self) -> usize {
        self.packets.len()
    }

    /// Discards every queued packet.
    pub fn clear(&mut self) {
        self.packets.clear();
        self.scratch.clear();
    }

    /// Removes all subscribers and the default handler.
    pub fn clear_handlers(&mut self) {
        self.handlers.clear();
        self.default_handler = None;
    }

    /// Detaches from the current queue and returns a fresh one for a new
    /// session. Packets still pushed to the old queue are never delivered.
    pub(crate) fn renew(&mut self) -> Arc<PacketQueue<M>> {
        self.scratch.clear();
        self.packets = Arc::new(PacketQueue::new());
        Arc::clone(&self.packets)
    }
}

impl<M> Default for DispatchQueue<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M> fmt::Debug for DispatchQueue<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DispatchQueue")
            .field("pending", &self.pending_count())
            .field("subscribers", &self.handlers.len())
            .field("default_handler", &self.default_handler.is_some())
            .finish()
    }
}
