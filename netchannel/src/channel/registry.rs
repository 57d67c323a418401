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


//! Channel registry.

use crate::channel::{Channel, ChannelConfig, ChannelError, ChannelEventHandler};
use crate::codec::{CustomErrorData, Message, UserData};
use crate::tick::Tick;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

#[cfg(feature = "observability")]
use tracing::{debug, warn};

/// Owns a set of named channels and ticks them together.
///
/// The registry installs itself as the event handler of every channel it
/// creates and re-raises their events, tagged with the channel name, to the
/// handlers registered through [`subscribe`](Self::subscribe).
///
/// # Example
///
/// ```rust
/// use netchannel::channel::{ChannelConfig, ChannelRegistry};
/// use netchannel::codec::{JsonCodec, Message};
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Debug, Serialize, Deserialize)]
/// struct Ping;
///
/// impl Message for Ping {
///     fn message_id(&self) -> u32 {
///         0
///     }
/// }
///
/// let codec = JsonCodec::<Ping>::new().register::<Ping>(0).into_config().build().unwrap();
/// let mut registry = ChannelRegistry::new();
/// registry.create_channel("world", ChannelConfig::tcp(codec.clone())).unwrap();
///
/// assert!(registry.has_channel("world"));
/// assert!(registry.create_channel("world", ChannelConfig::tcp(codec)).is_err());
/// assert!(registry.destroy_channel("world"));
/// assert_eq!(registry.channel_count(), 0);
/// ```
pub struct ChannelRegistry<M: Message> {
    channels: HashMap<String, Channel<M>>,
    events: Arc<RegistryEvents>,
}

impl<M: Message> ChannelRegistry<M> {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            channels: HashMap::new(),
            events: Arc::new(RegistryEvents::default()),
        }
    }

    /// Creates an idle channel named `name`.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelError::DuplicateChannel`] if the name is taken.
    pub fn create_channel(
        &mut self,
        name: impl Into<String>,
        config: ChannelConfig<M>,
    ) -> Result<&mut Channel<M>, ChannelError> {
        let name = name.into();
        if self.channels.contains_key(&name) {
            return Err(ChannelError::DuplicateChannel { channel: name });
        }

        #[cfg(feature = "observability")]
        debug!(channel = %name, "Channel created");

        let mut channel = Channel::new(name.clone(), config);
        channel.set_event_handler(Arc::clone(&self.events) as Arc<dyn ChannelEventHandler>);
        Ok(self.channels.entry(name).or_insert(channel))
    }

    /// Closes and removes a channel. Returns `false` if no channel has that
    /// name.
    ///
    /// The channel is detached first, so destroying it raises no events.
    pub fn destroy_channel(&mut self, name: &str) -> bool {
        let Some(mut channel) = self.channels.remove(name) else {
            return false;
        };
        channel.clear_event_handler();
        channel.shutdown();

        #[cfg(feature = "observability")]
        debug!(channel = %name, "Channel destroyed");

        true
    }

    /// Returns `true` if a channel named `name` exists.
    pub fn has_channel(&self, name: &str) -> bool {
        self.channels.contains_key(name)
    }

    /// Looks up a channel.
    pub fn get_channel(&self, name: &str) -> Option<&Channel<M>> {
        self.channels.get(name)
    }

    /// Looks up a channel for mutation.
    pub fn get_channel_mut(&mut self, name: &str) -> Option<&mut Channel<M>> {
        self.channels.get_mut(name)
    }

    /// Iterates over all channels in unspecified order.
    pub fn channels(&self) -> impl Iterator<Item = &Channel<M>> {
        self.channels.values()
    }

    /// Number of channels.
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Adds a handler for the events of every channel.
    pub fn subscribe(&self, handler: Arc<dyn ChannelEventHandler>) {
        self.events.subscribers.write().push(handler);
    }

    /// Removes a handler added with [`subscribe`](Self::subscribe).
    pub fn unsubscribe(&self, handler: &Arc<dyn ChannelEventHandler>) -> bool {
        let mut subscribers = self.events.subscribers.write();
        let before = subscribers.len();
        subscribers.retain(|existing| !Arc::ptr_eq(existing, handler));
        subscribers.len() != before
    }

    /// Ticks every channel.
    ///
    /// # Errors
    ///
    /// With no subscriber, returns the first background error raised by any
    /// channel during this tick. Errors from the other channels are logged.
    pub fn update(&mut self, tick: Tick) -> Result<(), ChannelError> {
        let mut first_error = None;
        for channel in self.channels.values_mut() {
            if let Err(error) = channel.update(tick) {
                if first_error.is_none() {
                    first_error = Some(error);
                } else {
                    #[cfg(feature = "observability")]
                    warn!(%error, "Additional channel error during registry update");
                }
            }
        }
        match first_error {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    /// Closes every channel, keeping them registered.
    pub fn close_all(&mut self) {
        for channel in self.channels.values_mut() {
            channel.close();
        }
    }
}

impl<M: Message> Default for ChannelRegistry<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: Message> fmt::Debug for ChannelRegistry<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChannelRegistry")
            .field("channels", &self.channels.keys().collect::<Vec<_>>())
            .field("subscribers", &self.events.subscribers.read().len())
            .finish()
    }
}

/// Fans channel events out to the registry's subscribers.
#[derive(Default)]
struct RegistryEvents {
    subscribers: RwLock<Vec<Arc<dyn ChannelEventHandler>>>,
}

impl RegistryEvents {
    /// Snapshot so subscribers may call back into the registry.
    fn snapshot(&self) -> Vec<Arc<dyn ChannelEventHandler>> {
        self.subscribers.read().clone()
    }
}

impl ChannelEventHandler for RegistryEvents {
    fn on_connected(&self, channel: &str, user_data: Option<&UserData>) {
        for subscriber in self.snapshot() {
            subscriber.on_connected(channel, user_data);
        }
    }

    fn on_closed(&self, channel: &str) {
        for subscriber in self.snapshot() {
            subscriber.on_closed(channel);
        }
    }

    fn on_missed_heartbeat(&self, channel: &str, missed: u32) {
        for subscriber in self.snapshot() {
            subscriber.on_missed_heartbeat(channel, missed);
        }
    }

    fn on_error(&self, channel: &str, error: &ChannelError) {
        for subscriber in self.snapshot() {
            subscriber.on_error(channel, error);
        }
    }

    fn on_custom_error(&self, channel: &str, data: &CustomErrorData) {
        for subscriber in self.snapshot() {
            subscriber.on_custom_error(channel, data);
        }
    }

    fn handles_errors(&self) -> bool {
        self.subscribers
            .read()
            .iter()
            .any(|subscriber| subscriber.handles_errors())
    }
}
