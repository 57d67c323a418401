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


//! Channel configuration.

use crate::codec::CodecConfig;
use crate::transport::{Connector, TcpConnector};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Tunables of a channel.
///
/// # Examples
///
/// ```rust
/// use netchannel::channel::ChannelOptions;
/// use std::time::Duration;
///
/// let options = ChannelOptions::default()
///     .with_heartbeat_interval(Duration::from_secs(5))
///     .with_miss_threshold(3);
///
/// assert_eq!(options.heartbeat_interval, Duration::from_secs(5));
/// assert_eq!(options.max_frame_size, 16 * 1024 * 1024);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ChannelOptions {
    /// Time between heartbeat probes. Zero disables heartbeating.
    pub heartbeat_interval: Duration,

    /// Unanswered probes tolerated before the channel times out.
    pub miss_threshold: u32,

    /// Restart the probe interval whenever a packet arrives.
    pub reset_heartbeat_on_receive: bool,

    /// Largest inbound frame accepted, header included.
    pub max_frame_size: usize,

    /// Initial capacity of the receive and send buffers.
    pub receive_buffer_capacity: usize,

    /// Disable Nagle's algorithm on TCP transports built from these options.
    pub tcp_nodelay: bool,
}

impl Default for ChannelOptions {
    fn default() -> Self {
        Self {
            heartbeat_interval: Duration::from_secs(30),
            miss_threshold: 10,
            reset_heartbeat_on_receive: false,
            max_frame_size: 16 * 1024 * 1024,
            receive_buffer_capacity: 8 * 1024,
            tcp_nodelay: true,
        }
    }
}

impl ChannelOptions {
    /// Sets the heartbeat interval.
    pub fn with_heartbeat_interval(mut self, interval: Duration) -> Self {
        self.heartbeat_interval = interval;
        self
    }

    /// Sets the miss threshold.
    pub fn with_miss_threshold(mut self, threshold: u32) -> Self {
        self.miss_threshold = threshold;
        self
    }

    /// Sets whether received packets restart the probe interval.
    pub fn with_reset_heartbeat_on_receive(mut self, reset: bool) -> Self {
        self.reset_heartbeat_on_receive = reset;
        self
    }

    /// Sets the largest accepted inbound frame.
    pub fn with_max_frame_size(mut self, size: usize) -> Self {
        self.max_frame_size = size;
        self
    }

    /// Sets the initial buffer capacity.
    pub fn with_receive_buffer_capacity(mut self, capacity: usize) -> Self {
        self.receive_buffer_capacity = capacity;
        self
    }

    /// Sets `TCP_NODELAY` for [`ChannelConfig::tcp`].
    pub fn with_tcp_nodelay(mut self, nodelay: bool) -> Self {
        self.tcp_nodelay = nodelay;
        self
    }
}

/// Everything a channel needs: codec, transport backend and options.
pub struct ChannelConfig<M> {
    /// Frame codec.
    pub codec: CodecConfig<M>,
    /// Transport backend used by `connect`.
    pub connector: Arc<dyn Connector>,
    /// Tunables.
    pub options: ChannelOptions,
}

impl<M> ChannelConfig<M> {
    /// Creates a configuration with default options.
    pub fn new(codec: CodecConfig<M>, connector: impl Connector) -> Self {
        Self {
            codec,
            connector: Arc::new(connector),
            options: ChannelOptions::default(),
        }
    }

    /// Creates a TCP configuration with default options.
    pub fn tcp(codec: CodecConfig<M>) -> Self {
        Self::tcp_with_options(codec, ChannelOptions::default())
    }

    /// Creates a TCP configuration honouring `options.tcp_nodelay`.
    pub fn tcp_with_options(codec: CodecConfig<M>, options: ChannelOptions) -> Self {
        Self {
            codec,
            connector: Arc::new(TcpConnector::new(options.tcp_nodelay)),
            options,
        }
    }

    /// Replaces the options.
    pub fn with_options(mut self, options: ChannelOptions) -> Self {
        self.options = options;
        self
    }
}

impl<M> Clone for ChannelConfig<M> {
    fn clone(&self) -> Self {
        Self {
            codec: self.codec.clone(),
            connector: Arc::clone(&self.connector),
            options: self.options.clone(),
        }
    }
}

impl<M> fmt::Debug for ChannelConfig<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChannelConfig")
            .field("codec", &self.codec)
            .field("transport", &self.connector.kind())
            .field("options", &self.options)
            .finish()
    }
}
