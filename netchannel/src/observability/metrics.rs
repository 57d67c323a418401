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

//! Per-session channel metrics.
//!
//! Counters are atomics so the reader and writer tasks can update them
//! without locking. With the `observability` feature they are also exported
//! to the `metrics` crate, labelled with the channel name.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Traffic and error counters of one channel session.
///
/// A new instance is created on every connect, so the counters a channel
/// reports always describe the current session.
///
/// # Examples
///
/// ```rust
/// use netchannel::observability::ChannelMetrics;
///
/// let metrics = ChannelMetrics::new("lobby");
/// metrics.record_sent(11);
/// metrics.record_received();
///
/// assert_eq!(metrics.sent_count(), 1);
/// assert_eq!(metrics.bytes_sent(), 11);
/// assert_eq!(metrics.received_count(), 1);
/// ```
pub struct ChannelMetrics {
    channel: String,
    frames_sent: AtomicU64,
    bytes_sent: AtomicU64,
    frames_received: AtomicU64,
    errors: AtomicU64,
    missed_heartbeats: AtomicU64,
}

impl ChannelMetrics {
    /// Creates zeroed counters for `channel`.
    #[must_use]
    pub fn new(channel: impl Into<String>) -> Self {
        Self {
            channel: channel.into(),
            frames_sent: AtomicU64::new(0),
            bytes_sent: AtomicU64::new(0),
            frames_received: AtomicU64::new(0),
            errors: AtomicU64::new(0),
            missed_heartbeats: AtomicU64::new(0),
        }
    }

    /// Records one frame of `bytes` written to the transport.
    pub fn record_sent(&self, bytes: usize) {
        self.frames_sent.fetch_add(1, Ordering::Relaxed);
        self.bytes_sent.fetch_add(bytes as u64, Ordering::Relaxed);
        #[cfg(feature = "observability")]
        {
            metrics::counter!("netchannel.frames.sent", "channel" => self.channel.clone())
                .increment(1);
            metrics::counter!("netchannel.bytes.sent", "channel" => self.channel.clone())
                .increment(bytes as u64);
        }
    }

    /// Records one decoded packet.
    pub fn record_received(&self) {
        self.frames_received.fetch_add(1, Ordering::Relaxed);
        #[cfg(feature = "observability")]
        metrics::counter!("netchannel.frames.received", "channel" => self.channel.clone())
            .increment(1);
    }

    /// Records a codec or transport failure.
    pub fn record_error(&self) {
        self.errors.fetch_add(1, Ordering::Relaxed);
        #[cfg(feature = "observability")]
        metrics::counter!("netchannel.errors", "channel" => self.channel.clone()).increment(1);
    }

    /// Records a heartbeat probe sent while the previous one was unanswered.
    pub fn record_missed_heartbeat(&self) {
        self.missed_heartbeats.fetch_add(1, Ordering::Relaxed);
        #[cfg(feature = "observability")]
        metrics::counter!("netchannel.heartbeats.missed", "channel" => self.channel.clone())
            .increment(1);
    }

    /// Name of the channel these counters belong to.
    pub fn channel(&self) -> &str {
        &self.channel
    }

    /// Frames written to the transport.
    #[must_use]
    pub fn sent_count(&self) -> u64 {
        self.frames_sent.load(Ordering::Relaxed)
    }

    /// Bytes written to the transport.
    #[must_use]
    pub fn bytes_sent(&self) -> u64 {
        self.bytes_sent.load(Ordering::Relaxed)
    }

    /// Packets decoded from the transport.
    #[must_use]
    pub fn received_count(&self) -> u64 {
        self.frames_received.load(Ordering::Relaxed)
    }

    /// Codec and transport failures.
    #[must_use]
    pub fn error_count(&self) -> u64 {
        self.errors.load(Ordering::Relaxed)
    }

    /// Missed heartbeat events raised.
    #[must_use]
    pub fn missed_heartbeat_count(&self) -> u64 {
        self.missed_heartbeats.load(Ordering::Relaxed)
    }
}

impl fmt::Debug for ChannelMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChannelMetrics")
            .field("channel", &self.channel)
            .field("sent", &self.sent_count())
            .field("received", &self.received_count())
            .field("errors", &self.error_count())
            .finish()
    }
}
