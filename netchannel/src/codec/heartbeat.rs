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

//! Closure backed heartbeat handler.

use crate::codec::PacketHeartbeatHandler;
use std::fmt;
use std::time::Duration;

/// Heartbeat handler producing probes from a closure.
///
/// # Examples
///
/// ```rust
/// use netchannel::codec::{IntervalHeartbeat, PacketHeartbeatHandler};
/// use std::time::Duration;
///
/// let heartbeat = IntervalHeartbeat::new(|| "ping")
///     .with_interval(Duration::from_secs(5))
///     .with_miss_threshold(3);
///
/// assert_eq!(heartbeat.heartbeat_interval(), Some(Duration::from_secs(5)));
/// assert_eq!(heartbeat.miss_threshold(), Some(3));
/// assert_eq!(heartbeat.probe(), Some("ping"));
/// ```
pub struct IntervalHeartbeat<M> {
    interval: Option<Duration>,
    miss_threshold: Option<u32>,
    factory: Box<dyn Fn() -> M + Send + Sync>,
}

impl<M> IntervalHeartbeat<M> {
    /// Creates a handler that uses the channel's interval and threshold.
    pub fn new<F>(factory: F) -> Self
    where
        F: Fn() -> M + Send + Sync + 'static,
    {
        Self {
            interval: None,
            miss_threshold: None,
            factory: Box::new(factory),
        }
    }

    /// Overrides the channel's heartbeat interval.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = Some(interval);
        self
    }

    /// Overrides the channel's miss threshold.
    pub fn with_miss_threshold(mut self, threshold: u32) -> Self {
        self.miss_threshold = Some(threshold);
        self
    }
}

impl<M: 'static> PacketHeartbeatHandler<M> for IntervalHeartbeat<M> {
    fn heartbeat_interval(&self) -> Option<Duration> {
        self.interval
    }

    fn miss_threshold(&self) -> Option<u32> {
        self.miss_threshold
    }

    fn probe(&self) -> Option<M> {
        Some((self.factory)())
    }
}

impl<M> fmt::Debug for IntervalHeartbeat<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IntervalHeartbeat")
            .field("interval", &self.interval)
            .field("miss_threshold", &self.miss_threshold)
            .finish_non_exhaustive()
    }
}
