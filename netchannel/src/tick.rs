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


//! Host ticks.
//!
//! Channels do not own a timer. The host drives them by calling
//! [`ChannelRegistry::update`](crate::channel::ChannelRegistry::update) with a
//! [`Tick`] at its own cadence, usually once per frame of its main loop.
//! Heartbeats are measured in [`Tick::real_delta`], so slowing down or
//! pausing game time never causes spurious timeouts.

use std::time::{Duration, Instant};

/// Time passed since the previous update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Tick {
    /// Scaled time since the previous update.
    pub delta: Duration,
    /// Wall-clock time since the previous update.
    pub real_delta: Duration,
}

impl Tick {
    /// A tick where scaled and wall-clock time both advanced by `delta`.
    ///
    /// ```rust
    /// use netchannel::Tick;
    /// use std::time::Duration;
    ///
    /// let tick = Tick::fixed(Duration::from_millis(16));
    /// assert_eq!(tick.delta, tick.real_delta);
    /// ```
    pub fn fixed(delta: Duration) -> Self {
        Self {
            delta,
            real_delta: delta,
        }
    }
}

/// Produces [`Tick`]s from the monotonic clock.
///
/// # Examples
///
/// ```rust
/// use netchannel::Ticker;
///
/// let mut ticker = Ticker::new().with_time_scale(0.5);
/// let tick = ticker.tick();
/// assert!(tick.delta <= tick.real_delta);
/// ```
#[derive(Debug, Clone)]
pub struct Ticker {
    last: Instant,
    time_scale: f64,
}

impl Ticker {
    /// Starts measuring from now with a time scale of 1.
    pub fn new() -> Self {
        Self {
            last: Instant::now(),
            time_scale: 1.0,
        }
    }

    /// Sets the factor applied to [`Tick::delta`]. Negative and non-finite
    /// values are treated as zero.
    pub fn with_time_scale(mut self, scale: f64) -> Self {
        self.set_time_scale(scale);
        self
    }

    /// Changes the time scale.
    pub fn set_time_scale(&mut self, scale: f64) {
        self.time_scale = if scale.is_finite() && scale > 0.0 {
            scale
        } else {
            0.0
        };
    }

    /// Returns the current time scale.
    pub fn time_scale(&self) -> f64 {
        self.time_scale
    }

    /// Returns the time passed since the previous call (or construction).
    pub fn tick(&mut self) -> Tick {
        self.tick_at(Instant::now())
    }

    /// Like [`tick`](Self::tick) with an explicit current instant.
    pub fn tick_at(&mut self, now: Instant) -> Tick {
        let real_delta = now.saturating_duration_since(self.last);
        self.last = now;
        Tick {
            delta: real_delta.mul_f64(self.time_scale),
            real_delta,
        }
    }
}

impl Default for Ticker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_scale_applies_to_delta_only() {
        let start = Instant::now();
        let mut ticker = Ticker {
            last: start,
            time_scale: 1.0,
        }
        .with_time_scale(2.0);

        let tick = ticker.tick_at(start + Duration::from_millis(100));
        assert_eq!(tick.real_delta, Duration::from_millis(100));
        assert_eq!(tick.delta, Duration::from_millis(200));
    }

    #[test]
    fn test_paused_ticker() {
        let start = Instant::now();
        let mut ticker = Ticker {
            last: start,
            time_scale: 1.0,
        };
        ticker.set_time_scale(f64::NAN);
        assert_eq!(ticker.time_scale(), 0.0);

        let tick = ticker.tick_at(start + Duration::from_secs(1));
        assert_eq!(tick.delta, Duration::ZERO);
        assert_eq!(tick.real_delta, Duration::from_secs(1));
    }

    #[test]
    fn test_clock_going_backwards_saturates() {
        let start = Instant::now();
        let mut ticker = Ticker {
            last: start + Duration::from_secs(1),
            time_scale: 1.0,
        };
        assert_eq!(ticker.tick_at(start), Tick::default());
    }
}
