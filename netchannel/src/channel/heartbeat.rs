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

//! Heartbeat monitor.
//!
//! Every tick adds the real elapsed time to [`HeartbeatState::elapsed`]. When
//! it reaches the interval a probe is due: `elapsed` restarts at zero and
//! `missed` is incremented, since the probe is unanswered until some packet
//! arrives. Any received packet clears `missed` (and `elapsed` when so
//! configured). Once `missed` exceeds the threshold the channel times out.

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

/// Heartbeat counters of one session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HeartbeatState {
    /// Time since the last probe, or since the last packet when
    /// `reset_heartbeat_on_receive` is set.
    pub elapsed: Duration,
    /// Consecutive probes sent without any packet received in between.
    pub missed: u32,
}

/// Outcome of a tick on which a probe became due.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeartbeatDue {
    /// Misses accumulated before this probe.
    pub missed_before: u32,
    /// `true` if the miss count now exceeds the threshold.
    pub timed_out: bool,
}

/// Interval and threshold of a channel's heartbeat.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeartbeatMonitor {
    interval: Duration,
    miss_threshold: u32,
}

impl HeartbeatMonitor {
    /// Creates a monitor. A zero interval disables heartbeating.
    pub fn new(interval: Duration, miss_threshold: u32) -> Self {
        Self {
            interval,
            miss_threshold,
        }
    }

    /// A monitor that never fires.
    pub fn disabled() -> Self {
        Self::new(Duration::ZERO, 0)
    }

    /// Returns `true` if probes are sent at all.
    pub fn is_enabled(&self) -> bool {
        !self.interval.is_zero()
    }

    /// Returns the probe interval.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Returns the number of misses tolerated before timing out.
    pub fn miss_threshold(&self) -> u32 {
        self.miss_threshold
    }

    /// Advances `state` by `real_delta`.
    ///
    /// Returns `Some` on ticks where a probe is due.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use netchannel::channel::{HeartbeatMonitor, HeartbeatState};
    /// use std::time::Duration;
    ///
    /// let monitor = HeartbeatMonitor::new(Duration::from_secs(2), 1);
    /// let mut state = HeartbeatState::default();
    /// let second = Duration::from_secs(1);
    ///
    /// assert!(monitor.tick(&mut state, second).is_none());
    /// let due = monitor.tick(&mut state, second).unwrap();
    /// assert_eq!(due.missed_before, 0);
    /// assert!(!due.timed_out);
    /// assert_eq!(state.missed, 1);
    /// ```
    pub fn tick(&self, state: &mut HeartbeatState, real_delta: Duration) -> Option<HeartbeatDue> {
        if !self.is_enabled() {
            return None;
        }
        state.elapsed += real_delta;
        if state.elapsed < self.interval {
            return None;
        }
        state.elapsed = Duration::ZERO;
        let missed_before = state.missed;
        state.missed += 1;
        Some(HeartbeatDue {
            missed_before,
            timed_out: state.missed > self.miss_threshold,
        })
    }
}

/// Heartbeat state shared between the reader task and the ticking owner.
#[derive(Debug, Clone, Default)]
pub(crate) struct HeartbeatHandle {
    state: Arc<Mutex<HeartbeatState>>,
}

impl HeartbeatHandle {
    /// Records a received packet.
    pub(crate) fn on_packet_received(&self, reset_elapsed: bool) {
        let mut state = self.state.lock();
        state.missed = 0;
        if reset_elapsed {
            state.elapsed = Duration::ZERO;
        }
    }

    pub(crate) fn tick(&self, monitor: &HeartbeatMonitor, real_delta: Duration) -> Option<HeartbeatDue> {
        monitor.tick(&mut self.state.lock(), real_delta)
    }

    pub(crate) fn snapshot(&self) -> HeartbeatState {
        *self.state.lock()
    }

    pub(crate) fn reset(&self) {
        *self.state.lock() = HeartbeatState::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECOND: Duration = Duration::from_secs(1);

    #[test]
    fn test_timeout_after_fourth_probe() {
        let monitor = HeartbeatMonitor::new(Duration::from_secs(5), 3);
        let mut state = HeartbeatState::default();
        let mut raised = Vec::new();
        let mut timed_out_at = None;

        for t in 1..=25 {
            if let Some(due) = monitor.tick(&mut state, SECOND) {
                if due.missed_before > 0 {
                    raised.push(due.missed_before);
                }
                if due.timed_out {
                    timed_out_at = Some(t);
                    break;
                }
            }
        }

        assert_eq!(raised, vec![1, 2, 3]);
        assert_eq!(timed_out_at, Some(20));
    }

    #[test]
    fn test_packet_resets_misses() {
        let monitor = HeartbeatMonitor::new(Duration::from_secs(5), 3);
        let handle = HeartbeatHandle::default();

        for t in 1..=20 {
            if t == 14 {
                handle.on_packet_received(false);
            }
            let due = handle.tick(&monitor, SECOND);
            assert!(!due.map(|d| d.timed_out).unwrap_or(false), "timed out at {t}");
        }
        assert_eq!(handle.snapshot().missed, 2);
    }

    #[test]
    fn test_reset_on_receive_restarts_interval() {
        let monitor = HeartbeatMonitor::new(Duration::from_secs(5), 3);
        let handle = HeartbeatHandle::default();
        for _ in 0..4 {
            assert!(handle.tick(&monitor, SECOND).is_none());
        }
        handle.on_packet_received(true);
        assert_eq!(handle.snapshot().elapsed, Duration::ZERO);
        for _ in 0..4 {
            assert!(handle.tick(&monitor, SECOND).is_none());
        }
        assert!(handle.tick(&monitor, SECOND).is_some());
    }

    #[test]
    fn test_disabled_monitor_never_fires() {
        let monitor = HeartbeatMonitor::disabled();
        let mut state = HeartbeatState::default();
        for _ in 0..100 {
            assert!(monitor.tick(&mut state, Duration::from_secs(60)).is_none());
        }
        assert_eq!(state, HeartbeatState::default());
    }

    #[test]
    fn test_large_delta_fires_once() {
        let monitor = HeartbeatMonitor::new(Duration::from_secs(5), 10);
        let mut state = HeartbeatState::default();
        let due = monitor.tick(&mut state, Duration::from_secs(30)).unwrap();
        assert_eq!(due.missed_before, 0);
        assert_eq!(state.missed, 1);
        assert_eq!(state.elapsed, Duration::ZERO);
    }
}
