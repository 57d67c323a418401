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

//! Channel lifecycle states.

use crate::channel::ErrorKind;
use std::fmt;

/// Lifecycle state of a channel.
///
/// ```text
/// Idle ──connect──▶ Connecting ──ok──▶ Connected ──close──▶ Closed
///   ▲                   │                  │                   │
///   └──connect failed───┘               error                 connect
///                                          ▼                   ▼
///                                    Faulted(kind)         Connecting
/// ```
///
/// Any state may move to `Closed`. `Connected` is the only state in which
/// messages are accepted and the channel is ticked.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ChannelState {
    /// Created, never connected, or a connect attempt failed.
    #[default]
    Idle,
    /// A connect attempt is in flight.
    Connecting,
    /// The transport is up; sends are accepted.
    Connected,
    /// An error left the session unusable; the caller must close.
    Faulted(ErrorKind),
    /// Closed by the caller, the peer or a heartbeat timeout.
    Closed,
}

impl ChannelState {
    /// Returns `true` for [`ChannelState::Connected`].
    pub fn is_connected(&self) -> bool {
        matches!(self, ChannelState::Connected)
    }

    /// Returns `true` if moving from `self` to `next` is a legal transition.
    pub fn can_transition_to(&self, next: ChannelState) -> bool {
        use ChannelState::*;
        match (*self, next) {
            (_, Closed) => true,
            (Idle | Closed, Connecting) => true,
            (Connecting, Connected | Idle) => true,
            (Connected, Faulted(_)) => true,
            _ => false,
        }
    }
}

impl fmt::Display for ChannelState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChannelState::Idle => write!(f, "Idle"),
            ChannelState::Connecting => write!(f, "Connecting"),
            ChannelState::Connected => write!(f, "Connected"),
            ChannelState::Faulted(kind) => write!(f, "Faulted({})", kind),
            ChannelState::Closed => write!(f, "Closed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_path_transitions() {
        assert!(ChannelState::Idle.can_transition_to(ChannelState::Connecting));
        assert!(ChannelState::Connecting.can_transition_to(ChannelState::Connected));
        assert!(ChannelState::Connected.can_transition_to(ChannelState::Closed));
        assert!(ChannelState::Closed.can_transition_to(ChannelState::Connecting));
    }

    #[test]
    fn test_illegal_transitions() {
        assert!(!ChannelState::Idle.can_transition_to(ChannelState::Connected));
        assert!(!ChannelState::Connected.can_transition_to(ChannelState::Connecting));
        assert!(!ChannelState::Faulted(ErrorKind::SocketError)
            .can_transition_to(ChannelState::Connected));
    }

    #[test]
    fn test_display() {
        assert_eq!(
            ChannelState::Faulted(ErrorKind::DeserializeHeaderError).to_string(),
            "Faulted(DeserializeHeaderError)"
        );
        assert!(ChannelState::Connected.is_connected());
        assert!(!ChannelState::default().is_connected());
    }
}
