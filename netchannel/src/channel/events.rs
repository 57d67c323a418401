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


//! Channel lifecycle events.

use crate::channel::ChannelError;
use crate::codec::{CustomErrorData, UserData};

/// Receives lifecycle notifications from a channel.
///
/// Every method has a no-op default, so implementors only override the events
/// they care about. Callbacks run on the thread that calls
/// [`Channel::update`](crate::channel::Channel::update) or
/// [`Channel::close`](crate::channel::Channel::close).
///
/// # Examples
///
/// ```rust
/// use netchannel::channel::{ChannelError, ChannelEventHandler};
///
/// struct Logger;
///
/// impl ChannelEventHandler for Logger {
///     fn on_closed(&self, channel: &str) {
///         println!("{channel} closed");
///     }
///
///     fn on_error(&self, channel: &str, error: &ChannelError) {
///         eprintln!("{channel}: {error}");
///     }
/// }
/// ```
pub trait ChannelEventHandler: Send + Sync {
    /// The transport connected and the channel is ready to send.
    fn on_connected(&self, _channel: &str, _user_data: Option<&UserData>) {}

    /// The channel closed, explicitly or because the session ended.
    fn on_closed(&self, _channel: &str) {}

    /// A probe was sent while `missed` earlier probes were still unanswered.
    fn on_missed_heartbeat(&self, _channel: &str, _missed: u32) {}

    /// A background error occurred.
    fn on_error(&self, _channel: &str, _error: &ChannelError) {}

    /// The receive-body handler attached custom error data to a packet.
    fn on_custom_error(&self, _channel: &str, _data: &CustomErrorData) {}

    /// Whether this handler consumes errors.
    ///
    /// When `false`, background errors are returned from
    /// [`Channel::update`](crate::channel::Channel::update) instead.
    fn handles_errors(&self) -> bool {
        true
    }
}
