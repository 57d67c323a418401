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

//! Observability support.
//!
//! Logging goes through `tracing` and counters through the `metrics` crate,
//! both only when the `observability` feature is enabled (the default).
//! Install any `tracing` subscriber and `metrics` recorder to collect them:
//!
//! ```rust,no_run
//! tracing_subscriber::fmt()
//!     .with_env_filter("netchannel=debug")
//!     .init();
//! ```
//!
//! The counters in [`ChannelMetrics`] are always maintained, since channels
//! report `sent_count` and `received_count` from them.

mod metrics;

pub use self::metrics::ChannelMetrics;
