//! Membership adapters - implementations of the `MembershipNotifier` port.
//!
//! - `HttpMembershipNotifier` - JSON POSTs to the membership service
//! - `RecordingNotifier` - Records calls for tests

mod http_notifier;
mod recording_notifier;

pub use http_notifier::{HttpMembershipNotifier, HttpNotifierConfig};
pub use recording_notifier::{NotifierCall, RecordingNotifier};
