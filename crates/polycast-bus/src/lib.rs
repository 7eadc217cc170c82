// SPDX-FileCopyrightText: 2026 Polycast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Event distribution for Polycast adapters and the adapter manager.
//!
//! Two delivery models live side by side and share no state:
//!
//! - [`EventNotifier`] delivers events synchronously to every listener
//!   registered under the event's name. A panicking listener is isolated and
//!   logged; the remaining listeners still run.
//! - [`EventBus`] wraps each event in an [`Envelope`] and fans it out over a
//!   Tokio broadcast channel to asynchronous subscribers.
//!
//! [`EventHub`] owns one of each. [`EventHub::emit_and_publish`] is the only
//! place where the two paths meet.

pub mod bus;
pub mod hub;
pub mod notifier;

pub use bus::{Envelope, EventBus, EventFilter, Subscription};
pub use hub::EventHub;
pub use notifier::{EventNotifier, ListenerId};

/// Default broadcast channel capacity for [`EventBus`].
pub const DEFAULT_CHANNEL_CAPACITY: usize = 256;

/// An event that knows its own stable public name.
///
/// The name is the key listeners register under (for example
/// `"content:posted"`) and becomes the envelope's `event_type` on the bus.
pub trait NamedEvent {
    /// Returns the stable event name.
    fn event_name(&self) -> &str;
}
