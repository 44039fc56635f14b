//! The broadcast medium.
//!
//! A process-wide publish/subscribe target: named events with an arbitrary
//! payload, delivered synchronously to every registered listener in
//! registration order. Shared-value channels are built on top of it, but the
//! bus itself knows nothing about keys or values.

#[allow(clippy::module_inception)]
mod bus;
mod event;

pub use bus::{EventBus, ListenerId, Subscription};
pub use event::Event;
