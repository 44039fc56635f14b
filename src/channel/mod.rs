//! Shared-value channels.
//!
//! A channel is a value named by a [`ChannelKey`]. Any number of independent
//! call sites bind to it; each keeps a local copy and every write is
//! broadcast over the runtime's bus to all the others:
//! - [`bind`]: bind by key
//! - [`Channel`]: a typed, reusable handle that binds without repeating the key

#[allow(clippy::module_inception)]
mod channel;
mod key;
mod shared;

pub use channel::{create_channel, Channel};
pub use key::ChannelKey;
pub use shared::{bind, Broadcast, SetShared, SharedState, SubscriberId, SHARED_STATE_CHANGED};
