//! Reactive local state.
//!
//! Every binding keeps its local value in a [`Signal`], so code running inside
//! an [`Effect`] re-runs when a broadcast changes it:
//! - Signals: reactive value cells
//! - Effects: computations that re-run when the signals they read change

mod effect;
#[allow(clippy::module_inception)]
mod signal;

pub use effect::{create_effect, Effect};
pub use signal::{create_signal, ReadSignal, Signal, WeakSignal, WriteSignal};
