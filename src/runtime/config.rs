//! Runtime configuration.
//!
//! [`Config`] is handed to [`Runtime::scope_with`](crate::runtime::Runtime::scope_with)
//! (or [`Runtime::with_config`](crate::runtime::Runtime::with_config)) and read by
//! every binding created in that runtime.

/// How a freshly mounted binding picks its first value.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Reconcile {
    /// Show the binding's own initial value until the next broadcast on its key.
    ///
    /// A binding that remounts with a different initial value therefore
    /// diverges from its peers until someone writes again.
    #[default]
    KeepInitial,
    /// Start from the last value broadcast on the key in this runtime, if any.
    ///
    /// Falls back to the binding's initial value for keys that were never
    /// written.
    LatestBroadcast,
}

/// Configuration for a [`Runtime`](crate::runtime::Runtime).
///
/// All fields are public; the helpers exist for call-chaining.
#[derive(Clone, Debug, Default)]
pub struct Config {
    /// Reconciliation rule for new bindings.
    pub reconcile: Reconcile,
}

impl Config {
    /// Configuration with the default reconciliation rule.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the reconciliation rule.
    pub fn reconcile(mut self, reconcile: Reconcile) -> Self {
        self.reconcile = reconcile;
        self
    }
}
