use super::shared::mount;
use super::{ChannelKey, SetShared, SharedState};
use crate::error::Result;
use crate::runtime::Runtime;

/// A typed handle to a shared value.
///
/// Holds only the key and the initial value. Create it once and share it
/// between call sites so every binding agrees on the value type at compile
/// time instead of repeating the key literal.
///
/// # Examples
///
/// ```
/// use partyline::Channel;
/// use partyline::runtime::Runtime;
///
/// #[derive(Clone, Debug, PartialEq)]
/// enum Theme { Light, Dark }
///
/// let theme = Channel::new("theme", Theme::Light).unwrap();
///
/// Runtime::scope(|| {
///     let (toolbar, _) = theme.bind().unwrap();
///     let (_mounted, set_theme) = theme.bind().unwrap();
///     set_theme.set(Theme::Dark);
///     assert_eq!(toolbar.get(), Theme::Dark);
/// });
/// ```
#[derive(Clone, Debug)]
pub struct Channel<T> {
    key: ChannelKey,
    initial: T,
}

impl<T: Clone + Send + Sync + 'static> Channel<T> {
    /// Create a channel handle.
    ///
    /// # Errors
    ///
    /// [`Error::EmptyKey`](crate::Error::EmptyKey) for an empty key.
    pub fn new(key: &str, initial: T) -> Result<Self> {
        Ok(Self {
            key: ChannelKey::new(key)?,
            initial,
        })
    }

    /// Create a channel handle whose initial value is `T::default()`.
    ///
    /// # Errors
    ///
    /// [`Error::EmptyKey`](crate::Error::EmptyKey) for an empty key.
    pub fn with_default(key: &str) -> Result<Self>
    where
        T: Default,
    {
        Self::new(key, T::default())
    }

    /// Bind to this channel in the current runtime.
    ///
    /// Same as [`bind`](crate::bind) with this channel's key and initial value.
    ///
    /// # Errors
    ///
    /// [`Error::TypeMismatch`](crate::Error::TypeMismatch) if the key was
    /// already bound with another value type in the current runtime.
    pub fn bind(&self) -> Result<(SharedState<T>, SetShared<T>)> {
        mount(&Runtime::current(), self.key.clone(), self.initial.clone())
    }

    /// The channel's key.
    pub fn key(&self) -> &ChannelKey {
        &self.key
    }

    /// Value new bindings start from.
    pub fn initial(&self) -> &T {
        &self.initial
    }
}

/// Create a [`Channel`] handle; shorthand for [`Channel::new`].
///
/// # Errors
///
/// [`Error::EmptyKey`](crate::Error::EmptyKey) for an empty key.
pub fn create_channel<T>(key: &str, initial: T) -> Result<Channel<T>>
where
    T: Clone + Send + Sync + 'static,
{
    Channel::new(key, initial)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bind;
    use crate::error::Error;

    #[test]
    fn channel_and_string_binding_share_a_value() {
        let count = create_channel("count", 0u8).unwrap();
        Runtime::scope(|| {
            let (from_channel, _) = count.bind().unwrap();
            let (_mounted, set) = bind("count", 9u8).unwrap();
            set.set(4);
            assert_eq!(from_channel.get(), 4);
        });
    }

    #[test]
    fn default_initial_value() {
        let names: Channel<Vec<String>> = Channel::with_default("names").unwrap();
        assert!(names.initial().is_empty());
        assert_eq!(names.key().as_str(), "names");
        assert_eq!(
            Channel::<Option<u8>>::with_default("").unwrap_err(),
            Error::EmptyKey
        );
    }

    #[test]
    fn mismatched_string_binding_is_rejected() {
        let count = Channel::new("count", 0u8).unwrap();
        Runtime::scope(|| {
            let _bound = count.bind().unwrap();
            assert!(matches!(
                bind("count", "zero".to_string()),
                Err(Error::TypeMismatch { .. })
            ));
        });
    }
}
