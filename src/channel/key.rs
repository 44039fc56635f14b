use crate::error::{Error, Result};
use std::fmt;
use std::sync::Arc;

/// Name of a shared value. Never empty.
///
/// Keys compare by content; two call sites using the same string share the
/// same value.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChannelKey(Arc<str>);

impl ChannelKey {
    /// Validate and wrap a key.
    ///
    /// ```
    /// use partyline::{ChannelKey, Error};
    ///
    /// assert_eq!(ChannelKey::new("theme").unwrap().as_str(), "theme");
    /// assert_eq!(ChannelKey::new(""), Err(Error::EmptyKey));
    /// ```
    pub fn new(key: &str) -> Result<Self> {
        if key.is_empty() {
            return Err(Error::EmptyKey);
        }
        Ok(Self(Arc::from(key)))
    }

    /// The key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<&str> for ChannelKey {
    type Error = Error;

    fn try_from(key: &str) -> Result<Self> {
        Self::new(key)
    }
}

impl AsRef<str> for ChannelKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChannelKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
