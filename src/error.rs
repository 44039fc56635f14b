//! Error types for channel binding.
//!
//! Reads and writes never fail. Only creating a channel or binding one can be
//! rejected, and only for misuse that would otherwise go unnoticed.

use thiserror::Error;

/// Errors produced when creating or binding a channel.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A channel key was the empty string.
    #[error("channel key must not be empty")]
    EmptyKey,

    /// A key was bound with a different value type than the one that first claimed it.
    #[error("channel `{key}` holds `{expected}` values, cannot bind it as `{found}`")]
    TypeMismatch {
        /// The conflicting key.
        key: String,
        /// Type name that first claimed the key in this runtime.
        expected: &'static str,
        /// Type name of the rejected binding.
        found: &'static str,
    },
}

/// Convenience alias used across the crate.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_key_and_types() {
        let err = Error::TypeMismatch {
            key: "theme".to_string(),
            expected: "u32",
            found: "alloc::string::String",
        };
        assert_eq!(
            err.to_string(),
            "channel `theme` holds `u32` values, cannot bind it as `alloc::string::String`"
        );
        assert_eq!(Error::EmptyKey.to_string(), "channel key must not be empty");
    }
}
