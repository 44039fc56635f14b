//! Runtime support for shared-value channels.
//!
//! This module provides the execution context every binding lives in: the
//! broadcast medium, dependency tracking for effects, and the per-key type
//! records that keep call sites consistent.

mod config;
mod context;

pub use config::{Config, Reconcile};
pub use context::Runtime;
