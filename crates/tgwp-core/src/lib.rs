//! Core domain + application logic for the Telegram → WordPress republisher.
//!
//! This crate is intentionally transport-agnostic. Telegram and WordPress live
//! behind ports (traits) implemented in adapter crates.

pub mod config;
pub mod cursor;
pub mod domain;
pub mod errors;
pub mod formatting;
pub mod logging;
pub mod pipeline;
pub mod ports;
pub mod publisher;
pub mod tags;

#[cfg(test)]
pub(crate) mod test_support;

pub use errors::{Error, Result};
