//! Tracing/logging setup shared by the binary and tests.

pub mod subscriber;

pub use subscriber::{LogFormat, init, init_with};
