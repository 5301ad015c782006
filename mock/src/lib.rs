//! Mock types for testing.

pub mod http;
pub mod serial;
