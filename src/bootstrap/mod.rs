//! Bootstrap layer: runs before the HTTP channel starts.
//!
//! - **logger**: tracing-subscriber initialisation.

pub mod logger;
