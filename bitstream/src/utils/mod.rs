//! Utility functions and supporting infrastructure.
//!
//! Provides error types and the severity-gated validation macro shared by
//! the stream and quantization modules.

pub mod errors;
