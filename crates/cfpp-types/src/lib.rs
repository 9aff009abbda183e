//! Shared types for the cfpp template preprocessor.
//!
//! This crate defines the context path used for error reporting and
//! deterministic derived values, the evaluator error types, and the
//! search-path configuration shared by every file-reading operation.

mod config;
mod error;
mod path;

pub use config::Config;
pub use error::{type_name, EvalError};
pub use path::{ContextPath, Segment};

/// Result type used throughout the evaluator.
pub type EvalResult<T> = std::result::Result<T, EvalError>;
