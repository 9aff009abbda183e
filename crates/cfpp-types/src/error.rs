//! Evaluator error types.
//!
//! Every variant carries the context path at the point of failure, and the
//! `Display` form is the user-visible one-line message
//! `"<dotted path>: <message>"`. The first error anywhere in the tree aborts
//! the whole evaluation; there is no partial-result mode.

use crate::path::ContextPath;
use serde_json::Value;
use thiserror::Error;

/// Errors that can occur while expanding a template.
#[derive(Debug, Error)]
pub enum EvalError {
    /// The mangled name does not resolve to a registered extrinsic function.
    #[error("{path}: Unrecognized function: {name}.")]
    NoSuchFunction { path: ContextPath, name: String },

    /// An extrinsic's argument does not match its expected shape.
    #[error("{path}: Expected argument of type {expected} but got {actual}")]
    UnexpectedArgumentType {
        path: ContextPath,
        expected: &'static str,
        actual: String,
    },

    /// An extrinsic received fewer positional elements than required.
    #[error("{path}: Expected {expected} arguments but got {actual}")]
    InsufficientArguments {
        path: ContextPath,
        expected: usize,
        actual: usize,
    },

    /// None of the configured search-path roots contain the referenced file.
    #[error("{path}: The file '{filename}' does not exist.")]
    FileNotFound { path: ContextPath, filename: String },

    /// A resolved file could not be read.
    #[error("{path}: Failed to read '{filename}': {source}")]
    Io {
        path: ContextPath,
        filename: String,
        source: std::io::Error,
    },

    /// A referenced file does not contain valid JSON.
    #[error("{path}: '{filename}' is not valid JSON: {source}")]
    Json {
        path: ContextPath,
        filename: String,
        source: serde_json::Error,
    },

    /// An external process could not be spawned or exited unsuccessfully.
    #[error("{path}: Command failed: {detail}")]
    CommandFailed { path: ContextPath, detail: String },

    /// A time format string contains an unknown directive.
    #[error("{path}: Invalid time format string: {format}")]
    BadTimeFormat { path: ContextPath, format: String },
}

impl EvalError {
    /// Build an `UnexpectedArgumentType` describing the offending value.
    pub fn unexpected_type(path: &ContextPath, expected: &'static str, actual: &Value) -> Self {
        Self::UnexpectedArgumentType {
            path: path.clone(),
            expected,
            actual: format!("{} {}", type_name(actual), actual),
        }
    }

    /// The context path the error was raised at.
    pub fn path(&self) -> &ContextPath {
        match self {
            Self::NoSuchFunction { path, .. }
            | Self::UnexpectedArgumentType { path, .. }
            | Self::InsufficientArguments { path, .. }
            | Self::FileNotFound { path, .. }
            | Self::Io { path, .. }
            | Self::Json { path, .. }
            | Self::CommandFailed { path, .. }
            | Self::BadTimeFormat { path, .. } => path,
        }
    }
}

/// The JSON type name of a value, for error messages.
pub fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
