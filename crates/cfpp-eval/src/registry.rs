//! Extrinsic function registry.
//!
//! An explicit, immutable table from canonical snake-case names to function
//! values, built once at startup and injected into the evaluator. Only
//! functions placed in the table are template-invokable; an internal routine
//! never becomes callable merely by sharing a mangled name.

use crate::extrinsics;
use crate::walker::Evaluator;
use cfpp_types::{ContextPath, EvalError, EvalResult};
use serde_json::Value;
use std::collections::BTreeMap;

/// An extrinsic function: `(evaluator, context, evaluated argument) → value`.
pub type ExtrinsicFn = fn(&Evaluator, &ContextPath, &Value) -> EvalResult<Value>;

/// Registry mapping canonical function names to implementations.
#[derive(Debug)]
pub struct Registry {
    funcs: BTreeMap<&'static str, ExtrinsicFn>,
}

impl Registry {
    /// Create a registry holding every built-in extrinsic.
    pub fn new() -> Self {
        let mut funcs: BTreeMap<&'static str, ExtrinsicFn> = BTreeMap::new();
        funcs.insert("strftime", extrinsics::strftime as ExtrinsicFn);
        funcs.insert("include", extrinsics::include);
        funcs.insert("command", extrinsics::command);
        funcs.insert("string_split", extrinsics::string_split);
        funcs.insert("file_to_string_raw", extrinsics::file_to_string_raw);
        funcs.insert("file_to_string", extrinsics::file_to_string);
        funcs.insert("json_file", extrinsics::json_file);
        funcs.insert("json_file_to_string", extrinsics::json_file_to_string);
        funcs.insert("trim", extrinsics::trim);
        funcs.insert("mime_multipart", extrinsics::mime_multipart);
        funcs.insert("kms::encrypt_file", extrinsics::kms_encrypt_file);
        funcs.insert("merge", extrinsics::merge);
        Self { funcs }
    }

    /// Look up a function by canonical name.
    ///
    /// Fails with `NoSuchFunction`, carrying the context path and the
    /// attempted name, when nothing is registered under `name`.
    pub fn resolve(&self, path: &ContextPath, name: &str) -> EvalResult<ExtrinsicFn> {
        self.funcs
            .get(name)
            .copied()
            .ok_or_else(|| EvalError::NoSuchFunction {
                path: path.clone(),
                name: name.to_string(),
            })
    }

    /// The registered names, in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.funcs.keys().copied()
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}
