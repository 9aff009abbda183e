//! The recursive tree evaluator.

use crate::mangle::{mangle, FUNC_PREFIX};
use crate::registry::Registry;
use cfpp_types::{Config, ContextPath, EvalResult};
use serde_json::{Map, Value};

/// Variable bindings active for one evaluation.
///
/// Empty at the top level. Each inclusion supplies its own flat scope; there
/// is no chaining or inheritance across inclusion boundaries, and a scope is
/// never mutated once established.
pub type Scope = Map<String, Value>;

/// The tree evaluator — walks a JSON value and produces its expansion.
///
/// Holds the read-only search-path configuration and the injected function
/// registry; the substitution scope and context path are threaded through
/// each recursive call.
#[derive(Debug)]
pub struct Evaluator {
    config: Config,
    registry: Registry,
}

impl Evaluator {
    /// Create an evaluator with the built-in function registry.
    pub fn new(config: Config) -> Self {
        Self::with_registry(config, Registry::new())
    }

    /// Create an evaluator with an explicit registry.
    pub fn with_registry(config: Config, registry: Registry) -> Self {
        Self { config, registry }
    }

    /// The search-path configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The function registry.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Expand a whole document: empty scope, context rooted at `$`.
    pub fn evaluate_document(&self, value: &Value) -> EvalResult<Value> {
        self.evaluate(value, &Scope::new(), &ContextPath::root())
    }

    /// Evaluate one value, post-order and depth-first.
    ///
    /// In-scope `Ref` nodes are substituted before anything else, so a bound
    /// value is itself subject to extrinsic dispatch and structural
    /// recursion. Extrinsic arguments are fully evaluated before the call;
    /// a function's return value replaces the node and is not re-walked.
    pub fn evaluate(&self, value: &Value, scope: &Scope, path: &ContextPath) -> EvalResult<Value> {
        // Reference substitution strictly precedes extrinsic classification.
        // A Ref naming an unbound variable is plain data and passes through.
        let value = reference_target(value, scope).unwrap_or(value);

        if let Some((key, raw_arg)) = extrinsic_entry(value) {
            let arg = self.evaluate(raw_arg, scope, &path.key(key))?;
            let name = mangle(&key[FUNC_PREFIX.len()..]);
            let func = self.registry.resolve(path, &name)?;
            return func(self, path, &arg);
        }

        match value {
            Value::Array(items) => {
                let mut out = Vec::with_capacity(items.len());
                for (index, item) in items.iter().enumerate() {
                    out.push(self.evaluate(item, scope, &path.index(index))?);
                }
                Ok(Value::Array(out))
            }
            Value::Object(entries) => {
                let mut out = Map::new();
                for (key, entry) in entries {
                    out.insert(key.clone(), self.evaluate(entry, scope, &path.key(key))?);
                }
                Ok(Value::Object(out))
            }
            Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_) => {
                Ok(value.clone())
            }
        }
    }
}

/// If `value` is a reference node bound in `scope`, the bound value.
///
/// A reference node is a single-key object whose key equals `Ref`
/// case-insensitively and whose value is a variable name string.
fn reference_target<'a>(value: &Value, scope: &'a Scope) -> Option<&'a Value> {
    let entries = value.as_object()?;
    if entries.len() != 1 {
        return None;
    }
    let (key, variable) = entries.iter().next()?;
    if !key.eq_ignore_ascii_case("ref") {
        return None;
    }
    scope.get(variable.as_str()?)
}

/// If `value` is an extrinsic node, its full key and raw argument.
fn extrinsic_entry(value: &Value) -> Option<(&str, &Value)> {
    let entries = value.as_object()?;
    if entries.len() != 1 {
        return None;
    }
    let (key, arg) = entries.iter().next()?;
    if !key.starts_with(FUNC_PREFIX) {
        return None;
    }
    Some((key.as_str(), arg))
}
