//! Built-in extrinsic functions.
//!
//! Each function receives the evaluator, the context path of the node being
//! replaced, and its fully evaluated argument, and returns the replacement
//! value. Argument shapes are validated up front; a mismatch is a typed
//! error carrying the context path.

use crate::resolve;
use crate::walker::Evaluator;
use cfpp_types::{ContextPath, EvalError, EvalResult};
use chrono::format::{Item, StrftimeItems};
use chrono::Utc;
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use std::process::Command;

/// Current UTC time rendered with a strftime-style format string.
///
/// The output changes on every run. Documents regenerated idempotently
/// should avoid this function.
pub(crate) fn strftime(_ev: &Evaluator, path: &ContextPath, arg: &Value) -> EvalResult<Value> {
    let format = expect_string(path, arg)?;
    let items: Vec<Item<'_>> = StrftimeItems::new(format).collect();
    if items.iter().any(|item| matches!(item, Item::Error)) {
        return Err(EvalError::BadTimeFormat {
            path: path.clone(),
            format: format.to_string(),
        });
    }
    let rendered = Utc::now().format_with_items(items.into_iter()).to_string();
    Ok(Value::String(rendered))
}

/// Expand an included document with its own substitution scope.
///
/// The argument is `[filename, parameters]`. The file is resolved via the
/// search path, parsed as JSON, and evaluated with a fresh scope holding
/// exactly the supplied parameters and a context path rooted at the
/// inclusion point. Nothing bound inside leaks back out.
pub(crate) fn include(ev: &Evaluator, path: &ContextPath, arg: &Value) -> EvalResult<Value> {
    let (filename, parameters) = expect_include_args(path, arg)?;
    let text = resolve::read_file(ev.config(), path, filename)?;
    let parsed: Value = serde_json::from_str(&text).map_err(|source| EvalError::Json {
        path: path.clone(),
        filename: filename.to_string(),
        source,
    })?;
    ev.evaluate(&parsed, parameters, path)
}

/// Run an external command and capture its combined stdout and stderr.
///
/// A spawn failure or non-zero exit status fails the evaluation.
pub(crate) fn command(_ev: &Evaluator, path: &ContextPath, arg: &Value) -> EvalResult<Value> {
    let argv = expect_string_array(path, arg)?;
    if argv.is_empty() {
        return Err(EvalError::InsufficientArguments {
            path: path.clone(),
            expected: 1,
            actual: 0,
        });
    }
    let output = Command::new(argv[0])
        .args(&argv[1..])
        .output()
        .map_err(|e| EvalError::CommandFailed {
            path: path.clone(),
            detail: format!("failed to spawn '{}': {e}", argv[0]),
        })?;
    if !output.status.success() {
        return Err(EvalError::CommandFailed {
            path: path.clone(),
            detail: format!(
                "'{}' exited with {}: {}",
                argv[0],
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            ),
        });
    }
    let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
    text.push_str(&String::from_utf8_lossy(&output.stderr));
    Ok(Value::String(text))
}

/// Split a subject string on a literal separator: `[separator, subject]`.
pub(crate) fn string_split(_ev: &Evaluator, path: &ContextPath, arg: &Value) -> EvalResult<Value> {
    let parts = expect_string_array(path, arg)?;
    if parts.len() < 2 {
        return Err(EvalError::InsufficientArguments {
            path: path.clone(),
            expected: 2,
            actual: parts.len(),
        });
    }
    let pieces = parts[1]
        .split(parts[0])
        .map(|piece| Value::String(piece.to_string()))
        .collect();
    Ok(Value::Array(pieces))
}

/// Read a file's contents verbatim.
pub(crate) fn file_to_string_raw(
    ev: &Evaluator,
    path: &ContextPath,
    arg: &Value,
) -> EvalResult<Value> {
    let filename = expect_string(path, arg)?;
    let contents = resolve::read_file(ev.config(), path, filename)?;
    Ok(Value::String(contents))
}

/// Read a file's contents with leading and trailing whitespace removed.
pub(crate) fn file_to_string(ev: &Evaluator, path: &ContextPath, arg: &Value) -> EvalResult<Value> {
    let filename = expect_string(path, arg)?;
    let contents = resolve::read_file(ev.config(), path, filename)?;
    Ok(Value::String(contents.trim().to_string()))
}

/// Parse a file's contents as JSON.
pub(crate) fn json_file(ev: &Evaluator, path: &ContextPath, arg: &Value) -> EvalResult<Value> {
    let filename = expect_string(path, arg)?;
    let text = resolve::read_file(ev.config(), path, filename)?;
    serde_json::from_str(&text).map_err(|source| EvalError::Json {
        path: path.clone(),
        filename: filename.to_string(),
        source,
    })
}

/// Parse a JSON file and re-serialize it compactly with sorted keys.
///
/// Useful for embedding one document textually inside another.
pub(crate) fn json_file_to_string(
    ev: &Evaluator,
    path: &ContextPath,
    arg: &Value,
) -> EvalResult<Value> {
    let filename = expect_string(path, arg)?;
    let parsed = json_file(ev, path, arg)?;
    let text = serde_json::to_string(&parsed).map_err(|source| EvalError::Json {
        path: path.clone(),
        filename: filename.to_string(),
        source,
    })?;
    Ok(Value::String(text))
}

/// Strip whitespace from both ends of a string.
pub(crate) fn trim(_ev: &Evaluator, path: &ContextPath, arg: &Value) -> EvalResult<Value> {
    let subject = expect_string(path, arg)?;
    Ok(Value::String(subject.trim().to_string()))
}

/// Compose a multipart MIME document from `[contentType, text]` pairs.
///
/// The boundary is derived from the hash of the context path, so the same
/// node at the same tree position yields byte-identical output across runs.
pub(crate) fn mime_multipart(
    _ev: &Evaluator,
    path: &ContextPath,
    arg: &Value,
) -> EvalResult<Value> {
    let parts = expect_mime_parts(path, arg)?;
    let boundary = mime_boundary(path);
    let mut doc = String::new();
    doc.push_str(&format!(
        "Content-Type: multipart/mixed; boundary=\"{boundary}\"\nMIME-Version: 1.0\n\n"
    ));
    for (content_type, body) in parts {
        doc.push_str(&format!(
            "--{boundary}\nContent-Type: {content_type}; charset=\"utf-8\"\n\
             MIME-Version: 1.0\nContent-Transfer-Encoding: 7bit\n\n{body}\n"
        ));
    }
    doc.push_str(&format!("--{boundary}--\n"));
    Ok(Value::String(doc))
}

fn mime_boundary(path: &ContextPath) -> String {
    let digest = Sha256::digest(path.to_string().as_bytes());
    let hex: String = digest.iter().map(|byte| format!("{byte:02x}")).collect();
    format!("{}{hex}===", "=".repeat(10))
}

/// Encrypt a file's contents under a key-management service key.
///
/// The argument is `[keyId, filename, optional encryptionContext]`. The
/// service call goes through the `aws` CLI; the result is the base64
/// ciphertext it prints.
pub(crate) fn kms_encrypt_file(
    ev: &Evaluator,
    path: &ContextPath,
    arg: &Value,
) -> EvalResult<Value> {
    let (key_id, filename, encryption_context) = expect_kms_args(path, arg)?;
    let resolved = resolve::resolve_file(ev.config(), path, filename)?;

    let mut cmd = Command::new("aws");
    cmd.args(["kms", "encrypt", "--key-id", key_id])
        .arg("--plaintext")
        .arg(format!("fileb://{}", resolved.display()))
        .args(["--output", "text", "--query", "CiphertextBlob"]);
    if let Some(pairs) = encryption_context {
        let mut rendered = Vec::with_capacity(pairs.len());
        for (name, value) in pairs {
            let value = value
                .as_str()
                .ok_or_else(|| EvalError::unexpected_type(path, "string", value))?;
            rendered.push(format!("{name}={value}"));
        }
        cmd.arg("--encryption-context").arg(rendered.join(","));
    }

    let output = cmd.output().map_err(|e| EvalError::CommandFailed {
        path: path.clone(),
        detail: format!("failed to spawn 'aws': {e}"),
    })?;
    if !output.status.success() {
        return Err(EvalError::CommandFailed {
            path: path.clone(),
            detail: format!(
                "'aws kms encrypt' exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            ),
        });
    }
    let ciphertext = String::from_utf8_lossy(&output.stdout).trim().to_string();
    Ok(Value::String(ciphertext))
}

/// Merge an array of objects left to right; later keys win on conflict.
pub(crate) fn merge(_ev: &Evaluator, path: &ContextPath, arg: &Value) -> EvalResult<Value> {
    let objects = expect_object_array(path, arg)?;
    let mut result = Map::new();
    for object in objects {
        for (key, value) in object {
            result.insert(key.clone(), value.clone());
        }
    }
    Ok(Value::Object(result))
}

// ── Argument validation ──────────────────────────────────────────────────────

fn expect_string<'a>(path: &ContextPath, arg: &'a Value) -> EvalResult<&'a str> {
    arg.as_str()
        .ok_or_else(|| EvalError::unexpected_type(path, "string", arg))
}

fn expect_array<'a>(path: &ContextPath, arg: &'a Value) -> EvalResult<&'a [Value]> {
    arg.as_array()
        .map(Vec::as_slice)
        .ok_or_else(|| EvalError::unexpected_type(path, "array", arg))
}

fn expect_string_array<'a>(path: &ContextPath, arg: &'a Value) -> EvalResult<Vec<&'a str>> {
    expect_array(path, arg)?
        .iter()
        .map(|element| expect_string(path, element))
        .collect()
}

fn expect_object_array<'a>(
    path: &ContextPath,
    arg: &'a Value,
) -> EvalResult<Vec<&'a Map<String, Value>>> {
    expect_array(path, arg)?
        .iter()
        .map(|element| {
            element
                .as_object()
                .ok_or_else(|| EvalError::unexpected_type(path, "object", element))
        })
        .collect()
}

fn expect_mime_parts<'a>(path: &ContextPath, arg: &'a Value) -> EvalResult<Vec<(&'a str, &'a str)>> {
    expect_array(path, arg)?
        .iter()
        .map(|element| {
            let pair = expect_array(path, element)?;
            if pair.len() != 2 {
                return Err(EvalError::unexpected_type(
                    path,
                    "[contentType, text] pair",
                    element,
                ));
            }
            Ok((expect_string(path, &pair[0])?, expect_string(path, &pair[1])?))
        })
        .collect()
}

fn expect_include_args<'a>(
    path: &ContextPath,
    arg: &'a Value,
) -> EvalResult<(&'a str, &'a Map<String, Value>)> {
    let elements = expect_array(path, arg)?;
    if elements.len() < 2 {
        return Err(EvalError::InsufficientArguments {
            path: path.clone(),
            expected: 2,
            actual: elements.len(),
        });
    }
    let filename = expect_string(path, &elements[0])?;
    let parameters = elements[1]
        .as_object()
        .ok_or_else(|| EvalError::unexpected_type(path, "object", &elements[1]))?;
    Ok((filename, parameters))
}

type KmsArgs<'a> = (&'a str, &'a str, Option<&'a Map<String, Value>>);

fn expect_kms_args<'a>(path: &ContextPath, arg: &'a Value) -> EvalResult<KmsArgs<'a>> {
    let elements = expect_array(path, arg)?;
    if elements.len() < 2 {
        return Err(EvalError::InsufficientArguments {
            path: path.clone(),
            expected: 2,
            actual: elements.len(),
        });
    }
    let key_id = expect_string(path, &elements[0])?;
    let filename = expect_string(path, &elements[1])?;
    let encryption_context = match elements.get(2) {
        Some(element) => Some(
            element
                .as_object()
                .ok_or_else(|| EvalError::unexpected_type(path, "object", element))?,
        ),
        None => None,
    };
    Ok((key_id, filename, encryption_context))
}

#[cfg(test)]
mod tests {
    use super::*;
    use cfpp_types::Config;
    use serde_json::json;

    fn ev() -> Evaluator {
        Evaluator::new(Config::new())
    }

    fn root() -> ContextPath {
        ContextPath::root()
    }

    #[test]
    fn trim_strips_both_ends() {
        let out = trim(&ev(), &root(), &json!("  hi  \n")).unwrap();
        assert_eq!(out, json!("hi"));
    }

    #[test]
    fn trim_rejects_non_strings() {
        let err = trim(&ev(), &root(), &json!(42)).unwrap_err();
        assert_eq!(
            err.to_string(),
            "$: Expected argument of type string but got number 42"
        );
    }

    #[test]
    fn string_split_is_literal() {
        let out = string_split(&ev(), &root(), &json!(["\n", "time\nafter\ntime"])).unwrap();
        assert_eq!(out, json!(["time", "after", "time"]));
    }

    #[test]
    fn string_split_requires_two_elements() {
        let err = string_split(&ev(), &root(), &json!([","])).unwrap_err();
        assert_eq!(err.to_string(), "$: Expected 2 arguments but got 1");
    }

    #[test]
    fn string_split_rejects_non_string_elements() {
        let err = string_split(&ev(), &root(), &json!([",", 5])).unwrap_err();
        assert!(err.to_string().contains("Expected argument of type string"));
    }

    #[test]
    fn merge_is_left_to_right_overwrite() {
        let out = merge(&ev(), &root(), &json!([{"a": 1}, {"a": 2, "b": 3}])).unwrap();
        assert_eq!(out, json!({"a": 2, "b": 3}));
    }

    #[test]
    fn merge_of_nothing_is_the_empty_object() {
        let out = merge(&ev(), &root(), &json!([])).unwrap();
        assert_eq!(out, json!({}));
    }

    #[test]
    fn merge_rejects_non_object_elements() {
        let err = merge(&ev(), &root(), &json!([{"a": 1}, 2])).unwrap_err();
        assert_eq!(
            err.to_string(),
            "$: Expected argument of type object but got number 2"
        );
    }

    #[test]
    fn strftime_renders_utc_now() {
        let out = strftime(&ev(), &root(), &json!("%Y")).unwrap();
        let year = out.as_str().unwrap();
        assert_eq!(year.len(), 4);
        assert!(year.chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn strftime_rejects_bad_directives() {
        let err = strftime(&ev(), &root(), &json!("%Q%Z")).unwrap_err();
        assert_eq!(err.to_string(), "$: Invalid time format string: %Q%Z");
    }

    #[test]
    fn command_captures_stdout() {
        let out = command(&ev(), &root(), &json!(["echo", "hello"])).unwrap();
        assert_eq!(out, json!("hello\n"));
    }

    #[test]
    fn command_failure_is_surfaced() {
        let err = command(&ev(), &root(), &json!(["false"])).unwrap_err();
        assert!(err.to_string().starts_with("$: Command failed:"));
    }

    #[test]
    fn command_requires_an_argv() {
        let err = command(&ev(), &root(), &json!([])).unwrap_err();
        assert_eq!(err.to_string(), "$: Expected 1 arguments but got 0");
    }

    #[test]
    fn mime_boundary_depends_only_on_the_path() {
        let at_node = root().key("Resources").key("UserData");
        let first = mime_boundary(&at_node);
        let second = mime_boundary(&root().key("Resources").key("UserData"));
        assert_eq!(first, second);
        assert_ne!(first, mime_boundary(&root().key("Elsewhere")));
        assert!(first.starts_with("=========="));
        assert!(first.ends_with("==="));
    }

    #[test]
    fn mime_multipart_wraps_each_part() {
        let arg = json!([
            ["text/x-shellscript", "#!/bin/sh\necho hi"],
            ["text/cloud-config", "packages: []"]
        ]);
        let out = mime_multipart(&ev(), &root(), &arg).unwrap();
        let text = out.as_str().unwrap();
        let boundary = mime_boundary(&root());
        assert!(text.starts_with(&format!(
            "Content-Type: multipart/mixed; boundary=\"{boundary}\""
        )));
        assert_eq!(text.matches(&format!("--{boundary}\n")).count(), 2);
        assert!(text.contains("Content-Type: text/x-shellscript; charset=\"utf-8\""));
        assert!(text.contains("#!/bin/sh\necho hi"));
        assert!(text.ends_with(&format!("--{boundary}--\n")));
    }

    #[test]
    fn mime_multipart_rejects_loose_pairs() {
        let err = mime_multipart(&ev(), &root(), &json!([["only-type"]])).unwrap_err();
        assert!(err
            .to_string()
            .contains("Expected argument of type [contentType, text] pair"));
    }

    #[test]
    fn include_args_must_hold_at_least_two_elements() {
        let err = expect_include_args(&root(), &json!(["snippet.json"])).unwrap_err();
        assert_eq!(err.to_string(), "$: Expected 2 arguments but got 1");
    }

    #[test]
    fn include_args_need_an_object_parameter_map() {
        let err = expect_include_args(&root(), &json!(["snippet.json", 4])).unwrap_err();
        assert_eq!(
            err.to_string(),
            "$: Expected argument of type object but got number 4"
        );
    }

    #[test]
    fn kms_args_accept_an_optional_context() {
        let args = json!(["alias/app", "secret.txt"]);
        let (key, file, ctx) = expect_kms_args(&root(), &args).unwrap();
        assert_eq!((key, file), ("alias/app", "secret.txt"));
        assert!(ctx.is_none());

        let args = json!(["alias/app", "secret.txt", {"ContextKey": "ContextValue"}]);
        let (_, _, ctx) = expect_kms_args(&root(), &args).unwrap();
        assert_eq!(ctx.unwrap().get("ContextKey"), Some(&json!("ContextValue")));
    }

    #[test]
    fn kms_args_reject_a_non_object_context() {
        let err =
            expect_kms_args(&root(), &json!(["alias/app", "secret.txt", "nope"])).unwrap_err();
        assert!(err.to_string().contains("Expected argument of type object"));
    }
}
