//! Search-path file resolution.

use cfpp_types::{Config, ContextPath, EvalError, EvalResult};
use std::fs;
use std::path::PathBuf;

/// Probe each search root in order and return the first existing candidate.
///
/// Exhausting the search path is a `FileNotFound` error at `path`.
pub fn resolve_file(
    config: &Config,
    path: &ContextPath,
    filename: &str,
) -> EvalResult<PathBuf> {
    for root in config.search_path() {
        let candidate = root.join(filename);
        if candidate.exists() {
            return Ok(candidate);
        }
    }
    Err(EvalError::FileNotFound {
        path: path.clone(),
        filename: filename.to_string(),
    })
}

/// Resolve `filename` via the search path and read its contents.
pub fn read_file(config: &Config, path: &ContextPath, filename: &str) -> EvalResult<String> {
    let resolved = resolve_file(config, path, filename)?;
    fs::read_to_string(&resolved).map_err(|source| EvalError::Io {
        path: path.clone(),
        filename: filename.to_string(),
        source,
    })
}
