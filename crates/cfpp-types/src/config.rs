use std::path::PathBuf;

/// Immutable evaluator configuration.
///
/// Holds the ordered list of directories probed when resolving a filename
/// referenced by a file-reading extrinsic. The current working directory is
/// always probed first, regardless of any extra roots supplied.
#[derive(Debug, Clone)]
pub struct Config {
    search_path: Vec<PathBuf>,
}

impl Config {
    /// Configuration with the working directory as the only search root.
    pub fn new() -> Self {
        Self {
            search_path: vec![PathBuf::from(".")],
        }
    }

    /// Configuration probing the working directory first, then `roots` in order.
    pub fn with_search_path<I, P>(roots: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        let mut search_path = vec![PathBuf::from(".")];
        search_path.extend(roots.into_iter().map(Into::into));
        Self { search_path }
    }

    /// The search roots, in probe order.
    pub fn search_path(&self) -> &[PathBuf] {
        &self.search_path
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn working_directory_is_always_probed_first() {
        let config = Config::with_search_path(["tests", "fixtures"]);
        let roots: Vec<_> = config
            .search_path()
            .iter()
            .map(|p| p.to_string_lossy().into_owned())
            .collect();
        assert_eq!(roots, vec![".", "tests", "fixtures"]);
    }

    #[test]
    fn default_probes_only_the_working_directory() {
        let config = Config::default();
        assert_eq!(config.search_path().len(), 1);
        assert_eq!(config.search_path()[0], PathBuf::from("."));
    }
}
