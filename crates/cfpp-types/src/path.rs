use std::fmt;

/// One step of a context path: an object key or an array index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Key(String),
    Index(usize),
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Key(key) => write!(f, "{key}"),
            Self::Index(index) => write!(f, "{index}"),
        }
    }
}

/// Trail from the document root to the node currently being evaluated.
///
/// Rooted at the `$` sentinel; `Display` renders the dotted form used in
/// error messages, e.g. `$.Resources.2.UserData`. The path is a read-only
/// trail — it carries no ownership semantics and is extended by cloning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextPath {
    segments: Vec<Segment>,
}

impl ContextPath {
    /// The path of the document root, `$`.
    pub fn root() -> Self {
        Self {
            segments: Vec::new(),
        }
    }

    /// Extend the path with an object key.
    pub fn key(&self, key: &str) -> Self {
        let mut segments = self.segments.clone();
        segments.push(Segment::Key(key.to_string()));
        Self { segments }
    }

    /// Extend the path with an array index.
    pub fn index(&self, index: usize) -> Self {
        let mut segments = self.segments.clone();
        segments.push(Segment::Index(index));
        Self { segments }
    }

    /// The segments below the root, in order.
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }
}

impl fmt::Display for ContextPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "$")?;
        for segment in &self.segments {
            write!(f, ".{segment}")?;
        }
        Ok(())
    }
}
