//! Key paths into a payload tree.

use std::fmt;

/// One step below the head of a [`KeyPath`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PathElement {
    /// Object member.
    Key(String),
    /// Array position.
    Index(usize),
}

/// Location of a value inside a payload, such as `address.city` or `tags[2]`.
///
/// The head is always a top-level field name; the tail descends through nested
/// objects and arrays.
///
/// # Examples
///
/// ```
/// use drf_consumer::payload::KeyPath;
///
/// let path = KeyPath::new("address").child("city");
/// assert_eq!(path.to_string(), "address.city");
///
/// let path = KeyPath::new("tags").index(2);
/// assert_eq!(path.to_string(), "tags[2]");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct KeyPath {
    head: String,
    tail: Vec<PathElement>,
}

impl KeyPath {
    /// Creates a path pointing at a top-level field.
    #[must_use]
    pub fn new(head: impl Into<String>) -> Self {
        Self { head: head.into(), tail: Vec::new() }
    }

    /// Top-level field name.
    #[must_use]
    pub fn head(&self) -> &str {
        &self.head
    }

    /// Steps below the head.
    #[must_use]
    pub fn tail(&self) -> &[PathElement] {
        &self.tail
    }

    /// Number of steps below the head.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.tail.len()
    }

    /// Returns a new path extended by an object key.
    #[must_use]
    pub fn child(&self, key: impl Into<String>) -> Self {
        self.extended(PathElement::Key(key.into()))
    }

    /// Returns a new path extended by an array index.
    #[must_use]
    pub fn index(&self, index: usize) -> Self {
        self.extended(PathElement::Index(index))
    }

    /// Extends this path in place by an object key.
    pub fn push_key(&mut self, key: impl Into<String>) {
        self.tail.push(PathElement::Key(key.into()));
    }

    /// Extends this path in place by an array index.
    pub fn push_index(&mut self, index: usize) {
        self.tail.push(PathElement::Index(index));
    }

    /// Last step of the path, or `None` for a bare top-level field.
    #[must_use]
    pub fn last(&self) -> Option<&PathElement> {
        self.tail.last()
    }

    /// Returns a new path extended by `element`.
    #[must_use]
    pub fn extended(&self, element: PathElement) -> Self {
        let mut tail = self.tail.clone();
        tail.push(element);
        Self { head: self.head.clone(), tail }
    }

    /// Final key component, or `None` when the path ends in an index.
    #[must_use]
    pub fn last_key(&self) -> Option<&str> {
        match self.tail.last() {
            None => Some(&self.head),
            Some(PathElement::Key(key)) => Some(key),
            Some(PathElement::Index(_)) => None,
        }
    }
}

impl fmt::Display for KeyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.head)?;
        for element in &self.tail {
            match element {
                PathElement::Key(key) => write!(f, ".{key}")?,
                PathElement::Index(index) => write!(f, "[{index}]")?,
            }
        }
        Ok(())
    }
}

impl From<&str> for KeyPath {
    fn from(head: &str) -> Self {
        Self::new(head)
    }
}
