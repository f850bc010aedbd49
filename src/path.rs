//! Document paths: an address into nested data as an ordered list of
//! property-key and array-index steps.
//!
//! The string form follows the editor grammar: properties joined with `.`,
//! indices as `[n]` with no separating dot (`user.addresses[0].street`,
//! `matrix[0][1]`). Parsing is lenient; rendering is the exact left inverse
//! of parsing for grammar-conformant strings.

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;

// ------------------------------ Segments ---------------------------------- //

/// One step into nested data: an object key or an array index.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    Property(String),
    Index(usize),
}

impl PathSegment {
    pub fn property(key: impl Into<String>) -> Self {
        Self::Property(key.into())
    }

    pub fn index(i: usize) -> Self {
        Self::Index(i)
    }
}

// -------------------------------- Path ------------------------------------ //

/// An ordered sequence of [`PathSegment`]. The empty path addresses the
/// document root. Paths compare structurally: a `Property("0")` and an
/// `Index(0)` at the same position are never equal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Path(Vec<PathSegment>);

/// Path tokens: either a bracketed digit run or a run of anything that is
/// not `.`, `[`, or `]`.
static PATH_TOKEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\[(\d+)\]|([^.\[\]]+)").expect("path token pattern")
});

impl Path {
    pub fn root() -> Self {
        Self(Vec::new())
    }

    pub fn new(segments: Vec<PathSegment>) -> Self {
        Self(segments)
    }

    /// Parse a path string.
    ///
    /// Lenient by decision: characters that match neither the property nor
    /// the `[n]` token pattern are skipped rather than rejected, because
    /// inputs arrive from partially-typed interactive editor state
    /// (`"a]b["` parses the same as `"a.b"`). The rendered form of a
    /// lenient parse is therefore not guaranteed to round-trip.
    pub fn parse(s: &str) -> Self {
        let mut segments = Vec::new();
        for caps in PATH_TOKEN.captures_iter(s) {
            if let Some(digits) = caps.get(1) {
                // Digit runs longer than usize saturate.
                let index = digits.as_str().parse::<usize>().unwrap_or(usize::MAX);
                segments.push(PathSegment::Index(index));
            } else if let Some(name) = caps.get(2) {
                segments.push(PathSegment::Property(name.as_str().to_string()));
            }
        }
        Self(segments)
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// All but the last segment. The root's parent is the root.
    pub fn parent(&self) -> Path {
        match self.0.split_last() {
            Some((_, init)) => Path(init.to_vec()),
            None => Path::root(),
        }
    }

    /// Every prefix of this path in increasing length order, from the root
    /// (length 0) up to and including the path itself.
    pub fn ancestors(&self) -> Vec<Path> {
        (0..=self.0.len())
            .map(|n| Path(self.0[..n].to_vec()))
            .collect()
    }

    /// True iff `self` is a strict, segment-wise-equal prefix of `other`.
    /// A path is never an ancestor of itself.
    pub fn is_ancestor_of(&self, other: &Path) -> bool {
        self.0.len() < other.0.len() && self.0[..] == other.0[..self.0.len()]
    }

    /// Extend with a property segment.
    pub fn child(&self, key: impl Into<String>) -> Path {
        let mut segments = self.0.clone();
        segments.push(PathSegment::Property(key.into()));
        Path(segments)
    }

    /// Extend with an index segment.
    pub fn item(&self, index: usize) -> Path {
        let mut segments = self.0.clone();
        segments.push(PathSegment::Index(index));
        Path(segments)
    }

    pub fn push(&mut self, segment: PathSegment) {
        self.0.push(segment);
    }
}

impl fmt::Display for Path {
    /// Render the path-string form. Built segment-by-segment: a dot is
    /// emitted only before a property that follows another segment, so an
    /// index never carries a preceding separator.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.0.iter().enumerate() {
            match segment {
                PathSegment::Property(key) => {
                    if i > 0 {
                        f.write_str(".")?;
                    }
                    f.write_str(key)?;
                }
                PathSegment::Index(index) => {
                    write!(f, "[{index}]")?;
                }
            }
        }
        Ok(())
    }
}

impl From<Vec<PathSegment>> for Path {
    fn from(segments: Vec<PathSegment>) -> Self {
        Self(segments)
    }
}

// ------------------------------- Tests ------------------------------------ //
