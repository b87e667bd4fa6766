//! Absolute paths in the distributed filesystem namespace.
//!
//! A path is an ordered sequence of non-empty components rooted at `/`.
//! Components may not contain `/` (the separator) or `:` (reserved for
//! endpoint strings on the wire). The canonical string is the stored
//! representation, so equality, hashing, and ordering all follow it; the
//! ordering also serves as the canonical key when several sibling paths
//! must be locked together.

use std::fmt;
use std::str::FromStr;

/// Result of path construction.
pub type PathResult<T> = std::result::Result<T, PathError>;

/// Path construction errors.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum PathError {
    /// A component is empty or contains `/` or `:`.
    InvalidComponent,
    /// A path string does not begin with `/` or contains `:`.
    InvalidPath,
}

/// An immutable absolute path. The root is the empty sequence, rendered `/`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FsPath {
    repr: String,
}

impl FsPath {
    /// The root path `/`.
    pub fn root() -> Self {
        Self { repr: "/".to_owned() }
    }

    /// Parses an absolute path string. Empty segments are dropped, so
    /// `/a//b/` parses the same as `/a/b`.
    pub fn parse(s: &str) -> PathResult<Self> {
        if !s.starts_with('/') || s.contains(':') {
            return Err(PathError::InvalidPath);
        }
        let mut path = Self::root();
        for segment in s.split('/').filter(|segment| !segment.is_empty()) {
            path = path.append(segment)?;
        }
        Ok(path)
    }

    /// Returns this path extended by one component.
    pub fn append(&self, component: &str) -> PathResult<Self> {
        if component.is_empty() || component.contains('/') || component.contains(':') {
            return Err(PathError::InvalidComponent);
        }
        let mut repr = self.repr.clone();
        if !self.is_root() {
            repr.push('/');
        }
        repr.push_str(component);
        Ok(Self { repr })
    }

    pub fn is_root(&self) -> bool {
        self.repr == "/"
    }

    /// The path with the last component removed; `None` on root.
    pub fn parent(&self) -> Option<Self> {
        if self.is_root() {
            return None;
        }
        match self.repr.rfind('/') {
            Some(0) => Some(Self::root()),
            Some(end) => Some(Self { repr: self.repr[..end].to_owned() }),
            None => None,
        }
    }

    /// The last component; `None` on root.
    pub fn last(&self) -> Option<&str> {
        if self.is_root() {
            return None;
        }
        self.repr.rfind('/').map(|end| &self.repr[end + 1..])
    }

    /// Iterates the components from the root downward. Each call starts a
    /// fresh iteration.
    pub fn components(&self) -> impl Iterator<Item = &str> + '_ {
        self.repr.split('/').filter(|segment| !segment.is_empty())
    }

    /// True when `ancestor` is a prefix of this path. Every path is a
    /// subpath of itself.
    pub fn is_subpath_of(&self, ancestor: &FsPath) -> bool {
        if ancestor.is_root() {
            return true;
        }
        self.repr == ancestor.repr
            || (self.repr.starts_with(&ancestor.repr)
                && self.repr.as_bytes()[ancestor.repr.len()] == b'/')
    }

    /// All prefixes of this path, root first and the path itself last.
    /// Hierarchical lock chains walk in exactly this order.
    pub fn prefixes(&self) -> Vec<FsPath> {
        let mut out = vec![FsPath::root()];
        if self.is_root() {
            return out;
        }
        for (end, byte) in self.repr.bytes().enumerate() {
            if byte == b'/' && end > 0 {
                out.push(FsPath { repr: self.repr[..end].to_owned() });
            }
        }
        out.push(self.clone());
        out
    }
}

impl fmt::Display for FsPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.repr)
    }
}

impl FromStr for FsPath {
    type Err = PathError;

    fn from_str(s: &str) -> PathResult<Self> {
        Self::parse(s)
    }
}
