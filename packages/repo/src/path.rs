//! PathAddress type - validated absolute paths into the node tree.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Errors related to path parsing and validation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PathError {
    /// The path string is empty.
    #[error("empty path")]
    Empty,

    /// The path does not start with `/`.
    #[error("path is not absolute: '{path}'")]
    NotAbsolute { path: String },

    /// A path segment is empty or contains a separator.
    #[error("invalid path segment '{segment}' at position {position}: {message}")]
    InvalidSegment {
        segment: String,
        position: usize,
        message: String,
    },
}

/// A validated absolute path addressing one node in the repository.
///
/// Invariants: never empty, always starts with `/`, no duplicate or
/// trailing separators. The root is the single-character path `/`.
///
/// Three constructors cover the flavors callers need:
/// - [`PathAddress::target`] - an arbitrary absolute target path
/// - [`PathAddress::parent_of`] - the path minus its last segment
/// - [`PathAddress::child_of`] - a name appended to a parent
///
/// # Examples
///
/// ```rust
/// use cask_repo::PathAddress;
///
/// let asset = PathAddress::target("/assets/photos/a1").unwrap();
/// assert_eq!(asset.name(), "a1");
///
/// let parent = PathAddress::parent_of("/assets/photos/a1").unwrap();
/// assert_eq!(parent.as_str(), "/assets/photos");
///
/// let file = PathAddress::child_of(&asset, "file").unwrap();
/// assert_eq!(file.as_str(), "/assets/photos/a1/file");
/// ```
#[derive(Clone, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct PathAddress {
    normalized: String,
}

impl PathAddress {
    /// The root path `/`.
    pub fn root() -> Self {
        PathAddress {
            normalized: "/".to_string(),
        }
    }

    /// Parse an absolute target path, normalizing separators.
    ///
    /// # Path Syntax
    ///
    /// - Must start with `/`
    /// - Segments are separated by `/`
    /// - Empty segments are ignored (normalizes `//` and trailing `/`)
    pub fn target(s: &str) -> Result<Self, PathError> {
        if s.is_empty() {
            return Err(PathError::Empty);
        }
        if !s.starts_with('/') {
            return Err(PathError::NotAbsolute {
                path: s.to_string(),
            });
        }

        let segments: Vec<&str> = s.split('/').filter(|seg| !seg.is_empty()).collect();
        for (i, segment) in segments.iter().enumerate() {
            Self::validate_segment(segment, i)?;
        }

        if segments.is_empty() {
            return Ok(Self::root());
        }
        Ok(PathAddress {
            normalized: format!("/{}", segments.join("/")),
        })
    }

    /// Parse a path and drop its last segment.
    ///
    /// The parent of a top-level path is the root `/`; the parent of the
    /// root is the root itself.
    pub fn parent_of(s: &str) -> Result<Self, PathError> {
        Ok(Self::target(s)?.parent())
    }

    /// Append a validated name to a parent path.
    pub fn child_of(parent: &PathAddress, name: &str) -> Result<Self, PathError> {
        Self::validate_segment(name, parent.segments().count())?;
        let normalized = if parent.is_root() {
            format!("/{}", name)
        } else {
            format!("{}/{}", parent.normalized, name)
        };
        Ok(PathAddress { normalized })
    }

    fn validate_segment(segment: &str, position: usize) -> Result<(), PathError> {
        if segment.is_empty() {
            return Err(PathError::InvalidSegment {
                segment: segment.to_string(),
                position,
                message: "empty segment".to_string(),
            });
        }
        if segment == "." || segment == ".." {
            return Err(PathError::InvalidSegment {
                segment: segment.to_string(),
                position,
                message: "relative segment".to_string(),
            });
        }
        if segment.contains('/') {
            return Err(PathError::InvalidSegment {
                segment: segment.to_string(),
                position,
                message: "contains separator".to_string(),
            });
        }
        if segment.chars().any(char::is_control) {
            return Err(PathError::InvalidSegment {
                segment: segment.to_string(),
                position,
                message: "contains control character".to_string(),
            });
        }
        Ok(())
    }

    /// The normalized path string.
    pub fn as_str(&self) -> &str {
        &self.normalized
    }

    /// Check if this is the root path.
    pub fn is_root(&self) -> bool {
        self.normalized == "/"
    }

    /// The last segment, or `""` for the root.
    pub fn name(&self) -> &str {
        match self.normalized.rfind('/') {
            Some(i) => &self.normalized[i + 1..],
            None => "",
        }
    }

    /// The parent path; the root is its own parent.
    #[must_use]
    pub fn parent(&self) -> PathAddress {
        if self.is_root() {
            return self.clone();
        }
        match self.normalized.rfind('/') {
            Some(0) | None => Self::root(),
            Some(i) => PathAddress {
                normalized: self.normalized[..i].to_string(),
            },
        }
    }

    /// Iterate over the path segments, root first.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.normalized.split('/').filter(|seg| !seg.is_empty())
    }

    /// Number of segments (0 for the root).
    pub fn depth(&self) -> usize {
        self.segments().count()
    }
}

impl fmt::Display for PathAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.normalized)
    }
}

impl Serialize for PathAddress {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.normalized)
    }
}

impl<'de> Deserialize<'de> for PathAddress {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        PathAddress::target(&s).map_err(serde::de::Error::custom)
    }
}

/// Macro for creating path addresses from literals.
///
/// # Example
///
/// ```rust
/// use cask_repo::path_addr;
///
/// let p = path_addr!("/assets/a1");
/// assert_eq!(p.name(), "a1");
/// ```
#[macro_export]
macro_rules! path_addr {
    ($s:expr) => {
        $crate::PathAddress::target($s).expect("invalid path literal")
    };
}
