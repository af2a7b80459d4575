//! Virtual Path Types
//!
//! Tagged representation of the two addressing domains. A path string is
//! parsed exactly once at the contract boundary; from then on the domain
//! travels in the type and cannot be confused.

use std::fmt;

use crate::fs::types::FsError;

/// Reserved prefix of the private-storage domain.
pub const PRIVATE_MARKER: &str = "opfs:/";

/// The two disjoint virtual path domains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PathDomain {
    /// Rooted at the user-consented, externally chosen directory.
    Mounted,
    /// Rooted at the application's always-available private storage.
    Private,
}

/// A parsed virtual path: normalized segments plus the domain tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VirtualPath {
    /// First segment is the mount root's display name.
    Mounted(Vec<String>),
    /// Segments below the private-storage root. May be empty (the root itself).
    Private(Vec<String>),
}

impl VirtualPath {
    /// Parse a slash-delimited virtual path string.
    ///
    /// Paths beginning with [`PRIVATE_MARKER`] land in the private-storage
    /// domain; everything else is mounted-domain and must carry at least one
    /// segment (the mount root's display name). A marker anywhere but the
    /// very start is rejected: domains are never mixed within one path.
    pub fn parse(path: &str) -> Result<Self, FsError> {
        if let Some(rest) = path.strip_prefix(PRIVATE_MARKER) {
            if rest.contains(PRIVATE_MARKER) {
                return Err(FsError::InvalidPath {
                    path: path.to_string(),
                    reason: "domain markers cannot be mixed within one path".to_string(),
                });
            }
            return Ok(VirtualPath::Private(split_segments(rest)));
        }
        if path.contains(PRIVATE_MARKER) {
            return Err(FsError::InvalidPath {
                path: path.to_string(),
                reason: "private-storage marker is only valid at the start of a path".to_string(),
            });
        }
        let segments = split_segments(path);
        if segments.is_empty() {
            return Err(FsError::InvalidPath {
                path: path.to_string(),
                reason: "mounted paths must start with the mount root's name".to_string(),
            });
        }
        Ok(VirtualPath::Mounted(segments))
    }

    /// Domain tag of this path.
    pub fn domain(&self) -> PathDomain {
        match self {
            VirtualPath::Mounted(_) => PathDomain::Mounted,
            VirtualPath::Private(_) => PathDomain::Private,
        }
    }

    /// All segments, including the mount root name for mounted paths.
    pub fn segments(&self) -> &[String] {
        match self {
            VirtualPath::Mounted(segments) | VirtualPath::Private(segments) => segments,
        }
    }

    /// Segments to walk below the domain root (mounted paths skip the root
    /// name segment).
    pub fn walk_segments(&self) -> &[String] {
        match self {
            VirtualPath::Mounted(segments) => &segments[1..],
            VirtualPath::Private(segments) => segments,
        }
    }

    /// Split off the terminal segment, leaving the parent directory path.
    /// `None` when the path addresses its domain root.
    pub fn split_terminal(&self) -> Option<(VirtualPath, String)> {
        match self {
            VirtualPath::Mounted(segments) if segments.len() > 1 => {
                let (rest, last) = pop_terminal(segments);
                Some((VirtualPath::Mounted(rest), last))
            }
            VirtualPath::Private(segments) if !segments.is_empty() => {
                let (rest, last) = pop_terminal(segments);
                Some((VirtualPath::Private(rest), last))
            }
            _ => None,
        }
    }

    /// True when the path addresses its domain root itself.
    pub fn is_domain_root(&self) -> bool {
        match self {
            VirtualPath::Mounted(segments) => segments.len() == 1,
            VirtualPath::Private(segments) => segments.is_empty(),
        }
    }

    /// A mounted path's first segment must equal the active root's display
    /// name; private-storage paths carry no root name to check.
    pub fn validate_root(&self, root_name: &str) -> Result<(), FsError> {
        match self {
            VirtualPath::Mounted(segments) if segments[0] == root_name => Ok(()),
            VirtualPath::Mounted(_) => Err(FsError::InvalidPath {
                path: self.to_string(),
                reason: format!("path must start with selected root '{}'", root_name),
            }),
            VirtualPath::Private(_) => Ok(()),
        }
    }
}

impl fmt::Display for VirtualPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VirtualPath::Mounted(segments) => write!(f, "/{}", segments.join("/")),
            VirtualPath::Private(segments) => write!(f, "{}{}", PRIVATE_MARKER, segments.join("/")),
        }
    }
}

fn split_segments(path: &str) -> Vec<String> {
    path.split('/')
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect()
}

fn pop_terminal(segments: &[String]) -> (Vec<String>, String) {
    let mut rest = segments.to_vec();
    let last = rest.pop().unwrap_or_default();
    (rest, last)
}
