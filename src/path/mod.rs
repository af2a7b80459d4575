//! Path Space
//!
//! Pure path algebra shared by both backends: joining, segment splitting and
//! the tagged [`VirtualPath`] type. No I/O happens in this module.

pub mod types;

pub use types::{PathDomain, VirtualPath, PRIVATE_MARKER};

/// Join path parts with a single separator, collapsing repeated separators
/// and empty parts.
///
/// Mounted-domain results carry exactly one leading `/`. If the first part
/// starts with the private-storage marker the marker is preserved as a prefix
/// rather than becoming a leading separator.
pub fn join(parts: &[&str]) -> String {
    let private = parts
        .first()
        .map(|p| p.starts_with(PRIVATE_MARKER))
        .unwrap_or(false);

    let mut segments: Vec<&str> = Vec::new();
    for (i, part) in parts.iter().enumerate() {
        let part = if i == 0 && private {
            &part[PRIVATE_MARKER.len()..]
        } else {
            part
        };
        segments.extend(part.split('/').filter(|s| !s.is_empty()));
    }

    if private {
        format!("{}{}", PRIVATE_MARKER, segments.join("/"))
    } else {
        format!("/{}", segments.join("/"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_drops_empty_parts() {
        assert_eq!(join(&["root", "", "sub"]), "/root/sub");
    }

    #[test]
    fn test_join_collapses_separators() {
        assert_eq!(join(&["/root//src/", "/app.js"]), "/root/src/app.js");
        assert_eq!(join(&["root", "sub/"]), "/root/sub");
    }

    #[test]
    fn test_join_preserves_private_marker() {
        assert_eq!(join(&["opfs:/", "projects"]), "opfs:/projects");
        assert_eq!(join(&["opfs:/cache", "a", "b.json"]), "opfs:/cache/a/b.json");
        assert_eq!(join(&["opfs:/"]), "opfs:/");
    }

    #[test]
    fn test_join_empty() {
        assert_eq!(join(&[]), "/");
    }
}
