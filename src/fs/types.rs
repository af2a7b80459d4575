//! File System Contract
//!
//! The capability contract every backend implements, the shared error
//! taxonomy, and the supporting records exchanged with collaborators.

use async_trait::async_trait;
use thiserror::Error;

use crate::path;

/// File system errors shared by every backend.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FsError {
    #[error("permission denied, {operation} '{path}'")]
    PermissionDenied { path: String, operation: String },

    #[error("no such file or directory, {operation} '{path}'")]
    NotFound { path: String, operation: String },

    #[error("already exists, {operation} '{path}'")]
    AlreadyExists { path: String, operation: String },

    #[error("invalid path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },

    #[error("operation not supported by this backend: {operation}")]
    Unsupported { operation: String },

    /// Opaque passthrough of the host's own error, preserved for diagnostics.
    #[error("I/O failure, {operation} '{path}': {message}")]
    Io {
        path: String,
        operation: String,
        message: String,
    },
}

impl FsError {
    /// Map a host I/O error onto the taxonomy. Kinds with a dedicated variant
    /// are lifted; everything else passes through with its original message.
    pub fn from_io(err: &std::io::Error, path: &str, operation: &str) -> Self {
        use std::io::ErrorKind;
        match err.kind() {
            ErrorKind::NotFound => FsError::NotFound {
                path: path.to_string(),
                operation: operation.to_string(),
            },
            ErrorKind::PermissionDenied => FsError::PermissionDenied {
                path: path.to_string(),
                operation: operation.to_string(),
            },
            ErrorKind::AlreadyExists => FsError::AlreadyExists {
                path: path.to_string(),
                operation: operation.to_string(),
            },
            _ => FsError::Io {
                path: path.to_string(),
                operation: operation.to_string(),
                message: err.to_string(),
            },
        }
    }
}

/// Directory entry record returned by `read_dir` and the watcher callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub name: String,
    pub is_directory: bool,
}

/// Outcome of a consent-gated directory choice.
///
/// Cancellation is a voluntary abort by the user, distinct from failure, and
/// is carried as its own variant rather than an absent value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// The chosen root, as a virtual or absolute path.
    Selected(String),
    /// The user declined the gesture.
    Cancelled,
}

impl Selection {
    pub fn as_path(&self) -> Option<&str> {
        match self {
            Selection::Selected(path) => Some(path),
            Selection::Cancelled => None,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Selection::Cancelled)
    }
}

/// Confirmation collaborator callers invoke before destructive operations.
/// The filesystem layer itself never gates `remove` on it.
#[async_trait]
pub trait ConfirmDialog: Send + Sync {
    async fn confirm(&self, message: &str, title: &str) -> bool;
}

/// Capability contract implemented by both backends.
///
/// Paths are forward-slash-delimited virtual paths: mounted-domain paths
/// begin with the active root's display name, private-storage paths with the
/// `opfs:/` marker. The native backend additionally accepts real absolute
/// host paths, which it passes through untouched.
#[async_trait]
pub trait FileSystem: Send + Sync {
    /// Ask the host for a directory choice. On sandboxed hosts this is the
    /// one-time user consent gesture.
    async fn select_directory(&self) -> Result<Selection, FsError>;

    /// The host's documents directory. Sandboxed hosts have no ambient
    /// access and fall back to a directory choice.
    async fn document_dir(&self) -> Result<Selection, FsError>;

    /// Installation (native) or private-storage (sandboxed) root of the
    /// application.
    async fn app_install_dir(&self) -> Result<String, FsError>;

    /// Create a directory, including missing parents. Idempotent: an already
    /// existing directory is success, not `AlreadyExists`.
    async fn create_directory(&self, path: &str) -> Result<(), FsError>;

    /// Write content to a file, creating it (and, on the sandboxed backend,
    /// missing parent directories) as needed.
    async fn write_file(&self, path: &str, content: &[u8]) -> Result<(), FsError>;

    /// Read a file as UTF-8 text.
    async fn read_file(&self, path: &str) -> Result<String, FsError>;

    /// Read a file as raw bytes.
    async fn read_file_buffer(&self, path: &str) -> Result<Vec<u8>, FsError>;

    /// List a directory, sorted by name.
    async fn read_dir(&self, path: &str) -> Result<Vec<DirEntry>, FsError>;

    /// Check whether a path resolves to anything.
    async fn exists(&self, path: &str) -> bool;

    /// Remove a file, or a directory recursively. The target is inspected to
    /// choose which.
    async fn remove(&self, path: &str) -> Result<(), FsError>;

    /// Copy a single file. Never recursive.
    async fn copy_file(&self, src: &str, dst: &str) -> Result<(), FsError>;

    /// Join path parts in the shared virtual path syntax.
    fn join(&self, parts: &[&str]) -> String {
        path::join(parts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_io_lifts_known_kinds() {
        let err = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        assert_eq!(
            FsError::from_io(&err, "/a", "open"),
            FsError::NotFound {
                path: "/a".to_string(),
                operation: "open".to_string(),
            }
        );

        let err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "nope");
        assert!(matches!(
            FsError::from_io(&err, "/a", "open"),
            FsError::PermissionDenied { .. }
        ));
    }

    #[test]
    fn test_from_io_passes_through_unknown_kinds() {
        let err = std::io::Error::new(std::io::ErrorKind::Other, "disk on fire");
        match FsError::from_io(&err, "/a", "write") {
            FsError::Io { message, .. } => assert!(message.contains("disk on fire")),
            other => panic!("expected Io, got {:?}", other),
        }
    }

    #[test]
    fn test_selection_accessors() {
        let selected = Selection::Selected("/Projects".to_string());
        assert_eq!(selected.as_path(), Some("/Projects"));
        assert!(!selected.is_cancelled());

        assert_eq!(Selection::Cancelled.as_path(), None);
        assert!(Selection::Cancelled.is_cancelled());
    }
}
