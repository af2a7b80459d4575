//! mountfs - dual-backend filesystem layer for project editing
//!
//! A forward-slash virtual path space resolved against either the host OS
//! filesystem (native backend) or consent-gated opaque-handle storage
//! (sandboxed backend), with polling-based change watching over either.

pub mod fs;
pub mod path;
pub mod selector;
pub mod watcher;

pub use fs::handles::{DirPick, DirectoryHandle, FileHandle, MemoryDevice, StorageHost};
pub use fs::native_fs::{NativeFs, NativePick, NativePicker};
pub use fs::sandbox_fs::SandboxFs;
pub use fs::types::{ConfirmDialog, DirEntry, FileSystem, FsError, Selection};
pub use path::{join, PathDomain, VirtualPath, PRIVATE_MARKER};
pub use selector::{select_backend, Backend, HostCapabilities};
pub use watcher::{ChangeWatcher, DirSnapshot, WatchCallback, WatchHandle};
