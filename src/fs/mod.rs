//! File System Backends
//!
//! The capability contract and its two implementations: direct host paths
//! (native) and consent-gated opaque handles (sandboxed).

pub mod handles;
pub mod native_fs;
pub mod sandbox_fs;
pub mod types;

pub use handles::{DirPick, DirectoryHandle, FileHandle, MemoryDevice, StorageHost};
pub use native_fs::{NativeFs, NativePick, NativePicker};
pub use sandbox_fs::SandboxFs;
pub use types::*;
