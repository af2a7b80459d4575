//! Opaque Handle Storage
//!
//! The host seam behind the sandboxed backend: hierarchical opaque handles in
//! the shape of a directory-picker storage API, plus an in-memory device that
//! backs private storage and tests.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::types::{DirEntry, FsError};

/// Opaque reference to a resolved directory.
#[async_trait]
pub trait DirectoryHandle: Send + Sync {
    /// Display name of this directory.
    fn name(&self) -> String;

    /// Resolve a child directory handle, optionally creating it.
    async fn get_directory(
        &self,
        name: &str,
        create: bool,
    ) -> Result<Arc<dyn DirectoryHandle>, FsError>;

    /// Resolve a child file handle, optionally creating it.
    async fn get_file(&self, name: &str, create: bool) -> Result<Arc<dyn FileHandle>, FsError>;

    /// List the immediate children, sorted by name.
    async fn entries(&self) -> Result<Vec<DirEntry>, FsError>;

    /// Remove a child entry. Non-empty directories require `recursive`.
    async fn remove_entry(&self, name: &str, recursive: bool) -> Result<(), FsError>;
}

/// Opaque reference to a resolved file.
#[async_trait]
pub trait FileHandle: Send + Sync {
    async fn read(&self) -> Result<Vec<u8>, FsError>;
    async fn write(&self, content: &[u8]) -> Result<(), FsError>;
}

/// Outcome of the host's directory-picker gesture.
#[derive(Clone)]
pub enum DirPick {
    Picked(Arc<dyn DirectoryHandle>),
    /// Voluntary abort by the user, not a failure.
    Cancelled,
}

/// Host capabilities backing the sandboxed backend: the consent-gated
/// picker and the always-available private storage root.
#[async_trait]
pub trait StorageHost: Send + Sync {
    /// Issue the user consent gesture.
    async fn pick_directory(&self) -> Result<DirPick, FsError>;

    /// Private storage root. No consent required.
    async fn private_root(&self) -> Result<Arc<dyn DirectoryHandle>, FsError>;
}

// ============================================================================
// In-memory device
// ============================================================================

struct MemFile {
    content: RwLock<Vec<u8>>,
}

struct MemDir {
    name: String,
    children: RwLock<HashMap<String, MemChild>>,
}

impl MemDir {
    fn new(name: &str) -> Arc<Self> {
        Arc::new(MemDir {
            name: name.to_string(),
            children: RwLock::new(HashMap::new()),
        })
    }
}

#[derive(Clone)]
enum MemChild {
    Dir(Arc<MemDir>),
    File(Arc<MemFile>),
}

#[derive(Default)]
struct DeviceStats {
    directory_lookups: AtomicUsize,
    picks_issued: AtomicUsize,
}

/// In-memory handle-based storage device.
///
/// Serves as the always-available private storage of the sandboxed backend
/// and as a scriptable host in tests: queued picks play back through
/// `pick_directory`, and instrumentation counters expose how often the
/// device was actually consulted.
pub struct MemoryDevice {
    root: Arc<MemDir>,
    picks: Mutex<VecDeque<DirPick>>,
    stats: Arc<DeviceStats>,
}

impl MemoryDevice {
    pub fn new() -> Self {
        MemoryDevice {
            root: MemDir::new(""),
            picks: Mutex::new(VecDeque::new()),
            stats: Arc::new(DeviceStats::default()),
        }
    }

    /// Create a detached directory tree that can be queued as a pick grant.
    pub fn create_external_root(&self, name: &str) -> Arc<dyn DirectoryHandle> {
        Arc::new(MemDirHandle {
            dir: MemDir::new(name),
            stats: self.stats.clone(),
        })
    }

    /// Queue the outcome of the next pick gesture. With an empty queue the
    /// gesture behaves as declined.
    pub fn queue_pick(&self, pick: DirPick) {
        self.picks.lock().unwrap().push_back(pick);
    }

    /// Number of child-directory resolutions served by the device itself
    /// (cache hits in the backend never reach here).
    pub fn directory_lookups(&self) -> usize {
        self.stats.directory_lookups.load(Ordering::Relaxed)
    }

    /// Number of pick gestures issued against this device.
    pub fn picks_issued(&self) -> usize {
        self.stats.picks_issued.load(Ordering::Relaxed)
    }
}

impl Default for MemoryDevice {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StorageHost for MemoryDevice {
    async fn pick_directory(&self) -> Result<DirPick, FsError> {
        self.stats.picks_issued.fetch_add(1, Ordering::Relaxed);
        let pick = self.picks.lock().unwrap().pop_front();
        Ok(pick.unwrap_or(DirPick::Cancelled))
    }

    async fn private_root(&self) -> Result<Arc<dyn DirectoryHandle>, FsError> {
        Ok(Arc::new(MemDirHandle {
            dir: self.root.clone(),
            stats: self.stats.clone(),
        }))
    }
}

struct MemDirHandle {
    dir: Arc<MemDir>,
    stats: Arc<DeviceStats>,
}

#[async_trait]
impl DirectoryHandle for MemDirHandle {
    fn name(&self) -> String {
        self.dir.name.clone()
    }

    async fn get_directory(
        &self,
        name: &str,
        create: bool,
    ) -> Result<Arc<dyn DirectoryHandle>, FsError> {
        self.stats.directory_lookups.fetch_add(1, Ordering::Relaxed);
        let mut children = self.dir.children.write().await;
        match children.get(name) {
            Some(MemChild::Dir(dir)) => Ok(Arc::new(MemDirHandle {
                dir: dir.clone(),
                stats: self.stats.clone(),
            })),
            Some(MemChild::File(_)) => Err(FsError::Io {
                path: name.to_string(),
                operation: "get_directory".to_string(),
                message: "entry is a file".to_string(),
            }),
            None if create => {
                let dir = MemDir::new(name);
                children.insert(name.to_string(), MemChild::Dir(dir.clone()));
                Ok(Arc::new(MemDirHandle {
                    dir,
                    stats: self.stats.clone(),
                }))
            }
            None => Err(FsError::NotFound {
                path: name.to_string(),
                operation: "get_directory".to_string(),
            }),
        }
    }

    async fn get_file(&self, name: &str, create: bool) -> Result<Arc<dyn FileHandle>, FsError> {
        let mut children = self.dir.children.write().await;
        match children.get(name) {
            Some(MemChild::File(file)) => Ok(Arc::new(MemFileHandle { file: file.clone() })),
            Some(MemChild::Dir(_)) => Err(FsError::Io {
                path: name.to_string(),
                operation: "get_file".to_string(),
                message: "entry is a directory".to_string(),
            }),
            None if create => {
                let file = Arc::new(MemFile {
                    content: RwLock::new(Vec::new()),
                });
                children.insert(name.to_string(), MemChild::File(file.clone()));
                Ok(Arc::new(MemFileHandle { file }))
            }
            None => Err(FsError::NotFound {
                path: name.to_string(),
                operation: "get_file".to_string(),
            }),
        }
    }

    async fn entries(&self) -> Result<Vec<DirEntry>, FsError> {
        let children = self.dir.children.read().await;
        let mut out: Vec<DirEntry> = children
            .iter()
            .map(|(name, child)| DirEntry {
                name: name.clone(),
                is_directory: matches!(child, MemChild::Dir(_)),
            })
            .collect();
        out.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(out)
    }

    async fn remove_entry(&self, name: &str, recursive: bool) -> Result<(), FsError> {
        let mut children = self.dir.children.write().await;
        match children.get(name) {
            Some(MemChild::Dir(dir)) if !recursive => {
                if !dir.children.read().await.is_empty() {
                    return Err(FsError::Io {
                        path: name.to_string(),
                        operation: "remove_entry".to_string(),
                        message: "directory not empty".to_string(),
                    });
                }
                children.remove(name);
                Ok(())
            }
            Some(_) => {
                children.remove(name);
                Ok(())
            }
            None => Err(FsError::NotFound {
                path: name.to_string(),
                operation: "remove_entry".to_string(),
            }),
        }
    }
}

struct MemFileHandle {
    file: Arc<MemFile>,
}

#[async_trait]
impl FileHandle for MemFileHandle {
    async fn read(&self) -> Result<Vec<u8>, FsError> {
        Ok(self.file.content.read().await.clone())
    }

    async fn write(&self, content: &[u8]) -> Result<(), FsError> {
        *self.file.content.write().await = content.to_vec();
        Ok(())
    }
}
