//! Sandboxed Backend
//!
//! Resolves virtual paths against consent-gated opaque-handle storage. The
//! mounted domain exists only after the user grants a directory pick; the
//! private-storage domain is always available. Intermediate directory
//! handles are cached per cumulative path prefix to amortize the walk.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tracing::{debug, info};

use super::handles::{DirPick, DirectoryHandle, StorageHost};
use super::types::{DirEntry, FileSystem, FsError, Selection};
use crate::path::{PathDomain, VirtualPath, PRIVATE_MARKER};

/// The selected top-level handle and its display name. Exists only after a
/// successful consent grant; scoped to the backend instance.
#[derive(Clone)]
struct MountRoot {
    name: String,
    handle: Arc<dyn DirectoryHandle>,
}

/// Cumulative-prefix handle cache with one namespace per domain.
#[derive(Default)]
struct HandleCache {
    mounted: HashMap<String, Arc<dyn DirectoryHandle>>,
    private: HashMap<String, Arc<dyn DirectoryHandle>>,
}

impl HandleCache {
    fn namespace(&self, domain: PathDomain) -> &HashMap<String, Arc<dyn DirectoryHandle>> {
        match domain {
            PathDomain::Mounted => &self.mounted,
            PathDomain::Private => &self.private,
        }
    }

    fn namespace_mut(
        &mut self,
        domain: PathDomain,
    ) -> &mut HashMap<String, Arc<dyn DirectoryHandle>> {
        match domain {
            PathDomain::Mounted => &mut self.mounted,
            PathDomain::Private => &mut self.private,
        }
    }

    /// Drop every cached handle at or below `prefix`.
    fn evict_prefix(&mut self, domain: PathDomain, prefix: &str) {
        let subtree = format!("{}/", prefix);
        self.namespace_mut(domain)
            .retain(|key, _| key != prefix && !key.starts_with(&subtree));
    }
}

/// Cache key of a resolved directory path within its namespace.
fn cache_key(vpath: &VirtualPath) -> String {
    let segments = vpath.segments();
    if segments.is_empty() {
        "/".to_string()
    } else {
        format!("/{}", segments.join("/"))
    }
}

/// Sandboxed backend over a [`StorageHost`].
pub struct SandboxFs {
    host: Arc<dyn StorageHost>,
    mount: Mutex<Option<MountRoot>>,
    cache: Mutex<HandleCache>,
}

impl SandboxFs {
    pub fn new(host: Arc<dyn StorageHost>) -> Self {
        SandboxFs {
            host,
            mount: Mutex::new(None),
            cache: Mutex::new(HandleCache::default()),
        }
    }

    /// Walk a directory path through the cache, resolving (and with `create`
    /// materializing) missing child handles from their parent. A cache entry
    /// is inserted only after the child resolution succeeds, so a failed
    /// walk leaves nothing stale behind.
    async fn resolve_dir(
        &self,
        vpath: &VirtualPath,
        create: bool,
        operation: &str,
    ) -> Result<Arc<dyn DirectoryHandle>, FsError> {
        let domain = vpath.domain();
        let (mut current, mut prefix) = match vpath {
            VirtualPath::Mounted(_) => {
                let mount = self
                    .mount
                    .lock()
                    .unwrap()
                    .clone()
                    .ok_or_else(|| FsError::PermissionDenied {
                        path: vpath.to_string(),
                        operation: operation.to_string(),
                    })?;
                vpath.validate_root(&mount.name)?;
                (mount.handle, format!("/{}", mount.name))
            }
            VirtualPath::Private(_) => {
                let cached = self.cache.lock().unwrap().private.get("/").cloned();
                let root = match cached {
                    Some(root) => root,
                    None => {
                        let root = self.host.private_root().await?;
                        self.cache
                            .lock()
                            .unwrap()
                            .private
                            .insert("/".to_string(), root.clone());
                        root
                    }
                };
                (root, String::new())
            }
        };

        for segment in vpath.walk_segments() {
            prefix = format!("{}/{}", prefix, segment);
            let cached = self.cache.lock().unwrap().namespace(domain).get(&prefix).cloned();
            if let Some(handle) = cached {
                current = handle;
                continue;
            }
            // Intermediate segments are always directories, whatever the
            // terminal operation is doing.
            let child = current.get_directory(segment, create).await?;
            debug!(prefix = %prefix, "cached directory handle");
            self.cache
                .lock()
                .unwrap()
                .namespace_mut(domain)
                .insert(prefix.clone(), child.clone());
            current = child;
        }

        Ok(current)
    }

    /// Split a file path into its parent directory path and file name.
    fn split_file(vpath: &VirtualPath, operation: &str) -> Result<(VirtualPath, String), FsError> {
        vpath.split_terminal().ok_or_else(|| FsError::InvalidPath {
            path: vpath.to_string(),
            reason: format!("a domain root cannot be the target of {}", operation),
        })
    }
}

#[async_trait]
impl FileSystem for SandboxFs {
    async fn select_directory(&self) -> Result<Selection, FsError> {
        match self.host.pick_directory().await? {
            DirPick::Cancelled => Ok(Selection::Cancelled),
            DirPick::Picked(handle) => {
                let name = handle.name();
                let root_path = format!("/{}", name);
                info!(root = %root_path, "mount root selected");
                // Re-selection invalidates everything cached under the old root.
                {
                    let mut cache = self.cache.lock().unwrap();
                    cache.mounted.clear();
                    cache.mounted.insert(root_path.clone(), handle.clone());
                }
                *self.mount.lock().unwrap() = Some(MountRoot { name, handle });
                Ok(Selection::Selected(root_path))
            }
        }
    }

    async fn document_dir(&self) -> Result<Selection, FsError> {
        // No ambient access to a documents folder in this environment; the
        // user has to pick one, so this shares the selection path.
        self.select_directory().await
    }

    async fn app_install_dir(&self) -> Result<String, FsError> {
        Ok(PRIVATE_MARKER.to_string())
    }

    async fn create_directory(&self, path: &str) -> Result<(), FsError> {
        let vpath = VirtualPath::parse(path)?;
        self.resolve_dir(&vpath, true, "mkdir").await?;
        Ok(())
    }

    async fn write_file(&self, path: &str, content: &[u8]) -> Result<(), FsError> {
        let vpath = VirtualPath::parse(path)?;
        let (parent, name) = Self::split_file(&vpath, "write")?;
        // Missing intermediate directories materialize transparently.
        let dir = self.resolve_dir(&parent, true, "write").await?;
        let file = dir.get_file(&name, true).await?;
        file.write(content).await
    }

    async fn read_file(&self, path: &str) -> Result<String, FsError> {
        let buf = self.read_file_buffer(path).await?;
        Ok(String::from_utf8_lossy(&buf).to_string())
    }

    async fn read_file_buffer(&self, path: &str) -> Result<Vec<u8>, FsError> {
        let vpath = VirtualPath::parse(path)?;
        let (parent, name) = Self::split_file(&vpath, "open")?;
        let dir = self.resolve_dir(&parent, false, "open").await?;
        let file = dir.get_file(&name, false).await.map_err(|err| match err {
            FsError::NotFound { .. } => FsError::NotFound {
                path: vpath.to_string(),
                operation: "open".to_string(),
            },
            other => other,
        })?;
        file.read().await
    }

    async fn read_dir(&self, path: &str) -> Result<Vec<DirEntry>, FsError> {
        let vpath = VirtualPath::parse(path)?;
        let dir = self.resolve_dir(&vpath, false, "scandir").await?;
        let mut entries = dir.entries().await?;
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    async fn exists(&self, path: &str) -> bool {
        let vpath = match VirtualPath::parse(path) {
            Ok(vpath) => vpath,
            Err(_) => return false,
        };
        match vpath.split_terminal() {
            None => self.resolve_dir(&vpath, false, "access").await.is_ok(),
            Some((parent, name)) => {
                let dir = match self.resolve_dir(&parent, false, "access").await {
                    Ok(dir) => dir,
                    Err(_) => return false,
                };
                if dir.get_directory(&name, false).await.is_ok() {
                    return true;
                }
                dir.get_file(&name, false).await.is_ok()
            }
        }
    }

    async fn remove(&self, path: &str) -> Result<(), FsError> {
        let vpath = VirtualPath::parse(path)?;
        let (parent, name) = Self::split_file(&vpath, "remove")?;
        let dir = self.resolve_dir(&parent, false, "remove").await?;

        if dir.get_directory(&name, false).await.is_ok() {
            dir.remove_entry(&name, true).await?;
        } else {
            // Surface NotFound for a missing target before attempting removal.
            dir.get_file(&name, false).await.map_err(|_| FsError::NotFound {
                path: vpath.to_string(),
                operation: "remove".to_string(),
            })?;
            dir.remove_entry(&name, false).await?;
        }

        self.cache
            .lock()
            .unwrap()
            .evict_prefix(vpath.domain(), &cache_key(&vpath));
        Ok(())
    }

    async fn copy_file(&self, src: &str, dst: &str) -> Result<(), FsError> {
        let content = self.read_file_buffer(src).await?;
        self.write_file(dst, &content).await
    }
}
