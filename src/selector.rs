//! Backend Selector
//!
//! One-time choice between the native and sandboxed backends, made at
//! process start from host capability detection. The choice is a sum type
//! handed through the call graph; there is no global and no later switching.
//! Mount state and the handle cache live inside the chosen instance for the
//! process lifetime.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::fs::handles::StorageHost;
use crate::fs::native_fs::NativeFs;
use crate::fs::sandbox_fs::SandboxFs;
use crate::fs::types::{DirEntry, FileSystem, FsError, Selection};

/// What the host environment can do for us.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HostCapabilities {
    /// Whether real OS paths can be opened directly.
    pub direct_path_access: bool,
}

impl HostCapabilities {
    pub fn detect() -> Self {
        // Sandboxed wasm hosts have no direct path access; every other
        // target this crate builds for does.
        HostCapabilities {
            direct_path_access: cfg!(not(target_family = "wasm")),
        }
    }
}

/// The backend chosen for this process.
pub enum Backend {
    Native(NativeFs),
    Sandboxed(SandboxFs),
}

impl Backend {
    fn inner(&self) -> &dyn FileSystem {
        match self {
            Backend::Native(fs) => fs,
            Backend::Sandboxed(fs) => fs,
        }
    }
}

/// Choose the backend once from the detected capabilities. Native wherever
/// direct path access exists; otherwise sandboxed over the given host.
pub fn select_backend(caps: &HostCapabilities, host: Arc<dyn StorageHost>) -> Backend {
    if caps.direct_path_access {
        info!("selected native filesystem backend");
        Backend::Native(NativeFs::new())
    } else {
        info!("selected sandboxed filesystem backend");
        Backend::Sandboxed(SandboxFs::new(host))
    }
}

#[async_trait]
impl FileSystem for Backend {
    async fn select_directory(&self) -> Result<Selection, FsError> {
        self.inner().select_directory().await
    }

    async fn document_dir(&self) -> Result<Selection, FsError> {
        self.inner().document_dir().await
    }

    async fn app_install_dir(&self) -> Result<String, FsError> {
        self.inner().app_install_dir().await
    }

    async fn create_directory(&self, path: &str) -> Result<(), FsError> {
        self.inner().create_directory(path).await
    }

    async fn write_file(&self, path: &str, content: &[u8]) -> Result<(), FsError> {
        self.inner().write_file(path, content).await
    }

    async fn read_file(&self, path: &str) -> Result<String, FsError> {
        self.inner().read_file(path).await
    }

    async fn read_file_buffer(&self, path: &str) -> Result<Vec<u8>, FsError> {
        self.inner().read_file_buffer(path).await
    }

    async fn read_dir(&self, path: &str) -> Result<Vec<DirEntry>, FsError> {
        self.inner().read_dir(path).await
    }

    async fn exists(&self, path: &str) -> bool {
        self.inner().exists(path).await
    }

    async fn remove(&self, path: &str) -> Result<(), FsError> {
        self.inner().remove(path).await
    }

    async fn copy_file(&self, src: &str, dst: &str) -> Result<(), FsError> {
        self.inner().copy_file(src, dst).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::handles::{DirPick, MemoryDevice};

    #[test]
    fn test_direct_access_selects_native() {
        let caps = HostCapabilities {
            direct_path_access: true,
        };
        let backend = select_backend(&caps, Arc::new(MemoryDevice::new()));
        assert!(matches!(backend, Backend::Native(_)));
    }

    #[test]
    fn test_no_direct_access_selects_sandboxed() {
        let caps = HostCapabilities {
            direct_path_access: false,
        };
        let backend = select_backend(&caps, Arc::new(MemoryDevice::new()));
        assert!(matches!(backend, Backend::Sandboxed(_)));
    }

    #[tokio::test]
    async fn test_backend_delegates_the_contract() {
        let device = Arc::new(MemoryDevice::new());
        let external = device.create_external_root("Projects");
        device.queue_pick(DirPick::Picked(external));

        let caps = HostCapabilities {
            direct_path_access: false,
        };
        let backend = select_backend(&caps, device);

        let selection = backend.select_directory().await.unwrap();
        assert_eq!(selection, Selection::Selected("/Projects".to_string()));

        backend.write_file("/Projects/a.txt", b"hi").await.unwrap();
        assert_eq!(backend.read_file("/Projects/a.txt").await.unwrap(), "hi");
        assert_eq!(backend.join(&["root", "", "sub"]), "/root/sub");
    }
}
