//! Native Backend
//!
//! Thin pass-through onto the host OS filesystem using real absolute paths.
//! The host already indexes its tree, so no handle caching happens here.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;

use super::types::{DirEntry, FileSystem, FsError, Selection};

/// Outcome of a native directory-picker gesture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NativePick {
    Picked(PathBuf),
    Cancelled,
}

/// Directory-picker collaborator for the native backend. The actual dialog
/// lives in the UI layer; this layer only consumes its outcome.
#[async_trait]
pub trait NativePicker: Send + Sync {
    async fn pick_directory(&self) -> Result<NativePick, FsError>;
}

/// Native backend over the host OS filesystem.
pub struct NativeFs {
    picker: Option<Arc<dyn NativePicker>>,
}

impl NativeFs {
    pub fn new() -> Self {
        NativeFs { picker: None }
    }

    /// Install a directory-picker collaborator for `select_directory`.
    pub fn with_picker(picker: Arc<dyn NativePicker>) -> Self {
        NativeFs {
            picker: Some(picker),
        }
    }
}

impl Default for NativeFs {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FileSystem for NativeFs {
    async fn select_directory(&self) -> Result<Selection, FsError> {
        let picker = self.picker.as_ref().ok_or_else(|| FsError::Unsupported {
            operation: "select_directory without a picker collaborator".to_string(),
        })?;
        match picker.pick_directory().await? {
            NativePick::Picked(path) => {
                Ok(Selection::Selected(path.to_string_lossy().into_owned()))
            }
            NativePick::Cancelled => Ok(Selection::Cancelled),
        }
    }

    async fn document_dir(&self) -> Result<Selection, FsError> {
        let home = std::env::var_os("HOME")
            .or_else(|| std::env::var_os("USERPROFILE"))
            .ok_or_else(|| FsError::Unsupported {
                operation: "document_dir on a host without a home directory".to_string(),
            })?;
        let documents = Path::new(&home).join("Documents");
        Ok(Selection::Selected(documents.to_string_lossy().into_owned()))
    }

    async fn app_install_dir(&self) -> Result<String, FsError> {
        let exe = std::env::current_exe()
            .map_err(|e| FsError::from_io(&e, "", "app_install_dir"))?;
        let dir = exe.parent().unwrap_or_else(|| Path::new("/"));
        Ok(dir.to_string_lossy().into_owned())
    }

    async fn create_directory(&self, path: &str) -> Result<(), FsError> {
        // create_dir_all is already idempotent
        tokio::fs::create_dir_all(path)
            .await
            .map_err(|e| FsError::from_io(&e, path, "mkdir"))
    }

    async fn write_file(&self, path: &str, content: &[u8]) -> Result<(), FsError> {
        tokio::fs::write(path, content)
            .await
            .map_err(|e| FsError::from_io(&e, path, "write"))
    }

    async fn read_file(&self, path: &str) -> Result<String, FsError> {
        let buf = self.read_file_buffer(path).await?;
        Ok(String::from_utf8_lossy(&buf).to_string())
    }

    async fn read_file_buffer(&self, path: &str) -> Result<Vec<u8>, FsError> {
        tokio::fs::read(path)
            .await
            .map_err(|e| FsError::from_io(&e, path, "open"))
    }

    async fn read_dir(&self, path: &str) -> Result<Vec<DirEntry>, FsError> {
        let mut reader = tokio::fs::read_dir(path)
            .await
            .map_err(|e| FsError::from_io(&e, path, "scandir"))?;
        let mut out = Vec::new();
        while let Some(entry) = reader
            .next_entry()
            .await
            .map_err(|e| FsError::from_io(&e, path, "scandir"))?
        {
            let file_type = entry
                .file_type()
                .await
                .map_err(|e| FsError::from_io(&e, path, "scandir"))?;
            out.push(DirEntry {
                name: entry.file_name().to_string_lossy().into_owned(),
                is_directory: file_type.is_dir(),
            });
        }
        out.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(out)
    }

    async fn exists(&self, path: &str) -> bool {
        tokio::fs::try_exists(path).await.unwrap_or(false)
    }

    async fn remove(&self, path: &str) -> Result<(), FsError> {
        let meta = tokio::fs::metadata(path)
            .await
            .map_err(|e| FsError::from_io(&e, path, "remove"))?;
        if meta.is_dir() {
            tokio::fs::remove_dir_all(path)
                .await
                .map_err(|e| FsError::from_io(&e, path, "rmdir"))
        } else {
            tokio::fs::remove_file(path)
                .await
                .map_err(|e| FsError::from_io(&e, path, "unlink"))
        }
    }

    async fn copy_file(&self, src: &str, dst: &str) -> Result<(), FsError> {
        tokio::fs::copy(src, dst)
            .await
            .map(|_| ())
            .map_err(|e| FsError::from_io(&e, src, "copyfile"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedPicker(NativePick);

    #[async_trait]
    impl NativePicker for FixedPicker {
        async fn pick_directory(&self) -> Result<NativePick, FsError> {
            Ok(self.0.clone())
        }
    }

    fn path_str(dir: &tempfile::TempDir, name: &str) -> String {
        dir.path().join(name).to_string_lossy().into_owned()
    }

    #[tokio::test]
    async fn test_write_read_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let fs = NativeFs::new();
        let file = path_str(&dir, "hello.txt");
        fs.write_file(&file, b"hello").await.unwrap();
        assert_eq!(fs.read_file(&file).await.unwrap(), "hello");
    }

    #[tokio::test]
    async fn test_create_directory_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let fs = NativeFs::new();
        let nested = path_str(&dir, "a/b/c");
        fs.create_directory(&nested).await.unwrap();
        fs.create_directory(&nested).await.unwrap();
        assert!(fs.exists(&nested).await);
    }

    #[tokio::test]
    async fn test_read_dir_sorted() {
        let dir = tempfile::tempdir().unwrap();
        let fs = NativeFs::new();
        fs.write_file(&path_str(&dir, "b.txt"), b"b").await.unwrap();
        fs.write_file(&path_str(&dir, "a.txt"), b"a").await.unwrap();
        fs.create_directory(&path_str(&dir, "sub")).await.unwrap();

        let entries = fs
            .read_dir(&dir.path().to_string_lossy())
            .await
            .unwrap();
        let names: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["a.txt", "b.txt", "sub"]);
        assert!(entries[2].is_directory);
    }

    #[tokio::test]
    async fn test_remove_picks_file_or_tree() {
        let dir = tempfile::tempdir().unwrap();
        let fs = NativeFs::new();
        let file = path_str(&dir, "f.txt");
        fs.write_file(&file, b"x").await.unwrap();
        fs.remove(&file).await.unwrap();
        assert!(!fs.exists(&file).await);

        let tree = path_str(&dir, "tree");
        fs.create_directory(&path_str(&dir, "tree/inner")).await.unwrap();
        fs.write_file(&path_str(&dir, "tree/inner/f.txt"), b"x")
            .await
            .unwrap();
        fs.remove(&tree).await.unwrap();
        assert!(!fs.exists(&tree).await);
    }

    #[tokio::test]
    async fn test_remove_missing_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let fs = NativeFs::new();
        assert!(matches!(
            fs.remove(&path_str(&dir, "nope")).await,
            Err(FsError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_copy_file() {
        let dir = tempfile::tempdir().unwrap();
        let fs = NativeFs::new();
        let src = path_str(&dir, "src.txt");
        let dst = path_str(&dir, "dst.txt");
        fs.write_file(&src, b"payload").await.unwrap();
        fs.copy_file(&src, &dst).await.unwrap();
        assert_eq!(fs.read_file(&dst).await.unwrap(), "payload");
    }

    #[tokio::test]
    async fn test_select_directory_without_picker_is_unsupported() {
        let fs = NativeFs::new();
        assert!(matches!(
            fs.select_directory().await,
            Err(FsError::Unsupported { .. })
        ));
    }

    #[tokio::test]
    async fn test_select_directory_cancel_is_a_value() {
        let fs = NativeFs::with_picker(Arc::new(FixedPicker(NativePick::Cancelled)));
        assert_eq!(fs.select_directory().await.unwrap(), Selection::Cancelled);
    }
}
