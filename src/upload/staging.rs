//! Staging storage for uploads awaiting OCR
//!
//! Every staged file is removed once processing finishes. `StagedFile::remove`
//! is the normal path; the `Drop` impl covers handlers that are cancelled or
//! unwind before reaching it.

use std::io;
use std::path::{Path, PathBuf};

use uuid::Uuid;

use super::types::UploadedDocument;

/// Directory holding in-flight uploads
#[derive(Debug, Clone)]
pub struct StagingArea {
    dir: PathBuf,
}

impl StagingArea {
    /// Use `dir` as the staging directory, creating it if needed
    pub fn new<P: AsRef<Path>>(dir: P) -> io::Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write the upload to a uniquely named file
    pub async fn stage(&self, doc: &UploadedDocument) -> io::Result<StagedFile> {
        let path = self
            .dir
            .join(format!("{}_{}", Uuid::new_v4().simple(), doc.file_name));

        tokio::fs::write(&path, &doc.data).await?;

        tracing::debug!(
            path = %path.display(),
            original_name = %doc.original_name,
            size = doc.size(),
            "Upload staged"
        );

        Ok(StagedFile {
            path,
            removed: false,
        })
    }
}

/// A file in the staging area, deleted when processing is done
#[derive(Debug)]
pub struct StagedFile {
    path: PathBuf,
    removed: bool,
}

impl StagedFile {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Delete the staged file. Failures are logged, never returned.
    pub async fn remove(mut self) {
        self.removed = true;
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => tracing::debug!(path = %self.path.display(), "Staged upload removed"),
            Err(e) => tracing::error!(
                path = %self.path.display(),
                "Error removing staged upload: {}",
                e
            ),
        }
    }
}

impl Drop for StagedFile {
    fn drop(&mut self) {
        if self.removed {
            return;
        }
        if let Err(e) = std::fs::remove_file(&self.path) {
            if e.kind() != io::ErrorKind::NotFound {
                tracing::error!(
                    path = %self.path.display(),
                    "Error removing abandoned staged upload: {}",
                    e
                );
            }
        } else {
            tracing::debug!(path = %self.path.display(), "Abandoned staged upload removed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Bytes;
    use tempfile::TempDir;

    fn doc(name: &str, data: &'static [u8]) -> UploadedDocument {
        UploadedDocument::new(Some(name.to_string()), Bytes::from_static(data)).unwrap()
    }

    fn entries(dir: &Path) -> usize {
        std::fs::read_dir(dir).unwrap().count()
    }

    #[tokio::test]
    async fn test_stage_and_remove() {
        let temp_dir = TempDir::new().unwrap();
        let staging = StagingArea::new(temp_dir.path().join("uploads")).unwrap();

        let staged = staging.stage(&doc("scan.png", b"png bytes")).await.unwrap();
        assert!(staged.path().starts_with(staging.dir()));
        assert!(staged.path().to_string_lossy().ends_with("_scan.png"));
        assert_eq!(std::fs::read(staged.path()).unwrap(), b"png bytes");

        staged.remove().await;
        assert_eq!(entries(staging.dir()), 0);
    }

    #[tokio::test]
    async fn test_same_name_does_not_collide() {
        let temp_dir = TempDir::new().unwrap();
        let staging = StagingArea::new(temp_dir.path()).unwrap();

        let first = staging.stage(&doc("scan.png", b"first")).await.unwrap();
        let second = staging.stage(&doc("scan.png", b"second")).await.unwrap();

        assert_ne!(first.path(), second.path());
        assert_eq!(entries(staging.dir()), 2);

        first.remove().await;
        second.remove().await;
        assert_eq!(entries(staging.dir()), 0);
    }

    #[tokio::test]
    async fn test_long_name_fits_file_system_limit() {
        let temp_dir = TempDir::new().unwrap();
        let staging = StagingArea::new(temp_dir.path()).unwrap();

        let name = format!("{}.jpeg", "x".repeat(235));
        let staged = staging.stage(&doc(&name, b"jpeg")).await.unwrap();

        let staged_name = staged.path().file_name().unwrap().to_string_lossy().into_owned();
        assert!(staged_name.len() <= 255, "{}", staged_name.len());
        assert!(staged_name.ends_with(".jpeg"));
        assert_eq!(std::fs::read(staged.path()).unwrap(), b"jpeg");

        staged.remove().await;
    }

    #[tokio::test]
    async fn test_drop_removes_file() {
        let temp_dir = TempDir::new().unwrap();
        let staging = StagingArea::new(temp_dir.path()).unwrap();

        let staged = staging.stage(&doc("scan.pdf", b"%PDF")).await.unwrap();
        let path = staged.path().to_path_buf();
        drop(staged);

        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_remove_missing_file_is_not_fatal() {
        let temp_dir = TempDir::new().unwrap();
        let staging = StagingArea::new(temp_dir.path()).unwrap();

        let staged = staging.stage(&doc("scan.gif", b"gif")).await.unwrap();
        std::fs::remove_file(staged.path()).unwrap();

        // Logged, not panicking
        staged.remove().await;
    }
}
