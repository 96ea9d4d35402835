//! Local-disk storage for uploaded files.
//!
//! Every blob is addressed by a path relative to the public root
//! (`uploads/photos/<uuid>_<name>`). Absolute paths never leave this module.

use std::io;
use std::path::{Component, Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};
use uuid::Uuid;

const FALLBACK_FILE_NAME: &str = "file";
const MAX_NAME_CHARS: usize = 100;

#[derive(Debug, Clone)]
pub struct BlobStore {
    root: PathBuf,
}

impl BlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Maps a stored relative path onto the filesystem. Rows written by older
    /// clients carry a leading `/`, which is ignored.
    pub fn resolve(&self, relative: &str) -> io::Result<PathBuf> {
        let relative = Path::new(relative.trim_start_matches('/'));
        let safe = relative.components().count() > 0
            && relative
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        if !safe {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("refusing to resolve blob path {:?}", relative),
            ));
        }
        Ok(self.root.join(relative))
    }

    /// Writes `data` under `folder` with a generated name and returns the
    /// relative path to record.
    pub async fn save(&self, folder: &str, original_name: &str, data: &[u8]) -> io::Result<String> {
        let relative = format!("{}/{}", folder.trim_matches('/'), generate_file_name(original_name));
        let full_path = self.resolve(&relative)?;
        debug!(blob_path = %relative, size = data.len(), "blob_store: write");

        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent).await?;
        }

        // write to a temp file then rename so readers never see a partial blob
        let temp_path = full_path.with_extension("part");
        let mut file = fs::File::create(&temp_path).await?;
        if let Err(e) = write_all_synced(&mut file, data).await {
            drop(file);
            let _ = fs::remove_file(&temp_path).await;
            return Err(e);
        }
        drop(file);
        publish(&temp_path, &full_path).await?;

        Ok(relative)
    }

    pub async fn exists(&self, relative: &str) -> io::Result<bool> {
        fs::try_exists(self.resolve(relative)?).await
    }

    /// Returns `false` when there was nothing to delete.
    pub async fn delete(&self, relative: &str) -> io::Result<bool> {
        let full_path = self.resolve(relative)?;
        match fs::remove_file(&full_path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Deletion for blobs whose rows are already gone; failures are logged.
    pub async fn discard(&self, relative: &str) {
        if let Err(e) = self.delete(relative).await {
            warn!(blob_path = %relative, error = %e, "blob_store: failed to remove orphaned blob");
        }
    }
}

/// Moves a finished temp file into place; the temp file never outlives a
/// failed rename.
async fn publish(temp_path: &Path, full_path: &Path) -> io::Result<()> {
    if let Err(e) = fs::rename(temp_path, full_path).await {
        let _ = fs::remove_file(temp_path).await;
        return Err(e);
    }
    Ok(())
}

async fn write_all_synced(file: &mut fs::File, data: &[u8]) -> io::Result<()> {
    file.write_all(data).await?;
    file.sync_all().await
}

/// Keeps only the final path component of an uploaded name and restricts it
/// to `[A-Za-z0-9._-]`.
pub fn sanitize_file_name(original: &str) -> String {
    let base = original
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default();

    let cleaned: String = base
        .chars()
        .map(|c| match c {
            'a'..='z' | 'A'..='Z' | '0'..='9' | '.' | '-' | '_' => c,
            _ => '_',
        })
        .take(MAX_NAME_CHARS)
        .collect();

    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() || cleaned.chars().all(|c| c == '_') {
        FALLBACK_FILE_NAME.to_string()
    } else {
        cleaned.to_string()
    }
}

pub fn generate_file_name(original: &str) -> String {
    format!("{}_{}", Uuid::new_v4(), sanitize_file_name(original))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn sanitize_strips_directories_and_odd_characters() {
        assert_eq!(sanitize_file_name("photo.png"), "photo.png");
        assert_eq!(sanitize_file_name("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_file_name("C:\\Users\\ana\\me at work.jpg"), "me_at_work.jpg");
        assert_eq!(sanitize_file_name(".."), FALLBACK_FILE_NAME);
        assert_eq!(sanitize_file_name(""), FALLBACK_FILE_NAME);
        assert_eq!(sanitize_file_name("файл"), FALLBACK_FILE_NAME);
    }

    #[test]
    fn generated_names_do_not_collide() {
        let a = generate_file_name("cv.pdf");
        let b = generate_file_name("cv.pdf");
        assert_ne!(a, b);
        assert!(a.ends_with("_cv.pdf"));
    }

    #[test]
    fn resolve_rejects_traversal() {
        let store = BlobStore::new("/srv/public");
        assert!(store.resolve("uploads/../../secret").is_err());
        assert!(store.resolve("").is_err());
        assert_eq!(
            store.resolve("/uploads/photos/a.png").unwrap(),
            PathBuf::from("/srv/public/uploads/photos/a.png")
        );
    }

    #[actix_web::test]
    async fn save_then_delete_round_trip() {
        let dir = TempDir::new().unwrap();
        let store = BlobStore::new(dir.path());

        let relative = store
            .save("uploads/photos", "ana.png", b"png-bytes")
            .await
            .unwrap();
        assert!(relative.starts_with("uploads/photos/"));
        assert!(store.exists(&relative).await.unwrap());
        assert_eq!(
            std::fs::read(dir.path().join(&relative)).unwrap(),
            b"png-bytes"
        );

        assert!(store.delete(&relative).await.unwrap());
        assert!(!store.exists(&relative).await.unwrap());
        assert!(!store.delete(&relative).await.unwrap());
    }

    #[cfg(unix)]
    #[actix_web::test]
    async fn failed_rename_leaves_no_temp_file() {
        let dir = TempDir::new().unwrap();
        let temp_path = dir.path().join("blob.part");
        let target = dir.path().join("blob.png");
        std::fs::write(&temp_path, b"data").unwrap();
        // a non-empty directory cannot be replaced by a file
        std::fs::create_dir(&target).unwrap();
        std::fs::write(target.join("keep"), b"x").unwrap();

        assert!(publish(&temp_path, &target).await.is_err());
        assert!(!temp_path.exists());
        assert!(target.join("keep").exists());
    }
}
