//! Local filesystem blob store rooted at the configured upload directory.
//!
//! All access goes through a `cap-std` directory handle, so keys cannot
//! reach outside the root even if validation were bypassed. Keys have the
//! shape `<uuid>-<sanitised file name>` and are served at `/uploads/<key>`.

use std::io::ErrorKind;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use cap_std::ambient_authority;
use cap_std::fs::Dir;
use uuid::Uuid;

use crate::domain::ports::{BlobStore, BlobStoreError, StoredBlob};

/// URL prefix under which stored blobs are served.
pub const UPLOADS_URL_PREFIX: &str = "/uploads/";

const KEY_MAX: usize = 255;
const NAME_MAX: usize = 120;

/// Blob store writing one file per blob into a single directory.
#[derive(Clone)]
pub struct LocalBlobStore {
    dir: Arc<Dir>,
}

impl LocalBlobStore {
    /// Open `root`, creating it when missing.
    ///
    /// # Errors
    ///
    /// Returns [`BlobStoreError::Unavailable`] when the directory cannot be
    /// created or opened.
    pub fn open(root: &Path) -> Result<Self, BlobStoreError> {
        let unavailable = |err: std::io::Error| {
            BlobStoreError::unavailable(format!("{}: {err}", root.display()))
        };
        Dir::create_ambient_dir_all(root, ambient_authority()).map_err(unavailable)?;
        let dir = Dir::open_ambient_dir(root, ambient_authority()).map_err(unavailable)?;
        Ok(Self { dir: Arc::new(dir) })
    }

    async fn blocking<T, F>(&self, op: F) -> Result<T, BlobStoreError>
    where
        T: Send + 'static,
        F: FnOnce(&Dir) -> Result<T, BlobStoreError> + Send + 'static,
    {
        let dir = Arc::clone(&self.dir);
        tokio::task::spawn_blocking(move || op(&dir))
            .await
            .map_err(|err| BlobStoreError::io(format!("blob task failed: {err}")))?
    }
}

/// Reduce a client file name to a safe key suffix.
///
/// Anything outside `[A-Za-z0-9._-]` becomes `_`, as does the second dot of
/// a `..` pair, so a sanitised name always passes key validation.
fn sanitise_file_name(file_name: &str) -> String {
    let mut cleaned = String::with_capacity(file_name.len().min(NAME_MAX));
    for c in file_name.chars().take(NAME_MAX) {
        let keep = c.is_ascii_alphanumeric()
            || matches!(c, '-' | '_')
            || (c == '.' && !cleaned.ends_with('.'));
        cleaned.push(if keep { c } else { '_' });
    }
    let trimmed = cleaned.trim_start_matches('.');
    if trimmed.is_empty() {
        "file".to_owned()
    } else {
        trimmed.to_owned()
    }
}

fn validate_key(key: &str) -> Result<&str, BlobStoreError> {
    let valid = !key.is_empty()
        && key.len() <= KEY_MAX
        && !key.contains(['/', '\\', '\0'])
        && !key.contains("..")
        && !key.starts_with('.');
    if valid {
        Ok(key)
    } else {
        Err(BlobStoreError::invalid_key(key))
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    async fn store(&self, file_name: &str, bytes: &[u8]) -> Result<StoredBlob, BlobStoreError> {
        let key = format!("{}-{}", Uuid::new_v4(), sanitise_file_name(file_name));
        let contents = bytes.to_vec();
        let path = key.clone();
        self.blocking(move |dir| {
            dir.write(&path, contents)
                .map_err(|err| BlobStoreError::io(format!("write {path}: {err}")))
        })
        .await?;
        Ok(StoredBlob {
            url: format!("{UPLOADS_URL_PREFIX}{key}"),
            key,
        })
    }

    async fn read(&self, key: &str) -> Result<Vec<u8>, BlobStoreError> {
        let key = validate_key(key)?.to_owned();
        self.blocking(move |dir| match dir.read(&key) {
            Ok(bytes) => Ok(bytes),
            Err(err) if err.kind() == ErrorKind::NotFound => Err(BlobStoreError::not_found(key)),
            Err(err) => Err(BlobStoreError::io(format!("read {key}: {err}"))),
        })
        .await
    }

    async fn remove(&self, key: &str) -> Result<(), BlobStoreError> {
        let key = validate_key(key)?.to_owned();
        self.blocking(move |dir| match dir.remove_file(&key) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(BlobStoreError::io(format!("remove {key}: {err}"))),
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use rstest::{fixture, rstest};
    use tempfile::TempDir;

    use super::*;

    #[fixture]
    fn root() -> TempDir {
        TempDir::new().expect("temp dir")
    }

    #[rstest]
    #[case("contrato.pdf", "contrato.pdf")]
    #[case("relatório final.docx", "relat_rio_final.docx")]
    #[case("../../etc/passwd", "__.__etc_passwd")]
    #[case("...", "_.")]
    #[case(".env", "env")]
    #[case("", "file")]
    fn file_names_are_sanitised(#[case] raw: &str, #[case] expected: &str) {
        assert_eq!(sanitise_file_name(raw), expected);
    }

    #[rstest]
    #[case("")]
    #[case("../secrets")]
    #[case("nested/key")]
    #[case(".hidden")]
    fn unsafe_keys_are_rejected(#[case] key: &str) {
        assert_eq!(validate_key(key), Err(BlobStoreError::invalid_key(key)));
    }

    #[rstest]
    #[tokio::test]
    async fn stored_blobs_can_be_read_and_removed(root: TempDir) {
        let store = LocalBlobStore::open(&root.path().join("uploads")).expect("open store");

        let blob = store.store("contrato.pdf", b"%PDF-1.7").await.expect("store");

        assert!(blob.key.ends_with("-contrato.pdf"));
        assert_eq!(blob.url, format!("/uploads/{}", blob.key));
        assert_eq!(store.read(&blob.key).await.expect("read"), b"%PDF-1.7");

        store.remove(&blob.key).await.expect("remove");
        assert_eq!(
            store.read(&blob.key).await,
            Err(BlobStoreError::not_found(blob.key.clone()))
        );
        store.remove(&blob.key).await.expect("removing twice is fine");
    }

    #[rstest]
    #[tokio::test]
    async fn keys_are_unique_per_upload(root: TempDir) {
        let store = LocalBlobStore::open(root.path()).expect("open store");

        let first = store.store("a.txt", b"one").await.expect("store");
        let second = store.store("a.txt", b"two").await.expect("store");

        assert_ne!(first.key, second.key);
        assert_eq!(store.read(&first.key).await.expect("read"), b"one");
    }

    #[rstest]
    #[tokio::test]
    async fn traversal_keys_never_touch_the_disk(root: TempDir) {
        let store = LocalBlobStore::open(root.path()).expect("open store");

        let err = store.read("../outside").await.expect_err("rejected");

        assert!(matches!(err, BlobStoreError::InvalidKey { .. }));
    }
}
