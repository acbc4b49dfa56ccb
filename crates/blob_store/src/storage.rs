//! `object_store` backed implementation of [`BlobStore`].

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use object_store::{memory::InMemory, parse_url, path::Path, ObjectStore, PutPayload};
use percent_encoding::percent_decode_str;
use url::Url;

use crate::{BlobAttributes, BlobMetrics, BlobResult, BlobStorageConfig, BlobStore};

/// Blob store backed by any [`ObjectStore`] (local filesystem, S3, memory).
///
/// All paths handed to the [`BlobStore`] methods are resolved relative to
/// the root path of the configured URL.
#[derive(Clone)]
pub struct ObjectBlobStore {
    object_store: Arc<dyn ObjectStore>,

    /// Root path every relative key is resolved against.
    root: Path,

    metrics: BlobMetrics,
}

impl ObjectBlobStore {
    /// Create a new blob store from configuration.
    pub fn new(config: &BlobStorageConfig) -> BlobResult<Self> {
        let url = config.path.parse::<Url>()?;
        let (object_store, root) = parse_url(&url)?;
        tracing::debug!("using blob store path: {}", config.path);
        Ok(Self::from_object_store(Arc::from(object_store), root))
    }

    /// Create a store that keeps everything in process memory.
    pub fn in_memory() -> Self {
        Self::from_object_store(Arc::new(InMemory::new()), Path::default())
    }

    /// Wrap an already constructed object store.
    pub fn from_object_store(object_store: Arc<dyn ObjectStore>, root: Path) -> Self {
        Self {
            object_store,
            root,
            metrics: BlobMetrics::global(),
        }
    }

    fn location(&self, path: &str) -> Path {
        path.split('/')
            .filter(|part| !part.is_empty())
            .fold(self.root.clone(), |location, part| location.child(part))
    }

    /// Inverse of [`Self::location`]. `Path::child` percent-encodes
    /// characters such as `*`, `#` and `%`, so listed parts are decoded
    /// back to the key the caller wrote.
    fn relative(&self, location: &Path) -> String {
        let parts: Vec<_> = match location.prefix_match(&self.root) {
            Some(parts) => parts.collect(),
            None => location.parts().collect(),
        };
        parts
            .iter()
            .map(|part| percent_decode_str(part.as_ref()).decode_utf8_lossy())
            .collect::<Vec<_>>()
            .join("/")
    }

    fn observe<T>(&self, op: &'static str, result: BlobResult<T>) -> BlobResult<T> {
        if let Err(err) = &result {
            self.metrics.record_error(op, err);
        }
        result
    }
}

#[async_trait]
impl BlobStore for ObjectBlobStore {
    async fn get(&self, path: &str) -> BlobResult<Bytes> {
        let _timer = self.metrics.timer("get");
        let location = self.location(path);
        let result: BlobResult<Bytes> = async {
            let data = self.object_store.get(&location).await?.bytes().await?;
            Ok(data)
        }
        .await;
        self.observe("get", result)
    }

    async fn upload(&self, path: &str, data: Bytes) -> BlobResult<()> {
        let _timer = self.metrics.timer("upload");
        let location = self.location(path);
        let result = self
            .object_store
            .put(&location, PutPayload::from(data))
            .await
            .map(|_| ())
            .map_err(Into::into);
        self.observe("upload", result)
    }

    async fn delete(&self, path: &str) -> BlobResult<()> {
        let _timer = self.metrics.timer("delete");
        let location = self.location(path);
        let result = self.object_store.delete(&location).await.map_err(Into::into);
        self.observe("delete", result)
    }

    async fn attributes(&self, path: &str) -> BlobResult<BlobAttributes> {
        let _timer = self.metrics.timer("attributes");
        let location = self.location(path);
        let result = self
            .object_store
            .head(&location)
            .await
            .map(BlobAttributes::from)
            .map_err(Into::into);
        self.observe("attributes", result)
    }

    async fn iter(&self, prefix: &str) -> BlobResult<Vec<String>> {
        let _timer = self.metrics.timer("iter");
        let location = self.location(prefix);
        let result: BlobResult<Vec<String>> = async {
            let listing = self.object_store.list_with_delimiter(Some(&location)).await?;
            let mut entries: Vec<String> = listing
                .common_prefixes
                .iter()
                .map(|dir| format!("{}/", self.relative(dir)))
                .chain(
                    listing
                        .objects
                        .iter()
                        .map(|object| self.relative(&object.location)),
                )
                .collect();
            entries.sort();
            Ok(entries)
        }
        .await;
        self.observe("iter", result)
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[tokio::test]
    async fn test_upload_and_get() {
        let store = ObjectBlobStore::in_memory();
        store
            .upload("tenant-1/data.json", Bytes::from_static(b"hello world"))
            .await
            .unwrap();

        let retrieved = store.get("tenant-1/data.json").await.unwrap();
        assert_eq!(retrieved.as_ref(), b"hello world");
    }

    #[tokio::test]
    async fn test_not_found() {
        let store = ObjectBlobStore::in_memory();

        let result = store.get("missing/file.json").await;
        assert!(result.unwrap_err().is_not_found());

        let result = store.attributes("missing/file.json").await;
        assert!(result.unwrap_err().is_not_found());

        assert!(!store.exists("missing/file.json").await.unwrap());
    }

    #[tokio::test]
    async fn test_attributes() {
        let store = ObjectBlobStore::in_memory();
        store
            .upload("tenant-1/data.json", Bytes::from_static(b"hello"))
            .await
            .unwrap();

        let attrs = store.attributes("tenant-1/data.json").await.unwrap();
        assert_eq!(attrs.size_bytes, 5);
        assert!(store.exists("tenant-1/data.json").await.unwrap());
    }

    #[tokio::test]
    async fn test_iter_lists_direct_children() {
        let store = ObjectBlobStore::in_memory();
        for path in [
            "tenant-2/bucket-index.json.gz",
            "tenant-1/bucket-index.json.gz",
            "tenant-1/markers/tenant-deletion-mark.json",
            "tenant.index.json",
        ] {
            store.upload(path, Bytes::from_static(b"{}")).await.unwrap();
        }

        let root = store.iter("").await.unwrap();
        assert_eq!(root, vec!["tenant-1/", "tenant-2/", "tenant.index.json"]);

        let tenant = store.iter("tenant-1").await.unwrap();
        assert_eq!(
            tenant,
            vec!["tenant-1/bucket-index.json.gz", "tenant-1/markers/"]
        );
    }

    #[tokio::test]
    async fn test_iter_returns_keys_as_written() {
        let temp_dir = TempDir::new().unwrap();
        let config = BlobStorageConfig::new(&format!("file://{}", temp_dir.path().display()));
        let local = ObjectBlobStore::new(&config).unwrap();

        for store in [ObjectBlobStore::in_memory(), local] {
            for tenant in ["t*2", "x#y", "a%b", "plain"] {
                store
                    .upload(&format!("{}/bucket-index.json.gz", tenant), Bytes::from_static(b"{}"))
                    .await
                    .unwrap();
            }

            let listed = store.iter("").await.unwrap();
            assert_eq!(listed, vec!["a%b/", "plain/", "t*2/", "x#y/"]);

            for entry in listed {
                let key = format!("{}bucket-index.json.gz", entry);
                assert_eq!(store.get(&key).await.unwrap().as_ref(), b"{}");
            }
            assert_eq!(
                store.iter("t*2").await.unwrap(),
                vec!["t*2/bucket-index.json.gz"]
            );
        }
    }

    #[tokio::test]
    async fn test_local_filesystem_roundtrip() {
        let temp_dir = TempDir::new().unwrap();
        let config = BlobStorageConfig::new(&format!("file://{}", temp_dir.path().display()));
        let store = ObjectBlobStore::new(&config).unwrap();

        store
            .upload("tenant-1/data.json", Bytes::from_static(b"payload"))
            .await
            .unwrap();
        assert_eq!(
            store.get("tenant-1/data.json").await.unwrap().as_ref(),
            b"payload"
        );
        assert!(temp_dir.path().join("tenant-1/data.json").exists());

        assert_eq!(store.iter("").await.unwrap(), vec!["tenant-1/"]);

        store.delete("tenant-1/data.json").await.unwrap();
        assert!(!store.exists("tenant-1/data.json").await.unwrap());
    }
}
