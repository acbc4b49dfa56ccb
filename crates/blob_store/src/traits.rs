//! Core blob store trait.

use async_trait::async_trait;
use bytes::Bytes;

use crate::{BlobAttributes, BlobResult};

/// Object storage capability consumed by the tenant catalog.
///
/// Paths are `/`-separated keys relative to the store's root. Every
/// operation returns `BlobError::NotFound` when the addressed object does
/// not exist, which callers check through [`BlobError::is_not_found`].
///
/// [`BlobError::is_not_found`]: crate::BlobError::is_not_found
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Get the entire object.
    async fn get(&self, path: &str) -> BlobResult<Bytes>;

    /// Replace the object at `path` in a single write. Readers observe
    /// either the previous content or the new one.
    async fn upload(&self, path: &str, data: Bytes) -> BlobResult<()>;

    /// Delete the object. Backends may report `NotFound` for an absent
    /// object or treat it as success.
    async fn delete(&self, path: &str) -> BlobResult<()>;

    /// Get object attributes without downloading content.
    async fn attributes(&self, path: &str) -> BlobResult<BlobAttributes>;

    /// List the direct children of `prefix`.
    ///
    /// Objects are returned by their full path, "directories" by their full
    /// path with a trailing `/`. An empty prefix lists the store root.
    async fn iter(&self, prefix: &str) -> BlobResult<Vec<String>>;

    /// Check whether an object exists.
    async fn exists(&self, path: &str) -> BlobResult<bool> {
        match self.attributes(path).await {
            Ok(_) => Ok(true),
            Err(err) if err.is_not_found() => Ok(false),
            Err(err) => Err(err),
        }
    }
}
