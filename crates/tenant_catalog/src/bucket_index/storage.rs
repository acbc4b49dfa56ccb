use std::sync::Arc;

use blob_store::{BlobError, BlobStore, TenantBlobStore};
use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use super::{codec, Index, IndexWithLastModified, INDEX_COMPRESSED_FILENAME};
use crate::tenant::validate_tenant_path;

#[derive(Debug, thiserror::Error)]
pub enum BucketIndexError {
    #[error("bucket index not found")]
    NotFound,

    #[error("bucket index corrupted")]
    Corrupted,

    #[error("invalid tenant '{tenant}'")]
    InvalidTenant { tenant: String },

    /// The stored index has not changed since the caller's copy. Not a
    /// failure: the caller keeps using what it has.
    #[error("bucket index not modified")]
    NotModified,

    #[error("{op}: {source}")]
    Backend {
        op: &'static str,
        #[source]
        source: BlobError,
    },

    #[error("encode bucket index: {source}")]
    Encode { source: anyhow::Error },
}

impl BucketIndexError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound)
    }

    pub fn is_not_modified(&self) -> bool {
        matches!(self, Self::NotModified)
    }

    fn backend(op: &'static str, source: BlobError) -> Self {
        if source.is_not_found() {
            return Self::NotFound;
        }
        Self::Backend { op, source }
    }
}

/// Reads and writes the per-tenant bucket index.
///
/// Every operation is a single request sequence against the blob store and
/// keeps no state between calls.
#[derive(Clone)]
pub struct BucketIndexStore {
    bucket: Arc<dyn BlobStore>,
}

impl BucketIndexStore {
    pub fn new(bucket: Arc<dyn BlobStore>) -> Self {
        Self { bucket }
    }

    fn tenant_bucket(&self, tenant: &str) -> Result<TenantBlobStore, BucketIndexError> {
        validate_tenant_path(tenant).map_err(|_| BucketIndexError::InvalidTenant {
            tenant: tenant.to_string(),
        })?;
        Ok(TenantBlobStore::new(self.bucket.clone(), tenant))
    }

    /// Read, decompress and parse the tenant's bucket index.
    pub async fn read_index(&self, tenant: &str) -> Result<Index, BucketIndexError> {
        read_index(&self.tenant_bucket(tenant)?).await
    }

    /// Like [`Self::read_index`], also returning the object's last
    /// modification time.
    pub async fn read_last_modified_index(
        &self,
        tenant: &str,
    ) -> Result<IndexWithLastModified, BucketIndexError> {
        let bucket = self.tenant_bucket(tenant)?;
        let last_modified = last_modified(&bucket).await?;
        let index = read_index(&bucket).await?;
        Ok(IndexWithLastModified {
            index,
            last_modified,
        })
    }

    /// Read the index only if it was modified strictly after `since`.
    ///
    /// Only the object attributes are fetched when the index is unchanged;
    /// in that case [`BucketIndexError::NotModified`] is returned.
    pub async fn read_new_index(
        &self,
        tenant: &str,
        since: DateTime<Utc>,
    ) -> Result<IndexWithLastModified, BucketIndexError> {
        let bucket = self.tenant_bucket(tenant)?;
        let last_modified = last_modified(&bucket).await?;
        if last_modified <= since {
            debug!(tenant = %tenant, %last_modified, "bucket index not modified");
            return Err(BucketIndexError::NotModified);
        }
        let index = read_index(&bucket).await?;
        Ok(IndexWithLastModified {
            index,
            last_modified,
        })
    }

    /// Encode, compress and upload the index, replacing the previous one.
    pub async fn write_index(&self, tenant: &str, index: &Index) -> Result<(), BucketIndexError> {
        let content = codec::encode(index).map_err(|source| BucketIndexError::Encode { source })?;
        self.tenant_bucket(tenant)?
            .upload(INDEX_COMPRESSED_FILENAME, content)
            .await
            .map_err(|source| BucketIndexError::Backend {
                op: "upload bucket index",
                source,
            })
    }

    /// Delete the tenant's bucket index. Deleting a missing index succeeds.
    pub async fn delete_index(&self, tenant: &str) -> Result<(), BucketIndexError> {
        match self
            .tenant_bucket(tenant)?
            .delete(INDEX_COMPRESSED_FILENAME)
            .await
        {
            Ok(()) => Ok(()),
            Err(err) if err.is_not_found() => Ok(()),
            Err(source) => Err(BucketIndexError::Backend {
                op: "delete bucket index",
                source,
            }),
        }
    }
}

async fn last_modified(bucket: &TenantBlobStore) -> Result<DateTime<Utc>, BucketIndexError> {
    bucket
        .attributes(INDEX_COMPRESSED_FILENAME)
        .await
        .map(|attrs| attrs.last_modified)
        .map_err(|e| BucketIndexError::backend("attribute bucket index", e))
}

async fn read_index(bucket: &TenantBlobStore) -> Result<Index, BucketIndexError> {
    let content = bucket
        .get(INDEX_COMPRESSED_FILENAME)
        .await
        .map_err(|e| BucketIndexError::backend("read bucket index", e))?;

    codec::decode(&content).map_err(|err| {
        warn!(tenant = %bucket.tenant(), error = %err, "unable to decode bucket index");
        BucketIndexError::Corrupted
    })
}
