//! Tenant-scoped view over a [`BlobStore`].

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;

use crate::{BlobAttributes, BlobResult, BlobStore};

/// Blob store view rooted at `<tenant>/`.
///
/// Paths given to this store are relative to the tenant directory and paths
/// returned by [`BlobStore::iter`] are relative to it as well.
#[derive(Clone)]
pub struct TenantBlobStore {
    inner: Arc<dyn BlobStore>,
    tenant: String,
}

impl TenantBlobStore {
    pub fn new(inner: Arc<dyn BlobStore>, tenant: &str) -> Self {
        Self {
            inner,
            tenant: tenant.to_string(),
        }
    }

    pub fn tenant(&self) -> &str {
        &self.tenant
    }

    fn full_path(&self, path: &str) -> String {
        format!("{}/{}", self.tenant, path.trim_start_matches('/'))
    }
}

#[async_trait]
impl BlobStore for TenantBlobStore {
    async fn get(&self, path: &str) -> BlobResult<Bytes> {
        self.inner.get(&self.full_path(path)).await
    }

    async fn upload(&self, path: &str, data: Bytes) -> BlobResult<()> {
        self.inner.upload(&self.full_path(path), data).await
    }

    async fn delete(&self, path: &str) -> BlobResult<()> {
        self.inner.delete(&self.full_path(path)).await
    }

    async fn attributes(&self, path: &str) -> BlobResult<BlobAttributes> {
        self.inner.attributes(&self.full_path(path)).await
    }

    async fn iter(&self, prefix: &str) -> BlobResult<Vec<String>> {
        let tenant_prefix = format!("{}/", self.tenant);
        let entries = self.inner.iter(&self.full_path(prefix)).await?;
        Ok(entries
            .into_iter()
            .map(|entry| {
                entry
                    .strip_prefix(&tenant_prefix)
                    .map(str::to_string)
                    .unwrap_or(entry)
            })
            .collect())
    }

    async fn exists(&self, path: &str) -> BlobResult<bool> {
        self.inner.exists(&self.full_path(path)).await
    }
}
