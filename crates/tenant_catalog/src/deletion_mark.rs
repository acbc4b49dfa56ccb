//! Tenant deletion marks.
//!
//! A tenant scheduled for removal has a small JSON document stored at
//! [`TENANT_DELETION_MARK_PATH`] under its directory. Its presence, not its
//! content, is what marks the tenant.

use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use blob_store::{BlobStore, TenantBlobStore};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::tenant::validate_tenant_path;

/// Path of the deletion mark relative to the tenant directory.
pub const TENANT_DELETION_MARK_PATH: &str = "markers/tenant-deletion-mark.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantDeletionMark {
    /// Unix timestamp (seconds) of when the tenant was marked for deletion.
    pub deletion_time: i64,

    /// Unix timestamp (seconds) of when all of the tenant's blocks were
    /// removed. Zero while the cleanup is in progress.
    #[serde(default, skip_serializing_if = "is_zero")]
    pub finished_time: i64,
}

fn is_zero(v: &i64) -> bool {
    *v == 0
}

impl TenantDeletionMark {
    pub fn new(deletion_time: DateTime<Utc>) -> Self {
        Self {
            deletion_time: deletion_time.timestamp(),
            finished_time: 0,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.finished_time != 0
    }
}

/// Decides whether a tenant is scheduled for removal.
#[async_trait]
pub trait DeletionMarkChecker: Send + Sync {
    async fn is_marked_for_deletion(&self, tenant: &str) -> Result<bool>;
}

/// Deletion marks stored in the tenant's own directory of a blob store.
#[derive(Clone)]
pub struct BucketDeletionMarks {
    bucket: Arc<dyn BlobStore>,
}

impl BucketDeletionMarks {
    pub fn new(bucket: Arc<dyn BlobStore>) -> Self {
        Self { bucket }
    }

    fn tenant_bucket(&self, tenant: &str) -> Result<TenantBlobStore> {
        validate_tenant_path(tenant).with_context(|| format!("tenant '{}'", tenant))?;
        Ok(TenantBlobStore::new(self.bucket.clone(), tenant))
    }

    pub async fn write(&self, tenant: &str, mark: &TenantDeletionMark) -> Result<()> {
        let content = serde_json::to_vec(mark).context("serialize tenant deletion mark")?;
        self.tenant_bucket(tenant)?
            .upload(TENANT_DELETION_MARK_PATH, Bytes::from(content))
            .await
            .context("upload tenant deletion mark")?;
        Ok(())
    }

    /// Read the tenant's deletion mark, `None` if the tenant isn't marked.
    pub async fn read(&self, tenant: &str) -> Result<Option<TenantDeletionMark>> {
        let content = match self.tenant_bucket(tenant)?.get(TENANT_DELETION_MARK_PATH).await {
            Ok(content) => content,
            Err(err) if err.is_not_found() => return Ok(None),
            Err(err) => return Err(err).context("read tenant deletion mark"),
        };
        let mark = serde_json::from_slice(&content).context("parse tenant deletion mark")?;
        Ok(Some(mark))
    }

    pub async fn exists(&self, tenant: &str) -> Result<bool> {
        self.tenant_bucket(tenant)?
            .exists(TENANT_DELETION_MARK_PATH)
            .await
            .context("check tenant deletion mark")
    }
}

#[async_trait]
impl DeletionMarkChecker for BucketDeletionMarks {
    async fn is_marked_for_deletion(&self, tenant: &str) -> Result<bool> {
        self.exists(tenant).await
    }
}
