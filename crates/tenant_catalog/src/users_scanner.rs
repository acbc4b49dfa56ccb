use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use blob_store::BlobStore;
use tracing::{debug, warn};

use crate::{
    deletion_mark::{BucketDeletionMarks, DeletionMarkChecker},
    tenant::TenantsFetcher,
};

/// Precomputed list of tenants, stored at the bucket root.
pub const TENANT_INDEX_PATH: &str = "tenant.index.json";

/// Decides whether this instance is responsible for a tenant.
pub type OwnershipPredicate = Arc<dyn Fn(&str) -> Result<bool> + Send + Sync>;

/// Ownership predicate owning every tenant. Used when sharding is disabled.
pub fn all_users() -> OwnershipPredicate {
    Arc::new(|_: &str| -> Result<bool> { Ok(true) })
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanResult {
    /// Owned tenants that are not marked for deletion.
    pub active: Vec<String>,
    /// Owned tenants carrying a deletion mark.
    pub marked_for_deletion: Vec<String>,
}

/// Discovers the tenants stored in a bucket.
pub struct UsersScanner {
    bucket: Arc<dyn BlobStore>,
    is_owned: OwnershipPredicate,
    deletion_marks: Arc<dyn DeletionMarkChecker>,
    use_index: bool,
}

impl UsersScanner {
    pub fn new(bucket: Arc<dyn BlobStore>, is_owned: OwnershipPredicate) -> Self {
        let deletion_marks = Arc::new(BucketDeletionMarks::new(bucket.clone()));
        Self {
            bucket,
            is_owned,
            deletion_marks,
            use_index: false,
        }
    }

    pub fn with_deletion_marks(mut self, deletion_marks: Arc<dyn DeletionMarkChecker>) -> Self {
        self.deletion_marks = deletion_marks;
        self
    }

    /// Discovery mode used when the scanner serves as a [`TenantsFetcher`].
    pub fn with_tenant_index(mut self, use_index: bool) -> Self {
        self.use_index = use_index;
        self
    }

    /// Return the owned tenants found in storage, split into active ones and
    /// ones marked for deletion.
    ///
    /// With `use_index` the tenant list is read from [`TENANT_INDEX_PATH`],
    /// otherwise the bucket root is listed. Ownership and deletion marks are
    /// checked only once the whole list is known.
    ///
    /// Both checks fail open: if either one errors, the tenant is logged and
    /// reported as active.
    pub async fn scan_users(&self, use_index: bool) -> Result<ScanResult> {
        let users = if use_index {
            self.scan_users_indexed().await?
        } else {
            self.scan_users_listing().await?
        };

        let mut result = ScanResult::default();
        for user in users {
            match (self.is_owned)(&user) {
                Ok(false) => continue,
                Ok(true) => {}
                Err(err) => {
                    warn!(
                        user = %user,
                        error = %err,
                        "unable to check if user is owned by this shard"
                    );
                }
            }

            match self.deletion_marks.is_marked_for_deletion(&user).await {
                Ok(true) => result.marked_for_deletion.push(user),
                Ok(false) => result.active.push(user),
                Err(err) => {
                    warn!(
                        user = %user,
                        error = %err,
                        "unable to check if user is marked for deletion"
                    );
                    result.active.push(user);
                }
            }
        }

        debug!(
            active = result.active.len(),
            marked_for_deletion = result.marked_for_deletion.len(),
            "scanned users"
        );
        Ok(result)
    }

    async fn scan_users_listing(&self) -> Result<Vec<String>> {
        let entries = self.bucket.iter("").await.context("list users")?;
        Ok(entries
            .into_iter()
            .filter_map(|entry| entry.strip_suffix('/').map(str::to_string))
            .collect())
    }

    async fn scan_users_indexed(&self) -> Result<Vec<String>> {
        let content = self
            .bucket
            .get(TENANT_INDEX_PATH)
            .await
            .context("read tenant index")?;
        serde_json::from_slice(&content).context("parse tenant index")
    }
}

#[async_trait]
impl TenantsFetcher for UsersScanner {
    async fn fetch_all_tenants(&self) -> Result<Vec<String>> {
        Ok(self.scan_users(self.use_index).await?.active)
    }
}
