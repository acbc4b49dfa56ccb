use std::sync::Arc;

use anyhow::{Context, Result};
use blob_store::{BlobStore, ObjectBlobStore};
use chrono::Utc;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::{
    bucket_index::BucketIndexStore,
    config::TenantCatalogConfig,
    deletion_mark::{BucketDeletionMarks, TenantDeletionMark},
    tenant::{MultiResolver, Resolver, StarResolver},
    users_scanner::{OwnershipPredicate, UsersScanner},
};

/// Tenant catalog components wired from configuration.
pub struct TenantCatalog {
    pub config: TenantCatalogConfig,
    pub blob_store: Arc<dyn BlobStore>,
    pub bucket_index: BucketIndexStore,
    pub deletion_marks: BucketDeletionMarks,
    pub users_scanner: Arc<UsersScanner>,
    pub resolver: Arc<dyn Resolver>,
    star_resolver: Option<Arc<StarResolver>>,
}

impl TenantCatalog {
    /// Build the catalog on top of the configured blob store. When an admin
    /// tenant is configured the resolver's population refresh starts right
    /// away and is stopped by [`Self::shutdown`] or by cancelling `cancel`.
    pub fn new(
        config: TenantCatalogConfig,
        is_owned: OwnershipPredicate,
        cancel: &CancellationToken,
    ) -> Result<Self> {
        config.validate()?;
        let blob_store: Arc<dyn BlobStore> = Arc::new(
            ObjectBlobStore::new(&config.blob_storage).context("create blob store")?,
        );
        Self::with_blob_store(config, blob_store, is_owned, cancel)
    }

    pub fn with_blob_store(
        config: TenantCatalogConfig,
        blob_store: Arc<dyn BlobStore>,
        is_owned: OwnershipPredicate,
        cancel: &CancellationToken,
    ) -> Result<Self> {
        let users_scanner = Arc::new(
            UsersScanner::new(blob_store.clone(), is_owned)
                .with_tenant_index(config.use_tenant_index),
        );

        let star_resolver = match &config.admin_tenant {
            Some(admin_tenant) => {
                let resolver = StarResolver::new(
                    MultiResolver,
                    admin_tenant,
                    config.tenants_refresh_interval(),
                    users_scanner.clone(),
                    cancel,
                )
                .context("create admin tenant resolver")?;
                info!(
                    admin_tenant = %admin_tenant,
                    interval_secs = config.tenants_refresh_interval_secs,
                    "admin tenant resolution enabled"
                );
                Some(Arc::new(resolver))
            }
            None => None,
        };
        let resolver: Arc<dyn Resolver> = match &star_resolver {
            Some(star_resolver) => star_resolver.clone(),
            None => Arc::new(MultiResolver),
        };

        Ok(Self {
            bucket_index: BucketIndexStore::new(blob_store.clone()),
            deletion_marks: BucketDeletionMarks::new(blob_store.clone()),
            config,
            blob_store,
            users_scanner,
            resolver,
            star_resolver,
        })
    }

    /// Remove a tenant's bucket index and mark the tenant for deletion.
    pub async fn mark_tenant_for_deletion(&self, tenant: &str) -> Result<()> {
        self.bucket_index
            .delete_index(tenant)
            .await
            .with_context(|| format!("delete bucket index of tenant {}", tenant))?;
        self.deletion_marks
            .write(tenant, &TenantDeletionMark::new(Utc::now()))
            .await?;
        info!(tenant = %tenant, "tenant marked for deletion");
        Ok(())
    }

    pub async fn shutdown(&self) {
        if let Some(star_resolver) = &self.star_resolver {
            star_resolver.shutdown().await;
        }
    }
}
