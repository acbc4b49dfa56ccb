use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use anyhow::{ensure, Result};
use arc_swap::ArcSwap;
use tokio::{task::JoinHandle, time::MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use super::{
    normalize_tenant_ids,
    MultiResolver,
    RequestContext,
    Resolver,
    TenantError,
    TenantsFetcher,
};

/// Resolver that expands an admin tenant into every known tenant.
///
/// The tenant population is kept in a snapshot refreshed by a background
/// task that starts with the resolver and runs until [`Self::shutdown`] is
/// called, the parent cancellation token is cancelled or the resolver is
/// dropped. Failed refreshes keep the previous snapshot. Until the first
/// successful refresh the admin tenant resolves to no tenants at all.
///
/// Everything except [`Resolver::tenant_ids`] for the admin tenant is
/// delegated to the base resolver.
pub struct StarResolver<R = MultiResolver> {
    base: R,
    admin_tenant: String,
    all_tenants: Arc<ArcSwap<Vec<String>>>,
    cancel: CancellationToken,
    refresher: Mutex<Option<JoinHandle<()>>>,
}

impl<R: Resolver> StarResolver<R> {
    /// Create the resolver and spawn its refresh task on the current tokio
    /// runtime. The first refresh happens immediately. `interval` must be
    /// positive.
    pub fn new(
        base: R,
        admin_tenant: &str,
        interval: Duration,
        fetcher: Arc<dyn TenantsFetcher>,
        parent: &CancellationToken,
    ) -> Result<Self> {
        ensure!(!interval.is_zero(), "tenants refresh interval must be positive");

        let all_tenants = Arc::new(ArcSwap::from_pointee(Vec::new()));
        let cancel = parent.child_token();
        let refresher = tokio::spawn(refresh_tenants(
            fetcher,
            all_tenants.clone(),
            interval,
            cancel.clone(),
        ));
        Ok(Self {
            base,
            admin_tenant: admin_tenant.to_string(),
            all_tenants,
            cancel,
            refresher: Mutex::new(Some(refresher)),
        })
    }

    /// Tenant population as of the last successful refresh.
    pub fn all_tenants(&self) -> Arc<Vec<String>> {
        self.all_tenants.load_full()
    }

    /// Stop the refresh task and wait for it to exit.
    pub async fn shutdown(&self) {
        self.cancel.cancel();
        let refresher = match self.refresher.lock() {
            Ok(mut refresher) => refresher.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        if let Some(refresher) = refresher {
            if let Err(err) = refresher.await {
                error!(error = %err, "tenant resolver refresh task failed");
            }
        }
    }
}

impl<R> Drop for StarResolver<R> {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

impl<R: Resolver> Resolver for StarResolver<R> {
    fn tenant_id(&self, ctx: &RequestContext) -> Result<String, TenantError> {
        self.base.tenant_id(ctx)
    }

    fn tenant_ids(&self, ctx: &RequestContext) -> Result<Vec<String>, TenantError> {
        let org_id = ctx.org_id()?;
        if org_id == self.admin_tenant {
            let tenants = self.all_tenants.load();
            debug!(tenants = tenants.len(), "admin tenant expanded to all tenants");
            return Ok(tenants.as_ref().clone());
        }
        self.base.tenant_ids(ctx)
    }
}

async fn refresh_tenants(
    fetcher: Arc<dyn TenantsFetcher>,
    all_tenants: Arc<ArcSwap<Vec<String>>>,
    interval: Duration,
    cancel: CancellationToken,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        let fetched = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            fetched = async {
                ticker.tick().await;
                fetcher.fetch_all_tenants().await
            } => fetched,
        };

        match fetched {
            Ok(tenants) => {
                info!(tenants = tenants.len(), "tenant resolver loaded tenants");
                all_tenants.store(Arc::new(normalize_tenant_ids(tenants)));
            }
            Err(err) => {
                error!(error = %err, "tenant resolver failed to load tenants");
            }
        }
    }

    info!("tenant resolver refresh stopped");
}
