//! Tenant catalog for a multi-tenant block storage layer.
//!
//! - [`bucket_index`]: per-tenant gzip JSON index of stored blocks
//! - [`users_scanner`]: tenant discovery with ownership and deletion marks
//! - [`tenant`]: tenant identity resolution from request context, including
//!   an admin tenant expanded to every known tenant
//! - [`service`]: the above wired together from [`config`]

pub mod bucket_index;
pub mod config;
pub mod deletion_mark;
pub mod service;
pub mod tenant;
pub mod tracing;
pub mod users_scanner;

#[cfg(test)]
mod testing;

pub use bucket_index::{BucketIndexError, BucketIndexStore, Index};
pub use config::TenantCatalogConfig;
pub use service::TenantCatalog;
pub use tenant::{RequestContext, Resolver, TenantError};
pub use users_scanner::{ScanResult, UsersScanner};
