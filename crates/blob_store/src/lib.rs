//! Object storage abstraction for the tenant catalog.
//!
//! The crate provides the [`BlobStore`] capability the catalog is written
//! against (get, upload, delete, attributes, iter, exists) together with:
//!
//! - [`ObjectBlobStore`], an implementation on top of `object_store`
//!   supporting `file://`, `s3://` and `memory://` URLs
//! - [`TenantBlobStore`], a view rooted at a single tenant's directory
//! - operation metrics reported through OpenTelemetry
//!
//! # Usage
//!
//! ```rust,no_run
//! use blob_store::{BlobStorageConfig, BlobStore, ObjectBlobStore};
//!
//! # async fn example() -> Result<(), blob_store::BlobError> {
//! let config = BlobStorageConfig::new("s3://my-bucket/tsdb");
//! let store = ObjectBlobStore::new(&config)?;
//!
//! let tenants = store.iter("").await?;
//! match store.get("tenant.index.json").await {
//!     Ok(data) => println!("{} bytes, {} entries", data.len(), tenants.len()),
//!     Err(err) if err.is_not_found() => println!("no tenant index"),
//!     Err(err) => return Err(err),
//! }
//! # Ok(())
//! # }
//! ```

mod config;
mod error;
mod metadata;
mod metrics;
mod prefixed;
mod storage;
mod traits;

pub use config::{default_blob_store_path, BlobStorageConfig};
pub use error::{BlobError, BlobResult};
pub use metadata::BlobAttributes;
pub use metrics::{BlobMetrics, Timer};
pub use prefixed::TenantBlobStore;
pub use storage::ObjectBlobStore;
pub use traits::BlobStore;
