//! Blob metadata structures.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Attributes of a stored object, available without transferring its body.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BlobAttributes {
    /// Size in bytes.
    pub size_bytes: u64,

    /// Last modification time as reported by the backend.
    pub last_modified: DateTime<Utc>,

    /// ETag from object store (S3/GCS/Azure).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,
}

impl From<object_store::ObjectMeta> for BlobAttributes {
    fn from(meta: object_store::ObjectMeta) -> Self {
        Self {
            size_bytes: meta.size,
            last_modified: meta.last_modified,
            etag: meta.e_tag,
        }
    }
}
