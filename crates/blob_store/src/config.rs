use std::{env, path::PathBuf};

use serde::{Deserialize, Serialize};

/// Directory, relative to the working directory, used when no storage URL
/// is configured.
const LOCAL_BLOBS_DIR: &str = "tenant_catalog/blobs";

/// Where tenant data lives. `path` is an object store URL such as
/// `s3://bucket/prefix`, `file:///var/lib/blocks` or `memory:///`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlobStorageConfig {
    #[serde(default = "default_blob_store_path")]
    pub path: String,
}

impl BlobStorageConfig {
    pub fn new(path: &str) -> Self {
        Self {
            path: path.to_string(),
        }
    }
}

impl Default for BlobStorageConfig {
    fn default() -> Self {
        Self::new(&default_blob_store_path())
    }
}

/// `file://` URL of [`LOCAL_BLOBS_DIR`] under the current directory.
pub fn default_blob_store_path() -> String {
    let dir = env::current_dir()
        .unwrap_or_else(|_| PathBuf::from("."))
        .join(LOCAL_BLOBS_DIR);
    format!("file://{}", dir.display())
}
