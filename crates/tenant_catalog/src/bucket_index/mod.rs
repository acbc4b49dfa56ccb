//! Per-tenant bucket index: a gzip-compressed JSON document summarizing the
//! blocks a tenant has in object storage, so readers don't have to list the
//! tenant's directory on every poll.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub mod codec;
pub mod storage;

pub use storage::{BucketIndexError, BucketIndexStore};

/// Name of the uncompressed document. Used as the gzip container name.
pub const INDEX_FILENAME: &str = "bucket-index.json";

/// Name of the stored object under the tenant directory.
pub const INDEX_COMPRESSED_FILENAME: &str = "bucket-index.json.gz";

pub const INDEX_VERSION_1: i32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Index {
    pub version: i32,

    /// Blocks known to the index, in the order the writer produced them.
    #[serde(default)]
    pub blocks: Vec<Block>,

    /// Blocks marked for deletion that are still present in storage.
    #[serde(default)]
    pub block_deletion_marks: Vec<BlockDeletionMark>,

    /// Unix timestamp (seconds) of when the index was last updated.
    pub updated_at: i64,
}

impl Default for Index {
    fn default() -> Self {
        Self {
            version: INDEX_VERSION_1,
            blocks: Vec::new(),
            block_deletion_marks: Vec::new(),
            updated_at: 0,
        }
    }
}

impl Index {
    pub fn updated_at_time(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.updated_at, 0)
    }

    pub fn block_ids(&self) -> impl Iterator<Item = &str> {
        self.blocks.iter().map(|b| b.id.as_str())
    }

    /// Whether a block carries a deletion mark in this index.
    pub fn is_marked_for_deletion(&self, block_id: &str) -> bool {
        self.block_deletion_marks.iter().any(|m| m.id == block_id)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    #[serde(rename = "block_id")]
    pub id: String,

    /// Time range covered by the block, in milliseconds.
    pub min_time: i64,
    pub max_time: i64,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub segments_format: String,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub segments_num: i32,

    /// Unix timestamp (seconds) of when the block was uploaded.
    pub uploaded_at: i64,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub source: String,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub compaction_level: i32,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub out_of_order: bool,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub compactor_shard_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockDeletionMark {
    #[serde(rename = "block_id")]
    pub id: String,

    /// Unix timestamp (seconds) of when the block was marked for deletion.
    pub deletion_time: i64,
}

fn is_zero(v: &i32) -> bool {
    *v == 0
}

/// An index together with the storage-reported last modification time of
/// the object it was read from. The timestamp is the token handed back to
/// [`BucketIndexStore::read_new_index`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexWithLastModified {
    pub index: Index,
    pub last_modified: DateTime<Utc>,
}
