use std::{
    collections::{HashSet, VecDeque},
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
        Mutex,
    },
};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use blob_store::{BlobAttributes, BlobError, BlobResult, BlobStore, ObjectBlobStore};
use bytes::Bytes;
use tracing::subscriber;
use tracing_subscriber::{layer::SubscriberExt, Layer};

use crate::{deletion_mark::DeletionMarkChecker, tenant::TenantsFetcher};

pub fn init_test_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("debug"));
    let _ = subscriber::set_global_default(
        tracing_subscriber::registry().with(
            tracing_subscriber::fmt::layer()
                .with_test_writer()
                .with_filter(env_filter),
        ),
    );
}

/// In-memory bucket with a block index object for every given user.
pub async fn bucket_with_users(users: &[&str]) -> Arc<dyn BlobStore> {
    let bucket: Arc<dyn BlobStore> = Arc::new(ObjectBlobStore::in_memory());
    for user in users {
        bucket
            .upload(
                &format!("{}/bucket-index.json.gz", user),
                Bytes::from_static(b""),
            )
            .await
            .expect("upload test object");
    }
    bucket
}

/// Blob store whose every operation fails with a backend error.
pub struct FailingBlobStore;

fn unavailable() -> BlobError {
    BlobError::Other {
        source: anyhow!("storage unavailable"),
    }
}

#[async_trait]
impl BlobStore for FailingBlobStore {
    async fn get(&self, _path: &str) -> BlobResult<Bytes> {
        Err(unavailable())
    }

    async fn upload(&self, _path: &str, _data: Bytes) -> BlobResult<()> {
        Err(unavailable())
    }

    async fn delete(&self, _path: &str) -> BlobResult<()> {
        Err(unavailable())
    }

    async fn attributes(&self, _path: &str) -> BlobResult<BlobAttributes> {
        Err(unavailable())
    }

    async fn iter(&self, _prefix: &str) -> BlobResult<Vec<String>> {
        Err(unavailable())
    }
}

/// Blob store wrapper counting object body downloads.
pub struct CountingBlobStore {
    inner: Arc<dyn BlobStore>,
    gets: AtomicUsize,
}

impl CountingBlobStore {
    pub fn new(inner: Arc<dyn BlobStore>) -> Self {
        Self {
            inner,
            gets: AtomicUsize::new(0),
        }
    }

    pub fn gets(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BlobStore for CountingBlobStore {
    async fn get(&self, path: &str) -> BlobResult<Bytes> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        self.inner.get(path).await
    }

    async fn upload(&self, path: &str, data: Bytes) -> BlobResult<()> {
        self.inner.upload(path, data).await
    }

    async fn delete(&self, path: &str) -> BlobResult<()> {
        self.inner.delete(path).await
    }

    async fn attributes(&self, path: &str) -> BlobResult<BlobAttributes> {
        self.inner.attributes(path).await
    }

    async fn iter(&self, prefix: &str) -> BlobResult<Vec<String>> {
        self.inner.iter(prefix).await
    }
}

/// Deletion mark checker with fixed answers per tenant.
#[derive(Default)]
pub struct StaticDeletionMarks {
    marked: HashSet<String>,
    failing: HashSet<String>,
}

impl StaticDeletionMarks {
    pub fn marked(mut self, tenant: &str) -> Self {
        self.marked.insert(tenant.to_string());
        self
    }

    pub fn failing(mut self, tenant: &str) -> Self {
        self.failing.insert(tenant.to_string());
        self
    }
}

#[async_trait]
impl DeletionMarkChecker for StaticDeletionMarks {
    async fn is_marked_for_deletion(&self, tenant: &str) -> Result<bool> {
        if self.failing.contains(tenant) {
            return Err(anyhow!("fail"));
        }
        Ok(self.marked.contains(tenant))
    }
}

/// Tenants fetcher replaying a fixed sequence of results. Once the script
/// is exhausted every call fails.
pub struct ScriptedFetcher {
    responses: Mutex<VecDeque<Result<Vec<String>>>>,
    calls: AtomicUsize,
}

impl ScriptedFetcher {
    pub fn new(responses: Vec<Result<Vec<String>>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TenantsFetcher for ScriptedFetcher {
    async fn fetch_all_tenants(&self) -> Result<Vec<String>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.responses
            .lock()
            .expect("responses lock")
            .pop_front()
            .unwrap_or_else(|| Err(anyhow!("no more scripted responses")))
    }
}
