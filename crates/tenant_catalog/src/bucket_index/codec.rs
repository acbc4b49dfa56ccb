//! Gzip + JSON codec for the bucket index.

use std::io::{Read, Write};

use anyhow::{Context, Result};
use bytes::Bytes;
use flate2::{read::GzDecoder, Compression, GzBuilder};

use super::{Index, INDEX_FILENAME};

/// Serialize and compress an index. The gzip header carries
/// [`INDEX_FILENAME`] as the original file name.
pub fn encode(index: &Index) -> Result<Bytes> {
    let content = serde_json::to_vec(index).context("marshal bucket index")?;

    let mut encoder = GzBuilder::new()
        .filename(INDEX_FILENAME)
        .write(Vec::with_capacity(content.len() / 4), Compression::default());
    encoder.write_all(&content).context("gzip bucket index")?;
    let compressed = encoder.finish().context("close gzip bucket index")?;

    Ok(Bytes::from(compressed))
}

/// Decompress and deserialize an index.
///
/// The whole stream is inflated, including the trailer checksum, before any
/// parsing happens, so a truncated or damaged object never yields a
/// partially populated index.
pub fn decode(data: &[u8]) -> Result<Index, CorruptedIndex> {
    let mut content = Vec::new();
    GzDecoder::new(data)
        .read_to_end(&mut content)
        .map_err(|e| CorruptedIndex(e.to_string()))?;
    serde_json::from_slice(&content).map_err(|e| CorruptedIndex(e.to_string()))
}

/// Decoding failure. Carries the underlying reason for logging only.
#[derive(Debug, thiserror::Error)]
#[error("bucket index corrupted: {0}")]
pub struct CorruptedIndex(pub String);
