//! TTL-bounded on-disk response cache.
//!
//! Entries live under `<root>/<bucket>/<key>.json`, where `key` is the
//! SHA-256 of the normalized source URL plus the bucket name. Each file holds
//! a JSON envelope recording when the payload was stored. Storage failures
//! are logged and degrade to a miss (reads) or a `false` return (writes);
//! they are never surfaced as errors.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Default entry lifetime.
pub const DEFAULT_TTL: Duration = Duration::from_secs(3600);

const ENTRY_EXTENSION: &str = "json";

/// Logical partition of the cache; each bucket is its own directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheBucket {
    /// Raw HTML of search/listing pages.
    RawPage,
    /// Structured storefront feed bodies.
    Feed,
    /// Normalized product records.
    Record,
}

impl CacheBucket {
    pub const ALL: [CacheBucket; 3] = [CacheBucket::RawPage, CacheBucket::Feed, CacheBucket::Record];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            CacheBucket::RawPage => "raw_page",
            CacheBucket::Feed => "feed",
            CacheBucket::Record => "record",
        }
    }
}

impl std::fmt::Display for CacheBucket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for CacheBucket {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "raw_page" | "html" => Ok(CacheBucket::RawPage),
            "feed" | "json" => Ok(CacheBucket::Feed),
            "record" | "products" => Ok(CacheBucket::Record),
            other => Err(format!(
                "unknown cache bucket \"{other}\" (expected raw_page, feed, or record)"
            )),
        }
    }
}

/// Per-bucket occupancy reported by [`ResponseCache::stats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BucketStats {
    pub entries: usize,
    pub size_bytes: u64,
    pub expired: usize,
}

#[derive(Debug, Serialize, Deserialize)]
struct CacheEnvelope {
    source_key: String,
    bucket: CacheBucket,
    stored_at: DateTime<Utc>,
    payload: String,
}

#[derive(Debug, Clone)]
pub struct ResponseCache {
    root: PathBuf,
    ttl: Duration,
}

impl ResponseCache {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>, ttl: Duration) -> Self {
        Self {
            root: root.into(),
            ttl,
        }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[must_use]
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Deterministic cache key for a source URL within a bucket.
    #[must_use]
    pub fn cache_key(source_key: &str, bucket: CacheBucket) -> String {
        let normalized = normalize_source_key(source_key);
        format!(
            "{:x}",
            Sha256::digest(format!("{}\n{normalized}", bucket.as_str()).as_bytes())
        )
    }

    fn bucket_dir(&self, bucket: CacheBucket) -> PathBuf {
        self.root.join(bucket.as_str())
    }

    fn entry_path(&self, source_key: &str, bucket: CacheBucket) -> PathBuf {
        self.bucket_dir(bucket)
            .join(format!("{}.{ENTRY_EXTENSION}", Self::cache_key(source_key, bucket)))
    }

    fn is_expired(&self, stored_at: DateTime<Utc>) -> bool {
        let age = Utc::now().signed_duration_since(stored_at);
        match age.to_std() {
            Ok(age) => age >= self.ttl,
            // stored_at in the future: clock skew, treat as fresh
            Err(_) => self.ttl.is_zero(),
        }
    }

    /// Returns the cached payload, or `None` on a miss.
    ///
    /// An expired entry is deleted as a side effect and reported as a miss.
    pub async fn get(&self, source_key: &str, bucket: CacheBucket) -> Option<String> {
        let path = self.entry_path(source_key, bucket);
        let raw = match tokio::fs::read(&path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "cache read failed");
                return None;
            }
        };

        let envelope: CacheEnvelope = match serde_json::from_slice(&raw) {
            Ok(envelope) => envelope,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "discarding unreadable cache entry");
                remove_quietly(&path).await;
                return None;
            }
        };

        if self.is_expired(envelope.stored_at) {
            tracing::debug!(source_key, bucket = %bucket, "cache entry expired");
            remove_quietly(&path).await;
            return None;
        }

        tracing::debug!(source_key, bucket = %bucket, "cache hit");
        Some(envelope.payload)
    }

    /// Stores `payload` for `source_key`, replacing any previous entry.
    ///
    /// The envelope is written to a temporary file and renamed into place, so
    /// readers never observe a partially written entry.
    pub async fn set(&self, source_key: &str, bucket: CacheBucket, payload: &str) -> bool {
        let dir = self.bucket_dir(bucket);
        if let Err(e) = tokio::fs::create_dir_all(&dir).await {
            tracing::warn!(dir = %dir.display(), error = %e, "could not create cache bucket");
            return false;
        }

        let envelope = CacheEnvelope {
            source_key: source_key.to_owned(),
            bucket,
            stored_at: Utc::now(),
            payload: payload.to_owned(),
        };
        let body = match serde_json::to_vec(&envelope) {
            Ok(body) => body,
            Err(e) => {
                tracing::warn!(source_key, error = %e, "could not encode cache entry");
                return false;
            }
        };

        let path = self.entry_path(source_key, bucket);
        let tmp = dir.join(format!(".{}.tmp", uuid::Uuid::new_v4().simple()));
        if let Err(e) = tokio::fs::write(&tmp, &body).await {
            tracing::warn!(path = %tmp.display(), error = %e, "cache write failed");
            remove_quietly(&tmp).await;
            return false;
        }
        if let Err(e) = tokio::fs::rename(&tmp, &path).await {
            tracing::warn!(path = %path.display(), error = %e, "cache rename failed");
            remove_quietly(&tmp).await;
            return false;
        }

        true
    }

    /// Typed read: a payload that no longer deserializes counts as a miss.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        source_key: &str,
        bucket: CacheBucket,
    ) -> Option<T> {
        let payload = self.get(source_key, bucket).await?;
        match serde_json::from_str(&payload) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(source_key, bucket = %bucket, error = %e, "cached payload has unexpected shape");
                None
            }
        }
    }

    pub async fn set_json<T: Serialize>(
        &self,
        source_key: &str,
        bucket: CacheBucket,
        value: &T,
    ) -> bool {
        match serde_json::to_string(value) {
            Ok(payload) => self.set(source_key, bucket, &payload).await,
            Err(e) => {
                tracing::warn!(source_key, error = %e, "could not encode cache payload");
                false
            }
        }
    }

    /// Removes every entry in `bucket`, or in all buckets when `None`.
    /// Returns the number of entries removed.
    pub async fn clear(&self, bucket: Option<CacheBucket>) -> usize {
        let buckets = match bucket {
            Some(bucket) => vec![bucket],
            None => CacheBucket::ALL.to_vec(),
        };

        let mut removed = 0;
        for bucket in buckets {
            for path in self.entry_files(bucket).await {
                if tokio::fs::remove_file(&path).await.is_ok() {
                    removed += 1;
                }
            }
        }
        tracing::info!(removed, "cache cleared");
        removed
    }

    /// Sweeps all buckets, deleting expired or unreadable entries.
    pub async fn cleanup_expired(&self) -> usize {
        let mut removed = 0;
        for bucket in CacheBucket::ALL {
            for path in self.entry_files(bucket).await {
                if self.read_stored_at(&path).await.is_some_and(|at| !self.is_expired(at)) {
                    continue;
                }
                if tokio::fs::remove_file(&path).await.is_ok() {
                    removed += 1;
                }
            }
        }
        tracing::info!(removed, "expired cache entries removed");
        removed
    }

    pub async fn stats(&self) -> BTreeMap<CacheBucket, BucketStats> {
        let mut stats = BTreeMap::new();
        for bucket in CacheBucket::ALL {
            let mut bucket_stats = BucketStats::default();
            for path in self.entry_files(bucket).await {
                bucket_stats.entries += 1;
                if let Ok(meta) = tokio::fs::metadata(&path).await {
                    bucket_stats.size_bytes += meta.len();
                }
                if self
                    .read_stored_at(&path)
                    .await
                    .is_none_or(|at| self.is_expired(at))
                {
                    bucket_stats.expired += 1;
                }
            }
            stats.insert(bucket, bucket_stats);
        }
        stats
    }

    async fn read_stored_at(&self, path: &Path) -> Option<DateTime<Utc>> {
        let raw = tokio::fs::read(path).await.ok()?;
        serde_json::from_slice::<CacheEnvelope>(&raw)
            .ok()
            .map(|envelope| envelope.stored_at)
    }

    async fn entry_files(&self, bucket: CacheBucket) -> Vec<PathBuf> {
        let dir = self.bucket_dir(bucket);
        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Vec::new(),
            Err(e) => {
                tracing::warn!(dir = %dir.display(), error = %e, "could not list cache bucket");
                return Vec::new();
            }
        };

        let mut files = Vec::new();
        loop {
            match entries.next_entry().await {
                Ok(Some(entry)) => {
                    let path = entry.path();
                    if path.extension().is_some_and(|ext| ext == ENTRY_EXTENSION) {
                        files.push(path);
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    tracing::warn!(dir = %dir.display(), error = %e, "cache listing interrupted");
                    break;
                }
            }
        }
        files
    }
}

async fn remove_quietly(path: &Path) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            tracing::warn!(path = %path.display(), error = %e, "could not remove cache file");
        }
    }
}

/// Canonical form of a source key: parsed URLs have their scheme and host
/// lower-cased and fragment dropped; a trailing `/` is always trimmed.
fn normalize_source_key(source_key: &str) -> String {
    let trimmed = source_key.trim();
    match reqwest::Url::parse(trimmed) {
        Ok(mut url) => {
            url.set_fragment(None);
            url.as_str().trim_end_matches('/').to_owned()
        }
        Err(_) => trimmed.trim_end_matches('/').to_owned(),
    }
}
