//! On-disk cache for raw HTTP response bodies.
//!
//! The archive client funnels its requests through an injected `HttpCache`
//! keyed by the full request signature (URL plus ordered query parameters).
//! The default policy never expires entries, matching the archive's
//! immutable historical data; a TTL policy is available for callers that
//! want bounded growth, together with [`HttpCache::purge_expired`].

use anyhow::{Context, Result, anyhow};
use chrono::{DateTime, Duration, Utc};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::hash::{DefaultHasher, Hash, Hasher};
use std::path::PathBuf;

/// Expiry policy for cached responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CachePolicy {
    /// Entries stay valid forever.
    NeverExpire,
    /// Entries older than the duration read as misses.
    ExpireAfter(Duration),
}

/// Wrapper persisted to disk for each cached body.
#[derive(Debug, Serialize, Deserialize)]
struct CacheEntry {
    signature: String,
    body: String,
    cached_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct HttpCache {
    cache_dir: PathBuf,
    policy: CachePolicy,
}

impl HttpCache {
    /// Cache under the platform cache directory with the given policy.
    pub fn new(policy: CachePolicy) -> Result<Self> {
        let dirs = ProjectDirs::from("dev", "wxdash", "wxdash")
            .ok_or_else(|| anyhow!("Could not determine platform cache directory"))?;
        Ok(Self {
            cache_dir: dirs.cache_dir().to_path_buf(),
            policy,
        })
    }

    /// Cache in an explicit directory; used by tests and by callers with a
    /// configured cache location.
    pub fn with_dir(cache_dir: PathBuf, policy: CachePolicy) -> Self {
        Self { cache_dir, policy }
    }

    pub fn policy(&self) -> CachePolicy {
        self.policy
    }

    fn entry_path(&self, signature: &str) -> PathBuf {
        let mut hasher = DefaultHasher::new();
        signature.hash(&mut hasher);
        self.cache_dir.join(format!("{:016x}.json", hasher.finish()))
    }

    fn is_fresh(&self, entry: &CacheEntry) -> bool {
        match self.policy {
            CachePolicy::NeverExpire => true,
            CachePolicy::ExpireAfter(ttl) => Utc::now() - entry.cached_at <= ttl,
        }
    }

    /// Look up a cached body. Expired or unreadable entries read as misses.
    pub fn read(&self, signature: &str) -> Option<String> {
        let path = self.entry_path(signature);
        let content = fs::read_to_string(&path).ok()?;
        let entry: CacheEntry = serde_json::from_str(&content).ok()?;

        if !self.is_fresh(&entry) {
            tracing::debug!(signature, "cache entry expired");
            return None;
        }

        tracing::debug!(signature, "cache hit");
        Some(entry.body)
    }

    /// Store a response body, overwriting any previous entry for the key.
    pub fn write(&self, signature: &str, body: &str) -> Result<()> {
        fs::create_dir_all(&self.cache_dir).with_context(|| {
            format!("Failed to create cache directory: {}", self.cache_dir.display())
        })?;

        let entry = CacheEntry {
            signature: signature.to_owned(),
            body: body.to_owned(),
            cached_at: Utc::now(),
        };

        let json = serde_json::to_string(&entry).context("Failed to serialize cache entry")?;
        let path = self.entry_path(signature);

        fs::write(&path, json)
            .with_context(|| format!("Failed to write cache file: {}", path.display()))
    }

    /// Delete every entry that is no longer fresh under the current policy.
    /// Returns the number of files removed. A no-op under `NeverExpire`.
    pub fn purge_expired(&self) -> Result<usize> {
        if self.policy == CachePolicy::NeverExpire || !self.cache_dir.exists() {
            return Ok(0);
        }

        let mut removed = 0;
        for dir_entry in fs::read_dir(&self.cache_dir)
            .with_context(|| format!("Failed to read cache directory: {}", self.cache_dir.display()))?
        {
            let path = dir_entry?.path();
            let stale = fs::read_to_string(&path)
                .ok()
                .and_then(|c| serde_json::from_str::<CacheEntry>(&c).ok())
                .is_none_or(|entry| !self.is_fresh(&entry));

            if stale {
                fs::remove_file(&path)
                    .with_context(|| format!("Failed to remove cache file: {}", path.display()))?;
                removed += 1;
            }
        }

        tracing::debug!(removed, "purged expired cache entries");
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn temp_cache(policy: CachePolicy) -> (HttpCache, TempDir) {
        let dir = TempDir::new().expect("temp dir");
        let cache = HttpCache::with_dir(dir.path().to_path_buf(), policy);
        (cache, dir)
    }

    #[test]
    fn miss_for_unknown_signature() {
        let (cache, _dir) = temp_cache(CachePolicy::NeverExpire);
        assert_eq!(cache.read("https://example.test/?q=nothing"), None);
    }

    #[test]
    fn write_then_read_round_trips() {
        let (cache, _dir) = temp_cache(CachePolicy::NeverExpire);
        let sig = "https://archive.test/v1/archive?latitude=40.7&longitude=-74.0";
        cache.write(sig, r#"{"ok":true}"#).unwrap();
        assert_eq!(cache.read(sig).as_deref(), Some(r#"{"ok":true}"#));
    }

    #[test]
    fn distinct_signatures_do_not_collide() {
        let (cache, _dir) = temp_cache(CachePolicy::NeverExpire);
        cache.write("sig-a", "body-a").unwrap();
        cache.write("sig-b", "body-b").unwrap();
        assert_eq!(cache.read("sig-a").as_deref(), Some("body-a"));
        assert_eq!(cache.read("sig-b").as_deref(), Some("body-b"));
    }

    #[test]
    fn overwrite_replaces_body() {
        let (cache, _dir) = temp_cache(CachePolicy::NeverExpire);
        cache.write("sig", "first").unwrap();
        cache.write("sig", "second").unwrap();
        assert_eq!(cache.read("sig").as_deref(), Some("second"));
    }

    #[test]
    fn zero_ttl_entry_reads_as_miss() {
        let (cache, _dir) = temp_cache(CachePolicy::ExpireAfter(Duration::zero()));
        cache.write("sig", "body").unwrap();
        std::thread::sleep(std::time::Duration::from_millis(10));
        assert_eq!(cache.read("sig"), None);
    }

    #[test]
    fn never_expire_entry_stays_fresh() {
        let (cache, _dir) = temp_cache(CachePolicy::NeverExpire);
        cache.write("sig", "body").unwrap();
        std::thread::sleep(std::time::Duration::from_millis(10));
        assert_eq!(cache.read("sig").as_deref(), Some("body"));
    }

    #[test]
    fn purge_removes_only_stale_files() {
        let (cache, dir) = temp_cache(CachePolicy::ExpireAfter(Duration::zero()));
        cache.write("stale", "body").unwrap();
        std::thread::sleep(std::time::Duration::from_millis(10));

        let removed = cache.purge_expired().unwrap();
        assert_eq!(removed, 1);
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn purge_is_a_noop_when_never_expiring() {
        let (cache, dir) = temp_cache(CachePolicy::NeverExpire);
        cache.write("sig", "body").unwrap();
        assert_eq!(cache.purge_expired().unwrap(), 0);
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn write_creates_missing_directories() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("deep").join("cache");
        let cache = HttpCache::with_dir(nested.clone(), CachePolicy::NeverExpire);
        cache.write("sig", "body").unwrap();
        assert!(nested.exists());
    }
}
