//! On-disk cache of catalog matches.
//!
//! The file is a JSON object keyed by the md5 of
//! `"{title}_{year}_{type}_{season}_{episode}"` (absent values render as
//! `None`), each entry holding `{"data": <match>, "timestamp": <epoch secs>}`.
//! Entries expire lazily on read. Only one process may own the file at a time.
//!
//! [`MatchCache`] never writes on insert; it reports when a flush is due and
//! hands out a [`CacheSnapshot`] that the async caller writes on the blocking
//! pool.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::types::CatalogMatch;
use crate::config::CacheConfig;
use crate::media::MediaInfo;

/// Errors that can occur while persisting the cache.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Cache I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize cache: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Cache writer task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// One cached match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub data: CatalogMatch,
    /// Seconds since the Unix epoch when the entry was written.
    pub timestamp: f64,
}

/// Result of a cache lookup.
#[derive(Debug, Clone, PartialEq)]
pub enum CacheLookup {
    Hit(CatalogMatch),
    Miss,
    /// Present but stale; the entry has been evicted.
    Expired,
}

impl CacheLookup {
    pub fn label(&self) -> &'static str {
        match self {
            CacheLookup::Hit(_) => "hit",
            CacheLookup::Miss => "miss",
            CacheLookup::Expired => "expired",
        }
    }
}

/// Entry counts, as reported by `trackprep cache stats`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub total_entries: usize,
    pub valid_entries: usize,
    pub expired_entries: usize,
    pub cache_file: PathBuf,
}

/// Cache key for a media record.
pub fn cache_key(info: &MediaInfo) -> String {
    fn or_none<T: ToString>(value: Option<T>) -> String {
        value.map_or_else(|| "None".to_string(), |v| v.to_string())
    }

    let raw = format!(
        "{}_{}_{}_{}_{}",
        info.title,
        or_none(info.year),
        info.media_type.as_str(),
        or_none(info.season),
        or_none(info.episode)
    );
    format!("{:x}", md5::compute(raw.as_bytes()))
}

/// Current time as fractional epoch seconds.
pub fn now_secs() -> f64 {
    chrono::Utc::now().timestamp_micros() as f64 / 1_000_000.0
}

fn write_entries(path: &Path, entries: &BTreeMap<String, CacheEntry>) -> Result<(), CacheError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| CacheError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    let json = serde_json::to_string_pretty(entries)?;
    fs::write(path, json).map_err(|source| CacheError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Entries captured for writing outside the cache lock.
#[derive(Debug)]
pub struct CacheSnapshot {
    path: PathBuf,
    entries: BTreeMap<String, CacheEntry>,
    pending: usize,
}

impl CacheSnapshot {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Inserts this snapshot carries that were not yet on disk.
    pub fn pending(&self) -> usize {
        self.pending
    }

    /// Blocking write.
    pub fn write(&self) -> Result<(), CacheError> {
        write_entries(&self.path, &self.entries)
    }

    /// Write on tokio's blocking pool.
    pub async fn persist(self) -> Result<(), CacheError> {
        let path = self.path.clone();
        let entries = self.entries.len();
        tokio::task::spawn_blocking(move || self.write()).await??;
        debug!(path = %path.display(), entries, "Match cache saved");
        Ok(())
    }
}

/// In-memory view of the cache file.
#[derive(Debug)]
pub struct MatchCache {
    path: PathBuf,
    expiry_secs: f64,
    flush_every: usize,
    entries: BTreeMap<String, CacheEntry>,
    pending: usize,
}

impl MatchCache {
    pub fn from_config(config: &CacheConfig) -> Self {
        Self::load(config.file_path(), config.expiry_secs, config.flush_every)
    }

    /// Load the cache file, dropping expired and unreadable entries.
    ///
    /// A missing file is an empty cache. A corrupt file is logged and
    /// treated as empty; it is overwritten on the next save.
    pub fn load(path: impl Into<PathBuf>, expiry_secs: u64, flush_every: usize) -> Self {
        Self::load_at(path, expiry_secs, flush_every, now_secs())
    }

    pub fn load_at(path: impl Into<PathBuf>, expiry_secs: u64, flush_every: usize, now: f64) -> Self {
        let mut cache = Self {
            path: path.into(),
            expiry_secs: expiry_secs as f64,
            flush_every: flush_every.max(1),
            entries: BTreeMap::new(),
            pending: 0,
        };
        cache.entries = cache.read_entries(now);
        cache
    }

    fn read_entries(&self, now: f64) -> BTreeMap<String, CacheEntry> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return BTreeMap::new(),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Failed to read match cache, starting empty");
                return BTreeMap::new();
            }
        };

        let raw: BTreeMap<String, Value> = match serde_json::from_str(&contents) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Match cache is corrupt, starting empty");
                return BTreeMap::new();
            }
        };

        let mut entries = BTreeMap::new();
        let mut expired = 0usize;
        for (key, value) in raw {
            match serde_json::from_value::<CacheEntry>(value) {
                Ok(entry) if self.is_expired(&entry, now) => expired += 1,
                Ok(entry) => {
                    entries.insert(key, entry);
                }
                Err(e) => debug!(key = %key, error = %e, "Dropping unreadable cache entry"),
            }
        }

        debug!(
            path = %self.path.display(),
            loaded = entries.len(),
            expired,
            "Loaded match cache"
        );
        entries
    }

    fn is_expired(&self, entry: &CacheEntry, now: f64) -> bool {
        now - entry.timestamp > self.expiry_secs
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Inserts not yet written to disk.
    pub fn pending(&self) -> usize {
        self.pending
    }

    pub fn get(&mut self, key: &str) -> CacheLookup {
        self.get_at(key, now_secs())
    }

    /// Look up `key`, evicting it if it has expired.
    pub fn get_at(&mut self, key: &str, now: f64) -> CacheLookup {
        let Some(entry) = self.entries.get(key) else {
            return CacheLookup::Miss;
        };
        if self.is_expired(entry, now) {
            self.entries.remove(key);
            return CacheLookup::Expired;
        }
        CacheLookup::Hit(entry.data.clone())
    }

    pub fn insert(&mut self, key: String, data: CatalogMatch) -> bool {
        self.insert_at(key, data, now_secs())
    }

    /// Store a match. Returns true once `flush_every` inserts are pending.
    pub fn insert_at(&mut self, key: String, data: CatalogMatch, now: f64) -> bool {
        self.entries.insert(
            key,
            CacheEntry {
                data,
                timestamp: now,
            },
        );
        self.pending += 1;
        self.pending >= self.flush_every
    }

    /// Capture every entry for writing and reset the pending count.
    pub fn snapshot(&mut self) -> CacheSnapshot {
        let pending = std::mem::take(&mut self.pending);
        CacheSnapshot {
            path: self.path.clone(),
            entries: self.entries.clone(),
            pending,
        }
    }

    /// Put back the pending count of a snapshot that failed to write.
    pub fn requeue(&mut self, pending: usize) {
        self.pending += pending;
    }

    /// Write every entry to disk, blocking.
    pub fn save(&mut self) -> Result<(), CacheError> {
        write_entries(&self.path, &self.entries)?;
        self.pending = 0;
        Ok(())
    }

    /// Drop every entry and delete the file.
    pub fn clear(&mut self) -> Result<(), CacheError> {
        self.entries.clear();
        self.pending = 0;
        match fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(source) => {
                return Err(CacheError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        }
        info!(path = %self.path.display(), "Match cache cleared");
        Ok(())
    }

    pub fn stats(&self) -> CacheStats {
        self.stats_at(now_secs())
    }

    pub fn stats_at(&self, now: f64) -> CacheStats {
        let total_entries = self.entries.len();
        let valid_entries = self
            .entries
            .values()
            .filter(|e| !self.is_expired(e, now))
            .count();
        CacheStats {
            total_entries,
            valid_entries,
            expired_entries: total_entries - valid_entries,
            cache_file: self.path.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::MediaType;
    use crate::testing::fixtures;
    use tempfile::TempDir;

    const DAY: u64 = 86_400;

    fn sample_match() -> CatalogMatch {
        CatalogMatch::from_movie(&fixtures::movie(603, "The Matrix", "1999-03-30"), 120.0)
    }

    #[test]
    fn test_cache_key_format() {
        let mut info = MediaInfo::new("The Matrix");
        info.year = Some(1999);
        // md5("The Matrix_1999_movie_None_None")
        assert_eq!(
            cache_key(&info),
            format!("{:x}", md5::compute(b"The Matrix_1999_movie_None_None"))
        );

        info.media_type = MediaType::TvShow;
        info.year = None;
        info.season = Some(1);
        info.episode = Some(3);
        assert_eq!(
            cache_key(&info),
            format!("{:x}", md5::compute(b"The Matrix_None_tvshow_1_3"))
        );
    }

    #[test]
    fn test_round_trip_within_expiry() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tmdb_cache.json");

        let mut cache = MatchCache::load_at(&path, DAY, 10, 1_000.0);
        cache.insert_at("k".to_string(), sample_match(), 1_000.0);
        cache.save().unwrap();

        let mut reloaded = MatchCache::load_at(&path, DAY, 10, 2_000.0);
        assert_eq!(reloaded.get_at("k", 2_000.0), CacheLookup::Hit(sample_match()));
    }

    #[test]
    fn test_expired_entry_is_evicted_on_read() {
        let dir = TempDir::new().unwrap();
        let mut cache = MatchCache::load_at(dir.path().join("c.json"), 100, 10, 0.0);
        cache.insert_at("k".to_string(), sample_match(), 0.0);

        assert!(matches!(cache.get_at("k", 100.0), CacheLookup::Hit(_)));
        assert_eq!(cache.get_at("k", 100.5), CacheLookup::Expired);
        assert_eq!(cache.get_at("k", 100.5), CacheLookup::Miss);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_load_drops_expired_entries() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("c.json");
        let mut cache = MatchCache::load_at(&path, 100, 10, 0.0);
        cache.insert_at("old".to_string(), sample_match(), 0.0);
        cache.insert_at("new".to_string(), sample_match(), 150.0);
        cache.save().unwrap();

        let reloaded = MatchCache::load_at(&path, 100, 10, 200.0);
        assert_eq!(reloaded.len(), 1);
    }

    #[test]
    fn test_corrupt_file_starts_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("c.json");
        fs::write(&path, "{ not json").unwrap();

        let mut cache = MatchCache::load(&path, DAY, 10);
        assert!(cache.is_empty());

        // Next save replaces the corrupt file
        cache.insert("k".to_string(), sample_match());
        cache.save().unwrap();
        assert_eq!(MatchCache::load(&path, DAY, 10).len(), 1);
    }

    #[test]
    fn test_unreadable_entry_dropped() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("c.json");
        let good = serde_json::to_value(CacheEntry {
            data: sample_match(),
            timestamp: 10.0,
        })
        .unwrap();
        let file = serde_json::json!({
            "good": good,
            "bad": {"data": {"title": "no id"}, "timestamp": 10.0}
        });
        fs::write(&path, file.to_string()).unwrap();

        let cache = MatchCache::load_at(&path, DAY, 10, 20.0);
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn test_flush_every_threshold() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested/c.json");
        let mut cache = MatchCache::load(&path, DAY, 2);

        assert!(!cache.insert("a".to_string(), sample_match()));
        assert_eq!(cache.pending(), 1);
        assert!(cache.insert("b".to_string(), sample_match()));
        // Insert never touches the disk
        assert!(!path.exists());

        let snapshot = cache.snapshot();
        assert_eq!(snapshot.pending(), 2);
        assert_eq!(cache.pending(), 0);
        snapshot.persist().await.unwrap();
        assert_eq!(MatchCache::load(&path, DAY, 2).len(), 2);
    }

    #[tokio::test]
    async fn test_failed_snapshot_is_requeued() {
        let dir = TempDir::new().unwrap();
        // A file where the cache directory should be
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "").unwrap();
        let mut cache = MatchCache::load(blocker.join("c.json"), DAY, 1);

        assert!(cache.insert("a".to_string(), sample_match()));
        let snapshot = cache.snapshot();
        let pending = snapshot.pending();
        let err = snapshot.persist().await.unwrap_err();
        assert!(matches!(err, CacheError::Io { .. }));

        cache.requeue(pending);
        assert_eq!(cache.pending(), 1);
    }

    #[test]
    fn test_file_shape() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("c.json");
        let mut cache = MatchCache::load(&path, DAY, 10);
        cache.insert_at("abc".to_string(), sample_match(), 1234.5);
        cache.save().unwrap();

        let json: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(json["abc"]["timestamp"], 1234.5);
        assert_eq!(json["abc"]["data"]["tmdb_id"], 603);
    }

    #[test]
    fn test_clear_deletes_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("c.json");
        let mut cache = MatchCache::load(&path, DAY, 10);
        cache.insert("k".to_string(), sample_match());
        cache.save().unwrap();

        cache.clear().unwrap();
        assert!(cache.is_empty());
        assert!(!path.exists());
        // Clearing twice is fine
        cache.clear().unwrap();
    }

    #[test]
    fn test_stats() {
        let dir = TempDir::new().unwrap();
        let mut cache = MatchCache::load_at(dir.path().join("c.json"), 100, 10, 0.0);
        cache.insert_at("a".to_string(), sample_match(), 0.0);
        cache.insert_at("b".to_string(), sample_match(), 90.0);

        let stats = cache.stats_at(150.0);
        assert_eq!(stats.total_entries, 2);
        assert_eq!(stats.valid_entries, 1);
        assert_eq!(stats.expired_entries, 1);
        assert!(stats.cache_file.ends_with("c.json"));
    }
}
