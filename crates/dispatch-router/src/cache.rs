//! Per-project route cache.
//!
//! Caches routing results keyed on the request text plus a context hash
//! derived from the modification times of the files the request names.
//! The point is to skip repeated semantic-matcher calls for requests the
//! user re-issues; the keyword path is cheap enough that caching it is
//! incidental.
//!
//! One JSON file per key under `cache/`. Writers hold an exclusive lock
//! on a `.lock` sidecar and publish via temp-file-plus-rename, so readers
//! never need a lock: they either see the old complete entry or the new
//! one.
//!
//! An entry is invalid once any tracked dependency has been modified
//! after the entry was written, or once its TTL has lapsed.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use std::time::{Duration, SystemTime};

use chrono::{DateTime, FixedOffset};
use dispatch_core::{FileLock, hex16};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Bounded wait for a cache sidecar lock. Short: losing a cache write is
/// cheaper than stalling a hook.
const CACHE_LOCK_WAIT: Duration = Duration::from_secs(1);

/// A cached routing result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Cache key (`hex16(request_text ‖ context_hash)`), also the file stem.
    pub key: String,
    /// The request this entry answers.
    pub request_text: String,
    /// Agent the cached decision routed to, if direct.
    pub agent_used: Option<String>,
    /// The cached decision, as produced by the router.
    pub result: serde_json::Value,
    /// When the entry was written.
    pub timestamp: DateTime<FixedOffset>,
    /// Hash of dependency modification times at write.
    pub context_hash: String,
    /// Entry lifetime in days.
    pub ttl_days: u32,
    /// How many times this entry has been served.
    pub hit_count: u64,
    /// The files whose modification invalidates this entry.
    pub dependencies: Vec<PathBuf>,
}

impl CacheEntry {
    /// Whether the TTL has lapsed at `now`.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<FixedOffset>) -> bool {
        let deadline = self.timestamp + chrono::Days::new(u64::from(self.ttl_days));
        now >= deadline
    }

    /// Whether any tracked dependency was modified after the entry was
    /// written. A dependency that has vanished counts as changed.
    #[must_use]
    pub fn dependencies_changed(&self) -> bool {
        let written: SystemTime = self.timestamp.into();
        self.dependencies.iter().any(|path| {
            std::fs::metadata(path)
                .and_then(|m| m.modified())
                .map_or(true, |mtime| mtime > written)
        })
    }
}

/// The cache directory for one project.
#[derive(Debug, Clone)]
pub struct RouteCache {
    dir: PathBuf,
    ttl_days: u32,
}

impl RouteCache {
    /// A cache rooted at a project's `cache/` directory.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>, ttl_days: u32) -> Self {
        Self {
            dir: dir.into(),
            ttl_days,
        }
    }

    /// Cache key for a request in a dependency context.
    #[must_use]
    pub fn key(request: &str, context_hash: &str) -> String {
        hex16(format!("{request}{context_hash}").as_bytes())
    }

    /// Hash of dependency paths and modification times. Missing files
    /// contribute a fixed marker, so appearing later changes the hash.
    #[must_use]
    pub fn context_hash(dependencies: &[PathBuf]) -> String {
        let mut material = String::new();
        for path in dependencies {
            material.push_str(&path.display().to_string());
            match std::fs::metadata(path).and_then(|m| m.modified()) {
                Ok(mtime) => {
                    let since = mtime
                        .duration_since(SystemTime::UNIX_EPOCH)
                        .unwrap_or(Duration::ZERO);
                    material.push_str(&format!("={}.{:09}", since.as_secs(), since.subsec_nanos()));
                },
                Err(_) => material.push_str("=absent"),
            }
            material.push('\n');
        }
        hex16(material.as_bytes())
    }

    /// A still-valid entry for `request`, if one exists.
    ///
    /// A hit increments `hit_count` (best effort; a busy lock skips the
    /// increment, never the hit). Invalid entries read as misses and are
    /// removed.
    #[must_use]
    pub fn lookup(&self, request: &str, dependencies: &[PathBuf]) -> Option<CacheEntry> {
        let context_hash = Self::context_hash(dependencies);
        let key = Self::key(request, &context_hash);
        let path = self.entry_path(&key);

        let content = std::fs::read_to_string(&path).ok()?;
        let mut entry: CacheEntry = match serde_json::from_str(&content) {
            Ok(entry) => entry,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "dropping unreadable cache entry");
                let _ = std::fs::remove_file(&path);
                return None;
            },
        };

        let now = chrono::Local::now().fixed_offset();
        if entry.is_expired(now) || entry.dependencies_changed() {
            debug!(key = %key, "cache entry invalid, dropping");
            let _ = std::fs::remove_file(&path);
            return None;
        }

        entry.hit_count = entry.hit_count.saturating_add(1);
        if let Err(e) = self.write_entry(&entry) {
            debug!(key = %entry.key, error = %e, "skipping hit-count update");
        }
        Some(entry)
    }

    /// Record a routing result for `request`.
    ///
    /// Best effort: a busy lock or filesystem failure loses the cache
    /// write, nothing else.
    pub fn store(
        &self,
        request: &str,
        dependencies: &[PathBuf],
        agent_used: Option<String>,
        result: serde_json::Value,
    ) {
        let context_hash = Self::context_hash(dependencies);
        let entry = CacheEntry {
            key: Self::key(request, &context_hash),
            request_text: request.to_string(),
            agent_used,
            result,
            timestamp: chrono::Local::now().fixed_offset(),
            context_hash,
            ttl_days: self.ttl_days,
            hit_count: 0,
            dependencies: dependencies.to_vec(),
        };
        if let Err(e) = self.write_entry(&entry) {
            warn!(key = %entry.key, error = %e, "cache write skipped");
        }
    }

    /// Delete entries whose own TTL has lapsed. Returns how many were
    /// removed.
    pub fn sweep_expired(&self) -> usize {
        let Ok(entries) = std::fs::read_dir(&self.dir) else {
            return 0;
        };
        let now = chrono::Local::now().fixed_offset();
        let mut removed = 0;
        for dirent in entries.flatten() {
            let path = dirent.path();
            if path.extension().is_none_or(|e| e != "json") {
                continue;
            }
            let Ok(content) = std::fs::read_to_string(&path) else {
                continue;
            };
            let Ok(entry) = serde_json::from_str::<CacheEntry>(&content) else {
                continue;
            };
            if entry.is_expired(now) && std::fs::remove_file(&path).is_ok() {
                removed += 1;
            }
        }
        removed
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }

    /// Exclusive sidecar lock, temp file, rename.
    fn write_entry(&self, entry: &CacheEntry) -> std::io::Result<()> {
        let path = self.entry_path(&entry.key);
        let lock_path = self.dir.join(format!("{}.json.lock", entry.key));
        let _lock = FileLock::exclusive(&lock_path, CACHE_LOCK_WAIT)?;

        let json = serde_json::to_string_pretty(entry)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        let tmp = self.dir.join(format!(".{}.json.tmp", entry.key));
        {
            let mut options = OpenOptions::new();
            options.create(true).truncate(true).write(true);
            #[cfg(unix)]
            {
                use std::os::unix::fs::OpenOptionsExt;
                options.mode(0o600);
            }
            let mut file = options.open(&tmp)?;
            file.write_all(json.as_bytes())?;
        }
        std::fs::rename(&tmp, &path)
    }
}
