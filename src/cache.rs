use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use chrono::{DateTime, Datelike, Utc};
use sha2::{Digest, Sha256};
use tracing::{debug, error, info, warn};

use crate::source::types::SessionId;

/// How long a cached response for still-changing data stays fresh.
pub const DEFAULT_TTL: Duration = Duration::from_secs(12 * 60 * 60);

/// Sessions this long past their start no longer change upstream.
const SETTLE_DAYS: i64 = 7;

/// Directory partition a cached response belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheScope {
    Schedule {
        season: i32,
    },
    Session {
        id: SessionId,
        start: Option<DateTime<Utc>>,
    },
}

impl CacheScope {
    pub fn relative_dir(&self) -> PathBuf {
        match self {
            CacheScope::Schedule { season } => PathBuf::from(season.to_string()).join("schedule"),
            CacheScope::Session { id, .. } => PathBuf::from(id.season.to_string())
                .join(format!("round-{:02}", id.round))
                .join(id.kind.code()),
        }
    }

    /// Whether upstream data for this scope is final as of `now`. Past
    /// seasons' schedules and sessions older than a week are settled; a
    /// session without a start date never is.
    pub fn is_settled(&self, now: DateTime<Utc>) -> bool {
        match self {
            CacheScope::Schedule { season } => *season < now.year(),
            CacheScope::Session { start, .. } => {
                start.is_some_and(|s| now - s >= chrono::Duration::days(SETTLE_DAYS))
            }
        }
    }
}

/// Compute the cache file stem for a request URL: the first 16 hex
/// characters of its SHA-256 digest.
pub fn cache_key(url: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(url.as_bytes());
    let hash = hasher.finalize();
    hex::encode(&hash[..8])
}

/// On-disk store of raw upstream responses.
///
/// A disabled cache (no root) turns every lookup into a miss and every store
/// into a no-op. Entries of settled scopes never expire; all others expire
/// `ttl` after they were written.
#[derive(Debug, Clone)]
pub struct ResponseCache {
    root: Option<PathBuf>,
    ttl: Duration,
}

impl Default for ResponseCache {
    fn default() -> Self {
        Self::disabled()
    }
}

impl ResponseCache {
    pub fn disabled() -> Self {
        Self {
            root: None,
            ttl: DEFAULT_TTL,
        }
    }

    /// Create `dir` if needed and use it as the cache root. Failure is
    /// logged and yields a disabled cache.
    pub fn initialize(dir: &Path) -> Self {
        match std::fs::create_dir_all(dir) {
            Ok(()) => {
                info!(dir = %dir.display(), "response cache initialized");
                Self {
                    root: Some(dir.to_path_buf()),
                    ttl: DEFAULT_TTL,
                }
            }
            Err(e) => {
                error!(dir = %dir.display(), error = %e, "failed to initialize response cache; running uncached");
                Self::disabled()
            }
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn root(&self) -> Option<&Path> {
        self.root.as_deref()
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn is_enabled(&self) -> bool {
        self.root.is_some()
    }

    pub fn path_for(&self, scope: &CacheScope, url: &str) -> Option<PathBuf> {
        self.root.as_ref().map(|root| {
            root.join(scope.relative_dir())
                .join(format!("{}.json", cache_key(url)))
        })
    }

    pub async fn load(&self, scope: &CacheScope, url: &str) -> Option<Vec<u8>> {
        let path = self.path_for(scope, url)?;
        if !scope.is_settled(Utc::now()) && self.is_expired(&path).await? {
            debug!(url, path = %path.display(), "cache entry expired");
            return None;
        }
        match tokio::fs::read(&path).await {
            Ok(bytes) => {
                debug!(url, path = %path.display(), "cache hit");
                Some(bytes)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to read cache entry");
                None
            }
        }
    }

    /// `None` when the entry does not exist or its age cannot be read.
    async fn is_expired(&self, path: &Path) -> Option<bool> {
        let modified = match tokio::fs::metadata(path).await.and_then(|m| m.modified()) {
            Ok(modified) => modified,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to read cache entry age");
                return None;
            }
        };
        // mtime in the future counts as just written
        let age = SystemTime::now()
            .duration_since(modified)
            .unwrap_or(Duration::ZERO);
        Some(age >= self.ttl)
    }

    /// Write `body` for `url`. Errors are logged and otherwise ignored.
    pub async fn store(&self, scope: &CacheScope, url: &str, body: &[u8]) {
        let Some(path) = self.path_for(scope, url) else {
            return;
        };
        if let Err(e) = write_atomic(path.clone(), body.to_vec()).await {
            warn!(path = %path.display(), error = %e, "failed to write cache entry");
        }
    }
}

/// Each writer gets its own temp file in the target directory, renamed over
/// `path` once complete.
async fn write_atomic(path: PathBuf, body: Vec<u8>) -> std::io::Result<()> {
    let parent = path
        .parent()
        .map(Path::to_path_buf)
        .ok_or_else(|| std::io::Error::other("cache path has no parent directory"))?;
    tokio::fs::create_dir_all(&parent).await?;
    tokio::task::spawn_blocking(move || {
        let mut tmp = tempfile::NamedTempFile::new_in(&parent)?;
        tmp.write_all(&body)?;
        tmp.persist(&path).map_err(|e| e.error)?;
        Ok(())
    })
    .await
    .map_err(std::io::Error::other)?
}
