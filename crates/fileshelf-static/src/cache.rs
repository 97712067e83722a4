//! Filesystem metadata cache with TTL expiry.
//!
//! Every lookup re-stats the real path; the cache only records what the
//! last validation saw so that a changed modification time is noticed and
//! overwritten. Entries that are not touched for longer than the TTL are
//! removed by [`MetadataCache::sweep`], which [`MetadataCache::spawn_sweeper`]
//! runs periodically.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::fs::Metadata;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Weak};
use std::time::{Duration, SystemTime};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::error::StaticError;

/// What the cache remembers about one path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheEntry {
	/// Modification time observed at the last validation
	pub modification_time: SystemTime,
	/// Whether the path was a directory at the last validation
	pub is_directory: bool,
	/// When the entry was last validated
	pub last_access: Instant,
}

/// Result of [`MetadataCache::resolve`]
#[derive(Debug)]
pub struct ResolvedMetadata {
	/// Fresh metadata from this request's stat
	pub metadata: Metadata,
	/// True when a trusted entry matched the fresh stat
	pub from_cache: bool,
}

/// Concurrent path → [`CacheEntry`] store.
///
/// The map sits behind a single reader/writer lock. The lock is never held
/// across a filesystem call.
#[derive(Debug)]
pub struct MetadataCache {
	entries: RwLock<HashMap<PathBuf, CacheEntry>>,
	ttl: Duration,
}

impl MetadataCache {
	/// Create an empty cache whose entries expire after `ttl` without access
	pub fn new(ttl: Duration) -> Self {
		Self {
			entries: RwLock::new(HashMap::new()),
			ttl,
		}
	}

	/// Configured time to live
	pub fn ttl(&self) -> Duration {
		self.ttl
	}

	/// Stat `path` and reconcile the result with the cached entry.
	///
	/// # Errors
	///
	/// [`StaticError::Forbidden`] when the stat is denied,
	/// [`StaticError::NotFound`] for every other stat failure.
	pub async fn resolve(&self, path: &Path) -> Result<ResolvedMetadata, StaticError> {
		let cached = self.entries.read().get(path).copied();

		let metadata = tokio::fs::metadata(path).await.map_err(|err| {
			tracing::debug!(path = %path.display(), error = %err, "stat failed");
			StaticError::from_stat(&err)
		})?;

		let modification_time = metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH);
		let is_directory = metadata.is_dir();
		let now = Instant::now();

		let from_cache = cached.is_some_and(|entry| {
			self.is_fresh(&entry, now)
				&& entry.modification_time == modification_time
				&& entry.is_directory == is_directory
		});

		{
			let mut entries = self.entries.write();
			match entries.get_mut(path) {
				Some(entry) if from_cache => entry.last_access = now,
				_ => {
					entries.insert(
						path.to_path_buf(),
						CacheEntry {
							modification_time,
							is_directory,
							last_access: now,
						},
					);
				}
			}
		}

		if !from_cache && cached.is_some() {
			tracing::debug!(path = %path.display(), "metadata cache entry refreshed");
		}

		Ok(ResolvedMetadata {
			metadata,
			from_cache,
		})
	}

	/// Remove every entry whose last access is older than the TTL.
	///
	/// Returns the number of entries removed.
	pub fn sweep(&self) -> usize {
		let now = Instant::now();
		let mut entries = self.entries.write();
		let before = entries.len();
		entries.retain(|_, entry| self.is_fresh(entry, now));
		before - entries.len()
	}

	/// Start a task that calls [`sweep`](Self::sweep) once per TTL.
	///
	/// The task holds only a weak reference to the cache and ends when the
	/// returned handle is stopped or dropped, or when the cache is gone.
	///
	/// Must be called from within a tokio runtime.
	pub fn spawn_sweeper(self: &Arc<Self>) -> SweeperHandle {
		// interval() panics on a zero period
		let period = self.ttl.max(Duration::from_millis(1));
		let cache: Weak<Self> = Arc::downgrade(self);
		let token = CancellationToken::new();
		let cancelled = token.clone();

		let task = tokio::spawn(async move {
			let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
			ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

			loop {
				tokio::select! {
					_ = cancelled.cancelled() => break,
					_ = ticker.tick() => {
						let Some(cache) = cache.upgrade() else {
							break;
						};
						let removed = cache.sweep();
						if removed > 0 {
							tracing::debug!(removed, remaining = cache.len(), "metadata cache swept");
						}
					}
				}
			}
			tracing::debug!("metadata cache sweeper stopped");
		});

		SweeperHandle {
			token,
			task: Some(task),
		}
	}

	/// Copy of the entry for `path`, if cached
	pub fn get(&self, path: &Path) -> Option<CacheEntry> {
		self.entries.read().get(path).copied()
	}

	/// Whether `path` has an entry
	pub fn contains(&self, path: &Path) -> bool {
		self.entries.read().contains_key(path)
	}

	/// Drop the entry for `path`. Returns true if one existed.
	pub fn invalidate(&self, path: &Path) -> bool {
		self.entries.write().remove(path).is_some()
	}

	/// Drop every entry
	pub fn clear(&self) {
		self.entries.write().clear();
	}

	/// Number of entries
	pub fn len(&self) -> usize {
		self.entries.read().len()
	}

	/// True when the cache holds no entries
	pub fn is_empty(&self) -> bool {
		self.entries.read().is_empty()
	}

	fn is_fresh(&self, entry: &CacheEntry, now: Instant) -> bool {
		now.saturating_duration_since(entry.last_access) <= self.ttl
	}
}

/// Controls a running sweeper task. Dropping the handle cancels the task.
#[derive(Debug)]
pub struct SweeperHandle {
	token: CancellationToken,
	task: Option<JoinHandle<()>>,
}

impl SweeperHandle {
	/// Cancel the sweeper and wait for its task to finish.
	pub async fn stop(mut self) {
		self.token.cancel();
		if let Some(task) = self.task.take()
			&& let Err(e) = task.await
		{
			tracing::warn!(error = %e, "metadata cache sweeper ended abnormally");
		}
	}

	/// Whether cancellation has been requested
	pub fn is_stopped(&self) -> bool {
		self.token.is_cancelled()
	}
}

impl Drop for SweeperHandle {
	fn drop(&mut self) {
		self.token.cancel();
	}
}
