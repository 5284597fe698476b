//! Per-user selection state for the shared service.
//!
//! Each user's [`SelectionManager`] sits behind its own async mutex so that a
//! read-modify-save cycle for one user never interleaves with another request
//! for the same user, while different users proceed independently.

use super::SelectionManager;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::debug;

/// A user identifier, hashed so raw identifiers never reach storage or logs.
#[derive(Debug, Clone, Hash, Eq, PartialEq)]
pub struct UserKey(String);

impl UserKey {
    /// Hashes a raw user identifier. Identifiers are case-insensitive.
    pub fn from_user_id(user_id: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(user_id.trim().to_lowercase().as_bytes());
        let result = hasher.finalize();
        // First 16 bytes as hex
        Self(hex::encode(&result[..16]))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for UserKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Only show first 8 chars
        write!(f, "{}...", &self.0[..8.min(self.0.len())])
    }
}

mod hex {
    pub fn encode(bytes: &[u8]) -> String {
        bytes.iter().map(|b| format!("{:02x}", b)).collect()
    }
}

pub type SharedSelection = Arc<Mutex<SelectionManager>>;

/// Idle time after which an unused selection may be dropped from memory.
pub const DEFAULT_IDLE_TTL: Duration = Duration::from_secs(30 * 60);

struct Resident {
    selection: SharedSelection,
    last_used: Instant,
}

/// Live selections, one lock per user.
///
/// Entries are a cache over the snapshot store: [`cleanup_expired`] drops
/// the ones idle for longer than the TTL that no request still holds.
///
/// [`cleanup_expired`]: SelectionRegistry::cleanup_expired
pub struct SelectionRegistry {
    selections: DashMap<UserKey, Resident>,
    idle_ttl: Duration,
}

impl SelectionRegistry {
    pub fn new(idle_ttl: Duration) -> Self {
        Self {
            selections: DashMap::new(),
            idle_ttl,
        }
    }

    pub fn with_default_ttl() -> Self {
        Self::new(DEFAULT_IDLE_TTL)
    }

    /// The resident selection, if any. Does not load or insert.
    pub fn get(&self, key: &UserKey) -> Option<SharedSelection> {
        self.selections.get_mut(key).map(|mut resident| {
            resident.last_used = Instant::now();
            resident.selection.clone()
        })
    }

    /// Returns the user's selection, loading it on first access.
    ///
    /// `load` runs without any registry lock held. If two callers race to
    /// load the same user, the first insert wins and the other load is
    /// discarded. A failed load caches nothing.
    pub fn get_or_load<E>(
        &self,
        key: &UserKey,
        load: impl FnOnce() -> Result<SelectionManager, E>,
    ) -> Result<SharedSelection, E> {
        if let Some(selection) = self.get(key) {
            return Ok(selection);
        }

        let loaded = load()?;
        let selection = match self.selections.entry(key.clone()) {
            Entry::Occupied(mut entry) => {
                let resident = entry.get_mut();
                resident.last_used = Instant::now();
                resident.selection.clone()
            }
            Entry::Vacant(entry) => {
                let selection = Arc::new(Mutex::new(loaded));
                entry.insert(Resident {
                    selection: selection.clone(),
                    last_used: Instant::now(),
                });
                selection
            }
        };
        Ok(selection)
    }

    /// Drops the resident copy of a user's selection.
    pub fn evict(&self, key: &UserKey) {
        self.selections.remove(key);
    }

    /// Drops selections idle past the TTL. An entry whose lock handle is
    /// still held by a request is kept regardless of age.
    pub fn cleanup_expired(&self) -> usize {
        let before = self.selections.len();
        self.selections.retain(|_, resident| {
            Arc::strong_count(&resident.selection) > 1 || resident.last_used.elapsed() < self.idle_ttl
        });
        let removed = before.saturating_sub(self.selections.len());
        if removed > 0 {
            debug!("Dropped {} idle selection(s)", removed);
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.selections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selections.is_empty()
    }
}

impl Default for SelectionRegistry {
    fn default() -> Self {
        Self::with_default_ttl()
    }
}
