use std::collections::HashSet;

use chrono::Utc;
use tracing::{debug, warn};

use crate::config::LibraryConfig;
use crate::error::MiruError;
use crate::models::{ContinueWatchingEntry, MediaKey, ProgressSnapshot};
use crate::storage::Storage;

/// Process-wide owner of the user's watch state.
///
/// Holds the watchlist, continue-watching entries, viewed markers, and the
/// provider preference in memory; the [`Storage`] mirror is read once here
/// at construction and written through on every mutation. A failed write
/// keeps the in-memory state usable for the rest of the session — mutators
/// log and carry on rather than erroring out of a user interaction.
pub struct WatchStore {
    storage: Storage,
    preferred_provider: Option<String>,
    watchlist: Vec<MediaKey>,
    /// Most recently updated first.
    continue_watching: Vec<ContinueWatchingEntry>,
    viewed: HashSet<MediaKey>,
    auto_remove_completed: bool,
    completion_threshold: f32,
}

impl WatchStore {
    /// Hydrate the store from its durable mirror.
    ///
    /// Collections that fail to load start empty; a corrupt record never
    /// poisons the session.
    pub fn new(storage: Storage, library: &LibraryConfig) -> Self {
        let preferred_provider = load_or_default(storage.provider_preference(), "preference");
        let watchlist = load_or_default(storage.watchlist(), "watchlist");
        let continue_watching =
            load_or_default(storage.continue_watching(), "continue_watching");
        let viewed: Vec<MediaKey> = load_or_default(storage.viewed(), "viewed");

        debug!(
            watchlist = watchlist.len(),
            continue_watching = continue_watching.len(),
            viewed = viewed.len(),
            "watch store hydrated"
        );

        Self {
            storage,
            preferred_provider,
            watchlist,
            continue_watching,
            viewed: viewed.into_iter().collect(),
            auto_remove_completed: library.auto_remove_completed,
            completion_threshold: library.completion_threshold,
        }
    }

    // ── Provider preference ─────────────────────────────────────

    /// Last chosen provider id, raw. Read once per playback session.
    pub fn preferred_provider(&self) -> Option<&str> {
        self.preferred_provider.as_deref()
    }

    pub fn set_preferred_provider(&mut self, provider_id: &str) {
        self.preferred_provider = Some(provider_id.to_string());
        self.persist(
            "preference",
            self.storage.set_provider_preference(provider_id),
        );
    }

    // ── Watchlist ───────────────────────────────────────────────

    pub fn is_in_watchlist(&self, key: MediaKey) -> bool {
        self.watchlist.contains(&key)
    }

    /// Append to the watchlist; a no-op if the key is already present.
    pub fn add_to_watchlist(&mut self, key: MediaKey) {
        if self.is_in_watchlist(key) {
            return;
        }
        self.watchlist.push(key);
        self.persist("watchlist", self.storage.add_watchlist(key));
    }

    pub fn remove_from_watchlist(&mut self, key: MediaKey) {
        if !self.is_in_watchlist(key) {
            return;
        }
        self.watchlist.retain(|k| *k != key);
        self.persist("watchlist", self.storage.remove_watchlist(key));
    }

    /// Add if absent, remove if present.
    pub fn toggle_watchlist(&mut self, key: MediaKey) {
        if self.is_in_watchlist(key) {
            self.remove_from_watchlist(key);
        } else {
            self.add_to_watchlist(key);
        }
    }

    /// Watchlist keys in display order (insertion order, oldest first).
    pub fn watchlist(&self) -> &[MediaKey] {
        &self.watchlist
    }

    // ── Continue watching ───────────────────────────────────────

    /// Record playback progress for a title, replacing any prior entry.
    ///
    /// Once the snapshot's completion percentage reaches the configured
    /// threshold the entry is dropped instead: a finished title has nothing
    /// left to continue.
    pub fn record_progress(&mut self, key: MediaKey, snapshot: ProgressSnapshot) {
        let percentage = snapshot.percentage();
        if self.auto_remove_completed && percentage >= self.completion_threshold {
            debug!(%key, percentage, "title complete, dropping continue-watching entry");
            self.remove_from_continue_watching(key);
            return;
        }

        let entry = ContinueWatchingEntry {
            key,
            snapshot,
            updated_at: Utc::now(),
        };
        self.continue_watching.retain(|e| e.key != key);
        self.persist(
            "continue_watching",
            self.storage.upsert_continue_watching(&entry),
        );
        self.continue_watching.insert(0, entry);
    }

    /// Entries most recently updated first.
    pub fn continue_watching(&self) -> &[ContinueWatchingEntry] {
        &self.continue_watching
    }

    pub fn remove_from_continue_watching(&mut self, key: MediaKey) {
        self.continue_watching.retain(|e| e.key != key);
        self.persist(
            "continue_watching",
            self.storage.remove_continue_watching(key),
        );
    }

    // ── Viewed markers ──────────────────────────────────────────

    /// Mark a title as opened. Idempotent.
    pub fn mark_viewed(&mut self, key: MediaKey) {
        if !self.viewed.insert(key) {
            return;
        }
        self.persist("viewed", self.storage.add_viewed(key));
    }

    pub fn is_viewed(&self, key: MediaKey) -> bool {
        self.viewed.contains(&key)
    }

    // ── Helpers ─────────────────────────────────────────────────

    fn persist(&self, collection: &str, result: Result<(), MiruError>) {
        if let Err(e) = result {
            warn!(error = %e, collection, "persistence unavailable, keeping in-memory state");
        }
    }
}

fn load_or_default<T: Default>(result: Result<T, MiruError>, collection: &str) -> T {
    result.unwrap_or_else(|e| {
        warn!(error = %e, collection, "failed to load persisted state, starting empty");
        T::default()
    })
}
