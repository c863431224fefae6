//! Per-mount playback session: which provider is active, which have failed,
//! and how the player advances when one dies.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, info, warn};
use url::Url;

use miru_core::models::MediaKind;
use miru_core::watch::WatchStore;

use crate::providers::{PlaybackTarget, ProviderId, ProviderRegistry};
use crate::PlaybackError;

/// Failover controller state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerState {
    Playing(ProviderId),
    /// Every registered provider failed this session. Terminal until
    /// [`PlaybackSession::reset`].
    Exhausted,
}

/// Why the controller advanced past the active provider. A user skip and a
/// detected playback error take the same transition; the name only matters
/// for observability.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailoverReason {
    PlaybackError,
    UserSkip,
}

/// One playback session, created when the player mounts and discarded when
/// it unmounts. The failed-provider set is session-local and monotonic:
/// a provider that failed once is never retried automatically, since
/// repeated retries of a dead third-party endpoint have no value within
/// one sitting.
pub struct PlaybackSession {
    registry: Arc<ProviderRegistry>,
    target: PlaybackTarget,
    state: PlayerState,
    failed: HashSet<ProviderId>,
}

impl PlaybackSession {
    /// Start a session, resolving the initial provider with precedence
    /// explicit request → persisted preference → registry default, and
    /// persisting the result as the new preference.
    pub fn start(
        registry: Arc<ProviderRegistry>,
        target: PlaybackTarget,
        requested: Option<ProviderId>,
        store: &mut WatchStore,
    ) -> Self {
        let preferred = store.preferred_provider().and_then(|raw| {
            match raw.parse::<ProviderId>() {
                Ok(id) => Some(id),
                Err(_) => {
                    debug!(raw, "ignoring unknown persisted provider preference");
                    None
                }
            }
        });
        let initial = requested
            .or(preferred)
            .unwrap_or_else(|| registry.default_provider());

        info!(provider = %initial, target = ?target, "playback session started");
        let session = Self {
            registry,
            target,
            state: PlayerState::Playing(initial),
            failed: HashSet::new(),
        };
        session.persist_selection(store);
        session
    }

    // ── Transitions ─────────────────────────────────────────────

    /// The player reported that the active provider failed to load.
    pub fn report_failure(&mut self, store: &mut WatchStore) {
        self.advance(FailoverReason::PlaybackError, store);
    }

    /// The user asked for the next provider without waiting for an error.
    pub fn skip(&mut self, store: &mut WatchStore) {
        self.advance(FailoverReason::UserSkip, store);
    }

    fn advance(&mut self, reason: FailoverReason, store: &mut WatchStore) {
        let PlayerState::Playing(current) = self.state else {
            debug!("failover requested after exhaustion, ignoring");
            return;
        };

        self.failed.insert(current);
        match self.next_untried(current) {
            Some(next) => {
                info!(from = %current, to = %next, ?reason, "switching provider");
                self.state = PlayerState::Playing(next);
                self.persist_selection(store);
            }
            None => {
                warn!(failed = self.failed.len(), "all providers exhausted");
                self.state = PlayerState::Exhausted;
            }
        }
    }

    /// First provider strictly after `current` in registry order, wrapping
    /// around, that has not failed this session.
    fn next_untried(&self, current: ProviderId) -> Option<ProviderId> {
        let order = self.registry.providers();
        let idx = order
            .iter()
            .position(|p| p.id == current)
            .unwrap_or_default();
        (1..=order.len())
            .map(|step| order[(idx + step) % order.len()].id)
            .find(|id| !self.failed.contains(id))
    }

    /// Manual selection from the provider menu. Bypasses the failed-set
    /// without clearing it, and never marks the previous provider failed.
    pub fn select(&mut self, id: ProviderId, store: &mut WatchStore) {
        if self.state == PlayerState::Exhausted {
            debug!(%id, "manual select after exhaustion requires reset, ignoring");
            return;
        }
        info!(%id, "provider selected manually");
        self.state = PlayerState::Playing(id);
        self.persist_selection(store);
    }

    /// Recover from [`PlayerState::Exhausted`]: clear the failed-set and
    /// return to the registry default. A no-op in any other state.
    pub fn reset(&mut self, store: &mut WatchStore) {
        if self.state != PlayerState::Exhausted {
            return;
        }
        let default = self.registry.default_provider();
        info!(provider = %default, "resetting exhausted session");
        self.failed.clear();
        self.state = PlayerState::Playing(default);
        self.persist_selection(store);
    }

    fn persist_selection(&self, store: &mut WatchStore) {
        if let PlayerState::Playing(id) = self.state {
            store.set_preferred_provider(id.as_str());
        }
    }

    // ── Accessors ───────────────────────────────────────────────

    pub fn state(&self) -> PlayerState {
        self.state
    }

    pub fn provider(&self) -> Option<ProviderId> {
        match self.state {
            PlayerState::Playing(id) => Some(id),
            PlayerState::Exhausted => None,
        }
    }

    pub fn is_exhausted(&self) -> bool {
        self.state == PlayerState::Exhausted
    }

    pub fn failed_providers(&self) -> &HashSet<ProviderId> {
        &self.failed
    }

    pub fn target(&self) -> &PlaybackTarget {
        &self.target
    }

    /// Embed URL for the active provider, or `None` once exhausted. Also
    /// what the "open in new tab" control exposes.
    pub fn current_url(&self) -> Result<Option<Url>, PlaybackError> {
        match self.state {
            PlayerState::Playing(id) => self.registry.build_url(id, &self.target).map(Some),
            PlayerState::Exhausted => Ok(None),
        }
    }
}

/// Player header title: `"Title - S01E02: Episode name"` for show episodes,
/// the plain title otherwise.
pub fn display_title(target: &PlaybackTarget, title: &str, episode_title: Option<&str>) -> String {
    match (target.kind, target.season, target.episode) {
        (MediaKind::Show, Some(season), Some(episode)) => {
            let mut out = format!("{title} - S{season:02}E{episode:02}");
            if let Some(episode_title) = episode_title {
                out.push_str(": ");
                out.push_str(episode_title);
            }
            out
        }
        _ => title.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use miru_core::config::AppConfig;
    use miru_core::storage::Storage;

    fn store() -> WatchStore {
        let storage = Storage::open_memory().unwrap();
        WatchStore::new(storage, &AppConfig::default().library)
    }

    fn registry() -> Arc<ProviderRegistry> {
        Arc::new(ProviderRegistry::new(&AppConfig::default().playback))
    }

    fn session(store: &mut WatchStore) -> PlaybackSession {
        PlaybackSession::start(registry(), PlaybackTarget::movie(550), None, store)
    }

    #[test]
    fn test_initial_selection_precedence() {
        let mut store = store();

        // Nothing persisted: registry default.
        let s = session(&mut store);
        assert_eq!(s.provider(), Some(ProviderId::Torrent));

        // Persisted preference beats the default.
        store.set_preferred_provider("multiembed");
        let s = session(&mut store);
        assert_eq!(s.provider(), Some(ProviderId::MultiEmbed));

        // Explicit request beats both.
        let s = PlaybackSession::start(
            registry(),
            PlaybackTarget::movie(550),
            Some(ProviderId::VidPlay),
            &mut store,
        );
        assert_eq!(s.provider(), Some(ProviderId::VidPlay));
    }

    #[test]
    fn test_unknown_preference_falls_back_to_default() {
        let mut store = store();
        store.set_preferred_provider("definitely-not-a-provider");

        let s = session(&mut store);
        assert_eq!(s.provider(), Some(ProviderId::Torrent));
    }

    #[test]
    fn test_selection_is_persisted() {
        let mut store = store();
        let mut s = session(&mut store);

        s.report_failure(&mut store);
        assert_eq!(store.preferred_provider(), Some("vidsrc"));

        s.select(ProviderId::SmashyStream, &mut store);
        assert_eq!(store.preferred_provider(), Some("smashystream"));
    }

    #[test]
    fn test_failover_visits_every_provider_once() {
        let mut store = store();
        let mut s = session(&mut store);
        let total = ProviderId::ALL.len();

        let mut visited = vec![ProviderId::Torrent];
        for _ in 0..total - 1 {
            s.report_failure(&mut store);
            visited.push(s.provider().expect("still playing"));
        }

        // Every provider seen exactly once, in registry order.
        assert_eq!(visited, ProviderId::ALL);
        assert!(!s.is_exhausted());

        // One more failure exhausts the session.
        s.report_failure(&mut store);
        assert!(s.is_exhausted());
        assert_eq!(s.failed_providers().len(), total);
    }

    #[test]
    fn test_failover_wraps_around() {
        let mut store = store();
        let mut s = PlaybackSession::start(
            registry(),
            PlaybackTarget::movie(550),
            Some(ProviderId::VidPlay),
            &mut store,
        );

        s.skip(&mut store);
        assert_eq!(s.provider(), Some(ProviderId::Torrent));
        assert!(s.failed_providers().contains(&ProviderId::VidPlay));
    }

    #[test]
    fn test_failover_skips_already_failed() {
        let mut store = store();
        let mut s = session(&mut store);

        s.report_failure(&mut store); // torrent failed -> vidsrc
        s.report_failure(&mut store); // vidsrc failed -> vidsrcpro
        s.select(ProviderId::Torrent, &mut store); // manual override onto a failed one
        s.report_failure(&mut store);

        // vidsrc already failed, so the advance lands past it.
        assert_eq!(s.provider(), Some(ProviderId::VidSrcPro));
        assert_eq!(s.failed_providers().len(), 2);
    }

    #[test]
    fn test_manual_select_does_not_mark_failed() {
        let mut store = store();
        let mut s = session(&mut store);

        s.select(ProviderId::AutoEmbed, &mut store);
        assert!(s.failed_providers().is_empty());
        assert_eq!(s.provider(), Some(ProviderId::AutoEmbed));
    }

    #[test]
    fn test_manual_select_bypasses_failed_set() {
        let mut store = store();
        let mut s = session(&mut store);

        s.report_failure(&mut store); // torrent now failed
        s.select(ProviderId::Torrent, &mut store);
        assert_eq!(s.provider(), Some(ProviderId::Torrent));
        // Still recorded as failed; the override does not clear it.
        assert!(s.failed_providers().contains(&ProviderId::Torrent));
    }

    #[test]
    fn test_reset_after_exhaustion() {
        let mut store = store();
        let mut s = session(&mut store);

        for _ in 0..ProviderId::ALL.len() {
            s.report_failure(&mut store);
        }
        assert!(s.is_exhausted());
        assert!(s.current_url().unwrap().is_none());

        // Manual select is ignored while exhausted.
        s.select(ProviderId::VidSrc, &mut store);
        assert!(s.is_exhausted());

        s.reset(&mut store);
        assert_eq!(s.provider(), Some(ProviderId::Torrent));
        assert!(s.failed_providers().is_empty());
    }

    #[test]
    fn test_reset_is_noop_while_playing() {
        let mut store = store();
        let mut s = session(&mut store);

        s.report_failure(&mut store);
        s.reset(&mut store);
        assert_eq!(s.provider(), Some(ProviderId::VidSrc));
        assert_eq!(s.failed_providers().len(), 1);
    }

    #[test]
    fn test_current_url_tracks_active_provider() {
        let mut store = store();
        let s = PlaybackSession::start(
            registry(),
            PlaybackTarget::show(1396, Some(2), Some(5)),
            Some(ProviderId::VidSrc),
            &mut store,
        );

        let url = s.current_url().unwrap().expect("playing");
        assert_eq!(url.as_str(), "https://vidsrc.to/embed/tv/1396/2/5");
    }

    #[test]
    fn test_display_title() {
        let show = PlaybackTarget::show(1396, Some(1), Some(2));
        assert_eq!(
            display_title(&show, "Breaking Bad", Some("Cat's in the Bag...")),
            "Breaking Bad - S01E02: Cat's in the Bag..."
        );
        assert_eq!(display_title(&show, "Breaking Bad", None), "Breaking Bad - S01E02");

        let movie = PlaybackTarget::movie(550);
        assert_eq!(display_title(&movie, "Fight Club", None), "Fight Club");

        // A show without explicit season/episode keeps the bare title.
        let bare = PlaybackTarget::show(1396, None, None);
        assert_eq!(display_title(&bare, "Breaking Bad", None), "Breaking Bad");
    }
}
