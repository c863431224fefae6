//! Contract for the external media catalog.
//!
//! The catalog (a TMDB-style metadata API) is a collaborator, not part of
//! this workspace: consumers plug in a client implementing [`CatalogService`]
//! and the rest of the system stays agnostic of where the data comes from.
//! A fetch failure degrades to "no data" at the call site; nothing here
//! retries.

use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::models::{MediaKey, MediaKind, ProgressSnapshot};

/// A unified media catalog interface.
pub trait CatalogService: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Full details for one title, or `None` if the catalog has no record.
    fn get_details(
        &self,
        kind: MediaKind,
        id: u64,
        language: &str,
    ) -> impl Future<Output = Result<Option<MediaDetails>, Self::Error>> + Send;

    /// Search titles by free-text query plus optional filters.
    fn search(
        &self,
        query: &str,
        filters: &SearchFilters,
    ) -> impl Future<Output = Result<Vec<MediaSummary>, Self::Error>> + Send;

    /// Episodes of one season of a show.
    fn season_episodes(
        &self,
        show_id: u64,
        season: u32,
        language: &str,
    ) -> impl Future<Output = Result<Vec<Episode>, Self::Error>> + Send;

    /// Key of a trailer video for the title, if the catalog carries one.
    fn trailer_key(
        &self,
        kind: MediaKind,
        id: u64,
        language: &str,
    ) -> impl Future<Output = Result<Option<String>, Self::Error>> + Send;
}

/// Optional narrowing for [`CatalogService::search`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchFilters {
    pub genre: Option<u64>,
    pub year: Option<u32>,
}

/// A catalog row as rendered in lists and search results.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaSummary {
    pub id: u64,
    pub kind: MediaKind,
    pub title: String,
    pub overview: Option<String>,
    pub year: Option<u32>,
    pub poster_url: Option<String>,
    pub backdrop_url: Option<String>,
    pub rating: Option<f32>,
    pub popularity: Option<f32>,
}

/// Full detail-page payload for one title.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaDetails {
    pub id: u64,
    pub kind: MediaKind,
    pub title: String,
    pub overview: Option<String>,
    pub year: Option<u32>,
    pub genres: Vec<String>,
    pub cast: Vec<CastMember>,
    pub poster_url: Option<String>,
    pub backdrop_url: Option<String>,
    pub rating: Option<f32>,
    /// Season count; shows only.
    pub seasons: Option<u32>,
}

impl MediaDetails {
    pub fn key(&self) -> MediaKey {
        MediaKey::new(self.kind, self.id)
    }

    /// Seed a continue-watching snapshot for this title.
    ///
    /// Prefers the backdrop image, falling back to the poster, the same way
    /// the continue-watching rail renders.
    pub fn progress_snapshot(
        &self,
        season: Option<u32>,
        episode: Option<u32>,
        position_secs: f64,
        duration_secs: f64,
    ) -> ProgressSnapshot {
        ProgressSnapshot {
            title: self.title.clone(),
            image_url: self
                .backdrop_url
                .clone()
                .or_else(|| self.poster_url.clone()),
            season,
            episode,
            position_secs,
            duration_secs,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CastMember {
    pub name: String,
    pub character: Option<String>,
    pub profile_url: Option<String>,
}

/// One episode of a show season.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Episode {
    pub number: u32,
    pub title: String,
    pub overview: Option<String>,
    pub still_url: Option<String>,
    pub air_date: Option<String>,
}
