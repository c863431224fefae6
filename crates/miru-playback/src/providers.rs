//! The provider table: every third-party embed host the player can fall
//! back across, in failover order.

use serde::{Deserialize, Serialize};
use url::Url;

use miru_core::config::PlaybackConfig;
use miru_core::models::MediaKind;

use crate::PlaybackError;

/// Feature-policy allow list for the embedded player frame.
pub const EMBED_ALLOW: &str =
    "autoplay; fullscreen; picture-in-picture; encrypted-media; gyroscope; accelerometer";

/// Referrer information must not reach the third-party host.
pub const EMBED_REFERRER_POLICY: &str = "no-referrer";

/// Stable identity of a playback provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderId {
    Torrent,
    VidSrc,
    VidSrcPro,
    MultiEmbed,
    #[serde(rename = "2embed")]
    TwoEmbed,
    AutoEmbed,
    SmashyStream,
    SuperEmbed,
    VidSrcMe,
    VidPlay,
}

impl ProviderId {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Torrent => "torrent",
            Self::VidSrc => "vidsrc",
            Self::VidSrcPro => "vidsrcpro",
            Self::MultiEmbed => "multiembed",
            Self::TwoEmbed => "2embed",
            Self::AutoEmbed => "autoembed",
            Self::SmashyStream => "smashystream",
            Self::SuperEmbed => "superembed",
            Self::VidSrcMe => "vidsrcme",
            Self::VidPlay => "vidplay",
        }
    }

    pub const ALL: &[ProviderId] = &[
        Self::Torrent,
        Self::VidSrc,
        Self::VidSrcPro,
        Self::MultiEmbed,
        Self::TwoEmbed,
        Self::AutoEmbed,
        Self::SmashyStream,
        Self::SuperEmbed,
        Self::VidSrcMe,
        Self::VidPlay,
    ];
}

impl std::fmt::Display for ProviderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ProviderId {
    type Err = PlaybackError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|id| id.as_str() == s)
            .ok_or_else(|| PlaybackError::UnknownProvider(s.to_string()))
    }
}

/// A registry row: identity plus display metadata for the provider selector.
#[derive(Debug, Clone, Copy)]
pub struct Provider {
    pub id: ProviderId,
    pub name: &'static str,
    pub icon: &'static str,
}

/// What the player is pointed at. Season/episode are meaningful for shows
/// only and default to 1 when omitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaybackTarget {
    pub kind: MediaKind,
    pub catalog_id: u64,
    pub season: Option<u32>,
    pub episode: Option<u32>,
}

impl PlaybackTarget {
    pub fn movie(catalog_id: u64) -> Self {
        Self {
            kind: MediaKind::Movie,
            catalog_id,
            season: None,
            episode: None,
        }
    }

    pub fn show(catalog_id: u64, season: Option<u32>, episode: Option<u32>) -> Self {
        Self {
            kind: MediaKind::Show,
            catalog_id,
            season,
            episode,
        }
    }

    fn season_episode(&self) -> (u32, u32) {
        (self.season.unwrap_or(1), self.episode.unwrap_or(1))
    }
}

// Ordered by typical reliability; order defines both the default selection
// and the failover sequence.
const PROVIDERS: &[Provider] = &[
    Provider {
        id: ProviderId::Torrent,
        name: "Torrent (P2P)",
        icon: "download",
    },
    Provider {
        id: ProviderId::VidSrc,
        name: "VidSrc.to",
        icon: "server",
    },
    Provider {
        id: ProviderId::VidSrcPro,
        name: "VidSrc.Pro",
        icon: "zap",
    },
    Provider {
        id: ProviderId::MultiEmbed,
        name: "MultiEmbed",
        icon: "globe",
    },
    Provider {
        id: ProviderId::TwoEmbed,
        name: "2Embed",
        icon: "film",
    },
    Provider {
        id: ProviderId::AutoEmbed,
        name: "AutoEmbed",
        icon: "globe",
    },
    Provider {
        id: ProviderId::SmashyStream,
        name: "SmashyStream",
        icon: "clapperboard",
    },
    Provider {
        id: ProviderId::SuperEmbed,
        name: "SuperEmbed",
        icon: "play",
    },
    Provider {
        id: ProviderId::VidSrcMe,
        name: "VidSrc.me",
        icon: "video",
    },
    Provider {
        id: ProviderId::VidPlay,
        name: "VidPlay",
        icon: "tv",
    },
];

/// The immutable, ordered provider table plus the config the torrent
/// provider's URLs are built from. Pure: only constructs URLs, never
/// touches the network.
pub struct ProviderRegistry {
    torrent_api_url: String,
    torrent_api_key: String,
}

impl ProviderRegistry {
    pub fn new(playback: &PlaybackConfig) -> Self {
        Self {
            torrent_api_url: playback.torrent_api_url.clone(),
            torrent_api_key: playback.torrent_api_key.clone(),
        }
    }

    /// All providers in failover order.
    pub fn providers(&self) -> &'static [Provider] {
        PROVIDERS
    }

    /// The first registry entry, used when nothing else decides.
    pub fn default_provider(&self) -> ProviderId {
        PROVIDERS[0].id
    }

    /// Display metadata for a provider.
    pub fn get(&self, id: ProviderId) -> &'static Provider {
        PROVIDERS
            .iter()
            .find(|p| p.id == id)
            .unwrap_or(&PROVIDERS[0])
    }

    /// Build the embed URL for one provider and target.
    pub fn build_url(
        &self,
        id: ProviderId,
        target: &PlaybackTarget,
    ) -> Result<Url, PlaybackError> {
        let tmdb_id = target.catalog_id;
        let (s, e) = target.season_episode();

        let url = match (id, target.kind) {
            (ProviderId::Torrent, kind) => {
                let base = self.torrent_api_url.trim_end_matches('/');
                let mut url = Url::parse(&format!("{base}/embed/{tmdb_id}"))?;
                {
                    let mut pairs = url.query_pairs_mut();
                    pairs.append_pair("apikey", &self.torrent_api_key);
                    match kind {
                        MediaKind::Movie => {
                            pairs.append_pair("type", "movie");
                        }
                        MediaKind::Show => {
                            pairs
                                .append_pair("type", "tv")
                                .append_pair("season", &s.to_string())
                                .append_pair("episode", &e.to_string());
                        }
                    }
                }
                url
            }
            (ProviderId::VidSrc, MediaKind::Movie) => {
                Url::parse(&format!("https://vidsrc.to/embed/movie/{tmdb_id}"))?
            }
            (ProviderId::VidSrc, MediaKind::Show) => {
                Url::parse(&format!("https://vidsrc.to/embed/tv/{tmdb_id}/{s}/{e}"))?
            }
            (ProviderId::VidSrcPro, MediaKind::Movie) => {
                Url::parse(&format!("https://vidsrc.pro/embed/movie/{tmdb_id}"))?
            }
            (ProviderId::VidSrcPro, MediaKind::Show) => {
                Url::parse(&format!("https://vidsrc.pro/embed/tv/{tmdb_id}/{s}/{e}"))?
            }
            // SuperEmbed fronts the same MultiEmbed direct-stream endpoint.
            (ProviderId::MultiEmbed | ProviderId::SuperEmbed, MediaKind::Movie) => Url::parse(
                &format!("https://multiembed.mov/directstream.php?video_id={tmdb_id}&tmdb=1"),
            )?,
            (ProviderId::MultiEmbed | ProviderId::SuperEmbed, MediaKind::Show) => {
                Url::parse(&format!(
                    "https://multiembed.mov/directstream.php?video_id={tmdb_id}&tmdb=1&s={s}&e={e}"
                ))?
            }
            (ProviderId::TwoEmbed, MediaKind::Movie) => Url::parse(&format!(
                "https://www.2embed.to/embed/tmdb/movie?id={tmdb_id}"
            ))?,
            (ProviderId::TwoEmbed, MediaKind::Show) => Url::parse(&format!(
                "https://www.2embed.to/embed/tmdb/tv?id={tmdb_id}&s={s}&e={e}"
            ))?,
            (ProviderId::AutoEmbed, MediaKind::Movie) => {
                Url::parse(&format!("https://autoembed.to/tmdb/movie/{tmdb_id}"))?
            }
            (ProviderId::AutoEmbed, MediaKind::Show) => {
                Url::parse(&format!("https://autoembed.to/tmdb/tv/{tmdb_id}-{s}-{e}"))?
            }
            (ProviderId::SmashyStream, MediaKind::Movie) => {
                Url::parse(&format!("https://player.smashy.stream/movie/{tmdb_id}"))?
            }
            (ProviderId::SmashyStream, MediaKind::Show) => Url::parse(&format!(
                "https://player.smashy.stream/tv/{tmdb_id}?s={s}&e={e}"
            ))?,
            (ProviderId::VidSrcMe, MediaKind::Movie) => {
                Url::parse(&format!("https://vidsrc.me/embed/movie/{tmdb_id}"))?
            }
            (ProviderId::VidSrcMe, MediaKind::Show) => {
                Url::parse(&format!("https://vidsrc.me/embed/tv/{tmdb_id}/{s}/{e}"))?
            }
            (ProviderId::VidPlay, MediaKind::Movie) => {
                Url::parse(&format!("https://vidplay.online/embed/movie/{tmdb_id}"))?
            }
            (ProviderId::VidPlay, MediaKind::Show) => {
                Url::parse(&format!("https://vidplay.online/embed/tv/{tmdb_id}/{s}/{e}"))?
            }
        };
        Ok(url)
    }
}
