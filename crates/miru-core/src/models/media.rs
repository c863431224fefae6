use serde::{Deserialize, Serialize};

use crate::error::MiruError;

/// Kind of catalog media.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Movie,
    Show,
}

impl MediaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Movie => "movie",
            Self::Show => "show",
        }
    }

    pub fn from_str_opt(s: &str) -> Option<Self> {
        match s {
            "movie" => Some(Self::Movie),
            "show" => Some(Self::Show),
            _ => None,
        }
    }

    pub const ALL: &[MediaKind] = &[Self::Movie, Self::Show];
}

impl std::fmt::Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Canonical identity of a catalog title: kind plus numeric catalog ID.
///
/// The durable store and all watch-state collections key on the string form
/// `"movie-550"` / `"show-1396"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MediaKey {
    pub kind: MediaKind,
    pub id: u64,
}

impl MediaKey {
    pub fn new(kind: MediaKind, id: u64) -> Self {
        Self { kind, id }
    }

    pub fn movie(id: u64) -> Self {
        Self::new(MediaKind::Movie, id)
    }

    pub fn show(id: u64) -> Self {
        Self::new(MediaKind::Show, id)
    }
}

impl std::fmt::Display for MediaKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.kind, self.id)
    }
}

impl std::str::FromStr for MediaKey {
    type Err = MiruError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (kind_str, id_str) = s
            .split_once('-')
            .ok_or_else(|| MiruError::InvalidKey(s.to_string()))?;
        let kind = MediaKind::from_str_opt(kind_str)
            .ok_or_else(|| MiruError::InvalidKey(s.to_string()))?;
        let id = id_str
            .parse::<u64>()
            .map_err(|_| MiruError::InvalidKey(s.to_string()))?;
        Ok(Self { kind, id })
    }
}
