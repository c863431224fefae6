//! Multi-provider video playback: the provider registry with its URL
//! builders, and the per-mount failover session.

pub mod providers;
pub mod session;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PlaybackError {
    /// A provider id outside the registry was referenced. Programmer error
    /// (or a stale persisted string); never silently substituted.
    #[error("unknown provider: {0}")]
    UnknownProvider(String),

    #[error("invalid playback URL: {0}")]
    Url(#[from] url::ParseError),
}

pub use providers::{
    PlaybackTarget, Provider, ProviderId, ProviderRegistry, EMBED_ALLOW, EMBED_REFERRER_POLICY,
};
pub use session::{display_title, FailoverReason, PlaybackSession, PlayerState};
