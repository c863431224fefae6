pub mod media;
pub mod progress;

pub use media::{MediaKey, MediaKind};
pub use progress::{ContinueWatchingEntry, ProgressSnapshot};
