use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::media::MediaKey;

/// Playback position reported by the player for one title.
///
/// Carries everything the continue-watching rail needs to render without a
/// catalog round-trip. Season/episode are set for shows only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressSnapshot {
    pub title: String,
    pub image_url: Option<String>,
    pub season: Option<u32>,
    pub episode: Option<u32>,
    pub position_secs: f64,
    pub duration_secs: f64,
}

impl ProgressSnapshot {
    /// Completion percentage, clamped to `[0, 100]`.
    ///
    /// A non-positive duration yields 0 rather than dividing by zero.
    pub fn percentage(&self) -> f32 {
        if self.duration_secs <= 0.0 {
            return 0.0;
        }
        ((self.position_secs / self.duration_secs) * 100.0).clamp(0.0, 100.0) as f32
    }
}

/// One continue-watching record. At most one exists per media key; a new
/// progress report replaces the previous snapshot outright.
#[derive(Debug, Clone)]
pub struct ContinueWatchingEntry {
    pub key: MediaKey,
    pub snapshot: ProgressSnapshot,
    pub updated_at: DateTime<Utc>,
}

impl ContinueWatchingEntry {
    pub fn percentage(&self) -> f32 {
        self.snapshot.percentage()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(position: f64, duration: f64) -> ProgressSnapshot {
        ProgressSnapshot {
            title: "Fight Club".into(),
            image_url: None,
            season: None,
            episode: None,
            position_secs: position,
            duration_secs: duration,
        }
    }

    #[test]
    fn test_percentage_basic() {
        assert_eq!(snapshot(30.0, 120.0).percentage(), 25.0);
        assert_eq!(snapshot(120.0, 120.0).percentage(), 100.0);
    }

    #[test]
    fn test_percentage_zero_duration() {
        assert_eq!(snapshot(0.0, 0.0).percentage(), 0.0);
        assert_eq!(snapshot(45.0, 0.0).percentage(), 0.0);
        assert_eq!(snapshot(45.0, -10.0).percentage(), 0.0);
    }

    #[test]
    fn test_percentage_clamped() {
        assert_eq!(snapshot(300.0, 120.0).percentage(), 100.0);
        assert_eq!(snapshot(-5.0, 120.0).percentage(), 0.0);
    }
}
