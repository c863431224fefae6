use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use crate::error::MiruError;
use crate::models::{ContinueWatchingEntry, MediaKey, ProgressSnapshot};

const SCHEMA_V1: &str = include_str!("../../../migrations/001_initial.sql");

/// SQLite-backed mirror of the watch-state store.
///
/// The store owns the in-memory representation; this type only reads the
/// whole state at hydration and writes individual mutations through.
pub struct Storage {
    conn: Connection,
}

impl Storage {
    /// Open (or create) the database at the given path and run migrations.
    pub fn open(path: &Path) -> Result<Self, MiruError> {
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        run_migrations(&conn)?;
        Ok(Self { conn })
    }

    /// Open an in-memory database (for tests).
    pub fn open_memory() -> Result<Self, MiruError> {
        let conn = Connection::open_in_memory()?;
        run_migrations(&conn)?;
        Ok(Self { conn })
    }

    // ── Provider preference ─────────────────────────────────────

    /// Raw persisted provider preference, if any.
    ///
    /// Returned as a string: an id written by a newer build may not parse
    /// into the current provider table, and the caller decides the fallback.
    pub fn provider_preference(&self) -> Result<Option<String>, MiruError> {
        self.conn
            .query_row(
                "SELECT provider_id FROM provider_preference WHERE id = 1",
                [],
                |row| row.get(0),
            )
            .optional()
            .map_err(Into::into)
    }

    /// Overwrite the persisted provider preference.
    pub fn set_provider_preference(&self, provider_id: &str) -> Result<(), MiruError> {
        self.conn.execute(
            "INSERT INTO provider_preference (id, provider_id) VALUES (1, ?1)
             ON CONFLICT(id) DO UPDATE SET provider_id = excluded.provider_id",
            params![provider_id],
        )?;
        Ok(())
    }

    // ── Watchlist ───────────────────────────────────────────────

    /// All watchlist keys in display order (insertion order, oldest first).
    ///
    /// Rows whose key no longer parses are dropped rather than surfaced.
    pub fn watchlist(&self) -> Result<Vec<MediaKey>, MiruError> {
        let mut stmt = self
            .conn
            .prepare("SELECT media_key FROM watchlist ORDER BY position")?;
        let keys = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .filter_map(|r| r.ok())
            .filter_map(|raw| raw.parse::<MediaKey>().ok())
            .collect();
        Ok(keys)
    }

    pub fn add_watchlist(&self, key: MediaKey) -> Result<(), MiruError> {
        self.conn.execute(
            "INSERT OR IGNORE INTO watchlist (media_key) VALUES (?1)",
            params![key.to_string()],
        )?;
        Ok(())
    }

    pub fn remove_watchlist(&self, key: MediaKey) -> Result<(), MiruError> {
        self.conn.execute(
            "DELETE FROM watchlist WHERE media_key = ?1",
            params![key.to_string()],
        )?;
        Ok(())
    }

    // ── Continue watching ───────────────────────────────────────

    /// All continue-watching entries, most recently updated first.
    ///
    /// Corrupt rows (unparseable key or snapshot) are dropped.
    pub fn continue_watching(&self) -> Result<Vec<ContinueWatchingEntry>, MiruError> {
        let mut stmt = self.conn.prepare(
            "SELECT media_key, snapshot, updated_at FROM continue_watching
             ORDER BY updated_at DESC, rowid DESC",
        )?;
        let entries = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                ))
            })?
            .filter_map(|r| r.ok())
            .filter_map(|(raw_key, raw_snapshot, raw_updated)| {
                let key = raw_key.parse::<MediaKey>().ok()?;
                let snapshot: ProgressSnapshot = serde_json::from_str(&raw_snapshot).ok()?;
                Some(ContinueWatchingEntry {
                    key,
                    snapshot,
                    updated_at: parse_datetime(&raw_updated),
                })
            })
            .collect();
        Ok(entries)
    }

    /// Insert or replace the entry for the given key.
    pub fn upsert_continue_watching(
        &self,
        entry: &ContinueWatchingEntry,
    ) -> Result<(), MiruError> {
        let snapshot_json = serde_json::to_string(&entry.snapshot).unwrap_or_default();
        self.conn.execute(
            "INSERT INTO continue_watching (media_key, snapshot, updated_at)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(media_key) DO UPDATE SET
               snapshot = excluded.snapshot,
               updated_at = excluded.updated_at",
            params![
                entry.key.to_string(),
                snapshot_json,
                entry.updated_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    pub fn remove_continue_watching(&self, key: MediaKey) -> Result<(), MiruError> {
        self.conn.execute(
            "DELETE FROM continue_watching WHERE media_key = ?1",
            params![key.to_string()],
        )?;
        Ok(())
    }

    // ── Viewed markers ──────────────────────────────────────────

    pub fn viewed(&self) -> Result<Vec<MediaKey>, MiruError> {
        let mut stmt = self.conn.prepare("SELECT media_key FROM viewed")?;
        let keys = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .filter_map(|r| r.ok())
            .filter_map(|raw| raw.parse::<MediaKey>().ok())
            .collect();
        Ok(keys)
    }

    pub fn add_viewed(&self, key: MediaKey) -> Result<(), MiruError> {
        self.conn.execute(
            "INSERT OR IGNORE INTO viewed (media_key) VALUES (?1)",
            params![key.to_string()],
        )?;
        Ok(())
    }
}

// ── Migrations ──────────────────────────────────────────────────

/// Run schema migrations using `PRAGMA user_version` for version tracking.
fn run_migrations(conn: &Connection) -> Result<(), MiruError> {
    let version: i32 = conn
        .pragma_query_value(None, "user_version", |row| row.get(0))
        .unwrap_or(0);

    if version < 1 {
        conn.execute_batch(SCHEMA_V1)?;
        conn.pragma_update(None, "user_version", 1)?;
    }
    Ok(())
}

// ── Helpers ─────────────────────────────────────────────────────

/// Parse a datetime string from SQLite (RFC 3339, or the bare format
/// `datetime('now')` produces).
fn parse_datetime(s: &str) -> DateTime<Utc> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return dt.with_timezone(&Utc);
    }
    if let Ok(naive) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return naive.and_utc();
    }
    DateTime::default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MediaKind;

    fn entry(key: MediaKey, position: f64) -> ContinueWatchingEntry {
        ContinueWatchingEntry {
            key,
            snapshot: ProgressSnapshot {
                title: "Breaking Bad".into(),
                image_url: None,
                season: Some(1),
                episode: Some(3),
                position_secs: position,
                duration_secs: 2820.0,
            },
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_provider_preference_overwrite() {
        let db = Storage::open_memory().unwrap();
        assert!(db.provider_preference().unwrap().is_none());

        db.set_provider_preference("vidsrc").unwrap();
        assert_eq!(db.provider_preference().unwrap().as_deref(), Some("vidsrc"));

        db.set_provider_preference("multiembed").unwrap();
        assert_eq!(
            db.provider_preference().unwrap().as_deref(),
            Some("multiembed")
        );
    }

    #[test]
    fn test_watchlist_order_and_dedup() {
        let db = Storage::open_memory().unwrap();
        db.add_watchlist(MediaKey::movie(550)).unwrap();
        db.add_watchlist(MediaKey::show(1396)).unwrap();
        db.add_watchlist(MediaKey::movie(550)).unwrap(); // duplicate, ignored

        let keys = db.watchlist().unwrap();
        assert_eq!(keys, vec![MediaKey::movie(550), MediaKey::show(1396)]);

        db.remove_watchlist(MediaKey::movie(550)).unwrap();
        assert_eq!(db.watchlist().unwrap(), vec![MediaKey::show(1396)]);
    }

    #[test]
    fn test_continue_watching_upsert_replaces() {
        let db = Storage::open_memory().unwrap();
        let key = MediaKey::new(MediaKind::Show, 1396);

        db.upsert_continue_watching(&entry(key, 100.0)).unwrap();
        db.upsert_continue_watching(&entry(key, 900.0)).unwrap();

        let entries = db.continue_watching().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].snapshot.position_secs, 900.0);
    }

    #[test]
    fn test_continue_watching_recency_order() {
        let db = Storage::open_memory().unwrap();
        let older = ContinueWatchingEntry {
            updated_at: Utc::now() - chrono::Duration::hours(1),
            ..entry(MediaKey::movie(550), 60.0)
        };
        db.upsert_continue_watching(&older).unwrap();
        db.upsert_continue_watching(&entry(MediaKey::show(1396), 30.0))
            .unwrap();

        let entries = db.continue_watching().unwrap();
        assert_eq!(entries[0].key, MediaKey::show(1396));
        assert_eq!(entries[1].key, MediaKey::movie(550));

        db.remove_continue_watching(MediaKey::show(1396)).unwrap();
        assert_eq!(db.continue_watching().unwrap().len(), 1);
    }

    #[test]
    fn test_viewed_idempotent() {
        let db = Storage::open_memory().unwrap();
        db.add_viewed(MediaKey::movie(550)).unwrap();
        db.add_viewed(MediaKey::movie(550)).unwrap();
        assert_eq!(db.viewed().unwrap(), vec![MediaKey::movie(550)]);
    }
}
