//! SQLite Store Implementation
//!
//! Mastery records, the vocabulary slice, and the append-only review log in
//! one database file. Timestamps are RFC3339 text; RFC3339 at a fixed offset
//! compares lexicographically, which is what the due-item queries rely on.

use chrono::{DateTime, Utc};
use directories::ProjectDirs;
use rusqlite::{Connection, OptionalExtension, TransactionBehavior, params};
use std::path::PathBuf;
use std::sync::Mutex;
use uuid::Uuid;

use super::{MasteryStore, Result, ReviewLog, StoreError};
use crate::mastery::{MasteryRecord, ReviewEvent, ReviewInput, ProgressStats, VocabularyItem};
use crate::srs::{Quality, ScheduleError, Scheduler, mastery_level};

// ============================================================================
// STORE
// ============================================================================

/// SQLite-backed mastery store and review log.
///
/// Uses separate reader/writer connections for interior mutability. All
/// methods take `&self` (not `&mut self`), making the store `Send + Sync` so
/// a request layer can share it behind an `Arc` without an outer mutex.
pub struct SqliteStore {
    writer: Mutex<Connection>,
    reader: Mutex<Connection>,
    scheduler: Scheduler,
}

impl SqliteStore {
    /// Apply PRAGMAs to a connection
    fn configure_connection(conn: &Connection) -> Result<()> {
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;
             PRAGMA cache_size = -64000;
             PRAGMA temp_store = MEMORY;
             PRAGMA foreign_keys = ON;
             PRAGMA busy_timeout = 5000;",
        )?;

        Ok(())
    }

    /// Create a new store instance.
    ///
    /// With no explicit path the database lands in the platform data
    /// directory, created with owner-only permissions on Unix.
    pub fn new(db_path: Option<PathBuf>) -> Result<Self> {
        let path = match db_path {
            Some(p) => p,
            None => {
                let proj_dirs = ProjectDirs::from("com", "lexika", "core").ok_or_else(|| {
                    StoreError::Init("Could not determine project directories".to_string())
                })?;

                let data_dir = proj_dirs.data_dir();
                std::fs::create_dir_all(data_dir)?;
                #[cfg(unix)]
                {
                    use std::os::unix::fs::PermissionsExt;
                    let perms = std::fs::Permissions::from_mode(0o700);
                    let _ = std::fs::set_permissions(data_dir, perms);
                }
                data_dir.join("lexika.db")
            }
        };

        let writer_conn = Connection::open(&path)?;

        #[cfg(unix)]
        if path.exists() {
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::Permissions::from_mode(0o600);
            let _ = std::fs::set_permissions(&path, perms);
        }

        Self::configure_connection(&writer_conn)?;

        // Apply migrations on writer only
        super::migrations::apply_migrations(&writer_conn)?;

        let reader_conn = Connection::open(&path)?;
        Self::configure_connection(&reader_conn)?;

        Ok(Self {
            writer: Mutex::new(writer_conn),
            reader: Mutex::new(reader_conn),
            scheduler: Scheduler::default(),
        })
    }

    // ========================================================================
    // VOCABULARY
    // ========================================================================

    /// Insert or update a vocabulary item
    pub fn upsert_vocabulary(&self, item: &VocabularyItem) -> Result<()> {
        let writer = self
            .writer
            .lock()
            .map_err(|_| StoreError::Init("Writer lock poisoned".into()))?;
        writer.execute(
            "INSERT INTO vocabulary (id, word, translation, frequency_rank)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(id) DO UPDATE SET
                word = excluded.word,
                translation = excluded.translation,
                frequency_rank = excluded.frequency_rank",
            params![item.id, item.word, item.translation, item.frequency_rank],
        )?;
        Ok(())
    }

    /// Fetch a vocabulary item by id
    pub fn get_vocabulary(&self, id: &str) -> Result<Option<VocabularyItem>> {
        let reader = self
            .reader
            .lock()
            .map_err(|_| StoreError::Init("Reader lock poisoned".into()))?;
        let mut stmt = reader.prepare(
            "SELECT id, word, translation, frequency_rank FROM vocabulary WHERE id = ?1",
        )?;

        let item = stmt
            .query_row(params![id], |row| Self::row_to_vocabulary(row))
            .optional()?;
        Ok(item)
    }

    // ========================================================================
    // REVIEWS
    // ========================================================================

    /// Record one review: validate, schedule, upsert the mastery record, and
    /// append the review event.
    ///
    /// The read-compute-write runs inside a single IMMEDIATE transaction, so
    /// concurrent submissions for the same (user, item) pair serialize
    /// instead of clobbering each other. Either everything commits or nothing
    /// does; there is no partially applied review.
    pub fn record_review(&self, input: &ReviewInput, now: DateTime<Utc>) -> Result<MasteryRecord> {
        // Reject before touching any state
        let quality = Quality::new(input.quality)?;

        let mut writer = self
            .writer
            .lock()
            .map_err(|_| StoreError::Init("Writer lock poisoned".into()))?;
        let tx = writer.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let vocabulary_exists: bool = tx
            .query_row(
                "SELECT 1 FROM vocabulary WHERE id = ?1",
                params![input.vocabulary_id],
                |_| Ok(true),
            )
            .optional()?
            .unwrap_or(false);
        if !vocabulary_exists {
            return Err(StoreError::NotFound(format!(
                "vocabulary {}",
                input.vocabulary_id
            )));
        }

        let previous = Self::read_mastery(&tx, &input.user_id, &input.vocabulary_id)?;
        let previous_state = previous.as_ref().map(MasteryRecord::state);

        let result = self
            .scheduler
            .schedule(previous_state.as_ref(), quality, now)?;

        let record = MasteryRecord {
            user_id: input.user_id.clone(),
            vocabulary_id: input.vocabulary_id.clone(),
            ease_factor: result.state.ease_factor,
            interval_days: result.state.interval_days,
            repetitions: result.state.repetitions,
            mastery_level: result.mastery_level,
            next_review_at: result.next_review_at,
            last_reviewed_at: Some(result.reviewed_at),
        };

        let event = ReviewEvent {
            id: Uuid::new_v4().to_string(),
            user_id: input.user_id.clone(),
            vocabulary_id: input.vocabulary_id.clone(),
            quality: quality.value(),
            reviewed_at: now,
        };

        Self::write_mastery(&tx, &record)?;
        Self::insert_event(&tx, &event)?;
        tx.commit()?;

        tracing::debug!(
            "Recorded review for {}/{}: q={} interval={}d reps={}",
            record.user_id,
            record.vocabulary_id,
            quality,
            record.interval_days,
            record.repetitions
        );

        Ok(record)
    }

    /// Per-user progress summary
    pub fn progress_stats(&self, user_id: &str, now: DateTime<Utc>) -> Result<ProgressStats> {
        let reader = self
            .reader
            .lock()
            .map_err(|_| StoreError::Init("Reader lock poisoned".into()))?;

        let (tracked, due_now, mastered, average_ease_factor) = reader.query_row(
            "SELECT
                COUNT(*),
                COALESCE(SUM(CASE WHEN next_review_at <= ?2 THEN 1 ELSE 0 END), 0),
                COALESCE(SUM(CASE WHEN mastery_level >= 5 THEN 1 ELSE 0 END), 0),
                AVG(ease_factor)
             FROM mastery_records WHERE user_id = ?1",
            params![user_id, now.to_rfc3339()],
            |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, i64>(2)?,
                    row.get::<_, Option<f64>>(3)?,
                ))
            },
        )?;

        Ok(ProgressStats {
            tracked,
            due_now,
            mastered,
            average_ease_factor,
        })
    }

    // ========================================================================
    // ROW MAPPING
    // ========================================================================

    /// Parse RFC3339 timestamp
    fn parse_timestamp(value: &str, field_name: &str) -> rusqlite::Result<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(value)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(
                    0,
                    rusqlite::types::Type::Text,
                    Box::new(std::io::Error::new(
                        std::io::ErrorKind::InvalidData,
                        format!("Invalid {} timestamp '{}': {}", field_name, value, e),
                    )),
                )
            })
    }

    /// Convert a row to MasteryRecord
    fn row_to_record(row: &rusqlite::Row) -> rusqlite::Result<MasteryRecord> {
        let next_review_at: String = row.get("next_review_at")?;
        let last_reviewed_at: Option<String> = row.get("last_reviewed_at")?;

        let next_review_at = Self::parse_timestamp(&next_review_at, "next_review_at")?;
        let last_reviewed_at = match last_reviewed_at {
            Some(s) => Some(Self::parse_timestamp(&s, "last_reviewed_at")?),
            None => None,
        };

        Ok(MasteryRecord {
            user_id: row.get("user_id")?,
            vocabulary_id: row.get("vocabulary_id")?,
            ease_factor: row.get("ease_factor")?,
            interval_days: row.get("interval_days")?,
            repetitions: row.get("repetitions")?,
            mastery_level: row.get("mastery_level")?,
            next_review_at,
            last_reviewed_at,
        })
    }

    /// Convert a row to VocabularyItem
    fn row_to_vocabulary(row: &rusqlite::Row) -> rusqlite::Result<VocabularyItem> {
        Ok(VocabularyItem {
            id: row.get("id")?,
            word: row.get("word")?,
            translation: row.get("translation")?,
            frequency_rank: row.get("frequency_rank")?,
        })
    }

    /// Convert a row to ReviewEvent
    fn row_to_event(row: &rusqlite::Row) -> rusqlite::Result<ReviewEvent> {
        let reviewed_at: String = row.get("reviewed_at")?;
        Ok(ReviewEvent {
            id: row.get("id")?,
            user_id: row.get("user_id")?,
            vocabulary_id: row.get("vocabulary_id")?,
            quality: row.get("quality")?,
            reviewed_at: Self::parse_timestamp(&reviewed_at, "reviewed_at")?,
        })
    }

    // ========================================================================
    // SHARED SQL (used both inside and outside the review transaction)
    // ========================================================================

    fn read_mastery(
        conn: &Connection,
        user_id: &str,
        vocabulary_id: &str,
    ) -> Result<Option<MasteryRecord>> {
        let mut stmt = conn.prepare(
            "SELECT * FROM mastery_records WHERE user_id = ?1 AND vocabulary_id = ?2",
        )?;
        let record = stmt
            .query_row(params![user_id, vocabulary_id], |row| {
                Self::row_to_record(row)
            })
            .optional()?;
        Ok(record)
    }

    fn write_mastery(conn: &Connection, record: &MasteryRecord) -> Result<()> {
        conn.execute(
            "INSERT INTO mastery_records (
                user_id, vocabulary_id, ease_factor, interval_days,
                repetitions, mastery_level, next_review_at, last_reviewed_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            ON CONFLICT(user_id, vocabulary_id) DO UPDATE SET
                ease_factor = excluded.ease_factor,
                interval_days = excluded.interval_days,
                repetitions = excluded.repetitions,
                mastery_level = excluded.mastery_level,
                next_review_at = excluded.next_review_at,
                last_reviewed_at = excluded.last_reviewed_at",
            params![
                record.user_id,
                record.vocabulary_id,
                record.ease_factor,
                record.interval_days,
                record.repetitions,
                record.mastery_level,
                record.next_review_at.to_rfc3339(),
                record.last_reviewed_at.map(|dt| dt.to_rfc3339()),
            ],
        )?;
        Ok(())
    }

    fn insert_event(conn: &Connection, event: &ReviewEvent) -> Result<()> {
        conn.execute(
            "INSERT INTO review_events (id, user_id, vocabulary_id, quality, reviewed_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                event.id,
                event.user_id,
                event.vocabulary_id,
                event.quality,
                event.reviewed_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }
}

// ============================================================================
// TRAIT IMPLEMENTATIONS
// ============================================================================

impl MasteryStore for SqliteStore {
    fn get_mastery(&self, user_id: &str, vocabulary_id: &str) -> Result<Option<MasteryRecord>> {
        let reader = self
            .reader
            .lock()
            .map_err(|_| StoreError::Init("Reader lock poisoned".into()))?;
        Self::read_mastery(&reader, user_id, vocabulary_id)
    }

    fn put_mastery(&self, record: &MasteryRecord) -> Result<()> {
        // Surface corruption instead of persisting it
        if let Some(violation) = record.state().invariant_violation() {
            return Err(ScheduleError::InvalidState(violation).into());
        }
        if record.mastery_level != mastery_level(record.repetitions) {
            return Err(ScheduleError::InvalidState(format!(
                "mastery level {} does not match {} repetitions",
                record.mastery_level, record.repetitions
            ))
            .into());
        }

        let writer = self
            .writer
            .lock()
            .map_err(|_| StoreError::Init("Writer lock poisoned".into()))?;
        Self::write_mastery(&writer, record)
    }

    fn due_records(
        &self,
        user_id: &str,
        now: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<MasteryRecord>> {
        let reader = self
            .reader
            .lock()
            .map_err(|_| StoreError::Init("Reader lock poisoned".into()))?;
        let mut stmt = reader.prepare(
            "SELECT * FROM mastery_records
             WHERE user_id = ?1 AND next_review_at <= ?2
             ORDER BY next_review_at ASC
             LIMIT ?3",
        )?;

        let records = stmt.query_map(
            params![user_id, now.to_rfc3339(), limit as i64],
            |row| Self::row_to_record(row),
        )?;

        let mut result = Vec::new();
        for record in records {
            result.push(record?);
        }
        Ok(result)
    }

    fn unseen_vocabulary(&self, user_id: &str, limit: usize) -> Result<Vec<VocabularyItem>> {
        let reader = self
            .reader
            .lock()
            .map_err(|_| StoreError::Init("Reader lock poisoned".into()))?;
        // NULL ranks sort last under DESC, so unranked words come after the
        // ranked corpus
        let mut stmt = reader.prepare(
            "SELECT v.id, v.word, v.translation, v.frequency_rank FROM vocabulary v
             WHERE NOT EXISTS (
                 SELECT 1 FROM mastery_records m
                 WHERE m.user_id = ?1 AND m.vocabulary_id = v.id
             )
             ORDER BY v.frequency_rank DESC
             LIMIT ?2",
        )?;

        let items = stmt.query_map(params![user_id, limit as i64], |row| {
            Self::row_to_vocabulary(row)
        })?;

        let mut result = Vec::new();
        for item in items {
            result.push(item?);
        }
        Ok(result)
    }
}

impl ReviewLog for SqliteStore {
    fn append_review(&self, event: &ReviewEvent) -> Result<()> {
        let writer = self
            .writer
            .lock()
            .map_err(|_| StoreError::Init("Writer lock poisoned".into()))?;
        Self::insert_event(&writer, event)
    }

    fn recent_reviews(&self, user_id: &str, limit: usize) -> Result<Vec<ReviewEvent>> {
        let reader = self
            .reader
            .lock()
            .map_err(|_| StoreError::Init("Reader lock poisoned".into()))?;
        let mut stmt = reader.prepare(
            "SELECT * FROM review_events
             WHERE user_id = ?1
             ORDER BY reviewed_at DESC
             LIMIT ?2",
        )?;

        let events = stmt.query_map(params![user_id, limit as i64], |row| {
            Self::row_to_event(row)
        })?;

        let mut result = Vec::new();
        for event in events {
            result.push(event?);
        }
        Ok(result)
    }
}

// ============================================================================
// TESTS
// ============================================================================
