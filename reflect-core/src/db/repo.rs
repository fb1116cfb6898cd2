//! Database repository layer
//!
//! Provides query and insert operations for journal entries. Every
//! operation is scoped to an owner; an entry belonging to another owner
//! behaves exactly like a missing entry.

use crate::error::{Error, Result};
use crate::types::{Analysis, JournalEntry, Mood};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::PathBuf;
use std::sync::Mutex;

/// Sort key for entry list queries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EntrySort {
    #[default]
    CreatedAt,
    UpdatedAt,
    MoodIntensity,
}

impl EntrySort {
    fn as_column(&self) -> &'static str {
        match self {
            EntrySort::CreatedAt => "created_at",
            EntrySort::UpdatedAt => "updated_at",
            EntrySort::MoodIntensity => "mood_intensity",
        }
    }
}

impl std::str::FromStr for EntrySort {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "created_at" => Ok(EntrySort::CreatedAt),
            "updated_at" => Ok(EntrySort::UpdatedAt),
            "mood_intensity" => Ok(EntrySort::MoodIntensity),
            _ => Err(format!("unknown sort key: {}", s)),
        }
    }
}

/// Sort direction for entry list queries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDir {
    Asc,
    #[default]
    Desc,
}

impl SortDir {
    fn as_sql(&self) -> &'static str {
        match self {
            SortDir::Asc => "ASC",
            SortDir::Desc => "DESC",
        }
    }
}

impl std::str::FromStr for SortDir {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "asc" => Ok(SortDir::Asc),
            "desc" => Ok(SortDir::Desc),
            _ => Err(format!("unknown sort direction: {}", s)),
        }
    }
}

/// Filter for entry list queries
#[derive(Debug, Clone, Default)]
pub struct EntryFilter {
    /// Filter by mood
    pub mood: Option<Mood>,
    /// Filter by tag (exact, normalized)
    pub tag: Option<String>,
    /// Free-text search over title, content, and tags
    pub search: Option<String>,
    /// Only entries created at or after this time
    pub since: Option<DateTime<Utc>>,
    /// Only entries created before this time
    pub until: Option<DateTime<Utc>>,
    /// Filter by important flag
    pub is_important: Option<bool>,
    /// Filter by resolved flag
    pub is_resolved: Option<bool>,
    /// Sort key (default: created_at)
    pub sort: EntrySort,
    /// Sort direction (default: descending)
    pub dir: SortDir,
    /// 1-based page number
    pub page: usize,
    /// Page size, clamped to 1..=100
    pub per_page: usize,
}

impl EntryFilter {
    /// Effective page, never below 1
    pub fn page(&self) -> usize {
        self.page.max(1)
    }

    /// Effective page size, clamped to 1..=100 (default 10)
    pub fn per_page(&self) -> usize {
        if self.per_page == 0 {
            10
        } else {
            self.per_page.min(100)
        }
    }
}

/// One page of entries plus the total match count
#[derive(Debug, Clone)]
pub struct EntryPage {
    pub entries: Vec<JournalEntry>,
    pub total: i64,
}

/// Database handle (single connection guarded by a mutex)
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open or create a database at the given path
    pub fn open(path: &PathBuf) -> Result<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;

        // Enable foreign keys and WAL mode for better concurrency
        conn.execute_batch(
            "
            PRAGMA foreign_keys = ON;
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA cache_size = -64000;  -- 64MB cache
            ",
        )?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute("PRAGMA foreign_keys = ON", [])?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Run migrations on this database
    pub fn migrate(&self) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        super::schema::run_migrations(&conn)
    }

    // ============================================
    // Entry CRUD
    // ============================================

    /// Insert a new entry
    pub fn insert_entry(&self, entry: &JournalEntry) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            r#"
            INSERT INTO entries (id, owner_id, title, content, mood, mood_intensity, tags,
                                 is_important, is_resolved, word_count, reading_time_min,
                                 analysis, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
            "#,
            params![
                entry.id,
                entry.owner_id,
                entry.title,
                entry.content,
                entry.mood.as_str(),
                entry.mood_intensity,
                serde_json::to_string(&entry.tags)?,
                entry.is_important,
                entry.is_resolved,
                entry.word_count,
                entry.reading_time_min,
                serde_json::to_string(&entry.analysis)?,
                entry.created_at.to_rfc3339(),
                entry.updated_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Get an entry by ID, scoped to its owner
    pub fn get_entry(&self, owner_id: &str, id: &str) -> Result<Option<JournalEntry>> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            "SELECT * FROM entries WHERE id = ?1 AND owner_id = ?2",
            params![id, owner_id],
            Self::row_to_entry,
        )
        .optional()
        .map_err(Error::from)
    }

    /// Rewrite the mutable columns of an existing entry
    pub fn update_entry(&self, entry: &JournalEntry) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        let updated = conn.execute(
            r#"
            UPDATE entries SET
                title = ?1,
                content = ?2,
                mood = ?3,
                mood_intensity = ?4,
                tags = ?5,
                is_important = ?6,
                is_resolved = ?7,
                word_count = ?8,
                reading_time_min = ?9,
                analysis = ?10,
                updated_at = ?11
            WHERE id = ?12 AND owner_id = ?13
            "#,
            params![
                entry.title,
                entry.content,
                entry.mood.as_str(),
                entry.mood_intensity,
                serde_json::to_string(&entry.tags)?,
                entry.is_important,
                entry.is_resolved,
                entry.word_count,
                entry.reading_time_min,
                serde_json::to_string(&entry.analysis)?,
                entry.updated_at.to_rfc3339(),
                entry.id,
                entry.owner_id,
            ],
        )?;

        if updated == 0 {
            return Err(Error::EntryNotFound(entry.id.clone()));
        }
        Ok(())
    }

    /// Delete an entry. Returns true if a row was removed.
    pub fn delete_entry(&self, owner_id: &str, id: &str) -> Result<bool> {
        let conn = self.conn.lock().unwrap();
        let deleted = conn.execute(
            "DELETE FROM entries WHERE id = ?1 AND owner_id = ?2",
            params![id, owner_id],
        )?;
        Ok(deleted > 0)
    }

    /// Replace the analysis attached to an entry
    pub fn store_analysis(&self, owner_id: &str, id: &str, analysis: &Analysis) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        let updated = conn.execute(
            "UPDATE entries SET analysis = ?1 WHERE id = ?2 AND owner_id = ?3",
            params![serde_json::to_string(analysis)?, id, owner_id],
        )?;

        if updated == 0 {
            return Err(Error::EntryNotFound(id.to_string()));
        }
        Ok(())
    }

    /// Store an analysis only if the entry has not been edited since
    /// `expected_updated_at`.
    ///
    /// Returns false when the entry was modified or deleted in the
    /// meantime; the stale analysis is discarded instead of clobbering
    /// the reset state of the edited entry.
    pub fn store_analysis_if_current(
        &self,
        owner_id: &str,
        id: &str,
        analysis: &Analysis,
        expected_updated_at: DateTime<Utc>,
    ) -> Result<bool> {
        let conn = self.conn.lock().unwrap();
        let updated = conn.execute(
            "UPDATE entries SET analysis = ?1 WHERE id = ?2 AND owner_id = ?3 AND updated_at = ?4",
            params![
                serde_json::to_string(analysis)?,
                id,
                owner_id,
                expected_updated_at.to_rfc3339()
            ],
        )?;
        Ok(updated > 0)
    }

    // ============================================
    // Entry queries
    // ============================================

    /// List entries with filtering, sorting, and pagination
    pub fn list_entries(&self, owner_id: &str, filter: &EntryFilter) -> Result<EntryPage> {
        let conn = self.conn.lock().unwrap();

        let mut where_sql = String::from("WHERE owner_id = ?");
        let mut params: Vec<Box<dyn rusqlite::ToSql>> = vec![Box::new(owner_id.to_string())];

        if let Some(mood) = &filter.mood {
            where_sql.push_str(" AND mood = ?");
            params.push(Box::new(mood.as_str().to_string()));
        }

        if let Some(tag) = &filter.tag {
            // Tags are stored as a JSON array of normalized strings
            where_sql.push_str(" AND tags LIKE ?");
            params.push(Box::new(format!("%\"{}\"%", tag.trim().to_lowercase())));
        }

        if let Some(search) = &filter.search {
            where_sql.push_str(" AND (title LIKE ? OR content LIKE ? OR tags LIKE ?)");
            let pattern = format!("%{}%", search);
            params.push(Box::new(pattern.clone()));
            params.push(Box::new(pattern.clone()));
            params.push(Box::new(pattern));
        }

        if let Some(since) = &filter.since {
            where_sql.push_str(" AND created_at >= ?");
            params.push(Box::new(since.to_rfc3339()));
        }

        if let Some(until) = &filter.until {
            where_sql.push_str(" AND created_at < ?");
            params.push(Box::new(until.to_rfc3339()));
        }

        if let Some(important) = filter.is_important {
            where_sql.push_str(" AND is_important = ?");
            params.push(Box::new(important));
        }

        if let Some(resolved) = filter.is_resolved {
            where_sql.push_str(" AND is_resolved = ?");
            params.push(Box::new(resolved));
        }

        let params_refs: Vec<&dyn rusqlite::ToSql> = params.iter().map(|p| p.as_ref()).collect();

        let total: i64 = conn.query_row(
            &format!("SELECT COUNT(*) FROM entries {}", where_sql),
            params_refs.as_slice(),
            |r| r.get(0),
        )?;

        let sql = format!(
            "SELECT * FROM entries {} ORDER BY {} {} LIMIT {} OFFSET {}",
            where_sql,
            filter.sort.as_column(),
            filter.dir.as_sql(),
            filter.per_page(),
            (filter.page() - 1) * filter.per_page(),
        );

        let mut stmt = conn.prepare(&sql)?;
        let entries = stmt
            .query_map(params_refs.as_slice(), Self::row_to_entry)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(EntryPage { entries, total })
    }

    /// All entries created in `[since, until)`, ascending by creation time.
    ///
    /// This feeds every aggregator: unanalyzed entries are included, and
    /// consumers that need analyzed-only filter in memory.
    pub fn entries_in_window(
        &self,
        owner_id: &str,
        since: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> Result<Vec<JournalEntry>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            r#"
            SELECT * FROM entries
            WHERE owner_id = ?1 AND created_at >= ?2 AND created_at < ?3
            ORDER BY created_at ASC
            "#,
        )?;

        let entries = stmt
            .query_map(
                params![owner_id, since.to_rfc3339(), until.to_rfc3339()],
                Self::row_to_entry,
            )?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(entries)
    }

    /// Creation timestamps of all entries at or after `since`, for streaks
    pub fn entry_timestamps(
        &self,
        owner_id: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<DateTime<Utc>>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT created_at FROM entries WHERE owner_id = ?1 AND created_at >= ?2",
        )?;

        let timestamps = stmt
            .query_map(params![owner_id, since.to_rfc3339()], |row| {
                row.get::<_, String>(0)
            })?
            .filter_map(|r| r.ok())
            .filter_map(|s| {
                DateTime::parse_from_rfc3339(&s)
                    .map(|dt| dt.with_timezone(&Utc))
                    .ok()
            })
            .collect();

        Ok(timestamps)
    }

    /// The most recently created entries, newest first
    pub fn recent_entries(&self, owner_id: &str, limit: usize) -> Result<Vec<JournalEntry>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT * FROM entries WHERE owner_id = ?1 ORDER BY created_at DESC LIMIT ?2",
        )?;

        let entries = stmt
            .query_map(params![owner_id, limit as i64], Self::row_to_entry)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(entries)
    }

    /// Oldest entries whose analysis has not completed, for batch analysis
    pub fn unprocessed_entries(&self, owner_id: &str, limit: usize) -> Result<Vec<JournalEntry>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            r#"
            SELECT * FROM entries
            WHERE owner_id = ?1
              AND COALESCE(json_extract(analysis, '$.processed'), 0) = 0
            ORDER BY created_at ASC
            LIMIT ?2
            "#,
        )?;

        let entries = stmt
            .query_map(params![owner_id, limit as i64], Self::row_to_entry)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(entries)
    }

    /// Distinct tags with usage counts, most used first.
    ///
    /// Tags live in a JSON column, so counting happens in memory rather
    /// than in SQL.
    pub fn distinct_tags(&self, owner_id: &str) -> Result<Vec<(String, i64)>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare("SELECT tags FROM entries WHERE owner_id = ?1")?;

        let tag_lists: Vec<Vec<String>> = stmt
            .query_map([owner_id], |row| row.get::<_, String>(0))?
            .filter_map(|r| r.ok())
            .filter_map(|s| serde_json::from_str(&s).ok())
            .collect();

        let mut counts: std::collections::HashMap<String, i64> = std::collections::HashMap::new();
        for tags in tag_lists {
            for tag in tags {
                *counts.entry(tag).or_insert(0) += 1;
            }
        }

        let mut tags: Vec<(String, i64)> = counts.into_iter().collect();
        tags.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        Ok(tags)
    }

    /// Total entry count for an owner
    pub fn count_entries(&self, owner_id: &str) -> Result<i64> {
        let conn = self.conn.lock().unwrap();
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM entries WHERE owner_id = ?1",
            [owner_id],
            |r| r.get(0),
        )?;
        Ok(count)
    }

    fn row_to_entry(row: &Row) -> rusqlite::Result<JournalEntry> {
        let mood_str: String = row.get("mood")?;
        let tags_str: String = row.get("tags")?;
        let analysis_str: String = row.get("analysis")?;
        let created_at_str: String = row.get("created_at")?;
        let updated_at_str: String = row.get("updated_at")?;

        Ok(JournalEntry {
            id: row.get("id")?,
            owner_id: row.get("owner_id")?,
            title: row.get("title")?,
            content: row.get("content")?,
            mood: mood_str.parse().unwrap_or(Mood::Neutral),
            mood_intensity: row.get("mood_intensity")?,
            tags: serde_json::from_str(&tags_str).unwrap_or_default(),
            is_important: row.get("is_important")?,
            is_resolved: row.get("is_resolved")?,
            word_count: row.get("word_count")?,
            reading_time_min: row.get("reading_time_min")?,
            analysis: serde_json::from_str(&analysis_str).unwrap_or_default(),
            created_at: DateTime::parse_from_rfc3339(&created_at_str)
                .map(|dt| dt.with_timezone(&Utc))
                .unwrap_or_else(|_| Utc::now()),
            updated_at: DateTime::parse_from_rfc3339(&updated_at_str)
                .map(|dt| dt.with_timezone(&Utc))
                .unwrap_or_else(|_| Utc::now()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::NewEntry;

    fn test_db() -> Database {
        let db = Database::open_in_memory().unwrap();
        db.migrate().unwrap();
        db
    }

    fn make_entry(owner: &str, title: &str, mood: Mood) -> JournalEntry {
        NewEntry {
            title: title.to_string(),
            content: format!("Content for {}.", title),
            mood,
            mood_intensity: 5,
            tags: vec!["daily".to_string()],
            is_important: false,
            is_resolved: false,
        }
        .into_entry(owner)
        .unwrap()
    }

    #[test]
    fn test_insert_and_get_roundtrip() {
        let db = test_db();
        let entry = make_entry("owner-1", "First", Mood::Happy);
        db.insert_entry(&entry).unwrap();

        let loaded = db.get_entry("owner-1", &entry.id).unwrap().unwrap();
        assert_eq!(loaded.title, "First");
        assert_eq!(loaded.mood, Mood::Happy);
        assert_eq!(loaded.tags, vec!["daily"]);
        assert!(!loaded.analysis.processed);
    }

    #[test]
    fn test_owner_isolation() {
        let db = test_db();
        let entry = make_entry("owner-1", "Private", Mood::Neutral);
        db.insert_entry(&entry).unwrap();

        assert!(db.get_entry("owner-2", &entry.id).unwrap().is_none());
        assert!(!db.delete_entry("owner-2", &entry.id).unwrap());
        assert!(db.get_entry("owner-1", &entry.id).unwrap().is_some());
    }

    #[test]
    fn test_delete_entry() {
        let db = test_db();
        let entry = make_entry("owner-1", "Gone", Mood::Sad);
        db.insert_entry(&entry).unwrap();

        assert!(db.delete_entry("owner-1", &entry.id).unwrap());
        assert!(db.get_entry("owner-1", &entry.id).unwrap().is_none());
        assert!(!db.delete_entry("owner-1", &entry.id).unwrap());
    }

    #[test]
    fn test_store_analysis() {
        let db = test_db();
        let entry = make_entry("owner-1", "Analyzed", Mood::Anxious);
        db.insert_entry(&entry).unwrap();

        let mut analysis = Analysis::default();
        analysis.mark_processed();
        db.store_analysis("owner-1", &entry.id, &analysis).unwrap();

        let loaded = db.get_entry("owner-1", &entry.id).unwrap().unwrap();
        assert!(loaded.analysis.processed);
        assert!(loaded.analysis.processed_at.is_some());
    }

    #[test]
    fn test_stale_analysis_is_discarded() {
        let db = test_db();
        let entry = make_entry("owner-1", "Edited", Mood::Anxious);
        db.insert_entry(&entry).unwrap();

        // Entry is edited while an analysis of the old content is in flight
        let mut edited = entry.clone();
        edited.content = "Completely new content.".to_string();
        edited.updated_at = Utc::now() + chrono::Duration::milliseconds(1);
        db.update_entry(&edited).unwrap();

        let mut stale = Analysis::default();
        stale.mark_processed();
        let stored = db
            .store_analysis_if_current("owner-1", &entry.id, &stale, entry.updated_at)
            .unwrap();
        assert!(!stored);

        let loaded = db.get_entry("owner-1", &entry.id).unwrap().unwrap();
        assert!(!loaded.analysis.processed);

        // With the current timestamp the store goes through
        let stored = db
            .store_analysis_if_current("owner-1", &entry.id, &stale, edited.updated_at)
            .unwrap();
        assert!(stored);
        let loaded = db.get_entry("owner-1", &entry.id).unwrap().unwrap();
        assert!(loaded.analysis.processed);
    }

    #[test]
    fn test_list_entries_filters_and_pagination() {
        let db = test_db();
        for i in 0..15 {
            let mood = if i % 2 == 0 { Mood::Happy } else { Mood::Sad };
            db.insert_entry(&make_entry("owner-1", &format!("Entry {}", i), mood))
                .unwrap();
        }

        let page = db
            .list_entries("owner-1", &EntryFilter::default())
            .unwrap();
        assert_eq!(page.total, 15);
        assert_eq!(page.entries.len(), 10);

        let filter = EntryFilter {
            page: 2,
            ..Default::default()
        };
        let page2 = db.list_entries("owner-1", &filter).unwrap();
        assert_eq!(page2.entries.len(), 5);

        let happy = EntryFilter {
            mood: Some(Mood::Happy),
            ..Default::default()
        };
        let page = db.list_entries("owner-1", &happy).unwrap();
        assert_eq!(page.total, 8);
    }

    #[test]
    fn test_list_entries_search() {
        let db = test_db();
        db.insert_entry(&make_entry("owner-1", "Meeting notes", Mood::Stressed))
            .unwrap();
        db.insert_entry(&make_entry("owner-1", "Weekend plans", Mood::Excited))
            .unwrap();

        let filter = EntryFilter {
            search: Some("weekend".to_string()),
            ..Default::default()
        };
        let page = db.list_entries("owner-1", &filter).unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.entries[0].title, "Weekend plans");
    }

    #[test]
    fn test_entries_in_window_ascending() {
        let db = test_db();
        let mut a = make_entry("owner-1", "Older", Mood::Neutral);
        a.created_at = Utc::now() - chrono::Duration::days(3);
        let mut b = make_entry("owner-1", "Newer", Mood::Neutral);
        b.created_at = Utc::now() - chrono::Duration::days(1);
        db.insert_entry(&b).unwrap();
        db.insert_entry(&a).unwrap();

        let window = db
            .entries_in_window(
                "owner-1",
                Utc::now() - chrono::Duration::days(7),
                Utc::now(),
            )
            .unwrap();
        assert_eq!(window.len(), 2);
        assert_eq!(window[0].title, "Older");
        assert_eq!(window[1].title, "Newer");

        // Out-of-window entries are excluded
        let narrow = db
            .entries_in_window(
                "owner-1",
                Utc::now() - chrono::Duration::days(2),
                Utc::now(),
            )
            .unwrap();
        assert_eq!(narrow.len(), 1);
    }

    #[test]
    fn test_unprocessed_entries() {
        let db = test_db();
        let processed = make_entry("owner-1", "Done", Mood::Content);
        let pending = make_entry("owner-1", "Pending", Mood::Anxious);
        db.insert_entry(&processed).unwrap();
        db.insert_entry(&pending).unwrap();

        let mut analysis = Analysis::default();
        analysis.mark_processed();
        db.store_analysis("owner-1", &processed.id, &analysis)
            .unwrap();

        let unprocessed = db.unprocessed_entries("owner-1", 10).unwrap();
        assert_eq!(unprocessed.len(), 1);
        assert_eq!(unprocessed[0].title, "Pending");
    }

    #[test]
    fn test_distinct_tags() {
        let db = test_db();
        let mut a = make_entry("owner-1", "One", Mood::Happy);
        a.tags = vec!["work".to_string(), "stress".to_string()];
        let mut b = make_entry("owner-1", "Two", Mood::Happy);
        b.tags = vec!["work".to_string()];
        db.insert_entry(&a).unwrap();
        db.insert_entry(&b).unwrap();

        let tags = db.distinct_tags("owner-1").unwrap();
        assert_eq!(tags[0], ("work".to_string(), 2));
        assert_eq!(tags[1], ("stress".to_string(), 1));
    }
}
