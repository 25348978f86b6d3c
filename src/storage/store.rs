//! Record Store
//!
//! Persistence for the four health log collections behind the
//! `RecordStore` trait. The analysis engine never talks to a store
//! directly; handlers fetch a full `RecordSet` once per request and hand
//! it over.
//!
//! Two implementations:
//! - `SqliteStore`: SQLite-backed, one table per record kind
//! - `MemoryStore`: in-process, used by tests and benchmarks
//!
//! Storage order is insertion order. Every insert gets a monotonically
//! increasing id and every fetch returns records sorted by that id.

use crate::storage::error::{StorageError, StorageResult};
use crate::storage::types::{
    format_date, DietRecord, MenstrualRecord, RecordCounts, RecordSet, SleepRecord,
    SymptomRecord, DATE_FORMAT,
};
use async_trait::async_trait;
use chrono::NaiveDate;
use rusqlite::{params, Connection, OpenFlags};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Mutex;
use tokio::sync::RwLock;

/// Read/write access to the stored health logs
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Store a sleep record, returning it with its assigned id
    async fn insert_sleep(&self, record: SleepRecord) -> StorageResult<SleepRecord>;

    /// Store a diet record
    async fn insert_diet(&self, record: DietRecord) -> StorageResult<DietRecord>;

    /// Store a menstrual record
    async fn insert_menstrual(&self, record: MenstrualRecord) -> StorageResult<MenstrualRecord>;

    /// Store a symptom record
    async fn insert_symptoms(&self, record: SymptomRecord) -> StorageResult<SymptomRecord>;

    /// Fetch every stored record, each collection in storage order
    async fn fetch_all(&self) -> StorageResult<RecordSet>;

    /// Number of stored records per kind
    async fn counts(&self) -> StorageResult<RecordCounts> {
        Ok(self.fetch_all().await?.counts())
    }
}

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS sleep (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        date TEXT NOT NULL,
        duration REAL NOT NULL,
        quality INTEGER NOT NULL DEFAULT 0,
        disruptions TEXT NOT NULL DEFAULT '',
        notes TEXT NOT NULL DEFAULT ''
    );
    CREATE TABLE IF NOT EXISTS diet (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        date TEXT NOT NULL,
        meal TEXT NOT NULL,
        items TEXT NOT NULL DEFAULT '[]',
        notes TEXT NOT NULL DEFAULT ''
    );
    CREATE TABLE IF NOT EXISTS menstrual (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        date TEXT NOT NULL,
        period_event TEXT NOT NULL,
        flow_level TEXT NOT NULL,
        notes TEXT NOT NULL DEFAULT ''
    );
    CREATE TABLE IF NOT EXISTS symptoms (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        date TEXT NOT NULL,
        nausea INTEGER NOT NULL,
        fatigue INTEGER NOT NULL,
        pain INTEGER NOT NULL,
        notes TEXT NOT NULL DEFAULT ''
    );
";

/// SQLite-backed record store
pub struct SqliteStore {
    conn: Mutex<Connection>,
    path: Option<PathBuf>,
}

impl SqliteStore {
    /// Create or open a store at the given database file
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let path = path.as_ref().to_path_buf();

        // Create parent directory if needed
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open_with_flags(
            &path,
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_CREATE
                | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            ",
        )?;

        Self::init(conn, Some(path))
    }

    /// Open a throwaway in-memory store
    pub fn open_in_memory() -> StorageResult<Self> {
        Self::init(Connection::open_in_memory()?, None)
    }

    fn init(conn: Connection, path: Option<PathBuf>) -> StorageResult<Self> {
        conn.execute_batch(SCHEMA)?;

        tracing::debug!(path = ?path, "Record store ready");

        Ok(Self {
            conn: Mutex::new(conn),
            path,
        })
    }

    /// Database file path, `None` for in-memory stores
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn with_conn<T>(&self, f: impl FnOnce(&Connection) -> StorageResult<T>) -> StorageResult<T> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| StorageError::Lock(e.to_string()))?;
        f(&conn)
    }

    fn load_sleep(conn: &Connection) -> StorageResult<Vec<SleepRecord>> {
        let mut stmt = conn.prepare_cached(
            "SELECT id, date, duration, quality, disruptions, notes FROM sleep ORDER BY id",
        )?;

        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, f64>(2)?,
                row.get::<_, i32>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, String>(5)?,
            ))
        })?;

        let mut records = Vec::new();
        for row in rows {
            let (id, date, duration_hours, quality, disruptions, notes) = row?;
            records.push(SleepRecord {
                id,
                date: parse_stored_date("sleep", &date)?,
                duration_hours,
                quality,
                disruptions,
                notes,
            });
        }

        Ok(records)
    }

    fn load_diet(conn: &Connection) -> StorageResult<Vec<DietRecord>> {
        let mut stmt =
            conn.prepare_cached("SELECT id, date, meal, items, notes FROM diet ORDER BY id")?;

        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
            ))
        })?;

        let mut records = Vec::new();
        for row in rows {
            let (id, date, meal, items, notes) = row?;
            let items: Vec<String> =
                serde_json::from_str(&items).map_err(|e| StorageError::Corruption {
                    table: "diet".to_string(),
                    reason: format!("items column: {}", e),
                })?;

            records.push(DietRecord {
                id,
                date: parse_stored_date("diet", &date)?,
                meal,
                items,
                notes,
            });
        }

        Ok(records)
    }

    fn load_menstrual(conn: &Connection) -> StorageResult<Vec<MenstrualRecord>> {
        let mut stmt = conn.prepare_cached(
            "SELECT id, date, period_event, flow_level, notes FROM menstrual ORDER BY id",
        )?;

        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
            ))
        })?;

        let mut records = Vec::new();
        for row in rows {
            let (id, date, period_event, flow_level, notes) = row?;
            records.push(MenstrualRecord {
                id,
                date: parse_stored_date("menstrual", &date)?,
                period_event,
                flow_level,
                notes,
            });
        }

        Ok(records)
    }

    fn load_symptoms(conn: &Connection) -> StorageResult<Vec<SymptomRecord>> {
        let mut stmt = conn.prepare_cached(
            "SELECT id, date, nausea, fatigue, pain, notes FROM symptoms ORDER BY id",
        )?;

        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, i32>(2)?,
                row.get::<_, i32>(3)?,
                row.get::<_, i32>(4)?,
                row.get::<_, String>(5)?,
            ))
        })?;

        let mut records = Vec::new();
        for row in rows {
            let (id, date, nausea, fatigue, pain, notes) = row?;
            records.push(SymptomRecord {
                id,
                date: parse_stored_date("symptoms", &date)?,
                nausea,
                fatigue,
                pain,
                notes,
            });
        }

        Ok(records)
    }
}

fn parse_stored_date(table: &str, value: &str) -> StorageResult<NaiveDate> {
    NaiveDate::parse_from_str(value, DATE_FORMAT).map_err(|e| StorageError::Corruption {
        table: table.to_string(),
        reason: format!("date {:?}: {}", value, e),
    })
}

#[async_trait]
impl RecordStore for SqliteStore {
    async fn insert_sleep(&self, mut record: SleepRecord) -> StorageResult<SleepRecord> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO sleep (date, duration, quality, disruptions, notes)
                 VALUES (?, ?, ?, ?, ?)",
                params![
                    format_date(record.date),
                    record.duration_hours,
                    record.quality,
                    record.disruptions,
                    record.notes
                ],
            )?;
            record.id = conn.last_insert_rowid();
            Ok(record)
        })
    }

    async fn insert_diet(&self, mut record: DietRecord) -> StorageResult<DietRecord> {
        let items = serde_json::to_string(&record.items)?;

        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO diet (date, meal, items, notes) VALUES (?, ?, ?, ?)",
                params![format_date(record.date), record.meal, items, record.notes],
            )?;
            record.id = conn.last_insert_rowid();
            Ok(record)
        })
    }

    async fn insert_menstrual(
        &self,
        mut record: MenstrualRecord,
    ) -> StorageResult<MenstrualRecord> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO menstrual (date, period_event, flow_level, notes)
                 VALUES (?, ?, ?, ?)",
                params![
                    format_date(record.date),
                    record.period_event,
                    record.flow_level,
                    record.notes
                ],
            )?;
            record.id = conn.last_insert_rowid();
            Ok(record)
        })
    }

    async fn insert_symptoms(&self, mut record: SymptomRecord) -> StorageResult<SymptomRecord> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO symptoms (date, nausea, fatigue, pain, notes)
                 VALUES (?, ?, ?, ?, ?)",
                params![
                    format_date(record.date),
                    record.nausea,
                    record.fatigue,
                    record.pain,
                    record.notes
                ],
            )?;
            record.id = conn.last_insert_rowid();
            Ok(record)
        })
    }

    async fn fetch_all(&self) -> StorageResult<RecordSet> {
        self.with_conn(|conn| {
            Ok(RecordSet {
                sleep: Self::load_sleep(conn)?,
                diet: Self::load_diet(conn)?,
                menstrual: Self::load_menstrual(conn)?,
                symptoms: Self::load_symptoms(conn)?,
            })
        })
    }

    async fn counts(&self) -> StorageResult<RecordCounts> {
        self.with_conn(|conn| {
            let count = |table: &str| -> StorageResult<usize> {
                let n: i64 =
                    conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| {
                        row.get(0)
                    })?;
                Ok(n as usize)
            };

            Ok(RecordCounts {
                sleep: count("sleep")?,
                diet: count("diet")?,
                menstrual: count("menstrual")?,
                symptoms: count("symptoms")?,
            })
        })
    }
}

/// In-memory record store
#[derive(Default)]
pub struct MemoryStore {
    records: RwLock<RecordSet>,
    next_id: AtomicI64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-filled with records, keeping their order
    ///
    /// Ids are reassigned in the order given.
    pub fn with_records(mut records: RecordSet) -> Self {
        let mut id = 0;
        let mut next = || {
            id += 1;
            id
        };

        records.sleep.iter_mut().for_each(|r| r.id = next());
        records.diet.iter_mut().for_each(|r| r.id = next());
        records.menstrual.iter_mut().for_each(|r| r.id = next());
        records.symptoms.iter_mut().for_each(|r| r.id = next());

        Self {
            records: RwLock::new(records),
            next_id: AtomicI64::new(id),
        }
    }

    fn next_id(&self) -> i64 {
        self.next_id.fetch_add(1, Ordering::SeqCst) + 1
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn insert_sleep(&self, mut record: SleepRecord) -> StorageResult<SleepRecord> {
        record.id = self.next_id();
        self.records.write().await.sleep.push(record.clone());
        Ok(record)
    }

    async fn insert_diet(&self, mut record: DietRecord) -> StorageResult<DietRecord> {
        record.id = self.next_id();
        self.records.write().await.diet.push(record.clone());
        Ok(record)
    }

    async fn insert_menstrual(
        &self,
        mut record: MenstrualRecord,
    ) -> StorageResult<MenstrualRecord> {
        record.id = self.next_id();
        self.records.write().await.menstrual.push(record.clone());
        Ok(record)
    }

    async fn insert_symptoms(&self, mut record: SymptomRecord) -> StorageResult<SymptomRecord> {
        record.id = self.next_id();
        self.records.write().await.symptoms.push(record.clone());
        Ok(record)
    }

    async fn fetch_all(&self) -> StorageResult<RecordSet> {
        Ok(self.records.read().await.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, d).unwrap()
    }

    async fn fill(store: &dyn RecordStore) {
        store
            .insert_sleep(SleepRecord::new(day(2), 5.5).quality(3))
            .await
            .unwrap();
        store
            .insert_sleep(SleepRecord::new(day(1), 8.0))
            .await
            .unwrap();
        store
            .insert_diet(DietRecord::new(day(1), "dinner").item("chocolate").item("wine"))
            .await
            .unwrap();
        store
            .insert_menstrual(MenstrualRecord::new(day(1), "start", "heavy"))
            .await
            .unwrap();
        store
            .insert_symptoms(SymptomRecord::new(day(1), 2, 3, 4))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_sqlite_round_trip_keeps_storage_order() {
        let store = SqliteStore::open_in_memory().unwrap();
        fill(&store).await;

        let set = store.fetch_all().await.unwrap();
        assert_eq!(set.sleep.len(), 2);
        // Insertion order, not date order
        assert_eq!(set.sleep[0].date, day(2));
        assert_eq!(set.sleep[1].date, day(1));
        assert!(set.sleep[0].id < set.sleep[1].id);
        assert_eq!(set.sleep[0].quality, 3);

        assert_eq!(set.diet[0].items, vec!["chocolate", "wine"]);
        assert_eq!(set.menstrual[0].flow_level, "heavy");
        assert_eq!(set.symptoms[0].pain, 4);
    }

    #[tokio::test]
    async fn test_sqlite_counts() {
        let store = SqliteStore::open_in_memory().unwrap();
        fill(&store).await;

        let counts = store.counts().await.unwrap();
        assert_eq!(
            counts,
            RecordCounts {
                sleep: 2,
                diet: 1,
                menstrual: 1,
                symptoms: 1
            }
        );
    }

    #[tokio::test]
    async fn test_sqlite_persists_across_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("flarewatch.db");

        {
            let store = SqliteStore::open(&path).unwrap();
            fill(&store).await;
        }

        let store = SqliteStore::open(&path).unwrap();
        assert_eq!(store.path(), Some(path.as_path()));
        let set = store.fetch_all().await.unwrap();
        assert_eq!(set.len(), 5);
    }

    #[tokio::test]
    async fn test_sqlite_rejects_corrupt_date() {
        let store = SqliteStore::open_in_memory().unwrap();
        store
            .with_conn(|conn| {
                conn.execute(
                    "INSERT INTO sleep (date, duration) VALUES ('yesterday', 7.0)",
                    [],
                )?;
                Ok(())
            })
            .unwrap();

        let err = store.fetch_all().await.unwrap_err();
        assert!(matches!(err, StorageError::Corruption { .. }));
    }

    #[tokio::test]
    async fn test_memory_store_assigns_increasing_ids() {
        let store = MemoryStore::new();
        fill(&store).await;

        let set = store.fetch_all().await.unwrap();
        let mut ids: Vec<i64> = set.sleep.iter().map(|r| r.id).collect();
        ids.extend(set.diet.iter().map(|r| r.id));
        ids.extend(set.symptoms.iter().map(|r| r.id));
        assert_eq!(ids, vec![1, 2, 3, 5]);
        assert_eq!(store.counts().await.unwrap().menstrual, 1);
    }

    #[tokio::test]
    async fn test_memory_store_with_records() {
        let mut set = RecordSet::new();
        set.symptoms.push(SymptomRecord::new(day(3), 1, 1, 1));
        set.symptoms.push(SymptomRecord::new(day(1), 2, 2, 2));

        let store = MemoryStore::with_records(set);
        let inserted = store
            .insert_symptoms(SymptomRecord::new(day(2), 3, 3, 3))
            .await
            .unwrap();
        assert_eq!(inserted.id, 3);

        let fetched = store.fetch_all().await.unwrap();
        let dates: Vec<NaiveDate> = fetched.symptoms.iter().map(|r| r.date).collect();
        assert_eq!(dates, vec![day(3), day(1), day(2)]);
    }
}
