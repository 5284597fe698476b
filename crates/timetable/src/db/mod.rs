/// Database module for persisting each user's selected courses and timetable

mod types;

pub use types::DbSnapshot;

use crate::selection::{SelectionManager, SnapshotError, UserKey};
use rusqlite::{Connection, OptionalExtension};
use std::sync::{Mutex, MutexGuard};
use thiserror::Error;

const SCHEMA_SQL: &str = include_str!("../../../../sql/init_snapshots.sql");

#[derive(Debug, Error)]
pub enum DbError {
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
}

pub struct SnapshotDbManager {
    db: Mutex<Connection>,
}

impl SnapshotDbManager {
    /// Opens (or creates) the database and initializes the schema
    pub fn new(db_path: &str) -> Result<Self, DbError> {
        Self::from_connection(Connection::open(db_path)?)
    }

    /// A private in-memory database
    pub fn in_memory() -> Result<Self, DbError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self, DbError> {
        conn.execute_batch(SCHEMA_SQL)?;
        Ok(Self {
            db: Mutex::new(conn),
        })
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.db.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Loads the stored selection, or an empty one if the user has none
    pub fn load_selection(&self, key: &UserKey) -> Result<SelectionManager, DbError> {
        match self.get_snapshot(key)? {
            Some(row) => Ok(SelectionManager::deserialize(&row.snapshot)?),
            None => Ok(SelectionManager::new()),
        }
    }

    /// Stores the selection, replacing any previous snapshot
    pub fn save_selection(&self, key: &UserKey, selection: &SelectionManager) -> Result<(), DbError> {
        let snapshot = selection.serialize()?;
        let db = self.conn();
        db.execute(
            "INSERT INTO selection_snapshots (user_key, snapshot, course_count, updated_at)
             VALUES (?1, ?2, ?3, datetime('now'))
             ON CONFLICT(user_key) DO UPDATE SET
                snapshot = excluded.snapshot,
                course_count = excluded.course_count,
                updated_at = excluded.updated_at",
            (key.as_str(), &snapshot, selection.len() as i64),
        )?;
        Ok(())
    }

    /// Gets the raw snapshot row for a user
    pub fn get_snapshot(&self, key: &UserKey) -> Result<Option<DbSnapshot>, DbError> {
        let db = self.conn();
        let row = db
            .query_row(
                "SELECT user_key, snapshot, course_count, updated_at
                 FROM selection_snapshots
                 WHERE user_key = ?",
                [key.as_str()],
                |row| {
                    Ok(DbSnapshot {
                        user_key: row.get(0)?,
                        snapshot: row.get(1)?,
                        course_count: row.get(2)?,
                        updated_at: row.get(3)?,
                    })
                },
            )
            .optional()?;
        Ok(row)
    }

    /// Deletes a user's snapshot. Returns true if one existed
    pub fn delete_selection(&self, key: &UserKey) -> Result<bool, DbError> {
        let db = self.conn();
        let removed = db.execute(
            "DELETE FROM selection_snapshots WHERE user_key = ?",
            [key.as_str()],
        )?;
        Ok(removed > 0)
    }

    /// Number of stored snapshots
    pub fn snapshot_count(&self) -> Result<i64, DbError> {
        let db = self.conn();
        let count = db.query_row("SELECT COUNT(*) FROM selection_snapshots", [], |row| {
            row.get(0)
        })?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::tests::course;
    use crate::catalog::Catalog;

    #[test]
    fn test_save_load_delete() {
        let db = SnapshotDbManager::in_memory().unwrap();
        let key = UserKey::from_user_id("cs1230456");

        assert!(db.load_selection(&key).unwrap().is_empty());

        let catalog = Catalog::from_courses(vec![
            course("COL106", "3-0-2", Some("LH 108"), Some("109301100")),
            course("MTL100", "3-1-0", Some("LH 121"), Some("208000850")),
        ]);
        let mut selection = SelectionManager::new();
        selection.add_courses(&catalog, ["COL106"]);
        db.save_selection(&key, &selection).unwrap();

        selection.add_courses(&catalog, ["MTL100"]);
        db.save_selection(&key, &selection).unwrap();

        assert_eq!(db.snapshot_count().unwrap(), 1);
        assert_eq!(db.get_snapshot(&key).unwrap().unwrap().course_count, 2);
        assert_eq!(db.load_selection(&key).unwrap(), selection);

        assert!(db.delete_selection(&key).unwrap());
        assert!(!db.delete_selection(&key).unwrap());
        assert!(db.load_selection(&key).unwrap().is_empty());
    }

    #[test]
    fn test_corrupt_snapshot_is_reported() {
        let db = SnapshotDbManager::in_memory().unwrap();
        let key = UserKey::from_user_id("ee1230001");
        db.conn()
            .execute(
                "INSERT INTO selection_snapshots (user_key, snapshot, updated_at)
                 VALUES (?1, 'not json', datetime('now'))",
                [key.as_str()],
            )
            .unwrap();

        assert!(matches!(
            db.load_selection(&key),
            Err(DbError::Snapshot(SnapshotError::Json(_)))
        ));
    }
}
