//! Task store contract and SQLite implementation.
//!
//! # Responsibility
//! - Own every durable task record; all mutations go through here.
//! - Stage mutations in one transaction and commit them on `flush`.
//!
//! # Invariants
//! - `fetch_all` order is creation order (`seq ASC`).
//! - A failed `flush` leaves the last committed state intact.
//! - Task titles are never written to logs.

use crate::db::DbError;
use crate::model::task::{new_task_id, Task, TaskId};
use log::{debug, error, info, warn};
use rusqlite::{params, Connection, Row};
use std::cell::Cell;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;
use uuid::Uuid;

const TASK_SELECT_SQL: &str = "SELECT
    uuid,
    title,
    created_at,
    updated_at
FROM tasks";

const NOW_MS_SQL: &str = "(CAST(strftime('%s', 'now') AS INTEGER) * 1000)";

pub type StoreResult<T> = Result<T, StoreError>;

/// Store-level failure.
#[derive(Debug)]
pub enum StoreError {
    /// Durable I/O or commit failure.
    Storage(DbError),
    /// The targeted record is not known to the store.
    NotFound(TaskId),
    /// A persisted row could not be decoded.
    InvalidData(String),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Storage(err) => write!(f, "task storage failed: {err}"),
            Self::NotFound(id) => write!(f, "task not found: {id}"),
            Self::InvalidData(message) => write!(f, "invalid persisted task data: {message}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Storage(err) => Some(err),
            Self::NotFound(_) | Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Storage(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Storage(DbError::Sqlite(value))
    }
}

/// Durable task collection with explicit commit.
///
/// Mutations (`create`, `update`, `delete`) are staged and become durable
/// only after `flush`. Reads observe staged changes.
pub trait TaskStore {
    /// Stages a new task and returns it as stored.
    fn create(&self, title: &str) -> StoreResult<Task>;

    /// Stages a title change. On success `task` is updated in place.
    ///
    /// # Errors
    /// - `StoreError::NotFound` when `task` is not a record of this store.
    fn update(&self, task: &mut Task, new_title: &str) -> StoreResult<()>;

    /// Stages permanent removal of `task`.
    ///
    /// # Errors
    /// - `StoreError::NotFound` when the record is unknown or already deleted.
    fn delete(&self, task: &Task) -> StoreResult<()>;

    fn get(&self, id: TaskId) -> StoreResult<Option<Task>>;

    /// Returns every stored task in creation order.
    fn fetch_all(&self) -> StoreResult<Vec<Task>>;

    /// Returns whether staged changes are waiting for `flush`.
    fn has_changes(&self) -> bool;

    /// Commits staged changes. No-op when nothing is staged.
    fn flush(&self) -> StoreResult<()>;

    /// Drops staged changes. No-op when nothing is staged.
    fn discard(&self) -> StoreResult<()>;
}

impl<S: TaskStore + ?Sized> TaskStore for &S {
    fn create(&self, title: &str) -> StoreResult<Task> {
        (**self).create(title)
    }

    fn update(&self, task: &mut Task, new_title: &str) -> StoreResult<()> {
        (**self).update(task, new_title)
    }

    fn delete(&self, task: &Task) -> StoreResult<()> {
        (**self).delete(task)
    }

    fn get(&self, id: TaskId) -> StoreResult<Option<Task>> {
        (**self).get(id)
    }

    fn fetch_all(&self) -> StoreResult<Vec<Task>> {
        (**self).fetch_all()
    }

    fn has_changes(&self) -> bool {
        (**self).has_changes()
    }

    fn flush(&self) -> StoreResult<()> {
        (**self).flush()
    }

    fn discard(&self) -> StoreResult<()> {
        (**self).discard()
    }
}

/// SQLite-backed task store.
///
/// Staged changes live in a transaction this store opens on the borrowed
/// connection. `flush`, `discard` and drop only ever end that transaction;
/// one opened by another store on the same connection is left alone.
pub struct SqliteTaskStore<'conn> {
    conn: &'conn Connection,
    owns_tx: Cell<bool>,
}

impl<'conn> SqliteTaskStore<'conn> {
    /// Wraps a connection returned by `open_db`/`open_db_in_memory`.
    ///
    /// # Errors
    /// - `StoreError::Storage(DbError::SchemaNotApplied)` for unmigrated connections.
    pub fn try_new(conn: &'conn Connection) -> StoreResult<Self> {
        let ready: bool = conn.query_row(
            "SELECT EXISTS(
                SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = 'tasks'
            );",
            [],
            |row| row.get(0),
        )?;
        if !ready {
            return Err(DbError::SchemaNotApplied { table: "tasks" }.into());
        }
        Ok(Self {
            conn,
            owns_tx: Cell::new(false),
        })
    }

    /// Runs `mutation` inside this store's transaction.
    ///
    /// A failed mutation rolls back the transaction only when this call
    /// opened it, so earlier staged changes survive.
    fn staged<T>(&self, mutation: impl FnOnce() -> StoreResult<T>) -> StoreResult<T> {
        let opened = self.begin_if_idle()?;
        let outcome = mutation();
        if outcome.is_err() && opened {
            self.rollback_owned("mutation_failed");
        }
        outcome
    }

    fn begin_if_idle(&self) -> StoreResult<bool> {
        if self.owns_tx.get() {
            if self.conn.is_autocommit() {
                self.owns_tx.set(false);
                return Err(DbError::TransactionLost.into());
            }
            return Ok(false);
        }
        if !self.conn.is_autocommit() {
            return Err(DbError::TransactionInUse.into());
        }
        self.conn.execute_batch("BEGIN IMMEDIATE;")?;
        self.owns_tx.set(true);
        Ok(true)
    }

    /// Rolls back the owned transaction; failures are logged, the caller
    /// already has an error to report.
    fn rollback_owned(&self, reason: &str) {
        self.owns_tx.set(false);
        if self.conn.is_autocommit() {
            return;
        }
        if let Err(err) = self.conn.execute_batch("ROLLBACK;") {
            error!("event=store_discard module=store status=error reason={reason} error={err}");
        }
    }
}

impl TaskStore for SqliteTaskStore<'_> {
    fn create(&self, title: &str) -> StoreResult<Task> {
        let id = new_task_id();
        let task = self.staged(|| {
            self.conn.execute(
                "INSERT INTO tasks (uuid, title) VALUES (?1, ?2);",
                params![id.to_string(), title],
            )?;
            self.get(id)?.ok_or_else(|| {
                StoreError::InvalidData(format!("created task {id} missing on read-back"))
            })
        })?;

        debug!("event=task_create module=store status=staged task_id={id}");
        Ok(task)
    }

    fn update(&self, task: &mut Task, new_title: &str) -> StoreResult<()> {
        let id = task.id;
        let updated_at = self.staged(|| {
            let changed = self.conn.execute(
                &format!(
                    "UPDATE tasks
                     SET
                        title = ?1,
                        updated_at = MAX(created_at, {NOW_MS_SQL})
                     WHERE uuid = ?2;"
                ),
                params![new_title, id.to_string()],
            )?;
            if changed == 0 {
                return Err(StoreError::NotFound(id));
            }

            let updated_at: i64 = self.conn.query_row(
                "SELECT updated_at FROM tasks WHERE uuid = ?1;",
                [id.to_string()],
                |row| row.get(0),
            )?;
            Ok(updated_at)
        })?;

        task.title = new_title.to_string();
        task.updated_at = updated_at;
        debug!(
            "event=task_update module=store status=staged task_id={}",
            task.id
        );
        Ok(())
    }

    fn delete(&self, task: &Task) -> StoreResult<()> {
        self.staged(|| {
            let changed = self
                .conn
                .execute("DELETE FROM tasks WHERE uuid = ?1;", [task.id.to_string()])?;
            if changed == 0 {
                return Err(StoreError::NotFound(task.id));
            }
            Ok(())
        })?;

        debug!(
            "event=task_delete module=store status=staged task_id={}",
            task.id
        );
        Ok(())
    }

    fn get(&self, id: TaskId) -> StoreResult<Option<Task>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{TASK_SELECT_SQL} WHERE uuid = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_task_row(row)?));
        }

        Ok(None)
    }

    fn fetch_all(&self) -> StoreResult<Vec<Task>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{TASK_SELECT_SQL} ORDER BY seq ASC;"))?;
        let mut rows = stmt.query([])?;
        let mut tasks = Vec::new();
        while let Some(row) = rows.next()? {
            tasks.push(parse_task_row(row)?);
        }

        debug!(
            "event=task_fetch_all module=store status=ok count={}",
            tasks.len()
        );
        Ok(tasks)
    }

    fn has_changes(&self) -> bool {
        self.owns_tx.get() && !self.conn.is_autocommit()
    }

    fn flush(&self) -> StoreResult<()> {
        if !self.owns_tx.get() {
            return Ok(());
        }
        if self.conn.is_autocommit() {
            self.owns_tx.set(false);
            error!("event=store_flush module=store status=error error_code=transaction_lost");
            return Err(DbError::TransactionLost.into());
        }

        let started_at = Instant::now();
        if let Err(err) = self.conn.execute_batch("COMMIT;") {
            error!(
                "event=store_flush module=store status=error duration_ms={} error={err}",
                started_at.elapsed().as_millis()
            );
            // COMMIT can fail without ending the transaction (e.g. SQLITE_BUSY).
            self.rollback_owned("flush_failed");
            return Err(err.into());
        }
        self.owns_tx.set(false);

        info!(
            "event=store_flush module=store status=ok duration_ms={}",
            started_at.elapsed().as_millis()
        );
        Ok(())
    }

    fn discard(&self) -> StoreResult<()> {
        if !self.has_changes() {
            self.owns_tx.set(false);
            return Ok(());
        }
        self.conn.execute_batch("ROLLBACK;")?;
        self.owns_tx.set(false);
        info!("event=store_discard module=store status=ok");
        Ok(())
    }
}

impl Drop for SqliteTaskStore<'_> {
    fn drop(&mut self) {
        if !self.has_changes() {
            return;
        }
        warn!("event=store_discard module=store status=start reason=dropped_with_staged_changes");
        self.rollback_owned("dropped_with_staged_changes");
    }
}

fn parse_task_row(row: &Row<'_>) -> StoreResult<Task> {
    let uuid_text: String = row.get("uuid")?;
    let id = Uuid::parse_str(&uuid_text).map_err(|_| {
        StoreError::InvalidData(format!("invalid uuid value `{uuid_text}` in tasks.uuid"))
    })?;

    let created_at: i64 = row.get("created_at")?;
    let updated_at: i64 = row.get("updated_at")?;
    if updated_at < created_at {
        return Err(StoreError::InvalidData(format!(
            "tasks.updated_at {updated_at} is earlier than created_at {created_at} for {id}"
        )));
    }

    Ok(Task {
        id,
        title: row.get("title")?,
        created_at,
        updated_at,
    })
}

#[cfg(test)]
mod tests {
    use super::{SqliteTaskStore, StoreError, TaskStore};
    use crate::db::{open_db_in_memory, DbError};
    use rusqlite::Connection;

    #[test]
    fn try_new_rejects_unmigrated_connection() {
        let conn = Connection::open_in_memory().unwrap();
        let err = SqliteTaskStore::try_new(&conn).err().unwrap();
        assert!(matches!(
            err,
            StoreError::Storage(DbError::SchemaNotApplied { table: "tasks" })
        ));
    }

    #[test]
    fn mutations_are_staged_until_flush() {
        let conn = open_db_in_memory().unwrap();
        let store = SqliteTaskStore::try_new(&conn).unwrap();
        assert!(!store.has_changes());

        store.create("Buy milk").unwrap();
        assert!(store.has_changes());

        store.flush().unwrap();
        assert!(!store.has_changes());
    }

    #[test]
    fn discard_rolls_back_staged_create() {
        let conn = open_db_in_memory().unwrap();
        let store = SqliteTaskStore::try_new(&conn).unwrap();

        store.create("never saved").unwrap();
        store.discard().unwrap();

        assert!(!store.has_changes());
        assert!(store.fetch_all().unwrap().is_empty());
        store.discard().unwrap();
    }

    #[test]
    fn dropping_store_rolls_back_unflushed_changes() {
        let conn = open_db_in_memory().unwrap();
        {
            let store = SqliteTaskStore::try_new(&conn).unwrap();
            store.create("kept").unwrap();
            store.flush().unwrap();
            store.create("dropped").unwrap();
        }

        assert!(conn.is_autocommit());
        let store = SqliteTaskStore::try_new(&conn).unwrap();
        let titles: Vec<String> = store
            .fetch_all()
            .unwrap()
            .into_iter()
            .map(|task| task.title)
            .collect();
        assert_eq!(titles, vec!["kept".to_string()]);
    }

    #[test]
    fn second_store_on_same_connection_cannot_disturb_staged_changes() {
        let conn = open_db_in_memory().unwrap();
        let owner = SqliteTaskStore::try_new(&conn).unwrap();
        owner.create("staged by owner").unwrap();

        {
            let intruder = SqliteTaskStore::try_new(&conn).unwrap();
            assert!(!intruder.has_changes());
            assert!(matches!(
                intruder.create("second writer"),
                Err(StoreError::Storage(DbError::TransactionInUse))
            ));
            intruder.discard().unwrap();
            intruder.flush().unwrap();
        }

        assert!(owner.has_changes());
        owner.flush().unwrap();
        let titles: Vec<String> = owner
            .fetch_all()
            .unwrap()
            .into_iter()
            .map(|task| task.title)
            .collect();
        assert_eq!(titles, vec!["staged by owner".to_string()]);
    }

    #[test]
    fn flush_reports_changes_rolled_back_behind_the_store() {
        let conn = open_db_in_memory().unwrap();
        let store = SqliteTaskStore::try_new(&conn).unwrap();
        store.create("vanishes").unwrap();

        conn.execute_batch("ROLLBACK;").unwrap();

        assert!(!store.has_changes());
        assert!(matches!(
            store.flush(),
            Err(StoreError::Storage(DbError::TransactionLost))
        ));
        store.flush().unwrap();
        assert!(store.fetch_all().unwrap().is_empty());
    }

    #[test]
    fn invalid_uuid_row_is_reported_not_masked() {
        let conn = open_db_in_memory().unwrap();
        conn.execute(
            "INSERT INTO tasks (uuid, title) VALUES ('not-a-uuid', 'broken');",
            [],
        )
        .unwrap();

        let store = SqliteTaskStore::try_new(&conn).unwrap();
        let err = store.fetch_all().unwrap_err();
        assert!(matches!(err, StoreError::InvalidData(message) if message.contains("not-a-uuid")));
    }
}
