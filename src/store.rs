//! SQLite-backed store for members, tasks, leaves and feedback.
//!
//! Every user-supplied value reaches SQLite as a bound parameter. The handle is
//! cheap to clone and is shared through the application state.

use crate::models::{DateRange, Feedback, Member, NewTask, ReportRow, Task, TaskFilter};
use crate::status::{MemberDay, TeamDay};
use chrono::NaiveDate;
use rusqlite::{params, Connection, Row};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::debug;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),
    #[error("failed to prepare database directory: {0}")]
    Io(#[from] std::io::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS members (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT UNIQUE
    );
    CREATE TABLE IF NOT EXISTS tasks (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        member_id INTEGER,
        date TEXT,
        title TEXT,
        description TEXT,
        weight REAL,
        FOREIGN KEY(member_id) REFERENCES members(id)
    );
    CREATE TABLE IF NOT EXISTS leaves (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        member_id INTEGER,
        date TEXT,
        FOREIGN KEY(member_id) REFERENCES members(id),
        UNIQUE(member_id, date)
    );
    CREATE TABLE IF NOT EXISTS feedbacks (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        content TEXT,
        date TEXT,
        created_at DATETIME DEFAULT CURRENT_TIMESTAMP
    );
";

#[derive(Clone)]
pub struct Store {
    conn: Arc<Mutex<Connection>>,
}

impl Store {
    pub fn open(path: &Path) -> StoreResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        let mode: String =
            conn.query_row("PRAGMA journal_mode=WAL", [], |row| row.get(0))?;
        debug!(journal_mode = %mode, "opened {}", path.display());
        Self::init(conn)
    }

    pub fn open_in_memory() -> StoreResult<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> StoreResult<Self> {
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        conn.busy_timeout(Duration::from_secs(5))?;
        conn.execute_batch(SCHEMA)?;
        debug!("database schema ready");
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Runs `func` with exclusive access to the connection.
    /// A poisoned lock is recovered: the connection itself is still usable.
    fn with_conn<F, T>(&self, func: F) -> StoreResult<T>
    where
        F: FnOnce(&mut Connection) -> rusqlite::Result<T>,
    {
        let mut guard = self
            .conn
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        Ok(func(&mut *guard)?)
    }

    pub fn list_members(&self) -> StoreResult<Vec<Member>> {
        self.with_conn(|conn| select_members(conn))
    }

    pub fn add_member(&self, name: &str) -> StoreResult<i64> {
        self.with_conn(|conn| {
            conn.execute("INSERT INTO members (name) VALUES (?1)", params![name])?;
            Ok(conn.last_insert_rowid())
        })
    }

    pub fn list_tasks(&self, filter: TaskFilter) -> StoreResult<Vec<Task>> {
        let date = filter.date.map(date_key);
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, member_id, date, title, description, weight
                 FROM tasks
                 WHERE (?1 IS NULL OR member_id = ?1)
                   AND (?2 IS NULL OR date = ?2)
                 ORDER BY id ASC",
            )?;
            let rows = stmt.query_map(params![filter.member_id, date], map_task)?;
            rows.collect()
        })
    }

    pub fn add_task(&self, task: &NewTask) -> StoreResult<i64> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO tasks (member_id, date, title, description, weight)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    task.member_id,
                    date_key(task.date),
                    task.title,
                    task.description,
                    task.weight
                ],
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    /// Returns whether a row was removed.
    pub fn delete_task(&self, id: i64) -> StoreResult<bool> {
        self.with_conn(|conn| {
            let removed = conn.execute("DELETE FROM tasks WHERE id = ?1", params![id])?;
            Ok(removed > 0)
        })
    }

    /// Marks (`active = true`) or clears a leave for the member on `date`.
    /// Marking twice is a no-op thanks to the unique (member_id, date) pair.
    pub fn set_leave(&self, member_id: i64, date: NaiveDate, active: bool) -> StoreResult<()> {
        let date = date_key(date);
        self.with_conn(|conn| {
            if active {
                conn.execute(
                    "INSERT OR IGNORE INTO leaves (member_id, date) VALUES (?1, ?2)",
                    params![member_id, date],
                )?;
            } else {
                conn.execute(
                    "DELETE FROM leaves WHERE member_id = ?1 AND date = ?2",
                    params![member_id, date],
                )?;
            }
            Ok(())
        })
    }

    /// Leave flag and summed weights for one member, read in one transaction.
    pub fn member_day(&self, member_id: i64, date: NaiveDate) -> StoreResult<MemberDay> {
        let date = date_key(date);
        self.with_conn(|conn| {
            let tx = conn.transaction()?;
            let on_leave: bool = tx.query_row(
                "SELECT EXISTS(SELECT 1 FROM leaves WHERE member_id = ?1 AND date = ?2)",
                params![member_id, date],
                |row| row.get(0),
            )?;
            let total_hours = if on_leave {
                0.0
            } else {
                tx.query_row(
                    "SELECT SUM(weight) FROM tasks WHERE member_id = ?1 AND date = ?2",
                    params![member_id, date],
                    |row| row.get::<_, Option<f64>>(0),
                )?
                .unwrap_or(0.0)
            };
            tx.commit()?;
            Ok(MemberDay {
                on_leave,
                total_hours,
            })
        })
    }

    /// Member count, absences and summed weights for the team, read in one transaction.
    pub fn team_day(&self, date: NaiveDate) -> StoreResult<TeamDay> {
        let date = date_key(date);
        self.with_conn(|conn| {
            let tx = conn.transaction()?;
            let total_members: i64 =
                tx.query_row("SELECT COUNT(*) FROM members", [], |row| row.get(0))?;
            let absent_members: i64 = tx.query_row(
                "SELECT COUNT(*) FROM leaves WHERE date = ?1",
                params![date],
                |row| row.get(0),
            )?;
            let team_total_hours = tx
                .query_row(
                    "SELECT SUM(weight) FROM tasks WHERE date = ?1",
                    params![date],
                    |row| row.get::<_, Option<f64>>(0),
                )?
                .unwrap_or(0.0);
            tx.commit()?;
            Ok(TeamDay {
                total_members,
                absent_members,
                team_total_hours,
            })
        })
    }

    pub fn add_feedback(&self, content: &str, submitted_at: &str) -> StoreResult<i64> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO feedbacks (content, date) VALUES (?1, ?2)",
                params![content, submitted_at],
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    /// Newest first; rows created within the same second fall back to id order.
    pub fn list_feedback(&self) -> StoreResult<Vec<Feedback>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, content, date, created_at
                 FROM feedbacks
                 ORDER BY created_at DESC, id DESC",
            )?;
            let rows = stmt.query_map([], |row| {
                Ok(Feedback {
                    id: row.get("id")?,
                    content: row.get("content")?,
                    date: row.get("date")?,
                    created_at: row.get("created_at")?,
                })
            })?;
            rows.collect()
        })
    }

    pub fn report(&self, range: DateRange) -> StoreResult<Vec<ReportRow>> {
        let from = range.from.map(date_key);
        let to = range.to.map(date_key);
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT t.date AS date, m.name AS name, SUM(t.weight) AS total_hours
                 FROM tasks t
                 JOIN members m ON t.member_id = m.id
                 WHERE (?1 IS NULL OR t.date >= ?1)
                   AND (?2 IS NULL OR t.date <= ?2)
                 GROUP BY t.date, m.id
                 ORDER BY t.date DESC, m.name ASC",
            )?;
            let rows = stmt.query_map(params![from, to], |row| {
                Ok(ReportRow {
                    date: row.get("date")?,
                    name: row.get("name")?,
                    total_hours: row.get::<_, Option<f64>>("total_hours")?.unwrap_or(0.0),
                })
            })?;
            rows.collect()
        })
    }

    /// Every member and every task, read in one transaction.
    pub fn export(&self) -> StoreResult<(Vec<Member>, Vec<Task>)> {
        self.with_conn(|conn| {
            let tx = conn.transaction()?;
            let members = select_members(&tx)?;
            let tasks = {
                let mut stmt = tx.prepare(
                    "SELECT id, member_id, date, title, description, weight
                     FROM tasks
                     ORDER BY id ASC",
                )?;
                let rows = stmt.query_map([], map_task)?;
                rows.collect::<rusqlite::Result<Vec<_>>>()?
            };
            tx.commit()?;
            Ok((members, tasks))
        })
    }
}

fn select_members(conn: &Connection) -> rusqlite::Result<Vec<Member>> {
    let mut stmt = conn.prepare("SELECT id, name FROM members ORDER BY id ASC")?;
    let rows = stmt.query_map([], |row| {
        Ok(Member {
            id: row.get("id")?,
            name: row.get("name")?,
        })
    })?;
    rows.collect()
}

fn map_task(row: &Row) -> rusqlite::Result<Task> {
    Ok(Task {
        id: row.get("id")?,
        member_id: row.get("member_id")?,
        date: row.get("date")?,
        title: row.get("title")?,
        description: row.get("description")?,
        weight: row.get("weight")?,
    })
}

fn date_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, d).unwrap()
    }

    fn task(member_id: i64, date: NaiveDate, title: &str, weight: f64) -> NewTask {
        NewTask {
            member_id,
            date,
            title: title.to_string(),
            description: None,
            weight,
        }
    }

    #[test]
    fn member_names_are_unique() {
        let store = Store::open_in_memory().unwrap();
        store.add_member("Alice").unwrap();
        let err = store.add_member("Alice").unwrap_err();
        assert!(err.to_string().contains("UNIQUE"));
        assert_eq!(store.list_members().unwrap().len(), 1);
    }

    #[test]
    fn task_filters_combine() {
        let store = Store::open_in_memory().unwrap();
        let alice = store.add_member("Alice").unwrap();
        let bob = store.add_member("Bob").unwrap();
        store.add_task(&task(alice, day(5), "a1", 2.0)).unwrap();
        store.add_task(&task(alice, day(6), "a2", 3.0)).unwrap();
        store.add_task(&task(bob, day(5), "b1", 1.0)).unwrap();

        assert_eq!(store.list_tasks(TaskFilter::default()).unwrap().len(), 3);

        let alice_tasks = store
            .list_tasks(TaskFilter {
                member_id: Some(alice),
                date: None,
            })
            .unwrap();
        assert_eq!(alice_tasks.len(), 2);

        let on_fifth = store
            .list_tasks(TaskFilter {
                member_id: Some(bob),
                date: Some(day(5)),
            })
            .unwrap();
        assert_eq!(on_fifth.len(), 1);
        assert_eq!(on_fifth[0].title, "b1");
        assert_eq!(on_fifth[0].date, "2026-01-05");
    }

    #[test]
    fn delete_task_reports_whether_it_removed_a_row() {
        let store = Store::open_in_memory().unwrap();
        let alice = store.add_member("Alice").unwrap();
        let id = store.add_task(&task(alice, day(5), "a1", 2.0)).unwrap();
        assert!(store.delete_task(id).unwrap());
        assert!(!store.delete_task(id).unwrap());
        assert!(store.list_tasks(TaskFilter::default()).unwrap().is_empty());
    }

    #[test]
    fn leave_short_circuits_member_hours() {
        let store = Store::open_in_memory().unwrap();
        let alice = store.add_member("Alice").unwrap();
        store.add_task(&task(alice, day(5), "a1", 5.0)).unwrap();
        store.add_task(&task(alice, day(5), "a2", 1.5)).unwrap();

        let before = store.member_day(alice, day(5)).unwrap();
        assert!(!before.on_leave);
        assert_eq!(before.total_hours, 6.5);

        store.set_leave(alice, day(5), true).unwrap();
        store.set_leave(alice, day(5), true).unwrap();
        let during = store.member_day(alice, day(5)).unwrap();
        assert!(during.on_leave);
        assert_eq!(during.total_hours, 0.0);

        store.set_leave(alice, day(5), false).unwrap();
        assert!(!store.member_day(alice, day(5)).unwrap().on_leave);
    }

    #[test]
    fn team_day_counts_absences_on_that_date_only() {
        let store = Store::open_in_memory().unwrap();
        let alice = store.add_member("Alice").unwrap();
        let bob = store.add_member("Bob").unwrap();
        store.add_task(&task(alice, day(5), "a1", 4.0)).unwrap();
        store.add_task(&task(bob, day(5), "b1", 2.0)).unwrap();
        store.add_task(&task(bob, day(6), "b2", 8.0)).unwrap();
        store.set_leave(bob, day(6), true).unwrap();

        let fifth = store.team_day(day(5)).unwrap();
        assert_eq!(
            fifth,
            TeamDay {
                total_members: 2,
                absent_members: 0,
                team_total_hours: 6.0,
            }
        );

        let empty = store.team_day(day(7)).unwrap();
        assert_eq!(empty.team_total_hours, 0.0);
        assert_eq!(store.team_day(day(6)).unwrap().absent_members, 1);
    }

    #[test]
    fn feedback_lists_newest_first() {
        let store = Store::open_in_memory().unwrap();
        store.add_feedback("first", "2026-01-05T10:00:00.000Z").unwrap();
        store.add_feedback("second", "2026-01-05T10:00:01.000Z").unwrap();
        let feedback = store.list_feedback().unwrap();
        assert_eq!(feedback.len(), 2);
        assert_eq!(feedback[0].content, "second");
        assert!(!feedback[0].created_at.is_empty());
    }

    #[test]
    fn report_groups_by_date_and_member() {
        let store = Store::open_in_memory().unwrap();
        let alice = store.add_member("Alice").unwrap();
        let bob = store.add_member("Bob").unwrap();
        store.add_task(&task(alice, day(5), "a1", 2.0)).unwrap();
        store.add_task(&task(alice, day(5), "a2", 3.0)).unwrap();
        store.add_task(&task(bob, day(5), "b1", 1.0)).unwrap();
        store.add_task(&task(alice, day(7), "a3", 7.0)).unwrap();

        let rows = store.report(DateRange::default()).unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].date, "2026-01-07");
        assert_eq!(rows[1].name, "Alice");
        assert_eq!(rows[1].total_hours, 5.0);
        assert_eq!(rows[2].name, "Bob");

        let bounded = store
            .report(DateRange {
                from: Some(day(6)),
                to: None,
            })
            .unwrap();
        assert_eq!(bounded.len(), 1);
        assert_eq!(bounded[0].total_hours, 7.0);
    }

    #[test]
    fn export_returns_all_rows() {
        let store = Store::open_in_memory().unwrap();
        let alice = store.add_member("Alice").unwrap();
        store.add_task(&task(alice, day(5), "a1", 2.0)).unwrap();
        let (members, tasks) = store.export().unwrap();
        assert_eq!(members, vec![Member { id: alice, name: "Alice".into() }]);
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].member_id, alice);
    }
}
