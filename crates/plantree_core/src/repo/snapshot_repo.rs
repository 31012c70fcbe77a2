//! Named snapshot repository and SQLite implementation.
//!
//! # Responsibility
//! - Save, load, list and delete named plan snapshots.
//! - Keep SQL details inside the persistence boundary.
//!
//! # Invariants
//! - Stored payloads are the exact four-field JSON snapshot.
//! - A payload that no longer decodes is reported, never silently skipped.
//! - Snapshot names are trimmed and must not be blank.

use crate::db::DbError;
use crate::model::snapshot::{Snapshot, SnapshotError};
use log::info;
use rusqlite::{params, Connection, OptionalExtension};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type RepoResult<T> = Result<T, RepoError>;

/// Errors from snapshot persistence.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    NotFound(String),
    InvalidName(String),
    /// Stored payload failed snapshot checks.
    InvalidData { name: String, source: SnapshotError },
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(name) => write!(f, "snapshot not found: {name}"),
            Self::InvalidName(name) => write!(f, "invalid snapshot name: `{name}`"),
            Self::InvalidData { name, source } => {
                write!(f, "stored snapshot `{name}` is invalid: {source}")
            }
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::InvalidData { source, .. } => Some(source),
            Self::NotFound(_) | Self::InvalidName(_) => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Listing row; payload is not decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotSummary {
    pub name: String,
    pub node_count: u32,
    /// Epoch milliseconds.
    pub created_at: i64,
    pub updated_at: i64,
}

/// Storage contract for named snapshots.
pub trait SnapshotRepository {
    /// Inserts or overwrites `name`.
    fn save_snapshot(&self, name: &str, snapshot: &Snapshot) -> RepoResult<()>;
    fn load_snapshot(&self, name: &str) -> RepoResult<Option<Snapshot>>;
    /// Most recently updated first.
    fn list_snapshots(&self) -> RepoResult<Vec<SnapshotSummary>>;
    fn delete_snapshot(&self, name: &str) -> RepoResult<()>;
}

/// SQLite-backed snapshot repository.
pub struct SqliteSnapshotRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteSnapshotRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl SnapshotRepository for SqliteSnapshotRepository<'_> {
    fn save_snapshot(&self, name: &str, snapshot: &Snapshot) -> RepoResult<()> {
        let name = normalize_name(name)?;
        let payload = snapshot
            .to_json_string()
            .map_err(|source| RepoError::InvalidData {
                name: name.to_string(),
                source,
            })?;
        let node_count = u32::try_from(snapshot.data_map.len()).unwrap_or(u32::MAX);

        self.conn.execute(
            "INSERT INTO plan_snapshots (name, payload, node_count, created_at, updated_at)
             VALUES (?1, ?2, ?3, (strftime('%s', 'now') * 1000), (strftime('%s', 'now') * 1000))
             ON CONFLICT(name) DO UPDATE SET
                payload = excluded.payload,
                node_count = excluded.node_count,
                updated_at = excluded.updated_at;",
            params![name, payload, node_count],
        )?;

        info!(
            "event=snapshot_save module=repo status=ok nodes={} bytes={}",
            node_count,
            payload.len()
        );
        Ok(())
    }

    fn load_snapshot(&self, name: &str) -> RepoResult<Option<Snapshot>> {
        let name = normalize_name(name)?;
        let payload: Option<String> = self
            .conn
            .query_row(
                "SELECT payload FROM plan_snapshots WHERE name = ?1;",
                [name],
                |row| row.get(0),
            )
            .optional()?;

        let Some(payload) = payload else {
            info!("event=snapshot_load module=repo status=skipped reason=not_found");
            return Ok(None);
        };
        let snapshot =
            Snapshot::from_json_str(&payload).map_err(|source| RepoError::InvalidData {
                name: name.to_string(),
                source,
            })?;

        info!(
            "event=snapshot_load module=repo status=ok nodes={}",
            snapshot.data_map.len()
        );
        Ok(Some(snapshot))
    }

    fn list_snapshots(&self) -> RepoResult<Vec<SnapshotSummary>> {
        let mut stmt = self.conn.prepare(
            "SELECT name, node_count, created_at, updated_at
             FROM plan_snapshots
             ORDER BY updated_at DESC, name ASC;",
        )?;
        let mut rows = stmt.query([])?;
        let mut summaries = Vec::new();
        while let Some(row) = rows.next()? {
            summaries.push(SnapshotSummary {
                name: row.get("name")?,
                node_count: row.get("node_count")?,
                created_at: row.get("created_at")?,
                updated_at: row.get("updated_at")?,
            });
        }
        Ok(summaries)
    }

    fn delete_snapshot(&self, name: &str) -> RepoResult<()> {
        let name = normalize_name(name)?;
        let changed = self
            .conn
            .execute("DELETE FROM plan_snapshots WHERE name = ?1;", [name])?;
        if changed == 0 {
            return Err(RepoError::NotFound(name.to_string()));
        }
        Ok(())
    }
}

fn normalize_name(name: &str) -> RepoResult<&str> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(RepoError::InvalidName(name.to_string()));
    }
    Ok(trimmed)
}

#[cfg(test)]
mod tests {
    use super::{RepoError, SnapshotRepository, SqliteSnapshotRepository};
    use crate::db::open_db_in_memory;
    use crate::model::node::{Node, NodePatch, ROOT_ID};
    use crate::store::tree_store::TreeStore;

    #[test]
    fn blank_names_are_rejected() {
        let conn = open_db_in_memory().unwrap();
        let repo = SqliteSnapshotRepository::new(&conn);
        let store = TreeStore::new(Node::root("Programme"));

        let err = repo.save_snapshot("  ", &store.snapshot()).unwrap_err();
        assert!(matches!(err, RepoError::InvalidName(_)));
    }

    #[test]
    fn save_overwrites_existing_name() {
        let conn = open_db_in_memory().unwrap();
        let repo = SqliteSnapshotRepository::new(&conn);
        let mut store = TreeStore::new(Node::root("Programme"));
        repo.save_snapshot("plan", &store.snapshot()).unwrap();

        store.add_child(ROOT_ID, NodePatch::label("Coal")).unwrap();
        repo.save_snapshot(" plan ", &store.snapshot()).unwrap();

        let listed = repo.list_snapshots().unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].node_count, 2);
        assert_eq!(repo.load_snapshot("plan").unwrap(), Some(store.snapshot()));
    }

    #[test]
    fn corrupt_payload_is_reported() {
        let conn = open_db_in_memory().unwrap();
        conn.execute(
            "INSERT INTO plan_snapshots (name, payload, created_at, updated_at)
             VALUES ('broken', '{\"dataMap\": {}}', 0, 0);",
            [],
        )
        .unwrap();
        let repo = SqliteSnapshotRepository::new(&conn);

        let err = repo.load_snapshot("broken").unwrap_err();
        assert!(matches!(err, RepoError::InvalidData { .. }));
    }

    #[test]
    fn delete_missing_snapshot_is_not_found() {
        let conn = open_db_in_memory().unwrap();
        let repo = SqliteSnapshotRepository::new(&conn);

        assert!(matches!(
            repo.delete_snapshot("nope").unwrap_err(),
            RepoError::NotFound(name) if name == "nope"
        ));
    }
}
