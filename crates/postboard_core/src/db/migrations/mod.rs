//! Postboard schema history.
//!
//! `0001` creates users, posts and comments; `0002` adds the recency indexes
//! behind newest-first listings. The applied version lives in
//! `PRAGMA user_version`.

use crate::db::{DbError, DbResult};
use rusqlite::Connection;

#[derive(Debug, Clone, Copy)]
struct Migration {
    version: u32,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        sql: include_str!("0001_init.sql"),
    },
    Migration {
        version: 2,
        sql: include_str!("0002_recency_indexes.sql"),
    },
];

/// Tables every migrated store must contain.
pub const POSTBOARD_TABLES: &[&str] = &["users", "posts", "comments"];

/// Returns the latest migration version known by this binary.
pub fn latest_version() -> u32 {
    MIGRATIONS.last().map_or(0, |migration| migration.version)
}

/// Brings the store up to `latest_version()` and checks the postboard
/// tables are present.
pub fn apply_migrations(conn: &mut Connection) -> DbResult<()> {
    migrate(conn)?;
    verify_tables(conn)
}

fn migrate(conn: &mut Connection) -> DbResult<()> {
    let current_version = current_user_version(conn)?;
    let latest = latest_version();

    if current_version > latest {
        return Err(DbError::UnsupportedSchemaVersion {
            db_version: current_version,
            latest_supported: latest,
        });
    }

    if current_version == latest {
        return Ok(());
    }

    let tx = conn.transaction()?;
    for migration in MIGRATIONS {
        if migration.version <= current_version {
            continue;
        }

        tx.execute_batch(migration.sql)?;
        tx.execute_batch(&format!("PRAGMA user_version = {};", migration.version))?;
    }
    tx.commit()?;

    Ok(())
}

/// Rejects stores whose `user_version` was bumped without the tables.
fn verify_tables(conn: &Connection) -> DbResult<()> {
    let mut stmt =
        conn.prepare("SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1;")?;
    for &table in POSTBOARD_TABLES {
        if !stmt.exists([table])? {
            return Err(DbError::MissingTable(table));
        }
    }
    Ok(())
}

fn current_user_version(conn: &Connection) -> DbResult<u32> {
    let version = conn.query_row("PRAGMA user_version;", [], |row| row.get::<_, u32>(0))?;
    Ok(version)
}
