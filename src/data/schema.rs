//! Embedded schema migrations
//!
//! Migrations are applied in order and tracked in `PRAGMA user_version`, so
//! running [`migrate`] against an up-to-date database is a no-op.

use rusqlite::{Connection, TransactionBehavior};

use super::errors::{StoreError, StoreResult};

/// Ordered migrations. Index `n` brings the schema to version `n + 1`.
const MIGRATIONS: &[&str] = &[
    // 1: the list table. The primary key doubles as the index for keyset
    // pagination: (list = ?, item > ?) order by item limit ?.
    "create table if not exists lists (
         list     text    not null,
         item     text    not null,
         attempts integer not null default 0 check (attempts >= 0),
         primary key (list, item)
     ) without rowid;",
];

/// Schema version this binary expects.
pub fn latest_version() -> u32 {
    MIGRATIONS.len() as u32
}

/// Current schema version of the database.
pub fn current_version(conn: &Connection) -> StoreResult<u32> {
    let version: i64 = conn.pragma_query_value(None, "user_version", |row| row.get(0))?;
    Ok(version as u32)
}

/// Apply every pending migration in one transaction.
///
/// Returns the number of migrations applied.
pub fn migrate(conn: &mut Connection) -> StoreResult<u32> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let current = current_version(&tx)?;
    let latest = latest_version();

    if current > latest {
        return Err(StoreError::engine(format!(
            "database schema version {} is newer than supported version {}",
            current, latest
        )));
    }

    for sql in &MIGRATIONS[current as usize..] {
        tx.execute_batch(sql)?;
    }
    tx.pragma_update(None, "user_version", latest as i64)?;
    tx.commit()?;

    Ok(latest - current)
}
