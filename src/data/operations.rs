//! List operations
//!
//! Synchronous building blocks behind [`ListStore`](super::ListStore). Each
//! function takes the narrowest capability it needs, so the same code runs
//! against a single connection, a pooled one, or an open transaction.
//!
//! Inserting an existing `(list, item)` pair is an error: the primary key
//! violation surfaces as an engine failure and the existing row, including
//! its attempt count, is left untouched. A batch containing such a pair is
//! rejected as a whole.
//!
//! The empty string is never stored as an item: an empty cursor means "from
//! the beginning", so such an item could never be paged past.

use rusqlite::params;

use super::capability::{json_array, BulkLoader, Execer, Querier};
use super::entry::ListEntry;
use super::errors::{StoreError, StoreResult};

/// Reject item identifiers the list cannot hold.
pub fn check_items<'a, I>(items: I) -> StoreResult<()>
where
    I: IntoIterator<Item = &'a str>,
{
    if items.into_iter().any(str::is_empty) {
        return Err(StoreError::invalid_item(
            "item identifiers must not be empty",
        ));
    }
    Ok(())
}

/// Add an item to a list, creating the list if needed.
pub fn insert_one<E: Execer + ?Sized>(e: &E, list: &str, item: &str) -> StoreResult<u64> {
    check_items([item])?;
    e.exec(
        "insert into lists (list, item)
              values (?1, ?2)",
        params![list, item],
    )
}

/// Attempts made on an item, or `None` when the list or item is missing.
pub fn get_one<Q: Querier + ?Sized>(q: &Q, list: &str, item: &str) -> StoreResult<Option<i64>> {
    q.query_opt(
        "select attempts
           from lists
          where list = ?1
            and item = ?2",
        params![list, item],
        |row| row.get(0),
    )
}

/// Remove an item from a list. Returns 1 if a row went away, 0 otherwise.
pub fn delete_one<E: Execer + ?Sized>(e: &E, list: &str, item: &str) -> StoreResult<u64> {
    e.exec(
        "delete from lists
          where list = ?1
            and item = ?2",
        params![list, item],
    )
}

/// Record one more attempt on an item. Returns 1 if found, 0 otherwise.
pub fn increment_one<E: Execer + ?Sized>(e: &E, list: &str, item: &str) -> StoreResult<u64> {
    e.exec(
        "update lists
            set attempts = attempts + 1
          where list = ?1
            and item = ?2",
        params![list, item],
    )
}

/// Add every item to a list with zero attempts, in one statement.
pub fn insert_batch<B: BulkLoader + ?Sized>(
    b: &B,
    list: &str,
    items: &[String],
) -> StoreResult<u64> {
    if items.is_empty() {
        return Ok(0);
    }
    check_items(items.iter().map(String::as_str))?;
    b.copy_items(list, items)
}

/// Up to `count` entries of a list in ascending item order, starting
/// strictly after `after` (or at the beginning when `after` is empty).
///
/// Callers page forward by passing the last item of the previous page as
/// `after`; a page shorter than `count` means the list is exhausted.
pub fn get_batch<Q: Querier + ?Sized>(
    q: &Q,
    list: &str,
    after: &str,
    count: usize,
) -> StoreResult<Vec<ListEntry>> {
    if count == 0 {
        return Ok(Vec::new());
    }
    let limit = i64::try_from(count).unwrap_or(i64::MAX);
    let to_entry = |row: &rusqlite::Row<'_>| -> rusqlite::Result<ListEntry> {
        Ok(ListEntry::new(row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
    };

    // Every stored item sorts after '', so an empty cursor starts the list.
    q.query_rows(
        "select item, attempts
           from lists
          where list = ?1
            and item > ?2
       order by item
          limit ?3",
        params![list, after, limit],
        to_entry,
    )
}

/// Remove every listed item that exists; unknown items are skipped.
pub fn delete_batch<E: Execer + ?Sized>(e: &E, list: &str, items: &[String]) -> StoreResult<u64> {
    if items.is_empty() {
        return Ok(0);
    }
    e.exec(
        "delete from lists
          where list = ?1
            and item in (select value from json_each(?2))",
        params![list, json_array(items)],
    )
}

/// Record one more attempt on every listed item that exists.
pub fn increment_batch<E: Execer + ?Sized>(
    e: &E,
    list: &str,
    items: &[String],
) -> StoreResult<u64> {
    if items.is_empty() {
        return Ok(0);
    }
    e.exec(
        "update lists
            set attempts = attempts + 1
          where list = ?1
            and item in (select value from json_each(?2))",
        params![list, json_array(items)],
    )
}

/// Remove every list. Test and admin convenience.
pub fn nuke<E: Execer + ?Sized>(e: &E) -> StoreResult<u64> {
    e.exec("delete from lists", params![])
}
