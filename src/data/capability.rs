//! Storage capabilities
//!
//! Each list operation asks only for what it needs: [`Querier`] to read rows,
//! [`Execer`] to run a mutating statement, [`BulkLoader`] to copy many items
//! in one statement. All three are implemented for [`rusqlite::Connection`],
//! which covers plain connections, pooled connections and transactions (both
//! dereference to a connection).

use rusqlite::{params, Connection, OptionalExtension, Row, ToSql};

use super::errors::StoreResult;

/// Can run a query and map its rows.
pub trait Querier {
    /// Map every returned row.
    fn query_rows<T, F>(&self, sql: &str, params: &[&dyn ToSql], map: F) -> StoreResult<Vec<T>>
    where
        F: FnMut(&Row<'_>) -> rusqlite::Result<T>;

    /// Map the first returned row, if any.
    fn query_opt<T, F>(&self, sql: &str, params: &[&dyn ToSql], map: F) -> StoreResult<Option<T>>
    where
        F: FnOnce(&Row<'_>) -> rusqlite::Result<T>;
}

/// Can run a single mutating statement.
pub trait Execer {
    /// Returns the number of rows the statement changed.
    fn exec(&self, sql: &str, params: &[&dyn ToSql]) -> StoreResult<u64>;
}

/// Can copy a sequence of items into a list in one set-oriented statement.
pub trait BulkLoader {
    /// Returns the number of rows copied.
    fn copy_items(&self, list: &str, items: &[String]) -> StoreResult<u64>;
}

/// The whole batch travels as one JSON array parameter and is unnested
/// with `json_each`, so the statement text never depends on batch size.
const COPY_ITEMS_SQL: &str = "
    insert into lists (list, item)
         select ?1, value
           from json_each(?2)";

impl Querier for Connection {
    fn query_rows<T, F>(&self, sql: &str, params: &[&dyn ToSql], map: F) -> StoreResult<Vec<T>>
    where
        F: FnMut(&Row<'_>) -> rusqlite::Result<T>,
    {
        let mut stmt = self.prepare_cached(sql)?;
        let rows = stmt.query_map(params, map)?;
        let collected = rows.collect::<rusqlite::Result<Vec<T>>>()?;
        Ok(collected)
    }

    fn query_opt<T, F>(&self, sql: &str, params: &[&dyn ToSql], map: F) -> StoreResult<Option<T>>
    where
        F: FnOnce(&Row<'_>) -> rusqlite::Result<T>,
    {
        let mut stmt = self.prepare_cached(sql)?;
        let row = stmt.query_row(params, map).optional()?;
        Ok(row)
    }
}

impl Execer for Connection {
    fn exec(&self, sql: &str, params: &[&dyn ToSql]) -> StoreResult<u64> {
        let mut stmt = self.prepare_cached(sql)?;
        let changed = stmt.execute(params)?;
        Ok(changed as u64)
    }
}

impl BulkLoader for Connection {
    fn copy_items(&self, list: &str, items: &[String]) -> StoreResult<u64> {
        let encoded = json_array(items);
        self.exec(COPY_ITEMS_SQL, params![list, encoded])
    }
}

/// Encode items as a JSON array for `json_each`.
pub(crate) fn json_array(items: &[String]) -> String {
    serde_json::Value::from(items.to_vec()).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::schema;

    fn conn() -> Connection {
        let mut conn = Connection::open_in_memory().unwrap();
        schema::migrate(&mut conn).unwrap();
        conn
    }

    #[test]
    fn test_json_array_escapes_items() {
        let items = vec!["a\"b".to_string(), "c\nd".to_string()];
        let encoded = json_array(&items);
        let decoded: Vec<String> = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded, items);
    }

    #[test]
    fn test_copy_items_inserts_every_item() {
        let conn = conn();
        let items: Vec<String> = (0..100).map(|i| format!("file-{:03}", i)).collect();
        assert_eq!(conn.copy_items("downloads", &items).unwrap(), 100);

        let count = conn
            .query_opt("select count(*) from lists where list = ?1", params!["downloads"], |row| {
                row.get::<_, i64>(0)
            })
            .unwrap();
        assert_eq!(count, Some(100));
    }

    #[test]
    fn test_copy_items_works_inside_transaction() {
        let mut conn = conn();
        let tx = conn.transaction().unwrap();
        tx.copy_items("downloads", &["a".to_string()]).unwrap();
        tx.rollback().unwrap();

        let found = conn
            .query_opt("select attempts from lists where list = ?1", params!["downloads"], |row| {
                row.get::<_, i64>(0)
            })
            .unwrap();
        assert_eq!(found, None);
    }

    #[test]
    fn test_exec_reports_changed_rows() {
        let conn = conn();
        conn.copy_items("l", &["x".to_string(), "y".to_string()]).unwrap();
        let changed = conn.exec("delete from lists where list = ?1", params!["l"]).unwrap();
        assert_eq!(changed, 2);
    }
}
