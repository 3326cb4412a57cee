use std::collections::HashMap;

use rusqlite::types::Value as SqliteValue;
use rusqlite::{DatabaseName, ffi};

use crate::config::ConnectOptions;
use crate::driver::{Driver, Execution, ServerMetadata, StatementHandle};
use crate::error::DriverError;
use crate::params::ParamType;
use crate::types::Value;

use super::params::to_sqlite_value;
use super::query::build_raw_result;

const IN_MEMORY: &str = ":memory:";

/// A statement the handle layer holds a [`StatementHandle`] for.
///
/// The compiled statement itself lives in rusqlite's statement cache, keyed
/// by its SQL text; this slot only keeps the text and the current bindings.
#[derive(Debug)]
struct PreparedSlot {
    sql: String,
    parameter_count: usize,
    bound: Vec<SqliteValue>,
}

/// [`Driver`] over a single `rusqlite` connection.
///
/// `dbname` is the database file path (`:memory:` for a private in-memory
/// database); host, user, password and port are not used.
#[derive(Debug, Default)]
pub struct SqliteDriver {
    conn: Option<rusqlite::Connection>,
    location: String,
    statements: HashMap<u64, PreparedSlot>,
    next_statement: u64,
    autocommit: bool,
    insert_id: u64,
    last_error: Option<(i32, String)>,
}

fn closed() -> DriverError {
    DriverError::new(ffi::SQLITE_MISUSE, "connection is closed")
}

fn unknown_statement(handle: StatementHandle) -> DriverError {
    DriverError::new(
        ffi::SQLITE_MISUSE,
        format!("statement {} is not prepared", handle.id()),
    )
}

fn is_insert(sql: &str) -> bool {
    let head = sql
        .trim_start()
        .chars()
        .take(7)
        .collect::<String>()
        .to_ascii_lowercase();
    head.starts_with("insert") || head.starts_with("replace")
}

/// `SQLite` text encoding for a client charset name.
fn encoding_for(charset: &str) -> Option<&'static str> {
    match charset.to_ascii_lowercase().as_str() {
        "utf8" | "utf8mb3" | "utf8mb4" | "utf-8" => Some("UTF-8"),
        "utf16" | "utf-16" => Some("UTF-16"),
        "utf16le" | "utf-16le" => Some("UTF-16le"),
        "utf16be" | "utf-16be" => Some("UTF-16be"),
        _ => None,
    }
}

impl SqliteDriver {
    #[must_use]
    pub fn new() -> Self {
        Self {
            autocommit: true,
            ..Self::default()
        }
    }

    /// The underlying connection, for work the handle does not cover.
    #[must_use]
    pub fn connection(&self) -> Option<&rusqlite::Connection> {
        self.conn.as_ref()
    }

    fn conn(&self) -> Result<&rusqlite::Connection, DriverError> {
        self.conn.as_ref().ok_or_else(closed)
    }

    /// Remember the outcome of a driver call for `errno`/`error`.
    fn track<T>(&mut self, result: Result<T, DriverError>) -> Result<T, DriverError> {
        self.last_error = result.as_ref().err().map(|e| (e.code, e.message.clone()));
        result
    }

    fn batch(&mut self, sql: &str) -> Result<(), DriverError> {
        let result = self
            .conn()
            .and_then(|conn| conn.execute_batch(sql).map_err(DriverError::from));
        self.track(result)
    }

    fn in_transaction(&self) -> bool {
        self.conn.as_ref().is_some_and(|c| !c.is_autocommit())
    }

    /// Run a prepared statement; also returns the row id it generated, or 0.
    fn run(&self, handle: StatementHandle) -> Result<(Execution, u64), DriverError> {
        let conn = self.conn()?;
        let slot = self
            .statements
            .get(&handle.id())
            .ok_or_else(|| unknown_statement(handle))?;
        let before = conn.last_insert_rowid();
        let mut stmt = conn.prepare_cached(&slot.sql)?;
        let (execution, changed) = if stmt.column_count() == 0 {
            let changed = stmt.execute(rusqlite::params_from_iter(slot.bound.iter()))?;
            (Execution::Done, changed)
        } else {
            (Execution::Rows(build_raw_result(&mut stmt, &slot.bound)?), 0)
        };
        let after = conn.last_insert_rowid();
        // the rowid stays put when an insert reuses the previous id
        let inserted = after != before || (changed > 0 && is_insert(&slot.sql));
        let insert_id = if inserted {
            u64::try_from(after).unwrap_or_default()
        } else {
            0
        };
        Ok((execution, insert_id))
    }

    fn read_size(&self, dbname: &str) -> Result<u64, DriverError> {
        let conn = self.conn()?;
        let schema = if dbname == "main" || dbname == self.location {
            DatabaseName::Main
        } else {
            DatabaseName::Attached(dbname)
        };
        let page_count: i64 =
            conn.pragma_query_value(Some(schema), "page_count", |row| row.get(0))?;
        let page_size: i64 =
            conn.pragma_query_value(Some(schema), "page_size", |row| row.get(0))?;
        Ok(u64::try_from(page_count.saturating_mul(page_size)).unwrap_or_default())
    }
}

impl Driver for SqliteDriver {
    fn connect(&mut self, options: &ConnectOptions) -> Result<(), DriverError> {
        let location = if options.dbname.is_empty() {
            IN_MEMORY.to_string()
        } else {
            options.dbname.clone()
        };
        let opened = rusqlite::Connection::open(&location).map_err(DriverError::from);
        let conn = self.track(opened)?;
        self.conn = Some(conn);
        self.location = location;
        self.statements.clear();
        self.autocommit = true;
        self.insert_id = 0;
        Ok(())
    }

    fn set_charset(&mut self, charset: &str, collation: &str) -> Result<(), DriverError> {
        let result = match encoding_for(charset) {
            // collation names are server-side; SQLite collates text per column
            Some(encoding) => self.conn().and_then(|conn| {
                conn.pragma_update(None, "encoding", encoding)
                    .map_err(DriverError::from)
            }),
            None => Err(DriverError::new(
                ffi::SQLITE_MISUSE,
                format!("Can't initialize character set {charset} (collation {collation})"),
            )),
        };
        self.track(result)
    }

    fn metadata(&mut self) -> Result<ServerMetadata, DriverError> {
        let server_info = self.conn().and_then(|conn| {
            conn.query_row("SELECT sqlite_version()", [], |row| row.get::<_, String>(0))
                .map_err(DriverError::from)
        });
        let server_info = self.track(server_info)?;
        let host_info = if self.location == IN_MEMORY {
            "in-memory database".to_string()
        } else {
            format!("{} via file", self.location)
        };
        Ok(ServerMetadata {
            client_info: rusqlite::version().to_string(),
            host_info,
            proto_info: u32::try_from(rusqlite::version_number() / 1_000_000).unwrap_or_default(),
            server_info,
        })
    }

    fn close(&mut self) -> Result<(), DriverError> {
        self.statements.clear();
        self.insert_id = 0;
        let Some(conn) = self.conn.take() else {
            return Ok(());
        };
        let result = conn.close().map_err(|(_, e)| DriverError::from(e));
        self.track(result)
    }

    fn set_autocommit(&mut self, enabled: bool) -> Result<(), DriverError> {
        self.conn()?;
        let in_transaction = self.in_transaction();
        if enabled && in_transaction {
            self.batch("COMMIT")?;
        } else if !enabled && !in_transaction {
            self.batch("BEGIN")?;
        }
        self.autocommit = enabled;
        Ok(())
    }

    fn begin_transaction(&mut self) -> Result<(), DriverError> {
        // starting a transaction commits the open one
        if self.in_transaction() {
            self.batch("COMMIT")?;
        }
        self.batch("BEGIN")
    }

    fn commit(&mut self) -> Result<(), DriverError> {
        if self.in_transaction() {
            self.batch("COMMIT")?;
        } else {
            self.conn()?;
        }
        if !self.autocommit {
            self.batch("BEGIN")?;
        }
        Ok(())
    }

    fn rollback(&mut self) -> Result<(), DriverError> {
        if self.in_transaction() {
            self.batch("ROLLBACK")?;
        } else {
            self.conn()?;
        }
        if !self.autocommit {
            self.batch("BEGIN")?;
        }
        Ok(())
    }

    fn prepare(&mut self, sql: &str) -> Result<StatementHandle, DriverError> {
        let prepared = self.conn().and_then(|conn| {
            let stmt = conn.prepare_cached(sql)?;
            Ok(stmt.parameter_count())
        });
        let parameter_count = self.track(prepared)?;
        self.next_statement += 1;
        let handle = StatementHandle::new(self.next_statement);
        self.statements.insert(
            handle.id(),
            PreparedSlot {
                sql: sql.to_string(),
                parameter_count,
                bound: Vec::new(),
            },
        );
        Ok(handle)
    }

    fn bind(
        &mut self,
        handle: StatementHandle,
        types: &str,
        values: &[Value],
    ) -> Result<(), DriverError> {
        let converted = self.statements.get(&handle.id()).map_or_else(
            || Err(unknown_statement(handle)),
            |slot| convert_bindings(slot.parameter_count, types, values),
        );
        let converted = self.track(converted)?;
        if let Some(slot) = self.statements.get_mut(&handle.id()) {
            slot.bound = converted;
        }
        Ok(())
    }

    fn execute(&mut self, handle: StatementHandle) -> Result<Execution, DriverError> {
        self.insert_id = 0;
        let result = self.run(handle).map(|(execution, insert_id)| {
            self.insert_id = insert_id;
            execution
        });
        self.track(result)
    }

    fn close_statement(&mut self, handle: StatementHandle) {
        self.statements.remove(&handle.id());
    }

    fn ping(&mut self) -> Result<(), DriverError> {
        let result = self.conn().and_then(|conn| {
            conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))
                .map(|_| ())
                .map_err(DriverError::from)
        });
        self.track(result)
    }

    fn insert_id(&self) -> u64 {
        self.insert_id
    }

    fn affected_rows(&self) -> i64 {
        self.conn
            .as_ref()
            .map_or(0, |c| i64::try_from(c.changes()).unwrap_or(i64::MAX))
    }

    fn errno(&self) -> i32 {
        self.last_error.as_ref().map_or(0, |(code, _)| *code)
    }

    fn error(&self) -> String {
        self.last_error
            .as_ref()
            .map(|(_, message)| message.clone())
            .unwrap_or_default()
    }

    fn escape(&self, value: &str) -> String {
        value.replace('\'', "''")
    }

    fn database_size(&mut self, dbname: &str) -> Result<u64, DriverError> {
        let result = self.read_size(dbname);
        self.track(result)
    }
}

fn convert_bindings(
    parameter_count: usize,
    types: &str,
    values: &[Value],
) -> Result<Vec<SqliteValue>, DriverError> {
    if types.chars().count() != values.len() || values.len() != parameter_count {
        return Err(DriverError::new(
            ffi::SQLITE_RANGE,
            "Number of variables doesn't match number of parameters in prepared statement",
        ));
    }
    types
        .chars()
        .zip(values)
        .map(|(tag, value)| {
            let param_type = ParamType::try_from(tag)
                .map_err(|e| DriverError::new(ffi::SQLITE_MISMATCH, e.to_string()))?;
            Ok(to_sqlite_value(param_type, value))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open() -> SqliteDriver {
        let mut driver = SqliteDriver::new();
        driver
            .connect(&ConnectOptions::new("", "", "", IN_MEMORY))
            .unwrap();
        driver
    }

    #[test]
    fn bind_rejects_wrong_parameter_count() {
        let mut driver = open();
        let handle = driver.prepare("SELECT ? + ?").unwrap();
        let err = driver.bind(handle, "i", &[Value::Int(1)]).unwrap_err();
        assert_eq!(err.code, ffi::SQLITE_RANGE);
        assert_eq!(driver.errno(), ffi::SQLITE_RANGE);

        driver
            .bind(handle, "ii", &[Value::Int(1), Value::Int(2)])
            .unwrap();
        assert_eq!(driver.errno(), 0);
        assert_eq!(driver.error(), "");
    }

    #[test]
    fn statements_without_columns_report_done() {
        let mut driver = open();
        let handle = driver.prepare("CREATE TABLE t (a INTEGER)").unwrap();
        assert_eq!(driver.execute(handle).unwrap(), Execution::Done);
        let handle = driver.prepare("SELECT count(*) AS n FROM t").unwrap();
        match driver.execute(handle).unwrap() {
            Execution::Rows(raw) => {
                assert_eq!(raw.columns, vec!["n".to_string()]);
                assert_eq!(raw.rows, vec![vec![Value::Int(0)]]);
            }
            Execution::Done => panic!("expected rows"),
        }
    }

    #[test]
    fn insert_id_belongs_to_the_last_statement() {
        let mut driver = open();
        let handle = driver
            .prepare("CREATE TABLE t (id INTEGER PRIMARY KEY, a TEXT)")
            .unwrap();
        driver.execute(handle).unwrap();
        let insert = driver
            .prepare("INSERT INTO t (id, a) VALUES (5, 'x')")
            .unwrap();
        driver.execute(insert).unwrap();
        assert_eq!(driver.insert_id(), 5);

        let handle = driver.prepare("UPDATE t SET a = 'y'").unwrap();
        driver.execute(handle).unwrap();
        assert_eq!(driver.insert_id(), 0);

        // same rowid generated again after the row is gone
        let handle = driver.prepare("DELETE FROM t").unwrap();
        driver.execute(handle).unwrap();
        driver.execute(insert).unwrap();
        assert_eq!(driver.insert_id(), 5);

        let handle = driver.prepare("SELECT a FROM t").unwrap();
        driver.execute(handle).unwrap();
        assert_eq!(driver.insert_id(), 0);
    }

    #[test]
    fn unknown_charsets_are_rejected() {
        let mut driver = open();
        assert!(driver.set_charset("utf8mb4", "utf8mb4_unicode_ci").is_ok());
        let err = driver.set_charset("latin1", "latin1_swedish_ci").unwrap_err();
        assert!(err.message.contains("latin1"));
    }

    #[test]
    fn escape_doubles_single_quotes() {
        assert_eq!(SqliteDriver::new().escape("O'Brien"), "O''Brien");
    }
}
