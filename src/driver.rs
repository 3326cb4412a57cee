//! The seam between the connection handle and a concrete database client.
//!
//! A [`Driver`] performs the raw calls (connect, prepare, bind, execute and
//! transaction control) and reports faults as [`DriverError`]s. Everything
//! above it, including error translation, the statement cache and query
//! accounting, lives in [`crate::connection::Connection`].

use crate::config::ConnectOptions;
use crate::error::DriverError;
use crate::results::RawResult;
use crate::types::Value;

/// Opaque handle to a statement prepared by a driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StatementHandle(u64);

impl StatementHandle {
    #[must_use]
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    #[must_use]
    pub fn id(self) -> u64 {
        self.0
    }
}

/// What executing a statement produced.
#[derive(Debug, Clone, PartialEq)]
pub enum Execution {
    /// The statement returned a result set
    Rows(RawResult),
    /// The statement ran without producing rows
    Done,
}

/// Descriptive strings captured once per connection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServerMetadata {
    pub client_info: String,
    pub host_info: String,
    pub proto_info: u32,
    pub server_info: String,
}

/// Raw database client operations.
///
/// Implementations are synchronous and own at most one live session. Parameter
/// values are bound positionally; `types` holds one `i`/`s`/`d`/`b` tag per value.
pub trait Driver {
    /// Open a session.
    ///
    /// # Errors
    ///
    /// Returns the client's fault when the session cannot be opened.
    fn connect(&mut self, options: &ConnectOptions) -> Result<(), DriverError>;

    /// # Errors
    ///
    /// Returns a fault when the charset or collation is not supported.
    fn set_charset(&mut self, charset: &str, collation: &str) -> Result<(), DriverError>;

    /// # Errors
    ///
    /// Returns a fault when the server cannot be queried.
    fn metadata(&mut self) -> Result<ServerMetadata, DriverError>;

    /// Close the session. Prepared statements are released with it.
    ///
    /// # Errors
    ///
    /// Returns a fault when the client refuses to close.
    fn close(&mut self) -> Result<(), DriverError>;

    /// # Errors
    ///
    /// Returns a fault when the mode cannot be changed.
    fn set_autocommit(&mut self, enabled: bool) -> Result<(), DriverError>;

    /// # Errors
    ///
    /// Returns a fault when a transaction cannot be started.
    fn begin_transaction(&mut self) -> Result<(), DriverError>;

    /// # Errors
    ///
    /// Returns a fault when the transaction cannot be committed.
    fn commit(&mut self) -> Result<(), DriverError>;

    /// # Errors
    ///
    /// Returns a fault when the transaction cannot be rolled back.
    fn rollback(&mut self) -> Result<(), DriverError>;

    /// # Errors
    ///
    /// Returns a fault when the SQL does not compile.
    fn prepare(&mut self, sql: &str) -> Result<StatementHandle, DriverError>;

    /// Bind `values` to the placeholders of `handle`, replacing earlier bindings.
    ///
    /// # Errors
    ///
    /// Returns a fault on a count mismatch or an unknown handle.
    fn bind(
        &mut self,
        handle: StatementHandle,
        types: &str,
        values: &[Value],
    ) -> Result<(), DriverError>;

    /// Run `handle` with its current bindings and buffer any rows.
    ///
    /// # Errors
    ///
    /// Returns the client's fault when execution fails.
    fn execute(&mut self, handle: StatementHandle) -> Result<Execution, DriverError>;

    /// Release a prepared statement. Unknown handles are ignored.
    fn close_statement(&mut self, handle: StatementHandle);

    /// # Errors
    ///
    /// Returns a fault when the session is gone.
    fn ping(&mut self) -> Result<(), DriverError>;

    /// Auto-increment id generated by the last insert, `0` when there is none.
    fn insert_id(&self) -> u64;

    fn affected_rows(&self) -> i64;

    /// Code of the last failed call, `0` after a successful one.
    fn errno(&self) -> i32;

    /// Message of the last failed call, empty after a successful one.
    fn error(&self) -> String;

    fn escape(&self, value: &str) -> String;

    /// Size of `dbname` in bytes.
    ///
    /// # Errors
    ///
    /// Returns a fault when the size cannot be read.
    fn database_size(&mut self, dbname: &str) -> Result<u64, DriverError>;
}
