use std::time::{Duration, Instant};

use crate::config::ConnectOptions;
use crate::database::{Database, QueryOutcome};
use crate::driver::{Driver, Execution, ServerMetadata, StatementHandle};
use crate::error::{DriverError, SqlHandleError, Stage, translate};
use crate::params::{BoundParams, Parameter};
use crate::results::DbResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connected,
}

/// The single prepared statement kept for reuse, keyed by its exact SQL text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedStatement {
    pub sql: String,
    pub handle: StatementHandle,
}

/// A synchronous connection handle over a [`Driver`].
///
/// Keeps the last prepared statement: running the same SQL again with
/// parameters rebinds and executes it without preparing a second time.
/// Not meant for concurrent use; wrap it in a mutex if it has to be shared.
#[derive(Debug)]
pub struct Connection<D: Driver> {
    driver: D,
    state: ConnectionState,
    options: Option<ConnectOptions>,
    metadata: Option<ServerMetadata>,
    cached: Option<CachedStatement>,
    db_time: Duration,
    total_queries: u64,
}

impl<D: Driver> Connection<D> {
    /// Wrap `driver` in a disconnected handle.
    #[must_use]
    pub fn new(driver: D) -> Self {
        Self {
            driver,
            state: ConnectionState::Disconnected,
            options: None,
            metadata: None,
            cached: None,
            db_time: Duration::ZERO,
            total_queries: 0,
        }
    }

    #[must_use]
    pub fn driver(&self) -> &D {
        &self.driver
    }

    pub fn driver_mut(&mut self) -> &mut D {
        &mut self.driver
    }

    #[must_use]
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.state == ConnectionState::Connected
    }

    /// SQL text of the statement currently held for reuse.
    #[must_use]
    pub fn cached_sql(&self) -> Option<&str> {
        self.cached.as_ref().map(|c| c.sql.as_str())
    }

    fn check_connected(&self) -> Result<(), SqlHandleError> {
        if self.is_connected() {
            Ok(())
        } else {
            Err(SqlHandleError::NotConnected)
        }
    }

    fn connected_metadata(&self) -> Result<&ServerMetadata, SqlHandleError> {
        self.check_connected()?;
        self.metadata.as_ref().ok_or(SqlHandleError::NotConnected)
    }

    fn evict_statement(&mut self) {
        if let Some(stmt) = self.cached.take() {
            tracing::debug!(handle = stmt.handle.id(), "evicting cached statement");
            self.driver.close_statement(stmt.handle);
        }
    }

    /// Run a driver call that is not a statement, timing it into `db_time`.
    fn timed<T>(
        &mut self,
        what: &'static str,
        call: impl FnOnce(&mut D) -> Result<T, DriverError>,
    ) -> Result<T, SqlHandleError> {
        self.check_connected()?;
        let start = Instant::now();
        let result = call(&mut self.driver);
        self.db_time += start.elapsed();
        result.map_err(|e| translate(Stage::Operation(what), e, &[]))
    }

    fn bind_and_execute(
        &mut self,
        handle: StatementHandle,
        params: &[Parameter],
    ) -> Result<QueryOutcome<DbResult>, SqlHandleError> {
        if !params.is_empty() {
            let bound = BoundParams::bind(params);
            tracing::trace!(types = bound.types(), "binding parameters");
            self.driver
                .bind(handle, bound.types(), bound.values())
                .map_err(|e| translate(Stage::Bind, e, params))?;
        }
        match self
            .driver
            .execute(handle)
            .map_err(|e| translate(Stage::Execute, e, params))?
        {
            Execution::Rows(raw) => Ok(QueryOutcome::Rows(DbResult::new(raw))),
            Execution::Done => Ok(QueryOutcome::Ack(true)),
        }
    }

    fn run_statement(
        &mut self,
        sql: &str,
        params: &[Parameter],
    ) -> Result<QueryOutcome<DbResult>, SqlHandleError> {
        self.evict_statement();
        tracing::debug!(sql, "preparing statement");
        let handle = self
            .driver
            .prepare(sql)
            .map_err(|e| translate(Stage::Prepare, e, params))?;
        self.cached = Some(CachedStatement {
            sql: sql.to_string(),
            handle,
        });
        self.bind_and_execute(handle, params)
    }

    /// Drop the session without surfacing close failures.
    fn teardown(&mut self) {
        self.evict_statement();
        self.metadata = None;
        self.state = ConnectionState::Disconnected;
        if let Err(e) = self.driver.close() {
            tracing::warn!(code = e.code, "closing previous connection failed");
        }
    }

    fn open(&mut self, options: &ConnectOptions) -> Result<(), DriverError> {
        self.driver.connect(options)?;
        let session = self
            .driver
            .set_charset(&options.charset, &options.collation)
            .and_then(|()| self.driver.metadata());
        match session {
            Ok(metadata) => {
                self.metadata = Some(metadata);
                Ok(())
            }
            Err(e) => {
                if let Err(close_err) = self.driver.close() {
                    tracing::warn!(code = close_err.code, "closing half-open connection failed");
                }
                Err(e)
            }
        }
    }
}

#[cfg(feature = "sqlite")]
impl Connection<crate::sqlite::SqliteDriver> {
    /// A disconnected handle over the bundled `SQLite` driver.
    #[must_use]
    pub fn sqlite() -> Self {
        Self::new(crate::sqlite::SqliteDriver::new())
    }
}

impl<D: Driver> Database for Connection<D> {
    type Result = DbResult;

    fn connect(&mut self, options: ConnectOptions) -> Result<(), SqlHandleError> {
        if self.is_connected() {
            self.teardown();
        }
        let start = Instant::now();
        let opened = self.open(&options);
        self.db_time += start.elapsed();
        opened.map_err(|e| translate(Stage::Connect, e, &[]))?;

        tracing::debug!(host = %options.host, dbname = %options.dbname, "connected");
        self.options = Some(options);
        self.state = ConnectionState::Connected;
        Ok(())
    }

    fn reconnect(&mut self) -> Result<(), SqlHandleError> {
        let options = self.options.clone().ok_or(SqlHandleError::NotConnected)?;
        tracing::debug!(host = %options.host, "reconnecting");
        self.connect(options)
    }

    fn close(&mut self) -> Result<(), SqlHandleError> {
        self.check_connected()?;
        self.evict_statement();
        self.metadata = None;
        self.state = ConnectionState::Disconnected;
        tracing::debug!("closing connection");
        self.driver.close().map_err(|e| {
            translate(
                Stage::Operation("unable to close connection to database"),
                e,
                &[],
            )
        })
    }

    fn autocommit(&mut self, enabled: bool) -> Result<(), SqlHandleError> {
        self.timed("unable to change autocommit mode", |d| d.set_autocommit(enabled))
    }

    fn begin_transaction(&mut self) -> Result<(), SqlHandleError> {
        self.timed("unable to start transaction", D::begin_transaction)
    }

    fn commit(&mut self) -> Result<(), SqlHandleError> {
        self.timed("unable to commit transaction", D::commit)
    }

    fn rollback(&mut self) -> Result<(), SqlHandleError> {
        self.timed("unable to rollback transaction", D::rollback)
    }

    fn query(
        &mut self,
        sql: &str,
        params: &[Parameter],
    ) -> Result<QueryOutcome<DbResult>, SqlHandleError> {
        self.check_connected()?;
        if !params.is_empty() && self.cached_sql() == Some(sql) {
            tracing::debug!("reusing cached statement");
            return self.execute(params);
        }
        let start = Instant::now();
        let outcome = self.run_statement(sql, params);
        self.db_time += start.elapsed();
        if outcome.is_ok() {
            self.total_queries += 1;
        }
        outcome
    }

    fn execute(&mut self, params: &[Parameter]) -> Result<QueryOutcome<DbResult>, SqlHandleError> {
        self.check_connected()?;
        let handle = self
            .cached
            .as_ref()
            .map(|c| c.handle)
            .ok_or(SqlHandleError::StatementInvalid)?;
        let start = Instant::now();
        let outcome = self.bind_and_execute(handle, params);
        self.db_time += start.elapsed();
        if outcome.is_ok() {
            self.total_queries += 1;
        }
        outcome
    }

    fn ping(&mut self) -> Result<(), SqlHandleError> {
        self.timed("connection to database lost", D::ping)
    }

    fn insert_id(&self) -> Result<u64, SqlHandleError> {
        self.check_connected()?;
        match self.driver.insert_id() {
            0 => Err(SqlHandleError::NoAutoIncrement),
            id => Ok(id),
        }
    }

    fn affected_rows(&self) -> Result<i64, SqlHandleError> {
        self.check_connected()?;
        Ok(self.driver.affected_rows())
    }

    fn escape(&self, value: &str) -> String {
        self.driver.escape(value)
    }

    fn client_info(&self) -> Result<&str, SqlHandleError> {
        Ok(&self.connected_metadata()?.client_info)
    }

    fn host_info(&self) -> Result<&str, SqlHandleError> {
        Ok(&self.connected_metadata()?.host_info)
    }

    fn proto_info(&self) -> Result<u32, SqlHandleError> {
        Ok(self.connected_metadata()?.proto_info)
    }

    fn server_info(&self) -> Result<&str, SqlHandleError> {
        Ok(&self.connected_metadata()?.server_info)
    }

    fn errno(&self) -> Result<i32, SqlHandleError> {
        self.check_connected()?;
        Ok(self.driver.errno())
    }

    fn errstr(&self) -> Result<String, SqlHandleError> {
        self.check_connected()?;
        Ok(self.driver.error())
    }

    fn size(&mut self, dbname: Option<&str>) -> Result<u64, SqlHandleError> {
        self.check_connected()?;
        let name = match dbname {
            Some(name) => name.to_string(),
            None => self
                .options
                .as_ref()
                .map(|o| o.dbname.clone())
                .unwrap_or_default(),
        };
        if name.is_empty() {
            return Err(SqlHandleError::database("no database name is set"));
        }
        self.timed("unable to read database size", |d| d.database_size(&name))
    }

    fn db_time(&self) -> Duration {
        self.db_time
    }

    fn total_queries(&self) -> u64 {
        self.total_queries
    }
}
