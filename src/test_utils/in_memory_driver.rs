use std::collections::{HashMap, VecDeque};

use crate::config::ConnectOptions;
use crate::driver::{Driver, Execution, ServerMetadata, StatementHandle};
use crate::error::DriverError;
use crate::results::RawResult;
use crate::types::Value;

/// Driver calls a failure can be injected into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailurePoint {
    Connect,
    Charset,
    Prepare,
    Bind,
    Execute,
    Autocommit,
    Begin,
    Commit,
    Rollback,
    Ping,
    Close,
}

/// One `execute` call as the driver saw it.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedExecution {
    pub sql: String,
    pub types: String,
    pub values: Vec<Value>,
}

#[derive(Debug, Default)]
struct PreparedStatement {
    sql: String,
    types: String,
    values: Vec<Value>,
}

/// Scripted [`Driver`] that talks to nothing.
///
/// Executions return queued responses in order (`Done` once the queue is
/// empty) and every prepare, bind and execute is recorded so tests can see
/// exactly what the handle asked for.
#[derive(Debug, Default)]
pub struct InMemoryDriver {
    connected: bool,
    responses: VecDeque<Execution>,
    failures: HashMap<FailurePoint, (i32, String)>,
    statements: HashMap<u64, PreparedStatement>,
    next_statement: u64,
    prepared: Vec<String>,
    bind_count: usize,
    executions: Vec<RecordedExecution>,
    closed_statements: Vec<StatementHandle>,
    autocommit: Vec<bool>,
    insert_id: u64,
    affected_rows: i64,
    last_error: Option<(i32, String)>,
}

impl InMemoryDriver {
    pub const DATABASE_SIZE: u64 = 4096;

    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a result set for the next `execute`.
    #[must_use]
    pub fn with_rows(mut self, raw: RawResult) -> Self {
        self.responses.push_back(Execution::Rows(raw));
        self
    }

    #[must_use]
    pub fn with_done(mut self) -> Self {
        self.responses.push_back(Execution::Done);
        self
    }

    #[must_use]
    pub fn with_affected_rows(mut self, rows: i64) -> Self {
        self.affected_rows = rows;
        self
    }

    pub fn push_rows(&mut self, raw: RawResult) {
        self.responses.push_back(Execution::Rows(raw));
    }

    pub fn set_insert_id(&mut self, id: u64) {
        self.insert_id = id;
    }

    /// Make the next call at `point` fail with `code` and `message`.
    pub fn fail_next(&mut self, point: FailurePoint, code: i32, message: impl Into<String>) {
        self.failures.insert(point, (code, message.into()));
    }

    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.connected
    }

    #[must_use]
    pub fn prepare_count(&self) -> usize {
        self.prepared.len()
    }

    /// SQL text of every prepare, in call order.
    #[must_use]
    pub fn prepared_sql(&self) -> &[String] {
        &self.prepared
    }

    #[must_use]
    pub fn bind_count(&self) -> usize {
        self.bind_count
    }

    #[must_use]
    pub fn executions(&self) -> &[RecordedExecution] {
        &self.executions
    }

    #[must_use]
    pub fn closed_statements(&self) -> &[StatementHandle] {
        &self.closed_statements
    }

    /// Autocommit modes requested so far.
    #[must_use]
    pub fn autocommit_calls(&self) -> &[bool] {
        &self.autocommit
    }

    fn check(&mut self, point: FailurePoint) -> Result<(), DriverError> {
        let result = match self.failures.remove(&point) {
            Some((code, message)) => Err(DriverError::new(code, message)),
            None => Ok(()),
        };
        self.last_error = result.as_ref().err().map(|e| (e.code, e.message.clone()));
        result
    }

    fn statement(
        &mut self,
        handle: StatementHandle,
    ) -> Result<&mut PreparedStatement, DriverError> {
        self.statements
            .get_mut(&handle.id())
            .ok_or_else(|| {
                DriverError::new(2030, format!("statement {} is not prepared", handle.id()))
            })
    }
}

impl Driver for InMemoryDriver {
    fn connect(&mut self, _options: &ConnectOptions) -> Result<(), DriverError> {
        self.check(FailurePoint::Connect)?;
        self.connected = true;
        Ok(())
    }

    fn set_charset(&mut self, _charset: &str, _collation: &str) -> Result<(), DriverError> {
        self.check(FailurePoint::Charset)
    }

    fn metadata(&mut self) -> Result<ServerMetadata, DriverError> {
        Ok(ServerMetadata {
            client_info: "in-memory client".to_string(),
            host_info: "in-memory host".to_string(),
            proto_info: 10,
            server_info: "in-memory server".to_string(),
        })
    }

    fn close(&mut self) -> Result<(), DriverError> {
        self.statements.clear();
        self.connected = false;
        self.check(FailurePoint::Close)
    }

    fn set_autocommit(&mut self, enabled: bool) -> Result<(), DriverError> {
        self.check(FailurePoint::Autocommit)?;
        self.autocommit.push(enabled);
        Ok(())
    }

    fn begin_transaction(&mut self) -> Result<(), DriverError> {
        self.check(FailurePoint::Begin)
    }

    fn commit(&mut self) -> Result<(), DriverError> {
        self.check(FailurePoint::Commit)
    }

    fn rollback(&mut self) -> Result<(), DriverError> {
        self.check(FailurePoint::Rollback)
    }

    fn prepare(&mut self, sql: &str) -> Result<StatementHandle, DriverError> {
        self.check(FailurePoint::Prepare)?;
        self.next_statement += 1;
        self.prepared.push(sql.to_string());
        self.statements.insert(
            self.next_statement,
            PreparedStatement {
                sql: sql.to_string(),
                ..PreparedStatement::default()
            },
        );
        Ok(StatementHandle::new(self.next_statement))
    }

    fn bind(
        &mut self,
        handle: StatementHandle,
        types: &str,
        values: &[Value],
    ) -> Result<(), DriverError> {
        self.check(FailurePoint::Bind)?;
        let stmt = self.statement(handle)?;
        stmt.types = types.to_string();
        stmt.values = values.to_vec();
        self.bind_count += 1;
        Ok(())
    }

    fn execute(&mut self, handle: StatementHandle) -> Result<Execution, DriverError> {
        self.check(FailurePoint::Execute)?;
        let stmt = self.statement(handle)?;
        let recorded = RecordedExecution {
            sql: stmt.sql.clone(),
            types: stmt.types.clone(),
            values: stmt.values.clone(),
        };
        self.executions.push(recorded);
        Ok(self.responses.pop_front().unwrap_or(Execution::Done))
    }

    fn close_statement(&mut self, handle: StatementHandle) {
        self.statements.remove(&handle.id());
        self.closed_statements.push(handle);
    }

    fn ping(&mut self) -> Result<(), DriverError> {
        self.check(FailurePoint::Ping)
    }

    fn insert_id(&self) -> u64 {
        self.insert_id
    }

    fn affected_rows(&self) -> i64 {
        self.affected_rows
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
        value.replace('\\', "\\\\").replace('\'', "\\'")
    }

    fn database_size(&mut self, _dbname: &str) -> Result<u64, DriverError> {
        Ok(Self::DATABASE_SIZE)
    }
}
