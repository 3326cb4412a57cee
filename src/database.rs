use std::time::Duration;

use crate::config::ConnectOptions;
use crate::error::SqlHandleError;
use crate::params::Parameter;
use crate::results::ResultCursor;

/// What a statement produced.
#[derive(Debug, Clone)]
pub enum QueryOutcome<R> {
    /// A result set, owned by the caller
    Rows(R),
    /// Acknowledgment for statements without a result set (DDL/DML)
    Ack(bool),
}

impl<R> QueryOutcome<R> {
    #[must_use]
    pub fn is_rows(&self) -> bool {
        matches!(self, QueryOutcome::Rows(_))
    }

    /// The acknowledgment flag; a result set counts as success.
    #[must_use]
    pub fn as_bool(&self) -> bool {
        match self {
            QueryOutcome::Rows(_) => true,
            QueryOutcome::Ack(ok) => *ok,
        }
    }

    /// # Errors
    ///
    /// Returns `SqlHandleError::Database` when the statement produced no result set.
    pub fn into_rows(self) -> Result<R, SqlHandleError> {
        match self {
            QueryOutcome::Rows(rows) => Ok(rows),
            QueryOutcome::Ack(_) => Err(SqlHandleError::database(
                "statement did not produce a result set",
            )),
        }
    }
}

/// Contract shared by live connections and the in-memory stub.
///
/// Every operation except [`Database::connect`] and [`Database::escape`]
/// requires a connected handle and fails with `SqlHandleError::NotConnected`
/// otherwise. The instrumentation getters never fail.
pub trait Database {
    type Result: ResultCursor;

    /// # Errors
    ///
    /// Returns `SqlHandleError::Connection` when the session cannot be opened.
    fn connect(&mut self, options: ConnectOptions) -> Result<(), SqlHandleError>;

    /// Reopen the session with the options of the last successful connect.
    ///
    /// # Errors
    ///
    /// Returns `SqlHandleError::NotConnected` when no connect has succeeded yet.
    fn reconnect(&mut self) -> Result<(), SqlHandleError>;

    /// # Errors
    ///
    /// Returns `SqlHandleError::NotConnected` or the driver's fault.
    fn close(&mut self) -> Result<(), SqlHandleError>;

    /// # Errors
    ///
    /// Returns `SqlHandleError::NotConnected` or the driver's fault.
    fn autocommit(&mut self, enabled: bool) -> Result<(), SqlHandleError>;

    /// # Errors
    ///
    /// Returns `SqlHandleError::NotConnected` or the driver's fault.
    fn begin_transaction(&mut self) -> Result<(), SqlHandleError>;

    /// # Errors
    ///
    /// Returns `SqlHandleError::NotConnected` or the driver's fault.
    fn commit(&mut self) -> Result<(), SqlHandleError>;

    /// # Errors
    ///
    /// Returns `SqlHandleError::NotConnected` or the driver's fault.
    fn rollback(&mut self) -> Result<(), SqlHandleError>;

    /// Run `sql` with `params` bound to its placeholders.
    ///
    /// # Errors
    ///
    /// Returns `SqlHandleError::Prepare`, `Bind` or `Query` on driver faults.
    fn query(
        &mut self,
        sql: &str,
        params: &[Parameter],
    ) -> Result<QueryOutcome<Self::Result>, SqlHandleError>;

    /// Rebind `params` to the last prepared statement and run it again.
    ///
    /// # Errors
    ///
    /// Returns `SqlHandleError::StatementInvalid` when nothing was prepared.
    fn execute(
        &mut self,
        params: &[Parameter],
    ) -> Result<QueryOutcome<Self::Result>, SqlHandleError>;

    /// # Errors
    ///
    /// Returns `SqlHandleError::Database` when the connection is lost.
    fn ping(&mut self) -> Result<(), SqlHandleError>;

    /// # Errors
    ///
    /// Returns `SqlHandleError::NoAutoIncrement` when the last statement generated no id.
    fn insert_id(&self) -> Result<u64, SqlHandleError>;

    /// # Errors
    ///
    /// Returns `SqlHandleError::NotConnected`.
    fn affected_rows(&self) -> Result<i64, SqlHandleError>;

    /// Escape `value` for inclusion inside a quoted SQL string literal.
    fn escape(&self, value: &str) -> String;

    /// # Errors
    ///
    /// Returns `SqlHandleError::NotConnected`.
    fn client_info(&self) -> Result<&str, SqlHandleError>;

    /// # Errors
    ///
    /// Returns `SqlHandleError::NotConnected`.
    fn host_info(&self) -> Result<&str, SqlHandleError>;

    /// # Errors
    ///
    /// Returns `SqlHandleError::NotConnected`.
    fn proto_info(&self) -> Result<u32, SqlHandleError>;

    /// # Errors
    ///
    /// Returns `SqlHandleError::NotConnected`.
    fn server_info(&self) -> Result<&str, SqlHandleError>;

    /// Code of the last driver error, `0` when the last call succeeded.
    ///
    /// # Errors
    ///
    /// Returns `SqlHandleError::NotConnected`.
    fn errno(&self) -> Result<i32, SqlHandleError>;

    /// # Errors
    ///
    /// Returns `SqlHandleError::NotConnected`.
    fn errstr(&self) -> Result<String, SqlHandleError>;

    /// Size in bytes of `dbname`, or of the selected database when `None`.
    ///
    /// # Errors
    ///
    /// Returns `SqlHandleError::Database` when no database is named or selected.
    fn size(&mut self, dbname: Option<&str>) -> Result<u64, SqlHandleError>;

    /// Wall-clock time spent in driver calls so far.
    fn db_time(&self) -> Duration;

    /// Number of statements run so far.
    fn total_queries(&self) -> u64;

    fn db_time_secs(&self) -> f64 {
        self.db_time().as_secs_f64()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ack_outcomes_are_not_rows() {
        let outcome: QueryOutcome<()> = QueryOutcome::Ack(true);
        assert!(!outcome.is_rows());
        assert!(outcome.as_bool());
        assert!(matches!(
            outcome.into_rows(),
            Err(SqlHandleError::Database { .. })
        ));
    }

    #[test]
    fn row_outcomes_unwrap_to_the_result() {
        let outcome = QueryOutcome::Rows(7);
        assert!(outcome.is_rows());
        assert!(outcome.as_bool());
        assert_eq!(outcome.into_rows().unwrap(), 7);
    }
}
