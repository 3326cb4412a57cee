use std::error::Error as StdError;
use std::fmt;

use thiserror::Error;

use crate::params::{Parameter, format_parameters};

/// A fault reported by the underlying database driver.
///
/// Carries the driver's numeric error code and message verbatim, plus the
/// driver's own error value when it has one.
#[derive(Debug)]
pub struct DriverError {
    pub code: i32,
    pub message: String,
    pub source: Option<Box<dyn StdError + Send + Sync>>,
}

impl DriverError {
    #[must_use]
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            source: None,
        }
    }

    #[must_use]
    pub fn with_source(mut self, source: impl StdError + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }
}

impl fmt::Display for DriverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (code {})", self.message, self.code)
    }
}

impl StdError for DriverError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_deref()
            .map(|err| err as &(dyn StdError + 'static))
    }
}

#[cfg(feature = "sqlite")]
impl From<rusqlite::Error> for DriverError {
    fn from(err: rusqlite::Error) -> Self {
        let code = match &err {
            rusqlite::Error::SqliteFailure(failure, _) => failure.extended_code,
            _ => rusqlite::ffi::SQLITE_ERROR,
        };
        DriverError::new(code, err.to_string()).with_source(err)
    }
}

#[derive(Debug, Error)]
pub enum SqlHandleError {
    #[error("{message}")]
    Connection {
        message: String,
        code: i32,
        #[source]
        source: DriverError,
    },

    #[error("this connection is not connected yet. use connect() first")]
    NotConnected,

    #[error("{message}")]
    Prepare {
        message: String,
        code: i32,
        #[source]
        source: DriverError,
    },

    #[error("{message}")]
    Bind {
        message: String,
        code: i32,
        #[source]
        source: DriverError,
    },

    #[error("{message}")]
    Query {
        message: String,
        code: i32,
        #[source]
        source: DriverError,
    },

    #[error("saved statement is invalid")]
    StatementInvalid,

    #[error("the last statement did not generate an auto increment id")]
    NoAutoIncrement,

    #[error("no more rows to fetch")]
    NoRows,

    #[error("field '{0}' does not exist")]
    FieldNotFound(String),

    #[error("type must be i, s, d or b. '{0}' given")]
    InvalidParameterType(String),

    #[error("invalid stub payload: {0}")]
    InvalidPayload(String),

    #[error("result has already been freed")]
    ResultFreed,

    #[error("{message}")]
    Database {
        message: String,
        code: i32,
        #[source]
        source: Option<DriverError>,
    },
}

impl SqlHandleError {
    /// Generic database error that did not originate in the driver.
    #[must_use]
    pub fn database(message: impl Into<String>) -> Self {
        SqlHandleError::Database {
            message: message.into(),
            code: 0,
            source: None,
        }
    }

    /// The driver's numeric error code, when the error came from the driver.
    #[must_use]
    pub fn code(&self) -> Option<i32> {
        match self {
            SqlHandleError::Connection { code, .. }
            | SqlHandleError::Prepare { code, .. }
            | SqlHandleError::Bind { code, .. }
            | SqlHandleError::Query { code, .. } => Some(*code),
            SqlHandleError::Database {
                code,
                source: Some(_),
                ..
            } => Some(*code),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_no_rows(&self) -> bool {
        matches!(self, SqlHandleError::NoRows)
    }

    #[must_use]
    pub fn is_not_connected(&self) -> bool {
        matches!(self, SqlHandleError::NotConnected)
    }
}

/// The driver call a failure happened in. Decides which error variant the
/// driver fault is translated into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Stage {
    Connect,
    Prepare,
    Bind,
    Execute,
    Operation(&'static str),
}

/// Convert a driver fault into the typed error for `stage`.
///
/// Statement failures get the rendered parameter list appended to the message.
pub(crate) fn translate(stage: Stage, err: DriverError, params: &[Parameter]) -> SqlHandleError {
    let code = err.code;
    tracing::warn!(?stage, code, "database driver call failed");
    match stage {
        Stage::Connect => SqlHandleError::Connection {
            message: err.message.clone(),
            code,
            source: err,
        },
        Stage::Prepare => SqlHandleError::Prepare {
            message: statement_message("unable to prepare query", &err, params),
            code,
            source: err,
        },
        Stage::Bind => SqlHandleError::Bind {
            message: statement_message("unable to bind parameters", &err, params),
            code,
            source: err,
        },
        Stage::Execute => SqlHandleError::Query {
            message: statement_message("error in query", &err, params),
            code,
            source: err,
        },
        Stage::Operation(what) => SqlHandleError::Database {
            message: format!("{what}: {}", err.message),
            code,
            source: Some(err),
        },
    }
}

fn statement_message(prefix: &str, err: &DriverError, params: &[Parameter]) -> String {
    let mut message = format!("{prefix}: {}", err.message);
    if !params.is_empty() {
        message.push_str(&format_parameters(params));
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_failure_carries_code_source_and_parameters() {
        let params = vec![
            Parameter::string("line one\r\nline two"),
            Parameter::int(7),
        ];
        let err = translate(
            Stage::Execute,
            DriverError::new(1062, "Duplicate entry"),
            &params,
        );

        assert_eq!(err.code(), Some(1062));
        let text = err.to_string();
        assert!(text.starts_with("error in query: Duplicate entry"));
        assert!(text.contains(" - s: 'line one line two'"));
        assert!(text.contains(" - i: '7'"));
        let source = StdError::source(&err).expect("driver error kept as cause");
        assert!(source.to_string().contains("Duplicate entry"));
    }

    #[test]
    fn query_failure_without_parameters_has_no_parameter_block() {
        let err = translate(Stage::Execute, DriverError::new(1, "boom"), &[]);
        assert_eq!(err.to_string(), "error in query: boom");
    }

    #[test]
    fn operation_failure_names_the_operation() {
        let err = translate(
            Stage::Operation("unable to commit transaction"),
            DriverError::new(5, "database is locked"),
            &[],
        );
        assert!(matches!(err, SqlHandleError::Database { code: 5, .. }));
        assert_eq!(
            err.to_string(),
            "unable to commit transaction: database is locked"
        );
    }

    #[test]
    fn non_driver_errors_have_no_code() {
        assert_eq!(SqlHandleError::NoRows.code(), None);
        assert_eq!(SqlHandleError::database("plain").code(), None);
        assert!(SqlHandleError::NoRows.is_no_rows());
        assert!(!SqlHandleError::StatementInvalid.is_no_rows());
    }

    #[test]
    fn driver_error_exposes_inner_source() {
        let inner = std::io::Error::other("socket closed");
        let err = DriverError::new(2006, "server has gone away").with_source(inner);
        assert_eq!(err.to_string(), "server has gone away (code 2006)");
        assert_eq!(
            StdError::source(&err).map(ToString::to_string),
            Some("socket closed".to_string())
        );
    }
}
