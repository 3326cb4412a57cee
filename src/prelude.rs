//! Convenient imports for common functionality.
//!
//! This module re-exports the most commonly used types and traits
//! to make it easier to get started with the library.

pub use crate::config::{ConnectOptions, ConnectOptionsBuilder};
pub use crate::connection::{Connection, ConnectionState};
pub use crate::database::{Database, QueryOutcome};
pub use crate::driver::{Driver, Execution, StatementHandle};
pub use crate::error::{DriverError, SqlHandleError};
pub use crate::params::{ParamType, Parameter};
pub use crate::results::{DbResult, FieldKey, FieldMap, RawResult, ResultCursor, Row};
pub use crate::stub::{Stub, StubResult};
pub use crate::types::{ResultType, Value};

#[cfg(feature = "sqlite")]
pub use crate::sqlite::SqliteDriver;
