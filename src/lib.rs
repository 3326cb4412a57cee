//! Synchronous single-connection SQL client.
//!
//! A [`Connection`] wraps a [`Driver`] and adds the pieces every caller wants:
//! typed parameter binding, reuse of the last prepared statement, uniform
//! error translation and seekable result cursors with loose type coercion.
//! [`Stub`] implements the same [`Database`] contract against a fixed payload.
//!
//! ```rust,no_run
//! use sql_handle::prelude::*;
//!
//! # fn main() -> Result<(), SqlHandleError> {
//! let mut conn = Connection::sqlite();
//! conn.connect(ConnectOptions::new("", "", "", ":memory:"))?;
//! conn.query("CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT)", &[])?;
//!
//! // prepared once, rebound and executed for every row
//! for name in ["alice", "bob"] {
//!     conn.query("INSERT INTO users (name) VALUES (?)", &[Parameter::string(name)])?;
//! }
//!
//! let mut users = conn.query("SELECT id, name FROM users", &[])?.into_rows()?;
//! while let Some(row) = users.fetch_object(ResultType::Assoc)? {
//!     println!("{}: {}", row.get_as_int("id")?, row.get_as_string("name")?);
//! }
//! # Ok(())
//! # }
//! ```

pub mod coercion;
pub mod config;
pub mod connection;
pub mod database;
pub mod driver;
pub mod error;
pub mod params;
pub mod prelude;
pub mod results;
#[cfg(feature = "sqlite")]
pub mod sqlite;
pub mod stub;
pub mod test_utils;
pub mod types;

pub use config::ConnectOptions;
pub use connection::Connection;
pub use database::{Database, QueryOutcome};
pub use driver::Driver;
pub use error::{DriverError, SqlHandleError};
pub use params::{BoundParams, ParamType, Parameter, format_parameters};
pub use results::{DbResult, ResultCursor, Row};
pub use stub::Stub;
pub use types::{ResultType, Value};
