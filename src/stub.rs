//! In-memory stand-in for a live connection.
//!
//! [`Stub`] honours the [`Database`] contract without a server: `SELECT`
//! statements return the injected payload, everything else is acknowledged,
//! and the remaining operations return fixed values.

use std::time::Duration;

use indexmap::IndexMap;

use crate::config::ConnectOptions;
use crate::database::{Database, QueryOutcome};
use crate::error::SqlHandleError;
use crate::params::Parameter;
use crate::results::{FieldMap, ResultCursor, shape_row};
use crate::types::{ResultType, Value};

/// One payload row: column name to value, in column order.
pub type PayloadRow = IndexMap<String, Value>;

#[derive(Debug, Clone, Default)]
pub struct Stub {
    options: Option<ConnectOptions>,
    connected: bool,
    payload: Vec<PayloadRow>,
}

impl Stub {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_payload(payload: Vec<PayloadRow>) -> Self {
        Self {
            payload,
            ..Self::default()
        }
    }

    pub fn add_payload(&mut self, row: PayloadRow) {
        self.payload.push(row);
    }

    /// Append the rows of a JSON array of objects.
    ///
    /// # Errors
    ///
    /// Returns `SqlHandleError::InvalidPayload` if `json` is not an array or
    /// holds something other than objects. Nothing is added in that case.
    pub fn add_json_payload(&mut self, json: &serde_json::Value) -> Result<(), SqlHandleError> {
        let rows = payload_from_json(json)?;
        self.payload.extend(rows);
        Ok(())
    }

    #[must_use]
    pub fn payload(&self) -> &[PayloadRow] {
        &self.payload
    }

    /// Options recorded by the last `connect`.
    #[must_use]
    pub fn options(&self) -> Option<&ConnectOptions> {
        self.options.as_ref()
    }

    fn check_connected(&self) -> Result<(), SqlHandleError> {
        if self.connected {
            Ok(())
        } else {
            Err(SqlHandleError::NotConnected)
        }
    }
}

fn payload_from_json(json: &serde_json::Value) -> Result<Vec<PayloadRow>, SqlHandleError> {
    let items = json
        .as_array()
        .ok_or_else(|| {
            SqlHandleError::InvalidPayload("payload must be an array of rows".to_string())
        })?;
    items
        .iter()
        .enumerate()
        .map(|(idx, item)| {
            let object = item.as_object().ok_or_else(|| {
                SqlHandleError::InvalidPayload(format!("row {idx} is not an object"))
            })?;
            let row: PayloadRow = object
                .iter()
                .map(|(k, v)| (k.clone(), Value::from(v)))
                .collect();
            Ok(row)
        })
        .collect()
}

impl Database for Stub {
    type Result = StubResult;

    fn connect(&mut self, options: ConnectOptions) -> Result<(), SqlHandleError> {
        tracing::debug!(host = %options.host, "stub connected");
        self.options = Some(options);
        self.connected = true;
        Ok(())
    }

    fn reconnect(&mut self) -> Result<(), SqlHandleError> {
        let options = self.options.clone().ok_or(SqlHandleError::NotConnected)?;
        self.connect(options)
    }

    fn close(&mut self) -> Result<(), SqlHandleError> {
        self.check_connected()?;
        self.connected = false;
        Ok(())
    }

    fn autocommit(&mut self, _enabled: bool) -> Result<(), SqlHandleError> {
        self.check_connected()
    }

    fn begin_transaction(&mut self) -> Result<(), SqlHandleError> {
        self.check_connected()
    }

    fn commit(&mut self) -> Result<(), SqlHandleError> {
        self.check_connected()
    }

    fn rollback(&mut self) -> Result<(), SqlHandleError> {
        self.check_connected()
    }

    fn query(
        &mut self,
        sql: &str,
        _params: &[Parameter],
    ) -> Result<QueryOutcome<StubResult>, SqlHandleError> {
        self.check_connected()?;
        if sql.trim().to_lowercase().starts_with("select") {
            Ok(QueryOutcome::Rows(StubResult::new(self.payload.clone())))
        } else {
            Ok(QueryOutcome::Ack(true))
        }
    }

    fn execute(
        &mut self,
        _params: &[Parameter],
    ) -> Result<QueryOutcome<StubResult>, SqlHandleError> {
        self.check_connected()?;
        Ok(QueryOutcome::Ack(true))
    }

    fn ping(&mut self) -> Result<(), SqlHandleError> {
        self.check_connected()
    }

    fn insert_id(&self) -> Result<u64, SqlHandleError> {
        self.check_connected()?;
        Ok(1)
    }

    fn affected_rows(&self) -> Result<i64, SqlHandleError> {
        self.check_connected()?;
        Ok(1)
    }

    fn escape(&self, value: &str) -> String {
        value.to_string()
    }

    fn client_info(&self) -> Result<&str, SqlHandleError> {
        self.check_connected()?;
        Ok("client info")
    }

    fn host_info(&self) -> Result<&str, SqlHandleError> {
        self.check_connected()?;
        Ok("host info")
    }

    fn proto_info(&self) -> Result<u32, SqlHandleError> {
        self.check_connected()?;
        Ok(1)
    }

    fn server_info(&self) -> Result<&str, SqlHandleError> {
        self.check_connected()?;
        Ok("server info")
    }

    fn errno(&self) -> Result<i32, SqlHandleError> {
        self.check_connected()?;
        Ok(1)
    }

    fn errstr(&self) -> Result<String, SqlHandleError> {
        self.check_connected()?;
        Ok("error".to_string())
    }

    fn size(&mut self, _dbname: Option<&str>) -> Result<u64, SqlHandleError> {
        self.check_connected()?;
        Ok(1)
    }

    fn db_time(&self) -> Duration {
        Duration::from_secs(1)
    }

    fn total_queries(&self) -> u64 {
        1
    }
}

/// Cursor over a stub payload.
#[derive(Debug, Clone, Default)]
pub struct StubResult {
    rows: Vec<PayloadRow>,
    position: usize,
    freed: bool,
}

impl StubResult {
    #[must_use]
    pub fn new(rows: Vec<PayloadRow>) -> Self {
        Self {
            rows,
            position: 0,
            freed: false,
        }
    }

    /// # Errors
    ///
    /// Returns `SqlHandleError::InvalidPayload` for anything but an array of objects.
    pub fn from_json(json: &serde_json::Value) -> Result<Self, SqlHandleError> {
        Ok(Self::new(payload_from_json(json)?))
    }

    fn check_live(&self) -> Result<(), SqlHandleError> {
        if self.freed {
            Err(SqlHandleError::ResultFreed)
        } else {
            Ok(())
        }
    }
}

impl ResultCursor for StubResult {
    fn fetch_array(&mut self, result_type: ResultType) -> Result<Option<FieldMap>, SqlHandleError> {
        self.check_live()?;
        let Some(row) = self.rows.get(self.position) else {
            return Ok(None);
        };
        let columns: Vec<String> = row.keys().cloned().collect();
        let values: Vec<Value> = row.values().cloned().collect();
        self.position += 1;
        Ok(Some(shape_row(&columns, &values, result_type)))
    }

    fn num_rows(&self) -> Result<usize, SqlHandleError> {
        self.check_live()?;
        Ok(self.rows.len())
    }

    fn data_seek(&mut self, offset: usize) -> Result<bool, SqlHandleError> {
        self.check_live()?;
        if offset >= self.rows.len() {
            return Ok(false);
        }
        self.position = offset;
        Ok(true)
    }

    fn free(&mut self) {
        self.rows.clear();
        self.position = 0;
        self.freed = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::results::FieldKey;
    use serde_json::json;

    fn connected_stub() -> Stub {
        let mut stub = Stub::new();
        stub.add_json_payload(&json!([
            {"id": 1, "name": "x"},
            {"id": 2, "name": "y"}
        ]))
        .unwrap();
        stub.connect(ConnectOptions::new("h", "u", "p", "d")).unwrap();
        stub
    }

    #[test]
    fn select_returns_payload_rows_in_order() {
        let mut stub = connected_stub();
        let mut result = stub
            .query("  SeLeCt * FROM t", &[])
            .unwrap()
            .into_rows()
            .unwrap();
        assert_eq!(result.num_rows().unwrap(), 2);
        let first = result.fetch_single_object(ResultType::Assoc).unwrap();
        assert_eq!(first.get_as_int("id").unwrap(), 1);
        let second = result.fetch_array(ResultType::Num).unwrap().unwrap();
        assert_eq!(second.get(&FieldKey::Index(1)), Some(&Value::Text("y".into())));
        assert!(result.fetch_array(ResultType::Both).unwrap().is_none());
    }

    #[test]
    fn json_payload_keeps_document_key_order() {
        let mut stub = Stub::new();
        stub.add_json_payload(&json!([{"name": "x", "id": 1, "age": 30}]))
            .unwrap();
        let keys: Vec<&str> = stub.payload()[0].keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["name", "id", "age"]);

        stub.connect(ConnectOptions::new("h", "u", "p", "d")).unwrap();
        let mut result = stub
            .query("SELECT * FROM t", &[])
            .unwrap()
            .into_rows()
            .unwrap();
        let row = result.fetch_single_array(ResultType::Num).unwrap();
        assert_eq!(row.get(&FieldKey::Index(0)), Some(&Value::Text("x".into())));
        assert_eq!(row.get(&FieldKey::Index(1)), Some(&Value::Int(1)));
        assert_eq!(row.get(&FieldKey::Index(2)), Some(&Value::Int(30)));
    }

    #[test]
    fn non_select_statements_are_acknowledged() {
        let mut stub = connected_stub();
        let outcome = stub.query("UPDATE t SET name = 'z'", &[]).unwrap();
        assert!(!outcome.is_rows());
        assert!(outcome.as_bool());
        assert!(stub.execute(&[Parameter::int(1)]).unwrap().as_bool());
    }

    #[test]
    fn invalid_payloads_are_rejected_before_use() {
        let mut stub = Stub::new();
        assert!(matches!(
            stub.add_json_payload(&json!({"id": 1})),
            Err(SqlHandleError::InvalidPayload(_))
        ));
        assert!(matches!(
            stub.add_json_payload(&json!([{"id": 1}, 3])),
            Err(SqlHandleError::InvalidPayload(_))
        ));
        assert!(stub.payload().is_empty());
    }

    #[test]
    fn canned_values() {
        let mut stub = connected_stub();
        assert_eq!(stub.insert_id().unwrap(), 1);
        assert_eq!(stub.affected_rows().unwrap(), 1);
        assert_eq!(stub.client_info().unwrap(), "client info");
        assert_eq!(stub.server_info().unwrap(), "server info");
        assert_eq!(stub.host_info().unwrap(), "host info");
        assert_eq!(stub.proto_info().unwrap(), 1);
        assert_eq!(stub.errno().unwrap(), 1);
        assert_eq!(stub.errstr().unwrap(), "error");
        assert_eq!(stub.size(None).unwrap(), 1);
        assert_eq!(stub.escape("O'Brien"), "O'Brien");
        assert_eq!(stub.db_time_secs(), 1.0);
        assert_eq!(stub.total_queries(), 1);
    }

    #[test]
    fn operations_need_a_connection() {
        let mut stub = Stub::new();
        assert!(stub.query("SELECT 1", &[]).unwrap_err().is_not_connected());
        assert!(stub.reconnect().unwrap_err().is_not_connected());
        assert!(stub.ping().unwrap_err().is_not_connected());
    }

    #[test]
    fn freed_stub_results_fail_fast() {
        let mut result = StubResult::from_json(&json!([{"a": 1}])).unwrap();
        result.free();
        assert!(matches!(result.num_rows(), Err(SqlHandleError::ResultFreed)));
    }
}
