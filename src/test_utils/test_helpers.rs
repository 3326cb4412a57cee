//! Helper utilities for testing and development.

use crate::results::{RawResult, Row, shape_row};
use crate::types::{ResultType, Value};

/// Create a test row with the given column names and values.
#[must_use]
pub fn create_test_row(column_names: &[&str], values: Vec<Value>, result_type: ResultType) -> Row {
    let columns: Vec<String> = column_names.iter().map(|c| (*c).to_string()).collect();
    Row::new(shape_row(&columns, &values, result_type), result_type)
}

/// Build a buffered result from column names and rows of values.
#[must_use]
pub fn raw_result(column_names: &[&str], rows: Vec<Vec<Value>>) -> RawResult {
    RawResult::new(column_names.iter().map(|c| (*c).to_string()).collect(), rows)
}
