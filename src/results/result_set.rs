use crate::coercion;
use crate::error::SqlHandleError;
use crate::types::{ResultType, Value};

use super::row::{FieldKey, FieldMap, Row, non_null, shape_row};

/// Tabular result as handed back by a driver: column names plus fully
/// buffered rows of positional values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawResult {
    /// Column names in order
    pub columns: Vec<String>,
    /// Rows, each holding one value per column
    pub rows: Vec<Vec<Value>>,
}

impl RawResult {
    #[must_use]
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        Self { columns, rows }
    }

    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }
}

/// Cursor over the rows of a query result.
///
/// Implementors provide positioning and single-row fetch; everything else
/// (single/object/all fetches, field lookup and typed accessors) is derived.
/// Plain fetches return `Ok(None)` once the rows are exhausted, the `single`
/// variants return `Err(SqlHandleError::NoRows)` instead.
pub trait ResultCursor {
    /// Fetch the row under the cursor and advance by one.
    ///
    /// # Errors
    ///
    /// Returns `SqlHandleError::ResultFreed` after [`ResultCursor::free`].
    fn fetch_array(&mut self, result_type: ResultType) -> Result<Option<FieldMap>, SqlHandleError>;

    /// Total number of rows, regardless of the cursor position.
    ///
    /// # Errors
    ///
    /// Returns `SqlHandleError::ResultFreed` after [`ResultCursor::free`].
    fn num_rows(&self) -> Result<usize, SqlHandleError>;

    /// Move the cursor to `offset`. Returns `false`, leaving the cursor where
    /// it was, when `offset` is past the last row.
    ///
    /// # Errors
    ///
    /// Returns `SqlHandleError::ResultFreed` after [`ResultCursor::free`].
    fn data_seek(&mut self, offset: usize) -> Result<bool, SqlHandleError>;

    /// Release the buffered rows. Every later call fails with `ResultFreed`.
    fn free(&mut self);

    /// # Errors
    ///
    /// Returns `SqlHandleError::NoRows` when the rows are exhausted.
    fn fetch_single_array(&mut self, result_type: ResultType) -> Result<FieldMap, SqlHandleError> {
        self.fetch_array(result_type)?.ok_or(SqlHandleError::NoRows)
    }

    /// # Errors
    ///
    /// Returns `SqlHandleError::ResultFreed` after [`ResultCursor::free`].
    fn fetch_object(&mut self, result_type: ResultType) -> Result<Option<Row>, SqlHandleError> {
        Ok(self
            .fetch_array(result_type)?
            .map(|data| Row::new(data, result_type)))
    }

    /// # Errors
    ///
    /// Returns `SqlHandleError::NoRows` when the rows are exhausted.
    fn fetch_single_object(&mut self, result_type: ResultType) -> Result<Row, SqlHandleError> {
        self.fetch_object(result_type)?.ok_or(SqlHandleError::NoRows)
    }

    /// Every remaining row from the cursor position on.
    ///
    /// # Errors
    ///
    /// Returns `SqlHandleError::ResultFreed` after [`ResultCursor::free`].
    fn fetch_all(&mut self, result_type: ResultType) -> Result<Vec<FieldMap>, SqlHandleError> {
        let mut rows = Vec::new();
        while let Some(data) = self.fetch_array(result_type)? {
            rows.push(data);
        }
        Ok(rows)
    }

    /// # Errors
    ///
    /// Returns `SqlHandleError::ResultFreed` after [`ResultCursor::free`].
    fn fetch_all_object(&mut self, result_type: ResultType) -> Result<Vec<Row>, SqlHandleError> {
        let mut rows = Vec::new();
        while let Some(row) = self.fetch_object(result_type)? {
            rows.push(row);
        }
        Ok(rows)
    }

    /// Raw value of `field` in row `row`. Leaves the cursor after that row.
    ///
    /// # Errors
    ///
    /// Returns `SqlHandleError::Database` if the row cannot be fetched and
    /// `SqlHandleError::FieldNotFound` if the row has no such column.
    fn result(&mut self, row: usize, field: &str) -> Result<Value, SqlHandleError> {
        if !self.data_seek(row)? {
            return Err(SqlHandleError::database(format!("unable to fetch row {row}")));
        }
        let mut data = self
            .fetch_array(ResultType::Assoc)?
            .ok_or_else(|| SqlHandleError::database(format!("unable to fetch row {row}")))?;
        data.swap_remove(&FieldKey::from(field))
            .ok_or_else(|| SqlHandleError::FieldNotFound(field.to_string()))
    }

    /// # Errors
    ///
    /// See [`ResultCursor::result`].
    fn result_as_int(&mut self, row: usize, field: &str) -> Result<i64, SqlHandleError> {
        Ok(coercion::to_int(&self.result(row, field)?))
    }

    /// # Errors
    ///
    /// See [`ResultCursor::result`].
    fn result_as_float(&mut self, row: usize, field: &str) -> Result<f64, SqlHandleError> {
        Ok(coercion::to_float(&self.result(row, field)?))
    }

    /// # Errors
    ///
    /// See [`ResultCursor::result`].
    fn result_as_string(&mut self, row: usize, field: &str) -> Result<String, SqlHandleError> {
        Ok(coercion::to_text(&self.result(row, field)?))
    }

    /// # Errors
    ///
    /// See [`ResultCursor::result`].
    fn result_as_bool(&mut self, row: usize, field: &str) -> Result<bool, SqlHandleError> {
        Ok(coercion::to_bool(&self.result(row, field)?))
    }

    /// # Errors
    ///
    /// See [`ResultCursor::result`].
    fn result_as_nullable_int(
        &mut self,
        row: usize,
        field: &str,
    ) -> Result<Option<i64>, SqlHandleError> {
        Ok(non_null(&self.result(row, field)?).map(coercion::to_int))
    }

    /// # Errors
    ///
    /// See [`ResultCursor::result`].
    fn result_as_nullable_float(
        &mut self,
        row: usize,
        field: &str,
    ) -> Result<Option<f64>, SqlHandleError> {
        Ok(non_null(&self.result(row, field)?).map(coercion::to_float))
    }

    /// # Errors
    ///
    /// See [`ResultCursor::result`].
    fn result_as_nullable_string(
        &mut self,
        row: usize,
        field: &str,
    ) -> Result<Option<String>, SqlHandleError> {
        Ok(non_null(&self.result(row, field)?).map(coercion::to_text))
    }

    /// # Errors
    ///
    /// See [`ResultCursor::result`].
    fn result_as_nullable_bool(
        &mut self,
        row: usize,
        field: &str,
    ) -> Result<Option<bool>, SqlHandleError> {
        Ok(non_null(&self.result(row, field)?).map(coercion::to_bool))
    }
}

/// Result of a statement executed by a live driver.
#[derive(Debug, Clone)]
pub struct DbResult {
    columns: Vec<String>,
    rows: Option<Vec<Vec<Value>>>,
    position: usize,
}

impl DbResult {
    #[must_use]
    pub fn new(raw: RawResult) -> Self {
        Self {
            columns: raw.columns,
            rows: Some(raw.rows),
            position: 0,
        }
    }

    /// Column names in select order.
    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    #[must_use]
    pub fn is_freed(&self) -> bool {
        self.rows.is_none()
    }

    fn rows(&self) -> Result<&[Vec<Value>], SqlHandleError> {
        self.rows.as_deref().ok_or(SqlHandleError::ResultFreed)
    }
}

impl ResultCursor for DbResult {
    fn fetch_array(&mut self, result_type: ResultType) -> Result<Option<FieldMap>, SqlHandleError> {
        let data = self
            .rows()?
            .get(self.position)
            .map(|values| shape_row(&self.columns, values, result_type));
        if data.is_some() {
            self.position += 1;
        }
        Ok(data)
    }

    fn num_rows(&self) -> Result<usize, SqlHandleError> {
        Ok(self.rows()?.len())
    }

    fn data_seek(&mut self, offset: usize) -> Result<bool, SqlHandleError> {
        if offset >= self.rows()?.len() {
            return Ok(false);
        }
        self.position = offset;
        Ok(true)
    }

    fn free(&mut self) {
        self.rows = None;
        self.position = 0;
    }
}
