use std::fmt;

use indexmap::IndexMap;

use crate::coercion;
use crate::error::SqlHandleError;
use crate::types::{ResultType, Value};

/// Key of a field inside a fetched row: a column name or an ordinal position.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FieldKey {
    Name(String),
    Index(usize),
}

impl fmt::Display for FieldKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldKey::Name(name) => f.write_str(name),
            FieldKey::Index(idx) => write!(f, "{idx}"),
        }
    }
}

impl From<&str> for FieldKey {
    fn from(name: &str) -> Self {
        FieldKey::Name(name.to_string())
    }
}

impl From<String> for FieldKey {
    fn from(name: String) -> Self {
        FieldKey::Name(name)
    }
}

impl From<usize> for FieldKey {
    fn from(idx: usize) -> Self {
        FieldKey::Index(idx)
    }
}

/// Ordered field map of one fetched row.
pub type FieldMap = IndexMap<FieldKey, Value>;

/// Build the field map for one row of `values` under `columns`.
///
/// With [`ResultType::Both`] each field appears twice, position first.
/// When column names repeat, the later column wins the name key.
#[must_use]
pub fn shape_row(columns: &[String], values: &[Value], result_type: ResultType) -> FieldMap {
    let per_field =
        usize::from(result_type.includes_names()) + usize::from(result_type.includes_positions());
    let mut data = FieldMap::with_capacity(values.len() * per_field);
    for (idx, value) in values.iter().enumerate() {
        if result_type.includes_positions() {
            data.insert(FieldKey::Index(idx), value.clone());
        }
        if result_type.includes_names() {
            if let Some(name) = columns.get(idx) {
                data.insert(FieldKey::Name(name.clone()), value.clone());
            }
        }
    }
    data
}

/// A single fetched row. Immutable; every fetch produces a fresh one.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    data: FieldMap,
    result_type: ResultType,
}

impl Row {
    #[must_use]
    pub fn new(data: FieldMap, result_type: ResultType) -> Self {
        Self { data, result_type }
    }

    /// All fields in fetch order.
    #[must_use]
    pub fn get_all(&self) -> &FieldMap {
        &self.data
    }

    #[must_use]
    pub fn into_inner(self) -> FieldMap {
        self.data
    }

    #[must_use]
    pub fn result_type(&self) -> ResultType {
        self.result_type
    }

    /// Raw value of a field.
    ///
    /// # Errors
    ///
    /// Returns `SqlHandleError::FieldNotFound` if the row has no such key.
    pub fn get(&self, key: impl Into<FieldKey>) -> Result<&Value, SqlHandleError> {
        let key = key.into();
        self.data
            .get(&key)
            .ok_or_else(|| SqlHandleError::FieldNotFound(key.to_string()))
    }

    /// # Errors
    ///
    /// Returns `SqlHandleError::FieldNotFound` if the row has no such key.
    pub fn get_as_int(&self, key: impl Into<FieldKey>) -> Result<i64, SqlHandleError> {
        self.get(key).map(coercion::to_int)
    }

    /// # Errors
    ///
    /// Returns `SqlHandleError::FieldNotFound` if the row has no such key.
    pub fn get_as_float(&self, key: impl Into<FieldKey>) -> Result<f64, SqlHandleError> {
        self.get(key).map(coercion::to_float)
    }

    /// # Errors
    ///
    /// Returns `SqlHandleError::FieldNotFound` if the row has no such key.
    pub fn get_as_string(&self, key: impl Into<FieldKey>) -> Result<String, SqlHandleError> {
        self.get(key).map(coercion::to_text)
    }

    /// # Errors
    ///
    /// Returns `SqlHandleError::FieldNotFound` if the row has no such key.
    pub fn get_as_bool(&self, key: impl Into<FieldKey>) -> Result<bool, SqlHandleError> {
        self.get(key).map(coercion::to_bool)
    }

    /// Like [`Row::get_as_int`], but NULL stays `None`.
    ///
    /// # Errors
    ///
    /// Returns `SqlHandleError::FieldNotFound` if the row has no such key.
    pub fn get_as_nullable_int(
        &self,
        key: impl Into<FieldKey>,
    ) -> Result<Option<i64>, SqlHandleError> {
        self.get(key).map(|v| non_null(v).map(coercion::to_int))
    }

    /// # Errors
    ///
    /// Returns `SqlHandleError::FieldNotFound` if the row has no such key.
    pub fn get_as_nullable_float(
        &self,
        key: impl Into<FieldKey>,
    ) -> Result<Option<f64>, SqlHandleError> {
        self.get(key).map(|v| non_null(v).map(coercion::to_float))
    }

    /// # Errors
    ///
    /// Returns `SqlHandleError::FieldNotFound` if the row has no such key.
    pub fn get_as_nullable_string(
        &self,
        key: impl Into<FieldKey>,
    ) -> Result<Option<String>, SqlHandleError> {
        self.get(key).map(|v| non_null(v).map(coercion::to_text))
    }

    /// # Errors
    ///
    /// Returns `SqlHandleError::FieldNotFound` if the row has no such key.
    pub fn get_as_nullable_bool(
        &self,
        key: impl Into<FieldKey>,
    ) -> Result<Option<bool>, SqlHandleError> {
        self.get(key).map(|v| non_null(v).map(coercion::to_bool))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &FieldKey> {
        self.data.keys()
    }
}

pub(crate) fn non_null(value: &Value) -> Option<&Value> {
    if value.is_null() { None } else { Some(value) }
}
