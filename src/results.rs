//! Query results: buffered rows, the cursor trait and row objects.

pub mod result_set;
pub mod row;

pub use result_set::{DbResult, RawResult, ResultCursor};
pub use row::{FieldKey, FieldMap, Row, shape_row};
