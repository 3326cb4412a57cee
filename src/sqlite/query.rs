use rusqlite::Statement;
use rusqlite::types::Value as SqliteValue;

use crate::results::RawResult;

use super::params::from_sqlite_value;

/// Run `stmt` with `params` and buffer every row it returns.
///
/// # Errors
///
/// Returns the `rusqlite` error when execution or column extraction fails.
pub fn build_raw_result(
    stmt: &mut Statement<'_>,
    params: &[SqliteValue],
) -> Result<RawResult, rusqlite::Error> {
    let columns: Vec<String> = stmt
        .column_names()
        .iter()
        .map(std::string::ToString::to_string)
        .collect();
    let col_count = columns.len();

    let mut rows = Vec::new();
    let mut rows_iter = stmt.query(rusqlite::params_from_iter(params.iter()))?;
    while let Some(row) = rows_iter.next()? {
        let mut values = Vec::with_capacity(col_count);
        for idx in 0..col_count {
            let value: SqliteValue = row.get(idx)?;
            values.push(from_sqlite_value(value));
        }
        rows.push(values);
    }

    Ok(RawResult::new(columns, rows))
}
