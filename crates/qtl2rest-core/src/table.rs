//! Named-column tabular results.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Errors building a [`Table`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TableError {
    /// A row did not have one value per column.
    #[error("row {row} has {actual} values, expected {expected}")]
    RowWidth {
        /// Zero-based row index.
        row: usize,
        /// Number of columns.
        expected: usize,
        /// Number of values in the row.
        actual: usize,
    },
}

/// A tabular result with named columns and row-major data.
///
/// Handlers shape a table with [`Table::shape`]: either self-describing
/// records (`expand=true`) or the compact `{columns, data}` pair.
///
/// # Example
///
/// ```
/// use qtl2rest_core::Table;
/// use serde_json::json;
///
/// let mut table = Table::new(["marker_id", "lod"]);
/// table.push_row(vec![json!("1_100"), json!(3.2)]).unwrap();
///
/// assert_eq!(table.clone().shape(true), json!([{"marker_id": "1_100", "lod": 3.2}]));
/// assert_eq!(
///     table.shape(false),
///     json!({"columns": ["marker_id", "lod"], "data": [["1_100", 3.2]]})
/// );
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl Table {
    /// Creates an empty table with the given columns.
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Creates a table from columns and rows, checking row widths.
    pub fn with_rows<I, S>(columns: I, rows: Vec<Vec<Value>>) -> Result<Self, TableError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut table = Self::new(columns);
        for row in rows {
            table.push_row(row)?;
        }
        Ok(table)
    }

    /// Appends a row.
    pub fn push_row(&mut self, row: Vec<Value>) -> Result<(), TableError> {
        if row.len() != self.columns.len() {
            return Err(TableError::RowWidth {
                row: self.rows.len(),
                expected: self.columns.len(),
                actual: row.len(),
            });
        }
        self.rows.push(row);
        Ok(())
    }

    /// Column names.
    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Row-major data.
    #[must_use]
    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns `true` if there are no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Converts into an array of objects keyed by column name.
    #[must_use]
    pub fn into_records(self) -> Value {
        let Self { columns, rows } = self;
        let records = rows
            .into_iter()
            .map(|row| {
                let record: Map<String, Value> = columns.iter().cloned().zip(row).collect();
                Value::Object(record)
            })
            .collect();
        Value::Array(records)
    }

    /// Converts into `{"columns": [...], "data": [[...], ...]}`.
    #[must_use]
    pub fn into_compact(self) -> Value {
        let mut compact = Map::new();
        compact.insert(
            "columns".to_string(),
            Value::Array(self.columns.into_iter().map(Value::String).collect()),
        );
        compact.insert(
            "data".to_string(),
            Value::Array(self.rows.into_iter().map(Value::Array).collect()),
        );
        Value::Object(compact)
    }

    /// Records when `expand` is set, the compact pair otherwise.
    #[must_use]
    pub fn shape(self, expand: bool) -> Value {
        if expand {
            self.into_records()
        } else {
            self.into_compact()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn scan() -> Table {
        Table::with_rows(
            ["id", "chr", "pos", "lod"],
            vec![
                vec![json!("1_3000000"), json!("1"), json!(3.0), json!(0.21)],
                vec![json!("2_5000000"), json!("2"), json!(5.0), json!(7.4)],
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_push_row_rejects_wrong_width() {
        let mut table = Table::new(["a", "b"]);
        let err = table.push_row(vec![json!(1)]).unwrap_err();
        assert_eq!(
            err,
            TableError::RowWidth {
                row: 0,
                expected: 2,
                actual: 1
            }
        );
        assert!(table.is_empty());
    }

    #[test]
    fn test_records_preserve_column_order() {
        let records = scan().into_records();
        let first = records[0].as_object().unwrap();
        let keys: Vec<_> = first.keys().cloned().collect();
        assert_eq!(keys, vec!["id", "chr", "pos", "lod"]);
        assert_eq!(records[1]["lod"], json!(7.4));
    }

    #[test]
    fn test_compact_strips_column_names_from_rows() {
        let compact = scan().into_compact();
        assert_eq!(compact["columns"], json!(["id", "chr", "pos", "lod"]));
        assert_eq!(compact["data"][1], json!(["2_5000000", "2", 5.0, 7.4]));
    }

    #[test]
    fn test_empty_table_shapes() {
        let table = Table::new(["a"]);
        assert_eq!(table.clone().shape(true), json!([]));
        assert_eq!(table.shape(false), json!({"columns": ["a"], "data": []}));
    }

    #[test]
    fn test_single_row_records_stay_an_array() {
        let table = Table::with_rows(["a"], vec![vec![json!(1)]]).unwrap();
        assert_eq!(table.shape(true), json!([{"a": 1}]));
    }
}
