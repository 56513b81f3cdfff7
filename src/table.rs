use std::collections::{HashMap, HashSet};
use std::hash::{Hash, Hasher};

use anyhow::Result;
use serde::Serialize;

use crate::error::PipelineError;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Cell {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl Cell {
    pub fn is_null(&self) -> bool {
        matches!(self, Cell::Null)
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Cell::Integer(v) => Some(*v),
            Cell::Real(v) if v.fract() == 0.0 => Some(*v as i64),
            Cell::Text(s) => s.trim().parse::<i64>().ok(),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Cell::Integer(v) => Some(*v as f64),
            Cell::Real(v) => Some(*v),
            Cell::Text(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Cell::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }
}

// Exact-duplicate detection needs hashing; reals hash by bit pattern, which
// matches the value equality pandas applies in `duplicated()`.
impl Eq for Cell {}

impl Hash for Cell {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Cell::Null => {}
            Cell::Integer(v) => v.hash(state),
            Cell::Real(v) => v.to_bits().hash(state),
            Cell::Text(s) => s.hash(state),
            Cell::Blob(b) => b.hash(state),
        }
    }
}

/// A named, column-addressed in-memory table. Every transformation returns a
/// new table; nothing mutates in place.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub name: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl Table {
    pub fn new(name: impl Into<String>, columns: Vec<String>, rows: Vec<Vec<Cell>>) -> Self {
        Self {
            name: name.into(),
            columns,
            rows,
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }

    pub fn column_index(&self, column: &str) -> Result<usize> {
        self.columns
            .iter()
            .position(|c| c == column)
            .ok_or_else(|| PipelineError::missing_column(&self.name, column).into())
    }

    pub fn null_counts(&self) -> Vec<(String, usize)> {
        let mut counts = vec![0usize; self.columns.len()];
        for row in &self.rows {
            for (idx, cell) in row.iter().enumerate() {
                if cell.is_null() {
                    counts[idx] += 1;
                }
            }
        }
        self.columns.iter().cloned().zip(counts).collect()
    }

    pub fn null_fraction(&self, column: &str) -> Result<f64> {
        let idx = self.column_index(column)?;
        if self.rows.is_empty() {
            return Ok(0.0);
        }
        let nulls = self.rows.iter().filter(|r| r[idx].is_null()).count();
        Ok(nulls as f64 / self.rows.len() as f64)
    }

    /// Rows that repeat an earlier row exactly (first occurrence not counted).
    pub fn duplicate_count(&self) -> usize {
        let mut seen: HashSet<&[Cell]> = HashSet::with_capacity(self.rows.len());
        self.rows
            .iter()
            .filter(|row| !seen.insert(row.as_slice()))
            .count()
    }

    pub fn dedup(&self) -> Table {
        let mut seen: HashSet<&[Cell]> = HashSet::with_capacity(self.rows.len());
        let rows = self
            .rows
            .iter()
            .filter(|row| seen.insert(row.as_slice()))
            .cloned()
            .collect();
        Table::new(self.name.clone(), self.columns.clone(), rows)
    }

    pub fn drop_columns(&self, names: &[&str]) -> Result<Table> {
        let mut drop = HashSet::new();
        for name in names {
            drop.insert(self.column_index(name)?);
        }
        let keep: Vec<usize> = (0..self.columns.len()).filter(|i| !drop.contains(i)).collect();
        let columns = keep.iter().map(|&i| self.columns[i].clone()).collect();
        let rows = self
            .rows
            .iter()
            .map(|row| keep.iter().map(|&i| row[i].clone()).collect())
            .collect();
        Ok(Table::new(self.name.clone(), columns, rows))
    }

    pub fn incomplete_row_count(&self, columns: &[&str]) -> Result<usize> {
        let idx = self.indices(columns)?;
        Ok(self
            .rows
            .iter()
            .filter(|row| idx.iter().any(|&i| row[i].is_null()))
            .count())
    }

    pub fn drop_incomplete_rows(&self, columns: &[&str]) -> Result<Table> {
        let idx = self.indices(columns)?;
        let rows = self
            .rows
            .iter()
            .filter(|row| idx.iter().all(|&i| !row[i].is_null()))
            .cloned()
            .collect();
        Ok(Table::new(self.name.clone(), self.columns.clone(), rows))
    }

    pub fn reader(&self) -> TableReader<'_> {
        let index = self
            .columns
            .iter()
            .enumerate()
            .map(|(i, c)| (c.as_str(), i))
            .collect();
        TableReader { table: self, index }
    }

    fn indices(&self, columns: &[&str]) -> Result<Vec<usize>> {
        columns.iter().map(|c| self.column_index(c)).collect()
    }
}

/// Column-name lookup over a table. Missing columns surface as
/// `PipelineError::MissingColumn` at the point of first reference.
pub struct TableReader<'a> {
    table: &'a Table,
    index: HashMap<&'a str, usize>,
}

impl<'a> TableReader<'a> {
    pub fn rows(&self) -> impl Iterator<Item = (usize, &'a [Cell])> + 'a {
        self.table
            .rows
            .iter()
            .enumerate()
            .map(|(i, r)| (i, r.as_slice()))
    }

    pub fn cell<'r>(&self, row: &'r [Cell], column: &str) -> Result<&'r Cell> {
        let idx = self
            .index
            .get(column)
            .copied()
            .ok_or_else(|| PipelineError::missing_column(&self.table.name, column))?;
        Ok(&row[idx])
    }

    pub fn require_columns(&self, columns: &[&str]) -> Result<()> {
        for column in columns {
            if !self.index.contains_key(column) {
                return Err(PipelineError::missing_column(&self.table.name, column).into());
            }
        }
        Ok(())
    }

    pub fn i64(&self, row_no: usize, row: &[Cell], column: &str) -> Result<i64> {
        let cell = self.cell(row, column)?;
        cell.as_i64()
            .ok_or_else(|| self.bad_value(row_no, column, format!("expected integer, got {cell:?}")))
    }

    /// `None` only for SQL NULL; a present value that is not numeric is a
    /// schema error.
    pub fn opt_f64(&self, row_no: usize, row: &[Cell], column: &str) -> Result<Option<f64>> {
        let cell = self.cell(row, column)?;
        if cell.is_null() {
            return Ok(None);
        }
        cell.as_f64()
            .map(Some)
            .ok_or_else(|| self.bad_value(row_no, column, format!("expected number, got {cell:?}")))
    }

    pub fn f64(&self, row_no: usize, row: &[Cell], column: &str) -> Result<f64> {
        let cell = self.cell(row, column)?;
        cell.as_f64()
            .ok_or_else(|| self.bad_value(row_no, column, format!("expected number, got {cell:?}")))
    }

    pub fn text(&self, row_no: usize, row: &[Cell], column: &str) -> Result<String> {
        let cell = self.cell(row, column)?;
        cell.as_text()
            .map(|s| s.to_string())
            .ok_or_else(|| self.bad_value(row_no, column, format!("expected text, got {cell:?}")))
    }

    pub fn opt_text(&self, row: &[Cell], column: &str) -> Result<Option<String>> {
        Ok(self.cell(row, column)?.as_text().map(|s| s.to_string()))
    }

    pub fn bad_value(&self, row: usize, column: &str, reason: String) -> anyhow::Error {
        PipelineError::BadValue {
            table: self.table.name.clone(),
            column: column.to_string(),
            row,
            reason,
        }
        .into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Table {
        Table::new(
            "t",
            vec!["a".into(), "b".into(), "c".into()],
            vec![
                vec![Cell::Integer(1), Cell::Null, Cell::Text("x".into())],
                vec![Cell::Integer(1), Cell::Null, Cell::Text("x".into())],
                vec![Cell::Integer(2), Cell::Real(0.5), Cell::Null],
            ],
        )
    }

    #[test]
    fn duplicates_count_repeats_only() {
        let t = sample();
        assert_eq!(t.duplicate_count(), 1);
        assert_eq!(t.dedup().len(), 2);
    }

    #[test]
    fn drop_unknown_column_is_schema_error() {
        let err = sample().drop_columns(&["zzz"]).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PipelineError>(),
            Some(PipelineError::MissingColumn { .. })
        ));
    }

    #[test]
    fn incomplete_rows_respect_column_subset() {
        let t = sample();
        assert_eq!(t.incomplete_row_count(&["a", "c"]).unwrap(), 1);
        assert_eq!(t.drop_incomplete_rows(&["b"]).unwrap().len(), 1);
    }
}
