//! Transaction table: the in-memory dataset

/// Ordered transaction records sharing one numeric schema.
///
/// Rows are stored row-major; every row holds exactly `columns.len()` values.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionTable {
    columns: Vec<String>,
    rows: Vec<Vec<f64>>,
}

impl TransactionTable {
    /// Build a table, checking that every row matches the schema width.
    ///
    /// Returns the index of the first offending row on mismatch.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<f64>>) -> Result<Self, usize> {
        if let Some(bad) = rows.iter().position(|r| r.len() != columns.len()) {
            return Err(bad);
        }
        Ok(Self { columns, rows })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Position of a column by name
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Table with the same schema holding the given rows, in the given order
    pub fn select_rows(&self, indices: &[usize]) -> Self {
        Self {
            columns: self.columns.clone(),
            rows: indices.iter().map(|&i| self.rows[i].clone()).collect(),
        }
    }
}
