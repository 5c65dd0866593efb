use chrono::NaiveDate;

/// One wide-format column: a variable observed for one country.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Column {
    pub variable: String,
    pub entity: String,
}

impl Column {
    pub fn new(variable: impl Into<String>, entity: impl Into<String>) -> Self {
        Self {
            variable: variable.into(),
            entity: entity.into(),
        }
    }
}

/// Date-indexed wide table. Every row holds one cell per column.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame<T> {
    pub columns: Vec<Column>,
    pub rows: Vec<(NaiveDate, Vec<T>)>,
}

impl<T> Frame<T> {
    pub fn new(columns: Vec<Column>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.rows.iter().map(|(d, _)| *d).collect()
    }

    /// Cells of one column, top to bottom.
    pub fn column_values(&self, idx: usize) -> Vec<&T> {
        self.rows.iter().map(|(_, cells)| &cells[idx]).collect()
    }
}
