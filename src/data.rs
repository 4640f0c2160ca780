use anyhow::{anyhow, Result};

/// Inferred type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Numeric,
    Text,
}

/// Cell values of a single column. `None` marks a missing value.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnValues {
    Numeric(Vec<Option<f64>>),
    Text(Vec<Option<String>>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub values: ColumnValues,
}

impl Column {
    pub fn numeric(name: impl Into<String>, values: Vec<Option<f64>>) -> Self {
        Self {
            name: name.into(),
            values: ColumnValues::Numeric(values),
        }
    }

    pub fn text(name: impl Into<String>, values: Vec<Option<String>>) -> Self {
        Self {
            name: name.into(),
            values: ColumnValues::Text(values),
        }
    }

    pub fn kind(&self) -> ColumnKind {
        match self.values {
            ColumnValues::Numeric(_) => ColumnKind::Numeric,
            ColumnValues::Text(_) => ColumnKind::Text,
        }
    }

    pub fn is_numeric(&self) -> bool {
        self.kind() == ColumnKind::Numeric
    }

    pub fn len(&self) -> usize {
        match &self.values {
            ColumnValues::Numeric(v) => v.len(),
            ColumnValues::Text(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn null_count(&self) -> usize {
        match &self.values {
            ColumnValues::Numeric(v) => v.iter().filter(|c| c.is_none()).count(),
            ColumnValues::Text(v) => v.iter().filter(|c| c.is_none()).count(),
        }
    }

    /// Numeric cells, or `None` for a text column.
    pub fn as_numbers(&self) -> Option<&[Option<f64>]> {
        match &self.values {
            ColumnValues::Numeric(v) => Some(v),
            ColumnValues::Text(_) => None,
        }
    }

    /// Non-null numeric values in row order (empty for text columns).
    pub fn non_null_numbers(&self) -> Vec<f64> {
        self.as_numbers()
            .map(|v| v.iter().flatten().copied().collect())
            .unwrap_or_default()
    }

    /// Cell `row` rendered for display. Integral numeric columns without
    /// missing values print without a decimal point.
    pub fn display_cell(&self, row: usize) -> Option<String> {
        match &self.values {
            ColumnValues::Numeric(v) => {
                let value = v.get(row).copied().flatten()?;
                if self.is_integral() {
                    Some(format!("{}", value as i64))
                } else {
                    Some(format!("{:?}", value))
                }
            }
            ColumnValues::Text(v) => v.get(row).cloned().flatten(),
        }
    }

    fn is_integral(&self) -> bool {
        match &self.values {
            ColumnValues::Numeric(v) => v
                .iter()
                .all(|c| matches!(c, Some(x) if x.fract() == 0.0 && x.abs() < 9.0e15)),
            ColumnValues::Text(_) => false,
        }
    }
}

/// An in-memory table: ordered named columns of equal length.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    columns: Vec<Column>,
    row_count: usize,
}

impl Dataset {
    pub fn new(columns: Vec<Column>) -> Result<Self> {
        let row_count = columns.first().map(Column::len).unwrap_or(0);
        if let Some(bad) = columns.iter().find(|c| c.len() != row_count) {
            return Err(anyhow!(
                "Column '{}' has {} values, expected {}",
                bad.name,
                bad.len(),
                row_count
            ));
        }
        Ok(Self { columns, row_count })
    }

    /// (rows, columns)
    pub fn shape(&self) -> (usize, usize) {
        (self.row_count, self.columns.len())
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Like [`Dataset::column`] but fails with a readable error.
    pub fn require_column(&self, name: &str) -> Result<&Column> {
        self.column(name)
            .ok_or_else(|| anyhow!("Column '{}' not found", name))
    }

    pub fn numeric_columns(&self) -> Vec<String> {
        self.columns
            .iter()
            .filter(|c| c.is_numeric())
            .map(|c| c.name.clone())
            .collect()
    }

    pub fn non_numeric_columns(&self) -> Vec<String> {
        self.columns
            .iter()
            .filter(|c| !c.is_numeric())
            .map(|c| c.name.clone())
            .collect()
    }

    pub fn total_nulls(&self) -> usize {
        self.columns.iter().map(Column::null_count).sum()
    }

    /// The first `n` rows as display strings.
    pub fn head(&self, n: usize) -> Vec<Vec<Option<String>>> {
        (0..self.row_count.min(n))
            .map(|row| self.columns.iter().map(|c| c.display_cell(row)).collect())
            .collect()
    }
}
