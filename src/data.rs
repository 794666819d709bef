use anyhow::{anyhow, Result};
use serde_json::Value as JsonValue;

/// A single cell of a dataset.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Number(f64),
    Text(String),
    Null,
}

impl Value {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Textual rendering used for categorical axes and table cells.
    pub fn display(&self) -> String {
        match self {
            Value::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    format!("{}", *n as i64)
                } else {
                    format!("{}", n)
                }
            }
            Value::Text(s) => s.clone(),
            Value::Null => String::new(),
        }
    }

    fn parse(raw: &str) -> Value {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Value::Null;
        }
        match trimmed.parse::<f64>() {
            Ok(n) => Value::Number(n),
            Err(_) => Value::Text(trimmed.to_string()),
        }
    }
}

/// Inferred type of a column, decided once at load time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Numeric,
    Text,
}

#[derive(Debug, Clone)]
pub struct Column {
    pub name: String,
    pub values: Vec<Value>,
    pub column_type: ColumnType,
}

impl Column {
    fn new(name: String, values: Vec<Value>) -> Self {
        let has_number = values.iter().any(|v| matches!(v, Value::Number(_)));
        let has_text = values.iter().any(|v| matches!(v, Value::Text(_)));
        let column_type = if has_number && !has_text {
            ColumnType::Numeric
        } else {
            ColumnType::Text
        };
        Column {
            name,
            values,
            column_type,
        }
    }
}

/// In-memory tabular data: ordered named columns of equal length.
///
/// Built once per load and never mutated; a re-load replaces the whole
/// dataset.
#[derive(Debug, Clone)]
pub struct Dataset {
    columns: Vec<Column>,
    row_count: usize,
}

impl Dataset {
    /// Build a dataset from a header row and string rows, inferring cell
    /// values. Every row must match the header width.
    pub fn from_rows(headers: Vec<String>, rows: Vec<Vec<String>>) -> Result<Self> {
        if headers.is_empty() {
            return Err(anyhow!("Dataset has no columns"));
        }
        let mut column_values: Vec<Vec<Value>> = headers.iter().map(|_| Vec::new()).collect();
        for (row_idx, row) in rows.iter().enumerate() {
            if row.len() != headers.len() {
                return Err(anyhow!(
                    "Row {} has {} fields, expected {}",
                    row_idx + 1,
                    row.len(),
                    headers.len()
                ));
            }
            for (col_idx, raw) in row.iter().enumerate() {
                column_values[col_idx].push(Value::parse(raw));
            }
        }
        let row_count = rows.len();
        let columns = headers
            .into_iter()
            .zip(column_values)
            .map(|(name, values)| Column::new(name, values))
            .collect();
        Ok(Dataset { columns, row_count })
    }

    /// Build a dataset from a JSON array of objects. Keys of the first
    /// object define the columns; missing keys in later objects become null.
    pub fn from_json(value: &JsonValue) -> Result<Self> {
        let array = value
            .as_array()
            .ok_or_else(|| anyhow!("Input data must be a JSON array of objects"))?;
        if array.is_empty() {
            return Err(anyhow!("Input data array is empty"));
        }
        let first_obj = array[0]
            .as_object()
            .ok_or_else(|| anyhow!("Items in array must be objects"))?;
        let headers: Vec<String> = first_obj.keys().cloned().collect();

        let mut rows = Vec::with_capacity(array.len());
        for item in array {
            let obj = item
                .as_object()
                .ok_or_else(|| anyhow!("Items in array must be objects"))?;
            let mut row = Vec::with_capacity(headers.len());
            for header in &headers {
                let cell = match obj.get(header) {
                    Some(JsonValue::String(s)) => s.clone(),
                    Some(JsonValue::Number(n)) => n.to_string(),
                    Some(JsonValue::Bool(b)) => b.to_string(),
                    Some(JsonValue::Null) | None => String::new(),
                    _ => return Err(anyhow!("Unsupported value type for field '{}'", header)),
                };
                row.push(cell);
            }
            rows.push(row);
        }
        Dataset::from_rows(headers, rows)
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Ordered projection onto the named columns.
    pub fn project(&self, names: &[&str]) -> Result<Dataset> {
        let mut columns = Vec::with_capacity(names.len());
        for name in names {
            let col = self
                .column(name)
                .ok_or_else(|| anyhow!("Column '{}' not found", name))?;
            columns.push(col.clone());
        }
        Ok(Dataset {
            columns,
            row_count: self.row_count,
        })
    }
}
