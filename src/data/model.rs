use std::collections::BTreeSet;
use std::fmt;

use crate::error::FeatureError;

// ---------------------------------------------------------------------------
// Value – a single cell in a column
// ---------------------------------------------------------------------------

/// A dynamically-typed cell value mirroring the common Pandas dtypes.
/// Categories are collected into `BTreeSet`s downstream so `Value` must be `Ord`.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    Null,
}

// -- Manual Eq/Ord so we can put Value in BTreeSet --

impl Eq for Value {}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Value {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        use Value::*;
        fn discriminant(v: &Value) -> u8 {
            match v {
                Null => 0,
                Bool(_) => 1,
                Integer(_) => 2,
                Float(_) => 3,
                String(_) => 4,
            }
        }
        let da = discriminant(self);
        let db = discriminant(other);
        if da != db {
            return da.cmp(&db);
        }
        match (self, other) {
            (Bool(a), Bool(b)) => a.cmp(b),
            (Integer(a), Integer(b)) => a.cmp(b),
            (Float(a), Float(b)) => a.total_cmp(b),
            (String(a), String(b)) => a.cmp(b),
            _ => std::cmp::Ordering::Equal,
        }
    }
}

impl std::hash::Hash for Value {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Value::String(s) => s.hash(state),
            Value::Integer(i) => i.hash(state),
            Value::Float(f) => f.to_bits().hash(state),
            Value::Bool(b) => b.hash(state),
            Value::Null => {}
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => write!(f, "{s}"),
            Value::Integer(i) => write!(f, "{i}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Null => write!(f, "<null>"),
        }
    }
}

impl Value {
    /// Interpret the value as an `f64`. Booleans map to 0/1.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(v) => Some(*v),
            Value::Integer(i) => Some(*i as f64),
            Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

// ---------------------------------------------------------------------------
// Column – one named series
// ---------------------------------------------------------------------------

/// A named series of values aligned by row position.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub values: Vec<Value>,
}

impl Column {
    pub fn new(name: impl Into<String>, values: Vec<Value>) -> Self {
        Column {
            name: name.into(),
            values,
        }
    }
}

// ---------------------------------------------------------------------------
// Dataset – an ordered collection of columns
// ---------------------------------------------------------------------------

/// A tabular dataset: ordered columns plus row labels kept apart from the data.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    /// Row labels, `0..n` unless an index column was read from the source.
    pub index: Vec<Value>,
    pub columns: Vec<Column>,
}

impl Dataset {
    /// Build a dataset with a default `0..n` index.
    pub fn from_columns(columns: Vec<Column>) -> Result<Self, FeatureError> {
        let rows = columns.first().map_or(0, |c| c.values.len());
        let index = (0..rows as i64).map(Value::Integer).collect();
        Self::with_index(index, columns)
    }

    /// Build a dataset with explicit row labels. Every column must match the index length.
    pub fn with_index(index: Vec<Value>, columns: Vec<Column>) -> Result<Self, FeatureError> {
        for col in &columns {
            if col.values.len() != index.len() {
                return Err(FeatureError::LengthMismatch {
                    column: col.name.clone(),
                    expected: index.len(),
                    actual: col.values.len(),
                });
            }
        }
        Ok(Dataset { index, columns })
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    pub fn column(&self, name: &str) -> Result<&Column, FeatureError> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .ok_or_else(|| FeatureError::MissingColumn(name.to_string()))
    }

    pub fn column_mut(&mut self, name: &str) -> Result<&mut Column, FeatureError> {
        self.columns
            .iter_mut()
            .find(|c| c.name == name)
            .ok_or_else(|| FeatureError::MissingColumn(name.to_string()))
    }

    /// Replace the column of the same name in place, or append it at the end.
    pub fn insert_column(&mut self, column: Column) -> Result<(), FeatureError> {
        if column.values.len() != self.len() {
            return Err(FeatureError::LengthMismatch {
                column: column.name,
                expected: self.len(),
                actual: column.values.len(),
            });
        }
        match self.position(&column.name) {
            Some(i) => self.columns[i] = column,
            None => self.columns.push(column),
        }
        Ok(())
    }

    pub fn remove_column(&mut self, name: &str) -> Result<Column, FeatureError> {
        let i = self
            .position(name)
            .ok_or_else(|| FeatureError::MissingColumn(name.to_string()))?;
        Ok(self.columns.remove(i))
    }

    /// Drop the named columns. Fails without modifying anything if one is unknown.
    pub fn drop_columns<S: AsRef<str>>(&mut self, names: &[S]) -> Result<(), FeatureError> {
        if let Some(missing) = names.iter().find(|n| !self.has_column(n.as_ref())) {
            return Err(FeatureError::MissingColumn(missing.as_ref().to_string()));
        }
        self.columns
            .retain(|c| !names.iter().any(|n| n.as_ref() == c.name));
        Ok(())
    }

    /// Sorted set of non-null values in a column.
    pub fn unique_values(&self, name: &str) -> Result<BTreeSet<Value>, FeatureError> {
        Ok(self
            .column(name)?
            .values
            .iter()
            .filter(|v| !v.is_null())
            .cloned()
            .collect())
    }

    /// New dataset holding only the given rows, in the given order.
    pub fn select_rows(&self, rows: &[usize]) -> Dataset {
        Dataset {
            index: rows.iter().map(|&r| self.index[r].clone()).collect(),
            columns: self
                .columns
                .iter()
                .map(|c| Column::new(c.name.clone(), rows.iter().map(|&r| c.values[r].clone()).collect()))
                .collect(),
        }
    }

    /// Split a combined table into `(train, test)` on whether `target` is present.
    ///
    /// The target column is dropped from the test part since it is null throughout.
    pub fn split_by_null(&self, target: &str) -> Result<(Dataset, Dataset), FeatureError> {
        let (known, unknown): (Vec<usize>, Vec<usize>) = self
            .column(target)?
            .values
            .iter()
            .enumerate()
            .map(|(i, v)| (i, v.is_null()))
            .fold((Vec::new(), Vec::new()), |(mut k, mut u), (i, null)| {
                if null {
                    u.push(i);
                } else {
                    k.push(i);
                }
                (k, u)
            });

        let train = self.select_rows(&known);
        let mut test = self.select_rows(&unknown);
        test.remove_column(target)?;
        Ok((train, test))
    }
}
