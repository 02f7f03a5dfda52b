//! Standardisation fit on one dataset and replayed on others.

use log::debug;

use crate::data::model::{Dataset, Value};
use crate::error::FeatureError;

/// Fitted parameters for one column.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColumnStats {
    pub mean: f64,
    /// Population standard deviation, or 1.0 for a constant column.
    pub scale: f64,
}

/// Per-column `(x - mean) / std` transform.
#[derive(Debug, Clone, PartialEq)]
pub struct StandardScaler {
    columns: Vec<(String, ColumnStats)>,
}

impl StandardScaler {
    /// Fit mean and standard deviation of each column. Nulls are ignored.
    pub fn fit<S: AsRef<str>>(dataset: &Dataset, columns: &[S]) -> Result<Self, FeatureError> {
        let columns = columns
            .iter()
            .map(|name| {
                let name = name.as_ref();
                let values = numeric_values(dataset, name)?;
                Ok((name.to_string(), column_stats(values.iter().flatten().copied())))
            })
            .collect::<Result<Vec<_>, FeatureError>>()?;
        let scaler = StandardScaler { columns };
        for name in scaler.columns() {
            if let Some(stats) = scaler.stats(name) {
                debug!("'{name}': mean={:.4} scale={:.4}", stats.mean, stats.scale);
            }
        }
        Ok(scaler)
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(name, _)| name.as_str())
    }

    pub fn stats(&self, column: &str) -> Option<ColumnStats> {
        self.columns
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, s)| *s)
    }

    /// Standardise the fitted columns in place. Nulls stay null.
    pub fn transform(&self, dataset: &mut Dataset) -> Result<(), FeatureError> {
        let missing: Vec<String> = self
            .columns()
            .filter(|c| !dataset.has_column(c))
            .map(str::to_string)
            .collect();
        if !missing.is_empty() {
            return Err(FeatureError::ScalerColumnMismatch(missing));
        }

        for (name, stats) in &self.columns {
            let values = numeric_values(dataset, name)?;
            dataset.column_mut(name)?.values = values
                .into_iter()
                .map(|v| v.map_or(Value::Null, |x| Value::Float((x - stats.mean) / stats.scale)))
                .collect();
        }
        Ok(())
    }
}

/// Read a column as optional floats, rejecting text cells.
fn numeric_values(dataset: &Dataset, name: &str) -> Result<Vec<Option<f64>>, FeatureError> {
    dataset
        .column(name)?
        .values
        .iter()
        .enumerate()
        .map(|(row, v)| match v {
            Value::Null => Ok(None),
            Value::Float(f) if f.is_nan() => Ok(None),
            other => other.as_f64().map(Some).ok_or_else(|| FeatureError::NonNumeric {
                column: name.to_string(),
                row,
                value: other.to_string(),
            }),
        })
        .collect()
}

fn column_stats(values: impl Iterator<Item = f64> + Clone) -> ColumnStats {
    let n = values.clone().count();
    if n == 0 {
        return ColumnStats { mean: 0.0, scale: 1.0 };
    }
    let n = n as f64;
    let mean = values.clone().sum::<f64>() / n;
    let variance = values.map(|v| (v - mean) * (v - mean)).sum::<f64>() / n;
    let std_dev = variance.sqrt();
    let scale = if std_dev > f64::EPSILON { std_dev } else { 1.0 };
    ColumnStats { mean, scale }
}
