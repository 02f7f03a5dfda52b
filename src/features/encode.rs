use std::collections::BTreeSet;

use log::{debug, warn};

use crate::data::model::{Column, Dataset, Value};
use crate::error::FeatureError;

/// Category levels learned for one column.
#[derive(Debug, Clone, PartialEq)]
struct Levels {
    column: String,
    /// Sorted levels that get an indicator column (reference level already removed).
    encoded: Vec<Value>,
    /// Every level seen while fitting, including the reference level.
    known: BTreeSet<Value>,
}

/// One-hot encoder whose category sets are fixed once, on the training data.
///
/// Applying the same fitted encoder to every dataset guarantees identical
/// indicator columns even when a later dataset lacks (or adds) a category.
#[derive(Debug, Clone, PartialEq)]
pub struct OneHotEncoder {
    levels: Vec<Levels>,
}

impl OneHotEncoder {
    /// Learn the sorted non-null categories of each column. With `drop_first`
    /// the smallest category becomes the reference level and gets no column.
    pub fn fit<S: AsRef<str>>(
        dataset: &Dataset,
        columns: &[S],
        drop_first: bool,
    ) -> Result<Self, FeatureError> {
        let levels: Vec<Levels> = columns
            .iter()
            .map(|col| {
                let col = col.as_ref();
                let known = dataset.unique_values(col)?;
                let skip = usize::from(drop_first && !known.is_empty());
                let encoded: Vec<Value> = known.iter().skip(skip).cloned().collect();
                debug!("'{col}': {} categories, {} indicators", known.len(), encoded.len());
                Ok(Levels {
                    column: col.to_string(),
                    encoded,
                    known,
                })
            })
            .collect::<Result<_, FeatureError>>()?;
        Ok(OneHotEncoder { levels })
    }

    /// Names of the indicator columns this encoder produces, in output order.
    pub fn output_columns(&self) -> Vec<String> {
        self.levels
            .iter()
            .flat_map(|l| l.encoded.iter().map(move |v| indicator_name(&l.column, v)))
            .collect()
    }

    /// Replace every fitted categorical column with its indicator columns,
    /// appended after the remaining columns. Null and unseen values encode
    /// as all-false.
    pub fn transform(&self, dataset: &mut Dataset) -> Result<(), FeatureError> {
        for levels in &self.levels {
            let source = dataset.remove_column(&levels.column)?;

            let unseen = source
                .values
                .iter()
                .filter(|v| !v.is_null() && !levels.known.contains(v))
                .count();
            if unseen > 0 {
                warn!(
                    "'{}': {unseen} values not seen during fit, encoded as all-false",
                    levels.column
                );
            }

            for level in &levels.encoded {
                let flags = source
                    .values
                    .iter()
                    .map(|v| Value::Bool(v == level))
                    .collect();
                dataset.insert_column(Column::new(indicator_name(&levels.column, level), flags))?;
            }
        }
        Ok(())
    }
}

/// Pandas-style dummy name: `Embarked` + `S` → `Embarked_S`.
fn indicator_name(column: &str, level: &Value) -> String {
    format!("{column}_{level}")
}
