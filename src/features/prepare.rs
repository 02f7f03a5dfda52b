use log::{debug, info};
use serde::Deserialize;

use super::encode::OneHotEncoder;
use super::scale::StandardScaler;
use crate::data::model::{Dataset, Value};
use crate::error::FeatureError;

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// Cap a count column at `upper`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ClipRule {
    pub column: String,
    pub upper: f64,
}

impl ClipRule {
    pub fn new(column: &str, upper: f64) -> Self {
        ClipRule {
            column: column.to_string(),
            upper,
        }
    }
}

/// Which columns get clipped and which get one-hot encoded.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct FeatureLayout {
    pub clips: Vec<ClipRule>,
    pub categorical: Vec<String>,
}

impl Default for FeatureLayout {
    fn default() -> Self {
        Self {
            clips: vec![ClipRule::new("SibSp", 3.0), ClipRule::new("Parch", 2.0)],
            categorical: vec!["Title".to_string(), "Embarked".to_string()],
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PrepareOptions {
    pub scale: bool,
    /// Columns removed before anything else.
    pub drop: Option<Vec<String>>,
    /// Label columns, never scaled.
    pub target: Option<Vec<String>>,
    pub layout: FeatureLayout,
}

impl Default for PrepareOptions {
    fn default() -> Self {
        Self {
            scale: true,
            drop: None,
            target: None,
            layout: FeatureLayout::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Preparation
// ---------------------------------------------------------------------------

/// Turn cleaned passenger tables into model-ready feature tables.
///
/// `datasets[0]` is the training set: the one-hot categories and the scaler
/// are fit on it and replayed unchanged on every later dataset, so all
/// outputs share one column layout. Output order matches input order.
pub fn prepare_datasets(
    datasets: Vec<Dataset>,
    options: &PrepareOptions,
) -> Result<Vec<Dataset>, FeatureError> {
    let mut encoder: Option<OneHotEncoder> = None;
    let mut scaler: Option<StandardScaler> = None;
    let mut out = Vec::with_capacity(datasets.len());

    for (i, mut ds) in datasets.into_iter().enumerate() {
        if let Some(drop) = &options.drop {
            ds.drop_columns(drop.as_slice())?;
        }

        for rule in &options.layout.clips {
            clip_upper(&mut ds, &rule.column, rule.upper)?;
        }

        let enc = match encoder.take() {
            Some(enc) => enc,
            None => {
                let enc = OneHotEncoder::fit(&ds, options.layout.categorical.as_slice(), true)?;
                debug!("indicator columns: {:?}", enc.output_columns());
                enc
            }
        };
        enc.transform(&mut ds)?;
        encoder = Some(enc);

        if options.scale {
            let sc = match scaler.take() {
                Some(sc) => sc,
                None => {
                    let columns = scale_columns(&ds, options.target.as_deref());
                    debug!("fitting scaler on {} columns", columns.len());
                    StandardScaler::fit(&ds, columns.as_slice())?
                }
            };
            sc.transform(&mut ds)?;
            scaler = Some(sc);
        }

        info!("prepared dataset {i}: {} rows x {} columns", ds.len(), ds.columns.len());
        out.push(ds);
    }

    Ok(out)
}

/// Every column except the targets. No targets means nothing is excluded.
fn scale_columns<'a>(ds: &'a Dataset, target: Option<&[String]>) -> Vec<&'a str> {
    let target = target.unwrap_or_default();
    ds.column_names()
        .into_iter()
        .filter(|c| !target.iter().any(|t| t == c))
        .collect()
}

/// Cap a numeric column in place. Nulls and text cells are left alone.
///
/// Integer cells stay integers, so a fractional cap is floored for them
/// (`upper = 2.5` turns `4` into `2`); float cells clip to `upper` exactly.
pub fn clip_upper(ds: &mut Dataset, column: &str, upper: f64) -> Result<(), FeatureError> {
    let col = ds.column_mut(column)?;
    let mut clipped = 0usize;
    for v in &mut col.values {
        match *v {
            Value::Integer(i) if (i as f64) > upper => {
                *v = Value::Integer(upper.floor() as i64);
                clipped += 1;
            }
            Value::Float(f) if f > upper => {
                *v = Value::Float(upper);
                clipped += 1;
            }
            _ => {}
        }
    }
    debug!("'{column}': clipped {clipped} values to {upper}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::Column;

    fn passengers(rows: &[(Option<i64>, i64, i64, &str, &str, f64)]) -> Dataset {
        Dataset::from_columns(vec![
            Column::new("Survived", rows.iter().map(|r| Value::from(r.0)).collect()),
            Column::new("SibSp", rows.iter().map(|r| Value::Integer(r.1)).collect()),
            Column::new("Parch", rows.iter().map(|r| Value::Integer(r.2)).collect()),
            Column::new("Title", rows.iter().map(|r| Value::from(r.3)).collect()),
            Column::new("Embarked", rows.iter().map(|r| Value::from(r.4)).collect()),
            Column::new("Fare", rows.iter().map(|r| Value::Float(r.5)).collect()),
        ])
        .unwrap()
    }

    fn train() -> Dataset {
        passengers(&[
            (Some(0), 1, 0, "Mr", "S", 7.25),
            (Some(1), 1, 0, "Mrs", "C", 71.28),
            (Some(1), 0, 0, "Miss", "S", 7.92),
            (Some(0), 10, 10, "Master", "Q", 21.07),
            (Some(1), 0, 1, "Mrs", "S", 53.1),
        ])
    }

    fn test_split() -> Dataset {
        let mut ds = passengers(&[
            (None, 0, 0, "Mr", "Q", 7.83),
            (None, 4, 5, "Mrs", "S", 7.0),
        ]);
        ds.remove_column("Survived").unwrap();
        ds
    }

    fn no_scale() -> PrepareOptions {
        PrepareOptions {
            scale: false,
            ..Default::default()
        }
    }

    #[test]
    fn test_clip_counts() {
        let out = prepare_datasets(vec![train()], &no_scale()).unwrap();
        let sibsp = &out[0].column("SibSp").unwrap().values;
        let parch = &out[0].column("Parch").unwrap().values;
        assert_eq!(sibsp[3], Value::Integer(3));
        assert_eq!(parch[3], Value::Integer(2));
        // Below the caps nothing changes.
        assert_eq!(sibsp[0], Value::Integer(1));
        assert_eq!(parch[4], Value::Integer(1));
    }

    #[test]
    fn test_clip_float_and_null() {
        let mut ds = Dataset::from_columns(vec![Column::new(
            "SibSp",
            vec![Value::Float(5.5), Value::Null, Value::Float(2.0)],
        )])
        .unwrap();
        clip_upper(&mut ds, "SibSp", 3.0).unwrap();
        assert_eq!(
            ds.column("SibSp").unwrap().values,
            vec![Value::Float(3.0), Value::Null, Value::Float(2.0)]
        );
    }

    #[test]
    fn test_clip_fractional_cap_floors_integers() {
        let mut ds = Dataset::from_columns(vec![Column::new(
            "Parch",
            vec![Value::Integer(4), Value::Integer(2), Value::Float(4.0)],
        )])
        .unwrap();
        clip_upper(&mut ds, "Parch", 2.5).unwrap();
        assert_eq!(
            ds.column("Parch").unwrap().values,
            vec![Value::Integer(2), Value::Integer(2), Value::Float(2.5)]
        );
    }

    #[test]
    fn test_one_hot_layout_matches_across_splits() {
        let out = prepare_datasets(vec![train(), test_split()], &no_scale()).unwrap();
        let expected_tail = [
            "Title_Miss",
            "Title_Mr",
            "Title_Mrs",
            "Embarked_Q",
            "Embarked_S",
        ];
        assert!(out[0].column_names().ends_with(&expected_tail));
        assert!(out[1].column_names().ends_with(&expected_tail));
        assert!(!out[1].has_column("Title"));
        // Test split has no "Miss" row but still gets the column.
        assert!(out[1]
            .column("Title_Miss")
            .unwrap()
            .values
            .iter()
            .all(|v| *v == Value::Bool(false)));
    }

    #[test]
    fn test_scaler_fit_on_train_only() {
        let options = PrepareOptions {
            target: Some(vec!["Survived".to_string()]),
            ..Default::default()
        };
        let out = prepare_datasets(vec![train(), test_split()], &options).unwrap();

        // Target untouched on the training split.
        assert_eq!(
            out[0].column("Survived").unwrap().values,
            train().column("Survived").unwrap().values
        );

        // Training split standardised.
        let fares: Vec<f64> = out[0]
            .column("Fare")
            .unwrap()
            .values
            .iter()
            .filter_map(Value::as_f64)
            .collect();
        let mean = fares.iter().sum::<f64>() / fares.len() as f64;
        assert!(mean.abs() < 1e-9);

        // Test split uses the training statistics.
        let train_fares = [7.25, 71.28, 7.92, 21.07, 53.1];
        let m = train_fares.iter().sum::<f64>() / 5.0;
        let sd = (train_fares.iter().map(|f| (f - m).powi(2)).sum::<f64>() / 5.0).sqrt();
        let got = out[1].column("Fare").unwrap().values[0].as_f64().unwrap();
        assert!((got - (7.83 - m) / sd).abs() < 1e-9);
    }

    #[test]
    fn test_missing_target_scales_everything() {
        let out = prepare_datasets(vec![train()], &PrepareOptions::default()).unwrap();
        let survived = &out[0].column("Survived").unwrap().values;
        assert!(survived.iter().all(|v| matches!(v, Value::Float(_))));
    }

    #[test]
    fn test_drop_columns_first() {
        let options = PrepareOptions {
            drop: Some(vec!["Fare".to_string()]),
            ..no_scale()
        };
        let out = prepare_datasets(vec![train()], &options).unwrap();
        assert!(!out[0].has_column("Fare"));

        let options = PrepareOptions {
            drop: Some(vec!["Cabin".to_string()]),
            ..no_scale()
        };
        assert!(prepare_datasets(vec![train()], &options).is_err());
    }

    #[test]
    fn test_empty_input() {
        assert!(prepare_datasets(Vec::new(), &PrepareOptions::default())
            .unwrap()
            .is_empty());
    }
}
