use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use arrow::array::{Array, AsArray};
use arrow::datatypes::{DataType, Float32Type, Float64Type, Int32Type, Int64Type};
use log::{debug, info};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::model::{Column, Dataset, Value};

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Load the raw `train.csv` / `test.csv` pair from a dataset directory.
pub fn load_raw(dataset_dir: &Path) -> Result<(Dataset, Dataset)> {
    let train = load_file(&dataset_dir.join("train.csv"), None)
        .with_context(|| format!("loading train split from {}", dataset_dir.display()))?;
    let test = load_file(&dataset_dir.join("test.csv"), None)
        .with_context(|| format!("loading test split from {}", dataset_dir.display()))?;
    Ok((train, test))
}

/// Load a tabular dataset from a file.  Dispatch by extension.
///
/// `index_col` names the position of a column holding row labels (like
/// `pd.read_csv(..., index_col=0)`); it is moved out of the data columns.
///
/// Supported formats:
/// * `.csv`     – header row, one record per line (recommended)
/// * `.json`    – `[{ "PassengerId": 1, "Name": "...", ... }, ...]`
/// * `.parquet` – flat scalar columns
pub fn load_file(path: &Path, index_col: Option<usize>) -> Result<Dataset> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let columns = match ext.as_str() {
        "csv" => load_csv(path)?,
        "json" => load_json(path)?,
        "parquet" | "pq" => load_parquet(path)?,
        other => bail!("Unsupported file extension: .{other}"),
    };

    let dataset = into_dataset(columns, index_col)
        .with_context(|| format!("building dataset from {}", path.display()))?;
    info!(
        "loaded {} rows x {} columns from {}",
        dataset.len(),
        dataset.columns.len(),
        path.display()
    );
    Ok(dataset)
}

fn into_dataset(mut columns: Vec<Column>, index_col: Option<usize>) -> Result<Dataset> {
    let Some(pos) = index_col else {
        return Ok(Dataset::from_columns(columns)?);
    };
    if pos >= columns.len() {
        bail!("index column {pos} out of range ({} columns)", columns.len());
    }
    let index = columns.remove(pos);
    debug!("using column '{}' as row index", index.name);
    Ok(Dataset::with_index(index.values, columns)?)
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// CSV layout:  header row with column names, one passenger per record.
/// Cell types are guessed per value; empty cells become [`Value::Null`].
fn load_csv(path: &Path) -> Result<Vec<Column>> {
    let mut reader = csv::Reader::from_path(path).context("opening CSV")?;
    let mut columns: Vec<Column> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| Column::new(h, Vec::new()))
        .collect();

    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;
        if record.len() != columns.len() {
            bail!(
                "CSV row {row_no}: expected {} fields, found {}",
                columns.len(),
                record.len()
            );
        }
        for (col, value) in columns.iter_mut().zip(record.iter()) {
            col.values.push(guess_value_type(value));
        }
    }

    Ok(columns)
}

fn guess_value_type(s: &str) -> Value {
    if s.is_empty() {
        return Value::Null;
    }
    if let Ok(i) = s.parse::<i64>() {
        return Value::Integer(i);
    }
    if let Ok(f) = s.parse::<f64>() {
        return if f.is_nan() { Value::Null } else { Value::Float(f) };
    }
    if s == "true" || s == "false" {
        return Value::Bool(s == "true");
    }
    Value::String(s.to_string())
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented, the default `df.to_json(orient='records')`):
///
/// ```json
/// [
///   { "PassengerId": 1, "Survived": 0, "Name": "Braund, Mr. Owen Harris", "Age": 22.0 },
///   ...
/// ]
/// ```
///
/// Keys missing from a record read as null.
fn load_json(path: &Path) -> Result<Vec<Column>> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    let root: JsonValue = serde_json::from_str(&text).context("parsing JSON")?;

    let records = root
        .as_array()
        .context("Expected top-level JSON array")?;

    let mut names: Vec<String> = Vec::new();
    let mut rows: Vec<BTreeMap<String, Value>> = Vec::with_capacity(records.len());

    for (i, rec) in records.iter().enumerate() {
        let obj = rec
            .as_object()
            .with_context(|| format!("Row {i} is not a JSON object"))?;

        let mut row = BTreeMap::new();
        for (key, val) in obj {
            if !names.contains(key) {
                names.push(key.clone());
            }
            row.insert(key.clone(), json_to_value(val));
        }
        rows.push(row);
    }

    Ok(names
        .into_iter()
        .map(|name| {
            let values = rows
                .iter_mut()
                .map(|row| row.remove(&name).unwrap_or(Value::Null))
                .collect();
            Column::new(name, values)
        })
        .collect())
}

fn json_to_value(val: &JsonValue) -> Value {
    match val {
        JsonValue::String(s) => Value::String(s.clone()),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::Integer(i)
            } else if let Some(f) = n.as_f64() {
                Value::Float(f)
            } else {
                Value::String(n.to_string())
            }
        }
        JsonValue::Bool(b) => Value::Bool(*b),
        JsonValue::Null => Value::Null,
        other => Value::String(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file of flat scalar columns (strings, ints, floats, bools).
///
/// Works with files written by both **Pandas** (`df.to_parquet()`) and
/// **Polars** (`df.write_parquet()`).
fn load_parquet(path: &Path) -> Result<Vec<Column>> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)
        .context("reading parquet metadata")?;
    let mut columns: Vec<Column> = builder
        .schema()
        .fields()
        .iter()
        .map(|f| Column::new(f.name().clone(), Vec::new()))
        .collect();
    let reader = builder.build().context("building parquet reader")?;

    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        for (col_idx, column) in columns.iter_mut().enumerate() {
            let array = batch.column(col_idx);
            for row in 0..batch.num_rows() {
                let value = extract_value(array, row)
                    .with_context(|| format!("column '{}', row {row}", column.name))?;
                column.values.push(value);
            }
        }
    }

    Ok(columns)
}

/// Extract a single cell from an Arrow column at a given row.
fn extract_value(col: &Arc<dyn Array>, row: usize) -> Result<Value> {
    if col.is_null(row) {
        return Ok(Value::Null);
    }
    let value = match col.data_type() {
        DataType::Utf8 => Value::String(col.as_string::<i32>().value(row).to_string()),
        DataType::LargeUtf8 => Value::String(col.as_string::<i64>().value(row).to_string()),
        DataType::Int32 => Value::Integer(col.as_primitive::<Int32Type>().value(row) as i64),
        DataType::Int64 => Value::Integer(col.as_primitive::<Int64Type>().value(row)),
        DataType::Float32 => {
            let v = col.as_primitive::<Float32Type>().value(row);
            if v.is_nan() { Value::Null } else { Value::Float(v as f64) }
        }
        DataType::Float64 => {
            let v = col.as_primitive::<Float64Type>().value(row);
            if v.is_nan() { Value::Null } else { Value::Float(v) }
        }
        DataType::Boolean => Value::Bool(col.as_boolean().value(row)),
        other => bail!("unsupported column type {other:?}"),
    };
    Ok(value)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn write_file(dir: &Path, name: &str, contents: &str) -> std::path::PathBuf {
        let path = dir.join(name);
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_guess_value_type() {
        assert_eq!(guess_value_type(""), Value::Null);
        assert_eq!(guess_value_type("3"), Value::Integer(3));
        assert_eq!(guess_value_type("22.5"), Value::Float(22.5));
        assert_eq!(guess_value_type("true"), Value::Bool(true));
        assert_eq!(guess_value_type("S"), Value::String("S".into()));
    }

    #[test]
    fn test_load_csv_with_quoted_names() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            dir.path(),
            "train.csv",
            "PassengerId,Survived,Name,Age\n\
             1,0,\"Braund, Mr. Owen Harris\",22\n\
             2,1,\"Cumings, Mrs. John Bradley\",\n",
        );

        let ds = load_file(&path, None).unwrap();
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.column_names(), vec!["PassengerId", "Survived", "Name", "Age"]);
        let names = &ds.column("Name").unwrap().values;
        assert_eq!(names[0], Value::String("Braund, Mr. Owen Harris".into()));
        assert_eq!(ds.column("Age").unwrap().values[1], Value::Null);
    }

    #[test]
    fn test_load_csv_index_column() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "all.csv", ",Fare,Embarked\n7,7.25,S\n9,71.28,C\n");

        let ds = load_file(&path, Some(0)).unwrap();
        assert_eq!(ds.index, vec![Value::Integer(7), Value::Integer(9)]);
        assert_eq!(ds.column_names(), vec!["Fare", "Embarked"]);
    }

    #[test]
    fn test_load_raw_pair() {
        let dir = tempfile::tempdir().unwrap();
        write_file(dir.path(), "train.csv", "PassengerId,Survived\n1,0\n2,1\n");
        write_file(dir.path(), "test.csv", "PassengerId\n892\n");

        let (train, test) = load_raw(dir.path()).unwrap();
        assert_eq!(train.len(), 2);
        assert_eq!(test.len(), 1);
        assert!(!test.has_column("Survived"));
    }

    #[test]
    fn test_load_raw_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        write_file(dir.path(), "train.csv", "PassengerId\n1\n");
        assert!(load_raw(dir.path()).is_err());
    }

    #[test]
    fn test_load_json_records() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            dir.path(),
            "rows.json",
            r#"[{"Age": 22.0, "Sex": "male"}, {"Sex": "female"}]"#,
        );

        let ds = load_file(&path, None).unwrap();
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.column("Age").unwrap().values, vec![Value::Float(22.0), Value::Null]);
    }

    #[test]
    fn test_load_parquet_scalar_columns() {
        use arrow::array::{Float64Array, StringArray};
        use arrow::datatypes::{Field, Schema};
        use arrow::record_batch::RecordBatch;
        use parquet::arrow::ArrowWriter;

        let schema = Arc::new(Schema::new(vec![
            Field::new("Embarked", DataType::Utf8, true),
            Field::new("Fare", DataType::Float64, false),
        ]));
        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![
                Arc::new(StringArray::from(vec![Some("S"), None])),
                Arc::new(Float64Array::from(vec![7.25, 53.1])),
            ],
        )
        .unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rows.parquet");
        let file = std::fs::File::create(&path).unwrap();
        let mut writer = ArrowWriter::try_new(file, schema, None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();

        let ds = load_file(&path, None).unwrap();
        assert_eq!(ds.column("Embarked").unwrap().values, vec![Value::from("S"), Value::Null]);
        assert_eq!(ds.column("Fare").unwrap().values[1], Value::Float(53.1));
    }

    #[test]
    fn test_load_parquet_float32_nan_is_null() {
        use arrow::array::Float32Array;
        use arrow::datatypes::{Field, Schema};
        use arrow::record_batch::RecordBatch;
        use parquet::arrow::ArrowWriter;

        let schema = Arc::new(Schema::new(vec![Field::new("Age", DataType::Float32, false)]));
        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![Arc::new(Float32Array::from(vec![f32::NAN, 30.0]))],
        )
        .unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ages.parquet");
        let file = std::fs::File::create(&path).unwrap();
        let mut writer = ArrowWriter::try_new(file, schema, None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();

        let ds = load_file(&path, None).unwrap();
        assert_eq!(ds.column("Age").unwrap().values, vec![Value::Null, Value::Float(30.0)]);
    }

    #[test]
    fn test_unsupported_extension() {
        let err = load_file(Path::new("passengers.xlsx"), None).unwrap_err();
        assert!(err.to_string().contains("xlsx"));
    }
}
