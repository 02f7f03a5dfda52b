mod config;
mod data;
mod error;
mod features;

use std::path::Path;

use anyhow::{Context, Result};
use log::{info, warn};

use config::Settings;
use data::loader::{load_file, load_raw};
use data::model::{Dataset, Value};
use features::prepare::prepare_datasets;
use features::title::{derive_titles, encode_titles};

const SETTINGS_FILE: &str = "titanic-features.json";

fn main() -> Result<()> {
    env_logger::init();

    let settings = Settings::load(Path::new(SETTINGS_FILE))?;
    let combined_path = settings.combined_path();

    if !combined_path.exists() {
        warn!(
            "{} not found, summarising raw titles only",
            combined_path.display()
        );
        return summarise_raw_titles(&settings);
    }

    let mut combined = load_file(&combined_path, Some(0))?;
    if !combined.has_column("Title") && combined.has_column("Name") {
        derive_titles(&mut combined).context("deriving titles")?;
    }

    let datasets = match settings.split_column() {
        Some(target) => {
            let (train, test) = combined
                .split_by_null(target)
                .with_context(|| format!("splitting on '{target}'"))?;
            info!("split {} train / {} test rows", train.len(), test.len());
            vec![train, test]
        }
        None => vec![combined],
    };

    let prepared = prepare_datasets(datasets, &settings.prepare_options())?;
    for (name, ds) in ["train", "test"].iter().zip(&prepared) {
        println!("{name}: {} rows x {} columns", ds.len(), ds.columns.len());
        println!("  {}", ds.column_names().join(", "));
    }

    Ok(())
}

/// Load the raw Kaggle split and report how many passengers carry each title.
fn summarise_raw_titles(settings: &Settings) -> Result<()> {
    let (mut train, mut test) = load_raw(&settings.dataset_dir())?;

    for (name, ds) in [("train", &mut train), ("test", &mut test)] {
        let indicators = encode_titles(ds).with_context(|| format!("encoding {name} titles"))?;
        let counts: Vec<String> = indicators
            .columns
            .iter()
            .map(|c| format!("{}={}", c.name, count_set(&indicators, &c.name)))
            .collect();
        let flagged = (0..indicators.len())
            .filter(|&r| row_has_flag(&indicators, r))
            .count();
        let reference = ds.len() - flagged;
        println!("{name}: {} (Master/none={reference})", counts.join(" "));
    }

    Ok(())
}

fn count_set(ds: &Dataset, column: &str) -> usize {
    ds.column(column)
        .map(|c| c.values.iter().filter(|v| **v == Value::Bool(true)).count())
        .unwrap_or(0)
}

fn row_has_flag(ds: &Dataset, row: usize) -> bool {
    ds.columns.iter().any(|c| c.values[row] == Value::Bool(true))
}
