use std::fmt;
use std::sync::LazyLock;

use log::debug;
use regex::Regex;

use crate::data::model::{Column, Dataset, Value};
use crate::error::FeatureError;

/// `"<Surname>, <Title>. <Given names>"` → `<Title>`.
static TITLE_PATTERN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r",\s?(\w*).").ok());

/// Age at which the adult titles apply.
const ADULT_AGE: f64 = 18.0;

// ---------------------------------------------------------------------------
// Title
// ---------------------------------------------------------------------------

/// Canonical passenger title. Variant order is the sorted category order,
/// so `Master` is the reference level dropped by the encoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Title {
    Master,
    Miss,
    Mr,
    Mrs,
}

impl Title {
    pub const ALL: [Title; 4] = [Title::Master, Title::Miss, Title::Mr, Title::Mrs];

    pub fn as_str(self) -> &'static str {
        match self {
            Title::Master => "Master",
            Title::Miss => "Miss",
            Title::Mr => "Mr",
            Title::Mrs => "Mrs",
        }
    }

    pub fn parse(s: &str) -> Option<Title> {
        Title::ALL.into_iter().find(|t| t.as_str() == s)
    }
}

impl fmt::Display for Title {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sex {
    Male,
    Female,
}

impl Sex {
    pub fn parse(s: &str) -> Option<Sex> {
        match s {
            "male" => Some(Sex::Male),
            "female" => Some(Sex::Female),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Extraction and normalisation
// ---------------------------------------------------------------------------

/// Raw title token following the first comma of a name, if the name has one.
pub fn extract_title(name: &str) -> Option<&str> {
    TITLE_PATTERN
        .as_ref()?
        .captures(name)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}

/// Map a raw title onto one of the four canonical titles.
///
/// Sex decides the pair ({Mr, Master} or {Mrs, Miss}); a raw title outside the
/// pair becomes the adult title. A known age then overrides the raw title
/// entirely. Without an age the corrected raw title stands. Without a sex
/// only an already-canonical raw title survives. A NaN age counts as missing.
pub fn normalize_title(raw: Option<&str>, sex: Option<Sex>, age: Option<f64>) -> Option<Title> {
    let raw = raw.and_then(Title::parse);
    let age = age.filter(|a| !a.is_nan());
    let Some(sex) = sex else {
        return raw;
    };

    let (adult, minor) = match sex {
        Sex::Male => (Title::Mr, Title::Master),
        Sex::Female => (Title::Mrs, Title::Miss),
    };

    match age {
        Some(age) if age >= ADULT_AGE => Some(adult),
        Some(_) => Some(minor),
        None => match raw {
            Some(t) if t == adult || t == minor => Some(t),
            _ => Some(adult),
        },
    }
}

// ---------------------------------------------------------------------------
// Dataset operations
// ---------------------------------------------------------------------------

/// Derive the `Title` column from `Name`, `Sex` and `Age`, writing it into the dataset.
pub fn derive_titles(dataset: &mut Dataset) -> Result<(), FeatureError> {
    let names = &dataset.column("Name")?.values;
    let sexes = &dataset.column("Sex")?.values;
    let ages = &dataset.column("Age")?.values;

    let mut unmatched = 0usize;
    let titles: Vec<Value> = names
        .iter()
        .zip(sexes)
        .zip(ages)
        .map(|((name, sex), age)| {
            let raw = name.as_str().and_then(extract_title);
            if raw.is_none() {
                unmatched += 1;
            }
            let sex = sex.as_str().and_then(Sex::parse);
            normalize_title(raw, sex, age.as_f64())
                .map_or(Value::Null, |t| Value::String(t.as_str().to_string()))
        })
        .collect();

    if unmatched > 0 {
        debug!("{unmatched} names did not match the title pattern");
    }
    dataset.insert_column(Column::new("Title", titles))
}

/// Derive titles and return their indicator columns (`Miss`, `Mr`, `Mrs`).
///
/// `Master` is the reference level: a row with none of the three set is a
/// `Master` (or has no title at all). The indicator table is returned on its
/// own, sharing the input's index; merging it back is up to the caller.
pub fn encode_titles(dataset: &mut Dataset) -> Result<Dataset, FeatureError> {
    derive_titles(dataset)?;
    let titles = &dataset.column("Title")?.values;

    let columns = Title::ALL[1..]
        .iter()
        .map(|t| {
            let flags = titles
                .iter()
                .map(|v| Value::Bool(v.as_str() == Some(t.as_str())))
                .collect();
            Column::new(t.as_str(), flags)
        })
        .collect();

    Dataset::with_index(dataset.index.clone(), columns)
}
