use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{ArrayRef, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    fn below(&mut self, n: usize) -> usize {
        (self.next_f64() * n as f64) as usize % n
    }

    /// Weighted pick: `weights` need not sum to one.
    fn pick<'a, T>(&mut self, items: &'a [(T, f64)]) -> &'a T {
        let total: f64 = items.iter().map(|(_, w)| w).sum();
        let mut r = self.next_f64() * total;
        for (item, w) in items {
            if r < *w {
                return item;
            }
            r -= w;
        }
        &items[items.len() - 1].0
    }
}

/// One synthetic passenger, shaped like a row of `all_data_clean.csv`.
struct Passenger {
    id: i64,
    survived: Option<i64>,
    pclass: i64,
    name: String,
    sex: &'static str,
    age: Option<f64>,
    sib_sp: i64,
    parch: i64,
    fare: f64,
    embarked: Option<&'static str>,
}

const SURNAMES: [&str; 8] = [
    "Braund", "Cumings", "Heikkinen", "Futrelle", "Allen", "Moran", "McCarthy", "Palsson",
];
const GIVEN: [&str; 6] = ["John", "Mary", "William", "Anna", "Thomas", "Elizabeth"];

fn generate_passenger(id: i64, is_train: bool, rng: &mut SimpleRng) -> Passenger {
    let sex = *rng.pick(&[("male", 0.64), ("female", 0.36)]);
    let age = if rng.next_f64() < 0.2 {
        None
    } else {
        Some((rng.next_f64() * 75.0 + 0.5).round())
    };

    // Raw titles include a few rare ones so the normaliser has work to do.
    let title = match (sex, age) {
        (_, _) if rng.next_f64() < 0.05 => *rng.pick(&[("Dr", 1.0), ("Rev", 1.0), ("Col", 0.5)]),
        ("male", Some(a)) if a < 18.0 => "Master",
        ("male", _) => "Mr",
        (_, Some(a)) if a < 18.0 => "Miss",
        _ => *rng.pick(&[("Mrs", 0.6), ("Miss", 0.4)]),
    };
    let name = format!(
        "{}, {title}. {}",
        SURNAMES[rng.below(SURNAMES.len())],
        GIVEN[rng.below(GIVEN.len())]
    );

    let pclass = *rng.pick(&[(1i64, 0.24), (2, 0.21), (3, 0.55)]);
    let fare = match pclass {
        1 => 30.0 + rng.next_f64() * 200.0,
        2 => 10.0 + rng.next_f64() * 30.0,
        _ => 7.0 + rng.next_f64() * 15.0,
    };
    let fare = (fare * 100.0).round() / 100.0;

    let survived = is_train.then(|| {
        let p = if sex == "female" { 0.74 } else { 0.19 };
        i64::from(rng.next_f64() < p)
    });

    Passenger {
        id,
        survived,
        pclass,
        name,
        sex,
        age,
        sib_sp: *rng.pick(&[(0i64, 0.68), (1, 0.23), (2, 0.03), (3, 0.02), (4, 0.02), (8, 0.02)]),
        parch: *rng.pick(&[(0i64, 0.76), (1, 0.13), (2, 0.09), (5, 0.02)]),
        fare,
        embarked: *rng.pick(&[(Some("S"), 0.72), (Some("C"), 0.19), (Some("Q"), 0.08), (None, 0.01)]),
    }
}

fn write_csv(path: &str, passengers: &[Passenger]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).context("creating CSV")?;
    writer.write_record([
        "", "Survived", "Pclass", "Name", "Sex", "Age", "SibSp", "Parch", "Fare", "Embarked",
    ])?;
    for p in passengers {
        writer.write_record([
            p.id.to_string(),
            p.survived.map(|s| s.to_string()).unwrap_or_default(),
            p.pclass.to_string(),
            p.name.clone(),
            p.sex.to_string(),
            p.age.map(|a| a.to_string()).unwrap_or_default(),
            p.sib_sp.to_string(),
            p.parch.to_string(),
            p.fare.to_string(),
            p.embarked.unwrap_or_default().to_string(),
        ])?;
    }
    writer.flush().context("flushing CSV")?;
    Ok(())
}

fn write_parquet(path: &str, passengers: &[Passenger]) -> Result<()> {
    let schema = Arc::new(Schema::new(vec![
        Field::new("PassengerId", DataType::Int64, false),
        Field::new("Survived", DataType::Int64, true),
        Field::new("Pclass", DataType::Int64, false),
        Field::new("Name", DataType::Utf8, false),
        Field::new("Sex", DataType::Utf8, false),
        Field::new("Age", DataType::Float64, true),
        Field::new("SibSp", DataType::Int64, false),
        Field::new("Parch", DataType::Int64, false),
        Field::new("Fare", DataType::Float64, false),
        Field::new("Embarked", DataType::Utf8, true),
    ]));

    let columns: Vec<ArrayRef> = vec![
        Arc::new(Int64Array::from_iter_values(passengers.iter().map(|p| p.id))),
        Arc::new(passengers.iter().map(|p| p.survived).collect::<Int64Array>()),
        Arc::new(Int64Array::from_iter_values(passengers.iter().map(|p| p.pclass))),
        Arc::new(StringArray::from_iter_values(passengers.iter().map(|p| p.name.as_str()))),
        Arc::new(StringArray::from_iter_values(passengers.iter().map(|p| p.sex))),
        Arc::new(passengers.iter().map(|p| p.age).collect::<Float64Array>()),
        Arc::new(Int64Array::from_iter_values(passengers.iter().map(|p| p.sib_sp))),
        Arc::new(Int64Array::from_iter_values(passengers.iter().map(|p| p.parch))),
        Arc::new(Float64Array::from_iter_values(passengers.iter().map(|p| p.fare))),
        Arc::new(passengers.iter().map(|p| p.embarked).collect::<StringArray>()),
    ];

    let batch = RecordBatch::try_new(schema.clone(), columns).context("building record batch")?;
    let file = std::fs::File::create(path).context("creating parquet file")?;
    let mut writer = ArrowWriter::try_new(file, schema, None)?;
    writer.write(&batch)?;
    writer.close()?;
    Ok(())
}

fn main() -> Result<()> {
    let mut rng = SimpleRng::new(42);

    // 891 labelled rows followed by 418 unlabelled ones, like the Kaggle split.
    let passengers: Vec<Passenger> = (0..1309)
        .map(|i| generate_passenger(i + 1, i < 891, &mut rng))
        .collect();

    write_csv("sample_all_data_clean.csv", &passengers)?;
    write_parquet("sample_all_data_clean.parquet", &passengers)?;

    println!(
        "Wrote {} passengers to sample_all_data_clean.csv / .parquet",
        passengers.len()
    );
    Ok(())
}
