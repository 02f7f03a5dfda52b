/// Feature layer: derived columns and train-fit transforms.
///
/// ```text
///   Dataset (Name, Sex, Age, ...)
///        │
///        ▼
///   ┌──────────┐
///   │  title    │  extract → normalise → Title column / indicators
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  prepare  │  drop → clip → encode → scale, fit on datasets[0]
///   └──────────┘
///      uses encode::OneHotEncoder, scale::StandardScaler
/// ```

pub mod encode;
pub mod prepare;
pub mod scale;
pub mod title;
