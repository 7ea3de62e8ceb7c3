//! Derived metrics and descriptive statistics for the analyzer.

pub mod derive;
pub mod stats;

pub use derive::{DerivedRow, DerivedTable, StarBucket, TOP_LANGUAGE_COUNT, derive, derive_with};
pub use stats::{Histogram, Summary, kernel_density, mean, median, value_counts};
