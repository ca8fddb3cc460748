//! cluster-maker: synthetic clustered data for teaching and testing
//!
//! This library builds seed tables of cluster centres, simulates Gaussian
//! points around them with known ground-truth labels, summarises tabular data
//! and exports tables to CSV and fixed-width text.

pub mod builder;
pub mod cli;
pub mod data;
pub mod error;
pub mod export;
pub mod stats;
pub mod viz;

// Re-export public items for easier access
pub use builder::{
    allocate_points, define_dataframe_structure, parse_column_specs, simulate_data, FeatureSpec,
    SeedTable, SimulatedDataset, SimulationConfig,
};
pub use cli::Args;
pub use data::{read_csv, Column, RowIndex, Table};
pub use error::ClusterMakerError;
pub use export::{export_formatted, export_summary, export_to_csv, CsvOptions};
pub use stats::{correlation, describe, summarise_numeric_columns};

/// Common result type used throughout the library
pub type Result<T> = std::result::Result<T, ClusterMakerError>;
