//! Command-line interface definitions and argument parsing

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::builder::{parse_column_specs, parse_feature_arg, FeatureSpec, SimulationConfig};
use crate::error::ClusterMakerError;
use crate::export::CsvOptions;

/// Synthetic clustered data generator with summary statistics and export
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Simulate Gaussian clusters around user-defined centres and export them
    Simulate(SimulateArgs),
    /// Summarise the numeric columns of a CSV file and export the summary
    Analyse(AnalyseArgs),
}

#[derive(clap::Args, Debug)]
pub struct SimulateArgs {
    /// Feature centres as name=v1,v2,... with one value per cluster (repeatable)
    /// Example: --feature x=0,5,-5 --feature y=0,5,-5
    #[arg(short, long = "feature", value_name = "NAME=V1,V2,..")]
    pub features: Vec<String>,

    /// JSON file holding a list of {"name": ..., "reps": [...]} objects
    #[arg(long, conflicts_with = "features")]
    pub specs: Option<PathBuf>,

    /// Total number of points to simulate
    #[arg(short, long, default_value = "100")]
    pub n_points: usize,

    /// Standard deviation of the Gaussian noise around each centre
    #[arg(long, default_value = "1.0")]
    pub cluster_std: f64,

    /// Random seed for reproducible output
    #[arg(short, long)]
    pub seed: Option<u64>,

    /// Output path for the simulated CSV
    #[arg(short, long, default_value = "simulated.csv")]
    pub output: PathBuf,

    /// CSV field delimiter
    #[arg(short, long, default_value = ",")]
    pub delimiter: char,

    /// Write the row index as the first CSV column
    #[arg(long)]
    pub include_index: bool,

    /// Also write a fixed-width text rendering to this path
    #[arg(long)]
    pub text: Option<PathBuf>,

    /// Also plot the first two features to this PNG path
    #[arg(long)]
    pub plot: Option<PathBuf>,
}

impl SimulateArgs {
    /// Collect feature specs from `--specs` or the repeated `--feature` values
    pub fn feature_specs(&self) -> crate::Result<Vec<FeatureSpec>> {
        if let Some(ref path) = self.specs {
            if !path.is_file() {
                return Err(ClusterMakerError::FileNotFound(path.clone()));
            }
            let value: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(path)?)?;
            return parse_column_specs(&value);
        }

        if self.features.is_empty() {
            return Err(ClusterMakerError::usage(
                "provide at least one --feature or a --specs file",
            ));
        }
        self.features.iter().map(|arg| parse_feature_arg(arg)).collect()
    }

    pub fn simulation_config(&self) -> SimulationConfig {
        SimulationConfig::default()
            .n_points(self.n_points)
            .cluster_std(self.cluster_std)
            .random_state(self.seed)
    }

    pub fn csv_options(&self) -> CsvOptions {
        CsvOptions {
            delimiter: self.delimiter,
            include_index: self.include_index,
        }
    }
}

#[derive(clap::Args, Debug)]
pub struct AnalyseArgs {
    /// Path to the input CSV file
    pub input: PathBuf,

    /// Directory for summary.csv and summary.txt (created if missing)
    #[arg(short, long, default_value = "demo_output")]
    pub output_dir: PathBuf,
}
