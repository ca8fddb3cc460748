//! cluster-maker: simulate clustered data or summarise an existing CSV
//!
//! This is the main entrypoint that orchestrates structure definition,
//! simulation, export and numeric summaries.

use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use cluster_maker::cli::{AnalyseArgs, Command, SimulateArgs};
use cluster_maker::{
    define_dataframe_structure, export, read_csv, simulate_data, summarise_numeric_columns, viz,
    Args,
};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse();
    init_logging(args.verbose);

    match &args.command {
        Command::Simulate(simulate) => run_simulation(simulate, args.verbose),
        Command::Analyse(analyse) => run_analysis(analyse),
    }
}

/// `RUST_LOG` wins; otherwise `info`, or `debug` with `--verbose`
fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// Define the seed table, simulate points and export them
fn run_simulation(args: &SimulateArgs, verbose: bool) -> Result<()> {
    println!("=== Cluster Simulation ===\n");
    let start_time = Instant::now();

    // Step 1: Seed table
    let specs = args.feature_specs().context("reading feature specs")?;
    let seed = define_dataframe_structure(&specs).context("defining seed table")?;
    println!(
        "✓ Seed table: {} clusters × {} features",
        seed.n_clusters(),
        seed.n_features()
    );
    if verbose {
        let seed_table = seed.to_table()?;
        println!("{}", export::format_table(&seed_table, true));
    }

    // Step 2: Simulation
    let config = args.simulation_config();
    if verbose {
        println!("\nSimulating {} points", config.n_points);
        println!("  Cluster std: {}", config.cluster_std);
        match config.random_state {
            Some(state) => println!("  Random state: {}", state),
            None => println!("  Random state: none (nondeterministic)"),
        }
    }

    let sim_start = Instant::now();
    let data = simulate_data(&seed, &config).context("simulating data")?;
    println!("✓ Simulated {} points", data.n_points());
    if verbose {
        println!("  Simulation time: {:.3}s", sim_start.elapsed().as_secs_f64());
    }

    println!("\n=== Cluster Sizes ===");
    for (cluster_id, size) in data.cluster_sizes().into_iter().enumerate() {
        let percentage = size as f64 / data.n_points() as f64 * 100.0;
        println!("Cluster {}: {} points ({:.1}%)", cluster_id, size, percentage);
    }

    // Step 3: Export
    let table = data.to_table()?;
    export::export_to_csv(&table, &args.output, &args.csv_options())
        .with_context(|| format!("exporting CSV to {}", args.output.display()))?;
    println!("\n✓ CSV saved to: {}", args.output.display());

    if let Some(ref text_path) = args.text {
        export::export_formatted_to_path(&table, text_path, args.include_index)
            .with_context(|| format!("exporting text to {}", text_path.display()))?;
        println!("✓ Text table saved to: {}", text_path.display());
    }

    // Step 4: Optional plot of the first two features
    if let Some(ref plot_path) = args.plot {
        match seed.feature_names() {
            [x, y, ..] => {
                viz::create_cluster_visualization(&data, Some(&seed), x, y, plot_path, None)?;
                let sizes_path = viz::sizes_chart_path(plot_path);
                viz::create_cluster_size_chart(&data, &sizes_path)?;
                println!("✓ Plots saved to: {} and {}", plot_path.display(), sizes_path.display());
            }
            _ => tracing::warn!("plotting needs at least two features, skipping"),
        }
    }

    println!("\n=== Simulation Complete ===");
    println!("Total processing time: {:.2}s", start_time.elapsed().as_secs_f64());

    Ok(())
}

/// Load a CSV, summarise its numeric columns and export the summary
fn run_analysis(args: &AnalyseArgs) -> Result<()> {
    println!("=== Numeric Summary ===\n");
    println!("Input file: {}", args.input.display());

    let table = read_csv(&args.input)
        .with_context(|| format!("loading {}", args.input.display()))?;
    println!(
        "✓ File loaded: {} rows, columns {:?}",
        table.n_rows(),
        table.column_names()
    );

    let summary = summarise_numeric_columns(&table).context("computing summary")?;
    println!("\n{}", export::format_table(&summary, true));
    println!("{}", "-".repeat(60));

    std::fs::create_dir_all(&args.output_dir)
        .with_context(|| format!("creating {}", args.output_dir.display()))?;
    let csv_out = args.output_dir.join("summary.csv");
    let text_out = args.output_dir.join("summary.txt");

    export::export_summary(&summary, &csv_out, &text_out).context("exporting summary")?;
    println!("✓ Summary exported to:\n  CSV:  {}\n  Text: {}", csv_out.display(), text_out.display());

    Ok(())
}
