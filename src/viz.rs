//! Visualization of simulated clusters using Plotters

use std::path::Path;

use plotters::prelude::*;

use crate::builder::{SeedTable, SimulatedDataset};
use crate::error::ClusterMakerError;

/// Color palette for the first clusters; later ones fall back to `Palette99`
const CLUSTER_COLORS: [RGBColor; 5] = [RED, BLUE, GREEN, MAGENTA, CYAN];

fn plot_err<E: std::fmt::Display>(err: E) -> ClusterMakerError {
    ClusterMakerError::Plot(err.to_string())
}

pub fn cluster_color(cluster_id: usize) -> RGBAColor {
    CLUSTER_COLORS
        .get(cluster_id)
        .map_or_else(|| Palette99::pick(cluster_id).to_rgba(), |color| color.to_rgba())
}

/// Plot range covering `values` with 5% padding on each side
pub fn padded_bounds(values: impl IntoIterator<Item = f64>) -> (f64, f64) {
    let (min, max) = values
        .into_iter()
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));

    if min > max {
        return (-1.0, 1.0);
    }
    let padding = ((max - min) * 0.05).max(0.5);
    (min - padding, max + padding)
}

/// Scatter plot of two features, colored by ground-truth cluster
///
/// # Arguments
/// * `data` - Simulated points
/// * `seed` - Centres to mark on the plot, if available
/// * `x_feature`, `y_feature` - Feature names for the two axes
/// * `output_path` - Path to save the PNG plot
/// * `plot_title` - Title for the plot
pub fn create_cluster_visualization(
    data: &SimulatedDataset,
    seed: Option<&SeedTable>,
    x_feature: &str,
    y_feature: &str,
    output_path: &Path,
    plot_title: Option<&str>,
) -> crate::Result<()> {
    let xs = data
        .feature(x_feature)
        .ok_or_else(|| ClusterMakerError::usage(format!("unknown feature '{}'", x_feature)))?;
    let ys = data
        .feature(y_feature)
        .ok_or_else(|| ClusterMakerError::usage(format!("unknown feature '{}'", y_feature)))?;

    let (x_min, x_max) = padded_bounds(xs.iter().copied());
    let (y_min, y_max) = padded_bounds(ys.iter().copied());
    let title = plot_title.unwrap_or("Simulated clusters (colored by true cluster)");

    let root = BitMapBackend::new(output_path, (800, 600)).into_drawing_area();
    root.fill(&WHITE).map_err(plot_err)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 30))
        .margin(10)
        .x_label_area_size(50)
        .y_label_area_size(60)
        .build_cartesian_2d(x_min..x_max, y_min..y_max)
        .map_err(plot_err)?;

    chart
        .configure_mesh()
        .x_desc(x_feature)
        .y_desc(y_feature)
        .axis_desc_style(("sans-serif", 15))
        .draw()
        .map_err(plot_err)?;

    let labels = data.true_cluster();
    for cluster_id in 0..data.n_clusters() {
        let color = cluster_color(cluster_id);
        let points = xs
            .iter()
            .zip(ys.iter())
            .zip(labels.iter())
            .filter(|(_, label)| **label == cluster_id)
            .map(|((&x, &y), _)| Circle::new((x, y), 3, color.filled()));

        chart
            .draw_series(points)
            .map_err(plot_err)?
            .label(format!("Cluster {}", cluster_id))
            .legend(move |(x, y)| Circle::new((x + 5, y), 4, color.filled()));
    }

    if let Some(seed) = seed {
        if let (Some(cx), Some(cy)) = (seed.feature(x_feature), seed.feature(y_feature)) {
            let half_w = (x_max - x_min) * 0.01;
            let half_h = (y_max - y_min) * 0.01;
            chart
                .draw_series(cx.iter().zip(cy.iter()).map(|(&x, &y)| {
                    Rectangle::new(
                        [(x - half_w, y - half_h), (x + half_w, y + half_h)],
                        BLACK.filled(),
                    )
                }))
                .map_err(plot_err)?
                .label("Centres")
                .legend(|(x, y)| Rectangle::new([(x, y - 4), (x + 8, y + 4)], BLACK.filled()));
        }
    }

    chart
        .configure_series_labels()
        .border_style(BLACK)
        .background_style(WHITE.mix(0.8))
        .draw()
        .map_err(plot_err)?;

    root.present().map_err(plot_err)?;
    tracing::info!(path = %output_path.display(), "cluster plot saved");

    Ok(())
}

/// Bar chart of the number of points generated per cluster
pub fn create_cluster_size_chart(data: &SimulatedDataset, output_path: &Path) -> crate::Result<()> {
    let cluster_sizes = data.cluster_sizes();
    let max_size = cluster_sizes.iter().copied().max().unwrap_or(1).max(1) as f64;

    let root = BitMapBackend::new(output_path, (600, 400)).into_drawing_area();
    root.fill(&WHITE).map_err(plot_err)?;

    let mut chart = ChartBuilder::on(&root)
        .caption("Cluster Sizes", ("sans-serif", 30))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d(-0.5f64..(data.n_clusters() as f64 - 0.5), 0f64..(max_size * 1.1))
        .map_err(plot_err)?;

    chart
        .configure_mesh()
        .x_desc("Cluster ID")
        .y_desc("Number of points")
        .axis_desc_style(("sans-serif", 15))
        .draw()
        .map_err(plot_err)?;

    chart
        .draw_series(cluster_sizes.iter().enumerate().map(|(cluster_id, &size)| {
            Rectangle::new(
                [
                    (cluster_id as f64 - 0.4, 0.0),
                    (cluster_id as f64 + 0.4, size as f64),
                ],
                cluster_color(cluster_id).filled(),
            )
        }))
        .map_err(plot_err)?;

    root.present().map_err(plot_err)?;
    tracing::info!(path = %output_path.display(), "cluster size chart saved");

    Ok(())
}

/// Path for the size chart that accompanies a scatter plot: `plot.png` -> `plot_sizes.png`
pub fn sizes_chart_path(plot_path: &Path) -> std::path::PathBuf {
    let stem = plot_path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "clusters".to_string());
    plot_path.with_file_name(format!("{}_sizes.png", stem))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{define_dataframe_structure, simulate_data, FeatureSpec, SimulationConfig};
    use tempfile::tempdir;

    fn create_test_data() -> (SeedTable, SimulatedDataset) {
        let seed = define_dataframe_structure(&[
            FeatureSpec::new("x", vec![0.0, 5.0, -5.0]),
            FeatureSpec::new("y", vec![0.0, 5.0, 5.0]),
        ])
        .unwrap();
        let data = simulate_data(&seed, &SimulationConfig::default().n_points(60).random_state(Some(7)))
            .unwrap();
        (seed, data)
    }

    #[test]
    fn test_padded_bounds() {
        let (lo, hi) = padded_bounds([0.0, 10.0]);
        assert!((lo + 0.5).abs() < 1e-12);
        assert!((hi - 10.5).abs() < 1e-12);

        assert_eq!(padded_bounds(std::iter::empty()), (-1.0, 1.0));
        assert_eq!(padded_bounds([2.0]), (1.5, 2.5));
    }

    #[test]
    fn test_cluster_colors_are_distinct_for_palette() {
        assert_eq!(cluster_color(0).rgb(), RED.rgb());
        assert_ne!(cluster_color(0).rgb(), cluster_color(1).rgb());
        assert_eq!(cluster_color(7).rgb(), Palette99::pick(7).rgb());
    }

    #[test]
    fn test_sizes_chart_path() {
        assert_eq!(
            sizes_chart_path(Path::new("out/plot.png")),
            Path::new("out/plot_sizes.png")
        );
    }

    #[test]
    fn test_unknown_feature_is_rejected() {
        let (seed, data) = create_test_data();
        let temp_dir = tempdir().unwrap();
        let output_path = temp_dir.path().join("never.png");

        let result = create_cluster_visualization(&data, Some(&seed), "x", "z", &output_path, None);
        assert!(matches!(result, Err(ClusterMakerError::Usage(_))));
        assert!(!output_path.exists());
    }

    #[test]
    #[ignore = "requires system fonts"]
    fn test_create_cluster_visualization() {
        let (seed, data) = create_test_data();
        let temp_dir = tempdir().unwrap();
        let output_path = temp_dir.path().join("test_plot.png");

        create_cluster_visualization(&data, Some(&seed), "x", "y", &output_path, None).unwrap();
        assert!(output_path.exists());
    }

    #[test]
    #[ignore = "requires system fonts"]
    fn test_create_cluster_size_chart() {
        let (_seed, data) = create_test_data();
        let temp_dir = tempdir().unwrap();
        let output_path = temp_dir.path().join("test_sizes.png");

        create_cluster_size_chart(&data, &output_path).unwrap();
        assert!(output_path.exists());
    }
}
