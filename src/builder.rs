//! Seed tables of cluster centres and Gaussian simulation around them

use std::collections::HashSet;

use ndarray::{s, Array1, Array2, ArrayView1, ArrayView2};
use ndarray_rand::rand_distr::Normal;
use ndarray_rand::RandomExt;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Deserialize;
use serde_json::Value;

use crate::data::{Column, RowIndex, Table};
use crate::error::ClusterMakerError;

/// Name of the row axis of a seed table
pub const CLUSTER_ID: &str = "cluster_id";

/// Name of the label column appended to simulated data
pub const TRUE_CLUSTER: &str = "true_cluster";

/// One feature: its name and one representative value per cluster
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureSpec {
    pub name: String,
    pub reps: Vec<f64>,
}

impl FeatureSpec {
    pub fn new(name: impl Into<String>, reps: Vec<f64>) -> Self {
        Self {
            name: name.into(),
            reps,
        }
    }
}

/// Spec entry as it arrives from JSON, before presence and type checks
#[derive(Debug, Deserialize)]
struct RawFeatureSpec {
    name: Option<String>,
    reps: Option<Value>,
}

impl RawFeatureSpec {
    fn into_spec(self) -> crate::Result<FeatureSpec> {
        let (name, reps) = match (self.name, self.reps) {
            (Some(name), Some(reps)) if !reps.is_null() => (name, reps),
            _ => {
                return Err(ClusterMakerError::usage(
                    "each column_specs entry must have 'name' and 'reps' keys",
                ))
            }
        };

        let reps = reps
            .as_array()
            .ok_or_else(|| ClusterMakerError::type_error("'reps' must be a sequence of values"))?
            .iter()
            .map(|rep| {
                rep.as_f64().ok_or_else(|| {
                    ClusterMakerError::type_error(format!(
                        "'reps' of '{}' contains a non-numeric value: {}",
                        name, rep
                    ))
                })
            })
            .collect::<crate::Result<Vec<f64>>>()?;

        Ok(FeatureSpec::new(name, reps))
    }
}

/// Convert loosely typed input (a JSON list of `{"name", "reps"}` objects) into feature specs
pub fn parse_column_specs(value: &Value) -> crate::Result<Vec<FeatureSpec>> {
    let entries = Vec::<RawFeatureSpec>::deserialize(value).map_err(|err| {
        ClusterMakerError::type_error(format!("column_specs must be a list of objects: {}", err))
    })?;

    entries.into_iter().map(RawFeatureSpec::into_spec).collect()
}

/// Parse the inline form `name=v1,v2,...`
pub fn parse_feature_arg(arg: &str) -> crate::Result<FeatureSpec> {
    let (name, reps) = arg
        .split_once('=')
        .ok_or_else(|| ClusterMakerError::usage(format!("feature '{}' must look like name=v1,v2", arg)))?;

    let name = name.trim();
    if name.is_empty() {
        return Err(ClusterMakerError::usage(format!("feature '{}' has an empty name", arg)));
    }

    let reps = reps
        .split(',')
        .map(|value| {
            value.trim().parse::<f64>().map_err(|_| {
                ClusterMakerError::type_error(format!("invalid value '{}' for feature '{}'", value, name))
            })
        })
        .collect::<crate::Result<Vec<f64>>>()?;

    Ok(FeatureSpec::new(name, reps))
}

/// Cluster centres: one row per cluster, one column per feature
#[derive(Debug, Clone, PartialEq)]
pub struct SeedTable {
    feature_names: Vec<String>,
    centres: Array2<f64>,
}

impl SeedTable {
    pub fn n_clusters(&self) -> usize {
        self.centres.nrows()
    }

    pub fn n_features(&self) -> usize {
        self.centres.ncols()
    }

    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    /// Centres matrix of shape (n_clusters, n_features)
    pub fn centres(&self) -> &Array2<f64> {
        &self.centres
    }

    pub fn centre(&self, cluster_id: usize) -> Option<ArrayView1<'_, f64>> {
        (cluster_id < self.n_clusters()).then(|| self.centres.row(cluster_id))
    }

    /// Values of one feature across clusters, in cluster order
    pub fn feature(&self, name: &str) -> Option<ArrayView1<'_, f64>> {
        let position = self.feature_names.iter().position(|candidate| candidate == name)?;
        Some(self.centres.column(position))
    }

    /// Build a seed table from any table whose columns are all numeric and complete
    pub fn from_table(table: &Table) -> crate::Result<Self> {
        if table.n_rows() == 0 || table.n_columns() == 0 {
            return Err(ClusterMakerError::usage(
                "seed table must have at least one cluster and one feature",
            ));
        }

        let mut feature_names = Vec::with_capacity(table.n_columns());
        let mut values = Array2::zeros((table.n_rows(), table.n_columns()));

        for (j, (name, column)) in table.columns().enumerate() {
            let column_values = column.to_f64().ok_or_else(|| {
                ClusterMakerError::type_error(format!("seed table column '{}' is not numeric", name))
            })?;
            for (i, value) in column_values.into_iter().enumerate() {
                values[[i, j]] = value.ok_or_else(|| {
                    ClusterMakerError::usage(format!(
                        "seed table column '{}' is missing a value for cluster {}",
                        name, i
                    ))
                })?;
            }
            feature_names.push(name.to_string());
        }

        Ok(Self {
            feature_names,
            centres: values,
        })
    }

    /// Convert to a generic table indexed by `cluster_id`
    pub fn to_table(&self) -> crate::Result<Table> {
        let columns = self
            .feature_names
            .iter()
            .zip(self.centres.columns())
            .map(|(name, values)| (name.clone(), Column::from_f64(values.iter().copied())))
            .collect();

        Table::new(columns)?.with_index(RowIndex::positional(Some(CLUSTER_ID), self.n_clusters()))
    }
}

/// Build the seed table of cluster centres
///
/// Column order follows `column_specs`; row `i` holds the `i`-th value of every `reps`.
///
/// # Arguments
/// * `column_specs` - Feature specs, all with the same number of `reps`
///
/// # Returns
/// * `SeedTable` with `reps.len()` rows and `column_specs.len()` columns
pub fn define_dataframe_structure(column_specs: &[FeatureSpec]) -> crate::Result<SeedTable> {
    let first = column_specs.first().ok_or_else(|| {
        ClusterMakerError::usage("column_specs must be a non-empty list of feature specs")
    })?;

    let n_clusters = first.reps.len();
    if n_clusters == 0 {
        return Err(ClusterMakerError::usage(
            "'reps' lists must contain at least one value (one per cluster)",
        ));
    }

    let mut seen = HashSet::new();
    for spec in column_specs {
        if spec.name.is_empty() {
            return Err(ClusterMakerError::usage("feature names must not be empty"));
        }
        if !seen.insert(spec.name.as_str()) {
            return Err(ClusterMakerError::usage(format!(
                "feature name '{}' appears more than once",
                spec.name
            )));
        }
        if spec.reps.len() != n_clusters {
            return Err(ClusterMakerError::usage(format!(
                "all 'reps' lists must have the same length (number of clusters): \
                 '{}' has {} values, '{}' has {}",
                spec.name,
                spec.reps.len(),
                first.name,
                n_clusters
            )));
        }
    }

    let mut centres = Array2::zeros((n_clusters, column_specs.len()));
    for (j, spec) in column_specs.iter().enumerate() {
        centres.column_mut(j).assign(&Array1::from(spec.reps.clone()));
    }

    tracing::debug!(
        n_clusters,
        n_features = column_specs.len(),
        "defined seed table"
    );

    Ok(SeedTable {
        feature_names: column_specs.iter().map(|spec| spec.name.clone()).collect(),
        centres,
    })
}

/// Parameters for [`simulate_data`]
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationConfig {
    /// Total number of points to generate
    pub n_points: usize,
    /// Standard deviation of the Gaussian noise around each centre
    pub cluster_std: f64,
    /// Seed for reproducible output; `None` draws from entropy
    pub random_state: Option<u64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            n_points: 100,
            cluster_std: 1.0,
            random_state: None,
        }
    }
}

impl SimulationConfig {
    pub fn n_points(mut self, n_points: usize) -> Self {
        self.n_points = n_points;
        self
    }

    pub fn cluster_std(mut self, cluster_std: f64) -> Self {
        self.cluster_std = cluster_std;
        self
    }

    pub fn random_state(mut self, random_state: Option<u64>) -> Self {
        self.random_state = random_state;
        self
    }

    fn validate(&self) -> crate::Result<()> {
        if self.n_points == 0 {
            return Err(ClusterMakerError::usage("n_points must be a positive integer"));
        }
        if !(self.cluster_std.is_finite() && self.cluster_std > 0.0) {
            return Err(ClusterMakerError::usage(format!(
                "cluster_std must be positive, got {}",
                self.cluster_std
            )));
        }
        Ok(())
    }
}

/// Generated points tagged with the cluster that produced them
#[derive(Debug, Clone, PartialEq)]
pub struct SimulatedDataset {
    feature_names: Vec<String>,
    points: Array2<f64>,
    true_cluster: Array1<usize>,
    n_clusters: usize,
}

impl SimulatedDataset {
    pub fn n_points(&self) -> usize {
        self.points.nrows()
    }

    pub fn n_clusters(&self) -> usize {
        self.n_clusters
    }

    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    /// Points of shape (n_points, n_features), grouped by cluster in ascending order
    pub fn points(&self) -> ArrayView2<'_, f64> {
        self.points.view()
    }

    /// Ground-truth cluster of each point
    pub fn true_cluster(&self) -> ArrayView1<'_, usize> {
        self.true_cluster.view()
    }

    pub fn feature(&self, name: &str) -> Option<ArrayView1<'_, f64>> {
        let position = self.feature_names.iter().position(|candidate| candidate == name)?;
        Some(self.points.column(position))
    }

    /// Number of points generated for each cluster
    pub fn cluster_sizes(&self) -> Vec<usize> {
        let mut sizes = vec![0; self.n_clusters];
        for &label in self.true_cluster.iter() {
            sizes[label] += 1;
        }
        sizes
    }

    /// Convert to a generic table: the feature columns plus an integer `true_cluster` column
    pub fn to_table(&self) -> crate::Result<Table> {
        let mut columns: Vec<(String, Column)> = self
            .feature_names
            .iter()
            .zip(self.points.columns())
            .map(|(name, values)| (name.clone(), Column::from_f64(values.iter().copied())))
            .collect();
        columns.push((
            TRUE_CLUSTER.to_string(),
            Column::from_i64(self.true_cluster.iter().map(|&label| label as i64)),
        ));
        Table::new(columns)
    }
}

/// Split `n_points` across `n_clusters`, giving the remainder to the lowest cluster ids
pub fn allocate_points(n_points: usize, n_clusters: usize) -> Vec<usize> {
    if n_clusters == 0 {
        return Vec::new();
    }
    let base = n_points / n_clusters;
    let remainder = n_points % n_clusters;
    (0..n_clusters)
        .map(|cluster_id| if cluster_id < remainder { base + 1 } else { base })
        .collect()
}

/// Simulate points with Gaussian noise around the centres of `seed`
///
/// A single generator is seeded per call and consumed cluster by cluster, so a fixed
/// `random_state` reproduces the same output.
///
/// # Arguments
/// * `seed` - Cluster centres
/// * `config` - Point count, noise scale and optional seed
///
/// # Returns
/// * `SimulatedDataset` with rows grouped by cluster id
pub fn simulate_data(seed: &SeedTable, config: &SimulationConfig) -> crate::Result<SimulatedDataset> {
    config.validate()?;

    let (n_clusters, n_features) = seed.centres.dim();
    if n_clusters == 0 {
        return Err(ClusterMakerError::usage("seed table must contain at least one cluster"));
    }

    let normal = Normal::new(0.0, config.cluster_std)
        .map_err(|err| ClusterMakerError::usage(format!("invalid cluster_std: {}", err)))?;
    let mut rng = config
        .random_state
        .map_or_else(StdRng::from_entropy, StdRng::seed_from_u64);

    let too_large = config
        .n_points
        .checked_mul(n_features.max(1))
        .and_then(|cells| cells.checked_mul(std::mem::size_of::<f64>()))
        .map_or(true, |bytes| bytes > isize::MAX as usize);
    if too_large {
        return Err(ClusterMakerError::usage(format!(
            "n_points = {} is too large for {} features",
            config.n_points, n_features
        )));
    }

    let counts = allocate_points(config.n_points, n_clusters);
    tracing::debug!(?counts, cluster_std = config.cluster_std, seed = ?config.random_state, "allocating points");

    let mut points = Array2::zeros((config.n_points, n_features));
    let mut true_cluster = Array1::zeros(config.n_points);
    let mut offset = 0;

    for (cluster_id, (centre, &count)) in seed.centres.rows().into_iter().zip(&counts).enumerate() {
        let noise: Array2<f64> = Array2::random_using((count, n_features), normal, &mut rng);
        let block = noise + &centre;

        points.slice_mut(s![offset..offset + count, ..]).assign(&block);
        true_cluster.slice_mut(s![offset..offset + count]).fill(cluster_id);
        offset += count;
    }

    Ok(SimulatedDataset {
        feature_names: seed.feature_names.clone(),
        points,
        true_cluster,
        n_clusters,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn two_cluster_seed() -> SeedTable {
        define_dataframe_structure(&[
            FeatureSpec::new("x", vec![0.0, 5.0]),
            FeatureSpec::new("y", vec![0.0, 5.0]),
        ])
        .unwrap()
    }

    #[test]
    fn test_define_dataframe_structure_basic() {
        let seed = define_dataframe_structure(&[
            FeatureSpec::new("x", vec![0.0, 1.0, 2.0]),
            FeatureSpec::new("y", vec![10.0, 11.0, 12.0]),
        ])
        .unwrap();

        assert_eq!(seed.centres().shape(), &[3, 2]);
        assert_eq!(seed.feature_names(), &["x".to_string(), "y".to_string()]);
        assert_eq!(seed.feature("x").unwrap().to_vec(), vec![0.0, 1.0, 2.0]);
        assert_eq!(seed.centre(2).unwrap().to_vec(), vec![2.0, 12.0]);
        assert!(seed.centre(3).is_none());
    }

    #[test]
    fn test_seed_table_rows_are_clusters() {
        let seed = two_cluster_seed();
        assert_eq!(seed.centre(0).unwrap().to_vec(), vec![0.0, 0.0]);
        assert_eq!(seed.centre(1).unwrap().to_vec(), vec![5.0, 5.0]);

        let table = seed.to_table().unwrap();
        assert_eq!(table.shape(), (2, 2));
        let index = table.index().unwrap();
        assert_eq!(index.name.as_deref(), Some(CLUSTER_ID));
        assert_eq!(index.labels, vec!["0", "1"]);
    }

    #[test]
    fn test_define_rejects_empty_specs() {
        let err = define_dataframe_structure(&[]).unwrap_err();
        assert!(matches!(err, ClusterMakerError::Usage(_)));
        assert!(err.to_string().contains("non-empty"));
    }

    #[test]
    fn test_define_rejects_mismatched_reps() {
        let err = define_dataframe_structure(&[
            FeatureSpec::new("x", vec![0.0, 1.0, 2.0]),
            FeatureSpec::new("y", vec![0.0, 1.0]),
        ])
        .unwrap_err();
        assert!(matches!(err, ClusterMakerError::Usage(_)));
        assert!(err.to_string().contains("same length"));
    }

    #[test]
    fn test_define_rejects_zero_clusters_and_duplicates() {
        let err = define_dataframe_structure(&[FeatureSpec::new("x", vec![])]).unwrap_err();
        assert!(matches!(err, ClusterMakerError::Usage(_)));

        let err = define_dataframe_structure(&[
            FeatureSpec::new("x", vec![1.0]),
            FeatureSpec::new("x", vec![2.0]),
        ])
        .unwrap_err();
        assert!(matches!(err, ClusterMakerError::Usage(_)));
    }

    #[test]
    fn test_parse_column_specs() {
        let specs = parse_column_specs(&json!([
            {"name": "x", "reps": [0.0, 5.0]},
            {"name": "y", "reps": [1, 2]},
        ]))
        .unwrap();
        assert_eq!(specs[1], FeatureSpec::new("y", vec![1.0, 2.0]));
    }

    #[test]
    fn test_parse_column_specs_missing_keys() {
        let err = parse_column_specs(&json!([{"name": "x"}])).unwrap_err();
        assert!(matches!(err, ClusterMakerError::Usage(_)));

        let err = parse_column_specs(&json!([{"reps": [1.0]}])).unwrap_err();
        assert!(matches!(err, ClusterMakerError::Usage(_)));
    }

    #[test]
    fn test_parse_column_specs_reps_not_a_sequence() {
        let err = parse_column_specs(&json!([{"name": "x", "reps": 3.0}])).unwrap_err();
        assert!(matches!(err, ClusterMakerError::Type(_)));

        let err = parse_column_specs(&json!({"name": "x", "reps": [3.0]})).unwrap_err();
        assert!(matches!(err, ClusterMakerError::Type(_)));

        let err = parse_column_specs(&json!([{"name": 7, "reps": [3.0]}])).unwrap_err();
        assert!(matches!(err, ClusterMakerError::Type(_)));

        let err = parse_column_specs(&json!([{"name": "x", "reps": [1.0, "a"]}])).unwrap_err();
        assert!(matches!(err, ClusterMakerError::Type(_)));
    }

    #[test]
    fn test_parse_feature_arg() {
        assert_eq!(
            parse_feature_arg("x=0, 5,-5").unwrap(),
            FeatureSpec::new("x", vec![0.0, 5.0, -5.0])
        );
        assert!(matches!(parse_feature_arg("x"), Err(ClusterMakerError::Usage(_))));
        assert!(matches!(parse_feature_arg("x=1,a"), Err(ClusterMakerError::Type(_))));
    }

    #[test]
    fn test_seed_from_table_requires_numeric_columns() {
        let table = Table::new(vec![
            ("x".to_string(), Column::from_f64([0.0, 5.0])),
            ("tag".to_string(), Column::from_text(["a", "b"])),
        ])
        .unwrap();
        assert!(matches!(
            SeedTable::from_table(&table),
            Err(ClusterMakerError::Type(_))
        ));

        let empty = Table::new(vec![]).unwrap();
        assert!(matches!(
            SeedTable::from_table(&empty),
            Err(ClusterMakerError::Usage(_))
        ));
    }

    #[test]
    fn test_seed_from_table_round_trips_centres() {
        let seed = two_cluster_seed();
        let rebuilt = SeedTable::from_table(&seed.to_table().unwrap()).unwrap();
        assert_eq!(rebuilt, seed);
    }

    #[test]
    fn test_allocate_points_remainder_goes_first() {
        assert_eq!(allocate_points(7, 3), vec![3, 2, 2]);
        assert_eq!(allocate_points(8, 3), vec![3, 3, 2]);
        assert_eq!(allocate_points(100, 2), vec![50, 50]);
        assert_eq!(allocate_points(2, 4), vec![1, 1, 0, 0]);
    }

    #[test]
    fn test_simulate_data_shape() {
        let seed = define_dataframe_structure(&[
            FeatureSpec::new("x", vec![0.0, 5.0]),
            FeatureSpec::new("y", vec![2.0, 4.0]),
        ])
        .unwrap();
        let data = simulate_data(&seed, &SimulationConfig::default().random_state(Some(1))).unwrap();

        assert_eq!(data.n_points(), 100);
        assert_eq!(data.points().shape(), &[100, 2]);
        assert_eq!(data.true_cluster().len(), 100);
        let table = data.to_table().unwrap();
        assert_eq!(table.column_names(), vec!["x", "y", TRUE_CLUSTER]);
    }

    #[test]
    fn test_simulate_data_groups_rows_by_cluster() {
        let seed = define_dataframe_structure(&[
            FeatureSpec::new("x", vec![0.0, 10.0, 20.0]),
        ])
        .unwrap();
        let config = SimulationConfig::default().n_points(7).random_state(Some(3));
        let data = simulate_data(&seed, &config).unwrap();

        assert_eq!(data.true_cluster().to_vec(), vec![0, 0, 0, 1, 1, 2, 2]);
        assert_eq!(data.cluster_sizes(), vec![3, 2, 2]);
    }

    #[test]
    fn test_simulate_data_points_near_centres() {
        let seed = two_cluster_seed();
        let config = SimulationConfig::default().random_state(Some(1));
        let data = simulate_data(&seed, &config).unwrap();

        assert_eq!(data.cluster_sizes(), vec![50, 50]);
        for (point, &label) in data.points().rows().into_iter().zip(data.true_cluster().iter()) {
            let centre = seed.centre(label).unwrap();
            for (value, centre_value) in point.iter().zip(centre.iter()) {
                assert!((value - centre_value).abs() < 6.0);
            }
        }
    }

    #[test]
    fn test_simulate_data_is_reproducible() {
        let seed = two_cluster_seed();
        let config = SimulationConfig::default().cluster_std(0.5).random_state(Some(42));

        let first = simulate_data(&seed, &config).unwrap();
        let second = simulate_data(&seed, &config).unwrap();
        assert_eq!(first, second);

        let other = simulate_data(&seed, &config.clone().random_state(Some(43))).unwrap();
        assert_ne!(first.points(), other.points());

        let unseeded = simulate_data(&seed, &config.random_state(None)).unwrap();
        assert_ne!(first.points(), unseeded.points());
    }

    #[test]
    fn test_simulate_data_rejects_oversized_request() {
        let seed = two_cluster_seed();
        let config = SimulationConfig::default().n_points(usize::MAX / 2);

        let err = simulate_data(&seed, &config).unwrap_err();
        assert!(matches!(err, ClusterMakerError::Usage(_)));
        assert!(err.to_string().contains("too large"));
    }

    #[test]
    fn test_simulate_data_rejects_bad_parameters() {
        let seed = two_cluster_seed();

        let err = simulate_data(&seed, &SimulationConfig::default().n_points(0)).unwrap_err();
        assert!(matches!(err, ClusterMakerError::Usage(_)));

        for std in [0.0, -1.0, f64::NAN] {
            let err = simulate_data(&seed, &SimulationConfig::default().cluster_std(std)).unwrap_err();
            assert!(matches!(err, ClusterMakerError::Usage(_)));
        }
    }
}
