//! Property tests for point allocation and seed table construction

use cluster_maker::{allocate_points, define_dataframe_structure, simulate_data, FeatureSpec, SimulationConfig};
use proptest::prelude::*;

proptest! {
    #[test]
    fn allocation_sums_to_request(n_points in 1usize..5000, n_clusters in 1usize..50) {
        let counts = allocate_points(n_points, n_clusters);
        prop_assert_eq!(counts.len(), n_clusters);
        prop_assert_eq!(counts.iter().sum::<usize>(), n_points);

        let base = n_points / n_clusters;
        let remainder = n_points % n_clusters;
        for (cluster_id, &count) in counts.iter().enumerate() {
            let expected = if cluster_id < remainder { base + 1 } else { base };
            prop_assert_eq!(count, expected);
        }
    }

    #[test]
    fn seed_table_matches_specs(
        reps in prop::collection::vec(prop::collection::vec(-100.0f64..100.0, 3), 1..6)
    ) {
        let specs: Vec<FeatureSpec> = reps
            .iter()
            .enumerate()
            .map(|(j, values)| FeatureSpec::new(format!("f{}", j), values.clone()))
            .collect();
        let seed = define_dataframe_structure(&specs).unwrap();

        prop_assert_eq!(seed.n_clusters(), 3);
        prop_assert_eq!(seed.n_features(), specs.len());
        for (j, spec) in specs.iter().enumerate() {
            prop_assert_eq!(&seed.feature_names()[j], &spec.name);
            prop_assert_eq!(seed.centres().column(j).to_vec(), spec.reps.clone());
        }
    }

    #[test]
    fn simulation_labels_follow_allocation(n_points in 1usize..300, seed_value in any::<u64>()) {
        let seed = define_dataframe_structure(&[
            FeatureSpec::new("x", vec![0.0, 1.0, 2.0, 3.0]),
        ]).unwrap();
        let config = SimulationConfig::default().n_points(n_points).random_state(Some(seed_value));
        let data = simulate_data(&seed, &config).unwrap();

        prop_assert_eq!(data.n_points(), n_points);
        prop_assert_eq!(data.cluster_sizes(), allocate_points(n_points, 4));
        let labels = data.true_cluster().to_vec();
        prop_assert!(labels.windows(2).all(|pair| pair[0] <= pair[1]));
    }
}
