//! Shared fixtures for the integration tests

#![allow(dead_code)]

use estate_predictor::training::{BoostingGrid, RandomForestGrid, TrainingConfig};
use polars::prelude::*;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Housing frame where price is linear in area plus a little noise.
///
/// Every fifth row has no `Gymnasium` value.
pub fn housing_frame(n: usize, seed: u64) -> DataFrame {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);

    let area: Vec<f64> = (0..n).map(|_| rng.gen_range(400.0..3000.0)).collect();
    let beds: Vec<f64> = area.iter().map(|a| (a / 700.0).floor() + 1.0).collect();
    let lat: Vec<f64> = (0..n).map(|_| rng.gen_range(18.9..19.3)).collect();
    let lon: Vec<f64> = (0..n).map(|_| rng.gen_range(72.8..73.0)).collect();
    let gym: Vec<Option<i64>> = (0..n)
        .map(|i| if i % 5 == 0 { None } else { Some(rng.gen_range(0..2)) })
        .collect();
    let pool: Vec<i64> = (0..n).map(|_| rng.gen_range(0..2)).collect();
    let price: Vec<f64> = area
        .iter()
        .map(|a| 8000.0 * a + 250_000.0 + rng.gen_range(-50_000.0..50_000.0))
        .collect();
    let ids: Vec<i64> = (0..n as i64).collect();
    let location: Vec<&str> = (0..n).map(|i| if i % 2 == 0 { "Andheri" } else { "Bandra" }).collect();
    let city: Vec<&str> = (0..n).map(|_| "Mumbai").collect();

    df! {
        "Id" => ids,
        "Price" => price,
        "Area" => area,
        "Location" => location,
        "No. of Bedrooms" => beds,
        "Gymnasium" => gym,
        "SwimmingPool" => pool,
        "City" => city,
        "Latitude" => lat,
        "Longitude" => lon,
    }
    .unwrap()
}

/// Write [`housing_frame`] as CSV
pub fn write_housing_csv(path: &Path, n: usize, seed: u64) {
    let mut df = housing_frame(n, seed);
    let mut file = File::create(path).unwrap();
    CsvWriter::new(&mut file).finish(&mut df).unwrap();
    file.flush().unwrap();
}

/// Small grids so the suite stays fast
pub fn fast_config(dir: &Path) -> TrainingConfig {
    TrainingConfig::default()
        .with_dataset_path(dir.join("dataset.csv"))
        .with_model_dir(dir.join("model"))
        .with_random_forest_grid(RandomForestGrid {
            n_estimators: vec![20],
            max_depth: vec![6],
        })
        .with_boosting_grid(BoostingGrid {
            n_estimators: vec![30],
            max_depth: vec![3],
            learning_rate: vec![0.1],
        })
}
