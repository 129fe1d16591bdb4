//! FILENAME: core/idc-workload/src/generator.rs
//! Seeded synthetic cubes.
//!
//! Every generator takes an explicit seed and uses `Xoshiro256PlusPlus`, so
//! the same parameters always produce the same cube.

use rand::seq::index;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Exp};
use rand_xoshiro::Xoshiro256PlusPlus;
use serde::{Deserialize, Serialize};

use idc_engine::DenseCube;

use crate::error::{Result, WorkloadError};

/// Cube of the given shape with values uniform in [0, 1).
pub fn uniform_cube(dims: &[usize], seed: u64) -> Result<DenseCube> {
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
    Ok(DenseCube::from_fn(dims, |_| rng.gen::<f64>())?)
}

// ============================================================================
// SALES CUBE
// ============================================================================

/// Axis sizes of a region x time x product x customer-type sales cube.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesCubeConfig {
    pub regions: usize,
    /// Days.
    pub time_periods: usize,
    pub products: usize,
    pub customer_types: usize,
    pub seed: u64,
}

impl Default for SalesCubeConfig {
    fn default() -> Self {
        SalesCubeConfig {
            regions: 10,
            time_periods: 365,
            products: 100,
            customer_types: 3,
            seed: 42,
        }
    }
}

impl SalesCubeConfig {
    pub fn dims(&self) -> [usize; 4] {
        [self.regions, self.time_periods, self.products, self.customer_types]
    }
}

/// Mean of the exponential base sales volume.
const MEAN_SALES: f64 = 100.0;

/// Budget, standard and premium buyers. Further customer types use 1.0.
const CUSTOMER_FACTORS: [f64; 3] = [0.6, 1.0, 1.8];

/// Multiplier per day: month-start spikes, a summer slump and busier weekends.
fn seasonal_factors(days: usize) -> Vec<f64> {
    (0..days)
        .map(|day| {
            let mut factor = if day % 30 == 0 { 2.5 } else { 1.0 };
            if (150..240).contains(&day) {
                factor *= 0.7;
            }
            if matches!(day % 7, 5 | 6) {
                factor *= 1.2;
            }
            factor
        })
        .collect()
}

/// Multiplier per (region, product). Each region prefers a quarter of the
/// products, drawn without replacement.
fn regional_preferences(rng: &mut Xoshiro256PlusPlus, regions: usize, products: usize) -> Vec<f64> {
    let mut preferences = vec![1.0; regions * products];
    let preferred = products / 4;
    for region in 0..regions {
        for product in index::sample(rng, products, preferred) {
            preferences[region * products + product] = 1.5 + 0.5 * rng.gen::<f64>();
        }
    }
    preferences
}

/// Non-negative sales volumes shaped by season, region and customer type.
pub fn sales_cube(config: &SalesCubeConfig) -> Result<DenseCube> {
    let dims = config.dims();
    if dims.contains(&0) {
        return Err(WorkloadError::Invalid(format!(
            "sales cube axes must be non-empty, got {:?}",
            dims
        )));
    }

    let base_sales = Exp::new(1.0 / MEAN_SALES)
        .map_err(|e| WorkloadError::Invalid(format!("sales distribution: {}", e)))?;
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(config.seed);
    let seasonal = seasonal_factors(config.time_periods);
    let regional = regional_preferences(&mut rng, config.regions, config.products);

    let cube = DenseCube::from_fn(&dims, |cell| {
        let (region, day, product, customer) = (cell[0], cell[1], cell[2], cell[3]);
        let base = base_sales.sample(&mut rng);
        let customer_factor = CUSTOMER_FACTORS.get(customer).copied().unwrap_or(1.0);
        let noise = 0.8 + 0.4 * rng.gen::<f64>();
        base * seasonal[day] * regional[region * config.products + product] * customer_factor * noise
    })?;

    log::info!(
        "sales_cube dims={:?} seed={} total={:.2}",
        dims,
        config.seed,
        cube.total()
    );
    Ok(cube)
}
