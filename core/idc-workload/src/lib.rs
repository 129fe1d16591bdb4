//! FILENAME: core/idc-workload/src/lib.rs
//! Workloads around the Iterative Data Cube engine.
//!
//! Everything here goes through the public `idc_engine` API:
//! - `generator`: Seeded uniform and sales cubes
//! - `workload`: Random and analyst-style queries, update patterns
//! - `benchmark`: Timings plus declared vs touched cells
//! - `validation`: Exactness, consistency and cost-model checks

pub mod benchmark;
pub mod error;
pub mod generator;
pub mod validation;
pub mod workload;

pub use benchmark::{run_benchmark, scaling_analysis, to_json, BenchmarkRecord, ScalingRecord};
pub use error::{Result, WorkloadError};
pub use generator::{sales_cube, uniform_cube, SalesCubeConfig};
pub use validation::{run_suite, CheckOutcome, CostRow, ValidationReport};
pub use workload::{
    analyst_queries, random_queries, random_updates, sales_update_pattern, AnalystQuery,
    QueryKind, RangeQuery, UpdateKind, UpdateOp,
};
