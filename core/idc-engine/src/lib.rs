//! FILENAME: core/idc-engine/src/lib.rs
//! Iterative Data Cube engine.
//!
//! Range-sum queries and single-cell updates over a dense n-dimensional
//! array, built by composing one-dimensional pre-aggregation techniques, one
//! per axis. The transformed cube never uses more storage than the raw cube.
//!
//! Layers:
//! - `definition`: Serializable configuration (which technique on which axis)
//! - `technique`: The one-dimensional techniques and their contract
//! - `shape`: Row-major layout and the raw dense cube
//! - `cube`: The orchestrator (construct, query, update, costs)
//! - `shared`: Mutex-guarded handle for concurrent callers

pub mod coefficients;
pub mod cube;
pub mod definition;
pub mod error;
pub mod shape;
pub mod shared;
pub mod technique;

pub use coefficients::{CoefficientBuilder, CoefficientMap};
pub use cube::{CubeInfo, CubeStats, IterativeDataCube, QueryPlan};
pub use definition::{CostPair, CubeDefinition, TechniqueKind};
pub use error::{IdcError, Result};
pub use shape::{CubeShape, DenseCube};
pub use shared::SharedDataCube;
pub use technique::{AxisTechnique, BoundTechnique};
