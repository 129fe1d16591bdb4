//! FILENAME: core/idc-engine/src/shared.rs
//! PURPOSE: Thread-safe handle to one Iterative Data Cube.
//! CONTEXT: Every call takes the cube's mutex for its whole duration, so the
//! full set of increments of one update is applied before any reader can
//! look at the transformed cube.

use std::sync::{Arc, Mutex, MutexGuard};

use crate::cube::{CubeInfo, CubeStats, IterativeDataCube};
use crate::definition::CostPair;
use crate::error::{IdcError, Result};

#[derive(Debug, Clone)]
pub struct SharedDataCube {
    inner: Arc<Mutex<IterativeDataCube>>,
}

impl SharedDataCube {
    pub fn new(cube: IterativeDataCube) -> Self {
        SharedDataCube {
            inner: Arc::new(Mutex::new(cube)),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, IterativeDataCube>> {
        self.inner.lock().map_err(|_| IdcError::LockPoisoned)
    }

    pub fn construct(&self) -> Result<()> {
        self.lock()?.construct();
        Ok(())
    }

    pub fn range_query(&self, ranges: &[(usize, usize)]) -> Result<f64> {
        self.lock()?.range_query(ranges)
    }

    pub fn update_cell(&self, indices: &[usize], delta: f64) -> Result<()> {
        self.lock()?.update_cell(indices, delta)
    }

    pub fn theoretical_costs(&self) -> Result<CostPair> {
        Ok(self.lock()?.theoretical_costs())
    }

    pub fn get_cube_info(&self) -> Result<CubeInfo> {
        Ok(self.lock()?.get_cube_info())
    }

    pub fn stats(&self) -> Result<CubeStats> {
        Ok(self.lock()?.stats())
    }

    /// Runs `f` with exclusive access to the cube.
    pub fn with<R>(&self, f: impl FnOnce(&mut IterativeDataCube) -> R) -> Result<R> {
        let mut guard = self.lock()?;
        Ok(f(&mut guard))
    }
}
