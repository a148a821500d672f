//! Cell lookup consumed by the well and connection handlers

use serde::{Deserialize, Serialize};

use crate::error::LookupError;

/// Read-only access to the cells of the simulation grid
///
/// Indices are zero based. Implementations must be shareable between
/// independently built schedules.
pub trait CellLookup: Send + Sync {
    /// Number of cells in each direction
    fn dims(&self) -> [usize; 3];

    /// Natural index of cell (i, j, k)
    fn global_index(&self, i: usize, j: usize, k: usize) -> Result<usize, LookupError>;

    /// Index among active cells, failing for inactive cells
    fn active_index(&self, i: usize, j: usize, k: usize) -> Result<usize, LookupError>;

    /// Depth of the cell centre
    fn depth(&self, i: usize, j: usize, k: usize) -> Result<f64, LookupError>;

    /// Saturation table number of an active cell
    fn satnum(&self, active_index: usize) -> Result<i32, LookupError>;

    /// Cell extent in x, y and z
    fn cell_size(&self, i: usize, j: usize, k: usize) -> Result<[f64; 3], LookupError>;

    /// Permeability in x, y and z
    fn permeability(&self, i: usize, j: usize, k: usize) -> Result<[f64; 3], LookupError>;
}

/// Regular cartesian grid with uniform cell size
///
/// Cell properties that vary per cell (activity, saturation tables) are held
/// in natural order; everything else is uniform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartesianGrid {
    nx: usize,
    ny: usize,
    nz: usize,
    cell_size: [f64; 3],
    top: f64,
    permeability: [f64; 3],
    actnum: Option<Vec<bool>>,
    satnum: Option<Vec<i32>>,
}

impl CartesianGrid {
    /// Create a new grid with unit cells, all active, table 1 everywhere
    pub fn new(nx: usize, ny: usize, nz: usize) -> Self {
        Self {
            nx,
            ny,
            nz,
            cell_size: [1.0, 1.0, 1.0],
            top: 0.0,
            permeability: [1.0, 1.0, 1.0],
            actnum: None,
            satnum: None,
        }
    }

    pub fn with_cell_size(mut self, dx: f64, dy: f64, dz: f64) -> Self {
        self.cell_size = [dx, dy, dz];
        self
    }

    /// Depth of the top of the first layer
    pub fn with_top(mut self, top: f64) -> Self {
        self.top = top;
        self
    }

    pub fn with_permeability(mut self, kx: f64, ky: f64, kz: f64) -> Self {
        self.permeability = [kx, ky, kz];
        self
    }

    /// Set cell activity in natural order
    pub fn with_actnum(mut self, actnum: Vec<bool>) -> Self {
        self.actnum = Some(actnum);
        self
    }

    /// Set saturation table numbers, one per active cell
    pub fn with_satnum(mut self, satnum: Vec<i32>) -> Self {
        self.satnum = Some(satnum);
        self
    }

    pub fn cell_count(&self) -> usize {
        self.nx * self.ny * self.nz
    }

    fn check(&self, i: usize, j: usize, k: usize) -> Result<usize, LookupError> {
        if i >= self.nx || j >= self.ny || k >= self.nz {
            return Err(LookupError::new(
                "cell",
                format!("({},{},{}) outside {}x{}x{}", i + 1, j + 1, k + 1, self.nx, self.ny, self.nz),
            ));
        }
        Ok(i + j * self.nx + k * self.nx * self.ny)
    }
}

impl CellLookup for CartesianGrid {
    fn dims(&self) -> [usize; 3] {
        [self.nx, self.ny, self.nz]
    }

    fn global_index(&self, i: usize, j: usize, k: usize) -> Result<usize, LookupError> {
        self.check(i, j, k)
    }

    fn active_index(&self, i: usize, j: usize, k: usize) -> Result<usize, LookupError> {
        let global = self.check(i, j, k)?;
        match &self.actnum {
            None => Ok(global),
            Some(actnum) => {
                if !actnum.get(global).copied().unwrap_or(false) {
                    return Err(LookupError::new(
                        "active cell",
                        format!("({},{},{})", i + 1, j + 1, k + 1),
                    ));
                }
                Ok(actnum[..global].iter().filter(|active| **active).count())
            }
        }
    }

    fn depth(&self, i: usize, j: usize, k: usize) -> Result<f64, LookupError> {
        self.check(i, j, k)?;
        Ok(self.top + self.cell_size[2] * (k as f64 + 0.5))
    }

    fn satnum(&self, active_index: usize) -> Result<i32, LookupError> {
        match &self.satnum {
            None => Ok(1),
            Some(satnum) => satnum
                .get(active_index)
                .copied()
                .ok_or_else(|| LookupError::new("SATNUM entry", active_index.to_string())),
        }
    }

    fn cell_size(&self, i: usize, j: usize, k: usize) -> Result<[f64; 3], LookupError> {
        self.check(i, j, k)?;
        Ok(self.cell_size)
    }

    fn permeability(&self, i: usize, j: usize, k: usize) -> Result<[f64; 3], LookupError> {
        self.check(i, j, k)?;
        Ok(self.permeability)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_natural_ordering() {
        let grid = CartesianGrid::new(10, 10, 10);
        assert_eq!(grid.global_index(0, 0, 0).unwrap(), 0);
        assert_eq!(grid.global_index(2, 1, 0).unwrap(), 12);
        assert_eq!(grid.global_index(0, 0, 1).unwrap(), 100);
        assert!(grid.global_index(10, 0, 0).is_err());
    }

    #[test]
    fn test_inactive_cells_are_skipped() {
        let grid = CartesianGrid::new(3, 1, 1).with_actnum(vec![true, false, true]);
        assert_eq!(grid.active_index(2, 0, 0).unwrap(), 1);
        assert!(grid.active_index(1, 0, 0).is_err());
    }

    #[test]
    fn test_depth_is_cell_centre() {
        let grid = CartesianGrid::new(1, 1, 3).with_cell_size(10.0, 10.0, 2.0).with_top(1000.0);
        assert_eq!(grid.depth(0, 0, 0).unwrap(), 1001.0);
        assert_eq!(grid.depth(0, 0, 2).unwrap(), 1005.0);
    }

    #[test]
    fn test_satnum_defaults_to_one() {
        let grid = CartesianGrid::new(2, 1, 1);
        assert_eq!(grid.satnum(1).unwrap(), 1);

        let grid = grid.with_satnum(vec![3, 4]);
        assert_eq!(grid.satnum(1).unwrap(), 4);
        assert!(grid.satnum(2).is_err());
    }
}
