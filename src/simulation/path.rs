use crate::error::{WarpError, WarpResult};
use crate::simulation::grid::linspace;

/// Bubble center for every frame index
#[derive(Debug, Clone, PartialEq)]
pub struct BubblePath {
    centers: Vec<f64>,
}

impl BubblePath {
    /// Linear sweep from `start` to `end` over `frames` frames (endpoints included)
    pub fn sweep(start: f64, end: f64, frames: usize) -> WarpResult<Self> {
        if !start.is_finite() || !end.is_finite() {
            return Err(WarpError::invalid("path bounds", "bounds must be finite"));
        }
        Self::from_centers(linspace(start, end, frames))
    }

    /// Arbitrary path. Centers need not be monotone or inside the grid.
    pub fn from_centers(centers: Vec<f64>) -> WarpResult<Self> {
        if centers.is_empty() {
            return Err(WarpError::invalid("num_frames", "path needs at least one frame"));
        }
        if let Some(bad) = centers.iter().find(|c| !c.is_finite()) {
            return Err(WarpError::invalid(
                "path",
                format!("bubble center {} is not finite", bad),
            ));
        }
        Ok(Self { centers })
    }

    pub fn len(&self) -> usize {
        self.centers.len()
    }

    pub fn get(&self, index: usize) -> Option<f64> {
        self.centers.get(index).copied()
    }

    #[cfg(test)]
    fn centers(&self) -> &[f64] {
        &self.centers
    }
}
