use crate::config::Y_RANGE_MARGIN;
use crate::error::{WarpError, WarpResult};
use crate::simulation::field::{compute_field, BubbleParameters};
use crate::simulation::grid::SpatialGrid;
use crate::simulation::path::BubblePath;
use crate::simulation::ray::{compute_ray, RayMode};

/// One snapshot of the animation, recomputed on every request
#[derive(Debug, Clone, PartialEq)]
pub struct Frame<'a> {
    pub index: usize,
    pub grid: &'a SpatialGrid,
    pub center: f64,
    pub field: Vec<f64>,
    pub ray: Vec<f64>,
}

/// Immutable model configuration that produces frames on demand.
///
/// Holds no cursor: any valid index may be requested in any order, from any
/// thread, and the same index always yields the same frame.
#[derive(Debug, Clone)]
pub struct FrameSequencer {
    grid: SpatialGrid,
    params: BubbleParameters,
    path: BubblePath,
    ray_mode: RayMode,
}

impl FrameSequencer {
    pub fn new(
        grid: SpatialGrid,
        params: BubbleParameters,
        path: BubblePath,
        ray_mode: RayMode,
    ) -> WarpResult<Self> {
        params.validate()?;
        Ok(Self {
            grid,
            params,
            path,
            ray_mode,
        })
    }

    pub fn frame_count(&self) -> usize {
        self.path.len()
    }

    pub fn grid(&self) -> &SpatialGrid {
        &self.grid
    }

    pub fn params(&self) -> &BubbleParameters {
        &self.params
    }

    pub fn ray_mode(&self) -> RayMode {
        self.ray_mode
    }

    /// Compute the frame for `index`
    pub fn frame_at(&self, index: usize) -> WarpResult<Frame<'_>> {
        let center = self.path.get(index).ok_or(WarpError::IndexOutOfRange {
            index,
            count: self.frame_count(),
        })?;

        let field = compute_field(&self.grid, center, &self.params);
        let ray = compute_ray(&self.grid, &field, self.params.bending_strength, self.ray_mode)?;

        Ok(Frame {
            index,
            grid: &self.grid,
            center,
            field,
            ray,
        })
    }
}

/// Display hint for dynamic axis scaling: field extent padded on both sides
pub fn suggested_y_range(field: &[f64]) -> (f64, f64) {
    let (min, max) = field
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
    if min > max {
        // Empty field
        return (-Y_RANGE_MARGIN, Y_RANGE_MARGIN);
    }
    (min - Y_RANGE_MARGIN, max + Y_RANGE_MARGIN)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rayon::prelude::*;

    fn default_sequencer(mode: RayMode) -> FrameSequencer {
        FrameSequencer::new(
            SpatialGrid::new(-20.0, 20.0, 1000).unwrap(),
            BubbleParameters::new(1.0, 2.0, 2.0, false, 2.0).unwrap(),
            BubblePath::sweep(-15.0, 15.0, 100).unwrap(),
            mode,
        )
        .unwrap()
    }

    #[test]
    fn test_frame_count_and_centers() {
        let seq = default_sequencer(RayMode::Linear);
        assert_eq!(seq.frame_count(), 100);
        assert_eq!(seq.frame_at(0).unwrap().center, -15.0);
        assert_eq!(seq.frame_at(99).unwrap().center, 15.0);
    }

    #[test]
    fn test_frame_shapes() {
        let seq = default_sequencer(RayMode::Nonlinear);
        let frame = seq.frame_at(42).unwrap();
        assert_eq!(frame.index, 42);
        assert_eq!(frame.field.len(), seq.grid().len());
        assert_eq!(frame.ray.len(), seq.grid().len());
    }

    #[test]
    fn test_frame_at_is_deterministic() {
        let seq = default_sequencer(RayMode::Linear);
        let first = seq.frame_at(17).unwrap();
        // Random access in between must not disturb anything
        let _ = seq.frame_at(80).unwrap();
        let second = seq.frame_at(17).unwrap();
        assert_eq!(first, second);
        for (a, b) in first.field.iter().zip(&second.field) {
            assert_eq!(a.to_bits(), b.to_bits());
        }
    }

    #[test]
    fn test_out_of_range() {
        let seq = default_sequencer(RayMode::Linear);
        assert_eq!(
            seq.frame_at(100).unwrap_err(),
            WarpError::IndexOutOfRange {
                index: 100,
                count: 100
            }
        );
        assert!(seq.frame_at(usize::MAX).is_err());
    }

    #[test]
    fn test_rejects_invalid_params() {
        let params = BubbleParameters {
            sigma: 0.0,
            ..BubbleParameters::default()
        };
        let result = FrameSequencer::new(
            SpatialGrid::new(-20.0, 20.0, 100).unwrap(),
            params,
            BubblePath::sweep(-15.0, 15.0, 10).unwrap(),
            RayMode::Linear,
        );
        assert!(matches!(
            result,
            Err(WarpError::InvalidParameter { name: "sigma", .. })
        ));
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let seq = default_sequencer(RayMode::Nonlinear);
        let sequential: Vec<Vec<f64>> = (0..seq.frame_count())
            .map(|i| seq.frame_at(i).unwrap().ray)
            .collect();
        let parallel: Vec<Vec<f64>> = (0..seq.frame_count())
            .into_par_iter()
            .rev()
            .map(|i| seq.frame_at(i).unwrap().ray)
            .collect::<Vec<_>>()
            .into_iter()
            .rev()
            .collect();
        assert_eq!(sequential, parallel);
    }

    #[test]
    fn test_suggested_y_range() {
        assert_eq!(suggested_y_range(&[-1.0, 0.25, 2.0]), (-1.5, 2.5));
        assert_eq!(suggested_y_range(&[]), (-0.5, 0.5));
    }
}
