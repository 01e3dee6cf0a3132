use crate::error::{WarpError, WarpResult};
use crate::simulation::grid::SpatialGrid;

/// How the field displaces the ray
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RayMode {
    /// Offset proportional to the field amplitude
    #[default]
    Linear,
    /// Offset through `sin(field)`, never more than the bending strength
    Nonlinear,
}

impl RayMode {
    pub fn from_flag(nonlinear: bool) -> Self {
        if nonlinear {
            RayMode::Nonlinear
        } else {
            RayMode::Linear
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            RayMode::Linear => "linear",
            RayMode::Nonlinear => "nonlinear",
        }
    }
}

/// Distorted ray coordinates for a field sampled on `grid`
pub fn compute_ray(
    grid: &SpatialGrid,
    field: &[f64],
    bending_strength: f64,
    mode: RayMode,
) -> WarpResult<Vec<f64>> {
    if field.len() != grid.len() {
        return Err(WarpError::ShapeMismatch {
            expected: grid.len(),
            actual: field.len(),
        });
    }

    let ray = grid
        .samples()
        .iter()
        .zip(field)
        .map(|(&x, &f)| match mode {
            RayMode::Linear => x + bending_strength * f,
            RayMode::Nonlinear => x + bending_strength * f.sin(),
        })
        .collect();

    Ok(ray)
}
