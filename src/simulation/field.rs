use crate::config::{
    BENDING_STRENGTH, BUBBLE_SIGMA, CONTRACTION_STRENGTH, EXPANSION_STRENGTH, WAKE_AMPLITUDE,
    WAKE_ENABLED, WAKE_OFFSET,
};
use crate::error::{WarpError, WarpResult};
use crate::simulation::grid::SpatialGrid;

/// Shape of the warp bubble, fixed for the whole run
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BubbleParameters {
    /// Gaussian width of the bubble
    pub sigma: f64,
    /// Depth of the contraction region (x < center)
    pub contraction_strength: f64,
    /// Height of the expansion region (x > center)
    pub expansion_strength: f64,
    /// Adds a narrow trailing bump behind the center
    pub wake_enabled: bool,
    /// Scale of the ray displacement
    pub bending_strength: f64,
}

impl Default for BubbleParameters {
    fn default() -> Self {
        Self {
            sigma: BUBBLE_SIGMA,
            contraction_strength: CONTRACTION_STRENGTH,
            expansion_strength: EXPANSION_STRENGTH,
            wake_enabled: WAKE_ENABLED,
            bending_strength: BENDING_STRENGTH,
        }
    }
}

impl BubbleParameters {
    /// Create validated parameters
    pub fn new(
        sigma: f64,
        contraction_strength: f64,
        expansion_strength: f64,
        wake_enabled: bool,
        bending_strength: f64,
    ) -> WarpResult<Self> {
        let params = Self {
            sigma,
            contraction_strength,
            expansion_strength,
            wake_enabled,
            bending_strength,
        };
        params.validate()?;
        Ok(params)
    }

    pub fn validate(&self) -> WarpResult<()> {
        if !(self.sigma.is_finite() && self.sigma > 0.0) {
            return Err(WarpError::invalid(
                "sigma",
                format!("must be a positive finite width, got {}", self.sigma),
            ));
        }
        check_strength("contraction_strength", self.contraction_strength)?;
        check_strength("expansion_strength", self.expansion_strength)?;
        check_strength("bending_strength", self.bending_strength)?;
        Ok(())
    }

    /// Largest magnitude the field can reach under these parameters
    pub fn field_bound(&self) -> f64 {
        let wake = if self.wake_enabled { WAKE_AMPLITUDE } else { 0.0 };
        self.contraction_strength.max(self.expansion_strength) + wake
    }
}

fn check_strength(name: &'static str, value: f64) -> WarpResult<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(WarpError::invalid(
            name,
            format!("must be finite and non-negative, got {}", value),
        ))
    }
}

/// Field value at a single position.
///
/// Contraction applies strictly left of the center, expansion strictly right.
/// The sample sitting exactly on the center gets neither.
pub fn field_value(x: f64, center: f64, params: &BubbleParameters) -> f64 {
    let offset = x - center;
    let bubble = (-(offset * offset) / (2.0 * params.sigma * params.sigma)).exp();

    if offset < 0.0 {
        let mut value = -params.contraction_strength * bubble;
        if params.wake_enabled {
            let trail = offset + WAKE_OFFSET;
            value += WAKE_AMPLITUDE * (-(trail * trail)).exp();
        }
        value
    } else if offset > 0.0 {
        params.expansion_strength * bubble
    } else {
        0.0
    }
}

/// Warp field over the whole grid for a bubble centered at `center`
pub fn compute_field(grid: &SpatialGrid, center: f64, params: &BubbleParameters) -> Vec<f64> {
    grid.samples()
        .iter()
        .map(|&x| field_value(x, center, params))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    fn scenario_params() -> BubbleParameters {
        BubbleParameters::new(1.0, 2.0, 2.0, false, 2.0).unwrap()
    }

    #[test]
    fn test_field_length_matches_grid() {
        let grid = SpatialGrid::new(-20.0, 20.0, 1000).unwrap();
        let field = compute_field(&grid, 3.7, &scenario_params());
        assert_eq!(field.len(), grid.len());
    }

    #[test]
    fn test_zero_at_exact_center() {
        let grid = SpatialGrid::new(-20.0, 20.0, 1000).unwrap();
        let center_index = 437;
        let center = grid.samples()[center_index];

        for wake_enabled in [false, true] {
            let params = BubbleParameters {
                wake_enabled,
                ..scenario_params()
            };
            let field = compute_field(&grid, center, &params);
            assert_eq!(field[center_index], 0.0);
        }
    }

    #[test]
    fn test_concrete_scenario_values() {
        let params = scenario_params();
        let far = field_value(5.0, 0.0, &params);
        assert!((far - 2.0 * (-12.5f64).exp()).abs() < 1e-12);
        assert!(far < 1e-5);

        let near = field_value(0.5, 0.0, &params);
        assert!((near - 1.765).abs() < 1e-3, "got {}", near);
    }

    #[test]
    fn test_contraction_is_negative_expansion_positive() {
        let params = scenario_params();
        assert!(field_value(-0.5, 0.0, &params) < 0.0);
        assert!(field_value(0.5, 0.0, &params) > 0.0);
    }

    #[test]
    fn test_wake_only_trails_behind_center() {
        let params = BubbleParameters {
            contraction_strength: 0.0,
            expansion_strength: 0.0,
            wake_enabled: true,
            ..scenario_params()
        };
        // Peak of the wake sits three units behind the center
        assert!((field_value(-3.0, 0.0, &params) - WAKE_AMPLITUDE).abs() < 1e-12);
        assert_eq!(field_value(3.0, 0.0, &params), 0.0);
    }

    #[test]
    fn test_field_bounded_by_envelope() {
        let mut rng = rand::thread_rng();
        let grid = SpatialGrid::new(-20.0, 20.0, 1000).unwrap();
        for _ in 0..50 {
            let params = BubbleParameters::new(
                rng.gen_range(0.1..5.0),
                rng.gen_range(0.0..4.0),
                rng.gen_range(0.0..4.0),
                rng.gen_bool(0.5),
                rng.gen_range(0.0..4.0),
            )
            .unwrap();
            let center = rng.gen_range(-20.0..20.0);
            let bound = params.field_bound();
            for value in compute_field(&grid, center, &params) {
                assert!(value.is_finite());
                assert!(value.abs() <= bound + 1e-12, "{} exceeds {}", value, bound);
            }
        }
    }

    #[test]
    fn test_rejects_bad_parameters() {
        assert!(BubbleParameters::new(0.0, 1.0, 1.0, false, 1.0).is_err());
        assert!(BubbleParameters::new(-1.0, 1.0, 1.0, false, 1.0).is_err());
        assert!(BubbleParameters::new(f64::NAN, 1.0, 1.0, false, 1.0).is_err());
        assert!(BubbleParameters::new(1.0, -0.1, 1.0, false, 1.0).is_err());
        assert!(BubbleParameters::new(1.0, 1.0, -0.1, false, 1.0).is_err());
        assert!(BubbleParameters::new(1.0, 1.0, 1.0, false, f64::INFINITY).is_err());
        assert!(BubbleParameters::default().validate().is_ok());
    }
}
