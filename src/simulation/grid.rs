use crate::error::{WarpError, WarpResult};

/// Evenly spaced samples over `[start, end]`, both endpoints included.
///
/// The last sample is pinned to `end` so sweeps land exactly on their bounds.
pub fn linspace(start: f64, end: f64, count: usize) -> Vec<f64> {
    match count {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (count - 1) as f64;
            let mut values: Vec<f64> = (0..count).map(|i| start + i as f64 * step).collect();
            values[count - 1] = end;
            values
        }
    }
}

/// Sampled x-domain shared by every frame. Strictly increasing, never empty.
#[derive(Debug, Clone, PartialEq)]
pub struct SpatialGrid {
    samples: Vec<f64>,
}

impl SpatialGrid {
    /// Create a grid of `resolution` samples spanning `[min, max]`
    pub fn new(min: f64, max: f64, resolution: usize) -> WarpResult<Self> {
        if resolution == 0 {
            return Err(WarpError::invalid("resolution", "grid needs at least one sample"));
        }
        if !min.is_finite() || !max.is_finite() {
            return Err(WarpError::invalid("space bounds", "bounds must be finite"));
        }
        if resolution > 1 && min >= max {
            return Err(WarpError::invalid(
                "space bounds",
                format!("lower bound {} must be below upper bound {}", min, max),
            ));
        }

        Ok(Self {
            samples: linspace(min, max, resolution),
        })
    }

    pub fn samples(&self) -> &[f64] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn min(&self) -> f64 {
        self.samples[0]
    }

    pub fn max(&self) -> f64 {
        self.samples[self.samples.len() - 1]
    }
}
