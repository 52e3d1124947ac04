//! Sweep ladder and stepped range generation.
//!
//! `SweepDefinition` produces a fixed number of points between two positive
//! bounds, uniformly spaced in log10-space. `AnalysisRange` produces
//! points at a fixed increment, which is how angle-of-attack sweeps are
//! specified to the predictor.

use crate::error::{VpError, VpResult};

/// Fixed-count sweep between two bounds; consecutive points share one ratio.
#[derive(Debug, Clone, PartialEq)]
pub struct SweepDefinition {
    pub start: f64,
    pub end: f64,
    /// Number of points to generate
    pub num_points: usize,
}

impl SweepDefinition {
    /// Create a validated sweep. Both bounds must be strictly positive.
    pub fn new(start: f64, end: f64, num_points: usize) -> VpResult<Self> {
        crate::ensure_finite(start, "sweep start")?;
        crate::ensure_finite(end, "sweep end")?;

        if num_points < 2 {
            return Err(VpError::InvalidArg {
                what: "sweep must have at least 2 points",
            });
        }

        if (start - end).abs() < 1e-12 {
            return Err(VpError::InvalidArg {
                what: "sweep start and end values must be different",
            });
        }

        if start <= 0.0 || end <= 0.0 {
            return Err(VpError::InvalidArg {
                what: "logarithmic sweep bounds must be positive",
            });
        }

        Ok(Self {
            start,
            end,
            num_points,
        })
    }

    /// Generate all points in the sweep.
    pub fn generate_points(&self) -> Vec<f64> {
        if self.num_points < 2 {
            return vec![self.start];
        }
        let mut points = Vec::with_capacity(self.num_points);
        let log_start = self.start.log10();
        let log_end = self.end.log10();
        let log_delta = (log_end - log_start) / (self.num_points - 1) as f64;

        for i in 0..self.num_points {
            let log_val = log_start + i as f64 * log_delta;
            points.push(10f64.powf(log_val));
        }

        // powf(log10(x)) does not round-trip exactly
        points[0] = self.start;
        points[self.num_points - 1] = self.end;
        points
    }
}

/// A stepped range `[v_min, v_max]` at increment `v_inc`.
///
/// A zero increment, or a span smaller than one increment, yields `v_min` alone.
/// A reversed range (`v_max < v_min`) is walked downwards.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AnalysisRange {
    #[cfg_attr(feature = "serde", serde(rename = "min"))]
    pub v_min: f64,
    #[cfg_attr(feature = "serde", serde(rename = "max"))]
    pub v_max: f64,
    #[cfg_attr(feature = "serde", serde(rename = "step"))]
    pub v_inc: f64,
}

impl AnalysisRange {
    pub fn new(v_min: f64, v_max: f64, v_inc: f64) -> Self {
        Self {
            v_min,
            v_max,
            v_inc,
        }
    }

    pub fn n_values(&self) -> usize {
        if self.v_inc.abs() < 1e-6 {
            return 1;
        }
        if (self.v_max - self.v_min).abs() < self.v_inc.abs() {
            return 1;
        }
        ((self.v_max - self.v_min) / self.v_inc).round().abs() as usize + 1
    }

    pub fn values(&self) -> Vec<f64> {
        let inc = self.v_inc.abs();
        (0..self.n_values())
            .map(|i| {
                if self.v_max >= self.v_min {
                    self.v_min + i as f64 * inc
                } else {
                    self.v_min - i as f64 * inc
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn logarithmic_sweep_generation() {
        let sweep = SweepDefinition::new(1e5, 1e6, 3).unwrap();

        let points = sweep.generate_points();
        assert_eq!(points.len(), 3);
        assert_eq!(points[0], 1e5);
        assert_eq!(points[2], 1e6);
        let expected_mid = (1e5_f64 * 1e6_f64).sqrt();
        assert!((points[1] - expected_mid).abs() / expected_mid < 1e-9);
    }

    #[test]
    fn reject_invalid_point_count() {
        assert!(SweepDefinition::new(1.0, 2.0, 1).is_err());
    }

    #[test]
    fn reject_identical_bounds() {
        assert!(SweepDefinition::new(1e5, 1e5, 16).is_err());
    }

    #[test]
    fn reject_non_positive_log_bounds() {
        let err = SweepDefinition::new(0.0, 1e6, 16).unwrap_err();
        assert!(matches!(err, VpError::InvalidArg { .. }));
    }

    #[test]
    fn analysis_range_quarter_degree() {
        let range = AnalysisRange::new(-5.0, 10.0, 0.25);
        let vals = range.values();
        assert_eq!(vals.len(), 61);
        assert_eq!(vals[0], -5.0);
        assert!((vals[60] - 10.0).abs() < 1e-12);
    }

    #[test]
    fn analysis_range_degenerate_cases() {
        assert_eq!(AnalysisRange::new(2.0, 8.0, 0.0).values(), vec![2.0]);
        assert_eq!(AnalysisRange::new(2.0, 2.1, 0.5).values(), vec![2.0]);
    }

    #[test]
    fn analysis_range_reversed() {
        let vals = AnalysisRange::new(2.0, 0.0, 0.5).values();
        assert_eq!(vals, vec![2.0, 1.5, 1.0, 0.5, 0.0]);
    }
}
