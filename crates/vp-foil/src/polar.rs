//! Fixed-Reynolds polar curves.

use crate::error::{FoilError, FoilResult};
use vp_core::lerp;

/// Output channels stored on a polar curve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PolarChannel {
    Alpha,
    Cl,
    Cd,
    XtrTop,
    XtrBot,
}

/// Result of a lift-coefficient lookup.
///
/// When `out_of_range` is set, `value` is the channel value at the nearest
/// end of the curve's lift range and should not be trusted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClLookup {
    pub value: f64,
    pub out_of_range: bool,
}

/// One angle-of-attack sweep at a fixed Reynolds number.
///
/// Samples are kept in sweep order (ascending alpha as produced by the
/// predictor). All channel arrays share one length.
#[derive(Debug, Clone, PartialEq)]
pub struct PolarCurve {
    reynolds: f64,
    alpha: Vec<f64>,
    cl: Vec<f64>,
    cd: Vec<f64>,
    xtr_top: Vec<f64>,
    xtr_bot: Vec<f64>,
}

impl PolarCurve {
    pub fn new(
        reynolds: f64,
        alpha: Vec<f64>,
        cl: Vec<f64>,
        cd: Vec<f64>,
        xtr_top: Vec<f64>,
        xtr_bot: Vec<f64>,
    ) -> FoilResult<Self> {
        if !reynolds.is_finite() || reynolds <= 0.0 {
            return Err(FoilError::InvalidCurve {
                what: "Reynolds number must be positive and finite",
            });
        }
        let n = alpha.len();
        if n == 0 {
            return Err(FoilError::InvalidCurve {
                what: "curve has no samples",
            });
        }
        if [cl.len(), cd.len(), xtr_top.len(), xtr_bot.len()]
            .iter()
            .any(|&len| len != n)
        {
            return Err(FoilError::InvalidCurve {
                what: "channel arrays differ in length",
            });
        }
        if [&alpha, &cl, &cd, &xtr_top, &xtr_bot]
            .iter()
            .any(|values| values.iter().any(|v| !v.is_finite()))
        {
            return Err(FoilError::InvalidCurve {
                what: "curve samples must be finite",
            });
        }
        Ok(Self {
            reynolds,
            alpha,
            cl,
            cd,
            xtr_top,
            xtr_bot,
        })
    }

    pub fn reynolds(&self) -> f64 {
        self.reynolds
    }

    pub fn len(&self) -> usize {
        self.alpha.len()
    }

    pub fn is_empty(&self) -> bool {
        self.alpha.is_empty()
    }

    pub fn channel(&self, channel: PolarChannel) -> &[f64] {
        match channel {
            PolarChannel::Alpha => &self.alpha,
            PolarChannel::Cl => &self.cl,
            PolarChannel::Cd => &self.cd,
            PolarChannel::XtrTop => &self.xtr_top,
            PolarChannel::XtrBot => &self.xtr_bot,
        }
    }

    /// Smallest and largest lift coefficient on the curve.
    pub fn cl_range(&self) -> (f64, f64) {
        self.cl
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &c| {
                (lo.min(c), hi.max(c))
            })
    }

    /// Interpolate `channel` at lift coefficient `cl`.
    ///
    /// Walks the samples in sweep order and uses the first segment whose
    /// endpoints bracket `cl`, so past stall the pre-stall branch wins.
    pub fn interpolate_at_cl(&self, cl: f64, channel: PolarChannel) -> ClLookup {
        let values = self.channel(channel);
        let (lo, hi) = self.cl_range();

        if !(cl >= lo && cl <= hi) {
            let target = if cl < lo { lo } else { hi };
            let idx = self.cl.iter().position(|&c| c == target).unwrap_or(0);
            return ClLookup {
                value: values[idx],
                out_of_range: true,
            };
        }

        for i in 0..self.cl.len().saturating_sub(1) {
            let (c0, c1) = (self.cl[i], self.cl[i + 1]);
            let bracketed = (c0 <= cl && cl <= c1) || (c1 <= cl && cl <= c0);
            if !bracketed {
                continue;
            }
            let value = if c1 == c0 {
                values[i]
            } else {
                lerp(values[i], values[i + 1], (cl - c0) / (c1 - c0))
            };
            return ClLookup {
                value,
                out_of_range: false,
            };
        }

        // Single-sample curve whose only lift value equals `cl`.
        ClLookup {
            value: values[0],
            out_of_range: false,
        }
    }
}
