//! Bracket-then-blend lookup over Reynolds-sorted polar curves.
//!
//! Lift coefficient is resolved inside each curve; Reynolds number is
//! resolved by linear blending between the two bracketing curves. Outside
//! the Reynolds ladder the nearest curve answers alone. There is no
//! extrapolation in lift coefficient.

use vp_core::lerp;
use vp_foil::{PolarChannel, PolarCurve};
use vp_predictor::{PredictorError, PredictorResult};

/// Viscous values at one (re, cl).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlrPoint {
    pub cd: f64,
    pub xtr_top: f64,
    pub xtr_bot: f64,
}

/// Where a Reynolds number falls among the curves.
#[derive(Debug, Clone, Copy)]
pub enum Bracket<'a> {
    /// Below the lowest curve.
    Below(&'a PolarCurve),
    /// Above the highest curve.
    Above(&'a PolarCurve),
    /// Equal to a curve's Reynolds number.
    Exact(&'a PolarCurve),
    Between {
        lower: &'a PolarCurve,
        upper: &'a PolarCurve,
    },
}

/// Locate `re` among `curves`, which must be sorted ascending by Reynolds number.
///
/// Returns `None` only for an empty slice.
pub fn bracket(curves: &[PolarCurve], re: f64) -> Option<Bracket<'_>> {
    let first = curves.first()?;
    let last = curves.last()?;

    let upper_idx = curves.partition_point(|c| c.reynolds() < re);
    let bracket = match curves.get(upper_idx) {
        None => Bracket::Above(last),
        Some(upper) if upper.reynolds() == re => Bracket::Exact(upper),
        Some(_) if upper_idx == 0 => Bracket::Below(first),
        Some(upper) => Bracket::Between {
            lower: &curves[upper_idx - 1],
            upper,
        },
    };
    Some(bracket)
}

/// Resolve all three outputs on one curve at `cl`.
pub fn curve_point(curve: &PolarCurve, cl: f64) -> PredictorResult<PlrPoint> {
    let mut values = [0.0; 3];
    for (slot, channel) in values
        .iter_mut()
        .zip([PolarChannel::Cd, PolarChannel::XtrTop, PolarChannel::XtrBot])
    {
        let lookup = curve.interpolate_at_cl(cl, channel);
        if lookup.out_of_range {
            return Err(PredictorError::OutOfDomain {
                cl,
                re: curve.reynolds(),
            });
        }
        *slot = lookup.value;
    }
    Ok(PlrPoint {
        cd: values[0],
        xtr_top: values[1],
        xtr_bot: values[2],
    })
}

/// Answer (re, cl) from a sorted curve set.
pub fn interpolate(curves: &[PolarCurve], re: f64, cl: f64) -> PredictorResult<PlrPoint> {
    if !re.is_finite() || !cl.is_finite() {
        return Err(PredictorError::InvalidRequest {
            what: format!("non-finite lookup (re={re}, cl={cl})"),
        });
    }

    match bracket(curves, re) {
        None => Err(PredictorError::TargetMissing {
            what: "no polar curves to interpolate",
        }),
        Some(Bracket::Below(curve) | Bracket::Above(curve) | Bracket::Exact(curve)) => {
            curve_point(curve, cl)
        }
        Some(Bracket::Between { lower, upper }) => {
            let lo = curve_point(lower, cl)?;
            let hi = curve_point(upper, cl)?;
            let t = (re - lower.reynolds()) / (upper.reynolds() - lower.reynolds());
            Ok(PlrPoint {
                cd: lerp(lo.cd, hi.cd, t),
                xtr_top: lerp(lo.xtr_top, hi.xtr_top, t),
                xtr_bot: lerp(lo.xtr_bot, hi.xtr_bot, t),
            })
        }
    }
}
