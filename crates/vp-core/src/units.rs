// vp-core/src/units.rs

use uom::si::angle::degree;
use uom::si::f64::Angle as UomAngle;

/// Angle of attack and other planar angles.
pub type Angle = UomAngle;

#[inline]
pub fn deg(v: f64) -> Angle {
    Angle::new::<degree>(v)
}

#[inline]
pub fn to_deg(a: Angle) -> f64 {
    a.get::<degree>()
}
