use crate::VpError;

/// Floating point type used throughout system
pub type Real = f64;

pub fn ensure_finite(v: Real, what: &'static str) -> Result<Real, VpError> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(VpError::NonFinite { what, value: v })
    }
}

/// Linear blend `a + t * (b - a)`.
#[inline]
pub fn lerp(a: Real, b: Real, t: Real) -> Real {
    a + t * (b - a)
}
