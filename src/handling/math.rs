// ==============================================================================
// math.rs — SCALAR + ANGLE HELPERS
// ------------------------------------------------------------------------------
// Small helpers shared by the handling models. Semantics follow the usual
// game-engine conventions the tuning was authored against:
// - lerp clamps t to 0..1
// - inverse_lerp returns 0 for an empty range
// - angle() is unsigned degrees in 0..180, 0 for degenerate vectors
// - sign(0) = +1
// ==============================================================================

use crate::handling::types::Vec3;

const EPS_SQ: f32 = 1e-15;

#[inline]
pub fn clamp01(v: f32) -> f32 {
    if v.is_nan() { 0.0 } else { v.clamp(0.0, 1.0) }
}

#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * clamp01(t)
}

#[inline]
pub fn inverse_lerp(a: f32, b: f32, v: f32) -> f32 {
    if a == b { 0.0 } else { clamp01((v - a) / (b - a)) }
}

/// Progress of `v` through the band `start..stop`, clamped to 0..1.
///
/// A band with `stop <= start` (or non-finite ends) yields 0 everywhere, so a
/// mistuned band switches its feature off instead of saturating it.
#[inline]
pub fn band_progress(v: f32, start: f32, stop: f32) -> f32 {
    let span = stop - start;
    if span <= 0.0 || !span.is_finite() {
        return 0.0;
    }
    clamp01((v - start) / span)
}

/// +1 for v >= 0, -1 otherwise.
#[inline]
pub fn sign(v: f32) -> f32 {
    if v >= 0.0 { 1.0 } else { -1.0 }
}

/// Unsigned angle between two vectors in degrees.
pub fn angle(from: &Vec3, to: &Vec3) -> f32 {
    let denom = (from.norm_squared() * to.norm_squared()).sqrt();
    if denom < EPS_SQ {
        return 0.0;
    }
    let cos = (from.dot(to) / denom).clamp(-1.0, 1.0);
    cos.acos().to_degrees()
}

/// Angle between two vectors in degrees, signed by `axis`.
pub fn signed_angle(from: &Vec3, to: &Vec3, axis: &Vec3) -> f32 {
    let unsigned = angle(from, to);
    unsigned * sign(axis.dot(&from.cross(to)))
}

#[inline]
pub fn mps_to_kph(v: f32) -> f32 { v * 3.6 }

#[inline]
pub fn kph_to_mps(v: f32) -> f32 { v / 3.6 }
