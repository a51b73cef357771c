//! Keyframe response curves (steering-vs-speed, torque-vs-speed-ratio).
//!
//! A curve is a list of keys with per-key in/out tangents. Between keys the
//! value follows a cubic Hermite segment; outside the key range the curve holds
//! the first/last value. The handling code only ever calls [`Curve::evaluate`].

use serde::{Deserialize, Serialize};

use crate::error::CurveError;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Keyframe {
    pub time: f32,
    pub value: f32,
    #[serde(default)]
    pub in_tangent: f32,
    #[serde(default)]
    pub out_tangent: f32,
}

impl Keyframe {
    pub const fn new(time: f32, value: f32, in_tangent: f32, out_tangent: f32) -> Self {
        Self { time, value, in_tangent, out_tangent }
    }

    /// Key with flat tangents.
    pub const fn flat(time: f32, value: f32) -> Self {
        Self::new(time, value, 0.0, 0.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Curve {
    pub keys: Vec<Keyframe>,
}

impl Curve {
    pub fn new(keys: Vec<Keyframe>) -> Result<Self, CurveError> {
        let curve = Self { keys };
        curve.validate()?;
        Ok(curve)
    }

    pub fn constant(value: f32) -> Self {
        Self { keys: vec![Keyframe::flat(0.0, value)] }
    }

    /// Straight segments through `points`; tangents are the segment slopes so
    /// the Hermite interpolation reproduces the lines exactly.
    pub fn piecewise_linear(points: &[(f32, f32)]) -> Result<Self, CurveError> {
        let slope = |a: (f32, f32), b: (f32, f32)| {
            let dt = b.0 - a.0;
            if dt > 0.0 { (b.1 - a.1) / dt } else { 0.0 }
        };

        let keys = points
            .iter()
            .enumerate()
            .map(|(i, &p)| {
                let in_tangent = if i > 0 { slope(points[i - 1], p) } else { 0.0 };
                let out_tangent = points.get(i + 1).map_or(0.0, |&n| slope(p, n));
                Keyframe::new(p.0, p.1, in_tangent, out_tangent)
            })
            .collect();

        Self::new(keys)
    }

    pub fn validate(&self) -> Result<(), CurveError> {
        if self.keys.is_empty() {
            return Err(CurveError::Empty);
        }
        for (index, k) in self.keys.iter().enumerate() {
            let finite = k.time.is_finite()
                && k.value.is_finite()
                && k.in_tangent.is_finite()
                && k.out_tangent.is_finite();
            if !finite {
                return Err(CurveError::NonFinite { index });
            }
            if index > 0 && k.time <= self.keys[index - 1].time {
                return Err(CurveError::Unsorted { index, time: k.time });
            }
        }
        Ok(())
    }

    pub fn evaluate(&self, x: f32) -> f32 {
        let (Some(first), Some(last)) = (self.keys.first(), self.keys.last()) else {
            return 0.0;
        };

        if x.is_nan() || x <= first.time {
            return first.value;
        }
        if x >= last.time {
            return last.value;
        }

        // first key strictly after x; guaranteed 1..len by the range checks
        let hi = self.keys.partition_point(|k| k.time <= x);
        let k0 = &self.keys[hi - 1];
        let k1 = &self.keys[hi];

        hermite(k0, k1, x)
    }
}

fn hermite(k0: &Keyframe, k1: &Keyframe, x: f32) -> f32 {
    let dt = k1.time - k0.time;
    let t = (x - k0.time) / dt;
    let t2 = t * t;
    let t3 = t2 * t;

    let m0 = k0.out_tangent * dt;
    let m1 = k1.in_tangent * dt;

    let h00 = 2.0 * t3 - 3.0 * t2 + 1.0;
    let h10 = t3 - 2.0 * t2 + t;
    let h01 = -2.0 * t3 + 3.0 * t2;
    let h11 = t3 - t2;

    h00 * k0.value + h10 * m0 + h01 * k1.value + h11 * m1
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn must<T, E: std::fmt::Debug>(r: Result<T, E>) -> T {
        match r {
            Ok(v) => v,
            Err(e) => panic!("unexpected error: {e:?}"),
        }
    }

    #[test]
    fn clamps_outside_key_range() {
        let c = Curve { keys: vec![Keyframe::flat(0.0, 30.0), Keyframe::new(60.0, 10.0, -0.5, -0.5)] };
        assert_eq!(c.evaluate(-5.0), 30.0);
        assert_eq!(c.evaluate(0.0), 30.0);
        assert_eq!(c.evaluate(60.0), 10.0);
        assert_eq!(c.evaluate(500.0), 10.0);
    }

    #[test]
    fn hits_interior_keys_exactly() {
        let c = Curve {
            keys: vec![
                Keyframe::new(0.0, 0.25, 7.0, 3.5),
                Keyframe::flat(0.5, 1.0),
                Keyframe::flat(1.0, 0.0),
            ],
        };
        assert_abs_diff_eq!(c.evaluate(0.5), 1.0, epsilon = 1e-6);
        assert_abs_diff_eq!(c.evaluate(0.0), 0.25, epsilon = 1e-6);
        assert_abs_diff_eq!(c.evaluate(1.0), 0.0, epsilon = 1e-6);
    }

    #[test]
    fn piecewise_linear_is_linear() {
        let c = must(Curve::piecewise_linear(&[(0.0, 30.0), (60.0, 10.0)]));
        assert_abs_diff_eq!(c.evaluate(30.0), 20.0, epsilon = 1e-4);
        assert_abs_diff_eq!(c.evaluate(15.0), 25.0, epsilon = 1e-4);
    }

    #[test]
    fn flat_segment_is_smooth_step() {
        let c = Curve { keys: vec![Keyframe::flat(0.0, 0.0), Keyframe::flat(1.0, 1.0)] };
        assert_abs_diff_eq!(c.evaluate(0.5), 0.5, epsilon = 1e-6);
        assert!(c.evaluate(0.25) < 0.25);
    }

    #[test]
    fn rejects_bad_keys() {
        assert_eq!(Curve::new(vec![]), Err(CurveError::Empty));
        assert_eq!(
            Curve::new(vec![Keyframe::flat(1.0, 0.0), Keyframe::flat(1.0, 1.0)]),
            Err(CurveError::Unsorted { index: 1, time: 1.0 })
        );
        assert_eq!(
            Curve::new(vec![Keyframe::flat(0.0, f32::NAN)]),
            Err(CurveError::NonFinite { index: 0 })
        );
    }

    #[test]
    fn deserializes_from_key_list() {
        let c: Curve = must(serde_json::from_str(r#"[{"time":0,"value":2},{"time":1,"value":4}]"#));
        assert_eq!(c.keys.len(), 2);
        assert_eq!(c.keys[1].in_tangent, 0.0);
        assert_eq!(Curve::constant(3.0).evaluate(99.0), 3.0);
    }
}
