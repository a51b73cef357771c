//! Immutable vehicle tuning.
//!
//! `VehicleSettings` is the whole configuration surface of the controller. The
//! defaults are the stock car; a JSON file can override any subset of fields.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::curve::{Curve, Keyframe};
use crate::error::{SettingsError, SettingsWarning};
use crate::handling::types::Vec3;

/// Spring/damper pair of a wheel's suspension.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct JointSpring {
    pub spring: f32,          // N/m
    pub damper: f32,          // N*s/m
    pub target_position: f32, // 0..1 of suspension travel
}

/// Tire friction as a function of slip: rises to the extremum, settles to the
/// asymptote, then stays flat. Output is scaled by `stiffness`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrictionCurve {
    pub extremum_slip: f32,
    pub extremum_value: f32,
    pub asymptote_slip: f32,
    pub asymptote_value: f32,
    pub stiffness: f32,
}

impl FrictionCurve {
    pub fn evaluate(&self, slip: f32) -> f32 {
        let s = slip.abs();
        let raw = if s <= self.extremum_slip {
            if self.extremum_slip > 0.0 {
                self.extremum_value * smooth(s / self.extremum_slip)
            } else {
                self.extremum_value
            }
        } else if s < self.asymptote_slip {
            let t = (s - self.extremum_slip) / (self.asymptote_slip - self.extremum_slip);
            self.extremum_value + (self.asymptote_value - self.extremum_value) * smooth(t)
        } else {
            self.asymptote_value
        };
        raw * self.stiffness
    }

    /// Same curve with a different stiffness multiplier.
    pub fn with_stiffness(self, stiffness: f32) -> Self {
        Self { stiffness, ..self }
    }
}

#[inline]
fn smooth(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// Physical wheel description handed to the physics host.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WheelSettings {
    pub mass: f32,
    pub radius: f32,
    pub damping_rate: f32,
    pub suspension_distance: f32,
    /// Distance below the mount at which wheel forces are applied.
    pub force_app_point_distance: f32,
    /// Wheel centre offset relative to its mount (local).
    pub center: Vec3,
    pub suspension_spring: JointSpring,
    pub forward_friction: FrictionCurve,
    pub sideways_friction: FrictionCurve,
}

impl Default for WheelSettings {
    fn default() -> Self {
        Self {
            mass: 10.0,
            radius: 0.28,
            damping_rate: 1.0,
            suspension_distance: 0.15,
            force_app_point_distance: 0.0,
            center: Vec3::zeros(),
            suspension_spring: JointSpring {
                spring: 45_000.0,
                damper: 4_500.0,
                target_position: 0.85,
            },
            // Peak first, then settle: the stock asset lists these pairs
            // under swapped extremum/asymptote labels.
            forward_friction: FrictionCurve {
                extremum_slip: 0.4,
                extremum_value: 1.0,
                asymptote_slip: 0.8,
                asymptote_value: 0.5,
                stiffness: 1.0,
            },
            sideways_friction: FrictionCurve {
                extremum_slip: 0.2,
                extremum_value: 1.0,
                asymptote_slip: 0.5,
                asymptote_value: 0.75,
                stiffness: 2.0,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VehicleSettings {
    pub front_wheels: WheelSettings,
    pub back_wheels: WheelSettings,

    // --- Steering ---
    /// Largest steer angle shown on the wheel meshes, degrees.
    pub visual_max_steering_angle: f32,
    /// speed (m/s) -> max steering angle (degrees)
    pub steering_curve: Curve,
    pub steer_lerp_speed: f32,

    // --- Drift ---
    pub normal_wheel_friction: f32,
    pub drift_wheel_friction: f32,
    /// Slip angle (degrees) where counter-drift torque begins.
    pub max_drift_angle_start: f32,
    /// Slip angle (degrees) where counter-drift torque is at maximum.
    pub max_drift_angle_stop: f32,
    pub counter_drift_start_speed: f32, // m/s
    pub counter_drift_stop_speed: f32,  // m/s
    pub max_counter_drift_angular_accel: f32,

    // --- Boost ---
    pub boost_force: f32,
    /// Reservoir size in seconds of boosting.
    pub max_boost: f32,
    pub boost_recharge_rate: f32,
    pub max_boost_recharge_cooldown: f32,

    // --- Braking ---
    pub brake_power: f32,

    // --- Torque / acceleration ---
    /// speed / max_speed -> fraction of max torque
    pub torque_curve: Curve,
    pub max_torque: f32,
    /// Launch-assist acceleration at standstill, m/s^2.
    pub initial_acceleration: f32,
    pub initial_acceleration_max_speed: f32,
    /// Speed (m/s) the torque curve is normalised against.
    pub max_speed: f32,
}

impl Default for VehicleSettings {
    fn default() -> Self {
        Self {
            front_wheels: WheelSettings::default(),
            back_wheels: WheelSettings::default(),

            visual_max_steering_angle: 45.0,
            steering_curve: Curve {
                keys: vec![Keyframe::flat(0.0, 30.0), Keyframe::new(60.0, 10.0, -0.5, -0.5)],
            },
            steer_lerp_speed: 10.0,

            normal_wheel_friction: 2.0,
            drift_wheel_friction: 0.75,
            max_drift_angle_start: 60.0,
            max_drift_angle_stop: 90.0,
            counter_drift_start_speed: 5.0,
            counter_drift_stop_speed: 10.0,
            max_counter_drift_angular_accel: 25.0,

            boost_force: 10.0,
            max_boost: 3.0,
            boost_recharge_rate: 0.5,
            max_boost_recharge_cooldown: 2.0,

            brake_power: 5_000.0,

            torque_curve: Curve {
                keys: vec![
                    Keyframe::new(0.0, 0.25, 7.0, 3.5),
                    Keyframe::flat(0.5, 1.0),
                    Keyframe::flat(1.0, 0.0),
                ],
            },
            max_torque: 1_500.0,
            initial_acceleration: 10.0,
            initial_acceleration_max_speed: 15.0,
            max_speed: 20.0,
        }
    }
}

impl VehicleSettings {
    pub fn from_json_str(json: &str) -> Result<Self, SettingsError> {
        let settings: Self = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    pub fn wheel(&self, front: bool) -> &WheelSettings {
        if front { &self.front_wheels } else { &self.back_wheels }
    }

    /// Hard failures: values the per-step math cannot survive.
    pub fn validate(&self) -> Result<(), SettingsError> {
        let scalars = [
            ("visual_max_steering_angle", self.visual_max_steering_angle),
            ("steer_lerp_speed", self.steer_lerp_speed),
            ("normal_wheel_friction", self.normal_wheel_friction),
            ("drift_wheel_friction", self.drift_wheel_friction),
            ("max_drift_angle_start", self.max_drift_angle_start),
            ("max_drift_angle_stop", self.max_drift_angle_stop),
            ("counter_drift_start_speed", self.counter_drift_start_speed),
            ("counter_drift_stop_speed", self.counter_drift_stop_speed),
            ("max_counter_drift_angular_accel", self.max_counter_drift_angular_accel),
            ("boost_force", self.boost_force),
            ("max_boost", self.max_boost),
            ("boost_recharge_rate", self.boost_recharge_rate),
            ("max_boost_recharge_cooldown", self.max_boost_recharge_cooldown),
            ("brake_power", self.brake_power),
            ("max_torque", self.max_torque),
            ("initial_acceleration", self.initial_acceleration),
            ("initial_acceleration_max_speed", self.initial_acceleration_max_speed),
            ("max_speed", self.max_speed),
        ];
        for (field, value) in scalars {
            if !value.is_finite() {
                return Err(SettingsError::NonFinite { field });
            }
        }

        let positive = [
            ("max_speed", self.max_speed),
            ("max_boost", self.max_boost),
            ("front_wheels.radius", self.front_wheels.radius),
            ("back_wheels.radius", self.back_wheels.radius),
        ];
        for (field, value) in positive {
            if value <= 0.0 || !value.is_finite() {
                return Err(SettingsError::NonPositive { field, value });
            }
        }

        self.steering_curve
            .validate()
            .map_err(|source| SettingsError::Curve { name: "steering_curve", source })?;
        self.torque_curve
            .validate()
            .map_err(|source| SettingsError::Curve { name: "torque_curve", source })?;

        Ok(())
    }

    /// Soft failures: loadable, but the affected feature evaluates to zero.
    pub fn warnings(&self) -> Vec<SettingsWarning> {
        let mut out = Vec::new();
        if self.max_drift_angle_stop <= self.max_drift_angle_start {
            out.push(SettingsWarning::DriftAngleBand {
                start: self.max_drift_angle_start,
                stop: self.max_drift_angle_stop,
            });
        }
        if self.counter_drift_stop_speed <= self.counter_drift_start_speed {
            out.push(SettingsWarning::CounterDriftSpeedBand {
                start: self.counter_drift_start_speed,
                stop: self.counter_drift_stop_speed,
            });
        }
        if self.boost_recharge_rate < 0.0 {
            out.push(SettingsWarning::NegativeBoostRecharge { rate: self.boost_recharge_rate });
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn defaults_are_valid_and_quiet() {
        let s = VehicleSettings::default();
        assert!(s.validate().is_ok());
        assert!(s.warnings().is_empty());
        assert_abs_diff_eq!(s.steering_curve.evaluate(0.0), 30.0);
        assert_abs_diff_eq!(s.torque_curve.evaluate(0.0), 0.25);
    }

    #[test]
    fn partial_json_overrides_defaults() {
        let s = VehicleSettings::from_json_str(r#"{ "max_speed": 40.0, "boost_force": 25.0 }"#);
        let s = match s {
            Ok(s) => s,
            Err(e) => panic!("{e}"),
        };
        assert_eq!(s.max_speed, 40.0);
        assert_eq!(s.boost_force, 25.0);
        assert_eq!(s.max_torque, 1_500.0);
    }

    #[test]
    fn rejects_zero_max_speed() {
        let err = VehicleSettings::from_json_str(r#"{ "max_speed": 0.0 }"#);
        assert!(matches!(err, Err(SettingsError::NonPositive { field: "max_speed", .. })));
    }

    #[test]
    fn rejects_empty_curve() {
        let err = VehicleSettings::from_json_str(r#"{ "torque_curve": [] }"#);
        assert!(matches!(err, Err(SettingsError::Curve { name: "torque_curve", .. })));
    }

    #[test]
    fn inverted_bands_only_warn() {
        let s = VehicleSettings {
            max_drift_angle_start: 90.0,
            max_drift_angle_stop: 60.0,
            counter_drift_start_speed: 10.0,
            counter_drift_stop_speed: 10.0,
            ..VehicleSettings::default()
        };
        assert!(s.validate().is_ok());
        assert_eq!(s.warnings().len(), 2);
    }

    #[test]
    fn negative_recharge_rate_only_warns() {
        let s = VehicleSettings { boost_recharge_rate: -0.5, ..VehicleSettings::default() };
        assert!(s.validate().is_ok());
        assert_eq!(s.warnings(), vec![SettingsWarning::NegativeBoostRecharge { rate: -0.5 }]);
    }

    #[test]
    fn stock_friction_curves_peak_before_settling() {
        let w = WheelSettings::default();
        for c in [w.forward_friction, w.sideways_friction] {
            assert!(c.extremum_slip < c.asymptote_slip);
            assert!(c.evaluate(c.extremum_slip) > c.evaluate(c.asymptote_slip));
        }
        assert_eq!((w.forward_friction.extremum_slip, w.forward_friction.extremum_value), (0.4, 1.0));
        assert_eq!((w.sideways_friction.asymptote_slip, w.sideways_friction.asymptote_value), (0.5, 0.75));
    }

    #[test]
    fn friction_curve_shape() {
        let c = WheelSettings::default().sideways_friction;
        assert_eq!(c.evaluate(0.0), 0.0);
        assert_abs_diff_eq!(c.evaluate(0.2), 2.0, epsilon = 1e-5);
        assert_abs_diff_eq!(c.evaluate(5.0), 1.5, epsilon = 1e-5);
        assert_abs_diff_eq!(c.with_stiffness(0.75).evaluate(5.0), 0.5625, epsilon = 1e-5);
        assert_eq!(c.evaluate(-0.2), c.evaluate(0.2));
    }
}
