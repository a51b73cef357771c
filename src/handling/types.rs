//! Core shared types for `handling` (engine-agnostic).
// handling/types.rs
use std::fmt;
use std::ops::{Index, IndexMut};

use nalgebra::{Point3, UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};

pub type Vec3 = Vector3<f32>;
pub type Point = Point3<f32>;
pub type Rotation = UnitQuaternion<f32>;

// ----- local chassis frame (right-handed, Y up) -----
// +Z forward, +Y up, -X right
pub const LOCAL_FORWARD: Vec3 = Vec3::new(0.0, 0.0, 1.0);
pub const LOCAL_UP: Vec3 = Vec3::new(0.0, 1.0, 0.0);
pub const LOCAL_RIGHT: Vec3 = Vec3::new(-1.0, 0.0, 0.0);

// ============================================
// Wheel identification
// ============================================

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum WheelId { FL, FR, RL, RR }

impl WheelId {
    pub const ALL: [WheelId; 4] = [WheelId::FL, WheelId::FR, WheelId::RL, WheelId::RR];

    pub fn as_str(&self) -> &'static str {
        match self {
            WheelId::FL => "FL",
            WheelId::FR => "FR",
            WheelId::RL => "RL",
            WheelId::RR => "RR",
        }
    }

    pub fn is_front(&self) -> bool {
        matches!(self, WheelId::FL | WheelId::FR)
    }

    pub fn is_rear(&self) -> bool {
        matches!(self, WheelId::RL | WheelId::RR)
    }
}

impl fmt::Display for WheelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Fixed four-slot storage indexed by wheel role.
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PerWheel<T> {
    pub fl: T,
    pub fr: T,
    pub rl: T,
    pub rr: T,
}

impl<T> PerWheel<T> {
    pub fn from_fn(mut f: impl FnMut(WheelId) -> T) -> Self {
        Self {
            fl: f(WheelId::FL),
            fr: f(WheelId::FR),
            rl: f(WheelId::RL),
            rr: f(WheelId::RR),
        }
    }

    pub fn map<U>(&self, mut f: impl FnMut(WheelId, &T) -> U) -> PerWheel<U> {
        PerWheel::from_fn(|id| f(id, &self[id]))
    }

    pub fn iter(&self) -> impl Iterator<Item = (WheelId, &T)> {
        WheelId::ALL.into_iter().map(move |id| (id, &self[id]))
    }

    pub fn all(&self, mut pred: impl FnMut(&T) -> bool) -> bool {
        WheelId::ALL.iter().all(|&id| pred(&self[id]))
    }
}

impl<T> Index<WheelId> for PerWheel<T> {
    type Output = T;

    fn index(&self, id: WheelId) -> &T {
        match id {
            WheelId::FL => &self.fl,
            WheelId::FR => &self.fr,
            WheelId::RL => &self.rl,
            WheelId::RR => &self.rr,
        }
    }
}

impl<T> IndexMut<WheelId> for PerWheel<T> {
    fn index_mut(&mut self, id: WheelId) -> &mut T {
        match id {
            WheelId::FL => &mut self.fl,
            WheelId::FR => &mut self.fr,
            WheelId::RL => &mut self.rl,
            WheelId::RR => &mut self.rr,
        }
    }
}

// ============================================
// ----- inputs -------------------------------
// ============================================

/// One driver input sample, held for the whole visual frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct InputSample {
    pub gas: f32,      // -1..1
    pub steering: f32, // -1..1 (+ = right)
    pub drift: bool,
    pub boost: bool,
}

impl InputSample {
    /// NaN axes read as released, everything else is clamped to -1..1.
    pub fn sanitized(self) -> Self {
        let axis = |v: f32| if v.is_finite() { v.clamp(-1.0, 1.0) } else { 0.0 };
        Self {
            gas: axis(self.gas),
            steering: axis(self.steering),
            ..self
        }
    }
}

// ============================================
// ----- motion (read from the physics host) --
// ============================================

/// Per-wheel state as reported by the physics host.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WheelMotion {
    pub grounded: bool,
    /// Wheel centre (world).
    pub position: Point,
    /// Suspension mount (world); force application points hang below it.
    pub mount: Point,
    /// Wheel up axis (world).
    pub up: Vec3,
    /// Physical steer angle currently applied, degrees.
    pub steer_angle: f32,
    pub rpm: f32,
    pub forward_slip: f32,
    pub sideways_slip: f32,
}

impl Default for WheelMotion {
    fn default() -> Self {
        Self {
            grounded: false,
            position: Point::origin(),
            mount: Point::origin(),
            up: LOCAL_UP,
            steer_angle: 0.0,
            rpm: 0.0,
            forward_slip: 0.0,
            sideways_slip: 0.0,
        }
    }
}

/// Chassis motion sampled from the rigid body.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionState {
    pub velocity: Vec3,
    pub angular_velocity: Vec3,
    pub rotation: Rotation,
    pub wheels: PerWheel<WheelMotion>,
}

impl Default for MotionState {
    fn default() -> Self {
        Self {
            velocity: Vec3::zeros(),
            angular_velocity: Vec3::zeros(),
            rotation: Rotation::identity(),
            wheels: PerWheel::default(),
        }
    }
}

impl MotionState {
    pub fn forward(&self) -> Vec3 { self.rotation * LOCAL_FORWARD }
    pub fn right(&self) -> Vec3 { self.rotation * LOCAL_RIGHT }
    pub fn up(&self) -> Vec3 { self.rotation * LOCAL_UP }

    /// Axis about which a positive rotation swings the nose toward `right`.
    pub fn yaw_axis(&self) -> Vec3 {
        self.forward().cross(&self.right())
    }

    /// Axis about which a positive rotation rolls a wheel's top toward `forward`.
    pub fn roll_axis(&self) -> Vec3 {
        self.up().cross(&self.forward())
    }

    /// Yaw rate, positive when turning right.
    pub fn yaw_rate(&self) -> f32 {
        self.angular_velocity.dot(&self.yaw_axis())
    }

    pub fn speed(&self) -> f32 {
        self.velocity.norm()
    }

    pub fn fully_grounded(&self) -> bool {
        self.wheels.all(|w| w.grounded)
    }
}

// ============================================
// ----- commands (written to the host) -------
// ============================================

/// Per-wheel command slots. `None` leaves the host's current value alone.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct WheelCommand {
    pub steer_angle: Option<f32>,        // degrees
    pub motor_torque: Option<f32>,       // N*m
    pub brake_torque: Option<f32>,       // N*m
    pub sideways_stiffness: Option<f32>, // friction curve multiplier
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ForceMode {
    /// Newtons; the host scales by dt.
    Force,
    /// m/s^2 (or rad/s^2 for torques); mass and inertia are ignored.
    Acceleration,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct ForceCommand {
    /// World-space force (or acceleration, see `mode`).
    pub force: Vec3,
    /// Optional application point (world). If None => apply at COM.
    pub at_point: Option<Point>,
    pub mode: ForceMode,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct TorqueCommand {
    pub torque: Vec3,
    pub mode: ForceMode,
}

/// Visual transform for one wheel mesh.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct WheelPose {
    pub position: Point,
    pub rotation: Rotation,
}

impl Default for WheelPose {
    fn default() -> Self {
        Self { position: Point::origin(), rotation: Rotation::identity() }
    }
}

/// Opaque handle of an externally owned particle emitter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EmitterId(pub u64);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum Emission { Play, Stop }

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct ParticleCommand {
    pub emitter: EmitterId,
    pub emission: Emission,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn per_wheel_indexes_by_role() {
        let mut w = PerWheel::from_fn(|id| id.as_str().to_string());
        assert_eq!(w[WheelId::RL], "RL");
        w[WheelId::FR] = "x".into();
        assert_eq!(w.fr, "x");
        let order: Vec<_> = w.iter().map(|(id, _)| id).collect();
        assert_eq!(order, WheelId::ALL.to_vec());
    }

    #[test]
    fn sanitize_clamps_and_zeroes_nan() {
        let s = InputSample { gas: f32::NAN, steering: 3.0, drift: true, boost: false }.sanitized();
        assert_eq!(s.gas, 0.0);
        assert_eq!(s.steering, 1.0);
        assert!(s.drift);
    }

    #[test]
    fn identity_frame_axes() {
        let m = MotionState::default();
        assert_eq!(m.forward(), LOCAL_FORWARD);
        assert_eq!(m.right(), LOCAL_RIGHT);
        // forward x right points down in a right-handed Y-up frame
        assert_eq!(m.yaw_axis(), Vec3::new(0.0, -1.0, 0.0));
        assert_eq!(m.roll_axis(), Vec3::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn yaw_rate_positive_when_turning_right() {
        // rotating about -Y swings +Z toward -X (right)
        let m = MotionState {
            angular_velocity: Vec3::new(0.0, -2.0, 0.0),
            ..MotionState::default()
        };
        assert!(m.yaw_rate() > 0.0);
    }
}
