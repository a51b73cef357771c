// ==============================================================================
// drift.rs — REAR GRIP MODE + COUNTER-DRIFT YAW TORQUE
// ==============================================================================
// Grip mode (visual rate):
//   rear sideways stiffness = drift held ? drift_wheel_friction : normal_wheel_friction
//   Straight toggle, no smoothing, no hysteresis. Front wheels are never touched.
//
// Counter-drift (fixed rate). Active only when ALL hold:
//   slip > drift_angle_start, drift held, gas != 0, 4 wheels grounded,
//   speed > counter_drift_start_speed
//
//   progress  = band(slip,  angle_start,  angle_stop)      0..1
//   speed_mod = band(speed, speed_start,  speed_stop)      0..1
//   magnitude = progress^2 * max_counter_drift_angular_accel * speed_mod
//
//   direction = dot(right, v) > 1 ? +1 : -1
//   if sign(yaw_rate) == direction && sign(round(dot(v, forward))) != -1:
//       direction = 0        (already rotating the right way; don't fight it)
//
//   torque = yaw_axis * magnitude * direction   (acceleration mode)
// ==============================================================================

use serde::Serialize;

use crate::handling::math::{band_progress, sign};
use crate::handling::types::{ForceMode, MotionState, PerWheel, TorqueCommand, WheelCommand};
use crate::settings::VehicleSettings;

/// Lateral speed (m/s) above which the slide counts as going right.
pub const LATERAL_DIRECTION_THRESHOLD: f32 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum GripMode {
    Normal,
    Drift,
}

impl GripMode {
    pub fn from_input(drift_held: bool) -> Self {
        if drift_held { GripMode::Drift } else { GripMode::Normal }
    }

    pub fn rear_stiffness(self, settings: &VehicleSettings) -> f32 {
        match self {
            GripMode::Normal => settings.normal_wheel_friction,
            GripMode::Drift => settings.drift_wheel_friction,
        }
    }
}

pub fn apply_grip_mode(commands: &mut PerWheel<WheelCommand>, stiffness: f32) {
    commands.rl.sideways_stiffness = Some(stiffness);
    commands.rr.sideways_stiffness = Some(stiffness);
}

/// Everything the counter-drift rule reads for one physics tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CounterDriftInput {
    pub slip_angle: f32,
    pub speed: f32,
    pub gas: f32,
    pub drift_held: bool,
    pub fully_grounded: bool,
    /// dot(right, velocity)
    pub lateral_velocity: f32,
    /// dot(velocity, forward)
    pub forward_velocity: f32,
    /// Positive when turning right.
    pub yaw_rate: f32,
}

impl CounterDriftInput {
    pub fn from_motion(motion: &MotionState, slip_angle: f32, speed: f32, gas: f32, drift_held: bool) -> Self {
        Self {
            slip_angle,
            speed,
            gas,
            drift_held,
            fully_grounded: motion.fully_grounded(),
            lateral_velocity: motion.right().dot(&motion.velocity),
            forward_velocity: motion.velocity.dot(&motion.forward()),
            yaw_rate: motion.yaw_rate(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct CounterDrift {
    /// Unsigned angular acceleration, rad/s^2.
    pub magnitude: f32,
    /// -1, 0 or +1 (+1 swings the nose right).
    pub direction: i8,
}

impl CounterDrift {
    pub fn signed(&self) -> f32 {
        self.magnitude * f32::from(self.direction)
    }
}

pub fn is_active(settings: &VehicleSettings, i: &CounterDriftInput) -> bool {
    i.slip_angle > settings.max_drift_angle_start
        && i.drift_held
        && i.gas != 0.0
        && i.fully_grounded
        && i.speed > settings.counter_drift_start_speed
}

pub fn counter_drift_magnitude(settings: &VehicleSettings, slip_angle: f32, speed: f32) -> f32 {
    let progress = band_progress(slip_angle, settings.max_drift_angle_start, settings.max_drift_angle_stop);
    let speed_mod = band_progress(speed, settings.counter_drift_start_speed, settings.counter_drift_stop_speed);
    progress * progress * settings.max_counter_drift_angular_accel * speed_mod
}

pub fn counter_drift_direction(i: &CounterDriftInput) -> i8 {
    let direction: i8 = if i.lateral_velocity > LATERAL_DIRECTION_THRESHOLD { 1 } else { -1 };

    let yaw_sign = sign(i.yaw_rate) as i8;
    let still_forward = sign(i.forward_velocity.round_ties_even()) != -1.0;
    if yaw_sign == direction && still_forward {
        return 0;
    }
    direction
}

pub fn solve_counter_drift(settings: &VehicleSettings, i: &CounterDriftInput) -> CounterDrift {
    if !is_active(settings, i) {
        return CounterDrift::default();
    }
    CounterDrift {
        magnitude: counter_drift_magnitude(settings, i.slip_angle, i.speed),
        direction: counter_drift_direction(i),
    }
}

/// Torque command about the yaw axis; None when nothing would be applied.
pub fn counter_drift_torque(motion: &MotionState, drift: &CounterDrift) -> Option<TorqueCommand> {
    let signed = drift.signed();
    if signed == 0.0 {
        return None;
    }
    Some(TorqueCommand {
        torque: motion.yaw_axis() * signed,
        mode: ForceMode::Acceleration,
    })
}
