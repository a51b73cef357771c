// ==============================================================================
// longitudinal.rs — BRAKE + DRIVE (MOTOR TORQUE + LAUNCH ASSIST)
// ==============================================================================
// Brake (visual rate):
//   moving = dot(forward, velocity)
//   1) moving < -0.5 && gas > 0          -> brake = |gas|   (reversing, asking forward)
//   2) moving >  0.5 && gas < 0          -> brake = |gas|   (rolling forward, asking back)
//   3) speed < 1 && |gas| < 0.25         -> brake = 1       (hold at rest)
//   4) otherwise                         -> brake = 0
//   First matching branch wins. Torque split: 70% front, 30% rear.
//
// Drive (fixed rate):
//   rear motor torque = torque_curve(speed / max_speed) * max_torque * gas
//   The curve output is NOT re-clamped.
//
// Launch assist (fixed rate, speed < initial_acceleration_max_speed):
//   a = lerp(initial_acceleration, 0, inverse_lerp(0, cutoff, speed)) * gas * 0.5
//   applied forward at each grounded rear wheel's force point, per wheel.
// ==============================================================================

use serde::Serialize;

use crate::handling::math::{inverse_lerp, lerp};
use crate::handling::types::{
    ForceCommand, ForceMode, MotionState, PerWheel, Vec3, WheelCommand, WheelId,
};
use crate::settings::VehicleSettings;

pub const MOVING_THRESHOLD: f32 = 0.5;
pub const HOLD_SPEED: f32 = 1.0;
pub const HOLD_GAS_DEADZONE: f32 = 0.25;
pub const FRONT_BRAKE_SHARE: f32 = 0.7;
pub const REAR_BRAKE_SHARE: f32 = 0.3;

/// Which brake rule fired this frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BrakeReason {
    /// Rolling backward while asking for forward gas.
    Reversing,
    /// Rolling forward while asking for reverse gas.
    Decelerating,
    /// Nearly stopped with no meaningful input.
    Hold,
    Released,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BrakeDecision {
    pub input: f32, // 0..1
    pub reason: BrakeReason,
}

pub fn brake_decision(gas: f32, moving_direction: f32, speed: f32) -> BrakeDecision {
    let (input, reason) = if moving_direction < -MOVING_THRESHOLD && gas > 0.0 {
        (gas.abs(), BrakeReason::Reversing)
    } else if moving_direction > MOVING_THRESHOLD && gas < 0.0 {
        (gas.abs(), BrakeReason::Decelerating)
    } else if speed.abs() < HOLD_SPEED && gas.abs() < HOLD_GAS_DEADZONE {
        (1.0, BrakeReason::Hold)
    } else {
        (0.0, BrakeReason::Released)
    };
    BrakeDecision { input, reason }
}

pub fn solve_brake(motion: &MotionState, gas: f32, speed: f32) -> BrakeDecision {
    let moving = motion.forward().dot(&motion.velocity);
    brake_decision(gas, moving, speed)
}

pub fn apply_brake(commands: &mut PerWheel<WheelCommand>, brake_input: f32, brake_power: f32) {
    let total = brake_input * brake_power;
    for id in WheelId::ALL {
        let share = if id.is_front() { FRONT_BRAKE_SHARE } else { REAR_BRAKE_SHARE };
        commands[id].brake_torque = Some(total * share);
    }
}

pub fn motor_torque(settings: &VehicleSettings, speed: f32, gas: f32) -> f32 {
    settings.torque_curve.evaluate(speed / settings.max_speed) * settings.max_torque * gas
}

pub fn apply_motor(commands: &mut PerWheel<WheelCommand>, torque: f32) {
    commands.rl.motor_torque = Some(torque);
    commands.rr.motor_torque = Some(torque);
}

/// Per-wheel launch-assist acceleration (m/s^2), 0 at or above the cutoff.
pub fn launch_assist_accel(settings: &VehicleSettings, speed: f32, gas: f32) -> f32 {
    let cutoff = settings.initial_acceleration_max_speed;
    if speed >= cutoff {
        return 0.0;
    }
    lerp(settings.initial_acceleration, 0.0, inverse_lerp(0.0, cutoff, speed)) * gas * 0.5
}

/// Forward acceleration commands at each grounded rear wheel.
pub fn launch_assist(
    settings: &VehicleSettings,
    motion: &MotionState,
    speed: f32,
    gas: f32,
) -> Vec<ForceCommand> {
    let accel = launch_assist_accel(settings, speed, gas);
    if accel == 0.0 {
        return Vec::new();
    }

    let forward: Vec3 = motion.forward();
    let app_distance = settings.back_wheels.force_app_point_distance;

    [WheelId::RL, WheelId::RR]
        .into_iter()
        .map(|id| &motion.wheels[id])
        .filter(|w| w.grounded)
        .map(|w| ForceCommand {
            force: forward * accel,
            at_point: Some(w.mount - w.up * app_distance),
            mode: ForceMode::Acceleration,
        })
        .collect()
}
