// ==============================================================================
// steering.rs — SLIP ANGLE + SPEED-SENSITIVE STEERING (FRONT AXLE)
// ==============================================================================
// Responsibilities:
// - Measure the chassis slip angle
// - Turn driver steering intent into a target front-wheel angle
// - Smooth the physical steer angle toward the target
// - Derive the (separately clamped) angle shown on the wheel meshes
// ------------------------------------------------------------------------------
// slip_angle = angle(forward, velocity - forward)
//
//   The unit forward vector is subtracted from the raw velocity before taking
//   the angle. At low speed this pushes the measurement toward 180 deg, so the
//   slip only reads small once the car is actually travelling along its nose.
//   Drift tuning (start/stop angles) is authored against this measurement.
//
// target = steer_input * steering_curve(speed)
//        + signed_angle(forward, velocity + forward)   (only while slip < 120)
// target = clamp(target, -90, 90)
// angle  = lerp(angle, target, steer_lerp_speed * dt)
// visual = clamp(target, -visual_max, visual_max)
//
// Both front wheels receive the same angle (parallel steer, no Ackermann).
// Positive angles steer toward the chassis right.
// ==============================================================================

use crate::handling::math::{angle, lerp, signed_angle};
use crate::handling::types::{MotionState, PerWheel, WheelCommand};
use crate::settings::VehicleSettings;

/// Above this slip angle the heading correction is dropped.
pub const SLIP_CORRECTION_LIMIT: f32 = 120.0;
/// Hard clamp on the target steer angle, degrees.
pub const MAX_TARGET_STEER: f32 = 90.0;

/// Steering state carried between visual frames.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SteeringState {
    pub target_angle: f32,
    pub angle: f32,
    pub visual_angle: f32,
}

pub fn slip_angle(motion: &MotionState) -> f32 {
    let forward = motion.forward();
    angle(&forward, &(motion.velocity - forward))
}

pub fn target_steering_angle(
    settings: &VehicleSettings,
    motion: &MotionState,
    steer_input: f32,
    speed: f32,
    slip_angle: f32,
) -> f32 {
    let mut target = steer_input * settings.steering_curve.evaluate(speed);

    // Let the nose catch up with the velocity heading during mild slides.
    if slip_angle < SLIP_CORRECTION_LIMIT {
        let forward = motion.forward();
        target += signed_angle(&forward, &(motion.velocity + forward), &motion.yaw_axis());
    }

    target.clamp(-MAX_TARGET_STEER, MAX_TARGET_STEER)
}

/// Exponential approach toward `target`; never overshoots.
#[inline]
pub fn smooth_steering(current: f32, target: f32, lerp_speed: f32, dt: f32) -> f32 {
    lerp(current, target, dt * lerp_speed)
}

#[inline]
pub fn visual_steering_angle(target: f32, visual_max: f32) -> f32 {
    let m = visual_max.abs();
    target.clamp(-m, m)
}

/// Main steering solve (visual rate).
pub fn solve_steering(
    settings: &VehicleSettings,
    state: &mut SteeringState,
    motion: &MotionState,
    steer_input: f32,
    speed: f32,
    slip_angle: f32,
    dt: f32,
) {
    state.target_angle = target_steering_angle(settings, motion, steer_input, speed, slip_angle);
    state.angle = smooth_steering(state.angle, state.target_angle, settings.steer_lerp_speed, dt);
    state.visual_angle = visual_steering_angle(state.target_angle, settings.visual_max_steering_angle);
}

/// Write the smoothed angle into both front wheel slots.
pub fn apply_steering(commands: &mut PerWheel<WheelCommand>, state: &SteeringState) {
    commands.fl.steer_angle = Some(state.angle);
    commands.fr.steer_angle = Some(state.angle);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curve::Curve;
    use crate::handling::types::Vec3;
    use approx::assert_abs_diff_eq;

    fn flat_settings(max_steer: f32) -> VehicleSettings {
        VehicleSettings {
            steering_curve: Curve::constant(max_steer),
            ..VehicleSettings::default()
        }
    }

    fn moving(v: Vec3) -> MotionState {
        MotionState { velocity: v, ..MotionState::default() }
    }

    #[test]
    fn slip_angle_at_rest_reads_180() {
        assert_abs_diff_eq!(slip_angle(&MotionState::default()), 180.0, epsilon = 1e-3);
    }

    #[test]
    fn slip_angle_straight_ahead_reads_zero() {
        assert_abs_diff_eq!(slip_angle(&moving(Vec3::new(0.0, 0.0, 20.0))), 0.0, epsilon = 1e-3);
    }

    #[test]
    fn slip_angle_uses_forward_offset_velocity() {
        // pure sideways 1 m/s: velocity - forward = (-1, 0, -1) => 135 deg,
        // where a textbook slip angle would read 90
        let m = moving(Vec3::new(-1.0, 0.0, 0.0));
        assert_abs_diff_eq!(slip_angle(&m), 135.0, epsilon = 1e-3);
    }

    #[test]
    fn target_scales_with_curve() {
        let s = flat_settings(30.0);
        let m = moving(Vec3::new(0.0, 0.0, 10.0));
        let slip = slip_angle(&m);
        assert_abs_diff_eq!(target_steering_angle(&s, &m, 0.5, 10.0, slip), 15.0, epsilon = 1e-3);
        assert_abs_diff_eq!(target_steering_angle(&s, &m, -1.0, 10.0, slip), -30.0, epsilon = 1e-3);
    }

    #[test]
    fn heading_correction_follows_velocity() {
        let s = flat_settings(30.0);
        // drifting toward the chassis right (-X) while pointing +Z
        let m = moving(Vec3::new(-4.0, 0.0, 4.0));
        let slip = slip_angle(&m);
        assert!(slip < SLIP_CORRECTION_LIMIT);
        let target = target_steering_angle(&s, &m, 0.0, m.speed(), slip);
        assert!(target > 0.0, "expected a right-hand correction, got {target}");
    }

    #[test]
    fn no_correction_past_limit() {
        let s = flat_settings(30.0);
        // reversing: slip well above the limit
        let m = moving(Vec3::new(-1.0, 0.0, -5.0));
        let slip = slip_angle(&m);
        assert!(slip >= SLIP_CORRECTION_LIMIT);
        assert_eq!(target_steering_angle(&s, &m, 0.0, m.speed(), slip), 0.0);
    }

    #[test]
    fn target_is_clamped() {
        let s = flat_settings(500.0);
        let m = MotionState::default();
        assert_eq!(target_steering_angle(&s, &m, 1.0, 0.0, 180.0), MAX_TARGET_STEER);
        assert_eq!(target_steering_angle(&s, &m, -1.0, 0.0, 180.0), -MAX_TARGET_STEER);
    }

    #[test]
    fn smoothing_never_overshoots() {
        let mut a = 0.0;
        for _ in 0..200 {
            a = smooth_steering(a, 20.0, 10.0, 0.016);
            assert!(a <= 20.0);
        }
        assert_abs_diff_eq!(a, 20.0, epsilon = 1e-3);
        // a huge dt snaps straight to target
        assert_eq!(smooth_steering(0.0, 20.0, 10.0, 1.0), 20.0);
    }

    #[test]
    fn visual_angle_clamps_target_not_smoothed() {
        let s = flat_settings(80.0);
        let mut st = SteeringState::default();
        solve_steering(&s, &mut st, &MotionState::default(), 1.0, 0.0, 180.0, 0.016);
        assert_eq!(st.target_angle, 80.0);
        assert_eq!(st.visual_angle, 45.0);
        assert!(st.angle < st.target_angle);

        let mut cmds = PerWheel::<WheelCommand>::default();
        apply_steering(&mut cmds, &st);
        assert_eq!(cmds.fl.steer_angle, Some(st.angle));
        assert_eq!(cmds.fr.steer_angle, Some(st.angle));
        assert_eq!(cmds.rl.steer_angle, None);
    }
}
