// ==============================================================================
// visual.rs — WHEEL MESH POSES + SLIP PARTICLES (visual rate)
// ==============================================================================
// Roll phase (per wheel, degrees, starts at 0):
//   phase = (phase + rpm / 60 * 360 * dt) mod 360
//
// Pose:
//   position = wheel centre reported by the host
//   rotation = chassis * yaw(steer) * roll(phase)
//     yaw  about local (0,-1,0)  (forward x right, + = nose right)
//     roll about local (1, 0,0)  (up x forward,    + = top rolls forward)
//   steer: front = visual steering angle, rear = physical angle,
//          both clamped to +-visual_max; airborne wheels show 0.
//
// Particles:
//   |sideways_slip| + |forward_slip| > 0.5  -> Play, else Stop
// ==============================================================================

use nalgebra::Unit;

use crate::handling::types::{
    Emission, EmitterId, ParticleCommand, PerWheel, Rotation, Vec3, WheelMotion, WheelPose,
};

pub const SLIP_PARTICLE_THRESHOLD: f32 = 0.5;

const LOCAL_YAW_AXIS: Vec3 = Vec3::new(0.0, -1.0, 0.0);
const LOCAL_ROLL_AXIS: Vec3 = Vec3::new(1.0, 0.0, 0.0);

/// Degrees of spin for `rpm` over `dt`, wrapped into 0..360.
pub fn advance_roll_phase(phase: f32, rpm: f32, dt: f32) -> f32 {
    let next = (phase + rpm / 60.0 * 360.0 * dt).rem_euclid(360.0);
    if next.is_finite() { next } else { 0.0 }
}

/// Steer angle to draw on the mesh, degrees.
pub fn displayed_steer(wheel: &WheelMotion, is_front: bool, visual_steer: f32, visual_max: f32) -> f32 {
    if !wheel.grounded {
        return 0.0;
    }
    let m = visual_max.abs();
    if is_front {
        visual_steer.clamp(-m, m)
    } else {
        wheel.steer_angle.clamp(-m, m)
    }
}

pub fn wheel_pose(chassis: &Rotation, wheel: &WheelMotion, steer_deg: f32, phase_deg: f32) -> WheelPose {
    let yaw = Rotation::from_axis_angle(&Unit::new_unchecked(LOCAL_YAW_AXIS), steer_deg.to_radians());
    let roll = Rotation::from_axis_angle(&Unit::new_unchecked(LOCAL_ROLL_AXIS), phase_deg.to_radians());
    WheelPose {
        position: wheel.position,
        rotation: chassis * yaw * roll,
    }
}

/// Advance every wheel's roll phase and build all four poses.
pub fn solve_wheel_poses(
    chassis: &Rotation,
    wheels: &PerWheel<WheelMotion>,
    phases: &mut PerWheel<f32>,
    visual_steer: f32,
    visual_max: f32,
    dt: f32,
) -> PerWheel<WheelPose> {
    for (id, w) in wheels.iter() {
        phases[id] = advance_roll_phase(phases[id], w.rpm, dt);
    }
    wheels.map(|id, w| {
        let steer = displayed_steer(w, id.is_front(), visual_steer, visual_max);
        wheel_pose(chassis, w, steer, phases[id])
    })
}

pub fn emission(wheel: &WheelMotion) -> Emission {
    if wheel.sideways_slip.abs() + wheel.forward_slip.abs() > SLIP_PARTICLE_THRESHOLD {
        Emission::Play
    } else {
        Emission::Stop
    }
}

pub fn solve_particles(
    emitters: &PerWheel<EmitterId>,
    wheels: &PerWheel<WheelMotion>,
) -> PerWheel<ParticleCommand> {
    emitters.map(|id, &emitter| ParticleCommand { emitter, emission: emission(&wheels[id]) })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handling::types::{Point, WheelId};
    use approx::assert_abs_diff_eq;

    fn grounded() -> WheelMotion {
        WheelMotion { grounded: true, ..WheelMotion::default() }
    }

    #[test]
    fn roll_phase_wraps() {
        // 600 rpm = 10 rev/s = 3600 deg/s
        assert_abs_diff_eq!(advance_roll_phase(0.0, 600.0, 0.01), 36.0, epsilon = 1e-3);
        assert_abs_diff_eq!(advance_roll_phase(350.0, 600.0, 0.01), 26.0, epsilon = 1e-3);
        assert_abs_diff_eq!(advance_roll_phase(10.0, -600.0, 0.01), 334.0, epsilon = 1e-3);
        let p = advance_roll_phase(0.0, 1e9, 1.0);
        assert!((0.0..360.0).contains(&p));
    }

    #[test]
    fn displayed_steer_rules() {
        let mut rear = grounded();
        rear.steer_angle = 70.0;
        assert_eq!(displayed_steer(&grounded(), true, 60.0, 45.0), 45.0);
        assert_eq!(displayed_steer(&grounded(), true, -12.0, 45.0), -12.0);
        assert_eq!(displayed_steer(&rear, false, 30.0, 45.0), 45.0);
        assert_eq!(displayed_steer(&WheelMotion::default(), true, 30.0, 45.0), 0.0);
    }

    #[test]
    fn positive_steer_turns_wheel_right() {
        let pose = wheel_pose(&Rotation::identity(), &grounded(), 90.0, 0.0);
        let fwd = pose.rotation * Vec3::z();
        // right is -X
        assert_abs_diff_eq!(fwd, Vec3::new(-1.0, 0.0, 0.0), epsilon = 1e-5);
    }

    #[test]
    fn positive_roll_moves_top_forward() {
        let pose = wheel_pose(&Rotation::identity(), &grounded(), 0.0, 90.0);
        let top = pose.rotation * Vec3::y();
        assert_abs_diff_eq!(top, Vec3::z(), epsilon = 1e-5);
    }

    #[test]
    fn poses_follow_wheel_positions() {
        let mut wheels = PerWheel::from_fn(|_| grounded());
        wheels.rr.position = Point::new(-0.8, 0.3, -1.2);
        wheels.fl.rpm = 60.0;
        let mut phases = PerWheel::default();
        let poses = solve_wheel_poses(&Rotation::identity(), &wheels, &mut phases, 0.0, 45.0, 0.5);
        assert_eq!(poses[WheelId::RR].position, Point::new(-0.8, 0.3, -1.2));
        assert_abs_diff_eq!(phases.fl, 180.0, epsilon = 1e-3);
        assert_eq!(phases.fr, 0.0);
    }

    #[test]
    fn particles_fire_on_combined_slip() {
        let emitters = PerWheel::from_fn(|id| EmitterId(id as u64));
        let mut wheels = PerWheel::<WheelMotion>::default();
        wheels.rl.sideways_slip = -0.3;
        wheels.rl.forward_slip = 0.3;
        wheels.rr.sideways_slip = 0.5;
        let cmds = solve_particles(&emitters, &wheels);
        assert_eq!(cmds.rl.emission, Emission::Play);
        assert_eq!(cmds.rr.emission, Emission::Stop);
        assert_eq!(cmds.fl.emission, Emission::Stop);
        assert_eq!(cmds.rl.emitter, EmitterId(2));
    }
}
