//! Vehicle dynamics controller: owns the per-vehicle state and runs the
//! handling models at two cadences.
//!
//! `step` runs once per rendered frame, `fixed_step` zero or more times per
//! frame at the physics rate. The fixed-rate models read the input, speed and
//! slip angle latched by the most recent `step`; vectors and grounded flags are
//! taken fresh from the motion passed to `fixed_step`.

use serde::Serialize;
use tracing::{debug, trace, warn};

use crate::error::ControllerError;
use crate::handling::boost::{BoostPhase, BoostReservoir};
use crate::handling::drift::{self, CounterDrift, CounterDriftInput, GripMode};
use crate::handling::longitudinal::{self, BrakeDecision, BrakeReason};
use crate::handling::steering::{self, SteeringState};
use crate::handling::types::{
    EmitterId, ForceCommand, InputSample, MotionState, ParticleCommand, PerWheel, TorqueCommand,
    Vec3, WheelCommand, WheelId, WheelPose,
};
use crate::handling::visual;
use crate::settings::VehicleSettings;

/// Mutable per-vehicle state, persisted for the vehicle's lifetime.
#[derive(Debug, Clone, PartialEq)]
pub struct ControllerState {
    pub input: InputSample,
    pub speed: f32,
    pub slip_angle: f32,
    pub steering: SteeringState,
    pub brake: BrakeDecision,
    pub grip: GripMode,
    pub boost: BoostReservoir,
    pub counter_drift: CounterDrift,
    /// Accumulated visual roll per wheel, degrees in 0..360.
    pub wheel_phases: PerWheel<f32>,
}

impl ControllerState {
    fn new(settings: &VehicleSettings) -> Self {
        Self {
            input: InputSample::default(),
            speed: 0.0,
            slip_angle: 0.0,
            steering: SteeringState::default(),
            brake: BrakeDecision { input: 0.0, reason: BrakeReason::Released },
            grip: GripMode::Normal,
            boost: BoostReservoir::full(settings),
            counter_drift: CounterDrift::default(),
            wheel_phases: PerWheel::default(),
        }
    }
}

/// Read-only view of the controller for telemetry and tests.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ControllerSnapshot {
    pub speed: f32,
    pub slip_angle: f32,
    pub target_steering_angle: f32,
    pub steering_angle: f32,
    pub visual_steering_angle: f32,
    pub gas: f32,
    pub brake: f32,
    pub steering: f32,
    pub drift: bool,
    pub boost: bool,
    pub remaining_boost: f32,
    pub boost_cooldown: f32,
    pub boost_phase: BoostPhase,
    /// Signed counter-drift angular acceleration from the last fixed step.
    pub counter_drift: f32,
    pub rear_sideways_stiffness: f32,
}

/// Output of the visual-rate step.
#[derive(Debug, Clone, PartialEq)]
pub struct VisualCommands {
    pub wheels: PerWheel<WheelCommand>,
    pub poses: PerWheel<WheelPose>,
    /// `None` when no particle emitters are wired.
    pub particles: Option<PerWheel<ParticleCommand>>,
    pub snapshot: ControllerSnapshot,
}

/// Output of one fixed-rate step.
#[derive(Debug, Clone, PartialEq)]
pub struct PhysicsCommands {
    pub wheels: PerWheel<WheelCommand>,
    pub forces: Vec<ForceCommand>,
    pub torques: Vec<TorqueCommand>,
    pub boost_phase: BoostPhase,
    pub snapshot: ControllerSnapshot,
}

#[derive(Debug, Clone)]
pub struct VehicleController {
    settings: VehicleSettings,
    emitters: Option<PerWheel<EmitterId>>,
    state: ControllerState,
}

impl VehicleController {
    pub fn new(settings: VehicleSettings) -> Result<Self, ControllerError> {
        settings.validate()?;
        for w in settings.warnings() {
            warn!("{w}");
        }
        let state = ControllerState::new(&settings);
        Ok(Self { settings, emitters: None, state })
    }

    /// Wire one particle emitter per wheel. All four or none.
    pub fn with_particles(
        mut self,
        emitters: PerWheel<Option<EmitterId>>,
    ) -> Result<Self, ControllerError> {
        let missing: Vec<WheelId> =
            emitters.iter().filter(|(_, e)| e.is_none()).map(|(id, _)| id).collect();

        self.emitters = match missing.len() {
            0 => Some(PerWheel::from_fn(|id| emitters[id].unwrap_or(EmitterId(0)))),
            4 => None,
            _ => return Err(ControllerError::PartialParticleWiring { missing }),
        };
        Ok(self)
    }

    pub fn settings(&self) -> &VehicleSettings {
        &self.settings
    }

    pub fn state(&self) -> &ControllerState {
        &self.state
    }

    pub fn has_particles(&self) -> bool {
        self.emitters.is_some()
    }

    // ==========================================================================
    // Visual rate: slip -> steering -> brake -> grip -> particles -> poses
    // ==========================================================================
    pub fn step(&mut self, dt: f32, input: InputSample, motion: &MotionState) -> VisualCommands {
        let s = &self.settings;
        let st = &mut self.state;

        st.input = input.sanitized();
        st.speed = motion.speed();
        st.slip_angle = steering::slip_angle(motion);

        let mut wheels = PerWheel::<WheelCommand>::default();

        steering::solve_steering(
            s,
            &mut st.steering,
            motion,
            st.input.steering,
            st.speed,
            st.slip_angle,
            dt,
        );
        steering::apply_steering(&mut wheels, &st.steering);

        st.brake = longitudinal::solve_brake(motion, st.input.gas, st.speed);
        longitudinal::apply_brake(&mut wheels, st.brake.input, s.brake_power);

        let grip = GripMode::from_input(st.input.drift);
        if grip != st.grip {
            debug!(from = ?st.grip, to = ?grip, slip = st.slip_angle, "grip mode");
            st.grip = grip;
        }
        drift::apply_grip_mode(&mut wheels, grip.rear_stiffness(s));

        let particles = self
            .emitters
            .as_ref()
            .map(|e| visual::solve_particles(e, &motion.wheels));

        let poses = visual::solve_wheel_poses(
            &motion.rotation,
            &motion.wheels,
            &mut st.wheel_phases,
            st.steering.visual_angle,
            s.visual_max_steering_angle,
            dt,
        );

        trace!(
            speed = st.speed,
            slip = st.slip_angle,
            steer = st.steering.angle,
            brake = st.brake.input,
            "visual step"
        );

        VisualCommands { wheels, poses, particles, snapshot: self.snapshot() }
    }

    // ==========================================================================
    // Fixed rate: motor -> launch assist -> boost -> counter-drift
    // ==========================================================================
    pub fn fixed_step(&mut self, fixed_dt: f32, motion: &MotionState) -> PhysicsCommands {
        let s = &self.settings;
        let st = &mut self.state;
        let gas = st.input.gas;

        let mut wheels = PerWheel::<WheelCommand>::default();
        let mut forces: Vec<ForceCommand> = Vec::new();
        let mut torques: Vec<TorqueCommand> = Vec::new();

        let torque = longitudinal::motor_torque(s, st.speed, gas);
        longitudinal::apply_motor(&mut wheels, torque);

        forces.extend(longitudinal::launch_assist(s, motion, st.speed, gas));

        let forward: Vec3 = motion.forward();
        if let Some(f) = st.boost.tick(s, st.input.boost, forward, fixed_dt) {
            forces.push(f);
        }

        let cd_input =
            CounterDriftInput::from_motion(motion, st.slip_angle, st.speed, gas, st.input.drift);
        st.counter_drift = drift::solve_counter_drift(s, &cd_input);
        if let Some(t) = drift::counter_drift_torque(motion, &st.counter_drift) {
            torques.push(t);
        }

        trace!(
            motor = torque,
            forces = forces.len(),
            counter_drift = st.counter_drift.signed(),
            boost = st.boost.remaining,
            "fixed step"
        );

        PhysicsCommands {
            wheels,
            forces,
            torques,
            boost_phase: st.boost.phase,
            snapshot: self.snapshot(),
        }
    }

    pub fn snapshot(&self) -> ControllerSnapshot {
        let st = &self.state;
        ControllerSnapshot {
            speed: st.speed,
            slip_angle: st.slip_angle,
            target_steering_angle: st.steering.target_angle,
            steering_angle: st.steering.angle,
            visual_steering_angle: st.steering.visual_angle,
            gas: st.input.gas,
            brake: st.brake.input,
            steering: st.input.steering,
            drift: st.input.drift,
            boost: st.input.boost,
            remaining_boost: st.boost.remaining,
            boost_cooldown: st.boost.cooldown,
            boost_phase: st.boost.phase,
            counter_drift: st.counter_drift.signed(),
            rear_sideways_stiffness: st.grip.rear_stiffness(&self.settings),
        }
    }
}
