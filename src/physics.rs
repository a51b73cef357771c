// src/physics.rs

use std::collections::HashMap;

use rapier3d::prelude::*;
use tracing::{info, warn};

use crate::handling::types::{ForceCommand, ForceMode, MotionState, PerWheel, TorqueCommand, WheelCommand, WheelId};
use crate::settings::VehicleSettings;
use crate::suspension_contact::{RaycastWheel, probe_wheel};
use crate::tire::{TireInput, solve_tire};

const GROUP_GROUND: Group = Group::from_bits_truncate(0b0001);
const GROUP_CHASSIS: Group = Group::from_bits_truncate(0b0010);

/// Bodies beyond this distance from the origin are reset.
pub const ARENA_LIMIT: f32 = 1_000.0;

pub struct ChassisConfig {
    pub mass: f32,                      // kg, wheels excluded
    pub half_extents: [f32; 3],         // [hx, hy, hz] meters
    pub com_offset: [f32; 3],           // local offset from collider center
    pub linear_damping: f32,
    pub angular_damping: f32,
    pub half_track: f32,                // mount |x|
    pub half_wheelbase: f32,            // mount |z|
    pub mount_height: f32,              // mount y
}

pub const STOCK_CHASSIS: ChassisConfig = ChassisConfig {
    mass: 1_200.0,
    half_extents: [0.9, 0.3, 2.0],
    com_offset: [0.0, -0.1, 0.0],
    linear_damping: 0.05,
    angular_damping: 0.5,
    half_track: 0.8,
    half_wheelbase: 1.3,
    mount_height: -0.2,
};

/// Wheel mounts in chassis space. Right is -X.
pub fn wheel_mount(config: &ChassisConfig, id: WheelId) -> Point<Real> {
    let x = if matches!(id, WheelId::FL | WheelId::RL) { config.half_track } else { -config.half_track };
    let z = if id.is_front() { config.half_wheelbase } else { -config.half_wheelbase };
    point![x, config.mount_height, z]
}

pub struct Vehicle {
    pub body: RigidBodyHandle,
    pub wheels: PerWheel<RaycastWheel>,
}

pub struct PhysicsWorld {
    pub gravity: Vector<Real>,
    pub pipeline: PhysicsPipeline,
    pub island_manager: IslandManager,
    pub broad_phase: DefaultBroadPhase,
    pub narrow_phase: NarrowPhase,
    pub bodies: RigidBodySet,
    pub colliders: ColliderSet,
    pub joints: ImpulseJointSet,
    pub multibody_joints: MultibodyJointSet,
    pub ccd: CCDSolver,
    pub query_pipeline: QueryPipeline,
    pub vehicles: HashMap<String, Vehicle>, // entity id -> vehicle
}

/// Impulse for one controller force command over `dt`.
pub fn force_impulse(cmd: &ForceCommand, mass: f32, dt: f32) -> Vector<Real> {
    match cmd.mode {
        ForceMode::Force => cmd.force * dt,
        ForceMode::Acceleration => cmd.force * (mass * dt),
    }
}

impl Default for PhysicsWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl PhysicsWorld {
    pub fn new() -> Self {
        let gravity = vector![0.0, -9.81, 0.0];

        let mut bodies = RigidBodySet::new();
        let mut colliders = ColliderSet::new();

        // === Static ground box, top surface at y = 0 ===
        let ground_rb = RigidBodyBuilder::fixed()
            .translation(vector![0.0, -1.0, 0.0])
            .build();
        let ground_handle = bodies.insert(ground_rb);

        let ground_collider = ColliderBuilder::cuboid(ARENA_LIMIT, 1.0, ARENA_LIMIT)
            .collision_groups(InteractionGroups::new(GROUP_GROUND, GROUP_CHASSIS))
            .friction(1.0)
            .restitution(0.0)
            .build();
        colliders.insert_with_parent(ground_collider, ground_handle, &mut bodies);

        info!(bodies = bodies.len(), colliders = colliders.len(), "ground inserted");

        Self {
            gravity,
            pipeline: PhysicsPipeline::new(),
            island_manager: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            bodies,
            colliders,
            joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd: CCDSolver::new(),
            query_pipeline: QueryPipeline::new(),
            vehicles: HashMap::new(),
        }
    }

    /// Dynamic box chassis with four raycast wheels built from `settings`.
    pub fn spawn_vehicle(&mut self, id: &str, position: [f32; 3], settings: &VehicleSettings) -> RigidBodyHandle {
        let config = &STOCK_CHASSIS;
        let wheel_mass: f32 = WheelId::ALL.iter().map(|&w| settings.wheel(w.is_front()).mass).sum();
        let [hx, hy, hz] = config.half_extents;
        let [cx, cy, cz] = config.com_offset;
        let volume = 8.0 * hx * hy * hz;
        let density = (config.mass + wheel_mass) / volume; // rho = m / V

        let rb = RigidBodyBuilder::dynamic()
            .translation(vector![position[0], position[1], position[2]])
            .linear_damping(config.linear_damping)
            .angular_damping(config.angular_damping)
            .ccd_enabled(true)
            .build();

        let collider = ColliderBuilder::cuboid(hx, hy, hz)
            .translation(vector![cx, cy, cz])
            .collision_groups(InteractionGroups::new(GROUP_CHASSIS, GROUP_GROUND))
            .active_events(ActiveEvents::empty())
            .density(density)
            .friction(0.0)
            .restitution(0.0)
            .build();

        let handle = self.bodies.insert(rb);
        self.colliders.insert_with_parent(collider, handle, &mut self.bodies);

        let pose = Isometry::translation(position[0], position[1], position[2]);
        let wheels = PerWheel::from_fn(|w| {
            let mut wheel = RaycastWheel::new(w, wheel_mount(config, w), *settings.wheel(w.is_front()));
            wheel.place(&pose);
            wheel
        });
        self.vehicles.insert(id.to_string(), Vehicle { body: handle, wheels });

        info!(vehicle = id, ?position, ?handle, "spawned vehicle");
        handle
    }

    pub fn remove_vehicle(&mut self, id: &str) {
        let Some(vehicle) = self.vehicles.remove(id) else { return };
        self.bodies.remove(
            vehicle.body,
            &mut self.island_manager,
            &mut self.colliders,
            &mut self.joints,
            &mut self.multibody_joints,
            true,
        );
        info!(vehicle = id, "removed vehicle");
    }

    /// Chassis + wheel state in the form the controller reads.
    pub fn motion(&self, id: &str) -> Option<MotionState> {
        let vehicle = self.vehicles.get(id)?;
        let body = self.bodies.get(vehicle.body)?;
        Some(MotionState {
            velocity: *body.linvel(),
            angular_velocity: *body.angvel(),
            rotation: *body.rotation(),
            wheels: vehicle.wheels.map(|_, w| w.motion()),
        })
    }

    pub fn chassis_pose(&self, id: &str) -> Option<Isometry<Real>> {
        let vehicle = self.vehicles.get(id)?;
        self.bodies.get(vehicle.body).map(|b| *b.position())
    }

    pub fn apply_wheel_commands(&mut self, id: &str, commands: &PerWheel<WheelCommand>) {
        let Some(vehicle) = self.vehicles.get_mut(id) else { return };
        for (w, cmd) in commands.iter() {
            vehicle.wheels[w].apply_command(cmd);
        }
    }

    /// Translate controller forces/torques into impulses for the next step.
    ///
    /// Force mode: `F * dt`. Acceleration mode: `a * m * dt` at the point.
    /// Acceleration-mode torques change angular velocity directly by `alpha * dt`.
    pub fn apply_forces(&mut self, id: &str, forces: &[ForceCommand], torques: &[TorqueCommand], dt: f32) {
        let Some(vehicle) = self.vehicles.get(id) else { return };
        let Some(body) = self.bodies.get_mut(vehicle.body) else { return };
        let mass = body.mass();

        for f in forces {
            let impulse = force_impulse(f, mass, dt);
            match f.at_point {
                Some(p) => body.apply_impulse_at_point(impulse, p, true),
                None => body.apply_impulse(impulse, true),
            }
        }

        for t in torques {
            match t.mode {
                ForceMode::Acceleration => {
                    let angvel = *body.angvel() + t.torque * dt;
                    body.set_angvel(angvel, true);
                }
                ForceMode::Force => body.apply_torque_impulse(t.torque * dt, true),
            }
        }
    }

    // --------------------------------------------------------------
    // Suspension + tire impulses for every vehicle
    // --------------------------------------------------------------
    fn apply_wheel_forces(&mut self, dt: Real) {
        self.query_pipeline.update(&self.colliders);

        for vehicle in self.vehicles.values_mut() {
            let handle = vehicle.body;
            let Some(body) = self.bodies.get(handle) else { continue };
            let mass_share = body.mass() / 4.0;

            // collect impulses here, apply later
            let mut impulses: Vec<(Vector<Real>, Point<Real>)> = Vec::new();

            for w in WheelId::ALL {
                let wheel = &mut vehicle.wheels[w];
                let probe = probe_wheel(wheel, body, &self.query_pipeline, &self.bodies, &self.colliders, handle);
                wheel.record_probe(&probe, dt);

                let Some(contact) = probe.contact else { continue };

                let tire = solve_tire(
                    &wheel.settings,
                    &TireInput {
                        normal_force: contact.normal_force,
                        v_long: contact.v_long,
                        v_lat: contact.v_lat,
                        motor_torque: wheel.motor_torque,
                        brake_torque: wheel.brake_torque,
                        sideways_stiffness: wheel.sideways_stiffness,
                        mass_share,
                        dt,
                    },
                );
                wheel.forward_slip = tire.forward_slip;
                wheel.sideways_slip = tire.sideways_slip;

                // suspension pushes at the contact, tire forces at the force point
                impulses.push((probe.up * (contact.normal_force * dt), contact.hit_point));
                let planar = contact.forward * tire.longitudinal + contact.right * tire.lateral;
                impulses.push((planar * dt, wheel.force_point()));
            }

            if let Some(body) = self.bodies.get_mut(handle) {
                for (impulse, point) in impulses {
                    body.apply_impulse_at_point(impulse, point, true);
                }
            }
        }
    }

    pub fn step(&mut self, dt: Real) {
        let hooks = ();
        let events = ();

        // 1) Suspension + tire forces from the current wheel commands
        self.apply_wheel_forces(dt);

        // 2) Step physics.
        self.pipeline.step(
            &self.gravity,
            &IntegrationParameters {
                dt,
                ..IntegrationParameters::default()
            },
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &mut self.joints,
            &mut self.multibody_joints,
            &mut self.ccd,
            Some(&mut self.query_pipeline),
            &hooks,
            &events,
        );

        // 3) Safety: prevent bodies from exploding to insane coordinates
        for (handle, body) in self.bodies.iter_mut() {
            let pos = *body.translation();
            let bad = !pos.iter().all(|c| c.is_finite()) || pos.iter().any(|c| c.abs() > ARENA_LIMIT);
            if bad {
                let reset = vector![0.0, 1.0, 0.0];
                body.set_translation(reset, true);
                body.set_rotation(Rotation::identity(), true);
                body.set_linvel(vector![0.0, 0.0, 0.0], true);
                body.set_angvel(vector![0.0, 0.0, 0.0], true);
                warn!(?handle, ?pos, "reset exploding body");
            }
        }
    }
}
