use std::collections::HashMap;

use serde::Serialize;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{info, trace};
use uuid::Uuid;

use crate::controller::{ControllerSnapshot, VehicleController};
use crate::error::ControllerError;
use crate::handling::types::{Emission, EmitterId, InputSample, PerWheel, WheelId, WheelPose};
use crate::physics::PhysicsWorld;
use crate::settings::VehicleSettings;

/// Spacing between spawned vehicles along X.
const SPAWN_SPACING: f32 = 4.0;
const SPAWN_HEIGHT: f32 = 1.0;

pub struct Entity {
    pub id: String,
    pub controller: VehicleController,
    pub input: InputSample,
    pub poses: PerWheel<WheelPose>,
    /// Smoke emitter state per wheel (true = playing).
    pub smoke: PerWheel<bool>,
}

#[derive(Serialize)]
pub struct WheelSnapshot {
    pub id: WheelId,
    pub position: [f32; 3],
    pub rotation: [f32; 4], // quaternion (i, j, k, w)
    pub smoke: bool,
}

#[derive(Serialize)]
pub struct VehicleSnapshot {
    pub id: String,
    pub position: [f32; 3],
    pub rotation: [f32; 4],
    pub wheels: Vec<WheelSnapshot>,
    pub controller: ControllerSnapshot,
}

#[derive(Serialize)]
pub struct Snapshot {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub tick: u64,
    pub vehicles: Vec<VehicleSnapshot>,
}

pub struct SharedGameState {
    pub tick: u64,
    pub clients: Vec<UnboundedSender<String>>,
    pub entities: HashMap<String, Entity>,
    pub settings: VehicleSettings,
    spawned: usize,
}

impl SharedGameState {
    pub fn new(settings: VehicleSettings) -> Self {
        Self {
            tick: 0,
            clients: Vec::new(),
            entities: HashMap::new(),
            settings,
            spawned: 0,
        }
    }

    pub fn register_client(&mut self, tx: UnboundedSender<String>) {
        self.clients.push(tx);
    }

    /// Create a controller-backed vehicle and its physics body.
    pub fn add_vehicle(&mut self, physics: &mut PhysicsWorld) -> Result<String, ControllerError> {
        let emitters = PerWheel::from_fn(|w| Some(EmitterId(w as u64)));
        let controller = VehicleController::new(self.settings.clone())?.with_particles(emitters)?;

        let id = Uuid::new_v4().to_string();
        let position = [self.spawned as f32 * SPAWN_SPACING, SPAWN_HEIGHT, 0.0];
        self.spawned += 1;
        physics.spawn_vehicle(&id, position, &self.settings);

        self.entities.insert(
            id.clone(),
            Entity {
                id: id.clone(),
                controller,
                input: InputSample::default(),
                poses: PerWheel::default(),
                smoke: PerWheel::default(),
            },
        );
        Ok(id)
    }

    pub fn remove_entity(&mut self, id: &str, physics: &mut PhysicsWorld) {
        if self.entities.remove(id).is_some() {
            physics.remove_vehicle(id);
            info!(entity = id, "entity removed");
        }
    }

    pub fn update_input(&mut self, id: &str, input: InputSample) {
        if let Some(e) = self.entities.get_mut(id) {
            e.input = input;
        }
    }

    // ==========================================================================
    // Controller cadences
    // ==========================================================================

    /// Once per rendered frame.
    pub fn visual_step(&mut self, physics: &mut PhysicsWorld, dt: f32) {
        for e in self.entities.values_mut() {
            let Some(motion) = physics.motion(&e.id) else { continue };
            let out = e.controller.step(dt, e.input, &motion);
            physics.apply_wheel_commands(&e.id, &out.wheels);

            e.poses = out.poses;
            if let Some(p) = out.particles {
                e.smoke = p.map(|_, c| c.emission == Emission::Play);
            }
        }
    }

    /// Once per physics tick, before the world is stepped.
    pub fn fixed_step(&mut self, physics: &mut PhysicsWorld, dt: f32) {
        for e in self.entities.values_mut() {
            let Some(motion) = physics.motion(&e.id) else { continue };
            let out = e.controller.fixed_step(dt, &motion);
            physics.apply_wheel_commands(&e.id, &out.wheels);
            physics.apply_forces(&e.id, &out.forces, &out.torques, dt);
            trace!(entity = %e.id, phase = ?out.boost_phase, "fixed step");
        }
    }

    pub fn build_snapshot(&self, physics: &PhysicsWorld) -> Snapshot {
        let mut vehicles = Vec::with_capacity(self.entities.len());

        for e in self.entities.values() {
            let Some(pose) = physics.chassis_pose(&e.id) else { continue };
            let t = pose.translation.vector;
            let r = pose.rotation;

            let wheels = e
                .poses
                .iter()
                .map(|(w, p)| WheelSnapshot {
                    id: w,
                    position: [p.position.x, p.position.y, p.position.z],
                    rotation: [p.rotation.i, p.rotation.j, p.rotation.k, p.rotation.w],
                    smoke: e.smoke[w],
                })
                .collect();

            vehicles.push(VehicleSnapshot {
                id: e.id.clone(),
                position: [t.x, t.y, t.z],
                rotation: [r.i, r.j, r.k, r.w],
                wheels,
                controller: e.controller.snapshot(),
            });
        }

        Snapshot { kind: "snapshot", tick: self.tick, vehicles }
    }

    /// Send a snapshot of all vehicles to all clients, dropping closed ones.
    pub fn broadcast_snapshot(&mut self, physics: &PhysicsWorld) -> Result<(), serde_json::Error> {
        let json = serde_json::to_string(&self.build_snapshot(physics))?;
        self.clients.retain(|tx| tx.send(json.clone()).is_ok());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    fn spawn_one() -> (SharedGameState, PhysicsWorld, String) {
        let mut state = SharedGameState::new(VehicleSettings::default());
        let mut physics = PhysicsWorld::new();
        let id = match state.add_vehicle(&mut physics) {
            Ok(id) => id,
            Err(e) => panic!("{e}"),
        };
        (state, physics, id)
    }

    #[test]
    fn add_and_remove_vehicle() {
        let (mut state, mut physics, id) = spawn_one();
        assert!(physics.motion(&id).is_some());
        state.remove_entity(&id, &mut physics);
        assert!(state.entities.is_empty());
        assert!(physics.motion(&id).is_none());
    }

    #[test]
    fn snapshot_lists_vehicle_with_four_wheels() {
        let (mut state, mut physics, id) = spawn_one();
        state.visual_step(&mut physics, 1.0 / 60.0);
        let snap = state.build_snapshot(&physics);
        assert_eq!(snap.vehicles.len(), 1);
        assert_eq!(snap.vehicles[0].id, id);
        assert_eq!(snap.vehicles[0].wheels.len(), 4);
    }

    #[test]
    fn broadcast_drops_closed_clients() {
        let (mut state, physics, _) = spawn_one();
        let (tx_open, mut rx_open) = mpsc::unbounded_channel();
        let (tx_closed, rx_closed) = mpsc::unbounded_channel();
        drop(rx_closed);
        state.register_client(tx_open);
        state.register_client(tx_closed);

        assert!(state.broadcast_snapshot(&physics).is_ok());
        assert_eq!(state.clients.len(), 1);
        let msg = rx_open.try_recv().unwrap_or_default();
        assert!(msg.contains("\"type\":\"snapshot\""));
    }

    #[test]
    fn input_reaches_controller_on_visual_step() {
        let (mut state, mut physics, id) = spawn_one();
        state.update_input(&id, InputSample { gas: 1.0, steering: 0.5, drift: true, boost: false });
        state.visual_step(&mut physics, 1.0 / 60.0);
        let snap = state.entities[&id].controller.snapshot();
        assert_eq!(snap.gas, 1.0);
        assert!(snap.drift);
    }
}
