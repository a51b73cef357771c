// ==============================================================================
// suspension_contact.rs — RAYCAST WHEEL + CONTACT PATCH KINEMATICS
// ------------------------------------------------------------------------------
// Stands in for an engine wheel collider. Each wheel:
// - holds the command slots the controller writes (steer, motor, brake,
//   sideways stiffness)
// - casts a ray from its mount along -up, length = travel + radius
// - reports grounded flag, world pose, rpm and slips back as WheelMotion
//
// Suspension:
//   length      = clamp(toi - radius, 0, travel)
//   compression = travel - length
//   F_n         = max(k * compression - c * v_up, 0)
//
// Wheel basis (steer is degrees, + = toward chassis right):
//   forward = chassis * yaw(steer) * (0, 0, 1)
//   right   = chassis * yaw(steer) * (-1, 0, 0)
//   v_long  = v_point . forward,  v_lat = v_point . right
//
// Notes:
// - This file does NOT apply impulses. It only measures contact data.
// - Ground normal is taken as the chassis up axis (flat arena).
// ==============================================================================

use nalgebra::UnitQuaternion;
use rapier3d::prelude::*;

use crate::handling::types::{WheelCommand, WheelId, WheelMotion};
use crate::settings::{JointSpring, WheelSettings};

pub struct RaycastWheel {
    pub id: WheelId,
    /// Mount point in chassis space.
    pub mount_local: Point<Real>,
    pub settings: WheelSettings,

    // command slots
    pub steer_angle: f32, // degrees
    pub motor_torque: f32,
    pub brake_torque: f32,
    pub sideways_stiffness: f32,

    // last measured state
    pub grounded: bool,
    pub mount: Point<Real>,
    pub center: Point<Real>,
    pub up: Vector<Real>,
    pub rpm: f32,
    pub forward_slip: f32,
    pub sideways_slip: f32,
}

impl RaycastWheel {
    pub fn new(id: WheelId, mount_local: Point<Real>, settings: WheelSettings) -> Self {
        let mount_local = mount_local + settings.center;
        Self {
            id,
            mount_local,
            sideways_stiffness: settings.sideways_friction.stiffness,
            settings,
            steer_angle: 0.0,
            motor_torque: 0.0,
            brake_torque: 0.0,
            grounded: false,
            mount: mount_local,
            center: mount_local,
            up: vector![0.0, 1.0, 0.0],
            rpm: 0.0,
            forward_slip: 0.0,
            sideways_slip: 0.0,
        }
    }

    /// Put an unprobed wheel at full droop under its mount for the given
    /// chassis pose, so the first sample is already in world space.
    pub fn place(&mut self, chassis: &Isometry<Real>) {
        self.up = chassis.rotation * vector![0.0, 1.0, 0.0];
        self.mount = chassis * self.mount_local;
        self.center = self.mount - self.up * self.settings.suspension_distance;
        self.grounded = false;
    }

    /// Copy every populated slot; `None` keeps the previous value.
    pub fn apply_command(&mut self, cmd: &WheelCommand) {
        if let Some(a) = cmd.steer_angle {
            self.steer_angle = a;
        }
        if let Some(t) = cmd.motor_torque {
            self.motor_torque = t;
        }
        if let Some(t) = cmd.brake_torque {
            self.brake_torque = t;
        }
        if let Some(s) = cmd.sideways_stiffness {
            self.sideways_stiffness = s;
        }
    }

    /// Force application point: below the mount along the wheel's up axis.
    pub fn force_point(&self) -> Point<Real> {
        self.mount - self.up * self.settings.force_app_point_distance
    }

    /// Store the geometric half of a probe. Slips and rpm are written by the
    /// tire pass.
    pub fn record_probe(&mut self, probe: &WheelProbe, dt: f32) {
        self.mount = probe.mount;
        self.up = probe.up;
        self.center = probe.center;
        self.grounded = probe.contact.is_some();

        match &probe.contact {
            Some(c) => self.rpm = rolling_rpm(c.v_long, self.settings.radius),
            None => {
                // free spin decays in the air
                self.rpm *= (-self.settings.damping_rate * dt).exp();
                self.forward_slip = 0.0;
                self.sideways_slip = 0.0;
            }
        }
    }

    pub fn motion(&self) -> WheelMotion {
        WheelMotion {
            grounded: self.grounded,
            position: self.center,
            mount: self.mount,
            up: self.up,
            steer_angle: self.steer_angle,
            rpm: self.rpm,
            forward_slip: self.forward_slip,
            sideways_slip: self.sideways_slip,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct WheelContact {
    pub hit_point: Point<Real>,
    pub compression: f32,
    pub suspension_vel: f32,
    pub normal_force: f32,
    pub point_vel: Vector<Real>,
    pub forward: Vector<Real>,
    pub right: Vector<Real>,
    pub v_long: f32,
    pub v_lat: f32,
}

#[derive(Debug, Clone, Copy)]
pub struct WheelProbe {
    pub mount: Point<Real>,
    pub up: Vector<Real>,
    /// Wheel centre: on the contact when grounded, at full droop otherwise.
    pub center: Point<Real>,
    pub contact: Option<WheelContact>,
}

pub fn suspension_force(compression: f32, suspension_vel: f32, spring: &JointSpring) -> f32 {
    (spring.spring * compression - spring.damper * suspension_vel).max(0.0)
}

/// rpm of a wheel rolling without slip at `v_long`.
pub fn rolling_rpm(v_long: f32, radius: f32) -> f32 {
    if radius <= 0.0 {
        return 0.0;
    }
    v_long / (std::f32::consts::TAU * radius) * 60.0
}

/// Wheel heading and right axis in chassis space for a steer angle in degrees.
pub fn steered_basis(steer_deg: f32) -> (Vector<Real>, Vector<Real>) {
    // + steer turns about -Y
    let yaw = UnitQuaternion::from_axis_angle(&Vector::y_axis(), -steer_deg.to_radians());
    (yaw * vector![0.0, 0.0, 1.0], yaw * vector![-1.0, 0.0, 0.0])
}

pub fn probe_wheel(
    wheel: &RaycastWheel,
    body: &RigidBody,
    query: &QueryPipeline,
    bodies: &RigidBodySet,
    colliders: &ColliderSet,
    handle: RigidBodyHandle,
) -> WheelProbe {
    let pos = body.position();
    let rot = pos.rotation;
    let up = rot * vector![0.0, 1.0, 0.0];
    let mount = pos * wheel.mount_local;

    let travel = wheel.settings.suspension_distance;
    let radius = wheel.settings.radius;

    let mut probe = WheelProbe { mount, up, center: mount - up * travel, contact: None };

    let ray = Ray::new(mount, -up);
    let filter = QueryFilter::default().exclude_rigid_body(handle);
    let Some((_hit, toi)) = query.cast_ray(bodies, colliders, &ray, travel + radius, true, filter)
    else {
        return probe;
    };

    let length = (toi - radius).clamp(0.0, travel);
    let compression = travel - length;
    probe.center = mount - up * length;
    if compression <= 0.0 {
        return probe;
    }

    let hit_point = mount - up * toi;
    let point_vel = body.velocity_at_point(&hit_point);
    let suspension_vel = point_vel.dot(&up);
    let normal_force = suspension_force(compression, suspension_vel, &wheel.settings.suspension_spring);

    let (fwd_local, right_local) = steered_basis(wheel.steer_angle);
    let forward = rot * fwd_local;
    let right = rot * right_local;

    probe.contact = Some(WheelContact {
        hit_point,
        compression,
        suspension_vel,
        normal_force,
        point_vel,
        forward,
        right,
        v_long: point_vel.dot(&forward),
        v_lat: point_vel.dot(&right),
    });
    probe
}
