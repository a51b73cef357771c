// ==============================================================================
// tire.rs — FRICTION-CURVE TIRE FORCES (demo host)
// ==============================================================================
// Longitudinal:
//   F_drive = motor / r
//   F_brake = -clamp(v_long / 0.5, -1, 1) * |brake| / r   (ramped through 0)
//   demand  = F_drive + F_brake
//   forward_slip = demand / (F_n * extremum * stiffness)
//   |forward_slip| <= 1 -> F_x = demand
//   otherwise           -> F_x = sign(demand) * F_n * asymptote * stiffness
//
// Lateral:
//   sideways_slip = v_lat / max(|v_long|, 1)
//   F_y = -sign(v_lat) * sideways_curve(stiffness)(slip) * F_n
//
// Brake and lateral forces are capped so one step never reverses the contact
// velocity (|v| * m_share / dt).
// ==============================================================================

use crate::handling::math::sign;
use crate::settings::WheelSettings;

pub const SLIP_SPEED_FLOOR: f32 = 1.0;
pub const BRAKE_RAMP_SPEED: f32 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TireInput {
    pub normal_force: f32,
    pub v_long: f32,
    pub v_lat: f32,
    pub motor_torque: f32,
    pub brake_torque: f32,
    pub sideways_stiffness: f32,
    /// Chassis mass carried by this wheel.
    pub mass_share: f32,
    pub dt: f32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TireForces {
    pub longitudinal: f32,
    pub lateral: f32,
    pub forward_slip: f32,
    pub sideways_slip: f32,
}

pub fn sideways_slip(v_long: f32, v_lat: f32) -> f32 {
    v_lat / v_long.abs().max(SLIP_SPEED_FLOOR)
}

pub fn solve_tire(wheel: &WheelSettings, i: &TireInput) -> TireForces {
    if i.normal_force <= 0.0 || wheel.radius <= 0.0 {
        return TireForces::default();
    }
    let inv_dt = if i.dt > 0.0 { 1.0 / i.dt } else { 0.0 };
    let r = wheel.radius;

    // --- longitudinal ---
    let drive = i.motor_torque / r;
    let brake_cap = i.v_long.abs() * i.mass_share * inv_dt;
    let brake = (-(i.v_long / BRAKE_RAMP_SPEED).clamp(-1.0, 1.0) * i.brake_torque.abs() / r)
        .clamp(-brake_cap, brake_cap);
    let demand = drive + brake;

    let fwd = &wheel.forward_friction;
    let grip = i.normal_force * fwd.extremum_value * fwd.stiffness;
    let forward_slip = if grip > 0.0 { demand / grip } else { 0.0 };
    let longitudinal = if forward_slip.abs() <= 1.0 {
        demand
    } else {
        sign(demand) * i.normal_force * fwd.asymptote_value * fwd.stiffness
    };

    // --- lateral ---
    let slip = sideways_slip(i.v_long, i.v_lat);
    let curve = wheel.sideways_friction.with_stiffness(i.sideways_stiffness);
    let lat_cap = i.v_lat.abs() * i.mass_share * inv_dt;
    let lateral = -sign(i.v_lat) * (curve.evaluate(slip) * i.normal_force).min(lat_cap);

    TireForces { longitudinal, lateral, forward_slip, sideways_slip: slip }
}
