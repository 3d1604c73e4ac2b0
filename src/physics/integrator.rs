use std::time::Duration;

use crate::constants::physics::{
    AIR_DENSITY, DRAG_COEFFICIENT, DRAG_LINEAR_CUTOFF, REFERENCE_AREA,
};
use crate::math::{Quat, Vec3};
use crate::scene::Node;

/// Terminal fall speed for a body of `mass` under `gravity`:
/// `√(2·m·g / (ρ·A·Cd))`
pub fn terminal_velocity(mass: f64, gravity: Vec3) -> f64 {
    if mass <= 0.0 {
        return 0.0;
    }
    let g = gravity.length();
    (2.0 * mass * g / (AIR_DENSITY * REFERENCE_AREA * DRAG_COEFFICIENT)).sqrt()
}

/// Drag deceleration over one tick, quadratic above the cutoff speed and
/// linear below it. Never reverses the velocity.
fn apply_drag(v: Vec3, mass: f64, dt: f64) -> Vec3 {
    let speed = v.length();
    if speed == 0.0 || mass <= 0.0 {
        return v;
    }

    let magnitude = if speed > DRAG_LINEAR_CUTOFF {
        0.5 * AIR_DENSITY * DRAG_COEFFICIENT * REFERENCE_AREA * speed * speed
    } else {
        0.5 * AIR_DENSITY * DRAG_COEFFICIENT * REFERENCE_AREA * speed
    };

    let decel = magnitude / mass * dt;
    if decel >= speed {
        Vec3::ZERO
    } else {
        v - v.normalize() * decel
    }
}

/// Semi-implicit Euler step for one dynamic node.
///
/// Order per tick: drag on both velocities, gravity accumulation with a
/// terminal-velocity clamp, the apex fold that keeps projectile peaks
/// smooth, position/rotation integration, then momentum derivation.
/// Static and kinematic nodes never reach this function.
pub fn integrate(node: &mut Node, gravity: Vec3, dt: Duration) {
    let dt = dt.as_secs_f64();

    // Drag
    node.translation_velocity = apply_drag(node.translation_velocity, node.mass, dt);
    node.angular_velocity = apply_drag(node.angular_velocity, node.mass, dt);

    // Gravity, clamped at the node's terminal velocity
    node.gravity_velocity += gravity * dt;
    if node.gravity_velocity.length() > node.terminal_velocity {
        node.gravity_velocity = gravity.normalize() * node.terminal_velocity;
    }

    // Apex fold: a rising body whose combined vertical velocity has gone
    // negative hands the residual to gravity and stops climbing
    if node.translation_velocity.y > 0.0
        && node.gravity_velocity.y + node.translation_velocity.y < 0.0
    {
        node.gravity_velocity.y += node.translation_velocity.y;
        node.translation_velocity.y = 0.0;
    }

    // Integrate
    let velocity = node.gravity_velocity + node.translation_velocity;
    node.transform.position += velocity * dt;

    let spin = node.angular_velocity * dt;
    if !spin.is_zero() {
        node.transform.rotation = Quat::from_euler(spin) * node.transform.rotation;
    }

    // Momentum
    node.linear_momentum = velocity * node.mass;
    node.angular_momentum = node.angular_velocity * node.mass;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{SceneObject, SceneObjectArgs};
    use approx::assert_relative_eq;

    const GRAVITY: Vec3 = Vec3::new(0.0, -9.8, 0.0);
    const TICK: Duration = Duration::from_micros(16_667);

    fn dynamic_node(mass: f64) -> Node {
        let object = SceneObject::new(SceneObjectArgs {
            physics: Some(crate::scene::PhysicsTemplate {
                mass,
                collision_layer: 1,
            }),
            shape: Some(crate::shape::cube()),
            ..Default::default()
        });
        Node::build(1, object, mass, terminal_velocity(mass, GRAVITY))
    }

    #[test]
    fn test_terminal_velocity_formula() {
        let v = terminal_velocity(1.0, GRAVITY);
        assert_relative_eq!(v, (2.0_f64 * 9.8 / (1.2 * 1.05)).sqrt(), epsilon = 1e-12);
        assert_eq!(terminal_velocity(0.0, GRAVITY), 0.0);
    }

    #[test]
    fn test_gravity_accumulates_and_clamps() {
        let mut node = dynamic_node(1.0);
        for _ in 0..600 {
            integrate(&mut node, GRAVITY, TICK);
        }
        // After ten simulated seconds the fall speed sits at terminal
        assert_relative_eq!(
            node.gravity_velocity.length(),
            node.terminal_velocity,
            epsilon = 1e-9
        );
        assert!(node.transform.position.y < 0.0);
    }

    #[test]
    fn test_drag_reduces_speed_without_reversal() {
        let mut node = dynamic_node(1.0);
        node.translation_velocity = Vec3::new(5.0, 0.0, 0.0);
        let mut previous = 5.0;
        for _ in 0..300 {
            integrate(&mut node, Vec3::ZERO, TICK);
            let speed = node.translation_velocity.length();
            assert!(speed <= previous);
            assert!(node.translation_velocity.x >= 0.0);
            previous = speed;
        }
        assert!(previous < 2.0);
    }

    #[test]
    fn test_apex_fold_zeroes_climb() {
        let mut node = dynamic_node(1.0);
        node.translation_velocity = Vec3::new(0.0, 0.5, 0.0);
        node.gravity_velocity = Vec3::new(0.0, -1.0, 0.0);

        integrate(&mut node, GRAVITY, TICK);

        assert_eq!(node.translation_velocity.y, 0.0);
        assert!(node.gravity_velocity.y < 0.0);
        // The fold moved the climb into the gravity channel
        assert!(node.gravity_velocity.y > -1.2);
    }

    #[test]
    fn test_angular_velocity_spins_rotation() {
        let mut node = dynamic_node(1.0);
        node.angular_velocity = Vec3::new(0.0, std::f64::consts::PI, 0.0);

        integrate(&mut node, Vec3::ZERO, TICK);

        let (axis, angle) = node.transform.rotation.to_axis_angle();
        assert_relative_eq!(axis.y.abs(), 1.0, epsilon = 1e-9);
        assert!(angle > 0.0 && angle < 0.1);
    }

    #[test]
    fn test_momentum_derivation() {
        let mut node = dynamic_node(2.0);
        node.translation_velocity = Vec3::new(1.0, 0.0, 0.0);
        node.angular_velocity = Vec3::new(0.0, 0.0, 0.5);

        integrate(&mut node, Vec3::ZERO, TICK);

        assert_relative_eq!(
            node.linear_momentum.x,
            node.translation_velocity.x * 2.0,
            epsilon = 1e-12
        );
        assert_relative_eq!(
            node.angular_momentum.z,
            node.angular_velocity.z * 2.0,
            epsilon = 1e-12
        );
    }
}
