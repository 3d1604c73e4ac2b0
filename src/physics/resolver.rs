use crate::constants::collision::{KINEMATIC_MASS_BONUS, REST_NORMAL_Y, REST_SPEED};
use crate::math::Vec3;
use crate::scene::Node;

use super::gjk::CollisionInfo;

/// Apply one contact to `source`, the moving side of the pair.
///
/// In order: record the target, correct the position out of penetration,
/// reflect the velocity about the contact normal, run the 1-D elastic
/// impulse transfer, then check for rest against ground-like normals.
///
/// The impulse step overwrites the velocity with `−v1f`; combined with
/// the reflection above it can double-invert along the normal. Flagged
/// for physics review in DESIGN.md; do not change one without the other.
pub fn resolve_contact(source: &mut Node, target: &Node, info: &CollisionInfo) {
    // Record
    source.collision_targets.push(target.id);

    // Positional correction along the normal facing the motion
    let mut normal = info.normal;
    if source.translation_velocity.dot(normal) < 0.0 {
        normal = -normal;
    }
    source.transform.position -= normal * info.depth;

    // Velocity reflection, perfectly elastic w.r.t. the normal
    let v = source.translation_velocity;
    source.translation_velocity = v - normal * (2.0 * v.dot(normal));

    // Impulse transfer; a pinned or static target acts as source mass
    // plus a large constant
    let m1 = source.mass;
    let m2 = if target.is_dynamic() {
        target.mass
    } else {
        m1 + KINEMATIC_MASS_BONUS
    };
    let v1 = source.translation_velocity;
    let v2 = target.translation_velocity;
    let v1f = (v1 * (m1 - m2) + v2 * (2.0 * m2)) * (1.0 / (m1 + m2));
    source.translation_velocity = -v1f;

    // Rest detection on ground-like contacts
    if (normal.is_zero() || normal.y < REST_NORMAL_Y)
        && source.translation_velocity.length() <= REST_SPEED
    {
        source.is_kinematic = true;
        source.translation_velocity = Vec3::ZERO;
        source.angular_velocity = Vec3::ZERO;
        source.gravity_velocity = Vec3::ZERO;
    }
}
