use bevy::prelude::*;

/// Camera ray through a point given in NDC (x right, y up).
pub fn ndc_ray(camera: &Camera, camera_transform: &GlobalTransform, ndc: Vec2) -> Option<Ray3d> {
    let size = camera.logical_viewport_size()?;
    let viewport = Vec2::new((ndc.x + 1.0) * 0.5 * size.x, (1.0 - ndc.y) * 0.5 * size.y);
    camera.viewport_to_world(camera_transform, viewport).ok()
}

/// Distance along the ray to an oriented box of `size` centred on `xf`.
pub fn ray_hits_obb(origin: Vec3, dir: Vec3, xf: &GlobalTransform, size: Vec3) -> Option<f32> {
    let inv = xf.compute_matrix().inverse();
    let o_local = inv.transform_point3(origin);
    let d_local = inv.transform_vector3(dir);
    let he = size * 0.5;
    // Parametric t is preserved by the affine inverse, so it stays comparable across boxes.
    ray_aabb_hit_t(o_local, d_local, -he, he)
}

// Slab-method ray–AABB intersection, returns Some(t) or None
pub fn ray_aabb_hit_t(ray_origin: Vec3, ray_direction: Vec3, min: Vec3, max: Vec3) -> Option<f32> {
    let mut t_enter = f32::NEG_INFINITY;
    let mut t_exit = f32::INFINITY;

    for axis in 0..3 {
        let origin = ray_origin[axis];
        let direction = ray_direction[axis];
        if direction.abs() < f32::EPSILON {
            // Parallel to this slab: either always inside it or never.
            if origin < min[axis] || origin > max[axis] {
                return None;
            }
            continue;
        }
        let inv = 1.0 / direction;
        let (mut t0, mut t1) = ((min[axis] - origin) * inv, (max[axis] - origin) * inv);
        if t0 > t1 {
            std::mem::swap(&mut t0, &mut t1);
        }
        t_enter = t_enter.max(t0);
        t_exit = t_exit.min(t1);
        if t_enter > t_exit {
            return None;
        }
    }

    if t_exit < 0.0 {
        return None;
    }
    Some(if t_enter >= 0.0 { t_enter } else { t_exit })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ray_through_box_reports_entry_distance() {
        let t = ray_aabb_hit_t(Vec3::new(0.0, 0.0, -5.0), Vec3::Z, Vec3::splat(-1.0), Vec3::ONE);
        assert_eq!(t, Some(4.0));
    }

    #[test]
    fn ray_pointing_away_misses() {
        let t = ray_aabb_hit_t(Vec3::new(0.0, 0.0, -5.0), -Vec3::Z, Vec3::splat(-1.0), Vec3::ONE);
        assert_eq!(t, None);
    }

    #[test]
    fn parallel_ray_outside_slab_misses() {
        let t = ray_aabb_hit_t(Vec3::new(0.0, 3.0, -5.0), Vec3::Z, Vec3::splat(-1.0), Vec3::ONE);
        assert_eq!(t, None);
    }

    #[test]
    fn origin_inside_box_reports_exit() {
        let t = ray_aabb_hit_t(Vec3::ZERO, Vec3::X, Vec3::splat(-1.0), Vec3::ONE);
        assert_eq!(t, Some(1.0));
    }

    #[test]
    fn obb_respects_rotation() {
        let xf = GlobalTransform::from(
            Transform::from_xyz(0.0, 0.0, 5.0)
                .with_rotation(Quat::from_rotation_y(std::f32::consts::FRAC_PI_4)),
        );
        // A 2x2x0.2 slab rotated 45° about Y: a ray along +Z still hits near its centre.
        let t = ray_hits_obb(Vec3::ZERO, Vec3::Z, &xf, Vec3::new(2.0, 2.0, 0.2)).unwrap();
        assert!((t - 5.0).abs() < 0.2);

        // Offset sideways past the rotated half-width it misses.
        let beside = Vec3::new(1.5, 0.0, 0.0);
        assert!(ray_hits_obb(beside, Vec3::Z, &xf, Vec3::new(2.0, 2.0, 0.2)).is_none());
    }
}
