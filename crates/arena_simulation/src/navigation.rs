//! Navigation surface (consumed collaborator) + drive system для NavMover.
//!
//! Внутренности navmesh вне симуляции: нужна только проекция точки на
//! проходимую поверхность (`sample_position`).

use bevy::prelude::*;
use rand::Rng;

use crate::components::NavMover;

/// Проходимая поверхность
pub trait NavSurface: Send + Sync {
    /// Ближайшая проходимая точка в пределах `max_distance` от `point`
    fn sample_position(&self, point: Vec3, max_distance: f32) -> Option<Vec3>;
}

/// Бесконечная плоскость на высоте `height`
#[derive(Debug, Clone, Copy, Default)]
pub struct FlatPlane {
    pub height: f32,
}

impl NavSurface for FlatPlane {
    fn sample_position(&self, point: Vec3, max_distance: f32) -> Option<Vec3> {
        let nearest = Vec3::new(point.x, self.height, point.z);
        (nearest.distance(point) <= max_distance).then_some(nearest)
    }
}

/// Круглая арена: диск радиуса `radius` на высоте `center.y`
#[derive(Debug, Clone, Copy)]
pub struct FlatDisk {
    pub center: Vec3,
    pub radius: f32,
}

impl NavSurface for FlatDisk {
    fn sample_position(&self, point: Vec3, max_distance: f32) -> Option<Vec3> {
        let mut offset = Vec2::new(point.x - self.center.x, point.z - self.center.z);
        let length = offset.length();
        if length > self.radius {
            offset = offset / length * self.radius;
        }
        let nearest = Vec3::new(self.center.x + offset.x, self.center.y, self.center.z + offset.y);
        (nearest.distance(point) <= max_distance).then_some(nearest)
    }
}

/// Resource: поверхность текущего уровня
#[derive(Resource)]
pub struct NavigationSurface(pub Box<dyn NavSurface>);

impl Default for NavigationSurface {
    fn default() -> Self {
        Self(Box::new(FlatPlane::default()))
    }
}

impl NavigationSurface {
    pub fn new(surface: impl NavSurface + 'static) -> Self {
        Self(Box::new(surface))
    }

    pub fn surface(&self) -> &dyn NavSurface {
        self.0.as_ref()
    }
}

/// Случайная точка внутри шара радиуса `radius` (rejection sampling)
pub fn random_point_in_ball<R: Rng + ?Sized>(rng: &mut R, center: Vec3, radius: f32) -> Vec3 {
    loop {
        let candidate = Vec3::new(
            rng.gen_range(-1.0..=1.0),
            rng.gen_range(-1.0..=1.0),
            rng.gen_range(-1.0..=1.0),
        );
        if candidate.length_squared() <= 1.0 {
            return center + candidate * radius;
        }
    }
}

/// Система: движение всех NavMover'ов по поверхности
pub fn drive_nav_movers(
    mut movers: Query<(&mut NavMover, &mut Transform)>,
    surface: Res<NavigationSurface>,
    time: Res<Time<Fixed>>,
) {
    let delta = time.delta_secs();

    for (mut mover, mut transform) in movers.iter_mut() {
        let mut position = transform.translation;
        mover.advance(&mut position, delta, surface.surface());
        if position != transform.translation {
            transform.translation = position;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_flat_disk_clamps_to_rim() {
        let disk = FlatDisk { center: Vec3::ZERO, radius: 10.0 };
        let snapped = disk.sample_position(Vec3::new(12.0, 0.0, 0.0), 5.0);
        assert_eq!(snapped, Some(Vec3::new(10.0, 0.0, 0.0)));
    }

    #[test]
    fn test_flat_disk_rejects_far_points() {
        let disk = FlatDisk { center: Vec3::ZERO, radius: 10.0 };
        assert!(disk.sample_position(Vec3::new(30.0, 0.0, 0.0), 5.0).is_none());
        // Высота тоже считается
        assert!(disk.sample_position(Vec3::new(0.0, 8.0, 0.0), 5.0).is_none());
    }

    #[test]
    fn test_flat_plane_projects_down() {
        let plane = FlatPlane { height: 1.0 };
        assert_eq!(
            plane.sample_position(Vec3::new(3.0, 4.0, -2.0), 5.0),
            Some(Vec3::new(3.0, 1.0, -2.0))
        );
    }

    #[test]
    fn test_random_point_in_ball_stays_inside() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let center = Vec3::new(5.0, 0.0, 5.0);
        for _ in 0..500 {
            let point = random_point_in_ball(&mut rng, center, 10.0);
            assert!(point.distance(center) <= 10.0 + 1e-4);
        }
    }
}
