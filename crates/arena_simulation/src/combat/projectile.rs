//! Снаряды врагов: линейный полёт, swept hit-test по телу цели, взрыв с falloff.

use bevy::prelude::*;

use crate::ai::attack::{TARGET_BODY_HEIGHT, TARGET_BODY_RADIUS};
use crate::combat::{CombatCue, CueKind, DamageIntent};
use crate::components::ArenaTarget;
use crate::navigation::NavigationSurface;

/// Время жизни снаряда (сек)
pub const PROJECTILE_LIFETIME: f32 = 5.0;

/// Радиус самого снаряда
pub const PROJECTILE_RADIUS: f32 = 0.3;

/// Насколько ниже поверхности ищем землю под снарядом
const GROUND_SAMPLE_RADIUS: f32 = 2.0;

/// Параметры взрыва (BigShot)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Blast {
    pub radius: f32,
    pub knockback: f32,
}

/// Запрос на выстрел (пишут flyer'ы и босс)
#[derive(Event, Debug, Clone, PartialEq)]
pub struct ProjectileLaunched {
    pub owner: Entity,
    pub origin: Vec3,
    pub direction: Vec3,
    pub speed: f32,
    pub damage: u32,
    pub blast: Option<Blast>,
}

#[derive(Component, Debug, Clone, PartialEq)]
pub struct Projectile {
    pub owner: Entity,
    pub velocity: Vec3,
    pub damage: u32,
    pub blast: Option<Blast>,
    pub lifetime: f32,
}

/// Урон и сила отброса взрыва на дистанции `distance` (None: вне радиуса)
pub fn blast_falloff(damage: u32, blast: Blast, distance: f32) -> Option<(u32, f32)> {
    if blast.radius <= 0.0 || distance > blast.radius {
        return None;
    }
    let factor = 1.0 - distance / blast.radius;
    // Урон отбрасывает дробную часть
    Some(((damage as f32 * factor) as u32, blast.knockback * factor))
}

/// Swept-проверка: отрезок полёта за тик против вертикальной капсулы цели
pub fn sweep_hits_body(from: Vec3, to: Vec3, feet: Vec3) -> bool {
    let center = feet + Vec3::Y * (TARGET_BODY_HEIGHT * 0.5);
    let closest = closest_point_on_segment(from, to, center);
    let axis_y = closest.y.clamp(feet.y, feet.y + TARGET_BODY_HEIGHT);
    let axis_point = Vec3::new(feet.x, axis_y, feet.z);
    closest.distance(axis_point) <= TARGET_BODY_RADIUS + PROJECTILE_RADIUS
}

fn closest_point_on_segment(a: Vec3, b: Vec3, point: Vec3) -> Vec3 {
    let segment = b - a;
    let length_sq = segment.length_squared();
    if length_sq <= f32::EPSILON {
        return a;
    }
    let t = ((point - a).dot(segment) / length_sq).clamp(0.0, 1.0);
    a + segment * t
}

/// Система: ProjectileLaunched → entity снаряда
pub fn spawn_projectiles(mut commands: Commands, mut launched: EventReader<ProjectileLaunched>) {
    for event in launched.read() {
        let direction = event.direction.normalize_or_zero();
        if direction == Vec3::ZERO || event.speed <= 0.0 {
            crate::log_warning(&format!("🔫 Projectile from {:?} has no direction, skipped", event.owner));
            continue;
        }

        commands.spawn((
            Projectile {
                owner: event.owner,
                velocity: direction * event.speed,
                damage: event.damage,
                blast: event.blast,
                lifetime: PROJECTILE_LIFETIME,
            },
            Transform::from_translation(event.origin),
        ));
    }
}

/// Система: полёт снарядов, попадания, взрывы, истечение lifetime
pub fn advance_projectiles(
    mut commands: Commands,
    mut projectiles: Query<(Entity, &mut Projectile, &mut Transform), Without<ArenaTarget>>,
    targets: Query<(Entity, &Transform), With<ArenaTarget>>,
    surface: Res<NavigationSurface>,
    time: Res<Time<Fixed>>,
    mut damage_events: EventWriter<DamageIntent>,
    mut cues: EventWriter<CombatCue>,
) {
    let delta = time.delta_secs();

    for (entity, mut projectile, mut transform) in projectiles.iter_mut() {
        projectile.lifetime -= delta;
        if projectile.lifetime <= 0.0 {
            commands.entity(entity).despawn();
            continue;
        }

        let from = transform.translation;
        let to = from + projectile.velocity * delta;
        transform.translation = to;

        let direct_hit = targets
            .iter()
            .find(|(_, target)| sweep_hits_body(from, to, target.translation))
            .map(|(target, _)| target);

        let ground_hit = surface
            .surface()
            .sample_position(to, GROUND_SAMPLE_RADIUS)
            .is_some_and(|ground| to.y <= ground.y);

        if direct_hit.is_none() && !ground_hit {
            continue;
        }

        match projectile.blast {
            Some(blast) => {
                for (target, target_transform) in targets.iter() {
                    let offset = target_transform.translation - to;
                    let Some((amount, force)) = blast_falloff(projectile.damage, blast, offset.length()) else {
                        continue;
                    };
                    damage_events.write(
                        DamageIntent::new(Some(projectile.owner), target, amount)
                            .with_knockback(offset.normalize_or_zero() * force),
                    );
                }
                cues.write(CombatCue::new(
                    projectile.owner,
                    CueKind::Explosion {
                        center: to,
                        radius: blast.radius,
                    },
                ));
            }
            None => {
                if let Some(target) = direct_hit {
                    damage_events.write(DamageIntent::new(Some(projectile.owner), target, projectile.damage));
                }
            }
        }

        commands.entity(entity).despawn();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blast_falloff_linear() {
        let blast = Blast {
            radius: 4.0,
            knockback: 10.0,
        };
        assert_eq!(blast_falloff(40, blast, 0.0), Some((40, 10.0)));
        // 40 * 0.75 = 30, отброс 7.5
        assert_eq!(blast_falloff(40, blast, 1.0), Some((30, 7.5)));
        // 25 * 0.5 = 12.5 → 12
        assert_eq!(blast_falloff(25, blast, 2.0).map(|(damage, _)| damage), Some(12));
        assert_eq!(blast_falloff(40, blast, 4.5), None);
    }

    #[test]
    fn test_sweep_catches_fast_projectile() {
        let feet = Vec3::new(0.0, 0.0, 0.0);
        // за тик пролетает сквозь цель
        assert!(sweep_hits_body(Vec3::new(0.0, 1.0, 5.0), Vec3::new(0.0, 1.0, -5.0), feet));
        // мимо сбоку
        assert!(!sweep_hits_body(Vec3::new(2.0, 1.0, 5.0), Vec3::new(2.0, 1.0, -5.0), feet));
        // над головой
        assert!(!sweep_hits_body(Vec3::new(0.0, 3.5, 5.0), Vec3::new(0.0, 3.5, -5.0), feet));
    }
}
