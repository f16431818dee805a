//! Director systems: тик SpawnDirector'а и размещение волн вокруг цели.

use std::f32::consts::TAU;

use bevy::ecs::entity::Entities;
use bevy::prelude::*;
use rand::Rng;

use crate::combat::Dead;
use crate::components::ArenaTarget;
use crate::director::archetype::{spawn_enemy, EnemyRoster};
use crate::director::difficulty::{DifficultyChanged, DifficultySnapshot};
use crate::director::spawner::{DirectorTuning, SpawnDirector};
use crate::navigation::{NavSurface, NavigationSurface};
use crate::DeterministicRng;

/// Event: director создал врага
#[derive(Event, Debug, Clone, PartialEq)]
pub struct EnemySpawned {
    pub entity: Entity,
    pub archetype: String,
    pub position: Vec3,
}

/// Точка на кольце `distance` вокруг `center`.
///
/// Летающие: первая же точка, высота `center.y + flyer_height_offset`.
/// Наземные: до `spawn_attempts` попыток спроецировать точку на поверхность.
pub fn pick_spawn_position<R: Rng + ?Sized>(
    rng: &mut R,
    center: Vec3,
    distance: f32,
    flying: bool,
    tuning: &DirectorTuning,
    surface: &dyn NavSurface,
) -> Option<Vec3> {
    for _ in 0..tuning.spawn_attempts {
        let angle = rng.gen_range(0.0..TAU);
        let point = center + Vec3::new(angle.cos(), 0.0, angle.sin()) * distance;

        if flying {
            return Some(Vec3::new(point.x, center.y + tuning.flyer_height_offset, point.z));
        }
        if let Some(snapped) = surface.sample_position(point, tuning.sample_radius) {
            return Some(snapped);
        }
    }
    None
}

/// System: эскалация + волны (только пока SpawnDirector существует)
pub fn run_spawn_director(
    mut commands: Commands,
    director: Option<ResMut<SpawnDirector>>,
    mut snapshot: ResMut<DifficultySnapshot>,
    roster: Res<EnemyRoster>,
    surface: Res<NavigationSurface>,
    targets: Query<&Transform, (With<ArenaTarget>, Without<Dead>)>,
    entities: &Entities,
    mut rng: ResMut<DeterministicRng>,
    time: Res<Time<Fixed>>,
    mut changed_events: EventWriter<DifficultyChanged>,
    mut spawned_events: EventWriter<EnemySpawned>,
) {
    let Some(mut director) = director else {
        return;
    };

    director.live_mut().prune(|entity| entities.contains(entity));

    let tick = director.advance(time.delta_secs());
    if let Some(level_up) = tick.level_up {
        *snapshot = level_up;
        changed_events.write(DifficultyChanged { snapshot: level_up });
    }

    if !tick.wave_due {
        return;
    }

    // Нет цели / цель мертва → пропуск до следующей волны
    let Some(target) = director.target else {
        return;
    };
    let Ok(target_transform) = targets.get(target) else {
        return;
    };
    if roster.is_empty() {
        return;
    }

    let wave = director.wave_size();
    if wave == 0 {
        crate::log(&format!(
            "🌊 Wave skipped: {} alive (cap {})",
            director.live().len(),
            director.tuning.max_enemies_alive
        ));
        return;
    }

    let center = target_transform.translation;
    let distance = director.spawn_distance();
    let current = director.snapshot();
    let mut spawned = 0;

    for _ in 0..wave {
        // Soft cap перепроверяется на каждый слот
        if !director.has_capacity() {
            break;
        }

        let index = rng.rng.gen_range(0..roster.archetypes.len());
        let spec = &roster.archetypes[index];

        let Some(position) = pick_spawn_position(
            &mut rng.rng,
            center,
            distance,
            spec.is_flying(),
            &director.tuning,
            surface.surface(),
        ) else {
            crate::log_warning(&format!("🌊 Failed to find valid spawn position for {}", spec.name));
            continue;
        };

        let entity = spawn_enemy(&mut commands, spec, position, current, target);
        director.admit(entity);
        spawned += 1;

        spawned_events.write(EnemySpawned {
            entity,
            archetype: spec.name.clone(),
            position,
        });
    }

    director.record_wave();
    crate::log(&format!(
        "🌊 Wave {}: spawned {}/{} (level {}, {} alive)",
        director.waves_spawned(),
        spawned,
        wave,
        current.level,
        director.live().len()
    ));
}
