//! Boss module: фазовый босс арены.
//!
//! Архитектура:
//! - `attacks`: выбор атаки, таймлайны, дуга прыжка (чистые функции)
//! - `brain`: BossBrain (здоровье/фазы, бой, cooldown, удержание в арене)
//! - `scaler`: разовое масштабирование по уровню сложности
//! - `systems`: ECS обвязка (урон, тик, события)

use bevy::prelude::*;

use crate::components::{EnemyTag, Pursuit};
use crate::scene::SceneTransition;
use crate::SimSet;

pub mod attacks;
pub mod brain;
pub mod scaler;
pub mod systems;

#[cfg(test)]
mod brain_tests;

// Re-export основных типов
pub use attacks::{choose_attack, jump_flight_duration, BossAttack, BossCue, JumpArc};
pub use brain::{AttackDamage, BossBrain, BossContext, BossEvent, BossTuning, PhaseModifiers};
pub use scaler::{BossMultipliers, BossScaling};
pub use systems::{BossAreaStatusChanged, BossDefeated, BossHealthChanged, BossPhaseChanged};

/// Boss Plugin
///
/// 1. apply_boss_damage: после apply_damage (SimSet::Damage)
/// 2. tick_boss: после мозгов агентов, до движения mover'ов (SimSet::Brains)
pub struct BossPlugin;

impl Plugin for BossPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<BossHealthChanged>()
            .add_event::<BossPhaseChanged>()
            .add_event::<BossAreaStatusChanged>()
            .add_event::<BossDefeated>()
            .add_event::<SceneTransition>();

        app.add_systems(
            FixedUpdate,
            systems::apply_boss_damage
                .in_set(SimSet::Damage)
                .after(crate::combat::damage::apply_damage),
        );
        app.add_systems(
            FixedUpdate,
            systems::tick_boss
                .in_set(SimSet::Brains)
                .after(crate::ai::systems::tick_flyers)
                .before(crate::navigation::drive_nav_movers),
        );
    }
}

/// Спавн босса (масштабирование по сложности делает вызывающий, до спавна)
pub fn spawn_boss(world: &mut World, brain: BossBrain, position: Vec3, target: Entity) -> Entity {
    let entity = world
        .spawn((
            brain,
            Transform::from_translation(position),
            Pursuit::new(target),
            EnemyTag {
                archetype: "Boss".to_string(),
            },
        ))
        .id();
    crate::log_info(&format!("🐸 Boss spawned: {:?} at {:?}", entity, position));
    entity
}
