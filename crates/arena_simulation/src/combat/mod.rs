//! Combat module: damage sink, смерть, снаряды, cue-события.
//!
//! ECS ответственность:
//! - Health и правила урона (DamageIntent → DamageDealt / EntityDied)
//! - Снаряды врагов (flyer volley, boss shots)
//! - Cue-события для внешних VFX/audio
//!
//! Игрок и его оружие живут снаружи: урон по врагам приходит как DamageIntent.

use bevy::prelude::*;

use crate::SimSet;

pub mod cues;
pub mod damage;
pub mod projectile;


// Re-export основных типов
pub use cues::{CombatCue, CueKind};
pub use damage::{
    scale_damage, DamageDealt, DamageIntent, Dead, DespawnAfter, EntityDied, HealIntent, HealthChanged,
};
pub use projectile::{blast_falloff, Blast, Projectile, ProjectileLaunched, PROJECTILE_LIFETIME};

/// Combat Plugin
///
/// Порядок выполнения:
/// 1. apply_damage → apply_healing: DamageIntent / HealIntent → Health (SimSet::Damage)
/// 2. spawn_projectiles / advance_projectiles: полёт и попадания (SimSet::Effects)
/// 3. disable_ai_on_death / despawn_after_timeout: cleanup (SimSet::Cleanup)
pub struct CombatPlugin;

impl Plugin for CombatPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<DamageIntent>()
            .add_event::<DamageDealt>()
            .add_event::<EntityDied>()
            .add_event::<HealIntent>()
            .add_event::<HealthChanged>()
            .add_event::<ProjectileLaunched>()
            .add_event::<CombatCue>();

        app.add_systems(
            FixedUpdate,
            (damage::apply_damage, damage::apply_healing)
                .chain()
                .in_set(SimSet::Damage),
        );
        app.add_systems(
            FixedUpdate,
            (projectile::spawn_projectiles, projectile::advance_projectiles)
                .chain()
                .in_set(SimSet::Effects),
        );
        app.add_systems(
            FixedUpdate,
            (damage::disable_ai_on_death, damage::despawn_after_timeout)
                .chain()
                .in_set(SimSet::Cleanup),
        );
    }
}
