//! AI module: наземные агенты (FSM + attack behavior) и летающие враги.
//!
//! Мозги: обычные структуры с `tick(delta, ctx)`, ECS-системы только
//! собирают контекст и переводят результаты тика в события.

use bevy::prelude::*;

use crate::SimSet;

pub mod attack;
pub mod components;
pub mod flyer;
pub mod systems;

// Re-export основных типов
pub use attack::{AttackBehavior, AttackCue};
pub use components::*;
pub use flyer::{FlyerBrain, FlyerEvent, FlyerMode, FlyerTuning};

/// AI Plugin
///
/// Порядок выполнения:
/// 1. react_to_death / react_to_damage: после apply_damage (SimSet::Damage)
/// 2. track_target_motion: скорость цели для упреждения
/// 3. tick_combat_agents / tick_flyers: тики мозгов
/// 4. drive_nav_movers: движение по destination'ам, выставленным мозгами
pub struct AIPlugin;

impl Plugin for AIPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            FixedUpdate,
            (systems::react_to_death, systems::react_to_damage)
                .chain()
                .in_set(SimSet::Damage)
                .after(crate::combat::damage::apply_damage),
        );

        app.add_systems(
            FixedUpdate,
            (
                crate::components::track_target_motion,
                systems::tick_combat_agents,
                systems::tick_flyers,
                crate::navigation::drive_nav_movers,
            )
                .chain() // Последовательное выполнение для детерминизма
                .in_set(SimSet::Brains),
        );
    }
}
