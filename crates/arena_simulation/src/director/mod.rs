//! Director module: сложность, волны врагов, сессии уровней.
//!
//! Архитектура:
//! - `difficulty`: DifficultySnapshot + ключи хранилища
//! - `spawner`: SpawnDirector (эскалация, темп, live set), без ECS
//! - `archetype`: roster врагов и сборка entity со scaling'ом
//! - `systems`: тик director'а и размещение волн на кольце вокруг цели
//! - `upgrades`: постоянные апгрейды цели и бонусы забега
//! - `session`: bootstrap уровней, портал, рестарт, статистика забега

use bevy::prelude::*;

use crate::scene::{PortalEntered, RunRestarted, SceneTransition};
use crate::SimSet;

pub mod archetype;
pub mod difficulty;
pub mod session;
pub mod spawner;
pub mod systems;
pub mod upgrades;


// Re-export основных типов
pub use archetype::{spawn_enemy, ArchetypeKind, ArchetypeSpec, EnemyRoster};
pub use difficulty::{DifficultyChanged, DifficultySnapshot, DifficultyStamp};
pub use session::{enter_boss_arena, enter_open_map, ActiveScene, RunStats, SessionState};
pub use spawner::{DirectorTick, DirectorTuning, LiveAgentSet, SpawnDirector, SpawnPacing};
pub use systems::{pick_spawn_position, EnemySpawned};
pub use upgrades::UpgradeState;

/// Director Plugin
///
/// 1. run_spawn_director: эскалация и волны (SimSet::Spawning)
/// 2. tally_run_stats → end_run_on_defeat → save_on_portal → restart_run (SimSet::Cleanup)
pub struct DirectorPlugin;

impl Plugin for DirectorPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<DifficultyChanged>()
            .add_event::<EnemySpawned>()
            .add_event::<PortalEntered>()
            .add_event::<RunRestarted>()
            .add_event::<SceneTransition>()
            .init_resource::<DifficultySnapshot>()
            .init_resource::<EnemyRoster>()
            .init_resource::<SessionState>()
            .init_resource::<RunStats>()
            .init_resource::<crate::persistence::PersistenceGateway>();

        app.add_systems(FixedUpdate, systems::run_spawn_director.in_set(SimSet::Spawning));

        app.add_systems(
            FixedUpdate,
            (
                session::tally_run_stats,
                session::end_run_on_defeat,
                session::save_on_portal,
                session::restart_run,
            )
                .chain()
                .in_set(SimSet::Cleanup),
        );
    }
}
