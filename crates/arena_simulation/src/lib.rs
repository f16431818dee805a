//! Arena Simulation Core
//!
//! ECS-симуляция противников арены на Bevy 0.16 (headless).
//!
//! - Наземные агенты: FSM Patrol/PatrolIdle/Chase/Attack/HitReact/Dead
//! - Летающие агенты: круг → рывок → залп
//! - Босс: три фазы, четыре атаки, удержание в арене
//! - Director: эскалация сложности, волны, сохранение между уровнями
//!
//! Рендер, звук, ввод и загрузка сцен живут снаружи и общаются событиями.

use bevy::ecs::schedule::ExecutorKind;
use bevy::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

// Публичные модули
pub mod ai;
pub mod boss;
pub mod combat;
pub mod components;
pub mod config;
pub mod director;
pub mod logger;
pub mod navigation;
pub mod perception;
pub mod persistence;
pub mod scene;
pub mod sequencer;

// Re-export базовых типов для удобства
pub use ai::{AIPlugin, AgentState, AgentTuning, AttackBehavior, CombatAgent, FlyerBrain, FlyerTuning};
pub use boss::{spawn_boss, BossAttack, BossBrain, BossDefeated, BossPlugin, BossScaling, BossTuning};
pub use combat::{
    scale_damage, CombatCue, CombatPlugin, CueKind, DamageDealt, DamageIntent, Dead, DespawnAfter, EntityDied,
    HealIntent, HealthChanged, ProjectileLaunched,
};
pub use components::*;
pub use config::{ArenaConfig, ConfigError};
pub use director::{
    enter_boss_arena, enter_open_map, DifficultyChanged, DifficultySnapshot, DifficultyStamp, DirectorPlugin,
    DirectorTuning, EnemyRoster, RunStats, SessionState, SpawnDirector, UpgradeState,
};
pub use logger::*;
pub use navigation::{FlatDisk, FlatPlane, NavSurface, NavigationSurface};
pub use perception::{ObstructionMask, OccluderSet, OpenField, Perception, PerceptionOracle};
pub use persistence::{JsonFileStore, KeyValueStore, MemoryStore, PersistenceError, PersistenceGateway};
pub use scene::{PortalEntered, RunRestarted, SceneTransition};
pub use sequencer::{AttackSequencer, AttackTimeline};

/// Порядок фаз внутри одного FixedUpdate тика
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SimSet {
    /// DamageIntent → здоровье, реакции на урон/смерть
    Damage,
    /// Тики мозгов (агенты, flyer'ы, босс) и движение
    Brains,
    /// Director: эскалация и волны
    Spawning,
    /// Снаряды
    Effects,
    /// Despawn, статистика, переходы между сценами
    Cleanup,
}

/// Главный plugin симуляции (объединяет все подсистемы)
#[derive(Default)]
pub struct SimulationPlugin {
    pub config: ArenaConfig,
}

impl SimulationPlugin {
    pub fn new(config: ArenaConfig) -> Self {
        Self { config }
    }
}

impl Plugin for SimulationPlugin {
    fn build(&self, app: &mut App) {
        app
            // Fixed timestep (60Hz по умолчанию)
            .insert_resource(Time::<Fixed>::from_hz(self.config.tick_hz))
            // Детерминистичный RNG (seed из конфига)
            .insert_resource(DeterministicRng::new(self.config.seed))
            .insert_resource(self.config.roster.clone())
            .insert_resource(self.config.clone())
            .init_resource::<NavigationSurface>()
            .init_resource::<PerceptionOracle>()
            .configure_sets(
                FixedUpdate,
                (
                    SimSet::Damage,
                    SimSet::Brains,
                    SimSet::Spawning,
                    SimSet::Effects,
                    SimSet::Cleanup,
                )
                    .chain(),
            )
            // Подсистемы
            .add_plugins((CombatPlugin, AIPlugin, BossPlugin, DirectorPlugin));
    }
}

/// Детерминистичный RNG resource (seeded)
#[derive(Resource)]
pub struct DeterministicRng {
    pub rng: ChaCha8Rng,
    pub seed: u64,
}

impl DeterministicRng {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
        }
    }
}

/// Создаёт minimal Bevy App для headless симуляции.
///
/// Время не идёт само: тики прогоняются через `run_fixed_ticks`.
pub fn create_headless_app(seed: u64) -> App {
    let mut app = App::new();
    init_logger();
    app.insert_resource(DeterministicRng::new(seed))
        .insert_resource(Time::<Fixed>::from_hz(60.0)); // 60Hz FixedUpdate

    // Один поток: порядок систем не зависит от планировщика
    app.edit_schedule(FixedUpdate, |schedule| {
        schedule.set_executor_kind(ExecutorKind::SingleThreaded);
    });

    app
}

/// Прогнать `ticks` фиксированных шагов (Time<Fixed> сдвигается на timestep)
///
/// Перед каждым шагом крутится `First`: там `event_update_system` свапает
/// буферы событий, как в обычном `Main`. Событие живёт ровно до конца
/// следующего тика.
pub fn run_fixed_ticks(app: &mut App, ticks: usize) {
    for _ in 0..ticks {
        app.world_mut().run_schedule(First);
        let timestep = app.world().resource::<Time<Fixed>>().timestep();
        app.world_mut().resource_mut::<Time<Fixed>>().advance_by(timestep);
        app.world_mut().run_schedule(FixedUpdate);
    }
}

// ============================================================================
// Event log (история событий поверх двух тиков)
// ============================================================================

/// Журнал событий типа `E`, который пополняется в конце каждого тика
#[derive(Resource)]
pub struct EventLog<E: Event> {
    events: Vec<E>,
}

impl<E: Event> Default for EventLog<E> {
    fn default() -> Self {
        Self { events: Vec::new() }
    }
}

impl<E: Event> EventLog<E> {
    pub fn events(&self) -> &[E] {
        &self.events
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

fn append_to_event_log<E: Event + Clone>(mut reader: EventReader<E>, mut log: ResMut<EventLog<E>>) {
    log.events.extend(reader.read().cloned());
}

/// Включить журнал для `E`: система после `SimSet::Cleanup` дописывает всё,
/// что появилось за тик (каждое событие ровно один раз).
///
/// Журнал растёт без ограничений, поэтому включается только явно (тесты, отладка).
pub fn record_events<E: Event + Clone>(app: &mut App) {
    app.add_event::<E>()
        .init_resource::<EventLog<E>>()
        .add_systems(FixedUpdate, append_to_event_log::<E>.after(SimSet::Cleanup));
}

/// События типа `E`.
///
/// Если журнал включён через `record_events`, возвращается вся история.
/// Иначе только то, что ещё лежит в буферах: события двух последних тиков.
pub fn collect_events<E: Event + Clone>(world: &World) -> Vec<E> {
    if let Some(log) = world.get_resource::<EventLog<E>>() {
        return log.events().to_vec();
    }
    let Some(events) = world.get_resource::<Events<E>>() else {
        return Vec::new();
    };
    events.get_cursor().read(events).cloned().collect()
}

/// Snapshot мира для сравнения детерминизма
pub fn world_snapshot<T: Component>(world: &mut World) -> Vec<u8>
where
    T: std::fmt::Debug,
{
    let mut snapshot = Vec::new();

    let mut query = world.query::<(Entity, &T)>();
    let mut entities: Vec<_> = query.iter(world).collect();

    // Сортируем по Entity ID для детерминизма
    entities.sort_by_key(|(entity, _)| entity.index());

    // Сериализуем в байты через Debug (простейший способ)
    for (entity, component) in entities {
        snapshot.extend_from_slice(&entity.index().to_le_bytes());
        snapshot.extend_from_slice(format!("{:?}", component).as_bytes());
    }

    snapshot
}
