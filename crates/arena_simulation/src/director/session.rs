//! Сессии и переходы между уровнями.
//!
//! Хранилище трогается только здесь: bootstrap уровня (enter_*),
//! портал к боссу, конец забега и полный рестарт.

use bevy::prelude::*;

use crate::boss::{spawn_boss, BossBrain, BossDefeated, BossScaling, BossTuning};
use crate::combat::{DamageDealt, EntityDied};
use crate::components::{ArenaTarget, EnemyTag, Health};
use crate::config::ArenaConfig;
use crate::director::difficulty::DifficultySnapshot;
use crate::director::spawner::{DirectorTuning, SpawnDirector};
use crate::director::upgrades::UpgradeState;
use crate::persistence::{KeyValueStore, PersistenceGateway};
use crate::scene::{PortalEntered, RunRestarted, SceneTransition, BOSS_ARENA_SCENE, GAME_OVER_SCENE, OPEN_MAP_SCENE};

pub const RUN_TIME_KEY: &str = "runTime";
pub const TOTAL_DAMAGE_KEY: &str = "playerTotalDmg";
pub const KILLED_ENEMIES_KEY: &str = "killedEnemies";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ActiveScene {
    #[default]
    Menu,
    OpenMap,
    BossArena,
    GameOver,
}

/// Resource: какая сцена активна и против кого играем
#[derive(Resource, Debug, Clone, Default)]
pub struct SessionState {
    pub scene: ActiveScene,
    pub target: Option<Entity>,
    portal_used: bool,
}

impl SessionState {
    pub fn portal_used(&self) -> bool {
        self.portal_used
    }

    fn in_play(&self) -> bool {
        matches!(self.scene, ActiveScene::OpenMap | ActiveScene::BossArena)
    }
}

/// Статистика забега (показывается на экране game over)
#[derive(Resource, Debug, Clone, Copy, Default, PartialEq)]
pub struct RunStats {
    pub run_time: f32,
    pub enemies_killed: u32,
    pub damage_dealt: u32,
}

impl RunStats {
    pub fn load(store: &dyn KeyValueStore) -> Self {
        Self {
            run_time: store.get_float(RUN_TIME_KEY, 0.0),
            enemies_killed: store.get_int(KILLED_ENEMIES_KEY, 0).max(0) as u32,
            damage_dealt: store.get_int(TOTAL_DAMAGE_KEY, 0).max(0) as u32,
        }
    }

    pub fn write(&self, store: &mut dyn KeyValueStore) {
        store.set_float(RUN_TIME_KEY, self.run_time);
        store.set_int(KILLED_ENEMIES_KEY, self.enemies_killed.min(i32::MAX as u32) as i32);
        store.set_int(TOTAL_DAMAGE_KEY, self.damage_dealt.min(i32::MAX as u32) as i32);
    }
}

// ============================================================================
// Bootstrap уровней
// ============================================================================

fn load_persisted(world: &mut World) -> (Option<DifficultySnapshot>, UpgradeState) {
    world.init_resource::<PersistenceGateway>();
    let gateway = world.resource::<PersistenceGateway>();
    (DifficultySnapshot::load(gateway.store()), UpgradeState::load(gateway.store()))
}

fn apply_upgrades(world: &mut World, target: Entity, upgrades: &UpgradeState) {
    if let Some(mut health) = world.get_mut::<Health>(target) {
        health.set_max(upgrades.target_max_health());
    }
}

/// Открытая карта: director (восстановленный или свежий) + snapshot resource
pub fn enter_open_map(world: &mut World, target: Entity) -> DifficultySnapshot {
    let (restored, upgrades) = load_persisted(world);
    let tuning: DirectorTuning = world
        .get_resource::<ArenaConfig>()
        .map(|config| config.director.clone())
        .unwrap_or_default();

    let director = match restored {
        Some(snapshot) => SpawnDirector::restore(tuning, snapshot, Some(target)),
        None => SpawnDirector::new(tuning, Some(target)),
    };
    let snapshot = director.snapshot();

    apply_upgrades(world, target, &upgrades);
    world.insert_resource(snapshot);
    world.insert_resource(director);
    world.insert_resource(upgrades);
    world.init_resource::<RunStats>();
    world.insert_resource(SessionState {
        scene: ActiveScene::OpenMap,
        target: Some(target),
        portal_used: false,
    });

    crate::log_info(&format!("🗺️ Entered {} at difficulty level {}", OPEN_MAP_SCENE, snapshot.level));
    snapshot
}

/// Арена босса: snapshot из хранилища, босс масштабируется один раз при спавне
pub fn enter_boss_arena(world: &mut World, target: Entity, center: Vec3) -> Entity {
    let (restored, upgrades) = load_persisted(world);
    let snapshot = restored.unwrap_or_default();
    let (tuning, scaling): (BossTuning, BossScaling) = world
        .get_resource::<ArenaConfig>()
        .map(|config| (config.boss.clone(), config.boss_scaling.clone()))
        .unwrap_or_default();

    // На арене волн нет
    world.remove_resource::<SpawnDirector>();

    let mut brain = BossBrain::new(tuning, center);
    scaling.apply(&mut brain, snapshot.level);

    apply_upgrades(world, target, &upgrades);
    world.insert_resource(snapshot);
    world.insert_resource(upgrades);
    world.init_resource::<RunStats>();
    world.insert_resource(SessionState {
        scene: ActiveScene::BossArena,
        target: Some(target),
        portal_used: false,
    });

    crate::log_info(&format!("🗺️ Entered {} at difficulty level {}", BOSS_ARENA_SCENE, snapshot.level));
    spawn_boss(world, brain, center, target)
}

// ============================================================================
// Systems
// ============================================================================

/// System: портал к боссу (срабатывает один раз за сцену)
pub fn save_on_portal(
    mut portals: EventReader<PortalEntered>,
    mut session: ResMut<SessionState>,
    snapshot: Res<DifficultySnapshot>,
    director: Option<Res<SpawnDirector>>,
    mut gateway: ResMut<PersistenceGateway>,
    mut scenes: EventWriter<SceneTransition>,
) {
    if portals.read().count() == 0 {
        return;
    }
    if session.portal_used || session.scene != ActiveScene::OpenMap {
        return;
    }
    session.portal_used = true;

    let time_in_game = director.map(|director| director.elapsed()).unwrap_or(0.0);
    snapshot.write(gateway.store_mut(), time_in_game);
    gateway.flush();

    crate::log_info(&format!("🌀 Portal entered: difficulty level {} saved", snapshot.level));
    scenes.write(SceneTransition::to(BOSS_ARENA_SCENE));
}

/// System: полный рестарт (сложность и бонусы забега стираются)
pub fn restart_run(
    mut restarts: EventReader<RunRestarted>,
    mut commands: Commands,
    mut gateway: ResMut<PersistenceGateway>,
    upgrades: Option<ResMut<UpgradeState>>,
    mut scenes: EventWriter<SceneTransition>,
) {
    if restarts.read().count() == 0 {
        return;
    }

    DifficultySnapshot::clear(gateway.store_mut());
    UpgradeState::reset_run_bonuses(gateway.store_mut());
    gateway.flush();

    if let Some(mut upgrades) = upgrades {
        let permanent = upgrades.without_run_bonuses();
        *upgrades = permanent;
    }
    commands.insert_resource(DifficultySnapshot::BASELINE);
    commands.insert_resource(RunStats::default());
    commands.insert_resource(SessionState::default());
    commands.remove_resource::<SpawnDirector>();

    crate::log_info("🔄 Run restarted: difficulty cleared");
    scenes.write(SceneTransition::to(OPEN_MAP_SCENE));
}

/// System: время забега, урон цели по врагам, убийства
///
/// Урон берётся из DamageDealt: только реально снятое здоровье, удары по
/// мёртвым не считаются. Босс к этому моменту уже может быть despawn'нут,
/// поэтому фильтр по атакующему, а не по EnemyTag.
pub fn tally_run_stats(
    mut stats: ResMut<RunStats>,
    session: Res<SessionState>,
    time: Res<Time<Fixed>>,
    mut dealt: EventReader<DamageDealt>,
    mut deaths: EventReader<EntityDied>,
    mut defeats: EventReader<BossDefeated>,
    enemies: Query<(), With<EnemyTag>>,
) {
    if !session.in_play() {
        dealt.clear();
        deaths.clear();
        defeats.clear();
        return;
    }

    stats.run_time += time.delta_secs();

    for event in dealt.read() {
        if event.attacker.is_some() && event.attacker == session.target && Some(event.target) != session.target {
            stats.damage_dealt += event.damage;
        }
    }

    let kills = deaths.read().filter(|death| enemies.contains(death.entity)).count() as u32;
    stats.enemies_killed += kills + defeats.read().count() as u32;
}

/// System: конец забега (смерть цели или босса) → статистика в хранилище
pub fn end_run_on_defeat(
    mut deaths: EventReader<EntityDied>,
    mut defeats: EventReader<BossDefeated>,
    targets: Query<(), With<ArenaTarget>>,
    mut session: ResMut<SessionState>,
    stats: Res<RunStats>,
    mut gateway: ResMut<PersistenceGateway>,
    mut scenes: EventWriter<SceneTransition>,
) {
    let target_died = deaths.read().filter(|death| targets.contains(death.entity)).count() > 0;
    let boss_defeated = defeats.read().count() > 0;
    if !target_died && !boss_defeated {
        return;
    }
    if !session.in_play() {
        return;
    }
    session.scene = ActiveScene::GameOver;

    stats.write(gateway.store_mut());
    gateway.flush();

    crate::log_info(&format!(
        "💀 Run over: {:.1}s, {} kills, {} damage dealt",
        stats.run_time, stats.enemies_killed, stats.damage_dealt
    ));

    // Смерть босса уже запросила game over
    if target_died {
        scenes.write(SceneTransition::to(GAME_OVER_SCENE));
    }
}
