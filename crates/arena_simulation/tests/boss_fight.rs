//! Boss fight integration test
//!
//! Босс на арене, цель бьёт его снаружи арены (босс не отвечает):
//! фазы 1 → 2 → 3, смерть, конец забега.

use arena_simulation::boss::{BossAreaStatusChanged, BossHealthChanged, BossPhaseChanged};
use arena_simulation::director::ActiveScene;
use arena_simulation::*;
use bevy::prelude::*;

fn setup_boss_arena(store: MemoryStore, target_position: Vec3) -> (App, Entity, Entity) {
    let mut app = create_headless_app(42);
    app.add_plugins(SimulationPlugin::default());
    app.insert_resource(PersistenceGateway::new(store));
    record_events::<BossPhaseChanged>(&mut app);
    record_events::<BossHealthChanged>(&mut app);
    record_events::<BossAreaStatusChanged>(&mut app);
    record_events::<BossDefeated>(&mut app);
    record_events::<SceneTransition>(&mut app);

    let target = app
        .world_mut()
        .spawn((
            Transform::from_translation(target_position),
            ArenaTarget,
            TargetMotion::default(),
            Health::new(100),
            Knockback::default(),
        ))
        .id();
    let boss = enter_boss_arena(app.world_mut(), target, Vec3::ZERO);
    (app, target, boss)
}

fn hit_boss(app: &mut App, target: Entity, boss: Entity, amount: u32) {
    app.world_mut().send_event(DamageIntent::new(Some(target), boss, amount));
    run_fixed_ticks(app, 1);
}

#[test]
fn test_boss_phases_and_defeat() {
    let (mut app, target, boss) = setup_boss_arena(MemoryStore::new(), Vec3::new(100.0, 0.0, 0.0));

    hit_boss(&mut app, target, boss, 400);
    assert_eq!(app.world().get::<BossBrain>(boss).unwrap().phase(), 2);

    hit_boss(&mut app, target, boss, 300);
    assert_eq!(app.world().get::<BossBrain>(boss).unwrap().phase(), 3);

    hit_boss(&mut app, target, boss, 300);

    // Босс деспавнится сразу, без задержки
    assert!(!app.world().entities().contains(boss));

    let phases: Vec<u8> = collect_events::<BossPhaseChanged>(app.world())
        .into_iter()
        .map(|event| event.phase)
        .collect();
    assert_eq!(phases, vec![2, 3]);

    let health: Vec<f32> = collect_events::<BossHealthChanged>(app.world())
        .into_iter()
        .map(|event| event.current)
        .collect();
    assert_eq!(health, vec![600.0, 300.0, 0.0]);

    let defeats = collect_events::<BossDefeated>(app.world());
    assert_eq!(defeats.len(), 1);
    assert_eq!(defeats[0].killer, Some(target));

    let scenes: Vec<String> = collect_events::<SceneTransition>(app.world())
        .into_iter()
        .map(|transition| transition.scene)
        .collect();
    assert_eq!(scenes, vec![arena_simulation::scene::GAME_OVER_SCENE.to_string()]);

    assert_eq!(app.world().resource::<SessionState>().scene, ActiveScene::GameOver);
    let stats = *app.world().resource::<RunStats>();
    assert_eq!(stats.enemies_killed, 1);
    assert_eq!(stats.damage_dealt, 1000);
}

#[test]
fn test_boss_ignores_target_outside_arena() {
    let (mut app, target, boss) = setup_boss_arena(MemoryStore::new(), Vec3::new(100.0, 0.0, 0.0));

    run_fixed_ticks(&mut app, 300);

    let brain = app.world().get::<BossBrain>(boss).unwrap();
    assert!(!brain.target_in_area());
    assert_eq!(brain.attacks_started(), 0);
    assert_eq!(app.world().get::<Health>(target).unwrap().current, 100);
    assert_eq!(app.world().get::<Transform>(boss).unwrap().translation, Vec3::ZERO);
}

#[test]
fn test_boss_engages_target_inside_arena() {
    let (mut app, target, boss) = setup_boss_arena(MemoryStore::new(), Vec3::new(0.0, 0.0, -10.0));
    // Цель переживает любые удары за 5 секунд
    app.world_mut().get_mut::<Health>(target).unwrap().set_max(100_000);

    run_fixed_ticks(&mut app, 300);

    let brain = app.world().get::<BossBrain>(boss).unwrap();
    assert!(brain.target_in_area());
    assert!(brain.attacks_started() >= 1);

    let area = collect_events::<BossAreaStatusChanged>(app.world());
    assert_eq!(area.first().map(|event| event.inside), Some(true));

    // Босс не покидает круг арены
    let position = app.world().get::<Transform>(boss).unwrap().translation;
    assert!(planar_distance(position, Vec3::ZERO) <= BossTuning::default().arena_radius + 1e-3);
}

#[test]
fn test_scaled_boss_survives_unscaled_lethal_damage() {
    let mut store = MemoryStore::new();
    DifficultySnapshot {
        level: 5.0,
        health_multiplier: 1.6,
        damage_multiplier: 1.4,
    }
    .write(&mut store, 240.0);

    let (mut app, target, boss) = setup_boss_arena(store, Vec3::new(100.0, 0.0, 0.0));
    hit_boss(&mut app, target, boss, 1000);

    let brain = app.world().get::<BossBrain>(boss).unwrap();
    assert!(!brain.is_dead());
    assert!((brain.current_health() - 800.0).abs() < 1e-2);
    assert!(collect_events::<BossDefeated>(app.world()).is_empty());
}
