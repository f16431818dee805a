//! Boss systems: урон по боссу, тик мозга, перевод BossEvent в события мира.

use bevy::ecs::system::SystemParam;
use bevy::prelude::*;

use crate::boss::{BossBrain, BossContext, BossEvent};
use crate::combat::{CombatCue, CueKind, DamageDealt, DamageIntent, Dead, ProjectileLaunched};
use crate::components::{ArenaTarget, Pursuit};
use crate::scene::{SceneTransition, GAME_OVER_SCENE};
use crate::DeterministicRng;

#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct BossHealthChanged {
    pub boss: Entity,
    pub current: f32,
    pub max: f32,
}

#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct BossPhaseChanged {
    pub boss: Entity,
    pub phase: u8,
}

/// Цель вошла/вышла из арены босса
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct BossAreaStatusChanged {
    pub boss: Entity,
    pub inside: bool,
}

#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct BossDefeated {
    pub boss: Entity,
    pub killer: Option<Entity>,
}

/// Все наружные каналы босса (кроме DamageIntent: его читает apply_boss_damage)
#[derive(SystemParam)]
pub struct BossOutbox<'w, 's> {
    commands: Commands<'w, 's>,
    cues: EventWriter<'w, CombatCue>,
    launches: EventWriter<'w, ProjectileLaunched>,
    health: EventWriter<'w, BossHealthChanged>,
    phases: EventWriter<'w, BossPhaseChanged>,
    area: EventWriter<'w, BossAreaStatusChanged>,
    defeated: EventWriter<'w, BossDefeated>,
    scenes: EventWriter<'w, SceneTransition>,
}

impl BossOutbox<'_, '_> {
    /// Разослать события; удары по цели возвращаются вызывающему
    fn dispatch(&mut self, boss: Entity, killer: Option<Entity>, events: Vec<BossEvent>) -> Vec<(u32, Vec3)> {
        let mut strikes = Vec::new();

        for event in events {
            match event {
                BossEvent::AreaStatusChanged { inside } => {
                    crate::log(&format!("🐸 Target {} boss area", if inside { "entered" } else { "left" }));
                    self.area.write(BossAreaStatusChanged { boss, inside });
                }
                BossEvent::AttackStarted(attack) => {
                    self.cues.write(CombatCue::new(boss, CueKind::AttackStarted { attack: attack.name() }));
                }
                BossEvent::Cue(cue) => {
                    self.cues.write(CombatCue::new(boss, CueKind::BossStep(cue)));
                }
                BossEvent::Telegraph { center, radius, duration } => {
                    self.cues.write(CombatCue::new(
                        boss,
                        CueKind::Telegraph {
                            center,
                            radius,
                            duration,
                        },
                    ));
                }
                BossEvent::Fire {
                    origin,
                    direction,
                    speed,
                    damage,
                    blast,
                } => {
                    self.launches.write(ProjectileLaunched {
                        owner: boss,
                        origin,
                        direction,
                        speed,
                        damage,
                        blast,
                    });
                }
                BossEvent::Strike { damage, knockback } => strikes.push((damage, knockback)),
                BossEvent::AttackFinished(_) => {}
                BossEvent::HealthChanged { current, max } => {
                    self.health.write(BossHealthChanged { boss, current, max });
                }
                BossEvent::PhaseChanged { phase } => {
                    self.phases.write(BossPhaseChanged { boss, phase });
                }
                BossEvent::Died => {
                    crate::log_info(&format!("🏆 Boss {:?} defeated → {}", boss, GAME_OVER_SCENE));
                    self.cues.write(CombatCue::new(boss, CueKind::Died));
                    self.defeated.write(BossDefeated { boss, killer });
                    self.scenes.write(SceneTransition::to(GAME_OVER_SCENE));
                    // Без задержки, в отличие от обычных врагов
                    self.commands.entity(boss).despawn();
                }
            }
        }

        strikes
    }
}

/// System: DamageIntent по боссу → BossBrain::take_damage
///
/// Снятое здоровье уходит в общий DamageDealt (статистика забега).
pub fn apply_boss_damage(
    mut intents: EventReader<DamageIntent>,
    mut bosses: Query<&mut BossBrain>,
    mut dealt_events: EventWriter<DamageDealt>,
    mut outbox: BossOutbox,
) {
    for intent in intents.read() {
        let Ok(mut brain) = bosses.get_mut(intent.target) else {
            continue;
        };
        let before = brain.current_health();
        if !brain.take_damage(intent.amount as f32) {
            continue;
        }
        let after = brain.current_health();
        dealt_events.write(DamageDealt {
            attacker: intent.attacker,
            target: intent.target,
            damage: (before - after).round() as u32,
            remaining: after.ceil() as u32,
            target_died: brain.is_dead(),
        });
        let events = brain.drain_events();
        outbox.dispatch(intent.target, intent.attacker, events);
    }
}

/// System: тик босса (цель из Pursuit)
pub fn tick_boss(
    mut bosses: Query<(Entity, &mut BossBrain, &mut Transform, Option<&Pursuit>), Without<ArenaTarget>>,
    targets: Query<&Transform, (With<ArenaTarget>, Without<Dead>)>,
    mut rng: ResMut<DeterministicRng>,
    time: Res<Time<Fixed>>,
    mut damage_events: EventWriter<DamageIntent>,
    mut outbox: BossOutbox,
) {
    let delta = time.delta_secs();

    for (entity, mut brain, mut transform, pursuit) in bosses.iter_mut() {
        let target_entity = pursuit.and_then(|pursuit| pursuit.target);
        let target = target_entity.and_then(|target| targets.get(target).ok().map(|t| t.translation));

        let events = {
            let mut ctx = BossContext {
                transform: &mut transform,
                target,
                rng: &mut rng.rng,
            };
            brain.tick(delta, &mut ctx)
        };

        let strikes = outbox.dispatch(entity, None, events);
        let Some(target) = target_entity else {
            continue;
        };
        for (damage, knockback) in strikes {
            damage_events.write(DamageIntent::new(Some(entity), target, damage).with_knockback(knockback));
        }
    }
}
