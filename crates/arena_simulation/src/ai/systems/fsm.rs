//! FSM system: тик CombatAgent'ов и перевод AgentEvent в события.

use bevy::prelude::*;

use crate::ai::{AgentContext, AgentEvent, AttackCue, CombatAgent};
use crate::combat::{CombatCue, CueKind, DamageIntent, Dead};
use crate::components::{ArenaTarget, NavMover, Pursuit};
use crate::navigation::NavigationSurface;
use crate::perception::PerceptionOracle;
use crate::DeterministicRng;

/// System: один тик FSM для каждого живого агента
///
/// Цель берётся из `Pursuit`; нет цели (или она мертва) → агент заморожен.
pub fn tick_combat_agents(
    mut agents: Query<(Entity, &mut CombatAgent, &mut NavMover, &mut Transform, Option<&Pursuit>), Without<ArenaTarget>>,
    targets: Query<&Transform, (With<ArenaTarget>, Without<Dead>)>,
    perception: Res<PerceptionOracle>,
    surface: Res<NavigationSurface>,
    mut rng: ResMut<DeterministicRng>,
    time: Res<Time<Fixed>>,
    mut damage_events: EventWriter<DamageIntent>,
    mut cues: EventWriter<CombatCue>,
) {
    let delta = time.delta_secs();

    for (entity, mut agent, mut mover, mut transform, pursuit) in agents.iter_mut() {
        let target_entity = pursuit.and_then(|pursuit| pursuit.target);
        let target = target_entity.and_then(|target| targets.get(target).ok().map(|t| t.translation));

        let events = {
            let mut ctx = AgentContext {
                transform: &mut transform,
                mover: &mut mover,
                target,
                perception: perception.perception(),
                surface: surface.surface(),
                rng: &mut rng.rng,
            };
            agent.tick(delta, &mut ctx)
        };

        for event in events {
            match event {
                AgentEvent::StateChanged { from, to } => {
                    crate::log(&format!("🧠 {:?} FSM: {:?} → {:?}", entity, from, to));
                    cues.write(CombatCue::new(entity, CueKind::StateChanged { from, to }));
                }
                AgentEvent::AttackStarted => {
                    cues.write(CombatCue::new(
                        entity,
                        CueKind::AttackStarted {
                            attack: agent.attack.name(),
                        },
                    ));
                }
                AgentEvent::Cue(AttackCue::Telegraph) => {
                    if let Some((radius, duration)) = agent.attack.telegraph() {
                        cues.write(CombatCue::new(
                            entity,
                            CueKind::Telegraph {
                                center: transform.translation,
                                radius,
                                duration,
                            },
                        ));
                    }
                }
                AgentEvent::Cue(cue) => {
                    cues.write(CombatCue::new(entity, CueKind::AttackStep(cue)));
                }
                AgentEvent::Strike { damage } => {
                    if let Some(target) = target_entity {
                        crate::log(&format!("⚔️ {:?} strikes {:?} for {}", entity, target, damage));
                        damage_events.write(DamageIntent::new(Some(entity), target, damage));
                    }
                }
                AgentEvent::AttackFinished => {}
            }
        }
    }
}
