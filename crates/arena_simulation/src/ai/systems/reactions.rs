//! AI reaction systems (death, damage).

use bevy::prelude::*;

use crate::ai::{CombatAgent, FlyerBrain};
use crate::combat::{CombatCue, CueKind, DamageDealt, DespawnAfter, EntityDied};
use crate::components::NavMover;
use crate::DeterministicRng;

/// System: смерть → Dead state + отложенный despawn
///
/// Таймлайн атаки отменяется в том же тике, mover останавливается.
pub fn react_to_death(
    mut commands: Commands,
    mut death_events: EventReader<EntityDied>,
    mut agents: Query<(&mut CombatAgent, &mut NavMover)>,
    mut flyers: Query<&mut FlyerBrain>,
    mut cues: EventWriter<CombatCue>,
) {
    for event in death_events.read() {
        let destroy_delay = if let Ok((mut agent, mut mover)) = agents.get_mut(event.entity) {
            if !agent.trigger_death(&mut mover) {
                continue;
            }
            agent.tuning.destroy_delay
        } else if let Ok(mut flyer) = flyers.get_mut(event.entity) {
            if !flyer.trigger_death() {
                continue;
            }
            flyer.tuning.destroy_delay
        } else {
            continue;
        };

        crate::log(&format!("☠️ {:?} died → despawn in {:.1}s", event.entity, destroy_delay));
        cues.write(CombatCue::new(event.entity, CueKind::Died));
        commands.entity(event.entity).insert(DespawnAfter::new(destroy_delay));
    }
}

/// System: реакция на полученный (не смертельный) урон
///
/// Отклонённая реакция (атака, уже реагирует): не ошибка, просто пропуск.
pub fn react_to_damage(
    mut damage_events: EventReader<DamageDealt>,
    mut agents: Query<(&mut CombatAgent, &mut NavMover)>,
    mut flyers: Query<(&mut FlyerBrain, &Transform)>,
    mut rng: ResMut<DeterministicRng>,
    mut cues: EventWriter<CombatCue>,
) {
    for event in damage_events.read() {
        if event.target_died {
            continue;
        }

        if let Ok((mut agent, mut mover)) = agents.get_mut(event.target) {
            if agent.trigger_hit_reaction(&mut rng.rng, &mut mover) {
                cues.write(CombatCue::new(
                    event.target,
                    CueKind::HitReaction {
                        stunned: agent.is_stunned(),
                    },
                ));
            }
        } else if let Ok((mut flyer, transform)) = flyers.get_mut(event.target) {
            // cue пишет tick_flyers (FlyerEvent::Stunned)
            flyer.trigger_hit_reaction(transform);
        }
    }
}
