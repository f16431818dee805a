//! Flyer system: тик FlyerBrain'ов, выстрелы → ProjectileLaunched.

use bevy::prelude::*;

use crate::ai::flyer::{FlyerBrain, FlyerContext, FlyerEvent};
use crate::combat::{CombatCue, CueKind, Dead, ProjectileLaunched};
use crate::components::{ArenaTarget, Pursuit, TargetMotion};
use crate::perception::PerceptionOracle;
use crate::DeterministicRng;

pub fn tick_flyers(
    mut flyers: Query<(Entity, &mut FlyerBrain, &mut Transform, Option<&Pursuit>), Without<ArenaTarget>>,
    targets: Query<(&Transform, Option<&TargetMotion>), (With<ArenaTarget>, Without<Dead>)>,
    perception: Res<PerceptionOracle>,
    mut rng: ResMut<DeterministicRng>,
    time: Res<Time<Fixed>>,
    mut launches: EventWriter<ProjectileLaunched>,
    mut cues: EventWriter<CombatCue>,
) {
    let delta = time.delta_secs();

    for (entity, mut brain, mut transform, pursuit) in flyers.iter_mut() {
        let target = pursuit
            .and_then(|pursuit| pursuit.target)
            .and_then(|target| targets.get(target).ok());
        let target_velocity = target
            .and_then(|(_, motion)| motion.map(|motion| motion.velocity))
            .unwrap_or(Vec3::ZERO);

        let events = {
            let mut ctx = FlyerContext {
                transform: &mut transform,
                target: target.map(|(transform, _)| transform.translation),
                target_velocity,
                perception: perception.perception(),
                rng: &mut rng.rng,
            };
            brain.tick(delta, &mut ctx)
        };

        for event in events {
            match event {
                FlyerEvent::RushStarted => {
                    crate::log(&format!("🛸 {:?} rushing target", entity));
                    cues.write(CombatCue::new(entity, CueKind::AttackStarted { attack: "Volley" }));
                }
                FlyerEvent::Taunt => {
                    cues.write(CombatCue::new(entity, CueKind::Taunt));
                }
                FlyerEvent::Shot {
                    origin,
                    direction,
                    speed,
                    damage,
                } => {
                    launches.write(ProjectileLaunched {
                        owner: entity,
                        origin,
                        direction,
                        speed,
                        damage,
                        blast: None,
                    });
                }
                FlyerEvent::VolleyFinished => {
                    crate::log(&format!("🛸 {:?} volley finished, back to circling", entity));
                }
                FlyerEvent::Stunned => {
                    cues.write(CombatCue::new(entity, CueKind::HitReaction { stunned: true }));
                }
            }
        }
    }
}
