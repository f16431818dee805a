//! Enemy archetypes: что director умеет спавнить, и сама сборка entity.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::ai::{AgentTuning, AttackBehavior, CombatAgent, FlyerBrain, FlyerTuning};
use crate::components::{EnemyTag, Health, Knockback, NavMover, Pursuit};
use crate::director::difficulty::{scaled_max_health, DifficultySnapshot, DifficultyStamp};

/// Наземный (FSM + NavMover) или летающий враг
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ArchetypeKind {
    Walker { attack: AttackBehavior, tuning: AgentTuning },
    Flyer { tuning: FlyerTuning },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArchetypeSpec {
    pub name: String,
    /// Базовое здоровье до scaling'а
    pub max_health: u32,
    pub kind: ArchetypeKind,
}

impl ArchetypeSpec {
    /// Базовый наземный враг: короткий замах без оружия
    pub fn brawler() -> Self {
        Self {
            name: "Brawler".to_string(),
            max_health: 100,
            kind: ArchetypeKind::Walker {
                attack: AttackBehavior::melee_swing(),
                tuning: AgentTuning::default(),
            },
        }
    }

    pub fn weapon_slasher() -> Self {
        Self {
            name: "WeaponSlash".to_string(),
            max_health: 100,
            kind: ArchetypeKind::Walker {
                attack: AttackBehavior::weapon_slash(),
                tuning: AgentTuning::default(),
            },
        }
    }

    pub fn ground_pounder() -> Self {
        Self {
            name: "GroundPound".to_string(),
            max_health: 100,
            kind: ArchetypeKind::Walker {
                attack: AttackBehavior::ground_slam(),
                tuning: AgentTuning {
                    attack_range: 3.0,
                    attack_cooldown: 3.0,
                    ..AgentTuning::default()
                },
            },
        }
    }

    pub fn flyer() -> Self {
        Self {
            name: "Flying".to_string(),
            max_health: 100,
            kind: ArchetypeKind::Flyer {
                tuning: FlyerTuning::default(),
            },
        }
    }

    pub fn is_flying(&self) -> bool {
        matches!(self.kind, ArchetypeKind::Flyer { .. })
    }
}

/// Resource: из чего выбирает director (равновероятно)
#[derive(Resource, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnemyRoster {
    pub archetypes: Vec<ArchetypeSpec>,
}

impl Default for EnemyRoster {
    fn default() -> Self {
        Self {
            archetypes: vec![
                ArchetypeSpec::brawler(),
                ArchetypeSpec::weapon_slasher(),
                ArchetypeSpec::ground_pounder(),
                ArchetypeSpec::flyer(),
            ],
        }
    }
}

impl EnemyRoster {
    pub fn empty() -> Self {
        Self { archetypes: Vec::new() }
    }

    pub fn is_empty(&self) -> bool {
        self.archetypes.is_empty()
    }
}

/// Собрать врага со scaling'ом текущего snapshot'а (только здесь, при создании)
pub fn spawn_enemy(
    commands: &mut Commands,
    spec: &ArchetypeSpec,
    position: Vec3,
    snapshot: DifficultySnapshot,
    target: Entity,
) -> Entity {
    let health = Health::new(scaled_max_health(spec.max_health, snapshot.health_multiplier));

    let mut entity = commands.spawn((
        Transform::from_translation(position),
        health,
        Knockback::default(),
        EnemyTag {
            archetype: spec.name.clone(),
        },
        Pursuit::new(target),
        DifficultyStamp(snapshot),
    ));

    match &spec.kind {
        ArchetypeKind::Walker { attack, tuning } => {
            let mover = NavMover::new(tuning.patrol_speed, tuning.patrol_acceleration);
            let agent = CombatAgent::new(tuning.clone(), attack.clone(), position)
                .with_damage_multiplier(snapshot.damage_multiplier);
            entity.insert((agent, mover));
        }
        ArchetypeKind::Flyer { tuning } => {
            let mut brain = FlyerBrain::new(tuning.clone(), position);
            brain.damage_multiplier = snapshot.damage_multiplier;
            entity.insert(brain);
        }
    }

    entity.id()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spawn_into_world(spec: &ArchetypeSpec, snapshot: DifficultySnapshot) -> (World, Entity) {
        let mut world = World::new();
        let target = world.spawn_empty().id();
        let enemy = spawn_enemy(&mut world.commands(), spec, Vec3::new(4.0, 0.0, 0.0), snapshot, target);
        world.flush();
        (world, enemy)
    }

    #[test]
    fn test_default_roster_covers_every_walker_attack() {
        let attacks: Vec<&str> = EnemyRoster::default()
            .archetypes
            .iter()
            .filter_map(|spec| match &spec.kind {
                ArchetypeKind::Walker { attack, .. } => Some(attack.name()),
                ArchetypeKind::Flyer { .. } => None,
            })
            .collect();
        assert_eq!(attacks, vec!["melee_swing", "weapon_slash", "ground_slam"]);
    }

    #[test]
    fn test_brawler_spawns_with_melee_swing() {
        let snapshot = DifficultySnapshot {
            level: 3.0,
            health_multiplier: 1.3,
            damage_multiplier: 1.2,
        };
        let (world, enemy) = spawn_into_world(&ArchetypeSpec::brawler(), snapshot);

        let agent = world.get::<CombatAgent>(enemy).unwrap();
        assert!(matches!(agent.attack, AttackBehavior::MeleeSwing { .. }));
        assert_eq!(agent.damage_multiplier, 1.2);
        assert_eq!(world.get::<Health>(enemy).unwrap().max, 130);
        assert_eq!(world.get::<EnemyTag>(enemy).unwrap().archetype, "Brawler");
        assert!(world.get::<NavMover>(enemy).is_some());
    }

    #[test]
    fn test_flyer_spawns_without_ground_mover() {
        let (world, enemy) = spawn_into_world(&ArchetypeSpec::flyer(), DifficultySnapshot::default());

        assert!(world.get::<FlyerBrain>(enemy).is_some());
        assert!(world.get::<CombatAgent>(enemy).is_none());
        assert!(world.get::<NavMover>(enemy).is_none());
        assert_eq!(world.get::<Health>(enemy).unwrap().max, 100);
    }
}
