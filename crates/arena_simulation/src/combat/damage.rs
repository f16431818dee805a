//! Damage sink, смерть и отложенный despawn.

use bevy::prelude::*;

use crate::components::{Health, Knockback, Pursuit};

/// Запрос на урон (атаки агентов, снаряды, внешний input игрока)
#[derive(Event, Debug, Clone, PartialEq)]
pub struct DamageIntent {
    pub attacker: Option<Entity>,
    pub target: Entity,
    pub amount: u32,
    /// Импульс отбрасывания (ZERO: без отброса)
    pub knockback: Vec3,
}

impl DamageIntent {
    pub fn new(attacker: Option<Entity>, target: Entity, amount: u32) -> Self {
        Self {
            attacker,
            target,
            amount,
            knockback: Vec3::ZERO,
        }
    }

    pub fn with_knockback(mut self, knockback: Vec3) -> Self {
        self.knockback = knockback;
        self
    }
}

/// Урон применён к Health (или к здоровью босса)
#[derive(Event, Debug, Clone, PartialEq)]
pub struct DamageDealt {
    pub attacker: Option<Entity>,
    pub target: Entity,
    /// Реально снятое здоровье: не больше, чем оставалось до удара
    pub damage: u32,
    pub remaining: u32,
    pub target_died: bool,
}

/// Лечение (аптечки и прочее снаружи симуляции)
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct HealIntent {
    pub target: Entity,
    pub amount: u32,
}

/// Здоровье изменилось (урон или лечение), для health bar'ов снаружи
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct HealthChanged {
    pub entity: Entity,
    pub current: u32,
    pub max: u32,
}

#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntityDied {
    pub entity: Entity,
    pub killer: Option<Entity>,
}

/// Компонент-маркер: entity мертв (Health == 0)
#[derive(Component, Debug, Clone, Copy)]
pub struct Dead;

/// Деспавн через `remaining` секунд симуляции
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct DespawnAfter {
    pub remaining: f32,
}

impl DespawnAfter {
    pub fn new(seconds: f32) -> Self {
        Self { remaining: seconds }
    }
}

/// Урон × множитель, округление half-to-even
pub fn scale_damage(base: u32, multiplier: f32) -> u32 {
    (base as f32 * multiplier).round_ties_even().max(0.0) as u32
}

/// Система: DamageIntent → Health (+ knockback), DamageDealt / EntityDied
pub fn apply_damage(
    mut intents: EventReader<DamageIntent>,
    mut targets: Query<(&mut Health, Option<&mut Knockback>), Without<Dead>>,
    mut dealt_events: EventWriter<DamageDealt>,
    mut health_events: EventWriter<HealthChanged>,
    mut died_events: EventWriter<EntityDied>,
) {
    for intent in intents.read() {
        let Ok((mut health, knockback)) = targets.get_mut(intent.target) else {
            continue;
        };
        // Два удара в одном тике: второй по уже мёртвому не проходит
        if !health.is_alive() {
            continue;
        }

        if let Some(mut knockback) = knockback {
            if intent.knockback != Vec3::ZERO {
                knockback.push(intent.knockback);
            }
        }

        if intent.amount == 0 {
            continue;
        }

        let before = health.current;
        health.take_damage(intent.amount);
        let target_died = !health.is_alive();

        dealt_events.write(DamageDealt {
            attacker: intent.attacker,
            target: intent.target,
            damage: before - health.current,
            remaining: health.current,
            target_died,
        });
        health_events.write(HealthChanged {
            entity: intent.target,
            current: health.current,
            max: health.max,
        });

        if target_died {
            died_events.write(EntityDied {
                entity: intent.target,
                killer: intent.attacker,
            });
            crate::log(&format!("💀 Entity {:?} died (killer: {:?})", intent.target, intent.attacker));
        }
    }
}

/// Система: HealIntent → Health (мёртвых не лечим)
pub fn apply_healing(
    mut intents: EventReader<HealIntent>,
    mut targets: Query<&mut Health, Without<Dead>>,
    mut health_events: EventWriter<HealthChanged>,
) {
    for intent in intents.read() {
        let Ok(mut health) = targets.get_mut(intent.target) else {
            continue;
        };
        if !health.is_alive() || intent.amount == 0 {
            continue;
        }

        let before = health.current;
        health.heal(intent.amount);
        if health.current != before {
            health_events.write(HealthChanged {
                entity: intent.target,
                current: health.current,
                max: health.max,
            });
        }
    }
}

/// Система: у мёртвых снимаем преследование и ставим маркер Dead
pub fn disable_ai_on_death(mut commands: Commands, mut death_events: EventReader<EntityDied>) {
    for event in death_events.read() {
        if let Ok(mut entity_commands) = commands.get_entity(event.entity) {
            entity_commands.remove::<Pursuit>();
            entity_commands.insert(Dead);
        }
    }
}

/// Система: деспавн entities с истёкшим DespawnAfter
pub fn despawn_after_timeout(
    mut commands: Commands,
    mut query: Query<(Entity, &mut DespawnAfter)>,
    time: Res<Time<Fixed>>,
) {
    let delta = time.delta_secs();

    for (entity, mut despawn_after) in query.iter_mut() {
        despawn_after.remaining -= delta;
        if despawn_after.remaining <= 0.0 {
            crate::log(&format!("⚰️ Despawning entity {:?} (timeout)", entity));
            commands.entity(entity).despawn();
        }
    }
}
