//! Масштабирование босса по сохранённому уровню сложности (один раз при спавне).

use serde::{Deserialize, Serialize};

use crate::boss::BossBrain;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BossScaling {
    pub health_per_level: f32,
    pub damage_per_level: f32,
    pub speed_per_level: f32,
    pub cooldown_reduction_per_level: f32,
    /// Нижняя граница множителя cooldown'а (максимум −70%)
    pub min_cooldown_multiplier: f32,
}

impl Default for BossScaling {
    fn default() -> Self {
        Self {
            health_per_level: 0.2,
            damage_per_level: 0.15,
            speed_per_level: 0.05,
            cooldown_reduction_per_level: 0.03,
            min_cooldown_multiplier: 0.3,
        }
    }
}

/// Множители для уровня `level` (health, damage, speed, cooldown)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BossMultipliers {
    pub health: f32,
    pub damage: f32,
    pub speed: f32,
    pub cooldown: f32,
}

impl BossScaling {
    pub fn multipliers(&self, level: f32) -> BossMultipliers {
        let steps = (level - 1.0).max(0.0);
        BossMultipliers {
            health: 1.0 + self.health_per_level * steps,
            damage: 1.0 + self.damage_per_level * steps,
            speed: 1.0 + self.speed_per_level * steps,
            cooldown: (1.0 - self.cooldown_reduction_per_level * steps).max(self.min_cooldown_multiplier),
        }
    }

    /// Применить к боссу. Уровень ≤ 1 или повторный вызов: no-op (false).
    pub fn apply(&self, boss: &mut BossBrain, level: f32) -> bool {
        if level <= 1.0 || boss.difficulty_applied() {
            return false;
        }

        let multipliers = self.multipliers(level);
        boss.set_health_multiplier(multipliers.health);
        boss.set_damage_multiplier(multipliers.damage);
        boss.set_speed_multiplier(multipliers.speed);
        boss.set_cooldown_multiplier(multipliers.cooldown);
        boss.mark_difficulty_applied();

        crate::log_info(&format!("🐸 Boss scaled to difficulty level {}", level));
        true
    }
}
