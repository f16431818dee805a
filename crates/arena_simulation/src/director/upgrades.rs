//! UpgradeState: постоянные уровни апгрейдов игрока + бонусы текущего забега.
//!
//! Читается/пишется только через PersistenceGateway при смене сцены.

use bevy::prelude::*;

use crate::persistence::KeyValueStore;

/// Постоянные уровни (переживают рестарт забега)
pub const UPGRADE_LEVEL_KEYS: [&str; 6] = [
    "HealthLevel",
    "DamageLevel",
    "JumpLevel",
    "DashLevel",
    "MovementLevel",
    "FireRateLevel",
];

/// Бонусы забега (int), обнуляются при рестарте
pub const RUN_BONUS_INT_KEYS: [&str; 10] = [
    "HealthPow",
    "SelfHeal",
    "medHeal",
    "BulletHealing",
    "jumpBoy",
    "BulletDamage",
    "BulletCriticalChance",
    "EMPPowerUPDamage",
    "DoubleHealthHalveSpeedHealthPart",
    "DoublePowerReduceHealthHealthPart",
];

/// Бонусы забега (float), обнуляются при рестарте
pub const RUN_BONUS_FLOAT_KEYS: [&str; 13] = [
    "MovementPower",
    "airBoy",
    "dashDownBoy",
    "dashSpeedBoy",
    "fireRateUP",
    "BulletCriticalDamage",
    "EMPPowerUPRadius",
    "powerUPDown",
    "DoubleHealthHalveSpeedWalkPart",
    "DoubleHealthHalveSpeedAirPart",
    "DoublePowerReduceHealthPowerPart",
    "DoubleMovementHalvePowerWalkPart",
    "DoubleMovementHalvePowerAirPart",
];

/// Базовое здоровье цели и прибавка за уровень апгрейда
pub const TARGET_BASE_HEALTH: i32 = 100;
pub const TARGET_HEALTH_PER_LEVEL: i32 = 30;

#[derive(Resource, Debug, Clone, PartialEq, Eq)]
pub struct UpgradeState {
    pub health_level: i32,
    pub damage_level: i32,
    /// Бонус здоровья, купленный в этом забеге
    pub health_bonus: i32,
    /// Обмен скорость → здоровье
    pub traded_health: i32,
    /// Обмен здоровье → урон (вычитается)
    pub sacrificed_health: i32,
}

impl Default for UpgradeState {
    fn default() -> Self {
        Self {
            health_level: 1,
            damage_level: 1,
            health_bonus: 0,
            traded_health: 0,
            sacrificed_health: 0,
        }
    }
}

impl UpgradeState {
    pub fn load(store: &dyn KeyValueStore) -> Self {
        Self {
            health_level: store.get_int("HealthLevel", 1).max(1),
            damage_level: store.get_int("DamageLevel", 1).max(1),
            health_bonus: store.get_int("HealthPow", 0),
            traded_health: store.get_int("DoubleHealthHalveSpeedHealthPart", 0),
            sacrificed_health: store.get_int("DoublePowerReduceHealthHealthPart", 0),
        }
    }

    pub fn write(&self, store: &mut dyn KeyValueStore) {
        store.set_int("HealthLevel", self.health_level);
        store.set_int("DamageLevel", self.damage_level);
        store.set_int("HealthPow", self.health_bonus);
        store.set_int("DoubleHealthHalveSpeedHealthPart", self.traded_health);
        store.set_int("DoublePowerReduceHealthHealthPart", self.sacrificed_health);
    }

    /// Обнулить бонусы забега в хранилище (постоянные уровни не трогаем)
    pub fn reset_run_bonuses(store: &mut dyn KeyValueStore) {
        for key in RUN_BONUS_INT_KEYS {
            store.set_int(key, 0);
        }
        for key in RUN_BONUS_FLOAT_KEYS {
            store.set_float(key, 0.0);
        }
    }

    /// Без бонусов забега (после рестарта)
    pub fn without_run_bonuses(&self) -> Self {
        Self {
            health_level: self.health_level,
            damage_level: self.damage_level,
            ..Self::default()
        }
    }

    /// Максимум здоровья цели с учётом апгрейдов (минимум 1)
    pub fn target_max_health(&self) -> u32 {
        let health = TARGET_BASE_HEALTH + (self.health_level - 1) * TARGET_HEALTH_PER_LEVEL + self.health_bonus
            + self.traded_health
            - self.sacrificed_health;
        health.max(1) as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::MemoryStore;

    #[test]
    fn test_defaults_without_saved_upgrades() {
        let store = MemoryStore::new();
        let upgrades = UpgradeState::load(&store);
        assert_eq!(upgrades, UpgradeState::default());
        assert_eq!(upgrades.target_max_health(), 100);
    }

    #[test]
    fn test_target_health_from_upgrades() {
        let mut store = MemoryStore::new();
        store.set_int("HealthLevel", 3);
        store.set_int("HealthPow", 15);
        store.set_int("DoublePowerReduceHealthHealthPart", 40);

        let upgrades = UpgradeState::load(&store);
        // 100 + 2 × 30 + 15 − 40
        assert_eq!(upgrades.target_max_health(), 135);
    }

    #[test]
    fn test_reset_keeps_permanent_levels() {
        let mut store = MemoryStore::new();
        UpgradeState {
            health_level: 4,
            damage_level: 2,
            health_bonus: 20,
            traded_health: 10,
            sacrificed_health: 0,
        }
        .write(&mut store);
        store.set_float("fireRateUP", 0.4);
        store.set_float("DoubleMovementHalvePowerAirPart", 1.5);

        UpgradeState::reset_run_bonuses(&mut store);
        for key in UPGRADE_LEVEL_KEYS {
            assert!(!RUN_BONUS_INT_KEYS.contains(&key));
        }

        let upgrades = UpgradeState::load(&store);
        assert_eq!(upgrades.health_level, 4);
        assert_eq!(upgrades.damage_level, 2);
        assert_eq!(upgrades.health_bonus, 0);
        assert_eq!(upgrades.traded_health, 0);
        assert_eq!(store.get_float("fireRateUP", -1.0), 0.0);
        assert_eq!(store.get_float("DoubleMovementHalvePowerAirPart", -1.0), 0.0);
        assert_eq!(upgrades, upgrades.without_run_bonuses());
    }
}
