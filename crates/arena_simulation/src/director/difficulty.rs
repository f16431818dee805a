//! DifficultySnapshot: уровень сложности + множители, переживающие смену сцены.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::persistence::KeyValueStore;

pub const DIFFICULTY_LEVEL_KEY: &str = "DifficultyLevel";
pub const HEALTH_MULTIPLIER_KEY: &str = "HealthMultiplier";
pub const DAMAGE_MULTIPLIER_KEY: &str = "DamageMultiplier";
pub const TIME_IN_GAME_KEY: &str = "TimeInGame";

/// Все ключи сложности (очищаются при полном рестарте)
pub const DIFFICULTY_KEYS: [&str; 4] = [
    DIFFICULTY_LEVEL_KEY,
    HEALTH_MULTIPLIER_KEY,
    DAMAGE_MULTIPLIER_KEY,
    TIME_IN_GAME_KEY,
];

/// Resource: текущая сложность (level ≥ 1, множители ≥ 1)
///
/// Агенты копируют его при спавне (`DifficultyStamp`), никогда не ссылаются.
#[derive(Resource, Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DifficultySnapshot {
    pub level: f32,
    pub health_multiplier: f32,
    pub damage_multiplier: f32,
}

impl Default for DifficultySnapshot {
    fn default() -> Self {
        Self::BASELINE
    }
}

impl DifficultySnapshot {
    pub const BASELINE: Self = Self {
        level: 1.0,
        health_multiplier: 1.0,
        damage_multiplier: 1.0,
    };

    pub fn is_baseline(&self) -> bool {
        *self == Self::BASELINE
    }

    /// Прочитать из хранилища. Нет `DifficultyLevel` → None (level 1, без scaling).
    pub fn load(store: &dyn KeyValueStore) -> Option<Self> {
        if !store.has_key(DIFFICULTY_LEVEL_KEY) {
            return None;
        }

        Some(Self {
            level: store.get_float(DIFFICULTY_LEVEL_KEY, 1.0).max(1.0),
            health_multiplier: store.get_float(HEALTH_MULTIPLIER_KEY, 1.0).max(1.0),
            damage_multiplier: store.get_float(DAMAGE_MULTIPLIER_KEY, 1.0).max(1.0),
        })
    }

    pub fn load_or_default(store: &dyn KeyValueStore) -> Self {
        Self::load(store).unwrap_or_default()
    }

    /// Записать (без save(): flush делает вызывающий через gateway)
    pub fn write(&self, store: &mut dyn KeyValueStore, time_in_game: f32) {
        store.set_float(DIFFICULTY_LEVEL_KEY, self.level);
        store.set_float(HEALTH_MULTIPLIER_KEY, self.health_multiplier);
        store.set_float(DAMAGE_MULTIPLIER_KEY, self.damage_multiplier);
        store.set_float(TIME_IN_GAME_KEY, time_in_game);
    }

    pub fn clear(store: &mut dyn KeyValueStore) {
        for key in DIFFICULTY_KEYS {
            store.delete_key(key);
        }
    }
}

/// Копия сложности на момент спавна (поздние level-up'ы её не меняют)
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct DifficultyStamp(pub DifficultySnapshot);

/// Event: уровень сложности вырос
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct DifficultyChanged {
    pub snapshot: DifficultySnapshot,
}

/// Scaling здоровья при спавне: round-half-even(base × multiplier)
pub fn scaled_max_health(base: u32, multiplier: f32) -> u32 {
    crate::combat::scale_damage(base, multiplier).max(1)
}
