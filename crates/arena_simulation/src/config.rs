//! ArenaConfig: все tunables симуляции в одном RON файле.
//!
//! Отсутствующие поля берутся из Default (значения оригинальной игры).

use std::fs;
use std::path::{Path, PathBuf};

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::boss::{BossScaling, BossTuning};
use crate::director::{ArchetypeKind, DirectorTuning, EnemyRoster};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("config {path} is not valid RON: {source}")]
    Ron {
        path: PathBuf,
        #[source]
        source: ron::error::SpannedError,
    },
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Геометрия уровней
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArenaLayout {
    /// Высота пола открытой карты
    pub ground_height: f32,
    pub boss_arena_center: [f32; 3],
    /// Радиус проходимого диска арены босса
    pub boss_arena_floor_radius: f32,
}

impl Default for ArenaLayout {
    fn default() -> Self {
        Self {
            ground_height: 0.0,
            boss_arena_center: [0.0, 0.0, 0.0],
            boss_arena_floor_radius: 30.0,
        }
    }
}

impl ArenaLayout {
    pub fn boss_arena_center(&self) -> Vec3 {
        Vec3::from_array(self.boss_arena_center)
    }
}

/// Resource: конфигурация всей симуляции
#[derive(Resource, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArenaConfig {
    pub seed: u64,
    /// Частота FixedUpdate
    pub tick_hz: f64,
    pub layout: ArenaLayout,
    pub boss: BossTuning,
    pub boss_scaling: BossScaling,
    pub director: DirectorTuning,
    pub roster: EnemyRoster,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            tick_hz: 60.0,
            layout: ArenaLayout::default(),
            boss: BossTuning::default(),
            boss_scaling: BossScaling::default(),
            director: DirectorTuning::default(),
            roster: EnemyRoster::default(),
        }
    }
}

impl ArenaConfig {
    pub fn from_ron_str(text: &str, origin: &Path) -> Result<Self, ConfigError> {
        let config: Self = ron::from_str(text).map_err(|source| ConfigError::Ron {
            path: origin.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_ron_str(&text, path)?;
        crate::log_info(&format!("⚙️ Config loaded from {}", path.display()));
        Ok(config)
    }

    /// Проверка диапазонов (пороги по порядку, интервалы > 0, вероятности в [0, 1])
    pub fn validate(&self) -> Result<(), ConfigError> {
        ensure(self.tick_hz > 0.0, "tick_hz must be positive")?;

        let boss = &self.boss;
        ensure(boss.max_health > 0.0, "boss.max_health must be positive")?;
        ensure(
            0.0 < boss.phase3_threshold && boss.phase3_threshold < boss.phase2_threshold && boss.phase2_threshold <= 1.0,
            "boss thresholds must satisfy 0 < phase3 < phase2 <= 1",
        )?;
        ensure(boss.attack_cooldown > 0.0, "boss.attack_cooldown must be positive")?;
        ensure(
            boss.melee_range < boss.shoot_range,
            "boss.melee_range must be below boss.shoot_range",
        )?;
        ensure(
            boss.min_jump_duration <= boss.jump_duration,
            "boss.min_jump_duration must not exceed boss.jump_duration",
        )?;

        let scaling = &self.boss_scaling;
        ensure(
            scaling.min_cooldown_multiplier > 0.0 && scaling.min_cooldown_multiplier <= 1.0,
            "boss_scaling.min_cooldown_multiplier must be in (0, 1]",
        )?;

        let director = &self.director;
        ensure(
            director.base_spawn_interval > 0.0 && director.min_spawn_interval > 0.0,
            "director spawn intervals must be positive",
        )?;
        ensure(
            director.difficulty_increase_interval > 0.0,
            "director.difficulty_increase_interval must be positive",
        )?;
        ensure(
            in_unit_range(director.spawn_interval_decrease_rate) && in_unit_range(director.spawn_distance_decrease_rate),
            "director decrease rates must be in (0, 1]",
        )?;
        ensure(director.spawn_attempts > 0, "director.spawn_attempts must be positive")?;

        for spec in &self.roster.archetypes {
            match &spec.kind {
                ArchetypeKind::Walker { tuning, .. } => {
                    ensure(
                        tuning.min_idle_time <= tuning.max_idle_time,
                        &format!("{}: min_idle_time must not exceed max_idle_time", spec.name),
                    )?;
                    ensure(
                        (0.0..=1.0).contains(&tuning.hit_stun_chance),
                        &format!("{}: hit_stun_chance must be in [0, 1]", spec.name),
                    )?;
                    ensure(
                        tuning.attack_range < tuning.chase_range,
                        &format!("{}: attack_range must be below chase_range", spec.name),
                    )?;
                }
                ArchetypeKind::Flyer { tuning } => {
                    ensure(
                        tuning.min_pause <= tuning.max_pause,
                        &format!("{}: min_pause must not exceed max_pause", spec.name),
                    )?;
                    ensure(
                        (0.0..=1.0).contains(&tuning.prediction_accuracy),
                        &format!("{}: prediction_accuracy must be in [0, 1]", spec.name),
                    )?;
                }
            }
        }

        Ok(())
    }
}

fn in_unit_range(value: f32) -> bool {
    value > 0.0 && value <= 1.0
}

fn ensure(condition: bool, message: &str) -> Result<(), ConfigError> {
    if condition {
        Ok(())
    } else {
        Err(ConfigError::Invalid(message.to_string()))
    }
}
