//! SpawnDirector: эскалация сложности по таймеру + темп волн.
//!
//! Чистая логика без ECS: система `run_spawn_director` вызывает `advance()`
//! и сама размещает волну в мире.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::director::difficulty::DifficultySnapshot;

/// Параметры director'а (значения по умолчанию из оригинальной игры)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectorTuning {
    pub base_spawn_interval: f32,
    pub base_spawn_distance: f32,
    pub min_spawn_distance: f32,
    pub base_enemies_per_spawn: f32,
    pub difficulty_increase_interval: f32,
    pub spawn_interval_decrease_rate: f32,
    pub spawn_distance_decrease_rate: f32,
    pub enemies_per_spawn_increase_rate: f32,
    pub health_multiplier_per_level: f32,
    pub damage_multiplier_per_level: f32,
    /// Soft cap: проверяется только при допуске новых агентов
    pub max_enemies_alive: usize,
    pub min_spawn_interval: f32,
    /// Попыток найти точку на navmesh для наземного врага
    pub spawn_attempts: u32,
    pub sample_radius: f32,
    pub flyer_height_offset: f32,
}

impl Default for DirectorTuning {
    fn default() -> Self {
        Self {
            base_spawn_interval: 3.0,
            base_spawn_distance: 20.0,
            min_spawn_distance: 8.0,
            base_enemies_per_spawn: 1.0,
            difficulty_increase_interval: 60.0,
            spawn_interval_decrease_rate: 0.9,
            spawn_distance_decrease_rate: 0.95,
            enemies_per_spawn_increase_rate: 0.3,
            health_multiplier_per_level: 0.15,
            damage_multiplier_per_level: 0.1,
            max_enemies_alive: 20,
            min_spawn_interval: 0.5,
            spawn_attempts: 30,
            sample_radius: 5.0,
            flyer_height_offset: 10.0,
        }
    }
}

/// Темп спавна (interval, distance, enemies per spawn)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpawnPacing {
    pub spawn_interval: f32,
    pub spawn_distance: f32,
    pub enemies_per_spawn: f32,
}

impl SpawnPacing {
    pub fn base(tuning: &DirectorTuning) -> Self {
        Self {
            spawn_interval: tuning.base_spawn_interval,
            spawn_distance: tuning.base_spawn_distance,
            enemies_per_spawn: tuning.base_enemies_per_spawn,
        }
    }

    /// Один шаг эскалации (multiplicative decay с полом + additive рост)
    pub fn escalate(&mut self, tuning: &DirectorTuning) {
        self.spawn_interval = tuning
            .min_spawn_interval
            .max(self.spawn_interval * tuning.spawn_interval_decrease_rate);
        self.spawn_distance = tuning
            .min_spawn_distance
            .max(self.spawn_distance * tuning.spawn_distance_decrease_rate);
        self.enemies_per_spawn += tuning.enemies_per_spawn_increase_rate;
    }

    /// Размер волны: round-half-even(enemies_per_spawn)
    pub fn wave_size(&self) -> usize {
        self.enemies_per_spawn.round_ties_even().max(0.0) as usize
    }
}

/// Живые агенты director'а (чистятся лениво, когда entity исчезла)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LiveAgentSet {
    agents: Vec<Entity>,
}

impl LiveAgentSet {
    pub fn insert(&mut self, entity: Entity) {
        if !self.agents.contains(&entity) {
            self.agents.push(entity);
        }
    }

    pub fn contains(&self, entity: Entity) -> bool {
        self.agents.contains(&entity)
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = Entity> + '_ {
        self.agents.iter().copied()
    }

    /// Убрать entity, которых больше нет. Возвращает число удалённых.
    pub fn prune(&mut self, mut exists: impl FnMut(Entity) -> bool) -> usize {
        let before = self.agents.len();
        self.agents.retain(|entity| exists(*entity));
        before - self.agents.len()
    }
}

/// Результат одного тика director'а
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DirectorTick {
    /// Новый snapshot, если в этом тике вырос уровень
    pub level_up: Option<DifficultySnapshot>,
    /// Пора спавнить волну (размещение делает вызывающий)
    pub wave_due: bool,
}

/// Resource: population controller
#[derive(Resource, Debug, Clone)]
pub struct SpawnDirector {
    pub tuning: DirectorTuning,
    /// Цель, вокруг которой спавним (None → волны пропускаются)
    pub target: Option<Entity>,
    snapshot: DifficultySnapshot,
    pacing: SpawnPacing,
    difficulty_timer: f32,
    spawn_timer: f32,
    elapsed: f32,
    live: LiveAgentSet,
    waves_spawned: u32,
}

impl SpawnDirector {
    /// Свежий director: level 1, базовый темп
    pub fn new(tuning: DirectorTuning, target: Option<Entity>) -> Self {
        let pacing = SpawnPacing::base(&tuning);
        Self {
            tuning,
            target,
            snapshot: DifficultySnapshot::BASELINE,
            pacing,
            difficulty_timer: 0.0,
            spawn_timer: 0.0,
            elapsed: 0.0,
            live: LiveAgentSet::default(),
            waves_spawned: 0,
        }
    }

    /// Восстановление из сохранения: level и множители как есть,
    /// темп пересчитан повтором эскалации (level − 1) раз от базовых значений.
    pub fn restore(tuning: DirectorTuning, snapshot: DifficultySnapshot, target: Option<Entity>) -> Self {
        let mut director = Self::new(tuning, target);
        let replays = (snapshot.level - 1.0).max(0.0).ceil() as u32;
        for _ in 0..replays {
            director.pacing.escalate(&director.tuning);
        }
        director.snapshot = snapshot;

        crate::log_info(&format!(
            "📈 Director restored at difficulty level {} (interval {:.3}s, distance {:.2}, per spawn {:.1})",
            snapshot.level, director.pacing.spawn_interval, director.pacing.spawn_distance, director.pacing.enemies_per_spawn
        ));
        director
    }

    pub fn snapshot(&self) -> DifficultySnapshot {
        self.snapshot
    }

    pub fn level(&self) -> f32 {
        self.snapshot.level
    }

    pub fn pacing(&self) -> SpawnPacing {
        self.pacing
    }

    pub fn spawn_interval(&self) -> f32 {
        self.pacing.spawn_interval
    }

    pub fn spawn_distance(&self) -> f32 {
        self.pacing.spawn_distance
    }

    pub fn enemies_per_spawn(&self) -> f32 {
        self.pacing.enemies_per_spawn
    }

    /// Время жизни director'а (для TimeInGame)
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    pub fn waves_spawned(&self) -> u32 {
        self.waves_spawned
    }

    pub fn live(&self) -> &LiveAgentSet {
        &self.live
    }

    pub fn live_mut(&mut self) -> &mut LiveAgentSet {
        &mut self.live
    }

    /// Есть место под ещё одного агента (soft cap)
    pub fn has_capacity(&self) -> bool {
        self.live.len() < self.tuning.max_enemies_alive
    }

    /// Продвинуть таймеры: сначала эскалация, потом таймер волны
    /// (волна сверяется с уже обновлённым interval'ом)
    pub fn advance(&mut self, delta: f32) -> DirectorTick {
        let mut tick = DirectorTick::default();
        self.elapsed += delta;

        self.difficulty_timer += delta;
        if self.difficulty_timer >= self.tuning.difficulty_increase_interval {
            self.difficulty_timer = 0.0;
            tick.level_up = Some(self.increase_difficulty());
        }

        self.spawn_timer += delta;
        if self.spawn_timer >= self.pacing.spawn_interval {
            self.spawn_timer = 0.0;
            tick.wave_due = true;
        }

        tick
    }

    /// Level += 1, темп и множители пересчитаны
    pub fn increase_difficulty(&mut self) -> DifficultySnapshot {
        self.pacing.escalate(&self.tuning);

        let level = self.snapshot.level + 1.0;
        self.snapshot = DifficultySnapshot {
            level,
            health_multiplier: 1.0 + self.tuning.health_multiplier_per_level * (level - 1.0),
            damage_multiplier: 1.0 + self.tuning.damage_multiplier_per_level * (level - 1.0),
        };

        crate::log_info(&format!("📈 Difficulty increased to level {}", level));
        self.snapshot
    }

    /// Сколько агентов в этой волне (0 → волна пропущена)
    pub fn wave_size(&self) -> usize {
        if self.target.is_none() || !self.has_capacity() {
            return 0;
        }
        self.pacing.wave_size()
    }

    /// Зарегистрировать заспавненного агента
    pub fn admit(&mut self, entity: Entity) {
        self.live.insert(entity);
    }

    pub(crate) fn record_wave(&mut self) {
        self.waves_spawned += 1;
    }
}
