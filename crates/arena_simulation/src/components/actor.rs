//! Базовые компоненты акторов: Health, ArenaTarget, Knockback, EnemyTag

use bevy::prelude::*;

/// Здоровье актора (игрок, walker, flyer)
///
/// Инвариант: 0 ≤ current ≤ max
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Reflect)]
#[reflect(Component)]
pub struct Health {
    pub current: u32,
    pub max: u32,
}

impl Default for Health {
    fn default() -> Self {
        Self::new(100)
    }
}

impl Health {
    pub fn new(max: u32) -> Self {
        Self { current: max, max }
    }

    pub fn is_alive(&self) -> bool {
        self.current > 0
    }

    pub fn take_damage(&mut self, amount: u32) {
        self.current = self.current.saturating_sub(amount);
    }

    pub fn heal(&mut self, amount: u32) {
        self.current = self.current.saturating_add(amount).min(self.max);
    }

    /// Новый максимум + полное лечение (scaling при спавне)
    pub fn set_max(&mut self, max: u32) {
        self.max = max;
        self.current = max;
    }

    pub fn fraction(&self) -> f32 {
        if self.max == 0 {
            return 0.0;
        }
        self.current as f32 / self.max as f32
    }
}

/// Маркер: цель, которую преследуют враги (игрок)
#[derive(Component, Debug, Clone, Copy, Default, Reflect)]
#[reflect(Component)]
pub struct ArenaTarget;

/// Скорость цели, оценённая по смещению за тик (нужна для упреждения у flyer'ов)
#[derive(Component, Debug, Clone, Copy, Default, Reflect)]
#[reflect(Component)]
pub struct TargetMotion {
    pub last_position: Option<Vec3>,
    pub velocity: Vec3,
}

/// Накопленный импульс отбрасывания (consumer: физика игрока, вне симуляции)
#[derive(Component, Debug, Clone, Copy, Default, Reflect)]
#[reflect(Component)]
pub struct Knockback {
    pub impulse: Vec3,
}

impl Knockback {
    pub fn push(&mut self, impulse: Vec3) {
        self.impulse += impulse;
    }

    /// Забрать накопленный импульс (обнуляет аккумулятор)
    pub fn take(&mut self) -> Vec3 {
        std::mem::take(&mut self.impulse)
    }
}

/// Маркер врага, созданного director'ом (archetype name для логов/статистики)
#[derive(Component, Debug, Clone, PartialEq, Eq)]
pub struct EnemyTag {
    pub archetype: String,
}

/// Система: оценка скорости цели по позиции
pub fn track_target_motion(
    mut targets: Query<(&Transform, &mut TargetMotion), With<ArenaTarget>>,
    time: Res<Time<Fixed>>,
) {
    let delta = time.delta_secs();
    if delta <= 0.0 {
        return;
    }

    for (transform, mut motion) in targets.iter_mut() {
        if let Some(last) = motion.last_position {
            motion.velocity = (transform.translation - last) / delta;
        }
        motion.last_position = Some(transform.translation);
    }
}
