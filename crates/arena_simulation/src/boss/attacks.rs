//! Атаки босса: выбор по дистанции/фазе, таймлайны, дуга прыжка.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::sequencer::AttackTimeline;

/// Пауза перед первым выстрелом и после последнего
pub const SHOT_WINDUP: f32 = 0.5;
pub const SHOT_RECOVERY: f32 = 0.5;
/// Анимация big shot → вылет снаряда
pub const BIG_SHOT_LEAD: f32 = 0.1;
pub const KICK_HIT_MOMENT: f32 = 0.4;
pub const KICK_RECOVERY: f32 = 0.6;
pub const JUMP_TAKEOFF: f32 = 0.3;
pub const JUMP_RECOVERY: f32 = 0.8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BossAttack {
    SmallShot,
    BigShot,
    Kick,
    Jump,
}

impl BossAttack {
    pub fn name(self) -> &'static str {
        match self {
            Self::SmallShot => "SmallShot",
            Self::BigShot => "BigShot",
            Self::Kick => "Kick",
            Self::Jump => "Jump",
        }
    }
}

/// Шаг таймлайна босса
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BossCue {
    /// Мгновенный разворот к цели
    Face,
    FireSmall,
    Windup,
    FireBig,
    KickWindup,
    KickCheck,
    Telegraph,
    Takeoff,
    Land,
    Recover,
}

/// Выбор атаки. `roll` равномерно в [0, 1).
///
/// - melee: 70% Kick / 30% Jump
/// - до shoot_range: фаза ≥ 2 → 40/30/30 SmallShot/BigShot/Jump, фаза 1 → 60/40
/// - дальше: всегда Jump
pub fn choose_attack(distance: f32, phase: u8, melee_range: f32, shoot_range: f32, roll: f32) -> BossAttack {
    if distance <= melee_range {
        if roll < 0.7 {
            BossAttack::Kick
        } else {
            BossAttack::Jump
        }
    } else if distance <= shoot_range {
        if phase >= 2 {
            if roll < 0.4 {
                BossAttack::SmallShot
            } else if roll < 0.7 {
                BossAttack::BigShot
            } else {
                BossAttack::Jump
            }
        } else if roll < 0.6 {
            BossAttack::SmallShot
        } else {
            BossAttack::BigShot
        }
    } else {
        BossAttack::Jump
    }
}

/// Длительность полёта: lerp(min, max) по доле дистанции от shoot_range
pub fn jump_flight_duration(distance: f32, min_duration: f32, max_duration: f32, shoot_range: f32) -> f32 {
    let t = if shoot_range > 0.0 {
        (distance / shoot_range).clamp(0.0, 1.0)
    } else {
        1.0
    };
    min_duration + (max_duration - min_duration) * t
}

pub fn small_shot_timeline(burst: u32, burst_delay: f32) -> AttackTimeline<BossCue> {
    let mut timeline = AttackTimeline::new().then(0.0, BossCue::Face);
    if burst == 0 {
        return timeline.then(SHOT_WINDUP + SHOT_RECOVERY, BossCue::Recover);
    }
    for shot in 0..burst {
        let wait = if shot == 0 { SHOT_WINDUP } else { burst_delay };
        timeline.push(wait, BossCue::FireSmall);
    }
    timeline.then(burst_delay + SHOT_RECOVERY, BossCue::Recover)
}

pub fn big_shot_timeline() -> AttackTimeline<BossCue> {
    AttackTimeline::new()
        .then(0.0, BossCue::Face)
        .then(SHOT_WINDUP, BossCue::Windup)
        .then(BIG_SHOT_LEAD, BossCue::FireBig)
        .then(SHOT_RECOVERY, BossCue::Recover)
}

pub fn kick_timeline() -> AttackTimeline<BossCue> {
    AttackTimeline::new()
        .then(0.0, BossCue::KickWindup)
        .then(KICK_HIT_MOMENT, BossCue::KickCheck)
        .then(KICK_RECOVERY, BossCue::Recover)
}

pub fn jump_timeline(flight: f32) -> AttackTimeline<BossCue> {
    AttackTimeline::new()
        .then(0.0, BossCue::Telegraph)
        .then(JUMP_TAKEOFF, BossCue::Takeoff)
        .then(flight, BossCue::Land)
        .then(JUMP_RECOVERY, BossCue::Recover)
}

/// Дуга прыжка: линейно по горизонтали + sin(πt)·height по вертикали
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JumpArc {
    pub start: Vec3,
    pub landing: Vec3,
    pub height: f32,
    pub duration: f32,
    pub elapsed: f32,
}

impl JumpArc {
    pub fn new(start: Vec3, landing: Vec3, height: f32, duration: f32) -> Self {
        Self {
            start,
            landing,
            height,
            duration,
            elapsed: 0.0,
        }
    }

    pub fn progress(&self) -> f32 {
        if self.duration <= 0.0 {
            return 1.0;
        }
        (self.elapsed / self.duration).min(1.0)
    }

    pub fn position(&self) -> Vec3 {
        let progress = self.progress();
        self.start.lerp(self.landing, progress) + Vec3::Y * (progress * std::f32::consts::PI).sin() * self.height
    }

    /// Продвинуть на `delta`, вернуть новую позицию
    pub fn advance(&mut self, delta: f32) -> Vec3 {
        self.elapsed += delta;
        self.position()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_melee_split() {
        assert_eq!(choose_attack(3.0, 1, 4.0, 15.0, 0.0), BossAttack::Kick);
        assert_eq!(choose_attack(4.0, 1, 4.0, 15.0, 0.69), BossAttack::Kick);
        assert_eq!(choose_attack(4.0, 3, 4.0, 15.0, 0.7), BossAttack::Jump);
    }

    #[test]
    fn test_policy_shoot_band_depends_on_phase() {
        assert_eq!(choose_attack(10.0, 1, 4.0, 15.0, 0.59), BossAttack::SmallShot);
        assert_eq!(choose_attack(10.0, 1, 4.0, 15.0, 0.99), BossAttack::BigShot);

        assert_eq!(choose_attack(10.0, 2, 4.0, 15.0, 0.39), BossAttack::SmallShot);
        assert_eq!(choose_attack(10.0, 2, 4.0, 15.0, 0.4), BossAttack::BigShot);
        assert_eq!(choose_attack(15.0, 3, 4.0, 15.0, 0.7), BossAttack::Jump);
    }

    #[test]
    fn test_policy_far_always_jumps() {
        for roll in [0.0, 0.3, 0.65, 0.99] {
            assert_eq!(choose_attack(15.5, 1, 4.0, 15.0, roll), BossAttack::Jump);
        }
    }

    #[test]
    fn test_jump_flight_interpolation() {
        assert!((jump_flight_duration(0.0, 0.8, 2.0, 15.0) - 0.8).abs() < 1e-6);
        assert!((jump_flight_duration(7.5, 0.8, 2.0, 15.0) - 1.4).abs() < 1e-6);
        assert!((jump_flight_duration(40.0, 0.8, 2.0, 15.0) - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_small_shot_timeline_burst() {
        let timeline = small_shot_timeline(3, 0.2);
        let fires = timeline
            .steps()
            .iter()
            .filter(|step| step.action == BossCue::FireSmall)
            .count();
        assert_eq!(fires, 3);
        // 0.5 + 0.2 + 0.2 + (0.2 + 0.5)
        assert!((timeline.duration() - 1.6).abs() < 1e-5);
    }

    #[test]
    fn test_jump_arc_peaks_midway() {
        let mut arc = JumpArc::new(Vec3::ZERO, Vec3::new(0.0, 0.0, -10.0), 5.0, 1.0);
        let mid = arc.advance(0.5);
        assert!((mid - Vec3::new(0.0, 5.0, -5.0)).length() < 1e-4);
        let end = arc.advance(0.6);
        assert!((end - Vec3::new(0.0, 0.0, -10.0)).length() < 1e-4);
    }
}
