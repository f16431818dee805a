//! Primary attack варианты наземных агентов (выбираются при создании).
//!
//! Каждый вариант строит свой таймлайн и свою проверку попадания.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::components::planar_forward;
use crate::perception::segment_point_distance;
use crate::sequencer::AttackTimeline;

/// Высота, с которой идут лучи клинка (от pivot'а агента)
const BLADE_HEIGHT: f32 = 1.0;

/// Тело цели: вертикальная капсула
pub const TARGET_BODY_RADIUS: f32 = 0.5;
pub const TARGET_BODY_HEIGHT: f32 = 2.0;

/// Шаг таймлайна атаки агента
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttackCue {
    Windup,
    /// Предупреждение об ударе по площади (telegraph VFX)
    Telegraph,
    Slam,
    HitCheck,
    Settle,
    Recover,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AttackBehavior {
    /// Удар в ближнем радиусе
    MeleeSwing {
        damage: u32,
        duration: f32,
        hit_moment: f32,
        reach: f32,
    },
    /// Взмах клинком: веер из пяти лучей вдоль facing
    WeaponSlash {
        damage: u32,
        duration: f32,
        hit_moment: f32,
        blade_length: f32,
        blade_spread: f32,
    },
    /// Прыжок с ударом по площади вокруг точки приземления
    GroundSlam {
        damage: u32,
        telegraph: f32,
        jump: f32,
        landing: f32,
        radius: f32,
    },
}

impl Default for AttackBehavior {
    fn default() -> Self {
        Self::weapon_slash()
    }
}

impl AttackBehavior {
    pub fn melee_swing() -> Self {
        Self::MeleeSwing {
            damage: 15,
            duration: 1.0,
            hit_moment: 0.5,
            reach: 2.5,
        }
    }

    pub fn weapon_slash() -> Self {
        Self::WeaponSlash {
            damage: 25,
            duration: 1.0,
            hit_moment: 0.4,
            blade_length: 2.0,
            blade_spread: 0.5,
        }
    }

    pub fn ground_slam() -> Self {
        Self::GroundSlam {
            damage: 30,
            telegraph: 1.5,
            jump: 1.2,
            landing: 0.5,
            radius: 4.0,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::MeleeSwing { .. } => "melee_swing",
            Self::WeaponSlash { .. } => "weapon_slash",
            Self::GroundSlam { .. } => "ground_slam",
        }
    }

    pub fn base_damage(&self) -> u32 {
        match self {
            Self::MeleeSwing { damage, .. }
            | Self::WeaponSlash { damage, .. }
            | Self::GroundSlam { damage, .. } => *damage,
        }
    }

    /// (radius, duration) предупреждения, если атака по площади
    pub fn telegraph(&self) -> Option<(f32, f32)> {
        match self {
            Self::GroundSlam { radius, telegraph, .. } => Some((*radius, *telegraph)),
            _ => None,
        }
    }

    pub fn timeline(&self) -> AttackTimeline<AttackCue> {
        match self {
            Self::MeleeSwing { duration, hit_moment, .. } | Self::WeaponSlash { duration, hit_moment, .. } => {
                let hit_at = duration * hit_moment.clamp(0.0, 1.0);
                AttackTimeline::new()
                    .then(0.0, AttackCue::Windup)
                    .then(hit_at, AttackCue::HitCheck)
                    .then(duration - hit_at, AttackCue::Recover)
            }
            Self::GroundSlam { telegraph, jump, landing, .. } => AttackTimeline::new()
                .then(0.0, AttackCue::Telegraph)
                .then(*telegraph, AttackCue::Slam)
                .then(jump * 0.85, AttackCue::HitCheck)
                .then(jump * 0.15, AttackCue::Settle)
                .then(*landing, AttackCue::Recover),
        }
    }

    /// Hit-check в момент удара
    pub fn hits(&self, attacker: &Transform, target: Vec3) -> bool {
        let origin = attacker.translation;
        match self {
            Self::MeleeSwing { reach, .. } => (target - origin).length_squared() <= reach * reach,
            Self::WeaponSlash {
                blade_length,
                blade_spread,
                ..
            } => blade_fan_hits(attacker, target, *blade_length, *blade_spread),
            Self::GroundSlam { radius, .. } => target.distance(origin) <= *radius,
        }
    }
}

/// Пять горизонтальных лучей: центр, ±right, ±up (смещение `spread`)
fn blade_fan_hits(attacker: &Transform, target: Vec3, length: f32, spread: f32) -> bool {
    let forward = planar_forward(attacker);
    if forward == Vec3::ZERO {
        return false;
    }
    let right = Vec3::new(-forward.z, 0.0, forward.x);
    let center = attacker.translation + Vec3::Y * BLADE_HEIGHT;

    let origins = [
        center,
        center + right * spread,
        center - right * spread,
        center + Vec3::Y * spread,
        center - Vec3::Y * spread,
    ];

    origins.iter().any(|origin| {
        let height = origin.y;
        let within_body = height >= target.y - TARGET_BODY_RADIUS
            && height <= target.y + TARGET_BODY_HEIGHT + TARGET_BODY_RADIUS;
        let axis_point = Vec3::new(target.x, height, target.z);
        within_body && segment_point_distance(*origin, *origin + forward * length, axis_point) <= TARGET_BODY_RADIUS
    })
}
