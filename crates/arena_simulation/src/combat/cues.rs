//! Наружные cue-события для VFX/audio (симуляция их только пишет).

use bevy::prelude::*;

use crate::ai::{AgentState, AttackCue};
use crate::boss::BossCue;

#[derive(Debug, Clone, PartialEq)]
pub enum CueKind {
    StateChanged { from: AgentState, to: AgentState },
    AttackStarted { attack: &'static str },
    AttackStep(AttackCue),
    BossStep(BossCue),
    /// Предупреждение об ударе по площади
    Telegraph { center: Vec3, radius: f32, duration: f32 },
    Explosion { center: Vec3, radius: f32 },
    HitReaction { stunned: bool },
    Taunt,
    Died,
}

#[derive(Event, Debug, Clone, PartialEq)]
pub struct CombatCue {
    pub source: Entity,
    pub kind: CueKind,
}

impl CombatCue {
    pub fn new(source: Entity, kind: CueKind) -> Self {
        Self { source, kind }
    }
}
