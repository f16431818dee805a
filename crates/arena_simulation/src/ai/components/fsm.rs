//! FSM наземного агента: состояния, tuning, мозг (CombatAgent).
//!
//! Один тик = таймеры → ровно один handler текущего состояния → шаги
//! активного таймлайна атаки. Внешние события (урон, смерть) заходят через
//! `trigger_hit_reaction` / `trigger_death`.

use bevy::prelude::*;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::ai::attack::{AttackBehavior, AttackCue};
use crate::combat::scale_damage;
use crate::components::{face_towards, NavMover};
use crate::navigation::{random_point_in_ball, NavSurface};
use crate::perception::{ObstructionMask, Perception};
use crate::sequencer::{AttackSequencer, SequencerTick};

/// Дистанция до точки патруля, при которой считаем её достигнутой
pub const PATROL_ARRIVAL_DISTANCE: f32 = 0.5;

/// Ниже этой скорости импульс оглушения больше не двигает агента
const MOMENTUM_CUTOFF: f32 = 0.1;

/// Привязка скольжения к поверхности
const SLIDE_SNAP_DISTANCE: f32 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Reflect, Serialize, Deserialize)]
pub enum AgentState {
    #[default]
    Patrol,
    PatrolIdle,
    Chase,
    Attack,
    HitReact,
    /// Терминальное: выхода нет
    Dead,
}

/// Параметры наземного агента
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentTuning {
    pub patrol_radius: f32,
    pub patrol_speed: f32,
    pub patrol_acceleration: f32,
    pub chase_range: f32,
    pub chase_speed: f32,
    pub chase_acceleration: f32,
    pub attack_range: f32,
    pub attack_cooldown: f32,
    pub min_idle_time: f32,
    pub max_idle_time: f32,
    pub facing_speed: f32,
    pub eye_height: f32,
    pub obstruction_mask: ObstructionMask,
    pub hit_reaction_duration: f32,
    pub hit_stun_chance: f32,
    pub hit_stun_duration: f32,
    pub maintain_momentum: bool,
    pub momentum_fraction: f32,
    pub destroy_delay: f32,
}

impl Default for AgentTuning {
    fn default() -> Self {
        Self {
            patrol_radius: 10.0,
            patrol_speed: 2.0,
            patrol_acceleration: 8.0,
            chase_range: 12.0,
            chase_speed: 4.0,
            chase_acceleration: 50.0,
            attack_range: 2.0,
            attack_cooldown: 2.0,
            min_idle_time: 1.0,
            max_idle_time: 4.0,
            facing_speed: 20.0,
            eye_height: 1.0,
            obstruction_mask: ObstructionMask::WORLD,
            hit_reaction_duration: 0.5,
            hit_stun_chance: 0.3,
            hit_stun_duration: 1.0,
            maintain_momentum: true,
            momentum_fraction: 0.3,
            destroy_delay: 2.0,
        }
    }
}

/// Что произошло за тик (system переводит в события/урон)
#[derive(Debug, Clone, PartialEq)]
pub enum AgentEvent {
    StateChanged { from: AgentState, to: AgentState },
    AttackStarted,
    Cue(AttackCue),
    /// Hit-check попал по цели
    Strike { damage: u32 },
    AttackFinished,
}

/// Коллабораторы одного тика
pub struct AgentContext<'a, R: Rng + ?Sized> {
    pub transform: &'a mut Transform,
    pub mover: &'a mut NavMover,
    /// Позиция цели; `None` → агент заморожен
    pub target: Option<Vec3>,
    pub perception: &'a dyn Perception,
    pub surface: &'a dyn NavSurface,
    pub rng: &'a mut R,
}

/// Мозг наземного агента
#[derive(Component, Debug, Clone)]
pub struct CombatAgent {
    pub tuning: AgentTuning,
    pub attack: AttackBehavior,
    /// Копия множителя урона на момент спавна
    pub damage_multiplier: f32,
    state: AgentState,
    previous_state: AgentState,
    origin: Vec3,
    started: bool,
    cooldown_timer: f32,
    idle_timer: f32,
    is_idling: bool,
    hit_reaction_timer: f32,
    in_hit_reaction: bool,
    stunned: bool,
    momentum: Vec3,
    sequencer: AttackSequencer<AttackCue>,
    events: Vec<AgentEvent>,
}

impl CombatAgent {
    pub fn new(tuning: AgentTuning, attack: AttackBehavior, origin: Vec3) -> Self {
        Self {
            tuning,
            attack,
            damage_multiplier: 1.0,
            state: AgentState::Patrol,
            previous_state: AgentState::Patrol,
            origin,
            started: false,
            cooldown_timer: 0.0,
            idle_timer: 0.0,
            is_idling: false,
            hit_reaction_timer: 0.0,
            in_hit_reaction: false,
            stunned: false,
            momentum: Vec3::ZERO,
            sequencer: AttackSequencer::new(),
            events: Vec::new(),
        }
    }

    pub fn with_damage_multiplier(mut self, multiplier: f32) -> Self {
        self.damage_multiplier = multiplier;
        self
    }

    pub fn state(&self) -> AgentState {
        self.state
    }

    pub fn previous_state(&self) -> AgentState {
        self.previous_state
    }

    pub fn is_dead(&self) -> bool {
        self.state == AgentState::Dead
    }

    pub fn attack_in_progress(&self) -> bool {
        self.sequencer.is_running()
    }

    pub fn is_stunned(&self) -> bool {
        self.stunned
    }

    pub fn is_idling(&self) -> bool {
        self.is_idling
    }

    pub fn idle_timer(&self) -> f32 {
        self.idle_timer
    }

    pub fn cooldown_timer(&self) -> f32 {
        self.cooldown_timer
    }

    pub fn momentum(&self) -> Vec3 {
        self.momentum
    }

    pub fn origin(&self) -> Vec3 {
        self.origin
    }

    pub fn attacks_started(&self) -> u32 {
        self.sequencer.started_count()
    }

    /// Урон атаки с учётом множителя
    pub fn strike_damage(&self) -> u32 {
        scale_damage(self.attack.base_damage(), self.damage_multiplier)
    }

    /// Длительность idle: равномерно в [min_idle_time, max_idle_time]
    pub fn sample_idle_duration<R: Rng + ?Sized>(&self, rng: &mut R) -> f32 {
        let low = self.tuning.min_idle_time.min(self.tuning.max_idle_time);
        let high = self.tuning.min_idle_time.max(self.tuning.max_idle_time);
        if high - low <= f32::EPSILON {
            return low;
        }
        rng.gen_range(low..=high)
    }

    pub fn drain_events(&mut self) -> Vec<AgentEvent> {
        std::mem::take(&mut self.events)
    }

    // ========================================================================
    // Tick
    // ========================================================================

    pub fn tick<R: Rng + ?Sized>(&mut self, delta: f32, ctx: &mut AgentContext<'_, R>) -> Vec<AgentEvent> {
        if self.is_dead() {
            return self.drain_events();
        }
        let Some(target) = ctx.target else {
            return self.drain_events();
        };

        if !self.started {
            self.started = true;
            self.pick_patrol_point(ctx);
            self.enter(AgentState::Patrol, ctx.mover);
        }

        if self.cooldown_timer > 0.0 {
            self.cooldown_timer -= delta;
        }
        if self.is_idling && self.idle_timer > 0.0 {
            self.idle_timer -= delta;
        }
        if self.hit_reaction_timer > 0.0 {
            self.hit_reaction_timer -= delta;
        }

        let was_attacking = self.sequencer.is_running();

        match self.state {
            AgentState::Patrol => self.handle_patrol(target, ctx),
            AgentState::PatrolIdle => self.handle_patrol_idle(target, ctx),
            AgentState::Chase => self.handle_chase(delta, target, ctx),
            AgentState::Attack => self.handle_attack(delta, target, ctx),
            AgentState::HitReact => self.handle_hit_react(delta, target, ctx),
            AgentState::Dead => {}
        }

        if was_attacking {
            let tick = self.sequencer.advance(delta);
            self.run_attack_steps(tick, target, ctx.transform);
        }

        self.drain_events()
    }

    fn handle_patrol<R: Rng + ?Sized>(&mut self, target: Vec3, ctx: &mut AgentContext<'_, R>) {
        let arrived = !ctx.mover.has_path() || ctx.mover.remaining_distance() < PATROL_ARRIVAL_DISTANCE;
        if arrived && !self.is_idling {
            self.idle_timer = self.sample_idle_duration(&mut *ctx.rng);
            self.is_idling = true;
            self.enter(AgentState::PatrolIdle, ctx.mover);
            return;
        }

        if self.within_chase_range(ctx.transform.translation, target) {
            self.enter(AgentState::Chase, ctx.mover);
        }
    }

    fn handle_patrol_idle<R: Rng + ?Sized>(&mut self, target: Vec3, ctx: &mut AgentContext<'_, R>) {
        if self.idle_timer <= 0.0 {
            self.is_idling = false;
            self.pick_patrol_point(ctx);
            self.enter(AgentState::Patrol, ctx.mover);
        }

        if self.within_chase_range(ctx.transform.translation, target) {
            self.is_idling = false;
            self.enter(AgentState::Chase, ctx.mover);
        }
    }

    fn handle_chase<R: Rng + ?Sized>(&mut self, delta: f32, target: Vec3, ctx: &mut AgentContext<'_, R>) {
        face_towards(ctx.transform, target, self.tuning.facing_speed, delta);

        let position = ctx.transform.translation;
        if self.within_attack_range(position, target) && self.has_line_of_sight(ctx, target) {
            ctx.mover.halt();
            self.enter(AgentState::Attack, ctx.mover);
            return;
        }

        if !self.within_chase_range(position, target) {
            self.enter(AgentState::Patrol, ctx.mover);
            return;
        }

        if !ctx.mover.is_stopped {
            ctx.mover.set_destination(position, target);
        }
    }

    fn handle_attack<R: Rng + ?Sized>(&mut self, delta: f32, target: Vec3, ctx: &mut AgentContext<'_, R>) {
        if self.sequencer.is_running() {
            return;
        }

        face_towards(ctx.transform, target, self.tuning.facing_speed, delta);

        let position = ctx.transform.translation;
        if !self.within_attack_range(position, target) || !self.has_line_of_sight(ctx, target) {
            self.enter(AgentState::Chase, ctx.mover);
        } else if self.cooldown_timer <= 0.0 {
            self.start_attack(target, ctx.transform);
        }
    }

    fn handle_hit_react<R: Rng + ?Sized>(&mut self, delta: f32, target: Vec3, ctx: &mut AgentContext<'_, R>) {
        if self.hit_reaction_timer <= 0.0 {
            self.in_hit_reaction = false;
            self.stunned = false;
            self.momentum = Vec3::ZERO;

            let resume = self.previous_state;
            if resume == AgentState::PatrolIdle {
                // idle отсчёт продолжается с того места, где его прервали
                self.is_idling = true;
            }
            self.enter(resume, ctx.mover);
            return;
        }

        if !self.stunned {
            // Без оглушения продолжаем вести себя как до удара
            match self.previous_state {
                AgentState::Chase => {
                    if !ctx.mover.is_stopped {
                        ctx.mover.set_destination(ctx.transform.translation, target);
                    }
                }
                AgentState::Patrol => {
                    if !ctx.mover.has_path() || ctx.mover.remaining_distance() < PATROL_ARRIVAL_DISTANCE {
                        self.pick_patrol_point(ctx);
                    }
                }
                _ => {}
            }
        } else if self.tuning.maintain_momentum && self.momentum.length() > MOMENTUM_CUTOFF {
            let next = ctx.transform.translation + self.momentum * delta;
            if let Some(snapped) = ctx.surface.sample_position(next, SLIDE_SNAP_DISTANCE) {
                ctx.transform.translation = snapped;
            }
            self.momentum = self.momentum.lerp(Vec3::ZERO, (delta * 2.0).min(1.0));
        }
    }

    // ========================================================================
    // Attack
    // ========================================================================

    fn start_attack(&mut self, target: Vec3, transform: &Transform) {
        if let Err(err) = self.sequencer.start(self.attack.timeline()) {
            crate::log(&format!("⚔️ Attack start rejected: {}", err));
            return;
        }
        self.events.push(AgentEvent::AttackStarted);

        // Шаги с нулевым offset: в этом же тике
        let tick = self.sequencer.advance(0.0);
        self.run_attack_steps(tick, target, transform);
    }

    fn run_attack_steps(&mut self, tick: SequencerTick<AttackCue>, target: Vec3, transform: &Transform) {
        for cue in tick.actions {
            self.events.push(AgentEvent::Cue(cue));
            if cue == AttackCue::HitCheck && self.attack.hits(transform, target) {
                self.events.push(AgentEvent::Strike {
                    damage: self.strike_damage(),
                });
            }
        }

        if tick.completed {
            self.cooldown_timer = self.tuning.attack_cooldown;
            self.events.push(AgentEvent::AttackFinished);
        }
    }

    // ========================================================================
    // External triggers
    // ========================================================================

    /// Реакция на урон. Отклоняется, если мёртв, уже реагирует или атакует.
    pub fn trigger_hit_reaction<R: Rng + ?Sized>(&mut self, rng: &mut R, mover: &mut NavMover) -> bool {
        if self.is_dead() || self.in_hit_reaction || self.state == AgentState::Attack {
            return false;
        }

        self.previous_state = self.state;
        self.in_hit_reaction = true;
        self.stunned = rng.gen::<f32>() < self.tuning.hit_stun_chance;

        let mut duration = self.tuning.hit_reaction_duration;
        if self.stunned {
            duration += self.tuning.hit_stun_duration;
        }
        self.hit_reaction_timer = duration;

        self.enter(AgentState::HitReact, mover);
        true
    }

    /// Смерть: отмена атаки, остановка mover'а, терминальное состояние.
    pub fn trigger_death(&mut self, mover: &mut NavMover) -> bool {
        if self.is_dead() {
            return false;
        }

        let discarded = self.sequencer.cancel();
        if discarded > 0 {
            crate::log(&format!("⚔️ Attack cancelled by death ({} steps discarded)", discarded));
        }
        self.in_hit_reaction = false;
        self.stunned = false;
        self.momentum = Vec3::ZERO;

        self.enter(AgentState::Dead, mover);
        true
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    /// Вход в состояние + настройка mover'а под него
    fn enter(&mut self, next: AgentState, mover: &mut NavMover) {
        if self.is_dead() {
            return;
        }

        match next {
            AgentState::Patrol => {
                mover.resume();
                mover.auto_braking = true;
                mover.acceleration = self.tuning.patrol_acceleration;
                mover.speed = self.tuning.patrol_speed;
                mover.stopping_distance = 0.0;
            }
            AgentState::PatrolIdle => {
                mover.stop();
            }
            AgentState::Chase => {
                mover.resume();
                mover.auto_braking = false;
                mover.acceleration = self.tuning.chase_acceleration;
                mover.speed = self.tuning.chase_speed;
                self.is_idling = false;
            }
            AgentState::Attack => {
                mover.stop();
                self.is_idling = false;
            }
            AgentState::HitReact => {
                if self.stunned {
                    if self.tuning.maintain_momentum {
                        self.momentum = mover.velocity * self.tuning.momentum_fraction;
                    }
                    mover.halt();
                }
                self.is_idling = false;
            }
            AgentState::Dead => {
                mover.halt();
                mover.reset_path();
                self.is_idling = false;
            }
        }

        if self.state != next {
            self.events.push(AgentEvent::StateChanged {
                from: self.state,
                to: next,
            });
        }
        self.state = next;
    }

    fn pick_patrol_point<R: Rng + ?Sized>(&mut self, ctx: &mut AgentContext<'_, R>) {
        let candidate = random_point_in_ball(&mut *ctx.rng, self.origin, self.tuning.patrol_radius);
        if let Some(point) = ctx.surface.sample_position(candidate, self.tuning.patrol_radius) {
            ctx.mover.set_destination(ctx.transform.translation, point);
        }
    }

    fn within_chase_range(&self, position: Vec3, target: Vec3) -> bool {
        (target - position).length_squared() <= self.tuning.chase_range * self.tuning.chase_range
    }

    fn within_attack_range(&self, position: Vec3, target: Vec3) -> bool {
        (target - position).length_squared() <= self.tuning.attack_range * self.tuning.attack_range
    }

    fn has_line_of_sight<R: Rng + ?Sized>(&self, ctx: &AgentContext<'_, R>, target: Vec3) -> bool {
        let eye = ctx.transform.translation + Vec3::Y * self.tuning.eye_height;
        ctx.perception
            .has_line_of_sight(eye, target, self.tuning.obstruction_mask)
    }
}
