//! Мозг босса: здоровье/фазы, бой внутри арены, cooldown, удержание в арене.
//!
//! Порядок тика: статус арены → HandleCombat → шаги активной атаки (дуга
//! прыжка, таймлайн) → cooldown → clamp к арене.

use bevy::prelude::*;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::ai::attack::TARGET_BODY_HEIGHT;
use crate::boss::attacks::{
    big_shot_timeline, choose_attack, jump_flight_duration, jump_timeline, kick_timeline, small_shot_timeline,
    BossAttack, BossCue, JumpArc, JUMP_TAKEOFF,
};
use crate::combat::{scale_damage, Blast};
use crate::components::{face_towards, planar_distance, snap_facing};
use crate::sequencer::{AttackSequencer, AttackTimeline, SequencerTick};

/// Множители фазы (применяются к оригинальным значениям)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PhaseModifiers {
    pub speed: f32,
    pub cooldown: f32,
    pub damage: f32,
    pub burst_bonus: u32,
}

impl PhaseModifiers {
    pub const NEUTRAL: Self = Self {
        speed: 1.0,
        cooldown: 1.0,
        damage: 1.0,
        burst_bonus: 0,
    };
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BossTuning {
    pub max_health: f32,
    pub move_speed: f32,
    pub rotation_speed: f32,
    pub detection_range: f32,
    pub arena_radius: f32,
    pub attack_cooldown: f32,
    pub melee_range: f32,
    pub shoot_range: f32,
    /// Высота точки выстрела над pivot'ом
    pub muzzle_height: f32,

    pub small_shot_damage: u32,
    pub small_shot_speed: f32,
    pub small_shot_burst: u32,
    pub small_shot_burst_delay: f32,

    pub big_shot_damage: u32,
    pub big_shot_speed: f32,
    pub big_shot_radius: f32,
    pub big_shot_knockback: f32,

    pub kick_damage: u32,
    pub kick_range: f32,
    pub kick_knockback: f32,

    pub jump_damage: u32,
    pub jump_radius: f32,
    pub jump_height: f32,
    pub jump_duration: f32,
    pub min_jump_duration: f32,

    pub phase2_threshold: f32,
    pub phase3_threshold: f32,
    pub phase2: PhaseModifiers,
    pub phase3: PhaseModifiers,
}

impl Default for BossTuning {
    fn default() -> Self {
        Self {
            max_health: 1000.0,
            move_speed: 3.0,
            rotation_speed: 5.0,
            detection_range: 20.0,
            arena_radius: 25.0,
            attack_cooldown: 2.0,
            melee_range: 4.0,
            shoot_range: 15.0,
            muzzle_height: 1.5,

            small_shot_damage: 25,
            small_shot_speed: 15.0,
            small_shot_burst: 3,
            small_shot_burst_delay: 0.2,

            big_shot_damage: 75,
            big_shot_speed: 8.0,
            big_shot_radius: 5.0,
            big_shot_knockback: 10.0,

            kick_damage: 100,
            kick_range: 5.0,
            kick_knockback: 10.0,

            jump_damage: 150,
            jump_radius: 8.0,
            jump_height: 5.0,
            jump_duration: 2.0,
            min_jump_duration: 0.8,

            phase2_threshold: 0.66,
            phase3_threshold: 0.33,
            phase2: PhaseModifiers {
                speed: 1.2,
                cooldown: 0.8,
                damage: 1.3,
                burst_bonus: 1,
            },
            phase3: PhaseModifiers {
                speed: 1.5,
                cooldown: 0.7,
                damage: 1.6,
                burst_bonus: 2,
            },
        }
    }
}

impl BossTuning {
    pub fn phase_modifiers(&self, phase: u8) -> PhaseModifiers {
        match phase {
            2 => self.phase2,
            3 => self.phase3,
            _ => PhaseModifiers::NEUTRAL,
        }
    }
}

/// Урон четырёх атак
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttackDamage {
    pub small_shot: u32,
    pub big_shot: u32,
    pub kick: u32,
    pub jump: u32,
}

impl AttackDamage {
    pub fn scaled(&self, multiplier: f32) -> Self {
        Self {
            small_shot: scale_damage(self.small_shot, multiplier),
            big_shot: scale_damage(self.big_shot, multiplier),
            kick: scale_damage(self.kick, multiplier),
            jump: scale_damage(self.jump, multiplier),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum BossEvent {
    AreaStatusChanged { inside: bool },
    AttackStarted(BossAttack),
    Cue(BossCue),
    Telegraph { center: Vec3, radius: f32, duration: f32 },
    Fire {
        origin: Vec3,
        direction: Vec3,
        speed: f32,
        damage: u32,
        blast: Option<Blast>,
    },
    /// Удар по цели (kick, приземление прыжка)
    Strike { damage: u32, knockback: Vec3 },
    AttackFinished(BossAttack),
    HealthChanged { current: f32, max: f32 },
    PhaseChanged { phase: u8 },
    Died,
}

pub struct BossContext<'a, R: Rng + ?Sized> {
    pub transform: &'a mut Transform,
    pub target: Option<Vec3>,
    pub rng: &'a mut R,
}

#[derive(Component, Debug, Clone)]
pub struct BossBrain {
    pub tuning: BossTuning,
    arena_center: Vec3,
    max_health: f32,
    current_health: f32,
    phase: u8,
    base_move_speed: f32,
    move_speed: f32,
    base_cooldown: f32,
    cooldown: f32,
    original_damage: AttackDamage,
    damage: AttackDamage,
    original_burst: u32,
    burst: u32,
    can_attack: bool,
    /// Прошедшее время cooldown'а (None: не идёт)
    cooldown_elapsed: Option<f32>,
    dead: bool,
    target_in_area: bool,
    difficulty_applied: bool,
    current_attack: Option<BossAttack>,
    jump_landing: Vec3,
    jump_flight: f32,
    jump: Option<JumpArc>,
    sequencer: AttackSequencer<BossCue>,
    events: Vec<BossEvent>,
}

impl BossBrain {
    pub fn new(tuning: BossTuning, arena_center: Vec3) -> Self {
        let damage = AttackDamage {
            small_shot: tuning.small_shot_damage,
            big_shot: tuning.big_shot_damage,
            kick: tuning.kick_damage,
            jump: tuning.jump_damage,
        };
        Self {
            arena_center,
            max_health: tuning.max_health,
            current_health: tuning.max_health,
            phase: 1,
            base_move_speed: tuning.move_speed,
            move_speed: tuning.move_speed,
            base_cooldown: tuning.attack_cooldown,
            cooldown: tuning.attack_cooldown,
            original_damage: damage,
            damage,
            original_burst: tuning.small_shot_burst,
            burst: tuning.small_shot_burst,
            can_attack: true,
            cooldown_elapsed: None,
            dead: false,
            target_in_area: false,
            difficulty_applied: false,
            current_attack: None,
            jump_landing: arena_center,
            jump_flight: 0.0,
            jump: None,
            sequencer: AttackSequencer::new(),
            events: Vec::new(),
            tuning,
        }
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn phase(&self) -> u8 {
        self.phase
    }

    pub fn current_health(&self) -> f32 {
        self.current_health
    }

    pub fn max_health(&self) -> f32 {
        self.max_health
    }

    pub fn health_fraction(&self) -> f32 {
        if self.max_health <= 0.0 {
            return 0.0;
        }
        self.current_health / self.max_health
    }

    pub fn is_dead(&self) -> bool {
        self.dead
    }

    pub fn is_attacking(&self) -> bool {
        self.sequencer.is_running()
    }

    pub fn can_attack(&self) -> bool {
        self.can_attack
    }

    pub fn current_attack(&self) -> Option<BossAttack> {
        self.current_attack
    }

    pub fn attacks_started(&self) -> u32 {
        self.sequencer.started_count()
    }

    pub fn move_speed(&self) -> f32 {
        self.move_speed
    }

    pub fn attack_cooldown(&self) -> f32 {
        self.cooldown
    }

    pub fn damage(&self) -> AttackDamage {
        self.damage
    }

    pub fn original_damage(&self) -> AttackDamage {
        self.original_damage
    }

    pub fn small_shot_burst(&self) -> u32 {
        self.burst
    }

    pub fn arena_center(&self) -> Vec3 {
        self.arena_center
    }

    pub fn target_in_area(&self) -> bool {
        self.target_in_area
    }

    pub fn is_airborne(&self) -> bool {
        self.jump.is_some()
    }

    pub fn difficulty_applied(&self) -> bool {
        self.difficulty_applied
    }

    pub fn drain_events(&mut self) -> Vec<BossEvent> {
        std::mem::take(&mut self.events)
    }

    // ========================================================================
    // Tick
    // ========================================================================

    pub fn tick<R: Rng + ?Sized>(&mut self, delta: f32, ctx: &mut BossContext<'_, R>) -> Vec<BossEvent> {
        if self.dead {
            return self.drain_events();
        }

        let inside = ctx
            .target
            .is_some_and(|target| target.distance(self.arena_center) <= self.tuning.arena_radius);
        if inside != self.target_in_area {
            self.target_in_area = inside;
            self.events.push(BossEvent::AreaStatusChanged { inside });
        }

        let was_attacking = self.sequencer.is_running();

        if let (true, Some(target)) = (inside, ctx.target) {
            self.handle_combat(delta, target, ctx);
        }

        if was_attacking {
            if let Some(arc) = self.jump.as_mut() {
                ctx.transform.translation = arc.advance(delta);
            }
            let tick = self.sequencer.advance(delta);
            self.run_steps(tick, ctx);
        }

        self.step_cooldown(delta, ctx.transform.translation, ctx.target);
        self.stay_in_bounds(ctx.transform);

        self.drain_events()
    }

    fn handle_combat<R: Rng + ?Sized>(&mut self, delta: f32, target: Vec3, ctx: &mut BossContext<'_, R>) {
        if self.sequencer.is_running() {
            return;
        }

        let distance = ctx.transform.translation.distance(target);

        if distance > self.tuning.melee_range {
            self.move_towards(delta, target, ctx.transform);
        }

        // Melee проверяется первым и не смотрит на can_attack
        if distance <= self.tuning.melee_range {
            let attack = self.choose(distance, ctx);
            self.start_attack(attack, ctx);
            return;
        }

        if self.can_attack && distance <= self.tuning.detection_range {
            let attack = self.choose(distance, ctx);
            self.start_attack(attack, ctx);
        }
    }

    fn choose<R: Rng + ?Sized>(&self, distance: f32, ctx: &mut BossContext<'_, R>) -> BossAttack {
        let roll = ctx.rng.gen::<f32>();
        choose_attack(distance, self.phase, self.tuning.melee_range, self.tuning.shoot_range, roll)
    }

    fn move_towards(&self, delta: f32, target: Vec3, transform: &mut Transform) {
        let offset = target - transform.translation;
        let direction = Vec3::new(offset.x, 0.0, offset.z).normalize_or_zero();
        if direction == Vec3::ZERO {
            return;
        }
        transform.translation += direction * self.move_speed * delta;
        face_towards(transform, target, self.tuning.rotation_speed, delta);
    }

    /// Запуск конкретной атаки. Отклоняется, если босс мёртв, уже атакует или нет цели.
    pub fn start_attack<R: Rng + ?Sized>(&mut self, attack: BossAttack, ctx: &mut BossContext<'_, R>) -> bool {
        if self.dead || self.sequencer.is_running() {
            return false;
        }
        let Some(target) = ctx.target else {
            return false;
        };

        let timeline = self.timeline_for(attack, ctx.transform.translation, target);
        if let Err(err) = self.sequencer.start(timeline) {
            crate::log(&format!("🐸 Boss attack {} rejected: {}", attack.name(), err));
            return false;
        }

        self.can_attack = false;
        self.current_attack = Some(attack);
        self.events.push(BossEvent::AttackStarted(attack));
        crate::log(&format!("🐸 Boss attack: {} (phase {})", attack.name(), self.phase));

        let tick = self.sequencer.advance(0.0);
        self.run_steps(tick, ctx);
        true
    }

    fn timeline_for(&mut self, attack: BossAttack, position: Vec3, target: Vec3) -> AttackTimeline<BossCue> {
        match attack {
            // Размер очереди фиксируется в момент начала атаки
            BossAttack::SmallShot => small_shot_timeline(self.burst, self.tuning.small_shot_burst_delay),
            BossAttack::BigShot => big_shot_timeline(),
            BossAttack::Kick => kick_timeline(),
            BossAttack::Jump => {
                let landing = Vec3::new(target.x, position.y, target.z);
                self.jump_landing = landing;
                self.jump_flight = jump_flight_duration(
                    position.distance(landing),
                    self.tuning.min_jump_duration,
                    self.tuning.jump_duration,
                    self.tuning.shoot_range,
                );
                jump_timeline(self.jump_flight)
            }
        }
    }

    fn run_steps<R: Rng + ?Sized>(&mut self, tick: SequencerTick<BossCue>, ctx: &mut BossContext<'_, R>) {
        for cue in tick.actions {
            self.events.push(BossEvent::Cue(cue));
            self.run_cue(cue, ctx);
        }

        if tick.completed {
            if let Some(attack) = self.current_attack.take() {
                self.events.push(BossEvent::AttackFinished(attack));
            }
            // Cooldown стартует заново после каждой атаки
            self.cooldown_elapsed = Some(0.0);
        }
    }

    fn run_cue<R: Rng + ?Sized>(&mut self, cue: BossCue, ctx: &mut BossContext<'_, R>) {
        let position = ctx.transform.translation;
        match cue {
            BossCue::Face => {
                if let Some(target) = ctx.target {
                    snap_facing(ctx.transform, target);
                }
            }
            BossCue::FireSmall | BossCue::FireBig => {
                let Some(target) = ctx.target else {
                    return;
                };
                snap_facing(ctx.transform, target);
                let origin = position + Vec3::Y * self.tuning.muzzle_height;
                let aim = target + Vec3::Y * (TARGET_BODY_HEIGHT * 0.5);
                let direction = (aim - origin).normalize_or_zero();

                let event = if cue == BossCue::FireSmall {
                    BossEvent::Fire {
                        origin,
                        direction,
                        speed: self.tuning.small_shot_speed,
                        damage: self.damage.small_shot,
                        blast: None,
                    }
                } else {
                    BossEvent::Fire {
                        origin,
                        direction,
                        speed: self.tuning.big_shot_speed,
                        damage: self.damage.big_shot,
                        blast: Some(Blast {
                            radius: self.tuning.big_shot_radius,
                            knockback: self.tuning.big_shot_knockback,
                        }),
                    }
                };
                self.events.push(event);
            }
            BossCue::KickCheck => {
                let Some(target) = ctx.target else {
                    return;
                };
                if position.distance(target) <= self.tuning.kick_range {
                    let offset = target - position;
                    let push = Vec3::new(offset.x, 0.0, offset.z).normalize_or_zero() * self.tuning.kick_knockback;
                    self.events.push(BossEvent::Strike {
                        damage: self.damage.kick,
                        knockback: push,
                    });
                }
            }
            BossCue::Telegraph => {
                self.events.push(BossEvent::Telegraph {
                    center: self.jump_landing,
                    radius: self.tuning.jump_radius,
                    duration: self.tuning.jump_duration + JUMP_TAKEOFF,
                });
            }
            BossCue::Takeoff => {
                self.jump = Some(JumpArc::new(
                    position,
                    Vec3::new(self.jump_landing.x, position.y, self.jump_landing.z),
                    self.tuning.jump_height,
                    self.jump_flight,
                ));
            }
            BossCue::Land => {
                if let Some(arc) = self.jump.take() {
                    ctx.transform.translation = arc.landing;
                }
                let landed_at = ctx.transform.translation;
                if let Some(target) = ctx.target {
                    if landed_at.distance(target) <= self.tuning.jump_radius {
                        self.events.push(BossEvent::Strike {
                            damage: self.damage.jump,
                            knockback: Vec3::ZERO,
                        });
                    }
                }
            }
            BossCue::Windup | BossCue::KickWindup | BossCue::Recover => {}
        }
    }

    /// Cooldown: заканчивается по времени или сразу, если цель в melee
    pub(crate) fn step_cooldown(&mut self, delta: f32, position: Vec3, target: Option<Vec3>) {
        let Some(elapsed) = self.cooldown_elapsed else {
            return;
        };
        let in_melee = target.is_some_and(|target| position.distance(target) <= self.tuning.melee_range);
        if elapsed >= self.cooldown || in_melee {
            self.cooldown_elapsed = None;
            self.can_attack = true;
        } else {
            self.cooldown_elapsed = Some(elapsed + delta);
        }
    }

    /// Горизонтальный clamp к кругу арены, y не трогаем
    pub fn stay_in_bounds(&self, transform: &mut Transform) {
        let radius = self.tuning.arena_radius;
        let position = transform.translation;
        if planar_distance(position, self.arena_center) <= radius {
            return;
        }
        let offset = Vec3::new(position.x - self.arena_center.x, 0.0, position.z - self.arena_center.z);
        let clamped = self.arena_center + offset.normalize_or_zero() * radius;
        transform.translation = Vec3::new(clamped.x, position.y, clamped.z);
    }

    // ========================================================================
    // Damage / phases
    // ========================================================================

    /// Урон боссу. Фаза пересчитывается по доле здоровья (≤ порога).
    pub fn take_damage(&mut self, amount: f32) -> bool {
        if self.dead {
            return false;
        }

        self.current_health = (self.current_health - amount).max(0.0);
        self.events.push(BossEvent::HealthChanged {
            current: self.current_health,
            max: self.max_health,
        });

        let fraction = self.health_fraction();
        if fraction <= self.tuning.phase3_threshold && self.phase < 3 {
            self.enter_phase(3);
        } else if fraction <= self.tuning.phase2_threshold && self.phase < 2 {
            self.enter_phase(2);
        }

        if self.current_health <= 0.0 {
            self.die();
        }
        true
    }

    fn enter_phase(&mut self, phase: u8) {
        let modifiers = self.tuning.phase_modifiers(phase);
        self.phase = phase;
        self.move_speed = self.base_move_speed * modifiers.speed;
        self.cooldown = self.base_cooldown * modifiers.cooldown;
        self.damage = self.original_damage.scaled(modifiers.damage);
        self.burst = self.original_burst + modifiers.burst_bonus;

        self.events.push(BossEvent::PhaseChanged { phase });
        crate::log_info(&format!(
            "🐸 Boss phase {} (speed {:.2}, cooldown {:.2}, burst {})",
            phase, self.move_speed, self.cooldown, self.burst
        ));
    }

    fn die(&mut self) {
        self.dead = true;
        self.can_attack = false;
        self.cooldown_elapsed = None;
        self.jump = None;
        self.current_attack = None;
        let discarded = self.sequencer.cancel();
        if discarded > 0 {
            crate::log(&format!("🐸 Boss attack cancelled by death ({} steps discarded)", discarded));
        }
        self.events.push(BossEvent::Died);
    }

    // ========================================================================
    // Difficulty multipliers (boss scaler)
    // ========================================================================

    pub fn set_health_multiplier(&mut self, multiplier: f32) {
        self.max_health *= multiplier;
        self.current_health = self.max_health;
        self.events.push(BossEvent::HealthChanged {
            current: self.current_health,
            max: self.max_health,
        });
    }

    /// Масштабирует и оригинальный, и текущий урон
    pub fn set_damage_multiplier(&mut self, multiplier: f32) {
        self.original_damage = self.original_damage.scaled(multiplier);
        self.damage = self.damage.scaled(multiplier);
    }

    pub fn set_speed_multiplier(&mut self, multiplier: f32) {
        self.base_move_speed *= multiplier;
        self.move_speed *= multiplier;
    }

    pub fn set_cooldown_multiplier(&mut self, multiplier: f32) {
        self.base_cooldown *= multiplier;
        self.cooldown *= multiplier;
    }

    pub(crate) fn mark_difficulty_applied(&mut self) {
        self.difficulty_applied = true;
    }
}
