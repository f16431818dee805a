//! Летающий враг: кружит по waypoint'ам, затем rush к цели и залп снарядами.
//!
//! Цикл: Circling (circle_duration, паузы на waypoint'ах не считаются) →
//! если цель в attack_range и видна: Rushing до attack_distance → Volley
//! (taunt + shots) → снова Circling.

use bevy::prelude::*;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::combat::scale_damage;
use crate::components::{face_towards, yaw_towards};
use crate::perception::{ObstructionMask, Perception};
use crate::sequencer::{AttackSequencer, AttackTimeline};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlyerTuning {
    pub move_speed: f32,
    pub attack_move_speed: f32,
    pub rotation_speed: f32,
    pub facing_speed: f32,
    pub circle_duration: f32,
    pub min_pause: f32,
    pub max_pause: f32,
    pub patrol_length: f32,
    pub patrol_width: f32,
    pub patrol_height: f32,
    pub patrol_points: usize,
    pub waypoint_threshold: f32,
    pub attack_range: f32,
    pub attack_distance: f32,
    pub shots: u32,
    pub shoot_interval: f32,
    pub taunt_duration: f32,
    /// Задержка между анимацией выстрела и самим выстрелом
    pub fire_lead: f32,
    pub projectile_speed: f32,
    pub projectile_damage: u32,
    pub predictive_aim: bool,
    pub prediction_accuracy: f32,
    pub max_prediction_time: f32,
    pub aim_inaccuracy_degrees: f32,
    pub hit_stun_duration: f32,
    pub knockback_force: f32,
    pub knockback_duration: f32,
    pub obstruction_mask: ObstructionMask,
    pub destroy_delay: f32,
}

impl Default for FlyerTuning {
    fn default() -> Self {
        Self {
            move_speed: 10.0,
            attack_move_speed: 20.0,
            rotation_speed: 7.5,
            facing_speed: 15.0,
            circle_duration: 10.0,
            min_pause: 1.0,
            max_pause: 2.0,
            patrol_length: 50.0,
            patrol_width: 50.0,
            patrol_height: 20.0,
            patrol_points: 50,
            waypoint_threshold: 1.0,
            attack_range: 50.0,
            attack_distance: 10.0,
            shots: 5,
            shoot_interval: 0.5,
            taunt_duration: 1.5,
            fire_lead: 0.1,
            projectile_speed: 60.0,
            projectile_damage: 25,
            predictive_aim: true,
            prediction_accuracy: 0.7,
            max_prediction_time: 2.0,
            aim_inaccuracy_degrees: 5.0,
            hit_stun_duration: 0.3,
            knockback_force: 2.0,
            knockback_duration: 0.2,
            obstruction_mask: ObstructionMask::WORLD,
            destroy_delay: 2.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlyerCue {
    Taunt,
    Fire,
    Done,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FlyerMode {
    Circling { elapsed: f32, pause: Option<f32> },
    Rushing,
    Volley,
}

impl FlyerMode {
    fn circling() -> Self {
        Self::Circling {
            elapsed: 0.0,
            pause: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FlyerEvent {
    RushStarted,
    Taunt,
    Shot {
        origin: Vec3,
        direction: Vec3,
        speed: f32,
        damage: u32,
    },
    VolleyFinished,
    Stunned,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct FlyerStun {
    elapsed: f32,
    from: Vec3,
    to: Vec3,
}

pub struct FlyerContext<'a, R: Rng + ?Sized> {
    pub transform: &'a mut Transform,
    pub target: Option<Vec3>,
    pub target_velocity: Vec3,
    pub perception: &'a dyn Perception,
    pub rng: &'a mut R,
}

#[derive(Component, Debug, Clone)]
pub struct FlyerBrain {
    pub tuning: FlyerTuning,
    pub damage_multiplier: f32,
    home: Vec3,
    waypoints: Vec<Vec3>,
    waypoint: Option<Vec3>,
    mode: FlyerMode,
    attack_mode: bool,
    stun: Option<FlyerStun>,
    dead: bool,
    sequencer: AttackSequencer<FlyerCue>,
    events: Vec<FlyerEvent>,
}

impl FlyerBrain {
    pub fn new(tuning: FlyerTuning, home: Vec3) -> Self {
        Self {
            tuning,
            damage_multiplier: 1.0,
            home,
            waypoints: Vec::new(),
            waypoint: None,
            mode: FlyerMode::circling(),
            attack_mode: false,
            stun: None,
            dead: false,
            sequencer: AttackSequencer::new(),
            events: Vec::new(),
        }
    }

    pub fn mode(&self) -> FlyerMode {
        self.mode
    }

    pub fn in_attack_mode(&self) -> bool {
        self.attack_mode
    }

    pub fn is_stunned(&self) -> bool {
        self.stun.is_some()
    }

    pub fn is_dead(&self) -> bool {
        self.dead
    }

    pub fn waypoints(&self) -> &[Vec3] {
        &self.waypoints
    }

    pub fn shot_damage(&self) -> u32 {
        scale_damage(self.tuning.projectile_damage, self.damage_multiplier)
    }

    /// Таймлайн залпа: taunt, затем `shots` выстрелов
    pub fn volley_timeline(&self) -> AttackTimeline<FlyerCue> {
        let tuning = &self.tuning;
        let mut timeline = AttackTimeline::new().then(0.0, FlyerCue::Taunt);
        if tuning.shots == 0 {
            return timeline.then(tuning.taunt_duration, FlyerCue::Done);
        }
        for shot in 0..tuning.shots {
            let wait = if shot == 0 {
                tuning.taunt_duration + tuning.fire_lead
            } else {
                tuning.shoot_interval + tuning.fire_lead
            };
            timeline.push(wait, FlyerCue::Fire);
        }
        timeline.then(0.0, FlyerCue::Done)
    }

    pub fn tick<R: Rng + ?Sized>(&mut self, delta: f32, ctx: &mut FlyerContext<'_, R>) -> Vec<FlyerEvent> {
        if self.dead {
            return std::mem::take(&mut self.events);
        }
        let Some(target) = ctx.target else {
            return std::mem::take(&mut self.events);
        };

        if self.waypoints.is_empty() && self.tuning.patrol_points > 0 {
            self.generate_waypoints(&mut *ctx.rng);
        }
        if self.waypoint.is_none() {
            self.pick_waypoint(&mut *ctx.rng);
        }

        if let Some(mut stun) = self.stun {
            stun.elapsed += delta;
            let duration = self.tuning.knockback_duration;
            if duration > 0.0 && stun.elapsed < duration {
                let t = stun.elapsed / duration;
                let eased = 1.0 - (1.0 - t) * (1.0 - t);
                ctx.transform.translation = stun.from.lerp(stun.to, eased);
            } else {
                ctx.transform.translation = stun.to;
            }
            self.stun = (stun.elapsed < self.tuning.hit_stun_duration).then_some(stun);
            return std::mem::take(&mut self.events);
        }

        if self.attack_mode {
            face_towards(ctx.transform, target, self.tuning.facing_speed, delta);
        }

        match self.mode {
            FlyerMode::Circling { elapsed, pause } => self.circle(delta, elapsed, pause, target, ctx),
            FlyerMode::Rushing => self.rush(delta, target, ctx),
            FlyerMode::Volley => {
                let tick = self.sequencer.advance(delta);
                for cue in tick.actions {
                    self.run_cue(cue, target, ctx);
                }
            }
        }

        std::mem::take(&mut self.events)
    }

    fn circle<R: Rng + ?Sized>(
        &mut self,
        delta: f32,
        mut elapsed: f32,
        mut pause: Option<f32>,
        target: Vec3,
        ctx: &mut FlyerContext<'_, R>,
    ) {
        if let Some(remaining) = pause {
            let remaining = remaining - delta;
            if remaining <= 0.0 {
                pause = None;
                self.pick_waypoint(&mut *ctx.rng);
            } else {
                pause = Some(remaining);
            }
        } else {
            elapsed += delta;
            let waypoint = self.waypoint.unwrap_or(self.home);
            fly_towards(ctx.transform, waypoint, self.tuning.move_speed, self.tuning.rotation_speed, delta);

            let threshold = self.tuning.waypoint_threshold;
            if ctx.transform.translation.distance_squared(waypoint) < threshold * threshold {
                pause = Some(sample_range(&mut *ctx.rng, self.tuning.min_pause, self.tuning.max_pause));
            }
        }

        if elapsed >= self.tuning.circle_duration {
            if self.can_attack(ctx, target) {
                self.mode = FlyerMode::Rushing;
                self.attack_mode = true;
                self.events.push(FlyerEvent::RushStarted);
            } else {
                self.mode = FlyerMode::circling();
            }
            return;
        }

        self.mode = FlyerMode::Circling { elapsed, pause };
    }

    fn rush<R: Rng + ?Sized>(&mut self, delta: f32, target: Vec3, ctx: &mut FlyerContext<'_, R>) {
        let distance = self.tuning.attack_distance;
        if ctx.transform.translation.distance_squared(target) > distance * distance {
            let position = ctx.transform.translation;
            let step = (target - position).normalize_or_zero() * self.tuning.attack_move_speed * delta;
            ctx.transform.translation = position + step;
            return;
        }

        if let Err(err) = self.sequencer.start(self.volley_timeline()) {
            crate::log(&format!("🛸 Volley rejected: {}", err));
            return;
        }
        self.mode = FlyerMode::Volley;
        let tick = self.sequencer.advance(0.0);
        for cue in tick.actions {
            self.run_cue(cue, target, ctx);
        }
    }

    fn run_cue<R: Rng + ?Sized>(&mut self, cue: FlyerCue, target: Vec3, ctx: &mut FlyerContext<'_, R>) {
        match cue {
            FlyerCue::Taunt => self.events.push(FlyerEvent::Taunt),
            FlyerCue::Fire => {
                let origin = ctx.transform.translation;
                let direction = self.aim_direction(origin, target, ctx.target_velocity, &mut *ctx.rng);
                self.events.push(FlyerEvent::Shot {
                    origin,
                    direction,
                    speed: self.tuning.projectile_speed,
                    damage: self.shot_damage(),
                });
            }
            FlyerCue::Done => {
                self.mode = FlyerMode::circling();
                self.attack_mode = false;
                self.events.push(FlyerEvent::VolleyFinished);
            }
        }
    }

    /// Направление выстрела: упреждение по скорости цели + разброс
    pub fn aim_direction<R: Rng + ?Sized>(&self, origin: Vec3, target: Vec3, target_velocity: Vec3, rng: &mut R) -> Vec3 {
        let tuning = &self.tuning;
        let mut aim = target;
        if tuning.predictive_aim && tuning.projectile_speed > 0.0 {
            let lead = (origin.distance(target) / tuning.projectile_speed).min(tuning.max_prediction_time);
            let predicted = target + target_velocity * lead;
            aim = target.lerp(predicted, tuning.prediction_accuracy);
        }

        let direction = (aim - origin).normalize_or_zero();
        let spread = tuning.aim_inaccuracy_degrees.to_radians();
        if spread <= 0.0 {
            return direction;
        }
        let pitch = rng.gen_range(-spread..=spread);
        let yaw = rng.gen_range(-spread..=spread);
        Quat::from_rotation_y(yaw) * Quat::from_rotation_x(pitch) * direction
    }

    fn can_attack<R: Rng + ?Sized>(&self, ctx: &FlyerContext<'_, R>, target: Vec3) -> bool {
        let position = ctx.transform.translation;
        let range = self.tuning.attack_range;
        position.distance_squared(target) <= range * range
            && ctx
                .perception
                .has_line_of_sight(position, target, self.tuning.obstruction_mask)
    }

    fn generate_waypoints<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let half_length = self.tuning.patrol_length * 0.5;
        let half_width = self.tuning.patrol_width * 0.5;
        let height = self.tuning.patrol_height.max(0.0);
        self.waypoints = (0..self.tuning.patrol_points)
            .map(|_| {
                self.home
                    + Vec3::new(
                        sample_range(rng, -half_length, half_length),
                        sample_range(rng, 0.0, height),
                        sample_range(rng, -half_width, half_width),
                    )
            })
            .collect();
    }

    fn pick_waypoint<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.waypoint = if self.waypoints.is_empty() {
            Some(self.home)
        } else {
            Some(self.waypoints[rng.gen_range(0..self.waypoints.len())])
        };
    }

    /// Оглушение + отброс назад. Игнорируется в attack mode.
    pub fn trigger_hit_reaction(&mut self, transform: &Transform) -> bool {
        if self.dead || self.attack_mode {
            return false;
        }
        let from = transform.translation;
        let backward = -(transform.rotation * Vec3::NEG_Z).normalize_or_zero();
        self.stun = Some(FlyerStun {
            elapsed: 0.0,
            from,
            to: from + backward * self.tuning.knockback_force,
        });
        self.mode = FlyerMode::circling();
        self.events.push(FlyerEvent::Stunned);
        true
    }

    pub fn trigger_death(&mut self) -> bool {
        if self.dead {
            return false;
        }
        self.dead = true;
        self.stun = None;
        self.attack_mode = false;
        self.sequencer.cancel();
        true
    }
}

fn sample_range<R: Rng + ?Sized>(rng: &mut R, low: f32, high: f32) -> f32 {
    if high - low <= f32::EPSILON {
        return low;
    }
    rng.gen_range(low..=high)
}

/// Полёт к точке без перелёта + поворот по направлению движения
fn fly_towards(transform: &mut Transform, point: Vec3, speed: f32, rotation_speed: f32, delta: f32) {
    let offset = point - transform.translation;
    let distance = offset.length();
    if distance <= f32::EPSILON {
        return;
    }
    let step = (speed * delta).min(distance);
    transform.translation += offset / distance * step;

    if let Some(rotation) = yaw_towards(Vec3::ZERO, offset) {
        let t = (rotation_speed * delta).clamp(0.0, 1.0);
        transform.rotation = transform.rotation.slerp(rotation, t);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::perception::OpenField;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    const DT: f32 = 1.0 / 60.0;

    fn run(
        brain: &mut FlyerBrain,
        transform: &mut Transform,
        rng: &mut ChaCha8Rng,
        target: Vec3,
        ticks: usize,
    ) -> Vec<FlyerEvent> {
        let mut events = Vec::new();
        for _ in 0..ticks {
            let mut ctx = FlyerContext {
                transform: &mut *transform,
                target: Some(target),
                target_velocity: Vec3::ZERO,
                perception: &OpenField,
                rng: &mut *rng,
            };
            events.extend(brain.tick(DT, &mut ctx));
        }
        events
    }

    fn short_circle() -> FlyerTuning {
        FlyerTuning {
            circle_duration: 0.5,
            min_pause: 0.0,
            max_pause: 0.05,
            patrol_length: 4.0,
            patrol_width: 4.0,
            patrol_height: 2.0,
            aim_inaccuracy_degrees: 0.0,
            ..FlyerTuning::default()
        }
    }

    #[test]
    fn test_volley_timeline_shape() {
        let brain = FlyerBrain::new(FlyerTuning::default(), Vec3::ZERO);
        let timeline = brain.volley_timeline();
        let fires = timeline
            .steps()
            .iter()
            .filter(|step| step.action == FlyerCue::Fire)
            .count();
        assert_eq!(fires, 5);
        // первый выстрел: taunt 1.5 + lead 0.1
        assert!((timeline.offset_of(1).unwrap() - 1.6).abs() < 1e-5);
        // 1.6 + 4 * 0.6
        assert!((timeline.duration() - 4.0).abs() < 1e-4);
    }

    #[test]
    fn test_waypoints_inside_patrol_box() {
        let home = Vec3::new(0.0, 10.0, 0.0);
        let mut brain = FlyerBrain::new(FlyerTuning::default(), home);
        let mut transform = Transform::from_translation(home);
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        run(&mut brain, &mut transform, &mut rng, Vec3::new(500.0, 0.0, 0.0), 1);

        assert_eq!(brain.waypoints().len(), 50);
        for point in brain.waypoints() {
            assert!((point.x - home.x).abs() <= 25.0);
            assert!((point.z - home.z).abs() <= 25.0);
            assert!(point.y >= home.y && point.y <= home.y + 20.0);
        }
    }

    #[test]
    fn test_circle_then_rush_then_volley() {
        let home = Vec3::new(0.0, 10.0, 0.0);
        let mut brain = FlyerBrain::new(short_circle(), home);
        let mut transform = Transform::from_translation(home);
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let target = Vec3::new(0.0, 0.0, -30.0);

        let events = run(&mut brain, &mut transform, &mut rng, target, 900);

        assert!(events.contains(&FlyerEvent::RushStarted));
        assert!(events.contains(&FlyerEvent::Taunt));
        let shots = events
            .iter()
            .filter(|event| matches!(event, FlyerEvent::Shot { .. }))
            .count();
        assert!(shots >= 5, "shots = {}", shots);
        assert!(events.contains(&FlyerEvent::VolleyFinished));
    }

    #[test]
    fn test_target_out_of_range_keeps_circling() {
        let home = Vec3::new(0.0, 10.0, 0.0);
        let mut brain = FlyerBrain::new(short_circle(), home);
        let mut transform = Transform::from_translation(home);
        let mut rng = ChaCha8Rng::seed_from_u64(9);

        let events = run(&mut brain, &mut transform, &mut rng, Vec3::new(0.0, 0.0, -500.0), 300);
        assert!(events.is_empty());
        assert!(matches!(brain.mode(), FlyerMode::Circling { .. }));
    }

    #[test]
    fn test_hit_reaction_ignored_in_attack_mode() {
        let home = Vec3::new(0.0, 10.0, 0.0);
        let mut brain = FlyerBrain::new(short_circle(), home);
        let mut transform = Transform::from_translation(home);
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let target = Vec3::new(0.0, 0.0, -30.0);

        // до rush: реагирует
        assert!(brain.trigger_hit_reaction(&transform));
        run(&mut brain, &mut transform, &mut rng, target, 30);
        assert!(!brain.is_stunned());

        let events = run(&mut brain, &mut transform, &mut rng, target, 60);
        assert!(events.contains(&FlyerEvent::RushStarted));
        assert!(brain.in_attack_mode());
        assert!(!brain.trigger_hit_reaction(&transform));
    }

    #[test]
    fn test_stun_knocks_back() {
        let home = Vec3::new(0.0, 10.0, 0.0);
        let mut brain = FlyerBrain::new(FlyerTuning::default(), home);
        let mut transform = Transform::from_translation(home);
        let mut rng = ChaCha8Rng::seed_from_u64(1);

        assert!(brain.trigger_hit_reaction(&transform));
        // forward = -Z → отброс в +Z на 2 метра за 0.2 сек
        run(&mut brain, &mut transform, &mut rng, Vec3::new(0.0, 0.0, -100.0), 13);
        assert!((transform.translation - Vec3::new(0.0, 10.0, 2.0)).length() < 1e-4);
    }

    #[test]
    fn test_predictive_aim_leads_moving_target() {
        let tuning = FlyerTuning {
            aim_inaccuracy_degrees: 0.0,
            ..FlyerTuning::default()
        };
        let brain = FlyerBrain::new(tuning, Vec3::ZERO);
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let direction = brain.aim_direction(Vec3::ZERO, Vec3::new(0.0, 0.0, -60.0), Vec3::new(10.0, 0.0, 0.0), &mut rng);
        // lead = 60 / 60 = 1 сек, точность 0.7 → aim x = 7
        let expected = Vec3::new(7.0, 0.0, -60.0).normalize();
        assert!((direction - expected).length() < 1e-5);
    }

    #[test]
    fn test_death_is_final() {
        let mut brain = FlyerBrain::new(FlyerTuning::default(), Vec3::ZERO);
        assert!(brain.trigger_death());
        assert!(!brain.trigger_death());
        assert!(!brain.trigger_hit_reaction(&Transform::default()));
    }
}
