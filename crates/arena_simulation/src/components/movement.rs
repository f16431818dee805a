//! Movement компоненты: NavMover (path follower), Pursuit, facing helpers.
//!
//! NavMover: headless замена navmesh-агента. Поверхность (куда вообще можно
//! встать) отдаёт `NavSurface`, сам mover только едет к destination.

use bevy::prelude::*;

use crate::navigation::NavSurface;

/// Дистанция, на которой mover считает точку достигнутой (если stopping_distance меньше)
const ARRIVAL_EPSILON: f32 = 0.05;

/// Радиус привязки шага к поверхности
const SURFACE_SNAP_DISTANCE: f32 = 1.0;

/// Состояние path follower'а
#[derive(Debug, Clone, Copy, PartialEq, Eq, Reflect)]
pub enum MoverStatus {
    Idle,
    Moving,
    Arrived,
    Blocked,
}

/// Path follower (consumed collaborator)
///
/// Инвариант: `velocity == ZERO` после `halt()` до следующего `resume()`.
#[derive(Component, Debug, Clone, Reflect)]
#[reflect(Component)]
pub struct NavMover {
    pub speed: f32,
    pub acceleration: f32,
    pub auto_braking: bool,
    pub stopping_distance: f32,
    pub velocity: Vec3,
    pub is_stopped: bool,
    destination: Option<Vec3>,
    remaining_distance: f32,
    blocked: bool,
}

impl Default for NavMover {
    fn default() -> Self {
        Self::new(3.5, 8.0)
    }
}

impl NavMover {
    pub fn new(speed: f32, acceleration: f32) -> Self {
        Self {
            speed,
            acceleration,
            auto_braking: true,
            stopping_distance: 0.0,
            velocity: Vec3::ZERO,
            is_stopped: false,
            destination: None,
            remaining_distance: 0.0,
            blocked: false,
        }
    }

    /// Новая цель пути. `from`: текущая позиция (remaining distance считается сразу).
    pub fn set_destination(&mut self, from: Vec3, point: Vec3) -> bool {
        if !point.is_finite() {
            return false;
        }
        self.destination = Some(point);
        self.remaining_distance = planar_distance(from, point);
        self.blocked = false;
        true
    }

    pub fn destination(&self) -> Option<Vec3> {
        self.destination
    }

    pub fn has_path(&self) -> bool {
        self.destination.is_some()
    }

    pub fn remaining_distance(&self) -> f32 {
        self.remaining_distance
    }

    pub fn stop(&mut self) {
        self.is_stopped = true;
    }

    pub fn resume(&mut self) {
        self.is_stopped = false;
    }

    /// stop + обнуление скорости в том же тике
    pub fn halt(&mut self) {
        self.is_stopped = true;
        self.velocity = Vec3::ZERO;
    }

    pub fn reset_path(&mut self) {
        self.destination = None;
        self.remaining_distance = 0.0;
        self.blocked = false;
    }

    pub fn status(&self) -> MoverStatus {
        if self.blocked {
            MoverStatus::Blocked
        } else if self.is_stopped || self.destination.is_none() {
            MoverStatus::Idle
        } else if self.remaining_distance <= self.arrival_distance() {
            MoverStatus::Arrived
        } else {
            MoverStatus::Moving
        }
    }

    fn arrival_distance(&self) -> f32 {
        self.stopping_distance.max(ARRIVAL_EPSILON)
    }

    /// Один тик движения к destination по поверхности
    pub fn advance(&mut self, position: &mut Vec3, delta: f32, surface: &dyn NavSurface) {
        if self.is_stopped {
            self.velocity = Vec3::ZERO;
            return;
        }

        let Some(destination) = self.destination else {
            self.velocity = Vec3::ZERO;
            return;
        };

        let distance = planar_distance(*position, destination);
        self.remaining_distance = distance;
        if distance <= self.arrival_distance() {
            self.velocity = Vec3::ZERO;
            return;
        }

        let mut offset = destination - *position;
        offset.y = 0.0;
        let direction = offset / distance;

        let mut desired_speed = self.speed;
        if self.auto_braking && self.acceleration > 0.0 {
            desired_speed = desired_speed.min((2.0 * self.acceleration * distance).sqrt());
        }

        self.velocity = move_towards(self.velocity, direction * desired_speed, self.acceleration * delta);
        self.velocity.y = 0.0;

        let mut step = self.velocity * delta;
        if step.length() > distance {
            step = direction * distance;
        }

        let candidate = *position + step;
        match surface.sample_position(candidate, SURFACE_SNAP_DISTANCE) {
            Some(snapped) => {
                *position = snapped;
                self.blocked = false;
            }
            None => {
                // Край поверхности: стоим, статус Blocked
                self.velocity = Vec3::ZERO;
                self.blocked = true;
            }
        }

        self.remaining_distance = planar_distance(*position, destination);
    }
}

/// Цель преследования (инъекция вместо поиска по тегу)
///
/// `None` → агент заморожен (no-target).
#[derive(Component, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Pursuit {
    pub target: Option<Entity>,
}

impl Pursuit {
    pub fn new(target: Entity) -> Self {
        Self { target: Some(target) }
    }
}

pub fn planar_distance(a: Vec3, b: Vec3) -> f32 {
    Vec2::new(a.x - b.x, a.z - b.z).length()
}

pub fn move_towards(current: Vec3, target: Vec3, max_delta: f32) -> Vec3 {
    let delta = target - current;
    let length = delta.length();
    if length <= max_delta || length == 0.0 {
        target
    } else {
        current + delta / length * max_delta
    }
}

/// Поворот (yaw) так, чтобы forward (-Z) смотрел по горизонтали на `to`
pub fn yaw_towards(from: Vec3, to: Vec3) -> Option<Quat> {
    let mut direction = to - from;
    direction.y = 0.0;
    if direction.length_squared() <= 0.01 {
        return None;
    }
    Some(Quat::from_rotation_y(f32::atan2(-direction.x, -direction.z)))
}

/// Плавный поворот к точке (slerp со скоростью `rate`)
pub fn face_towards(transform: &mut Transform, point: Vec3, rate: f32, delta: f32) {
    if let Some(target) = yaw_towards(transform.translation, point) {
        let t = (rate * delta).clamp(0.0, 1.0);
        transform.rotation = transform.rotation.slerp(target, t);
    }
}

/// Мгновенный поворот к точке
pub fn snap_facing(transform: &mut Transform, point: Vec3) {
    if let Some(target) = yaw_towards(transform.translation, point) {
        transform.rotation = target;
    }
}

/// Горизонтальный forward
pub fn planar_forward(transform: &Transform) -> Vec3 {
    let forward = transform.rotation * Vec3::NEG_Z;
    Vec3::new(forward.x, 0.0, forward.z).normalize_or_zero()
}
