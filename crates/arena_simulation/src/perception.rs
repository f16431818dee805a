//! Perception (consumed collaborator): boolean line-of-sight query.
//!
//! Raycast engine вне симуляции. Здесь trait + две headless реализации:
//! открытое поле и набор сферических препятствий.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

/// Битовая маска слоёв, которые блокируют взгляд
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Reflect, Serialize, Deserialize)]
pub struct ObstructionMask(pub u32);

impl ObstructionMask {
    pub const NONE: Self = Self(0);
    pub const ALL: Self = Self(u32::MAX);
    pub const WORLD: Self = Self(1);

    pub fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }
}

impl Default for ObstructionMask {
    fn default() -> Self {
        Self::WORLD
    }
}

pub trait Perception: Send + Sync {
    fn has_line_of_sight(&self, from: Vec3, to: Vec3, mask: ObstructionMask) -> bool;
}

/// Ничего не загораживает
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenField;

impl Perception for OpenField {
    fn has_line_of_sight(&self, _from: Vec3, _to: Vec3, _mask: ObstructionMask) -> bool {
        true
    }
}

/// Сферическое препятствие на слое `layer`
#[derive(Debug, Clone, Copy)]
pub struct Occluder {
    pub center: Vec3,
    pub radius: f32,
    pub layer: ObstructionMask,
}

/// Набор препятствий: LOS есть, если отрезок не пересекает ни одно из них
#[derive(Debug, Clone, Default)]
pub struct OccluderSet {
    pub occluders: Vec<Occluder>,
}

impl OccluderSet {
    pub fn with(mut self, center: Vec3, radius: f32) -> Self {
        self.occluders.push(Occluder {
            center,
            radius,
            layer: ObstructionMask::WORLD,
        });
        self
    }
}

impl Perception for OccluderSet {
    fn has_line_of_sight(&self, from: Vec3, to: Vec3, mask: ObstructionMask) -> bool {
        !self
            .occluders
            .iter()
            .filter(|occluder| occluder.layer.intersects(mask))
            .any(|occluder| segment_point_distance(from, to, occluder.center) <= occluder.radius)
    }
}

/// Расстояние от точки до отрезка [a, b]
pub fn segment_point_distance(a: Vec3, b: Vec3, point: Vec3) -> f32 {
    let ab = b - a;
    let length_squared = ab.length_squared();
    if length_squared <= f32::EPSILON {
        return point.distance(a);
    }
    let t = ((point - a).dot(ab) / length_squared).clamp(0.0, 1.0);
    point.distance(a + ab * t)
}

/// Resource: LOS oracle текущего уровня
#[derive(Resource)]
pub struct PerceptionOracle(pub Box<dyn Perception>);

impl Default for PerceptionOracle {
    fn default() -> Self {
        Self(Box::new(OpenField))
    }
}

impl PerceptionOracle {
    pub fn new(perception: impl Perception + 'static) -> Self {
        Self(Box::new(perception))
    }

    pub fn perception(&self) -> &dyn Perception {
        self.0.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_field_always_sees() {
        assert!(OpenField.has_line_of_sight(Vec3::ZERO, Vec3::splat(100.0), ObstructionMask::ALL));
    }

    #[test]
    fn test_occluder_blocks_segment() {
        let world = OccluderSet::default().with(Vec3::new(5.0, 1.0, 0.0), 1.0);
        let eye = Vec3::new(0.0, 1.0, 0.0);
        assert!(!world.has_line_of_sight(eye, Vec3::new(10.0, 1.0, 0.0), ObstructionMask::WORLD));
        assert!(world.has_line_of_sight(eye, Vec3::new(0.0, 1.0, 10.0), ObstructionMask::WORLD));
    }

    #[test]
    fn test_mask_filters_layers() {
        let world = OccluderSet::default().with(Vec3::new(5.0, 1.0, 0.0), 1.0);
        let eye = Vec3::new(0.0, 1.0, 0.0);
        assert!(world.has_line_of_sight(eye, Vec3::new(10.0, 1.0, 0.0), ObstructionMask::NONE));
    }

    #[test]
    fn test_segment_point_distance_clamps_to_ends() {
        let d = segment_point_distance(Vec3::ZERO, Vec3::X, Vec3::new(3.0, 0.0, 0.0));
        assert!((d - 2.0).abs() < 1e-6);
    }
}
