use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Axis-aligned bounding box used for collision gating and mesh bounds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Default for Aabb {
    fn default() -> Self {
        Self::empty()
    }
}

impl Aabb {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Inverted box that any `extend` call will overwrite.
    pub fn empty() -> Self {
        Self {
            min: Vec3::splat(f32::INFINITY),
            max: Vec3::splat(f32::NEG_INFINITY),
        }
    }

    pub fn from_center_half_extents(center: Vec3, half_extents: Vec3) -> Self {
        Self::new(center - half_extents, center + half_extents)
    }

    pub fn extend(&mut self, point: Vec3) {
        self.min = self.min.min(point);
        self.max = self.max.max(point);
    }

    pub fn from_points(points: &[Vec3]) -> Self {
        let mut bounds = Self::empty();
        for &p in points {
            bounds.extend(p);
        }
        bounds
    }

    pub fn is_empty(&self) -> bool {
        self.min.cmpgt(self.max).any()
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Half extents.
    pub fn extent(&self) -> Vec3 {
        (self.max - self.min) * 0.5
    }

    /// Grown by `margin` on every side.
    pub fn expanded(&self, margin: f32) -> Self {
        Self::new(self.min - Vec3::splat(margin), self.max + Vec3::splat(margin))
    }

    /// Inclusive containment test.
    pub fn contains(&self, point: Vec3) -> bool {
        point.cmpge(self.min).all() && point.cmple(self.max).all()
    }

    pub fn intersects(&self, other: &Aabb) -> bool {
        self.min.cmple(other.max).all() && other.min.cmple(self.max).all()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_box_grows_to_fit_points() {
        let bounds = Aabb::from_points(&[Vec3::new(1.0, -2.0, 0.5), Vec3::new(-1.0, 2.0, 0.0)]);
        assert_eq!(bounds.min, Vec3::new(-1.0, -2.0, 0.0));
        assert_eq!(bounds.max, Vec3::new(1.0, 2.0, 0.5));
        assert!(Aabb::empty().is_empty());
        assert!(!bounds.is_empty());
    }

    #[test]
    fn containment_is_inclusive() {
        let bounds = Aabb::from_center_half_extents(Vec3::ZERO, Vec3::ONE);
        assert!(bounds.contains(Vec3::new(1.0, 1.0, -1.0)));
        assert!(!bounds.contains(Vec3::new(1.01, 0.0, 0.0)));
        assert!(bounds.expanded(0.1).contains(Vec3::new(1.05, 0.0, 0.0)));
    }

    #[test]
    fn touching_boxes_intersect() {
        let a = Aabb::new(Vec3::ZERO, Vec3::ONE);
        let b = Aabb::new(Vec3::ONE, Vec3::splat(2.0));
        let c = Aabb::new(Vec3::splat(1.5), Vec3::splat(2.0));
        assert!(a.intersects(&b));
        assert!(!a.intersects(&c));
    }
}
