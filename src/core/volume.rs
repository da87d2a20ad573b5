//! Static and kinematic collision volumes the lattice can rest on.
//!
//! A volume is a sphere or an oriented box with surface material values. It
//! may be moved between ticks (the displacement is carried into contacts as
//! surface motion) and may carry mass, in which case contacts push back on it.

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use super::types::Aabb;
use crate::utils::math::direction;

/// Geometry of a collision volume in its local frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum CollisionShape {
    Sphere { radius: f32 },
    Box { half_extents: Vec3, rotation: Quat },
}

/// Penetration of a point into a volume.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VolumeContact {
    /// Outward unit normal of the nearest boundary.
    pub normal: Vec3,
    /// Distance to that boundary.
    pub depth: f32,
    /// Closest boundary point.
    pub boundary_point: Vec3,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollisionVolume {
    pub shape: CollisionShape,
    pub center: Vec3,
    /// Coulomb-like friction coefficient in [0, 1].
    pub friction: f32,
    /// Surface restitution in [0, 1].
    pub bounciness: f32,
    /// Sticking volumes hold contacts along their approach direction.
    pub sticking: bool,
    /// `None` for immovable volumes.
    pub mass: Option<f32>,
    pub velocity: Vec3,
    delta: Vec3,
    impulse: Vec3,
}

impl CollisionVolume {
    pub fn builder() -> CollisionVolumeBuilder {
        CollisionVolumeBuilder::new()
    }

    pub fn sphere(center: Vec3, radius: f32) -> Self {
        Self::builder().center(center).sphere(radius).build()
    }

    pub fn cuboid(center: Vec3, half_extents: Vec3) -> Self {
        Self::builder().center(center).box_shape(half_extents).build()
    }

    /// Displacement since the last committed tick.
    pub fn delta(&self) -> Vec3 {
        self.delta
    }

    pub fn is_massive(&self) -> bool {
        self.mass.is_some_and(|m| m > 0.0)
    }

    /// Moves the volume, remembering the motion as surface displacement.
    pub fn move_to(&mut self, center: Vec3) {
        self.delta += center - self.center;
        self.center = center;
    }

    pub fn translate(&mut self, offset: Vec3) {
        self.move_to(self.center + offset);
    }

    /// Clears the accumulated displacement once a tick has consumed it.
    pub fn end_tick(&mut self) {
        self.delta = Vec3::ZERO;
    }

    /// Pushes a massive volume. Immovable volumes ignore impulses.
    pub fn apply_impulse(&mut self, impulse: Vec3) {
        if let Some(mass) = self.mass.filter(|m| *m > 0.0) {
            self.impulse += impulse;
            self.velocity += impulse / mass;
        }
    }

    /// Impulse received from contacts since the last call.
    pub fn take_impulse(&mut self) -> Vec3 {
        std::mem::take(&mut self.impulse)
    }

    /// Advances a massive volume by its velocity.
    pub fn integrate(&mut self, dt: f32) {
        if self.is_massive() && self.velocity != Vec3::ZERO {
            self.translate(self.velocity * dt);
        }
    }

    pub fn bounds(&self) -> Aabb {
        match self.shape {
            CollisionShape::Sphere { radius } => {
                Aabb::from_center_half_extents(self.center, Vec3::splat(radius))
            }
            CollisionShape::Box {
                half_extents,
                rotation,
            } => {
                let basis = glam::Mat3::from_quat(rotation);
                let extent = basis.x_axis.abs() * half_extents.x
                    + basis.y_axis.abs() * half_extents.y
                    + basis.z_axis.abs() * half_extents.z;
                Aabb::from_center_half_extents(self.center, extent)
            }
        }
    }

    /// Contact data when `point` lies inside or on the volume.
    pub fn contact(&self, point: Vec3) -> Option<VolumeContact> {
        match self.shape {
            CollisionShape::Sphere { radius } => {
                let offset = point - self.center;
                let distance = offset.length();
                if distance > radius {
                    return None;
                }
                let normal = direction(offset).unwrap_or(Vec3::Y);
                Some(VolumeContact {
                    normal,
                    depth: radius - distance,
                    boundary_point: self.center + normal * radius,
                })
            }
            CollisionShape::Box {
                half_extents,
                rotation,
            } => {
                let local = rotation.inverse() * (point - self.center);
                if local.abs().cmpgt(half_extents).any() {
                    return None;
                }

                let penetration = half_extents - local.abs();
                let mut axis = 0;
                for candidate in 1..3 {
                    if penetration[candidate] < penetration[axis] {
                        axis = candidate;
                    }
                }

                let sign = if local[axis] < 0.0 { -1.0 } else { 1.0 };
                let mut normal_local = Vec3::ZERO;
                normal_local[axis] = sign;
                let mut boundary_local = local;
                boundary_local[axis] = sign * half_extents[axis];

                Some(VolumeContact {
                    normal: rotation * normal_local,
                    depth: penetration[axis],
                    boundary_point: self.center + rotation * boundary_local,
                })
            }
        }
    }

    /// Outward normal of the face or direction `point` sees, inside or out.
    pub fn outward_normal(&self, point: Vec3) -> Vec3 {
        match self.shape {
            CollisionShape::Sphere { .. } => direction(point - self.center).unwrap_or(Vec3::Y),
            CollisionShape::Box {
                half_extents,
                rotation,
            } => {
                let local = rotation.inverse() * (point - self.center);
                let scaled = local.abs() / half_extents.max(Vec3::splat(f32::EPSILON));
                let mut axis = 0;
                for candidate in 1..3 {
                    if scaled[candidate] > scaled[axis] {
                        axis = candidate;
                    }
                }
                let mut normal_local = Vec3::ZERO;
                normal_local[axis] = if local[axis] < 0.0 { -1.0 } else { 1.0 };
                rotation * normal_local
            }
        }
    }

    /// Moves an inside `point` along `normal` until it leaves the volume.
    pub fn push_out_along(&self, point: Vec3, normal: Vec3) -> Vec3 {
        let Some(n) = direction(normal) else {
            return point;
        };
        let exit = match self.shape {
            CollisionShape::Sphere { radius } => {
                let offset = point - self.center;
                let b = offset.dot(n);
                let c = offset.length_squared() - radius * radius;
                let disc = b * b - c;
                if disc < 0.0 {
                    0.0
                } else {
                    -b + disc.sqrt()
                }
            }
            CollisionShape::Box {
                half_extents,
                rotation,
            } => {
                let inverse = rotation.inverse();
                let local = inverse * (point - self.center);
                let dir = inverse * n;
                let mut exit = f32::INFINITY;
                for axis in 0..3 {
                    if dir[axis].abs() > f32::EPSILON {
                        let bound = half_extents[axis] * dir[axis].signum();
                        exit = exit.min((bound - local[axis]) / dir[axis]);
                    }
                }
                if exit.is_finite() {
                    exit
                } else {
                    0.0
                }
            }
        };
        point + n * exit.max(0.0)
    }
}

/// Builder for [`CollisionVolume`].
pub struct CollisionVolumeBuilder {
    shape: CollisionShape,
    center: Vec3,
    friction: f32,
    bounciness: f32,
    sticking: bool,
    mass: Option<f32>,
}

impl Default for CollisionVolumeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl CollisionVolumeBuilder {
    pub fn new() -> Self {
        Self {
            shape: CollisionShape::Sphere { radius: 1.0 },
            center: Vec3::ZERO,
            friction: 0.5,
            bounciness: 0.0,
            sticking: false,
            mass: None,
        }
    }

    pub fn sphere(mut self, radius: f32) -> Self {
        self.shape = CollisionShape::Sphere { radius };
        self
    }

    pub fn box_shape(mut self, half_extents: Vec3) -> Self {
        self.shape = CollisionShape::Box {
            half_extents,
            rotation: Quat::IDENTITY,
        };
        self
    }

    /// Orientation of a box. Ignored for spheres.
    pub fn rotation(mut self, rotation: Quat) -> Self {
        if let CollisionShape::Box { half_extents, .. } = self.shape {
            self.shape = CollisionShape::Box {
                half_extents,
                rotation: rotation.normalize(),
            };
        }
        self
    }

    pub fn center(mut self, center: Vec3) -> Self {
        self.center = center;
        self
    }

    pub fn friction(mut self, friction: f32) -> Self {
        self.friction = friction.clamp(0.0, 1.0);
        self
    }

    pub fn bounciness(mut self, bounciness: f32) -> Self {
        self.bounciness = bounciness.clamp(0.0, 1.0);
        self
    }

    pub fn sticking(mut self, sticking: bool) -> Self {
        self.sticking = sticking;
        self
    }

    pub fn mass(mut self, mass: f32) -> Self {
        self.mass = Some(mass);
        self
    }

    pub fn build(self) -> CollisionVolume {
        CollisionVolume {
            shape: self.shape,
            center: self.center,
            friction: self.friction,
            bounciness: self.bounciness,
            sticking: self.sticking,
            mass: self.mass,
            velocity: Vec3::ZERO,
            delta: Vec3::ZERO,
            impulse: Vec3::ZERO,
        }
    }
}
