//! Ground-plane geometry: yaw basis and oriented-box overlap
//!
//! Ground positions are `glam::Vec2` with `x` east-west and `y` holding the
//! world z axis (the ground plane has no height).

use glam::Vec2;

/// Facing direction for a yaw angle (yaw 0 faces +z)
pub fn forward_from_yaw(yaw: f32) -> Vec2 {
    Vec2::new(yaw.sin(), yaw.cos())
}

/// Right-hand direction for a yaw angle
pub fn right_from_yaw(yaw: f32) -> Vec2 {
    Vec2::new(yaw.cos(), -yaw.sin())
}

/// Oriented rectangle on the ground plane
#[derive(Debug, Clone, Copy)]
pub struct Obb {
    pub center: Vec2,
    pub half_x: f32,
    pub half_z: f32,
    right: Vec2,
    forward: Vec2,
}

impl Obb {
    pub fn new(center: Vec2, yaw: f32, half_x: f32, half_z: f32) -> Self {
        Self {
            center,
            half_x,
            half_z,
            right: right_from_yaw(yaw),
            forward: forward_from_yaw(yaw),
        }
    }

    /// Half-width of this box's shadow on `axis`
    fn project_radius(&self, axis: Vec2) -> f32 {
        self.half_x * axis.dot(self.right).abs() + self.half_z * axis.dot(self.forward).abs()
    }
}

/// Contact between two boxes: `normal` points from the first box to the second
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    pub normal: Vec2,
    pub depth: f32,
}

/// Separating-axis test over both boxes' local axes.
///
/// Returns the least-overlap axis as the minimum translation vector, or `None`
/// when a separating axis exists (touching counts as separated).
pub fn obb_contact(a: &Obb, b: &Obb) -> Option<Contact> {
    let d = b.center - a.center;
    let axes = [a.right, a.forward, b.right, b.forward];

    let mut best: Option<Contact> = None;
    for axis in axes {
        let t = d.dot(axis);
        let overlap = a.project_radius(axis) + b.project_radius(axis) - t.abs();
        if overlap <= 0.0 {
            return None;
        }

        if best.map_or(true, |c| overlap < c.depth) {
            let sign = if t >= 0.0 { 1.0 } else { -1.0 };
            best = Some(Contact {
                normal: axis * sign,
                depth: overlap,
            });
        }
    }
    best
}
