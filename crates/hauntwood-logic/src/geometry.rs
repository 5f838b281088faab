//! Ground-plane geometry: vectors, boxes, world bounds and paths.
//!
//! The world is Y-up. Characters walk on the X/Z plane and Y only matters
//! for bounding-box overlap tests and camera placement.

use serde::{Deserialize, Serialize};

/// 3D vector used for positions, velocities and camera poses.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const ZERO: Self = Self {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Point on the ground plane.
    pub const fn ground(x: f32, z: f32) -> Self {
        Self { x, y: 0.0, z }
    }

    pub fn length_squared(&self) -> f32 {
        self.x * self.x + self.y * self.y + self.z * self.z
    }

    pub fn length(&self) -> f32 {
        self.length_squared().sqrt()
    }

    pub fn distance_squared(&self, other: &Self) -> f32 {
        (*self - *other).length_squared()
    }

    pub fn distance(&self, other: &Self) -> f32 {
        self.distance_squared(other).sqrt()
    }

    /// Distance ignoring height.
    pub fn ground_distance(&self, other: &Self) -> f32 {
        let dx = self.x - other.x;
        let dz = self.z - other.z;
        (dx * dx + dz * dz).sqrt()
    }

    pub fn normalize(&self) -> Self {
        let len = self.length();
        if len > 0.0 {
            *self * (1.0 / len)
        } else {
            Self::ZERO
        }
    }

    /// Unit direction from `self` to `to` on the ground plane, or zero when
    /// the points coincide.
    pub fn ground_direction(&self, to: &Self) -> Self {
        Self::ground(to.x - self.x, to.z - self.z).normalize()
    }

    pub fn lerp(&self, to: &Self, t: f32) -> Self {
        Self {
            x: lerp(self.x, to.x, t),
            y: lerp(self.y, to.y, t),
            z: lerp(self.z, to.z, t),
        }
    }

    /// Midpoint of two points.
    pub fn midpoint(&self, other: &Self) -> Self {
        (*self + *other) * 0.5
    }
}

impl std::ops::Add for Vec3 {
    type Output = Self;
    fn add(self, o: Self) -> Self {
        Self::new(self.x + o.x, self.y + o.y, self.z + o.z)
    }
}

impl std::ops::AddAssign for Vec3 {
    fn add_assign(&mut self, o: Self) {
        *self = *self + o;
    }
}

impl std::ops::Sub for Vec3 {
    type Output = Self;
    fn sub(self, o: Self) -> Self {
        Self::new(self.x - o.x, self.y - o.y, self.z - o.z)
    }
}

impl std::ops::Mul<f32> for Vec3 {
    type Output = Self;
    fn mul(self, s: f32) -> Self {
        Self::new(self.x * s, self.y * s, self.z * s)
    }
}

impl std::ops::Neg for Vec3 {
    type Output = Self;
    fn neg(self) -> Self {
        Self::new(-self.x, -self.y, -self.z)
    }
}

pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Axis-aligned bounding box (center + full size).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub center: Vec3,
    pub size: Vec3,
}

impl Aabb {
    pub fn new(center: Vec3, size: Vec3) -> Self {
        Self { center, size }
    }

    pub fn min(&self) -> Vec3 {
        self.center - self.size * 0.5
    }

    pub fn max(&self) -> Vec3 {
        self.center + self.size * 0.5
    }

    /// Overlap test. Touching faces do not count as overlap.
    pub fn intersects(&self, other: &Aabb) -> bool {
        let (a0, a1) = (self.min(), self.max());
        let (b0, b1) = (other.min(), other.max());
        a0.x < b1.x && a1.x > b0.x && a0.y < b1.y && a1.y > b0.y && a0.z < b1.z && a1.z > b0.z
    }

    /// Box of a standing character whose feet are at `feet`.
    pub fn character(feet: Vec3, width: f32, height: f32) -> Self {
        Self::new(
            Vec3::new(feet.x, feet.y + height / 2.0, feet.z),
            Vec3::new(width, height, width),
        )
    }
}

/// Square playable area on the ground plane.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WorldBounds {
    pub min_x: f32,
    pub max_x: f32,
    pub min_z: f32,
    pub max_z: f32,
}

impl Default for WorldBounds {
    fn default() -> Self {
        Self::square(crate::constants::WORLD_HALF_EXTENT)
    }
}

impl WorldBounds {
    pub fn square(half_extent: f32) -> Self {
        Self {
            min_x: -half_extent,
            max_x: half_extent,
            min_z: -half_extent,
            max_z: half_extent,
        }
    }

    pub fn clamp_x(&self, x: f32) -> f32 {
        x.clamp(self.min_x, self.max_x)
    }

    pub fn clamp_z(&self, z: f32) -> f32 {
        z.clamp(self.min_z, self.max_z)
    }

    pub fn clamp(&self, p: Vec3) -> Vec3 {
        Vec3::new(self.clamp_x(p.x), p.y, self.clamp_z(p.z))
    }

    pub fn contains(&self, p: Vec3) -> bool {
        p.x >= self.min_x && p.x <= self.max_x && p.z >= self.min_z && p.z <= self.max_z
    }

    /// Whether a point lies in the outer band of the map where ambushes
    /// are allowed (`|x|` or `|z|` beyond `threshold`).
    pub fn at_edge(p: Vec3, threshold: f32) -> bool {
        p.x.abs() > threshold || p.z.abs() > threshold
    }
}

/// Uniform Catmull-Rom spline through `points`, sampled at `t` in `[0, 1]`.
/// Endpoints are duplicated so the curve passes through the first and last
/// control points.
pub fn catmull_rom(points: &[Vec3], t: f32) -> Vec3 {
    match points.len() {
        0 => return Vec3::ZERO,
        1 => return points[0],
        _ => {}
    }
    let t = t.clamp(0.0, 1.0);
    let segments = points.len() - 1;
    let scaled = t * segments as f32;
    let seg = (scaled.floor() as usize).min(segments - 1);
    let local = scaled - seg as f32;

    let p0 = points[seg.saturating_sub(1)];
    let p1 = points[seg];
    let p2 = points[seg + 1];
    let p3 = points[(seg + 2).min(points.len() - 1)];

    let t2 = local * local;
    let t3 = t2 * local;
    let blend = |a: f32, b: f32, c: f32, d: f32| {
        0.5 * ((2.0 * b)
            + (-a + c) * local
            + (2.0 * a - 5.0 * b + 4.0 * c - d) * t2
            + (-a + 3.0 * b - 3.0 * c + d) * t3)
    };
    Vec3::new(
        blend(p0.x, p1.x, p2.x, p3.x),
        blend(p0.y, p1.y, p2.y, p3.y),
        blend(p0.z, p1.z, p2.z, p3.z),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ground_distance_ignores_height() {
        let a = Vec3::new(0.0, 10.0, 0.0);
        let b = Vec3::new(3.0, 0.0, 4.0);
        assert!((a.ground_distance(&b) - 5.0).abs() < 1e-5);
    }

    #[test]
    fn normalize_zero_is_zero() {
        assert_eq!(Vec3::ZERO.normalize(), Vec3::ZERO);
    }

    #[test]
    fn aabb_overlap_and_touching() {
        let a = Aabb::new(Vec3::ZERO, Vec3::new(2.0, 2.0, 2.0));
        let b = Aabb::new(Vec3::new(1.5, 0.0, 0.0), Vec3::new(2.0, 2.0, 2.0));
        let c = Aabb::new(Vec3::new(2.0, 0.0, 0.0), Vec3::new(2.0, 2.0, 2.0));
        assert!(a.intersects(&b));
        assert!(!a.intersects(&c), "shared face is not an overlap");
    }

    #[test]
    fn character_box_sits_on_feet() {
        let b = Aabb::character(Vec3::ground(1.0, 2.0), 1.0, 4.0);
        assert_eq!(b.min().y, 0.0);
        assert_eq!(b.max().y, 4.0);
    }

    #[test]
    fn bounds_clamp() {
        let b = WorldBounds::square(95.0);
        let p = b.clamp(Vec3::new(120.0, 3.0, -200.0));
        assert_eq!(p, Vec3::new(95.0, 3.0, -95.0));
        assert!(b.contains(p));
    }

    #[test]
    fn edge_band() {
        assert!(WorldBounds::at_edge(Vec3::ground(85.0, 0.0), 80.0));
        assert!(WorldBounds::at_edge(Vec3::ground(0.0, -81.0), 80.0));
        assert!(!WorldBounds::at_edge(Vec3::ground(79.0, 79.0), 80.0));
    }

    #[test]
    fn catmull_rom_hits_control_points() {
        let pts = [
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(10.0, 0.0, 0.0),
            Vec3::new(10.0, 0.0, 10.0),
        ];
        assert_eq!(catmull_rom(&pts, 0.0), pts[0]);
        let end = catmull_rom(&pts, 1.0);
        assert!(end.distance(&pts[2]) < 1e-4);
        let mid = catmull_rom(&pts, 0.5);
        assert!(mid.distance(&pts[1]) < 1e-4);
    }
}
