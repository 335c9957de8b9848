//! Shared 2-D point/vector type used across the layout algorithms.

use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};

/// A 2-D point or displacement vector.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn length_squared(self) -> f64 {
        self.x * self.x + self.y * self.y
    }

    pub fn length(self) -> f64 {
        self.length_squared().sqrt()
    }

    pub fn distance(self, other: Vec2) -> f64 {
        (self - other).length()
    }

    pub fn distance_squared(self, other: Vec2) -> f64 {
        (self - other).length_squared()
    }

    /// The unit vector in this direction, or `fallback` if this vector is
    /// (near-)zero.
    pub fn normalized_or(self, fallback: Vec2) -> Vec2 {
        let len = self.length();
        if len < 1e-9 {
            fallback
        } else {
            self * (1.0 / len)
        }
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    pub fn angle(self) -> f64 {
        self.y.atan2(self.x)
    }

    pub fn from_polar(radius: f64, angle: f64) -> Self {
        Self::new(radius * angle.cos(), radius * angle.sin())
    }
}

impl Add for Vec2 {
    type Output = Vec2;
    fn add(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign for Vec2 {
    fn add_assign(&mut self, rhs: Vec2) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl Sub for Vec2 {
    type Output = Vec2;
    fn sub(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl SubAssign for Vec2 {
    fn sub_assign(&mut self, rhs: Vec2) {
        self.x -= rhs.x;
        self.y -= rhs.y;
    }
}

impl Mul<f64> for Vec2 {
    type Output = Vec2;
    fn mul(self, rhs: f64) -> Vec2 {
        Vec2::new(self.x * rhs, self.y * rhs)
    }
}

/// An axis-aligned rectangle, used as the quadtree boundary and for range
/// queries.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub center: Vec2,
    pub half_size: f64,
}

impl Rect {
    pub fn new(center: Vec2, half_size: f64) -> Self {
        Self { center, half_size }
    }

    pub fn contains(&self, point: Vec2) -> bool {
        (point.x - self.center.x).abs() <= self.half_size
            && (point.y - self.center.y).abs() <= self.half_size
    }

    pub fn intersects(&self, other: &Rect) -> bool {
        (self.center.x - other.center.x).abs() <= self.half_size + other.half_size
            && (self.center.y - other.center.y).abs() <= self.half_size + other.half_size
    }

    /// The four equal child quadrants: north-east, north-west, south-east,
    /// south-west.
    pub fn subdivide(&self) -> [Rect; 4] {
        let h = self.half_size / 2.0;
        let c = self.center;
        [
            Rect::new(Vec2::new(c.x + h, c.y + h), h), // NE
            Rect::new(Vec2::new(c.x - h, c.y + h), h), // NW
            Rect::new(Vec2::new(c.x + h, c.y - h), h), // SE
            Rect::new(Vec2::new(c.x - h, c.y - h), h), // SW
        ]
    }

    /// The smallest square `Rect` containing all of `points`, padded by
    /// `padding` on every side. Returns a unit rect around the origin for
    /// an empty slice.
    pub fn bounding(points: impl Iterator<Item = Vec2>, padding: f64) -> Rect {
        let mut min = Vec2::new(f64::MAX, f64::MAX);
        let mut max = Vec2::new(f64::MIN, f64::MIN);
        let mut any = false;
        for p in points {
            any = true;
            min.x = min.x.min(p.x);
            min.y = min.y.min(p.y);
            max.x = max.x.max(p.x);
            max.y = max.y.max(p.y);
        }
        if !any {
            return Rect::new(Vec2::ZERO, 1.0);
        }
        min.x -= padding;
        min.y -= padding;
        max.x += padding;
        max.y += padding;
        let half_size = ((max.x - min.x).max(max.y - min.y) / 2.0).max(1.0);
        let center = Vec2::new((min.x + max.x) / 2.0, (min.y + max.y) / 2.0);
        Rect::new(center, half_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vec2_ops() {
        let a = Vec2::new(1.0, 2.0);
        let b = Vec2::new(3.0, -1.0);
        assert_eq!(a + b, Vec2::new(4.0, 1.0));
        assert_eq!(b - a, Vec2::new(2.0, -3.0));
        assert_eq!(a * 2.0, Vec2::new(2.0, 4.0));
    }

    #[test]
    fn normalized_or_fallback_on_zero() {
        let v = Vec2::ZERO.normalized_or(Vec2::new(1.0, 0.0));
        assert_eq!(v, Vec2::new(1.0, 0.0));
    }

    #[test]
    fn rect_contains_and_subdivide() {
        let r = Rect::new(Vec2::ZERO, 10.0);
        assert!(r.contains(Vec2::new(5.0, -5.0)));
        assert!(!r.contains(Vec2::new(11.0, 0.0)));
        let children = r.subdivide();
        assert_eq!(children.len(), 4);
        for c in children {
            assert_eq!(c.half_size, 5.0);
        }
    }

    #[test]
    fn bounding_empty_is_unit_rect() {
        let r = Rect::bounding(std::iter::empty(), 10.0);
        assert_eq!(r.center, Vec2::ZERO);
    }
}
