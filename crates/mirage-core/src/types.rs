//! Shared types used across the simulation and evolution crates.

use serde::{Deserialize, Serialize};

/// Monotonic simulation tick counter.
pub type Tick = u64;

/// A 2D vector: a position in world space or a steering request.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Unit vector pointing along `angle` radians.
    pub fn from_angle(angle: f64) -> Self {
        Self {
            x: angle.cos(),
            y: angle.sin(),
        }
    }

    pub fn length(&self) -> f64 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    pub fn distance_to(&self, other: &Vec2) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }

    pub fn scale(&self, factor: f64) -> Vec2 {
        Vec2::new(self.x * factor, self.y * factor)
    }

    pub fn add(&self, other: &Vec2) -> Vec2 {
        Vec2::new(self.x + other.x, self.y + other.y)
    }

    /// Angle of this vector in radians.
    pub fn angle(&self) -> f64 {
        self.y.atan2(self.x)
    }

    /// Linear interpolation toward `other` by `t`.
    pub fn lerp(&self, other: &Vec2, t: f64) -> Vec2 {
        Vec2::new(
            self.x + (other.x - self.x) * t,
            self.y + (other.y - self.y) * t,
        )
    }

    /// Integer tile coordinate containing this point.
    pub fn tile(&self) -> (i64, i64) {
        (self.x.floor() as i64, self.y.floor() as i64)
    }
}

/// Wrap an angle into `[-π, π)`.
pub fn wrap_angle(angle: f64) -> f64 {
    let tau = std::f64::consts::TAU;
    let wrapped = (angle + std::f64::consts::PI).rem_euclid(tau) - std::f64::consts::PI;
    if wrapped >= std::f64::consts::PI {
        wrapped - tau
    } else {
        wrapped
    }
}

/// Round to three decimals.
pub fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    #[test]
    fn vector_basics() {
        let v = Vec2::new(3.0, 4.0);
        assert_eq!(v.length(), 5.0);
        assert_eq!(v.scale(2.0), Vec2::new(6.0, 8.0));
        assert_eq!(Vec2::ZERO.distance_to(&v), 5.0);
        assert_eq!(Vec2::ZERO.lerp(&v, 0.5), Vec2::new(1.5, 2.0));
    }

    #[test]
    fn tile_floors_negative_coordinates() {
        assert_eq!(Vec2::new(1.9, 0.1).tile(), (1, 0));
        assert_eq!(Vec2::new(-0.1, 2.0).tile(), (-1, 2));
    }

    #[test]
    fn wrap_angle_stays_in_range() {
        for k in -20..20 {
            let a = wrap_angle(k as f64 * 0.7);
            assert!((-PI..PI).contains(&a), "{} out of range", a);
        }
        assert!((wrap_angle(3.0 * PI) + PI).abs() < 1e-12);
    }

    #[test]
    fn round3_keeps_three_decimals() {
        assert_eq!(round3(0.12345), 0.123);
        assert_eq!(round3(1.0), 1.0);
    }
}
