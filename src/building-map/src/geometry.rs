// Copyright 2026 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

use std::ops::{Add, Mul, Sub};

/// 2D position, in drawing pixels unless stated otherwise.
#[derive(Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl std::fmt::Debug for Point {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.3}, {:.3})", self.x, self.y)
    }
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn length(self) -> f64 {
        self.x.hypot(self.y)
    }

    pub fn distance_to(self, other: Self) -> f64 {
        (other - self).length()
    }

    /// Heading from `self` to `other` in radians, in [-pi, pi].
    pub fn angle_to(self, other: Self) -> f64 {
        let delta = other - self;
        delta.y.atan2(delta.x)
    }

    pub fn midpoint(self, other: Self) -> Self {
        (self + other) * 0.5
    }
}

impl Add for Point {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self {
            x: self.x + rhs.x,
            y: self.y + rhs.y,
        }
    }
}

impl Sub for Point {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self {
            x: self.x - rhs.x,
            y: self.y - rhs.y,
        }
    }
}

impl Mul<f64> for Point {
    type Output = Self;
    fn mul(self, rhs: f64) -> Self {
        Self {
            x: self.x * rhs,
            y: self.y * rhs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::approx_eq;

    #[test]
    fn test_distance() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(30.0, 40.0);
        assert!(approx_eq!(f64, 50.0, a.distance_to(b)));
        assert!(approx_eq!(f64, 50.0, b.distance_to(a)));
        assert_eq!(0.0, b.distance_to(b));
    }

    #[test]
    fn test_angle_and_midpoint() {
        let a = Point::new(1.0, 1.0);
        let b = Point::new(1.0, 3.0);
        assert!(approx_eq!(f64, std::f64::consts::FRAC_PI_2, a.angle_to(b)));
        assert_eq!(Point::new(1.0, 2.0), a.midpoint(b));
    }
}
