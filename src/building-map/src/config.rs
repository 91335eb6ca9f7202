// Copyright 2026 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

use crate::common::Result;
use crate::level_err;

/// Scale used when a level has no usable measurement edges.
pub const DEFAULT_METERS_PER_PIXEL: f64 = 0.05;

/// Physical width and height of a level that has neither a background
/// drawing nor explicit dimensions.
pub const DEFAULT_LEVEL_SIZE_METERS: f64 = 100.0;

/// Point-like coordinates are rounded to 1/1000 pixel when serialized.
pub const COORDINATE_PRECISION: f64 = 1000.0;

/// Initial `distance` parameter of a newly added measurement edge.
pub const DEFAULT_MEASUREMENT_DISTANCE: f64 = 1.0;

/// Level-wide defaults.  Calibration and serialization depend on the exact
/// values, so they are carried explicitly rather than scattered as literals.
#[derive(Clone, Debug, PartialEq)]
pub struct LevelConfig {
    /// Fallback scale when no measurement can be used.
    pub default_meters_per_pixel: f64,
    /// Physical size of a level without drawing or dimensions.
    pub default_x_meters: f64,
    pub default_y_meters: f64,
    /// Multiplier used to round coordinates before emission.
    pub coordinate_precision: f64,
    pub default_measurement_distance: f64,
}

impl Default for LevelConfig {
    fn default() -> Self {
        Self {
            default_meters_per_pixel: DEFAULT_METERS_PER_PIXEL,
            default_x_meters: DEFAULT_LEVEL_SIZE_METERS,
            default_y_meters: DEFAULT_LEVEL_SIZE_METERS,
            coordinate_precision: COORDINATE_PRECISION,
            default_measurement_distance: DEFAULT_MEASUREMENT_DISTANCE,
        }
    }
}

impl LevelConfig {
    /// Scale, default size and precision must be finite and positive;
    /// level dimensions are derived by dividing and multiplying by them.
    pub fn validate(&self) -> Result<()> {
        let checks = [
            ("default_meters_per_pixel", self.default_meters_per_pixel),
            ("default_x_meters", self.default_x_meters),
            ("default_y_meters", self.default_y_meters),
            ("coordinate_precision", self.coordinate_precision),
        ];
        for (field, value) in checks {
            if !(value.is_finite() && value > 0.0) {
                return level_err!(
                    BadDimensions,
                    format!("level config: {field} must be positive, not {value}")
                );
            }
        }
        Ok(())
    }

    pub fn round_coordinate(&self, value: f64) -> f64 {
        (value * self.coordinate_precision).round() / self.coordinate_precision
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::ErrorCode;

    #[test]
    fn test_default_config() {
        let config = LevelConfig::default();

        assert!((config.default_meters_per_pixel - 0.05).abs() < f64::EPSILON);
        assert!((config.default_x_meters - 100.0).abs() < f64::EPSILON);
        assert!((config.default_y_meters - 100.0).abs() < f64::EPSILON);
        assert!((config.coordinate_precision - 1000.0).abs() < f64::EPSILON);
        assert!((config.default_measurement_distance - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_validate() {
        assert!(LevelConfig::default().validate().is_ok());

        let bad = [
            LevelConfig {
                default_meters_per_pixel: 0.0,
                ..Default::default()
            },
            LevelConfig {
                default_meters_per_pixel: -0.05,
                ..Default::default()
            },
            LevelConfig {
                default_x_meters: f64::INFINITY,
                ..Default::default()
            },
            LevelConfig {
                default_y_meters: 0.0,
                ..Default::default()
            },
            LevelConfig {
                coordinate_precision: f64::NAN,
                ..Default::default()
            },
        ];
        for config in bad {
            let err = config.validate().unwrap_err();
            assert_eq!(ErrorCode::BadDimensions, err.code, "{config:?}");
        }
    }

    #[test]
    fn test_round_coordinate() {
        let config = LevelConfig::default();

        assert_eq!(12.346, config.round_coordinate(12.345_6));
        assert_eq!(-3.0, config.round_coordinate(-3.000_2));
        assert_eq!(7.5, config.round_coordinate(7.5));
    }
}
