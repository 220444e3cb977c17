//! Layout configuration
//!
//! All geometry is expressed in inches and converted to points (vector
//! output) or pixels (raster output) at the edges.

use crate::error::LayoutError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// PDF points per inch
pub const POINTS_PER_INCH: f64 = 72.0;

/// Direction of the quarter turn applied to every placed copy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rotation {
    #[default]
    Clockwise,
    CounterClockwise,
}

impl Rotation {
    /// Clockwise quarter turns this rotation represents (1 or 3)
    pub fn quarter_turns(self) -> u8 {
        match self {
            Rotation::Clockwise => 1,
            Rotation::CounterClockwise => 3,
        }
    }
}

/// How the rotated label is fitted into its placement rectangle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FitMode {
    /// Scale each axis independently to fill the rectangle exactly
    #[default]
    Stretch,
    /// Keep the aspect ratio and center inside the rectangle
    Proportional,
}

impl FromStr for FitMode {
    type Err = LayoutError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "stretch" => Ok(FitMode::Stretch),
            "proportional" => Ok(FitMode::Proportional),
            other => Err(LayoutError::InvalidConfig(format!(
                "Unknown fit mode: {} (expected stretch or proportional)",
                other
            ))),
        }
    }
}

/// Immutable geometry for one layout run.
///
/// The defaults are the jar label stock: three 1.125in x 1in copies with
/// 1/8in gaps on a 3.625in x 1in page, rendered at 300 dpi on the raster path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub label_width_in: f64,
    pub label_height_in: f64,
    pub spacing_in: f64,
    pub copies: u32,
    /// Raster resolution; ignored by the vector strategy
    pub dpi: f32,
    pub rotation: Rotation,
    pub fit: FitMode,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            label_width_in: 1.125,
            label_height_in: 1.0,
            spacing_in: 0.125,
            copies: 3,
            dpi: 300.0,
            rotation: Rotation::Clockwise,
            fit: FitMode::Stretch,
        }
    }
}

impl LayoutConfig {
    pub fn validate(&self) -> Result<(), LayoutError> {
        let positive = |name: &str, v: f64| {
            if v.is_finite() && v > 0.0 {
                Ok(())
            } else {
                Err(LayoutError::InvalidConfig(format!(
                    "{} must be a positive number, got {}",
                    name, v
                )))
            }
        };

        positive("label_width_in", self.label_width_in)?;
        positive("label_height_in", self.label_height_in)?;
        positive("dpi", self.dpi as f64)?;

        if !self.spacing_in.is_finite() || self.spacing_in < 0.0 {
            return Err(LayoutError::InvalidConfig(format!(
                "spacing_in must be zero or positive, got {}",
                self.spacing_in
            )));
        }

        if self.copies == 0 {
            return Err(LayoutError::InvalidConfig(
                "copies must be at least 1".into(),
            ));
        }

        Ok(())
    }

    /// Total width of the output surface in inches
    pub fn surface_width_in(&self) -> f64 {
        let n = self.copies as f64;
        n * self.label_width_in + (n - 1.0).max(0.0) * self.spacing_in
    }

    /// Total height of the output surface in inches
    pub fn surface_height_in(&self) -> f64 {
        self.label_height_in
    }

    /// Convert inches to pixels at the configured resolution
    pub fn to_pixels(&self, inches: f64) -> u32 {
        (inches * self.dpi as f64).round().max(0.0) as u32
    }
}

/// Convert inches to PDF points
pub fn to_points(inches: f64) -> f64 {
    inches * POINTS_PER_INCH
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_matches_jar_label_stock() {
        let config = LayoutConfig::default();
        assert_eq!(config.copies, 3);
        assert!((config.surface_width_in() - 3.625).abs() < 1e-9);
        assert!((config.surface_height_in() - 1.0).abs() < 1e-9);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_pixel_conversion_rounds() {
        let config = LayoutConfig::default();
        // 1.125 * 300 = 337.5
        assert_eq!(config.to_pixels(1.125), 338);
        assert_eq!(config.to_pixels(1.0), 300);
        // 0.125 * 300 = 37.5
        assert_eq!(config.to_pixels(0.125), 38);
    }

    #[test]
    fn test_points_conversion() {
        assert!((to_points(1.125) - 81.0).abs() < 1e-9);
        assert!((to_points(3.625) - 261.0).abs() < 1e-9);
    }

    #[test]
    fn test_validate_rejects_zero_copies() {
        let config = LayoutConfig {
            copies: 0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(LayoutError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_validate_rejects_bad_dimensions() {
        for config in [
            LayoutConfig {
                label_width_in: 0.0,
                ..Default::default()
            },
            LayoutConfig {
                label_height_in: f64::NAN,
                ..Default::default()
            },
            LayoutConfig {
                spacing_in: -0.1,
                ..Default::default()
            },
            LayoutConfig {
                dpi: 0.0,
                ..Default::default()
            },
        ] {
            assert!(config.validate().is_err(), "{:?} should be rejected", config);
        }
    }

    #[test]
    fn test_single_copy_has_no_spacing() {
        let config = LayoutConfig {
            copies: 1,
            ..Default::default()
        };
        assert!((config.surface_width_in() - 1.125).abs() < 1e-9);
    }

    #[test]
    fn test_config_deserializes_partial_json() {
        let config: LayoutConfig =
            serde_json::from_str(r#"{"dpi":150,"fit":"proportional"}"#).unwrap();
        assert_eq!(config.dpi, 150.0);
        assert_eq!(config.fit, FitMode::Proportional);
        assert_eq!(config.copies, 3);
        assert_eq!(config.rotation, Rotation::Clockwise);
    }

    #[test]
    fn test_fit_mode_parses() {
        assert_eq!("Stretch".parse::<FitMode>().unwrap(), FitMode::Stretch);
        assert_eq!(
            "proportional".parse::<FitMode>().unwrap(),
            FitMode::Proportional
        );
        assert!("crop".parse::<FitMode>().is_err());
    }
}
