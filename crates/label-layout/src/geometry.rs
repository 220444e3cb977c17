//! Placement geometry
//!
//! PDF user space: origin at the bottom-left, y grows upward, matrices are
//! row-vector `[a b c d e f]` as written by the `cm` operator.

use crate::config::{to_points, FitMode, LayoutConfig};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Build from a PDF box array `[llx lly urx ury]`, normalizing corner order
    pub fn from_corners(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self {
            x: x1.min(x2),
            y: y1.min(y2),
            width: (x2 - x1).abs(),
            height: (y2 - y1).abs(),
        }
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn top(&self) -> f64 {
        self.y + self.height
    }
}

/// Affine transform in PDF matrix form
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Transform {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub e: f64,
    pub f: f64,
}

impl Transform {
    pub const IDENTITY: Transform = Transform {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
        e: 0.0,
        f: 0.0,
    };

    pub fn new(a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) -> Self {
        Self { a, b, c, d, e, f }
    }

    pub fn translate(tx: f64, ty: f64) -> Self {
        Self::new(1.0, 0.0, 0.0, 1.0, tx, ty)
    }

    pub fn scale(sx: f64, sy: f64) -> Self {
        Self::new(sx, 0.0, 0.0, sy, 0.0, 0.0)
    }

    /// Apply `self` first, then `next`
    pub fn then(&self, next: &Transform) -> Transform {
        Transform {
            a: next.a * self.a + next.c * self.b,
            b: next.b * self.a + next.d * self.b,
            c: next.a * self.c + next.c * self.d,
            d: next.b * self.c + next.d * self.d,
            e: next.a * self.e + next.c * self.f + next.e,
            f: next.b * self.e + next.d * self.f + next.f,
        }
    }

    pub fn apply(&self, x: f64, y: f64) -> (f64, f64) {
        (
            self.a * x + self.c * y + self.e,
            self.b * x + self.d * y + self.f,
        )
    }

    /// Axis-aligned bounds of `rect` after transformation
    pub fn map_rect(&self, rect: &Rect) -> Rect {
        let corners = [
            self.apply(rect.x, rect.y),
            self.apply(rect.right(), rect.y),
            self.apply(rect.x, rect.top()),
            self.apply(rect.right(), rect.top()),
        ];
        let min_x = corners.iter().map(|p| p.0).fold(f64::INFINITY, f64::min);
        let max_x = corners.iter().map(|p| p.0).fold(f64::NEG_INFINITY, f64::max);
        let min_y = corners.iter().map(|p| p.1).fold(f64::INFINITY, f64::min);
        let max_y = corners.iter().map(|p| p.1).fold(f64::NEG_INFINITY, f64::max);
        Rect::from_corners(min_x, min_y, max_x, max_y)
    }

    pub fn to_array(&self) -> [f64; 6] {
        [self.a, self.b, self.c, self.d, self.e, self.f]
    }
}

/// Placement rectangles in points, left to right
pub fn placements(config: &LayoutConfig) -> Vec<Rect> {
    let width = to_points(config.label_width_in);
    let height = to_points(config.label_height_in);
    let step = to_points(config.label_width_in + config.spacing_in);

    (0..config.copies)
        .map(|i| Rect::new(i as f64 * step, 0.0, width, height))
        .collect()
}

/// Output page size in points
pub fn surface_size(config: &LayoutConfig) -> (f64, f64) {
    (
        to_points(config.surface_width_in()),
        to_points(config.surface_height_in()),
    )
}

/// Maps `source` into `target` after `quarter_turns` clockwise quarter turns.
///
/// With `FitMode::Stretch` the rotated source fills the target exactly; with
/// `FitMode::Proportional` it is uniformly scaled and centered.
pub fn placement_transform(source: &Rect, quarter_turns: u8, target: &Rect, fit: FitMode) -> Transform {
    let (w, h) = (source.width, source.height);

    // Rotation about the origin of a box already translated to (0, 0),
    // shifted so the rotated box lands back in the positive quadrant.
    let (rotate, rotated_w, rotated_h) = match quarter_turns % 4 {
        0 => (Transform::IDENTITY, w, h),
        1 => (Transform::new(0.0, -1.0, 1.0, 0.0, 0.0, w), h, w),
        2 => (Transform::new(-1.0, 0.0, 0.0, -1.0, w, h), w, h),
        _ => (Transform::new(0.0, 1.0, -1.0, 0.0, h, 0.0), h, w),
    };

    let (sx, sy, dx, dy) = match fit {
        FitMode::Stretch => (target.width / rotated_w, target.height / rotated_h, 0.0, 0.0),
        FitMode::Proportional => {
            let s = (target.width / rotated_w).min(target.height / rotated_h);
            (
                s,
                s,
                (target.width - s * rotated_w) / 2.0,
                (target.height - s * rotated_h) / 2.0,
            )
        }
    };

    Transform::translate(-source.x, -source.y)
        .then(&rotate)
        .then(&Transform::scale(sx, sy))
        .then(&Transform::translate(target.x + dx, target.y + dy))
}

/// The layout in whole pixels for the raster path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelLayout {
    pub label_width_px: u32,
    pub label_height_px: u32,
    pub spacing_px: u32,
    pub copies: u32,
}

impl PixelLayout {
    pub fn from_config(config: &LayoutConfig) -> Self {
        Self {
            label_width_px: config.to_pixels(config.label_width_in).max(1),
            label_height_px: config.to_pixels(config.label_height_in).max(1),
            spacing_px: config.to_pixels(config.spacing_in),
            copies: config.copies,
        }
    }

    /// Left edge of each copy on the canvas
    pub fn offsets(&self) -> Vec<u32> {
        (0..self.copies)
            .map(|i| i * (self.label_width_px + self.spacing_px))
            .collect()
    }

    pub fn canvas_size(&self) -> (u32, u32) {
        let width = self.copies * self.label_width_px
            + self.copies.saturating_sub(1) * self.spacing_px;
        (width, self.label_height_px)
    }
}
