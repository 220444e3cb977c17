//! Property-based tests for label geometry
//!
//! Checks placement, surface and transform invariants over arbitrary
//! label sizes, spacings and copy counts using proptest.

use label_layout::config::{FitMode, LayoutConfig, Rotation};
use label_layout::geometry::{placement_transform, placements, surface_size, PixelLayout, Rect};
use proptest::prelude::*;

const EPS: f64 = 1e-6;

fn layout_config() -> impl Strategy<Value = LayoutConfig> {
    (
        0.1f64..5.0,
        0.1f64..5.0,
        0.0f64..1.0,
        1u32..8,
        prop_oneof![Just(72.0f32), Just(150.0f32), Just(300.0f32)],
        prop_oneof![Just(Rotation::Clockwise), Just(Rotation::CounterClockwise)],
    )
        .prop_map(|(w, h, spacing, copies, dpi, rotation)| LayoutConfig {
            label_width_in: w,
            label_height_in: h,
            spacing_in: spacing,
            copies,
            dpi,
            rotation,
            fit: FitMode::Stretch,
        })
}

fn page_box() -> impl Strategy<Value = Rect> {
    (-100.0f64..100.0, -100.0f64..100.0, 10.0f64..1000.0, 10.0f64..1000.0)
        .prop_map(|(x, y, w, h)| Rect::new(x, y, w, h))
}

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < EPS * a.abs().max(b.abs()).max(1.0)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    // ============================================================
    // Placements
    // ============================================================

    #[test]
    fn one_placement_per_copy(config in layout_config()) {
        prop_assert_eq!(placements(&config).len(), config.copies as usize);
    }

    #[test]
    fn placements_step_by_width_plus_spacing(config in layout_config()) {
        let rects = placements(&config);
        let step = (config.label_width_in + config.spacing_in) * 72.0;
        for (i, rect) in rects.iter().enumerate() {
            prop_assert!(close(rect.x, i as f64 * step));
            prop_assert_eq!(rect.y, 0.0);
        }
    }

    #[test]
    fn placements_never_overlap(config in layout_config()) {
        let rects = placements(&config);
        for pair in rects.windows(2) {
            prop_assert!(pair[0].right() <= pair[1].x + EPS);
        }
    }

    #[test]
    fn last_placement_ends_at_surface_edge(config in layout_config()) {
        let rects = placements(&config);
        let (width, height) = surface_size(&config);
        let last = rects.last().unwrap();
        prop_assert!(close(last.right(), width));
        prop_assert!(rects.iter().all(|r| close(r.top(), height)));
    }

    // ============================================================
    // Transforms
    // ============================================================

    #[test]
    fn stretch_maps_page_box_onto_target(
        source in page_box(),
        turns in 0u8..4,
        config in layout_config(),
    ) {
        for target in placements(&config) {
            let mapped = placement_transform(&source, turns, &target, FitMode::Stretch)
                .map_rect(&source);
            prop_assert!(close(mapped.x, target.x));
            prop_assert!(close(mapped.y, target.y));
            prop_assert!(close(mapped.width, target.width));
            prop_assert!(close(mapped.height, target.height));
        }
    }

    #[test]
    fn proportional_fits_inside_and_centers(
        source in page_box(),
        turns in 0u8..4,
        config in layout_config(),
    ) {
        for target in placements(&config) {
            let mapped = placement_transform(&source, turns, &target, FitMode::Proportional)
                .map_rect(&source);
            prop_assert!(mapped.x >= target.x - 1e-6);
            prop_assert!(mapped.right() <= target.right() + 1e-6);
            prop_assert!(mapped.y >= target.y - 1e-6);
            prop_assert!(mapped.top() <= target.top() + 1e-6);

            let source_center = (mapped.x + mapped.width / 2.0, mapped.y + mapped.height / 2.0);
            prop_assert!(close(source_center.0, target.x + target.width / 2.0));
            prop_assert!(close(source_center.1, target.y + target.height / 2.0));
        }
    }

    #[test]
    fn quarter_turn_swaps_axes(source in page_box(), turns in prop_oneof![Just(1u8), Just(3u8)]) {
        let target = Rect::new(0.0, 0.0, source.height, source.width);
        let t = placement_transform(&source, turns, &target, FitMode::Stretch);
        // A pure quarter turn at unit scale keeps lengths
        prop_assert!(close(t.a, 0.0));
        prop_assert!(close(t.d, 0.0));
        prop_assert!(close(t.b.abs(), 1.0));
        prop_assert!(close(t.c.abs(), 1.0));
    }

    // ============================================================
    // Pixel layout
    // ============================================================

    #[test]
    fn pixel_canvas_ends_after_last_copy(config in layout_config()) {
        let layout = PixelLayout::from_config(&config);
        let offsets = layout.offsets();
        let (width, height) = layout.canvas_size();
        prop_assert_eq!(offsets.len(), config.copies as usize);
        prop_assert_eq!(offsets[0], 0);
        prop_assert_eq!(*offsets.last().unwrap() + layout.label_width_px, width);
        prop_assert_eq!(height, layout.label_height_px);
    }
}
