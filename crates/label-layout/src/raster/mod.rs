//! Raster strategy
//!
//! Render the label page to pixels, turn it, hard-resize it to the label
//! cell, paste it at each pixel offset on a white canvas and wrap the canvas
//! in a one-page PDF at the render resolution.

mod basic;
#[cfg(feature = "pdfium")]
mod pdfium;

pub use basic::BasicRasterizer;
#[cfg(feature = "pdfium")]
pub use pdfium::PdfiumRasterizer;

use crate::config::{FitMode, LayoutConfig, Rotation, POINTS_PER_INCH};
use crate::document::SourceDocument;
use crate::error::LayoutError;
use crate::geometry::PixelLayout;
use crate::strategy::LayoutStrategy;
use crate::writer::{finish_single_page, new_output_document};
use flate2::write::ZlibEncoder;
use flate2::Compression;
use image::imageops::{self, FilterType};
use image::{Rgb, RgbImage};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Object, Stream};
use std::io::Write;

/// Upper bound on rendered page size; a full-bleed A0 at 300 dpi is ~140M
pub const MAX_RENDER_PIXELS: u64 = 64_000_000;

const WHITE: Rgb<u8> = Rgb([255, 255, 255]);

/// Turns a decoded label page into pixels
pub trait PageRasterizer {
    fn name(&self) -> &'static str;

    /// Render the single page at `dpi`, with the page's /Rotate applied
    fn rasterize(&self, source: &SourceDocument<'_>, dpi: f32) -> Result<RgbImage, LayoutError>;
}

pub struct RasterStrategy<R> {
    config: LayoutConfig,
    rasterizer: R,
}

impl<R: PageRasterizer> RasterStrategy<R> {
    pub fn new(config: LayoutConfig, rasterizer: R) -> Self {
        Self { config, rasterizer }
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }
}

impl<R: PageRasterizer> LayoutStrategy for RasterStrategy<R> {
    fn name(&self) -> &'static str {
        "raster"
    }

    fn process(&self, source: &[u8]) -> Result<Vec<u8>, LayoutError> {
        self.config.validate()?;
        let source = SourceDocument::decode(source)?;
        // Undecodable content is a bad upload, not something to render blank
        source.content()?;

        let page = self.rasterizer.rasterize(&source, self.config.dpi)?;
        tracing::debug!(
            rasterizer = self.rasterizer.name(),
            width = page.width(),
            height = page.height(),
            dpi = self.config.dpi,
            "rendered label page"
        );

        let canvas = compose(&page, &self.config);
        encode_canvas(&canvas, self.config.dpi)
    }
}

/// Lay out `copies` turned and resized copies of `page` on a white canvas
pub fn compose(page: &RgbImage, config: &LayoutConfig) -> RgbImage {
    let layout = PixelLayout::from_config(config);

    let rotated = match config.rotation {
        Rotation::Clockwise => imageops::rotate90(page),
        Rotation::CounterClockwise => imageops::rotate270(page),
    };

    let tile = fit_tile(&rotated, layout.label_width_px, layout.label_height_px, config.fit);

    let (width, height) = layout.canvas_size();
    let mut canvas = RgbImage::from_pixel(width, height, WHITE);
    for x in layout.offsets() {
        imageops::replace(&mut canvas, &tile, x as i64, 0);
    }
    canvas
}

fn fit_tile(image: &RgbImage, width: u32, height: u32, fit: FitMode) -> RgbImage {
    match fit {
        // Aspect ratio is deliberately not preserved
        FitMode::Stretch => imageops::resize(image, width, height, FilterType::CatmullRom),
        FitMode::Proportional => {
            let scale = (width as f64 / image.width() as f64)
                .min(height as f64 / image.height() as f64);
            let scaled_w = ((image.width() as f64 * scale).round() as u32).clamp(1, width);
            let scaled_h = ((image.height() as f64 * scale).round() as u32).clamp(1, height);
            let scaled = imageops::resize(image, scaled_w, scaled_h, FilterType::CatmullRom);

            let mut tile = RgbImage::from_pixel(width, height, WHITE);
            imageops::replace(
                &mut tile,
                &scaled,
                ((width - scaled_w) / 2) as i64,
                ((height - scaled_h) / 2) as i64,
            );
            tile
        }
    }
}

/// Wrap `canvas` in a one-page PDF sized `pixels * 72 / dpi` points
pub fn encode_canvas(canvas: &RgbImage, dpi: f32) -> Result<Vec<u8>, LayoutError> {
    let (width_px, height_px) = canvas.dimensions();

    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(canvas.as_raw())
        .map_err(|e| LayoutError::Encode(format!("Failed to compress image: {}", e)))?;
    let data = encoder
        .finish()
        .map_err(|e| LayoutError::Encode(format!("Failed to compress image: {}", e)))?;

    let mut output = new_output_document();
    let image = Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => width_px as i64,
            "Height" => height_px as i64,
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8,
            "Filter" => "FlateDecode",
        },
        data,
    )
    .with_compression(false);
    let image_id = output.add_object(image);

    let points_per_pixel = POINTS_PER_INCH / dpi as f64;
    let size = (
        width_px as f64 * points_per_pixel,
        height_px as f64 * points_per_pixel,
    );

    let content = Content {
        operations: vec![
            Operation::new("q", vec![]),
            Operation::new(
                "cm",
                vec![
                    Object::Real(size.0 as f32),
                    0.into(),
                    0.into(),
                    Object::Real(size.1 as f32),
                    0.into(),
                    0.into(),
                ],
            ),
            Operation::new("Do", vec![Object::Name(b"Im0".to_vec())]),
            Operation::new("Q", vec![]),
        ],
    };

    let resources = dictionary! {
        "XObject" => dictionary! { "Im0" => image_id },
    };

    finish_single_page(&mut output, size, resources, content)
}
