//! Rasterizer backed by a pdfium shared library, bound at runtime.

use super::{PageRasterizer, MAX_RENDER_PIXELS};
use crate::document::SourceDocument;
use crate::error::LayoutError;
use image::{DynamicImage, RgbImage, RgbaImage};
use pdfium_render::prelude::*;

pub struct PdfiumRasterizer {
    pdfium: Pdfium,
}

impl PdfiumRasterizer {
    /// Bind pdfium from the working directory, then from the system library path
    pub fn new() -> Result<Self, LayoutError> {
        let bindings = Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
            .or_else(|_| Pdfium::bind_to_system_library())
            .map_err(|e| LayoutError::Render(format!("Failed to bind pdfium library: {}", e)))?;

        Ok(Self {
            pdfium: Pdfium::new(bindings),
        })
    }
}

impl PageRasterizer for PdfiumRasterizer {
    fn name(&self) -> &'static str {
        "pdfium"
    }

    fn rasterize(&self, source: &SourceDocument<'_>, dpi: f32) -> Result<RgbImage, LayoutError> {
        let document = self
            .pdfium
            .load_pdf_from_byte_slice(source.raw(), None)
            .map_err(|e| LayoutError::Render(format!("pdfium could not open the label: {}", e)))?;
        let page = document
            .pages()
            .get(0)
            .map_err(|e| LayoutError::Render(format!("pdfium could not load the page: {}", e)))?;

        // pdfium reports the displayed size, /Rotate included
        let scale = dpi / 72.0;
        let width = (page.width().value * scale).round().max(1.0) as i32;
        let height = (page.height().value * scale).round().max(1.0) as i32;
        if width as u64 * height as u64 > MAX_RENDER_PIXELS {
            return Err(LayoutError::Render(format!(
                "Page renders to {}x{} pixels at {} dpi, above the {} pixel limit",
                width, height, dpi, MAX_RENDER_PIXELS
            )));
        }

        let bitmap = page
            .render_with_config(
                &PdfRenderConfig::new()
                    .set_target_width(width)
                    .set_target_height(height)
                    .render_form_data(true)
                    .render_annotations(true),
            )
            .map_err(|e| LayoutError::Render(format!("pdfium failed to render: {}", e)))?;

        let rgba = RgbaImage::from_raw(
            bitmap.width() as u32,
            bitmap.height() as u32,
            bitmap.as_rgba_bytes(),
        )
        .ok_or_else(|| LayoutError::Render("pdfium returned a short bitmap".into()))?;

        Ok(DynamicImage::ImageRgba8(rgba).to_rgb8())
    }
}
