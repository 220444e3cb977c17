//! Jar label layout
//!
//! Takes a one-page PDF label and lays out three copies of it, each turned a
//! quarter turn, side by side on a 3.625in x 1in page.
//!
//! Two strategies produce the output:
//! - `VectorStrategy`: embeds the page once as a Form XObject and draws it
//!   per copy (exact, small output)
//! - `RasterStrategy`: renders the page to pixels, pastes the copies on a
//!   canvas and wraps the canvas in a PDF

pub mod config;
pub mod document;
pub mod error;
pub mod geometry;
pub mod inspect;
pub mod raster;
pub mod strategy;
pub mod vector;
mod writer;

#[cfg(test)]
mod test_support;

pub use config::{FitMode, LayoutConfig, Rotation};
pub use document::SourceDocument;
pub use error::LayoutError;
pub use inspect::{inspect, OutputSummary, PlacementKind, PlacementSummary};
pub use raster::{BasicRasterizer, PageRasterizer, RasterStrategy};
#[cfg(feature = "pdfium")]
pub use raster::PdfiumRasterizer;
pub use strategy::{
    build_strategy, raster_strategy, FallbackStrategy, LayoutStrategy, StrategyKind,
};
pub use vector::VectorStrategy;

use serde::Serialize;
use std::time::Instant;

/// Download name for every produced label sheet
pub const OUTPUT_FILENAME: &str = "processed_label.pdf";

pub const PDF_MIME: &str = "application/pdf";

#[derive(Debug, Clone, Serialize)]
pub struct ProcessMetrics {
    pub input_size_bytes: usize,
    pub output_size_bytes: usize,
    pub strategy: &'static str,
    pub processing_time_ms: u64,
}

#[derive(Debug, Clone)]
pub struct LayoutOutput {
    pub bytes: Vec<u8>,
    pub metrics: ProcessMetrics,
}

/// A validated configuration bound to one strategy
pub struct LayoutEngine {
    config: LayoutConfig,
    strategy: Box<dyn LayoutStrategy>,
}

impl LayoutEngine {
    pub fn new(config: LayoutConfig, kind: StrategyKind) -> Result<Self, LayoutError> {
        config.validate()?;
        let strategy = build_strategy(kind, config.clone());
        Ok(Self { config, strategy })
    }

    /// Use a caller-built strategy, e.g. a `RasterStrategy` over pdfium
    pub fn with_strategy(
        config: LayoutConfig,
        strategy: Box<dyn LayoutStrategy>,
    ) -> Result<Self, LayoutError> {
        config.validate()?;
        Ok(Self { config, strategy })
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    pub fn strategy_name(&self) -> &'static str {
        self.strategy.name()
    }

    pub fn process(&self, source: &[u8]) -> Result<LayoutOutput, LayoutError> {
        let start = Instant::now();
        let bytes = self.strategy.process(source)?;

        let metrics = ProcessMetrics {
            input_size_bytes: source.len(),
            output_size_bytes: bytes.len(),
            strategy: self.strategy.name(),
            processing_time_ms: start.elapsed().as_millis() as u64,
        };
        tracing::info!(
            strategy = metrics.strategy,
            input_bytes = metrics.input_size_bytes,
            output_bytes = metrics.output_size_bytes,
            elapsed_ms = metrics.processing_time_ms,
            "label laid out"
        );

        Ok(LayoutOutput { bytes, metrics })
    }
}

/// Lay out `source` with the default jar label configuration and vector strategy
pub fn process(source: &[u8]) -> Result<Vec<u8>, LayoutError> {
    let engine = LayoutEngine::new(LayoutConfig::default(), StrategyKind::Vector)?;
    Ok(engine.process(source)?.bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::red_square_pdf;

    #[test]
    fn test_engine_rejects_invalid_config_up_front() {
        let config = LayoutConfig {
            copies: 0,
            ..Default::default()
        };
        assert!(matches!(
            LayoutEngine::new(config, StrategyKind::Vector),
            Err(LayoutError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_engine_reports_metrics() {
        let engine = LayoutEngine::new(LayoutConfig::default(), StrategyKind::Raster).unwrap();
        let source = red_square_pdf();
        let output = engine.process(&source).unwrap();

        assert_eq!(output.metrics.strategy, "raster");
        assert_eq!(output.metrics.input_size_bytes, source.len());
        assert_eq!(output.metrics.output_size_bytes, output.bytes.len());
        assert!(output.bytes.starts_with(b"%PDF-"));
    }

    #[test]
    fn test_process_uses_vector_defaults() {
        let output = process(&red_square_pdf()).unwrap();
        let summary = inspect(&output).unwrap();
        assert_eq!(summary.placements.len(), 3);
        assert!((summary.width_pt - 261.0).abs() < 1e-3);
        assert!((summary.height_pt - 72.0).abs() < 1e-3);
    }

    #[test]
    fn test_with_strategy_keeps_custom_name() {
        let config = LayoutConfig::default();
        let engine = LayoutEngine::with_strategy(
            config.clone(),
            Box::new(RasterStrategy::new(config, BasicRasterizer::new())),
        )
        .unwrap();
        assert_eq!(engine.strategy_name(), "raster");
    }
}
