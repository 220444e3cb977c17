//! Strategy selection
//!
//! Both pipelines honor the same contract: one-page PDF bytes in, the laid
//! out PDF bytes out, or an error and no output at all.

use crate::config::LayoutConfig;
use crate::error::LayoutError;
use crate::raster::{BasicRasterizer, RasterStrategy};
use crate::vector::VectorStrategy;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub trait LayoutStrategy {
    /// Short name used in logs and response headers
    fn name(&self) -> &'static str;

    fn process(&self, source: &[u8]) -> Result<Vec<u8>, LayoutError>;
}

impl<S: LayoutStrategy + ?Sized> LayoutStrategy for Box<S> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn process(&self, source: &[u8]) -> Result<Vec<u8>, LayoutError> {
        (**self).process(source)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrategyKind {
    #[default]
    Vector,
    Raster,
    /// Vector first, raster when the vector pipeline cannot produce output
    Auto,
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StrategyKind::Vector => write!(f, "vector"),
            StrategyKind::Raster => write!(f, "raster"),
            StrategyKind::Auto => write!(f, "auto"),
        }
    }
}

impl FromStr for StrategyKind {
    type Err = LayoutError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "vector" => Ok(StrategyKind::Vector),
            "raster" => Ok(StrategyKind::Raster),
            "auto" => Ok(StrategyKind::Auto),
            other => Err(LayoutError::InvalidConfig(format!(
                "Unknown strategy: {} (expected vector, raster or auto)",
                other
            ))),
        }
    }
}

/// Try `primary`, and on an output-side failure try `secondary`.
///
/// Input and configuration errors are returned from the primary attempt
/// as-is; running the secondary on the same bad input would fail the same way.
pub struct FallbackStrategy<P, S> {
    primary: P,
    secondary: S,
}

impl<P: LayoutStrategy, S: LayoutStrategy> FallbackStrategy<P, S> {
    pub fn new(primary: P, secondary: S) -> Self {
        Self { primary, secondary }
    }
}

impl<P: LayoutStrategy, S: LayoutStrategy> LayoutStrategy for FallbackStrategy<P, S> {
    fn name(&self) -> &'static str {
        "auto"
    }

    fn process(&self, source: &[u8]) -> Result<Vec<u8>, LayoutError> {
        match self.primary.process(source) {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.is_validation() => Err(e),
            Err(e) => {
                tracing::warn!(
                    primary = self.primary.name(),
                    secondary = self.secondary.name(),
                    error = %e,
                    "primary layout strategy failed, falling back"
                );
                self.secondary.process(source)
            }
        }
    }
}

/// Raster pipeline with the best rasterizer this build can use.
///
/// With the `pdfium` feature the pdfium library is bound when it can be
/// found; otherwise, or when binding fails, the built-in rasterizer is used.
pub fn raster_strategy(config: LayoutConfig) -> Box<dyn LayoutStrategy> {
    #[cfg(feature = "pdfium")]
    {
        match crate::raster::PdfiumRasterizer::new() {
            Ok(rasterizer) => return Box::new(RasterStrategy::new(config, rasterizer)),
            Err(e) => tracing::warn!(error = %e, "pdfium unavailable, using built-in rasterizer"),
        }
    }
    Box::new(RasterStrategy::new(config, BasicRasterizer::new()))
}

/// Build the strategy for `kind`.
pub fn build_strategy(kind: StrategyKind, config: LayoutConfig) -> Box<dyn LayoutStrategy> {
    match kind {
        StrategyKind::Vector => Box::new(VectorStrategy::new(config)),
        StrategyKind::Raster => raster_strategy(config),
        StrategyKind::Auto => Box::new(FallbackStrategy::new(
            VectorStrategy::new(config.clone()),
            raster_strategy(config),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Scripted {
        name: &'static str,
        result: fn() -> Result<Vec<u8>, LayoutError>,
        calls: AtomicUsize,
    }

    impl Scripted {
        fn new(name: &'static str, result: fn() -> Result<Vec<u8>, LayoutError>) -> Self {
            Self {
                name,
                result,
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl LayoutStrategy for Scripted {
        fn name(&self) -> &'static str {
            self.name
        }

        fn process(&self, _source: &[u8]) -> Result<Vec<u8>, LayoutError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            (self.result)()
        }
    }

    #[test]
    fn test_strategy_kind_parses() {
        assert_eq!("vector".parse::<StrategyKind>().unwrap(), StrategyKind::Vector);
        assert_eq!(" RASTER ".parse::<StrategyKind>().unwrap(), StrategyKind::Raster);
        assert_eq!("auto".parse::<StrategyKind>().unwrap(), StrategyKind::Auto);
        assert!("bitmap".parse::<StrategyKind>().is_err());
    }

    #[test]
    fn test_strategy_kind_serde_lowercase() {
        let json = serde_json::to_string(&StrategyKind::Raster).unwrap();
        assert_eq!(json, r#""raster""#);
        let kind: StrategyKind = serde_json::from_str(r#""auto""#).unwrap();
        assert_eq!(kind, StrategyKind::Auto);
    }

    #[test]
    fn test_fallback_uses_secondary_on_encode_failure() {
        let strategy = FallbackStrategy::new(
            Scripted::new("a", || Err(LayoutError::Encode("boom".into()))),
            Scripted::new("b", || Ok(vec![1, 2, 3])),
        );
        assert_eq!(strategy.process(b"").unwrap(), vec![1, 2, 3]);
        assert_eq!(strategy.secondary.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_fallback_does_not_retry_validation_errors() {
        let strategy = FallbackStrategy::new(
            Scripted::new("a", || Err(LayoutError::PageCount { found: 3 })),
            Scripted::new("b", || Ok(vec![1])),
        );
        assert!(matches!(
            strategy.process(b""),
            Err(LayoutError::PageCount { found: 3 })
        ));
        assert_eq!(strategy.secondary.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_fallback_skips_secondary_on_success() {
        let strategy = FallbackStrategy::new(
            Scripted::new("a", || Ok(vec![7])),
            Scripted::new("b", || Ok(vec![8])),
        );
        assert_eq!(strategy.process(b"").unwrap(), vec![7]);
        assert_eq!(strategy.secondary.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_build_strategy_names() {
        let config = LayoutConfig::default();
        assert_eq!(build_strategy(StrategyKind::Vector, config.clone()).name(), "vector");
        assert_eq!(build_strategy(StrategyKind::Raster, config.clone()).name(), "raster");
        assert_eq!(build_strategy(StrategyKind::Auto, config).name(), "auto");
    }

    #[test]
    fn test_boxed_strategy_delegates() {
        let boxed: Box<dyn LayoutStrategy> = Box::new(Scripted::new("inner", || Ok(vec![4])));
        let strategy = FallbackStrategy::new(
            Scripted::new("a", || Err(LayoutError::Render("no renderer".into()))),
            boxed,
        );
        assert_eq!(strategy.secondary.name(), "inner");
        assert_eq!(strategy.process(b"").unwrap(), vec![4]);
    }

    #[cfg(not(feature = "pdfium"))]
    #[test]
    fn test_raster_strategy_without_pdfium_refuses_text() {
        use crate::test_support::{create_test_pdf, TestPage};

        let page = TestPage {
            contents: vec![b"BT /F1 24 Tf 5 30 Td (HONEY) Tj ET".to_vec()],
            ..Default::default()
        };
        let pdf = create_test_pdf(&[page]);
        let strategy = raster_strategy(LayoutConfig::default());
        assert!(matches!(strategy.process(&pdf), Err(LayoutError::Render(_))));
    }
}
