//! Command-line front end for the jar label layout

use anyhow::{Context, Result};
use clap::Parser;
use label_layout::{
    inspect, FitMode, LayoutConfig, LayoutEngine, OutputSummary, ProcessMetrics, Rotation,
    StrategyKind, OUTPUT_FILENAME,
};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "label-layout")]
#[command(
    version,
    about = "Lay out three turned copies of a one-page label PDF on 3.625in x 1in stock"
)]
pub struct Args {
    /// One-page label PDF
    pub input: PathBuf,

    /// Where to write the laid out sheet
    #[arg(short, long, default_value = OUTPUT_FILENAME)]
    pub output: PathBuf,

    /// Layout strategy: vector, raster or auto
    #[arg(short, long, default_value = "vector")]
    pub strategy: StrategyKind,

    /// Raster resolution in dots per inch
    #[arg(long, default_value = "300")]
    pub dpi: f32,

    /// How the turned label fills its slot: stretch or proportional
    #[arg(long, default_value = "stretch")]
    pub fit: FitMode,

    /// Turn copies counter-clockwise instead of clockwise
    #[arg(long)]
    pub counter_clockwise: bool,

    /// Print a JSON summary of the written sheet to stdout
    #[arg(long)]
    pub inspect: bool,
}

impl Args {
    pub fn layout_config(&self) -> LayoutConfig {
        LayoutConfig {
            dpi: self.dpi,
            fit: self.fit,
            rotation: if self.counter_clockwise {
                Rotation::CounterClockwise
            } else {
                Rotation::Clockwise
            },
            ..Default::default()
        }
    }
}

#[derive(Debug)]
pub struct RunReport {
    pub metrics: ProcessMetrics,
    pub summary: Option<OutputSummary>,
}

/// Read the input, lay it out and write the sheet
pub fn run(args: &Args) -> Result<RunReport> {
    let source = std::fs::read(&args.input)
        .with_context(|| format!("Failed to read {}", args.input.display()))?;

    let engine = LayoutEngine::new(args.layout_config(), args.strategy)?;
    let output = engine
        .process(&source)
        .with_context(|| format!("Failed to lay out {}", args.input.display()))?;

    std::fs::write(&args.output, &output.bytes)
        .with_context(|| format!("Failed to write {}", args.output.display()))?;
    tracing::info!(
        output = %args.output.display(),
        bytes = output.bytes.len(),
        "Wrote label sheet"
    );

    let summary = if args.inspect {
        Some(inspect(&output.bytes)?)
    } else {
        None
    };

    Ok(RunReport {
        metrics: output.metrics,
        summary,
    })
}
