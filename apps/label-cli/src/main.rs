//! `label-layout` binary

use clap::Parser;
use label_cli::{run, Args};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // stdout is reserved for --inspect output
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let report = run(&args)?;
    if let Some(summary) = report.summary {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    }

    Ok(())
}
