use std::path::PathBuf;

use clap::Parser;
use mq_utils::{FitStrategy, FittingConfig, PaintMode};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod avatar;
mod color;
mod fetch;
mod painter;
mod plugins;
mod session;
mod shell;
mod wardrobe;

#[derive(Parser, Debug)]
#[command(name = "mq-client")]
#[command(about = "Mannequin fitting room: wear garment photos on a 3D avatar")]
struct Args {
    /// Config file (defaults to ./mannequin.toml when present)
    #[arg(long)]
    config: Option<PathBuf>,
    /// Avatar model, relative to the asset root
    #[arg(long)]
    model: Option<String>,
    /// Image proxy endpoint
    #[arg(long)]
    proxy: Option<String>,
    /// panel, paint or auto
    #[arg(long, value_parser = parse_strategy)]
    strategy: Option<FitStrategy>,
    /// solid or hybrid
    #[arg(long, value_parser = parse_paint_mode)]
    paint_mode: Option<PaintMode>,
}

impl Args {
    fn apply(self, config: &mut FittingConfig) {
        if let Some(model) = self.model {
            config.model_path = model;
        }
        if let Some(proxy) = self.proxy {
            config.proxy_endpoint = Some(proxy);
        }
        if let Some(strategy) = self.strategy {
            config.strategy = strategy;
        }
        if let Some(paint_mode) = self.paint_mode {
            config.paint_mode = paint_mode;
        }
    }
}

fn parse_strategy(raw: &str) -> Result<FitStrategy, String> {
    match raw {
        "panel" => Ok(FitStrategy::Panel),
        "paint" => Ok(FitStrategy::Paint),
        "auto" => Ok(FitStrategy::Auto),
        other => Err(format!("unknown strategy {other:?}")),
    }
}

fn parse_paint_mode(raw: &str) -> Result<PaintMode, String> {
    match raw {
        "solid" => Ok(PaintMode::Solid),
        "hybrid" => Ok(PaintMode::Hybrid),
        other => Err(format!("unknown paint mode {other:?}")),
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .without_time()
        .compact()
        .init();

    let args = Args::parse();
    let mut config = FittingConfig::load_or_default(args.config.as_deref())?;
    args.apply(&mut config);

    info!("Starting mannequin fitting room");
    let (mut app, handle) = session::initialize(&config)?;
    info!("{}", shell::HELP);
    shell::spawn_stdin_shell(handle);
    app.run();
    Ok(())
}
