// src/main.rs
use anyhow::{bail, Result};
use clap::Parser;
use log::info;
use pixel_canvas::{api, Canvas, CanvasConfig};
use std::sync::Arc;

/// Shared pixel canvas server
#[derive(Parser, Debug)]
#[command(name = "canvas", version, about)]
struct Cli {
    /// Number of block rows
    #[arg(long)]
    rows: Option<usize>,

    /// Number of block columns
    #[arg(long)]
    cols: Option<usize>,

    /// Paintable rows inside each block
    #[arg(long)]
    sub_rows: Option<u32>,

    /// Paintable columns inside each block
    #[arg(long)]
    sub_cols: Option<u32>,

    /// Lease lifetime in milliseconds
    #[arg(long)]
    lease_ttl_ms: Option<u64>,

    /// Pre-complete every n-th block at startup
    #[arg(long)]
    seed_every: Option<usize>,

    /// Address to serve the API on
    #[arg(long)]
    addr: Option<String>,
}

impl Cli {
    fn apply(self, config: &mut CanvasConfig) {
        if let Some(v) = self.rows {
            config.rows = v;
        }
        if let Some(v) = self.cols {
            config.cols = v;
        }
        if let Some(v) = self.sub_rows {
            config.sub_rows = v;
        }
        if let Some(v) = self.sub_cols {
            config.sub_cols = v;
        }
        if let Some(v) = self.lease_ttl_ms {
            config.lease_ttl_ms = v;
        }
        if let Some(v) = self.seed_every {
            config.seed_every = Some(v);
        }
        if let Some(v) = self.addr {
            config.api_addr = v;
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init();

    let cli = Cli::parse();
    let mut config = CanvasConfig::from_env()?;
    cli.apply(&mut config);

    let validation = config.validate();
    validation.log();
    if !validation.is_valid() {
        bail!("invalid configuration, refusing to start");
    }

    let canvas = Arc::new(Canvas::new(&config)?);
    info!("canvas ready with {} blocks", canvas.rows() * canvas.cols());

    api::serve(&config, canvas).await
}
