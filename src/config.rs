// src/config.rs
// Canvas configuration loading and startup validation

use crate::canvas::pixels::SubGrid;
use crate::canvas::store::MAX_BLOCKS;
use anyhow::{Context, Result};
use chrono::Duration;
use log::{error, info, warn};
use std::env;
use std::str::FromStr;

/// Default lease lifetime in milliseconds (5 minutes)
pub const DEFAULT_LEASE_TTL_MS: u64 = 5 * 60 * 1000;

/// Grids above this many blocks get a warning; every read sweeps all of them.
const LARGE_GRID_BLOCKS: usize = 1 << 16;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanvasConfig {
    pub rows: usize,
    pub cols: usize,
    pub sub_rows: u32,
    pub sub_cols: u32,
    pub lease_ttl_ms: u64,
    /// Pre-complete every n-th block at startup
    pub seed_every: Option<usize>,
    pub api_addr: String,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            rows: 16,
            cols: 16,
            sub_rows: 8,
            sub_cols: 8,
            lease_ttl_ms: DEFAULT_LEASE_TTL_MS,
            seed_every: None,
            api_addr: "0.0.0.0:8000".to_string(),
        }
    }
}

impl CanvasConfig {
    /// Defaults overridden by `.env` and process environment
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        let mut config = Self::default();

        if let Some(v) = env_parse("CANVAS_ROWS")? {
            config.rows = v;
        }
        if let Some(v) = env_parse("CANVAS_COLS")? {
            config.cols = v;
        }
        if let Some(v) = env_parse("CANVAS_SUB_ROWS")? {
            config.sub_rows = v;
        }
        if let Some(v) = env_parse("CANVAS_SUB_COLS")? {
            config.sub_cols = v;
        }
        if let Some(v) = env_parse("CANVAS_LEASE_TTL_MS")? {
            config.lease_ttl_ms = v;
        }
        if let Some(v) = env_parse("CANVAS_SEED_EVERY")? {
            config.seed_every = Some(v);
        }
        if let Ok(addr) = env::var("API_ADDR") {
            config.api_addr = addr;
        }

        Ok(config)
    }

    pub fn sub_grid(&self) -> SubGrid {
        SubGrid::new(self.sub_rows, self.sub_cols)
    }

    pub fn lease_ttl(&self) -> Duration {
        Duration::milliseconds(i64::try_from(self.lease_ttl_ms).unwrap_or(i64::MAX))
    }

    pub fn validate(&self) -> ConfigReport {
        let mut validation = ConfigReport::default();

        match self.rows.checked_mul(self.cols) {
            Some(0) => validation.reject(format!(
                "grid must have at least one block, got {}x{}",
                self.rows, self.cols
            )),
            Some(n) if n <= MAX_BLOCKS => {
                if n > LARGE_GRID_BLOCKS {
                    validation.warn(format!(
                        "grid of {}x{} blocks is large; every read sweeps all of them",
                        self.rows, self.cols
                    ));
                }
            }
            _ => validation.reject(format!(
                "grid of {}x{} blocks exceeds the limit of {} blocks",
                self.rows, self.cols, MAX_BLOCKS
            )),
        }

        if self.sub_rows == 0 || self.sub_cols == 0 {
            validation.reject(format!(
                "block sub-grid must be at least 1x1, got {}x{}",
                self.sub_rows, self.sub_cols
            ));
        }

        if self.lease_ttl_ms == 0 {
            validation.reject("lease ttl must be greater than zero".into());
        } else if self.lease_ttl_ms < 1_000 {
            validation.warn(format!(
                "lease ttl of {}ms leaves almost no time to draw",
                self.lease_ttl_ms
            ));
        }

        if self.seed_every == Some(0) {
            validation.reject("seed interval must be greater than zero".into());
        }

        if self.api_addr.parse::<std::net::SocketAddr>().is_err() {
            validation.reject(format!("API address '{}' is not a socket address", self.api_addr));
        }

        validation
    }
}

fn env_parse<T>(key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .with_context(|| format!("{} has invalid value '{}'", key, raw)),
        Err(_) => Ok(None),
    }
}

/// Problems found in a [`CanvasConfig`]. Rejections stop startup, warnings don't.
#[derive(Debug, Default)]
pub struct ConfigReport {
    pub warnings: Vec<String>,
    pub rejections: Vec<String>,
}

impl ConfigReport {
    fn warn(&mut self, msg: String) {
        self.warnings.push(msg);
    }

    fn reject(&mut self, msg: String) {
        self.rejections.push(msg);
    }

    pub fn is_valid(&self) -> bool {
        self.rejections.is_empty()
    }

    /// One log line per problem
    pub fn log(&self) {
        for w in &self.warnings {
            warn!("canvas config: {}", w);
        }
        for r in &self.rejections {
            error!("canvas config rejected: {}", r);
        }
        if self.warnings.is_empty() && self.rejections.is_empty() {
            info!("canvas config ok");
        }
    }
}
