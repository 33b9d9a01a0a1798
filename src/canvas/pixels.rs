// src/canvas/pixels.rs
// Validation of submitted block artwork
use crate::canvas::error::{CanvasError, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// 8x8 transparent PNG used for seeded blocks
pub const PLACEHOLDER_ARTIFACT: &str = "data:image/png;base64,iVBORw0KGgoAAAANSUhEUgAAAAgAAAAICAYAAADED76LAAAABHNCSVQICAgIfAhkiAAAAAlwSFlzAAAAdgAAAHYBTnsmCAAAABl0RVh0U29mdHdhcmUAd3d3Lmlua3NjYXBlLm9yZ5vuPBoAAAANSURBVBiVY2AYBaNgFAAABQABDQottAAAAABJRU5ErkJggg==";

/// One painted cell inside a block's sub-grid
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PixelData {
    pub row: u32,
    pub column: u32,
    pub color: String,
}

impl PixelData {
    pub fn new(row: u32, column: u32, color: impl Into<String>) -> Self {
        Self {
            row,
            column,
            color: color.into(),
        }
    }
}

/// Dimensions of the paintable area inside one block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubGrid {
    pub rows: u32,
    pub cols: u32,
}

impl SubGrid {
    pub fn new(rows: u32, cols: u32) -> Self {
        Self { rows, cols }
    }

    pub fn contains(&self, row: u32, column: u32) -> bool {
        row < self.rows && column < self.cols
    }
}

impl Default for SubGrid {
    fn default() -> Self {
        Self { rows: 8, cols: 8 }
    }
}

/// Accepts `#RGB`, `#RRGGBB` and `#RRGGBBAA`; returns upper-case `#RRGGBB[AA]`.
pub fn normalize_color(raw: &str) -> Option<String> {
    let hex = raw.trim().strip_prefix('#')?;
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let expanded = match hex.len() {
        3 => hex.chars().flat_map(|c| [c, c]).collect::<String>(),
        6 | 8 => hex.to_string(),
        _ => return None,
    };
    Some(format!("#{}", expanded.to_ascii_uppercase()))
}

/// Checks every entry and collapses repeated cells, last write wins.
///
/// The first bad entry rejects the whole set. A repeated cell keeps the
/// position of its first occurrence so unique input comes back unchanged.
pub fn normalize_pixels(pixels: Vec<PixelData>, grid: SubGrid) -> Result<Vec<PixelData>> {
    let mut out: Vec<PixelData> = Vec::with_capacity(pixels.len());
    let mut seen: HashMap<(u32, u32), usize> = HashMap::with_capacity(pixels.len());

    for (i, px) in pixels.into_iter().enumerate() {
        if !grid.contains(px.row, px.column) {
            return Err(CanvasError::InvalidPayload(format!(
                "pixelData[{}] at ({}, {}) is outside the {}x{} block",
                i, px.row, px.column, grid.rows, grid.cols
            )));
        }
        let color = normalize_color(&px.color).ok_or_else(|| {
            CanvasError::InvalidPayload(format!("pixelData[{}] has invalid color {:?}", i, px.color))
        })?;

        match seen.get(&(px.row, px.column)) {
            Some(&slot) => out[slot].color = color,
            None => {
                seen.insert((px.row, px.column), out.len());
                out.push(PixelData::new(px.row, px.column, color));
            }
        }
    }

    Ok(out)
}

/// The artifact is opaque, but must be present and, when sent as a data URL,
/// carry a decodable base64 body.
pub fn validate_artifact(artifact: &str) -> Result<()> {
    if artifact.trim().is_empty() {
        return Err(CanvasError::InvalidPayload("artifact is empty".into()));
    }

    let Some(rest) = artifact.strip_prefix("data:") else {
        return Ok(());
    };
    let (meta, payload) = rest
        .split_once(',')
        .ok_or_else(|| CanvasError::InvalidPayload("data URL has no payload".into()))?;
    if !meta.ends_with(";base64") {
        return Err(CanvasError::InvalidPayload(
            "data URL must be base64 encoded".into(),
        ));
    }
    STANDARD
        .decode(payload)
        .map_err(|e| CanvasError::InvalidPayload(format!("artifact is not valid base64: {}", e)))?;
    Ok(())
}
