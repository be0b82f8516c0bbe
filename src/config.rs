use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LayoutConfig {
    /// Distance between adjacent ranks along the flow direction.
    pub rank_separation: f32,
    /// Distance between neighbouring nodes inside one rank.
    pub node_separation: f32,
    /// Minimum edge length in ranks, leaves room for edge labels.
    pub min_edge_length: u32,
    pub node_width: f32,
    pub node_height: f32,
    /// Vertical gap between stacked disconnected components.
    pub subgraph_gap: f64,
    pub balance_ranks: bool,
    pub margin_x: f32,
    pub margin_y: f32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            rank_separation: 60.0,
            node_separation: 40.0,
            min_edge_length: 3,
            node_width: 40.0,
            node_height: 40.0,
            subgraph_gap: 200.0,
            balance_ranks: true,
            margin_x: 0.0,
            margin_y: 0.0,
        }
    }
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<LayoutConfig> {
    let Some(path) = path else {
        return Ok(LayoutConfig::default());
    };

    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    let is_json5 = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("json5"))
        .unwrap_or(false);
    let config = if is_json5 {
        json5::from_str(&contents)
            .with_context(|| format!("parsing config {}", path.display()))?
    } else {
        serde_json::from_str(&contents)
            .with_context(|| format!("parsing config {}", path.display()))?
    };
    Ok(config)
}
