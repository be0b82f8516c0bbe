use crate::model::{Fields, LayoutResult, PositionedNode};
use serde::Serialize;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

/// Response shape for message-passing callers: each edge carries copies of
/// its endpoint node objects instead of indices.
#[derive(Debug, Serialize)]
pub struct LayoutResponse<'a> {
    pub nodes: &'a [PositionedNode],
    pub edges: Vec<EdgeResponse<'a>>,
}

#[derive(Debug, Serialize)]
pub struct EdgeResponse<'a> {
    pub source: &'a PositionedNode,
    pub target: &'a PositionedNode,
    #[serde(flatten)]
    pub fields: &'a Fields,
}

impl<'a> LayoutResponse<'a> {
    pub fn from_result(result: &'a LayoutResult) -> Self {
        let edges = result
            .edges
            .iter()
            .map(|edge| EdgeResponse {
                source: result.source(edge),
                target: result.target(edge),
                fields: &edge.fields,
            })
            .collect();
        LayoutResponse {
            nodes: &result.nodes,
            edges,
        }
    }

    pub fn to_json_string(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

pub fn write_response(path: &Path, result: &LayoutResult) -> anyhow::Result<()> {
    let file = File::create(path)?;
    let writer = BufWriter::new(file);
    serde_json::to_writer_pretty(writer, &LayoutResponse::from_result(result))?;
    Ok(())
}
