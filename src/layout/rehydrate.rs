use std::collections::{HashMap, HashSet};

use crate::error::{LayoutError, Result};
use crate::model::{
    EdgeInput, Fields, LayoutResult, NodeIndex, NodeInput, PositionedEdge, PositionedNode,
};

use super::engine::GeometricGraph;
use super::tokens::TokenMap;

/// Attach computed centers to the caller's nodes and point edges at them.
///
/// Only nodes that received a token are kept, in caller order.
pub(crate) fn rehydrate(
    nodes: &[NodeInput],
    edges: &[EdgeInput],
    tokens: &TokenMap,
    geometry: &GeometricGraph,
) -> Result<LayoutResult> {
    let mut seen: HashSet<&str> = HashSet::with_capacity(nodes.len());
    for node in nodes {
        if !seen.insert(node.id.as_str()) {
            return Err(LayoutError::DuplicateNode {
                id: node.id.clone(),
            });
        }
    }

    let mut positioned = Vec::with_capacity(tokens.len());
    let mut arena: HashMap<&str, NodeIndex> = HashMap::with_capacity(tokens.len());
    for node in nodes {
        let Some(token) = tokens.token(&node.id) else {
            continue;
        };
        let center = geometry
            .center(token)
            .ok_or_else(|| LayoutError::MissingPosition {
                token: token.to_string(),
            })?;
        // Computed coordinates replace any the caller sent along.
        let fields: Fields = node
            .fields
            .iter()
            .filter(|(key, _)| !matches!(key.as_str(), "x" | "y"))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();
        arena.insert(node.id.as_str(), NodeIndex(positioned.len()));
        positioned.push(PositionedNode {
            id: node.id.clone(),
            x: center.x,
            y: center.y,
            fields,
        });
    }

    let lookup = |id: &str| {
        arena
            .get(id)
            .copied()
            .ok_or_else(|| LayoutError::UnknownNode { id: id.to_string() })
    };
    let edges = edges
        .iter()
        .map(|edge| {
            Ok(PositionedEdge {
                source: lookup(&edge.source)?,
                target: lookup(&edge.target)?,
                fields: edge.fields.clone(),
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(LayoutResult {
        nodes: positioned,
        edges,
    })
}
