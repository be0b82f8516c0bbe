mod center;
pub mod dot;
pub mod engine;
mod rehydrate;
pub mod separate;
pub mod tokens;

pub use center::center_nodes;
pub use engine::{DagreBackend, Description, GeometricGraph, LayoutBackend, parse_description};
pub use separate::{Component, components, separate_subgraphs};
pub use tokens::{TokenEdge, TokenMap};

use tracing::{debug, debug_span, trace, warn};

use crate::config::LayoutConfig;
use crate::error::Result;
use crate::model::{LayoutRequest, LayoutResult};

/// Lay out `request` with the dagre backend.
pub fn compute_layout(request: &LayoutRequest, config: &LayoutConfig) -> Result<LayoutResult> {
    compute_layout_with(&DagreBackend, request, config)
}

/// Run the whole pipeline: tokenize, describe, lay out, rehydrate, stack
/// disconnected components and center on the origin.
///
/// Nodes that are not an endpoint of any edge are not part of the result.
pub fn compute_layout_with(
    backend: &dyn LayoutBackend,
    request: &LayoutRequest,
    config: &LayoutConfig,
) -> Result<LayoutResult> {
    let _span = debug_span!(
        "layout",
        nodes = request.nodes.len(),
        edges = request.edges.len()
    )
    .entered();

    if request.config.is_some() {
        warn!("request config is reserved and ignored");
    }
    if request.edges.is_empty() {
        debug!("no edges, nothing to lay out");
        return Ok(LayoutResult::default());
    }

    let (tokens, token_edges) = TokenMap::from_edges(&request.edges);
    debug!(tokens = tokens.len(), "tokenized edge endpoints");

    let description = dot::serialize_graph(&token_edges, config);
    trace!(%description, "layout description");

    let geometry = engine::layout_description(backend, &description, config)?;
    let mut result =
        rehydrate::rehydrate(&request.nodes, &request.edges, &tokens, &geometry)?;
    let skipped = request.nodes.len().saturating_sub(result.nodes.len());
    if skipped > 0 {
        debug!(skipped, "nodes without edges are not positioned");
    }

    let groups = separate_subgraphs(&mut result, config.subgraph_gap);
    debug!(groups, "stacked connected components");

    center_nodes(&mut result.nodes);
    Ok(result)
}

/// The layout description that [`compute_layout`] would hand to the backend.
pub fn describe(request: &LayoutRequest, config: &LayoutConfig) -> String {
    let (_, token_edges) = TokenMap::from_edges(&request.edges);
    dot::serialize_graph(&token_edges, config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LayoutError;
    use crate::model::{EdgeInput, NodeInput, Point};

    /// Places tokens on a diagonal so tests do not depend on dagre.
    struct DiagonalBackend;

    impl LayoutBackend for DiagonalBackend {
        fn layout(&self, description: &Description, _: &LayoutConfig) -> Result<GeometricGraph> {
            let mut geometry = GeometricGraph::default();
            for (i, node) in description.nodes.iter().enumerate() {
                geometry.push(node.id.clone(), Point::new(i as f64 * 100.0, i as f64 * 10.0));
            }
            Ok(geometry)
        }
    }

    struct FailingBackend;

    impl LayoutBackend for FailingBackend {
        fn layout(&self, _: &Description, _: &LayoutConfig) -> Result<GeometricGraph> {
            Err(LayoutError::Engine {
                message: "boom".to_string(),
            })
        }
    }

    fn request(nodes: &[&str], edges: &[(&str, &str)]) -> LayoutRequest {
        LayoutRequest::new(
            nodes.iter().map(|id| NodeInput::new(*id)).collect(),
            edges.iter().map(|(s, t)| EdgeInput::new(*s, *t)).collect(),
        )
    }

    #[test]
    fn pipeline_separates_and_centers() {
        let req = request(&["a", "b", "c", "d"], &[("a", "b"), ("c", "d")]);
        let result = compute_layout_with(&DiagonalBackend, &req, &LayoutConfig::default()).unwrap();
        assert_eq!(result.nodes.len(), 4);

        let bounds = result.bounds();
        assert!(bounds.center().x.abs() < 1e-9);
        assert!(bounds.center().y.abs() < 1e-9);

        let a = result.find("a").unwrap();
        let b = result.find("b").unwrap();
        let c = result.find("c").unwrap();
        let d = result.find("d").unwrap();
        assert_eq!(a.x, c.x);
        assert!((b.x - a.x - (d.x - c.x)).abs() < 1e-9);
        assert!((c.y.min(d.y) - a.y.max(b.y)) >= 200.0 - 1e-9);
    }

    #[test]
    fn empty_edges_short_circuit() {
        let req = request(&["a"], &[]);
        let result = compute_layout_with(&FailingBackend, &req, &LayoutConfig::default()).unwrap();
        assert!(result.is_empty());
    }

    #[test]
    fn backend_failure_propagates() {
        let req = request(&["a", "b"], &[("a", "b")]);
        let err = compute_layout_with(&FailingBackend, &req, &LayoutConfig::default()).unwrap_err();
        assert!(matches!(err, LayoutError::Engine { .. }));
    }

    #[test]
    fn describe_matches_tokenized_edges() {
        let req = request(&["web", "api"], &[("web", "api")]);
        let text = describe(&req, &LayoutConfig::default());
        assert!(text.contains("0 -> 1"));
        assert!(!text.contains("web"));
    }
}
