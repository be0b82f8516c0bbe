use crate::model::{Bounds, PositionedNode};

/// Translate `nodes` so the bounding box of their centers sits on the origin.
/// Returns the box measured before the move.
pub fn center_nodes(nodes: &mut [PositionedNode]) -> Bounds {
    let bounds = Bounds::of_points(nodes.iter().map(PositionedNode::position));
    let center = bounds.center();
    for node in nodes.iter_mut() {
        node.translate(-center.x, -center.y);
    }
    bounds
}
