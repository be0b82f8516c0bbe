use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Caller payload carried through the layout untouched.
pub type Fields = Map<String, Value>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeInput {
    pub id: String,
    #[serde(flatten)]
    pub fields: Fields,
}

impl NodeInput {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            fields: Fields::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeInput {
    pub source: String,
    pub target: String,
    #[serde(flatten)]
    pub fields: Fields,
}

impl EdgeInput {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            fields: Fields::new(),
        }
    }
}

/// One layout request. `config` is reserved and not read by the pipeline.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LayoutRequest {
    #[serde(default)]
    pub nodes: Vec<NodeInput>,
    #[serde(default)]
    pub edges: Vec<EdgeInput>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<Value>,
}

impl LayoutRequest {
    pub fn new(nodes: Vec<NodeInput>, edges: Vec<EdgeInput>) -> Self {
        Self {
            nodes,
            edges,
            config: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned extents over a set of node centers. `top` is the smallest y.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Bounds {
    pub top: f64,
    pub bottom: f64,
    pub left: f64,
    pub right: f64,
}

impl Bounds {
    pub fn from_point(point: Point) -> Self {
        Self {
            top: point.y,
            bottom: point.y,
            left: point.x,
            right: point.x,
        }
    }

    /// Bounds of all points, or all-zero extents when there are none.
    pub fn of_points<I: IntoIterator<Item = Point>>(points: I) -> Self {
        let mut iter = points.into_iter();
        let Some(first) = iter.next() else {
            return Self::default();
        };
        iter.fold(Self::from_point(first), |bounds, p| bounds.include(p))
    }

    #[must_use]
    pub fn include(self, point: Point) -> Self {
        Self {
            top: self.top.min(point.y),
            bottom: self.bottom.max(point.y),
            left: self.left.min(point.x),
            right: self.right.max(point.x),
        }
    }

    #[must_use]
    pub fn union(self, other: Self) -> Self {
        Self {
            top: self.top.min(other.top),
            bottom: self.bottom.max(other.bottom),
            left: self.left.min(other.left),
            right: self.right.max(other.right),
        }
    }

    pub fn center(&self) -> Point {
        Point::new(
            (self.left + self.right) / 2.0,
            (self.top + self.bottom) / 2.0,
        )
    }

    pub fn width(&self) -> f64 {
        self.right - self.left
    }

    pub fn height(&self) -> f64 {
        self.bottom - self.top
    }
}

/// Index of a node in [`LayoutResult::nodes`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeIndex(pub usize);

impl NodeIndex {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PositionedNode {
    pub id: String,
    pub x: f64,
    pub y: f64,
    #[serde(flatten)]
    pub fields: Fields,
}

impl PositionedNode {
    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn translate(&mut self, dx: f64, dy: f64) {
        self.x += dx;
        self.y += dy;
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PositionedEdge {
    pub source: NodeIndex,
    pub target: NodeIndex,
    pub fields: Fields,
}

/// Output of one layout pass. Edge endpoints index into `nodes`, so a moved
/// node is seen through every edge touching it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LayoutResult {
    pub nodes: Vec<PositionedNode>,
    pub edges: Vec<PositionedEdge>,
}

impl LayoutResult {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }

    pub fn node(&self, index: NodeIndex) -> &PositionedNode {
        &self.nodes[index.0]
    }

    pub fn source(&self, edge: &PositionedEdge) -> &PositionedNode {
        self.node(edge.source)
    }

    pub fn target(&self, edge: &PositionedEdge) -> &PositionedNode {
        self.node(edge.target)
    }

    pub fn find(&self, id: &str) -> Option<&PositionedNode> {
        self.nodes.iter().find(|node| node.id == id)
    }

    pub fn bounds(&self) -> Bounds {
        Bounds::of_points(self.nodes.iter().map(PositionedNode::position))
    }
}
