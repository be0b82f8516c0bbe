//! Stacking of disconnected components.
//!
//! The layout engine places every component in one coordinate space, so
//! unrelated clusters can overlap. Components are found with a union-find
//! over node indices while edges are scanned in order, each component
//! keeping a running bounding box of its node centers. Afterwards the
//! components are stacked top to bottom with a fixed gap.

use std::collections::HashMap;

use crate::model::{Bounds, LayoutResult, NodeIndex, PositionedEdge, PositionedNode};

#[derive(Debug, Clone, Copy)]
struct Group {
    /// Creation sequence of the group that survived every merge.
    seq: usize,
    bounds: Bounds,
}

/// One connected component, in stacking order.
#[derive(Debug, Clone, PartialEq)]
pub struct Component {
    pub members: Vec<NodeIndex>,
    pub bounds: Bounds,
}

struct DisjointSet {
    parent: Vec<usize>,
    size: Vec<usize>,
    grouped: Vec<bool>,
    groups: Vec<Option<Group>>,
    next_seq: usize,
}

impl DisjointSet {
    fn new(len: usize) -> Self {
        Self {
            parent: (0..len).collect(),
            size: vec![1; len],
            grouped: vec![false; len],
            groups: vec![None; len],
            next_seq: 0,
        }
    }

    fn find(&mut self, node: usize) -> usize {
        let mut root = node;
        while self.parent[root] != root {
            root = self.parent[root];
        }
        let mut cur = node;
        while self.parent[cur] != root {
            let next = self.parent[cur];
            self.parent[cur] = root;
            cur = next;
        }
        root
    }

    fn owner(&mut self, node: usize) -> Option<usize> {
        if self.grouped[node] {
            Some(self.find(node))
        } else {
            None
        }
    }

    /// Attach an ungrouped node to the group rooted at `root`.
    fn attach(&mut self, root: usize, node: usize, nodes: &[PositionedNode]) {
        self.parent[node] = root;
        self.size[root] += 1;
        self.grouped[node] = true;
        if let Some(group) = self.groups[root].as_mut() {
            group.bounds = group.bounds.include(nodes[node].position());
        }
    }

    fn add_edge(&mut self, edge: &PositionedEdge, nodes: &[PositionedNode]) {
        let source = edge.source.index();
        let target = edge.target.index();
        match (self.owner(source), self.owner(target)) {
            (Some(a), Some(b)) if a == b => {}
            (Some(a), Some(b)) => {
                // The source's group absorbs the target's group.
                let (Some(keep), Some(absorbed)) = (self.groups[a].take(), self.groups[b].take())
                else {
                    return;
                };
                let merged = Group {
                    seq: keep.seq,
                    bounds: keep.bounds.union(absorbed.bounds),
                };
                let (root, child) = if self.size[a] >= self.size[b] {
                    (a, b)
                } else {
                    (b, a)
                };
                self.parent[child] = root;
                self.size[root] += self.size[child];
                self.groups[root] = Some(merged);
            }
            (Some(a), None) => self.attach(a, target, nodes),
            (None, Some(b)) => self.attach(b, source, nodes),
            (None, None) => {
                let bounds = Bounds::from_point(nodes[source].position())
                    .include(nodes[target].position());
                self.grouped[source] = true;
                if target != source {
                    self.parent[target] = source;
                    self.size[source] += 1;
                    self.grouped[target] = true;
                }
                self.groups[source] = Some(Group {
                    seq: self.next_seq,
                    bounds,
                });
                self.next_seq += 1;
            }
        }
    }
}

/// Connected components over the edges of `result`, ordered by the creation
/// of the group that survived each merge.
pub fn components(result: &LayoutResult) -> Vec<Component> {
    let mut set = DisjointSet::new(result.nodes.len());
    for edge in &result.edges {
        set.add_edge(edge, &result.nodes);
    }

    let mut members: HashMap<usize, Vec<NodeIndex>> = HashMap::new();
    for node in 0..result.nodes.len() {
        if let Some(root) = set.owner(node) {
            members.entry(root).or_default().push(NodeIndex(node));
        }
    }

    let mut ordered: Vec<(usize, Component)> = members
        .into_iter()
        .filter_map(|(root, members)| {
            set.groups[root].map(|group| {
                (
                    group.seq,
                    Component {
                        members,
                        bounds: group.bounds,
                    },
                )
            })
        })
        .collect();
    ordered.sort_by_key(|(seq, _)| *seq);
    ordered.into_iter().map(|(_, component)| component).collect()
}

/// Stack components vertically, `gap` apart, aligned to the first
/// component's left edge. The first component does not move.
///
/// Returns the number of components.
pub fn separate_subgraphs(result: &mut LayoutResult, gap: f64) -> usize {
    let groups = components(result);
    let Some(first) = groups.first() else {
        return 0;
    };

    let baseline_left = first.bounds.left;
    let mut previous_bottom = first.bounds.bottom;
    for group in groups.iter().skip(1) {
        let dx = baseline_left - group.bounds.left;
        let dy = previous_bottom + gap - group.bounds.top;
        for member in &group.members {
            result.nodes[member.index()].translate(dx, dy);
        }
        previous_bottom = group.bounds.bottom + dy;
    }
    groups.len()
}
