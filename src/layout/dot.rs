//! DOT text emitted for the layout engine.
//!
//! Only the subset understood by [`super::engine::parse_description`] is
//! produced: graph attributes, `a -> b [..]` edges and `a [..]` node
//! declarations. Attribute values are always quoted.

use std::collections::HashSet;
use std::fmt::Write;

use crate::config::LayoutConfig;

use super::tokens::TokenEdge;

/// Escape special characters for quoted DOT strings.
pub fn escape_value(input: &str) -> String {
    input
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
}

pub struct DotBuilder {
    output: String,
}

impl DotBuilder {
    pub fn new(name: &str) -> Self {
        let mut output = String::with_capacity(256);
        let _ = writeln!(output, "digraph {name} {{");
        Self { output }
    }

    pub fn attr(&mut self, key: &str, value: &str) -> &mut Self {
        let _ = writeln!(self.output, "  {}=\"{}\";", key, escape_value(value));
        self
    }

    pub fn node(&mut self, id: &str, attrs: &[(&str, &str)]) -> &mut Self {
        let _ = write!(self.output, "  {id}");
        self.attr_list(attrs);
        self
    }

    pub fn edge(&mut self, from: &str, to: &str, attrs: &[(&str, &str)]) -> &mut Self {
        let _ = write!(self.output, "  {from} -> {to}");
        self.attr_list(attrs);
        self
    }

    fn attr_list(&mut self, attrs: &[(&str, &str)]) {
        if !attrs.is_empty() {
            self.output.push_str(" [");
            for (i, (key, value)) in attrs.iter().enumerate() {
                if i > 0 {
                    self.output.push_str(", ");
                }
                let _ = write!(self.output, "{}=\"{}\"", key, escape_value(value));
            }
            self.output.push(']');
        }
        self.output.push_str(";\n");
    }

    pub fn build(mut self) -> String {
        self.output.push_str("}\n");
        self.output
    }
}

/// Render tokenized edges as a left-to-right digraph.
///
/// Every edge is written, duplicates included. Every endpoint token is
/// declared once with the fixed node size, in first-seen order.
pub fn serialize_graph(edges: &[TokenEdge], config: &LayoutConfig) -> String {
    let mut dot = DotBuilder::new("G");
    dot.attr("rankdir", "LR");
    if config.balance_ranks {
        dot.attr("TBbalance", "min");
    }

    let minlen = config.min_edge_length.to_string();
    for edge in edges {
        dot.edge(&edge.source, &edge.target, &[("minlen", &minlen)]);
    }

    let width = config.node_width.to_string();
    let height = config.node_height.to_string();
    let mut declared: HashSet<&str> = HashSet::new();
    for edge in edges {
        for token in [edge.source.as_str(), edge.target.as_str()] {
            if declared.insert(token) {
                dot.node(
                    token,
                    &[
                        ("shape", "box"),
                        ("fixedsize", "true"),
                        ("width", &width),
                        ("height", &height),
                    ],
                );
            }
        }
    }

    dot.build()
}
