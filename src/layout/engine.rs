//! Hierarchical layout of a DOT description.
//!
//! The description is parsed back into a [`Description`] and handed to a
//! [`LayoutBackend`]. The shipped backend runs dagre.

use std::collections::{HashMap, HashSet};
use std::panic::{self, AssertUnwindSafe};

use dagre_rust::{
    GraphConfig as DagreConfig, GraphEdge as DagreEdge, GraphNode as DagreNode,
    layout as dagre_layout,
};
use graphlib_rust::{Graph as DagreGraph, GraphOption};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::LayoutConfig;
use crate::error::{LayoutError, Result};
use crate::model::Point;

static TOKEN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"^(?:(?P<comment>//[^\n]*|#[^\n]*|/\*(?s:.*?)\*/)|"(?P<quoted>(?:[^"\\]|\\.)*)"|(?P<arrow>->|--)|(?P<id>-?(?:\.[0-9]+|[0-9]+(?:\.[0-9]*)?)|[A-Za-z_][A-Za-z_0-9]*)|(?P<punct>[{}\[\];,=]))"#,
    )
    .unwrap()
});

#[derive(Debug, Clone, PartialEq)]
enum Tok {
    Id(String),
    Arrow,
    UndirectedArrow,
    Punct(char),
}

#[derive(Debug, Clone, PartialEq)]
struct Spanned {
    tok: Tok,
    line: usize,
}

fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

fn tokenize(input: &str) -> Result<Vec<Spanned>> {
    let mut tokens = Vec::new();
    let mut pos = 0;
    let mut line = 1;
    while pos < input.len() {
        let rest = &input[pos..];
        let trimmed = rest.trim_start();
        let skipped = rest.len() - trimmed.len();
        line += rest[..skipped].matches('\n').count();
        pos += skipped;
        if trimmed.is_empty() {
            break;
        }
        let Some(caps) = TOKEN_RE.captures(trimmed) else {
            let found = trimmed.chars().next().unwrap_or_default();
            return Err(LayoutError::Description {
                line,
                message: format!("unexpected character `{found}`"),
            });
        };
        let matched = caps.get(0).map(|m| m.as_str()).unwrap_or_default();
        let tok = if caps.name("comment").is_some() {
            None
        } else if let Some(q) = caps.name("quoted") {
            Some(Tok::Id(unescape(q.as_str())))
        } else if let Some(a) = caps.name("arrow") {
            Some(if a.as_str() == "->" {
                Tok::Arrow
            } else {
                Tok::UndirectedArrow
            })
        } else if let Some(id) = caps.name("id") {
            Some(Tok::Id(id.as_str().to_string()))
        } else {
            caps.name("punct")
                .and_then(|p| p.as_str().chars().next())
                .map(Tok::Punct)
        };
        if let Some(tok) = tok {
            tokens.push(Spanned { tok, line });
        }
        line += matched.matches('\n').count();
        pos += matched.len();
    }
    Ok(tokens)
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DescNode {
    pub id: String,
    pub line: usize,
    pub attrs: HashMap<String, String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DescEdge {
    pub source: String,
    pub target: String,
    pub line: usize,
    pub attrs: HashMap<String, String>,
}

/// Parsed layout description. Nodes are kept in first-appearance order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Description {
    pub name: Option<String>,
    pub attrs: HashMap<String, String>,
    pub nodes: Vec<DescNode>,
    pub edges: Vec<DescEdge>,
}

impl Description {
    pub fn graph_attr(&self, key: &str) -> Option<&str> {
        self.attrs.get(key).map(String::as_str)
    }
}

struct Parser {
    tokens: Vec<Spanned>,
    pos: usize,
    desc: Description,
    node_index: HashMap<String, usize>,
    node_defaults: HashMap<String, String>,
    edge_defaults: HashMap<String, String>,
}

impl Parser {
    fn line(&self) -> usize {
        self.tokens
            .get(self.pos)
            .or_else(|| self.tokens.last())
            .map(|t| t.line)
            .unwrap_or(1)
    }

    fn error<T>(&self, message: impl Into<String>) -> Result<T> {
        Err(LayoutError::Description {
            line: self.line(),
            message: message.into(),
        })
    }

    fn peek(&self) -> Option<&Tok> {
        self.tokens.get(self.pos).map(|t| &t.tok)
    }

    fn eat(&mut self, punct: char) -> bool {
        if self.peek() == Some(&Tok::Punct(punct)) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect_id(&mut self, what: &str) -> Result<String> {
        match self.peek() {
            Some(Tok::Id(id)) => {
                let id = id.clone();
                self.pos += 1;
                Ok(id)
            }
            _ => self.error(format!("expected {what}")),
        }
    }

    fn parse(mut self) -> Result<Description> {
        let mut keyword = self.expect_id("`digraph`")?;
        if keyword.eq_ignore_ascii_case("strict") {
            keyword = self.expect_id("`digraph`")?;
        }
        if keyword.eq_ignore_ascii_case("graph") {
            return self.error("undirected graphs are not supported");
        }
        if !keyword.eq_ignore_ascii_case("digraph") {
            return self.error(format!("expected `digraph`, found `{keyword}`"));
        }
        if let Some(Tok::Id(name)) = self.peek().cloned() {
            self.desc.name = Some(name);
            self.pos += 1;
        }
        if !self.eat('{') {
            return self.error("expected `{`");
        }
        loop {
            match self.peek() {
                None => return self.error("unterminated graph body"),
                Some(Tok::Punct('}')) => {
                    self.pos += 1;
                    break;
                }
                Some(Tok::Punct(';')) => self.pos += 1,
                Some(_) => self.statement()?,
            }
        }
        if self.peek().is_some() {
            return self.error("unexpected content after graph body");
        }
        Ok(self.desc)
    }

    fn statement(&mut self) -> Result<()> {
        let line = self.line();
        let head = self.expect_id("statement")?;
        if head.eq_ignore_ascii_case("subgraph") {
            return self.error("subgraphs are not supported");
        }
        if self.eat('=') {
            let value = self.expect_id("attribute value")?;
            self.set_graph_attr(head, value, line)?;
            return Ok(());
        }
        match head.to_ascii_lowercase().as_str() {
            "graph" => {
                for (key, value) in self.attr_lists()? {
                    self.set_graph_attr(key, value, line)?;
                }
                return Ok(());
            }
            "node" => {
                let attrs = self.attr_lists()?;
                self.node_defaults.extend(attrs);
                return Ok(());
            }
            "edge" => {
                let attrs = self.attr_lists()?;
                self.edge_defaults.extend(attrs);
                return Ok(());
            }
            _ => {}
        }

        let mut chain = vec![head];
        loop {
            match self.peek() {
                Some(Tok::Arrow) => {
                    self.pos += 1;
                    chain.push(self.expect_id("edge target")?);
                }
                Some(Tok::UndirectedArrow) => {
                    return self.error("undirected edge `--` in a digraph");
                }
                _ => break,
            }
        }
        let attrs = self.attr_lists()?;

        if chain.len() == 1 {
            let idx = self.touch_node(&chain[0], line);
            self.desc.nodes[idx].attrs.extend(attrs);
            return Ok(());
        }
        for id in &chain {
            self.touch_node(id, line);
        }
        for pair in chain.windows(2) {
            let mut edge_attrs = self.edge_defaults.clone();
            edge_attrs.extend(attrs.iter().map(|(k, v)| (k.clone(), v.clone())));
            self.desc.edges.push(DescEdge {
                source: pair[0].clone(),
                target: pair[1].clone(),
                line,
                attrs: edge_attrs,
            });
        }
        Ok(())
    }

    fn touch_node(&mut self, id: &str, line: usize) -> usize {
        if let Some(idx) = self.node_index.get(id) {
            return *idx;
        }
        let idx = self.desc.nodes.len();
        self.desc.nodes.push(DescNode {
            id: id.to_string(),
            line,
            attrs: self.node_defaults.clone(),
        });
        self.node_index.insert(id.to_string(), idx);
        idx
    }

    fn attr_lists(&mut self) -> Result<Vec<(String, String)>> {
        let mut attrs = Vec::new();
        while self.eat('[') {
            loop {
                if self.eat(']') {
                    break;
                }
                let key = self.expect_id("attribute name")?;
                if !self.eat('=') {
                    return self.error(format!("expected `=` after `{key}`"));
                }
                let value = self.expect_id("attribute value")?;
                attrs.push((key, value));
                if !self.eat(',') {
                    self.eat(';');
                }
            }
        }
        Ok(attrs)
    }

    fn set_graph_attr(&mut self, key: String, value: String, line: usize) -> Result<()> {
        let valid = match key.as_str() {
            "rankdir" => matches!(value.to_ascii_uppercase().as_str(), "LR" | "RL" | "TB" | "BT"),
            "TBbalance" => matches!(value.as_str(), "min" | "max"),
            _ => true,
        };
        if !valid {
            return Err(LayoutError::Description {
                line,
                message: format!("invalid value `{value}` for `{key}`"),
            });
        }
        self.desc.attrs.insert(key, value);
        Ok(())
    }
}

/// Parse the DOT subset produced by [`super::dot::serialize_graph`].
pub fn parse_description(input: &str) -> Result<Description> {
    let tokens = tokenize(input)?;
    let parser = Parser {
        tokens,
        pos: 0,
        desc: Description::default(),
        node_index: HashMap::new(),
        node_defaults: HashMap::new(),
        edge_defaults: HashMap::new(),
    };
    parser.parse()
}

/// Node centers returned by a backend, in description order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeometricGraph {
    order: Vec<String>,
    centers: HashMap<String, Point>,
}

impl GeometricGraph {
    pub fn push(&mut self, token: impl Into<String>, center: Point) {
        let token = token.into();
        if self.centers.insert(token.clone(), center).is_none() {
            self.order.push(token);
        }
    }

    pub fn center(&self, token: &str) -> Option<Point> {
        self.centers.get(token).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Point)> {
        self.order
            .iter()
            .filter_map(|token| self.centers.get(token).map(|p| (token.as_str(), *p)))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// A hierarchical layout implementation.
pub trait LayoutBackend {
    fn layout(&self, description: &Description, config: &LayoutConfig) -> Result<GeometricGraph>;
}

/// Parse `text` and lay it out with `backend`.
pub fn layout_description(
    backend: &dyn LayoutBackend,
    text: &str,
    config: &LayoutConfig,
) -> Result<GeometricGraph> {
    let description = parse_description(text)?;
    backend.layout(&description, config)
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DagreBackend;

fn dagre_rankdir(value: Option<&str>) -> &'static str {
    match value.map(str::to_ascii_uppercase).as_deref() {
        Some("TB") => "tb",
        Some("BT") => "bt",
        Some("RL") => "rl",
        _ => "lr",
    }
}

/// Network simplex balances ranks; longest path pushes sinks to the last rank.
fn dagre_ranker(balance: Option<&str>) -> &'static str {
    if balance.is_some() {
        "network-simplex"
    } else {
        "longest-path"
    }
}

fn numeric_attr(attrs: &HashMap<String, String>, key: &str, line: usize) -> Result<Option<f32>> {
    let Some(raw) = attrs.get(key) else {
        return Ok(None);
    };
    raw.parse::<f32>()
        .ok()
        .filter(|v| v.is_finite() && *v >= 0.0)
        .map(Some)
        .ok_or_else(|| LayoutError::Description {
            line,
            message: format!("`{key}` must be a non-negative number, got `{raw}`"),
        })
}

fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "layout panicked".to_string()
    }
}

impl LayoutBackend for DagreBackend {
    fn layout(&self, description: &Description, config: &LayoutConfig) -> Result<GeometricGraph> {
        let mut dagre_graph: DagreGraph<DagreConfig, DagreNode, DagreEdge> =
            DagreGraph::new(Some(GraphOption {
                directed: Some(true),
                multigraph: Some(false),
                compound: Some(false),
            }));

        let mut graph_config = DagreConfig::default();
        graph_config.rankdir = Some(dagre_rankdir(description.graph_attr("rankdir")).to_string());
        graph_config.ranker = Some(dagre_ranker(description.graph_attr("TBbalance")).to_string());
        graph_config.nodesep = Some(config.node_separation);
        graph_config.ranksep = Some(config.rank_separation);
        graph_config.marginx = Some(config.margin_x);
        graph_config.marginy = Some(config.margin_y);
        dagre_graph.set_graph(graph_config);

        for node in &description.nodes {
            let mut dagre_node = DagreNode::default();
            dagre_node.width = numeric_attr(&node.attrs, "width", node.line)?
                .unwrap_or(config.node_width);
            dagre_node.height = numeric_attr(&node.attrs, "height", node.line)?
                .unwrap_or(config.node_height);
            dagre_graph.set_node(node.id.clone(), Some(dagre_node));
        }

        // Repeated edges add nothing to a simple graph; the first one's attrs win.
        let mut edge_set: HashSet<(&str, &str)> = HashSet::new();
        for edge in &description.edges {
            let mut edge_label = DagreEdge::default();
            if let Some(minlen) = numeric_attr(&edge.attrs, "minlen", edge.line)? {
                edge_label.minlen = Some(minlen);
            }
            if !edge_set.insert((edge.source.as_str(), edge.target.as_str())) {
                continue;
            }
            let _ = dagre_graph.set_edge(&edge.source, &edge.target, Some(edge_label), None);
        }

        panic::catch_unwind(AssertUnwindSafe(|| {
            dagre_layout::run_layout(&mut dagre_graph);
        }))
        .map_err(|payload| LayoutError::Engine {
            message: panic_message(payload),
        })?;

        let mut geometry = GeometricGraph::default();
        for node in &description.nodes {
            let Some(dagre_node) = dagre_graph.node(&node.id) else {
                return Err(LayoutError::MissingPosition {
                    token: node.id.clone(),
                });
            };
            geometry.push(
                node.id.clone(),
                Point::new(f64::from(dagre_node.x), f64::from(dagre_node.y)),
            );
        }
        Ok(geometry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_serialized_description() {
        let text = r#"digraph G {
  rankdir="LR";
  TBbalance="min";
  0 -> 1 [minlen="3"];
  1 -> 2 [minlen="3"];
  0 [shape="box", fixedsize="true", width="40", height="40"];
  1 [shape="box", fixedsize="true", width="40", height="40"];
  2 [shape="box", fixedsize="true", width="40", height="40"];
}
"#;
        let desc = parse_description(text).unwrap();
        assert_eq!(desc.name.as_deref(), Some("G"));
        assert_eq!(desc.graph_attr("rankdir"), Some("LR"));
        assert_eq!(desc.graph_attr("TBbalance"), Some("min"));
        let ids: Vec<&str> = desc.nodes.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["0", "1", "2"]);
        assert_eq!(desc.edges.len(), 2);
        assert_eq!(desc.edges[1].source, "1");
        assert_eq!(desc.edges[1].attrs["minlen"], "3");
        assert_eq!(desc.edges[1].line, 5);
        assert_eq!(desc.nodes[2].attrs["width"], "40");
    }

    #[test]
    fn supports_chains_defaults_and_comments() {
        let text = "digraph {\n  // header\n  node [width=10];\n  a -> b -> c;\n  /* block\n comment */ graph [rankdir=TB]\n  \"x y\";\n}";
        let desc = parse_description(text).unwrap();
        assert_eq!(desc.name, None);
        assert_eq!(desc.graph_attr("rankdir"), Some("TB"));
        assert_eq!(desc.edges.len(), 2);
        assert_eq!(desc.nodes.len(), 4);
        assert_eq!(desc.nodes[3].id, "x y");
        assert_eq!(desc.nodes[0].attrs["width"], "10");
    }

    #[test]
    fn rejects_malformed_descriptions() {
        let err = parse_description("digraph G {\n  0 -> ;\n}").unwrap_err();
        assert!(matches!(err, LayoutError::Description { line: 2, .. }), "{err:?}");

        let err = parse_description("digraph G {\n  0 -> 1").unwrap_err();
        assert!(matches!(err, LayoutError::Description { .. }));

        let err = parse_description("graph G { a -- b }").unwrap_err();
        assert!(matches!(err, LayoutError::Description { line: 1, .. }));

        let err = parse_description("digraph G {\n rankdir=\"diagonal\";\n}").unwrap_err();
        assert!(matches!(err, LayoutError::Description { line: 2, .. }));

        let err = parse_description("digraph G { a @ b }").unwrap_err();
        assert!(matches!(err, LayoutError::Description { .. }));
    }

    #[test]
    fn rejects_bad_numeric_attributes() {
        let desc = parse_description("digraph G {\n a -> b [minlen=\"far\"];\n}").unwrap();
        let err = DagreBackend
            .layout(&desc, &LayoutConfig::default())
            .unwrap_err();
        assert!(matches!(err, LayoutError::Description { line: 2, .. }));
    }

    #[test]
    fn dagre_places_ranks_left_to_right() {
        let text = "digraph G {\n rankdir=\"LR\";\n 0 -> 1 [minlen=\"3\"];\n 1 -> 2 [minlen=\"3\"];\n}";
        let geometry = layout_description(&DagreBackend, text, &LayoutConfig::default()).unwrap();
        assert_eq!(geometry.len(), 3);
        let x0 = geometry.center("0").unwrap().x;
        let x1 = geometry.center("1").unwrap().x;
        let x2 = geometry.center("2").unwrap().x;
        assert!(x0 < x1 && x1 < x2, "{x0} {x1} {x2}");
        let tokens: Vec<&str> = geometry.iter().map(|(t, _)| t).collect();
        assert_eq!(tokens, vec!["0", "1", "2"]);
    }

    #[test]
    fn balance_hint_pulls_short_branches_forward() {
        // 0 -> 1 -> 2 with a side branch 0 -> 3. Longest path leaves the sink
        // 3 on the last rank next to 2; balanced ranking keeps it next to 1.
        let body = " 0 -> 1;\n 1 -> 2;\n 0 -> 3;\n}";
        let balanced = format!("digraph G {{\n rankdir=\"LR\";\n TBbalance=\"min\";\n{body}");
        let skewed = format!("digraph G {{\n rankdir=\"LR\";\n{body}");
        let config = LayoutConfig::default();

        let geometry = layout_description(&DagreBackend, &balanced, &config).unwrap();
        let x = |token: &str| geometry.center(token).unwrap().x;
        assert!((x("3") - x("1")).abs() < 1e-3, "{} {}", x("3"), x("1"));

        let geometry = layout_description(&DagreBackend, &skewed, &config).unwrap();
        let x = |token: &str| geometry.center(token).unwrap().x;
        assert!((x("3") - x("2")).abs() < 1e-3, "{} {}", x("3"), x("2"));
    }

    #[test]
    fn repeated_edges_are_laid_out_once() {
        let text = "digraph G {\n 0 -> 1 [minlen=\"3\"];\n 0 -> 1 [minlen=\"3\"];\n}";
        let desc = parse_description(text).unwrap();
        assert_eq!(desc.edges.len(), 2);
        let geometry = DagreBackend.layout(&desc, &LayoutConfig::default()).unwrap();
        assert_eq!(geometry.len(), 2);
        assert!(geometry.center("0").unwrap().x < geometry.center("1").unwrap().x);
    }
}
