use std::collections::HashMap;

use crate::model::EdgeInput;

/// Edge between two tokens, in input edge order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenEdge {
    pub source: String,
    pub target: String,
}

/// Dense `"0".."N-1"` aliases for node ids that appear as edge endpoints.
///
/// Tokens are handed out in first-seen order, scanning edges left to right
/// and each edge's source before its target, so identical input always
/// produces identical tokens.
#[derive(Debug, Clone, Default)]
pub struct TokenMap {
    forward: HashMap<String, String>,
    inverse: Vec<String>,
}

impl TokenMap {
    pub fn from_edges(edges: &[EdgeInput]) -> (Self, Vec<TokenEdge>) {
        let mut map = Self::default();
        let token_edges = edges
            .iter()
            .map(|edge| {
                let source = map.intern(&edge.source);
                let target = map.intern(&edge.target);
                TokenEdge { source, target }
            })
            .collect();
        (map, token_edges)
    }

    fn intern(&mut self, id: &str) -> String {
        if let Some(token) = self.forward.get(id) {
            return token.clone();
        }
        let token = self.inverse.len().to_string();
        self.forward.insert(id.to_string(), token.clone());
        self.inverse.push(id.to_string());
        token
    }

    pub fn token(&self, id: &str) -> Option<&str> {
        self.forward.get(id).map(String::as_str)
    }

    pub fn identity(&self, token: &str) -> Option<&str> {
        let idx: usize = token.parse().ok()?;
        if idx.to_string() != token {
            return None;
        }
        self.inverse.get(idx).map(String::as_str)
    }

    /// Ids in token order.
    pub fn identities(&self) -> impl Iterator<Item = &str> {
        self.inverse.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.inverse.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inverse.is_empty()
    }
}
