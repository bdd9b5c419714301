use crate::ids::EdgeId;
use std::collections::BTreeMap;

/// Visual-id ↔ domain-id pairs for one render.
///
/// Both directions are kept in step by [`IdMap::insert`]; the map never
/// holds a visual id without its domain id or the other way round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdMap<D: Ord + Clone> {
    by_visual: BTreeMap<String, D>,
    by_domain: BTreeMap<D, String>,
}

impl<D: Ord + Clone> Default for IdMap<D> {
    fn default() -> Self {
        Self {
            by_visual: BTreeMap::new(),
            by_domain: BTreeMap::new(),
        }
    }
}

impl<D: Ord + Clone> IdMap<D> {
    pub fn insert(&mut self, visual: String, domain: D) {
        if let Some(stale) = self.by_domain.insert(domain.clone(), visual.clone()) {
            self.by_visual.remove(&stale);
        }
        if let Some(stale) = self.by_visual.insert(visual, domain) {
            self.by_domain.remove(&stale);
        }
    }

    pub fn domain_of(&self, visual: &str) -> Option<&D> {
        self.by_visual.get(visual)
    }

    pub fn visual_of(&self, domain: &D) -> Option<&str> {
        self.by_domain.get(domain).map(String::as_str)
    }

    pub fn contains_domain(&self, domain: &D) -> bool {
        self.by_domain.contains_key(domain)
    }

    pub fn visual_ids(&self) -> impl Iterator<Item = &str> {
        self.by_visual.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &D)> {
        self.by_visual.iter().map(|(v, d)| (v.as_str(), d))
    }

    pub fn len(&self) -> usize {
        self.by_visual.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_visual.is_empty()
    }
}

/// The node and edge id maps produced by one serialization.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Correspondence {
    pub nodes: IdMap<String>,
    pub edges: IdMap<EdgeId>,
}

impl Correspondence {
    pub fn node_for_visual(&self, visual: &str) -> Option<&str> {
        self.nodes.domain_of(visual).map(String::as_str)
    }

    pub fn visual_for_node(&self, node: &str) -> Option<&str> {
        self.nodes.visual_of(&node.to_string())
    }

    pub fn edge_for_visual(&self, visual: &str) -> Option<EdgeId> {
        self.edges.domain_of(visual).copied()
    }

    pub fn visual_for_edge(&self, edge: EdgeId) -> Option<&str> {
        self.edges.visual_of(&edge)
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn both_directions_resolve() {
        let mut map = Correspondence::default();
        map.nodes.insert("node1".to_string(), "A".to_string());
        let edge: EdgeId = "edge7".parse().unwrap();
        map.edges.insert("edge1".to_string(), edge);

        assert_eq!(map.node_for_visual("node1"), Some("A"));
        assert_eq!(map.visual_for_node("A"), Some("node1"));
        assert_eq!(map.edge_for_visual("edge1"), Some(edge));
        assert_eq!(map.visual_for_edge(edge), Some("edge1"));
        assert_eq!(map.node_for_visual("edge1"), None);
    }

    #[test]
    fn reinserting_a_domain_id_drops_the_stale_visual_id() {
        let mut map: IdMap<String> = IdMap::default();
        map.insert("node1".to_string(), "A".to_string());
        map.insert("node2".to_string(), "A".to_string());
        assert_eq!(map.len(), 1);
        assert_eq!(map.domain_of("node1"), None);
        assert_eq!(map.visual_of(&"A".to_string()), Some("node2"));
    }
}
