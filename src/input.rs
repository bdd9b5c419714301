use crate::error::{Error, Result};
use crate::graph::{Graph, GraphKind, Node};
use crate::ids::IdAllocator;
use crate::params::Params;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Graph description read by the CLI and the wasm wrapper.
///
/// ```json5
/// {
///   name: "G",
///   kind: "digraph",
///   params: { rankdir: "LR" },
///   nodeDefaults: { shape: "box" },
///   nodes: [{ id: "A", params: { color: "red" } }],
///   edges: [{ from: "A", to: "B", params: { label: "go" } }],
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GraphSpec {
    pub name: Option<String>,
    /// `digraph` (default) or `graph`.
    pub kind: Option<String>,
    pub params: Params,
    pub node_defaults: Params,
    pub edge_defaults: Params,
    pub nodes: Vec<NodeSpec>,
    pub edges: Vec<EdgeSpec>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeSpec {
    pub id: String,
    #[serde(default)]
    pub params: Params,
    /// Makes the node a nested graph; its own params are the graph's.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub graph: Option<Box<GraphSpec>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeSpec {
    pub from: String,
    pub to: String,
    #[serde(default)]
    pub params: Params,
}

/// Parses a graph description as JSON, falling back to JSON5.
pub fn parse_graph(text: &str) -> Result<GraphSpec> {
    match serde_json::from_str(text) {
        Ok(spec) => Ok(spec),
        Err(json_err) => json5::from_str(text).map_err(|_| Error::Input {
            message: json_err.to_string(),
        }),
    }
}

impl GraphSpec {
    /// Builds a graph whose edge ids come from the process-wide sequence.
    pub fn build(&self) -> Result<Graph> {
        self.build_with(IdAllocator::process())
    }

    pub fn build_with(&self, ids: IdAllocator) -> Result<Graph> {
        let kind = match self.kind.as_deref() {
            None => GraphKind::Directed,
            Some(keyword) => GraphKind::from_keyword(keyword).ok_or_else(|| Error::Input {
                message: format!("unknown graph kind `{keyword}`"),
            })?,
        };
        let mut graph = Graph::with_allocator(self.name.clone(), kind, ids.clone());
        *graph.params_mut() = self.params.clone();
        for (name, value) in self.node_defaults.iter() {
            graph.set_node_param(name, value);
        }
        for (name, value) in self.edge_defaults.iter() {
            graph.set_edge_param(name, value);
        }

        let mut seen = BTreeSet::new();
        for spec in &self.nodes {
            require_id(&spec.id, "node")?;
            if !seen.insert(spec.id.as_str()) {
                return Err(Error::Input {
                    message: format!("duplicate node `{}`", spec.id),
                });
            }
            let mut node = match &spec.graph {
                Some(nested) => Node::with_graph(&spec.id, nested.build_with(ids.clone())?),
                None => Node::new(&spec.id),
            };
            node.params_mut().extend(spec.params.iter());
            graph.add_node(node);
        }

        for spec in &self.edges {
            require_id(&spec.from, "edge source")?;
            require_id(&spec.to, "edge destination")?;
            let edge = graph.add_edge_between(&spec.from, &spec.to);
            edge.params_mut().extend(spec.params.iter());
        }

        tracing::debug!(
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            "built graph from description"
        );
        Ok(graph)
    }
}

fn require_id(id: &str, what: &str) -> Result<()> {
    if id.trim().is_empty() {
        return Err(Error::Input {
            message: format!("{what} id must not be empty"),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DotConfig;
    use crate::dot::write_dot;

    #[test]
    fn json_description_builds_graph() {
        let spec = parse_graph(
            r#"{
                "name": "G",
                "params": {"rankdir": "LR"},
                "nodeDefaults": {"shape": "box"},
                "nodes": [{"id": "A", "params": {"color": "red"}}],
                "edges": [{"from": "A", "to": "B", "params": {"label": "go"}}]
            }"#,
        )
        .unwrap();
        let graph = spec.build_with(IdAllocator::new()).unwrap();
        assert_eq!(graph.name(), Some("G"));
        assert_eq!(graph.kind(), GraphKind::Directed);
        assert_eq!(graph.param("rankdir"), Some("LR"));
        assert_eq!(graph.node_param("shape"), Some("box"));
        assert_eq!(graph.node("A").unwrap().param("color"), Some("red"));
        assert!(graph.node("B").is_some());
        assert_eq!(graph.edge_between("A", "B").unwrap().param("label"), Some("go"));
    }

    #[test]
    fn json5_and_undirected() {
        let spec = parse_graph("{ kind: 'graph', edges: [{ from: 'a', to: 'b', },], }").unwrap();
        let graph = spec.build_with(IdAllocator::new()).unwrap();
        assert_eq!(graph.kind(), GraphKind::Undirected);
        let dot = write_dot(&graph, &DotConfig::default());
        assert!(dot.text.starts_with("graph {"));
        assert!(dot.text.contains("a -- b[id=edge1];"));
    }

    #[test]
    fn nested_graph_nodes() {
        let spec = parse_graph(
            r#"{"nodes": [{"id": "cluster_0", "params": {"label": "inner"}, "graph": {"edges": [{"from": "x", "to": "y"}]}}]}"#,
        )
        .unwrap();
        let graph = spec.build_with(IdAllocator::new()).unwrap();
        let node = graph.node("cluster_0").unwrap();
        assert_eq!(node.param("label"), Some("inner"));
        assert_eq!(node.nested_graph().unwrap().edge_count(), 1);
    }

    #[test]
    fn bad_descriptions_are_input_errors() {
        assert!(matches!(parse_graph("nope"), Err(Error::Input { .. })));

        let unknown_kind = GraphSpec {
            kind: Some("hypergraph".to_string()),
            ..GraphSpec::default()
        };
        let err = unknown_kind.build().unwrap_err();
        assert!(err.to_string().contains("hypergraph"));

        let duplicate = parse_graph(r#"{"nodes": [{"id": "A"}, {"id": "A"}]}"#).unwrap();
        assert!(duplicate.build().unwrap_err().to_string().contains("duplicate"));

        let blank = parse_graph(r#"{"edges": [{"from": " ", "to": "B"}]}"#).unwrap();
        assert!(matches!(blank.build(), Err(Error::Input { .. })));
    }
}
