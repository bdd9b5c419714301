use crate::config::DotConfig;
use crate::correspondence::Correspondence;
use crate::graph::Graph;
use crate::params::Params;
use std::collections::BTreeSet;

/// DOT text for a graph plus the visual ids assigned while writing it.
#[derive(Debug, Clone, Default)]
pub struct DotDocument {
    pub text: String,
    pub correspondence: Correspondence,
}

impl DotDocument {
    /// True when no node or edge statement was written, i.e. there is
    /// nothing for the engine to draw.
    pub fn is_blank(&self) -> bool {
        self.correspondence.is_empty()
    }
}

struct VisualIds<'a> {
    config: &'a DotConfig,
    next_node: usize,
    next_edge: usize,
}

impl<'a> VisualIds<'a> {
    fn new(config: &'a DotConfig) -> Self {
        Self {
            config,
            next_node: 1,
            next_edge: 1,
        }
    }

    fn node(&mut self) -> String {
        let id = format!("{}{}", self.config.node_id_prefix, self.next_node);
        self.next_node += 1;
        id
    }

    fn edge(&mut self) -> String {
        let id = format!("{}{}", self.config.edge_id_prefix, self.next_edge);
        self.next_edge += 1;
        id
    }
}

/// Writes `graph` as DOT, giving every emitted node and edge statement a
/// fresh `id` attribute and recording it in the returned correspondence.
///
/// Nodes are written the first time an edge touches them, so nodes with no
/// edges are left out unless [`DotConfig::emit_isolated_nodes`] is set. The
/// output only depends on the graph's content: the same graph always yields
/// the same text and ids.
pub fn write_dot(graph: &Graph, config: &DotConfig) -> DotDocument {
    let mut out = String::new();
    let mut correspondence = Correspondence::default();
    let mut ids = VisualIds::new(config);
    let mut emitted: BTreeSet<&str> = BTreeSet::new();

    out.push_str(graph.kind().keyword());
    out.push(' ');
    if let Some(name) = graph.name() {
        out.push_str(name);
        out.push(' ');
    }
    out.push_str("{ ");

    if !graph.params().is_empty() {
        write_params(&mut out, graph.params().iter(), ";\n");
        out.push_str(";\n");
    }
    if !graph.node_params().is_empty() {
        out.push_str("node ");
        write_attr_list(&mut out, graph.node_params(), None);
        out.push_str(";\n");
    }
    if !graph.edge_params().is_empty() {
        out.push_str("edge ");
        write_attr_list(&mut out, graph.edge_params(), None);
        out.push_str(";\n");
    }

    let connector = graph.kind().connector();
    for (source, connection) in graph.links() {
        let Some(edge) = graph.edge(connection.edge) else {
            continue;
        };
        for endpoint in [source, connection.dest.as_str()] {
            if emitted.insert(endpoint) {
                write_node(&mut out, graph, endpoint, &mut ids, &mut correspondence);
            }
        }

        let visual = ids.edge();
        out.push_str(source);
        out.push(' ');
        out.push_str(connector);
        out.push(' ');
        out.push_str(edge.dest());
        write_attr_list(&mut out, edge.params(), Some(&visual));
        out.push_str(";\n");
        correspondence.edges.insert(visual, edge.id());
    }

    if config.emit_isolated_nodes {
        for node in graph.nodes() {
            if emitted.insert(node.id()) {
                write_node(&mut out, graph, node.id(), &mut ids, &mut correspondence);
            }
        }
    }

    out.push_str(" }");

    tracing::debug!(
        nodes = correspondence.nodes.len(),
        edges = correspondence.edges.len(),
        skipped = graph.node_count().saturating_sub(emitted.len()),
        "serialized graph"
    );

    DotDocument {
        text: out,
        correspondence,
    }
}

fn write_node(
    out: &mut String,
    graph: &Graph,
    id: &str,
    ids: &mut VisualIds<'_>,
    correspondence: &mut Correspondence,
) {
    let visual = ids.node();
    out.push_str(id);
    match graph.node(id) {
        Some(node) => write_attr_list(out, node.params(), Some(&visual)),
        None => write_attr_list(out, &Params::new(), Some(&visual)),
    }
    out.push_str(";\n");
    correspondence.nodes.insert(visual, id.to_string());
}

fn write_attr_list(out: &mut String, params: &Params, visual_id: Option<&str>) {
    if params.is_empty() && visual_id.is_none() {
        return;
    }
    out.push('[');
    write_params(
        out,
        params.iter().chain(visual_id.map(|id| ("id", id))),
        ",",
    );
    out.push(']');
}

fn write_params<'a>(out: &mut String, params: impl Iterator<Item = (&'a str, &'a str)>, sep: &str) {
    for (idx, (name, value)) in params.enumerate() {
        if idx > 0 {
            out.push_str(sep);
        }
        out.push_str(name);
        out.push('=');
        out.push_str(value);
    }
}
