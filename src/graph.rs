use crate::ids::{EdgeId, IdAllocator};
use crate::params::Params;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GraphKind {
    #[default]
    Directed,
    Undirected,
}

impl GraphKind {
    pub fn from_keyword(token: &str) -> Option<Self> {
        match token {
            "digraph" => Some(Self::Directed),
            "graph" => Some(Self::Undirected),
            _ => None,
        }
    }

    pub fn keyword(self) -> &'static str {
        match self {
            Self::Directed => "digraph",
            Self::Undirected => "graph",
        }
    }

    pub fn connector(self) -> &'static str {
        match self {
            Self::Directed => "->",
            Self::Undirected => "--",
        }
    }
}

#[derive(Debug, Clone)]
enum NodeBody {
    Plain(Params),
    Graph(Box<Graph>),
}

/// A node, identified by a caller-chosen id that must be a valid DOT id.
#[derive(Debug, Clone)]
pub struct Node {
    id: String,
    body: NodeBody,
}

impl Node {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            body: NodeBody::Plain(Params::new()),
        }
    }

    /// A node standing for a nested graph. Its parameters are the nested
    /// graph's own graph-level parameters.
    pub fn with_graph(id: impl Into<String>, graph: Graph) -> Self {
        Self {
            id: id.into(),
            body: NodeBody::Graph(Box::new(graph)),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn nested_graph(&self) -> Option<&Graph> {
        match &self.body {
            NodeBody::Plain(_) => None,
            NodeBody::Graph(graph) => Some(graph),
        }
    }

    pub fn params(&self) -> &Params {
        match &self.body {
            NodeBody::Plain(params) => params,
            NodeBody::Graph(graph) => graph.params(),
        }
    }

    pub fn params_mut(&mut self) -> &mut Params {
        match &mut self.body {
            NodeBody::Plain(params) => params,
            NodeBody::Graph(graph) => graph.params_mut(),
        }
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.params().get(name)
    }

    pub fn set_param(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.params_mut().set(name, value);
        self
    }
}

#[derive(Debug, Clone)]
pub struct Edge {
    id: EdgeId,
    dest: String,
    params: Params,
}

impl Edge {
    pub fn id(&self) -> EdgeId {
        self.id
    }

    /// Destination node id. The source is whichever adjacency list holds
    /// the edge; see [`Graph::edge_source`].
    pub fn dest(&self) -> &str {
        &self.dest
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    pub fn params_mut(&mut self) -> &mut Params {
        &mut self.params
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name)
    }

    pub fn set_param(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.params.set(name, value);
        self
    }
}

/// One outgoing adjacency entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Connection {
    pub dest: String,
    pub edge: EdgeId,
}

/// A flat graph: nodes keyed by id, edges keyed by generated id, and an
/// adjacency relation from each source node to its (destination, edge)
/// pairs.
///
/// Parallel edges are kept; [`Graph::edge_between`] only reports the first
/// one in adjacency order, so iterate [`Graph::edges`] to see them all.
#[derive(Debug, Clone)]
pub struct Graph {
    name: Option<String>,
    kind: GraphKind,
    params: Params,
    node_params: Params,
    edge_params: Params,
    nodes: BTreeMap<String, Node>,
    edges: BTreeMap<EdgeId, Edge>,
    adjacency: BTreeMap<String, Vec<Connection>>,
    ids: IdAllocator,
}

impl Graph {
    /// Creates an empty graph drawing edge ids from the process-wide
    /// sequence.
    pub fn new(name: impl Into<String>, kind: GraphKind) -> Self {
        Self::with_allocator(Some(name.into()), kind, IdAllocator::process())
    }

    pub fn anonymous(kind: GraphKind) -> Self {
        Self::with_allocator(None, kind, IdAllocator::process())
    }

    pub fn with_allocator(name: Option<String>, kind: GraphKind, ids: IdAllocator) -> Self {
        Self {
            name,
            kind,
            params: Params::new(),
            node_params: Params::new(),
            edge_params: Params::new(),
            nodes: BTreeMap::new(),
            edges: BTreeMap::new(),
            adjacency: BTreeMap::new(),
            ids,
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn set_name(&mut self, name: Option<String>) {
        self.name = name;
    }

    pub fn kind(&self) -> GraphKind {
        self.kind
    }

    pub fn allocator(&self) -> &IdAllocator {
        &self.ids
    }

    /// Inserts `node`, replacing any node with the same id. The node starts
    /// with no outgoing edges; edges a replaced node had as source are
    /// dropped.
    pub fn add_node(&mut self, node: Node) {
        let id = node.id.clone();
        if let Some(previous) = self.adjacency.insert(id.clone(), Vec::new()) {
            for connection in previous {
                self.edges.remove(&connection.edge);
            }
        }
        self.nodes.insert(id, node);
    }

    /// Returns the node with `id`, inserting a plain node if it is absent.
    pub fn ensure_node(&mut self, id: &str) -> &mut Node {
        self.adjacency.entry(id.to_string()).or_default();
        self.nodes
            .entry(id.to_string())
            .or_insert_with(|| Node::new(id))
    }

    /// Adds an edge from `source` to `dest`. Either node is registered if
    /// the graph does not know its id yet; otherwise the stored node wins.
    pub fn add_edge(&mut self, source: Node, dest: Node) -> &mut Edge {
        let source_id = source.id.clone();
        let dest_id = dest.id.clone();
        self.register(dest);
        self.register(source);
        self.link(source_id, dest_id)
    }

    pub fn add_edge_between(&mut self, source: &str, dest: &str) -> &mut Edge {
        self.ensure_node(dest);
        self.ensure_node(source);
        self.link(source.to_string(), dest.to_string())
    }

    fn register(&mut self, node: Node) {
        if !self.nodes.contains_key(&node.id) {
            self.adjacency.insert(node.id.clone(), Vec::new());
            self.nodes.insert(node.id.clone(), node);
        }
    }

    fn link(&mut self, source: String, dest: String) -> &mut Edge {
        let id = self.ids.next_edge_id();
        self.adjacency.entry(source).or_default().push(Connection {
            dest: dest.clone(),
            edge: id,
        });
        self.edges.entry(id).or_insert(Edge {
            id,
            dest,
            params: Params::new(),
        })
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn node_mut(&mut self, id: &str) -> Option<&mut Node> {
        self.nodes.get_mut(id)
    }

    pub fn edge(&self, id: EdgeId) -> Option<&Edge> {
        self.edges.get(&id)
    }

    pub fn edge_mut(&mut self, id: EdgeId) -> Option<&mut Edge> {
        self.edges.get_mut(&id)
    }

    /// Looks up an edge by its textual id (`edge12`).
    pub fn edge_by_name(&self, id: &str) -> Option<&Edge> {
        id.parse().ok().and_then(|id| self.edges.get(&id))
    }

    /// Outgoing connections of `node`: empty for a node without outgoing
    /// edges, `None` when the node is not in the graph.
    pub fn connections(&self, node: &str) -> Option<&[Connection]> {
        self.adjacency.get(node).map(Vec::as_slice)
    }

    /// The first edge from `source` to `dest` in adjacency order. Parallel
    /// edges after the first are not reported; the reverse direction never
    /// is.
    pub fn edge_between(&self, source: &str, dest: &str) -> Option<&Edge> {
        self.adjacency
            .get(source)?
            .iter()
            .find(|connection| connection.dest == dest)
            .and_then(|connection| self.edges.get(&connection.edge))
    }

    pub fn edge_source(&self, id: EdgeId) -> Option<&str> {
        self.adjacency
            .iter()
            .find(|(_, connections)| connections.iter().any(|c| c.edge == id))
            .map(|(source, _)| source.as_str())
    }

    /// Every adjacency entry as `(source, connection)`, grouped by source in
    /// node id order and in insertion order within a source.
    pub fn links(&self) -> impl Iterator<Item = (&str, &Connection)> {
        self.adjacency.iter().flat_map(|(source, connections)| {
            connections
                .iter()
                .map(move |connection| (source.as_str(), connection))
        })
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.values()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Removes the node and every edge that starts or ends at it.
    pub fn remove_node(&mut self, id: &str) -> Option<Node> {
        let node = self.nodes.remove(id)?;
        if let Some(outgoing) = self.adjacency.remove(id) {
            for connection in outgoing {
                self.edges.remove(&connection.edge);
            }
        }
        let edges = &mut self.edges;
        for connections in self.adjacency.values_mut() {
            connections.retain(|connection| {
                if connection.dest == id {
                    edges.remove(&connection.edge);
                    false
                } else {
                    true
                }
            });
        }
        tracing::trace!(node = id, "removed node");
        Some(node)
    }

    /// Removes the edge. Its endpoints stay in the graph even if they end up
    /// unconnected.
    pub fn remove_edge(&mut self, id: EdgeId) -> Option<Edge> {
        let edge = self.edges.remove(&id)?;
        for connections in self.adjacency.values_mut() {
            if let Some(pos) = connections.iter().position(|c| c.edge == id) {
                connections.remove(pos);
                break;
            }
        }
        tracing::trace!(edge = %id, "removed edge");
        Some(edge)
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    pub fn params_mut(&mut self) -> &mut Params {
        &mut self.params
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name)
    }

    pub fn set_param(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.params.set(name, value);
    }

    /// Defaults written once as `node [...]`.
    pub fn node_params(&self) -> &Params {
        &self.node_params
    }

    pub fn node_param(&self, name: &str) -> Option<&str> {
        self.node_params.get(name)
    }

    pub fn set_node_param(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.node_params.set(name, value);
    }

    /// Defaults written once as `edge [...]`.
    pub fn edge_params(&self) -> &Params {
        &self.edge_params
    }

    pub fn edge_param(&self, name: &str) -> Option<&str> {
        self.edge_params.get(name)
    }

    pub fn set_edge_param(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.edge_params.set(name, value);
    }
}

impl Default for Graph {
    fn default() -> Self {
        Self::anonymous(GraphKind::Directed)
    }
}
