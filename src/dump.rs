use crate::graph::Graph;
use crate::ids::EdgeId;
use crate::surface::{Surface, SurfaceState};
use serde::Serialize;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

#[derive(Debug, Serialize)]
pub struct IdDump {
    pub state: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub nodes: Vec<NodeIdDump>,
    pub edges: Vec<EdgeIdDump>,
}

#[derive(Debug, Serialize)]
pub struct NodeIdDump {
    pub id: String,
    pub visual: String,
}

#[derive(Debug, Serialize)]
pub struct EdgeIdDump {
    pub id: EdgeId,
    pub visual: String,
    pub from: Option<String>,
    pub to: Option<String>,
}

impl IdDump {
    pub fn from_surface(surface: &Surface, graph: &Graph) -> Self {
        let correspondence = surface.correspondence();
        let nodes = correspondence
            .nodes
            .iter()
            .map(|(visual, id)| NodeIdDump {
                id: id.clone(),
                visual: visual.to_string(),
            })
            .collect();
        let edges = correspondence
            .edges
            .iter()
            .map(|(visual, id)| EdgeIdDump {
                id: *id,
                visual: visual.to_string(),
                from: graph.edge_source(*id).map(str::to_string),
                to: graph.edge(*id).map(|edge| edge.dest().to_string()),
            })
            .collect();
        let state = match surface.state() {
            SurfaceState::Empty => "empty",
            SurfaceState::Displaying => "displaying",
            SurfaceState::Error(_) => "error",
        };

        Self {
            state: state.to_string(),
            error: surface.error_message().map(str::to_string),
            nodes,
            edges,
        }
    }
}

pub fn write_id_dump(path: &Path, surface: &Surface, graph: &Graph) -> anyhow::Result<()> {
    let file = File::create(path)?;
    let writer = BufWriter::new(file);
    let dump = IdDump::from_surface(surface, graph);
    serde_json::to_writer_pretty(writer, &dump)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::EngineError;
    use crate::graph::GraphKind;
    use crate::ids::IdAllocator;

    #[test]
    fn dump_lists_rendered_ids() {
        let mut graph = Graph::with_allocator(None, GraphKind::Directed, IdAllocator::new());
        graph.add_edge_between("A", "B");
        let engine = |_: &str| -> Result<String, EngineError> {
            Ok(r#"<svg xmlns="http://www.w3.org/2000/svg"><g id="node1"/></svg>"#.to_string())
        };
        let mut surface = Surface::new();
        surface.render(&graph, &engine).unwrap();

        let dump = IdDump::from_surface(&surface, &graph);
        assert_eq!(dump.state, "displaying");
        assert_eq!(dump.nodes.len(), 2);
        assert_eq!(dump.edges.len(), 1);
        assert_eq!(dump.edges[0].from.as_deref(), Some("A"));
        assert_eq!(dump.edges[0].to.as_deref(), Some("B"));

        let json = serde_json::to_value(&dump).unwrap();
        assert_eq!(json["edges"][0]["id"], "edge0");
        assert_eq!(json["edges"][0]["visual"], "edge1");
        assert!(json.get("error").is_none());
    }

    #[test]
    fn dump_of_failed_render_carries_the_error() {
        let mut graph = Graph::with_allocator(None, GraphKind::Directed, IdAllocator::new());
        graph.add_edge_between("A", "B");
        let engine =
            |_: &str| -> Result<String, EngineError> { Err(EngineError::Rejected("bad".into())) };
        let mut surface = Surface::new();
        let _ = surface.render(&graph, &engine);

        let dump = IdDump::from_surface(&surface, &graph);
        assert_eq!(dump.state, "error");
        assert_eq!(dump.error.as_deref(), Some("bad"));
        assert!(dump.nodes.is_empty());
    }
}
