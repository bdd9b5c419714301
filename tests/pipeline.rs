use once_cell::sync::Lazy;
use regex::Regex;
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use vizgraph::config::Config;
use vizgraph::{
    ClickEvent, EngineError, Graph, GraphKind, IdAllocator, Surface, SurfaceState, parse_graph,
};

static NODE_STMT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\S+)\[(?:.*,)?id=(node\d+)\];$").unwrap());
static EDGE_STMT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\S+) (?:->|--) (\S+)\[(?:.*,)?id=(edge\d+)\];$").unwrap());

/// Lays nodes out on a column and draws one group per statement, the way
/// `dot -Tsvg` structures its output.
fn graphviz_like(dot: &str) -> Result<String, EngineError> {
    let statements = match (dot.find('{'), dot.trim_end().strip_suffix('}')) {
        (Some(open), Some(head)) => &head[open + 1..],
        _ => {
            return Err(EngineError::Rejected(
                "Error: syntax error in line 1 near ''".to_string(),
            ));
        }
    };
    let mut body = String::new();
    let mut row = 0;
    for line in statements.lines().map(str::trim) {
        if let Some(caps) = EDGE_STMT.captures(line) {
            body.push_str(&format!(
                "<g id=\"{}\" class=\"edge\"><title>{}&#45;&gt;{}</title>\
                 <path fill=\"none\" stroke=\"black\" d=\"M27,-72C27,-64 27,-55 27,-46\"/>\
                 <polygon fill=\"black\" stroke=\"black\" points=\"30.5,-46 27,-36 23.5,-46 30.5,-46\"/></g>\n",
                &caps[3], &caps[1], &caps[2]
            ));
        } else if let Some(caps) = NODE_STMT.captures(line) {
            let cy = -90 + row * 72;
            row += 1;
            body.push_str(&format!(
                "<g id=\"{id}\" class=\"node\"><title>{name}</title>\
                 <g id=\"a_{id}\"><a xlink:href=\"#\" xlink:title=\"{name}\">\
                 <ellipse fill=\"none\" stroke=\"black\" cx=\"27\" cy=\"{cy}\" rx=\"27\" ry=\"18\"/>\
                 <text text-anchor=\"middle\" x=\"27\" y=\"{ty}\">{name}</text></a></g></g>\n",
                id = &caps[2],
                name = &caps[1],
                cy = cy,
                ty = cy + 4,
            ));
        }
    }
    Ok(format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"no\"?>\n\
         <!DOCTYPE svg PUBLIC \"-//W3C//DTD SVG 1.1//EN\" \"http://www.w3.org/Graphics/SVG/1.1/DTD/svg11.dtd\">\n\
         <svg width=\"62pt\" height=\"116pt\" viewBox=\"0.00 0.00 62.00 116.00\" \
         xmlns=\"http://www.w3.org/2000/svg\" xmlns:xlink=\"http://www.w3.org/1999/xlink\">\n\
         <g id=\"graph0\" class=\"graph\" transform=\"scale(1 1) rotate(0) translate(4 112)\">\n\
         <title>G</title>\n{body}</g>\n</svg>\n"
    ))
}

fn graph() -> Graph {
    Graph::with_allocator(Some("G".to_string()), GraphKind::Directed, IdAllocator::new())
}

#[test]
fn empty_graph_renders_nothing_without_calling_the_engine() {
    let calls = Cell::new(0);
    let engine = |dot: &str| {
        calls.set(calls.get() + 1);
        graphviz_like(dot)
    };
    let mut surface = Surface::new();
    surface.render(&graph(), &engine).unwrap();
    assert_eq!(surface.state(), &SurfaceState::Empty);
    assert_eq!(calls.get(), 0);
    assert!(surface.correspondence().is_empty());
}

#[test]
fn single_edge_maps_both_nodes_and_the_edge() {
    let mut g = graph();
    let edge = g.add_edge_between("A", "B").id();
    let mut surface = Surface::new();
    surface.render(&g, &graphviz_like).unwrap();

    let ids = surface.correspondence();
    assert_eq!(ids.nodes.len(), 2);
    assert_eq!(ids.edges.len(), 1);
    let a = ids.visual_for_node("A").unwrap();
    let b = ids.visual_for_node("B").unwrap();
    assert_ne!(a, b);
    assert_eq!(ids.visual_for_edge(edge), Some("edge1"));
    let document = surface.document().unwrap();
    assert!(document.find_by_id(a).is_some());
    assert!(document.find_by_id(b).is_some());
}

#[test]
fn isolated_nodes_are_left_out_unless_configured() {
    let mut g = graph();
    g.add_edge_between("A", "B");
    g.ensure_node("C");

    let mut surface = Surface::new();
    surface.render(&g, &graphviz_like).unwrap();
    assert_eq!(surface.correspondence().visual_for_node("C"), None);
    assert!(!surface.apply_node_style("C", "fill", "red"));

    let mut config = Config::default();
    config.dot.emit_isolated_nodes = true;
    let mut surface = Surface::with_config(&config);
    surface.render(&g, &graphviz_like).unwrap();
    assert!(surface.apply_node_style("C", "fill", "red"));
}

#[test]
fn lone_node_graph_is_empty_by_default() {
    let mut g = graph();
    g.ensure_node("solo");
    let mut surface = Surface::new();
    surface.render(&g, &graphviz_like).unwrap();
    assert_eq!(surface.state(), &SurfaceState::Empty);
}

#[test]
fn styles_survive_into_the_serialized_document() {
    let mut g = graph();
    let edge = g.add_edge_between("A", "B").id();
    let mut surface = Surface::new();
    assert!(!surface.apply_node_style("A", "fill", "orange"));

    surface.render(&g, &graphviz_like).unwrap();
    assert!(surface.apply_node_style("A", "fill", "orange"));
    assert!(surface.apply_edge_style(edge, "stroke", "red"));
    assert!(surface.apply_node_text_style("B", "font-weight", "bold"));

    let svg = surface.to_svg_string().unwrap();
    assert!(svg.contains("style=\"fill: orange;\""));
    assert!(svg.contains("style=\"stroke: red;\""));
    assert!(svg.contains("style=\"font-weight: bold;\""));
    assert!(svg.contains("xlink:href"));

    assert!(surface.remove_node_style("A", "fill"));
    assert!(!surface.to_svg_string().unwrap().contains("fill: orange"));
}

#[test]
fn clicks_on_inner_elements_reach_the_domain_id() {
    let mut g = graph();
    let edge = g.add_edge_between("A", "B").id();
    let mut surface = Surface::new();
    surface.render(&g, &graphviz_like).unwrap();

    let clicked = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&clicked);
    surface.on_node_click(move |event| sink.borrow_mut().push(event.clone()));
    let sink = Rc::clone(&clicked);
    surface.on_edge_click(move |event| sink.borrow_mut().push(event.clone()));

    let a = surface.correspondence().visual_for_node("A").unwrap().to_string();
    assert_eq!(
        surface.dispatch_click(&format!("a_{a}")),
        Some(ClickEvent::Node("A".to_string()))
    );
    assert_eq!(surface.dispatch_click("edge1"), Some(ClickEvent::Edge(edge)));
    assert_eq!(surface.dispatch_click("graph0"), None);
    assert_eq!(clicked.borrow().len(), 2);
}

#[test]
fn re_render_replaces_ids_and_drops_listeners() {
    let mut g = graph();
    let first = g.add_edge_between("A", "B").id();
    let mut surface = Surface::new();
    surface.render(&g, &graphviz_like).unwrap();
    let fired = Rc::new(Cell::new(0));
    let counter = Rc::clone(&fired);
    surface.on_node_click(move |_| counter.set(counter.get() + 1));

    g.remove_node("B");
    let second = g.add_edge_between("A", "C").id();
    surface.render(&g, &graphviz_like).unwrap();

    assert!(!surface.apply_edge_style(first, "stroke", "red"));
    assert!(!surface.apply_node_style("B", "fill", "red"));
    assert!(surface.apply_edge_style(second, "stroke", "red"));
    assert_eq!(surface.dispatch_click("node1"), None);
    assert_eq!(fired.get(), 0);
}

#[test]
fn engine_rejection_puts_the_surface_in_error() {
    let mut g = graph();
    g.add_edge_between("A", "B");
    // Without its closing brace the document is a syntax error.
    let truncating = |dot: &str| graphviz_like(dot.trim_end_matches(" }"));

    let mut surface = Surface::new();
    assert!(surface.render(&g, &truncating).is_err());
    assert!(surface.error_message().unwrap().contains("syntax error"));
    assert!(surface.document().is_none());
    assert!(!surface.apply_node_style("A", "fill", "red"));

    surface.render(&g, &graphviz_like).unwrap();
    assert!(surface.is_displaying());
}

#[test]
fn edge_ids_are_unique_across_graphs() {
    let mut first = Graph::new("one", GraphKind::Directed);
    let mut second = Graph::new("two", GraphKind::Directed);
    let a = first.add_edge_between("A", "B").id();
    let b = second.add_edge_between("A", "B").id();
    first.remove_edge(a);
    let c = first.add_edge_between("A", "B").id();
    assert_ne!(a, b);
    assert_ne!(a, c);
    assert_ne!(b, c);
}

#[test]
fn described_graph_renders_and_centers() {
    let spec = parse_graph(
        r#"{
            name: "flow",
            nodeDefaults: { shape: "ellipse" },
            edges: [ { from: "start", to: "end", params: { label: "\"go\"" } } ],
        }"#,
    )
    .unwrap();
    let g = spec.build_with(IdAllocator::new()).unwrap();
    let mut surface = Surface::new();
    surface.render(&g, &graphviz_like).unwrap();

    assert_eq!(surface.node_center("start"), Some((31.0, 22.0)));
    assert!(surface.center_to_node("end"));
    let view_box = surface.document().unwrap().view_box().unwrap();
    assert_eq!((view_box.x, view_box.y), (0.0, 36.0));
    assert!(surface.fit_graph());
    assert_eq!(surface.document().unwrap().view_box().unwrap().y, 0.0);
}
