use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use vizgraph::{DotDocument, IdAllocator, parse_graph, write_dot};
use vizgraph::config::DotConfig;
use wasm_bindgen::prelude::*;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DotOptions {
    emit_isolated_nodes: Option<bool>,
    node_id_prefix: Option<String>,
    edge_id_prefix: Option<String>,
}

/// DOT text plus the visual id of every written node and edge, keyed by
/// visual id so a host can resolve clicked elements.
#[derive(Debug, Serialize)]
struct DotOutput {
    dot: String,
    nodes: BTreeMap<String, String>,
    edges: BTreeMap<String, String>,
}

fn build_dot_config(options: DotOptions) -> Result<DotConfig, vizgraph::Error> {
    let mut config = DotConfig::default();
    if let Some(v) = options.emit_isolated_nodes {
        config.emit_isolated_nodes = v;
    }
    if let Some(v) = options.node_id_prefix {
        config.node_id_prefix = v;
    }
    if let Some(v) = options.edge_id_prefix {
        config.edge_id_prefix = v;
    }
    config.validate()?;
    Ok(config)
}

fn to_output(document: DotDocument) -> DotOutput {
    let nodes = document
        .correspondence
        .nodes
        .iter()
        .map(|(visual, node)| (visual.to_string(), node.clone()))
        .collect();
    let edges = document
        .correspondence
        .edges
        .iter()
        .map(|(visual, edge)| (visual.to_string(), edge.to_string()))
        .collect();
    DotOutput {
        dot: document.text,
        nodes,
        edges,
    }
}

#[wasm_bindgen]
pub fn graph_to_dot(graph_json: &str, options_json: Option<String>) -> Result<String, JsValue> {
    let options = if let Some(raw_options) = options_json {
        serde_json::from_str::<DotOptions>(&raw_options)
            .map_err(|error| JsValue::from_str(&error.to_string()))?
    } else {
        DotOptions::default()
    };

    let config =
        build_dot_config(options).map_err(|error| JsValue::from_str(&error.to_string()))?;
    let graph = parse_graph(graph_json)
        .and_then(|spec| spec.build_with(IdAllocator::new()))
        .map_err(|error| JsValue::from_str(&error.to_string()))?;
    let output = to_output(write_dot(&graph, &config));
    serde_json::to_string(&output).map_err(|error| JsValue::from_str(&error.to_string()))
}

#[cfg(test)]
mod tests {
    use vizgraph::{IdAllocator, parse_graph, write_dot};

    use crate::{DotOptions, build_dot_config, to_output};

    #[test]
    fn serializes_graph_with_id_tables() {
        let graph = parse_graph(r#"{"edges": [{"from": "A", "to": "B"}], "nodes": [{"id": "C"}]}"#)
            .and_then(|spec| spec.build_with(IdAllocator::new()))
            .expect("graph description should parse");

        let config = build_dot_config(DotOptions::default()).expect("default options are valid");
        let output = to_output(write_dot(&graph, &config));

        assert!(output.dot.contains("A -> B[id=edge1];"));
        assert_eq!(output.nodes.get("node1").map(String::as_str), Some("A"));
        assert_eq!(output.nodes.get("node2").map(String::as_str), Some("B"));
        assert_eq!(output.edges.get("edge1").map(String::as_str), Some("edge0"));
        assert!(!output.nodes.values().any(|node| node == "C"));
    }

    #[test]
    fn options_can_include_isolated_nodes() {
        let graph = parse_graph(r#"{"nodes": [{"id": "C"}]}"#)
            .and_then(|spec| spec.build_with(IdAllocator::new()))
            .expect("graph description should parse");
        let options = DotOptions {
            emit_isolated_nodes: Some(true),
            ..DotOptions::default()
        };

        let config = build_dot_config(options).expect("options are valid");
        let output = to_output(write_dot(&graph, &config));

        assert_eq!(output.nodes.get("node1").map(String::as_str), Some("C"));
    }

    #[test]
    fn rejects_overlapping_id_prefixes() {
        let options = DotOptions {
            node_id_prefix: Some("n".to_string()),
            edge_id_prefix: Some("n1".to_string()),
            ..DotOptions::default()
        };

        let error = build_dot_config(options).expect_err("prefixes overlap");

        assert!(error.to_string().contains("overlap"));
    }
}
