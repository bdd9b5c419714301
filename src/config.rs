use crate::error::Error;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// How the serializer names things and which nodes it writes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DotConfig {
    /// Also write nodes that have no incident edges. Off by default: such
    /// nodes are left out of the document and cannot be clicked or styled.
    pub emit_isolated_nodes: bool,
    pub node_id_prefix: String,
    pub edge_id_prefix: String,
}

impl DotConfig {
    /// Visual ids are `prefix` + counter, so neither prefix may start the
    /// other: with `n` and `n1`, node `n11` and edge `n1` + `1` clash.
    pub fn validate(&self) -> Result<(), Error> {
        let (node, edge) = (&self.node_id_prefix, &self.edge_id_prefix);
        if node.starts_with(edge.as_str()) || edge.starts_with(node.as_str()) {
            return Err(Error::Config {
                message: format!("node and edge id prefixes overlap (`{node}`, `{edge}`)"),
            });
        }
        Ok(())
    }
}

impl Default for DotConfig {
    fn default() -> Self {
        Self {
            emit_isolated_nodes: false,
            node_id_prefix: "node".to_string(),
            edge_id_prefix: "edge".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderConfig {
    /// Surface size in pixels, applied by `resize` and used for PNG output.
    pub width: f32,
    pub height: f32,
    /// Stretch a freshly installed document to its container (`100%`)
    /// instead of the pixel size above.
    pub fill_container: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: 1200.0,
            height: 800.0,
            fill_container: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    pub program: String,
    pub args: Vec<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            program: "dot".to_string(),
            args: vec!["-Tsvg".to_string()],
        }
    }
}

/// Pan/zoom behaviour for the host's viewer. The crate only carries these
/// values; the host applies them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PanZoomSettings {
    pub enabled: bool,
    pub prevent_mouse_events_default: bool,
    pub min_zoom: f32,
    pub max_zoom: f32,
    pub zoom_scale_sensitivity: f32,
    pub fit: bool,
    pub center: bool,
}

impl Default for PanZoomSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            prevent_mouse_events_default: false,
            min_zoom: 0.5,
            max_zoom: 10.0,
            zoom_scale_sensitivity: 0.2,
            fit: true,
            center: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub render: RenderConfig,
    pub dot: DotConfig,
    pub engine: EngineConfig,
    pub pan_zoom: PanZoomSettings,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RenderConfigFile {
    width: Option<f32>,
    height: Option<f32>,
    fill_container: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DotConfigFile {
    emit_isolated_nodes: Option<bool>,
    node_id_prefix: Option<String>,
    edge_id_prefix: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EngineConfigFile {
    program: Option<String>,
    args: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    render: Option<RenderConfigFile>,
    dot: Option<DotConfigFile>,
    engine: Option<EngineConfigFile>,
    pan_zoom: Option<PanZoomSettings>,
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let Some(path) = path else {
        return Ok(Config::default());
    };
    let contents = std::fs::read_to_string(path)?;
    parse_config(&contents)
}

/// Parses a JSON config, accepting JSON5 (comments, trailing commas) as a
/// fallback. Missing keys keep their defaults.
pub fn parse_config(contents: &str) -> anyhow::Result<Config> {
    let parsed: ConfigFile = match serde_json::from_str(contents) {
        Ok(parsed) => parsed,
        Err(json_err) => json5::from_str(contents)
            .map_err(|_| anyhow::anyhow!("invalid config: {json_err}"))?,
    };

    let mut config = Config::default();

    if let Some(render) = parsed.render {
        if let Some(v) = render.width {
            config.render.width = v;
        }
        if let Some(v) = render.height {
            config.render.height = v;
        }
        if let Some(v) = render.fill_container {
            config.render.fill_container = v;
        }
    }

    if let Some(dot) = parsed.dot {
        if let Some(v) = dot.emit_isolated_nodes {
            config.dot.emit_isolated_nodes = v;
        }
        if let Some(v) = dot.node_id_prefix {
            config.dot.node_id_prefix = v;
        }
        if let Some(v) = dot.edge_id_prefix {
            config.dot.edge_id_prefix = v;
        }
    }
    config.dot.validate()?;

    if let Some(engine) = parsed.engine {
        if let Some(v) = engine.program {
            config.engine.program = v;
        }
        if let Some(v) = engine.args {
            config.engine.args = v;
        }
    }

    if let Some(v) = parsed.pan_zoom {
        config.pan_zoom = v;
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_path_gives_defaults() {
        let config = load_config(None).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.engine.program, "dot");
        assert!(!config.dot.emit_isolated_nodes);
    }

    #[test]
    fn partial_json_overrides_only_given_keys() {
        let config = parse_config(
            r#"{"render": {"width": 640}, "dot": {"emitIsolatedNodes": true}, "panZoom": {"maxZoom": 4}}"#,
        )
        .unwrap();
        assert_eq!(config.render.width, 640.0);
        assert_eq!(config.render.height, 800.0);
        assert!(config.dot.emit_isolated_nodes);
        assert_eq!(config.dot.node_id_prefix, "node");
        assert_eq!(config.pan_zoom.max_zoom, 4.0);
        assert!(config.pan_zoom.enabled);
    }

    #[test]
    fn json5_fallback() {
        let config = parse_config(
            "{\n  // local graphviz build\n  engine: { program: '/opt/gv/bin/dot', },\n}",
        )
        .unwrap();
        assert_eq!(config.engine.program, "/opt/gv/bin/dot");
        assert_eq!(config.engine.args, vec!["-Tsvg".to_string()]);
    }

    #[test]
    fn clashing_prefixes_are_rejected() {
        let err = parse_config(r#"{"dot": {"nodeIdPrefix": "edge"}}"#).unwrap_err();
        assert!(err.to_string().contains("prefixes overlap"));
    }

    #[test]
    fn prefixes_that_start_one_another_are_rejected() {
        let err = parse_config(r#"{"dot": {"nodeIdPrefix": "n", "edgeIdPrefix": "n1"}}"#).unwrap_err();
        assert!(err.to_string().contains("`n`, `n1`"));

        let mut dot = DotConfig::default();
        dot.edge_id_prefix = String::new();
        assert!(dot.validate().is_err());
        dot.edge_id_prefix = "nodes".to_string();
        assert!(dot.validate().is_err());
        dot.edge_id_prefix = "e".to_string();
        dot.node_id_prefix = "n".to_string();
        assert!(dot.validate().is_ok());
        assert!(DotConfig::default().validate().is_ok());
    }

    #[test]
    fn garbage_is_an_error() {
        assert!(parse_config("not a config").is_err());
    }
}
