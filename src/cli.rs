use crate::config::load_config;
use crate::dot::write_dot;
use crate::dump::write_id_dump;
use crate::engine::GraphvizCli;
use crate::ids::{EdgeId, IdAllocator};
use crate::input::parse_graph;
use crate::render::{write_output_dot, write_output_svg};
use crate::surface::Surface;
use anyhow::Result;
use clap::{Parser, ValueEnum};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

#[cfg(feature = "png")]
use crate::render::write_output_png;

#[derive(Parser, Debug)]
#[command(
    name = "vizg",
    version,
    about = "Render a graph through Graphviz into styleable, id-mapped SVG"
)]
pub struct Args {
    /// Graph description (JSON or JSON5) or '-' for stdin
    #[arg(short = 'i', long = "input")]
    pub input: Option<PathBuf>,

    /// Output file. Defaults to stdout for SVG and DOT if omitted.
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Output format
    #[arg(short = 'e', long = "outputFormat", value_enum, default_value = "svg")]
    pub output_format: OutputFormat,

    /// Config JSON file
    #[arg(short = 'c', long = "configFile")]
    pub config: Option<PathBuf>,

    /// Width in pixels
    #[arg(short = 'w', long = "width")]
    pub width: Option<f32>,

    /// Height in pixels
    #[arg(short = 'H', long = "height")]
    pub height: Option<f32>,

    /// Layout engine executable, e.g. `dot` or `neato`
    #[arg(long = "engine")]
    pub engine: Option<String>,

    /// Style a rendered element: `node:<id>:<prop>=<value>`, `node-text:..`,
    /// `edge:<edgeN>:..` or `edge-text:..`. Edges are numbered from `edge0`
    /// in input order.
    #[arg(long = "style")]
    pub styles: Vec<StyleArg>,

    /// Center the view on this node
    #[arg(long = "center")]
    pub center: Option<String>,

    /// Write the node/edge id correspondence as JSON
    #[arg(long = "dump-ids")]
    pub dump_ids: Option<PathBuf>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Svg,
    Png,
    Dot,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StyleTarget {
    Node(String),
    NodeText(String),
    Edge(EdgeId),
    EdgeText(EdgeId),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleArg {
    pub target: StyleTarget,
    pub property: String,
    pub value: String,
}

impl FromStr for StyleArg {
    type Err = String;

    fn from_str(raw: &str) -> std::result::Result<Self, Self::Err> {
        let usage = || format!("expected `<kind>:<id>:<prop>=<value>`, got `{raw}`");
        let (kind, rest) = raw.split_once(':').ok_or_else(usage)?;
        let (selector, value) = rest.split_once('=').ok_or_else(usage)?;
        let (id, property) = selector.rsplit_once(':').ok_or_else(usage)?;
        if id.is_empty() || property.is_empty() {
            return Err(usage());
        }
        let edge = || id.parse::<EdgeId>().map_err(|err| err.to_string());
        let target = match kind {
            "node" => StyleTarget::Node(id.to_string()),
            "node-text" => StyleTarget::NodeText(id.to_string()),
            "edge" => StyleTarget::Edge(edge()?),
            "edge-text" => StyleTarget::EdgeText(edge()?),
            other => return Err(format!("unknown style target `{other}`")),
        };
        Ok(Self {
            target,
            property: property.to_string(),
            value: value.to_string(),
        })
    }
}

impl StyleArg {
    pub fn apply(&self, surface: &mut Surface) -> bool {
        let (property, value) = (self.property.as_str(), self.value.as_str());
        match &self.target {
            StyleTarget::Node(id) => surface.apply_node_style(id, property, value),
            StyleTarget::NodeText(id) => surface.apply_node_text_style(id, property, value),
            StyleTarget::Edge(id) => surface.apply_edge_style(*id, property, value),
            StyleTarget::EdgeText(id) => surface.apply_edge_text_style(*id, property, value),
        }
    }
}

pub fn run() -> Result<()> {
    let args = Args::parse();
    init_tracing();

    let mut config = load_config(args.config.as_deref())?;
    if let Some(width) = args.width {
        config.render.width = width;
        config.render.fill_container = false;
    }
    if let Some(height) = args.height {
        config.render.height = height;
        config.render.fill_container = false;
    }
    if let Some(program) = args.engine.clone() {
        config.engine.program = program;
    }

    let input = read_input(args.input.as_deref())?;
    let graph = parse_graph(&input)?.build_with(IdAllocator::new())?;
    let dot = write_dot(&graph, &config.dot);

    if args.output_format == OutputFormat::Dot {
        if args.dump_ids.is_some() {
            tracing::warn!("--dump-ids needs a render and is ignored for DOT output");
        }
        return write_output_dot(&dot.text, args.output.as_deref());
    }

    let engine = GraphvizCli::from_config(&config.engine);
    let mut surface = Surface::with_config(&config);
    let rendered = surface.render_dot(dot, &engine);
    if let Some(path) = args.dump_ids.as_deref() {
        write_id_dump(path, &surface, &graph)?;
    }
    rendered?;
    if !surface.is_displaying() {
        return Err(anyhow::anyhow!("Graph has no edges to draw"));
    }

    for style in &args.styles {
        if !style.apply(&mut surface) {
            tracing::warn!(style = ?style.target, "style matched no rendered element");
        }
    }
    if let Some(node) = args.center.as_deref() {
        if !surface.center_to_node(node) {
            tracing::warn!(node, "cannot center on a node that was not rendered");
        }
    }

    match args.output_format {
        OutputFormat::Svg => {
            let svg = surface
                .to_svg_string()
                .ok_or_else(|| anyhow::anyhow!("Nothing rendered"))?;
            write_output_svg(&svg, args.output.as_deref())?;
        }
        OutputFormat::Png => write_png(&args, &mut surface)?,
        OutputFormat::Dot => {}
    }
    Ok(())
}

#[cfg(feature = "png")]
fn write_png(args: &Args, surface: &mut Surface) -> Result<()> {
    let output = ensure_output(&args.output, "png")?;
    let render = surface.render_config().clone();
    surface.resize(render.width, render.height);
    let svg = surface
        .to_svg_string()
        .ok_or_else(|| anyhow::anyhow!("Nothing rendered"))?;
    write_output_png(&svg, &output, &render)
}

#[cfg(not(feature = "png"))]
fn write_png(_args: &Args, _surface: &mut Surface) -> Result<()> {
    Err(anyhow::anyhow!("PNG output requires the `png` feature"))
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}

fn read_input(path: Option<&Path>) -> Result<String> {
    if let Some(path) = path {
        if path != Path::new("-") {
            return Ok(std::fs::read_to_string(path)?);
        }
    }
    let mut buf = String::new();
    io::stdin().read_to_string(&mut buf)?;
    Ok(buf)
}

#[cfg(feature = "png")]
fn ensure_output(output: &Option<PathBuf>, ext: &str) -> Result<PathBuf> {
    if let Some(path) = output {
        return Ok(path.clone());
    }
    Err(anyhow::anyhow!("Output path required for {} output", ext))
}
