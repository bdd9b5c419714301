use crate::config::{Config, DotConfig, RenderConfig};
use crate::correspondence::Correspondence;
use crate::dot::{DotDocument, write_dot};
use crate::engine::LayoutEngine;
use crate::error::{Error, Result};
use crate::graph::Graph;
use crate::interaction::Listener;
use crate::svg::{SvgDocument, ViewBox};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SurfaceState {
    /// Nothing installed: never rendered, or the last graph had nothing to
    /// draw.
    Empty,
    Displaying,
    /// The last render failed; holds the description shown instead of the
    /// graph.
    Error(String),
}

/// Where a rendered graph lives: the installed SVG document, the id
/// correspondence it was rendered with, and the click listeners wired to
/// it.
///
/// Every successful render swaps the document and correspondence together;
/// listeners belong to the document they were attached to and are dropped
/// with it.
pub struct Surface {
    pub(crate) render_config: RenderConfig,
    pub(crate) dot_config: DotConfig,
    pub(crate) state: SurfaceState,
    pub(crate) document: Option<SvgDocument>,
    pub(crate) correspondence: Correspondence,
    pub(crate) original_view_box: Option<ViewBox>,
    pub(crate) listeners: Vec<Listener>,
}

impl Surface {
    pub fn new() -> Self {
        Self::with_config(&Config::default())
    }

    pub fn with_config(config: &Config) -> Self {
        Self {
            render_config: config.render.clone(),
            dot_config: config.dot.clone(),
            state: SurfaceState::Empty,
            document: None,
            correspondence: Correspondence::default(),
            original_view_box: None,
            listeners: Vec::new(),
        }
    }

    pub fn state(&self) -> &SurfaceState {
        &self.state
    }

    pub fn is_displaying(&self) -> bool {
        self.state == SurfaceState::Displaying
    }

    pub fn error_message(&self) -> Option<&str> {
        match &self.state {
            SurfaceState::Error(message) => Some(message),
            _ => None,
        }
    }

    pub fn document(&self) -> Option<&SvgDocument> {
        self.document.as_ref()
    }

    pub fn correspondence(&self) -> &Correspondence {
        &self.correspondence
    }

    pub fn render_config(&self) -> &RenderConfig {
        &self.render_config
    }

    /// The installed document as SVG text, with every style applied since
    /// the render.
    pub fn to_svg_string(&self) -> Option<String> {
        self.document.as_ref().map(SvgDocument::to_svg_string)
    }

    /// Serializes `graph` and renders it through `engine`.
    ///
    /// Overlapping id prefixes in the serializer config fail the render.
    pub fn render(&mut self, graph: &Graph, engine: &dyn LayoutEngine) -> Result<()> {
        if let Err(err) = self.dot_config.validate() {
            return self.fail(err);
        }
        let dot = write_dot(graph, &self.dot_config);
        self.render_dot(dot, engine)
    }

    /// Renders already serialized DOT text together with the correspondence
    /// produced while writing it.
    ///
    /// A document with no node or edge statements clears the surface
    /// without calling the engine. On failure the surface shows the error
    /// and keeps no document; the error is also returned.
    pub fn render_dot(&mut self, dot: DotDocument, engine: &dyn LayoutEngine) -> Result<()> {
        if dot.is_blank() {
            tracing::debug!("nothing to draw");
            self.detach();
            self.state = SurfaceState::Empty;
            return Ok(());
        }

        match self.lay_out(&dot.text, engine) {
            Ok(document) => {
                self.detach();
                self.original_view_box = document.view_box();
                self.document = Some(document);
                self.correspondence = dot.correspondence;
                self.state = SurfaceState::Displaying;
                self.apply_initial_size();
                tracing::debug!(
                    nodes = self.correspondence.nodes.len(),
                    edges = self.correspondence.edges.len(),
                    "installed rendered graph"
                );
                Ok(())
            }
            Err(err) => self.fail(err),
        }
    }

    fn fail(&mut self, err: Error) -> Result<()> {
        tracing::warn!(error = %err, "render failed");
        self.detach();
        self.state = SurfaceState::Error(err.to_string());
        Err(err)
    }

    fn lay_out(&self, text: &str, engine: &dyn LayoutEngine) -> Result<SvgDocument> {
        let svg = engine.layout(text)?;
        Ok(SvgDocument::parse(&svg)?)
    }

    fn detach(&mut self) {
        self.document = None;
        self.original_view_box = None;
        self.correspondence = Correspondence::default();
        self.listeners.clear();
    }

    fn apply_initial_size(&mut self) {
        let Some(document) = self.document.as_mut() else {
            return;
        };
        if self.render_config.fill_container {
            document.set_size("100%", "100%");
        } else {
            document.set_size(
                &format!("{}px", self.render_config.width),
                &format!("{}px", self.render_config.height),
            );
        }
    }

    /// Applies a new surface size to the installed document. Presentation
    /// only: nothing is laid out again.
    pub fn resize(&mut self, width: f32, height: f32) {
        self.render_config.width = width;
        self.render_config.height = height;
        if let Some(document) = self.document.as_mut() {
            document.set_size(&format!("{width}px"), &format!("{height}px"));
        }
    }
}

impl Default for Surface {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Surface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Surface")
            .field("state", &self.state)
            .field("nodes", &self.correspondence.nodes.len())
            .field("edges", &self.correspondence.edges.len())
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
