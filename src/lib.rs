#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod correspondence;
pub mod dot;
pub mod dump;
pub mod engine;
pub mod error;
pub mod graph;
pub mod ids;
pub mod input;
pub mod interaction;
pub mod params;
pub mod render;
pub mod surface;
pub mod svg;
pub mod viewport;

#[cfg(feature = "cli")]
pub use cli::run;
pub use config::{Config, load_config};
pub use correspondence::Correspondence;
pub use dot::{DotDocument, write_dot};
pub use engine::{EngineError, GraphvizCli, LayoutEngine};
pub use error::{Error, Result};
pub use graph::{Edge, Graph, GraphKind, Node};
pub use ids::{EdgeId, IdAllocator};
pub use input::{GraphSpec, parse_graph};
pub use interaction::ClickEvent;
pub use params::Params;
pub use surface::{Surface, SurfaceState};
