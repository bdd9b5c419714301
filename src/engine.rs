use crate::config::EngineConfig;
use std::io::Write;
use std::process::{Command, Stdio};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    #[error("failed to start layout engine `{program}`: {message}")]
    Spawn { program: String, message: String },

    #[error("layout engine `{program}` failed ({status}): {stderr}")]
    Failed {
        program: String,
        status: String,
        stderr: String,
    },

    /// A description reported by the engine itself, e.g. a DOT syntax error.
    #[error("{0}")]
    Rejected(String),

    #[error("layout engine produced output that is not UTF-8")]
    Encoding,
}

/// Turns DOT text into an SVG document.
///
/// Implementations are called synchronously on the rendering thread and
/// must return either the complete SVG or a failure description.
pub trait LayoutEngine {
    fn layout(&self, dot: &str) -> Result<String, EngineError>;
}

impl<F> LayoutEngine for F
where
    F: Fn(&str) -> Result<String, EngineError>,
{
    fn layout(&self, dot: &str) -> Result<String, EngineError> {
        self(dot)
    }
}

/// Runs a Graphviz executable (`dot -Tsvg` by default), feeding the DOT
/// text on stdin and reading SVG from stdout.
#[derive(Debug, Clone)]
pub struct GraphvizCli {
    program: String,
    args: Vec<String>,
}

impl GraphvizCli {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: EngineConfig::default().args,
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            program: config.program.clone(),
            args: config.args.clone(),
        }
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    fn spawn_error(&self, err: impl std::fmt::Display) -> EngineError {
        EngineError::Spawn {
            program: self.program.clone(),
            message: err.to_string(),
        }
    }
}

impl Default for GraphvizCli {
    fn default() -> Self {
        Self::from_config(&EngineConfig::default())
    }
}

impl LayoutEngine for GraphvizCli {
    fn layout(&self, dot: &str) -> Result<String, EngineError> {
        tracing::debug!(program = %self.program, bytes = dot.len(), "invoking layout engine");
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|err| self.spawn_error(err))?;

        // Feed stdin from another thread so a large document cannot fill the
        // stdout pipe while we are still writing.
        let writer = child.stdin.take().map(|mut stdin| {
            let input = dot.to_string();
            std::thread::spawn(move || stdin.write_all(input.as_bytes()))
        });

        let output = child
            .wait_with_output()
            .map_err(|err| self.spawn_error(err))?;

        if let Some(writer) = writer {
            match writer.join() {
                Ok(Ok(())) => {}
                Ok(Err(err)) => {
                    tracing::warn!(program = %self.program, error = %err, "engine closed stdin early");
                }
                Err(_) => return Err(self.spawn_error("stdin writer panicked")),
            }
        }

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            tracing::warn!(program = %self.program, status = %output.status, "layout engine failed");
            return Err(EngineError::Failed {
                program: self.program.clone(),
                status: output.status.to_string(),
                stderr,
            });
        }

        String::from_utf8(output.stdout).map_err(|_| EngineError::Encoding)
    }
}
