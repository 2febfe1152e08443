//! DOT file output and layout-engine invocation.
//!
//! The layout engine is an external program (graphviz `dot` by default)
//! invoked as `<engine> -T<format> -O <file>.dot`, which writes the rendered
//! image next to the source as `<file>.dot.<format>`. The engine is treated
//! as an opaque collaborator; its failures surface as [`RenderError`] with
//! the captured stderr.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};

use serde::Serialize;
use tracing::{debug, instrument};

use crate::graph::{EventGraph, to_dot};

/// Default layout engine program name.
pub const DEFAULT_ENGINE: &str = "dot";
/// Default rendered image format.
pub const DEFAULT_FORMAT: &str = "pdf";
/// Default output directory for graph files.
pub const DEFAULT_OUT_DIR: &str = "graphs";

/// Files produced for one graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Artifact {
    /// Graph name (the file stem).
    pub name: String,
    /// Written DOT source file.
    pub dot_path: PathBuf,
    /// Rendered image, absent when layout was skipped.
    pub image_path: Option<PathBuf>,
}

/// Writes DOT files and drives the layout engine.
#[derive(Debug, Clone)]
pub struct Renderer {
    out_dir: PathBuf,
    engine: String,
    format: String,
    dot_only: bool,
}

impl Renderer {
    /// Renderer writing under `out_dir` with the default engine and format.
    #[must_use]
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        Self {
            out_dir: out_dir.into(),
            engine: DEFAULT_ENGINE.to_string(),
            format: DEFAULT_FORMAT.to_string(),
            dot_only: false,
        }
    }

    /// Use a different layout engine program.
    #[must_use]
    pub fn engine(mut self, program: impl Into<String>) -> Self {
        self.engine = program.into();
        self
    }

    /// Use a different rendered image format (`pdf`, `png`, `svg`, …).
    #[must_use]
    pub fn format(mut self, format: impl Into<String>) -> Self {
        self.format = format.into();
        self
    }

    /// Skip the layout engine and write DOT sources only.
    #[must_use]
    pub const fn dot_only(mut self, dot_only: bool) -> Self {
        self.dot_only = dot_only;
        self
    }

    /// Write the graph's DOT file and, unless in DOT-only mode, render it.
    ///
    /// # Errors
    ///
    /// [`RenderError::Write`] if the directory or file cannot be created,
    /// [`RenderError::EngineUnavailable`] if the engine cannot be started,
    /// [`RenderError::EngineFailed`] if it exits non-zero.
    #[instrument(skip(self, graph), fields(graph = graph.name()))]
    pub fn render(&self, graph: &EventGraph) -> Result<Artifact, RenderError> {
        fs::create_dir_all(&self.out_dir).map_err(|source| RenderError::Write {
            path: self.out_dir.clone(),
            source,
        })?;

        let dot_path = self.out_dir.join(format!("{}.dot", graph.name()));
        fs::write(&dot_path, to_dot(graph)).map_err(|source| RenderError::Write {
            path: dot_path.clone(),
            source,
        })?;
        debug!(path = %dot_path.display(), "wrote DOT source");

        let image_path = if self.dot_only {
            None
        } else {
            Some(self.run_engine(&dot_path)?)
        };

        Ok(Artifact {
            name: graph.name().to_string(),
            dot_path,
            image_path,
        })
    }

    fn run_engine(&self, dot_path: &Path) -> Result<PathBuf, RenderError> {
        let output = Command::new(&self.engine)
            .arg(format!("-T{}", self.format))
            .arg("-O")
            .arg(dot_path)
            .output()
            .map_err(|source| RenderError::EngineUnavailable {
                program: self.engine.clone(),
                source,
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(RenderError::EngineFailed {
                program: self.engine.clone(),
                status: output.status,
                stderr,
            });
        }

        let image_path = self.image_path(dot_path);
        debug!(path = %image_path.display(), "rendered image");
        Ok(image_path)
    }

    /// Path the engine's `-O` flag produces: the DOT path with the format
    /// appended as an extra extension.
    fn image_path(&self, dot_path: &Path) -> PathBuf {
        let mut os = dot_path.as_os_str().to_os_string();
        os.push(".");
        os.push(&self.format);
        PathBuf::from(os)
    }
}

/// Why a graph could not be written or rendered.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// The output directory or DOT file could not be written.
    #[error("cannot write {}: {source}", path.display())]
    Write {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },
    /// The layout engine could not be started at all.
    #[error("layout engine `{program}` could not be run: {source}")]
    EngineUnavailable {
        /// Program name or path that was invoked.
        program: String,
        /// Spawn failure, typically not-found.
        #[source]
        source: io::Error,
    },
    /// The layout engine ran and reported failure.
    #[error("layout engine `{program}` failed ({status}): {stderr}")]
    EngineFailed {
        /// Program name or path that was invoked.
        program: String,
        /// Exit status of the engine process.
        status: ExitStatus,
        /// Captured standard error, trimmed.
        stderr: String,
    },
}
