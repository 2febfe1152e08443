//! The load → build → render pipeline behind the `evg` entry point.
//!
//! Running with no flags reads `events.json` from the working directory and
//! renders every enabled graph under `graphs/`. All flags are defaulted, so
//! the zero-argument invocation stays the whole interface; the flags exist
//! for other schema locations, output formats, and engine-free test runs.

use std::io::Write;
use std::path::PathBuf;

use clap::Args;
use serde::Serialize;
use tracing::{info, instrument};

use evgraph_core::render::{DEFAULT_ENGINE, DEFAULT_FORMAT, DEFAULT_OUT_DIR};
use evgraph_core::schema::DEFAULT_SCHEMA_FILE;
use evgraph_core::{Artifact, EvgraphError, GraphBuilder, Renderer, Schema};

use crate::output::{self, CliError, OutputMode};

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Schema file to read.
    #[arg(long, value_name = "FILE", default_value = DEFAULT_SCHEMA_FILE)]
    pub input: PathBuf,

    /// Directory receiving DOT files and rendered images.
    #[arg(long, value_name = "DIR", default_value = DEFAULT_OUT_DIR)]
    pub out_dir: PathBuf,

    /// Rendered image format, passed to the engine as -T<FMT>.
    #[arg(long, value_name = "FMT", default_value = DEFAULT_FORMAT)]
    pub format: String,

    /// Layout engine program.
    #[arg(long, value_name = "PROGRAM", default_value = DEFAULT_ENGINE)]
    pub engine: String,

    /// Write DOT sources only; skip the layout engine.
    #[arg(long)]
    pub dot_only: bool,
}

/// What one run produced, for the final report.
#[derive(Debug, Serialize)]
pub struct RunReport {
    artifacts: Vec<Artifact>,
}

impl RunReport {
    fn write_human(&self, w: &mut dyn Write) -> std::io::Result<()> {
        let rendered = self
            .artifacts
            .iter()
            .any(|artifact| artifact.image_path.is_some());
        let verb = if rendered { "rendered" } else { "wrote" };
        writeln!(w, "✓ {verb} {} graphs", self.artifacts.len())?;
        for artifact in &self.artifacts {
            match &artifact.image_path {
                Some(image) => writeln!(
                    w,
                    "  {}: {} -> {}",
                    artifact.name,
                    artifact.dot_path.display(),
                    image.display()
                )?,
                None => writeln!(w, "  {}: {}", artifact.name, artifact.dot_path.display())?,
            }
        }
        Ok(())
    }
}

/// Run the full pipeline and report the result in the requested mode.
pub fn run(args: &RunArgs, mode: OutputMode) -> anyhow::Result<()> {
    match try_run(args) {
        Ok(report) => {
            output::render(mode, &report, |report, w| report.write_human(w))?;
            Ok(())
        }
        Err(err) => {
            output::render_error(mode, &CliError::from(&err))?;
            Err(err.into())
        }
    }
}

/// The pipeline proper. The schema must decode before anything is written,
/// so a malformed input leaves no output behind.
#[instrument(skip(args), fields(input = %args.input.display()))]
fn try_run(args: &RunArgs) -> Result<RunReport, EvgraphError> {
    let schema = Schema::load(&args.input)?;
    let graphs = GraphBuilder::new(&schema).build_all();

    let renderer = Renderer::new(&args.out_dir)
        .engine(&args.engine)
        .format(&args.format)
        .dot_only(args.dot_only);

    let mut artifacts = Vec::with_capacity(graphs.len());
    for graph in &graphs {
        artifacts.push(renderer.render(graph)?);
    }

    info!(graphs = artifacts.len(), "render complete");
    Ok(RunReport { artifacts })
}
