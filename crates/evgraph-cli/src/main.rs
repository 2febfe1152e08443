#![forbid(unsafe_code)]

mod output;
mod run;

use std::env;

use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use output::OutputMode;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "evg: render event/handler/flow/mission diagrams from events.json",
    long_about = "Reads a declarative event schema and renders one directed graph per \
                  section: handlers, flows, and (when present) missions. Each graph is \
                  written as DOT source under graphs/ and rendered to an image by the \
                  external layout engine.",
    after_help = "EXAMPLES:\n    # Render events.json from the current directory into graphs/\n    evg\n\n    # Render SVG images from another schema file\n    evg --input docs/events.json --format svg\n\n    # Write DOT sources only, without graphviz installed\n    evg --dot-only\n\n    # Emit a machine-readable run report\n    evg --json"
)]
struct Cli {
    #[command(flatten)]
    run: run::RunArgs,

    /// Emit JSON output instead of human-readable text.
    #[arg(long, global = true)]
    json: bool,
}

impl Cli {
    /// Derive the output mode from flags.
    fn output_mode(&self) -> OutputMode {
        if self.json {
            OutputMode::Json
        } else {
            OutputMode::Human
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("EVG_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if env::var("DEBUG").is_ok() {
            "evgraph=debug,info"
        } else {
            "warn"
        })
    });

    let format = env::var("EVG_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init();
        }
    }
}

fn main() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();
    run::run(&cli.run, cli.output_mode())
}
