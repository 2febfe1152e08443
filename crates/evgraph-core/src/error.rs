//! Error taxonomy for the whole pipeline.
//!
//! Three stages can fail: loading the schema, writing graph files, and
//! running the layout engine. Every failure is fatal; there is no partial
//! success. [`EvgraphError`] wraps the per-stage errors and attaches a
//! stable code plus a remediation hint for terminal and JSON output.

use std::fmt;

use crate::render::RenderError;
use crate::schema::SchemaError;

/// Machine-readable error codes for scripts and agents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    SchemaNotFound,
    SchemaMalformed,
    OutputWriteFailed,
    EngineMissing,
    EngineFailed,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::SchemaNotFound => "E1001",
            Self::SchemaMalformed => "E1002",
            Self::OutputWriteFailed => "E2001",
            Self::EngineMissing => "E2002",
            Self::EngineFailed => "E2003",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::SchemaNotFound => "Schema file missing or unreadable",
            Self::SchemaMalformed => "Schema file malformed",
            Self::OutputWriteFailed => "Graph output write failed",
            Self::EngineMissing => "Layout engine unavailable",
            Self::EngineFailed => "Layout engine failed",
        }
    }

    /// Remediation hint that can be surfaced to operators and agents.
    #[must_use]
    pub const fn hint(self) -> &'static str {
        match self {
            Self::SchemaNotFound => {
                "Run from the directory containing events.json, or pass --input."
            }
            Self::SchemaMalformed => {
                "Fix the reported key; handlers, flows, and notifiable are required."
            }
            Self::OutputWriteFailed => "Check write permissions on the output directory.",
            Self::EngineMissing => {
                "Install graphviz (`dot`), pass --engine, or use --dot-only to skip images."
            }
            Self::EngineFailed => "Inspect the engine stderr; the DOT source file was kept.",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Any failure of the load → build → render pipeline.
#[derive(Debug, thiserror::Error)]
pub enum EvgraphError {
    /// Schema could not be loaded.
    #[error(transparent)]
    Schema(#[from] SchemaError),
    /// A graph could not be written or rendered.
    #[error(transparent)]
    Render(#[from] RenderError),
}

impl EvgraphError {
    /// The stable code for this failure.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Schema(SchemaError::Read { .. }) => ErrorCode::SchemaNotFound,
            Self::Schema(SchemaError::Parse { .. }) => ErrorCode::SchemaMalformed,
            Self::Render(RenderError::Write { .. }) => ErrorCode::OutputWriteFailed,
            Self::Render(RenderError::EngineUnavailable { .. }) => ErrorCode::EngineMissing,
            Self::Render(RenderError::EngineFailed { .. }) => ErrorCode::EngineFailed,
        }
    }

    /// Remediation hint for this failure.
    #[must_use]
    pub const fn suggestion(&self) -> &'static str {
        self.code().hint()
    }
}
