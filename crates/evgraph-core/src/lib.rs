#![forbid(unsafe_code)]
//! evgraph-core library.
//!
//! Loads a declarative event schema (`events.json`) and turns it into
//! styled directed graphs: DOT sources plus images rendered by an external
//! layout engine.
//!
//! # Conventions
//!
//! - **Errors**: typed per stage ([`schema::SchemaError`],
//!   [`render::RenderError`]), wrapped by [`EvgraphError`] at the API edge.
//! - **Logging**: `tracing` macros (`info!`, `warn!`, `error!`, `debug!`).

pub mod error;
pub mod graph;
pub mod render;
pub mod schema;

pub use error::{ErrorCode, EvgraphError};
pub use graph::{EventGraph, GraphBuilder, Surface};
pub use render::{Artifact, Renderer};
pub use schema::Schema;
