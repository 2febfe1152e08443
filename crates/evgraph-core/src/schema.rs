//! Event schema loading.
//!
//! # Input format
//!
//! The schema is a single JSON document, conventionally `events.json` in the
//! working directory:
//!
//! ```json
//! {
//!   "handlers": {
//!     "Login": { "receives": ["UserSubmitted"], "emits": ["LoginSucceeded"] }
//!   },
//!   "flows": {
//!     "Signup": ["AccountCreated", "WelcomeMailQueued"]
//!   },
//!   "notifiable": ["LoginSucceeded"],
//!   "missions": {
//!     "Onboarding": {
//!       "steps": {
//!         "Greet": { "filters": ["AccountCreated"], "emits": ["GreetingShown"] }
//!       }
//!     }
//!   },
//!   "process_conclusion": ["SessionClosed"]
//! }
//! ```
//!
//! `handlers`, `flows`, and `notifiable` are required; `missions` and
//! `process_conclusion` are optional and switch the mission graph and the
//! synthetic completion handler on when present. `notificable` is accepted
//! as a legacy spelling of `notifiable`. Unknown top-level keys are ignored.
//!
//! Collections are kept sorted so every run walks entries in the same order
//! and produces identical output.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, instrument};

/// Default schema file name, resolved against the working directory.
pub const DEFAULT_SCHEMA_FILE: &str = "events.json";

/// A named unit that receives certain events and emits others in response.
#[derive(Debug, Clone, Deserialize)]
pub struct Handler {
    /// Events this handler reacts to.
    pub receives: Vec<String>,
    /// Events this handler produces.
    pub emits: Vec<String>,
}

/// One step within a mission.
#[derive(Debug, Clone, Deserialize)]
pub struct Step {
    /// Events the step selects on.
    pub filters: Vec<String>,
    /// Events the step produces.
    pub emits: Vec<String>,
}

/// A named group of steps.
#[derive(Debug, Clone, Deserialize)]
pub struct Mission {
    /// Steps keyed by name.
    pub steps: BTreeMap<String, Step>,
}

/// The parsed event schema, immutable for the run.
///
/// Construct with [`Schema::load`] or [`Schema::from_json`]; pass by
/// reference into the graph builder. There is no global instance.
#[derive(Debug, Clone, Deserialize)]
pub struct Schema {
    /// Handlers keyed by name.
    pub handlers: BTreeMap<String, Handler>,
    /// Flows keyed by name, each a list of emitted events.
    pub flows: BTreeMap<String, Vec<String>>,
    /// Events flagged as user-notifying. Either spelling may appear in the
    /// input, but only one of them.
    #[serde(alias = "notificable")]
    pub notifiable: BTreeSet<String>,
    /// Missions keyed by name. Presence enables the mission graph.
    pub missions: Option<BTreeMap<String, Mission>>,
    /// Events emitted by the synthetic completion handler. Presence adds
    /// that handler to the handler graph.
    pub process_conclusion: Option<Vec<String>>,
}

impl Schema {
    /// Read and decode a schema file.
    ///
    /// # Errors
    ///
    /// [`SchemaError::Read`] if the file is absent or unreadable,
    /// [`SchemaError::Parse`] if it is not a valid schema document.
    #[instrument]
    pub fn load(path: &Path) -> Result<Self, SchemaError> {
        let raw = fs::read_to_string(path).map_err(|source| SchemaError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let schema = Self::from_json(&raw).map_err(|source| SchemaError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(
            handlers = schema.handlers.len(),
            flows = schema.flows.len(),
            notifiable = schema.notifiable.len(),
            missions = schema.missions.as_ref().map_or(0, BTreeMap::len),
            "loaded schema"
        );
        Ok(schema)
    }

    /// Decode a schema from JSON text.
    ///
    /// # Errors
    ///
    /// Returns the underlying decode error; it carries the offending
    /// line and column.
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    /// Whether the given event is flagged as user-notifying.
    #[must_use]
    pub fn is_notifiable(&self, event: &str) -> bool {
        self.notifiable.contains(event)
    }
}

/// Why a schema could not be loaded.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    /// The file is missing or unreadable.
    #[error("cannot read {}: {source}", path.display())]
    Read {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },
    /// The file is not a valid schema document.
    #[error("{} is not a valid event schema: {source}", path.display())]
    Parse {
        /// Path that was read.
        path: PathBuf,
        /// Decode failure, with line/column position.
        #[source]
        source: serde_json::Error,
    },
}
