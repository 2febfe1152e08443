//! Graph model for event diagrams.
//!
//! # Overview
//!
//! This module holds the in-memory representation of one diagram: a directed
//! multigraph of named, styled nodes with labeled edges, plus the grouped
//! regions used for missions. The builder in [`build`] populates it, and
//! [`dot`] serializes it.
//!
//! ## Pipeline
//!
//! ```text
//! Schema (events.json)
//!        ↓  build::GraphBuilder
//! EventGraph (petgraph DiGraph + name map + groups)
//!        ↓  dot::to_dot()
//! DOT source → render::Renderer (layout engine)
//! ```
//!
//! ## Surface
//!
//! The builder never talks to [`EventGraph`] directly; it writes to the
//! [`Surface`] capability trait, so tests can substitute a recording
//! implementation and no traversal logic depends on rendering.

pub mod build;
pub mod dot;

use std::collections::HashMap;

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef as _;

pub use build::GraphBuilder;
pub use dot::to_dot;

/// Visual classification of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// An event; notifiable events get the distinguished fill color.
    Event {
        /// Whether the event is flagged as user-notifying.
        notifiable: bool,
    },
    /// A handler (`"<name> Handler"` nodes).
    Handler,
    /// A flow (`"<name> Flow"` nodes).
    Flow,
    /// A mission step (`"<name> Step"` nodes).
    Step,
}

impl NodeKind {
    /// DOT `shape` attribute, where the kind overrides the engine default.
    #[must_use]
    pub const fn dot_shape(self) -> Option<&'static str> {
        match self {
            Self::Event { .. } => Some("box"),
            Self::Handler | Self::Flow | Self::Step => None,
        }
    }

    /// DOT fill color for the node.
    #[must_use]
    pub const fn dot_color(self) -> &'static str {
        match self {
            Self::Event { notifiable: true } => "lightblue4",
            Self::Event { notifiable: false } => "lightblue2",
            Self::Handler => "cornsilk",
            Self::Flow => "khaki",
            Self::Step => "palegreen",
        }
    }
}

/// Text label carried by an edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EdgeLabel {
    /// Event → handler: the handler reacts to the event.
    HandledBy,
    /// Handler/flow/step → event: the source produces the event.
    Emits,
    /// Step → event: the step selects on the event.
    Filters,
}

impl EdgeLabel {
    /// The label text as it appears in the diagram.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::HandledBy => "handled by",
            Self::Emits => "emits",
            Self::Filters => "filters",
        }
    }
}

/// Node payload: display name plus visual kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    /// Display name; also the node's identity.
    pub name: String,
    /// Visual classification.
    pub kind: NodeKind,
}

/// A grouped sub-region (one mission).
#[derive(Debug, Clone)]
pub struct Group {
    /// Identity of the group (the mission name).
    pub id: String,
    /// Text shown on the region border.
    pub label: String,
    /// Nodes first created while this group was open.
    pub members: Vec<NodeIndex>,
}

/// Minimal drawing capability the builder writes against.
///
/// Node identity is the display name. Insertion is idempotent: re-adding an
/// existing name is a no-op, keeping the first kind. Edges are not
/// deduplicated; the graph is a multigraph.
pub trait Surface {
    /// Add a node, keeping the first kind if the name already exists.
    fn add_node(&mut self, name: &str, kind: NodeKind);

    /// Add a directed labeled edge. Endpoints that were never added are
    /// created as non-notifiable event nodes.
    fn add_edge(&mut self, from: &str, to: &str, label: EdgeLabel);

    /// Begin a grouped region. Nodes first created before the matching
    /// [`close_group`] belong to it; pre-existing nodes are not moved.
    /// Opening a group while one is open closes the previous one; regions
    /// do not nest.
    ///
    /// [`close_group`]: Surface::close_group
    fn open_group(&mut self, id: &str, label: &str);

    /// End the open grouped region, if any.
    fn close_group(&mut self);
}

/// One diagram: a named directed multigraph with grouped regions.
///
/// Nodes and edges keep insertion order, so a builder that walks its input
/// in a stable order yields byte-identical serialized output.
#[derive(Debug, Clone, Default)]
pub struct EventGraph {
    name: String,
    pub(crate) graph: DiGraph<Node, EdgeLabel>,
    node_map: HashMap<String, NodeIndex>,
    groups: Vec<Group>,
    current: Option<Group>,
}

impl EventGraph {
    /// Create an empty graph; `name` becomes the DOT graph name and the
    /// output file stem.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Graph name, used for the `digraph` header and file naming.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of nodes.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Number of edges, counting parallel edges separately.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Whether a node with this name exists.
    #[must_use]
    pub fn contains_node(&self, name: &str) -> bool {
        self.node_map.contains_key(name)
    }

    /// The kind a node was first created with.
    #[must_use]
    pub fn node_kind(&self, name: &str) -> Option<NodeKind> {
        let ix = self.node_map.get(name)?;
        self.graph.node_weight(*ix).map(|node| node.kind)
    }

    /// Whether an edge `from → to` with the given label exists.
    #[must_use]
    pub fn has_edge(&self, from: &str, to: &str, label: EdgeLabel) -> bool {
        let (Some(&from_ix), Some(&to_ix)) = (self.node_map.get(from), self.node_map.get(to))
        else {
            return false;
        };
        self.graph
            .edges_connecting(from_ix, to_ix)
            .any(|edge| *edge.weight() == label)
    }

    /// Closed grouped regions, in the order they were opened.
    ///
    /// A group still open when the graph is read does not appear here and
    /// is not rendered as a region.
    #[must_use]
    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    /// Node payloads in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.graph.node_weights()
    }

    fn intern(&mut self, name: &str, kind: NodeKind) -> NodeIndex {
        *self.node_map.entry(name.to_string()).or_insert_with(|| {
            let ix = self.graph.add_node(Node {
                name: name.to_string(),
                kind,
            });
            if let Some(group) = self.current.as_mut() {
                group.members.push(ix);
            }
            ix
        })
    }
}

impl Surface for EventGraph {
    fn add_node(&mut self, name: &str, kind: NodeKind) {
        self.intern(name, kind);
    }

    fn add_edge(&mut self, from: &str, to: &str, label: EdgeLabel) {
        let from_ix = self.intern(from, NodeKind::Event { notifiable: false });
        let to_ix = self.intern(to, NodeKind::Event { notifiable: false });
        self.graph.add_edge(from_ix, to_ix, label);
    }

    fn open_group(&mut self, id: &str, label: &str) {
        self.close_group();
        self.current = Some(Group {
            id: id.to_string(),
            label: label.to_string(),
            members: Vec::new(),
        });
    }

    fn close_group(&mut self) {
        if let Some(group) = self.current.take() {
            self.groups.push(group);
        }
    }
}
