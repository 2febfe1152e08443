//! DOT serialization for [`EventGraph`].
//!
//! Output is plain `digraph` text: node statements with shape/color/style
//! attributes, one `subgraph cluster_<n>` per grouped region, then labeled
//! edges. Statements follow insertion order, so a graph built from sorted
//! schema entries serializes byte-identically on every run.

use std::collections::HashSet;

use petgraph::visit::EdgeRef as _;

use super::{EventGraph, Node};

/// Serialize a graph as DOT source, left-to-right ranked.
#[must_use]
pub fn to_dot(graph: &EventGraph) -> String {
    let mut out = String::new();
    out.push_str(&format!("digraph \"{}\" {{\n", escape_dot(graph.name())));
    out.push_str("  rankdir=LR;\n");

    let grouped: HashSet<_> = graph
        .groups()
        .iter()
        .flat_map(|group| group.members.iter().copied())
        .collect();

    for ix in graph.graph.node_indices() {
        if !grouped.contains(&ix) {
            out.push_str(&format!("  {};\n", node_statement(&graph.graph[ix])));
        }
    }

    for (cluster, group) in graph.groups().iter().enumerate() {
        out.push_str(&format!("  subgraph cluster_{cluster} {{\n"));
        out.push_str(&format!("    label=\"{}\";\n", escape_dot(&group.label)));
        for &ix in &group.members {
            out.push_str(&format!("    {};\n", node_statement(&graph.graph[ix])));
        }
        out.push_str("  }\n");
    }

    for edge in graph.graph.edge_references() {
        let from = &graph.graph[edge.source()].name;
        let to = &graph.graph[edge.target()].name;
        out.push_str(&format!(
            "  \"{}\" -> \"{}\" [label=\"{}\"];\n",
            escape_dot(from),
            escape_dot(to),
            edge.weight().as_str()
        ));
    }

    out.push_str("}\n");
    out
}

fn node_statement(node: &Node) -> String {
    let name = escape_dot(&node.name);
    let color = node.kind.dot_color();
    node.kind.dot_shape().map_or_else(
        || format!("\"{name}\" [color=\"{color}\" style=filled]"),
        |shape| format!("\"{name}\" [shape={shape} color=\"{color}\" style=filled]"),
    )
}

/// Escape a string for use inside a double-quoted DOT identifier.
fn escape_dot(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
}
