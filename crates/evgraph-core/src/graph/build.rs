//! Schema traversals that populate a drawing surface.
//!
//! # Overview
//!
//! One builder covers every schema variant. The handler and flow graphs are
//! always built; the mission graph and the synthetic completion handler are
//! enabled by the optional schema sections, not by separate code paths.
//!
//! ## Edge direction
//!
//! Arrows point the way the diagrams read: an event is `handled by` a
//! handler (event → handler), while handlers, flows, and steps `emit` or
//! `filter` events (unit → event).

use tracing::instrument;

use super::{EdgeLabel, EventGraph, NodeKind, Surface};
use crate::schema::Schema;

/// Name of the handler graph and its output file stem.
pub const HANDLER_GRAPH: &str = "events_handler";
/// Name of the flow graph and its output file stem.
pub const FLOW_GRAPH: &str = "events_flow";
/// Name of the mission graph and its output file stem.
pub const MISSION_GRAPH: &str = "events_missions";

/// Handler synthesized for `process_conclusion` events.
pub const CONCLUSION_HANDLER: &str = "On Process Completion";

/// Populates drawing surfaces from a schema.
///
/// Holds a borrow of the schema for the duration of the run; each traversal
/// is independent and writes to its own surface.
#[derive(Debug, Clone, Copy)]
pub struct GraphBuilder<'a> {
    schema: &'a Schema,
}

impl<'a> GraphBuilder<'a> {
    /// Create a builder over the given schema.
    #[must_use]
    pub const fn new(schema: &'a Schema) -> Self {
        Self { schema }
    }

    /// Build every enabled graph, in output order.
    ///
    /// The handler and flow graphs are always present; the mission graph is
    /// appended when the schema has a `missions` section.
    #[must_use]
    #[instrument(skip(self))]
    pub fn build_all(&self) -> Vec<EventGraph> {
        let mut graphs = Vec::with_capacity(3);

        let mut handler = EventGraph::new(HANDLER_GRAPH);
        self.build_handlers(&mut handler);
        graphs.push(handler);

        let mut flow = EventGraph::new(FLOW_GRAPH);
        self.build_flows(&mut flow);
        graphs.push(flow);

        if self.schema.missions.is_some() {
            let mut missions = EventGraph::new(MISSION_GRAPH);
            self.build_missions(&mut missions);
            graphs.push(missions);
        }

        graphs
    }

    /// Handler traversal: `receives` edges point event → handler, `emits`
    /// edges point handler → event. Adds the synthetic completion handler
    /// when the schema lists `process_conclusion` events.
    pub fn build_handlers<S: Surface>(&self, surface: &mut S) {
        for (name, handler) in &self.schema.handlers {
            let handler_node = format!("{name} Handler");
            surface.add_node(&handler_node, NodeKind::Handler);

            for received in &handler.receives {
                surface.add_node(received, self.event_kind(received));
                surface.add_edge(received, &handler_node, EdgeLabel::HandledBy);
            }
            for emitted in &handler.emits {
                surface.add_node(emitted, self.event_kind(emitted));
                surface.add_edge(&handler_node, emitted, EdgeLabel::Emits);
            }
        }

        if let Some(conclusion) = &self.schema.process_conclusion {
            surface.add_node(CONCLUSION_HANDLER, NodeKind::Handler);
            for emitted in conclusion {
                surface.add_node(emitted, self.event_kind(emitted));
                surface.add_edge(CONCLUSION_HANDLER, emitted, EdgeLabel::Emits);
            }
        }
    }

    /// Flow traversal: every flow emits its listed events.
    pub fn build_flows<S: Surface>(&self, surface: &mut S) {
        for (name, emitted_events) in &self.schema.flows {
            let flow_node = format!("{name} Flow");
            surface.add_node(&flow_node, NodeKind::Flow);

            for emitted in emitted_events {
                surface.add_node(emitted, self.event_kind(emitted));
                surface.add_edge(&flow_node, emitted, EdgeLabel::Emits);
            }
        }
    }

    /// Mission traversal: one grouped region per mission holding its step
    /// nodes; `filters` and `emits` edges point step → event. Event nodes
    /// stay outside the regions since events are shared across missions.
    ///
    /// Does nothing when the schema has no `missions` section.
    pub fn build_missions<S: Surface>(&self, surface: &mut S) {
        let Some(missions) = &self.schema.missions else {
            return;
        };

        for (name, mission) in missions {
            surface.open_group(name, &format!("{name} Mission"));
            for step_name in mission.steps.keys() {
                surface.add_node(&format!("{step_name} Step"), NodeKind::Step);
            }
            surface.close_group();

            for (step_name, step) in &mission.steps {
                let step_node = format!("{step_name} Step");
                for filtered in &step.filters {
                    surface.add_node(filtered, self.event_kind(filtered));
                    surface.add_edge(&step_node, filtered, EdgeLabel::Filters);
                }
                for emitted in &step.emits {
                    surface.add_node(emitted, self.event_kind(emitted));
                    surface.add_edge(&step_node, emitted, EdgeLabel::Emits);
                }
            }
        }
    }

    fn event_kind(&self, event: &str) -> NodeKind {
        NodeKind::Event {
            notifiable: self.schema.is_notifiable(event),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema(raw: &str) -> Schema {
        Schema::from_json(raw).expect("test schema must parse")
    }

    fn login_schema() -> Schema {
        schema(
            r#"{
                "handlers": {
                    "Login": { "receives": ["UserSubmitted"], "emits": ["LoginSucceeded"] }
                },
                "flows": {},
                "notifiable": ["LoginSucceeded"]
            }"#,
        )
    }

    // ── handler traversal ───────────────────────────────────────────────────

    #[test]
    fn login_example_builds_expected_graph() {
        let schema = login_schema();
        let mut g = EventGraph::new(HANDLER_GRAPH);
        GraphBuilder::new(&schema).build_handlers(&mut g);

        assert_eq!(g.node_count(), 3);
        assert!(g.contains_node("UserSubmitted"));
        assert!(g.contains_node("Login Handler"));
        assert!(g.contains_node("LoginSucceeded"));
        assert!(g.has_edge("UserSubmitted", "Login Handler", EdgeLabel::HandledBy));
        assert!(g.has_edge("Login Handler", "LoginSucceeded", EdgeLabel::Emits));
        assert_eq!(
            g.node_kind("LoginSucceeded"),
            Some(NodeKind::Event { notifiable: true })
        );
        assert_eq!(
            g.node_kind("UserSubmitted"),
            Some(NodeKind::Event { notifiable: false })
        );
    }

    #[test]
    fn every_receive_and_emit_becomes_an_edge() {
        let schema = schema(
            r#"{
                "handlers": {
                    "Billing": {
                        "receives": ["OrderPlaced", "OrderCancelled"],
                        "emits": ["InvoiceIssued", "RefundIssued"]
                    }
                },
                "flows": {},
                "notifiable": []
            }"#,
        );
        let mut g = EventGraph::new(HANDLER_GRAPH);
        GraphBuilder::new(&schema).build_handlers(&mut g);

        for received in ["OrderPlaced", "OrderCancelled"] {
            assert!(g.has_edge(received, "Billing Handler", EdgeLabel::HandledBy));
        }
        for emitted in ["InvoiceIssued", "RefundIssued"] {
            assert!(g.has_edge("Billing Handler", emitted, EdgeLabel::Emits));
        }
        assert_eq!(g.edge_count(), 4);
    }

    #[test]
    fn handler_with_empty_lists_still_gets_a_node() {
        let schema = schema(
            r#"{
                "handlers": { "Idle": { "receives": [], "emits": [] } },
                "flows": {},
                "notifiable": []
            }"#,
        );
        let mut g = EventGraph::new(HANDLER_GRAPH);
        GraphBuilder::new(&schema).build_handlers(&mut g);

        assert_eq!(g.node_count(), 1);
        assert!(g.contains_node("Idle Handler"));
        assert_eq!(g.edge_count(), 0);
    }

    #[test]
    fn shared_event_node_is_not_duplicated_across_handlers() {
        let schema = schema(
            r#"{
                "handlers": {
                    "A": { "receives": ["Ping"], "emits": [] },
                    "B": { "receives": ["Ping"], "emits": ["Ping"] }
                },
                "flows": {},
                "notifiable": []
            }"#,
        );
        let mut g = EventGraph::new(HANDLER_GRAPH);
        GraphBuilder::new(&schema).build_handlers(&mut g);

        // Ping, A Handler, B Handler
        assert_eq!(g.node_count(), 3);
        assert!(g.has_edge("Ping", "A Handler", EdgeLabel::HandledBy));
        assert!(g.has_edge("Ping", "B Handler", EdgeLabel::HandledBy));
        assert!(g.has_edge("B Handler", "Ping", EdgeLabel::Emits));
    }

    // ── synthetic completion handler ────────────────────────────────────────

    #[test]
    fn process_conclusion_adds_completion_handler() {
        let schema = schema(
            r#"{
                "handlers": {}, "flows": {}, "notifiable": ["Farewell"],
                "process_conclusion": ["Farewell", "SessionClosed"]
            }"#,
        );
        let mut g = EventGraph::new(HANDLER_GRAPH);
        GraphBuilder::new(&schema).build_handlers(&mut g);

        assert!(g.contains_node(CONCLUSION_HANDLER));
        assert_eq!(g.node_kind(CONCLUSION_HANDLER), Some(NodeKind::Handler));
        assert!(g.has_edge(CONCLUSION_HANDLER, "Farewell", EdgeLabel::Emits));
        assert!(g.has_edge(CONCLUSION_HANDLER, "SessionClosed", EdgeLabel::Emits));
        assert_eq!(
            g.node_kind("Farewell"),
            Some(NodeKind::Event { notifiable: true })
        );
    }

    #[test]
    fn no_completion_handler_without_process_conclusion() {
        let schema = login_schema();
        let mut g = EventGraph::new(HANDLER_GRAPH);
        GraphBuilder::new(&schema).build_handlers(&mut g);
        assert!(!g.contains_node(CONCLUSION_HANDLER));
    }

    // ── flow traversal ──────────────────────────────────────────────────────

    #[test]
    fn flow_emits_every_listed_event() {
        let schema = schema(
            r#"{
                "handlers": {},
                "flows": { "Signup": ["AccountCreated", "WelcomeMailQueued"] },
                "notifiable": ["WelcomeMailQueued"]
            }"#,
        );
        let mut g = EventGraph::new(FLOW_GRAPH);
        GraphBuilder::new(&schema).build_flows(&mut g);

        assert_eq!(g.node_kind("Signup Flow"), Some(NodeKind::Flow));
        assert!(g.has_edge("Signup Flow", "AccountCreated", EdgeLabel::Emits));
        assert!(g.has_edge("Signup Flow", "WelcomeMailQueued", EdgeLabel::Emits));
        assert_eq!(
            g.node_kind("WelcomeMailQueued"),
            Some(NodeKind::Event { notifiable: true })
        );
    }

    #[test]
    fn handlers_do_not_leak_into_flow_graph() {
        let schema = schema(
            r#"{
                "handlers": { "Login": { "receives": ["X"], "emits": [] } },
                "flows": { "F": ["Y"] },
                "notifiable": []
            }"#,
        );
        let mut g = EventGraph::new(FLOW_GRAPH);
        GraphBuilder::new(&schema).build_flows(&mut g);

        assert!(!g.contains_node("Login Handler"));
        assert!(!g.contains_node("X"));
        assert_eq!(g.node_count(), 2);
    }

    // ── mission traversal ───────────────────────────────────────────────────

    fn mission_schema() -> Schema {
        schema(
            r#"{
                "handlers": {}, "flows": {}, "notifiable": ["GreetingShown"],
                "missions": {
                    "Onboarding": {
                        "steps": {
                            "Greet": {
                                "filters": ["AccountCreated"],
                                "emits": ["GreetingShown"]
                            },
                            "Tour": {
                                "filters": ["GreetingShown"],
                                "emits": ["TourFinished"]
                            }
                        }
                    }
                }
            }"#,
        )
    }

    #[test]
    fn mission_steps_filter_and_emit() {
        let schema = mission_schema();
        let mut g = EventGraph::new(MISSION_GRAPH);
        GraphBuilder::new(&schema).build_missions(&mut g);

        assert!(g.has_edge("Greet Step", "AccountCreated", EdgeLabel::Filters));
        assert!(g.has_edge("Greet Step", "GreetingShown", EdgeLabel::Emits));
        assert!(g.has_edge("Tour Step", "GreetingShown", EdgeLabel::Filters));
        assert!(g.has_edge("Tour Step", "TourFinished", EdgeLabel::Emits));
        assert_eq!(
            g.node_kind("GreetingShown"),
            Some(NodeKind::Event { notifiable: true })
        );
    }

    #[test]
    fn mission_groups_hold_steps_but_not_events() {
        let schema = mission_schema();
        let mut g = EventGraph::new(MISSION_GRAPH);
        GraphBuilder::new(&schema).build_missions(&mut g);

        assert_eq!(g.groups().len(), 1);
        let group = &g.groups()[0];
        assert_eq!(group.label, "Onboarding Mission");
        // Greet Step and Tour Step; the events stay outside the region.
        assert_eq!(group.members.len(), 2);
    }

    #[test]
    fn event_shared_by_two_missions_sits_outside_both_groups() {
        let schema = schema(
            r#"{
                "handlers": {}, "flows": {}, "notifiable": [],
                "missions": {
                    "First": { "steps": { "A": { "filters": ["Shared"], "emits": [] } } },
                    "Second": { "steps": { "B": { "filters": ["Shared"], "emits": [] } } }
                }
            }"#,
        );
        let mut g = EventGraph::new(MISSION_GRAPH);
        GraphBuilder::new(&schema).build_missions(&mut g);

        assert_eq!(g.groups().len(), 2);
        assert_eq!(g.groups()[0].members.len(), 1);
        assert_eq!(g.groups()[1].members.len(), 1);
        assert!(g.contains_node("Shared"));
        assert!(g.has_edge("A Step", "Shared", EdgeLabel::Filters));
        assert!(g.has_edge("B Step", "Shared", EdgeLabel::Filters));
    }

    #[test]
    fn missions_absent_builds_nothing() {
        let schema = login_schema();
        let mut g = EventGraph::new(MISSION_GRAPH);
        GraphBuilder::new(&schema).build_missions(&mut g);
        assert_eq!(g.node_count(), 0);
        assert!(g.groups().is_empty());
    }

    // ── build_all ───────────────────────────────────────────────────────────

    #[test]
    fn build_all_without_missions_yields_two_graphs() {
        let schema = login_schema();
        let graphs = GraphBuilder::new(&schema).build_all();
        let names: Vec<_> = graphs.iter().map(EventGraph::name).collect();
        assert_eq!(names, [HANDLER_GRAPH, FLOW_GRAPH]);
    }

    #[test]
    fn build_all_with_missions_yields_three_graphs() {
        let schema = mission_schema();
        let graphs = GraphBuilder::new(&schema).build_all();
        let names: Vec<_> = graphs.iter().map(EventGraph::name).collect();
        assert_eq!(names, [HANDLER_GRAPH, FLOW_GRAPH, MISSION_GRAPH]);
    }

    #[test]
    fn empty_missions_section_still_enables_the_graph() {
        let schema = schema(
            r#"{"handlers": {}, "flows": {}, "notifiable": [], "missions": {}}"#,
        );
        let graphs = GraphBuilder::new(&schema).build_all();
        assert_eq!(graphs.len(), 3);
        assert_eq!(graphs[2].node_count(), 0);
    }

    #[test]
    fn building_twice_produces_identical_graphs() {
        let schema = mission_schema();
        let builder = GraphBuilder::new(&schema);
        let first = builder.build_all();
        let second = builder.build_all();

        assert_eq!(first.len(), second.len());
        for (a, b) in first.iter().zip(&second) {
            assert_eq!(a.node_count(), b.node_count());
            assert_eq!(a.edge_count(), b.edge_count());
            for node in a.nodes() {
                assert_eq!(b.node_kind(&node.name), Some(node.kind));
            }
        }
    }

    // ── surface capability ──────────────────────────────────────────────────

    /// Records calls instead of building anything; proves traversals run
    /// against the capability trait alone.
    #[derive(Default)]
    struct Recorder {
        ops: Vec<String>,
    }

    impl Surface for Recorder {
        fn add_node(&mut self, name: &str, kind: NodeKind) {
            self.ops.push(format!("node {name} {kind:?}"));
        }
        fn add_edge(&mut self, from: &str, to: &str, label: EdgeLabel) {
            self.ops.push(format!("edge {from} -> {to} [{}]", label.as_str()));
        }
        fn open_group(&mut self, id: &str, _label: &str) {
            self.ops.push(format!("open {id}"));
        }
        fn close_group(&mut self) {
            self.ops.push("close".to_string());
        }
    }

    #[test]
    fn traversals_only_need_the_surface_trait() {
        let schema = login_schema();
        let mut recorder = Recorder::default();
        GraphBuilder::new(&schema).build_handlers(&mut recorder);

        assert!(
            recorder
                .ops
                .contains(&"edge UserSubmitted -> Login Handler [handled by]".to_string())
        );
        assert!(
            recorder
                .ops
                .contains(&"edge Login Handler -> LoginSucceeded [emits]".to_string())
        );
    }

    #[test]
    fn mission_traversal_brackets_steps_with_group_calls() {
        let schema = mission_schema();
        let mut recorder = Recorder::default();
        GraphBuilder::new(&schema).build_missions(&mut recorder);

        let open_at = recorder
            .ops
            .iter()
            .position(|op| op == "open Onboarding")
            .expect("group opened");
        let close_at = recorder
            .ops
            .iter()
            .position(|op| op == "close")
            .expect("group closed");
        let greet_at = recorder
            .ops
            .iter()
            .position(|op| op.starts_with("node Greet Step"))
            .expect("step node added");
        assert!(open_at < greet_at && greet_at < close_at);
    }
}
