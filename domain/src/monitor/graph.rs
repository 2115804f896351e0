//! Execution graph derived from the event log.

use super::event::{EventType, ExecutionEvent};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphEdge {
    pub caller: String,
    pub callee: String,
    pub count: u64,
}

/// Directed `caller -> callee` edges with call counts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionGraph {
    pub nodes: Vec<String>,
    pub edges: Vec<GraphEdge>,
}

impl ExecutionGraph {
    /// Rebuild from events; each `Start` with a `caller` is one call.
    pub fn from_events<'a>(events: impl IntoIterator<Item = &'a ExecutionEvent>) -> Self {
        let mut nodes = BTreeSet::new();
        let mut counts: BTreeMap<(String, String), u64> = BTreeMap::new();

        for event in events {
            if event.event_type == EventType::Query {
                continue;
            }
            nodes.insert(event.agent_id.to_string());
            if event.event_type == EventType::Start
                && let Some(caller) = event.caller()
            {
                nodes.insert(caller.to_string());
                *counts
                    .entry((caller.to_string(), event.agent_id.to_string()))
                    .or_default() += 1;
            }
        }

        Self {
            nodes: nodes.into_iter().collect(),
            edges: counts
                .into_iter()
                .map(|((caller, callee), count)| GraphEdge {
                    caller,
                    callee,
                    count,
                })
                .collect(),
        }
    }

    pub fn edge(&self, caller: &str, callee: &str) -> Option<&GraphEdge> {
        self.edges
            .iter()
            .find(|e| e.caller == caller && e.callee == callee)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monitor::event::ORCHESTRATOR_ID;

    #[test]
    fn test_graph_counts_calls_per_edge() {
        let events = vec![
            ExecutionEvent::start("nlu", ORCHESTRATOR_ID),
            ExecutionEvent::end("nlu", 3),
            ExecutionEvent::start("sql_generation", ORCHESTRATOR_ID),
            ExecutionEvent::start("nlu", ORCHESTRATOR_ID),
            ExecutionEvent::start("schema", "sql_generation"),
            ExecutionEvent::new("orchestrator", EventType::Query),
        ];
        let graph = ExecutionGraph::from_events(&events);

        assert_eq!(graph.edge("orchestrator", "nlu").map(|e| e.count), Some(2));
        assert_eq!(graph.edge("sql_generation", "schema").map(|e| e.count), Some(1));
        assert_eq!(graph.edges.len(), 3);
        assert_eq!(
            graph.nodes,
            vec!["nlu", "orchestrator", "schema", "sql_generation"]
        );
    }

    #[test]
    fn test_empty_graph() {
        assert_eq!(
            ExecutionGraph::from_events(&Vec::<ExecutionEvent>::new()),
            ExecutionGraph::default()
        );
    }
}
