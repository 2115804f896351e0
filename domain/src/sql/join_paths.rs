//! Join paths between tables, derived from foreign keys.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, VecDeque};

/// One foreign key, as the schema tool reports it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relationship {
    pub from_table: String,
    pub from_column: String,
    pub to_table: String,
    pub to_column: String,
}

/// One hop of a join path: `JOIN <to> ON <on>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinStep {
    pub from: String,
    pub to: String,
    /// `orders.customer_id = customers.id`
    pub on: String,
}

/// source table -> target table -> hops
pub type JoinPaths = BTreeMap<String, BTreeMap<String, Vec<JoinStep>>>;

/// Shortest join path between every connected pair of `tables`.
///
/// Foreign keys are followed in both directions. Pairs with no connecting
/// keys are absent; among equally short paths the one through
/// alphabetically earlier tables wins.
pub fn join_paths(tables: &[String], relationships: &[Relationship]) -> JoinPaths {
    let mut graph: HashMap<&str, Vec<(&str, String)>> = HashMap::new();
    for rel in relationships {
        let on = format!(
            "{}.{} = {}.{}",
            rel.from_table, rel.from_column, rel.to_table, rel.to_column
        );
        graph
            .entry(rel.from_table.as_str())
            .or_default()
            .push((rel.to_table.as_str(), on.clone()));
        graph
            .entry(rel.to_table.as_str())
            .or_default()
            .push((rel.from_table.as_str(), on));
    }
    for edges in graph.values_mut() {
        edges.sort();
    }

    let mut paths = JoinPaths::new();
    for source in tables {
        let reached = shortest_from(&graph, source);
        let targets: BTreeMap<String, Vec<JoinStep>> = tables
            .iter()
            .filter(|target| *target != source)
            .filter_map(|target| {
                reached
                    .get(target.as_str())
                    .map(|steps| (target.clone(), steps.clone()))
            })
            .collect();
        if !targets.is_empty() {
            paths.insert(source.clone(), targets);
        }
    }
    paths
}

/// Breadth-first search from `source`, keeping the first path to each table.
fn shortest_from<'a>(
    graph: &HashMap<&'a str, Vec<(&'a str, String)>>,
    source: &'a str,
) -> HashMap<&'a str, Vec<JoinStep>> {
    let mut reached: HashMap<&str, Vec<JoinStep>> = HashMap::new();
    reached.insert(source, Vec::new());
    let mut queue = VecDeque::from([source]);

    while let Some(table) = queue.pop_front() {
        let Some(edges) = graph.get(table) else {
            continue;
        };
        for &(next, ref on) in edges {
            if reached.contains_key(next) {
                continue;
            }
            let mut steps = reached.get(table).cloned().unwrap_or_default();
            steps.push(JoinStep {
                from: table.to_string(),
                to: next.to_string(),
                on: on.clone(),
            });
            reached.insert(next, steps);
            queue.push_back(next);
        }
    }
    reached
}
