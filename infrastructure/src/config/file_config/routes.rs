//! Route table from TOML (`[routes]` section)
//!
//! Keys are intents, values are agent chains joined by `>`. The `default`
//! key covers `unknown` and every intent without its own entry.
//!
//! ```toml
//! [routes]
//! data_retrieval = "sql_generation>execution"
//! trend_analysis = "sql_generation>execution>visualization"
//! default = "sql_generation"
//! ```

use prism_domain::{ConfigIssue, ConfigIssueCode, Intent, RouteChain, RouteTable};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const DEFAULT_KEY: &str = "default";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileRoutesConfig(pub BTreeMap<String, String>);

impl FileRoutesConfig {
    /// Built-in table with the configured entries applied on top.
    pub fn to_route_table(&self) -> (RouteTable, Vec<ConfigIssue>) {
        let mut table = RouteTable::default();
        let mut issues = Vec::new();

        for (key, value) in &self.0 {
            let chain: RouteChain = match value.parse() {
                Ok(chain) => chain,
                Err(_) => {
                    issues.push(ConfigIssue::warning(
                        ConfigIssueCode::InvalidRoute,
                        format!("routes.{}: '{}' names no agents, entry ignored", key, value),
                    ));
                    continue;
                }
            };

            if key == DEFAULT_KEY {
                table.set_default(chain);
                continue;
            }
            match key.parse::<Intent>() {
                Ok(intent) => table.set_route(intent, chain),
                Err(_) => issues.push(ConfigIssue::warning(
                    ConfigIssueCode::InvalidIntent,
                    format!(
                        "routes.{}: unknown intent, expected one of {}",
                        key,
                        Intent::ALL
                            .iter()
                            .map(Intent::as_str)
                            .collect::<Vec<_>>()
                            .join(", ")
                    ),
                )),
            }
        }
        (table, issues)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn routes(entries: &[(&str, &str)]) -> FileRoutesConfig {
        FileRoutesConfig(
            entries
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    #[test]
    fn test_overrides_and_default() {
        let (table, issues) = routes(&[
            ("comparison", "sql_generation > execution > visualization"),
            ("default", "visualization"),
        ])
        .to_route_table();

        assert!(issues.is_empty());
        assert_eq!(
            table.resolve(Intent::Comparison).to_string(),
            "sql_generation>execution>visualization"
        );
        assert_eq!(table.resolve(Intent::Unknown).to_string(), "visualization");
        // untouched entries keep their built-in chain
        assert_eq!(
            table.resolve(Intent::DataRetrieval).to_string(),
            "sql_generation>execution"
        );
    }

    #[test]
    fn test_invalid_entries_are_reported() {
        let (table, issues) =
            routes(&[("astrology", "nlu"), ("trend_analysis", " > ")]).to_route_table();
        assert_eq!(table, RouteTable::default());
        let codes: Vec<_> = issues.iter().map(|i| i.code).collect();
        assert_eq!(codes, vec![ConfigIssueCode::InvalidIntent, ConfigIssueCode::InvalidRoute]);
    }
}
