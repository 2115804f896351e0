//! Orchestration value objects - the result envelope of one `process` call.

use crate::agent::entities::AgentId;
use crate::agent::value_objects::AgentResult;
use crate::core::error::ErrorInfo;
use crate::nlu::entities::Intent;
use crate::orchestration::mode::ProcessingMode;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrchestrationStatus {
    Success,
    Error,
}

/// One agent's contribution, in invocation order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentOutcome {
    pub agent_id: AgentId,
    #[serde(flatten)]
    pub result: AgentResult,
}

/// Two collaborate-mode agents wrote the same key; `kept` won.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeConflict {
    pub key: String,
    pub kept: AgentId,
    pub dropped: AgentId,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultMetadata {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub merge_conflicts: Vec<MergeConflict>,
    /// Intent that drove routing, when NLU ran
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intent: Option<Intent>,
    /// Chain selected in route mode
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub route: Vec<AgentId>,
    #[serde(default)]
    pub elapsed_ms: u64,
}

/// Aggregated outcome of one orchestration run.
///
/// `per_agent` is kept on every path, including errors and timeouts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrchestrationResult {
    pub status: OrchestrationStatus,
    pub result: Value,
    pub mode_used: ProcessingMode,
    pub per_agent: Vec<AgentOutcome>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorInfo>,
    #[serde(default)]
    pub metadata: ResultMetadata,
}

impl OrchestrationResult {
    pub fn success(mode_used: ProcessingMode, result: Value, per_agent: Vec<AgentOutcome>) -> Self {
        Self {
            status: OrchestrationStatus::Success,
            result,
            mode_used,
            per_agent,
            error: None,
            metadata: ResultMetadata::default(),
        }
    }

    pub fn failure(
        mode_used: ProcessingMode,
        error: ErrorInfo,
        per_agent: Vec<AgentOutcome>,
    ) -> Self {
        Self {
            status: OrchestrationStatus::Error,
            result: Value::Null,
            mode_used,
            per_agent,
            error: Some(error),
            metadata: ResultMetadata::default(),
        }
    }

    pub fn with_metadata(mut self, metadata: ResultMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn is_success(&self) -> bool {
        self.status == OrchestrationStatus::Success
    }

    /// Latest result recorded for `agent_id`
    pub fn agent_result(&self, agent_id: &str) -> Option<&AgentResult> {
        self.per_agent
            .iter()
            .rev()
            .find(|o| o.agent_id == agent_id)
            .map(|o| &o.result)
    }

    pub fn invoked_agents(&self) -> Vec<&AgentId> {
        self.per_agent.iter().map(|o| &o.agent_id).collect()
    }

    pub fn failed_count(&self) -> usize {
        self.per_agent
            .iter()
            .filter(|o| !o.result.is_success())
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_serialized_shape() {
        let result = OrchestrationResult::success(
            ProcessingMode::Route,
            json!({"rows": []}),
            vec![AgentOutcome {
                agent_id: "nlu".into(),
                result: AgentResult::success(json!({"intent": "data_retrieval"})),
            }],
        );
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["status"], "success");
        assert_eq!(json["mode_used"], "route");
        assert_eq!(json["per_agent"][0]["agent_id"], "nlu");
        assert_eq!(json["per_agent"][0]["status"], "success");
        assert!(json.get("error").is_none());
    }

    #[test]
    fn test_failure_keeps_partial_results() {
        let per_agent = vec![
            AgentOutcome {
                agent_id: "nlu".into(),
                result: AgentResult::success(json!({})),
            },
            AgentOutcome {
                agent_id: "sql_generation".into(),
                result: AgentResult::error(ErrorInfo::agent_error("model down")),
            },
        ];
        let result = OrchestrationResult::failure(
            ProcessingMode::Coordinate,
            ErrorInfo::agent_error("model down"),
            per_agent,
        );
        assert!(!result.is_success());
        assert_eq!(result.failed_count(), 1);
        assert!(result.agent_result("nlu").unwrap().is_success());
        assert_eq!(result.invoked_agents().len(), 2);
    }
}
