//! Per-agent running statistics.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Running tally for one agent; not reduced when the event log evicts.
#[derive(Debug, Clone)]
pub struct AgentStatistics {
    invocations: u64,
    successes: u64,
    errors: u64,
    total_latency_ms: u64,
    recent: VecDeque<u64>,
    window: usize,
}

/// Serializable view of [`AgentStatistics`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatisticsSnapshot {
    pub invocations: u64,
    pub successes: u64,
    pub errors: u64,
    /// Calls started but not yet completed
    pub in_flight: u64,
    pub total_latency_ms: u64,
    pub avg_latency_ms: f64,
    pub rolling_avg_latency_ms: f64,
    pub success_rate: f64,
}

impl AgentStatistics {
    pub fn new(window: usize) -> Self {
        Self {
            invocations: 0,
            successes: 0,
            errors: 0,
            total_latency_ms: 0,
            recent: VecDeque::with_capacity(window.max(1)),
            window: window.max(1),
        }
    }

    pub fn record_start(&mut self) {
        self.invocations += 1;
    }

    pub fn record_completion(&mut self, success: bool, latency_ms: u64) {
        if success {
            self.successes += 1;
        } else {
            self.errors += 1;
        }
        self.total_latency_ms += latency_ms;
        if self.recent.len() == self.window {
            self.recent.pop_front();
        }
        self.recent.push_back(latency_ms);
    }

    fn completed(&self) -> u64 {
        self.successes + self.errors
    }

    pub fn snapshot(&self) -> StatisticsSnapshot {
        let completed = self.completed();
        let avg = if completed == 0 {
            0.0
        } else {
            self.total_latency_ms as f64 / completed as f64
        };
        let rolling = if self.recent.is_empty() {
            0.0
        } else {
            self.recent.iter().sum::<u64>() as f64 / self.recent.len() as f64
        };
        StatisticsSnapshot {
            invocations: self.invocations,
            successes: self.successes,
            errors: self.errors,
            in_flight: self.invocations.saturating_sub(completed),
            total_latency_ms: self.total_latency_ms,
            avg_latency_ms: avg,
            rolling_avg_latency_ms: rolling,
            success_rate: if completed == 0 {
                0.0
            } else {
                self.successes as f64 / completed as f64
            },
        }
    }
}
