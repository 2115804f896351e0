//! Console output formatter for orchestration results

use crate::output::formatter::OutputFormatter;
use colored::Colorize;
use prism_application::MonitorStatistics;
use prism_domain::{
    AgentResult, ErrorInfo, ExecutionEvent, ExecutionGraph, OrchestrationResult, OutputFormat,
};
use serde_json::Value;

/// Widest a table cell is allowed to render
const MAX_CELL_WIDTH: usize = 40;

/// Formats orchestration results for console display
pub struct ConsoleFormatter;

impl ConsoleFormatter {
    /// Force colored output on or off for the whole process
    pub fn set_color(enabled: bool) {
        colored::control::set_override(enabled);
    }

    /// Render `result` in `format`
    pub fn render(result: &OrchestrationResult, format: OutputFormat) -> String {
        match format {
            OutputFormat::Full => Self::format_full(result),
            OutputFormat::Result => Self::format_result(result),
            OutputFormat::Json => Self::format_json(result),
        }
    }

    /// Result plus every agent outcome and the run metadata
    pub fn format_full(result: &OrchestrationResult) -> String {
        let mut output = String::new();

        output.push_str(&Self::header("Prism Result"));
        output.push('\n');

        let status = if result.is_success() {
            "success".green().bold()
        } else {
            "error".red().bold()
        };
        output.push_str(&format!("{} {}\n", "Status:".cyan().bold(), status));
        output.push_str(&format!("{} {}\n", "Mode:".cyan().bold(), result.mode_used));
        if let Some(intent) = result.metadata.intent {
            output.push_str(&format!("{} {}\n", "Intent:".cyan().bold(), intent));
        }
        if !result.metadata.route.is_empty() {
            let route: Vec<&str> = result.metadata.route.iter().map(|id| id.as_str()).collect();
            output.push_str(&format!("{} {}\n", "Route:".cyan().bold(), route.join(" > ")));
        }
        output.push_str(&format!(
            "{} {}ms\n",
            "Elapsed:".cyan().bold(),
            result.metadata.elapsed_ms
        ));

        output.push_str(&Self::section_header("Agents"));
        if result.per_agent.is_empty() {
            output.push_str(&format!("{}\n", "  (no agents invoked)".dimmed()));
        }
        for outcome in &result.per_agent {
            match &outcome.result {
                AgentResult::Success { payload } => output.push_str(&format!(
                    "  {} {} {}\n",
                    "✓".green(),
                    outcome.agent_id.as_str().bold(),
                    Self::payload_summary(payload).dimmed()
                )),
                AgentResult::Error { error } => output.push_str(&format!(
                    "  {} {} {}\n",
                    "✗".red(),
                    outcome.agent_id.as_str().bold(),
                    format!("[{}] {}", error.code, error.message).red()
                )),
            }
        }

        if !result.metadata.merge_conflicts.is_empty() {
            output.push_str(&Self::section_header("Merge Conflicts"));
            for conflict in &result.metadata.merge_conflicts {
                output.push_str(&format!(
                    "  {}: kept {}, dropped {}\n",
                    conflict.key.yellow(),
                    conflict.kept,
                    conflict.dropped
                ));
            }
        }

        output.push_str(&Self::section_header("Result"));
        output.push_str(&Self::format_result(result));
        output.push_str(&Self::footer());
        output
    }

    /// Aggregated result only; tables are drawn when rows are present
    pub fn format_result(result: &OrchestrationResult) -> String {
        if let Some(error) = &result.error {
            return Self::format_error(error);
        }

        let mut output = String::new();
        if let Some(sql) = Self::find_field(&result.result, "sql").and_then(Value::as_str) {
            output.push_str(&format!("{} {}\n\n", "SQL:".cyan().bold(), sql));
        }
        if let Some(table) = Self::find_table(&result.result) {
            output.push_str(&table);
        } else if let Some(text) = result.result.as_str() {
            output.push_str(text);
            output.push('\n');
        } else if !result.result.is_null() {
            output.push_str(
                &serde_json::to_string_pretty(&result.result).unwrap_or_else(|_| "{}".to_string()),
            );
            output.push('\n');
        }
        if let Some(chart) = Self::find_field(&result.result, "chart_type").and_then(Value::as_str)
        {
            let reason = Self::find_field(&result.result, "reason")
                .and_then(Value::as_str)
                .unwrap_or_default();
            output.push_str(&format!(
                "\n{} {} {}\n",
                "Chart:".cyan().bold(),
                chart,
                reason.dimmed()
            ));
        }
        let plan = Self::find_field(&result.result, "query_plan").and_then(Value::as_array);
        if let Some(plan) = plan {
            output.push_str(&format!("\n{}\n", "Plan:".cyan().bold()));
            for step in plan {
                let detail = step.get("detail").and_then(Value::as_str).unwrap_or_default();
                output.push_str(&format!("  {}\n", detail));
            }
        }
        output
    }

    /// The whole envelope as JSON
    pub fn format_json(result: &OrchestrationResult) -> String {
        serde_json::to_string_pretty(result).unwrap_or_else(|_| "{}".to_string())
    }

    /// Error with its cause chain, innermost last
    pub fn format_error(error: &ErrorInfo) -> String {
        let mut output = format!(
            "{} {}\n",
            format!("Error [{}]:", error.code).red().bold(),
            error.message
        );
        let mut cause = error.cause.as_deref();
        while let Some(inner) = cause {
            output.push_str(&format!(
                "  {} [{}] {}\n",
                "caused by".dimmed(),
                inner.code,
                inner.message
            ));
            cause = inner.cause.as_deref();
        }
        output
    }

    pub fn format_statistics(stats: &MonitorStatistics) -> String {
        let mut output = Self::section_header("Agent Statistics");
        output.push_str(&format!(
            "  queries: {}  events: {} (retained {}, evicted {})\n",
            stats.queries, stats.total_events, stats.retained_events, stats.evicted_events
        ));
        if !stats.queries_by_mode.is_empty() {
            let modes: Vec<String> = stats
                .queries_by_mode
                .iter()
                .map(|(mode, count)| format!("{}={}", mode, count))
                .collect();
            output.push_str(&format!("  by mode: {}\n", modes.join(", ")));
        }
        output.push('\n');
        output.push_str(&format!(
            "  {:<16} {:>6} {:>6} {:>6} {:>10} {:>10}\n",
            "agent", "calls", "ok", "err", "avg ms", "recent ms"
        ));
        for (agent, snapshot) in &stats.agents {
            output.push_str(&format!(
                "  {:<16} {:>6} {:>6} {:>6} {:>10.1} {:>10.1}\n",
                agent,
                snapshot.invocations,
                snapshot.successes,
                snapshot.errors,
                snapshot.avg_latency_ms,
                snapshot.rolling_avg_latency_ms
            ));
        }
        output
    }

    pub fn format_graph(graph: &ExecutionGraph) -> String {
        let mut output = Self::section_header("Execution Graph");
        if graph.edges.is_empty() {
            output.push_str(&format!("{}\n", "  (empty)".dimmed()));
        }
        for edge in &graph.edges {
            output.push_str(&format!(
                "  {} {} {} {}\n",
                edge.caller.yellow(),
                "->".dimmed(),
                edge.callee.yellow(),
                format!("x{}", edge.count).dimmed()
            ));
        }
        output
    }

    pub fn format_events(events: &[ExecutionEvent]) -> String {
        let mut output = Self::section_header("Events");
        for event in events {
            let kind = match event.event_type.as_str() {
                "error" => event.event_type.as_str().red(),
                "end" => event.event_type.as_str().green(),
                other => other.normal(),
            };
            let detail = serde_json::to_string(&event.metadata).unwrap_or_default();
            output.push_str(&format!(
                "  {} {:<16} {:<6} {}\n",
                event.timestamp.format("%H:%M:%S%.3f").to_string().dimmed(),
                event.agent_id.as_str(),
                kind,
                detail.dimmed()
            ));
        }
        output
    }

    /// `key` on `value` itself or on one of its direct children
    fn find_field<'a>(value: &'a Value, key: &str) -> Option<&'a Value> {
        let object = value.as_object()?;
        object.get(key).or_else(|| {
            object
                .values()
                .filter_map(Value::as_object)
                .find_map(|child| child.get(key))
        })
    }

    fn find_table(value: &Value) -> Option<String> {
        let rows = Self::find_field(value, "rows")?.as_array()?;
        let columns: Vec<String> = match Self::find_field(value, "columns")
            .and_then(Value::as_array)
        {
            Some(columns) => columns
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect(),
            None => rows
                .first()
                .and_then(Value::as_object)
                .map(|row| row.keys().cloned().collect())
                .unwrap_or_default(),
        };
        Some(Self::table(&columns, rows))
    }

    fn cell(value: Option<&Value>) -> String {
        let text = match value {
            None | Some(Value::Null) => "NULL".to_string(),
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
        };
        if text.chars().count() > MAX_CELL_WIDTH {
            let cut: String = text.chars().take(MAX_CELL_WIDTH - 1).collect();
            format!("{}…", cut)
        } else {
            text
        }
    }

    fn table(columns: &[String], rows: &[Value]) -> String {
        let cells: Vec<Vec<String>> = rows
            .iter()
            .map(|row| {
                columns
                    .iter()
                    .map(|column| Self::cell(row.get(column)))
                    .collect()
            })
            .collect();
        let widths: Vec<usize> = columns
            .iter()
            .enumerate()
            .map(|(i, column)| {
                cells
                    .iter()
                    .map(|row| row[i].chars().count())
                    .chain(std::iter::once(column.chars().count()))
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        let line = |values: &[String]| -> String {
            values
                .iter()
                .zip(&widths)
                .map(|(value, width)| format!("{:<width$}", value, width = width))
                .collect::<Vec<_>>()
                .join(" | ")
        };

        let mut output = format!("{}\n", line(columns).bold());
        output.push_str(&format!(
            "{}\n",
            widths
                .iter()
                .map(|w| "-".repeat(*w))
                .collect::<Vec<_>>()
                .join("-+-")
        ));
        for row in &cells {
            output.push_str(&line(row));
            output.push('\n');
        }
        output.push_str(&format!(
            "{}\n",
            format!("({} row{})", rows.len(), if rows.len() == 1 { "" } else { "s" }).dimmed()
        ));
        output
    }

    fn payload_summary(payload: &Value) -> String {
        match payload {
            Value::Object(map) => {
                if let Some(intent) = map.get("intent").and_then(Value::as_str) {
                    format!("intent={}", intent)
                } else if let Some(count) = map.get("row_count") {
                    format!("{} rows", count)
                } else if let Some(chart) = map.get("chart_type").and_then(Value::as_str) {
                    format!("chart={}", chart)
                } else if let Some(sql) = map.get("sql").and_then(Value::as_str) {
                    sql.to_string()
                } else if let Some(tables) = map.get("tables").and_then(Value::as_array) {
                    format!("{} tables", tables.len())
                } else {
                    let keys: Vec<&str> = map.keys().map(String::as_str).collect();
                    format!("{{{}}}", keys.join(", "))
                }
            }
            other => Self::cell(Some(other)),
        }
    }

    fn header(title: &str) -> String {
        let line = "=".repeat(60);
        format!("{}\n{:^60}\n{}", line.cyan(), title.bold(), line.cyan())
    }

    fn section_header(title: &str) -> String {
        format!("\n{}\n{}\n", title.cyan().bold(), "-".repeat(40))
    }

    fn footer() -> String {
        format!("\n{}\n", "=".repeat(60).cyan())
    }
}

impl OutputFormatter for ConsoleFormatter {
    fn format(&self, result: &OrchestrationResult, format: OutputFormat) -> String {
        Self::render(result, format)
    }

    fn format_statistics(&self, stats: &MonitorStatistics) -> String {
        Self::format_statistics(stats)
    }

    fn format_graph(&self, graph: &ExecutionGraph) -> String {
        Self::format_graph(graph)
    }

    fn format_events(&self, events: &[ExecutionEvent]) -> String {
        Self::format_events(events)
    }
}
