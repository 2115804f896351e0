//! Prompt templates for the LLM-backed agents

use crate::nlu::entities::Intent;

/// Templates for the NLU and SQL-generation prompts
pub struct PromptTemplate;

impl PromptTemplate {
    /// System prompt for intent classification
    pub fn nlu_system() -> String {
        let intents: Vec<&str> = Intent::ALL.iter().map(Intent::as_str).collect();
        format!(
            r#"You are a natural language understanding component of a database assistant.
Classify the user's question and extract the entities it mentions.

Respond ONLY with a JSON object in a ```json block, using this shape:
{{
  "intent": "one of the valid intents",
  "confidence": number between 0 and 1,
  "entities": [{{"name": "...", "value": "...", "type": "table|column|value|date|number"}}],
  "ambiguities": [{{"term": "...", "possible_meanings": ["..."]}}],
  "needs_schema": true or false
}}

Valid intents: {}
If you are unsure, use "unknown" with a low confidence score.
Set "needs_schema" to true when table or column names must be looked up."#,
            intents.join(", ")
        )
    }

    /// User prompt for intent classification
    pub fn nlu_query(question: &str, schema_summary: Option<&str>) -> String {
        match schema_summary {
            Some(schema) => format!(
                "Known database schema:\n{}\n\nQuestion: {}",
                schema, question
            ),
            None => format!("Question: {}", question),
        }
    }

    /// System prompt for SQL generation
    pub fn sql_system(dialect: &str) -> String {
        format!(
            r#"You are an expert {} SQL writer.
Write exactly one read-only SQL statement that answers the user's question.
Use only tables and columns from the provided schema.
Return the statement in a ```sql block, with no explanation after it."#,
            dialect
        )
    }

    /// User prompt for SQL generation
    pub fn sql_query(
        question: &str,
        intent: Option<Intent>,
        entities: &[String],
        schema_summary: Option<&str>,
        max_rows: usize,
    ) -> String {
        let mut prompt = format!("Question: {}\n", question);
        if let Some(intent) = intent {
            prompt.push_str(&format!("Intent: {}\n", intent));
        }
        if !entities.is_empty() {
            prompt.push_str(&format!("Mentioned entities: {}\n", entities.join(", ")));
        }
        match schema_summary {
            Some(schema) => prompt.push_str(&format!("\nSchema:\n{}\n", schema)),
            None => prompt.push_str("\nSchema: unknown, infer sensible table names.\n"),
        }
        prompt.push_str(&format!(
            "\nLimit the result to at most {} rows unless the question asks for an aggregate.",
            max_rows
        ));
        prompt
    }

    /// User prompt asking the model to repair SQL that failed schema checks
    pub fn sql_fix(sql: &str, errors: &[String], schema_summary: &str) -> String {
        let mut prompt = format!(
            "This SQL query does not match the schema:\n{}\n\nProblems:\n",
            sql
        );
        for error in errors {
            prompt.push_str(&format!("- {}\n", error));
        }
        prompt.push_str(&format!("\nSchema:\n{}\n", schema_summary));
        prompt.push_str(
            "\nRewrite the query using only these tables and columns. \
             Keep its intent and change only what the problems require.",
        );
        prompt
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nlu_system_lists_every_intent() {
        let prompt = PromptTemplate::nlu_system();
        for intent in Intent::ALL {
            assert!(prompt.contains(intent.as_str()));
        }
        assert!(prompt.contains("\"needs_schema\""));
    }

    #[test]
    fn test_sql_fix_lists_problems() {
        let prompt = PromptTemplate::sql_fix(
            "SELECT email FROM users",
            &["Table 'users' does not exist".to_string()],
            "customers(id, email)",
        );
        assert!(prompt.contains("SELECT email FROM users"));
        assert!(prompt.contains("- Table 'users' does not exist"));
        assert!(prompt.contains("customers(id, email)"));
    }

    #[test]
    fn test_sql_query_includes_context() {
        let prompt = PromptTemplate::sql_query(
            "top customers",
            Some(Intent::Aggregation),
            &["customers".to_string()],
            Some("customers(id, name)"),
            50,
        );
        assert!(prompt.contains("Intent: aggregation"));
        assert!(prompt.contains("Mentioned entities: customers"));
        assert!(prompt.contains("customers(id, name)"));
        assert!(prompt.contains("at most 50 rows"));
    }

    #[test]
    fn test_nlu_query_without_schema() {
        assert_eq!(PromptTemplate::nlu_query("list users", None), "Question: list users");
    }
}
