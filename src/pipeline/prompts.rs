//! Prompt composition
//!
//! All prompt text sent to backends is assembled here so the stages only
//! decide *which* pieces apply.

use super::classifier::{Intent, OutputFormat};
use crate::providers::SearchResults;
use crate::router::Task;

/// Instructions for the Classifier backend
pub const CLASSIFIER_SYSTEM_PROMPT: &str = r#"You are a task classifier. Analyze the user's task and return ONLY a JSON object with this exact structure:

{
  "intent": "code|reasoning|general",
  "format": "text|diff|json",
  "needs_citations": true|false,
  "confidence": 0.0
}

Guidelines:
- intent="code" for coding tasks, refactoring, debugging, writing code
- intent="reasoning" for complex problem-solving, analysis, research, math
- intent="general" for summarization, rewriting, simple questions
- format="diff" if output should be code changes
- format="json" if structured data is expected
- format="text" otherwise
- needs_citations=true if sources/references are needed
- confidence is 0.0-1.0 based on clarity of the task

Return ONLY the JSON object, no explanation."#;

/// Task-agnostic system prompt used by the Fallback stage
pub const FALLBACK_SYSTEM_PROMPT: &str =
    "You are a helpful assistant. Provide accurate responses.";

const CITATION_INSTRUCTION: &str = "\n\nInclude citations and references where applicable.";

const SOURCES_HEADER: &str = "\n\n---\n**Sources:**\n";

/// Classifier user prompt
pub fn classifier_user_prompt(task: Task, input: &str) -> String {
    format!("Task type: {}\nUser input: {}", task, input)
}

/// User prompt shared by the Executor, its substitute call and Fallback
pub fn user_prompt(task: Task, input: &str) -> String {
    format!("Task: {}\n\n{}", task, input)
}

/// Base system template for an intent
pub fn system_template(intent: Intent) -> &'static str {
    match intent {
        Intent::Code => "You are an expert coding assistant. Provide clear, correct code.",
        Intent::Reasoning => {
            "You are a reasoning expert. Think step-by-step and provide detailed analysis."
        }
        Intent::General => "You are a helpful assistant.",
    }
}

/// Output-format instruction suffix (empty for plain text)
pub fn format_instructions(format: OutputFormat) -> &'static str {
    match format {
        OutputFormat::Diff => {
            "\n\nProvide output as a unified diff format starting with --- and +++."
        }
        OutputFormat::Json => "\n\nProvide output as valid JSON.",
        OutputFormat::Text => "",
    }
}

/// Generic citation instruction, used when no search context was added
pub fn citation_instruction() -> &'static str {
    CITATION_INSTRUCTION
}

/// Render search results as a context block for the system prompt
///
/// ```text
/// Search Results for: <query>
/// Found N relevant sources:
///
/// 1. <title>
///    URL: <url>
///    <snippet>
/// ```
pub fn search_context(results: &SearchResults) -> String {
    let mut lines = vec![
        format!("Search Results for: {}", results.query),
        format!("Found {} relevant sources:", results.results.len()),
        String::new(),
    ];
    for (i, hit) in results.results.iter().enumerate() {
        lines.push(format!("{}. {}", i + 1, hit.title));
        lines.push(format!("   URL: {}", hit.url));
        if !hit.snippet.is_empty() {
            lines.push(format!("   {}", hit.snippet));
        }
        lines.push(String::new());
    }
    lines.join("\n")
}

/// System prompt suffix carrying the search context and citation guidance
pub fn search_augmentation(results: &SearchResults) -> String {
    format!(
        "\n\nYou have access to the following search results to help answer the question:\n\n{}\
         \n\nUse these sources to provide accurate, cited information. Reference sources using [1], [2], etc.",
        search_context(results)
    )
}

/// `[i] title - url` line per search hit, numbered from 1
pub fn source_lines(results: &SearchResults) -> Vec<String> {
    results
        .results
        .iter()
        .enumerate()
        .map(|(i, hit)| format!("[{}] {} - {}", i + 1, hit.title, hit.url))
        .collect()
}

/// Sources footer appended to an augmented result
pub fn sources_footer(sources: &[String]) -> String {
    format!("{}{}", SOURCES_HEADER, sources.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::SearchHit;

    fn results() -> SearchResults {
        SearchResults {
            query: "rust async".to_string(),
            results: vec![
                SearchHit {
                    title: "Async Book".to_string(),
                    url: "https://rust-lang.github.io/async-book".to_string(),
                    snippet: "Asynchronous programming in Rust".to_string(),
                },
                SearchHit {
                    title: "Tokio".to_string(),
                    url: "https://tokio.rs".to_string(),
                    snippet: String::new(),
                },
            ],
        }
    }

    #[test]
    fn test_user_prompts() {
        assert_eq!(user_prompt(Task::Solve, "2+2"), "Task: solve\n\n2+2");
        assert_eq!(
            classifier_user_prompt(Task::Code, "fix it"),
            "Task type: code\nUser input: fix it"
        );
    }

    #[test]
    fn test_search_context_layout() {
        let context = search_context(&results());
        assert!(context.starts_with("Search Results for: rust async\nFound 2 relevant sources:\n\n"));
        assert!(context.contains("1. Async Book\n   URL: https://rust-lang.github.io/async-book\n   Asynchronous programming in Rust\n"));
        assert!(context.contains("2. Tokio\n   URL: https://tokio.rs\n"));
    }

    #[test]
    fn test_source_lines_are_numbered_from_one() {
        assert_eq!(
            source_lines(&results()),
            vec![
                "[1] Async Book - https://rust-lang.github.io/async-book".to_string(),
                "[2] Tokio - https://tokio.rs".to_string(),
            ]
        );
    }

    #[test]
    fn test_sources_footer() {
        let footer = sources_footer(&["[1] A - a".to_string(), "[2] B - b".to_string()]);
        assert_eq!(footer, "\n\n---\n**Sources:**\n[1] A - a\n[2] B - b");
    }

    #[test]
    fn test_format_instructions() {
        assert!(format_instructions(OutputFormat::Diff).contains("---"));
        assert!(format_instructions(OutputFormat::Json).contains("valid JSON"));
        assert!(format_instructions(OutputFormat::Text).is_empty());
    }
}
