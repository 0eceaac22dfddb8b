use std::fmt::Write as FmtWrite;

use serde::Serialize;

use crate::error::{AppError, IngestError, QueryError};
use crate::models::{Answer, IngestReport, OutputFormat};

/// One-line description of a failed command: the error kind and a message
/// without backend detail. Errors from outside the pipelines (argument and
/// file handling) are shown as is.
pub fn describe_error(err: &anyhow::Error) -> String {
    if let Some(e) = err.downcast_ref::<IngestError>() {
        format!("{} ({})", e.user_message(), e.kind())
    } else if let Some(e) = err.downcast_ref::<QueryError>() {
        format!("{} ({})", e.user_message(), e.kind())
    } else if let Some(e) = err.downcast_ref::<AppError>() {
        format!("{} ({})", e.user_message(), e.kind())
    } else {
        format!("{:#}", err)
    }
}

pub trait Formatter {
    fn format_ingest_report(&self, report: &IngestReport) -> String;
    fn format_answer(&self, answer: &Answer, show_context: bool) -> String;
    fn format_status(&self, status: &StatusInfo) -> String;
    fn format_message(&self, message: &str) -> String;
    fn format_error(&self, error: &str) -> String;
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusInfo {
    pub embedding_url: String,
    pub embedding_model: String,
    pub embedding_dimension: u32,
    pub generation_url: String,
    pub generation_model: String,
    pub vector_store_driver: String,
    pub vector_store_url: String,
    pub vector_store_connected: bool,
    pub collection: String,
    /// `None` when the collection has not been created yet.
    pub collection_points: Option<u64>,
    pub api_key_set: bool,
}

pub struct TextFormatter;

impl Formatter for TextFormatter {
    fn format_ingest_report(&self, report: &IngestReport) -> String {
        let mut output = String::new();
        let title = if report.is_complete() {
            "Ingestion Complete"
        } else {
            "Ingestion Finished With Failures"
        };
        writeln!(output, "{}", title).unwrap();
        writeln!(output, "{}", "-".repeat(title.len())).unwrap();
        writeln!(output, "Source:         {}", report.source).unwrap();
        writeln!(output, "Document ID:    {}", report.document_id).unwrap();
        writeln!(output, "Checksum:       {}", report.checksum).unwrap();
        writeln!(output, "Chunks:         {}", report.attempted).unwrap();
        writeln!(output, "Stored:         {}", report.stored).unwrap();
        writeln!(output, "Failed:         {}", report.failed()).unwrap();
        writeln!(output, "Duration:       {}ms", report.duration_ms).unwrap();
        writeln!(
            output,
            "Ingested at:    {}",
            report.ingested_at.format("%Y-%m-%d %H:%M:%S UTC")
        )
        .unwrap();

        if !report.failures.is_empty() {
            writeln!(output).unwrap();
            for failure in &report.failures {
                writeln!(
                    output,
                    "  chunk {} ({}, {}): {}",
                    failure.index, failure.stage, failure.kind, failure.reason
                )
                .unwrap();
            }
        }
        output
    }

    fn format_answer(&self, answer: &Answer, show_context: bool) -> String {
        let mut output = String::new();
        writeln!(output, "{}", answer.answer.trim_end()).unwrap();

        if show_context {
            writeln!(output).unwrap();
            writeln!(output, "Context ({} chunks)", answer.sources.len()).unwrap();
            writeln!(output, "-------").unwrap();
            for (i, source) in answer.sources.iter().enumerate() {
                let origin = source.source.as_deref().unwrap_or("-");
                writeln!(output, "{}. [Score: {:.3}] {}", i + 1, source.score, origin).unwrap();
                for line in source.text.lines() {
                    writeln!(output, "   {}", line).unwrap();
                }
                writeln!(output).unwrap();
            }
        }
        output
    }

    fn format_status(&self, status: &StatusInfo) -> String {
        let mut output = String::new();
        writeln!(output, "Status").unwrap();
        writeln!(output, "------").unwrap();
        writeln!(
            output,
            "Embedding:     {} ({}d)",
            status.embedding_model, status.embedding_dimension
        )
        .unwrap();
        writeln!(output, "  URL:         {}", status.embedding_url).unwrap();
        writeln!(output, "Generation:    {}", status.generation_model).unwrap();
        writeln!(output, "  URL:         {}", status.generation_url).unwrap();
        let key = if status.api_key_set { "[SET]" } else { "[MISSING]" };
        writeln!(output, "API Key:       {}", key).unwrap();
        writeln!(output).unwrap();

        let vector_status = if status.vector_store_connected {
            "[CONNECTED]"
        } else {
            "[DISCONNECTED]"
        };
        writeln!(
            output,
            "Vector Store:  {} ({})",
            status.vector_store_driver, vector_status
        )
        .unwrap();
        writeln!(output, "  URL:         {}", status.vector_store_url).unwrap();
        writeln!(output, "  Collection:  {}", status.collection).unwrap();
        if status.vector_store_connected {
            match status.collection_points {
                Some(points) => writeln!(output, "  Points:      {}", points).unwrap(),
                None => writeln!(output, "  Points:      (not created)").unwrap(),
            }
        }
        output
    }

    fn format_message(&self, message: &str) -> String {
        format!("{}\n", message)
    }

    fn format_error(&self, error: &str) -> String {
        format!("Error: {}\n", error)
    }
}

pub struct JsonFormatter {
    pub pretty: bool,
}

impl JsonFormatter {
    pub fn new(pretty: bool) -> Self {
        Self { pretty }
    }

    fn render<T: Serialize>(&self, value: &T) -> String {
        let rendered = if self.pretty {
            serde_json::to_string_pretty(value)
        } else {
            serde_json::to_string(value)
        };
        rendered.unwrap_or_else(|e| serde_json::json!({"error": e.to_string()}).to_string())
    }
}

impl Formatter for JsonFormatter {
    fn format_ingest_report(&self, report: &IngestReport) -> String {
        self.render(report)
    }

    fn format_answer(&self, answer: &Answer, show_context: bool) -> String {
        if show_context {
            return self.render(answer);
        }
        let sources: Vec<serde_json::Value> = answer
            .sources
            .iter()
            .map(|s| serde_json::json!({"id": s.id, "score": s.score, "source": s.source}))
            .collect();
        self.render(&serde_json::json!({
            "question": answer.question,
            "answer": answer.answer,
            "sources": sources,
            "duration_ms": answer.duration_ms,
        }))
    }

    fn format_status(&self, status: &StatusInfo) -> String {
        self.render(status)
    }

    fn format_message(&self, message: &str) -> String {
        serde_json::json!({"message": message}).to_string()
    }

    fn format_error(&self, error: &str) -> String {
        serde_json::json!({"error": error}).to_string()
    }
}

pub struct MarkdownFormatter;

impl Formatter for MarkdownFormatter {
    fn format_ingest_report(&self, report: &IngestReport) -> String {
        let mut output = String::new();
        writeln!(output, "## Ingestion Report\n").unwrap();
        writeln!(output, "**Source:** `{}`\n", report.source).unwrap();
        writeln!(output, "| Metric | Value |").unwrap();
        writeln!(output, "|--------|-------|").unwrap();
        writeln!(output, "| Chunks | {} |", report.attempted).unwrap();
        writeln!(output, "| Stored | {} |", report.stored).unwrap();
        writeln!(output, "| Failed | {} |", report.failed()).unwrap();
        writeln!(output, "| Duration | {}ms |", report.duration_ms).unwrap();

        if !report.failures.is_empty() {
            writeln!(output, "\n### Failures\n").unwrap();
            writeln!(output, "| Chunk | Stage | Kind | Reason |").unwrap();
            writeln!(output, "|-------|-------|------|--------|").unwrap();
            for failure in &report.failures {
                writeln!(
                    output,
                    "| {} | {} | {} | {} |",
                    failure.index, failure.stage, failure.kind, failure.reason
                )
                .unwrap();
            }
        }
        output
    }

    fn format_answer(&self, answer: &Answer, show_context: bool) -> String {
        let mut output = String::new();
        writeln!(output, "## Answer\n").unwrap();
        writeln!(output, "**Question:** {}\n", answer.question).unwrap();
        writeln!(output, "{}\n", answer.answer.trim_end()).unwrap();

        if show_context && !answer.sources.is_empty() {
            writeln!(output, "### Context\n").unwrap();
            for (i, source) in answer.sources.iter().enumerate() {
                let origin = source.source.as_deref().unwrap_or("-");
                writeln!(output, "#### {}. Score: {:.3} `{}`\n", i + 1, source.score, origin)
                    .unwrap();
                writeln!(output, "```").unwrap();
                writeln!(output, "{}", source.text).unwrap();
                writeln!(output, "```\n").unwrap();
            }
        }
        output
    }

    fn format_status(&self, status: &StatusInfo) -> String {
        let mut output = String::new();
        writeln!(output, "## Status\n").unwrap();
        writeln!(output, "### Models\n").unwrap();
        writeln!(
            output,
            "- **Embedding:** {} ({}d) at `{}`",
            status.embedding_model, status.embedding_dimension, status.embedding_url
        )
        .unwrap();
        writeln!(
            output,
            "- **Generation:** {} at `{}`",
            status.generation_model, status.generation_url
        )
        .unwrap();
        let key = if status.api_key_set { "✅" } else { "❌" };
        writeln!(output, "- **API key:** {}\n", key).unwrap();

        let vector_status = if status.vector_store_connected {
            "✅"
        } else {
            "❌"
        };
        writeln!(
            output,
            "### Vector Store ({}) {}\n",
            status.vector_store_driver, vector_status
        )
        .unwrap();
        writeln!(output, "- **URL:** `{}`", status.vector_store_url).unwrap();
        writeln!(output, "- **Collection:** {}", status.collection).unwrap();
        if let Some(points) = status.collection_points {
            writeln!(output, "- **Points:** {}", points).unwrap();
        }
        output
    }

    fn format_message(&self, message: &str) -> String {
        format!("> {}\n", message)
    }

    fn format_error(&self, error: &str) -> String {
        format!("> ⚠️ **Error:** {}\n", error)
    }
}

pub fn get_formatter(format: OutputFormat) -> Box<dyn Formatter> {
    match format {
        OutputFormat::Text => Box::new(TextFormatter),
        OutputFormat::Json => Box::new(JsonFormatter::new(true)),
        OutputFormat::Markdown => Box::new(MarkdownFormatter),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::models::{ChunkFailure, FailureStage, RetrievedChunk};

    fn report() -> IngestReport {
        IngestReport {
            document_id: "abc".to_string(),
            source: "/docs/cat.txt".to_string(),
            checksum: "0f".repeat(32),
            attempted: 3,
            stored: 2,
            failures: vec![ChunkFailure {
                index: 1,
                stage: FailureStage::Embed,
                kind: ErrorKind::Embedding,
                reason: "the text could not be embedded".to_string(),
            }],
            duration_ms: 12,
            ingested_at: chrono::Utc::now(),
        }
    }

    fn answer() -> Answer {
        Answer {
            question: "What did the cat do?".to_string(),
            answer: "It sat on a mat.".to_string(),
            sources: vec![RetrievedChunk {
                id: "1".to_string(),
                text: "A cat sat on a mat.".to_string(),
                score: 0.92,
                source: Some("/docs/cat.txt".to_string()),
            }],
            context: "A cat sat on a mat.".to_string(),
            duration_ms: 30,
        }
    }

    #[test]
    fn test_text_report_lists_failures() {
        let output = TextFormatter.format_ingest_report(&report());
        assert!(output.contains("With Failures"));
        assert!(output.contains("chunk 1 (embed, embedding): the text could not be embedded"));
    }

    #[test]
    fn test_text_answer_hides_context_by_default() {
        let output = TextFormatter.format_answer(&answer(), false);
        assert_eq!(output, "It sat on a mat.\n");

        let output = TextFormatter.format_answer(&answer(), true);
        assert!(output.contains("[Score: 0.920] /docs/cat.txt"));
    }

    #[test]
    fn test_json_report_is_parseable() {
        let output = JsonFormatter::new(false).format_ingest_report(&report());
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["stored"], 2);
        assert_eq!(value["failures"][0]["stage"], "embed");
        assert_eq!(value["failures"][0]["kind"], "embedding");
    }

    #[test]
    fn test_json_answer_omits_context_unless_requested() {
        let formatter = JsonFormatter::new(false);
        let value: serde_json::Value =
            serde_json::from_str(&formatter.format_answer(&answer(), false)).unwrap();
        assert!(value.get("context").is_none());
        assert_eq!(value["sources"][0]["id"], "1");

        let value: serde_json::Value =
            serde_json::from_str(&formatter.format_answer(&answer(), true)).unwrap();
        assert_eq!(value["context"], "A cat sat on a mat.");
    }

    #[test]
    fn test_describe_error_hides_backend_detail() {
        use crate::error::{EmbeddingError, VectorStoreError};

        let err = anyhow::Error::from(QueryError::from(EmbeddingError::ServerError(
            "status 401 Unauthorized: Incorrect API key provided: sk-SECRET123".to_string(),
        )));
        let message = describe_error(&err);
        assert_eq!(message, "the question could not be embedded (embedding)");

        let err = anyhow::Error::from(AppError::from(IngestError::Setup(
            VectorStoreError::ConnectionError("tcp 10.0.0.5:6334 refused".to_string()),
        )));
        let message = describe_error(&err);
        assert!(!message.contains("10.0.0.5"));
        assert!(message.ends_with("(store)"));

        let err = anyhow::anyhow!("config file already exists");
        assert_eq!(describe_error(&err), "config file already exists");
    }

    #[test]
    fn test_markdown_failures_table() {
        let output = MarkdownFormatter.format_ingest_report(&report());
        assert!(output.contains("| 1 | embed | embedding | the text could not be embedded |"));
    }
}
