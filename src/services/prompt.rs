//! Grounded prompt assembly.

use crate::models::RetrievedChunk;

/// Separator placed between retrieved chunks in the context block.
pub const CONTEXT_SEPARATOR: &str = "\n\n";

/// Join retrieved chunk texts, nearest first, into one context block.
pub fn build_context(chunks: &[RetrievedChunk]) -> String {
    chunks
        .iter()
        .map(|c| c.text.as_str())
        .collect::<Vec<_>>()
        .join(CONTEXT_SEPARATOR)
}

/// Prompt that restricts the model to the supplied context.
///
/// The fallback instruction is always present, including when the context
/// block is empty, so the model reports missing information instead of
/// inventing an answer.
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    fallback_answer: String,
}

impl PromptTemplate {
    pub fn new(fallback_answer: impl Into<String>) -> Self {
        Self {
            fallback_answer: fallback_answer.into(),
        }
    }

    pub fn fallback_answer(&self) -> &str {
        &self.fallback_answer
    }

    pub fn render(&self, context: &str, question: &str) -> String {
        format!(
            "You are a document question-answering assistant. Base your answer strictly on the \
             reference context below and do not make up any information.\n\
             If the context does not contain the answer, reply exactly: \"{fallback}\"\n\
             Keep the answer concise, accurate, and clearly structured.\n\
             \n\
             [Reference context]:\n\
             {context}\n\
             \n\
             [Question]: {question}\n",
            fallback = self.fallback_answer,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(text: &str, score: f32) -> RetrievedChunk {
        RetrievedChunk {
            id: text.to_string(),
            text: text.to_string(),
            score,
            source: None,
        }
    }

    #[test]
    fn test_context_joined_with_blank_line() {
        let context = build_context(&[chunk("first", 0.9), chunk("second", 0.5)]);
        assert_eq!(context, "first\n\nsecond");
    }

    #[test]
    fn test_empty_context() {
        assert_eq!(build_context(&[]), "");
    }

    #[test]
    fn test_prompt_contains_context_question_and_fallback() {
        let template = PromptTemplate::new("Not in the documents.");
        let prompt = template.render("A cat sat on a mat.", "What did the cat do?");

        assert!(prompt.contains("A cat sat on a mat."));
        assert!(prompt.contains("[Question]: What did the cat do?"));
        assert!(prompt.contains("reply exactly: \"Not in the documents.\""));
        assert!(prompt.contains("strictly"));
    }

    #[test]
    fn test_prompt_with_empty_context_keeps_fallback() {
        let template = PromptTemplate::new("Not in the documents.");
        let prompt = template.render("", "Anything?");
        assert!(prompt.contains("Not in the documents."));
        assert!(prompt.contains("[Reference context]:\n\n"));
    }
}
