//! LLM summary bridge used by the analytics stage's natural-language
//! summaries and by `ask_codebase`.

use crate::error::AiError;

/// A symbol (or small cluster of symbols) worth summarizing, stripped
/// down to what a prompt needs — no `codemesh-core` dependency on the
/// full `Symbol`/`SymbolEdge` model so this crate stays a leaf.
#[derive(Debug, Clone)]
pub struct SummaryContext {
    pub qualified_name: String,
    pub kind: String,
    pub language: String,
    pub file_path: String,
    pub signature: Option<String>,
    pub doc: Option<String>,
    pub incoming: Vec<String>,
    pub outgoing: Vec<String>,
}

/// A piece of retrieved context handed to `answer_question`: a symbol
/// plus the edges touching it, rendered as plain text by the caller.
#[derive(Debug, Clone)]
pub struct CodebaseFact {
    pub description: String,
}

#[async_trait::async_trait]
pub trait SummaryBridge: Send + Sync {
    /// Produce a 1-2 sentence natural-language summary of a symbol,
    /// used by the analytics stage and surfaced through
    /// `get_symbol_details`.
    async fn summarize_symbol(&self, context: &SummaryContext) -> Result<String, AiError>;

    /// Answer a free-form question grounded in retrieved facts, used by
    /// the `ask_codebase` MCP tool.
    async fn answer_question(
        &self,
        question: &str,
        facts: &[CodebaseFact],
    ) -> Result<String, AiError>;

    fn name(&self) -> &str;
}

/// A templated, non-LLM summary used when no `SummaryBridge` is
/// configured. Per the "missing embedder → stage skipped, not failure"
/// pattern, the analytics stage falls back to this instead of erroring.
pub struct TemplateSummary;

#[async_trait::async_trait]
impl SummaryBridge for TemplateSummary {
    async fn summarize_symbol(&self, context: &SummaryContext) -> Result<String, AiError> {
        let mut sentence = format!(
            "{} `{}` defined in {}.",
            context.kind, context.qualified_name, context.file_path
        );
        if !context.outgoing.is_empty() {
            sentence.push_str(&format!(
                " Depends on {} other symbol(s).",
                context.outgoing.len()
            ));
        }
        if !context.incoming.is_empty() {
            sentence.push_str(&format!(
                " Referenced by {} other symbol(s).",
                context.incoming.len()
            ));
        }
        Ok(sentence)
    }

    async fn answer_question(
        &self,
        _question: &str,
        facts: &[CodebaseFact],
    ) -> Result<String, AiError> {
        if facts.is_empty() {
            return Ok(
                "No LLM is configured and no matching facts were found in the index."
                    .to_string(),
            );
        }
        let joined = facts
            .iter()
            .map(|f| format!("- {}", f.description))
            .collect::<Vec<_>>()
            .join("\n");
        Ok(format!(
            "No LLM is configured; here is the raw evidence found in the index:\n{joined}"
        ))
    }

    fn name(&self) -> &str {
        "template"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn template_summary_mentions_dependents_and_dependencies() {
        let bridge = TemplateSummary;
        let context = SummaryContext {
            qualified_name: "Orders.Repository.GetById".to_string(),
            kind: "method".to_string(),
            language: "csharp".to_string(),
            file_path: "src/Orders/Repository.cs".to_string(),
            signature: None,
            doc: None,
            incoming: vec!["a".to_string()],
            outgoing: vec!["b".to_string(), "c".to_string()],
        };
        let summary = bridge.summarize_symbol(&context).await.unwrap();
        assert!(summary.contains("GetById"));
        assert!(summary.contains("2 other symbol"));
        assert!(summary.contains("1 other symbol"));
    }

    #[tokio::test]
    async fn template_answer_reports_when_no_facts() {
        let bridge = TemplateSummary;
        let answer = bridge.answer_question("what does this do?", &[]).await.unwrap();
        assert!(answer.contains("No LLM is configured"));
    }
}
