use crate::types::ScoredChunk;

#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct Message {
    pub role: String,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: "system".to_string(), content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: "user".to_string(), content: content.into() }
    }
}

pub fn build_prompt_with_context(
    system_prompt: &str,
    question: &str,
    hits: &[ScoredChunk],
) -> (Vec<Message>, String) {
    let context = format_context_from_hits(hits);

    let user_content = format!(
        "Use the context below to answer the question.\n\nContext:\n{}\n\nQuestion: {}",
        context, question
    );

    let messages = vec![Message::system(system_prompt), Message::user(user_content)];

    (messages, context)
}

pub fn format_context_from_hits(hits: &[ScoredChunk]) -> String {
    let mut context_lines = Vec::new();
    for (i, hit) in hits.iter().enumerate() {
        let page = hit
            .chunk
            .metadata
            .get(crate::types::META_PAGE)
            .map(|p| format!(", page {}", p))
            .unwrap_or_default();
        context_lines.push(format!(
            "[{}] {}{}\n{}",
            i + 1,
            hit.chunk.source_name(),
            page,
            hit.chunk.text
        ));
    }

    if context_lines.is_empty() {
        "(no context found)".to_string()
    } else {
        context_lines.join("\n\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Chunk, Metadata};
    use serde_json::json;

    fn hit(source: &str, page: u64, text: &str) -> ScoredChunk {
        let mut metadata = Metadata::new();
        metadata.insert("source".into(), json!(source));
        metadata.insert("page".into(), json!(page));
        ScoredChunk {
            chunk: Chunk { id: "x".into(), text: text.into(), metadata },
            score: 0.9,
        }
    }

    #[test]
    fn context_lists_hits_in_rank_order() {
        let hits = vec![hit("a.pdf", 1, "alpha"), hit("b.pdf", 4, "beta")];
        let (messages, context) = build_prompt_with_context("sys", "what?", &hits);
        assert_eq!(context, "[1] a.pdf, page 1\nalpha\n\n[2] b.pdf, page 4\nbeta");
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0], Message::system("sys"));
        assert!(messages[1].content.contains(&context));
        assert!(messages[1].content.ends_with("Question: what?"));
    }

    #[test]
    fn empty_retrieval_is_stated_in_the_prompt() {
        let (messages, context) = build_prompt_with_context("sys", "anything?", &[]);
        assert_eq!(context, "(no context found)");
        assert!(messages[1].content.contains("(no context found)"));
    }
}
