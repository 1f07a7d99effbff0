//! Extraction-only prompt construction.

use super::retriever::ScoredChunk;

/// Verbatim answer the model is told to give when the context has nothing relevant.
pub const NOT_MENTIONED: &str = "Not mentioned in the document.";

const INSTRUCTIONS: &str = "\
You are a strict, extraction-only retrieval-augmented assistant.

Answer ONLY from the document text given under Context.
Do NOT infer, assume, generalize, or use world knowledge.

OUTPUT RULES
- Output ONLY the final extracted answer.
- If the question asks for a list, output only the list: bullet points, one item per line, no numbering, no bold text.
- Do not explain, justify, or summarize your answer.

EXTRACTION RULES
- Extract ONLY items explicitly mentioned in the document.
- Do not add items based on implication, common knowledge, or related experience.
- Never mix categories: programming languages, libraries, tools or platforms, and certifications are distinct.
- Do not guess names (for example cloud providers or databases) that are not written in the document.

NEGATIVE RULE
If the document does not explicitly contain the requested information, output EXACTLY:
";

/// Builds the generation prompt from retrieved chunks and the user question.
///
/// Each chunk is rendered as `Source: ...` / `Content: ...`, in retrieval order.
pub fn build_prompt(chunks: &[ScoredChunk], question: &str) -> String {
    let context = chunks
        .iter()
        .map(|chunk| {
            format!(
                "Source: {}\nContent: {}",
                chunk.record.source, chunk.record.content
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n");

    format!(
        "{INSTRUCTIONS}{NOT_MENTIONED}\n\nContext:\n{context}\n\nQuestion:\n{question}\n\nFinal Answer:\n",
        question = question.trim()
    )
}
