use crate::{SearchCandidate, SourceRecord};
use std::collections::HashSet;

pub const CONTEXT_PLACEHOLDER: &str = "{context}";

pub const SYSTEM_PROMPT_TEMPLATE: &str = "Use the given context to directly answer the question. \
If you don't know the answer, say you don't know. \
Use three sentences maximum and keep the answer concise. \
Context: {context}\n\
Don't reply with 'in this part of the text..' or 'based on this passage...', \
just give reply trying to be exhaustive about answering the question. \
Also avoid short replies, always enrich the reply.";

/// Fills the template with every retrieved chunk, separated by blank lines.
pub fn render_system_prompt(hits: &[SearchCandidate]) -> String {
    let context = hits
        .iter()
        .map(|hit| hit.chunk.text.as_str())
        .collect::<Vec<_>>()
        .join("\n\n");
    SYSTEM_PROMPT_TEMPLATE.replace(CONTEXT_PLACEHOLDER, &context)
}

/// One record per distinct source in rank order, with content cut to
/// `preview_chars` characters.
pub fn collect_sources(hits: &[SearchCandidate], preview_chars: usize) -> Vec<SourceRecord> {
    let mut seen = HashSet::new();
    hits.iter()
        .filter(|hit| seen.insert(hit.chunk.source.as_str()))
        .map(|hit| SourceRecord {
            source: hit.chunk.source.clone(),
            page_content: hit.chunk.text.chars().take(preview_chars).collect(),
        })
        .collect()
}
