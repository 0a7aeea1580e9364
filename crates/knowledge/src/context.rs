//! Context assembly from retrieved passages.

use crate::types::{Citation, Passage};

/// Separator placed between passages in the context block.
pub const PASSAGE_SEPARATOR: &str = "\n\n";

/// Context text and citations derived from selected passages.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssembledContext {
    pub text: String,
    /// Deduplicated, first occurrence first
    pub citations: Vec<Citation>,
}

impl AssembledContext {
    pub fn is_empty(&self) -> bool {
        self.text.is_empty() && self.citations.is_empty()
    }
}

/// Join passage texts with a blank line, keeping input order, and collect
/// their citations without duplicates.
pub fn assemble(passages: &[Passage]) -> AssembledContext {
    let text = passages
        .iter()
        .map(|p| p.text.as_str())
        .collect::<Vec<_>>()
        .join(PASSAGE_SEPARATOR);

    let mut citations: Vec<Citation> = Vec::with_capacity(passages.len());
    for citation in passages.iter().map(Passage::citation) {
        if !citations.contains(&citation) {
            citations.push(citation);
        }
    }

    AssembledContext { text, citations }
}
