//! Generated content shapes.
//!
//! Some providers answer with one string, others with a list of typed blocks
//! (text, tool calls, inline images, reasoning traces). Only `text` blocks
//! carry answer text.

use serde::{Deserialize, Serialize};

/// Block type that carries plain answer text.
pub const TEXT_BLOCK: &str = "text";

/// One typed block of structured output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentBlock {
    /// Block type tag (e.g. "text", "function_call", "inline_data")
    #[serde(rename = "type")]
    pub kind: String,

    /// Text payload, present for textual blocks
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl ContentBlock {
    /// Create a block of arbitrary type.
    pub fn new(kind: impl Into<String>, text: Option<String>) -> Self {
        Self {
            kind: kind.into(),
            text,
        }
    }

    /// Create a plain text block.
    pub fn text(text: impl Into<String>) -> Self {
        Self::new(TEXT_BLOCK, Some(text.into()))
    }

    /// Whether this block is plain text.
    pub fn is_text(&self) -> bool {
        self.kind == TEXT_BLOCK
    }
}

/// Raw provider output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LlmContent {
    /// A single string
    Text(String),
    /// A sequence of typed blocks
    Blocks(Vec<ContentBlock>),
}

impl LlmContent {
    /// Collapse the content to a single trimmed string.
    ///
    /// Text blocks are concatenated in order; every other block type is
    /// discarded. A text block without a payload contributes nothing.
    pub fn normalize(&self) -> String {
        match self {
            LlmContent::Text(text) => text.trim().to_string(),
            LlmContent::Blocks(blocks) => blocks
                .iter()
                .filter(|block| block.is_text())
                .filter_map(|block| block.text.as_deref())
                .collect::<String>()
                .trim()
                .to_string(),
        }
    }
}

impl From<String> for LlmContent {
    fn from(text: String) -> Self {
        LlmContent::Text(text)
    }
}

impl From<&str> for LlmContent {
    fn from(text: &str) -> Self {
        LlmContent::Text(text.to_string())
    }
}

impl From<Vec<ContentBlock>> for LlmContent {
    fn from(blocks: Vec<ContentBlock>) -> Self {
        LlmContent::Blocks(blocks)
    }
}
