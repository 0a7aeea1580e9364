//! Knowledge system type definitions.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// Canonical answer when the documents do not support an answer.
pub const NOT_FOUND_ANSWER: &str = "Não encontrei essa informação nos documentos disponíveis.";

/// Organizational unit a document belongs to (e.g. `RH`, `TI`).
///
/// Tags are stored upper-cased so config, directory names and filters agree.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct Department(String);

impl Department {
    pub fn new(tag: impl AsRef<str>) -> Self {
        Self(tag.as_ref().trim().to_uppercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for Department {
    fn from(tag: String) -> Self {
        Self::new(tag)
    }
}

impl From<&str> for Department {
    fn from(tag: &str) -> Self {
        Self::new(tag)
    }
}

impl From<Department> for String {
    fn from(department: Department) -> Self {
        department.0
    }
}

impl fmt::Display for Department {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Metadata carried from a source page to every passage cut from it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PassageMetadata {
    pub department: Department,
    pub document_type: String,
    pub version: String,
    /// File name only, no directory
    pub source_name: String,
    /// Zero-based page index
    pub page_number: u32,
}

impl PassageMetadata {
    /// Citation string for this metadata. Pages are shown 1-based.
    pub fn citation(&self) -> Citation {
        Citation(format!(
            "{} - {} - v{} - pág. {}",
            self.department,
            self.source_name,
            self.version,
            self.page_number + 1
        ))
    }
}

/// Raw text of one page of a loaded document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceDocument {
    pub text: String,
    pub metadata: PassageMetadata,
}

/// A bounded excerpt of a [`SourceDocument`]; the unit of retrieval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Passage {
    /// Content hash of source, page, position and text
    pub id: String,
    pub text: String,
    pub metadata: PassageMetadata,
}

impl Passage {
    /// Create a passage cut at char offset `start` of its page.
    pub fn new(text: impl Into<String>, metadata: PassageMetadata, start: usize) -> Self {
        let text = text.into();
        let id = passage_id(&metadata, start, &text);
        Self { id, text, metadata }
    }

    pub fn citation(&self) -> Citation {
        self.metadata.citation()
    }
}

fn passage_id(metadata: &PassageMetadata, start: usize, text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(metadata.department.as_str().as_bytes());
    hasher.update([0]);
    hasher.update(metadata.source_name.as_bytes());
    hasher.update([0]);
    hasher.update(metadata.page_number.to_le_bytes());
    hasher.update((start as u64).to_le_bytes());
    hasher.update(text.as_bytes());

    hasher
        .finalize()
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect()
}

/// A passage with its embedding, as persisted in the index.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexedEntry {
    pub passage: Passage,
    pub embedding: Vec<f32>,
}

/// A passage returned by a similarity query.
///
/// `distance` is non-negative; lower means closer.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredPassage {
    pub passage: Passage,
    pub distance: f32,
}

/// Human-readable source reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Citation(String);

impl Citation {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Citation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<Citation> for String {
    fn from(citation: Citation) -> Self {
        citation.0
    }
}

/// Final answer with its supporting citations.
///
/// Citations are deduplicated and kept in best-match-first order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerResult {
    pub answer: String,
    pub citations: Vec<Citation>,
}

impl AnswerResult {
    /// The canonical "no evidence" answer, with no citations.
    pub fn not_found() -> Self {
        Self {
            answer: NOT_FOUND_ANSWER.to_string(),
            citations: Vec::new(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.answer == NOT_FOUND_ANSWER
    }

    pub fn into_response(self) -> QueryResponse {
        QueryResponse {
            resposta: self.answer,
            fontes: self.citations.into_iter().map(String::from).collect(),
        }
    }
}

/// Query API request body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryRequest {
    pub pergunta: String,
}

/// Query API response body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryResponse {
    pub resposta: String,
    pub fontes: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vpn_metadata(page_number: u32) -> PassageMetadata {
        PassageMetadata {
            department: Department::new("TI"),
            document_type: "procedimento".to_string(),
            version: "1.0".to_string(),
            source_name: "procedimento_vpn.pdf".to_string(),
            page_number,
        }
    }

    #[test]
    fn test_citation_format() {
        assert_eq!(
            vpn_metadata(2).citation().as_str(),
            "TI - procedimento_vpn.pdf - v1.0 - pág. 3"
        );
        assert_eq!(
            vpn_metadata(0).citation().as_str(),
            "TI - procedimento_vpn.pdf - v1.0 - pág. 1"
        );
    }

    #[test]
    fn test_department_is_uppercased() {
        assert_eq!(Department::new(" rh ").as_str(), "RH");
        let parsed: Department = serde_json::from_str("\"ti\"").unwrap();
        assert_eq!(parsed, Department::new("TI"));
        assert_eq!(serde_json::to_string(&parsed).unwrap(), "\"TI\"");
    }

    #[test]
    fn test_passage_id_is_deterministic() {
        let a = Passage::new("Instale o cliente.", vpn_metadata(0), 0);
        let b = Passage::new("Instale o cliente.", vpn_metadata(0), 0);
        let c = Passage::new("Instale o cliente.", vpn_metadata(0), 420);

        assert_eq!(a.id, b.id);
        assert_ne!(a.id, c.id);
        assert_eq!(a.id.len(), 64);
    }

    #[test]
    fn test_not_found_response() {
        let result = AnswerResult::not_found();
        assert!(result.is_not_found());

        let response = result.into_response();
        assert_eq!(response.resposta, NOT_FOUND_ANSWER);
        assert!(response.fontes.is_empty());

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["resposta"], NOT_FOUND_ANSWER);
        assert_eq!(json["fontes"], serde_json::json!([]));
    }

    #[test]
    fn test_query_request_shape() {
        let request: QueryRequest =
            serde_json::from_str(r#"{"pergunta": "Como configuro a VPN?"}"#).unwrap();
        assert_eq!(request.pergunta, "Como configuro a VPN?");
    }
}
