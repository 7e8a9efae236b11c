//! Core data models used throughout Lieutenant.
//!
//! These types represent the records, vectors, chat messages, and model
//! configuration that flow through the ingestion and chat pipelines.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{Error, Result};

/// SHA-256 hex digest of a record body. This is the record identity.
pub fn content_hash(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    format!("{:x}", hasher.finalize())
}

// ============ Records ============

/// Provenance of a record whose body has not been produced yet.
///
/// Adapters build a draft from the source descriptor, fetch the raw data,
/// and then finalize it with [`RecordDraft::with_content`]. The identity is
/// derived exactly once, at that point.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordDraft {
    pub index: String,
    pub source: String,
    pub description: Option<String>,
}

impl RecordDraft {
    pub fn new(index: impl Into<String>, source: impl Into<String>) -> Result<Self> {
        let index = index.into();
        let source = source.into();
        if index.trim().is_empty() {
            return Err(Error::validation("index must not be empty"));
        }
        if source.trim().is_empty() {
            return Err(Error::validation("source must not be empty"));
        }
        Ok(Self {
            index,
            source,
            description: None,
        })
    }

    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = description.filter(|d| !d.trim().is_empty());
        self
    }

    /// Same draft with a different provenance string (e.g. one file of an
    /// archive).
    pub fn with_source(&self, source: impl Into<String>) -> Self {
        Self {
            index: self.index.clone(),
            source: source.into(),
            description: self.description.clone(),
        }
    }

    /// Finalize the draft: the content is fixed and the id derived from it.
    pub fn with_content(self, content: impl Into<String>) -> Result<IntelligenceRecord> {
        let content = content.into();
        if content.is_empty() {
            return Err(Error::validation(format!(
                "content for '{}' must not be empty",
                self.source
            )));
        }
        Ok(IntelligenceRecord {
            id: content_hash(&content),
            index: self.index,
            source: self.source,
            content,
            description: self.description,
        })
    }
}

/// One unit of ingested knowledge.
///
/// Fields are read-only; a record is only ever produced by finalizing a
/// [`RecordDraft`] or by reading a stored row back with
/// [`IntelligenceRecord::restore`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IntelligenceRecord {
    id: String,
    index: String,
    source: String,
    content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
}

impl IntelligenceRecord {
    /// Rebuild a record from a persisted row. The stored id is kept as-is.
    pub fn restore(
        id: impl Into<String>,
        index: impl Into<String>,
        source: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            index: index.into(),
            source: source.into(),
            content: content.into(),
            description: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn index(&self) -> &str {
        &self.index
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Attach an embedding, producing the persisted form.
    pub fn into_vector(self, embedding: Vec<f32>) -> EmbeddingVector {
        EmbeddingVector {
            id: self.id,
            index: self.index,
            source: self.source,
            content: self.content,
            embedding,
        }
    }
}

/// Wire shape of a record as accepted by the upsert endpoints.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub index: String,
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl RecordPayload {
    /// Parse a raw JSON payload, naming the payload on failure.
    pub fn from_json(value: serde_json::Value) -> Result<Self> {
        serde_json::from_value(value.clone()).map_err(|e| {
            Error::validation(format!("The data is not valid: {} ({})", value, e))
        })
    }

    pub fn draft(&self) -> Result<RecordDraft> {
        Ok(RecordDraft::new(&self.index, &self.source)?.with_description(self.description.clone()))
    }

    /// Build a record from a payload that already carries its content.
    ///
    /// A caller-supplied id must match the content hash.
    pub fn into_record(self) -> Result<IntelligenceRecord> {
        let draft = self.draft()?;
        let content = self
            .content
            .ok_or_else(|| Error::validation(format!("content is required for '{}'", self.source)))?;
        let record = draft.with_content(content)?;
        if let Some(id) = self.id.as_deref() {
            if id != record.id() {
                return Err(Error::validation(format!(
                    "id '{}' does not match the content hash '{}'",
                    id,
                    record.id()
                )));
            }
        }
        Ok(record)
    }
}

impl From<&IntelligenceRecord> for RecordPayload {
    fn from(record: &IntelligenceRecord) -> Self {
        Self {
            id: Some(record.id.clone()),
            index: record.index.clone(),
            source: record.source.clone(),
            content: Some(record.content.clone()),
            description: record.description.clone(),
        }
    }
}

/// Persisted form of a record: the record plus its embedding.
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddingVector {
    pub id: String,
    pub index: String,
    pub source: String,
    pub content: String,
    pub embedding: Vec<f32>,
}

/// A query hit: the stored record and its distance to the query vector.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredRecord {
    #[serde(flatten)]
    pub record: IntelligenceRecord,
    /// Cosine distance (`1 - similarity`); smaller is closer.
    pub distance: f32,
}

// ============ Chat ============

/// Chat message role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    Developer,
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::Developer => "developer",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }

    /// `system` and `developer` carry instructions rather than conversation.
    pub fn is_instruction(&self) -> bool {
        matches!(self, Role::System | Role::Developer)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

// ============ Model configuration ============

/// Wire-format family of a chat provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Compatibility {
    #[serde(alias = "open_ai")]
    OpenAi,
    Anthropic,
    Perplexity,
}

impl Compatibility {
    /// The role this family expects for instruction messages.
    pub fn system_role(&self) -> Role {
        match self {
            Compatibility::OpenAi => Role::Developer,
            Compatibility::Anthropic | Compatibility::Perplexity => Role::System,
        }
    }
}

/// A retrieval index attached to a model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexDescriptor {
    pub id: String,
    /// What the index contains, in plain language.
    #[serde(default)]
    pub description: String,
    /// Per-index result cap; falls back to the retrieval default.
    #[serde(default)]
    pub top_k: Option<usize>,
}

/// Configuration of one public chat model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Public model name listed by `/models`. Unique.
    pub name: String,
    /// Provider model identifier.
    #[serde(alias = "id")]
    pub parent_model_id: String,
    pub compatibility: Compatibility,
    #[serde(default)]
    pub endpoint: Option<String>,
    /// Environment variable holding the provider API key.
    #[serde(default)]
    pub api_key_env: Option<String>,
    #[serde(default)]
    pub temperature: Option<f32>,
    #[serde(default)]
    pub max_tokens: Option<u32>,
    #[serde(default)]
    pub developer_prompt: String,
    /// Overrides the family's instruction role.
    #[serde(default)]
    pub system_role: Option<Role>,
    #[serde(default)]
    pub indexes: Vec<IndexDescriptor>,
}

impl ModelConfig {
    pub fn system_role(&self) -> Role {
        self.system_role
            .unwrap_or_else(|| self.compatibility.system_role())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_content_same_id() {
        let a = RecordDraft::new("T", "doc1")
            .unwrap()
            .with_content("The capital of France is Paris.")
            .unwrap();
        let b = RecordDraft::new("T", "doc2")
            .unwrap()
            .with_content("The capital of France is Paris.")
            .unwrap();
        assert_eq!(a.id(), b.id());
        assert_eq!(a.id().len(), 64);
    }

    #[test]
    fn test_different_content_different_id() {
        let a = RecordDraft::new("T", "doc").unwrap().with_content("a").unwrap();
        let b = RecordDraft::new("T", "doc").unwrap().with_content("b").unwrap();
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_known_digest() {
        assert_eq!(
            content_hash("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_empty_content_rejected() {
        let err = RecordDraft::new("T", "doc").unwrap().with_content("").unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn test_empty_index_rejected() {
        assert!(RecordDraft::new(" ", "doc").is_err());
        assert!(RecordDraft::new("T", "").is_err());
    }

    #[test]
    fn test_payload_id_must_match_hash() {
        let payload = RecordPayload {
            id: Some("not-a-hash".into()),
            index: "T".into(),
            source: "doc".into(),
            content: Some("hello".into()),
            description: None,
        };
        assert!(matches!(payload.into_record(), Err(Error::Validation(_))));

        let payload = RecordPayload {
            id: Some(content_hash("hello")),
            index: "T".into(),
            source: "doc".into(),
            content: Some("hello".into()),
            description: None,
        };
        assert_eq!(payload.into_record().unwrap().content(), "hello");
    }

    #[test]
    fn test_payload_from_json_names_payload() {
        let err = RecordPayload::from_json(serde_json::json!({"index": 3})).unwrap_err();
        match err {
            Error::Validation(msg) => assert!(msg.contains("\"index\":3")),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_role_serde() {
        let msg: ChatMessage =
            serde_json::from_str(r#"{"role":"developer","content":"x"}"#).unwrap();
        assert_eq!(msg.role, Role::Developer);
        assert!(serde_json::from_str::<ChatMessage>(r#"{"role":"tool","content":"x"}"#).is_err());
    }

    #[test]
    fn test_system_role_override() {
        let mut cfg: ModelConfig = serde_json::from_value(serde_json::json!({
            "name": "GPT-4o",
            "id": "gpt-4o",
            "compatibility": "openai"
        }))
        .unwrap();
        assert_eq!(cfg.system_role(), Role::Developer);
        cfg.system_role = Some(Role::System);
        assert_eq!(cfg.system_role(), Role::System);
        assert!(cfg.indexes.is_empty());
    }
}
