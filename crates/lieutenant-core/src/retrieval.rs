//! Retrieval augmentation.
//!
//! Queries every index attached to a model with the newest caller message, merges
//! the hits by plain concatenation (each index keeps its own distance order),
//! and prepends one instruction message carrying the retrieved context.
//!
//! ```text
//! query ──▶ query(index_1) ─┐
//!       ──▶ query(index_2) ─┼─▶ concat ─▶ render ─▶ messages.insert(0, ..)
//!       ──▶ query(index_n) ─┘
//! ```
//!
//! Augmentation only ever adds a message. With no hits the conversation is
//! left exactly as it was.

use crate::error::Result;
use crate::models::{ChatMessage, IndexDescriptor, Role, ScoredRecord};
use crate::store::ContentStore;

/// Heading line of the injected context message.
pub const CONTEXT_PREAMBLE: &str =
    "The following information was retrieved from the knowledge base and may be relevant to the conversation.";

/// A hit together with the index it came from.
#[derive(Debug, Clone)]
pub struct RetrievedRecord<'a> {
    pub index: &'a IndexDescriptor,
    pub hit: ScoredRecord,
}

/// Query each index in order and concatenate the results.
pub async fn retrieve<'a>(
    store: &dyn ContentStore,
    indexes: &'a [IndexDescriptor],
    query: &str,
    default_top_k: usize,
) -> Result<Vec<RetrievedRecord<'a>>> {
    let mut merged = Vec::new();
    for index in indexes {
        let top_k = index.top_k.unwrap_or(default_top_k);
        let hits = store.query(query, &index.id, top_k).await?;
        merged.extend(hits.into_iter().map(|hit| RetrievedRecord { index, hit }));
    }
    Ok(merged)
}

/// Render retrieved records as one context block.
///
/// Every record contributes a `# Data` section with its raw content and a
/// `# Metadata` section naming at least its source.
pub fn render_context(records: &[RetrievedRecord<'_>]) -> String {
    let mut out = String::from(CONTEXT_PREAMBLE);
    for retrieved in records {
        let record = &retrieved.hit.record;
        out.push_str("\n\n---\n\n# Data\n");
        out.push_str(record.content());
        out.push_str("\n\n# Metadata\n");
        out.push_str(&format!("- source: {}\n", record.source()));
        if retrieved.index.description.is_empty() {
            out.push_str(&format!("- index: {}\n", retrieved.index.id));
        } else {
            out.push_str(&format!(
                "- index: {} ({})\n",
                retrieved.index.id, retrieved.index.description
            ));
        }
        out.push_str(&format!("- distance: {:.4}", retrieved.hit.distance));
    }
    out
}

/// Prepend context retrieved for `query` to `messages`.
///
/// `query` is the caller's last message as sent, before any developer prompt
/// was merged in. Returns the number of records injected; zero means
/// `messages` is unchanged.
pub async fn augment(
    store: &dyn ContentStore,
    indexes: &[IndexDescriptor],
    query: &str,
    default_top_k: usize,
    system_role: Role,
    messages: &mut Vec<ChatMessage>,
) -> Result<usize> {
    if indexes.is_empty() {
        return Ok(0);
    }

    let merged = retrieve(store, indexes, query, default_top_k).await?;
    if merged.is_empty() {
        return Ok(0);
    }

    messages.insert(0, ChatMessage::new(system_role, render_context(&merged)));
    Ok(merged.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::models::IntelligenceRecord;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Returns canned hits per index and records every query.
    #[derive(Default)]
    struct CannedStore {
        hits: HashMap<String, Vec<ScoredRecord>>,
        queries: Mutex<Vec<(String, String, usize)>>,
    }

    impl CannedStore {
        fn with(mut self, index: &str, contents: &[(&str, &str)]) -> Self {
            let hits = contents
                .iter()
                .enumerate()
                .map(|(i, (source, content))| ScoredRecord {
                    record: IntelligenceRecord::restore(format!("{}-{}", index, i), index, *source, *content),
                    distance: i as f32 / 10.0,
                })
                .collect();
            self.hits.insert(index.to_string(), hits);
            self
        }
    }

    #[async_trait]
    impl ContentStore for CannedStore {
        async fn upsert(&self, _record: &IntelligenceRecord) -> Result<()> {
            Err(Error::storage("read-only"))
        }

        async fn query(&self, query: &str, index: &str, top_k: usize) -> Result<Vec<ScoredRecord>> {
            self.queries
                .lock()
                .unwrap()
                .push((query.to_string(), index.to_string(), top_k));
            let mut hits = self.hits.get(index).cloned().unwrap_or_default();
            hits.truncate(top_k);
            Ok(hits)
        }
    }

    fn index(id: &str, description: &str) -> IndexDescriptor {
        IndexDescriptor {
            id: id.to_string(),
            description: description.to_string(),
            top_k: None,
        }
    }

    #[tokio::test]
    async fn test_context_prepended_ahead_of_system() {
        let store = CannedStore::default().with("docs", &[("doc1", "The capital of France is Paris.")]);
        let mut messages = vec![
            ChatMessage::new(Role::Developer, "Be brief."),
            ChatMessage::new(Role::User, "What is the capital of France?"),
        ];

        let query = messages[1].content.clone();
        let injected = augment(
            &store,
            &[index("docs", "Geography notes")],
            &query,
            10,
            Role::Developer,
            &mut messages,
        )
        .await
        .unwrap();

        assert_eq!(injected, 1);
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[0].role, Role::Developer);
        assert!(messages[0].content.contains("# Data\nThe capital of France is Paris."));
        assert!(messages[0].content.contains("- source: doc1"));
        assert!(messages[0].content.contains("- index: docs (Geography notes)"));
        assert_eq!(messages[1].content, "Be brief.");

        let queries = store.queries.lock().unwrap();
        assert_eq!(
            queries.as_slice(),
            &[("What is the capital of France?".to_string(), "docs".to_string(), 10)]
        );
    }

    #[tokio::test]
    async fn test_merge_keeps_index_order() {
        let store = CannedStore::default()
            .with("a", &[("a0", "alpha zero"), ("a1", "alpha one")])
            .with("b", &[("b0", "beta zero")]);
        let indexes = [index("a", ""), index("b", "")];

        let merged = retrieve(&store, &indexes, "q", 10).await.unwrap();
        let sources: Vec<&str> = merged.iter().map(|r| r.hit.record.source()).collect();
        assert_eq!(sources, vec!["a0", "a1", "b0"]);
    }

    #[tokio::test]
    async fn test_per_index_top_k() {
        let store = CannedStore::default().with("a", &[("a0", "x"), ("a1", "y"), ("a2", "z")]);
        let mut limited = index("a", "");
        limited.top_k = Some(2);

        let indexes = [limited];
        let merged = retrieve(&store, &indexes, "q", 10).await.unwrap();
        assert_eq!(merged.len(), 2);
    }

    #[tokio::test]
    async fn test_no_hits_leaves_messages_unchanged() {
        let store = CannedStore::default();
        let original = vec![ChatMessage::new(Role::User, "hi")];
        let mut messages = original.clone();

        let injected = augment(&store, &[index("empty", "")], "hi", 10, Role::System, &mut messages)
            .await
            .unwrap();

        assert_eq!(injected, 0);
        assert_eq!(messages, original);
    }

    #[tokio::test]
    async fn test_no_indexes_never_queries() {
        let store = CannedStore::default();
        let mut messages = vec![ChatMessage::new(Role::User, "hi")];

        augment(&store, &[], "hi", 10, Role::System, &mut messages).await.unwrap();

        assert!(store.queries.lock().unwrap().is_empty());
        assert_eq!(messages.len(), 1);
    }
}
