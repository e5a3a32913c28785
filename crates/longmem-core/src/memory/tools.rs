//! Agent-facing memory tools.
//!
//! An agent calls these with raw JSON argument strings and gets back text it
//! can place in its context: a confirmation, a markdown list of memories, or
//! a fixed sentinel when nothing matched.

use std::sync::Arc;

use longmem_types::config::SearchConfig;
use longmem_types::error::MemoryError;
use longmem_types::memory::MemoryData;
use serde::Deserialize;

use super::embedder::Embedder;
use super::service::MemoryService;
use crate::storage::object_store::ObjectStore;

pub const STORE_MEMORY: &str = "store_memory";
pub const SEARCH_MEMORY: &str = "search_memory";
pub const DELETE_MEMORY: &str = "delete_memory";

pub const STORED_MESSAGE: &str = "Memory successfully stored.";
pub const NO_MEMORIES_MESSAGE: &str = "No memories found.";
pub const DELETED_MESSAGE: &str = "All memories have been successfully deleted.";

#[derive(Debug, Deserialize)]
struct StoreArgs {
    content: String,
    importance: f32,
    category: String,
    #[serde(default)]
    topics: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct SearchArgs {
    query: String,
    top_k: Option<usize>,
}

/// Tool surface over a shared [`MemoryService`].
pub struct MemoryTools<E: Embedder, S: ObjectStore> {
    service: Arc<MemoryService<E, S>>,
    search: SearchConfig,
}

impl<E: Embedder, S: ObjectStore> MemoryTools<E, S> {
    pub fn new(service: Arc<MemoryService<E, S>>, search: SearchConfig) -> Self {
        Self { service, search }
    }

    /// Names of every tool this surface answers to.
    pub fn names() -> [&'static str; 3] {
        [STORE_MEMORY, SEARCH_MEMORY, DELETE_MEMORY]
    }

    /// Dispatch a tool call by name.
    pub async fn execute(
        &self,
        name: &str,
        user_key: &str,
        arguments: &str,
    ) -> Result<String, MemoryError> {
        match name {
            STORE_MEMORY => self.store_memory(user_key, arguments).await,
            SEARCH_MEMORY => self.search_memory(user_key, arguments).await,
            DELETE_MEMORY => self.delete_memory(user_key).await,
            other => Err(MemoryError::InvalidArguments(format!(
                "unknown tool '{other}'"
            ))),
        }
    }

    pub async fn store_memory(&self, user_key: &str, arguments: &str) -> Result<String, MemoryError> {
        let args: StoreArgs = parse_args(arguments)?;
        self.service
            .add(user_key, &args.content, args.importance, &args.category, args.topics)
            .await?;
        Ok(STORED_MESSAGE.to_string())
    }

    pub async fn search_memory(&self, user_key: &str, arguments: &str) -> Result<String, MemoryError> {
        let args: SearchArgs = parse_args(arguments)?;
        let top_k = args
            .top_k
            .unwrap_or(self.search.default_top_k)
            .clamp(1, self.search.max_top_k.max(1));

        let results = self.service.search(user_key, &args.query, top_k).await?;
        Ok(format_search_results(&results))
    }

    pub async fn delete_memory(&self, user_key: &str) -> Result<String, MemoryError> {
        self.service.delete_all(user_key).await?;
        Ok(DELETED_MESSAGE.to_string())
    }
}

fn parse_args<'a, T: Deserialize<'a>>(arguments: &'a str) -> Result<T, MemoryError> {
    serde_json::from_str(arguments).map_err(|e| MemoryError::InvalidArguments(e.to_string()))
}

/// Render search hits as the markdown block agents receive.
pub fn format_search_results(results: &[MemoryData]) -> String {
    if results.is_empty() {
        return NO_MEMORIES_MESSAGE.to_string();
    }

    let mut out = String::from("Found the following relevant memories:\n\n");
    for (idx, memory) in results.iter().enumerate() {
        out.push_str(&format!("### Memory {}\n", idx + 1));
        out.push_str(&format!("- **Content**: {}\n", memory.content));
        out.push_str(&format!("- **Category**: {}\n", memory.category));
        if !memory.topics.is_empty() {
            out.push_str(&format!("- **Topics**: {}\n", memory.topics.join(", ")));
        }
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{MockEmbedder, MockObjectStore};
    use longmem_types::config::LongMemConfig;

    fn tools() -> MemoryTools<MockEmbedder, MockObjectStore> {
        let config = LongMemConfig::default();
        let service = MemoryService::new(MockEmbedder::new(32), MockObjectStore::new(), &config);
        MemoryTools::new(Arc::new(service), config.search)
    }

    fn data(content: &str, topics: &[&str]) -> MemoryData {
        MemoryData {
            id: 1,
            content: content.to_string(),
            importance: 0.5,
            category: "preferences".to_string(),
            topics: topics.iter().map(|t| t.to_string()).collect(),
        }
    }

    #[test]
    fn test_format_empty_is_sentinel() {
        assert_eq!(format_search_results(&[]), "No memories found.");
    }

    #[test]
    fn test_format_lists_memories_in_order() {
        let text = format_search_results(&[data("likes tea", &["drinks", "food"]), data("hates rain", &[])]);
        assert_eq!(
            text,
            "Found the following relevant memories:\n\n\
             ### Memory 1\n- **Content**: likes tea\n- **Category**: preferences\n- **Topics**: drinks, food\n\n\
             ### Memory 2\n- **Content**: hates rain\n- **Category**: preferences\n\n"
        );
    }

    #[tokio::test]
    async fn test_store_then_search() {
        let tools = tools();
        let stored = tools
            .execute(
                STORE_MEMORY,
                "alice",
                r#"{"content": "I live in Paris", "importance": 0.9, "category": "personal_info", "topics": ["location"]}"#,
            )
            .await
            .unwrap();
        assert_eq!(stored, STORED_MESSAGE);

        let found = tools
            .execute(SEARCH_MEMORY, "alice", r#"{"query": "where do I live"}"#)
            .await
            .unwrap();
        assert!(found.starts_with("Found the following relevant memories:"));
        assert!(found.contains("- **Content**: I live in Paris"));
        assert!(found.contains("- **Topics**: location"));
    }

    #[tokio::test]
    async fn test_store_without_topics() {
        let tools = tools();
        let result = tools
            .store_memory("alice", r#"{"content": "likes tea", "importance": 0.4, "category": "preferences"}"#)
            .await
            .unwrap();
        assert_eq!(result, STORED_MESSAGE);
    }

    #[tokio::test]
    async fn test_search_clamps_top_k() {
        let tools = tools();
        for i in 0..3 {
            tools
                .store_memory(
                    "alice",
                    &format!(r#"{{"content": "fact {i}", "importance": 0.5, "category": "context"}}"#),
                )
                .await
                .unwrap();
        }

        let one = tools
            .search_memory("alice", r#"{"query": "fact", "top_k": 0}"#)
            .await
            .unwrap();
        assert!(one.contains("### Memory 1"));
        assert!(!one.contains("### Memory 2"));

        let all = tools
            .search_memory("alice", r#"{"query": "fact", "top_k": 500}"#)
            .await
            .unwrap();
        assert!(all.contains("### Memory 3"));
    }

    #[tokio::test]
    async fn test_search_empty_returns_sentinel() {
        let result = tools()
            .search_memory("alice", r#"{"query": "anything"}"#)
            .await
            .unwrap();
        assert_eq!(result, NO_MEMORIES_MESSAGE);
    }

    #[tokio::test]
    async fn test_delete_memory() {
        let tools = tools();
        tools
            .store_memory("alice", r#"{"content": "likes tea", "importance": 0.4, "category": "preferences"}"#)
            .await
            .unwrap();
        assert_eq!(tools.execute(DELETE_MEMORY, "alice", "{}").await.unwrap(), DELETED_MESSAGE);
        assert_eq!(
            tools.search_memory("alice", r#"{"query": "tea"}"#).await.unwrap(),
            NO_MEMORIES_MESSAGE
        );
    }

    #[tokio::test]
    async fn test_malformed_arguments_are_rejected() {
        let tools = tools();
        let err = tools.store_memory("alice", "not json").await.unwrap_err();
        assert!(matches!(err, MemoryError::InvalidArguments(_)));

        let err = tools
            .search_memory("alice", r#"{"top_k": 3}"#)
            .await
            .unwrap_err();
        assert!(matches!(err, MemoryError::InvalidArguments(_)));
    }

    #[tokio::test]
    async fn test_unknown_tool_is_rejected() {
        let err = tools().execute("forget_everything", "alice", "{}").await.unwrap_err();
        assert!(matches!(err, MemoryError::InvalidArguments(_)));
    }

    #[test]
    fn test_tool_names() {
        assert_eq!(MemoryTools::<MockEmbedder, MockObjectStore>::names().len(), 3);
    }
}
