use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use nl2sql_core::config::{KeywordSearchConfig, SearchApproach, SearchConfig};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::{json, Value};
use thiserror::Error;
use tracing::{error, info};

use crate::llm::{EmbeddingClient, LlmError};

pub const SELECTED_FIELDS: &str = "title, content, url, filepath, chunk_id";
pub const VECTOR_FIELD: &str = "contentVector";

#[derive(Debug, Error)]
pub enum RetrievalError {
    #[error("{0} is not configured")]
    NotConfigured(&'static str),
    #[error("embedding failed: {0}")]
    Embedding(#[from] LlmError),
    #[error("search request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("search endpoint returned {status}: {body}")]
    Status { status: u16, body: String },
}

/// Finds grounding text for a user question.
///
/// Retrieval never fails from the caller's point of view: any error is
/// logged and reported as an empty string.
#[async_trait]
pub trait Retriever: Send + Sync {
    async fn retrieve(&self, input: &str) -> String;
}

#[derive(Clone, Debug, PartialEq)]
pub struct SearchSettings {
    pub top_k: u32,
    pub approach: SearchApproach,
    pub use_semantic: bool,
    pub semantic_config: String,
}

impl From<&SearchConfig> for SearchSettings {
    fn from(config: &SearchConfig) -> Self {
        Self {
            top_k: config.top_k,
            approach: config.approach,
            use_semantic: config.use_semantic,
            semantic_config: config.semantic_config.clone(),
        }
    }
}

impl SearchSettings {
    pub fn needs_embedding(&self) -> bool {
        matches!(self.approach, SearchApproach::Vector | SearchApproach::Hybrid)
    }
}

/// Builds the document search request for one query.
///
/// `embedding` is only read for the vector and hybrid approaches.
pub fn build_search_body(query: &str, embedding: Option<&[f32]>, settings: &SearchSettings) -> Value {
    let mut body = json!({
        "select": SELECTED_FIELDS,
        "top": settings.top_k,
    });

    if matches!(settings.approach, SearchApproach::Term | SearchApproach::Hybrid) {
        body["search"] = json!(query);
    }

    if settings.needs_embedding() {
        if let Some(vector) = embedding {
            body["vectorQueries"] = json!([{
                "kind": "vector",
                "vector": vector,
                "fields": VECTOR_FIELD,
                "k": settings.top_k,
            }]);
        }
    }

    if settings.use_semantic && settings.approach != SearchApproach::Vector {
        body["queryType"] = json!("semantic");
        body["semanticConfiguration"] = json!(settings.semantic_config);
    }

    body
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    value: Vec<SearchDocument>,
}

#[derive(Debug, Deserialize)]
struct SearchDocument {
    filepath: String,
    content: String,
}

fn render_documents(documents: &[SearchDocument]) -> String {
    documents
        .iter()
        .map(|document| format!("{}: {}\n", document.filepath, document.content.trim()))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Vector, term or hybrid search over the document index.
pub struct VectorIndexRetriever {
    client: Client,
    search_url: Option<String>,
    api_key: Option<SecretString>,
    settings: SearchSettings,
    embedder: Arc<dyn EmbeddingClient>,
}

impl VectorIndexRetriever {
    pub fn from_config(
        config: &SearchConfig,
        embedder: Arc<dyn EmbeddingClient>,
    ) -> Result<Self, RetrievalError> {
        let client = Client::builder().timeout(Duration::from_secs(config.timeout_secs)).build()?;

        Ok(Self {
            client,
            search_url: config.search_url(),
            api_key: config.api_key.clone(),
            settings: SearchSettings::from(config),
            embedder,
        })
    }

    async fn search(&self, query: &str) -> Result<String, RetrievalError> {
        let url = self.search_url.as_deref().ok_or(RetrievalError::NotConfigured("search.endpoint"))?;

        let embedding = if self.settings.needs_embedding() {
            let started = Instant::now();
            let embedding = self.embedder.embed(query).await?;
            info!(
                event_name = "retrieval.embedding.completed",
                dimensions = embedding.len(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "query embedded"
            );
            Some(embedding)
        } else {
            None
        };

        let body = build_search_body(query, embedding.as_deref(), &self.settings);
        let mut request = self.client.post(url).json(&body);
        if let Some(api_key) = &self.api_key {
            request = request.bearer_auth(api_key.expose_secret());
        }

        let started = Instant::now();
        let response = request.send().await?;
        let status = response.status();
        if status.is_client_error() || status.is_server_error() {
            let body = response.text().await.unwrap_or_default();
            return Err(RetrievalError::Status { status: status.as_u16(), body });
        }

        let payload: SearchResponse = response.json().await?;
        info!(
            event_name = "retrieval.search.completed",
            documents = payload.value.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "index search finished"
        );

        Ok(render_documents(&payload.value))
    }
}

#[async_trait]
impl Retriever for VectorIndexRetriever {
    async fn retrieve(&self, input: &str) -> String {
        match self.search(input).await {
            Ok(sources) => sources,
            Err(err) => {
                error!(event_name = "retrieval.search.failed", error = %err, "index search failed");
                String::new()
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct CollectionResponse {
    response: CollectionDocs,
}

#[derive(Debug, Deserialize)]
struct CollectionDocs {
    #[serde(default)]
    docs: Vec<CollectionDocument>,
}

#[derive(Debug, Deserialize)]
struct CollectionDocument {
    title: String,
    highlighting: String,
}

/// Keyword search against a hosted document collection.
pub struct KeywordCollectionRetriever {
    client: Client,
    base_url: String,
    collection_id: Option<String>,
    top_k: usize,
}

impl KeywordCollectionRetriever {
    pub fn from_config(config: &KeywordSearchConfig) -> Result<Self, RetrievalError> {
        let client = Client::builder().timeout(Duration::from_secs(config.timeout_secs)).build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            collection_id: config.collection_id.clone(),
            top_k: config.top_k as usize,
        })
    }

    pub fn collection_url(&self) -> Option<String> {
        self.collection_id
            .as_deref()
            .map(|id| format!("{}/api/v3/{id}/collection", self.base_url))
    }

    async fn search(&self, query: &str) -> Result<String, RetrievalError> {
        let url = self
            .collection_url()
            .ok_or(RetrievalError::NotConfigured("keyword_search.collection_id"))?;

        let response = self.client.get(url).query(&[("query", query)]).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RetrievalError::Status { status: status.as_u16(), body });
        }

        let payload: CollectionResponse = response.json().await?;
        let sources = payload
            .response
            .docs
            .iter()
            .take(self.top_k)
            .map(|doc| format!("{}: {}\n", doc.title, doc.highlighting.trim()))
            .collect::<Vec<_>>()
            .join(" ");

        info!(
            event_name = "retrieval.keyword.completed",
            documents = payload.response.docs.len().min(self.top_k),
            "keyword search finished"
        );
        Ok(sources)
    }
}

#[async_trait]
impl Retriever for KeywordCollectionRetriever {
    async fn retrieve(&self, input: &str) -> String {
        match self.search(input).await {
            Ok(sources) => sources,
            Err(err) => {
                error!(event_name = "retrieval.keyword.failed", error = %err, "keyword search failed");
                String::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use nl2sql_core::config::SearchApproach;
    use serde_json::json;

    use super::{build_search_body, render_documents, SearchDocument, SearchSettings};

    fn settings(approach: SearchApproach, use_semantic: bool) -> SearchSettings {
        SearchSettings {
            top_k: 3,
            approach,
            use_semantic,
            semantic_config: "my-semantic-config".to_string(),
        }
    }

    #[test]
    fn term_search_sends_text_only() {
        let body = build_search_body("monthly sales", None, &settings(SearchApproach::Term, false));

        assert_eq!(
            body,
            json!({
                "select": "title, content, url, filepath, chunk_id",
                "top": 3,
                "search": "monthly sales",
            })
        );
    }

    #[test]
    fn hybrid_search_sends_text_vector_and_semantic_ranking() {
        let body = build_search_body(
            "monthly sales",
            Some(&[0.5, 0.25]),
            &settings(SearchApproach::Hybrid, true),
        );

        assert_eq!(body["search"], "monthly sales");
        assert_eq!(
            body["vectorQueries"],
            json!([{"kind": "vector", "vector": [0.5, 0.25], "fields": "contentVector", "k": 3}])
        );
        assert_eq!(body["queryType"], "semantic");
        assert_eq!(body["semanticConfiguration"], "my-semantic-config");
    }

    #[test]
    fn vector_search_never_requests_semantic_ranking() {
        let body =
            build_search_body("monthly sales", Some(&[1.0]), &settings(SearchApproach::Vector, true));

        assert!(body.get("search").is_none());
        assert!(body.get("vectorQueries").is_some());
        assert!(body.get("queryType").is_none());
        assert!(body.get("semanticConfiguration").is_none());
    }

    #[test]
    fn documents_render_as_path_prefixed_trimmed_content() {
        let documents = vec![
            SearchDocument { filepath: "a.sql".to_string(), content: "  SELECT 1 \n".to_string() },
            SearchDocument { filepath: "b.sql".to_string(), content: "SELECT 2".to_string() },
        ];

        assert_eq!(render_documents(&documents), "a.sql: SELECT 1\n b.sql: SELECT 2\n");
        assert_eq!(render_documents(&[]), "");
    }
}
