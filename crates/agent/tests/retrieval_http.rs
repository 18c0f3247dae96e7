use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use nl2sql_agent::llm::{EmbeddingClient, LlmError};
use nl2sql_agent::{KeywordCollectionRetriever, Retriever, VectorIndexRetriever};
use nl2sql_core::config::{AppConfig, KeywordSearchConfig, SearchApproach, SearchConfig};
use serde_json::{json, Value};

#[derive(Clone, Default)]
struct Captured {
    body: Arc<Mutex<Option<Value>>>,
    authorization: Arc<Mutex<Option<String>>>,
    query: Arc<Mutex<Option<String>>>,
}

struct FixedEmbedder(Result<Vec<f32>, ()>);

#[async_trait]
impl EmbeddingClient for FixedEmbedder {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>, LlmError> {
        self.0.clone().map_err(|()| LlmError::EmptyResponse("embedding data"))
    }
}

async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("listener should bind");
    let addr = listener.local_addr().expect("listener should have an address");
    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });
    format!("http://{addr}")
}

async fn search_ok(
    State(captured): State<Captured>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Json<Value> {
    *captured.body.lock().expect("lock") = Some(body);
    *captured.authorization.lock().expect("lock") = headers
        .get("authorization")
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);

    Json(json!({
        "value": [
            {"filepath": "queries/q1.sql", "content": "  SELECT region, SUM(amount) FROM sales GROUP BY region\n", "title": "q1"},
            {"filepath": "queries/q2.sql", "content": "SELECT COUNT(*) FROM sales", "title": "q2"}
        ]
    }))
}

async fn search_broken() -> (StatusCode, &'static str) {
    (StatusCode::INTERNAL_SERVER_ERROR, "index offline")
}

async fn search_malformed() -> Json<Value> {
    Json(json!({"value": [{"title": "missing filepath and content"}]}))
}

fn search_config(endpoint: &str, approach: SearchApproach, use_semantic: bool) -> SearchConfig {
    let mut config = AppConfig::default().search;
    config.endpoint = Some(endpoint.to_string());
    config.index = "ragindex".to_string();
    config.api_key = Some("search-key".to_string().into());
    config.top_k = 2;
    config.approach = approach;
    config.use_semantic = use_semantic;
    config
}

fn keyword_config(base_url: &str, collection_id: Option<&str>, top_k: u32) -> KeywordSearchConfig {
    let mut config = AppConfig::default().keyword_search;
    config.base_url = base_url.to_string();
    config.collection_id = collection_id.map(str::to_string);
    config.top_k = top_k;
    config
}

#[tokio::test]
async fn hybrid_search_posts_text_and_vector_and_renders_documents_in_order() {
    let captured = Captured::default();
    let router = Router::new()
        .route("/indexes/{index}/docs/search", post(search_ok))
        .with_state(captured.clone());
    let endpoint = serve(router).await;

    let retriever = VectorIndexRetriever::from_config(
        &search_config(&endpoint, SearchApproach::Hybrid, true),
        Arc::new(FixedEmbedder(Ok(vec![0.5, 0.25]))),
    )
    .expect("retriever should build");

    let sources = retriever.retrieve("revenue by region").await;

    assert_eq!(
        sources,
        "queries/q1.sql: SELECT region, SUM(amount) FROM sales GROUP BY region\n queries/q2.sql: SELECT COUNT(*) FROM sales\n"
    );
    let body = captured.body.lock().expect("lock").clone().expect("request body captured");
    assert_eq!(body["select"], "title, content, url, filepath, chunk_id");
    assert_eq!(body["top"], 2);
    assert_eq!(body["search"], "revenue by region");
    assert_eq!(body["vectorQueries"][0]["vector"], json!([0.5, 0.25]));
    assert_eq!(body["vectorQueries"][0]["k"], 2);
    assert_eq!(body["queryType"], "semantic");
    assert_eq!(
        captured.authorization.lock().expect("lock").as_deref(),
        Some("Bearer search-key")
    );
}

#[tokio::test]
async fn term_search_does_not_need_an_embedding() {
    let captured = Captured::default();
    let router = Router::new()
        .route("/indexes/{index}/docs/search", post(search_ok))
        .with_state(captured.clone());
    let endpoint = serve(router).await;

    let retriever = VectorIndexRetriever::from_config(
        &search_config(&endpoint, SearchApproach::Term, false),
        Arc::new(FixedEmbedder(Err(()))),
    )
    .expect("retriever should build");

    let sources = retriever.retrieve("order count").await;

    assert!(sources.starts_with("queries/q1.sql: "));
    let body = captured.body.lock().expect("lock").clone().expect("request body captured");
    assert!(body.get("vectorQueries").is_none());
    assert!(body.get("queryType").is_none());
}

#[tokio::test]
async fn search_failures_yield_empty_sources() {
    let broken = serve(Router::new().route("/indexes/{index}/docs/search", post(search_broken))).await;
    let malformed =
        serve(Router::new().route("/indexes/{index}/docs/search", post(search_malformed))).await;
    let working = serve(
        Router::new()
            .route("/indexes/{index}/docs/search", post(search_ok))
            .with_state(Captured::default()),
    )
    .await;

    let embedder: Arc<dyn EmbeddingClient> = Arc::new(FixedEmbedder(Ok(vec![1.0])));
    for endpoint in [&broken, &malformed] {
        let retriever = VectorIndexRetriever::from_config(
            &search_config(endpoint, SearchApproach::Hybrid, false),
            embedder.clone(),
        )
        .expect("retriever should build");
        assert_eq!(retriever.retrieve("anything").await, "", "endpoint {endpoint}");
    }

    let failing_embedder = VectorIndexRetriever::from_config(
        &search_config(&working, SearchApproach::Vector, false),
        Arc::new(FixedEmbedder(Err(()))),
    )
    .expect("retriever should build");
    assert_eq!(failing_embedder.retrieve("anything").await, "");

    let mut unconfigured = AppConfig::default().search;
    unconfigured.endpoint = None;
    unconfigured.service = None;
    let retriever =
        VectorIndexRetriever::from_config(&unconfigured, embedder).expect("retriever should build");
    assert_eq!(retriever.retrieve("anything").await, "");
}

async fn collection(
    State(captured): State<Captured>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<Value> {
    *captured.query.lock().expect("lock") = params.get("query").cloned();

    Json(json!({
        "response": {
            "docs": [
                {"title": "Refund policy", "highlighting": "  Refunds within 30 days. "},
                {"title": "Shipping", "highlighting": "Ships in 2 days."},
                {"title": "Warranty", "highlighting": "One year."}
            ]
        }
    }))
}

#[tokio::test]
async fn keyword_search_takes_top_documents_from_the_collection() {
    let captured = Captured::default();
    let router = Router::new()
        .route("/api/v3/{collection}/collection", get(collection))
        .with_state(captured.clone());
    let base_url = serve(router).await;

    let retriever =
        KeywordCollectionRetriever::from_config(&keyword_config(&base_url, Some("faq"), 2))
            .expect("retriever should build");

    let sources = retriever.retrieve("refund window").await;

    assert_eq!(sources, "Refund policy: Refunds within 30 days.\n Shipping: Ships in 2 days.\n");
    assert_eq!(captured.query.lock().expect("lock").as_deref(), Some("refund window"));
}

#[tokio::test]
async fn keyword_search_without_collection_returns_nothing() {
    let retriever =
        KeywordCollectionRetriever::from_config(&keyword_config("http://127.0.0.1:9", None, 3))
            .expect("retriever should build");

    assert!(retriever.collection_url().is_none());
    assert_eq!(retriever.retrieve("refund window").await, "");
}
