//! Mock backend shared by integration tests.

use axum::{
    Json, Router,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use guideqa_types::{
    Evidence, IndexStatus, IngestRequest, IngestResponse, QueryRequest, QueryResponse,
};
use std::net::SocketAddr;

async fn query(Json(request): Json<QueryRequest>) -> Response {
    if request.question.contains("crash") {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            r#"{"detail":"vector store unavailable"}"#,
        )
            .into_response();
    }
    if request.question.contains("garbled") {
        return (StatusCode::OK, "<html>not json</html>").into_response();
    }
    if request.question.contains("pizza") {
        return Json(QueryResponse {
            answer: "The guideline does not cover this question.".into(),
            categories: vec![],
            evidence: vec![],
        })
        .into_response();
    }

    let evidence = (0..request.top_k.min(1))
        .map(|_| Evidence {
            source: Some("who_diabetes_guideline.pdf".into()),
            page: 12,
            text: "An HbA1c target below 7% is recommended for most adults.".into(),
            score: 0.91,
        })
        .collect();

    Json(QueryResponse {
        answer: "For most adults, aim for an HbA1c below 7%.".into(),
        categories: vec!["glycemic-control".into()],
        evidence,
    })
    .into_response()
}

async fn ingest(Json(request): Json<IngestRequest>) -> Response {
    if !request.pdf_path.ends_with(".pdf") {
        return (StatusCode::BAD_REQUEST, "pdf_path must point to a PDF").into_response();
    }
    Json(IngestResponse {
        pages: 120,
        chunks: 342,
    })
    .into_response()
}

async fn status() -> Json<IndexStatus> {
    Json(IndexStatus {
        mode: "local".into(),
        qdrant_path: Some(".qdrant".into()),
        collection: "who_diabetes_guideline".into(),
        points_count: Some(342),
        embedding_model: "text-embedding-3-small".into(),
        embedding_dim: 1536,
    })
}

/// Start the mock backend on an ephemeral port and return its base URL.
pub async fn spawn_mock_backend() -> String {
    let app = Router::new()
        .route("/api/query", post(query))
        .route("/api/ingest", post(ingest))
        .route("/api/status", get(status));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr: SocketAddr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{}", addr)
}
