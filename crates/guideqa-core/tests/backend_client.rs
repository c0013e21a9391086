//! Backend client and query flow against a mock HTTP backend.

mod common;

use guideqa_core::{
    Backend, BackendClient, BackendError, EvalCase, EvalRunner, MemoryStore, QueryFlow,
    QueryFlowConfig, SqliteStore, draft_from_success, render_failure,
};
use guideqa_types::{QueryOutcome, QueryRequest, Thumbs};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

async fn client() -> BackendClient {
    let base = common::spawn_mock_backend().await;
    BackendClient::new(base, Duration::from_secs(5)).unwrap()
}

#[tokio::test]
async fn test_query_roundtrip() {
    let client = client().await;
    let response = client
        .query(&QueryRequest {
            question: "What is the recommended HbA1c target?".into(),
            top_k: 5,
            debug_return_evidence: false,
        })
        .await
        .unwrap();

    assert_eq!(response.categories, vec!["glycemic-control".to_string()]);
    assert_eq!(response.evidence.len(), 1);
    assert_eq!(response.evidence[0].page, 12);
    assert!(!response.is_out_of_scope());
}

#[tokio::test]
async fn test_query_reports_success_status() {
    let client = client().await;
    let (status, response) = client
        .query_with_status(&QueryRequest {
            question: "Best pizza topping?".into(),
            top_k: 3,
            debug_return_evidence: true,
        })
        .await
        .unwrap();

    assert_eq!(status, 200);
    assert!(response.is_out_of_scope());
}

#[tokio::test]
async fn test_query_error_keeps_raw_body() {
    let client = client().await;
    let err = client
        .query(&QueryRequest {
            question: "crash please".into(),
            top_k: 5,
            debug_return_evidence: false,
        })
        .await
        .unwrap_err();

    match &err {
        BackendError::Status { status, body } => {
            assert_eq!(*status, 500);
            assert_eq!(body, r#"{"detail":"vector store unavailable"}"#);
        }
        other => panic!("expected status error, got {:?}", other),
    }
    assert!(render_failure(&err.user_message()).contains("\n  \"detail\""));
}

#[tokio::test]
async fn test_undecodable_body_is_decode_error() {
    let client = client().await;
    let err = client
        .query(&QueryRequest {
            question: "garbled".into(),
            top_k: 5,
            debug_return_evidence: false,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, BackendError::Decode { .. }));
    assert_eq!(err.http_status(), Some(200));
}

#[tokio::test]
async fn test_ingest_and_status() {
    let client = client().await;
    let ingested = client
        .ingest(&guideqa_types::IngestRequest {
            pdf_path: "data/who_guideline.pdf".into(),
        })
        .await
        .unwrap();
    assert_eq!((ingested.pages, ingested.chunks), (120, 342));

    let rejected = client
        .ingest(&guideqa_types::IngestRequest {
            pdf_path: "notes.txt".into(),
        })
        .await
        .unwrap_err();
    assert_eq!(rejected.http_status(), Some(400));
    assert_eq!(rejected.user_message(), "pdf_path must point to a PDF");

    let status = client.index_status().await.unwrap();
    assert_eq!(status.collection, "who_diabetes_guideline");
    assert_eq!(status.embedding_dim, 1536);
}

#[tokio::test]
async fn test_connection_refused_is_transport_error() {
    // Bind and drop to get a port with nothing listening.
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = BackendClient::new(format!("http://{}", addr), Duration::from_secs(2)).unwrap();
    let err = client.index_status().await.unwrap_err();
    assert!(matches!(err, BackendError::Transport(_)));
}

#[tokio::test]
async fn test_flow_survives_reopen_of_both_areas() {
    let temp_dir = TempDir::new().unwrap();
    let durable_path = temp_dir.path().join("store.db");
    let session_path = temp_dir.path().join("session.db");
    let backend: Arc<dyn Backend> = Arc::new(client().await);

    // Submission step.
    let history_id = {
        let flow = QueryFlow::new(
            backend.clone(),
            Arc::new(SqliteStore::open(&durable_path).unwrap()),
            Arc::new(SqliteStore::open(&session_path).unwrap()),
            QueryFlowConfig::default(),
        );
        match flow.submit("What is the recommended HbA1c target?", None).await {
            QueryOutcome::Success(s) => s.history_id,
            other => panic!("expected success, got {:?}", other),
        }
    };

    // Render step, with freshly opened stores.
    let flow = QueryFlow::new(
        backend,
        Arc::new(SqliteStore::open(&durable_path).unwrap()),
        Arc::new(SqliteStore::open(&session_path).unwrap()),
        QueryFlowConfig::default(),
    );
    let Some(QueryOutcome::Success(success)) = flow.take_result() else {
        panic!("expected a pending success");
    };
    assert_eq!(success.history_id, history_id);
    assert!(flow.take_result().is_none());

    let (_, patched) = flow.submit_feedback(draft_from_success(&success, Thumbs::Up));
    assert_eq!(patched.patched_id(), Some(history_id));

    let view = flow.history_view();
    assert_eq!(view.len(), 1);
    assert_eq!(view[0].evidence_count, Some(1));
    assert_eq!(view[0].feedback.as_ref().unwrap().thumbs, Thumbs::Up);
}

#[tokio::test]
async fn test_out_of_scope_flagged_through_flow() {
    let flow = QueryFlow::new(
        Arc::new(client().await),
        Arc::new(MemoryStore::new()),
        Arc::new(MemoryStore::new()),
        QueryFlowConfig::default(),
    );

    let outcome = flow.submit("Best pizza topping?", None).await;
    match outcome {
        QueryOutcome::Success(s) => assert!(s.out_of_scope),
        other => panic!("expected success, got {:?}", other),
    }
    assert!(flow.history().load()[0].out_of_scope);
}

#[tokio::test]
async fn test_eval_run_writes_lines_and_summary() {
    let backend: Arc<dyn Backend> = Arc::new(client().await);
    let runner = EvalRunner::new(backend, 5).with_pause(Duration::ZERO);
    let cases = vec![
        EvalCase {
            id: Some("row001".into()),
            question: "What is the recommended HbA1c target?".into(),
            expected_categories: vec!["glycemic-control".into()],
        },
        EvalCase {
            id: Some("row002".into()),
            question: "Best pizza topping?".into(),
            expected_categories: vec![],
        },
        EvalCase {
            id: Some("row003".into()),
            question: "crash".into(),
            expected_categories: vec!["Referral criteria".into()],
        },
    ];

    let mut out = Vec::new();
    let summary = runner.run(&cases, &mut out).await.unwrap();

    assert_eq!(summary.total, 3);
    assert_eq!(summary.ok, 2);
    assert_eq!(summary.avg_category_jaccard, 1.0);
    assert_eq!(summary.evidence_nonempty_rate, 0.5);

    let lines: Vec<serde_json::Value> = String::from_utf8(out)
        .unwrap()
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[2]["ok"], false);
    assert_eq!(lines[2]["http_status"], 500);
    assert_eq!(lines[0]["metrics"]["evidence_nonempty"], true);
    assert_eq!(lines[0]["http_status"], 200);
}
