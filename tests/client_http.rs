// vecto-ingest — tests/client_http.rs
// VectoClient and toolbelt calls against a mock Vecto HTTP server.
// Author: d65v <https://github.com/d65v>
//
// The client is blocking, so every call runs on tokio's blocking pool while
// wiremock serves from the async runtime.

use std::io::Write;

use serde_json::json;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

use vingest::client::{AnalogyStartEnd, AttributeUpdate, EmbeddingUpdate};
use vingest::toolbelt::ingest_texts;
use vingest::{
    partition_with_attributes, Attribute, Batch, IngestOptions, IngestOutcome, Item, Modality,
    Reset, TransportError, VectoClient, VectoConfig, VectoError,
};

// ── Helpers ───────────────────────────────────────────────────────────────────

const SPACE_ID: u64 = 7;

fn client_for(uri: &str) -> VectoClient {
    VectoClient::new(VectoConfig::new("t", SPACE_ID).with_base_url(uri)).expect("client builds")
}

async fn blocking<T, F>(f: F) -> T
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    tokio::task::spawn_blocking(f).await.expect("blocking task panicked")
}

async fn mount(server: &MockServer, route: &str, response: ResponseTemplate) {
    Mock::given(method("POST"))
        .and(path(format!("/api/v0/{}", route)))
        .respond_with(response)
        .mount(server)
        .await;
}

async fn received(server: &MockServer) -> Vec<Request> {
    server.received_requests().await.expect("request recording is on")
}

fn body_of(req: &Request) -> String {
    String::from_utf8_lossy(&req.body).into_owned()
}

/// Number of multipart parts named `name`.
fn count_parts(body: &str, name: &str) -> usize {
    body.matches(&format!("name=\"{}\"", name)).count()
}

/// Text value of the multipart field `name`, as it appears in the body.
fn field(name: &str, value: &str) -> String {
    format!("name=\"{}\"\r\n\r\n{}\r\n", name, value)
}

fn paths(requests: &[Request]) -> Vec<String> {
    requests.iter().map(|r| r.url.path().to_string()).collect()
}

// ── Errors ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_non_2xx_becomes_status_error() {
    let server = MockServer::start().await;
    mount(&server, "delete_all", ResponseTemplate::new(500).set_body_string("boom")).await;

    let uri = server.uri();
    let err = blocking(move || client_for(&uri).delete_vector_space_entries().unwrap_err()).await;

    match err {
        VectoError::Transport(TransportError::Status { status, body }) => {
            assert_eq!(status, 500);
            assert_eq!(body, "boom");
        }
        other => panic!("expected status error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_reset_posts_delete_all() {
    let server = MockServer::start().await;
    mount(&server, "delete_all", ResponseTemplate::new(503).set_body_string("down")).await;

    let uri = server.uri();
    let err = blocking(move || {
        let client = client_for(&uri);
        let mut reset = &client;
        reset.reset_all().unwrap_err()
    })
    .await;

    assert!(matches!(err, TransportError::Status { status: 503, .. }));
    let requests = received(&server).await;
    assert_eq!(paths(&requests), vec!["/api/v0/delete_all"]);
    assert!(body_of(&requests[0]).contains(&field("vector_space_id", "7")));
}

// ── Ingest ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_ingest_sends_one_part_per_entry() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v0/index"))
        .and(header("authorization", "Bearer t"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": "OK", "ids": [1, 2] })))
        .expect(1)
        .mount(&server)
        .await;

    let uri = server.uri();
    let result = blocking(move || {
        let items = vec![Item::text("hello"), Item::text("world")];
        let attrs = vec![Attribute::from("cat"), Attribute::from("dog")];
        let chunks = partition_with_attributes(&items, Some(&attrs), 64).unwrap();
        let batch = Batch::open(&chunks[0], Modality::Text).unwrap();
        client_for(&uri).ingest(batch)
    })
    .await
    .unwrap();

    assert_eq!(result.ids, vec![1, 2]);

    let requests = received(&server).await;
    assert_eq!(requests.len(), 1);
    let body = body_of(&requests[0]);
    assert!(body.contains(&field("vector_space_id", "7")));
    assert!(body.contains(&field("modality", "TEXT")));
    assert_eq!(count_parts(&body, "data"), 2);
    assert_eq!(count_parts(&body, "attributes"), 2);
    assert!(body.contains(&field("attributes", "\"cat\"")));
    assert!(body.contains("hello") && body.contains("world"));
    assert!(requests[0].headers.get("content-length").is_some());
    assert!(requests[0].headers.get("transfer-encoding").is_none());
}

#[tokio::test]
async fn test_ingest_image_is_sized() {
    let server = MockServer::start().await;
    mount(&server, "index", ResponseTemplate::new(200).set_body_json(json!({ "ids": [9] }))).await;

    let mut file = tempfile::Builder::new().suffix(".png").tempfile().unwrap();
    file.write_all(b"\x89PNG fake image bytes").unwrap();
    let image_path = file.path().to_path_buf();
    let file_name = image_path.file_name().unwrap().to_string_lossy().into_owned();

    let uri = server.uri();
    let result = blocking(move || {
        let items = vec![Item::image(&image_path)];
        let chunks = partition_with_attributes(&items, None, 64).unwrap();
        let batch = Batch::open(&chunks[0], Modality::Image).unwrap();
        client_for(&uri).ingest(batch)
    })
    .await
    .unwrap();

    assert_eq!(result.ids, vec![9]);

    let requests = received(&server).await;
    let body = body_of(&requests[0]);
    assert!(body.contains(&field("modality", "IMAGE")));
    assert!(body.contains(&format!("filename=\"{}\"", file_name)));
    assert!(body.contains("fake image bytes"));
    assert!(body.contains(&field("attributes", "null")));
    assert!(requests[0].headers.get("content-length").is_some());
    assert!(requests[0].headers.get("transfer-encoding").is_none());
}

// ── Queries and Updates ───────────────────────────────────────────────────────

#[tokio::test]
async fn test_lookup_decodes_results() {
    let server = MockServer::start().await;
    let results = json!({ "results": [
        { "id": 4, "similarity": 0.9, "attributes": "cat" },
        { "id": 5, "similarity": 0.5, "attributes": { "breed": "tabby" } }
    ]});
    mount(&server, "lookup", ResponseTemplate::new(200).set_body_json(results)).await;

    let uri = server.uri();
    let response = blocking(move || client_for(&uri).lookup(&Item::text("kitten"), 3, Some(&[4, 5][..])))
        .await
        .unwrap();

    assert_eq!(response.results.len(), 2);
    assert_eq!(response.results[0].id, 4);
    assert_eq!(response.results[1].attributes["breed"], "tabby");

    let body = body_of(&received(&server).await[0]);
    assert!(body.contains(&field("top_k", "3")));
    assert!(body.contains(&field("modality", "TEXT")));
    assert_eq!(count_parts(&body, "ids"), 2);
    assert_eq!(count_parts(&body, "query"), 1);
}

#[tokio::test]
async fn test_analogy_update_and_delete_routes() {
    let server = MockServer::start().await;
    mount(&server, "analogy", ResponseTemplate::new(200).set_body_json(json!({ "results": [] }))).await;
    for route in ["update/vectors", "update/attributes", "delete"] {
        mount(&server, route, ResponseTemplate::new(200).set_body_json(json!({ "status": "OK" }))).await;
    }

    let uri = server.uri();
    blocking(move || {
        let client = client_for(&uri);
        let pairs = vec![AnalogyStartEnd { start: Item::text("king"), end: Item::text("queen") }];
        let analogy = client.compute_analogy(&Item::text("man"), &pairs, 5).unwrap();
        assert!(analogy.results.is_empty());

        let updates = vec![EmbeddingUpdate { id: 1, data: Item::text("new text") }];
        client.update_vector_embeddings(&updates, Modality::Text).unwrap();

        let attrs = vec![
            AttributeUpdate { id: 1, attribute: Attribute::from("a") },
            AttributeUpdate { id: 2, attribute: Attribute::from("b") },
        ];
        client.update_vector_attribute(&attrs).unwrap();

        let deleted = client.delete_vector_embeddings(&[1, 2, 3]).unwrap();
        assert_eq!(deleted["status"], "OK");
    })
    .await;

    let requests = received(&server).await;
    assert_eq!(
        paths(&requests),
        vec![
            "/api/v0/analogy",
            "/api/v0/update/vectors",
            "/api/v0/update/attributes",
            "/api/v0/delete",
        ]
    );

    let analogy = body_of(&requests[0]);
    assert_eq!(count_parts(&analogy, "start"), 1);
    assert_eq!(count_parts(&analogy, "end"), 1);
    assert_eq!(count_parts(&analogy, "query"), 1);

    let vectors = body_of(&requests[1]);
    assert!(vectors.contains(&field("id", "1")));
    assert_eq!(count_parts(&vectors, "data"), 1);

    let attributes = body_of(&requests[2]);
    assert_eq!(count_parts(&attributes, "id"), 2);
    assert!(attributes.contains(&field("attributes", "\"b\"")));

    assert_eq!(count_parts(&body_of(&requests[3]), "id"), 3);
}

// ── Toolbelt ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_ingest_texts_resets_before_first_batch() {
    let server = MockServer::start().await;
    mount(&server, "delete_all", ResponseTemplate::new(200)).await;
    mount(&server, "index", ResponseTemplate::new(200).set_body_json(json!({ "ids": [10, 11] }))).await;

    let uri = server.uri();
    let report = blocking(move || {
        let opts = IngestOptions { batch_size: 2, ..Default::default() };
        ingest_texts(&client_for(&uri), &["a", "b", "c"], None, opts)
    })
    .await
    .unwrap();

    assert!(report.is_success());
    assert_eq!(report.len(), 2);
    assert_eq!(
        paths(&received(&server).await),
        vec!["/api/v0/delete_all", "/api/v0/index", "/api/v0/index"]
    );
}

#[tokio::test]
async fn test_ingest_texts_records_failed_batch_and_continues() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v0/index"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ids": [1] })))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    mount(&server, "index", ResponseTemplate::new(500).set_body_string("overloaded")).await;

    let uri = server.uri();
    let report = blocking(move || {
        let opts = IngestOptions { batch_size: 1, delete_existing: false, ..Default::default() };
        ingest_texts(&client_for(&uri), &["a", "b", "c"], None, opts)
    })
    .await
    .unwrap();

    assert_eq!(report.len(), 3);
    assert!(report.outcomes[0].is_success());
    for outcome in &report.outcomes[1..] {
        assert!(matches!(
            outcome,
            IngestOutcome::Failure { error: TransportError::Status { status: 500, .. }, .. }
        ));
    }
    assert_eq!(report.ingested_ids(), vec![1]);
    assert_eq!(received(&server).await.len(), 3);
}
