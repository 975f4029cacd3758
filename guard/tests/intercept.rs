//! End-to-end middleware tests against stub upstream services.
//!
//! The classifier and aggregator stubs are real axum servers on ephemeral
//! ports; the protected application is driven in-process.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, Request, StatusCode},
    middleware::from_fn_with_state,
    routing::{get, post},
    Json, Router,
};
use tower::ServiceExt;

use mirage_guard::{Guard, GuardConfig};
use mirage_protocol::{Action, ClassifyRequest, Decision, Event};

type DecideFn = fn(&ClassifyRequest) -> Decision;

async fn classify_stub(
    State(decide): State<DecideFn>,
    Json(request): Json<ClassifyRequest>,
) -> Json<Decision> {
    Json(decide(&request))
}

/// Spawn a stub classification service returning `decide`'s verdicts.
async fn spawn_classifier(decide: DecideFn) -> String {
    let app = Router::new()
        .route("/classify", post(classify_stub))
        .with_state(decide);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

#[derive(Clone, Default)]
struct IngestCapture {
    received: Arc<Mutex<Vec<(Option<String>, Event)>>>,
}

async fn ingest_stub(
    State(capture): State<IngestCapture>,
    headers: HeaderMap,
    Json(event): Json<Event>,
) -> Json<serde_json::Value> {
    let auth = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.to_string());
    capture.received.lock().unwrap().push((auth, event));
    Json(serde_json::json!({"status": "received"}))
}

async fn spawn_aggregator(capture: IngestCapture) -> String {
    let app = Router::new()
        .route("/v1/events", post(ingest_stub))
        .with_state(capture);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

fn guard_for(classifier_url: &str) -> Guard {
    Guard::new(GuardConfig {
        classifier_url: classifier_url.to_string(),
        ..GuardConfig::default()
    })
}

fn protected_app(guard: Guard) -> Router {
    Router::new()
        .route("/", get(|| async { "real response" }))
        .route(
            "/echo",
            post(|body: String| async move { format!("echo:{}", body) }),
        )
        .layer(from_fn_with_state(guard, mirage_guard::intercept))
}

fn get_request(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_request(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_text(response: axum::response::Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn pass_verdict_runs_downstream_handler() {
    let url = spawn_classifier(|_| Decision {
        label: "benign".into(),
        ..Decision::default()
    })
    .await;
    let app = protected_app(guard_for(&url));

    let response = app.oneshot(get_request("/")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "real response");
}

#[tokio::test]
async fn classifier_down_fails_open() {
    // Bind then drop a listener so the port is known-dead.
    let dead = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let url = format!("http://{}", dead.local_addr().unwrap());
    drop(dead);

    let app = protected_app(guard_for(&url));

    let response = app
        .clone()
        .oneshot(post_request("/echo", "hello"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    // The downstream handler sees the body untouched.
    assert_eq!(body_text(response).await, "echo:hello");

    let response = app.oneshot(get_request("/")).await.unwrap();
    assert_eq!(body_text(response).await, "real response");
}

#[tokio::test]
async fn deceive_with_honeypot_redirects() {
    let url = spawn_classifier(|_| Decision {
        label: "sqli".into(),
        confidence: 0.97,
        action: Action::Deceive,
        honeypot_host: "10.0.0.5".into(),
        honeypot_port: 8080,
        ..Decision::default()
    })
    .await;
    let app = protected_app(guard_for(&url));

    let response = app
        .oneshot(post_request("/echo", "' OR 1=1 --"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(
        response.headers().get(header::LOCATION).unwrap(),
        "http://10.0.0.5:8080"
    );
}

#[tokio::test]
async fn deceive_renders_json_message_with_status_200() {
    let url = spawn_classifier(|_| Decision {
        label: "sqli".into(),
        action: Action::Deceive,
        message: r#"{"error":"not found"}"#.into(),
        ..Decision::default()
    })
    .await;
    let app = protected_app(guard_for(&url));

    let response = app
        .oneshot(post_request("/echo", "' OR 1=1 --"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "application/json"
    );
    assert_eq!(body_text(response).await, r#"{"error":"not found"}"#);
}

#[tokio::test]
async fn deceive_renders_html_message_as_html() {
    let url = spawn_classifier(|_| Decision {
        label: "xss".into(),
        action: Action::Deceive,
        message: "<html>Error 500</html>".into(),
        ..Decision::default()
    })
    .await;
    let app = protected_app(guard_for(&url));

    let response = app
        .oneshot(post_request("/echo", "<script>alert(1)</script>"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "text/html"
    );
    assert_eq!(body_text(response).await, "<html>Error 500</html>");
}

#[tokio::test]
async fn tarpit_delays_only_the_flagged_request() {
    let url = spawn_classifier(|request| {
        if request.body.contains("slow") {
            Decision {
                label: "bruteforce".into(),
                delay_ms: 150,
                ..Decision::default()
            }
        } else {
            Decision::default()
        }
    })
    .await;
    let app = protected_app(guard_for(&url));

    let slow = {
        let app = app.clone();
        async move {
            let start = Instant::now();
            let response = app.oneshot(post_request("/echo", "slow login")).await.unwrap();
            (start.elapsed(), response)
        }
    };
    let fast = async move {
        let start = Instant::now();
        let response = app.oneshot(post_request("/echo", "quick")).await.unwrap();
        (start.elapsed(), response)
    };

    let ((slow_elapsed, slow_response), (fast_elapsed, fast_response)) = tokio::join!(slow, fast);

    assert_eq!(slow_response.status(), StatusCode::OK);
    assert_eq!(fast_response.status(), StatusCode::OK);
    assert!(
        slow_elapsed >= Duration::from_millis(150),
        "tarpitted request returned after {:?}",
        slow_elapsed
    );
    assert!(
        fast_elapsed < Duration::from_millis(150),
        "clean request waited on the tarpit: {:?}",
        fast_elapsed
    );
}

#[tokio::test]
async fn query_string_is_inspected_for_get_requests() {
    let url = spawn_classifier(|request| {
        if request.body.contains("q=%27%20OR%201=1") {
            Decision {
                label: "sqli".into(),
                action: Action::Deceive,
                message: "<html>nothing here</html>".into(),
                ..Decision::default()
            }
        } else {
            Decision::default()
        }
    })
    .await;
    let app = protected_app(guard_for(&url));

    let response = app.oneshot(get_request("/?q=hello")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "real response");

    // The raw query string reaches the classifier even with an empty body.
    let response = protected_app(guard_for(&url))
        .oneshot(get_request("/?q=%27%20OR%201=1"))
        .await
        .unwrap();
    assert_eq!(body_text(response).await, "<html>nothing here</html>");
}

#[tokio::test]
async fn non_benign_verdicts_are_reported_to_the_aggregator() {
    let capture = IngestCapture::default();
    let aggregator_url = spawn_aggregator(capture.clone()).await;
    let classifier_url = spawn_classifier(|request| {
        if request.body.contains("UNION") {
            Decision {
                label: "sqli".into(),
                confidence: 0.92,
                ..Decision::default()
            }
        } else {
            Decision {
                label: "benign".into(),
                ..Decision::default()
            }
        }
    })
    .await;

    let guard = Guard::new(GuardConfig {
        classifier_url,
        aggregator_url: Some(aggregator_url),
        aggregator_token: Some("test-ingest-token".into()),
        ..GuardConfig::default()
    });
    let app = protected_app(guard);

    let response = app
        .clone()
        .oneshot(post_request("/echo", "benign body"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(post_request("/echo", "1 UNION SELECT password"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // The report is fire-and-forget; give the detached task a moment.
    let mut reported = Vec::new();
    for _ in 0..100 {
        reported = capture.received.lock().unwrap().clone();
        if !reported.is_empty() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    assert_eq!(reported.len(), 1, "only the attack should be reported");
    let (auth, event) = &reported[0];
    assert_eq!(auth.as_deref(), Some("Bearer test-ingest-token"));
    assert_eq!(event.label, "sqli");
    assert_eq!(event.path, "/echo");
    assert!(event
        .payload_excerpt
        .as_deref()
        .unwrap()
        .contains("UNION SELECT"));
}

#[tokio::test]
async fn oversized_body_is_rejected_before_classification() {
    let url = spawn_classifier(|_| Decision::default()).await;
    let guard = Guard::new(GuardConfig {
        classifier_url: url,
        max_body_bytes: 16,
        ..GuardConfig::default()
    });
    let app = protected_app(guard);

    let response = app
        .oneshot(post_request("/echo", &"x".repeat(64)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}
