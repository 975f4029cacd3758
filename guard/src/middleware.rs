//! Interception middleware
//!
//! Runs once per inbound request, before the protected application's own
//! handler. The middleware never mutates the downstream application; it only
//! decides whether the downstream handler runs at all.

use std::net::SocketAddr;
use std::time::Duration;

use axum::{
    body::Body,
    extract::{ConnectInfo, Request, State},
    http::{header, Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};

use mirage_protocol::{Action, ClassifyRequest, Decision, Event};

use crate::classifier::ClassifierClient;
use crate::config::GuardConfig;
use crate::report::EventReporter;

const EXCERPT_MAX: usize = 80;

/// Per-process middleware state: classification client, optional event
/// reporter, and the inspection limits. Cloned into every request.
#[derive(Debug, Clone)]
pub struct Guard {
    classifier: ClassifierClient,
    reporter: Option<EventReporter>,
    max_body_bytes: usize,
}

impl Guard {
    pub fn new(config: GuardConfig) -> Self {
        let classifier = ClassifierClient::new(
            &config.classifier_url,
            Duration::from_millis(config.classify_timeout_ms),
        );

        let reporter = match (&config.aggregator_url, &config.aggregator_token) {
            (Some(url), Some(token)) => Some(EventReporter::new(url, token)),
            (Some(_), None) => {
                tracing::warn!("aggregator URL set without a token, event reporting disabled");
                None
            }
            _ => None,
        };

        Self {
            classifier,
            reporter,
            max_body_bytes: config.max_body_bytes,
        }
    }
}

/// Middleware: classify the request and enforce the verdict.
///
/// Sequencing per request is strict: classify, then the optional tarpit
/// delay, then enforcement. The delay suspends only this request's task;
/// concurrent requests are untouched.
pub async fn intercept(State(guard): State<Guard>, req: Request, next: Next) -> Response {
    let src_ip = client_ip(&req);
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let query = req.uri().query().unwrap_or("").to_string();

    // Buffer the body so it can be inspected and then replayed downstream.
    let (parts, body) = req.into_parts();
    let bytes = match axum::body::to_bytes(body, guard.max_body_bytes).await {
        Ok(bytes) => bytes,
        Err(_) => {
            // Unreadable or over-limit body: reject before consulting the
            // classifier, there is nothing left to replay downstream.
            return StatusCode::PAYLOAD_TOO_LARGE.into_response();
        }
    };
    let req = Request::from_parts(parts, Body::from(bytes.clone()));

    let inspection_text = if method == Method::GET {
        query.clone()
    } else {
        let mut text = String::from_utf8_lossy(&bytes).into_owned();
        if !query.is_empty() {
            text.push(' ');
            text.push_str(&query);
        }
        text
    };

    let classify_request = ClassifyRequest {
        src_ip: src_ip.clone(),
        path: path.clone(),
        method: method.to_string(),
        body: inspection_text,
    };

    let decision = match guard.classifier.classify(&classify_request).await {
        Ok(decision) => decision,
        Err(e) => {
            // Fail open: the protected application must never become
            // unreachable because the classifier is down. No retry.
            tracing::warn!(error = %e, "classifier unreachable, failing open");
            return next.run(req).await;
        }
    };

    if decision.is_benign() {
        tracing::debug!(path = %path, "benign request");
    } else {
        tracing::warn!(
            src_ip = %src_ip,
            label = %decision.label,
            confidence = decision.confidence,
            action = ?decision.action,
            "attack detected"
        );

        if let Some(reporter) = &guard.reporter {
            reporter.dispatch(Event {
                src_ip,
                label: decision.label.clone(),
                path,
                payload_excerpt: Some(excerpt(&classify_request.body)),
            });
        }
    }

    // Tarpit: hold this response back without blocking anything else.
    if decision.delay_ms > 0 {
        tokio::time::sleep(Duration::from_millis(decision.delay_ms)).await;
    }

    enforce(decision, req, next).await
}

/// Terminal per request: exactly one arm runs, and only PASS reaches the
/// downstream handler.
async fn enforce(decision: Decision, req: Request, next: Next) -> Response {
    match decision.action {
        Action::Pass => next.run(req).await,
        Action::Deceive => {
            if let Some(target) = decision.honeypot_target() {
                tracing::info!(target = %target, "redirecting to honeypot");
                return Redirect::temporary(&target).into_response();
            }

            // 200, not an error status: a scanner must not learn from the
            // status code that it was caught.
            let content_type = if decision.message.trim_start().starts_with('{') {
                "application/json"
            } else {
                "text/html"
            };
            ([(header::CONTENT_TYPE, content_type)], decision.message).into_response()
        }
    }
}

/// Best available client address: first X-Forwarded-For hop, then the peer
/// address, then loopback.
fn client_ip(req: &Request) -> String {
    if let Some(forwarded) = req
        .headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
    {
        let first = forwarded.split(',').next().unwrap_or(forwarded).trim();
        if !first.is_empty() {
            return first.to_string();
        }
    }

    req.extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|info| info.0.ip().to_string())
        .unwrap_or_else(|| "127.0.0.1".to_string())
}

fn excerpt(text: &str) -> String {
    if text.len() <= EXCERPT_MAX {
        return text.to_string();
    }
    let mut end = EXCERPT_MAX;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &text[..end])
}
