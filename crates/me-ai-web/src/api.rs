//! The `/ask` endpoint.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use me_ai::knowledge::KnowledgeStore;
use me_ai::{CompletionBackend, build_prompt};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::AppError;

/// Shared application state passed to handlers via axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    pub knowledge: Arc<KnowledgeStore>,
    pub completions: Arc<dyn CompletionBackend>,
}

impl AppState {
    pub fn new(knowledge: KnowledgeStore, completions: impl CompletionBackend + 'static) -> Self {
        Self {
            knowledge: Arc::new(knowledge),
            completions: Arc::new(completions),
        }
    }
}

/// Request body for POST /ask.
#[derive(Deserialize, Debug)]
pub struct AskRequest {
    #[serde(default)]
    pub message: Option<String>,
}

/// Success body for POST /ask.
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct AskReply {
    pub reply: String,
}

/// POST /ask — Answer one question about Layton.
///
/// Returns 400 when `message` is absent, null, empty, or the body is not a
/// JSON object with a string `message`. Knowledge and completion failures
/// return 500 with a generic body.
pub async fn post_ask(
    State(app): State<AppState>,
    body: Result<Json<AskRequest>, JsonRejection>,
) -> Result<Json<AskReply>, AppError> {
    let message = match body {
        Ok(Json(req)) => req.message,
        Err(rejection) => {
            debug!(%rejection, "unusable /ask body");
            None
        }
    };
    let message = message
        .filter(|m| !m.is_empty())
        .ok_or(AppError::MissingMessage)?;

    let knowledge = app.knowledge.get().await?;
    let prompt = build_prompt(&knowledge, &message);
    debug!(
        message_chars = message.chars().count(),
        prompt_bytes = prompt.len(),
        "requesting completion"
    );

    let reply = app.completions.complete(&prompt).await?;
    Ok(Json(AskReply { reply }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use me_ai::CompletionFuture;
    use me_ai::knowledge::StaticKnowledgeSource;
    use tower::ServiceExt;

    use crate::server::build_router;

    #[derive(Default)]
    struct EchoBackend {
        calls: AtomicUsize,
    }

    impl CompletionBackend for EchoBackend {
        fn complete<'a>(&'a self, prompt: &'a str) -> CompletionFuture<'a> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Box::pin(async move { Ok(format!("{} bytes", prompt.len())) })
        }
    }

    fn test_state() -> (AppState, Arc<EchoBackend>) {
        let backend = Arc::new(EchoBackend::default());
        let state = AppState {
            knowledge: Arc::new(KnowledgeStore::new(Arc::new(StaticKnowledgeSource::new(
                r#"{"name":"Layton"}"#,
                "[]",
            )))),
            completions: backend.clone(),
        };
        (state, backend)
    }

    async fn ask(state: AppState, content_type: Option<&str>, body: &str) -> (StatusCode, String) {
        let mut req = Request::builder().method("POST").uri("/ask");
        if let Some(ct) = content_type {
            req = req.header(header::CONTENT_TYPE, ct);
        }
        let resp = build_router(state)
            .oneshot(req.body(Body::from(body.to_string())).unwrap())
            .await
            .unwrap();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[test]
    fn ask_request_deserializes() {
        let req: AskRequest = serde_json::from_str(r#"{"message":"hi"}"#).unwrap();
        assert_eq!(req.message.as_deref(), Some("hi"));

        let req: AskRequest = serde_json::from_str("{}").unwrap();
        assert!(req.message.is_none());

        let req: AskRequest = serde_json::from_str(r#"{"message":null}"#).unwrap();
        assert!(req.message.is_none());
    }

    #[tokio::test]
    async fn missing_message_variants_are_rejected() {
        let cases = [
            (Some("application/json"), "{}"),
            (Some("application/json"), r#"{"message":""}"#),
            (Some("application/json"), r#"{"message":null}"#),
            (Some("application/json"), r#"{"message":42}"#),
            (Some("application/json"), "{not json"),
            (Some("text/plain"), r#"{"message":"hi"}"#),
            (None, ""),
        ];
        for (content_type, body) in cases {
            let (state, backend) = test_state();
            let (status, text) = ask(state, content_type, body).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "body: {body}");
            assert_eq!(text, r#"{"error":"Missing message"}"#, "body: {body}");
            assert_eq!(backend.calls.load(Ordering::SeqCst), 0);
        }
    }

    #[tokio::test]
    async fn valid_message_reaches_backend() {
        let (state, backend) = test_state();
        let (status, text) = ask(state, Some("application/json"), r#"{"message":"hi"}"#).await;
        assert_eq!(status, StatusCode::OK);
        let reply: AskReply = serde_json::from_str(&text).unwrap();
        assert!(reply.reply.ends_with(" bytes"));
        assert_eq!(backend.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn whitespace_message_is_accepted() {
        let (state, backend) = test_state();
        let (status, _) = ask(state, Some("application/json"), r#"{"message":"   "}"#).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(backend.calls.load(Ordering::SeqCst), 1);
    }
}
