use axum::{extract::State, routing::post, Form, Json, Router};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};
use tokio::task::JoinHandle;

// ============================================================================
// Mock Infrastructure
// ============================================================================

#[derive(Clone)]
struct SiteVerifyState {
    secret: String,
    accepted_token: String,
    calls: Arc<AtomicUsize>,
}

/// Stand-in for Google's siteverify endpoint. Accepts exactly one token for
/// one secret.
pub struct MockSiteVerify {
    pub url: String,
    calls: Arc<AtomicUsize>,
    _handle: JoinHandle<()>,
}

impl MockSiteVerify {
    pub async fn start(secret: &str, accepted_token: &str) -> Self {
        let calls = Arc::new(AtomicUsize::new(0));
        let state = SiteVerifyState {
            secret: secret.to_string(),
            accepted_token: accepted_token.to_string(),
            calls: calls.clone(),
        };

        let app = Router::new()
            .route("/siteverify", post(siteverify))
            .with_state(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            url: format!("http://{addr}/siteverify"),
            calls,
            _handle: handle,
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

async fn siteverify(
    State(state): State<SiteVerifyState>,
    Form(form): Form<HashMap<String, String>>,
) -> Json<Value> {
    state.calls.fetch_add(1, Ordering::SeqCst);

    let secret_ok = form.get("secret") == Some(&state.secret);
    let token_ok = form.get("response") == Some(&state.accepted_token);

    if secret_ok && token_ok {
        Json(json!({ "success": true, "hostname": "localhost" }))
    } else {
        Json(json!({ "success": false, "error-codes": ["invalid-input-response"] }))
    }
}
