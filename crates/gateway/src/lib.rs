//! HTTP API gateway — the request boundary of the retrieval engine.
//!
//! Endpoints:
//!
//! - `POST /api/chat` — mask PII, compose context, generate a reply
//! - `GET  /health`   — liveness plus index status
//!
//! The chat handler is orchestration only: every piece of real work lives
//! behind the composer, the geo ranker, and the capability traits. Section
//! failures degrade (the affected context section is omitted, the request
//! survives); generation failures become a user-visible error string in
//! `reply` rather than a failed request.

use std::sync::Arc;

use axum::{
    Router,
    extract::{Json, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use shopclerk_context::{ContextComposer, NEARBY_STORE_COUNT};
use shopclerk_core::{GeoPoint, Generator, NewPurchase, PurchaseStore, RankedStore, StoreCatalog};
use shopclerk_index::SemanticIndex;

// ── State ─────────────────────────────────────────────────────────────────

/// Shared state for the gateway.
pub struct AppState {
    pub composer: ContextComposer,
    pub index: Arc<SemanticIndex>,
    pub generator: Arc<dyn Generator>,
    pub purchases: Arc<dyn PurchaseStore>,
    pub catalog: Arc<dyn StoreCatalog>,
}

pub type SharedState = Arc<AppState>;

// ── Router ────────────────────────────────────────────────────────────────

/// Build the gateway router.
pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/api/chat", post(chat_handler))
        .route("/health", get(health_handler))
        .with_state(state)
}

// ── Request / Response types ──────────────────────────────────────────────

/// The chat request payload. Optional fields are checked structurally —
/// presence is encoded in the type, not probed at runtime.
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    /// The user's raw message (masked before any further processing).
    pub message: String,

    /// Caller location, enables the nearby-stores context section.
    #[serde(default)]
    pub location: Option<GeoPoint>,

    /// Known user id, enables the past-purchases context section.
    #[serde(default)]
    pub user_id: Option<String>,

    /// Force onboarding a fresh user id.
    #[serde(default)]
    pub new_user: bool,

    /// Purchase to record before composing ("I'm going" button).
    #[serde(default)]
    pub track_purchase: Option<NewPurchase>,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub reply: String,
    pub context_used: String,
    pub user_id: String,
    pub store_recommendations: Vec<RankedStore>,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

// ── Handlers ──────────────────────────────────────────────────────────────

async fn health_handler(State(state): State<SharedState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "index_loaded": state.index.is_loaded().await,
        "indexed_docs": state.index.doc_count().await,
    }))
}

async fn chat_handler(
    State(state): State<SharedState>,
    Json(req): Json<ChatRequest>,
) -> axum::response::Response {
    if req.message.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "Message required".into(),
            }),
        )
            .into_response();
    }

    // 1. Mask PII before the message touches anything else.
    let masked_message = shopclerk_pii::mask(&req.message);

    // 2. Resolve the user: fresh id for onboarding, get-or-create otherwise.
    let user_id = match (&req.user_id, req.new_user) {
        (Some(id), false) => id.clone(),
        _ => fresh_user_id(),
    };
    if let Err(e) = state.purchases.get_or_create_user(&user_id).await {
        warn!(user_id, error = %e, "user record unavailable, continuing");
    }

    // 3. Track a purchase when the caller reports one.
    if let Some(purchase) = req.track_purchase {
        if let Err(e) = state.purchases.record_purchase(&user_id, purchase).await {
            warn!(user_id, error = %e, "failed to record purchase");
        }
    }

    // 4. Rank stores for the response's recommendation buttons.
    let store_recommendations = match req.location {
        Some(location) => recommend_stores(&state, location).await,
        None => Vec::new(),
    };

    // 5. Compose the context; failing sections are omitted, not fatal.
    let composition = state
        .composer
        .compose_degraded(&masked_message, Some(&user_id), req.location)
        .await;
    for skipped in &composition.skipped {
        warn!(
            section = skipped.section.label(),
            reason = %skipped.reason,
            "context section omitted"
        );
    }

    // 6. Generate; failures surface in the reply, never retried here.
    let prompt = format!(
        "User message: {masked_message}\nContext: {}",
        composition.context
    );
    let reply = match state.generator.generate(&prompt).await {
        Ok(reply) => reply,
        Err(e) => {
            warn!(error = %e, "generation failed");
            format!("Error generating response: {e}")
        }
    };

    info!(
        user_id,
        context_len = composition.context.len(),
        recommendations = store_recommendations.len(),
        "chat request served"
    );

    Json(ChatResponse {
        reply,
        context_used: composition.context,
        user_id,
        store_recommendations,
    })
    .into_response()
}

/// Mint an onboarding user id: `user_` plus 8 hex chars.
fn fresh_user_id() -> String {
    let uuid = uuid::Uuid::new_v4().simple().to_string();
    format!("user_{}", &uuid[..8])
}

/// Nearest stores for the response payload. Any failure here degrades to
/// an empty recommendation list — the chat reply still goes out.
async fn recommend_stores(state: &AppState, location: GeoPoint) -> Vec<RankedStore> {
    let stores = match state.catalog.load_stores().await {
        Ok(stores) => stores,
        Err(e) => {
            warn!(error = %e, "store catalog unavailable");
            return Vec::new();
        }
    };
    if stores.is_empty() {
        return Vec::new();
    }

    match shopclerk_geo::nearest(location, &stores, NEARBY_STORE_COUNT) {
        Ok(ranked) => ranked,
        Err(e) => {
            warn!(error = %e, "store ranking failed");
            Vec::new()
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────
