use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::discover::handle::DiscoverHandle;
use crate::discover::session::{DiscoverSession, SessionState};
use crate::errors::AppError;
use crate::models::goods::GoodsRecord;
use crate::models::pet::{PetCategory, PetContext};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateSessionRequest {
    /// Defaults to the category of the last saved pet profile, then dog.
    pub pet: Option<PetCategory>,
    pub count: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub session_id: Uuid,
    pub pet: PetCategory,
    pub state: SessionState,
    pub recommended: Vec<String>,
    pub pending: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct FetchResponse {
    pub success: bool,
    pub error: Option<String>,
    pub item_count: Option<usize>,
    pub term: Option<String>,
    pub state: SessionState,
    pub goods: Vec<GoodsRecord>,
}

async fn find(state: &AppState, id: Uuid) -> Result<DiscoverHandle, AppError> {
    state
        .sessions
        .get(id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("Discover session {id} not found")))
}

/// POST /api/v1/discover/sessions
pub async fn handle_create_session(
    State(state): State<AppState>,
    Json(req): Json<CreateSessionRequest>,
) -> Result<Json<SessionResponse>, AppError> {
    let options = state.config.discover_options();
    let count = req.count.unwrap_or(options.term_count);

    let mut session = DiscoverSession::new(
        PetContext::default(),
        state.store.clone(),
        state.shopping.clone(),
        options,
    );
    let pet = match req.pet {
        Some(pet) => Some(pet),
        None => session.fetch_pet().await,
    };
    if let Some(pet) = pet {
        session.switch_context(PetContext::new(pet));
    }

    session.load_context().await;
    session.build_queue(count);

    let pet = session.context().pet;
    let session_state = session.state();
    let recommended = session.recommended().to_vec();
    let pending = session.pending_terms();
    let session_id = state.sessions.insert(DiscoverHandle::new(session)).await;

    Ok(Json(SessionResponse {
        session_id,
        pet,
        state: session_state,
        recommended,
        pending,
    }))
}

/// POST /api/v1/discover/sessions/:id/next
pub async fn handle_fetch_next(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<FetchResponse>, AppError> {
    let handle = find(&state, id).await?;
    let mut session = handle.try_lock()?;

    let before = session.goods().len();
    let outcome = session.fetch_next().await;
    let term = outcome.term().map(str::to_string);
    let (success, error, item_count) = outcome.into_parts();

    Ok(Json(FetchResponse {
        success,
        error: error.map(|e| e.to_string()),
        item_count,
        term,
        state: session.state(),
        goods: session.goods()[before..].to_vec(),
    }))
}

/// GET /api/v1/discover/sessions/:id/goods
pub async fn handle_session_goods(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<GoodsRecord>>, AppError> {
    let handle = find(&state, id).await?;
    let session = handle.lock().await;
    Ok(Json(session.goods().to_vec()))
}

/// DELETE /api/v1/discover/sessions/:id
pub async fn handle_end_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    if state.sessions.remove(id).await {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound(format!("Discover session {id} not found")))
    }
}
