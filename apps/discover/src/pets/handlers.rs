use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;

use crate::errors::AppError;
use crate::models::goods::SearchWordRecord;
use crate::models::pet::{PetCategory, PetKeywordProfile};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SearchWordRequest {
    pub word: String,
}

#[derive(Debug, Deserialize)]
pub struct KeywordsRequest {
    pub keywords: Vec<String>,
}

/// GET /api/v1/pets/:pet/search-words
pub async fn handle_list_search_words(
    State(state): State<AppState>,
    Path(pet): Path<PetCategory>,
) -> Result<Json<Vec<SearchWordRecord>>, AppError> {
    Ok(Json(state.store.fetch_search_words(pet).await?))
}

/// POST /api/v1/pets/:pet/search-words
pub async fn handle_add_search_word(
    State(state): State<AppState>,
    Path(pet): Path<PetCategory>,
    Json(req): Json<SearchWordRequest>,
) -> Result<StatusCode, AppError> {
    let word = req.word.trim();
    if word.is_empty() {
        return Err(AppError::Validation("word must not be empty".to_string()));
    }
    state.store.insert_search_word(pet, word).await?;
    Ok(StatusCode::CREATED)
}

/// DELETE /api/v1/pets/:pet/search-words
pub async fn handle_clear_search_words(
    State(state): State<AppState>,
    Path(pet): Path<PetCategory>,
) -> Result<StatusCode, AppError> {
    state.store.delete_search_words(pet).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/pets/:pet/keywords
pub async fn handle_get_keywords(
    State(state): State<AppState>,
    Path(pet): Path<PetCategory>,
) -> Result<Json<PetKeywordProfile>, AppError> {
    state
        .store
        .fetch_profile(pet)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("No keyword profile for {pet}")))
}

/// PUT /api/v1/pets/:pet/keywords
/// Replaces the profile wholesale; blank and repeated keywords are dropped.
pub async fn handle_put_keywords(
    State(state): State<AppState>,
    Path(pet): Path<PetCategory>,
    Json(req): Json<KeywordsRequest>,
) -> Result<Json<PetKeywordProfile>, AppError> {
    let mut keywords: Vec<String> = Vec::new();
    for keyword in req.keywords {
        let keyword = keyword.trim().to_string();
        if !keyword.is_empty() && !keywords.contains(&keyword) {
            keywords.push(keyword);
        }
    }
    let profile = PetKeywordProfile::new(pet, keywords);
    state.store.upsert_profile(&profile).await?;
    Ok(Json(profile))
}
