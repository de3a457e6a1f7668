use anyhow::anyhow;
use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::lifecycle::service::ItemService;
use crate::models::goods::GoodsRecord;
use crate::models::pet::{PetCategory, PetContext};
use crate::state::AppState;
use crate::store::{GoodsFilter, SortOrder};

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GoodsKind {
    #[default]
    All,
    Favorite,
    Latest,
}

#[derive(Debug, Deserialize)]
pub struct GoodsQuery {
    pub pet: PetCategory,
    #[serde(default)]
    pub kind: GoodsKind,
}

#[derive(Debug, Deserialize)]
pub struct ViewRequest {
    pub pet: PetCategory,
    pub item: GoodsRecord,
}

#[derive(Debug, Deserialize)]
pub struct FavoriteRequest {
    pub pet: PetCategory,
    pub item: GoodsRecord,
    pub is_favorite: bool,
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub deleted: u64,
}

/// GET /api/v1/goods?pet=&kind=
/// Favorites come oldest first; recent goods newest first.
pub async fn handle_list_goods(
    State(state): State<AppState>,
    Query(params): Query<GoodsQuery>,
) -> Result<Json<Vec<GoodsRecord>>, AppError> {
    let (filter, order) = match params.kind {
        GoodsKind::All => (GoodsFilter::all(params.pet), SortOrder::OldestFirst),
        GoodsKind::Favorite => (GoodsFilter::favorites(params.pet), SortOrder::OldestFirst),
        GoodsKind::Latest => (GoodsFilter::latest(params.pet), SortOrder::NewestFirst),
    };
    Ok(Json(state.store.fetch_goods(filter, order).await?))
}

/// DELETE /api/v1/goods?pet=&kind=
/// Clearing one list never removes a record that still belongs to the other.
pub async fn handle_delete_goods(
    State(state): State<AppState>,
    Query(params): Query<GoodsQuery>,
) -> Result<Json<DeleteResponse>, AppError> {
    let filter = match params.kind {
        GoodsKind::Favorite => GoodsFilter {
            is_latest: Some(false),
            ..GoodsFilter::favorites(params.pet)
        },
        GoodsKind::Latest => GoodsFilter {
            is_favorite: Some(false),
            ..GoodsFilter::latest(params.pet)
        },
        GoodsKind::All => {
            return Err(AppError::Validation(
                "kind must be 'favorite' or 'latest'".to_string(),
            ))
        }
    };
    let deleted = state.store.delete_goods(filter).await?;
    Ok(Json(DeleteResponse { deleted }))
}

/// POST /api/v1/goods/view
pub async fn handle_record_view(
    State(state): State<AppState>,
    Json(req): Json<ViewRequest>,
) -> Result<Json<GoodsRecord>, AppError> {
    let mut service = ItemService::new(req.item, PetContext::new(req.pet), state.store.clone());
    // keep a stored favorite flag the client may not know about
    service.fetch_data().await;
    if !service.insert().await {
        return Err(anyhow!("Could not record view of {}", service.item().product_id).into());
    }
    Ok(Json(service.into_item()))
}

/// PATCH /api/v1/goods/favorite
pub async fn handle_update_favorite(
    State(state): State<AppState>,
    Json(req): Json<FavoriteRequest>,
) -> Result<Json<GoodsRecord>, AppError> {
    let mut service = ItemService::new(req.item, PetContext::new(req.pet), state.store.clone());
    service.fetch_data().await;
    if !service.update_favorite(req.is_favorite).await {
        return Err(anyhow!("Could not update favorite for {}", service.item().product_id).into());
    }
    Ok(Json(service.into_item()))
}
