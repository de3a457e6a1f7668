pub mod health;

use axum::{
    routing::{delete, get, patch, post},
    Router,
};

use crate::discover::handlers as discover;
use crate::lifecycle::handlers as goods;
use crate::pets::handlers as pets;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Discovery sessions
        .route(
            "/api/v1/discover/sessions",
            post(discover::handle_create_session),
        )
        .route(
            "/api/v1/discover/sessions/:id",
            delete(discover::handle_end_session),
        )
        .route(
            "/api/v1/discover/sessions/:id/next",
            post(discover::handle_fetch_next),
        )
        .route(
            "/api/v1/discover/sessions/:id/goods",
            get(discover::handle_session_goods),
        )
        // Saved goods
        .route(
            "/api/v1/goods",
            get(goods::handle_list_goods).delete(goods::handle_delete_goods),
        )
        .route("/api/v1/goods/view", post(goods::handle_record_view))
        .route("/api/v1/goods/favorite", patch(goods::handle_update_favorite))
        // Pet profile and search history
        .route(
            "/api/v1/pets/:pet/search-words",
            get(pets::handle_list_search_words)
                .post(pets::handle_add_search_word)
                .delete(pets::handle_clear_search_words),
        )
        .route(
            "/api/v1/pets/:pet/keywords",
            get(pets::handle_get_keywords).put(pets::handle_put_keywords),
        )
        .with_state(state)
}
