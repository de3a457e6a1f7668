use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::pet::PetCategory;

/// A normalized marketplace item the user has seen or saved.
/// Keyed by `(pet, product_id)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoodsRecord {
    pub pet: PetCategory,
    pub title: String,
    pub link: String,
    pub image: String,
    pub is_favorite: bool,
    pub is_latest: bool,
    pub price: String,
    pub product_id: String,
    pub search_word: String,
    pub shopping_mall: String,
    pub created_at: DateTime<Utc>,
}

/// A free-text term the user searched for in one category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchWordRecord {
    pub pet: PetCategory,
    pub word: String,
    pub created_at: DateTime<Utc>,
}
