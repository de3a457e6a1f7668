//! Persistence gateway: typed fetch / upsert / delete over saved goods,
//! search history and pet keyword profiles.
//!
//! Reads never fail on absence; missing data comes back as an empty `Vec` or `None`.

use async_trait::async_trait;
use thiserror::Error;

use crate::models::goods::{GoodsRecord, SearchWordRecord};
use crate::models::pet::{PetCategory, PetKeywordProfile};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// How many recently viewed goods a category keeps flagged.
pub const RECENT_GOODS_CAP: usize = 10;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Corrupt row: {0}")]
    Corrupt(String),
}

/// Predicate over saved goods. `None` fields match anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GoodsFilter {
    pub pet: PetCategory,
    pub is_favorite: Option<bool>,
    pub is_latest: Option<bool>,
}

impl GoodsFilter {
    pub fn all(pet: PetCategory) -> Self {
        Self {
            pet,
            is_favorite: None,
            is_latest: None,
        }
    }

    pub fn favorites(pet: PetCategory) -> Self {
        Self {
            is_favorite: Some(true),
            ..Self::all(pet)
        }
    }

    pub fn latest(pet: PetCategory) -> Self {
        Self {
            is_latest: Some(true),
            ..Self::all(pet)
        }
    }

    pub fn matches(&self, record: &GoodsRecord) -> bool {
        record.pet == self.pet
            && self.is_favorite.map_or(true, |f| record.is_favorite == f)
            && self.is_latest.map_or(true, |l| record.is_latest == l)
    }
}

/// Sort direction on `created_at`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    OldestFirst,
    NewestFirst,
}

#[async_trait]
pub trait Store: Send + Sync {
    async fn fetch_goods(
        &self,
        filter: GoodsFilter,
        order: SortOrder,
    ) -> Result<Vec<GoodsRecord>, StoreError>;

    async fn fetch_goods_by_product(
        &self,
        pet: PetCategory,
        product_id: &str,
    ) -> Result<Option<GoodsRecord>, StoreError>;

    /// Inserts, or overwrites the record with the same `(pet, product_id)`.
    async fn upsert_goods(&self, record: &GoodsRecord) -> Result<(), StoreError>;

    /// Returns the number of deleted records.
    async fn delete_goods(&self, filter: GoodsFilter) -> Result<u64, StoreError>;

    /// Clears `is_latest` on every recent record of `pet` beyond the `keep`
    /// newest, in one transaction. Returns the number demoted.
    async fn demote_surplus_latest(&self, pet: PetCategory, keep: usize)
        -> Result<u64, StoreError>;

    /// Oldest first.
    async fn fetch_search_words(&self, pet: PetCategory)
        -> Result<Vec<SearchWordRecord>, StoreError>;

    /// Re-inserting an existing word refreshes its timestamp.
    async fn insert_search_word(&self, pet: PetCategory, word: &str) -> Result<(), StoreError>;

    async fn delete_search_words(&self, pet: PetCategory) -> Result<u64, StoreError>;

    async fn fetch_profile(&self, pet: PetCategory)
        -> Result<Option<PetKeywordProfile>, StoreError>;

    /// The most recently written profile, whatever its category.
    async fn fetch_latest_profile(&self) -> Result<Option<PetKeywordProfile>, StoreError>;

    /// Replaces the profile for `profile.pet` wholesale.
    async fn upsert_profile(&self, profile: &PetKeywordProfile) -> Result<(), StoreError>;
}
