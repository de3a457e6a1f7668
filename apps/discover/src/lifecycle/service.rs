//! Item lifecycle: recording views and toggling favorites on one goods record.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::models::goods::GoodsRecord;
use crate::models::pet::{PetCategory, PetContext};
use crate::store::{Store, StoreError, RECENT_GOODS_CAP};

/// Business rule: a favorited record leaves the rotating recent set, and an
/// unfavorited one rejoins it. A stored record is never neither.
pub fn favoriting_removes_recency(record: &mut GoodsRecord, is_favorite: bool) {
    record.is_favorite = is_favorite;
    record.is_latest = !is_favorite;
}

/// Keeps at most `RECENT_GOODS_CAP` recent records for `pet`, demoting the
/// oldest surplus. Demoted records stay stored.
pub async fn enforce_recency_cap(store: &dyn Store, pet: PetCategory) -> Result<u64, StoreError> {
    let demoted = store.demote_surplus_latest(pet, RECENT_GOODS_CAP).await?;
    if demoted > 0 {
        info!("Demoted {demoted} recent goods for {pet}");
    }
    Ok(demoted)
}

/// Lifecycle operations for the record a user is looking at.
pub struct ItemService {
    item: GoodsRecord,
    ctx: PetContext,
    store: Arc<dyn Store>,
}

impl ItemService {
    pub fn new(item: GoodsRecord, ctx: PetContext, store: Arc<dyn Store>) -> Self {
        Self { item, ctx, store }
    }

    pub fn item(&self) -> &GoodsRecord {
        &self.item
    }

    pub fn into_item(self) -> GoodsRecord {
        self.item
    }

    /// Records the item as recently viewed now.
    pub async fn insert(&mut self) -> bool {
        self.record_view_at(Utc::now()).await
    }

    /// Flags the item recent, stamps `now`, pins it to the active category,
    /// upserts it by product id and then enforces the recency cap.
    pub async fn record_view_at(&mut self, now: DateTime<Utc>) -> bool {
        self.item.is_latest = true;
        self.item.created_at = now;
        self.item.pet = self.ctx.pet;

        if let Err(e) = self.store.upsert_goods(&self.item).await {
            warn!("Failed to record view of {}: {e}", self.item.product_id);
            return false;
        }
        if let Err(e) = enforce_recency_cap(self.store.as_ref(), self.ctx.pet).await {
            warn!("Failed to enforce recency cap for {}: {e}", self.ctx.pet);
        }
        true
    }

    /// Replaces the held record with the stored copy, if there is one.
    pub async fn fetch_data(&mut self) -> bool {
        match self
            .store
            .fetch_goods_by_product(self.ctx.pet, &self.item.product_id)
            .await
        {
            Ok(Some(stored)) => {
                self.item = stored;
                true
            }
            Ok(None) => false,
            Err(e) => {
                warn!("Failed to fetch {}: {e}", self.item.product_id);
                false
            }
        }
    }

    /// Sets or clears the favorite flag and persists through the upsert path.
    pub async fn update_favorite(&mut self, is_favorite: bool) -> bool {
        self.update_favorite_at(is_favorite, Utc::now()).await
    }

    /// Favoriting stores the record as purely favorite. Unfavoriting records
    /// a fresh view at `now`, so the record is recent again and the cap runs.
    pub async fn update_favorite_at(&mut self, is_favorite: bool, now: DateTime<Utc>) -> bool {
        favoriting_removes_recency(&mut self.item, is_favorite);
        if !is_favorite {
            return self.record_view_at(now).await;
        }
        self.item.pet = self.ctx.pet;

        match self.store.upsert_goods(&self.item).await {
            Ok(()) => true,
            Err(e) => {
                warn!("Failed to update favorite for {}: {e}", self.item.product_id);
                false
            }
        }
    }
}
