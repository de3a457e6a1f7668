use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;

use crate::models::goods::{GoodsRecord, SearchWordRecord};
use crate::models::pet::{PetCategory, PetKeywordProfile};
use crate::store::{GoodsFilter, SortOrder, Store, StoreError};

/// In-process store. Every operation holds the one lock for its whole
/// read-modify-write, so each call is atomic.
///
/// Rows are kept in write order; sorting on `created_at` is stable, so equal
/// timestamps resolve to the later write being newer.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    goods: Vec<GoodsRecord>,
    search_words: Vec<SearchWordRecord>,
    profiles: Vec<PetKeywordProfile>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn sorted(mut records: Vec<GoodsRecord>, order: SortOrder) -> Vec<GoodsRecord> {
    records.sort_by_key(|r| r.created_at);
    if order == SortOrder::NewestFirst {
        records.reverse();
    }
    records
}

#[async_trait]
impl Store for MemoryStore {
    async fn fetch_goods(
        &self,
        filter: GoodsFilter,
        order: SortOrder,
    ) -> Result<Vec<GoodsRecord>, StoreError> {
        let inner = self.inner.lock().await;
        let matching = inner
            .goods
            .iter()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect();
        Ok(sorted(matching, order))
    }

    async fn fetch_goods_by_product(
        &self,
        pet: PetCategory,
        product_id: &str,
    ) -> Result<Option<GoodsRecord>, StoreError> {
        let inner = self.inner.lock().await;
        Ok(inner
            .goods
            .iter()
            .find(|r| r.pet == pet && r.product_id == product_id)
            .cloned())
    }

    async fn upsert_goods(&self, record: &GoodsRecord) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().await;
        inner
            .goods
            .retain(|r| !(r.pet == record.pet && r.product_id == record.product_id));
        inner.goods.push(record.clone());
        Ok(())
    }

    async fn delete_goods(&self, filter: GoodsFilter) -> Result<u64, StoreError> {
        let mut inner = self.inner.lock().await;
        let before = inner.goods.len();
        inner.goods.retain(|r| !filter.matches(r));
        Ok((before - inner.goods.len()) as u64)
    }

    async fn demote_surplus_latest(
        &self,
        pet: PetCategory,
        keep: usize,
    ) -> Result<u64, StoreError> {
        let mut inner = self.inner.lock().await;
        let filter = GoodsFilter::latest(pet);
        let recent = sorted(
            inner.goods.iter().filter(|r| filter.matches(r)).cloned().collect(),
            SortOrder::NewestFirst,
        );
        let surplus: Vec<String> = recent
            .into_iter()
            .skip(keep)
            .map(|r| r.product_id)
            .collect();

        for record in inner.goods.iter_mut() {
            if record.pet == pet && surplus.contains(&record.product_id) {
                record.is_latest = false;
            }
        }
        Ok(surplus.len() as u64)
    }

    async fn fetch_search_words(
        &self,
        pet: PetCategory,
    ) -> Result<Vec<SearchWordRecord>, StoreError> {
        let inner = self.inner.lock().await;
        let mut words: Vec<_> = inner
            .search_words
            .iter()
            .filter(|w| w.pet == pet)
            .cloned()
            .collect();
        words.sort_by_key(|w| w.created_at);
        Ok(words)
    }

    async fn insert_search_word(&self, pet: PetCategory, word: &str) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().await;
        inner
            .search_words
            .retain(|w| !(w.pet == pet && w.word == word));
        inner.search_words.push(SearchWordRecord {
            pet,
            word: word.to_string(),
            created_at: Utc::now(),
        });
        Ok(())
    }

    async fn delete_search_words(&self, pet: PetCategory) -> Result<u64, StoreError> {
        let mut inner = self.inner.lock().await;
        let before = inner.search_words.len();
        inner.search_words.retain(|w| w.pet != pet);
        Ok((before - inner.search_words.len()) as u64)
    }

    async fn fetch_profile(
        &self,
        pet: PetCategory,
    ) -> Result<Option<PetKeywordProfile>, StoreError> {
        let inner = self.inner.lock().await;
        Ok(inner.profiles.iter().find(|p| p.pet == pet).cloned())
    }

    async fn fetch_latest_profile(&self) -> Result<Option<PetKeywordProfile>, StoreError> {
        let inner = self.inner.lock().await;
        Ok(inner.profiles.iter().max_by_key(|p| p.updated_at).cloned())
    }

    async fn upsert_profile(&self, profile: &PetKeywordProfile) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().await;
        inner.profiles.retain(|p| p.pet != profile.pet);
        inner.profiles.push(profile.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::goods;

    #[tokio::test]
    async fn test_upsert_same_product_keeps_one_record() {
        let store = MemoryStore::new();
        let first = goods(PetCategory::Dog, "p1", 0);
        let mut second = goods(PetCategory::Dog, "p1", 1);
        second.title = "second write".to_string();

        store.upsert_goods(&first).await.unwrap();
        store.upsert_goods(&second).await.unwrap();

        let all = store
            .fetch_goods(GoodsFilter::all(PetCategory::Dog), SortOrder::OldestFirst)
            .await
            .unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].title, "second write");
    }

    #[tokio::test]
    async fn test_same_product_in_other_category_is_distinct() {
        let store = MemoryStore::new();
        store.upsert_goods(&goods(PetCategory::Dog, "p1", 0)).await.unwrap();
        store.upsert_goods(&goods(PetCategory::Cat, "p1", 0)).await.unwrap();

        let dog = store.fetch_goods_by_product(PetCategory::Dog, "p1").await.unwrap();
        let cat = store.fetch_goods_by_product(PetCategory::Cat, "p1").await.unwrap();
        assert!(dog.is_some());
        assert!(cat.is_some());
    }

    #[tokio::test]
    async fn test_fetch_goods_orders_by_date() {
        let store = MemoryStore::new();
        store.upsert_goods(&goods(PetCategory::Dog, "late", 5)).await.unwrap();
        store.upsert_goods(&goods(PetCategory::Dog, "early", 1)).await.unwrap();

        let newest = store
            .fetch_goods(GoodsFilter::all(PetCategory::Dog), SortOrder::NewestFirst)
            .await
            .unwrap();
        assert_eq!(newest[0].product_id, "late");

        let oldest = store
            .fetch_goods(GoodsFilter::all(PetCategory::Dog), SortOrder::OldestFirst)
            .await
            .unwrap();
        assert_eq!(oldest[0].product_id, "early");
    }

    #[tokio::test]
    async fn test_demote_surplus_keeps_newest() {
        let store = MemoryStore::new();
        for i in 0..12 {
            let mut record = goods(PetCategory::Dog, &format!("p{i}"), i);
            record.is_latest = true;
            store.upsert_goods(&record).await.unwrap();
        }

        let demoted = store.demote_surplus_latest(PetCategory::Dog, 10).await.unwrap();
        assert_eq!(demoted, 2);

        let latest = store
            .fetch_goods(GoodsFilter::latest(PetCategory::Dog), SortOrder::OldestFirst)
            .await
            .unwrap();
        assert_eq!(latest.len(), 10);
        assert_eq!(latest[0].product_id, "p2");
    }

    #[tokio::test]
    async fn test_search_words_dedup_and_scope() {
        let store = MemoryStore::new();
        store.insert_search_word(PetCategory::Dog, "leash").await.unwrap();
        store.insert_search_word(PetCategory::Dog, "treat").await.unwrap();
        store.insert_search_word(PetCategory::Dog, "leash").await.unwrap();
        store.insert_search_word(PetCategory::Cat, "litter").await.unwrap();

        let words: Vec<String> = store
            .fetch_search_words(PetCategory::Dog)
            .await
            .unwrap()
            .into_iter()
            .map(|w| w.word)
            .collect();
        assert_eq!(words, vec!["treat".to_string(), "leash".to_string()]);

        assert_eq!(store.delete_search_words(PetCategory::Dog).await.unwrap(), 2);
        assert_eq!(store.fetch_search_words(PetCategory::Cat).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_profile_replaced_wholesale() {
        let store = MemoryStore::new();
        store
            .upsert_profile(&PetKeywordProfile::new(PetCategory::Cat, vec!["indoor".into()]))
            .await
            .unwrap();
        store
            .upsert_profile(&PetKeywordProfile::new(PetCategory::Cat, vec!["senior".into()]))
            .await
            .unwrap();

        let profile = store.fetch_profile(PetCategory::Cat).await.unwrap().unwrap();
        assert_eq!(profile.keywords, vec!["senior".to_string()]);
        assert!(store.fetch_profile(PetCategory::Dog).await.unwrap().is_none());
        assert_eq!(
            store.fetch_latest_profile().await.unwrap().map(|p| p.pet),
            Some(PetCategory::Cat)
        );
    }
}
