use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use tracing::debug;

use crate::models::goods::{GoodsRecord, SearchWordRecord};
use crate::models::pet::{PetCategory, PetKeywordProfile};
use crate::store::{GoodsFilter, SortOrder, Store, StoreError};

/// Postgres-backed store. Tables are created by `db::ensure_schema`.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct GoodsRow {
    pet: String,
    product_id: String,
    title: String,
    link: String,
    image: String,
    is_favorite: bool,
    is_latest: bool,
    price: String,
    search_word: String,
    shopping_mall: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<GoodsRow> for GoodsRecord {
    type Error = StoreError;

    fn try_from(row: GoodsRow) -> Result<Self, Self::Error> {
        Ok(GoodsRecord {
            pet: parse_pet(&row.pet)?,
            title: row.title,
            link: row.link,
            image: row.image,
            is_favorite: row.is_favorite,
            is_latest: row.is_latest,
            price: row.price,
            product_id: row.product_id,
            search_word: row.search_word,
            shopping_mall: row.shopping_mall,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct SearchWordRow {
    pet: String,
    word: String,
    created_at: DateTime<Utc>,
}

#[derive(Debug, FromRow)]
struct ProfileRow {
    pet: String,
    keywords: Vec<String>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ProfileRow> for PetKeywordProfile {
    type Error = StoreError;

    fn try_from(row: ProfileRow) -> Result<Self, Self::Error> {
        Ok(PetKeywordProfile {
            pet: parse_pet(&row.pet)?,
            keywords: row.keywords,
            updated_at: row.updated_at,
        })
    }
}

fn parse_pet(raw: &str) -> Result<PetCategory, StoreError> {
    raw.parse::<PetCategory>()
        .map_err(|e| StoreError::Corrupt(e.to_string()))
}

fn order_clause(order: SortOrder) -> &'static str {
    match order {
        SortOrder::OldestFirst => "ORDER BY created_at ASC",
        SortOrder::NewestFirst => "ORDER BY created_at DESC",
    }
}

const GOODS_FILTER: &str = r#"
    WHERE pet = $1
      AND ($2::BOOLEAN IS NULL OR is_favorite = $2)
      AND ($3::BOOLEAN IS NULL OR is_latest = $3)
"#;

#[async_trait]
impl Store for PgStore {
    async fn fetch_goods(
        &self,
        filter: GoodsFilter,
        order: SortOrder,
    ) -> Result<Vec<GoodsRecord>, StoreError> {
        let sql = format!("SELECT * FROM my_goods {GOODS_FILTER} {}", order_clause(order));
        let rows = sqlx::query_as::<_, GoodsRow>(&sql)
            .bind(filter.pet.as_str())
            .bind(filter.is_favorite)
            .bind(filter.is_latest)
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(GoodsRecord::try_from).collect()
    }

    async fn fetch_goods_by_product(
        &self,
        pet: PetCategory,
        product_id: &str,
    ) -> Result<Option<GoodsRecord>, StoreError> {
        let row = sqlx::query_as::<_, GoodsRow>(
            "SELECT * FROM my_goods WHERE pet = $1 AND product_id = $2",
        )
        .bind(pet.as_str())
        .bind(product_id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(GoodsRecord::try_from).transpose()
    }

    async fn upsert_goods(&self, record: &GoodsRecord) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO my_goods
                (pet, product_id, title, link, image, is_favorite, is_latest,
                 price, search_word, shopping_mall, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            ON CONFLICT (pet, product_id) DO UPDATE SET
                title = EXCLUDED.title,
                link = EXCLUDED.link,
                image = EXCLUDED.image,
                is_favorite = EXCLUDED.is_favorite,
                is_latest = EXCLUDED.is_latest,
                price = EXCLUDED.price,
                search_word = EXCLUDED.search_word,
                shopping_mall = EXCLUDED.shopping_mall,
                created_at = EXCLUDED.created_at
            "#,
        )
        .bind(record.pet.as_str())
        .bind(&record.product_id)
        .bind(&record.title)
        .bind(&record.link)
        .bind(&record.image)
        .bind(record.is_favorite)
        .bind(record.is_latest)
        .bind(&record.price)
        .bind(&record.search_word)
        .bind(&record.shopping_mall)
        .bind(record.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn delete_goods(&self, filter: GoodsFilter) -> Result<u64, StoreError> {
        let sql = format!("DELETE FROM my_goods {GOODS_FILTER}");
        let result = sqlx::query(&sql)
            .bind(filter.pet.as_str())
            .bind(filter.is_favorite)
            .bind(filter.is_latest)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn demote_surplus_latest(
        &self,
        pet: PetCategory,
        keep: usize,
    ) -> Result<u64, StoreError> {
        let mut tx = self.pool.begin().await?;

        // Lock the category's recent rows so concurrent sessions serialize here.
        sqlx::query("SELECT product_id FROM my_goods WHERE pet = $1 AND is_latest FOR UPDATE")
            .bind(pet.as_str())
            .fetch_all(&mut *tx)
            .await?;

        let result = sqlx::query(
            r#"
            UPDATE my_goods SET is_latest = FALSE
            WHERE pet = $1 AND product_id IN (
                SELECT product_id FROM my_goods
                WHERE pet = $1 AND is_latest
                ORDER BY created_at DESC
                OFFSET $2
            )
            "#,
        )
        .bind(pet.as_str())
        .bind(keep as i64)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        debug!(
            "Demoted {} recent goods for {pet} (keep {keep})",
            result.rows_affected()
        );
        Ok(result.rows_affected())
    }

    async fn fetch_search_words(
        &self,
        pet: PetCategory,
    ) -> Result<Vec<SearchWordRecord>, StoreError> {
        let rows = sqlx::query_as::<_, SearchWordRow>(
            "SELECT * FROM search_words WHERE pet = $1 ORDER BY created_at ASC",
        )
        .bind(pet.as_str())
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter()
            .map(|row| {
                Ok(SearchWordRecord {
                    pet: parse_pet(&row.pet)?,
                    word: row.word,
                    created_at: row.created_at,
                })
            })
            .collect()
    }

    async fn insert_search_word(&self, pet: PetCategory, word: &str) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO search_words (pet, word, created_at) VALUES ($1, $2, NOW())
            ON CONFLICT (pet, word) DO UPDATE SET created_at = EXCLUDED.created_at
            "#,
        )
        .bind(pet.as_str())
        .bind(word)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn delete_search_words(&self, pet: PetCategory) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM search_words WHERE pet = $1")
            .bind(pet.as_str())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn fetch_profile(
        &self,
        pet: PetCategory,
    ) -> Result<Option<PetKeywordProfile>, StoreError> {
        let row = sqlx::query_as::<_, ProfileRow>("SELECT * FROM pet_keywords WHERE pet = $1")
            .bind(pet.as_str())
            .fetch_optional(&self.pool)
            .await?;
        row.map(PetKeywordProfile::try_from).transpose()
    }

    async fn fetch_latest_profile(&self) -> Result<Option<PetKeywordProfile>, StoreError> {
        let row = sqlx::query_as::<_, ProfileRow>(
            "SELECT * FROM pet_keywords ORDER BY updated_at DESC LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await?;
        row.map(PetKeywordProfile::try_from).transpose()
    }

    async fn upsert_profile(&self, profile: &PetKeywordProfile) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO pet_keywords (pet, keywords, updated_at) VALUES ($1, $2, $3)
            ON CONFLICT (pet) DO UPDATE SET
                keywords = EXCLUDED.keywords,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(profile.pet.as_str())
        .bind(&profile.keywords)
        .bind(profile.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
