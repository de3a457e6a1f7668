//! Fixtures shared by unit tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use tokio::sync::Notify;

use crate::models::goods::GoodsRecord;
use crate::models::pet::PetCategory;
use crate::shopping::{ShoppingError, ShoppingGateway, ShoppingItem, ShoppingPage, ShoppingQuery};

pub fn at(offset_secs: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap() + Duration::seconds(offset_secs)
}

/// A stored record with neither flag set, created `offset_secs` after a fixed epoch.
pub fn goods(pet: PetCategory, product_id: &str, offset_secs: i64) -> GoodsRecord {
    GoodsRecord {
        pet,
        title: format!("item {product_id}"),
        link: format!("https://shop.example.com/{product_id}"),
        image: format!("https://img.example.com/{product_id}.jpg"),
        is_favorite: false,
        is_latest: false,
        price: "12,900".to_string(),
        product_id: product_id.to_string(),
        search_word: "강아지 간식".to_string(),
        shopping_mall: "네이버쇼핑".to_string(),
        created_at: at(offset_secs),
    }
}

pub fn shopping_item(product_id: &str) -> ShoppingItem {
    ShoppingItem {
        title: format!("<b>간식</b> {product_id}"),
        link: format!("https://shop.example.com/{product_id}"),
        image: format!("https://img.example.com/{product_id}.jpg"),
        lprice: "12900".to_string(),
        product_id: product_id.to_string(),
        mall_name: "네이버".to_string(),
    }
}

pub fn page(items: Vec<ShoppingItem>) -> ShoppingPage {
    ShoppingPage {
        total: items.len() as u64,
        items,
    }
}

/// Scripted gateway: hands out queued responses in order and records queries.
/// With a gate, every search waits for `gate.notify_one()` first.
#[derive(Default)]
pub struct StubShopping {
    responses: Mutex<VecDeque<Result<ShoppingPage, ShoppingError>>>,
    queries: Mutex<Vec<ShoppingQuery>>,
    calls: AtomicUsize,
    gate: Option<Arc<Notify>>,
}

impl StubShopping {
    pub fn new(responses: Vec<Result<ShoppingPage, ShoppingError>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            ..Default::default()
        }
    }

    pub fn gated(responses: Vec<Result<ShoppingPage, ShoppingError>>, gate: Arc<Notify>) -> Self {
        Self {
            gate: Some(gate),
            ..Self::new(responses)
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn queried_terms(&self) -> Vec<String> {
        self.queries
            .lock()
            .unwrap()
            .iter()
            .map(|q| q.query.clone())
            .collect()
    }
}

#[async_trait]
impl ShoppingGateway for StubShopping {
    async fn search(&self, query: &ShoppingQuery) -> Result<ShoppingPage, ShoppingError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.queries.lock().unwrap().push(query.clone());
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(page(Vec::new())))
    }
}
