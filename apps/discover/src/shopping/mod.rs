//! Shopping gateway: marketplace search behind one trait.
//!
//! The discovery pipeline only sees `ShoppingGateway`; `ShoppingClient` is the
//! reqwest implementation against the Naver shopping search API.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod client;
pub mod request;

pub use client::ShoppingClient;

/// Items requested per search. One request is made per queued term.
pub const PAGE_SIZE: u32 = 20;
pub const START_OFFSET: u32 = 1;

#[derive(Debug, Error)]
pub enum ShoppingError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("HTTP error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Marketplace result ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShoppingSort {
    /// Relevance to the query.
    #[default]
    Sim,
    Date,
    /// Price ascending.
    Asc,
    /// Price descending.
    Dsc,
}

impl ShoppingSort {
    pub fn as_str(&self) -> &'static str {
        match self {
            ShoppingSort::Sim => "sim",
            ShoppingSort::Date => "date",
            ShoppingSort::Asc => "asc",
            ShoppingSort::Dsc => "dsc",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ShoppingQuery {
    pub query: String,
    pub display: u32,
    pub start: u32,
    pub sort: ShoppingSort,
}

impl ShoppingQuery {
    /// First page of relevance-sorted results for `term`.
    pub fn first_page(term: &str) -> Self {
        Self {
            query: term.to_string(),
            display: PAGE_SIZE,
            start: START_OFFSET,
            sort: ShoppingSort::Sim,
        }
    }
}

/// One marketplace listing as returned by the search API.
/// Missing fields default to empty so one odd item can't fail the page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ShoppingItem {
    pub title: String,
    pub link: String,
    pub image: String,
    pub lprice: String,
    pub product_id: String,
    pub mall_name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ShoppingPage {
    pub total: u64,
    pub items: Vec<ShoppingItem>,
}

#[async_trait]
pub trait ShoppingGateway: Send + Sync {
    async fn search(&self, query: &ShoppingQuery) -> Result<ShoppingPage, ShoppingError>;
}
