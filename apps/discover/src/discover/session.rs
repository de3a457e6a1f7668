use std::collections::VecDeque;
use std::str::FromStr;
use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::algorithm::{
    clean_title, combine_with_category, format_price, mix_search_terms, strip_category,
    MixingWeights,
};
use crate::models::goods::GoodsRecord;
use crate::models::pet::{PetCategory, PetContext, PetKeywordProfile};
use crate::shopping::{ShoppingError, ShoppingGateway, ShoppingItem, ShoppingQuery};
use crate::store::{GoodsFilter, SortOrder, Store};

/// How many terms a session mixes when the caller doesn't say.
pub const DEFAULT_TERM_COUNT: usize = 4;

/// Which end of the priority-ordered queue `fetch_next` takes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QueueOrder {
    /// Highest-priority term first.
    #[default]
    PriorityFirst,
    /// Last term first; lowest priority is searched first.
    Lifo,
}

impl FromStr for QueueOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "priority" | "priority_first" | "fifo" => Ok(QueueOrder::PriorityFirst),
            "lifo" => Ok(QueueOrder::Lifo),
            other => Err(format!("unknown queue order '{other}' (expected 'priority' or 'lifo')")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DiscoverOptions {
    pub term_count: usize,
    pub queue_order: QueueOrder,
    pub weights: MixingWeights,
}

impl Default for DiscoverOptions {
    fn default() -> Self {
        Self {
            term_count: DEFAULT_TERM_COUNT,
            queue_order: QueueOrder::default(),
            weights: MixingWeights::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Idle,
    ContextLoaded,
    Ready,
    Exhausted,
}

/// Result of draining one queued term.
#[derive(Debug)]
pub enum FetchOutcome {
    /// Nothing left to search; no request was made.
    QueueEmpty,
    /// The marketplace answered with zero items.
    Empty { term: String },
    Failed { term: String, error: ShoppingError },
    Fetched {
        term: String,
        /// Items the marketplace returned.
        item_count: usize,
        /// Items that survived normalization and were appended to the session.
        added: usize,
    },
}

impl FetchOutcome {
    pub fn term(&self) -> Option<&str> {
        match self {
            FetchOutcome::QueueEmpty => None,
            FetchOutcome::Empty { term }
            | FetchOutcome::Failed { term, .. }
            | FetchOutcome::Fetched { term, .. } => Some(term),
        }
    }

    /// `(success, error, item_count)` as reported to completion callbacks.
    pub fn into_parts(self) -> (bool, Option<ShoppingError>, Option<usize>) {
        match self {
            FetchOutcome::QueueEmpty | FetchOutcome::Empty { .. } => (false, None, None),
            FetchOutcome::Failed { error, .. } => (false, Some(error), None),
            FetchOutcome::Fetched { item_count, .. } => (true, None, Some(item_count)),
        }
    }
}

/// One discovery session: loads the user's context for a category, mixes it
/// into a queue of search terms, and drains that queue one marketplace search
/// at a time. Fetched goods accumulate here; nothing is persisted.
pub struct DiscoverSession {
    ctx: PetContext,
    store: Arc<dyn Store>,
    shopping: Arc<dyn ShoppingGateway>,
    options: DiscoverOptions,
    state: SessionState,
    my_goods: Vec<GoodsRecord>,
    search_words: Vec<String>,
    keywords: Option<PetKeywordProfile>,
    recommended: Vec<String>,
    queue: VecDeque<String>,
    fetched: Vec<GoodsRecord>,
}

impl DiscoverSession {
    pub fn new(
        ctx: PetContext,
        store: Arc<dyn Store>,
        shopping: Arc<dyn ShoppingGateway>,
        options: DiscoverOptions,
    ) -> Self {
        Self {
            ctx,
            store,
            shopping,
            options,
            state: SessionState::Idle,
            my_goods: Vec::new(),
            search_words: Vec::new(),
            keywords: None,
            recommended: Vec::new(),
            queue: VecDeque::new(),
            fetched: Vec::new(),
        }
    }

    pub fn context(&self) -> PetContext {
        self.ctx
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Terms from the last mix, priority order, without the category label.
    pub fn recommended(&self) -> &[String] {
        &self.recommended
    }

    /// Remaining queries in the order they will be searched.
    pub fn pending_terms(&self) -> Vec<String> {
        match self.options.queue_order {
            QueueOrder::PriorityFirst => self.queue.iter().cloned().collect(),
            QueueOrder::Lifo => self.queue.iter().rev().cloned().collect(),
        }
    }

    /// Everything fetched so far in this session.
    pub fn goods(&self) -> &[GoodsRecord] {
        &self.fetched
    }

    /// Moves the session to another category. Loaded context, the queue and
    /// fetched goods all belong to the old category and are dropped.
    pub fn switch_context(&mut self, ctx: PetContext) {
        if ctx == self.ctx {
            return;
        }
        self.ctx = ctx;
        self.state = SessionState::Idle;
        self.my_goods.clear();
        self.search_words.clear();
        self.keywords = None;
        self.recommended.clear();
        self.queue.clear();
        self.fetched.clear();
    }

    /// Category of the most recently saved pet profile.
    pub async fn fetch_pet(&self) -> Option<PetCategory> {
        match self.store.fetch_latest_profile().await {
            Ok(profile) => profile.map(|p| p.pet),
            Err(e) => {
                warn!("Failed to fetch pet: {e}");
                None
            }
        }
    }

    pub async fn fetch_my_goods(&mut self) -> Vec<GoodsRecord> {
        let filter = GoodsFilter::all(self.ctx.pet);
        match self.store.fetch_goods(filter, SortOrder::OldestFirst).await {
            Ok(goods) => {
                self.my_goods = goods.clone();
                goods
            }
            Err(e) => {
                warn!("Failed to fetch my goods for {}: {e}", self.ctx.pet);
                Vec::new()
            }
        }
    }

    pub async fn fetch_search_words(&mut self) -> Vec<String> {
        match self.store.fetch_search_words(self.ctx.pet).await {
            Ok(records) => {
                let words: Vec<String> = records.into_iter().map(|r| r.word).collect();
                self.search_words = words.clone();
                words
            }
            Err(e) => {
                warn!("Failed to fetch search words for {}: {e}", self.ctx.pet);
                Vec::new()
            }
        }
    }

    pub async fn fetch_pet_keywords(&mut self) -> Option<PetKeywordProfile> {
        match self.store.fetch_profile(self.ctx.pet).await {
            Ok(profile) => {
                self.keywords = profile.clone();
                profile
            }
            Err(e) => {
                warn!("Failed to fetch pet keywords for {}: {e}", self.ctx.pet);
                None
            }
        }
    }

    /// Loads profile, history and saved goods for the session's category.
    /// Only an idle session loads; a used session has to switch category first.
    pub async fn load_context(&mut self) {
        if self.state != SessionState::Idle {
            warn!("Not loading context for {} in state {:?}", self.ctx.pet, self.state);
            return;
        }
        self.fetch_pet_keywords().await;
        self.fetch_search_words().await;
        self.fetch_my_goods().await;
        self.state = SessionState::ContextLoaded;
        debug!(
            "Loaded discover context for {}: {} keywords, {} searches, {} goods",
            self.ctx.pet,
            self.keywords.as_ref().map_or(0, |k| k.keywords.len()),
            self.search_words.len(),
            self.my_goods.len()
        );
    }

    /// Mixes the configured number of terms into the queue.
    pub fn mixed_word(&mut self) -> Vec<String> {
        self.build_queue(self.options.term_count)
    }

    /// Mixes at most `count` terms, tags them with the category and replaces
    /// the queue. Returns the untagged terms in priority order.
    ///
    /// Only a session with freshly loaded context builds a queue; in any other
    /// state the queue and state are left as they are and nothing is returned.
    pub fn build_queue(&mut self, count: usize) -> Vec<String> {
        let pet = self.ctx.pet;
        if self.state != SessionState::ContextLoaded {
            warn!("Not building a queue for {pet} in state {:?}", self.state);
            return Vec::new();
        }
        let profile = self
            .keywords
            .clone()
            .unwrap_or_else(|| PetKeywordProfile::empty(pet));
        let goods_terms: Vec<String> = self
            .my_goods
            .iter()
            .map(|g| strip_category(pet, &g.search_word))
            .collect();

        let mixed = mix_search_terms(
            &self.search_words,
            &profile,
            &goods_terms,
            count,
            &self.options.weights,
        );
        self.queue = combine_with_category(pet, &mixed).into();
        self.recommended = mixed.clone();
        self.state = SessionState::Ready;

        info!("Built discover queue for {pet}: {:?}", self.pending_terms());
        mixed
    }

    fn pop_term(&mut self) -> Option<String> {
        match self.options.queue_order {
            QueueOrder::PriorityFirst => self.queue.pop_front(),
            QueueOrder::Lifo => self.queue.pop_back(),
        }
    }

    /// Pops one term and runs one marketplace search for it.
    ///
    /// The term is removed before the request goes out: dropping this future
    /// mid-request loses the term rather than re-queueing it.
    pub async fn fetch_next(&mut self) -> FetchOutcome {
        let Some(term) = self.pop_term() else {
            if self.state == SessionState::Ready {
                self.state = SessionState::Exhausted;
            }
            return FetchOutcome::QueueEmpty;
        };
        if self.queue.is_empty() {
            self.state = SessionState::Exhausted;
        }

        let page = match self.shopping.search(&ShoppingQuery::first_page(&term)).await {
            Ok(page) => page,
            Err(error) => {
                warn!("Shopping search for '{term}' failed: {error}");
                return FetchOutcome::Failed { term, error };
            }
        };

        if page.items.is_empty() {
            info!("Shopping search for '{term}' returned no items");
            return FetchOutcome::Empty { term };
        }

        let item_count = page.items.len();
        let before = self.fetched.len();
        for item in &page.items {
            match normalize_item(item, &term, self.ctx.pet) {
                Some(record) => self.fetched.push(record),
                None => debug!("Skipping unusable item '{}' for '{term}'", item.product_id),
            }
        }
        let added = self.fetched.len() - before;

        info!("Fetched {item_count} items for '{term}' ({added} kept)");
        FetchOutcome::Fetched {
            term,
            item_count,
            added,
        }
    }
}

/// Maps one marketplace listing to a goods record, or `None` when the item
/// lacks an id, a link, or any usable title.
pub fn normalize_item(
    item: &ShoppingItem,
    search_word: &str,
    pet: PetCategory,
) -> Option<GoodsRecord> {
    let product_id = item.product_id.trim();
    let link = item.link.trim();
    if product_id.is_empty() || link.is_empty() {
        return None;
    }
    let title = clean_title(&item.title, true);
    if title.is_empty() {
        return None;
    }

    let shopping_mall = match item.mall_name.as_str() {
        "네이버" => "네이버쇼핑".to_string(),
        other => other.to_string(),
    };

    Some(GoodsRecord {
        pet,
        title,
        link: link.to_string(),
        image: item.image.clone(),
        is_favorite: false,
        is_latest: false,
        price: format_price(item.lprice.trim()),
        product_id: product_id.to_string(),
        search_word: search_word.to_string(),
        shopping_mall,
        created_at: Utc::now(),
    })
}
