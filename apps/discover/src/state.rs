use std::sync::Arc;

use crate::config::Config;
use crate::discover::handle::SessionRegistry;
use crate::shopping::ShoppingGateway;
use crate::store::Store;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Postgres in deployment, in-memory when no DATABASE_URL is configured.
    pub store: Arc<dyn Store>,
    pub shopping: Arc<dyn ShoppingGateway>,
    pub config: Config,
    /// Live discovery sessions, one pipeline each.
    pub sessions: Arc<SessionRegistry>,
}
