use std::sync::Arc;

use stockbook_auth::TokenIssuer;
use stockbook_infra::{AuthService, CatalogService, InventoryStore, LedgerEngine, LedgerQuery};

/// Application services shared by every handler.
///
/// All of them sit on the same store handle, built once in `main`.
#[derive(Clone)]
pub struct AppServices {
    pub catalog: CatalogService,
    pub engine: LedgerEngine,
    pub query: LedgerQuery,
    pub auth: AuthService,
}

pub fn build_services(store: Arc<dyn InventoryStore>, tokens: Arc<dyn TokenIssuer>) -> AppServices {
    AppServices {
        catalog: CatalogService::new(store.clone()),
        engine: LedgerEngine::new(store.clone()),
        query: LedgerQuery::new(store.clone()),
        auth: AuthService::new(store, tokens),
    }
}
