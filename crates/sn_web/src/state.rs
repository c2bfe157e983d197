use std::sync::Arc;
use sn_core::Storage;
use sn_scrapers::RecencyWindowCrawler;
use crate::session::SessionStore;

/// Everything a handler needs, built once at startup.
#[derive(Clone)]
pub struct AppState {
    pub storage: Arc<dyn Storage>,
    pub crawler: Arc<RecencyWindowCrawler>,
    pub sessions: SessionStore,
}

impl AppState {
    pub fn new(storage: Arc<dyn Storage>, crawler: Arc<RecencyWindowCrawler>) -> Self {
        Self {
            storage,
            crawler,
            sessions: SessionStore::default(),
        }
    }
}
