//! Shared application state

use crate::config::Config;
use crate::store::Store;

/// State handed to every request handler
pub struct AppState<S: Store> {
    pub store: S,
    pub config: Config,
}

impl<S: Store> AppState<S> {
    pub fn new(store: S, config: Config) -> Self {
        Self { store, config }
    }
}
