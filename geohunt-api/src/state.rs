//! Shared application state for Axum routers.

use std::sync::Arc;
use std::time::Instant;

use geohunt_engine::UnlockEngine;
use geohunt_flavor::FlavorService;

/// Application-wide state shared across all routes.
#[derive(Clone)]
pub struct AppState {
    /// Owns the progress store, the catalog and the per-player locks.
    pub engine: Arc<UnlockEngine>,
    /// Hints and trivia. Always answers, falling back to static text.
    pub flavor: FlavorService,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(engine: Arc<UnlockEngine>, flavor: FlavorService) -> Self {
        Self {
            engine,
            flavor,
            start_time: Instant::now(),
        }
    }
}

crate::impl_from_ref!(Arc<UnlockEngine>, engine);
crate::impl_from_ref!(FlavorService, flavor);
crate::impl_from_ref!(Instant, start_time);

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::FromRef;
    use geohunt_test_utils::{fixtures, InMemoryProgressStore};

    #[test]
    fn test_handlers_share_one_engine() {
        let engine = Arc::new(UnlockEngine::new(
            Arc::new(InMemoryProgressStore::new()),
            Arc::new(fixtures::campus_catalog()),
        ));
        let state = AppState::new(engine.clone(), FlavorService::fallback_only());

        let extracted = <Arc<UnlockEngine> as FromRef<AppState>>::from_ref(&state);
        assert!(Arc::ptr_eq(&extracted, &engine));
        assert!(!<FlavorService as FromRef<AppState>>::from_ref(&state).has_provider());
        assert_eq!(<Instant as FromRef<AppState>>::from_ref(&state), state.start_time);
    }
}
