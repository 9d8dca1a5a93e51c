use std::sync::Arc;

use crate::auth::token::TokenManager;
use bookstore_dal::Pool;

#[derive(Clone)]
pub struct AppState {
    state: Arc<AppStateInner>,
}

impl AppState {
    pub fn new(pool: Pool, tokens: TokenManager) -> Self {
        AppState {
            state: Arc::new(AppStateInner { pool, tokens }),
        }
    }

    pub fn pool(&self) -> &Pool {
        &self.state.pool
    }

    pub fn tokens(&self) -> &TokenManager {
        &self.state.tokens
    }
}

struct AppStateInner {
    pool: Pool,
    tokens: TokenManager,
}

impl axum::extract::FromRef<AppState> for () {
    fn from_ref(_state: &AppState) {}
}
