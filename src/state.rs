use std::sync::Arc;

use crate::{auth::jwt::JwtService, config::AppConfig, store::SupportStore};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn SupportStore>,
    pub config: Arc<AppConfig>,
    pub jwt: JwtService,
}

impl AppState {
    pub fn new(store: Arc<dyn SupportStore>, config: AppConfig, jwt: JwtService) -> Self {
        Self {
            store,
            config: Arc::new(config),
            jwt,
        }
    }
}
