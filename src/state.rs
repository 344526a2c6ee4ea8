use std::sync::Arc;

use crate::config::Config;
use crate::database::Store;
use crate::services::email_service::Mailer;

/// Shared handles injected into every handler through `web::Data`
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub mailer: Arc<dyn Mailer>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, mailer: Arc<dyn Mailer>, config: Config) -> Self {
        Self {
            store,
            mailer,
            config: Arc::new(config),
        }
    }
}
