//! Shared application state handed to every route through an `Extension`.

use std::sync::Arc;

use tracing::info;

use crate::config::AppConfig;
use crate::push::{DisabledPush, FcmSender, PushSender};
use crate::session::CookiePolicy;
use crate::store::{DocumentStore, MemoryStore, PgStore};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn DocumentStore>,
    pub push: Arc<dyn PushSender>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        push: Arc<dyn PushSender>,
        config: AppConfig,
    ) -> Self {
        Self {
            store,
            push,
            config: Arc::new(config),
        }
    }

    /// Wire up the configured backends.
    pub async fn from_config(config: AppConfig) -> anyhow::Result<Self> {
        let store: Arc<dyn DocumentStore> = match &config.database_url {
            Some(url) => Arc::new(PgStore::connect(url, config.database_max_connections).await?),
            None => {
                info!("APP_DATABASE_URL not set, using in-memory document store");
                Arc::new(MemoryStore::new())
            }
        };

        let push: Arc<dyn PushSender> = match &config.fcm {
            Some(fcm) => {
                info!("Push delivery via FCM project {}", fcm.project_id);
                Arc::new(FcmSender::new(fcm.clone()))
            }
            None => {
                info!("FCM not configured, notifications will fail");
                Arc::new(DisabledPush)
            }
        };

        Ok(Self::new(store, push, config))
    }

    pub fn cookie_policy(&self) -> CookiePolicy {
        CookiePolicy {
            max_age_secs: self.config.session_max_age_secs,
            secure: self.config.cookie_secure,
        }
    }
}
