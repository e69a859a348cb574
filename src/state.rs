use std::sync::{Arc, Mutex};

use chrono::{NaiveDate, Utc};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::config::Config;
use crate::db::EventStore;
use crate::errors::AppError;
use crate::service::session::SessionRegistry;
use crate::service::workflow::{self, StylingContext};
use crate::models::Event;

/// Shared application state handed to every handler.
pub struct AppState {
    pub config: Config,
    pub store: Arc<dyn EventStore>,
    pub sessions: SessionRegistry,
    styling_rng: Mutex<StdRng>,
}

impl AppState {
    pub fn new(config: Config, store: Arc<dyn EventStore>) -> Self {
        let styling_rng = match config.styling_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self {
            sessions: SessionRegistry::new(config.logout_token_ttl),
            config,
            store,
            styling_rng: Mutex::new(styling_rng),
        }
    }

    pub fn today(&self) -> NaiveDate {
        Utc::now().date_naive()
    }

    /// Runs the approval transition with the shared random source.
    pub fn approve(&self, event: &mut Event) -> Result<bool, AppError> {
        let ctx = StylingContext {
            today: self.today(),
            media_base_url: &self.config.media_base_url,
        };
        let mut rng = self.styling_rng.lock().map_err(|_| AppError::InternalError)?;
        workflow::approve(event, &ctx, &mut *rng)
    }
}
