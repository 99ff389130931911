use std::path::PathBuf;
use std::sync::Arc;

use crate::app::{FeedskyError, Result};
use crate::bluesky::{BlueskyClient, SessionManager};
use crate::composer::Composer;
use crate::config::Config;
use crate::domain::Credentials;
use crate::fetcher::http_fetcher::{build_client, HttpFetcher};
use crate::fetcher::Fetcher;
use crate::normalizer::Normalizer;
use crate::preview::PreviewFetcher;
use crate::publisher::Publisher;
use crate::store::SqliteLedger;

/// Wires the ledger, the HTTP stack and the posting-service client together
/// for one run.
pub struct AppContext {
    pub config: Config,
    pub ledger: Arc<SqliteLedger>,
    pub fetcher: Arc<dyn Fetcher + Send + Sync>,
    pub normalizer: Normalizer,
    pub client: BlueskyClient,
}

impl AppContext {
    pub fn new(config: Config) -> Result<Self> {
        let db_path = match &config.ledger.path {
            Some(p) => p.clone(),
            None => Self::default_db_path()?,
        };

        let ledger = Arc::new(SqliteLedger::new(&db_path)?);
        Self::with_ledger(config, ledger)
    }

    pub fn in_memory(config: Config) -> Result<Self> {
        let ledger = Arc::new(SqliteLedger::in_memory()?);
        Self::with_ledger(config, ledger)
    }

    fn with_ledger(config: Config, ledger: Arc<SqliteLedger>) -> Result<Self> {
        let http = build_client(config.service.timeout())?;
        let fetcher: Arc<dyn Fetcher + Send + Sync> = Arc::new(HttpFetcher::with_client(http.clone()));
        let client = BlueskyClient::new(http, &config.service.base_url)?;

        Ok(Self {
            config,
            ledger,
            fetcher,
            normalizer: Normalizer::new(),
            client,
        })
    }

    pub fn session_manager(&self, credentials: Credentials) -> SessionManager {
        SessionManager::new(self.client.clone(), self.ledger.clone(), credentials)
    }

    pub fn publisher(&self, credentials: Credentials) -> Publisher {
        Publisher::new(
            self.ledger.clone(),
            self.session_manager(credentials),
            PreviewFetcher::new(self.fetcher.clone()),
            Composer::new(
                self.client.clone(),
                self.fetcher.clone(),
                self.config.service.language.clone(),
            ),
            self.client.clone(),
        )
    }

    fn default_db_path() -> Result<PathBuf> {
        let data_dir = dirs::data_dir()
            .ok_or_else(|| FeedskyError::Config("Could not find data directory".into()))?;
        let feedsky_dir = data_dir.join("feedsky");
        std::fs::create_dir_all(&feedsky_dir)?;
        Ok(feedsky_dir.join("ledger.db"))
    }
}
