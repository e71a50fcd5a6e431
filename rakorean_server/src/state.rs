use tokio::sync::RwLock;

use std::sync::Arc;

use rakorean_core::{identity::Identity, sync::LoadSummary, SyncEngine};
use rakorean_supabase::SupabaseStore;
use supabase_client::SupabaseConfig;

use crate::error::Result;

pub type Engine = SyncEngine<SupabaseStore>;

#[derive(Clone)]
pub struct AppState {
    pub config: SupabaseConfig,
    /// Engine of the current page session. Replaced as a whole on sign in and sign out.
    engine: Arc<RwLock<Arc<Engine>>>,
}

impl AppState {
    /// Start out anonymous. `start_session` opens the real session.
    pub fn new(config: SupabaseConfig) -> Result<Self> {
        let engine = Self::build_engine(&config, Identity::anonymous())?;
        Ok(Self {
            config,
            engine: Arc::new(RwLock::new(engine)),
        })
    }

    pub async fn engine(&self) -> Arc<Engine> {
        self.engine.read().await.clone()
    }

    /// Start a new session with an empty cache and load it.
    pub async fn start_session(&self, identity: Identity) -> Result<LoadSummary> {
        let engine = Self::build_engine(&self.config, identity)?;
        *self.engine.write().await = engine.clone();
        tracing::info!(
            "Started session for {}",
            engine.identity().principal_id().unwrap_or("anonymous")
        );
        Ok(engine.load_all().await?)
    }

    fn build_engine(config: &SupabaseConfig, identity: Identity) -> Result<Arc<Engine>> {
        let store = SupabaseStore::new(config, &identity)?;
        Ok(Arc::new(SyncEngine::new(store, identity)))
    }
}
