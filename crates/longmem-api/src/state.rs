//! Application state wiring the memory service together.
//!
//! The service is generic over embedder and object store; AppState pins it to
//! fastembed and whichever storage backend `config.toml` selects.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use secrecy::SecretString;

use longmem_core::memory::service::MemoryService;
use longmem_core::memory::tools::MemoryTools;
use longmem_core::storage::box_object_store::BoxObjectStore;
use longmem_infra::config::{load_config, resolve_data_dir};
use longmem_infra::storage::dial::DialObjectStore;
use longmem_infra::storage::filesystem::FilesystemObjectStore;
use longmem_infra::storage::memory::InMemoryObjectStore;
use longmem_infra::vector::embedder::FastEmbedder;
use longmem_types::config::{LongMemConfig, StorageBackend};

/// Environment variable holding the DIAL API key.
pub const DIAL_API_KEY_ENV: &str = "DIAL_API_KEY";

/// User key for local backends when `--user` is not given.
pub const LOCAL_USER: &str = "local";

pub type ConcreteMemoryService = MemoryService<FastEmbedder, BoxObjectStore>;
pub type ConcreteMemoryTools = MemoryTools<FastEmbedder, BoxObjectStore>;

pub struct AppState {
    pub memory_service: Arc<ConcreteMemoryService>,
    pub tools: ConcreteMemoryTools,
    pub config: LongMemConfig,
    pub data_dir: PathBuf,
    /// Whose memories every command operates on.
    pub user_key: String,
}

impl AppState {
    /// Load config, open the storage backend, load the embedding model.
    pub async fn init(user: Option<String>) -> Result<Self> {
        let data_dir = resolve_data_dir();
        tokio::fs::create_dir_all(&data_dir)
            .await
            .with_context(|| format!("Failed to create data directory {}", data_dir.display()))?;

        let config = load_config(&data_dir).await;
        let (store, default_user) = open_store(&config, &data_dir).await?;
        let user_key = user.unwrap_or(default_user);
        tracing::debug!(user = %user_key, backend = ?config.storage.backend, "storage ready");

        let embedder = FastEmbedder::load(&config.embedding)
            .await
            .context("Failed to load embedding model")?;

        let memory_service = Arc::new(MemoryService::new(embedder, store, &config));
        let tools = MemoryTools::new(Arc::clone(&memory_service), config.search.clone());

        Ok(Self {
            memory_service,
            tools,
            config,
            data_dir,
            user_key,
        })
    }

    /// Clamp a requested result count to the configured range.
    pub fn top_k(&self, requested: Option<usize>) -> usize {
        requested
            .unwrap_or(self.config.search.default_top_k)
            .clamp(1, self.config.search.max_top_k.max(1))
    }
}

/// Build the configured object store and the user key it implies.
async fn open_store(config: &LongMemConfig, data_dir: &std::path::Path) -> Result<(BoxObjectStore, String)> {
    match config.storage.backend {
        StorageBackend::Filesystem => {
            let root = config
                .storage
                .root_dir
                .clone()
                .unwrap_or_else(|| data_dir.join("objects"));
            Ok((
                BoxObjectStore::new(FilesystemObjectStore::new(root)),
                LOCAL_USER.to_string(),
            ))
        }
        StorageBackend::Memory => Ok((
            BoxObjectStore::new(InMemoryObjectStore::new()),
            LOCAL_USER.to_string(),
        )),
        StorageBackend::Dial => {
            let Some(endpoint) = config.storage.endpoint.as_deref() else {
                bail!("storage.endpoint must be set in config.toml for the dial backend");
            };
            let api_key = std::env::var(DIAL_API_KEY_ENV)
                .with_context(|| format!("{DIAL_API_KEY_ENV} must be set for the dial backend"))?;

            let store = DialObjectStore::new(
                endpoint,
                SecretString::from(api_key),
                Duration::from_secs(config.storage.timeout_secs),
            );
            let home = store
                .appdata_home()
                .await
                .context("Failed to resolve DIAL appdata home")?;
            Ok((BoxObjectStore::new(store), home))
        }
    }
}
