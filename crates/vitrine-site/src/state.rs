//! Application state shared across all request handlers.

use std::sync::Arc;

use anyhow::Context;
use serde_json::Value;

use crate::cache::FetchCache;
use crate::config::Config;
use crate::contact::{ContactService, EmailJsMailer, JsonFileUsageStore, MemoryUsageStore, UsageStore};
use crate::content::{ContentSource, SupabaseSource};

/// Type alias for the page cache. Values are page rows and the page index as JSON.
pub type PageCache = FetchCache<Value>;

/// Shared application state available to all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Arc<Config>,

    /// Content service reads, keyed `page:{slug}` and `pages:index`.
    pub cache: PageCache,

    /// Page storage.
    pub content: Arc<dyn ContentSource>,

    /// Contact form pipeline.
    pub contact: Arc<ContactService>,
}

impl AppState {
    /// Create a new application state from configuration.
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let content = SupabaseSource::new(&config.supabase_url, &config.supabase_anon_key)
            .context("failed to build content client")?;

        let store: Arc<dyn UsageStore> = match &config.usage_path {
            Some(path) => Arc::new(JsonFileUsageStore::open(path)),
            None => Arc::new(MemoryUsageStore::new()),
        };

        let mailer = EmailJsMailer::new().context("failed to build email client")?;
        let contact = ContactService::new(store, Arc::new(mailer), config.email.clone());

        Ok(Self::with_parts(config, Arc::new(content), contact))
    }

    /// Assemble state from already-built parts.
    pub fn with_parts(
        config: Config,
        content: Arc<dyn ContentSource>,
        contact: ContactService,
    ) -> Self {
        let cache = FetchCache::new(config.cache_ttl, config.sweep_policy);

        tracing::info!(
            cache_ttl_secs = config.cache_ttl.as_secs(),
            sweep_policy = ?config.sweep_policy,
            "application state initialized"
        );

        Self {
            config: Arc::new(config),
            cache,
            content,
            contact: Arc::new(contact),
        }
    }
}
