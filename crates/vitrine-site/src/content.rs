//! Page content from the backing Supabase project.
//!
//! Pages live in a `pages` table exposed through PostgREST. Each row carries
//! its block array as raw JSON, which is handed to the renderer untouched.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Request timeout for the content service.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Columns fetched for a full page.
const PAGE_COLUMNS: &str = "slug,title,blocks,updated_at";

/// Columns fetched for the page index.
const SUMMARY_COLUMNS: &str = "slug,title,updated_at";

/// One page row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    pub slug: String,
    #[serde(default)]
    pub title: String,
    /// Stored block array, passed to the renderer as-is.
    #[serde(default)]
    pub blocks: Value,
    #[serde(default)]
    pub updated_at: Option<String>,
}

/// Page index entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageSummary {
    pub slug: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub updated_at: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum ContentError {
    /// `SUPABASE_URL` or `SUPABASE_ANON_KEY` is empty.
    #[error("content service is not configured")]
    NotConfigured,

    #[error("content request failed: {0}")]
    Http(#[from] reqwest::Error),
}

/// Read access to stored pages.
#[async_trait]
pub trait ContentSource: Send + Sync {
    async fn fetch_page(&self, slug: &str) -> Result<Option<Page>, ContentError>;

    async fn list_pages(&self) -> Result<Vec<PageSummary>, ContentError>;
}

/// [`ContentSource`] over the Supabase REST API.
#[derive(Debug, Clone)]
pub struct SupabaseSource {
    client: reqwest::Client,
    base_url: String,
    anon_key: String,
}

impl SupabaseSource {
    /// Build the client. Empty settings are accepted here and fail on first use.
    pub fn new(base_url: &str, anon_key: &str) -> Result<Self, ContentError> {
        let client = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            anon_key: anon_key.to_string(),
        })
    }

    pub fn is_configured(&self) -> bool {
        !self.base_url.is_empty() && !self.anon_key.is_empty()
    }

    fn table_url(&self) -> String {
        format!("{}/rest/v1/pages", self.base_url)
    }

    fn get(&self) -> Result<reqwest::RequestBuilder, ContentError> {
        if !self.is_configured() {
            return Err(ContentError::NotConfigured);
        }
        Ok(self
            .client
            .get(self.table_url())
            .header("apikey", &self.anon_key)
            .bearer_auth(&self.anon_key))
    }

    fn page_request(&self, slug: &str) -> Result<reqwest::RequestBuilder, ContentError> {
        Ok(self.get()?.query(&[
            ("select", PAGE_COLUMNS.to_string()),
            ("slug", format!("eq.{slug}")),
            ("limit", "1".to_string()),
        ]))
    }

    fn index_request(&self) -> Result<reqwest::RequestBuilder, ContentError> {
        Ok(self.get()?.query(&[
            ("select", SUMMARY_COLUMNS),
            ("order", "updated_at.desc.nullslast"),
        ]))
    }
}

#[async_trait]
impl ContentSource for SupabaseSource {
    async fn fetch_page(&self, slug: &str) -> Result<Option<Page>, ContentError> {
        let rows: Vec<Page> = self
            .page_request(slug)?
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        tracing::debug!(slug = %slug, found = !rows.is_empty(), "page fetched");
        Ok(rows.into_iter().next())
    }

    async fn list_pages(&self) -> Result<Vec<PageSummary>, ContentError> {
        let rows: Vec<PageSummary> = self
            .index_request()?
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        tracing::debug!(count = rows.len(), "page index fetched");
        Ok(rows)
    }
}
