//! Block rendering endpoint used by the editor preview pane.

use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::response::Html;
use serde::Deserialize;
use serde_json::Value;

use crate::error::SiteError;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct RenderParams {
    /// Wrap the fragment in a full document with this title.
    pub title: Option<String>,
}

/// `POST /api/render`: render a raw block array to HTML.
///
/// An empty body renders the fallback fragment, as does any JSON that is
/// not an array. Only a body that is not JSON at all is rejected.
pub async fn render_handler(
    State(state): State<AppState>,
    Query(params): Query<RenderParams>,
    body: Bytes,
) -> Result<Html<String>, SiteError> {
    let blocks: Value = if body.iter().all(u8::is_ascii_whitespace) {
        Value::Null
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| SiteError::BadRequest(format!("body is not valid JSON: {e}")))?
    };

    let fragment = vitrine_core::render_blocks(&blocks);

    let html = match params.title.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
        Some(title) => {
            vitrine_core::render_document(title, &state.config.site_name, &fragment).into_string()
        }
        None => fragment,
    };

    Ok(Html(html))
}
