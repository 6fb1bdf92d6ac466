//! Page reads and server-rendered previews.
//!
//! All reads go through the shared [`PageCache`](crate::state::PageCache):
//! `pages:index` for the listing and `page:{slug}` per page. Missing pages
//! and content service failures are never cached.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde_json::Value;

use crate::content::Page;
use crate::error::SiteError;
use crate::state::AppState;

/// Cache key for the page listing.
pub const INDEX_KEY: &str = "pages:index";

/// Longest accepted slug.
const MAX_SLUG_LEN: usize = 128;

/// Preview pages: inline styles, images and video embeds only. Ad markup is
/// inert here since scripts are blocked.
pub const PREVIEW_CSP: &str = "default-src 'none'; style-src 'unsafe-inline'; img-src https: http: data:; frame-src https://www.youtube.com; form-action 'none'; frame-ancestors 'none'";

/// Browser cache lifetime for previews, in seconds.
const PREVIEW_MAX_AGE: u64 = 60;

/// Cache key for one page.
pub fn page_key(slug: &str) -> String {
    format!("page:{slug}")
}

fn validate_slug(slug: &str) -> Result<&str, SiteError> {
    let slug = slug.trim();
    let valid = !slug.is_empty()
        && slug.len() <= MAX_SLUG_LEN
        && slug
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');

    if valid {
        Ok(slug)
    } else {
        Err(SiteError::BadRequest(format!("invalid page slug: {slug:?}")))
    }
}

async fn load_page(state: &AppState, slug: &str) -> Result<Page, SiteError> {
    let content = state.content.clone();
    let value = state
        .cache
        .get_or_fetch_default(&page_key(slug), move || async move {
            let page = content
                .fetch_page(slug)
                .await?
                .ok_or_else(|| SiteError::NotFound(format!("page {slug}")))?;
            Ok::<_, SiteError>(serde_json::to_value(page)?)
        })
        .await?;

    Ok(serde_json::from_value(value)?)
}

/// `GET /api/pages`: page index.
pub async fn list_pages(State(state): State<AppState>) -> Result<Json<Value>, SiteError> {
    let content = state.content.clone();
    let index = state
        .cache
        .get_or_fetch_default(INDEX_KEY, move || async move {
            let pages = content.list_pages().await?;
            Ok::<_, SiteError>(serde_json::to_value(pages)?)
        })
        .await?;

    Ok(Json(index))
}

/// `GET /api/pages/{slug}`: one page row, blocks unrendered.
pub async fn get_page(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<Page>, SiteError> {
    let slug = validate_slug(&slug)?;
    Ok(Json(load_page(&state, slug).await?))
}

/// `GET /preview/{slug}`: standalone HTML rendering of a page.
pub async fn preview_page(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    request_headers: HeaderMap,
) -> Response {
    let site_name = state.config.site_name.clone();
    match render_preview(&state, &slug, &request_headers).await {
        Ok(response) => response,
        Err(err) => err.into_html_response(&site_name),
    }
}

async fn render_preview(
    state: &AppState,
    slug: &str,
    request_headers: &HeaderMap,
) -> Result<Response, SiteError> {
    let slug = validate_slug(slug)?;
    let page = load_page(state, slug).await?;

    let title = if page.title.trim().is_empty() {
        page.slug.as_str()
    } else {
        page.title.as_str()
    };
    let fragment = vitrine_core::render_blocks(&page.blocks);
    let html = vitrine_core::render_document(title, &state.config.site_name, &fragment).into_string();

    let s_maxage = state.cache.default_ttl().as_secs();
    Ok(build_response(&html, s_maxage, request_headers))
}

/// Wrap rendered HTML with security headers, an ETag and Cache-Control.
///
/// Answers `304 Not Modified` when the request's `If-None-Match` carries
/// the same ETag.
fn build_response(html: &str, s_maxage: u64, request_headers: &HeaderMap) -> Response {
    let mut headers = HeaderMap::new();

    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/html; charset=utf-8"),
    );

    // Security headers
    headers.insert(
        header::CONTENT_SECURITY_POLICY,
        HeaderValue::from_static(PREVIEW_CSP),
    );
    headers.insert(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    );
    headers.insert(header::X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));

    let cache_value = format!(
        "public, max-age={PREVIEW_MAX_AGE}, s-maxage={s_maxage}, stale-while-revalidate={s_maxage}"
    );
    if let Ok(val) = HeaderValue::from_str(&cache_value) {
        headers.insert(header::CACHE_CONTROL, val);
    }

    // ETag (xxHash of content)
    let hash = xxhash_rust::xxh3::xxh3_64(html.as_bytes());
    let etag = format!("\"{}\"", hex_fmt::HexFmt(&hash.to_be_bytes()));
    if let Ok(val) = HeaderValue::from_str(&etag) {
        headers.insert(header::ETAG, val);
    }

    let not_modified = request_headers
        .get(header::IF_NONE_MATCH)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.split(',').any(|candidate| candidate.trim() == etag));

    if not_modified {
        headers.remove(header::CONTENT_TYPE);
        return (StatusCode::NOT_MODIFIED, headers).into_response();
    }

    (StatusCode::OK, headers, html.to_string()).into_response()
}
