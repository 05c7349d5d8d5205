//! Cursor-following traversal of a platform's recipe listing.
//!
//! Each listing response embeds the locator of the next page (or nothing on
//! the last one). The walker keeps requesting until the cursor runs out and
//! returns every item in arrival order.

use serde::de::DeserializeOwned;
use std::collections::HashSet;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::error::FetchError;
use crate::http::join_url;
use crate::session::Session;

/// One decoded listing page.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Absolute URL, or a path relative to the listing's base; `None` on the last page.
    pub next: Option<String>,
}

impl<T> Page<T> {
    /// A listing that is never paginated.
    pub fn single(items: Vec<T>) -> Self {
        Self { items, next: None }
    }
}

#[derive(Error, Debug)]
pub enum WalkError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("Pagination cycle: {0} was already requested")]
    Cycle(String),

    #[error("Listing cancelled")]
    Cancelled,
}

/// Walk a paginated listing starting at `start_url`.
///
/// `cursor_base` is what relative `next` cursors are resolved against.
/// `decode` turns each raw page `P` into items plus the next cursor.
pub async fn walk_pages<P, T, D>(
    session: &Session,
    start_url: String,
    cursor_base: &str,
    cancel: &CancellationToken,
    decode: D,
) -> Result<Vec<T>, WalkError>
where
    P: DeserializeOwned,
    D: Fn(P) -> Page<T>,
{
    let mut items = Vec::new();
    let mut visited = HashSet::new();
    let mut next = Some(start_url);

    while let Some(url) = next.take() {
        if cancel.is_cancelled() {
            return Err(WalkError::Cancelled);
        }
        if !visited.insert(url.clone()) {
            return Err(WalkError::Cycle(url));
        }

        let raw: P = session.get_json(&url).await?;
        let page = decode(raw);
        tracing::debug!(url = %url, items = page.items.len(), has_next = page.next.is_some(), "fetched listing page");

        items.extend(page.items);
        next = page
            .next
            .filter(|cursor| !cursor.is_empty())
            .map(|cursor| resolve_cursor(cursor_base, &cursor));
    }

    Ok(items)
}

/// Resolve a `next` cursor into a URL to request.
///
/// Absolute URLs are used as-is. A path that already carries the base's own
/// path (e.g. `/api/recipes?page=2` against `http://host/api`) is resolved
/// against the host; anything else is appended to the base.
pub fn resolve_cursor(base: &str, cursor: &str) -> String {
    if url::Url::parse(cursor).is_ok() {
        return cursor.to_string();
    }

    if let Ok(base_url) = url::Url::parse(base) {
        let base_path = base_url.path().trim_end_matches('/');
        let carries_base_path = !base_path.is_empty()
            && cursor.starts_with(base_path)
            && matches!(cursor[base_path.len()..].chars().next(), Some('/') | Some('?'));
        if carries_base_path {
            if let Ok(joined) = base_url.join(cursor) {
                return joined.to_string();
            }
        }
    }

    join_url(base, cursor)
}
