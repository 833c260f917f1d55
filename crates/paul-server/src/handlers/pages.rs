//! Page serving.
//!
//! Every request that matches no other route lands here: pages are
//! rendered fresh from the current site, anything else is looked up in
//! the public directory.

use std::sync::Arc;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, Uri, header};
use axum::response::{Html, IntoResponse, Response};
use md5::{Digest, Md5};
use paul_site::{DocumentExtras, Site};

use crate::app::LIVE_RELOAD_SCRIPT_PATH;
use crate::error::ServerError;
use crate::state::AppState;
use crate::static_files;

/// Fallback handler: page, then public file, then 404.
pub(crate) async fn serve(
    State(state): State<Arc<AppState>>,
    uri: Uri,
    headers: HeaderMap,
) -> Result<Response, ServerError> {
    let path = uri.path();
    let site = state.site.get();

    if site.page(path).is_some() {
        return render_page(&state, &site, path, &headers);
    }

    if let Some(file) = static_files::resolve(&state.public_dir, path)? {
        return static_files::serve_file(&file).await;
    }

    Err(ServerError::PageNotFound(path.to_owned()))
}

/// Render a page, answering `304 Not Modified` when the client's `ETag`
/// still matches.
fn render_page(
    state: &AppState,
    site: &Site,
    route: &str,
    headers: &HeaderMap,
) -> Result<Response, ServerError> {
    let extras = if state.live_reload_enabled() {
        DocumentExtras {
            head: Vec::new(),
            body: vec![format!("<script src=\"{LIVE_RELOAD_SCRIPT_PATH}\"></script>")],
        }
    } else {
        DocumentExtras::default()
    };
    let html = site.render_page_with(route, &extras)?;

    let etag = page_etag(&state.version, route, &html);
    if client_has(headers, &etag) {
        return Ok(StatusCode::NOT_MODIFIED.into_response());
    }

    Ok((
        [
            (header::ETAG, etag),
            (header::CACHE_CONTROL, "no-cache".to_owned()),
        ],
        Html(html),
    )
        .into_response())
}

/// Strong validator over the server version, the route and the markup,
/// as 16 quoted hex digits.
fn page_etag(version: &str, route: &str, html: &str) -> String {
    let mut hasher = Md5::new();
    for part in [version, route, html] {
        hasher.update(part.as_bytes());
        hasher.update([0u8]);
    }
    let digest = hex::encode(hasher.finalize());
    format!("\"{}\"", &digest[..16])
}

/// Whether any tag in `If-None-Match` (or `*`) matches `etag`.
fn client_has(headers: &HeaderMap, etag: &str) -> bool {
    headers
        .get_all(header::IF_NONE_MATCH)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .map(str::trim)
        .any(|tag| tag == "*" || tag.trim_start_matches("W/") == etag)
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;
    use pretty_assertions::assert_eq;

    use super::*;

    fn with_if_none_match(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::IF_NONE_MATCH, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_etag_changes_with_any_input() {
        let base = page_etag("0.1.0", "/", "<h1>Hi</h1>");

        assert_ne!(base, page_etag("0.2.0", "/", "<h1>Hi</h1>"));
        assert_ne!(base, page_etag("0.1.0", "/about", "<h1>Hi</h1>"));
        assert_ne!(base, page_etag("0.1.0", "/", "<h1>Bye</h1>"));
    }

    #[test]
    fn test_etag_parts_are_separated() {
        assert_ne!(page_etag("1", "/a", "b"), page_etag("1", "/", "ab"));
    }

    #[test]
    fn test_etag_shape() {
        let etag = page_etag("0.1.0", "/", "");

        assert_eq!(etag.len(), 18);
        assert!(etag.starts_with('"') && etag.ends_with('"'));
    }

    #[test]
    fn test_client_has() {
        let etag = page_etag("0.1.0", "/", "x");
        let listed = format!("\"other\", W/{etag}");

        assert!(client_has(&with_if_none_match(&listed), &etag));
        assert!(client_has(&with_if_none_match("*"), &etag));
        assert!(!client_has(&with_if_none_match("\"other\""), &etag));
        assert!(!client_has(&HeaderMap::new(), &etag));
    }
}
