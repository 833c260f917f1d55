//! Route listing endpoint.
//!
//! Returns every page the preview server knows about.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use serde::Serialize;

use crate::state::AppState;

/// Response for GET /__paul/pages.
#[derive(Serialize)]
pub(crate) struct PagesResponse {
    /// Pages in route order.
    pages: Vec<PageEntry>,
}

/// One served page.
#[derive(Serialize)]
struct PageEntry {
    route: String,
    title: String,
}

/// Handle GET /__paul/pages.
pub(crate) async fn list_pages(State(state): State<Arc<AppState>>) -> Json<PagesResponse> {
    let site = state.site.get();
    let pages = site
        .routes()
        .into_iter()
        .filter_map(|route| {
            let page = site.page(&route)?;
            Some(PageEntry {
                route,
                title: page.meta.title,
            })
        })
        .collect();
    Json(PagesResponse { pages })
}
