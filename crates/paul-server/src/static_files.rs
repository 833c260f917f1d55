//! Static file serving from the project's `public/` directory.

use std::path::{Component, Path, PathBuf};

use axum::http::header;
use axum::response::{IntoResponse, Response};

use crate::error::ServerError;

/// Map a request path onto a file under `public_dir`.
///
/// Directories resolve to their `index.html`. Returns `Ok(None)` when no
/// such file exists.
///
/// # Errors
///
/// Returns [`ServerError::Forbidden`] for paths that would leave
/// `public_dir`.
pub(crate) fn resolve(public_dir: &Path, request_path: &str) -> Result<Option<PathBuf>, ServerError> {
    let relative = Path::new(request_path.trim_start_matches('/'));
    let escapes = relative
        .components()
        .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
    if escapes {
        return Err(ServerError::Forbidden(relative.to_path_buf()));
    }

    let mut path = public_dir.join(relative);
    if path.is_dir() {
        path.push("index.html");
    }
    Ok(path.is_file().then_some(path))
}

/// Read a file and respond with a MIME type guessed from its extension.
pub(crate) async fn serve_file(path: &Path) -> Result<Response, ServerError> {
    let content = tokio::fs::read(path).await?;
    let mime = mime_guess::from_path(path).first_or_octet_stream();
    tracing::debug!(path = %path.display(), mime = %mime, "Serving public file");
    Ok(([(header::CONTENT_TYPE, mime.to_string())], content).into_response())
}
