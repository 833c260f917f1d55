//! Error types for the HTTP server.

use std::path::PathBuf;

use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use paul_components::escape_html;
use paul_site::SiteError;

/// Server error type.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Neither a page nor a public file exists at the path.
    #[error("Page not found: {0}")]
    PageNotFound(String),

    /// Requested file escapes the public directory.
    #[error("Forbidden path: {}", .0.display())]
    Forbidden(PathBuf),

    /// Page failed to render.
    #[error("Render error: {0}")]
    Render(#[from] SiteError),

    /// Host and port do not form a socket address.
    #[error("Invalid listen address: {0}")]
    InvalidAddress(String),

    /// File watcher could not start.
    #[error("File watcher error: {0}")]
    Watch(#[from] notify::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ServerError {
    fn status(&self) -> StatusCode {
        match self {
            Self::PageNotFound(_) => StatusCode::NOT_FOUND,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::Render(SiteError::PageNotFound(_) | SiteError::InvalidRoute(_)) => {
                StatusCode::NOT_FOUND
            }
            Self::Render(_) | Self::InvalidAddress(_) | Self::Watch(_) | Self::Io(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        }
        let reason = status.canonical_reason().unwrap_or("Error");
        let body = format!(
            "<!DOCTYPE html>\n<html lang=\"en\">\n<head><meta charset=\"utf-8\"><title>{code} {reason}</title></head>\n\
             <body><h1>{code} {reason}</h1><p>{message}</p></body>\n</html>\n",
            code = status.as_u16(),
            message = escape_html(&self.to_string()),
        );

        (
            status,
            [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
            body,
        )
            .into_response()
    }
}
