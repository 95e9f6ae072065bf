use analyzer_backend_service::{BackendError, url::UrlError};
use askama::Template;
use axum::{
	http::StatusCode,
	response::{Html, IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;

use crate::{flash::Flash, views::ErrorPage};

#[derive(Debug, Error)]
pub enum WebError {
	#[error(transparent)]
	BackendError(BackendError),

	#[error("{0}")]
	NotFound(String),

	#[error("failed to render page: {0}")]
	RenderError(#[from] askama::Error),
	#[error("session error: {0}")]
	SessionError(#[from] tower_sessions::session::Error),
}

impl WebError {
	pub fn not_found(message: impl Into<String>) -> Self {
		Self::NotFound(message.into())
	}

	fn status(&self) -> StatusCode {
		match self {
			WebError::NotFound(_) => StatusCode::NOT_FOUND,
			_ => StatusCode::INTERNAL_SERVER_ERROR,
		}
	}
}

impl From<BackendError> for WebError {
	fn from(value: BackendError) -> Self {
		match value {
			BackendError::UrlError(UrlError::NotFound(id)) => Self::not_found(not_found_message(id)),
			value => Self::BackendError(value),
		}
	}
}

pub(crate) fn not_found_message(id: impl std::fmt::Display) -> String {
	format!("Page with id = {id} not found")
}

impl IntoResponse for WebError {
	fn into_response(self) -> Response {
		let status = self.status();
		if status.is_server_error() {
			error!(error = %self, "request failed");
		}

		let page = ErrorPage {
			flash: Some(Flash::error(self.to_string())),
			status: status.as_u16(),
			reason: status.canonical_reason().unwrap_or("Error"),
		};
		match page.render() {
			Ok(html) => (status, Html(html)).into_response(),
			Err(render_error) => {
				error!(error = %render_error, "failed to render error page");
				(status, self.to_string()).into_response()
			}
		}
	}
}

pub(crate) type WebResult<T> = Result<T, WebError>;
