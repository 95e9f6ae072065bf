use analyzer_backend_model::url::{Url, UrlRef};
use analyzer_backend_service::{BackendError, BackendServices, url::UrlError};
use askama::Template;
use axum::{
	Form,
	extract::{Path, State},
	http::StatusCode,
	response::{Html, IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::warn;

use super::error::{WebError, WebResult, not_found_message};
use crate::{
	flash::Flash,
	views::{CheckRow, IndexPage, UrlPage, UrlRow, UrlsPage},
};

#[derive(Debug, Deserialize)]
pub struct NewUrlForm {
	#[serde(default)]
	url: String,
}

pub async fn create(
	State(backend): State<BackendServices>,
	session: Session,
	Form(form): Form<NewUrlForm>,
) -> WebResult<Response> {
	match backend.urls.create(&form.url).await {
		Ok(_) => {
			Flash::success("Page successfully added").push(&session).await?;
			Ok(Redirect::to("/urls").into_response())
		}
		Err(BackendError::UrlError(UrlError::InvalidUrl(_))) => {
			rejected(StatusCode::UNPROCESSABLE_ENTITY, "Invalid URL", form.url)
		}
		Err(BackendError::UrlError(UrlError::AlreadyExists(_))) => {
			rejected(StatusCode::CONFLICT, "Page already exists", form.url)
		}
		Err(error) => Err(error.into()),
	}
}

/// Renders the main page again, keeping the rejected input in the form.
fn rejected(status: StatusCode, message: &str, input: String) -> WebResult<Response> {
	let page = IndexPage {
		flash: Some(Flash::error(message)),
		input,
	};
	Ok((status, Html(page.render()?)).into_response())
}

pub async fn index(
	State(backend): State<BackendServices>,
	session: Session,
) -> WebResult<Html<String>> {
	let urls = backend.urls.list().await?;
	let latest = backend.checks.latest_per_url().await?;
	let rows = urls
		.into_iter()
		.map(|url| {
			let check = latest.get(&url.id);
			UrlRow::new(url, check)
		})
		.collect();

	let page = UrlsPage {
		flash: Flash::take(&session).await?,
		rows,
	};
	Ok(Html(page.render()?))
}

pub async fn show(
	State(backend): State<BackendServices>,
	session: Session,
	Path(id): Path<String>,
) -> WebResult<Html<String>> {
	let url = find_url(&backend, &id).await?;
	let checks = backend.checks.list_for(url.id).await?;

	let page = UrlPage {
		flash: Flash::take(&session).await?,
		url: url.into(),
		checks: checks.into_iter().map(CheckRow::from).collect(),
	};
	Ok(Html(page.render()?))
}

pub async fn check(
	State(backend): State<BackendServices>,
	session: Session,
	Path(id): Path<String>,
) -> WebResult<Redirect> {
	let url = find_url(&backend, &id).await?;
	let flash = match backend.checks.check(&url).await {
		Ok(_) => Flash::success("Page successfully checked"),
		Err(BackendError::CheckError(error)) => {
			warn!(url = %url.name, %error, "site check failed");
			Flash::error(format!("Failed to check page: {error}"))
		}
		Err(error) => return Err(error.into()),
	};
	flash.push(&session).await?;

	Ok(Redirect::to(&format!("/urls/{}", url.id)))
}

/// Looks up a site by the raw path segment; malformed ids are not found.
async fn find_url(backend: &BackendServices, id: &str) -> WebResult<Url> {
	let id = id
		.parse::<UrlRef>()
		.map_err(|_| WebError::not_found(not_found_message(id)))?;
	Ok(backend.urls.get(id).await?)
}
