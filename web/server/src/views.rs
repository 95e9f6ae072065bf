//! HTML pages rendered with askama.

use analyzer_backend_model::{
	check::{CheckRef, UrlCheck},
	url::{Url, UrlRef},
};
use askama::Template;
use time::{
	PrimitiveDateTime, format_description::BorrowedFormatItem, macros::format_description,
};

use crate::flash::Flash;

const TIMESTAMP_FORMAT: &[BorrowedFormatItem<'static>] =
	format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");

fn format_timestamp(timestamp: &PrimitiveDateTime) -> String {
	timestamp
		.format(TIMESTAMP_FORMAT)
		.unwrap_or_else(|_| timestamp.to_string())
}

#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexPage {
	pub flash: Option<Flash>,
	/// Previously submitted value, kept when the submission was rejected.
	pub input: String,
}

#[derive(Template)]
#[template(path = "urls/index.html")]
pub struct UrlsPage {
	pub flash: Option<Flash>,
	pub rows: Vec<UrlRow>,
}

pub struct UrlRow {
	pub id: UrlRef,
	pub name: String,
	pub last_checked_at: String,
	pub last_status: String,
}

impl UrlRow {
	pub fn new(url: Url, latest: Option<&UrlCheck>) -> Self {
		Self {
			id: url.id,
			name: url.name,
			last_checked_at: latest
				.map(|check| format_timestamp(&check.created_at))
				.unwrap_or_default(),
			last_status: latest
				.map(|check| check.status_code.to_string())
				.unwrap_or_default(),
		}
	}
}

#[derive(Template)]
#[template(path = "urls/show.html")]
pub struct UrlPage {
	pub flash: Option<Flash>,
	pub url: UrlView,
	pub checks: Vec<CheckRow>,
}

pub struct UrlView {
	pub id: UrlRef,
	pub name: String,
	pub created_at: String,
}

impl From<Url> for UrlView {
	fn from(url: Url) -> Self {
		Self {
			id: url.id,
			created_at: format_timestamp(&url.created_at),
			name: url.name,
		}
	}
}

pub struct CheckRow {
	pub id: CheckRef,
	pub status_code: i32,
	pub h1: String,
	pub title: String,
	pub description: String,
	pub created_at: String,
}

impl From<UrlCheck> for CheckRow {
	fn from(check: UrlCheck) -> Self {
		Self {
			id: check.id,
			status_code: check.status_code,
			h1: check.h1.unwrap_or_default(),
			title: check.title.unwrap_or_default(),
			description: check.description.unwrap_or_default(),
			created_at: format_timestamp(&check.created_at),
		}
	}
}

#[derive(Template)]
#[template(path = "error.html")]
pub struct ErrorPage {
	pub flash: Option<Flash>,
	pub status: u16,
	pub reason: &'static str,
}
