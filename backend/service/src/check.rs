use std::{collections::HashMap, sync::Arc, time::Duration};

use analyzer_backend_model::{
	check::{CheckRef, UrlCheck},
	db::schema::url_checks::dsl,
	url::{Url, UrlRef},
};
use diesel::{ExpressionMethods, QueryDsl, insert_into};
use reqwest::Client;
use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::{Result, database::DatabaseService, now_utc};

/// Configuration for [`CheckService`].
#[derive(Debug, PartialEq, Eq, Clone, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct CheckConfig {
	/// Timeout of a whole page fetch, in seconds.
	pub timeout_secs: u64,
	/// `User-Agent` header sent to checked sites.
	pub user_agent: String,
}

impl Default for CheckConfig {
	fn default() -> Self {
		Self {
			timeout_secs: 10,
			user_agent: concat!("page-analyzer/", env!("CARGO_PKG_VERSION")).to_string(),
		}
	}
}

/// Fields extracted from a fetched page.
#[derive(Debug, PartialEq, Eq, Clone, Default)]
pub struct PageSummary {
	pub status_code: u16,
	pub h1: Option<String>,
	pub title: Option<String>,
	pub description: Option<String>,
}

struct PageSelectors {
	title: Selector,
	h1: Selector,
	description: Selector,
}

impl PageSelectors {
	fn new() -> Result<Self, CheckError> {
		let parse = |selector: &str| {
			Selector::parse(selector).map_err(|error| CheckError::InvalidSelector(error.to_string()))
		};
		Ok(Self {
			title: parse("title")?,
			h1: parse("h1")?,
			description: parse("meta[name=description]")?,
		})
	}
}

impl PageSummary {
	/// Extracts the title, the first `h1` and the meta description of an
	/// HTML document.
	///
	/// Element text has its whitespace collapsed, and empty values are
	/// returned as `None`.
	fn parse(status_code: u16, body: &str, selectors: &PageSelectors) -> Self {
		let document = Html::parse_document(body);
		let text_of = |selector: &Selector| {
			document
				.select(selector)
				.next()
				.and_then(|element| non_empty(collapse_whitespace(element.text())))
		};

		let title = text_of(&selectors.title);
		let h1 = text_of(&selectors.h1);
		let description = document
			.select(&selectors.description)
			.next()
			.and_then(|element| element.value().attr("content"))
			.and_then(|content| non_empty(content.trim().to_owned()));

		Self {
			status_code,
			h1,
			title,
			description,
		}
	}
}

fn collapse_whitespace<'a>(text: impl Iterator<Item = &'a str>) -> String {
	let mut output = String::new();
	for word in text.flat_map(str::split_whitespace) {
		if !output.is_empty() {
			output.push(' ');
		}
		output.push_str(word);
	}
	output
}

fn non_empty(value: String) -> Option<String> {
	if value.is_empty() { None } else { Some(value) }
}

/// Fetches tracked sites and records their SEO summary.
pub struct CheckService {
	db: Arc<DatabaseService>,
	client: Client,
	selectors: PageSelectors,
}

impl CheckService {
	pub fn new(config: &CheckConfig, db: Arc<DatabaseService>) -> Result<Self> {
		let client = Client::builder()
			.timeout(Duration::from_secs(config.timeout_secs))
			.user_agent(config.user_agent.as_str())
			.build()
			.map_err(CheckError::RequestError)?;
		Ok(Self {
			db,
			client,
			selectors: PageSelectors::new()?,
		})
	}

	/// Downloads the root page of `site`.
	///
	/// Every HTTP status is a valid result, only transport failures are
	/// reported as errors.
	pub async fn fetch(&self, site: &str) -> Result<PageSummary> {
		let response = self
			.client
			.get(site)
			.send()
			.await
			.map_err(CheckError::RequestError)?;
		let status = response.status();
		let body = response.text().await.map_err(CheckError::RequestError)?;
		if !status.is_success() {
			warn!(site, %status, "site responded with a non-success status");
		}
		Ok(PageSummary::parse(status.as_u16(), &body, &self.selectors))
	}

	/// Fetches `url` and stores the result as a new check.
	#[tracing::instrument(skip(self, url), fields(url = %url.name))]
	pub async fn check(&self, url: &Url) -> Result<UrlCheck> {
		let summary = self.fetch(&url.name).await?;
		let created_at = now_utc();
		let status_code = i32::from(summary.status_code);

		let mut conn = self.db.get().await?;
		let id = conn
			.get_result::<_, CheckRef>(
				insert_into(dsl::url_checks)
					.values((
						dsl::url_id.eq(url.id),
						dsl::status_code.eq(status_code),
						dsl::h1.eq(summary.h1.as_deref()),
						dsl::title.eq(summary.title.as_deref()),
						dsl::description.eq(summary.description.as_deref()),
						dsl::created_at.eq(created_at),
					))
					.returning(dsl::id),
			)
			.await?;
		info!(id, status_code, "checked site");

		Ok(UrlCheck {
			id,
			url_id: url.id,
			status_code,
			h1: summary.h1,
			title: summary.title,
			description: summary.description,
			created_at,
		})
	}

	/// Lists checks of a site, newest first.
	pub async fn list_for(&self, url_id: UrlRef) -> Result<Vec<UrlCheck>> {
		let mut conn = self.db.get().await?;
		Ok(conn
			.load_select(
				dsl::url_checks
					.filter(dsl::url_id.eq(url_id))
					.order(dsl::id.desc()),
			)
			.await?)
	}

	/// Returns the newest check of every site having one.
	pub async fn latest_per_url(&self) -> Result<HashMap<UrlRef, UrlCheck>> {
		let mut conn = self.db.get().await?;
		let latest: Vec<(UrlRef, Option<CheckRef>)> = conn
			.load(
				dsl::url_checks
					.group_by(dsl::url_id)
					.select((dsl::url_id, diesel::dsl::max(dsl::id))),
			)
			.await?;
		let ids: Vec<CheckRef> = latest.into_iter().filter_map(|(_, id)| id).collect();
		if ids.is_empty() {
			return Ok(HashMap::new());
		}

		let checks: Vec<UrlCheck> = conn
			.load_select(dsl::url_checks.filter(dsl::id.eq_any(ids)))
			.await?;
		Ok(checks
			.into_iter()
			.map(|check| (check.url_id, check))
			.collect())
	}
}

impl std::fmt::Debug for CheckService {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("CheckService").finish()
	}
}

#[derive(Debug, Error)]
pub enum CheckError {
	#[error("failed to fetch page: {0}")]
	RequestError(#[from] reqwest::Error),
	#[error("invalid HTML selector: {0}")]
	InvalidSelector(String),
}
