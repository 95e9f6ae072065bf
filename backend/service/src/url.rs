use std::sync::Arc;

use analyzer_backend_model::{
	db::schema::urls::dsl,
	url::{Url, UrlRef},
};
use diesel::{
	ExpressionMethods, OptionalExtension, QueryDsl, insert_into,
	result::{DatabaseErrorKind, Error as QueryError},
};
use thiserror::Error;
use tracing::info;

use crate::{Result, database::DatabaseService, now_utc, site::normalize_site_url};

/// Registry of tracked sites.
#[derive(Debug)]
pub struct UrlService {
	db: Arc<DatabaseService>,
}

impl UrlService {
	pub fn new(db: Arc<DatabaseService>) -> Self {
		Self { db }
	}

	/// Normalizes `input` and starts tracking the site.
	pub async fn create(&self, input: &str) -> Result<Url> {
		let name = normalize_site_url(input)
			.ok_or_else(|| UrlError::InvalidUrl(input.trim().to_owned()))?;
		if self.find_by_name(&name).await?.is_some() {
			return Err(UrlError::AlreadyExists(name).into());
		}

		let created_at = now_utc();
		let mut conn = self.db.get().await?;
		let id = conn
			.get_result::<_, UrlRef>(
				insert_into(dsl::urls)
					.values((dsl::name.eq(&name), dsl::created_at.eq(created_at)))
					.returning(dsl::id),
			)
			.await
			.map_err(|error| match error {
				QueryError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
					UrlError::AlreadyExists(name.clone()).into()
				}
				error => crate::BackendError::from(error),
			})?;
		info!(id, %name, "tracked site");

		Ok(Url {
			id,
			name,
			created_at,
		})
	}

	pub async fn find(&self, id: UrlRef) -> Result<Option<Url>> {
		let mut conn = self.db.get().await?;
		Ok(conn
			.load_one_select(dsl::urls.filter(dsl::id.eq(id)).limit(1))
			.await
			.optional()?)
	}

	pub async fn find_by_name(&self, name: &str) -> Result<Option<Url>> {
		let mut conn = self.db.get().await?;
		Ok(conn
			.load_one_select(dsl::urls.filter(dsl::name.eq(name)).limit(1))
			.await
			.optional()?)
	}

	/// Like [`find`](Self::find), but a missing site is an error.
	pub async fn get(&self, id: UrlRef) -> Result<Url> {
		self.find(id)
			.await?
			.ok_or_else(|| UrlError::NotFound(id).into())
	}

	/// Lists all sites, newest first.
	pub async fn list(&self) -> Result<Vec<Url>> {
		let mut conn = self.db.get().await?;
		Ok(conn.load_select(dsl::urls.order(dsl::id.desc())).await?)
	}
}

#[derive(Debug, Error)]
pub enum UrlError {
	#[error("invalid site address: {0:?}")]
	InvalidUrl(String),
	#[error("site {0} is already tracked")]
	AlreadyExists(String),
	#[error("site {0} not found")]
	NotFound(UrlRef),
}
