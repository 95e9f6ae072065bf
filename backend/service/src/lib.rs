//! Page analyzer backend services.

use std::sync::Arc;

use check::{CheckError, CheckService};
use config::BackendConfig;
use database::{DatabaseError, DatabaseService};
use thiserror::Error;
use time::{OffsetDateTime, PrimitiveDateTime};
use url::{UrlError, UrlService};

pub mod check;
pub mod config;
pub mod database;
pub mod site;
pub mod url;

/// Service container for page analyzer backends.
///
/// All services are wrapped with [`Arc`].
#[derive(Debug, Clone)]
pub struct BackendServices {
	pub config: Arc<BackendConfig>,
	pub database: Arc<DatabaseService>,
	pub urls: Arc<UrlService>,
	pub checks: Arc<CheckService>,
}

impl BackendServices {
	#[tracing::instrument(skip(config))]
	pub async fn new(config: BackendConfig) -> Result<Self> {
		let config = Arc::new(config);
		let database = Arc::new(DatabaseService::new(&config.database).await?);
		let urls = Arc::new(UrlService::new(database.clone()));
		let checks = Arc::new(CheckService::new(&config.check, database.clone())?);

		Ok(Self {
			config,
			database,
			urls,
			checks,
		})
	}
}

/// Backend errors.
#[derive(Debug, Error)]
pub enum BackendError {
	#[error(transparent)]
	DatabaseError(#[from] DatabaseError),
	#[error(transparent)]
	UrlError(#[from] UrlError),
	#[error(transparent)]
	CheckError(#[from] CheckError),
}

/// A specialized [`Result`] for backend errors.
pub type Result<T, E = BackendError> = std::result::Result<T, E>;

impl From<diesel::result::Error> for BackendError {
	fn from(value: diesel::result::Error) -> Self {
		Self::DatabaseError(DatabaseError::QueryError(value))
	}
}

/// Current UTC time, truncated to whole seconds so that it survives
/// a round trip through every backend unchanged.
pub(crate) fn now_utc() -> PrimitiveDateTime {
	let now = OffsetDateTime::now_utc();
	let now = now.replace_nanosecond(0).unwrap_or(now);
	PrimitiveDateTime::new(now.date(), now.time())
}
