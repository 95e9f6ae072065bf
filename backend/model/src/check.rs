use diesel::{Queryable, Selectable};
use time::PrimitiveDateTime;

use crate::{db::schema, url::UrlRef};

pub type CheckRef = i64;

/// One recorded check of a site.
///
/// Text fields are `None` when the page did not contain
/// the element, or the element was empty.
#[derive(Debug, PartialEq, Eq, Clone, Queryable, Selectable)]
#[diesel(table_name = schema::url_checks)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct UrlCheck {
	pub id: CheckRef,
	pub url_id: UrlRef,
	pub status_code: i32,
	pub h1: Option<String>,
	pub title: Option<String>,
	pub description: Option<String>,
	pub created_at: PrimitiveDateTime,
}
