use diesel::{Queryable, Selectable};
use time::PrimitiveDateTime;

use crate::db::schema;

/// Primary key of a tracked site.
pub type UrlRef = i64;

/// A tracked site.
#[derive(Debug, PartialEq, Eq, Clone, Queryable, Selectable)]
#[diesel(table_name = schema::urls)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Url {
	pub id: UrlRef,
	/// Normalized address, see [`schema::urls::name`].
	pub name: String,
	pub created_at: PrimitiveDateTime,
}
