use diesel::{
	QueryResult, Queryable, RunQueryDsl, Selectable, SelectableHelper, SqliteConnection,
	connection::{AnsiTransactionManager, SimpleConnection, TransactionManager},
	dsl::AsSelect,
	expression::{AsExpression, TypedExpressionType},
	migration::MigrationVersion,
	pg::Pg,
	query_builder::{AsQuery, QueryId},
	query_dsl::methods::{LoadQuery, SelectDsl},
	sql_types::SqlType,
	sqlite::Sqlite,
};
use diesel_async::{
	AsyncPgConnection, RunQueryDsl as AsyncRunQueryDsl, SimpleAsyncConnection,
	async_connection_wrapper::AsyncConnectionWrapper, methods::LoadQuery as AsyncLoadQuery,
	pooled_connection::PoolableConnection,
};
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use futures::future::{BoxFuture, FutureExt, ready};

pub mod schema;

/// A connection to either of the supported SQL backends.
///
/// PostgreSQL is driven through `diesel-async`, while SQLite is embedded
/// and queried synchronously.
pub enum BoxedSqlConn {
	Pg(AsyncPgConnection),
	Sqlite(SqliteConnection),
}

impl BoxedSqlConn {
	/// Executes `SELECT 1` to test if the connection is ready for use.
	pub fn ping(&mut self) -> BoxFuture<Result<(), diesel::result::Error>> {
		match self {
			BoxedSqlConn::Pg(conn) => conn.batch_execute("SELECT 1").boxed(),
			BoxedSqlConn::Sqlite(conn) => ready(conn.batch_execute("SELECT 1")).boxed(),
		}
	}

	pub fn is_broken(&mut self) -> bool {
		match self {
			BoxedSqlConn::Pg(conn) => conn.is_broken(),
			BoxedSqlConn::Sqlite(conn) => {
				AnsiTransactionManager::is_broken_transaction_manager(conn)
			}
		}
	}

	pub fn is_sqlite(&self) -> bool {
		matches!(self, BoxedSqlConn::Sqlite(_))
	}
}

impl<'query> BoxedSqlConn {
	/// Executes the given query, returning a [`Vec`] with the returned rows.
	///
	/// Dispatches [RunQueryDsl::load].
	pub fn load<'conn, Q, U>(&'conn mut self, query: Q) -> BoxFuture<'query, QueryResult<Vec<U>>>
	where
		Q: Send,
		Q: AsyncLoadQuery<'query, AsyncPgConnection, U> + 'query,
		Q: LoadQuery<'query, SqliteConnection, U>,
		U: Send + 'query,
		'conn: 'query,
	{
		match self {
			BoxedSqlConn::Pg(conn) => AsyncRunQueryDsl::load(query, conn).boxed(),
			BoxedSqlConn::Sqlite(conn) => ready(RunQueryDsl::load(query, conn)).boxed(),
		}
	}

	/// Runs the command, and returns the affected row.
	///
	/// `Err(NotFound)` will be returned if the query affected 0 rows. You can
	/// call `.optional()` on the result of this if the command was optional to
	/// get back a `Result<Option<U>>`
	///
	/// Dispatches [RunQueryDsl::get_result].
	pub fn get_result<Q, U>(&'query mut self, query: Q) -> BoxFuture<'query, QueryResult<U>>
	where
		Q: AsQuery + Send,
		Q: AsyncLoadQuery<'query, AsyncPgConnection, U> + 'query,
		Q: LoadQuery<'query, SqliteConnection, U>,
		U: Send + 'query,
	{
		match self {
			BoxedSqlConn::Pg(conn) => AsyncRunQueryDsl::get_result(query, conn).boxed(),
			BoxedSqlConn::Sqlite(conn) => ready(RunQueryDsl::get_result(query, conn)).boxed(),
		}
	}

	/// Loads all rows of `query` as the [`Selectable`] type `S`.
	///
	/// The select clause is derived from `S` separately for each backend,
	/// so `S::as_select()` must not be applied by the caller.
	pub fn load_select<'conn, Q, S, E>(
		&'conn mut self,
		query: Q,
	) -> BoxFuture<'query, QueryResult<Vec<S>>>
	where
		Q: SelectDsl<AsSelect<S, Pg>>,
		Q: SelectDsl<AsSelect<S, Sqlite>>,
		<Q as SelectDsl<AsSelect<S, Pg>>>::Output:
			AsyncLoadQuery<'query, AsyncPgConnection, S> + Send + 'query,
		<Q as SelectDsl<AsSelect<S, Sqlite>>>::Output: LoadQuery<'query, SqliteConnection, S>,
		S: Selectable<Pg> + Queryable<E, Pg>,
		S: Selectable<Sqlite> + Queryable<E, Sqlite>,
		<S as Selectable<Pg>>::SelectExpression: QueryId + AsExpression<E>,
		<S as Selectable<Sqlite>>::SelectExpression: QueryId + AsExpression<E>,
		S: Send + 'query,
		E: TypedExpressionType + SqlType,
		'conn: 'query,
	{
		match self {
			BoxedSqlConn::Pg(conn) => AsyncRunQueryDsl::load(
				<Q as SelectDsl<AsSelect<S, Pg>>>::select(
					query,
					<S as SelectableHelper<Pg>>::as_select(),
				),
				conn,
			)
			.boxed(),
			BoxedSqlConn::Sqlite(conn) => ready(RunQueryDsl::load(
				<Q as SelectDsl<AsSelect<S, Sqlite>>>::select(
					query,
					<S as SelectableHelper<Sqlite>>::as_select(),
				),
				conn,
			))
			.boxed(),
		}
	}

	/// Loads one row as the [`Selectable`] type `S`.
	///
	/// Note that caller must set limit to 1.
	pub fn load_one_select<'conn, Q, S, E>(
		&'conn mut self,
		query: Q,
	) -> BoxFuture<'query, QueryResult<S>>
	where
		Q: SelectDsl<AsSelect<S, Pg>>,
		Q: SelectDsl<AsSelect<S, Sqlite>>,
		<Q as SelectDsl<AsSelect<S, Pg>>>::Output:
			AsyncLoadQuery<'query, AsyncPgConnection, S> + Send + 'query,
		<Q as SelectDsl<AsSelect<S, Sqlite>>>::Output: LoadQuery<'query, SqliteConnection, S>,
		S: Selectable<Pg> + Queryable<E, Pg>,
		S: Selectable<Sqlite> + Queryable<E, Sqlite>,
		<S as Selectable<Pg>>::SelectExpression: QueryId + AsExpression<E>,
		<S as Selectable<Sqlite>>::SelectExpression: QueryId + AsExpression<E>,
		S: Send + 'query,
		E: TypedExpressionType + SqlType,
		'conn: 'query,
	{
		match self {
			BoxedSqlConn::Pg(conn) => AsyncRunQueryDsl::get_result(
				<Q as SelectDsl<AsSelect<S, Pg>>>::select(
					query,
					<S as SelectableHelper<Pg>>::as_select(),
				),
				conn,
			)
			.boxed(),
			BoxedSqlConn::Sqlite(conn) => ready(RunQueryDsl::get_result(
				<Q as SelectDsl<AsSelect<S, Sqlite>>>::select(
					query,
					<S as SelectableHelper<Sqlite>>::as_select(),
				),
				conn,
			))
			.boxed(),
		}
	}
}

const POSTGRESQL_MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations/postgresql");
const SQLITE_MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations/sqlite");

/// Runs all pending migrations, taking over the connection.
///
/// With `recreate`, every applied migration is reverted first, so the
/// schema is rebuilt from scratch and all data is lost.
///
/// This is not async, so a spawn-blocking wrapper is required.
pub fn run_migrations(
	mut conn: BoxedSqlConn,
	recreate: bool,
) -> diesel::migration::Result<Vec<MigrationVersion<'static>>> {
	match conn {
		BoxedSqlConn::Pg(conn) => {
			let mut async_wrapper: AsyncConnectionWrapper<AsyncPgConnection> =
				AsyncConnectionWrapper::from(conn);
			if recreate {
				async_wrapper.revert_all_migrations(POSTGRESQL_MIGRATIONS)?;
			}
			async_wrapper
				.run_pending_migrations(POSTGRESQL_MIGRATIONS)
				.map(into_owned_versions)
		}
		BoxedSqlConn::Sqlite(_) => run_migrations_sqlite(&mut conn, recreate),
	}
}

/// Runs migrations for SQLite on a borrowed connection.
///
/// In-memory SQLite databases only live as long as their connection,
/// so the migrations must run on the very connection kept by the pool.
pub fn run_migrations_sqlite(
	conn: &mut BoxedSqlConn,
	recreate: bool,
) -> diesel::migration::Result<Vec<MigrationVersion<'static>>> {
	match conn {
		BoxedSqlConn::Pg(_) => Err("SQLite migrations requested on a PostgreSQL connection".into()),
		BoxedSqlConn::Sqlite(conn) => {
			if recreate {
				conn.revert_all_migrations(SQLITE_MIGRATIONS)?;
			}
			conn.run_pending_migrations(SQLITE_MIGRATIONS)
				.map(into_owned_versions)
		}
	}
}

fn into_owned_versions(versions: Vec<MigrationVersion<'_>>) -> Vec<MigrationVersion<'static>> {
	versions
		.into_iter()
		.map(|version| version.as_owned())
		.collect()
}
