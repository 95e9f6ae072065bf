diesel::table! {
	/// Tracked sites.
	urls (id) {
		id -> BigInt,
		/// Normalized site address, `scheme://host[:port]`.
		///
		/// Unique, and never changed after insertion.
		name -> Varchar,
		created_at -> Timestamp,
	}
}

diesel::table! {
	/// Results of fetching the root page of a site.
	url_checks (id) {
		id -> BigInt,
		url_id -> BigInt,
		/// HTTP status returned by the site.
		status_code -> Int4,
		h1 -> Nullable<Text>,
		title -> Nullable<Text>,
		description -> Nullable<Text>,
		created_at -> Timestamp,
	}
}

diesel::joinable!(url_checks -> urls (url_id));

diesel::allow_tables_to_appear_in_same_query!(urls, url_checks);
