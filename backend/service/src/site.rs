//! Site address normalization.

use reqwest::Url;

/// Longest site name the `urls.name` column holds.
pub const MAX_SITE_NAME_LEN: usize = 255;

/// Normalizes user input into a site name, `scheme://host[:port]`.
///
/// Only absolute `http` and `https` addresses with a host are accepted.
/// Path, query, fragment and credentials are dropped, and the port is kept
/// only when it differs from the scheme default. Names longer than
/// [`MAX_SITE_NAME_LEN`] are rejected.
pub fn normalize_site_url(input: &str) -> Option<String> {
	let input = input.trim();
	if input.is_empty() {
		return None;
	}

	let url = Url::parse(input).ok()?;
	if !matches!(url.scheme(), "http" | "https") {
		return None;
	}
	let host = url.host_str().filter(|host| !host.is_empty())?;

	let name = match url.port() {
		Some(port) => format!("{}://{}:{}", url.scheme(), host, port),
		None => format!("{}://{}", url.scheme(), host),
	};
	(name.len() <= MAX_SITE_NAME_LEN).then_some(name)
}
