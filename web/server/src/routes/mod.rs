use analyzer_backend_service::BackendServices;
use askama::Template;
use axum::{
	Router,
	response::Html,
	routing::{get, post},
};
use tower_http::trace::TraceLayer;
use tower_sessions::{MemoryStore, Session, SessionManagerLayer};

use crate::{flash::Flash, views::IndexPage};

pub mod error;
mod urls;

use error::{WebError, WebResult};

pub fn make_router(backend_services: BackendServices) -> Router {
	let sessions = SessionManagerLayer::new(MemoryStore::default()).with_secure(false);

	Router::new()
		.route("/", get(root))
		.route("/urls", get(urls::index).post(urls::create))
		.route("/urls/{id}", get(urls::show))
		.route("/urls/{id}/checks", post(urls::check))
		.fallback(not_found)
		.layer(sessions)
		.layer(TraceLayer::new_for_http())
		.with_state(backend_services)
}

async fn root(session: Session) -> WebResult<Html<String>> {
	let page = IndexPage {
		flash: Flash::take(&session).await?,
		input: String::new(),
	};
	Ok(Html(page.render()?))
}

async fn not_found() -> WebError {
	WebError::not_found("Page not found")
}

#[cfg(test)]
mod test {
	use analyzer_backend_service::{
		check::CheckConfig, config::BackendConfig, database::DatabaseConfig,
	};
	use axum::{
		body::Body,
		http::{
			HeaderMap, Request, StatusCode,
			header::{CONTENT_TYPE, COOKIE, LOCATION, SET_COOKIE},
		},
	};
	use tower::ServiceExt;

	use super::*;

	async fn test_app() -> (BackendServices, Router) {
		let config = BackendConfig {
			database: DatabaseConfig::default(),
			check: CheckConfig {
				timeout_secs: 5,
				..Default::default()
			},
		};
		let backend = BackendServices::new(config).await.unwrap();
		let router = make_router(backend.clone());
		(backend, router)
	}

	struct TestResponse {
		status: StatusCode,
		headers: HeaderMap,
		body: String,
	}

	impl TestResponse {
		fn location(&self) -> Option<&str> {
			self.headers.get(LOCATION)?.to_str().ok()
		}

		/// The `name=value` part of the session cookie, if one was set.
		fn session_cookie(&self) -> Option<String> {
			let cookie = self.headers.get(SET_COOKIE)?.to_str().ok()?;
			cookie.split(';').next().map(str::to_owned)
		}
	}

	async fn send(router: &Router, request: Request<Body>) -> TestResponse {
		let response = router.clone().oneshot(request).await.unwrap();
		let status = response.status();
		let headers = response.headers().clone();
		let body = axum::body::to_bytes(response.into_body(), usize::MAX)
			.await
			.unwrap();
		TestResponse {
			status,
			headers,
			body: String::from_utf8(body.to_vec()).unwrap(),
		}
	}

	fn get_request(uri: &str, cookie: Option<&str>) -> Request<Body> {
		let mut builder = Request::get(uri);
		if let Some(cookie) = cookie {
			builder = builder.header(COOKIE, cookie);
		}
		builder.body(Body::empty()).unwrap()
	}

	fn post_request(uri: &str, form: &str, cookie: Option<&str>) -> Request<Body> {
		let mut builder =
			Request::post(uri).header(CONTENT_TYPE, "application/x-www-form-urlencoded");
		if let Some(cookie) = cookie {
			builder = builder.header(COOKIE, cookie);
		}
		builder.body(Body::from(form.to_owned())).unwrap()
	}

	async fn stored_names(backend: &BackendServices) -> Vec<String> {
		backend
			.urls
			.list()
			.await
			.unwrap()
			.into_iter()
			.map(|url| url.name)
			.collect()
	}

	#[tokio::test]
	async fn test_main_page() {
		let (_, router) = test_app().await;
		let response = send(&router, get_request("/", None)).await;
		assert_eq!(response.status, StatusCode::OK);
		assert!(response.body.contains("Page Analyzer"));
		assert!(response.body.contains(r#"action="/urls""#));
	}

	#[tokio::test]
	async fn test_urls_page() {
		let (_, router) = test_app().await;
		let response = send(&router, get_request("/urls", None)).await;
		assert_eq!(response.status, StatusCode::OK);
		assert!(response.body.contains("Sites"));
	}

	#[tokio::test]
	async fn test_create_url() {
		let (backend, router) = test_app().await;
		let response = send(
			&router,
			post_request("/urls", "url=https%3A%2F%2Fexample.com", None),
		)
		.await;
		assert_eq!(response.status, StatusCode::SEE_OTHER);
		assert_eq!(response.location(), Some("/urls"));
		let cookie = response.session_cookie().unwrap();

		let response = send(&router, get_request("/urls", Some(&cookie))).await;
		assert_eq!(response.status, StatusCode::OK);
		assert!(response.body.contains("https://example.com"));
		assert!(response.body.contains("Page successfully added"));

		// flash messages are shown once
		let response = send(&router, get_request("/urls", Some(&cookie))).await;
		assert!(response.body.contains("https://example.com"));
		assert!(!response.body.contains("Page successfully added"));

		let url = backend
			.urls
			.find_by_name("https://example.com")
			.await
			.unwrap()
			.unwrap();
		let response = send(&router, get_request(&format!("/urls/{}", url.id), None)).await;
		assert_eq!(response.status, StatusCode::OK);
		assert!(response.body.contains("https://example.com"));
	}

	#[tokio::test]
	async fn test_create_normalizes() {
		let (backend, router) = test_app().await;
		for form in [
			"url=HTTPS://EXAMple.COm",
			"url=http://example.com:8080",
			"url=https://google.com/path?query=value",
			"url=++https://hexlet.io++",
		] {
			let response = send(&router, post_request("/urls", form, None)).await;
			assert_eq!(response.status, StatusCode::SEE_OTHER, "{form}");
		}
		assert_eq!(
			stored_names(&backend).await,
			[
				"https://hexlet.io",
				"https://google.com",
				"http://example.com:8080",
				"https://example.com",
			]
		);
	}

	#[tokio::test]
	async fn test_reject_invalid_url() {
		let (backend, router) = test_app().await;
		let long_host = format!("url=https://{}.com", "a".repeat(300));
		for form in ["url=chepukha", "url=", "", long_host.as_str()] {
			let response = send(&router, post_request("/urls", form, None)).await;
			assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY, "{form:?}");
			assert!(response.body.contains("Invalid URL"));
		}
		assert!(stored_names(&backend).await.is_empty());
	}

	#[tokio::test]
	async fn test_reject_duplicate_url() {
		let (backend, router) = test_app().await;
		let response = send(&router, post_request("/urls", "url=https://example.com", None)).await;
		assert_eq!(response.status, StatusCode::SEE_OTHER);

		let response = send(&router, post_request("/urls", "url=https://example.com", None)).await;
		assert_eq!(response.status, StatusCode::CONFLICT);
		assert!(response.body.contains("Page already exists"));
		assert!(response.body.contains(r#"value="https://example.com""#));
		assert_eq!(stored_names(&backend).await.len(), 1);
	}

	#[tokio::test]
	async fn test_show_url() {
		let (backend, router) = test_app().await;
		let url = backend.urls.create("https://hexlet.io").await.unwrap();

		let response = send(&router, get_request(&format!("/urls/{}", url.id), None)).await;
		assert_eq!(response.status, StatusCode::OK);
		assert!(response.body.contains("ID"));
		assert!(response.body.contains("https://hexlet.io"));
		assert!(response.body.contains("Created at"));
	}

	#[tokio::test]
	async fn test_show_not_found() {
		let (_, router) = test_app().await;
		let response = send(&router, get_request("/urls/999", None)).await;
		assert_eq!(response.status, StatusCode::NOT_FOUND);
		assert!(response.body.contains("999"));
		assert!(response.body.contains("not found"));

		let response = send(&router, get_request("/urls/abc", None)).await;
		assert_eq!(response.status, StatusCode::NOT_FOUND);

		let response = send(&router, get_request("/no/such/page", None)).await;
		assert_eq!(response.status, StatusCode::NOT_FOUND);
	}

	#[tokio::test]
	async fn test_check_url() {
		let mut server = mockito::Server::new_async().await;
		server
			.mock("GET", "/")
			.with_status(200)
			.with_header("content-type", "text/html")
			.with_body(
				r#"<html><head><title>Mock title</title>
				<meta name="description" content="Mock description"></head>
				<body><h1>Mock heading</h1></body></html>"#,
			)
			.create_async()
			.await;

		let (_, router) = test_app().await;
		let form = format!("url={}", server.url());
		let response = send(&router, post_request("/urls", &form, None)).await;
		let cookie = response.session_cookie().unwrap();

		let response = send(&router, post_request("/urls/1/checks", "", Some(&cookie))).await;
		assert_eq!(response.status, StatusCode::SEE_OTHER);
		assert_eq!(response.location(), Some("/urls/1"));

		let response = send(&router, get_request("/urls/1", Some(&cookie))).await;
		assert_eq!(response.status, StatusCode::OK);
		assert!(response.body.contains("Page successfully checked"));
		assert!(response.body.contains("Mock title"));
		assert!(response.body.contains("Mock heading"));
		assert!(response.body.contains("Mock description"));

		let response = send(&router, get_request("/urls", Some(&cookie))).await;
		assert!(response.body.contains("<td>200</td>"));
	}

	#[tokio::test]
	async fn test_check_failure() {
		let (backend, router) = test_app().await;
		let url = backend.urls.create("http://127.0.0.1:9").await.unwrap();
		let uri = format!("/urls/{}/checks", url.id);

		let response = send(&router, post_request(&uri, "", None)).await;
		assert_eq!(response.status, StatusCode::SEE_OTHER);
		let cookie = response.session_cookie().unwrap();

		let response = send(&router, get_request(&format!("/urls/{}", url.id), Some(&cookie))).await;
		assert!(response.body.contains("Failed to check page"));
		assert!(backend.checks.list_for(url.id).await.unwrap().is_empty());
	}

	#[tokio::test]
	async fn test_check_not_found() {
		let (_, router) = test_app().await;
		let response = send(&router, post_request("/urls/42/checks", "", None)).await;
		assert_eq!(response.status, StatusCode::NOT_FOUND);
		assert!(response.body.contains("42"));
	}
}
