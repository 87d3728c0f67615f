//! HTTP routes for the graph viewer
//!
//! Plain static-file serving from the configured root, with permissive
//! CORS and caching disabled on every response.

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use axum::{
    Router,
    extract::{Path as UrlPath, State},
    http::{HeaderValue, Method, StatusCode, header},
    response::{IntoResponse, Redirect, Response},
    routing::get,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::set_header::SetResponseHeaderLayer;
use tracing::debug;

use super::server::AppState;

/// Sent on every response so the browser always refetches the document
pub const NO_CACHE: &str = "no-store, no-cache, must-revalidate";

/// Create the viewer router
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::OPTIONS]);

    Router::new()
        .route("/", get(index_redirect))
        .route("/{*path}", get(static_handler))
        .layer(cors)
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static(NO_CACHE),
        ))
        .with_state(state)
}

/// GET / - Redirect to the viewer page
async fn index_redirect(State(state): State<Arc<AppState>>) -> Redirect {
    Redirect::temporary(&format!("/{}", state.page.trim_start_matches('/')))
}

/// Static file handler rooted at `AppState::root`
async fn static_handler(
    State(state): State<Arc<AppState>>,
    UrlPath(path): UrlPath<String>,
) -> Response {
    let Some(file) = resolve_path(&state.root, &path) else {
        debug!(path = %path, "rejected path outside root");
        return not_found(&path);
    };

    match tokio::fs::metadata(&file).await {
        Ok(meta) if meta.is_file() => {}
        _ => return not_found(&path),
    }

    match tokio::fs::read(&file).await {
        Ok(bytes) => {
            let mime = mime_guess::from_path(&file).first_or_octet_stream();
            ([(header::CONTENT_TYPE, mime.as_ref().to_string())], bytes).into_response()
        }
        Err(e) => {
            debug!(path = %path, error = %e, "failed to read file");
            not_found(&path)
        }
    }
}

fn not_found(path: &str) -> Response {
    (StatusCode::NOT_FOUND, format!("File not found: {}", path)).into_response()
}

/// Map a request path onto `root`, refusing anything that could escape it
pub fn resolve_path(root: &Path, request_path: &str) -> Option<PathBuf> {
    let mut resolved = root.to_path_buf();
    for component in Path::new(request_path.trim_start_matches('/')).components() {
        match component {
            Component::Normal(part) => resolved.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
        }
    }
    Some(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use std::fs;
    use tower::ServiceExt;

    fn test_app(root: &Path) -> Router {
        router(Arc::new(AppState {
            root: root.to_path_buf(),
            page: "viewer.html".to_string(),
        }))
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder()
            .uri(uri)
            .header(header::ORIGIN, "http://example.com")
            .body(Body::empty())
            .unwrap()
    }

    #[test]
    fn test_resolve_path() {
        let root = Path::new("/srv");
        assert_eq!(
            resolve_path(root, "graph_data.json"),
            Some(PathBuf::from("/srv/graph_data.json"))
        );
        assert_eq!(
            resolve_path(root, "./assets/app.js"),
            Some(PathBuf::from("/srv/assets/app.js"))
        );
        assert_eq!(resolve_path(root, "../etc/passwd"), None);
        assert_eq!(resolve_path(root, "a/../../etc/passwd"), None);
    }

    #[tokio::test]
    async fn test_serves_json_with_headers() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("graph_data.json"), r#"{"nodes":[]}"#).unwrap();

        let response = test_app(dir.path())
            .oneshot(get_request("/graph_data.json"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let headers = response.headers();
        assert_eq!(headers[header::CONTENT_TYPE], "application/json");
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
        assert_eq!(headers[header::CACHE_CONTROL], NO_CACHE);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], br#"{"nodes":[]}"#);
    }

    #[tokio::test]
    async fn test_serves_nested_html() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("pages")).unwrap();
        fs::write(dir.path().join("pages").join("viewer.html"), "<html></html>").unwrap();

        let response = test_app(dir.path())
            .oneshot(get_request("/pages/viewer.html"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "text/html");
    }

    #[tokio::test]
    async fn test_missing_file_is_404_without_cache() {
        let dir = tempfile::tempdir().unwrap();

        let response = test_app(dir.path())
            .oneshot(get_request("/nope.json"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(response.headers()[header::CACHE_CONTROL], NO_CACHE);
    }

    #[tokio::test]
    async fn test_directory_is_404() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("assets")).unwrap();

        let response = test_app(dir.path())
            .oneshot(get_request("/assets"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_parent_traversal_is_rejected() {
        let outer = tempfile::tempdir().unwrap();
        let root = outer.path().join("root");
        fs::create_dir(&root).unwrap();
        fs::write(outer.path().join("secret.txt"), "secret").unwrap();

        let response = test_app(&root)
            .oneshot(get_request("/sub/%2e%2e/%2e%2e/secret.txt"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_root_redirects_to_page() {
        let dir = tempfile::tempdir().unwrap();

        let response = test_app(dir.path())
            .oneshot(get_request("/"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(response.headers()[header::LOCATION], "/viewer.html");
    }

    #[tokio::test]
    async fn test_preflight_allows_get() {
        let dir = tempfile::tempdir().unwrap();
        let request = Request::builder()
            .method(Method::OPTIONS)
            .uri("/graph_data.json")
            .header(header::ORIGIN, "http://example.com")
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "GET")
            .body(Body::empty())
            .unwrap();

        let response = test_app(dir.path()).oneshot(request).await.unwrap();

        assert!(response.status().is_success());
        let headers = response.headers();
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
        let methods = headers[header::ACCESS_CONTROL_ALLOW_METHODS]
            .to_str()
            .unwrap();
        assert!(methods.contains("GET"));
        assert!(methods.contains("OPTIONS"));
        assert_eq!(headers[header::CACHE_CONTROL], NO_CACHE);
    }
}
