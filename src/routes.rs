use std::path::PathBuf;
use std::sync::Arc;

use askama::Template;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Router,
};
use chrono::Utc;
use tracing::debug;

use crate::category::Filter;
use crate::viewer::{ViewModel, Viewer};

/// Shared state only knows where the document lives; every request loads
/// its own [`Viewer`], so visitors never see each other's filter.
pub struct AppState {
    pub news_path: PathBuf,
}

impl AppState {
    pub fn new(news_path: impl Into<PathBuf>) -> Self {
        Self {
            news_path: news_path.into(),
        }
    }
}

// Template structs
#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    pub view: ViewModel,
}

#[derive(Template)]
#[template(path = "news_section.html")]
pub struct NewsSectionTemplate {
    pub view: ViewModel,
}

// Wrapper for HTML responses
struct HtmlTemplate<T>(T);

impl<T: Template> IntoResponse for HtmlTemplate<T> {
    fn into_response(self) -> Response {
        match self.0.render() {
            Ok(html) => Html(html).into_response(),
            Err(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to render template: {}", err),
            )
                .into_response(),
        }
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/filter/:key", post(select_filter))
        .route("/health", get(health))
        .with_state(state)
}

// Route handlers

/// Page load: read whatever the aggregator last wrote and show every item.
pub async fn index(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let view = Viewer::load(&state.news_path).await.render(Utc::now());
    HtmlTemplate(IndexTemplate { view })
}

/// Tab click: render the news section for the requested filter.
pub async fn select_filter(
    State(state): State<Arc<AppState>>,
    Path(key): Path<String>,
) -> Response {
    let filter: Filter = match key.parse() {
        Ok(filter) => filter,
        Err(e) => return (StatusCode::BAD_REQUEST, e.to_string()).into_response(),
    };

    let mut viewer = Viewer::load(&state.news_path).await;
    viewer.select(filter);
    let view = viewer.render(Utc::now());
    debug!("Filter '{}' rendered {} cards", filter.key(), view.cards.len());

    HtmlTemplate(NewsSectionTemplate { view }).into_response()
}

pub async fn health() -> impl IntoResponse {
    Html("OK")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::news::{NewsDocument, NewsItem};
    use axum::{body::Body, http::Request};
    use http_body_util::BodyExt;
    use tempfile::TempDir;
    use tower::ServiceExt;

    fn news_item(title: &str, link: &str, source: &str) -> NewsItem {
        NewsItem {
            title: title.to_string(),
            link: link.to_string(),
            source: source.to_string(),
            pub_date: Some(Utc::now() - chrono::Duration::minutes(5)),
        }
    }

    async fn write_document(path: &std::path::Path, items: Vec<NewsItem>) {
        NewsDocument::new(items, Utc::now())
            .write_to(path)
            .await
            .unwrap();
    }

    /// Writes `items` as the news document and builds a router over it.
    /// The returned directory keeps the file alive for the test.
    async fn create_test_app(items: Vec<NewsItem>) -> (Router, TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("news.json");
        write_document(&path, items).await;
        (router(Arc::new(AppState::new(path))), dir)
    }

    fn sample_items() -> Vec<NewsItem> {
        vec![
            news_item("Blog Post", "https://aws.example.com/blog", "AWS News Blog"),
            news_item("Security Post", "https://aws.example.com/sec", "AWS Security Blog"),
            news_item("Mystery Post", "https://x.example.com/post", "X"),
        ]
    }

    async fn body_string(response: Response) -> String {
        let body = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(body.to_vec()).unwrap()
    }

    async fn get_page(app: Router) -> String {
        let response = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        body_string(response).await
    }

    async fn post_to(app: Router, uri: &str) -> Response {
        app.oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap()
    }

    mod health_tests {
        use super::*;

        #[tokio::test]
        async fn test_health_endpoint() {
            let (app, _dir) = create_test_app(vec![]).await;

            let response = app
                .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
                .await
                .unwrap();

            assert_eq!(response.status(), StatusCode::OK);
            assert_eq!(body_string(response).await, "OK");
        }
    }

    mod index_tests {
        use super::*;

        #[tokio::test]
        async fn test_index_lists_all_items() {
            let (app, _dir) = create_test_app(sample_items()).await;

            let body = get_page(app).await;
            assert!(body.contains("Blog Post"));
            assert!(body.contains("Security Post"));
            assert!(body.contains("Mystery Post"));
            assert!(body.contains("5m ago"));
            assert!(body.contains("target=\"_blank\""));
        }

        #[tokio::test]
        async fn test_index_escapes_titles() {
            let (app, _dir) = create_test_app(vec![news_item(
                "<script>alert('x')</script>",
                "https://aws.example.com/xss",
                "AWS News Blog",
            )])
            .await;

            let body = get_page(app).await;
            assert!(body.contains("&lt;script&gt;"));
            assert!(!body.contains("<script>alert"));
        }

        #[tokio::test]
        async fn test_index_failed_load_shows_message() {
            let app = router(Arc::new(AppState::new("/nonexistent/news.json")));

            let body = get_page(app).await;
            assert!(body.contains("Failed to load news. Please try again later."));
        }

        #[tokio::test]
        async fn test_index_reads_latest_document() {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("news.json");
            write_document(
                &path,
                vec![news_item("Old Post", "https://aws.example.com/old", "AWS News Blog")],
            )
            .await;
            let app = router(Arc::new(AppState::new(path.clone())));

            let body = get_page(app.clone()).await;
            assert!(body.contains("Old Post"));

            // A later aggregation run replaces the document
            write_document(
                &path,
                vec![news_item("Fresh Post", "https://aws.example.com/fresh", "AWS News Blog")],
            )
            .await;

            let body = get_page(app).await;
            assert!(body.contains("Fresh Post"));
            assert!(!body.contains("Old Post"));
        }

        #[tokio::test]
        async fn test_index_recovers_once_document_appears() {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("news.json");
            let app = router(Arc::new(AppState::new(path.clone())));

            let body = get_page(app.clone()).await;
            assert!(body.contains("Failed to load news"));

            write_document(&path, sample_items()).await;

            let body = get_page(app).await;
            assert!(body.contains("Blog Post"));
            assert!(!body.contains("Failed to load news"));
        }
    }

    mod filter_tests {
        use super::*;

        #[tokio::test]
        async fn test_filter_renders_matching_items_only() {
            let (app, _dir) = create_test_app(sample_items()).await;

            let response = post_to(app, "/filter/security").await;

            assert_eq!(response.status(), StatusCode::OK);
            let body = body_string(response).await;
            assert!(body.contains("Security Post"));
            assert!(!body.contains("Blog Post"));
            assert!(!body.contains("Mystery Post"));
            assert!(body.contains("data-filter=\"security\" class=\"tab active\""));
        }

        #[tokio::test]
        async fn test_filter_all_renders_everything() {
            let (app, _dir) = create_test_app(sample_items()).await;

            let body = body_string(post_to(app, "/filter/all").await).await;
            assert!(body.contains("Blog Post"));
            assert!(body.contains("Security Post"));
            assert!(body.contains("Mystery Post"));
        }

        #[tokio::test]
        async fn test_filter_with_no_matches_shows_placeholder() {
            let (app, _dir) = create_test_app(sample_items()).await;

            let body = body_string(post_to(app, "/filter/architecture").await).await;
            assert!(body.contains("empty-state"));
            assert!(!body.contains("news-card"));
        }

        #[tokio::test]
        async fn test_unknown_filter_is_rejected() {
            let (app, _dir) = create_test_app(sample_items()).await;

            let response = post_to(app, "/filter/podcasts").await;
            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        }

        #[tokio::test]
        async fn test_page_load_starts_at_all_after_another_filter() {
            let (app, _dir) = create_test_app(sample_items()).await;

            // Someone else narrowed their view to one category
            post_to(app.clone(), "/filter/security").await;

            let body = get_page(app).await;
            assert!(body.contains("Blog Post"));
            assert!(body.contains("Security Post"));
            assert!(body.contains("Mystery Post"));
            assert!(body.contains("data-filter=\"all\" class=\"tab active\""));
            assert_eq!(body.matches("tab active").count(), 1);
        }
    }
}
