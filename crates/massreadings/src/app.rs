use std::time::Duration;

use axum::{
    http::{header, Method, StatusCode},
    routing::get,
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::{
    handlers::{
        health::{healthz, livez},
        mass::get_mass,
        root::root,
    },
    state::AppState,
};

/// Slack on top of the upstream fetch deadline before a request is cut off.
const REQUEST_TIMEOUT_SLACK: Duration = Duration::from_secs(5);

/// Create the application router with all routes and middleware.
pub fn create_app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET])
        .allow_headers([header::CONTENT_TYPE]);

    let request_timeout = state.readings.policy().fetch_timeout + REQUEST_TIMEOUT_SLACK;

    Router::new()
        .route("/", get(root))
        .route("/mass/{date}", get(get_mass))
        .route("/livez", get(livez))
        .route("/healthz", get(healthz))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            request_timeout,
        ))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    };

    use super::*;
    use async_trait::async_trait;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    use massreadings_core::cache::{CachePolicy, FetchError, ReadingFetcher};
    use massreadings_core::mass::{MassDate, MassReading};

    use crate::upstream::MockFetcher;

    /// Upstream that always fails the same way, counting its calls.
    struct FailingFetcher {
        error: FetchError,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ReadingFetcher<MassReading> for FailingFetcher {
        async fn fetch_reading(&self, _date: MassDate) -> Result<MassReading, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(self.error.clone())
        }
    }

    fn mock_app() -> Router {
        create_app(AppState::new(
            Arc::new(MockFetcher::default()),
            CachePolicy::default(),
        ))
    }

    async fn get_json(app: &Router, uri: &str) -> (StatusCode, serde_json::Value) {
        let response = app
            .clone()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();

        let status = response.status();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn test_root_lists_endpoints() {
        let app = mock_app();

        let (status, json) = get_json(&app, "/").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["message"], "Catholic Mass Readings API");
        assert_eq!(json["endpoints"]["mass_readings"], "/mass/{date}");
    }

    #[tokio::test]
    async fn test_livez() {
        let app = mock_app();

        let response = app
            .oneshot(Request::builder().uri("/livez").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_get_mass_is_served_from_cache() {
        let app = mock_app();

        let (status, first) = get_json(&app, "/mass/2025-02-27").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(first["date"], "2025-02-27");
        assert_eq!(first["mass_type"], "DEFAULT");
        assert_eq!(first["liturgical_info"]["season"], "Ordinary Time");
        assert_eq!(first["liturgical_info"]["color"], "#008000");
        assert!(!first["readings"].as_array().unwrap().is_empty());

        let (status, second) = get_json(&app, "/mass/2025-02-27").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(first, second);

        let (_, stats) = get_json(&app, "/healthz").await;
        assert_eq!(stats["fetches"], 1);
        assert_eq!(stats["hits"], 1);
        assert_eq!(stats["entries"], 1);
    }

    #[tokio::test]
    async fn test_invalid_date_never_reaches_upstream() {
        let fetcher = Arc::new(FailingFetcher {
            error: FetchError::Unavailable("unreachable".to_string()),
            calls: AtomicUsize::new(0),
        });
        let app = create_app(AppState::new(fetcher.clone(), CachePolicy::default()));

        for uri in ["/mass/2025-02-30", "/mass/27-02-2025", "/mass/1850-01-01"] {
            let (status, json) = get_json(&app, uri).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
            assert_eq!(json["error"], "invalid_date");
        }

        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_upstream_failure_is_cached_with_retry_after() {
        let fetcher = Arc::new(FailingFetcher {
            error: FetchError::Unavailable("USCCB returned 503".to_string()),
            calls: AtomicUsize::new(0),
        });
        let app = create_app(AppState::new(fetcher.clone(), CachePolicy::default()));

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/mass/2025-02-27")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(response.headers()[header::RETRY_AFTER], "60");

        let (status, json) = get_json(&app, "/mass/2025-02-27").await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(json["error"], "upstream_unavailable");
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_missing_readings_are_not_found() {
        let fetcher = Arc::new(FailingFetcher {
            error: FetchError::NotFound,
            calls: AtomicUsize::new(0),
        });
        let app = create_app(AppState::new(fetcher, CachePolicy::default()));

        let (status, json) = get_json(&app, "/mass/2025-02-27").await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["error"], "not_found");
    }
}
