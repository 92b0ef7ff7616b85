//! Request/response monitoring.
//!
//! [`monitor`] logs every request before dispatch and every response after
//! it, and adds an `INFO` line for 2xx responses. A panic inside a handler is
//! caught by [`panic_response`], logged at `ERROR` and answered with one
//! `500`; the handler is never dispatched a second time.

use axum::{
    Json, Router,
    extract::Request,
    http::StatusCode,
    middleware::{self, Next},
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::any::Any;
use tower_http::catch_panic::CatchPanicLayer;
use tracing::{debug, error, info};

use super::{REQUEST_ID_HEADER, handlers::auth::error::INTERNAL_ERROR_MESSAGE};

/// Wrap a router with the panic guard, then the monitor around it.
pub fn layer(router: Router) -> Router {
    router
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(middleware::from_fn(monitor))
}

pub async fn monitor(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let request_id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("none")
        .to_string();

    debug!(
        "[process_request] => request: {} {} {:?} request_id={}",
        method,
        request.uri(),
        request.version(),
        request_id
    );

    let response = next.run(request).await;
    let status = response.status();

    debug!(
        "[process_response] => response: {} request_id={}",
        status, request_id
    );

    if status.is_success() {
        info!(
            http.method = %method,
            http.path = %path,
            http.status = status.as_u16(),
            "[successful_request] => {} {} - {}",
            method,
            path,
            status.as_u16()
        );
    }

    response
}

/// Turn a handler panic into a logged error and a generic `500`.
pub fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(message) = err.downcast_ref::<String>() {
        message.as_str()
    } else if let Some(message) = err.downcast_ref::<&str>() {
        message
    } else {
        "unknown panic payload"
    };

    error!("Unhandled error while serving request: {detail}");

    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": INTERNAL_ERROR_MESSAGE })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, body::to_bytes, routing::get};
    use std::{
        io,
        sync::{
            Arc, Mutex,
            atomic::{AtomicUsize, Ordering},
        },
    };
    use tower::ServiceExt;
    use tracing::Level;

    /// Collects formatted log output for assertions.
    #[derive(Clone, Default)]
    struct LogBuffer(Arc<Mutex<Vec<u8>>>);

    impl LogBuffer {
        fn lines(&self) -> Vec<String> {
            self.0
                .lock()
                .map(|bytes| {
                    String::from_utf8_lossy(&bytes)
                        .lines()
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default()
        }
    }

    impl io::Write for LogBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0
                .lock()
                .map_err(|_| io::Error::other("log buffer poisoned"))?
                .extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    async fn explode(calls: Arc<AtomicUsize>) {
        calls.fetch_add(1, Ordering::SeqCst);
        panic!("handler exploded");
    }

    fn counting_router(calls: Arc<AtomicUsize>) -> Router {
        let ok_calls = calls.clone();
        let router = Router::new()
            .route(
                "/ok",
                get(move || {
                    let calls = ok_calls.clone();
                    async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        "fine"
                    }
                }),
            )
            .route(
                "/boom",
                get(move || explode(calls.clone())),
            )
            .route("/missing", get(|| async { StatusCode::NOT_FOUND }));
        layer(router)
    }

    #[tokio::test]
    async fn passes_successful_responses_through() -> anyhow::Result<()> {
        let calls = Arc::new(AtomicUsize::new(0));
        let response = counting_router(calls.clone())
            .oneshot(Request::builder().uri("/ok").body(Body::empty())?)
            .await?;

        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX).await?;
        assert_eq!(&body[..], b"fine");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        Ok(())
    }

    #[tokio::test]
    async fn non_success_responses_are_untouched() -> anyhow::Result<()> {
        let response = counting_router(Arc::new(AtomicUsize::new(0)))
            .oneshot(Request::builder().uri("/missing").body(Body::empty())?)
            .await?;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        Ok(())
    }

    #[tokio::test]
    async fn panics_become_one_500_without_redispatch() -> anyhow::Result<()> {
        let calls = Arc::new(AtomicUsize::new(0));
        let response = counting_router(calls.clone())
            .oneshot(Request::builder().uri("/boom").body(Body::empty())?)
            .await?;

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = to_bytes(response.into_body(), usize::MAX).await?;
        let value: serde_json::Value = serde_json::from_slice(&body)?;
        assert_eq!(value, json!({ "error": INTERNAL_ERROR_MESSAGE }));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        Ok(())
    }

    #[tokio::test]
    async fn logs_success_at_info_and_panics_at_error() -> anyhow::Result<()> {
        let buffer = LogBuffer::default();
        let writer = buffer.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(Level::DEBUG)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let router = counting_router(Arc::new(AtomicUsize::new(0)));
        for path in ["/ok", "/missing", "/boom"] {
            router
                .clone()
                .oneshot(Request::builder().uri(path).body(Body::empty())?)
                .await?;
        }

        let lines = buffer.lines();

        let successes: Vec<&String> = lines
            .iter()
            .filter(|line| line.contains("[successful_request]"))
            .collect();
        assert_eq!(successes.len(), 1, "{lines:#?}");
        assert!(successes[0].contains("INFO"));
        assert!(successes[0].contains("GET /ok - 200"));

        assert!(
            !lines
                .iter()
                .any(|line| line.contains("INFO") && line.contains("/missing")),
            "{lines:#?}"
        );

        let errors: Vec<&String> = lines
            .iter()
            .filter(|line| line.contains("ERROR"))
            .collect();
        assert_eq!(errors.len(), 1, "{lines:#?}");
        assert!(errors[0].contains("Unhandled error while serving request: handler exploded"));

        let requests = lines
            .iter()
            .filter(|line| line.contains("DEBUG") && line.contains("[process_request]"))
            .count();
        let responses = lines
            .iter()
            .filter(|line| line.contains("DEBUG") && line.contains("[process_response]"))
            .count();
        assert_eq!(requests, 3);
        assert_eq!(responses, 3);
        assert!(
            lines
                .iter()
                .any(|line| line.contains("[process_response]") && line.contains("500"))
        );
        Ok(())
    }

    #[test]
    fn panic_response_handles_any_payload() {
        let response = panic_response(Box::new(42_u8));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let response = panic_response(Box::new("static message"));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
