use std::net::SocketAddr;

use axum::Router;
use axum::extract::ConnectInfo;
use axum::extract::MatchedPath;
use axum::extract::Request;
use axum::http::HeaderName;
use axum::http::StatusCode;
use axum::http::header;
use axum::middleware;
use axum::middleware::Next;
use axum::response::IntoResponse;
use axum::response::Response;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tracing::debug;
use tracing::info;

use crate::exception::CoreRsResult;
use crate::log;

pub struct HttpServerConfig {
    pub bind_address: String,
}

impl Default for HttpServerConfig {
    fn default() -> Self {
        HttpServerConfig {
            bind_address: "0.0.0.0:8080".to_owned(),
        }
    }
}

pub async fn start_http_server(
    router: Router,
    mut shutdown_signal: broadcast::Receiver<()>,
    config: HttpServerConfig,
) -> CoreRsResult<()> {
    let app = router.layer(middleware::from_fn(http_server_layer));
    let app = app.into_make_service_with_connect_info::<SocketAddr>();
    let listener = TcpListener::bind(&config.bind_address).await?;
    info!("http server started, bind={}", config.bind_address);
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            if shutdown_signal.recv().await.is_err() {
                info!("shutdown channel closed");
            }
        })
        .await?;
    info!("http server stopped");

    Ok(())
}

async fn http_server_layer(request: Request, next: Next) -> Response {
    // skip log for health check
    if request.uri().path() == "/health-check" {
        return StatusCode::OK.into_response();
    }

    let mut response = None;
    log::start_action("http", None, async {
        let method = request.method().clone();
        let uri = request.uri().clone();
        debug!(method = %method, uri = %uri, "[request]");
        for (name, value) in request.headers() {
            if is_sensitive(name) {
                debug!("[header] {name}=******");
            } else {
                debug!("[header] {name}={value:?}");
            }
        }
        if let Some(ConnectInfo(address)) = request.extensions().get::<ConnectInfo<SocketAddr>>() {
            debug!(client_ip = %address.ip(), "context");
        }
        if let Some(matched_path) = request.extensions().get::<MatchedPath>() {
            debug!(matched_path = matched_path.as_str(), "context");
        }

        let http_response = next.run(request).await;

        let status = http_response.status().as_u16();
        debug!(status, "[response]");
        response = Some(http_response);
        Ok(())
    })
    .await;
    response.unwrap_or_else(|| StatusCode::INTERNAL_SERVER_ERROR.into_response())
}

/// Credentials never reach the log, including shared secrets relayed as custom headers.
fn is_sensitive(name: &HeaderName) -> bool {
    *name == header::AUTHORIZATION
        || *name == header::COOKIE
        || name.as_str().ends_with("-secret")
        || name.as_str().ends_with("-token")
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderName;
    use axum::http::header;

    #[test]
    fn is_sensitive() {
        assert!(super::is_sensitive(&header::AUTHORIZATION));
        assert!(super::is_sensitive(&header::COOKIE));
        assert!(super::is_sensitive(&HeaderName::from_static("x-relay-secret")));
        assert!(super::is_sensitive(&HeaderName::from_static("x-api-token")));
        assert!(!super::is_sensitive(&header::CONTENT_TYPE));
        assert!(!super::is_sensitive(&HeaderName::from_static("x-forwarded-for")));
    }
}
