use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::extract::{Request, State};
use axum::http::header::{self, HeaderMap, HeaderName, HeaderValue};
use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Router;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use url::Url;

use crate::core::registry::{PortRegistry, BASE_PROXY_PORT};
use crate::utils::error::{PagemarkError, Result};

/// Largest request body the relay will buffer before forwarding.
const MAX_RELAY_BODY: usize = 10 * 1024 * 1024;

/// How long a stopping listener may take before it is aborted.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// Shared with the relay handler: where to forward, and the client for the
/// upstream leg.
#[derive(Clone)]
struct ProxyContext {
    upstream: Url,
    client: reqwest::Client,
}

/// One live listener: its claimed port and the handles needed to stop it.
struct ProxySession {
    port: u16,
    shutdown: oneshot::Sender<()>,
    handle: JoinHandle<()>,
}

/// An ephemeral localhost reverse proxy that relays every request to one
/// upstream origin, strips cookies on the way out, and synthesizes CORS
/// headers on the way back. Holds at most one live session; re-opening an
/// open proxy restarts the listener on the same claimed port.
pub struct ReverseProxy {
    registry: Arc<PortRegistry>,
    base_port: u16,
    session: Option<ProxySession>,
}

impl ReverseProxy {
    pub fn new(registry: Arc<PortRegistry>) -> Self {
        Self::with_base_port(registry, BASE_PROXY_PORT)
    }

    pub fn with_base_port(registry: Arc<PortRegistry>, base_port: u16) -> Self {
        Self {
            registry,
            base_port,
            session: None,
        }
    }

    /// Port of the live session, if one is open.
    pub fn port(&self) -> Option<u16> {
        self.session.as_ref().map(|s| s.port)
    }

    pub fn is_open(&self) -> bool {
        self.session.is_some()
    }

    /// Starts relaying `127.0.0.1:<port>` to `upstream_origin` and returns
    /// the bound port. An already-open session is stopped first and its
    /// port reused rather than reallocated. On bind failure the port is
    /// released before the error is returned.
    pub async fn open(&mut self, upstream_origin: &Url) -> Result<u16> {
        let port = match self.session.take() {
            Some(session) => {
                let port = session.port;
                stop_session(session).await;
                port
            }
            None => self.registry.allocate(self.base_port),
        };

        // Upstream leg mirrors the browser-evasion settings of the original
        // relay: certificate errors ignored, redirects followed, and the
        // Host header rewritten by targeting the upstream URL itself.
        let client = match reqwest::Client::builder()
            .danger_accept_invalid_certs(true)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()
        {
            Ok(client) => client,
            Err(e) => {
                self.registry.release(port);
                return Err(e.into());
            }
        };

        let context = ProxyContext {
            upstream: upstream_origin.clone(),
            client,
        };
        let app = Router::new().fallback(relay).with_state(context);

        let listener = match tokio::net::TcpListener::bind(("127.0.0.1", port)).await {
            Ok(listener) => listener,
            Err(e) => {
                self.registry.release(port);
                return Err(PagemarkError::ProxyBind { port, source: e });
            }
        };

        let (shutdown, rx) = oneshot::channel::<()>();
        let handle = tokio::spawn(async move {
            let serve = axum::serve(listener, app).with_graceful_shutdown(async {
                let _ = rx.await;
            });
            if let Err(e) = serve.await {
                tracing::warn!("proxy listener exited with error: {}", e);
            }
        });

        tracing::debug!(
            "reverse proxy open on 127.0.0.1:{} -> {}",
            port,
            upstream_origin
        );
        self.session = Some(ProxySession {
            port,
            shutdown,
            handle,
        });
        Ok(port)
    }

    /// Stops the listener, then releases the port — in that order, so the
    /// port can never be handed out while still bound. Closing an
    /// already-closed proxy is a no-op.
    pub async fn close(&mut self) {
        if let Some(session) = self.session.take() {
            let port = session.port;
            stop_session(session).await;
            self.registry.release(port);
            tracing::debug!("reverse proxy on port {} closed", port);
        }
    }
}

async fn stop_session(session: ProxySession) {
    let _ = session.shutdown.send(());
    let mut handle = session.handle;
    if tokio::time::timeout(SHUTDOWN_GRACE, &mut handle).await.is_err() {
        tracing::warn!("proxy listener did not stop in time, aborting");
        handle.abort();
    }
}

/// Relays one request to the upstream origin and synthesizes the CORS
/// response headers the upstream never granted.
async fn relay(State(context): State<ProxyContext>, request: Request) -> Response {
    let (parts, body) = request.into_parts();

    let body_bytes = match axum::body::to_bytes(body, MAX_RELAY_BODY).await {
        Ok(bytes) => bytes,
        Err(e) => {
            return (
                StatusCode::BAD_REQUEST,
                format!("unreadable request body: {}", e),
            )
                .into_response()
        }
    };

    let path_and_query = parts
        .uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");

    let mut response = match forward(&context, &parts.method, path_and_query, &parts.headers, body_bytes).await {
        Ok(response) => response,
        Err(e) => {
            tracing::warn!("relay to {} failed: {}", context.upstream, e);
            (StatusCode::BAD_GATEWAY, format!("relay failed: {}", e)).into_response()
        }
    };

    apply_cors(&parts.headers, &parts.method, &mut response);
    response
}

async fn forward(
    context: &ProxyContext,
    method: &Method,
    path_and_query: &str,
    request_headers: &HeaderMap,
    body: axum::body::Bytes,
) -> Result<Response> {
    let target = context
        .upstream
        .join(path_and_query)
        .map_err(|e| PagemarkError::Proxy {
            message: format!("invalid upstream path {}: {}", path_and_query, e),
        })?;

    let mut upstream_headers = HeaderMap::new();
    for (name, value) in request_headers.iter() {
        if forwardable_request_header(name) {
            upstream_headers.append(name.clone(), value.clone());
        }
    }

    let upstream = context
        .client
        .request(method.clone(), target)
        .headers(upstream_headers)
        .body(body)
        .send()
        .await?;

    let status = upstream.status();
    let headers = upstream.headers().clone();
    let bytes = upstream.bytes().await?;

    let mut response = Response::new(Body::from(bytes));
    *response.status_mut() = status;
    for (name, value) in headers.iter() {
        if relayable_response_header(name) {
            response.headers_mut().append(name.clone(), value.clone());
        }
    }
    Ok(response)
}

/// The cookie header never crosses to the upstream; host is dropped so the
/// client rewrites it for the upstream origin; content-length is
/// recomputed for the forwarded body.
fn forwardable_request_header(name: &HeaderName) -> bool {
    *name != header::COOKIE
        && *name != header::HOST
        && *name != header::CONTENT_LENGTH
        && *name != header::CONNECTION
}

fn relayable_response_header(name: &HeaderName) -> bool {
    *name != header::TRANSFER_ENCODING
        && *name != header::CONNECTION
        && *name != header::CONTENT_LENGTH
}

/// Echoes the preflight request headers back as grants, and answers
/// OPTIONS preflights 200 no matter what the upstream said.
fn apply_cors(request_headers: &HeaderMap, method: &Method, response: &mut Response) {
    if let Some(value) = request_headers.get(header::ACCESS_CONTROL_REQUEST_METHOD) {
        response
            .headers_mut()
            .insert(header::ACCESS_CONTROL_ALLOW_METHODS, value.clone());
    }

    if let Some(value) = request_headers.get(header::ACCESS_CONTROL_REQUEST_HEADERS) {
        response
            .headers_mut()
            .insert(header::ACCESS_CONTROL_ALLOW_HEADERS, value.clone());
    }

    if let Some(origin) = request_headers.get(header::ORIGIN) {
        response
            .headers_mut()
            .insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, origin.clone());
        response.headers_mut().insert(
            header::ACCESS_CONTROL_ALLOW_CREDENTIALS,
            HeaderValue::from_static("true"),
        );
    }

    if method == Method::OPTIONS {
        *response.status_mut() = StatusCode::OK;
    }
}
