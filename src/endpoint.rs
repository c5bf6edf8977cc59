//! HTTP endpoint for the climate API
//!
//! Serves the JSON routes consumed by the web front end. Requests are
//! accepted on one thread and handed to a fixed worker pool; every worker
//! shares the same `Endpoint` (and so the same cutoff date and connection
//! pool).
//!
//! Endpoints:
//! - GET /                         - Landing page
//! - GET /api/v1.0/precipitation   - Last year of (date, prcp)
//! - GET /api/v1.0/stations        - (station, name) for every station
//! - GET /api/v1.0/tobs            - Last year of (date, tobs) at the most active station
//! - GET /api/v1.0/{start}         - min/avg/max tobs from start
//! - GET /api/v1.0/{start}/{end}   - min/avg/max tobs for start..=end
//! - GET /health                   - Service health check

use crate::error::{Result, ServiceError};
use crate::service::ClimateService;
use serde::Serialize;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use threadpool::ThreadPool;
use tiny_http::{Header, Method, Request, Server, StatusCode};
use tracing::{debug, error, info, warn};

pub const API_PREFIX: &str = "/api/v1.0/";

const AVAILABLE_ENDPOINTS: &[&str] = &[
    "/",
    "/api/v1.0/precipitation",
    "/api/v1.0/stations",
    "/api/v1.0/tobs",
    "/api/v1.0/{start}",
    "/api/v1.0/{start}/{end}",
    "/health",
];

const DEFAULT_LANDING_PAGE: &str = "<!DOCTYPE html>
<html>
<head><title>Climate API</title></head>
<body>
<h1>Climate API</h1>
<ul>
<li><a href=\"/api/v1.0/precipitation\">/api/v1.0/precipitation</a></li>
<li><a href=\"/api/v1.0/stations\">/api/v1.0/stations</a></li>
<li><a href=\"/api/v1.0/tobs\">/api/v1.0/tobs</a></li>
<li>/api/v1.0/&lt;start&gt;</li>
<li>/api/v1.0/&lt;start&gt;/&lt;end&gt;</li>
</ul>
</body>
</html>
";

// ---------------------------------------------------------------------------
// Routing
// ---------------------------------------------------------------------------

/// A parsed request path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Landing,
    Health,
    Precipitation,
    Stations,
    Tobs,
    StatsFrom(String),
    StatsBetween(String, String),
    NotFound,
}

impl Route {
    /// Match a request URL. The query string is ignored and date segments
    /// are percent-decoded but otherwise passed through untouched.
    pub fn parse(url: &str) -> Route {
        let path = url.split(['?', '#']).next().unwrap_or("");

        match path {
            "/" => return Route::Landing,
            "/health" => return Route::Health,
            _ => {}
        }

        let Some(rest) = path.strip_prefix(API_PREFIX) else {
            return Route::NotFound;
        };

        let segments: Vec<&str> = rest.split('/').collect();
        if segments.iter().any(|s| s.is_empty()) {
            return Route::NotFound;
        }

        let decoded: Vec<String> = match segments
            .iter()
            .map(|s| urlencoding::decode(s).map(|d| d.into_owned()))
            .collect()
        {
            Ok(d) => d,
            Err(_) => return Route::NotFound,
        };

        match decoded.as_slice() {
            [one] => match one.as_str() {
                "precipitation" => Route::Precipitation,
                "stations" => Route::Stations,
                "tobs" => Route::Tobs,
                _ => Route::StatsFrom(one.clone()),
            },
            [start, end] => Route::StatsBetween(start.clone(), end.clone()),
            _ => Route::NotFound,
        }
    }
}

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

/// A fully rendered response, independent of the HTTP library.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: u16,
    pub content_type: &'static str,
    pub body: String,
}

impl ApiResponse {
    fn json<T: Serialize + ?Sized>(status: u16, value: &T) -> ApiResponse {
        match serde_json::to_string_pretty(value) {
            Ok(body) => ApiResponse {
                status,
                content_type: "application/json",
                body,
            },
            Err(e) => {
                error!(error = %e, "Failed to serialize response");
                ApiResponse {
                    status: 500,
                    content_type: "text/plain; charset=utf-8",
                    body: "Internal Server Error".to_string(),
                }
            }
        }
    }

    fn html(body: &str) -> ApiResponse {
        ApiResponse {
            status: 200,
            content_type: "text/html; charset=utf-8",
            body: body.to_string(),
        }
    }

    fn from_result<T: Serialize>(result: Result<T>) -> ApiResponse {
        match result {
            Ok(value) => ApiResponse::json(200, &value),
            Err(e) => {
                error!(error = %e, "Query failed");
                ApiResponse::json(500, &serde_json::json!({ "error": e.to_string() }))
            }
        }
    }

    fn not_found() -> ApiResponse {
        ApiResponse::json(
            404,
            &serde_json::json!({
                "error": "Not found",
                "available_endpoints": AVAILABLE_ENDPOINTS,
            }),
        )
    }

    fn method_not_allowed(method: &Method) -> ApiResponse {
        ApiResponse::json(
            405,
            &serde_json::json!({
                "error": format!("Method {} not allowed", method),
                "allowed": ["GET"],
            }),
        )
    }

    fn into_tiny(self) -> tiny_http::Response<std::io::Cursor<Vec<u8>>> {
        let response = tiny_http::Response::from_data(self.body.into_bytes())
            .with_status_code(StatusCode::from(self.status));

        match Header::from_bytes(&b"Content-Type"[..], self.content_type.as_bytes()) {
            Ok(header) => response.with_header(header),
            Err(()) => response,
        }
    }
}

// ---------------------------------------------------------------------------
// Endpoint
// ---------------------------------------------------------------------------

/// Request handler: the query service plus the landing page it serves.
#[derive(Debug)]
pub struct Endpoint {
    service: ClimateService,
    landing_page: String,
}

impl Endpoint {
    pub fn new(service: ClimateService, landing_page: String) -> Self {
        Self {
            service,
            landing_page,
        }
    }

    pub fn service(&self) -> &ClimateService {
        &self.service
    }

    /// Route and answer one request.
    pub fn handle(&self, method: &Method, url: &str) -> ApiResponse {
        if !matches!(method, Method::Get | Method::Head) {
            return ApiResponse::method_not_allowed(method);
        }

        match Route::parse(url) {
            Route::Landing => ApiResponse::html(&self.landing_page),
            Route::Health => self.handle_health(),
            Route::Precipitation => ApiResponse::from_result(self.service.precipitation()),
            Route::Stations => ApiResponse::from_result(self.service.stations()),
            Route::Tobs => ApiResponse::from_result(self.service.tobs()),
            Route::StatsFrom(start) => ApiResponse::from_result(self.service.stats_from(&start)),
            Route::StatsBetween(start, end) => {
                ApiResponse::from_result(self.service.stats_between(&start, &end))
            }
            Route::NotFound => ApiResponse::not_found(),
        }
    }

    fn handle_health(&self) -> ApiResponse {
        ApiResponse::json(
            200,
            &serde_json::json!({
                "status": "ok",
                "service": env!("CARGO_PKG_NAME"),
                "version": env!("CARGO_PKG_VERSION"),
                "cutoff_date": self.service.cutoff_date(),
            }),
        )
    }
}

/// Read the landing page HTML, falling back to a built-in route listing.
pub fn load_landing_page(path: &Path) -> String {
    match fs::read_to_string(path) {
        Ok(html) => html,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Landing page unavailable, using built-in page");
            DEFAULT_LANDING_PAGE.to_string()
        }
    }
}

// ---------------------------------------------------------------------------
// HTTP Server
// ---------------------------------------------------------------------------

/// Bind `address` and serve until the listener shuts down.
pub fn start_endpoint_server(address: &str, endpoint: Endpoint, workers: usize) -> Result<()> {
    let server = Server::http(address)
        .map_err(|e| ServiceError::Server(format!("Failed to bind {}: {}", address, e)))?;

    info!(address, workers, "HTTP endpoint listening");
    for route in AVAILABLE_ENDPOINTS {
        debug!("   GET {}", route);
    }

    serve(server, Arc::new(endpoint), workers);
    Ok(())
}

/// Accept loop over an already bound server.
pub fn serve(server: Server, endpoint: Arc<Endpoint>, workers: usize) {
    let pool = ThreadPool::new(workers.max(1));

    for request in server.incoming_requests() {
        let endpoint = Arc::clone(&endpoint);
        pool.execute(move || respond(&endpoint, request));
    }

    pool.join();
}

fn respond(endpoint: &Endpoint, request: Request) {
    let response = endpoint.handle(request.method(), request.url());
    debug!(method = %request.method(), url = request.url(), status = response.status, "Handled request");

    if let Err(e) = request.respond(response.into_tiny()) {
        error!(error = %e, "Failed to send response");
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
