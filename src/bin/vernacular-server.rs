use axum::{
    extract::State,
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::{env, net::SocketAddr, sync::Arc};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use vernacular::banner;
use vernacular::config::{self, Settings, MAPPING_ENV};
use vernacular::engine;
use vernacular::mapping::{LanguageInfo, Mapping};
use vernacular::reconcile::ReconcileOptions;
use vernacular::rules::Direction;

use tokio::{
    sync::Semaphore,
    task,
    time::{timeout, Duration},
};

/* -------------------------- App state -------------------------- */

struct AppState {
    /// Loaded once, shared by every request.
    mapping: Arc<Mapping>,
    options: ReconcileOptions,
    /// Permits capping concurrent transpile jobs.
    jobs: Arc<Semaphore>,
    /// Optional API key for requests (VERNACULAR_API_KEY).
    api_key: Option<String>,
}

fn api_key_matches(headers: &HeaderMap, expected: &str) -> bool {
    if let Some(value) = headers.get("x-api-key").and_then(|v| v.to_str().ok()) {
        if value.trim() == expected {
            return true;
        }
    }

    if let Some(auth) = headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok()) {
        let auth = auth.trim();
        if let Some(token) = auth
            .strip_prefix("Bearer ")
            .or_else(|| auth.strip_prefix("bearer "))
        {
            if token.trim() == expected {
                return true;
            }
        }
    }

    false
}

/* -------------------------- Request/Response ------------------- */
/* Clients may send 'code' or 'content'. */

#[derive(Deserialize, Debug)]
struct TranspileReq {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    direction: Option<String>,
    #[serde(default)]
    raw: bool,
}

#[derive(Serialize)]
struct TranspileResp {
    ok: bool,
    output: String,
    warnings: Vec<String>,
    logs: Vec<String>,
}

impl TranspileResp {
    fn failed(output: impl Into<String>, logs: Vec<String>) -> Self {
        Self {
            ok: false,
            output: output.into(),
            warnings: Vec::new(),
            logs,
        }
    }
}

#[derive(Serialize)]
struct LanguageResp {
    ok: bool,
    #[serde(flatten)]
    info: LanguageInfo,
    extension: String,
    keywords: usize,
    special_patterns: usize,
}

/* -------------------------- Server main ------------------------ */

#[tokio::main]
async fn main() {
    let settings = Settings::from_env();
    banner::print_server_banner(settings.color);
    config::init_logging(&settings, false);

    let Some(path) = settings.mapping.clone() else {
        eprintln!("❌ No mapping document: set {MAPPING_ENV}");
        std::process::exit(1);
    };
    let mapping = match Mapping::load(&path) {
        Ok(m) => m,
        Err(e) => {
            eprintln!("❌ {e}");
            std::process::exit(1);
        }
    };
    tracing::info!(mapping = %path.display(), "mapping loaded");

    // Max concurrent jobs (env VERNACULAR_MAX_JOBS, default 4).
    let max_jobs: usize = env::var("VERNACULAR_MAX_JOBS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(4)
        .max(1);

    let api_key = env::var("VERNACULAR_API_KEY")
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());

    let state = Arc::new(AppState {
        mapping: Arc::new(mapping),
        options: settings.reconcile_options(),
        jobs: Arc::new(Semaphore::new(max_jobs)),
        api_key,
    });

    let api = Router::new()
        .route("/transpile", post(api_transpile))
        .route("/language", get(api_language))
        .with_state(state);

    let app = Router::new()
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );

    // Default: 127.0.0.1:8081.
    let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port: u16 = env::var("PORT")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(8081);

    let addr: SocketAddr = match format!("{host}:{port}").parse() {
        Ok(addr) => addr,
        Err(e) => {
            eprintln!("❌ Invalid HOST/PORT {host}:{port}: {e}");
            std::process::exit(1);
        }
    };
    println!("✅ Vernacular API listening on http://{addr}");

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(l) => l,
        Err(e) => {
            eprintln!("❌ Bind failed for address {addr}: {e}");
            eprintln!(
                "   Hint: is the port already in use? e.g. `ss -tulpn | grep :{}`",
                port
            );
            std::process::exit(1);
        }
    };

    if let Err(e) = axum::serve(listener, app).await {
        eprintln!("❌ Server error: {e}");
        std::process::exit(1);
    }
}

/* -------------------------- Handlers --------------------------- */

async fn api_transpile(
    State(s): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<TranspileReq>,
) -> impl IntoResponse {
    let mut logs: Vec<String> = Vec::new();

    if let Some(expected) = &s.api_key {
        if !api_key_matches(&headers, expected) {
            logs.push("auth: missing or invalid API key".into());
            return (
                StatusCode::UNAUTHORIZED,
                Json(TranspileResp::failed(
                    "ERROR: missing or invalid API key",
                    logs,
                )),
            );
        }
    }

    let direction = match req.direction.as_deref().map(str::parse::<Direction>) {
        None => Direction::Forward,
        Some(Ok(d)) => d,
        Some(Err(e)) => {
            logs.push(format!("warn: {e}"));
            return (
                StatusCode::BAD_REQUEST,
                Json(TranspileResp::failed(format!("ERROR: {e}"), logs)),
            );
        }
    };
    logs.push(format!("direction={direction}"));
    if req.raw {
        logs.push("raw: substitution only".into());
    }

    // Pick code (code > content > empty).
    let code = req.code.or(req.content).unwrap_or_default();

    if code.trim().is_empty() {
        logs.push("warn: empty input".into());
        return (
            StatusCode::OK,
            Json(TranspileResp::failed("⚠️ Empty input", logs)),
        );
    }

    // Exit fast when every slot is busy, after a short soft wait.
    let permit = match s.jobs.clone().try_acquire_owned() {
        Ok(p) => p,
        Err(_) => {
            let maybe = timeout(Duration::from_millis(50), s.jobs.clone().acquire_owned()).await;
            match maybe {
                Ok(Ok(p)) => p,
                _ => {
                    logs.push("busy: transpile slots full".into());
                    return (
                        StatusCode::SERVICE_UNAVAILABLE,
                        Json(TranspileResp::failed(
                            "⚠️ Too many requests right now — please try again in a moment.",
                            logs,
                        )),
                    );
                }
            }
        }
    };

    // Long inputs are CPU-bound; keep them off the async workers.
    let mapping = Arc::clone(&s.mapping);
    let options = s.options;
    let raw = req.raw;
    let task_res =
        task::spawn_blocking(move || engine::run(&code, &mapping, direction, raw, &options)).await;

    drop(permit);

    match task_res {
        Ok(outcome) => {
            logs.push(format!("warnings={}", outcome.warnings.len()));
            (
                StatusCode::OK,
                Json(TranspileResp {
                    ok: true,
                    output: outcome.text,
                    warnings: outcome.warnings.iter().map(|w| w.to_string()).collect(),
                    logs,
                }),
            )
        }
        Err(e) => {
            tracing::error!("transpile task failed: {e}");
            logs.push(format!("join error: {e}"));
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(TranspileResp::failed(
                    "ERROR: internal error while transpiling",
                    logs,
                )),
            )
        }
    }
}

async fn api_language(State(s): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    if let Some(expected) = &s.api_key {
        if !api_key_matches(&headers, expected) {
            return (
                StatusCode::UNAUTHORIZED,
                Json(TranspileResp::failed(
                    "ERROR: missing or invalid API key",
                    vec!["auth: missing or invalid API key".into()],
                )),
            )
                .into_response();
        }
    }

    let info = s.mapping.language_info();
    Json(LanguageResp {
        ok: true,
        info: info.clone(),
        extension: info.extension().to_string(),
        keywords: s.mapping.keywords().len(),
        special_patterns: s.mapping.special_patterns().len(),
    })
    .into_response()
}
