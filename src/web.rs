use std::collections::HashMap;
use std::sync::{Arc, LazyLock};

use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Form, Json, Router};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::orchestrator::{ReviewOrchestrator, ReviewResult};
use crate::providers::{AnyProvider, ProviderKind};
use crate::report::score_color;

const INDEX_TEMPLATE: &str = include_str!("templates/index.html");

static PAGE_ENGINE: LazyLock<std::result::Result<upon::Engine<'static>, String>> =
    LazyLock::new(|| {
        let mut engine = upon::Engine::new();
        engine
            .add_template("index", INDEX_TEMPLATE)
            .map_err(|e| format!("invalid page template: {e}"))?;
        Ok(engine)
    });

/// Shared, read-only state: one client per configured provider and the
/// orchestrator. Built once at startup.
pub struct AppState {
    pub providers: HashMap<ProviderKind, AnyProvider>,
    pub orchestrator: ReviewOrchestrator,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index).post(submit_form))
        .route("/api/review", post(api_review))
        .with_state(state)
}

pub async fn serve(addr: &str, state: Arc<AppState>) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(addr, "web form listening");
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| Error::Server(e.to_string()))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for shutdown signal");
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ReviewForm {
    provider: Option<String>,
    repo: Option<String>,
    pr: Option<String>,
}

/// `pr` stays untyped so a string or negative number reaches the same
/// validation as the form.
#[derive(Debug, Deserialize)]
pub struct ApiReviewRequest {
    provider: Option<String>,
    repo: Option<String>,
    pr: Option<serde_json::Value>,
}

fn json_field_text(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[derive(Serialize)]
struct ProviderOption {
    name: &'static str,
    selected: bool,
}

#[derive(Serialize)]
struct Row {
    filename: String,
    status: String,
    score: String,
    color: &'static str,
    comments: String,
}

#[derive(Serialize)]
struct PageVars {
    providers: Vec<ProviderOption>,
    repo: String,
    pr: String,
    has_error: bool,
    error: String,
    has_results: bool,
    rows: Vec<Row>,
}

async fn index() -> Response {
    render_page(&ReviewForm::default(), None, &[])
}

async fn submit_form(
    State(state): State<Arc<AppState>>,
    Form(form): Form<ReviewForm>,
) -> Response {
    let request = match validate_form(&state, &form) {
        Ok(request) => request,
        Err(message) => return render_page(&form, Some(&message), &[]),
    };

    match run_review(state, request).await {
        Ok(results) => render_page(&form, None, &results),
        Err(e) => {
            warn!(error = %e, "review request failed");
            render_page(&form, Some(&e.to_string()), &[])
        }
    }
}

async fn api_review(
    State(state): State<Arc<AppState>>,
    body: std::result::Result<Json<ApiReviewRequest>, JsonRejection>,
) -> Response {
    let Json(body) = match body {
        Ok(body) => body,
        Err(rejection) => {
            return json_error(StatusCode::BAD_REQUEST, &rejection.body_text());
        }
    };
    let form = ReviewForm {
        provider: body.provider,
        repo: body.repo,
        pr: body.pr.as_ref().map(json_field_text),
    };
    let request = match validate_form(&state, &form) {
        Ok(request) => request,
        Err(message) => return json_error(StatusCode::BAD_REQUEST, &message),
    };

    match run_review(state, request).await {
        Ok(results) => Json(serde_json::json!({ "results": results })).into_response(),
        Err(e @ Error::Server(_)) => json_error(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string()),
        Err(e) => {
            warn!(error = %e, "review request failed");
            json_error(StatusCode::BAD_GATEWAY, &e.to_string())
        }
    }
}

#[derive(Debug)]
struct ReviewRequest {
    provider: ProviderKind,
    repo: String,
    pr: u64,
}

fn present(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn validate_form(
    state: &AppState,
    form: &ReviewForm,
) -> std::result::Result<ReviewRequest, String> {
    let (Some(provider), Some(repo), Some(pr)) = (
        present(&form.provider),
        present(&form.repo),
        present(&form.pr),
    ) else {
        return Err("All fields (provider, repo, pr) are required.".to_string());
    };

    let kind = provider
        .parse::<ProviderKind>()
        .ok()
        .filter(|k| state.providers.contains_key(k))
        .ok_or_else(|| format!("Invalid provider selected: {provider}"))?;

    let pr = pr
        .parse::<u64>()
        .map_err(|_| "PR number must be an integer.".to_string())?;

    Ok(ReviewRequest {
        provider: kind,
        repo,
        pr,
    })
}

/// Runs the blocking fetch-and-review on the blocking pool.
async fn run_review(state: Arc<AppState>, request: ReviewRequest) -> Result<Vec<ReviewResult>> {
    tokio::task::spawn_blocking(move || {
        let provider = state.providers.get(&request.provider).ok_or_else(|| {
            Error::Configuration(format!("{} provider is not configured", request.provider))
        })?;
        state
            .orchestrator
            .review_pull_request(provider, &request.repo, request.pr)
    })
    .await
    .map_err(|e| Error::Server(format!("review task failed: {e}")))?
}

fn json_error(status: StatusCode, message: &str) -> Response {
    (status, Json(serde_json::json!({ "error": message }))).into_response()
}

fn render_page(form: &ReviewForm, error: Option<&str>, results: &[ReviewResult]) -> Response {
    let selected = form
        .provider
        .as_deref()
        .and_then(|p| p.parse::<ProviderKind>().ok())
        .unwrap_or(ProviderKind::GitHub);

    let vars = PageVars {
        providers: ProviderKind::ALL
            .iter()
            .map(|k| ProviderOption {
                name: k.as_str(),
                selected: *k == selected,
            })
            .collect(),
        repo: escape_html(form.repo.as_deref().unwrap_or_default()),
        pr: escape_html(form.pr.as_deref().unwrap_or_default()),
        has_error: error.is_some(),
        error: escape_html(error.unwrap_or_default()),
        has_results: !results.is_empty(),
        rows: results
            .iter()
            .map(|r| Row {
                filename: escape_html(&r.filename),
                status: r.status.to_string(),
                score: r.score.to_string(),
                color: score_color(r.score),
                comments: escape_html(&r.comments),
            })
            .collect(),
    };

    match render_index(&vars) {
        Ok(html) => Html(html).into_response(),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
    }
}

fn render_index(vars: &PageVars) -> Result<String> {
    let engine = PAGE_ENGINE.as_ref().map_err(|e| Error::Server(e.clone()))?;
    engine
        .template("index")
        .render(vars)
        .to_string()
        .map_err(|e| Error::Server(format!("failed to render page: {e}")))
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
