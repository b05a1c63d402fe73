//! Axum handlers for `/api/*` routes.

use std::time::Instant;

use axum::{
    Json,
    body::Bytes,
    extract::{FromRequest, Multipart, Request, State},
    http::{StatusCode, header::CONTENT_TYPE},
};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{Instrument, debug, info, info_span};
use uuid::Uuid;

use super::{ApiError, AppState};
use crate::catalog::OneOrMany;
use crate::compositor::CompositeTier;
use crate::core::config::ColorSwatch;
use crate::matcher::{PreferenceQuery, ScoredMatch};

const ALLOWED_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

// ── Request / response types ──────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct MatchJson {
    #[serde(default)]
    wall_image: Option<String>,
    #[serde(default)]
    category: Option<OneOrMany>,
    #[serde(default)]
    categories: Option<OneOrMany>,
    #[serde(default)]
    color: Option<OneOrMany>,
    #[serde(default)]
    colors: Option<OneOrMany>,
    #[serde(default)]
    budget: Option<BudgetField>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum BudgetField {
    Number(f64),
    Text(String),
}

#[derive(Debug, Serialize)]
struct MatchResponse {
    success: bool,
    artworks: Vec<ScoredMatch>,
    composite_image: String,
    composite_tier: CompositeTier,
}

/// A validated `/api/match` request.
#[derive(Debug)]
struct MatchInput {
    wall: Vec<u8>,
    categories: Vec<String>,
    colors: Vec<String>,
    budget: f64,
}

// ── Handlers ──────────────────────────────────────────────────────────────────

/// GET /api/health
pub(super) async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "artworks": state.matcher.catalog().len(),
        "provider": state.compositor.provider().name(),
    }))
}

/// GET /api/categories
pub(super) async fn categories(State(state): State<AppState>) -> Json<Vec<String>> {
    Json(state.vocabulary.categories.clone())
}

/// GET /api/colors
pub(super) async fn colors(State(state): State<AppState>) -> Json<Vec<ColorSwatch>> {
    Json(state.vocabulary.colors.clone())
}

/// POST /api/match. Accepts JSON or multipart, dispatched on `Content-Type`.
pub(super) async fn match_artworks(
    State(state): State<AppState>,
    request: Request,
) -> Result<Json<Value>, ApiError> {
    let span = info_span!("match", request_id = %Uuid::new_v4());
    handle_match(state, request).instrument(span).await
}

async fn handle_match(state: AppState, request: Request) -> Result<Json<Value>, ApiError> {
    let started = Instant::now();
    let input = read_input(&state, request).await?;

    info!(
        wall_bytes = input.wall.len(),
        categories = ?input.categories,
        colors = ?input.colors,
        budget = input.budget,
        "match request"
    );

    let query = PreferenceQuery::new(&input.categories, &input.colors, input.budget);
    let artworks = state.matcher.find_matches(&query);
    if artworks.is_empty() {
        info!("no matching artworks");
        return Err(ApiError::NoMatch);
    }

    let composite = state.compositor.composite(&input.wall, &artworks).await;

    info!(
        matches = artworks.len(),
        tier = composite.tier.as_str(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "match response"
    );

    let body = MatchResponse {
        success: true,
        composite_image: composite.to_data_uri(),
        composite_tier: composite.tier,
        artworks,
    };
    serde_json::to_value(body)
        .map(Json)
        .map_err(|e| ApiError::Internal(e.to_string()))
}

// ── Input parsing ─────────────────────────────────────────────────────────────

async fn read_input(state: &AppState, request: Request) -> Result<MatchInput, ApiError> {
    let is_multipart = request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.trim_start().to_ascii_lowercase().starts_with("multipart/form-data"));

    if is_multipart {
        let multipart = Multipart::from_request(request, state)
            .await
            .map_err(|e| rejection(e.status(), e.body_text()))?;
        read_multipart(multipart).await
    } else {
        let body = Bytes::from_request(request, state)
            .await
            .map_err(|e| rejection(e.status(), e.body_text()))?;
        read_json(&body)
    }
}

fn read_json(body: &[u8]) -> Result<MatchInput, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(ApiError::Validation("No wall image provided".into()));
    }
    let req: MatchJson = serde_json::from_slice(body)
        .map_err(|e| ApiError::Validation(format!("Malformed request body: {e}")))?;

    let encoded = req
        .wall_image
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| ApiError::Validation("No wall image provided".into()))?;
    let wall = decode_wall_image(&encoded)?;

    let budget = match req.budget {
        None => 0.0,
        Some(BudgetField::Number(n)) => check_budget(n)?,
        Some(BudgetField::Text(s)) => parse_budget(&s)?,
    };

    // Singular and plural spellings accumulate, as in multipart.
    Ok(MatchInput {
        wall,
        categories: merge_tags(req.category, req.categories),
        colors: merge_tags(req.color, req.colors),
        budget,
    })
}

fn merge_tags(singular: Option<OneOrMany>, plural: Option<OneOrMany>) -> Vec<String> {
    singular
        .into_iter()
        .chain(plural)
        .flat_map(OneOrMany::into_vec)
        .collect()
}

async fn read_multipart(mut multipart: Multipart) -> Result<MatchInput, ApiError> {
    let mut wall = None;
    let mut categories = Vec::new();
    let mut colors = Vec::new();
    let mut budget = 0.0;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| rejection(e.status(), e.body_text()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "wall_image" => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                if file_name.is_empty() {
                    return Err(ApiError::Validation("No selected file".into()));
                }
                if !allowed_file(&file_name) {
                    return Err(ApiError::Validation("Invalid file type".into()));
                }
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| rejection(e.status(), e.body_text()))?;
                debug!(%file_name, bytes = bytes.len(), "wall image uploaded");
                wall = Some(bytes.to_vec());
            }
            "category" | "categories" | "color" | "colors" | "budget" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| rejection(e.status(), e.body_text()))?;
                match name.as_str() {
                    "category" | "categories" => categories.push(text),
                    "color" | "colors" => colors.push(text),
                    _ => budget = parse_budget(&text)?,
                }
            }
            other => debug!(field = %other, "ignoring unknown form field"),
        }
    }

    let wall = wall
        .filter(|w| !w.is_empty())
        .ok_or_else(|| ApiError::Validation("No wall image provided".into()))?;

    Ok(MatchInput { wall, categories, colors, budget })
}

/// Base64 payload, optionally behind a `data:<mime>;base64,` prefix.
fn decode_wall_image(encoded: &str) -> Result<Vec<u8>, ApiError> {
    let payload = match encoded.trim().strip_prefix("data:") {
        Some(rest) => rest
            .split_once(',')
            .map(|(_, data)| data)
            .ok_or_else(|| ApiError::Validation("Malformed data URI".into()))?,
        None => encoded,
    };
    let compact: String = payload.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    let bytes = BASE64
        .decode(compact.as_bytes())
        .map_err(|e| ApiError::Validation(format!("Invalid base64 wall image: {e}")))?;
    if bytes.is_empty() {
        return Err(ApiError::Validation("No wall image provided".into()));
    }
    Ok(bytes)
}

/// Blank means 0.
fn parse_budget(raw: &str) -> Result<f64, ApiError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(0.0);
    }
    let value = trimmed
        .parse::<f64>()
        .map_err(|_| ApiError::Validation(format!("Invalid budget: {trimmed}")))?;
    check_budget(value)
}

fn check_budget(value: f64) -> Result<f64, ApiError> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(ApiError::Validation(format!("Invalid budget: {value}")))
    }
}

fn allowed_file(file_name: &str) -> bool {
    file_name
        .rsplit_once('.')
        .is_some_and(|(_, ext)| ALLOWED_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
}

/// Map an axum extractor failure onto the API error taxonomy.
fn rejection(status: StatusCode, text: String) -> ApiError {
    if status == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::TooLarge(text)
    } else if status.is_server_error() {
        ApiError::Internal(text)
    } else {
        ApiError::Validation(text)
    }
}
