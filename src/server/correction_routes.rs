//! Movie identity correction and re-enrichment routes.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{header, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde::Serialize;
use serde_json::Value;
use tower_http::set_header::SetResponseHeaderLayer;
use tracing::debug;

use super::metrics::set_movies_total;
use super::state::{GuardedMovieStore, GuardedResolver, ServerState};
use crate::correction::{parse_movie_id, CorrectionError};
use crate::movie_store::EnrichmentSummary;

const CORRECT_ID_METHODS: &str = "POST, OPTIONS";
const REENRICH_METHODS: &str = "POST";

#[derive(Serialize)]
struct CorrectIdResponse {
    ok: bool,
    #[serde(rename = "newId")]
    new_id: i64,
    redirect: String,
}

#[derive(Serialize)]
struct ReenrichResponse {
    ok: bool,
    id: i64,
    inserted: EnrichmentSummary,
}

fn error_response(err: &CorrectionError) -> Response {
    let status =
        StatusCode::from_u16(err.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(err.to_response())).into_response()
}

fn method_not_allowed(method: &Method, allowed: &'static str) -> Response {
    let mut response = error_response(&CorrectionError::MethodNotAllowed(method.to_string()));
    response
        .headers_mut()
        .insert(header::ALLOW, HeaderValue::from_static(allowed));
    response
}

fn parse_correction_body(
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<(i64, i64), CorrectionError> {
    let Json(body) = payload.map_err(|rejection| CorrectionError::InvalidArgument {
        message: "Request body must be a JSON object".to_string(),
        hint: Some(rejection.body_text()),
        got: None,
    })?;
    if !body.is_object() {
        return Err(CorrectionError::InvalidArgument {
            message: "Request body must be a JSON object".to_string(),
            hint: None,
            got: Some(body),
        });
    }
    let placeholder_id = parse_movie_id("tempId", body.get("tempId"))?;
    let canonical_id = parse_movie_id("newId", body.get("newId"))?;
    Ok((placeholder_id, canonical_id))
}

/// POST /correct-id
async fn correct_id(
    State(resolver): State<GuardedResolver>,
    State(movie_store): State<GuardedMovieStore>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Response {
    let (placeholder_id, canonical_id) = match parse_correction_body(payload) {
        Ok(ids) => ids,
        Err(err) => return error_response(&err),
    };

    match resolver.correct(placeholder_id, canonical_id).await {
        Ok(outcome) => {
            set_movies_total(movie_store.get_movies_count());
            Json(CorrectIdResponse {
                ok: true,
                new_id: outcome.canonical_id,
                redirect: outcome.redirect_path,
            })
            .into_response()
        }
        Err(err) => {
            debug!("Correction {} -> {} rejected: {}", placeholder_id, canonical_id, err);
            error_response(&err)
        }
    }
}

/// OPTIONS /correct-id - CORS preflight. Headers come from the router layers.
async fn preflight() -> StatusCode {
    StatusCode::NO_CONTENT
}

async fn correct_id_method_not_allowed(method: Method) -> Response {
    method_not_allowed(&method, CORRECT_ID_METHODS)
}

async fn reenrich_method_not_allowed(method: Method) -> Response {
    method_not_allowed(&method, REENRICH_METHODS)
}

/// POST /{id}/reenrich
async fn reenrich(State(resolver): State<GuardedResolver>, Path(id): Path<String>) -> Response {
    let movie_id = match parse_movie_id("id", Some(&Value::String(id))) {
        Ok(id) => id,
        Err(err) => return error_response(&err),
    };

    match resolver.reenrich(movie_id).await {
        Ok(outcome) => Json(ReenrichResponse {
            ok: true,
            id: outcome.movie_id,
            inserted: outcome.inserted,
        })
        .into_response(),
        Err(err) => error_response(&err),
    }
}

pub fn make_correction_routes(state: ServerState) -> anyhow::Result<Router> {
    let allow_origin = HeaderValue::from_str(&state.config.cors_allow_origin)?;

    Ok(Router::new()
        .route(
            "/correct-id",
            post(correct_id)
                .options(preflight)
                .fallback(correct_id_method_not_allowed),
        )
        .route(
            "/{id}/reenrich",
            post(reenrich).fallback(reenrich_method_not_allowed),
        )
        .layer(SetResponseHeaderLayer::if_not_present(
            header::ACCESS_CONTROL_ALLOW_ORIGIN,
            allow_origin,
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static(CORRECT_ID_METHODS),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static("content-type"),
        ))
        .with_state(state))
}
