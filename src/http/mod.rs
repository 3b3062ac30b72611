//! HTTP surface: form page, about page and the JSON prediction endpoint.
//!
//! Routes:
//! - `GET /`        input form
//! - `GET /about`   static informational page
//! - `POST /predict` form-encoded attributes in, JSON scores out
//!
//! Status mapping for `/predict`: 200 on success, 500 while the artifacts are
//! unavailable, 400 for anything wrong with the request or its inference.

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::rejection::FormRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Form, Json, Router};
use serde::Serialize;

use crate::application::ScoringService;
use crate::domain::PredictionResult;
use crate::ports::{Preprocessor, Regressor};
use crate::ScorecastError;

const INDEX_HTML: &str = include_str!("../../templates/index.html");
const ABOUT_HTML: &str = include_str!("../../templates/about.html");

/// JSON body returned for every failed prediction.
#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

/// Error returned by HTTP handlers.
#[derive(Debug)]
pub enum ApiError {
    /// Failure raised by the scoring pipeline.
    Scoring(ScorecastError),
    /// Request body could not be decoded as a form.
    BadForm(String),
}

impl From<ScorecastError> for ApiError {
    fn from(e: ScorecastError) -> Self {
        Self::Scoring(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::Scoring(e) if e.is_server_fault() => {
                (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
            }
            Self::Scoring(e) => (StatusCode::BAD_REQUEST, e.to_string()),
            Self::BadForm(message) => (StatusCode::BAD_REQUEST, message),
        };
        (status, Json(ErrorBody { error: message })).into_response()
    }
}

/// Build the application router around a shared scoring service.
pub fn router<P, M>(service: Arc<ScoringService<P, M>>) -> Router
where
    P: Preprocessor + 'static,
    M: Regressor + 'static,
{
    Router::new()
        .route("/", get(index))
        .route("/about", get(about))
        .route("/predict", post(predict::<P, M>))
        .with_state(service)
}

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn about() -> Html<&'static str> {
    Html(ABOUT_HTML)
}

async fn predict<P, M>(
    State(service): State<Arc<ScoringService<P, M>>>,
    form: Result<Form<Vec<(String, String)>>, FormRejection>,
) -> Result<Json<PredictionResult>, ApiError>
where
    P: Preprocessor + 'static,
    M: Regressor + 'static,
{
    let Form(pairs) = match form {
        Ok(form) => form,
        Err(rejection) => {
            service.ensure_ready()?;
            tracing::debug!("Rejected prediction request: {}", rejection.body_text());
            return Err(ApiError::BadForm(rejection.body_text()));
        }
    };

    let fields = first_values(pairs);
    match service.predict_form(&fields) {
        Ok(result) => Ok(Json(result)),
        Err(e) => {
            tracing::debug!("Prediction failed: {}", e);
            Err(e.into())
        }
    }
}

/// Collapse repeated form keys, keeping the first value submitted for each.
fn first_values(pairs: Vec<(String, String)>) -> HashMap<String, String> {
    let mut fields = HashMap::with_capacity(pairs.len());
    for (key, value) in pairs {
        fields.entry(key).or_insert(value);
    }
    fields
}
