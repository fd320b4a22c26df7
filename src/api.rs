// University Budget - REST API with Axum
//
// Same in-memory store as the dashboard, shared across requests.

use crate::error::BudgetError;
use crate::export::{to_csv_string, EXPORT_FILE_NAME};
use crate::metrics::{
    chart_points, per_student, serialize_whole, summary, ChartPoint, SummaryLine,
};
use crate::record::{BudgetRecord, Field};
use crate::store::RecordStore;
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post, put},
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    store: Arc<Mutex<RecordStore>>,
}

impl AppState {
    pub fn new(store: RecordStore) -> Self {
        Self {
            store: Arc::new(Mutex::new(store)),
        }
    }

    // Poisoned locks are recovered; edits are single-field writes
    fn store(&self) -> MutexGuard<'_, RecordStore> {
        self.store.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// API Response wrapper
#[derive(Serialize)]
pub struct ApiResponse<T> {
    success: bool,
    data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
            error: None,
        }
    }

    fn err(data: T, error: String) -> Self {
        Self {
            success: false,
            data,
            error: Some(error),
        }
    }
}

/// Record plus its derived value
#[derive(Serialize)]
struct RecordResponse {
    id: String,
    name: String,
    budget: f64,
    students: u64,
    #[serde(serialize_with = "serialize_whole")]
    per_student: f64,
}

impl From<&BudgetRecord> for RecordResponse {
    fn from(record: &BudgetRecord) -> Self {
        Self {
            id: record.id.clone(),
            name: record.name.clone(),
            budget: record.budget,
            students: record.students,
            per_student: per_student(record),
        }
    }
}

/// Body of PUT /api/records/:id
///
/// `value` may be a JSON string or number; either is coerced like typed text.
#[derive(Deserialize)]
pub struct UpdateRequest {
    pub field: Field,
    #[serde(default)]
    pub value: serde_json::Value,
}

impl UpdateRequest {
    /// The value as the text a user would have typed
    pub fn value_text(&self) -> String {
        match &self.value {
            serde_json::Value::String(s) => s.clone(),
            serde_json::Value::Null => String::new(),
            other => other.to_string(),
        }
    }
}

fn record_list(store: &RecordStore) -> Vec<RecordResponse> {
    store.records().iter().map(RecordResponse::from).collect()
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::ok("OK"))
}

/// GET /api/records - All records with per-student values
async fn get_records(State(state): State<AppState>) -> impl IntoResponse {
    let store = state.store();
    Json(ApiResponse::ok(record_list(&store)))
}

/// PUT /api/records/:id - Edit one field
async fn update_record(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateRequest>, JsonRejection>,
) -> Response {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            tracing::warn!("update body rejected: {}", rejection.body_text());
            return (
                rejection.status(),
                Json(ApiResponse::<Option<RecordResponse>>::err(None, rejection.body_text())),
            )
                .into_response();
        }
    };

    let mut store = state.store();

    match store.update_field(&id, request.field, &request.value_text()) {
        Ok(()) => {
            let record = store.get(&id).map(RecordResponse::from);
            (StatusCode::OK, Json(ApiResponse::ok(record))).into_response()
        }
        Err(e @ BudgetError::UnknownRecord(_)) => {
            tracing::warn!("update rejected: {}", e);
            (
                StatusCode::NOT_FOUND,
                Json(ApiResponse::<Option<RecordResponse>>::err(None, e.to_string())),
            )
                .into_response()
        }
        Err(e) => {
            tracing::error!("update failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::<Option<RecordResponse>>::err(None, e.to_string())),
            )
                .into_response()
        }
    }
}

/// POST /api/reset - Restore the default universities
async fn reset_records(State(state): State<AppState>) -> impl IntoResponse {
    let mut store = state.store();
    store.reset();
    Json(ApiResponse::ok(record_list(&store)))
}

/// GET /api/chart - Bar chart data keyed by id
async fn get_chart(State(state): State<AppState>) -> impl IntoResponse {
    let points: Vec<ChartPoint> = chart_points(state.store().records());
    Json(ApiResponse::ok(points))
}

/// GET /api/summary - Per-student summary lines
async fn get_summary(State(state): State<AppState>) -> impl IntoResponse {
    let lines: Vec<SummaryLine> = summary(state.store().records());
    Json(ApiResponse::ok(lines))
}

/// GET /api/export.csv - CSV download
async fn export_csv(State(state): State<AppState>) -> Response {
    let csv = to_csv_string(state.store().records());

    match csv {
        Ok(body) => (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, "text/csv".to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{}\"", EXPORT_FILE_NAME),
                ),
            ],
            body,
        )
            .into_response(),
        Err(e) => {
            tracing::error!("CSV export failed: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}

/// Build the full router around a shared store
pub fn router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/records", get(get_records))
        .route("/records/:id", put(update_record))
        .route("/reset", post(reset_records))
        .route("/chart", get(get_chart))
        .route("/summary", get(get_summary))
        .route("/export.csv", get(export_csv))
        .with_state(state);

    Router::new()
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use tower::ServiceExt;

    async fn send(
        app: Router,
        request: Request<Body>,
    ) -> (StatusCode, Vec<u8>, axum::http::HeaderMap) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, body.to_vec(), headers)
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn put_json(uri: &str, json: &str) -> Request<Body> {
        Request::builder()
            .method("PUT")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let app = router(AppState::new(RecordStore::new()));
        let (status, body, _) = send(app, get_request("/api/health")).await;

        assert_eq!(status, StatusCode::OK);
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["data"], "OK");
    }

    #[tokio::test]
    async fn test_get_records_includes_per_student() {
        let app = router(AppState::new(RecordStore::new()));
        let (status, body, _) = send(app, get_request("/api/records")).await;

        assert_eq!(status, StatusCode::OK);
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["data"].as_array().unwrap().len(), 6);
        assert_eq!(json["data"][0]["id"], "DU");
        assert_eq!(json["data"][0]["per_student"], 279_715);
    }

    #[tokio::test]
    async fn test_update_record() {
        let state = AppState::new(RecordStore::new());
        let app = router(state.clone());

        let (status, body, _) = send(
            app,
            put_json("/api/records/KU", r#"{"field":"budget","value":"1000000000"}"#),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["data"]["per_student"], 100_000);
        assert_eq!(state.store().get("KU").unwrap().budget, 1_000_000_000.0);
    }

    #[tokio::test]
    async fn test_update_unknown_record_is_404() {
        let app = router(AppState::new(RecordStore::new()));
        let (status, body, _) = send(
            app,
            put_json("/api/records/NOPE", r#"{"field":"name","value":"x"}"#),
        )
        .await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["success"], false);
    }

    #[tokio::test]
    async fn test_update_with_numeric_value() {
        let state = AppState::new(RecordStore::new());
        let (status, body, _) = send(
            router(state.clone()),
            put_json("/api/records/CU", r#"{"field":"budget","value":5000000000}"#),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["data"]["per_student"], 200_000);
        assert_eq!(state.store().get("CU").unwrap().budget, 5_000_000_000.0);
    }

    #[tokio::test]
    async fn test_update_null_value_coerces_to_zero() {
        let state = AppState::new(RecordStore::new());
        let (status, _, _) = send(
            router(state.clone()),
            put_json("/api/records/DU", r#"{"field":"students","value":null}"#),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(state.store().get("DU").unwrap().students, 0);
    }

    #[tokio::test]
    async fn test_update_unknown_field_uses_envelope() {
        let state = AppState::new(RecordStore::new());
        let (status, body, _) = send(
            router(state.clone()),
            put_json("/api/records/DU", r#"{"field":"id","value":"x"}"#),
        )
        .await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["success"], false);
        assert!(json["data"].is_null());
        assert!(json["error"].as_str().unwrap().contains("unknown variant"));
        assert_eq!(state.store().get("DU").unwrap().id, "DU");
    }

    #[tokio::test]
    async fn test_update_malformed_body_uses_envelope() {
        let app = router(AppState::new(RecordStore::new()));
        let (status, body, _) = send(app, put_json("/api/records/DU", "{not json")).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["success"], false);
    }

    #[tokio::test]
    async fn test_reset() {
        let state = AppState::new(RecordStore::new());
        state.store().update_field("DU", Field::Name, "Changed").unwrap();

        let request = Request::builder()
            .method("POST")
            .uri("/api/reset")
            .body(Body::empty())
            .unwrap();
        let (status, _, _) = send(router(state.clone()), request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(state.store().get("DU").unwrap().name, "Dhaka University");
    }

    #[tokio::test]
    async fn test_chart_data() {
        let app = router(AppState::new(RecordStore::new()));
        let (_, body, _) = send(app, get_request("/api/chart")).await;

        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["data"][2]["name"], "JNU");
        assert_eq!(json["data"][2]["per"], 248_183);
    }

    #[tokio::test]
    async fn test_export_csv_download() {
        let app = router(AppState::new(RecordStore::new()));
        let (status, body, headers) = send(app, get_request("/api/export.csv")).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(headers[header::CONTENT_TYPE], "text/csv");
        assert_eq!(
            headers[header::CONTENT_DISPOSITION],
            "attachment; filename=\"university_budget_per_student.csv\""
        );

        let text = String::from_utf8(body).unwrap();
        assert_eq!(text.lines().count(), 7);
        assert!(text.starts_with("University,Budget_Tk,Students,Per_Student_Tk\n"));
    }
}
