//! Liveness and demo endpoints.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use tracing::{error, instrument};

use crate::{
    accounts::{
        dto::{FailureResponse, LoginRequest},
        handlers::{bad_json, Rejection},
    },
    bootstrap::{ADMIN_EMAIL, ADMIN_PASSWORD, ADMIN_USERNAME},
    state::AppState,
};

#[derive(Debug, Serialize)]
pub struct ApiStatus {
    pub message: &'static str,
}

#[derive(Debug, Serialize)]
pub struct Solution {
    pub solution: i32,
}

#[derive(Debug, Serialize)]
pub struct StoreCheckResponse {
    pub success: bool,
    pub message: &'static str,
    pub data: Vec<Solution>,
}

#[derive(Debug, Serialize)]
pub struct StoreCheckFailure {
    pub success: bool,
    pub message: &'static str,
    pub error: String,
}

#[derive(Debug, Serialize)]
pub struct DemoUser {
    pub username: &'static str,
    pub email: &'static str,
}

#[derive(Debug, Serialize)]
pub struct DemoLoginResponse {
    pub success: bool,
    pub message: &'static str,
    pub user: DemoUser,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(root))
        .route("/api/test", get(api_status))
        .route("/api/test-db", get(test_db))
        .route("/api/test-login", post(test_login))
}

pub async fn root() -> &'static str {
    "School Login API is running..."
}

pub async fn api_status() -> Json<ApiStatus> {
    Json(ApiStatus {
        message: "API is working",
    })
}

#[instrument(skip(state))]
pub async fn test_db(
    State(state): State<AppState>,
) -> Result<Json<StoreCheckResponse>, (StatusCode, Json<StoreCheckFailure>)> {
    match state.accounts.check_store().await {
        Ok(solution) => Ok(Json(StoreCheckResponse {
            success: true,
            message: "Database connected successfully",
            data: vec![Solution { solution }],
        })),
        Err(e) => {
            error!(error = %e, "store check failed");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(StoreCheckFailure {
                    success: false,
                    message: "Database connection failed",
                    error: e.to_string(),
                }),
            ))
        }
    }
}

/// Fixed-credential login that never touches the store.
#[instrument(skip(payload))]
pub async fn test_login(
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<DemoLoginResponse>, Rejection> {
    let Json(payload) = payload.map_err(bad_json)?;
    if payload.username.as_deref() == Some(ADMIN_USERNAME)
        && payload.password.as_deref() == Some(ADMIN_PASSWORD)
    {
        Ok(Json(DemoLoginResponse {
            success: true,
            message: "Test login successful",
            user: DemoUser {
                username: ADMIN_USERNAME,
                email: ADMIN_EMAIL,
            },
        }))
    } else {
        Err((
            StatusCode::UNAUTHORIZED,
            Json(FailureResponse::new("Invalid credentials")),
        ))
    }
}
