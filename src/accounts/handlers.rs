use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use tracing::{error, instrument};

use crate::{
    accounts::{
        dto::{FailureResponse, LoginRequest, LoginResponse, RegisterRequest, RegisterResponse},
        error::AccountError,
    },
    state::AppState,
};

pub type Rejection = (StatusCode, Json<FailureResponse>);

pub fn account_routes() -> Router<AppState> {
    Router::new()
        .route("/api/login", post(login))
        .route("/api/register", post(register))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, Rejection> {
    let Json(payload) = payload.map_err(bad_json)?;
    let username = payload.username.unwrap_or_default();
    let password = payload.password.unwrap_or_default();

    let user = state
        .accounts
        .authenticate(&username, &password)
        .await
        .map_err(|e| {
            let code = e.code();
            let (status, Json(body)) = reject(e, "Server error");
            (status, Json(body.with_code(code)))
        })?;

    Ok(Json(LoginResponse {
        success: true,
        message: "Login successful".into(),
        user,
    }))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<Json<RegisterResponse>, Rejection> {
    let Json(payload) = payload.map_err(bad_json)?;
    let username = payload.username.unwrap_or_default();
    let password = payload.password.unwrap_or_default();
    let email = payload.email.unwrap_or_default();

    let user_id = state
        .accounts
        .register(&username, &password, &email)
        .await
        .map_err(|e| reject(e, "Registration failed"))?;

    Ok(Json(RegisterResponse {
        success: true,
        message: "User registered successfully".into(),
        user_id,
    }))
}

fn reject(e: AccountError, server_prefix: &str) -> Rejection {
    let status = e.status();
    if status.is_server_error() {
        error!(error = %e, "account operation failed");
    }
    (status, Json(FailureResponse::new(e.public_message(server_prefix))))
}

pub(crate) fn bad_json(rejection: JsonRejection) -> Rejection {
    (
        StatusCode::BAD_REQUEST,
        Json(FailureResponse::new(rejection.body_text())),
    )
}
