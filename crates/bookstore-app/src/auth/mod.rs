pub mod token;

use axum::{extract::State, response::IntoResponse, routing::post, Json};
use tracing::error;

use crate::{
    error::{ApiError, ApiResult},
    state::AppState,
};
use bookstore_dal::user::UserRepository;

#[derive(serde::Deserialize)]
struct LoginCredentials {
    username: String,
    password: String,
}

#[derive(serde::Serialize)]
struct TokenResponse {
    token: String,
}

async fn login(
    State(state): State<AppState>,
    user_registry: UserRepository,
    Json(credentials): Json<LoginCredentials>,
) -> ApiResult<impl IntoResponse> {
    let user = user_registry
        .check_password(&credentials.username, &credentials.password)
        .await?;

    let token = state.tokens().issue(token::ApiClaim::new(&user)).map_err(|e| {
        error!("Failed to issue token: {e}");
        ApiError::InternalError("Failed to issue token".to_string())
    })?;

    Ok(Json(TokenResponse { token }))
}

/// Builds authentication router - must be nested on /auth path!
pub fn auth_router() -> axum::Router<AppState> {
    axum::Router::new().route("/login", post(login))
}
