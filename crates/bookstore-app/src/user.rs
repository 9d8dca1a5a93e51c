use crate::{
    auth::token::ApiClaim,
    error::{ApiError, ApiResult},
    repository_from_request,
};
use axum_valid::Garde;
use bookstore_dal::user::{CreateUser, UserRepository};

use axum::{
    extract::Path,
    response::IntoResponse,
    routing::{delete, post},
    Json,
};
use http::StatusCode;

use crate::state::AppState;

repository_from_request!(UserRepository);

fn require_staff(claim: &ApiClaim) -> ApiResult<()> {
    if claim.is_staff {
        Ok(())
    } else {
        Err(ApiError::PermissionDenied)
    }
}

async fn create_user(
    api_user: ApiClaim,
    user_registry: UserRepository,
    Garde(Json(payload)): Garde<Json<CreateUser>>,
) -> ApiResult<impl IntoResponse> {
    require_staff(&api_user)?;
    let user = user_registry.create(payload).await?;

    Ok((StatusCode::CREATED, Json(user)))
}

async fn list_users(
    api_user: ApiClaim,
    user_registry: UserRepository,
) -> ApiResult<impl IntoResponse> {
    require_staff(&api_user)?;
    let users = user_registry.list(100).await?;
    Ok((StatusCode::OK, Json(users)))
}

async fn delete_user(
    api_user: ApiClaim,
    Path(id): Path<i64>,
    user_registry: UserRepository,
) -> ApiResult<impl IntoResponse> {
    require_staff(&api_user)?;
    user_registry.delete(id).await?;

    Ok((StatusCode::NO_CONTENT, ()))
}

pub fn users_router() -> axum::Router<AppState> {
    axum::Router::new()
        .route("/", post(create_user).get(list_users))
        .route("/{id}", delete(delete_user))
}
