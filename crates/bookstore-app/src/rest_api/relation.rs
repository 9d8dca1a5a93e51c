use bookstore_dal::book::BookRepository;
use bookstore_dal::relation::{UpdateUserBookRelation, UserBookRelationRepository};

use crate::auth::token::ApiClaim;
use crate::error::ApiResult;
use crate::state::AppState;
use axum::{
    extract::Path,
    response::IntoResponse,
    routing::patch,
    Json,
};
use axum_valid::Garde;
use http::StatusCode;

crate::repository_from_request!(UserBookRelationRepository);

/// Upserts the caller's relation to the given book. The subject is always
/// the authenticated user, never taken from the request body.
async fn update_relation(
    Path(book_id): Path<i64>,
    books: BookRepository,
    relations: UserBookRelationRepository,
    api_user: ApiClaim,
    Garde(Json(payload)): Garde<Json<UpdateUserBookRelation>>,
) -> ApiResult<impl IntoResponse> {
    let user_id = api_user.user_id()?;
    let book = books.get(book_id).await?;
    let relation = relations.upsert(user_id, book.id, payload).await?;

    Ok((StatusCode::OK, Json(relation)))
}

pub fn router() -> axum::Router<AppState> {
    axum::Router::new().route("/{book_id}", patch(update_relation))
}
