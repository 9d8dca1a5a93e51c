use bookstore_dal::book::{Book, BookRepository, CreateBook};

use crate::auth::token::ApiClaim;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use axum::routing::get;

crate::repository_from_request!(BookRepository);

/// Mutating a book is allowed only for its owner or a staff user.
fn authorize_mutation(claim: &ApiClaim, book: &Book) -> ApiResult<()> {
    let caller_id = claim.user_id()?;
    if claim.is_staff || book.owner_id == Some(caller_id) {
        Ok(())
    } else {
        Err(ApiError::PermissionDenied)
    }
}

mod crud_api {
    use super::*;
    use crate::rest_api::BookListQuery;
    use axum::{
        extract::{Path, Query},
        response::IntoResponse,
        Json,
    };
    use axum_valid::Garde;
    use http::StatusCode;
    use tracing::debug;

    pub async fn list(
        repository: BookRepository,
        Garde(Query(query)): Garde<Query<BookListQuery>>,
    ) -> ApiResult<impl IntoResponse> {
        debug!("Listing books: {:?}", query);
        let filter = query.into_filter()?;
        let books = repository.list(filter).await?;
        Ok((StatusCode::OK, Json(books)))
    }

    pub async fn get_one(
        Path(id): Path<i64>,
        repository: BookRepository,
    ) -> ApiResult<impl IntoResponse> {
        let record = repository.get_annotated(id).await?;

        Ok((StatusCode::OK, Json(record)))
    }

    pub async fn create(
        repository: BookRepository,
        api_user: ApiClaim,
        Garde(Json(payload)): Garde<Json<CreateBook>>,
    ) -> ApiResult<impl IntoResponse> {
        let record = repository.create(payload, api_user.user_id()?).await?;

        Ok((StatusCode::CREATED, Json(record)))
    }

    pub async fn update(
        Path(id): Path<i64>,
        repository: BookRepository,
        api_user: ApiClaim,
        Garde(Json(payload)): Garde<Json<CreateBook>>,
    ) -> ApiResult<impl IntoResponse> {
        let book = repository.get(id).await?;
        authorize_mutation(&api_user, &book)?;
        let record = repository.update(id, payload).await?;

        Ok((StatusCode::OK, Json(record)))
    }

    pub async fn remove(
        Path(id): Path<i64>,
        repository: BookRepository,
        api_user: ApiClaim,
    ) -> ApiResult<impl IntoResponse> {
        let book = repository.get(id).await?;
        authorize_mutation(&api_user, &book)?;
        repository.delete(id).await?;

        Ok((StatusCode::NO_CONTENT, ()))
    }
}

pub fn router() -> axum::Router<AppState> {
    axum::Router::new()
        .route("/", get(crud_api::list).post(crud_api::create))
        .route(
            "/{id}",
            get(crud_api::get_one)
                .put(crud_api::update)
                .patch(crud_api::update)
                .delete(crud_api::remove),
        )
}
