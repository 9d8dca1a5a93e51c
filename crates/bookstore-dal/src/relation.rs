use crate::error::Result;
use garde::Validate;
use serde::{Deserialize, Serialize};
use sqlx::{Acquire as _, Pool};

/// Partial update of the caller's relation to one book. Absent fields are
/// left untouched.
#[derive(Debug, Serialize, Deserialize, Clone, Default, Validate)]
#[garde(allow_unvalidated)]
pub struct UpdateUserBookRelation {
    pub like: Option<bool>,
    pub in_bookmarks: Option<bool>,
    #[garde(range(min = 1, max = 5))]
    pub rate: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize, Clone, sqlx::FromRow)]
pub struct UserBookRelation {
    pub book_id: i64,
    #[sqlx(rename = "liked")]
    pub like: bool,
    pub in_bookmarks: bool,
    pub rate: Option<i64>,
}

pub type UserBookRelationRepository = UserBookRelationRepositoryImpl<Pool<crate::ChosenDB>>;

pub struct UserBookRelationRepositoryImpl<E> {
    executor: E,
}

impl<'c, E> UserBookRelationRepositoryImpl<E>
where
    for<'a> &'a E: sqlx::Executor<'c, Database = crate::ChosenDB>
        + sqlx::Acquire<'c, Database = crate::ChosenDB>,
{
    pub fn new(executor: E) -> Self {
        Self { executor }
    }

    /// Get-or-create guarded by the (user, book) uniqueness constraint, then
    /// apply the supplied fields. Runs in one transaction so a failed patch
    /// leaves nothing behind.
    pub async fn upsert(
        &self,
        user_id: i64,
        book_id: i64,
        payload: UpdateUserBookRelation,
    ) -> Result<UserBookRelation> {
        let mut conn = self.executor.acquire().await?;
        let mut transaction = conn.begin().await?;

        sqlx::query(
            "INSERT INTO user_book_relation (user_id, book_id) VALUES (?, ?) \
             ON CONFLICT (user_id, book_id) DO NOTHING",
        )
        .bind(user_id)
        .bind(book_id)
        .execute(&mut *transaction)
        .await?;

        sqlx::query(
            "UPDATE user_book_relation \
             SET liked = COALESCE(?, liked), \
                 in_bookmarks = COALESCE(?, in_bookmarks), \
                 rate = COALESCE(?, rate) \
             WHERE user_id = ? AND book_id = ?",
        )
        .bind(payload.like)
        .bind(payload.in_bookmarks)
        .bind(payload.rate)
        .bind(user_id)
        .bind(book_id)
        .execute(&mut *transaction)
        .await?;

        let relation = sqlx::query_as::<_, UserBookRelation>(
            "SELECT book_id, liked, in_bookmarks, rate FROM user_book_relation \
             WHERE user_id = ? AND book_id = ?",
        )
        .bind(user_id)
        .bind(book_id)
        .fetch_one(&mut *transaction)
        .await?;

        transaction.commit().await?;
        Ok(relation)
    }

    pub async fn get(&self, user_id: i64, book_id: i64) -> Result<Option<UserBookRelation>> {
        let relation = sqlx::query_as::<_, UserBookRelation>(
            "SELECT book_id, liked, in_bookmarks, rate FROM user_book_relation \
             WHERE user_id = ? AND book_id = ?",
        )
        .bind(user_id)
        .bind(book_id)
        .fetch_optional(&self.executor)
        .await?;
        Ok(relation)
    }
}
